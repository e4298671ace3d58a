pub mod config;
pub mod correction;
pub mod record;

pub use config::{
    ApplicationConfig, ConfigError, Credentials, DeliveryConfig, ExtractionConfig, LoginConfig,
    OcrConfig, Point, Region, WatcherConfig, DEFAULT_CONFIG_FILE,
};
pub use correction::{CorrectionAction, CorrectionRule, CorrectionTrigger};
pub use record::{PatientRecord, PhoneChannel, DEFAULT_SOURCE_ID};
