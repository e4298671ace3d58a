//! Per-record delivery of extracted records to a structured-data endpoint,
//! with a bounded number of attempts and a fixed pause between them.

pub mod client;
pub mod transport;

pub use client::{BatchReport, DeliveryClient, DeliveryOutcome, RetryPolicy};
pub use transport::{HttpTransport, Transport, TransportError, TransportResponse};
