use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Provenance tag stamped on records when the configuration does not name one.
pub const DEFAULT_SOURCE_ID: &str = "bpwatcher_mvp_xterm_01";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhoneChannel {
    Home,
    Mobile,
    Work,
}

impl PhoneChannel {
    pub const ALL: [PhoneChannel; 3] = [PhoneChannel::Home, PhoneChannel::Mobile, PhoneChannel::Work];

    pub fn as_str(self) -> &'static str {
        match self {
            PhoneChannel::Home => "home",
            PhoneChannel::Mobile => "mobile",
            PhoneChannel::Work => "work",
        }
    }
}

impl fmt::Display for PhoneChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PhoneChannel {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "home" => Ok(PhoneChannel::Home),
            "mobile" => Ok(PhoneChannel::Mobile),
            "work" => Ok(PhoneChannel::Work),
            other => Err(format!("Unknown phone channel: '{other}'")),
        }
    }
}

/// One patient as reconstructed from a captured screen region.
///
/// Only emitted when a name was recovered; phone entries are best-effort and
/// absent channels are simply missing from `phone`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientRecord {
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub phone: BTreeMap<PhoneChannel, String>,
    pub timestamp: DateTime<Utc>,
    pub source_id: String,
}

impl PatientRecord {
    pub fn full_name(&self) -> String {
        if self.last_name.is_empty() {
            self.first_name.clone()
        } else {
            format!("{} {}", self.first_name, self.last_name)
        }
    }
}

impl fmt::Display for PatientRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_name())
    }
}
