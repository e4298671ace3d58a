use std::collections::BTreeMap;

use bpwatch_core::{PatientRecord, DEFAULT_SOURCE_ID};
use chrono::{DateTime, Utc};

use crate::extract::ExtractedFields;

/// Turns extracted fields into a [`PatientRecord`], or rejects them.
#[derive(Debug, Clone)]
pub struct RecordAssembler {
    source_id: String,
}

impl Default for RecordAssembler {
    fn default() -> Self {
        Self::new(DEFAULT_SOURCE_ID)
    }
}

impl RecordAssembler {
    pub fn new(source_id: impl Into<String>) -> Self {
        Self { source_id: source_id.into() }
    }

    pub fn source_id(&self) -> &str {
        &self.source_id
    }

    /// Returns `None` when no name was extracted; that is the only rejection.
    pub fn assemble(&self, fields: &ExtractedFields, captured_at: DateTime<Utc>) -> Option<PatientRecord> {
        let (first_name, last_name) = fields.name_parts()?;
        let phone: BTreeMap<_, _> = fields
            .phones()
            .map(|(channel, value)| (channel, value.to_string()))
            .collect();

        Some(PatientRecord {
            first_name,
            last_name,
            phone,
            timestamp: captured_at,
            source_id: self.source_id.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::FieldExtractor;
    use bpwatch_core::PhoneChannel;
    use chrono::TimeZone;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 18, 12, 0, 0).unwrap()
    }

    fn fields(text: &str) -> ExtractedFields {
        FieldExtractor::default().extract_text(text)
    }

    #[test]
    fn assembles_record_from_clean_block() {
        let record = RecordAssembler::default()
            .assemble(
                &fields("Name: John Doe\nPhone: 123-456-7890\nMobile: 098-765-4321"),
                at(),
            )
            .unwrap();
        assert_eq!(record.first_name, "John");
        assert_eq!(record.last_name, "Doe");
        assert_eq!(record.phone.len(), 2);
        assert_eq!(record.phone[&PhoneChannel::Home], "123-456-7890");
        assert_eq!(record.phone[&PhoneChannel::Mobile], "098-765-4321");
        assert_eq!(record.timestamp, at());
        assert_eq!(record.source_id, DEFAULT_SOURCE_ID);
    }

    #[test]
    fn rejects_block_without_name() {
        assert!(RecordAssembler::default()
            .assemble(&fields("Phone: 555-1234"), at())
            .is_none());
        assert!(RecordAssembler::default()
            .assemble(&ExtractedFields::default(), at())
            .is_none());
    }

    #[test]
    fn name_alone_is_enough() {
        let record = RecordAssembler::new("capture-7")
            .assemble(&fields("Name: Cher"), at())
            .unwrap();
        assert_eq!(record.first_name, "Cher");
        assert_eq!(record.last_name, "");
        assert!(record.phone.is_empty());
        assert_eq!(record.source_id, "capture-7");
    }
}
