use std::collections::BTreeMap;

use bpwatch_core::PhoneChannel;
use regex::Regex;

use crate::corrections::CorrectionTable;
use crate::labels::{self, Field, LabelSet};
use crate::segment::RawTextBlock;

// ── Value shapes ──────────────────────────────────────────────────────────────

/// One or two alphabetic tokens on the label's line.
const NAME_VALUE: &str = r"([a-z]+(?:[ \t]+[a-z]+)?)";
/// A loose run of digits, spaces, parentheses, dots and hyphens containing at least one digit.
const PHONE_VALUE: &str = r"([\d()\-. \t]*\d[\d()\-. \t]*)";
/// Optional `:`/`;` between label and value, without leaving the line.
const LABEL_VALUE_GAP: &str = r"[ \t]*[:;]?[ \t]*";

/// Field values recovered from one block. Absent fields are missing from the map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedFields {
    values: BTreeMap<Field, String>,
}

impl ExtractedFields {
    pub fn get(&self, field: Field) -> Option<&str> {
        self.values.get(&field).map(String::as_str)
    }

    /// The corrected full name, if one was found.
    pub fn name(&self) -> Option<&str> {
        self.get(Field::Name)
    }

    /// `(first, last)` split on the first whitespace; `last` may be empty.
    pub fn name_parts(&self) -> Option<(String, String)> {
        let name = self.name()?.trim();
        match name.split_once(char::is_whitespace) {
            Some((first, rest)) => Some((first.to_string(), rest.trim().to_string())),
            None => Some((name.to_string(), String::new())),
        }
    }

    pub fn phones(&self) -> impl Iterator<Item = (PhoneChannel, &str)> + '_ {
        self.values.iter().filter_map(|(field, value)| match field {
            Field::Phone(channel) => Some((*channel, value.as_str())),
            Field::Name => None,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }
}

/// Applies the tolerant label/value patterns to a block of OCR text.
///
/// Holds only immutable compiled state, so repeated runs over the same block
/// produce identical output.
#[derive(Debug, Clone)]
pub struct FieldExtractor {
    patterns: Vec<(Field, Regex)>,
    corrections: CorrectionTable,
}

impl Default for FieldExtractor {
    fn default() -> Self {
        Self::new(CorrectionTable::default())
    }
}

impl FieldExtractor {
    pub fn new(corrections: CorrectionTable) -> Self {
        Self::with_labels(labels::standard(), corrections)
    }

    pub fn with_labels(labels: &LabelSet, corrections: CorrectionTable) -> Self {
        let patterns = Field::ALL
            .iter()
            .map(|&field| {
                let value = match field {
                    Field::Name => NAME_VALUE,
                    Field::Phone(_) => PHONE_VALUE,
                };
                let label = labels.field(field).pattern();
                let re = Regex::new(&format!(r"(?i)\b{label}\b{LABEL_VALUE_GAP}{value}"))
                    .expect("invalid field pattern");
                (field, re)
            })
            .collect();
        Self { patterns, corrections }
    }

    pub fn extract(&self, block: &RawTextBlock) -> ExtractedFields {
        self.extract_text(&block.text())
    }

    pub fn extract_text(&self, text: &str) -> ExtractedFields {
        let mut fields = ExtractedFields::default();

        for (field, re) in &self.patterns {
            let raw = re
                .captures(text)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().trim());

            let value = match (field, raw) {
                (_, None) => None,
                (Field::Name, Some(raw)) => clean_name(&self.corrections.apply(raw, text)),
                (Field::Phone(_), Some(raw)) => clean_phone(raw),
            };

            match value {
                Some(value) => {
                    tracing::debug!(field = %field, value = %value, "field extracted");
                    fields.values.insert(*field, value);
                }
                None => tracing::debug!(field = %field, "field not found"),
            }
        }

        fields
    }
}

fn clean_name(name: &str) -> Option<String> {
    let name = name.split_whitespace().collect::<Vec<_>>().join(" ");
    (!name.is_empty()).then_some(name)
}

/// Keeps only digits and hyphens; a value without any digit is treated as absent.
pub fn clean_phone(raw: &str) -> Option<String> {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '-')
        .collect();
    cleaned.chars().any(|c| c.is_ascii_digit()).then_some(cleaned)
}
