use bpwatch_core::{CorrectionAction, CorrectionRule, CorrectionTrigger};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CorrectionError {
    #[error("Failed to parse correction rules: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Ordered name-correction policy, evaluated highest priority first.
///
/// The built-in table is empty; known misreadings for a given deployment are
/// supplied as configuration.
#[derive(Debug, Clone, Default)]
pub struct CorrectionTable {
    rules: Vec<CorrectionRule>,
}

impl CorrectionTable {
    pub fn new(rules: Vec<CorrectionRule>) -> Self {
        let mut rules = rules;
        // Stable: rules sharing a priority keep their declared order.
        rules.sort_by(|a, b| b.priority.cmp(&a.priority));
        Self { rules }
    }

    /// Parses a standalone file of `[[corrections]]` tables.
    pub fn from_toml(toml_content: &str) -> Result<Self, CorrectionError> {
        #[derive(Deserialize)]
        struct File {
            #[serde(default)]
            corrections: Vec<CorrectionRule>,
        }
        let file: File = toml::from_str(toml_content)?;
        Ok(Self::new(file.corrections))
    }

    pub fn rules(&self) -> &[CorrectionRule] {
        &self.rules
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Runs every rule against `name`, returning the corrected name.
    pub fn apply(&self, name: &str, block_text: &str) -> String {
        let mut current = name.to_string();
        for rule in &self.rules {
            if !trigger_holds(&rule.trigger, &current, block_text) {
                continue;
            }
            let corrected = match &rule.action {
                CorrectionAction::SetName(value) => value.clone(),
                CorrectionAction::Replace { from, to } => current.replace(from.as_str(), to),
            };
            if corrected != current {
                tracing::debug!(rule = %rule.name, from = %current, to = %corrected, "name corrected");
            }
            current = corrected;
            if rule.stop {
                break;
            }
        }
        current
    }
}

fn trigger_holds(trigger: &CorrectionTrigger, name: &str, block_text: &str) -> bool {
    match trigger {
        CorrectionTrigger::BlockContains(fragments) => {
            fragments.iter().any(|f| block_text.contains(f.as_str()))
        }
        CorrectionTrigger::NameEquals(values) => values.iter().any(|v| v == name),
        CorrectionTrigger::NameContains(fragments) => {
            fragments.iter().any(|f| name.contains(f.as_str()))
        }
        CorrectionTrigger::All(triggers) => {
            triggers.iter().all(|t| trigger_holds(t, name, block_text))
        }
    }
}
