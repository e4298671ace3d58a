use serde::{Deserialize, Serialize};

/// A single known-OCR-error correction applied to an extracted full name.
///
/// Rules are evaluated highest `priority` first. Every rule whose trigger
/// holds rewrites the current name; a firing rule with `stop` set ends the
/// evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrectionRule {
    pub name: String,
    #[serde(default)]
    pub priority: i32,
    pub trigger: CorrectionTrigger,
    pub action: CorrectionAction,
    #[serde(default)]
    pub stop: bool,
}

/// Condition under which a rule fires. The leaf variants list alternatives;
/// any one of them matching is enough. `All` requires every nested trigger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrectionTrigger {
    /// The joined block text contains one of the fragments.
    BlockContains(Vec<String>),
    /// The current name equals one of the values exactly.
    NameEquals(Vec<String>),
    /// The current name contains one of the fragments.
    NameContains(Vec<String>),
    /// Every nested trigger holds.
    All(Vec<CorrectionTrigger>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrectionAction {
    /// Replace the whole name.
    SetName(String),
    /// Replace every occurrence of `from` inside the name.
    Replace { from: String, to: String },
}
