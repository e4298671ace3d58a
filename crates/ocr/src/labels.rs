//! Tolerant label matching.
//!
//! OCR rarely reproduces a label word exactly, so each label is described as a
//! primary literal plus the characters it is commonly confused with, and
//! compiled once into a case-insensitive regex family:
//!
//! - every character may be replaced by one of its confusables (`o`/`0`, `m`/`rn`, …)
//! - every character may be doubled
//! - a single space may appear between characters
//! - literals of five letters or more may lose any one letter
//! - a space inside a literal matches any run of whitespace and `:;.,`

use std::sync::OnceLock;

use bpwatch_core::PhoneChannel;
use regex::Regex;

/// Confusables applied to every label.
const SHARED_SUBSTITUTIONS: &[(char, &[&str])] = &[
    ('o', &["0"]),
    ('i', &["1", "l"]),
    ('l', &["1", "i"]),
    ('m', &["rn"]),
    ('w', &["vv"]),
];

/// Literals at least this long also match with one letter dropped.
const MIN_LEN_FOR_DROPPED_LETTER: usize = 5;

/// Declarative description of one label family.
#[derive(Debug, Clone, Copy)]
pub struct LabelSpec {
    /// Lowercase primary rendering of the label.
    pub literal: &'static str,
    /// Field-specific confusables, on top of the shared ones.
    pub substitutions: &'static [(char, &'static [&'static str])],
    /// Whole-word renderings that the substitution rules cannot produce.
    pub aliases: &'static [&'static str],
}

pub const NAME_LABEL: LabelSpec = LabelSpec {
    literal: "name",
    substitutions: &[('n', &["l"]), ('m', &["n"]), ('e', &["a"])],
    // The label bleeding into a following "t" on xterm captures.
    aliases: &["lanet"],
};

pub const PHONE_LABEL: LabelSpec = LabelSpec {
    literal: "phone",
    substitutions: &[('h', &["b", "l", "n"])],
    aliases: &["rnones"],
};

pub const MOBILE_LABEL: LabelSpec = LabelSpec {
    literal: "mobile",
    substitutions: &[('m', &["f"]), ('b', &["d", "f", "g"])],
    aliases: &[],
};

pub const WORK_LABEL: LabelSpec = LabelSpec {
    literal: "work",
    substitutions: &[('w', &["ll"])],
    aliases: &[],
};

pub const RECORD_MARKER_LABEL: LabelSpec = LabelSpec {
    literal: "patient record",
    substitutions: &[('p', &["f"])],
    aliases: &[],
};

/// The fields the extractor knows how to recover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    Name,
    Phone(PhoneChannel),
}

impl Field {
    pub const ALL: [Field; 4] = [
        Field::Name,
        Field::Phone(PhoneChannel::Home),
        Field::Phone(PhoneChannel::Mobile),
        Field::Phone(PhoneChannel::Work),
    ];

    pub fn label_spec(self) -> LabelSpec {
        match self {
            Field::Name => NAME_LABEL,
            Field::Phone(PhoneChannel::Home) => PHONE_LABEL,
            Field::Phone(PhoneChannel::Mobile) => MOBILE_LABEL,
            Field::Phone(PhoneChannel::Work) => WORK_LABEL,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Field::Name => "name",
            Field::Phone(channel) => channel.as_str(),
        }
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A compiled label family.
#[derive(Debug, Clone)]
pub struct LabelMatcher {
    /// Alternation of every variant, without flags or anchors.
    pattern: String,
    anywhere: Regex,
    line_start: Regex,
}

impl LabelMatcher {
    pub fn compile(spec: &LabelSpec) -> Result<Self, regex::Error> {
        let pattern = label_pattern(spec);
        let anywhere = Regex::new(&format!(r"(?i)\b{pattern}\b"))?;
        let line_start = Regex::new(&format!(r"(?i)^\s*{pattern}(?:\s*[:;]|\s|$)"))?;
        Ok(Self { pattern, anywhere, line_start })
    }

    /// The uncompiled label alternation, for embedding in larger patterns.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Whether the label occurs as a word anywhere in `text`.
    pub fn find_in(&self, text: &str) -> bool {
        self.anywhere.is_match(text)
    }

    /// Whether `line` opens with the label, followed by a colon, whitespace or nothing.
    pub fn starts_line(&self, line: &str) -> bool {
        self.line_start.is_match(line)
    }
}

/// Every label matcher the segmenter and extractor need, compiled together.
#[derive(Debug, Clone)]
pub struct LabelSet {
    pub name: LabelMatcher,
    pub home: LabelMatcher,
    pub mobile: LabelMatcher,
    pub work: LabelMatcher,
    pub record_marker: LabelMatcher,
}

impl LabelSet {
    pub fn compile() -> Result<Self, regex::Error> {
        Ok(Self {
            name: LabelMatcher::compile(&NAME_LABEL)?,
            home: LabelMatcher::compile(&PHONE_LABEL)?,
            mobile: LabelMatcher::compile(&MOBILE_LABEL)?,
            work: LabelMatcher::compile(&WORK_LABEL)?,
            record_marker: LabelMatcher::compile(&RECORD_MARKER_LABEL)?,
        })
    }

    pub fn field(&self, field: Field) -> &LabelMatcher {
        match field {
            Field::Name => &self.name,
            Field::Phone(PhoneChannel::Home) => &self.home,
            Field::Phone(PhoneChannel::Mobile) => &self.mobile,
            Field::Phone(PhoneChannel::Work) => &self.work,
        }
    }
}

/// The built-in label set, compiled on first use.
pub fn standard() -> &'static LabelSet {
    static SET: OnceLock<LabelSet> = OnceLock::new();
    SET.get_or_init(|| LabelSet::compile().expect("invalid label pattern"))
}

fn label_pattern(spec: &LabelSpec) -> String {
    let variants = label_variants(spec);
    let alternation: Vec<String> = variants
        .iter()
        .map(|v| variant_pattern(v, spec))
        .collect();
    format!("(?:{})", alternation.join("|"))
}

fn label_variants(spec: &LabelSpec) -> Vec<String> {
    let mut variants: Vec<String> = vec![spec.literal.to_string()];
    for alias in spec.aliases {
        push_unique(&mut variants, alias.to_lowercase());
    }

    let letters: Vec<(usize, char)> = spec
        .literal
        .char_indices()
        .filter(|(_, c)| c.is_alphanumeric())
        .collect();
    if letters.len() >= MIN_LEN_FOR_DROPPED_LETTER {
        for &(idx, c) in &letters {
            let mut dropped = spec.literal.to_string();
            dropped.replace_range(idx..idx + c.len_utf8(), "");
            push_unique(&mut variants, dropped);
        }
    }
    variants
}

fn push_unique(variants: &mut Vec<String>, candidate: String) {
    if !variants.contains(&candidate) {
        variants.push(candidate);
    }
}

fn variant_pattern(variant: &str, spec: &LabelSpec) -> String {
    let mut out = String::new();
    let mut previous_was_char = false;

    for c in variant.chars() {
        if c.is_whitespace() {
            out.push_str(r"[\s:;.,]*");
            previous_was_char = false;
            continue;
        }
        if previous_was_char {
            out.push_str(" ?");
        }
        out.push_str(&char_group(c, spec));
        previous_was_char = true;
    }
    out
}

fn char_group(c: char, spec: &LabelSpec) -> String {
    let lower = c.to_ascii_lowercase();
    let mut alternatives = vec![regex::escape(&lower.to_string())];
    let extra = SHARED_SUBSTITUTIONS
        .iter()
        .chain(spec.substitutions.iter())
        .filter(|(from, _)| *from == lower)
        .flat_map(|(_, to)| to.iter());
    for alt in extra {
        let escaped = regex::escape(alt);
        if !alternatives.contains(&escaped) {
            alternatives.push(escaped);
        }
    }
    format!("(?:{}){{1,2}}", alternatives.join("|"))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// (field, renderings that must match, renderings that must not)
    fn table() -> Vec<(Field, Vec<&'static str>, Vec<&'static str>)> {
        vec![
            (
                Field::Name,
                vec!["Name", "NAME", "name", "Narne", "Nane", "lane", "lanet", "Naame", "Na me", "Narna"],
                vec!["Phone", "Mobile", "Work", "Nme"],
            ),
            (
                Field::Phone(PhoneChannel::Home),
                vec!["Phone", "Ph0ne", "Pbone", "hone", "Phne", "rnones", "Phonee"],
                vec!["Name", "Mobile", "Work"],
            ),
            (
                Field::Phone(PhoneChannel::Mobile),
                vec!["Mobile", "M0bile", "Mobi1e", "Modile", "fobile", "obile", "Mobiie", "Moblle"],
                vec!["Name", "Phone", "Work"],
            ),
            (
                Field::Phone(PhoneChannel::Work),
                vec!["Work", "W0rk", "llork", "VVork", "Worrk"],
                vec!["Name", "Phone", "Mobile", "Wok"],
            ),
        ]
    }

    #[test]
    fn label_families_accept_known_misreadings() {
        let labels = standard();
        for (field, accept, reject) in table() {
            let matcher = labels.field(field);
            for text in accept {
                assert!(
                    matcher.starts_line(&format!("{text}: x")),
                    "{field} label should accept {text:?}"
                );
            }
            for text in reject {
                assert!(
                    !matcher.starts_line(&format!("{text}: x")),
                    "{field} label should reject {text:?}"
                );
            }
        }
    }

    #[test]
    fn record_marker_tolerates_corruption() {
        let marker = &standard().record_marker;
        assert!(marker.find_in("Patient Record:"));
        assert!(marker.find_in("fatient: Record:"));
        assert!(marker.find_in("  PATIENT RECORD"));
        assert!(marker.find_in("Patlent Recrd:"));
        assert!(!marker.find_in("Name: John Doe"));
    }

    #[test]
    fn starts_line_requires_a_label_boundary() {
        let name = &standard().name;
        assert!(name.starts_line("Name: John"));
        assert!(name.starts_line("Name; John"));
        assert!(name.starts_line("   Name John"));
        assert!(name.starts_line("Name"));
        assert!(!name.starts_line("Names: x"));
        assert!(!name.starts_line("Nameless"));
        assert!(!name.starts_line("Patient Name: x"));
    }

    #[test]
    fn find_in_searches_anywhere() {
        assert!(standard().home.find_in("Patient Phone: 555"));
        assert!(!standard().home.find_in("Telephoned"));
        assert!(!standard().home.find_in("Telephone: 555"));
        assert!(!standard().name.find_in("Username: testuser"));
    }

    #[test]
    fn short_literals_do_not_drop_letters() {
        let variants = label_variants(&NAME_LABEL);
        assert_eq!(variants, vec!["name".to_string(), "lanet".to_string()]);
        let variants = label_variants(&PHONE_LABEL);
        assert!(variants.contains(&"hone".to_string()));
        assert!(variants.contains(&"rnones".to_string()));
        assert_eq!(variants.len(), 7);
    }

    #[test]
    fn char_group_merges_shared_and_field_confusables() {
        assert_eq!(char_group('m', &MOBILE_LABEL), "(?:m|rn|f){1,2}");
        assert_eq!(char_group('x', &MOBILE_LABEL), "(?:x){1,2}");
    }
}
