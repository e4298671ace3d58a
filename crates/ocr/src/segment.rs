use std::sync::OnceLock;

use regex::Regex;

use crate::labels::{self, LabelSet};

macro_rules! re {
    ($name:ident, $pat:expr) => {
        fn $name() -> &'static Regex {
            static R: OnceLock<Regex> = OnceLock::new();
            R.get_or_init(|| Regex::new($pat).expect("invalid regex"))
        }
    };
}

// Three or more dash-like characters, however the OCR rendered the "---" delimiter.
re!(re_separator, r"[-\u{2010}\u{2011}\u{2013}\u{2014}\u{2015}_~=]{3,}");
// A shell prompt: user@host:path$ or user@host:path#
re!(re_shell_prompt, r"^\S+@[\w.\-]+:\S*\s*[$#]");
// The typed command that printed the data, echoed back by the terminal.
re!(re_echo_artifact, r"(?i)\becho\s+-e\b");

/// An ordered run of OCR lines believed to describe one record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTextBlock {
    lines: Vec<String>,
}

impl RawTextBlock {
    pub fn new(lines: Vec<String>) -> Self {
        Self { lines }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// The block's lines joined with newlines.
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    fn push(&mut self, line: &str) {
        self.lines.push(line.to_string());
    }
}

/// Splits raw OCR text into candidate record blocks.
///
/// Never fails: malformed input only yields fewer (or worse) blocks.
#[derive(Debug, Clone)]
pub struct Segmenter {
    labels: &'static LabelSet,
    noise_markers: Vec<String>,
}

impl Default for Segmenter {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

/// Accumulator threaded through one segmentation pass.
#[derive(Default)]
struct Segmentation {
    blocks: Vec<RawTextBlock>,
    current: RawTextBlock,
}

impl Segmentation {
    fn close_current(&mut self) {
        if !self.current.is_empty() {
            self.blocks.push(std::mem::take(&mut self.current));
        }
    }

    fn finish(mut self) -> Vec<RawTextBlock> {
        self.close_current();
        self.blocks
    }
}

impl Segmenter {
    /// `noise_markers` are extra substrings (host names, prompt fragments)
    /// that mark a line as rendering noise.
    pub fn new(noise_markers: Vec<String>) -> Self {
        Self {
            labels: labels::standard(),
            noise_markers: noise_markers.into_iter().filter(|m| !m.is_empty()).collect(),
        }
    }

    pub fn segment(&self, raw: &str) -> Vec<RawTextBlock> {
        raw.lines()
            .fold(Segmentation::default(), |acc, line| self.step(acc, line.trim()))
            .finish()
    }

    fn step(&self, mut acc: Segmentation, line: &str) -> Segmentation {
        if line.is_empty() || self.is_noise(line) {
            return acc;
        }

        let separator = is_separator(line);
        if separator || self.is_record_start(line) {
            acc.close_current();
        }
        if !separator {
            acc.current.push(line);
        }
        acc
    }

    /// A record begins on an explicit marker anywhere in the line, or on a
    /// line that opens with the name label.
    pub fn is_record_start(&self, line: &str) -> bool {
        self.labels.record_marker.find_in(line) || self.labels.name.starts_line(line)
    }

    pub fn is_noise(&self, line: &str) -> bool {
        re_shell_prompt().is_match(line)
            || re_echo_artifact().is_match(line)
            || self.noise_markers.iter().any(|m| line.contains(m.as_str()))
    }
}

pub fn is_separator(line: &str) -> bool {
    re_separator().is_match(line)
}
