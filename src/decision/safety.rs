use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

pub const PROTECTIVE_RESPONSE: &str = "I'm really glad you told me. Your safety matters most right now. \
If you might act on these thoughts, please contact your local emergency number or a crisis line \
such as 988 (US) right away. I'm here to keep talking with you.";

const DEFAULT_PATTERNS: [&str; 6] = [
    r"\b(?:kill|hurt|harm)\s+myself\b",
    r"\bsuicid(?:e|al)\b",
    r"\bend\s+(?:my\s+life|it\s+all)\b",
    r"\bwant\s+to\s+die\b",
    r"\bno\s+reason\s+to\s+live\b",
    r"\boverdos(?:e|ing)\b",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetySignal {
    pub pattern: String,
    pub matched: String,
}

/// Explicit high-risk phrase screen run during fast signal extraction.
#[derive(Debug, Clone)]
pub struct SafetyScreen {
    patterns: Vec<Regex>,
}

impl Default for SafetyScreen {
    fn default() -> Self {
        let patterns = DEFAULT_PATTERNS
            .iter()
            .filter_map(|pattern| compile(pattern).ok())
            .collect();
        Self { patterns }
    }
}

impl SafetyScreen {
    pub fn new<S: AsRef<str>>(patterns: impl IntoIterator<Item = S>) -> Result<Self, regex::Error> {
        let patterns = patterns
            .into_iter()
            .map(|pattern| compile(pattern.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    pub fn assess(&self, text: &str) -> Option<SafetySignal> {
        self.patterns.iter().find_map(|pattern| {
            pattern.find(text).map(|found| SafetySignal {
                pattern: pattern.as_str().to_string(),
                matched: found.as_str().to_string(),
            })
        })
    }
}

fn compile(pattern: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(pattern).case_insensitive(true).build()
}
