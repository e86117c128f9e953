use regex::{Regex, RegexBuilder};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    Positive,
    Negative,
}

#[derive(Debug, Clone)]
struct MarkerPair {
    positive: Regex,
    negative: Regex,
}

/// Replaceable policy of `(positive, negative)` phrase pairs used to infer opposition.
#[derive(Debug, Clone)]
pub struct PolarityMarkers {
    pairs: Vec<MarkerPair>,
}

// Alternatives within one side are separated by `|`.
const DEFAULT_PAIRS: [(&str, &str); 9] = [
    ("should", "should not|shouldn't"),
    ("increase", "decrease"),
    ("more", "less"),
    ("start", "stop"),
    ("accept", "reject"),
    ("agree", "disagree"),
    ("safe", "unsafe"),
    ("continue", "pause"),
    ("can", "cannot|can't|can not"),
];

impl Default for PolarityMarkers {
    fn default() -> Self {
        let pairs = DEFAULT_PAIRS
            .iter()
            .filter_map(|(positive, negative)| compile_pair(positive, negative).ok())
            .collect();
        Self { pairs }
    }
}

impl PolarityMarkers {
    pub fn new<P, N>(pairs: impl IntoIterator<Item = (P, N)>) -> Result<Self, regex::Error>
    where
        P: AsRef<str>,
        N: AsRef<str>,
    {
        let pairs = pairs
            .into_iter()
            .map(|(positive, negative)| compile_pair(positive.as_ref(), negative.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { pairs })
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Polarity of `text` under pair `index`. The negative phrase wins when both match.
    pub fn polarity(&self, index: usize, text: &str) -> Option<Polarity> {
        let pair = self.pairs.get(index)?;
        if pair.negative.is_match(text) {
            return Some(Polarity::Negative);
        }
        if pair.positive.is_match(text) {
            return Some(Polarity::Positive);
        }
        None
    }

    /// Index of the first pair under which the two texts take opposite sides.
    pub fn contradicts(&self, left: &str, right: &str) -> Option<usize> {
        (0..self.pairs.len()).find(|&index| {
            matches!(
                (self.polarity(index, left), self.polarity(index, right)),
                (Some(Polarity::Positive), Some(Polarity::Negative))
                    | (Some(Polarity::Negative), Some(Polarity::Positive))
            )
        })
    }
}

fn compile_pair(positive: &str, negative: &str) -> Result<MarkerPair, regex::Error> {
    Ok(MarkerPair {
        positive: phrase_regex(positive)?,
        negative: phrase_regex(negative)?,
    })
}

fn phrase_regex(phrase: &str) -> Result<Regex, regex::Error> {
    let alternatives = phrase
        .split('|')
        .map(|alternative| {
            alternative
                .split_whitespace()
                .map(regex::escape)
                .collect::<Vec<_>>()
                .join(r"\s+")
        })
        .filter(|alternative| !alternative.is_empty())
        .collect::<Vec<_>>()
        .join("|");
    RegexBuilder::new(&format!(r"\b(?:{alternatives})\b"))
        .case_insensitive(true)
        .build()
}
