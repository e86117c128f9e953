mod graph;
mod markers;

use std::collections::{BTreeMap, BTreeSet};

use concord::workspace::{Claim, ClaimType};

pub fn claim(id: &str, author: &str, claim_type: ClaimType, text: &str, urgency: f64, confidence: f64) -> Claim {
    Claim {
        id: id.to_string(),
        text: text.to_string(),
        claim_type,
        source: author.to_string(),
        urgency,
        confidence,
        supports: Vec::new(),
        opposes: Vec::new(),
        contributors: BTreeSet::from([author.to_string()]),
        assertions: BTreeMap::new(),
    }
}

pub fn no_aliases() -> BTreeMap<String, String> {
    BTreeMap::new()
}
