use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::{
    deliberation::{
        markers::PolarityMarkers,
        types::{ConsensusResult, RankedClaim},
    },
    types::{ClaimId, WorkerId},
    workspace::{Claim, ClaimType, Workspace},
};

pub const CONTESTED_OPPOSITION: f64 = 0.5;
pub const CONTESTED_URGENCY: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    Supports,
    Opposes,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub from: ClaimId,
    pub to: ClaimId,
    pub kind: EdgeKind,
    pub inferred: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClaimNode {
    pub claim: Claim,
    pub supporters: Vec<ClaimId>,
    pub opposers: Vec<ClaimId>,
    pub support_strength: f64,
    pub opposition_strength: f64,
}

impl ClaimNode {
    pub fn is_contested(&self) -> bool {
        self.opposition_strength >= CONTESTED_OPPOSITION && self.claim.urgency >= CONTESTED_URGENCY
    }

    pub fn rank_score(&self) -> f64 {
        (self.claim.urgency * self.claim.confidence / 9.0)
            * (1.0 - self.opposition_strength)
            * (1.0 + self.support_strength)
    }
}

/// Support/opposition graph over the active claims of one turn.
#[derive(Debug, Clone, PartialEq)]
pub struct ArgumentGraph {
    nodes: Vec<ClaimNode>,
    edges: Vec<Edge>,
    index: BTreeMap<ClaimId, usize>,
}

impl ArgumentGraph {
    pub fn from_workspace(workspace: &Workspace, markers: &PolarityMarkers) -> Self {
        Self::build(&workspace.active_claims, &workspace.claim_aliases, markers)
    }

    pub fn build(
        claims: &[Claim],
        aliases: &BTreeMap<ClaimId, ClaimId>,
        markers: &PolarityMarkers,
    ) -> Self {
        let index: BTreeMap<ClaimId, usize> = claims
            .iter()
            .enumerate()
            .map(|(position, claim)| (claim.id.clone(), position))
            .collect();
        let resolve = |id: &ClaimId| -> Option<usize> {
            let resolved = aliases.get(id).unwrap_or(id);
            index.get(resolved).copied()
        };

        let mut seen: BTreeSet<(usize, usize, EdgeKind)> = BTreeSet::new();
        let mut edges = Vec::new();
        let mut push_edge = |from: usize, to: usize, kind: EdgeKind, inferred: bool| {
            if from != to && seen.insert((from, to, kind)) {
                edges.push(Edge {
                    from: claims[from].id.clone(),
                    to: claims[to].id.clone(),
                    kind,
                    inferred,
                });
            }
        };

        for (from, claim) in claims.iter().enumerate() {
            for target in claim.supports.iter().filter_map(&resolve) {
                push_edge(from, target, EdgeKind::Supports, false);
            }
            for target in claim.opposes.iter().filter_map(&resolve) {
                push_edge(from, target, EdgeKind::Opposes, false);
            }
        }

        for (left, left_claim) in claims.iter().enumerate() {
            for (right, right_claim) in claims.iter().enumerate().skip(left + 1) {
                if left_claim.claim_type != right_claim.claim_type {
                    continue;
                }
                if markers
                    .contradicts(&left_claim.text, &right_claim.text)
                    .is_some()
                {
                    push_edge(left, right, EdgeKind::Opposes, true);
                    push_edge(right, left, EdgeKind::Opposes, true);
                }
            }
        }

        let mut nodes: Vec<ClaimNode> = claims
            .iter()
            .map(|claim| ClaimNode {
                claim: claim.clone(),
                supporters: Vec::new(),
                opposers: Vec::new(),
                support_strength: 0.0,
                opposition_strength: 0.0,
            })
            .collect();
        for &(from, to, kind) in &seen {
            match kind {
                EdgeKind::Supports => nodes[to].supporters.push(claims[from].id.clone()),
                EdgeKind::Opposes => nodes[to].opposers.push(claims[from].id.clone()),
            }
        }
        for position in 0..nodes.len() {
            let supporters: f64 = nodes[position]
                .supporters
                .iter()
                .filter_map(|id| index.get(id))
                .map(|&other| claims[other].confidence / 3.0)
                .sum();
            let opposers: f64 = nodes[position]
                .opposers
                .iter()
                .filter_map(|id| index.get(id))
                .map(|&other| claims[other].confidence / 3.0)
                .sum();
            let own = claims[position].confidence / 3.0;
            let node = &mut nodes[position];
            node.support_strength = supporters.min(1.0);
            node.opposition_strength = if opposers <= 0.0 {
                0.0
            } else {
                (opposers / (own + opposers)).min(1.0)
            };
        }

        Self {
            nodes,
            edges,
            index,
        }
    }

    pub fn nodes(&self) -> &[ClaimNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn node(&self, id: &str) -> Option<&ClaimNode> {
        self.index.get(id).map(|&position| &self.nodes[position])
    }

    pub fn contested(&self) -> impl Iterator<Item = &ClaimNode> {
        self.nodes.iter().filter(|node| node.is_contested())
    }

    /// Contributors of contested claims together with the contributors of their opposers.
    pub fn follow_up_authors(&self) -> BTreeSet<WorkerId> {
        let mut authors = BTreeSet::new();
        for node in self.contested() {
            authors.extend(node.claim.contributors.iter().cloned());
            for opposer in node.opposers.iter().filter_map(|id| self.node(id)) {
                authors.extend(opposer.claim.contributors.iter().cloned());
            }
        }
        authors
    }

    pub fn consensus(&self, top_k: usize) -> ConsensusResult {
        let mut per_type_scores = BTreeMap::new();
        let mut weighted = 0.0;
        let mut total_weight = 0.0;
        for claim_type in ClaimType::ALL {
            let oppositions: Vec<f64> = self
                .nodes
                .iter()
                .filter(|node| node.claim.claim_type == claim_type)
                .map(|node| node.opposition_strength)
                .collect();
            if oppositions.is_empty() {
                continue;
            }
            let average = oppositions.iter().sum::<f64>() / oppositions.len() as f64;
            let score = 1.0 - average;
            per_type_scores.insert(claim_type, score);
            weighted += claim_type.consensus_weight() * score;
            total_weight += claim_type.consensus_weight();
        }
        let overall_score = if total_weight > 0.0 {
            weighted / total_weight
        } else {
            1.0
        };

        let mut ranked: Vec<&ClaimNode> = self.nodes.iter().collect();
        ranked.sort_by(|left, right| {
            right
                .rank_score()
                .total_cmp(&left.rank_score())
                .then_with(|| left.claim.id.cmp(&right.claim.id))
        });
        let top_claims = ranked
            .into_iter()
            .take(top_k)
            .map(|node| RankedClaim {
                claim_id: node.claim.id.clone(),
                claim_type: node.claim.claim_type,
                score: node.rank_score(),
                urgency: node.claim.urgency,
                confidence: node.claim.confidence,
                opposition: node.opposition_strength,
                support: node.support_strength,
            })
            .collect();

        ConsensusResult {
            overall_score,
            per_type_scores,
            top_claims,
            contested_claims: self.contested().map(|node| node.claim.id.clone()).collect(),
            resolved_claims: self
                .nodes
                .iter()
                .filter(|node| node.opposition_strength < CONTESTED_OPPOSITION)
                .map(|node| node.claim.id.clone())
                .collect(),
        }
    }
}
