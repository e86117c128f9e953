use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::{
    deliberation::PolarityMarkers,
    types::{ClaimId, WorkerId},
    worker::Proposal,
    workspace::{
        state::{Workspace, hex_digest},
        types::{Claim, ClaimType, ModulatorKind, PatchValue, StanceDimension},
    },
};

pub const MERGE_OVERLAP_THRESHOLD: f64 = 0.7;
pub const MAX_STANCE_DELTA: f64 = 0.15;
pub const STANCE_ALPHA: f64 = 0.25;
pub const MAX_MODULATOR_NUDGE: f64 = 0.2;
pub const MODULATOR_HALF_LIFE_MS: u64 = 10 * 60 * 1000;

const LIST_PATCH_FIELDS: [&str; 3] = ["pending_asks", "constraints", "open_threads"];
const TEXT_PATCH_FIELDS: [&str; 1] = ["focus_topic"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeMode {
    /// Seed waves: claims accumulate.
    Append,
    /// Follow-up rounds: the proposal supersedes its author's earlier claims.
    Revise,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StanceChange {
    pub dimension: StanceDimension,
    pub requested: f64,
    pub before: f64,
    pub after: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReductionReport {
    pub worker_id: WorkerId,
    pub added_claims: Vec<ClaimId>,
    pub merged_claims: Vec<ClaimId>,
    pub retracted_claims: Vec<ClaimId>,
    pub stance_changes: Vec<StanceChange>,
    pub patched_fields: Vec<String>,
    pub rejected_fields: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Reduction {
    pub workspace: Workspace,
    pub report: ReductionReport,
}

/// Pure merge of proposals into the workspace. No I/O, no clock.
#[derive(Debug, Clone)]
pub struct Reducer {
    markers: PolarityMarkers,
}

impl Default for Reducer {
    fn default() -> Self {
        Self::new(PolarityMarkers::default())
    }
}

impl Reducer {
    pub fn new(markers: PolarityMarkers) -> Self {
        Self { markers }
    }

    pub fn markers(&self) -> &PolarityMarkers {
        &self.markers
    }

    pub fn reduce(&self, mut workspace: Workspace, proposal: &Proposal, mode: MergeMode) -> Reduction {
        let mut report = ReductionReport {
            worker_id: proposal.worker_id.clone(),
            ..ReductionReport::default()
        };

        if mode == MergeMode::Revise {
            retract_author_claims(&mut workspace, &proposal.worker_id, &mut report);
        }
        if proposal.urgency.is_finite() {
            workspace
                .proposal_urgency
                .insert(proposal.worker_id.clone(), proposal.urgency.max(0.0));
        }
        self.merge_claims(&mut workspace, &proposal.claims, &mut report);
        integrate_stance(&mut workspace, &proposal.stance_delta, &mut report);
        apply_patch(&mut workspace, &proposal.workspace_patch, &mut report);

        Reduction { workspace, report }
    }

    /// Exponential decay of every modulator toward its baseline.
    pub fn decay_modulators(&self, mut workspace: Workspace, elapsed_ms: u64) -> Workspace {
        if elapsed_ms == 0 {
            return workspace;
        }
        let factor = 0.5_f64.powf(elapsed_ms as f64 / MODULATOR_HALF_LIFE_MS as f64);
        for kind in ModulatorKind::ALL {
            let baseline = kind.baseline();
            let current = workspace.modulators.get(kind);
            workspace
                .modulators
                .set(kind, baseline + (current - baseline) * factor);
        }
        workspace
    }

    pub fn nudge_modulator(&self, mut workspace: Workspace, kind: ModulatorKind, delta: f64) -> Workspace {
        if !delta.is_finite() {
            return workspace;
        }
        let clamped = delta.clamp(-MAX_MODULATOR_NUDGE, MAX_MODULATOR_NUDGE);
        let current = workspace.modulators.get(kind);
        workspace.modulators.set(kind, current + clamped);
        workspace
    }

    fn merge_claims(&self, workspace: &mut Workspace, incoming: &[Claim], report: &mut ReductionReport) {
        // Worker-local ids that had to be renamed on collision, scoped to this proposal.
        let mut renamed: BTreeMap<ClaimId, ClaimId> = BTreeMap::new();
        let mut touched: BTreeSet<ClaimId> = BTreeSet::new();

        for claim in incoming {
            if let Some(index) = self.find_merge_target(workspace, claim) {
                let target = &mut workspace.active_claims[index];
                absorb(target, claim);
                let target_id = target.id.clone();
                if claim.id != target_id
                    && !workspace.active_claims.iter().any(|c| c.id == claim.id)
                {
                    workspace
                        .claim_aliases
                        .insert(claim.id.clone(), target_id.clone());
                }
                touched.insert(target_id.clone());
                push_unique(&mut report.merged_claims, target_id);
                continue;
            }

            let mut fresh = claim.clone();
            if id_taken(workspace, &fresh.id) {
                let renamed_id = unique_claim_id(workspace, fresh.claim_type, &fresh.text);
                renamed.insert(fresh.id.clone(), renamed_id.clone());
                fresh.id = renamed_id;
            }
            touched.insert(fresh.id.clone());
            push_unique(&mut report.added_claims, fresh.id.clone());
            workspace.active_claims.push(fresh);
        }

        for claim in workspace
            .active_claims
            .iter_mut()
            .filter(|claim| touched.contains(&claim.id))
        {
            let own_id = claim.id.clone();
            let rewrite = |edges: &mut Vec<ClaimId>| {
                let mut seen = BTreeSet::new();
                edges.retain_mut(|edge| {
                    if let Some(renamed_id) = renamed.get(edge) {
                        *edge = renamed_id.clone();
                    }
                    *edge != own_id && seen.insert(edge.clone())
                });
            };
            rewrite(&mut claim.supports);
            rewrite(&mut claim.opposes);
        }
    }

    fn find_merge_target(&self, workspace: &Workspace, claim: &Claim) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (index, existing) in workspace.active_claims.iter().enumerate() {
            if existing.claim_type != claim.claim_type {
                continue;
            }
            if self.markers.contradicts(&existing.text, &claim.text).is_some() {
                continue;
            }
            let overlap = token_overlap(&existing.text, &claim.text);
            if overlap <= MERGE_OVERLAP_THRESHOLD {
                continue;
            }
            if best.is_none_or(|(_, best_overlap)| overlap > best_overlap) {
                best = Some((index, overlap));
            }
        }
        best.map(|(index, _)| index)
    }
}

fn absorb(target: &mut Claim, incoming: &Claim) {
    target.urgency = target.urgency.max(incoming.urgency);
    target.confidence = target.confidence.max(incoming.confidence);
    for edge in &incoming.supports {
        push_unique(&mut target.supports, edge.clone());
    }
    for edge in &incoming.opposes {
        push_unique(&mut target.opposes, edge.clone());
    }
    target
        .contributors
        .extend(incoming.contributors.iter().cloned());
    for (worker_id, assertion) in &incoming.assertions {
        let entry = target.assertions.entry(worker_id.clone()).or_insert(*assertion);
        entry.urgency = entry.urgency.max(assertion.urgency);
        entry.confidence = entry.confidence.max(assertion.confidence);
    }
}

fn retract_author_claims(workspace: &mut Workspace, worker_id: &WorkerId, report: &mut ReductionReport) {
    let mut retracted = Vec::new();
    workspace.active_claims.retain_mut(|claim| {
        if !claim.contributors.contains(worker_id) {
            return true;
        }
        if claim.contributors.len() == 1 {
            retracted.push(claim.id.clone());
            return false;
        }
        claim.contributors.remove(worker_id);
        claim.assertions.remove(worker_id);
        claim.settle_assertions();
        true
    });
    workspace
        .claim_aliases
        .retain(|_, target| !retracted.contains(target));
    report.retracted_claims.extend(retracted);
}

fn integrate_stance(
    workspace: &mut Workspace,
    stance_delta: &BTreeMap<StanceDimension, f64>,
    report: &mut ReductionReport,
) {
    for (&dimension, &requested) in stance_delta {
        if !requested.is_finite() {
            continue;
        }
        let clamped = requested.clamp(-MAX_STANCE_DELTA, MAX_STANCE_DELTA);
        let before = workspace.stance.get(dimension);
        let integrated = before * (1.0 - STANCE_ALPHA) + (before + clamped) * STANCE_ALPHA;

        let (lo, hi) = dimension.bounds();
        let anchor = workspace.stance_anchor.get(dimension);
        let floor = lo.max(anchor - MAX_STANCE_DELTA);
        let ceiling = hi.min(anchor + MAX_STANCE_DELTA);
        let after = integrated.clamp(floor, ceiling);

        workspace.stance.set(dimension, after);
        report.stance_changes.push(StanceChange {
            dimension,
            requested,
            before,
            after: workspace.stance.get(dimension),
        });
    }
}

fn apply_patch(
    workspace: &mut Workspace,
    patch: &BTreeMap<String, PatchValue>,
    report: &mut ReductionReport,
) {
    for (field, value) in patch {
        let applied = match (field.as_str(), value) {
            (name, PatchValue::List(items)) if LIST_PATCH_FIELDS.contains(&name) => {
                let target = list_field(workspace, name);
                for item in items {
                    push_unique(target, item.clone());
                }
                true
            }
            (name, PatchValue::Text(item)) if LIST_PATCH_FIELDS.contains(&name) => {
                push_unique(list_field(workspace, name), item.clone());
                true
            }
            (name, PatchValue::Text(text)) if TEXT_PATCH_FIELDS.contains(&name) => {
                workspace.context.focus_topic = Some(text.clone());
                true
            }
            _ => false,
        };

        if applied {
            report.patched_fields.push(field.clone());
        } else {
            tracing::debug!(
                target: "reducer",
                worker_id = %report.worker_id,
                field = %field,
                "workspace_patch_field_rejected"
            );
            report.rejected_fields.push(field.clone());
        }
    }
}

fn list_field<'a>(workspace: &'a mut Workspace, name: &str) -> &'a mut Vec<String> {
    match name {
        "pending_asks" => &mut workspace.context.pending_asks,
        "constraints" => &mut workspace.context.constraints,
        _ => &mut workspace.context.open_threads,
    }
}

fn push_unique(target: &mut Vec<String>, item: String) {
    if !target.contains(&item) {
        target.push(item);
    }
}

fn id_taken(workspace: &Workspace, id: &str) -> bool {
    workspace.active_claims.iter().any(|claim| claim.id == id)
        || workspace.claim_aliases.contains_key(id)
}

fn unique_claim_id(workspace: &Workspace, claim_type: ClaimType, text: &str) -> ClaimId {
    let base = derive_claim_id(claim_type, text);
    if !id_taken(workspace, &base) {
        return base;
    }
    let mut suffix: u32 = 2;
    loop {
        let candidate = format!("{base}-{suffix}");
        if !id_taken(workspace, &candidate) {
            return candidate;
        }
        suffix = suffix.saturating_add(1);
    }
}

/// `clm-` plus the first 12 hex chars of SHA-256 over `type|normalized text`.
pub fn derive_claim_id(claim_type: ClaimType, text: &str) -> ClaimId {
    let normalized = tokenize(text).into_iter().collect::<Vec<_>>().join(" ");
    let digest = hex_digest(format!("{}|{}", claim_type.as_str(), normalized).as_bytes());
    format!("clm-{}", &digest[..12])
}

/// Jaccard ratio of the two texts' lowercase word sets.
pub fn token_overlap(left: &str, right: &str) -> f64 {
    let left = tokenize(left);
    let right = tokenize(right);
    let union = left.union(&right).count();
    if union == 0 {
        return 0.0;
    }
    left.intersection(&right).count() as f64 / union as f64
}

fn tokenize(text: &str) -> BTreeSet<String> {
    text.split(|c: char| !c.is_alphanumeric() && c != '\'')
        .map(|token| token.trim_matches('\'').to_lowercase())
        .filter(|token| !token.is_empty())
        .collect()
}
