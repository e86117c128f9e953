use concord::workspace::{MergeMode, Reducer, StanceDimension, StanceVector, reducer::MAX_STANCE_DELTA};

use super::{stance_proposal, started_workspace};

#[test]
fn given_many_maximal_deltas_when_integrated_then_turn_bound_holds() {
    let reducer = Reducer::default();
    let mut workspace = started_workspace();
    let anchor = workspace.stance.clone();

    for index in 0..50 {
        let worker = format!("w{index}");
        workspace = reducer
            .reduce(
                workspace,
                &stance_proposal(
                    &worker,
                    &[
                        (StanceDimension::Warmth, 1.0),
                        (StanceDimension::Valence, -1.0),
                        (StanceDimension::Concern, 0.15),
                    ],
                ),
                MergeMode::Append,
            )
            .workspace;
    }

    for dimension in StanceDimension::ALL {
        let drift = (workspace.stance.get(dimension) - anchor.get(dimension)).abs();
        assert!(
            drift <= MAX_STANCE_DELTA + 1e-12,
            "{dimension:?} drifted {drift}"
        );
    }
    assert!(workspace.stance.warmth > anchor.warmth);
    assert!(workspace.stance.valence < anchor.valence);
}

#[test]
fn given_single_delta_when_integrated_then_alpha_blend_applies() {
    let reducer = Reducer::default();
    let workspace = started_workspace();
    let before = workspace.stance.curiosity;

    let reduction = reducer.reduce(
        workspace,
        &stance_proposal("curious", &[(StanceDimension::Curiosity, 0.1)]),
        MergeMode::Append,
    );

    let after = reduction.workspace.stance.curiosity;
    assert!((after - (before + 0.025)).abs() < 1e-12, "{after}");
    assert_eq!(reduction.report.stance_changes.len(), 1);
}

#[test]
fn given_non_finite_delta_when_integrated_then_it_is_ignored() {
    let reducer = Reducer::default();
    let reduction = reducer.reduce(
        started_workspace(),
        &stance_proposal("broken", &[(StanceDimension::Openness, f64::NAN)]),
        MergeMode::Append,
    );
    assert_eq!(reduction.workspace.stance, StanceVector::default());
    assert!(reduction.report.stance_changes.is_empty());
}

#[test]
fn given_new_turn_when_begun_then_anchor_moves_to_current_stance() {
    let reducer = Reducer::default();
    let mut workspace = started_workspace();
    for index in 0..20 {
        workspace = reducer
            .reduce(
                workspace,
                &stance_proposal(&format!("w{index}"), &[(StanceDimension::Directness, 0.15)]),
                MergeMode::Append,
            )
            .workspace;
    }
    let first_turn_value = workspace.stance.directness;
    workspace.begin_turn(2, "again", &[]);
    assert_eq!(workspace.stance_anchor.directness, first_turn_value);
    assert!(workspace.active_claims.is_empty());
}
