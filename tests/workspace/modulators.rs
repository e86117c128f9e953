use concord::workspace::{
    GlobalModulators, ModulatorKind, Reducer, Workspace, reducer::MODULATOR_HALF_LIFE_MS,
};

#[test]
fn nudge_is_capped_and_modulators_stay_in_unit_range() {
    let reducer = Reducer::default();
    let workspace = reducer.nudge_modulator(Workspace::new("s1"), ModulatorKind::Arousal, 5.0);
    assert!((workspace.modulators.arousal - 0.5).abs() < 1e-12);

    let mut workspace = workspace;
    for _ in 0..10 {
        workspace = reducer.nudge_modulator(workspace, ModulatorKind::Arousal, 0.2);
    }
    assert_eq!(workspace.modulators.arousal, 1.0);
}

#[test]
fn decay_halves_distance_to_baseline_per_half_life() {
    let reducer = Reducer::default();
    let mut workspace = Workspace::new("s1");
    workspace.modulators.set(ModulatorKind::Strain, 1.0);

    let decayed = reducer.decay_modulators(workspace, MODULATOR_HALF_LIFE_MS);

    let baseline = ModulatorKind::Strain.baseline();
    let expected = baseline + (1.0 - baseline) * 0.5;
    assert!((decayed.modulators.strain - expected).abs() < 1e-12);
    assert_eq!(
        decayed.modulators.engagement,
        GlobalModulators::default().engagement
    );
}

#[test]
fn zero_elapsed_decay_is_a_no_op() {
    let reducer = Reducer::default();
    let mut workspace = Workspace::new("s1");
    workspace.modulators.set(ModulatorKind::Fatigue, 0.9);
    let decayed = reducer.decay_modulators(workspace.clone(), 0);
    assert_eq!(decayed, workspace);
}
