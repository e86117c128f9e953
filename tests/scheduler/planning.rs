use std::{collections::BTreeSet, time::Instant};

use concord::scheduler::{PriorityTier, Scheduler, SchedulerConfig, WorkerDescriptor};

use super::signals;

fn config(turn_budget: usize, wave_width: usize) -> SchedulerConfig {
    SchedulerConfig {
        turn_budget,
        wave_width,
        ..SchedulerConfig::default()
    }
}

#[test]
fn given_always_on_workers_when_planned_then_they_form_wave_zero() {
    let scheduler = Scheduler::new(
        vec![
            WorkerDescriptor::new("normal-a", PriorityTier::Normal),
            WorkerDescriptor::new("safety", PriorityTier::AlwaysOn),
            WorkerDescriptor::new("empathy", PriorityTier::AlwaysOn),
        ],
        config(8, 4),
    );

    let plan = scheduler.plan(&signals(&[]), Instant::now());

    assert_eq!(plan.waves.len(), 2);
    assert_eq!(plan.waves[0].index, 0);
    let wave_zero: BTreeSet<String> = plan.waves[0].worker_ids().into_iter().collect();
    assert_eq!(
        wave_zero,
        BTreeSet::from(["empathy".to_string(), "safety".to_string()])
    );
    assert_eq!(plan.waves[1].worker_ids(), vec!["normal-a".to_string()]);
}

#[test]
fn given_monitor_worker_when_signal_below_threshold_then_it_stays_idle() {
    let scheduler = Scheduler::new(
        vec![WorkerDescriptor::new("tone", PriorityTier::Monitor).with_domains(["intensity"])],
        config(8, 4),
    );

    let quiet = scheduler.plan(&signals(&[("intensity", 0.6)]), Instant::now());
    assert!(!quiet.contains("tone"));

    let loud = scheduler.plan(&signals(&[("intensity", 0.9)]), Instant::now());
    assert!(loud.contains("tone"));
}

#[test]
fn given_boosted_domains_when_ranked_then_higher_score_runs_first() {
    let scheduler = Scheduler::new(
        vec![
            WorkerDescriptor::new("alpha", PriorityTier::Normal).with_base_priority(0.5),
            WorkerDescriptor::new("beta", PriorityTier::Normal)
                .with_base_priority(0.1)
                .with_domains(["inquiry"]),
            WorkerDescriptor::new("gamma", PriorityTier::Normal).with_base_priority(0.5),
        ],
        config(8, 1),
    );

    let plan = scheduler.plan(&signals(&[("inquiry", 0.75)]), Instant::now());

    let order: Vec<String> = plan
        .waves
        .iter()
        .flat_map(|wave| wave.worker_ids())
        .collect();
    assert_eq!(order, vec!["beta", "alpha", "gamma"]);
    assert_eq!(plan.waves.len(), 3);
}

#[test]
fn given_budget_smaller_than_candidates_when_planned_then_overflow_is_reported() {
    let descriptors = (0..6)
        .map(|index| {
            WorkerDescriptor::new(format!("w{index}"), PriorityTier::Normal)
                .with_base_priority(index as f64)
        })
        .chain([WorkerDescriptor::new("always", PriorityTier::AlwaysOn)])
        .collect();
    let scheduler = Scheduler::new(descriptors, config(4, 2));

    let plan = scheduler.plan(&signals(&[]), Instant::now());

    assert_eq!(plan.worker_count(), 4);
    assert_eq!(plan.waves[0].worker_ids(), vec!["always".to_string()]);
    assert_eq!(plan.waves[1].worker_ids(), vec!["w5".to_string(), "w4".to_string()]);
    assert_eq!(plan.waves[2].worker_ids(), vec!["w3".to_string()]);
    assert_eq!(plan.over_budget, vec!["w2", "w1", "w0"]);
}

#[test]
fn given_duplicate_descriptors_when_planned_then_no_worker_appears_twice() {
    let scheduler = Scheduler::new(
        vec![
            WorkerDescriptor::new("dup", PriorityTier::Normal),
            WorkerDescriptor::new("dup", PriorityTier::Normal),
            WorkerDescriptor::new("solo", PriorityTier::Normal),
        ],
        config(8, 4),
    );

    let plan = scheduler.plan(&signals(&[]), Instant::now());

    let ids: Vec<String> = plan.waves.iter().flat_map(|wave| wave.worker_ids()).collect();
    let unique: BTreeSet<&String> = ids.iter().collect();
    assert_eq!(ids.len(), unique.len());
    assert_eq!(ids.len(), 2);
}
