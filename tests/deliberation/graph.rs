use concord::{
    deliberation::{ArgumentGraph, EdgeKind, PolarityMarkers},
    workspace::ClaimType,
};

use super::{claim, no_aliases};

#[test]
fn given_no_claims_when_scored_then_consensus_is_full() {
    let graph = ArgumentGraph::build(&[], &no_aliases(), &PolarityMarkers::default());
    let consensus = graph.consensus(5);
    assert_eq!(consensus.overall_score, 1.0);
    assert!(consensus.top_claims.is_empty());
    assert!(consensus.contested_claims.is_empty());
}

#[test]
fn given_polar_recommendations_when_built_then_inferred_opposition_contests_both() {
    let claims = vec![
        claim("c1", "planner", ClaimType::Recommendation, "you should take a break", 2.0, 2.0),
        claim("c2", "skeptic", ClaimType::Recommendation, "you should not take a break", 2.0, 2.0),
    ];
    let graph = ArgumentGraph::build(&claims, &no_aliases(), &PolarityMarkers::default());

    assert_eq!(graph.edges().len(), 2);
    assert!(graph.edges().iter().all(|edge| edge.inferred && edge.kind == EdgeKind::Opposes));
    let node = graph.node("c1").expect("node exists");
    assert!((node.opposition_strength - 0.5).abs() < 1e-12);

    let consensus = graph.consensus(5);
    assert_eq!(consensus.contested_claims, vec!["c1".to_string(), "c2".to_string()]);
    assert!((consensus.overall_score - 0.5).abs() < 1e-12);

    let authors: Vec<String> = graph.follow_up_authors().into_iter().collect();
    assert_eq!(authors, vec!["planner".to_string(), "skeptic".to_string()]);
}

#[test]
fn given_low_urgency_opposition_when_built_then_not_contested() {
    let claims = vec![
        claim("c1", "a", ClaimType::Recommendation, "we should rest", 1.0, 2.0),
        claim("c2", "b", ClaimType::Recommendation, "we should not rest", 1.0, 2.0),
    ];
    let graph = ArgumentGraph::build(&claims, &no_aliases(), &PolarityMarkers::default());
    assert!(graph.consensus(5).contested_claims.is_empty());
}

#[test]
fn given_more_support_when_scored_then_consensus_does_not_drop() {
    let mut claims = vec![
        claim("c1", "planner", ClaimType::Recommendation, "take a walk", 2.0, 2.0),
        claim("c2", "skeptic", ClaimType::Concern, "walking may tire the user", 2.0, 2.0),
    ];
    claims[1].opposes = vec!["c1".to_string()];
    let markers = PolarityMarkers::default();
    let before = ArgumentGraph::build(&claims, &no_aliases(), &markers).consensus(5);

    let mut supporter = claim("c3", "coach", ClaimType::Observation, "fresh air helps mood", 1.0, 3.0);
    supporter.supports = vec!["c1".to_string()];
    claims.push(supporter);
    let after = ArgumentGraph::build(&claims, &no_aliases(), &markers).consensus(5);

    assert!(after.overall_score >= before.overall_score);
    let c1_before = before.top_claims.iter().find(|ranked| ranked.claim_id == "c1").expect("ranked");
    let c1_after = after.top_claims.iter().find(|ranked| ranked.claim_id == "c1").expect("ranked");
    assert!(c1_after.score > c1_before.score);
}

#[test]
fn given_alias_reference_when_built_then_edge_resolves_to_surviving_claim() {
    let mut opposer = claim("c2", "b", ClaimType::Concern, "too risky", 2.0, 3.0);
    opposer.opposes = vec!["absorbed".to_string()];
    let claims = vec![
        claim("c1", "a", ClaimType::Recommendation, "go for a run", 2.0, 3.0),
        opposer,
    ];
    let aliases = [("absorbed".to_string(), "c1".to_string())].into_iter().collect();
    let graph = ArgumentGraph::build(&claims, &aliases, &PolarityMarkers::default());

    let node = graph.node("c1").expect("node exists");
    assert_eq!(node.opposers, vec!["c2".to_string()]);
    assert!(node.is_contested());
}

#[test]
fn given_many_claims_when_ranked_then_top_k_limits_and_orders_by_score() {
    let claims = vec![
        claim("low", "a", ClaimType::Observation, "the sky is grey", 1.0, 1.0),
        claim("high", "b", ClaimType::Concern, "user skipped meals", 3.0, 3.0),
        claim("mid", "c", ClaimType::Recommendation, "eat something small", 2.0, 2.0),
    ];
    let graph = ArgumentGraph::build(&claims, &no_aliases(), &PolarityMarkers::default());
    let consensus = graph.consensus(2);
    let ids: Vec<&str> = consensus.top_claims.iter().map(|ranked| ranked.claim_id.as_str()).collect();
    assert_eq!(ids, vec!["high", "mid"]);
    assert_eq!(consensus.overall_score, 1.0);
}
