use concord::{
    worker::{Assessor, AssessorOutput, AssessorRule, RuleAssessor, decode_output},
    workspace::{ClaimType, StanceDimension},
};

use super::context;

fn rule(pattern: &str, claim_type: ClaimType, text: &str) -> AssessorRule {
    AssessorRule {
        pattern: pattern.to_string(),
        claim_type,
        text: text.to_string(),
        urgency: 2.0,
        confidence: 1.0,
        stance_delta: [(StanceDimension::Warmth, 0.1)].into_iter().collect(),
    }
}

#[tokio::test]
async fn given_matching_rules_when_assessed_then_output_passes_strict_decode() {
    let assessor = RuleAssessor::new(vec![
        rule(r"\bbreak\b", ClaimType::Recommendation, "a short break would help"),
        rule(r"\bdeadline\b", ClaimType::Concern, "deadline pressure"),
    ])
    .expect("rules should compile");

    let output = assessor.assess(context()).await.expect("rule assessor never fails");
    let AssessorOutput::Structured(draft) = &output else {
        panic!("rule assessor emits structured output");
    };
    assert_eq!(draft.claims.len(), 1);
    assert_eq!(draft.claims[0].text, "a short break would help");

    let decoded = decode_output(output).expect("rule output must decode");
    assert_eq!(decoded.stance_delta.get(&StanceDimension::Warmth), Some(&0.1));
}

#[test]
fn given_invalid_pattern_when_built_then_error() {
    let err = RuleAssessor::new(vec![rule("(unclosed", ClaimType::Observation, "x")])
        .err()
        .expect("invalid regex must fail");
    assert!(err.message.contains("invalid rule pattern"));
}
