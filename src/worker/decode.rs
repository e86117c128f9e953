use std::sync::LazyLock;

use jsonschema::JSONSchema;
use serde_json::Value;
use validator::Validate;

use crate::worker::{
    error::{WorkerError, invalid_output},
    types::{AssessorOutput, ProposalDraft},
};

static PROPOSAL_SCHEMA: LazyLock<Result<JSONSchema, String>> = LazyLock::new(|| {
    let schema = serde_json::to_value(schemars::schema_for!(ProposalDraft))
        .map_err(|err| format!("failed to render proposal schema: {err}"))?;
    JSONSchema::compile(&schema).map_err(|err| format!("failed to compile proposal schema: {err}"))
});

/// JSON Schema of the proposal wire format, as handed to external generators.
pub fn proposal_schema() -> Value {
    serde_json::to_value(schemars::schema_for!(ProposalDraft)).unwrap_or(Value::Null)
}

/// Strict decode: fails closed on anything that is not exactly a valid proposal.
pub fn decode_output(output: AssessorOutput) -> Result<ProposalDraft, WorkerError> {
    let draft = match output {
        AssessorOutput::Structured(draft) => draft,
        AssessorOutput::Raw(text) => decode_raw(&text)?,
    };
    validate_draft(&draft)?;
    Ok(draft)
}

pub fn decode_raw(text: &str) -> Result<ProposalDraft, WorkerError> {
    let value: Value = serde_json::from_str(text.trim())
        .map_err(|err| invalid_output(format!("worker output is not valid JSON: {err}")))?;
    check_schema(&value)?;
    serde_json::from_value(value)
        .map_err(|err| invalid_output(format!("worker output does not match proposal: {err}")))
}

fn check_schema(value: &Value) -> Result<(), WorkerError> {
    let compiled = PROPOSAL_SCHEMA.as_ref().map_err(|err| invalid_output(err.clone()))?;
    match compiled.validate(value) {
        Ok(()) => Ok(()),
        Err(errors) => {
            let messages: Vec<String> = errors.map(|error| error.to_string()).collect();
            Err(invalid_output(format!(
                "worker output failed schema validation: {}",
                messages.join("; ")
            )))
        }
    }
}

fn validate_draft(draft: &ProposalDraft) -> Result<(), WorkerError> {
    draft
        .validate()
        .map_err(|errs| invalid_output(format!("worker output failed validation: {errs}")))?;

    let mut numbers = vec![draft.urgency, draft.confidence];
    numbers.extend(draft.stance_delta.values().copied());
    for claim in &draft.claims {
        if claim.text.trim().is_empty() {
            return Err(invalid_output("claim text cannot be blank"));
        }
        numbers.push(claim.urgency);
        numbers.push(claim.confidence);
    }
    if numbers.iter().any(|number| !number.is_finite()) {
        return Err(invalid_output("worker output contains a non-finite number"));
    }
    Ok(())
}
