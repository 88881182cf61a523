//! Structured résumé import through the model.
//!
//! The model answer is untrusted: it is cut down to its JSON object, the personal
//! block is repaired with placeholders, and the result must pass the CV schema in
//! full. A record that fails is rejected whole.

use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::enhance::sanitize::extract_json_object;
use crate::errors::AppError;
use crate::import::prompts::import_prompt;
use crate::llm_client::LlmGateway;
use crate::models::{ensure_ids, parse_cv, CvData};

pub const PLACEHOLDER_NAME: &str = "Candidate";
pub const PLACEHOLDER_EMAIL: &str = "candidate@example.com";

const PREVIEW_CHARS: usize = 500;
const PERSONAL_TEXT_FIELDS: &[&str] = &["title", "summary", "phone", "location", "website", "linkedin"];

fn preview(text: &str) -> String {
    text.chars().take(PREVIEW_CHARS).collect()
}

fn trimmed_string(value: Option<&Value>) -> String {
    value
        .and_then(Value::as_str)
        .map(|s| s.trim().to_string())
        .unwrap_or_default()
}

/// Repairs the `personal` block of a raw model record.
///
/// A blank name or an address without `@` is replaced by a placeholder; other fields
/// become trimmed strings, with non-string values dropped to `""`.
pub fn sanitize_personal(personal: Option<&Value>) -> Value {
    let empty = Map::new();
    let personal = personal.and_then(Value::as_object).unwrap_or(&empty);

    let full_name = trimmed_string(personal.get("fullName"));
    let email = trimmed_string(personal.get("email"));

    let mut out = Map::new();
    out.insert(
        "fullName".to_string(),
        Value::String(if full_name.is_empty() {
            PLACEHOLDER_NAME.to_string()
        } else {
            full_name
        }),
    );
    out.insert(
        "email".to_string(),
        Value::String(if email.contains('@') {
            email
        } else {
            PLACEHOLDER_EMAIL.to_string()
        }),
    );
    for field in PERSONAL_TEXT_FIELDS {
        out.insert(
            field.to_string(),
            Value::String(trimmed_string(personal.get(*field))),
        );
    }

    Value::Object(out)
}

/// Converts free résumé text into a validated CV with stable ids.
pub async fn import_cv(llm: &dyn LlmGateway, resume_text: &str) -> Result<CvData, AppError> {
    let trimmed = resume_text.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation("Resume content is empty".to_string()));
    }
    debug!(chars = trimmed.len(), "Importing resume: {}", preview(trimmed));

    let response = llm.generate_text(&import_prompt(trimmed)).await?;
    debug!(chars = response.len(), "Import response: {}", preview(&response));

    let payload = extract_json_object(&response)?;
    let mut parsed: Value = serde_json::from_str(&payload)
        .map_err(|e| AppError::MalformedResponse(format!("Import JSON could not be decoded: {e}")))?;

    let Some(record) = parsed.as_object_mut() else {
        return Err(AppError::MalformedResponse(
            "Import response is not a JSON object".to_string(),
        ));
    };
    let personal = sanitize_personal(record.get("personal"));
    record.insert("personal".to_string(), personal);

    let cv = parse_cv(parsed).map_err(|e| AppError::MalformedResponse(e.to_string()))?;
    let cv = ensure_ids(cv);

    info!(
        experience = cv.experience.len(),
        education = cv.education.len(),
        projects = cv.projects.len(),
        skills = cv.skills.len(),
        "Resume imported"
    );

    Ok(cv)
}
