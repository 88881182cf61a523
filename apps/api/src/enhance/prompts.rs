// Prompt builders for summary, bullet, and keyword tasks.
// Pure string construction: nothing here touches the network.

use crate::errors::AppError;
use crate::llm_client::prompts::PLAIN_TEXT_ONLY;
use crate::models::ExperienceItem;

/// Joins non-empty fragments with newlines.
fn assemble(fragments: &[String]) -> String {
    fragments
        .iter()
        .filter(|fragment| !fragment.trim().is_empty())
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join("\n")
}

fn optional(prefix: &str, value: Option<&str>) -> String {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(value) => format!("{prefix}{value}"),
        None => String::new(),
    }
}

/// Prompt for rewriting a professional summary. `summary` must already be trimmed.
pub fn summary_prompt(summary: &str, context: Option<&str>) -> String {
    assemble(&[
        "You are a career coach polishing a professional summary.".to_string(),
        optional("Context: ", context),
        "Rewrite the summary to sound confident, results-oriented, and concise \
         (max 3 sentences, under 75 words)."
            .to_string(),
        "Avoid bullet points and keep the meaning consistent.".to_string(),
        PLAIN_TEXT_ONLY.to_string(),
        format!("Summary: \"\"\"{summary}\"\"\""),
    ])
}

/// Prompt for rewriting one role's highlights as 3 to 4 newline-separated bullets.
pub fn experience_prompt(
    experience: &ExperienceItem,
    job_description: Option<&str>,
) -> Result<String, AppError> {
    let experience_json = serde_json::to_string(experience).map_err(|e| {
        AppError::Internal(anyhow::anyhow!("Failed to serialize experience entry: {e}"))
    })?;

    Ok(assemble(&[
        "You are refreshing resume bullet points for a senior professional.".to_string(),
        optional("Align with the following job focus: ", job_description),
        format!("Here is the experience entry as JSON: {experience_json}"),
        "Return between 3 and 4 bullet sentences, each under 22 words.".to_string(),
        "Each bullet must start with a strong verb, include measurable outcomes when possible, \
         and avoid numbering or special characters."
            .to_string(),
        "Respond with plain text bullets separated by newline characters only. \
         Do not use markdown, dashes, bullet symbols, or asterisks."
            .to_string(),
    ]))
}

/// Prompt for pulling core skills out of a job description.
pub fn keywords_prompt(job_description: &str) -> String {
    assemble(&[
        "Extract up to 12 core skills or themes from this job description.".to_string(),
        "Return them as a comma-separated list of short lowercase phrases \
         without numbering or commentary."
            .to_string(),
        PLAIN_TEXT_ONLY.to_string(),
        format!("Job description: \"\"\"{}\"\"\"", job_description.trim()),
    ])
}
