//! CV enhancement: summary rewrite, per-role bullet rewrite, job adaptation.
//!
//! Flow for `adapt_cv`:
//!   KeywordExtraction → SummaryRewrite → ExperienceRewrite (×N, concurrent) →
//!   SkillMerge → Done
//!
//! Every step of an adaptation has a deterministic local fallback, so the result
//! is always a complete record even when the model is unreachable. A missing
//! credential is the exception: it aborts the adaptation with `AppError::Config`.

use std::collections::HashSet;

use futures::future::join_all;
use tracing::{info, warn};

use crate::enhance::prompts::{experience_prompt, keywords_prompt, summary_prompt};
use crate::enhance::sanitize::{extract_keywords, fallback_keywords, split_bullets, title_case};
use crate::errors::AppError;
use crate::llm_client::{LlmError, LlmGateway};
use crate::models::{CvData, ExperienceItem};

/// Returned for an empty summary instead of asking the model to invent one.
pub const FALLBACK_SUMMARY: &str =
    "Product builder focused on translating customer insight into measurable business impact.";

pub const MAX_HIGHLIGHTS: usize = 5;
pub const MAX_SKILLS: usize = 18;

/// Rewrites a summary. An empty summary yields `FALLBACK_SUMMARY` without a model call;
/// an empty model answer keeps the original.
pub async fn enhance_summary(
    llm: &dyn LlmGateway,
    summary: &str,
    context: Option<&str>,
) -> Result<String, AppError> {
    let trimmed = summary.trim();
    if trimmed.is_empty() {
        return Ok(FALLBACK_SUMMARY.to_string());
    }

    let enhanced = llm.generate_text(&summary_prompt(trimmed, context)).await?;
    if enhanced.is_empty() {
        return Ok(trimmed.to_string());
    }
    Ok(enhanced)
}

/// Rewrites one role's highlights.
///
/// `seeded_keywords` win over keywords derived from the job description; they are only
/// used when the model answer has no usable bullets.
pub async fn enhance_experience(
    llm: &dyn LlmGateway,
    experience: &ExperienceItem,
    job_description: Option<&str>,
    seeded_keywords: &[String],
) -> Result<ExperienceItem, AppError> {
    let keywords = if seeded_keywords.is_empty() {
        job_description.map(fallback_keywords).unwrap_or_default()
    } else {
        seeded_keywords.to_vec()
    };

    let prompt = experience_prompt(experience, job_description)?;
    let response = llm.generate_text(&prompt).await?;
    let suggestions = split_bullets(&response);

    if suggestions.is_empty() {
        return Ok(apply_keywords_to_experience(experience, &keywords));
    }

    Ok(ExperienceItem {
        highlights: suggestions.into_iter().take(MAX_HIGHLIGHTS).collect(),
        ..experience.clone()
    })
}

/// Asks the model for job keywords. Only a missing credential fails; any other
/// model failure falls back to local keywords.
pub async fn suggest_keywords(
    llm: &dyn LlmGateway,
    job_description: &str,
) -> Result<Vec<String>, AppError> {
    match llm.generate_text(&keywords_prompt(job_description)).await {
        Ok(response) => {
            let keywords = extract_keywords(&response);
            if keywords.is_empty() {
                warn!("Keyword extraction returned nothing usable; using local keywords");
                Ok(fallback_keywords(job_description))
            } else {
                Ok(keywords)
            }
        }
        Err(LlmError::Config) => Err(LlmError::Config.into()),
        Err(e) => {
            warn!("Keyword extraction failed, using local keywords: {e}");
            Ok(fallback_keywords(job_description))
        }
    }
}

/// Local non-AI rewrite: tags each highlight with a keyword, cycling through them.
pub fn apply_keywords_to_experience(
    experience: &ExperienceItem,
    keywords: &[String],
) -> ExperienceItem {
    let highlights = match keywords.first() {
        None => experience
            .highlights
            .iter()
            .take(MAX_HIGHLIGHTS)
            .cloned()
            .collect(),
        Some(first) if experience.highlights.is_empty() => vec![format!(
            "Delivered measurable outcomes aligned with {} priorities.",
            title_case(first)
        )],
        Some(_) => experience
            .highlights
            .iter()
            .take(MAX_HIGHLIGHTS)
            .enumerate()
            .map(|(index, line)| {
                let keyword = &keywords[index % keywords.len()];
                let line = line.strip_suffix('.').unwrap_or(line);
                format!("{line} — Demonstrated {}.", title_case(keyword))
            })
            .collect(),
    };

    ExperienceItem {
        highlights,
        ..experience.clone()
    }
}

/// Keyword-derived skills first (title-cased), then existing skills.
/// Case-insensitive dedupe, capped at `MAX_SKILLS`.
pub fn merge_skills(current: &[String], keywords: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    keywords
        .iter()
        .map(|keyword| title_case(keyword.trim()))
        .chain(current.iter().map(|skill| skill.trim().to_string()))
        .filter(|skill| !skill.is_empty() && seen.insert(skill.to_lowercase()))
        .take(MAX_SKILLS)
        .collect()
}

/// Tailors a validated CV to a job description.
///
/// Sub-step failures are logged and replaced by local fallbacks. `AppError::Config`
/// is the only error returned.
pub async fn adapt_cv(
    llm: &dyn LlmGateway,
    cv: CvData,
    job_description: &str,
) -> Result<CvData, AppError> {
    let job_description = job_description.trim();

    // KeywordExtraction
    let keywords = suggest_keywords(llm, job_description).await?;
    info!(keywords = keywords.len(), "Adapting CV to job description");

    // SummaryRewrite
    let summary_context = if keywords.is_empty() {
        job_description.to_string()
    } else {
        format!(
            "a role prioritizing {}",
            keywords.iter().take(3).cloned().collect::<Vec<_>>().join(", ")
        )
    };
    let summary = match enhance_summary(llm, &cv.personal.summary, Some(&summary_context)).await {
        Ok(summary) => summary,
        Err(e @ AppError::Config(_)) => return Err(e),
        Err(e) => {
            warn!("Summary rewrite failed, keeping original: {e}");
            cv.personal.summary.clone()
        }
    };

    // ExperienceRewrite: one independent branch per role, joined before merging.
    let keywords_ref = &keywords;
    let experience = join_all(cv.experience.iter().map(|role| async move {
        match enhance_experience(llm, role, Some(job_description), keywords_ref).await {
            Ok(rewritten) => Ok(rewritten),
            Err(e @ AppError::Config(_)) => Err(e),
            Err(e) => {
                warn!(role = %role.role, "Bullet rewrite failed, using keyword fallback: {e}");
                Ok(apply_keywords_to_experience(role, keywords_ref))
            }
        }
    }))
    .await
    .into_iter()
    .collect::<Result<Vec<_>, _>>()?;

    // SkillMerge
    let skills = merge_skills(&cv.skills, &keywords);

    let mut adapted = cv;
    adapted.personal.summary = summary;
    adapted.experience = experience;
    adapted.skills = skills;
    Ok(adapted)
}
