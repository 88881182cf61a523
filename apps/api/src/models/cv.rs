//! Canonical CV record and its schema check.
//!
//! The wire format is camelCase JSON. Every field is optional on input: missing
//! strings become `""`, missing lists become `[]`, and an explicit `null` is treated
//! as missing. A value of the wrong JSON type is rejected.

use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Input that does not conform to the CV schema.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ValidationError(pub String);

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalInfo {
    #[serde(default, deserialize_with = "null_as_default")]
    pub full_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub summary: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub email: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub phone: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub location: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub website: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub linkedin: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperienceItem {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub role: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub company: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub location: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub start_date: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub end_date: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub highlights: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EducationItem {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub school: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub degree: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub location: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub start_date: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub end_date: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub highlights: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectItem {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub summary: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub link: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub highlights: Vec<String>,
}

/// A complete CV record. List order is display order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CvData {
    #[serde(default, deserialize_with = "null_as_default")]
    pub personal: PersonalInfo,
    #[serde(default, deserialize_with = "null_as_default")]
    pub experience: Vec<ExperienceItem>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub education: Vec<EducationItem>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub projects: Vec<ProjectItem>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub skills: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub certifications: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub languages: Vec<String>,
}

const DEFAULT_SKILLS: &[&str] = &[
    "Product Strategy",
    "Stakeholder Management",
    "Data Analysis",
    "Agile Delivery",
    "Communication",
];

/// The record a new CV starts from.
pub fn default_cv() -> CvData {
    CvData {
        skills: DEFAULT_SKILLS.iter().map(|s| s.to_string()).collect(),
        ..CvData::default()
    }
}

/// Validates an arbitrary JSON candidate against the CV schema.
///
/// Requires a non-blank `personal.fullName` and an `@` in `personal.email`.
pub fn parse_cv(candidate: Value) -> Result<CvData, ValidationError> {
    if !candidate.is_object() {
        return Err(ValidationError("CV must be a JSON object".to_string()));
    }

    let cv: CvData = parse_section(candidate)?;

    if cv.personal.full_name.trim().is_empty() {
        return Err(ValidationError("personal.fullName is required".to_string()));
    }
    if !cv.personal.email.contains('@') {
        return Err(ValidationError(
            "personal.email must be a valid email address".to_string(),
        ));
    }

    Ok(cv)
}

/// Decodes one fragment of a CV (an experience entry, the personal block, ...).
pub fn parse_section<T: DeserializeOwned>(candidate: Value) -> Result<T, ValidationError> {
    serde_json::from_value(candidate).map_err(|e| ValidationError(format!("Invalid CV data: {e}")))
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
