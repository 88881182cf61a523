//! Cleans raw model text into bullets, keywords, and JSON payloads.
//!
//! Everything here is pure and deterministic; the fallback keyword extractor is
//! what the enhancement pipeline uses whenever the model gives nothing usable.

use std::collections::HashSet;

use thiserror::Error;

/// Cap on keywords taken from a model answer.
pub const MAX_MODEL_KEYWORDS: usize = 12;
/// Cap on keywords derived locally from a job description.
pub const MAX_FALLBACK_KEYWORDS: usize = 10;

const MIN_BULLET_CHARS: usize = 5;
const MIN_FALLBACK_TOKEN_CHARS: usize = 3;
const CODE_FENCE: &str = "```";

/// Filler words that would otherwise survive the fallback length filter.
const STOPWORDS: &[&str] = &[
    "about", "able", "also", "and", "any", "are", "been", "being", "but", "can", "could",
    "for", "from", "has", "have", "how", "into", "its", "join", "looking", "more", "must",
    "not", "our", "out", "per", "seeking", "should", "such", "than", "that", "the", "their",
    "them", "then", "they", "this", "very", "via", "was", "were", "what", "who", "why",
    "will", "with", "would", "you", "your",
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("AI response did not include a JSON object")]
pub struct MalformedJson;

fn is_bullet_marker(c: char) -> bool {
    matches!(c, '-' | '*' | '•' | '.' | ')') || c.is_ascii_digit() || c.is_whitespace()
}

/// Strips a leading list marker (`-`, `*`, `•`, `1.`, `2)`) and collapses whitespace.
pub fn sanitize_bullet(line: &str) -> String {
    line.trim_start_matches(is_bullet_marker)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Splits newline-separated model output into clean bullets of at least 5 characters.
pub fn split_bullets(text: &str) -> Vec<String> {
    text.split('\n')
        .map(sanitize_bullet)
        .filter(|line| line.chars().count() >= MIN_BULLET_CHARS)
        .collect()
}

/// Parses a comma/semicolon/newline separated keyword answer.
///
/// Output is lowercase, free of duplicates, first-seen order, at most 12 entries.
pub fn extract_keywords(text: &str) -> Vec<String> {
    dedupe(
        text.split([',', ';', '\n'])
            .map(|item| item.trim().to_lowercase())
            .filter(|item| item.chars().count() > 2),
    )
    .into_iter()
    .take(MAX_MODEL_KEYWORDS)
    .collect()
}

/// Derives keywords locally from free text, without a model.
pub fn fallback_keywords(source: &str) -> Vec<String> {
    let normalized: String = source
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { ' ' })
        .collect();

    dedupe(
        normalized
            .split_whitespace()
            .filter(|token| token.len() >= MIN_FALLBACK_TOKEN_CHARS)
            .filter(|token| !STOPWORDS.contains(token))
            .map(str::to_string),
    )
    .into_iter()
    .take(MAX_FALLBACK_KEYWORDS)
    .collect()
}

/// Upper-cases the first character of every space-separated word.
pub fn title_case(input: &str) -> String {
    input
        .split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Removes a wrapping code fence. The opening line (```json) and closing line go.
fn strip_code_fences(input: &str) -> String {
    let trimmed = input.trim();
    if !trimmed.starts_with(CODE_FENCE) {
        return trimmed.to_string();
    }

    let mut lines: Vec<&str> = trimmed.split('\n').collect();
    if lines.first().is_some_and(|line| line.starts_with(CODE_FENCE)) {
        lines.remove(0);
    }
    if lines.last().is_some_and(|line| line.starts_with(CODE_FENCE)) {
        lines.pop();
    }
    lines.join("\n").trim().to_string()
}

/// Returns the text from the first `{` to the last `}` inclusive, after fence removal.
pub fn extract_json_object(text: &str) -> Result<String, MalformedJson> {
    let cleaned = strip_code_fences(text);
    match (cleaned.find('{'), cleaned.rfind('}')) {
        (Some(start), Some(end)) if end > start => Ok(cleaned[start..=end].to_string()),
        _ => Err(MalformedJson),
    }
}

/// Drops empty strings and later duplicates, keeping first-seen order.
fn dedupe(values: impl Iterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .filter(|value| !value.is_empty() && seen.insert(value.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_bullet_strips_markers() {
        assert_eq!(sanitize_bullet("- Led a team"), "Led a team");
        assert_eq!(sanitize_bullet("• Shipped   the   app"), "Shipped the app");
        assert_eq!(sanitize_bullet("  12) Cut costs by 20%"), "Cut costs by 20%");
        assert_eq!(sanitize_bullet("*** 3. Grew revenue"), "Grew revenue");
        assert_eq!(sanitize_bullet("Built\tthings\r"), "Built things");
    }

    #[test]
    fn test_sanitize_bullet_never_leaves_marker_or_double_space() {
        let inputs = [
            "-", "", "   ", "1.2.3", "- - - x", "•• a  b", "9) 8) 7) item", "*\t*\tx   y",
            ". ) leading", "—dash stays",
        ];
        for input in inputs {
            let out = sanitize_bullet(input);
            assert!(
                !out.starts_with(is_bullet_marker),
                "leading marker left in {out:?} from {input:?}"
            );
            assert!(!out.contains("  "), "double space left in {out:?}");
        }
    }

    #[test]
    fn test_split_bullets_drops_short_lines() {
        let text = "- Led migration to Rust\n\n\n* ok\n2. Reduced p99 latency by 40%\n-\n";
        assert_eq!(
            split_bullets(text),
            vec![
                "Led migration to Rust".to_string(),
                "Reduced p99 latency by 40%".to_string()
            ]
        );
    }

    #[test]
    fn test_extract_keywords() {
        let text = "Python, AWS; kubernetes\npython, go, CI/CD, aws , Terraform";
        assert_eq!(
            extract_keywords(text),
            vec!["python", "aws", "kubernetes", "ci/cd", "terraform"]
        );
    }

    #[test]
    fn test_extract_keywords_is_capped_and_unique() {
        let text = (0..40)
            .map(|i| format!("Skill{}", i % 20))
            .collect::<Vec<_>>()
            .join(", ");
        let keywords = extract_keywords(&text);
        assert_eq!(keywords.len(), MAX_MODEL_KEYWORDS);
        let unique: HashSet<_> = keywords.iter().map(|k| k.to_lowercase()).collect();
        assert_eq!(unique.len(), keywords.len());
    }

    #[test]
    fn test_fallback_keywords() {
        assert_eq!(
            fallback_keywords("Looking for a Python and AWS engineer"),
            vec!["python", "aws", "engineer"]
        );
        assert_eq!(
            fallback_keywords("Rust/Go (backend) — rust, distributed-systems!"),
            vec!["rust", "backend", "distributed", "systems"]
        );
    }

    #[test]
    fn test_fallback_keywords_cap() {
        let text = (0..30).map(|i| format!("token{i}")).collect::<Vec<_>>().join(" ");
        assert_eq!(fallback_keywords(&text).len(), MAX_FALLBACK_KEYWORDS);
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("aws"), "Aws");
        assert_eq!(title_case("machine learning"), "Machine Learning");
        assert_eq!(title_case("ci/cd  pipelines"), "Ci/cd  Pipelines");
    }

    #[test]
    fn test_extract_json_object_from_fence() {
        let inner = "{\n  \"personal\": {\"fullName\": \"Ada\"}\n}";
        let fenced = format!("```json\n{inner}\n```");
        assert_eq!(extract_json_object(&fenced).unwrap(), inner);
    }

    #[test]
    fn test_extract_json_object_with_prose() {
        let text = "Sure! Here is the data: {\"a\": {\"b\": 1}} Hope that helps.";
        assert_eq!(extract_json_object(text).unwrap(), "{\"a\": {\"b\": 1}}");
    }

    #[test]
    fn test_extract_json_object_failures() {
        assert_eq!(extract_json_object("no json here"), Err(MalformedJson));
        assert_eq!(extract_json_object("} backwards {"), Err(MalformedJson));
        assert_eq!(extract_json_object("```\n```"), Err(MalformedJson));
    }
}
