// Shared prompt fragments used by more than one feature.
// Each feature that calls the model keeps its own prompts.rs alongside it.

/// Directive appended to every prompt whose answer is shown as prose.
pub const PLAIN_TEXT_ONLY: &str = "Respond in plain text only. \
    Do not use markdown, headings, bullet symbols, numbering, or asterisks.";

/// Upper bound on how much of a photo critique is fed back into the image prompt.
const MAX_REFERENCE_CHARS: usize = 1200;

/// Folds a free-text photo critique into an image-generation prompt.
pub fn with_reference_notes(prompt: &str, reference_analysis: &str) -> String {
    let notes = reference_analysis.trim();
    if notes.is_empty() {
        return prompt.to_string();
    }
    let notes: String = notes.chars().take(MAX_REFERENCE_CHARS).collect();
    format!("{prompt}\n\nReference notes about the original photo (use them loosely):\n{notes}")
}
