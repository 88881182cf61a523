//! Two-step headshot pipeline: vision critique, then image generation.

use tracing::{info, warn};

use crate::errors::AppError;
use crate::llm_client::{GeneratedImage, LlmGateway};
use crate::photo::prompts::{HEADSHOT_PROMPT, PHOTO_ANALYSIS_PROMPT};

/// Produces a professional headshot from an uploaded photo.
///
/// A blank critique is `AnalysisFailed`. When the image model returns no image the
/// caller gets `NeedsBasicEnhancement` with the critique, so it can fall back to
/// local adjustments.
pub async fn enhance_photo(
    llm: &dyn LlmGateway,
    image: &[u8],
    mime_type: &str,
) -> Result<GeneratedImage, AppError> {
    let analysis = llm
        .analyze_image(image, mime_type, PHOTO_ANALYSIS_PROMPT)
        .await?;
    let analysis = analysis.trim();
    if analysis.is_empty() {
        return Err(AppError::AnalysisFailed(
            "Vision model returned an empty analysis".to_string(),
        ));
    }
    info!(chars = analysis.len(), "Photo analyzed");

    match llm.generate_image(HEADSHOT_PROMPT, analysis).await? {
        Some(generated) => {
            info!(bytes = generated.data.len(), mime_type = %generated.mime_type, "Headshot generated");
            Ok(generated)
        }
        None => {
            warn!("Image model returned no image; basic enhancement required");
            Err(AppError::NeedsBasicEnhancement {
                analysis: analysis.to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::testing::ScriptedGateway;
    use crate::llm_client::LlmError;

    fn png() -> GeneratedImage {
        GeneratedImage {
            data: vec![0x89, b'P', b'N', b'G'],
            mime_type: "image/png".to_string(),
        }
    }

    #[tokio::test]
    async fn test_generated_image_is_returned() {
        let llm = ScriptedGateway::with_photo(|| Ok("Casual shirt, cluttered room.".into()), || Ok(Some(png())));
        let image = enhance_photo(&llm, b"jpeg", "image/jpeg").await.unwrap();
        assert_eq!(image, png());
    }

    #[tokio::test]
    async fn test_no_image_needs_basic_enhancement() {
        let llm = ScriptedGateway::with_photo(|| Ok("  Good lighting, busy background. ".into()), || Ok(None));
        match enhance_photo(&llm, b"jpeg", "image/jpeg").await {
            Err(AppError::NeedsBasicEnhancement { analysis }) => {
                assert_eq!(analysis, "Good lighting, busy background.")
            }
            other => panic!("expected NeedsBasicEnhancement, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_blank_analysis_fails() {
        let llm = ScriptedGateway::with_photo(|| Ok("   ".into()), || Ok(Some(png())));
        let result = enhance_photo(&llm, b"jpeg", "image/jpeg").await;
        assert!(matches!(result, Err(AppError::AnalysisFailed(_))));
    }

    #[tokio::test]
    async fn test_quota_stays_distinct() {
        let llm = ScriptedGateway::with_photo(
            || Ok("Fine.".into()),
            || Err(LlmError::QuotaExceeded("RESOURCE_EXHAUSTED".into())),
        );
        let result = enhance_photo(&llm, b"jpeg", "image/jpeg").await;
        assert!(matches!(result, Err(AppError::QuotaExceeded(_))));
    }
}
