pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::enhance::handlers as enhance;
use crate::import::handlers as import;
use crate::photo::handlers as photo;
use crate::render::handlers as render;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/health", get(health::health_handler))
        // Enhancement API
        .route("/api/v1/ai/summary", post(enhance::handle_enhance_summary))
        .route(
            "/api/v1/ai/experience",
            post(enhance::handle_enhance_experience),
        )
        .route("/api/v1/ai/adapt", post(enhance::handle_adapt_cv))
        // Import API
        .route("/api/v1/ai/import", post(import::handle_import_text))
        .route("/api/v1/ai/import/file", post(import::handle_import_file))
        // Photo API
        .route("/api/v1/ai/photo", post(photo::handle_enhance_photo))
        // Export API
        .route("/api/v1/export", post(render::handle_export_pdf))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use axum::response::Response;
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::config::Config;
    use crate::llm_client::testing::ScriptedGateway;
    use crate::llm_client::{GeneratedImage, LlmError};

    const BOUNDARY: &str = "optimumcv-test-boundary";

    fn app(gateway: ScriptedGateway) -> Router {
        build_router(AppState {
            llm: Arc::new(gateway),
            config: Config::default(),
        })
    }

    fn json_request(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn multipart_request(uri: &str, field: &str, file_name: &str, content_type: &str, data: &[u8]) -> Request<Body> {
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn sample_cv() -> Value {
        json!({
            "personal": {
                "fullName": "Ada Lovelace",
                "email": "ada@example.com",
                "summary": "Engineer who ships."
            },
            "experience": [
                {"id": "exp1", "role": "Engineer", "company": "Acme", "highlights": ["Built the billing service."]}
            ],
            "skills": ["Rust"]
        })
    }

    #[tokio::test]
    async fn test_health_reports_credential_state() {
        let response = app(ScriptedGateway::unconfigured())
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["genaiConfigured"], false);
    }

    #[tokio::test]
    async fn test_empty_summary_returns_fallback() {
        let response = app(ScriptedGateway::unconfigured())
            .oneshot(json_request("/api/v1/ai/summary", json!({"summary": ""})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(
            body["summary"],
            crate::enhance::orchestrator::FALLBACK_SUMMARY
        );
    }

    #[tokio::test]
    async fn test_missing_credential_is_503() {
        let response = app(ScriptedGateway::unconfigured())
            .oneshot(json_request(
                "/api/v1/ai/summary",
                json!({"summary": "I build things."}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "CONFIG_ERROR");
        assert_eq!(
            body["error"]["message"],
            "GOOGLE_GENAI_API_KEY is not configured"
        );
    }

    #[tokio::test]
    async fn test_experience_uses_seeded_keywords() {
        let response = app(ScriptedGateway::with_text(|_| Ok(String::new())))
            .oneshot(json_request(
                "/api/v1/ai/experience",
                json!({
                    "experience": {"id": "exp1", "role": "Engineer", "highlights": ["Shipped v2."]},
                    "jobDescription": "Python developer",
                    "keywords": ["observability"]
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(
            body["experience"]["highlights"][0],
            "Shipped v2 — Demonstrated Observability."
        );
    }

    #[tokio::test]
    async fn test_adapt_survives_model_outage() {
        let response = app(ScriptedGateway::unavailable())
            .oneshot(json_request(
                "/api/v1/ai/adapt",
                json!({"cv": sample_cv(), "jobDescription": "Looking for a Python and AWS engineer"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        let skills: Vec<&str> = body["cv"]["skills"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(Value::as_str)
            .collect();
        assert!(skills.contains(&"Python"));
        assert!(skills.contains(&"Aws"));
        assert!(skills.contains(&"Rust"));
        assert_eq!(body["cv"]["personal"]["summary"], "Engineer who ships.");
    }

    #[tokio::test]
    async fn test_adapt_without_credential_is_503() {
        let response = app(ScriptedGateway::unconfigured())
            .oneshot(json_request(
                "/api/v1/ai/adapt",
                json!({"cv": sample_cv(), "jobDescription": "Rust engineer"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "CONFIG_ERROR");
        assert_eq!(
            body["error"]["message"],
            "GOOGLE_GENAI_API_KEY is not configured"
        );
    }

    #[tokio::test]
    async fn test_adapt_rejects_bad_input() {
        let missing_jd = app(ScriptedGateway::unavailable())
            .oneshot(json_request(
                "/api/v1/ai/adapt",
                json!({"cv": sample_cv(), "jobDescription": "  "}),
            ))
            .await
            .unwrap();
        assert_eq!(missing_jd.status(), StatusCode::BAD_REQUEST);

        let invalid_cv = app(ScriptedGateway::unavailable())
            .oneshot(json_request(
                "/api/v1/ai/adapt",
                json!({"cv": {"personal": {"fullName": "Ada", "email": "nope"}}, "jobDescription": "Rust"}),
            ))
            .await
            .unwrap();
        assert_eq!(invalid_cv.status(), StatusCode::BAD_REQUEST);
        let body = body_json(invalid_cv).await;
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_import_text() {
        let gateway = ScriptedGateway::with_text(|_| {
            Ok("```json\n{\"personal\": {\"fullName\": \"Ada Lovelace\", \"email\": \"ada@example.com\"}, \"skills\": [\"Math\"]}\n```".to_string())
        });
        let response = app(gateway)
            .oneshot(json_request(
                "/api/v1/ai/import",
                json!({"text": "Ada Lovelace\nada@example.com"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["cv"]["personal"]["fullName"], "Ada Lovelace");
        assert_eq!(body["cv"]["skills"], json!(["Math"]));
    }

    #[tokio::test]
    async fn test_import_quota_is_429() {
        let gateway = ScriptedGateway::with_text(|_| {
            Err(LlmError::QuotaExceeded("RESOURCE_EXHAUSTED".to_string()))
        });
        let response = app(gateway)
            .oneshot(json_request("/api/v1/ai/import", json!({"text": "Ada"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "QUOTA_EXCEEDED");
    }

    #[tokio::test]
    async fn test_import_text_file_upload() {
        let gateway = ScriptedGateway::with_text(|prompt| {
            assert!(prompt.contains("Ada Lovelace, analyst"));
            Ok(r#"{"personal": {"fullName": "Ada Lovelace", "email": "ada@example.com"}}"#.to_string())
        });
        let response = app(gateway)
            .oneshot(multipart_request(
                "/api/v1/ai/import/file",
                "file",
                "cv.txt",
                "text/plain",
                b"Ada Lovelace, analyst",
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["pageCount"], 1);
        assert_eq!(body["cv"]["personal"]["fullName"], "Ada Lovelace");
    }

    #[tokio::test]
    async fn test_photo_rejects_non_image() {
        let response = app(ScriptedGateway::unavailable())
            .oneshot(multipart_request(
                "/api/v1/ai/photo",
                "photo",
                "notes.txt",
                "text/plain",
                b"hello",
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_photo_returns_data_url() {
        let gateway = ScriptedGateway::with_photo(
            || Ok("Casual attire.".to_string()),
            || {
                Ok(Some(GeneratedImage {
                    data: vec![1, 2, 3],
                    mime_type: "image/png".to_string(),
                }))
            },
        );
        let response = app(gateway)
            .oneshot(multipart_request(
                "/api/v1/ai/photo",
                "photo",
                "me.jpg",
                "image/jpeg",
                b"\xff\xd8\xff",
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["photoUrl"], "data:image/png;base64,AQID");
    }

    #[tokio::test]
    async fn test_photo_without_image_is_422_with_analysis() {
        let gateway = ScriptedGateway::with_photo(|| Ok("Busy background.".to_string()), || Ok(None));
        let response = app(gateway)
            .oneshot(multipart_request(
                "/api/v1/ai/photo",
                "photo",
                "me.jpg",
                "image/jpeg",
                b"\xff\xd8\xff",
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "NEEDS_BASIC_ENHANCEMENT");
        assert_eq!(body["error"]["analysis"], "Busy background.");
    }

    #[tokio::test]
    async fn test_export_pdf_headers() {
        let response = app(ScriptedGateway::unconfigured())
            .oneshot(json_request("/api/v1/export", json!({"cv": sample_cv()})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers();
        assert_eq!(headers[header::CONTENT_TYPE], "application/pdf");
        assert_eq!(headers[header::CACHE_CONTROL], "private, max-age=0, no-cache");
        assert!(headers[header::CONTENT_DISPOSITION]
            .to_str()
            .unwrap()
            .starts_with("attachment; filename=\"Ada-Lovelace-CV.pdf\""));

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[tokio::test]
    async fn test_export_invalid_cv_is_400() {
        let response = app(ScriptedGateway::unconfigured())
            .oneshot(json_request(
                "/api/v1/export",
                json!({"cv": {"personal": {"fullName": 42, "email": "ada@example.com"}}}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"]["message"], "Unable to generate PDF");
    }
}
