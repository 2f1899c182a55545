pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::services::ServeDir;

use crate::cv::handlers::handle_process_cv;
use crate::pdf::handlers::handle_generate_pdf;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let static_files = ServeDir::new(&state.config.public_dir);
    let body_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/apis/health", get(health::health_handler))
        .route("/apis/cv/process", post(handle_process_cv))
        .route("/apis/pdf/generate", post(handle_generate_pdf))
        .layer(DefaultBodyLimit::max(body_limit))
        .fallback_service(static_files)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::config::Config;
    use crate::llm_client::mock::MockChatModel;
    use crate::pdf::render::testing::FakeRenderer;

    fn app() -> (Router, Arc<FakeRenderer>) {
        let renderer = Arc::new(FakeRenderer::default());
        let state = AppState {
            llm: Arc::new(MockChatModel::new()),
            renderer: renderer.clone(),
            config: Config::for_tests(),
        };
        (build_router(state), renderer)
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _) = app();
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/apis/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json, json!({"status": "ok", "message": "API is running"}));
    }

    #[tokio::test]
    async fn test_generate_pdf_returns_attachment() {
        let (app, renderer) = app();
        let cv = json!({
            "firstName": "John",
            "objective": "Licensed electrician",
            "skills": {"Electrical": "Lighting"},
            "experience": [{
                "company": "ZMS Electrical",
                "position": "Electrician",
                "period": "2022-2023",
                "responsibilities": ["Commercial Solar works"]
            }]
        });

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/apis/pdf/generate")
                    .header("content-type", "application/json")
                    .body(Body::from(cv.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["content-type"], "application/pdf");
        assert_eq!(
            response.headers()["content-disposition"],
            "attachment; filename=John-cv.pdf"
        );
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert!(body.starts_with(b"%PDF-"));

        let html = renderer.last_html.lock().unwrap().clone().unwrap();
        assert!(html.contains("<p>ZMS Electrical | 2022-2023</p>"));
    }

    #[tokio::test]
    async fn test_generate_pdf_without_name_is_untitled() {
        let (app, _) = app();
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/apis/pdf/generate")
                    .header("content-type", "application/json")
                    .body(Body::from("{}"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()["content-disposition"],
            "attachment; filename=untitled-cv.pdf"
        );
    }
}
