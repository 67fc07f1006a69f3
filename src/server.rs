//! HTTP surface: the page plus a small JSON API over the controller.

use std::sync::Arc;

use axum::{
    extract::{multipart::MultipartError, DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{Html, IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use thiserror::Error;
use tokio::task::JoinError;
use tower_http::cors::CorsLayer;

use crate::controller::{AppController, Snapshot};
use crate::error::IngestError;
use crate::gemini::Analyzer;
use crate::ingest::ImageBlob;
use crate::page::INDEX_HTML;

type Shared<A> = Arc<AppController<A>>;

#[derive(Debug, Error)]
enum ApiError {
    #[error("No image was uploaded")]
    MissingImage,
    #[error(transparent)]
    Multipart(#[from] MultipartError),
    #[error(transparent)]
    Invalid(#[from] IngestError),
    #[error("Analysis task failed: {0}")]
    Task(#[from] JoinError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::MissingImage => (StatusCode::BAD_REQUEST, self.to_string()),
            ApiError::Multipart(e) => (e.status(), e.body_text()),
            ApiError::Invalid(_) => (StatusCode::UNPROCESSABLE_ENTITY, self.to_string()),
            ApiError::Task(_) => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()),
        };
        log::warn!("Rejected analyze request: {message}");
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

/// Routes over one process-wide controller: every connected browser sees and
/// drives the same state, as a single-user local tool.
pub fn router<A: Analyzer + 'static>(controller: Shared<A>, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/state", get(current_state::<A>))
        .route("/api/analyze", post(analyze::<A>))
        .route("/api/reset", post(reset::<A>))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(CorsLayer::permissive())
        .with_state(controller)
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn current_state<A: Analyzer>(State(controller): State<Shared<A>>) -> Json<Snapshot> {
    Json(controller.snapshot())
}

/// Reads the first multipart field fully, then runs it through the controller.
///
/// The analysis runs on its own task, so a client that disconnects mid-call
/// does not leave the controller stuck in ANALYZING.
async fn analyze<A: Analyzer + 'static>(
    State(controller): State<Shared<A>>,
    mut multipart: Multipart,
) -> Result<Json<Snapshot>, ApiError> {
    let field = multipart.next_field().await?.ok_or(ApiError::MissingImage)?;

    let file_name = field.file_name().map(str::to_string);
    let content_type = field.content_type().map(str::to_string);
    let bytes = field.bytes().await?;

    let blob = ImageBlob {
        file_name,
        content_type,
        bytes: bytes.to_vec(),
    };
    let pending = controller.select(blob)?;
    let snapshot = controller.spawn(pending).await?;
    Ok(Json(snapshot))
}

async fn reset<A: Analyzer>(State(controller): State<Shared<A>>) -> Json<Snapshot> {
    Json(controller.reset())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request};
    use serde_json::Value;
    use tokio::sync::Notify;
    use tower::ServiceExt;

    use crate::config::GeminiConfig;
    use crate::controller::ViewState;
    use crate::error::AnalysisError;
    use crate::gemini::GeminiClient;

    const BOUNDARY: &str = "----productlens-test";

    struct Fixed {
        calls: AtomicUsize,
        reply: Result<String, AnalysisError>,
        gate: Option<Arc<Notify>>,
    }

    impl Fixed {
        fn new(reply: Result<String, AnalysisError>) -> Arc<AppController<Self>> {
            Self::build(reply, None)
        }

        fn gated(reply: Result<String, AnalysisError>, gate: Arc<Notify>) -> Arc<AppController<Self>> {
            Self::build(reply, Some(gate))
        }

        fn build(
            reply: Result<String, AnalysisError>,
            gate: Option<Arc<Notify>>,
        ) -> Arc<AppController<Self>> {
            Arc::new(AppController::new(Self {
                calls: AtomicUsize::new(0),
                reply,
                gate,
            }))
        }
    }

    impl Analyzer for Fixed {
        async fn analyze(&self, _base64: &str, _mime_type: &str) -> Result<String, AnalysisError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            self.reply.clone()
        }
    }

    async fn wait_for_calls(controller: &AppController<Fixed>, n: usize) {
        while controller_calls(controller) < n {
            tokio::task::yield_now().await;
        }
    }

    fn multipart_body(filename: &str, content_type: &str, data: &[u8]) -> Vec<u8> {
        let mut body = Vec::new();
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"image\"; filename=\"{filename}\"\r\n\
                 Content-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    fn upload(body: Vec<u8>) -> Request<Body> {
        Request::post("/api/analyze")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn index_serves_the_page() {
        let app = router(Fixed::new(Ok("x".into())), 1024);
        let response = app
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(String::from_utf8_lossy(&bytes).contains("accept=\"image/*\""));
    }

    #[tokio::test]
    async fn upload_then_reset() {
        let controller = Fixed::new(Ok("### PRODUCT SUMMARY\n...".into()));
        let app = router(controller.clone(), 1024 * 1024);

        let (status, body) = send(
            app.clone(),
            upload(multipart_body("photo.jpg", "image/jpeg", &[0xFF, 0xD8, 0xFF])),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["view"], "RESULT");
        assert_eq!(body["outcome"]["status"], "success");
        assert_eq!(body["outcome"]["text"], "### PRODUCT SUMMARY\n...");
        assert_eq!(body["image"]["file_name"], "photo.jpg");
        assert_eq!(body["image"]["mime_type"], "image/jpeg");
        assert!(body["image"]["preview"]
            .as_str()
            .unwrap()
            .starts_with("data:image/jpeg;base64,"));
        assert!(body["image"].get("base64").is_none());

        let (_, state) = send(
            app.clone(),
            Request::get("/api/state").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(state, body);

        let (status, body) = send(
            app,
            Request::post("/api/reset").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["view"], "UPLOAD");
        assert!(body["image"].is_null());
        assert!(body["outcome"].is_null());
    }

    #[tokio::test]
    async fn pdf_is_reported_as_failure_without_analysis() {
        let controller = Fixed::new(Ok("unused".into()));
        let app = router(controller.clone(), 1024 * 1024);

        let (status, body) = send(
            app,
            upload(multipart_body("document.pdf", "application/pdf", b"%PDF-1.7")),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"], "Please upload an image file");
        assert_eq!(controller_calls(&controller), 0);

        let snapshot = controller.snapshot();
        assert_eq!(snapshot.view, ViewState::Upload);
        assert!(snapshot.outcome.is_some());
    }

    #[tokio::test]
    async fn pdf_during_analysis_is_rejected_not_reported_as_analyzing() {
        let gate = Arc::new(Notify::new());
        let controller = Fixed::gated(Ok("done".into()), gate.clone());
        let app = router(controller.clone(), 1024 * 1024);

        let first = tokio::spawn(send(
            app.clone(),
            upload(multipart_body("photo.jpg", "image/jpeg", &[0xFF, 0xD8])),
        ));
        wait_for_calls(&controller, 1).await;

        let (status, body) = send(
            app,
            upload(multipart_body("document.pdf", "application/pdf", b"%PDF")),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"], "Please upload an image file");
        assert!(body.get("view").is_none());
        assert_eq!(controller.view(), ViewState::Analyzing);

        gate.notify_one();
        let (status, body) = first.await.unwrap();
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["view"], "RESULT");
        assert_eq!(controller_calls(&controller), 1);
    }

    #[tokio::test]
    async fn analysis_settles_after_client_disconnects() {
        let gate = Arc::new(Notify::new());
        let controller = Fixed::gated(Ok("done".into()), gate.clone());
        let app = router(controller.clone(), 1024 * 1024);

        let request = tokio::spawn(app.oneshot(upload(multipart_body(
            "photo.jpg",
            "image/jpeg",
            &[0xFF, 0xD8],
        ))));
        wait_for_calls(&controller, 1).await;
        request.abort();
        let _ = request.await;

        gate.notify_one();
        tokio::time::timeout(Duration::from_secs(5), async {
            while controller.view() == ViewState::Analyzing {
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();
        assert_eq!(controller.view(), ViewState::Result);
    }

    fn controller_calls(controller: &AppController<Fixed>) -> usize {
        controller.analyzer().calls.load(Ordering::SeqCst)
    }

    #[tokio::test]
    async fn missing_key_fails_without_network() {
        let client = GeminiClient::new(GeminiConfig::new(None));
        let app = router(Arc::new(AppController::new(client)), 1024 * 1024);

        let (_, body) = send(
            app,
            upload(multipart_body("photo.jpg", "image/jpeg", &[0xFF, 0xD8])),
        )
        .await;
        assert_eq!(body["view"], "UPLOAD");
        assert_eq!(
            body["outcome"]["message"],
            AnalysisError::MissingCredential.to_string()
        );
    }

    #[tokio::test]
    async fn empty_form_is_bad_request() {
        let app = router(Fixed::new(Ok("x".into())), 1024);
        let (status, body) = send(app, upload(format!("--{BOUNDARY}--\r\n").into_bytes())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn oversized_upload_is_rejected() {
        let controller = Fixed::new(Ok("x".into()));
        let app = router(controller.clone(), 64);
        let response = app
            .oneshot(upload(multipart_body("big.png", "image/png", &[0u8; 4096])))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(controller_calls(&controller), 0);
    }
}
