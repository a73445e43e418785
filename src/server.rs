//! HTTP upload boundary.
//!
//! `GET /` reports liveness; `POST /analyze/` takes a multipart `file`
//! field, stages it in a temporary file for the analyzer and returns the
//! status envelope. The temporary file is removed once the analysis ends,
//! whatever the outcome.

use std::io::Write;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use tower_http::cors::CorsLayer;
use tracing::{error, info, warn};

use crate::steganalysis::{AnalysisError, AnalysisResponse, CancellationToken, ErrorKind, ImageAnalyzer};

/// Uploads larger than this are rejected before reaching the handler.
pub const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

const UPLOAD_FIELD: &str = "file";

pub fn router(analyzer: Arc<dyn ImageAnalyzer>) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/analyze/", post(analyze))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(CorsLayer::permissive())
        .with_state(analyzer)
}

/// Binds `addr` and serves until Ctrl-C.
pub async fn serve(addr: SocketAddr, analyzer: Arc<dyn ImageAnalyzer>) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "Stego detection API listening");
    axum::serve(listener, router(analyzer))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => {
            error!("Failed to listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    }
}

async fn root() -> Json<serde_json::Value> {
    Json(json!({ "message": "Stego Detection API Running" }))
}

fn status_for(response: &AnalysisResponse) -> StatusCode {
    match response.error_kind() {
        None => StatusCode::OK,
        Some(ErrorKind::InvalidInput) => StatusCode::UNPROCESSABLE_ENTITY,
        Some(ErrorKind::Configuration) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn reject(status: StatusCode, error: AnalysisError) -> Response {
    (status, Json(AnalysisResponse::from(error))).into_response()
}

/// Lowercased extension of the uploaded file name, or nothing if it is not
/// short and alphanumeric. Decoding sniffs magic bytes regardless.
fn staged_suffix(filename: &str) -> String {
    std::path::Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| ext.len() <= 8 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
        .unwrap_or_default()
}

async fn analyze(State(analyzer): State<Arc<dyn ImageAnalyzer>>, mut multipart: Multipart) -> Response {
    let mut upload = None;
    loop {
        match multipart.next_field().await {
            Ok(Some(field)) => {
                if field.name() != Some(UPLOAD_FIELD) {
                    continue;
                }
                let filename = field.file_name().unwrap_or("upload").to_string();
                match field.bytes().await {
                    Ok(bytes) => upload = Some((filename, bytes)),
                    Err(e) => {
                        warn!("Failed to read upload bytes: {e}");
                        return reject(
                            StatusCode::BAD_REQUEST,
                            AnalysisError::InvalidImage(format!("could not read upload: {}", e)),
                        );
                    }
                }
            }
            Ok(None) => break,
            Err(e) => {
                warn!("Malformed multipart body: {e}");
                return reject(
                    StatusCode::BAD_REQUEST,
                    AnalysisError::InvalidImage(format!("malformed multipart body: {}", e)),
                );
            }
        }
    }

    let Some((filename, bytes)) = upload else {
        return reject(
            StatusCode::BAD_REQUEST,
            AnalysisError::InvalidImage(format!("multipart field `{}` is required", UPLOAD_FIELD)),
        );
    };
    info!(filename = %filename, size = bytes.len(), "Upload received");

    // Dropping the handler future (client gone) cancels the explanation wait.
    let cancel = CancellationToken::new();
    let _guard = cancel.drop_guard();
    let suffix = staged_suffix(&filename);

    let outcome = tokio::task::spawn_blocking(move || -> std::io::Result<AnalysisResponse> {
        let mut staged = tempfile::Builder::new()
            .prefix("upload_")
            .suffix(&suffix)
            .tempfile()?;
        staged.write_all(&bytes)?;
        staged.flush()?;
        Ok(analyzer.analyze_file_with_cancel(staged.path(), &cancel))
    })
    .await;

    match outcome {
        Ok(Ok(response)) => (status_for(&response), Json(response)).into_response(),
        Ok(Err(e)) => {
            error!("Failed to stage upload: {e}");
            reject(
                StatusCode::INTERNAL_SERVER_ERROR,
                AnalysisError::Configuration(format!("could not stage upload: {}", e)),
            )
        }
        Err(e) => {
            error!("Analysis task failed: {e}");
            reject(
                StatusCode::INTERNAL_SERVER_ERROR,
                AnalysisError::Configuration("analysis task failed".to_string()),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::{Path, PathBuf};
    use std::sync::Mutex;

    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use crate::steganalysis::test_support::{encode_canonical, gray_image, textured, write_artifacts};
    use crate::steganalysis::{
        AnalysisConfig, Ensemble, MockTextGenerator, ModelArtifacts, ScoringConfig, StandardImageReader,
        StegoAnalysisPipeline,
    };

    const BOUNDARY: &str = "stego-test-boundary";

    /// Records what it was handed and answers with a fixed envelope.
    struct RecordingAnalyzer {
        response: AnalysisResponse,
        seen: Mutex<Vec<(PathBuf, Vec<u8>)>>,
    }

    impl RecordingAnalyzer {
        fn new(response: AnalysisResponse) -> Arc<Self> {
            Arc::new(Self {
                response,
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    impl ImageAnalyzer for RecordingAnalyzer {
        fn analyze_file_with_cancel(&self, path: &Path, _cancel: &CancellationToken) -> AnalysisResponse {
            let data = std::fs::read(path).unwrap_or_default();
            self.seen.lock().unwrap().push((path.to_path_buf(), data));
            self.response.clone()
        }
    }

    fn pipeline() -> Arc<dyn ImageAnalyzer> {
        let dir = tempfile::tempdir().unwrap();
        write_artifacts(dir.path());
        let artifacts = ModelArtifacts::load(dir.path()).unwrap();
        let ensemble = Ensemble::from_artifacts(artifacts, &ScoringConfig::default()).unwrap();
        Arc::new(StegoAnalysisPipeline::with_custom(
            StandardImageReader,
            MockTextGenerator::new("Mock explanation."),
            Arc::new(ensemble),
            AnalysisConfig::default(),
        ))
    }

    fn multipart_request(field: &str, filename: &str, payload: &[u8]) -> Request<Body> {
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(payload);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method("POST")
            .uri("/analyze/")
            .header("content-type", format!("multipart/form-data; boundary={BOUNDARY}"))
            .body(Body::from(body))
            .unwrap()
    }

    async fn json_body(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn root_reports_liveness() {
        let app = router(pipeline());
        let request = Request::builder().uri("/").body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            json_body(response).await,
            json!({ "message": "Stego Detection API Running" })
        );
    }

    #[tokio::test]
    async fn textured_upload_is_analyzed() {
        let app = router(pipeline());
        let png = encode_canonical(&textured(3));
        let response = app.oneshot(multipart_request("file", "cover.png", &png)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["status"], "success");
        assert!(body["prediction"] == "STEGO" || body["prediction"] == "COVER");
        assert_eq!(body["top_features"].as_array().unwrap().len(), 5);
        assert_eq!(body["llm_explanation"], "Mock explanation.");
    }

    #[tokio::test]
    async fn flat_upload_is_unprocessable() {
        let app = router(pipeline());
        let png = encode_canonical(&gray_image(|_, _| 128));
        let response = app.oneshot(multipart_request("file", "flat.png", &png)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body = json_body(response).await;
        assert_eq!(body["status"], "error");
        assert_eq!(body["error_kind"], "invalid_input");
    }

    #[tokio::test]
    async fn missing_file_field_is_bad_request() {
        let app = router(pipeline());
        let response = app
            .oneshot(multipart_request("image", "cover.png", b"bytes"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["status"], "error");
    }

    #[tokio::test]
    async fn configuration_errors_are_server_errors() {
        let analyzer = RecordingAnalyzer::new(AnalysisResponse::from(AnalysisError::FeatureMismatch(
            "expected 31 features, got 30".into(),
        )));
        let app = router(analyzer);
        let response = app.oneshot(multipart_request("file", "x.png", b"data")).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json_body(response).await["error_kind"], "configuration");
    }

    #[tokio::test]
    async fn staged_upload_is_removed_afterwards() {
        let analyzer = RecordingAnalyzer::new(AnalysisResponse::from(AnalysisError::DegenerateImage));
        let app = router(analyzer.clone());
        let response = app
            .oneshot(multipart_request("file", "photo.JPG", b"payload bytes"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let seen = analyzer.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        let (path, data) = &seen[0];
        assert_eq!(data.as_slice(), b"payload bytes");
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("jpg"));
        assert!(!path.exists());
    }

    #[test]
    fn suffix_keeps_only_plain_extensions() {
        assert_eq!(staged_suffix("cover.PNG"), ".png");
        assert_eq!(staged_suffix("noext"), "");
        assert_eq!(staged_suffix("evil.p/ng"), "");
        assert_eq!(staged_suffix("../../etc/passwd.sh;rm"), "");
    }
}
