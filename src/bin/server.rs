//! veilmatch-server: encrypted matching service with HTTP API
//!
//! Accepts key, template, and sample uploads per user, runs the compare
//! pipeline on sample uploads, and judges index claims.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use clap::Parser;
use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use veilmatch::params::{ProtocolParams, SchemeParams};
use veilmatch::protocol::{Decision, ProtocolError};
use veilmatch::service::MatchService;
use veilmatch::store::FsStore;
use veilmatch::CkksContext;

#[derive(Parser)]
#[command(name = "veilmatch-server")]
#[command(about = "Encrypted biometric matching server")]
#[command(version)]
struct Args {
    /// Directory for per-user blob storage
    #[arg(long, default_value = "veilmatch_data")]
    data_dir: PathBuf,

    /// Server bind address
    #[arg(long, default_value = "0.0.0.0:3000")]
    bind: String,

    /// Squared-distance threshold separating match from non-match
    #[arg(long, default_value = "100.0")]
    threshold: f64,
}

struct AppState {
    service: MatchService<FsStore>,
}

#[derive(Deserialize)]
struct UploadRequest {
    user_id: String,
    /// One of "key", "register", "compare"
    kind: String,
    /// Base64-encoded blob
    data: String,
}

#[derive(Serialize)]
struct UploadResponse {
    status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    processing_time_ms: Option<u64>,
}

#[derive(Deserialize)]
struct VerifyRequest {
    user_id: String,
    idx: String,
}

#[derive(Serialize)]
struct VerifyResponse {
    message: String,
}

#[derive(Serialize)]
struct DownloadResponse {
    data: String,
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn bad_request(error: String) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(ErrorResponse { error }))
}

fn error_response(e: ProtocolError) -> ApiError {
    let status = match e {
        ProtocolError::Io(_) | ProtocolError::Serialization(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
        _ => StatusCode::BAD_REQUEST,
    };
    (
        status,
        Json(ErrorResponse {
            error: e.to_string(),
        }),
    )
}

async fn banner() -> &'static str {
    "veilmatch encrypted matching server"
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn handle_upload(
    State(state): State<Arc<AppState>>,
    Json(req): Json<UploadRequest>,
) -> Result<Json<UploadResponse>, ApiError> {
    let data = BASE64
        .decode(&req.data)
        .map_err(|e| bad_request(format!("invalid base64 payload: {}", e)))?;

    match req.kind.as_str() {
        "key" => {
            state
                .service
                .put_context(&req.user_id, &data)
                .map_err(error_response)?;
            Ok(Json(UploadResponse {
                status: "context stored".to_string(),
                result: None,
                processing_time_ms: None,
            }))
        }
        "register" => {
            state
                .service
                .enroll_template(&req.user_id, &data)
                .map_err(error_response)?;
            Ok(Json(UploadResponse {
                status: "template enrolled".to_string(),
                result: None,
                processing_time_ms: None,
            }))
        }
        "compare" => {
            let start = Instant::now();
            let mut rng = rand::thread_rng();
            let result = state
                .service
                .submit_sample(&req.user_id, &data, &mut rng)
                .map_err(error_response)?;
            Ok(Json(UploadResponse {
                status: "compare complete".to_string(),
                result: Some(BASE64.encode(&result)),
                processing_time_ms: Some(start.elapsed().as_millis() as u64),
            }))
        }
        other => Err(bad_request(format!("unknown upload kind: {}", other))),
    }
}

async fn handle_verify(
    State(state): State<Arc<AppState>>,
    Json(req): Json<VerifyRequest>,
) -> Result<Json<VerifyResponse>, (StatusCode, Json<VerifyResponse>)> {
    match state.service.verify_claim(&req.user_id, &req.idx) {
        Ok(decision) => Ok(Json(VerifyResponse {
            message: decision.message().to_string(),
        })),
        Err(ProtocolError::UntrustedClaim) => Err((
            StatusCode::BAD_REQUEST,
            Json(VerifyResponse {
                message: Decision::Untrusted.message().to_string(),
            }),
        )),
        Err(e) => Err((
            StatusCode::BAD_REQUEST,
            Json(VerifyResponse {
                message: format!("verification failed: {}", e),
            }),
        )),
    }
}

async fn handle_download(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<DownloadResponse>, ApiError> {
    let result = state
        .service
        .fetch_result(&user_id)
        .map_err(error_response)?;
    Ok(Json(DownloadResponse {
        data: BASE64.encode(&result),
    }))
}

async fn handle_delete(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<UploadResponse>, ApiError> {
    state
        .service
        .delete_user(&user_id)
        .map_err(error_response)?;
    Ok(Json(UploadResponse {
        status: "deleted".to_string(),
        result: None,
        processing_time_ms: None,
    }))
}

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    info!("veilmatch server");
    info!("Data directory: {}", args.data_dir.display());
    info!("Bind address: {}", args.bind);
    info!("Match threshold: {}", args.threshold);

    let load_start = Instant::now();
    let ctx = CkksContext::new(SchemeParams::matching_default())?;
    let mut protocol = ProtocolParams::default_128();
    protocol.threshold = args.threshold;

    let store = FsStore::open(&args.data_dir)
        .with_context(|| format!("Failed to open store at {}", args.data_dir.display()))?;
    let service = MatchService::new(ctx, protocol, store)?;
    info!(
        "Context ready: {} slots, {} levels ({:.2?})",
        service.context().slot_count(),
        service.context().levels(),
        load_start.elapsed()
    );

    let state = Arc::new(AppState { service });

    let app = Router::new()
        .route("/", get(banner))
        .route("/health", get(health_check))
        .route("/upload", post(handle_upload))
        .route("/verify", post(handle_verify))
        .route("/download/:user_id", get(handle_download))
        .route("/delete/:user_id", delete(handle_delete))
        .layer(CorsLayer::permissive())
        .with_state(state);

    info!("Starting server on {}", args.bind);
    let listener = tokio::net::TcpListener::bind(&args.bind).await?;

    println!();
    println!("=== veilmatch Server Running ===");
    println!("Listening on: http://{}", args.bind);
    println!();
    println!("Endpoints:");
    println!("  GET    /                   - Banner");
    println!("  GET    /health             - Health check");
    println!("  POST   /upload             - Upload key/template/sample (kind: key|register|compare)");
    println!("  POST   /verify             - Verify an index claim");
    println!("  GET    /download/:user_id  - Download latest compare result");
    println!("  DELETE /delete/:user_id    - Delete all user artifacts");
    println!();

    axum::serve(listener, app).await?;

    Ok(())
}
