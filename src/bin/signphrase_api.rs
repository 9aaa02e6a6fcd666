use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use clap::Parser;
use serde::{Deserialize, Serialize};
use signphrase::assembler::{match_and_assemble, AssembledResult, AssetStore};
use signphrase::classifier::{classify_token, normalize_token, ClassifiedStatement};
use signphrase::translation::{Completion, TranslationError, Translator};
use signphrase::{Catalogs, Cli, Embedder, OpenAiEmbedder, PipelineError};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Clone)]
struct AppState {
    catalogs: Arc<Catalogs>,
    embedder: Arc<dyn Embedder>,
    store: Arc<AssetStore>,
    translator: Option<Arc<Translator>>,
    terminator: Arc<str>,
}

#[derive(Debug, Deserialize)]
struct MatchParams {
    #[serde(default)]
    sentence: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ClassifyParams {
    #[serde(default, alias = "text_to_translate")]
    gesture: Option<String>,
}

#[derive(Debug, Serialize)]
struct ClassifyResponse {
    #[serde(flatten)]
    statement: ClassifiedStatement,
    translation: Option<Completion>,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
}

type ApiError = (StatusCode, Json<ErrorBody>);

fn main() -> Result<()> {
    let cli = Cli::parse();
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    // Blocking HTTP clients and the catalog embedding run before the async
    // runtime exists.
    let embedder = Arc::new(OpenAiEmbedder::new(cli.embedding_settings())?);
    let definition = cli.catalog_definition()?;
    let catalogs = Catalogs::build(&definition, embedder.as_ref())
        .context("failed to embed catalogs; is the embedding backend reachable?")?;
    let translator = cli.build_translator()?;
    if translator.is_none() {
        info!("translation disabled");
    }
    let store = cli.asset_store();
    if !store.root().is_dir() {
        info!(dir = %store.root().display(), "asset directory not found; every asset will be null");
    }

    let state = AppState {
        catalogs: Arc::new(catalogs),
        embedder,
        store: Arc::new(store),
        translator: translator.map(Arc::new),
        terminator: Arc::from(cli.terminator.as_str()),
    };
    let addr: SocketAddr = cli
        .bind
        .parse()
        .with_context(|| format!("invalid bind address {}", cli.bind))?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    runtime.block_on(serve(state, addr))
}

async fn serve(state: AppState, addr: SocketAddr) -> Result<()> {
    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/match_phrase", get(match_phrase_handler))
        .route("/classify", get(classify_handler))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("signphrase-api listening on http://{addr}");
    axum::serve(listener, app)
        .await
        .context("server shutdown")?;
    Ok(())
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

async fn match_phrase_handler(
    State(state): State<AppState>,
    Query(params): Query<MatchParams>,
) -> Result<Json<AssembledResult>, ApiError> {
    let sentence = params.sentence.unwrap_or_default();
    if sentence.trim().is_empty() {
        return Err(bad_request("Missing 'sentence' parameter"));
    }
    let start = Instant::now();
    let result = tokio::task::spawn_blocking(move || {
        match_and_assemble(
            &sentence,
            &state.catalogs.phrases,
            state.embedder.as_ref(),
            &state.store,
        )
    })
    .await
    .map_err(join_error)?
    .map_err(pipeline_error)?;
    info!(
        phrase = result.phrase.as_deref(),
        score = result.score,
        latency_ms = start.elapsed().as_secs_f64() * 1000.0,
        "match_phrase"
    );
    Ok(Json(result))
}

async fn classify_handler(
    State(state): State<AppState>,
    Query(params): Query<ClassifyParams>,
) -> Result<Json<ClassifyResponse>, ApiError> {
    let stream = params.gesture.unwrap_or_default();
    if stream.trim().is_empty() {
        return Err(bad_request("Missing 'gesture' parameter"));
    }
    let token = normalize_token(&stream, &state.terminator);
    if token.is_empty() {
        return Err(unprocessable("gesture stream contains no completed letters"));
    }
    let start = Instant::now();
    let response = tokio::task::spawn_blocking(move || -> Result<ClassifyResponse, ApiError> {
        let statement =
            classify_token(token, &state.catalogs.occupations, state.embedder.as_ref())
                .map_err(pipeline_error)?;
        let translation = match &state.translator {
            Some(translator) => Some(
                translator
                    .translate(&statement.statement)
                    .map_err(translation_error)?,
            ),
            None => None,
        };
        Ok(ClassifyResponse {
            statement,
            translation,
        })
    })
    .await
    .map_err(join_error)??;
    info!(
        category = ?response.statement.category,
        confidence = response.statement.confidence,
        latency_ms = start.elapsed().as_secs_f64() * 1000.0,
        "classify"
    );
    Ok(Json(response))
}

fn bad_request(message: impl Into<String>) -> ApiError {
    error_response(StatusCode::BAD_REQUEST, message, None)
}

fn unprocessable(message: impl Into<String>) -> ApiError {
    error_response(StatusCode::UNPROCESSABLE_ENTITY, message, None)
}

fn error_response(
    status: StatusCode,
    message: impl Into<String>,
    detail: Option<String>,
) -> ApiError {
    (
        status,
        Json(ErrorBody {
            message: message.into(),
            detail,
        }),
    )
}

fn pipeline_error(err: PipelineError) -> ApiError {
    match err {
        PipelineError::MissingInput(_) => bad_request(err.to_string()),
        other => {
            error!(error = %other, "pipeline failure");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, other.to_string(), None)
        }
    }
}

fn translation_error(err: TranslationError) -> ApiError {
    error!(error = %err, detail = err.detail(), "translation failure");
    let status = match err {
        TranslationError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        _ => StatusCode::BAD_GATEWAY,
    };
    error_response(status, err.to_string(), Some(err.detail().to_string()))
}

fn join_error(err: tokio::task::JoinError) -> ApiError {
    error_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        format!("worker task failed: {err}"),
        None,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_input_is_a_client_error() {
        let (status, Json(body)) = pipeline_error(PipelineError::MissingInput("sentence"));
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.message, "Missing 'sentence' parameter");
    }

    #[test]
    fn embedding_failure_is_a_server_error() {
        let (status, _) = pipeline_error(PipelineError::Embedding(anyhow::anyhow!("down")));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn upstream_failures_carry_raw_detail() {
        let (status, Json(body)) = translation_error(TranslationError::Format {
            reason: "no choices".to_string(),
            raw: "{}".to_string(),
        });
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body.detail.as_deref(), Some("{}"));

        let (status, Json(body)) = translation_error(TranslationError::Transport(
            "connection refused".to_string(),
        ));
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body.detail.as_deref(), Some("connection refused"));
    }

    #[test]
    fn gesture_param_accepts_legacy_name() {
        let params: ClassifyParams =
            serde_json::from_str(r#"{"text_to_translate": "A-STOP-"}"#).expect("params");
        assert_eq!(params.gesture.as_deref(), Some("A-STOP-"));
    }
}
