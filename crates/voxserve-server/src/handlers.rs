//! Request handlers for the voice registry API.

use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use voxserve_core::{discovery, AudioFormat, DiscoveredVoice, VoxError};

/// Body for `POST /`. `voice` and `format` are optional; missing `text` is
/// rejected explicitly so the client sees a 400 rather than a parse error.
#[derive(Debug, Deserialize)]
pub struct SynthesizeRequest {
    text: Option<String>,
    voice: Option<String>,
    format: Option<String>,
}

/// Synthesize text into audio bytes.
pub async fn synthesize(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SynthesizeRequest>,
) -> Result<Response, ApiError> {
    let Some(text) = req.text else {
        return Err(ApiError::bad_request("missing required field 'text'"));
    };
    let voice = req.voice.as_deref().unwrap_or(&state.default_voice);
    let format = req
        .format
        .as_deref()
        .map(AudioFormat::from_param)
        .unwrap_or_default();

    let audio = state
        .gateway
        .synthesize(voice, &text, format)
        .await
        .map_err(|e| match e {
            // Unknown voice on the synthesis path is a client mistake, not a
            // missing resource: the voice may simply not be downloaded yet.
            VoxError::NotFound { .. } => ApiError::bad_request(format!("unknown voice '{voice}'"))
                .with_hint("POST /voices/download to fetch a model, or GET /voices to list what is available"),
            other => other.into(),
        })?;

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, audio.mime_type())],
        audio.bytes,
    )
        .into_response())
}

#[derive(Debug, Serialize)]
pub struct VoicesResponse {
    voices: Vec<DiscoveredVoice>,
    default: String,
    total: usize,
    loaded: usize,
}

/// List every voice with an on-disk artifact.
pub async fn list_voices(State(state): State<Arc<AppState>>) -> Json<VoicesResponse> {
    let voices = discovery::scan(&state.voices_dir, &state.aliases, &state.registry);
    let loaded = voices.iter().filter(|v| v.loaded).count();
    Json(VoicesResponse {
        total: voices.len(),
        loaded,
        default: state.default_voice.clone(),
        voices,
    })
}

#[derive(Debug, Deserialize)]
pub struct DownloadRequest {
    model: Option<String>,
    alias: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DownloadResponse {
    status: &'static str,
    model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    alias: Option<String>,
}

/// Ensure a model is present locally, optionally binding an alias to it.
pub async fn download_voice(
    State(state): State<Arc<AppState>>,
    Json(req): Json<DownloadRequest>,
) -> Result<Json<DownloadResponse>, ApiError> {
    let Some(model) = req.model else {
        return Err(ApiError::bad_request("missing required field 'model'"));
    };

    let existed = state.library.ensure_model(&model).await?;
    if let Some(alias) = &req.alias {
        state.aliases.set_alias(alias, &model)?;
    }

    Ok(Json(DownloadResponse {
        status: if existed { "exists" } else { "downloaded" },
        model,
        alias: req.alias,
    }))
}

#[derive(Debug, Serialize)]
pub struct DeleteVoiceResponse {
    status: &'static str,
    model: String,
    aliases_removed: Vec<String>,
}

/// Remove a model's artifacts, evicting it and cascading custom aliases.
pub async fn delete_voice(
    State(state): State<Arc<AppState>>,
    Path(model): Path<String>,
) -> Result<Json<DeleteVoiceResponse>, ApiError> {
    let aliases_removed = state.library.delete_model(&model).await?;
    Ok(Json(DeleteVoiceResponse {
        status: "deleted",
        model,
        aliases_removed,
    }))
}

#[derive(Debug, Serialize)]
pub struct AliasTablesResponse {
    builtin: BTreeMap<String, String>,
    custom: BTreeMap<String, String>,
    merged: BTreeMap<String, String>,
}

/// Show the builtin, custom and merged alias tables.
pub async fn list_aliases(State(state): State<Arc<AppState>>) -> Json<AliasTablesResponse> {
    Json(AliasTablesResponse {
        builtin: state.aliases.builtin(),
        custom: state.aliases.custom(),
        merged: state.aliases.merged(),
    })
}

#[derive(Debug, Deserialize)]
pub struct CreateAliasRequest {
    alias: Option<String>,
    model: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreateAliasResponse {
    status: &'static str,
    alias: String,
    model: String,
}

/// Create or overwrite a custom alias for a locally present model.
pub async fn create_alias(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateAliasRequest>,
) -> Result<(StatusCode, Json<CreateAliasResponse>), ApiError> {
    let (Some(alias), Some(model)) = (req.alias, req.model) else {
        return Err(ApiError::bad_request(
            "both 'alias' and 'model' fields are required",
        ));
    };
    state.aliases.set_alias(&alias, &model)?;
    Ok((
        StatusCode::CREATED,
        Json(CreateAliasResponse {
            status: "created",
            alias,
            model,
        }),
    ))
}

#[derive(Debug, Serialize)]
pub struct DeleteAliasResponse {
    status: &'static str,
    alias: String,
}

/// Remove a custom alias. Builtins are refused.
pub async fn delete_alias(
    State(state): State<Arc<AppState>>,
    Path(alias): Path<String>,
) -> Result<Json<DeleteAliasResponse>, ApiError> {
    state.aliases.delete_alias(&alias)?;
    Ok(Json(DeleteAliasResponse {
        status: "deleted",
        alias,
    }))
}

#[derive(Debug, Serialize)]
pub struct ReloadAliasesResponse {
    status: &'static str,
    custom_aliases: usize,
}

/// Re-read the custom alias table from disk, discarding in-memory state.
pub async fn reload_aliases(State(state): State<Arc<AppState>>) -> Json<ReloadAliasesResponse> {
    let custom_aliases = state.aliases.reload();
    Json(ReloadAliasesResponse {
        status: "reloaded",
        custom_aliases,
    })
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: &'static str,
    voices_loaded: usize,
}

/// Liveness probe.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        voices_loaded: state.registry.loaded_count(),
    })
}
