//! HTTP Endpoints
//!
//! The rendered page, its JSON state and the form actions posted by it.
//! Every action answers `303 See Other` back to `/`; synthesis and catalog
//! loads run in the background and show up on the next render.

use axum::{
    extract::{Form, Json, Path, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Redirect},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use tts_playground_core::{ConfigInputType, ConfigValue};
use tts_playground_store::PlaygroundSnapshot;
use tts_playground_view::{project, render_html};

use crate::state::AppState;
use crate::ServerError;

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    let cors_enabled = state.config.server.cors_enabled;

    let router = Router::new()
        // Page and state
        .route("/", get(index))
        .route("/api/state", get(api_state))
        .route("/audio/*model_id", get(inline_audio))

        // Intents
        .route("/actions/reload", post(reload_catalog))
        .route("/actions/active", post(set_active))
        .route("/actions/toggle", post(toggle_selected))
        .route("/actions/text", post(set_text))
        .route("/actions/config", post(set_config))
        .route("/actions/speak", post(speak))
        .route("/actions/speak-batch", post(speak_batch))

        // Health check
        .route("/health", get(health_check))

        // Middleware
        .layer(TraceLayer::new_for_http());

    let router = if cors_enabled {
        router.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
    } else {
        router
    };

    router.with_state(state)
}

/// Rendered playground page
async fn index(State(state): State<AppState>) -> Html<String> {
    let snapshot = state.store.snapshot();
    Html(render_html(&project(&snapshot)))
}

/// Current store snapshot
async fn api_state(State(state): State<AppState>) -> Json<PlaygroundSnapshot> {
    Json(state.store.snapshot().as_ref().clone())
}

/// Inline WAV audio of a model's last successful result
async fn inline_audio(
    State(state): State<AppState>,
    Path(model_id): Path<String>,
) -> Result<impl IntoResponse, StatusCode> {
    let run = state.store.run_state(&model_id);
    let result = run
        .result
        .filter(|r| r.success)
        .ok_or_else(|| ServerError::NotFound(format!("no audio for {}", model_id)))?;

    let bytes = result.inline_audio().map_err(|e| {
        tracing::debug!(model_id = %model_id, error = %e, "No inline audio");
        ServerError::NotFound(e.to_string())
    })?;

    Ok(([(header::CONTENT_TYPE, "audio/wav")], bytes))
}

/// Reload the model catalog
async fn reload_catalog(State(state): State<AppState>) -> Redirect {
    let dispatcher = state.dispatcher.clone();
    tokio::spawn(async move {
        // Failures are recorded in the store
        let _ = dispatcher.load_catalog().await;
    });
    Redirect::to("/")
}

/// Form naming one model
#[derive(Debug, Deserialize)]
struct ModelForm {
    model_id: String,
}

async fn set_active(State(state): State<AppState>, Form(form): Form<ModelForm>) -> Redirect {
    state.store.set_active_model(&form.model_id);
    Redirect::to("/")
}

async fn toggle_selected(
    State(state): State<AppState>,
    Form(form): Form<ModelForm>,
) -> Redirect {
    state.store.toggle_selected_model(&form.model_id);
    Redirect::to("/")
}

/// Composer form
#[derive(Debug, Default, Deserialize)]
struct TextForm {
    #[serde(default)]
    text: Option<String>,
}

async fn set_text(State(state): State<AppState>, Form(form): Form<TextForm>) -> Redirect {
    if let Some(text) = form.text {
        state.store.set_text(text);
    }
    Redirect::to("/")
}

/// One config field edit
#[derive(Debug, Deserialize)]
struct ConfigForm {
    model_id: String,
    key: String,
    /// Absent for unchecked checkboxes
    #[serde(default)]
    value: String,
    #[serde(default)]
    input_type: String,
}

async fn set_config(
    State(state): State<AppState>,
    Form(form): Form<ConfigForm>,
) -> Result<Redirect, StatusCode> {
    if form.key.trim().is_empty() {
        return Err(ServerError::InvalidRequest("config key is empty".to_string()).into());
    }

    let value = ConfigValue::from_form(ConfigInputType::parse(&form.input_type), &form.value);
    state.store.set_model_config(&form.model_id, &form.key, value);
    Ok(Redirect::to("/"))
}

/// Run the active model
async fn speak(State(state): State<AppState>, form: Option<Form<TextForm>>) -> Redirect {
    apply_text(&state, form);

    let dispatcher = state.dispatcher.clone();
    tokio::spawn(async move {
        let outcome = dispatcher.run_single().await;
        tracing::debug!(?outcome, "Single run finished");
    });
    Redirect::to("/")
}

/// Run every selected model
async fn speak_batch(State(state): State<AppState>, form: Option<Form<TextForm>>) -> Redirect {
    apply_text(&state, form);

    let dispatcher = state.dispatcher.clone();
    tokio::spawn(async move {
        let outcome = dispatcher.run_batch().await;
        tracing::debug!(?outcome, "Batch run finished");
    });
    Redirect::to("/")
}

/// Speak buttons submit the composer; its text applies before the run
fn apply_text(state: &AppState, form: Option<Form<TextForm>>) {
    if let Some(Form(TextForm { text: Some(text) })) = form {
        state.store.set_text(text);
    }
}

/// Health check
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let snapshot = state.store.snapshot();
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "models": snapshot.models.len(),
        "catalog_loaded": snapshot.catalog_epoch > 0,
    }))
}
