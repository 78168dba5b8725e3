//! Snapshot to view projection

use serde::Serialize;

use tts_playground_core::{
    model_parts, BatchSummary, ConfigField, ConfigFieldOption, ConfigInputType, ConfigValue,
    ModelCategory, ModelDescriptor,
};
use tts_playground_store::{PlaygroundSnapshot, RunStatus};

pub const TITLE: &str = "Tanglish TTS Playground";
pub const SUBTITLE: &str =
    "Left: all models · Middle: input and outputs · Right: selected model settings.";

/// Everything the page shows, derived from one snapshot
#[derive(Debug, Clone, Serialize)]
pub struct PlaygroundView {
    pub title: &'static str,
    pub subtitle: &'static str,
    pub revision: u64,
    pub loading: bool,
    pub global_error: Option<String>,
    pub env_warnings: Vec<EnvWarning>,
    pub browser: Vec<CategoryGroup>,
    pub composer: ComposerView,
    pub results: Vec<ResultCard>,
    pub last_batch_summary: Option<BatchSummary>,
    pub sidebar: Option<SidebarView>,
    /// Some model is queued or running
    pub pending: bool,
}

impl PlaygroundView {
    /// Number of unconfigured models
    pub fn unconfigured_count(&self) -> usize {
        self.env_warnings.len()
    }
}

/// One unconfigured model and what it is missing
#[derive(Debug, Clone, Serialize)]
pub struct EnvWarning {
    pub model_id: String,
    pub display_name: String,
    /// Warnings joined with ", "
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryGroup {
    pub category: ModelCategory,
    pub title: &'static str,
    pub count: usize,
    pub providers: Vec<ProviderGroup>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProviderGroup {
    pub label: String,
    pub rows: Vec<ModelRow>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModelRow {
    pub model_id: String,
    pub display_name: String,
    pub label: String,
    pub active: bool,
    pub selected: bool,
    pub configured: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ComposerView {
    pub text: String,
    pub selected_count: usize,
    /// Text is not blank and there is a model to run
    pub can_speak: bool,
}

/// Output card of one catalog model
#[derive(Debug, Clone, Serialize)]
pub struct ResultCard {
    pub model_id: String,
    pub provider_label: String,
    pub model_label: String,
    pub status: RunStatus,
    pub latency_ms: u64,
    pub streaming_used: bool,
    /// `<audio src>` value for playable results
    pub audio_src: Option<String>,
    pub error: Option<String>,
}

/// Settings panel of the active model
#[derive(Debug, Clone, Serialize)]
pub struct SidebarView {
    pub model_id: String,
    pub model_label: String,
    pub provider_label: String,
    pub category_label: &'static str,
    pub configured: bool,
    pub warnings: Vec<String>,
    pub fields: Vec<FieldView>,
}

/// One schema field with the value currently in effect
#[derive(Debug, Clone, Serialize)]
pub struct FieldView {
    pub key: String,
    pub label: String,
    pub input_type: ConfigInputType,
    pub value: ConfigValue,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub step: Option<f64>,
    pub options: Vec<ConfigFieldOption>,
    pub placeholder: Option<String>,
    pub help_text: Option<String>,
}

/// Project a snapshot into the view
pub fn project(snapshot: &PlaygroundSnapshot) -> PlaygroundView {
    let active_id = snapshot.active_model_id.as_deref();

    PlaygroundView {
        title: TITLE,
        subtitle: SUBTITLE,
        revision: snapshot.revision,
        loading: snapshot.loading_catalog,
        global_error: snapshot.global_error.clone(),
        env_warnings: env_warnings(snapshot),
        browser: ModelCategory::all()
            .into_iter()
            .map(|category| category_group(snapshot, category, active_id))
            .collect(),
        composer: ComposerView {
            text: snapshot.text.clone(),
            selected_count: snapshot.selected_model_ids.len(),
            can_speak: !snapshot.text.trim().is_empty() && active_id.is_some(),
        },
        results: snapshot
            .models
            .iter()
            .map(|model| result_card(snapshot, model))
            .collect(),
        last_batch_summary: snapshot.last_batch_summary.clone(),
        sidebar: snapshot.active_model().map(|model| sidebar(snapshot, model)),
        pending: snapshot.runs.any_pending(),
    }
}

fn env_warnings(snapshot: &PlaygroundSnapshot) -> Vec<EnvWarning> {
    snapshot
        .unconfigured_models()
        .map(|model| EnvWarning {
            model_id: model.model_id.clone(),
            display_name: model.display_name.clone(),
            message: model.config_warnings.join(", "),
        })
        .collect()
}

fn category_group(
    snapshot: &PlaygroundSnapshot,
    category: ModelCategory,
    active_id: Option<&str>,
) -> CategoryGroup {
    let mut providers: Vec<ProviderGroup> = Vec::new();
    let mut count = 0;

    for model in snapshot.models.iter().filter(|m| m.category == category) {
        count += 1;
        let parts = model_parts(model);
        let row = ModelRow {
            model_id: model.model_id.clone(),
            display_name: model.display_name.clone(),
            label: parts.model_label,
            active: active_id == Some(model.model_id.as_str()),
            selected: snapshot.is_selected(&model.model_id),
            configured: model.configured,
        };

        // Groups keep the order in which providers first appear
        match providers.iter_mut().find(|g| g.label == parts.provider_label) {
            Some(group) => group.rows.push(row),
            None => providers.push(ProviderGroup {
                label: parts.provider_label,
                rows: vec![row],
            }),
        }
    }

    CategoryGroup {
        category,
        title: category.group_title(),
        count,
        providers,
    }
}

fn result_card(snapshot: &PlaygroundSnapshot, model: &ModelDescriptor) -> ResultCard {
    let parts = model_parts(model);
    let run = snapshot.runs.get(&model.model_id);
    let result = run.result.as_ref();

    ResultCard {
        model_id: model.model_id.clone(),
        provider_label: parts.provider_label,
        model_label: parts.model_label,
        status: run.status,
        latency_ms: result.map(|r| r.latency_ms).unwrap_or(0),
        streaming_used: result.map(|r| r.streaming_used).unwrap_or(false),
        audio_src: result.and_then(|r| r.audio_source()).map(|s| s.src()),
        error: result
            .and_then(|r| r.error.clone())
            .filter(|e| !e.is_empty()),
    }
}

fn sidebar(snapshot: &PlaygroundSnapshot, model: &ModelDescriptor) -> SidebarView {
    let parts = model_parts(model);
    let config = snapshot.configs.get(&model.model_id);

    SidebarView {
        model_id: model.model_id.clone(),
        model_label: parts.model_label,
        provider_label: parts.provider_label,
        category_label: model.category.label(),
        configured: model.configured,
        warnings: if model.configured {
            Vec::new()
        } else {
            model.config_warnings.clone()
        },
        fields: model
            .config_schema
            .iter()
            .map(|field| field_view(field, config.get(&field.key)))
            .collect(),
    }
}

fn field_view(field: &ConfigField, current: Option<&ConfigValue>) -> FieldView {
    let value = current
        .filter(|v| !v.is_null())
        .unwrap_or(&field.default)
        .clone();

    FieldView {
        key: field.key.clone(),
        label: field.label.clone(),
        input_type: field.input_type,
        value,
        min: field.min,
        max: field.max,
        step: field.step,
        options: field.options.clone(),
        placeholder: field.placeholder.clone(),
        help_text: field.help_text.clone(),
    }
}
