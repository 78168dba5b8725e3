//! Model catalog types
//!
//! Mirrors the `GET /models/catalog` payload of the synthesis backend.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Message used when a model is not configured and the backend sent no warnings
pub const NOT_CONFIGURED_FALLBACK: &str =
    "Model is not configured. Add required environment variables.";

/// Per-model configuration values, keyed by schema field key
pub type ConfigMap = BTreeMap<String, ConfigValue>;

/// Where a model runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelCategory {
    /// Hosted by a cloud provider
    Cloud,
    /// Served from our own hardware
    SelfHosted,
}

impl ModelCategory {
    /// Short label shown next to the provider
    pub fn label(&self) -> &'static str {
        match self {
            ModelCategory::Cloud => "Cloud API",
            ModelCategory::SelfHosted => "Self-hosted",
        }
    }

    /// Title of the model browser group
    pub fn group_title(&self) -> &'static str {
        match self {
            ModelCategory::Cloud => "Cloud Models",
            ModelCategory::SelfHosted => "Self-hosted Models",
        }
    }

    /// All categories in display order
    pub fn all() -> [ModelCategory; 2] {
        [ModelCategory::Cloud, ModelCategory::SelfHosted]
    }
}

/// Advisory feature flags; nothing in the playground enforces them
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelCapabilities {
    #[serde(default)]
    pub streaming_available: bool,
    #[serde(default)]
    pub supports_speed: bool,
    #[serde(default)]
    pub supports_pitch: bool,
    #[serde(default)]
    pub supports_prompt_style: bool,
}

/// Input widget used to edit a config field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigInputType {
    Textarea,
    Number,
    Select,
    Checkbox,
    Slider,
    /// Single-line text; also used for input types we do not know
    #[default]
    #[serde(other)]
    Text,
}

impl ConfigInputType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigInputType::Text => "text",
            ConfigInputType::Textarea => "textarea",
            ConfigInputType::Number => "number",
            ConfigInputType::Select => "select",
            ConfigInputType::Checkbox => "checkbox",
            ConfigInputType::Slider => "slider",
        }
    }

    /// Whether values of this input are numeric
    pub fn is_numeric(&self) -> bool {
        matches!(self, ConfigInputType::Number | ConfigInputType::Slider)
    }

    /// Parse the `input_type` form value, falling back to text
    pub fn parse(raw: &str) -> Self {
        match raw {
            "textarea" => ConfigInputType::Textarea,
            "number" => ConfigInputType::Number,
            "select" => ConfigInputType::Select,
            "checkbox" => ConfigInputType::Checkbox,
            "slider" => ConfigInputType::Slider,
            _ => ConfigInputType::Text,
        }
    }
}

/// Scalar configuration value: string, number, boolean or null
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    #[default]
    Null,
    Bool(bool),
    Number(serde_json::Number),
    Text(String),
}

impl ConfigValue {
    pub fn text(value: impl Into<String>) -> Self {
        ConfigValue::Text(value.into())
    }

    /// Numeric value; `Null` for non-finite input
    pub fn number(value: f64) -> Self {
        serde_json::Number::from_f64(value)
            .map(ConfigValue::Number)
            .unwrap_or(ConfigValue::Null)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, ConfigValue::Null)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ConfigValue::Number(n) => n.as_f64(),
            ConfigValue::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Truthiness as used by checkbox inputs
    pub fn is_truthy(&self) -> bool {
        match self {
            ConfigValue::Null => false,
            ConfigValue::Bool(b) => *b,
            ConfigValue::Number(n) => n.as_f64().map(|v| v != 0.0).unwrap_or(false),
            ConfigValue::Text(s) => !s.is_empty(),
        }
    }

    /// String shown inside a form control
    pub fn display_value(&self) -> String {
        match self {
            ConfigValue::Null => String::new(),
            ConfigValue::Bool(b) => b.to_string(),
            ConfigValue::Number(n) => n.to_string(),
            ConfigValue::Text(s) => s.clone(),
        }
    }

    /// Coerce a raw form value according to the input widget that produced it.
    ///
    /// Numeric inputs that do not parse become `Null`; the backend decides
    /// whether that is acceptable.
    pub fn from_form(input_type: ConfigInputType, raw: &str) -> Self {
        if input_type.is_numeric() {
            let trimmed = raw.trim();
            return match trimmed.parse::<i64>() {
                Ok(int) => ConfigValue::Number(int.into()),
                Err(_) => trimmed
                    .parse::<f64>()
                    .map(ConfigValue::number)
                    .unwrap_or(ConfigValue::Null),
            };
        }

        match input_type {
            ConfigInputType::Checkbox => {
                ConfigValue::Bool(matches!(raw.trim(), "true" | "on" | "1"))
            }
            _ => ConfigValue::Text(raw.to_string()),
        }
    }
}

impl From<&str> for ConfigValue {
    fn from(value: &str) -> Self {
        ConfigValue::Text(value.to_string())
    }
}

impl From<bool> for ConfigValue {
    fn from(value: bool) -> Self {
        ConfigValue::Bool(value)
    }
}

impl From<i64> for ConfigValue {
    fn from(value: i64) -> Self {
        ConfigValue::Number(value.into())
    }
}

/// One option of a select input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigFieldOption {
    pub label: String,
    pub value: String,
}

/// Field descriptor of a model's configuration schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigField {
    pub key: String,
    pub label: String,
    #[serde(default)]
    pub input_type: ConfigInputType,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub default: ConfigValue,
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
    #[serde(default)]
    pub step: Option<f64>,
    #[serde(default)]
    pub options: Vec<ConfigFieldOption>,
    #[serde(default)]
    pub placeholder: Option<String>,
    #[serde(default)]
    pub help_text: Option<String>,
}

impl ConfigField {
    /// Minimal field with a text input, mostly useful for tests
    pub fn new(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            input_type: ConfigInputType::Text,
            required: false,
            default: ConfigValue::Null,
            min: None,
            max: None,
            step: None,
            options: Vec::new(),
            placeholder: None,
            help_text: None,
        }
    }

    pub fn with_input_type(mut self, input_type: ConfigInputType) -> Self {
        self.input_type = input_type;
        self
    }

    pub fn with_default(mut self, default: impl Into<ConfigValue>) -> Self {
        self.default = default.into();
        self
    }
}

/// Descriptor of one TTS model, immutable for the lifetime of a catalog load
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDescriptor {
    pub model_id: String,
    pub display_name: String,
    pub provider: String,
    pub category: ModelCategory,
    #[serde(default)]
    pub capabilities: ModelCapabilities,
    #[serde(default)]
    pub config_schema: Vec<ConfigField>,
    pub configured: bool,
    #[serde(default)]
    pub config_warnings: Vec<String>,
    #[serde(default)]
    pub runtime_alias: Option<String>,
}

impl ModelDescriptor {
    /// Create a configured model with an empty schema
    pub fn new(
        model_id: impl Into<String>,
        display_name: impl Into<String>,
        provider: impl Into<String>,
        category: ModelCategory,
    ) -> Self {
        Self {
            model_id: model_id.into(),
            display_name: display_name.into(),
            provider: provider.into(),
            category,
            capabilities: ModelCapabilities::default(),
            config_schema: Vec::new(),
            configured: true,
            config_warnings: Vec::new(),
            runtime_alias: None,
        }
    }

    /// Mark the model as not configured, with the backend's reasons
    pub fn unconfigured(mut self, warnings: Vec<String>) -> Self {
        self.configured = false;
        self.config_warnings = warnings;
        self
    }

    pub fn with_field(mut self, field: ConfigField) -> Self {
        self.config_schema.push(field);
        self
    }

    /// Look up a schema field by key
    pub fn field(&self, key: &str) -> Option<&ConfigField> {
        self.config_schema.iter().find(|f| f.key == key)
    }

    /// Config map seeded from every schema field's default
    pub fn default_config(&self) -> ConfigMap {
        self.config_schema
            .iter()
            .map(|field| (field.key.clone(), field.default.clone()))
            .collect()
    }

    /// Error message reported when this model is run while not configured
    pub fn not_configured_message(&self) -> String {
        if self.config_warnings.is_empty() {
            NOT_CONFIGURED_FALLBACK.to_string()
        } else {
            self.config_warnings.join("; ")
        }
    }
}

/// `GET /models/catalog` response body
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelCatalogResponse {
    #[serde(default)]
    pub models: Vec<ModelDescriptor>,
}
