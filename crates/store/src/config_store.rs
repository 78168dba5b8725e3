//! Per-model configuration values

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use tts_playground_core::{ConfigMap, ConfigValue, ModelDescriptor};

/// model_id → (field key → value)
///
/// Values are passed to the backend as-is; nothing here validates them
/// against the schema.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelConfigs(BTreeMap<String, ConfigMap>);

impl ModelConfigs {
    /// Seed every model's map from its schema defaults
    pub fn defaults_for(models: &[ModelDescriptor]) -> Self {
        Self(
            models
                .iter()
                .map(|m| (m.model_id.clone(), m.default_config()))
                .collect(),
        )
    }

    /// A model's config; empty when the model has no entry
    pub fn get(&self, model_id: &str) -> ConfigMap {
        self.0.get(model_id).cloned().unwrap_or_default()
    }

    /// Current value of one field
    pub fn value(&self, model_id: &str, key: &str) -> Option<&ConfigValue> {
        self.0.get(model_id).and_then(|m| m.get(key))
    }

    /// Set one field, leaving every other field and model untouched
    pub fn set(&mut self, model_id: &str, key: &str, value: ConfigValue) {
        self.0
            .entry(model_id.to_string())
            .or_default()
            .insert(key.to_string(), value);
    }

    /// Configs of the given models, empty maps for models without an entry
    pub fn restricted_to(&self, model_ids: &[String]) -> BTreeMap<String, ConfigMap> {
        model_ids
            .iter()
            .map(|id| (id.clone(), self.get(id)))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tts_playground_core::{ConfigField, ConfigInputType, ModelCategory};

    fn catalog() -> Vec<ModelDescriptor> {
        vec![
            ModelDescriptor::new("a", "A", "p", ModelCategory::Cloud)
                .with_field(ConfigField::new("speaker", "Speaker").with_default("anushka"))
                .with_field(
                    ConfigField::new("pace", "Pace")
                        .with_input_type(ConfigInputType::Slider)
                        .with_default(1_i64),
                ),
            ModelDescriptor::new("b", "B", "p", ModelCategory::SelfHosted)
                .with_field(ConfigField::new("description", "Description")),
        ]
    }

    #[test]
    fn test_defaults_for_catalog() {
        let configs = ModelConfigs::defaults_for(&catalog());
        assert_eq!(configs.len(), 2);
        assert_eq!(configs.value("a", "speaker"), Some(&ConfigValue::text("anushka")));
        assert_eq!(configs.value("b", "description"), Some(&ConfigValue::Null));
    }

    #[test]
    fn test_set_is_structural() {
        let mut configs = ModelConfigs::defaults_for(&catalog());
        let b_before = configs.get("b");

        configs.set("a", "pace", ConfigValue::number(1.5));

        assert_eq!(configs.value("a", "pace").and_then(|v| v.as_f64()), Some(1.5));
        assert_eq!(configs.value("a", "speaker"), Some(&ConfigValue::text("anushka")));
        assert_eq!(configs.get("b"), b_before);
    }

    #[test]
    fn test_missing_model_reads_empty() {
        let configs = ModelConfigs::defaults_for(&catalog());
        assert!(configs.get("ghost").is_empty());
    }

    #[test]
    fn test_restricted_to() {
        let configs = ModelConfigs::defaults_for(&catalog());
        let restricted = configs.restricted_to(&["b".to_string(), "ghost".to_string()]);

        assert_eq!(restricted.len(), 2);
        assert!(restricted.contains_key("b"));
        assert!(restricted["ghost"].is_empty());
        assert!(!restricted.contains_key("a"));
    }
}
