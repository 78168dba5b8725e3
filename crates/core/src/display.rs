//! Display naming for catalog models

use crate::catalog::{ModelCategory, ModelDescriptor};

/// Provider and model labels derived from a descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelParts {
    pub provider_label: String,
    pub model_label: String,
}

/// Title-case an identifier: split on `_` and `-`, capitalize each part, join with spaces
pub fn title_case(input: &str) -> String {
    input
        .split(['_', '-'])
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Split a model into provider and model labels.
///
/// `"Vendor - model"` display names are split on the first separator,
/// self-hosted `org/model` ids use the organisation as provider, and
/// everything else falls back to the declared provider.
pub fn model_parts(model: &ModelDescriptor) -> ModelParts {
    if let Some((provider, name)) = model.display_name.split_once(" - ") {
        return ModelParts {
            provider_label: provider.to_string(),
            model_label: name.to_string(),
        };
    }

    if model.category == ModelCategory::SelfHosted {
        if let Some((org, rest)) = model.model_id.split_once('/') {
            return ModelParts {
                provider_label: title_case(org),
                model_label: rest.to_string(),
            };
        }
    }

    ModelParts {
        provider_label: title_case(&model.provider),
        model_label: model.display_name.clone(),
    }
}
