use serde::{Deserialize, Serialize};

use crate::props::Property;

fn default_required() -> bool {
    true
}

/// Configuration for a single extension property.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct PropertyConfig {
    /// The closed set of values this property accepts.
    pub choices: Vec<String>,

    /// Prompt text shown to the user.
    pub prompt: Option<String>,

    pub default: Option<String>,

    /// If false, the property may be left unset.
    #[serde(default = "default_required")]
    pub required: bool,
}

impl PropertyConfig {
    pub fn to_property(&self, name: &str) -> Property {
        Property {
            name: name.to_string(),
            choices: self.choices.clone(),
            required: self.required,
            default: self.default.clone(),
            prompt: self.prompt.clone(),
        }
    }
}
