use std::collections::BTreeMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::property::PropertyConfig;
use crate::error::{KarozuError, Result};
use crate::extension::{Command, DependencyRules, InstallScript};
use crate::template::OperationKind;

/// Root config structure deserialized from karozu.toml.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ManifestConfig {
    pub extension: ExtensionMetadata,

    /// Properties in declaration order.
    #[serde(default)]
    pub properties: IndexMap<String, PropertyConfig>,

    #[serde(default)]
    pub dependencies: DependencyRules,

    #[serde(default)]
    pub scripts: Vec<ScriptConfig>,

    #[serde(default)]
    pub commands: Vec<CommandConfig>,

    /// Extra utility names, each aliasing a base utility.
    #[serde(default)]
    pub utilities: BTreeMap<String, String>,

    #[serde(default)]
    pub templates: Vec<TemplateEntry>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExtensionMetadata {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub author: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScriptConfig {
    #[serde(flatten)]
    pub script: InstallScript,
    /// Tera expression; the script is dropped when it evaluates to false.
    pub when: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CommandConfig {
    #[serde(flatten)]
    pub command: Command,
    pub when: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TemplateEntry {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub path: String,
    pub operation: Option<OperationKind>,

    /// File (relative to the manifest) holding the template or append content.
    pub source: Option<String>,
    pub template: Option<String>,
    pub content: Option<String>,

    #[serde(default)]
    pub replacements: Vec<ReplacementConfig>,

    /// Tera expression; the template is skipped when it evaluates to false.
    pub when: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReplacementConfig {
    pub old: String,
    pub new: String,
}

impl ManifestConfig {
    pub fn validate(&self) -> Result<()> {
        for (name, prop) in &self.properties {
            if prop.choices.is_empty() {
                return Err(KarozuError::InvalidSchema {
                    property: name.clone(),
                    reason: "properties must have 'choices' defined".into(),
                });
            }
        }

        for entry in &self.templates {
            if entry.source.is_some() && (entry.template.is_some() || entry.content.is_some()) {
                return Err(KarozuError::ManifestInvalid {
                    item: format!("template '{}'", entry.title),
                    reason: "'source' cannot be combined with inline 'template' or 'content'"
                        .into(),
                });
            }
        }

        Ok(())
    }
}
