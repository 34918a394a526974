use serde::{Deserialize, Serialize};

use crate::template::FileDescriptor;

/// A package-manager script run after installation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallScript {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Everything after the package manager, e.g. `install` rather than `pnpm install`.
    pub script: String,
}

impl InstallScript {
    pub fn new(script: impl Into<String>) -> Self {
        Self {
            name: None,
            description: None,
            script: script.into(),
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// A `package.json` script entry to register, e.g. `drizzle-kit migrate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub command: String,
}

impl Command {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            name: None,
            description: None,
            command: command.into(),
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// Everything an installer needs from one compile call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompilationResult {
    pub dependencies: Vec<String>,
    pub dev_dependencies: Vec<String>,
    pub templates: Vec<FileDescriptor>,
    pub post_install_scripts: Vec<InstallScript>,
    pub commands: Vec<Command>,
}

impl CompilationResult {
    pub fn to_json(&self) -> crate::error::Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| crate::error::KarozuError::Serialize { source: e })
    }
}
