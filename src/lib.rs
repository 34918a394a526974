pub mod check;
pub mod config;
pub mod error;
pub mod extension;
pub mod manifest;
pub mod prompt;
pub mod props;
pub mod template;
pub mod utilities;
pub mod watch;

use std::path::{Path, PathBuf};

use crate::error::{KarozuError, Result};
use crate::extension::CompilationResult;
use crate::manifest::load_extension;
use crate::prompt::{collect_values, PromptOptions};
use crate::props::PropertyValues;

pub use crate::extension::{Command, Dependency, DependencyRules, Extension, InstallScript};
pub use crate::props::{Property, PropertySchema};
pub use crate::template::{
    FileDescriptor, FileOperation, FileSpec, OperationKind, RenderContext, Replacement, Template,
};
pub use crate::utilities::UtilityRegistry;

pub struct CompileOptions {
    pub extension_dir: PathBuf,
    pub data: Vec<(String, String)>,
    pub defaults: bool,
    pub interactive: bool,
}

/// The outcome of compiling a manifest-defined extension.
pub struct CompiledManifest {
    pub extension_name: String,
    pub values: PropertyValues,
    pub result: CompilationResult,
    pub warnings: Vec<String>,
}

/// Load an extension manifest, collect property values and compile it.
///
/// Nothing is written to disk; see [`write_result`].
pub fn plan_compile(options: CompileOptions) -> Result<CompiledManifest> {
    let loaded = load_extension(&options.extension_dir)?;

    let prompt_options = PromptOptions {
        data_overrides: options.data.into_iter().collect(),
        use_defaults: options.defaults,
        interactive: options.interactive,
    };
    let values = collect_values(loaded.extension.schema(), &prompt_options)?;

    let result = loaded.compile(&values)?;

    Ok(CompiledManifest {
        extension_name: loaded.extension.name().to_string(),
        values,
        result,
        warnings: loaded.warnings,
    })
}

/// Write a compilation result as pretty-printed JSON for an installer.
pub fn write_result(result: &CompilationResult, path: &Path) -> Result<()> {
    let json = result.to_json()?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| KarozuError::Io {
            context: format!("creating directory {}", parent.display()),
            source: e,
        })?;
    }
    std::fs::write(path, json).map_err(|e| KarozuError::Io {
        context: format!("writing {}", path.display()),
        source: e,
    })
}
