use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::config::load_manifest;
use crate::config::schema::ManifestConfig;
use crate::error::Result;
use crate::manifest::{build_schema, build_utilities, read_template_entry};
use crate::template::engine::check_bool_expr;
use crate::template::TeraFileTemplate;

/// Result of validating an extension manifest.
pub struct CheckResult {
    pub extension_name: String,
    pub property_count: usize,
    pub template_count: usize,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

/// Validate an extension directory without compiling it.
///
/// Only an unreadable or unparseable manifest is an `Err`; every other problem
/// is collected into the result.
pub fn check_manifest(extension_dir: &Path) -> Result<CheckResult> {
    let config = load_manifest(extension_dir)?;

    let mut warnings = Vec::new();
    let mut errors = Vec::new();

    if config.extension.description.is_empty() {
        warnings.push("No 'description' specified in [extension] section".to_string());
    }
    if config.extension.author.is_empty() {
        warnings.push("No 'author' specified in [extension] section".to_string());
    }

    match build_schema(&config) {
        Ok(schema) => {
            if let Err(e) = config.dependencies.check(&schema) {
                errors.push(format!("Dependencies: {e}"));
            }
        }
        Err(e) => errors.push(format!("Properties: {e}")),
    }

    if let Err(e) = build_utilities(&config) {
        errors.push(format!("Utilities: {e}"));
    }

    check_when_expressions(&config, &mut errors);

    let mut referenced = HashSet::new();
    for entry in &config.templates {
        if let Some(source) = &entry.source {
            referenced.insert(extension_dir.join(source));
        }

        let raw = match read_template_entry(extension_dir, entry) {
            Ok(raw) => raw,
            Err(e) => {
                errors.push(format!("Template '{}': {e}", entry.title));
                continue;
            }
        };

        // Rendering never adds or removes fields, so the unrendered `FileSpec` has
        // the same shape the compiled one will.
        if let Err(e) = raw.clone().normalize() {
            errors.push(e.to_string());
        }

        if let Err(e) = TeraFileTemplate::parse(&entry.title, raw) {
            let detail = std::error::Error::source(&e)
                .map(|s| s.to_string())
                .unwrap_or_default();
            errors.push(format!("Tera syntax error in template '{}': {detail}", entry.title));
        }
    }

    for stray in unreferenced_sources(extension_dir, &referenced) {
        warnings.push(format!(
            "Template file not referenced by any [[templates]] entry: {}",
            stray.display()
        ));
    }

    Ok(CheckResult {
        extension_name: config.extension.name.clone(),
        property_count: config.properties.len(),
        template_count: config.templates.len(),
        warnings,
        errors,
    })
}

fn check_when_expressions(config: &ManifestConfig, errors: &mut Vec<String>) {
    let targets = config
        .templates
        .iter()
        .map(|t| (format!("template '{}'", t.title), t.when.as_deref()))
        .chain(
            config
                .scripts
                .iter()
                .map(|s| (format!("script '{}'", s.script.script), s.when.as_deref())),
        )
        .chain(
            config
                .commands
                .iter()
                .map(|c| (format!("command '{}'", c.command.command), c.when.as_deref())),
        );

    for (target, when) in targets {
        if let Some(expr) = when {
            if let Err(e) = check_bool_expr(expr) {
                errors.push(format!("Invalid 'when' expression for {target}: {e}"));
            }
        }
    }
}

/// `.tera` files under the extension directory that no template points at.
fn unreferenced_sources(dir: &Path, referenced: &HashSet<PathBuf>) -> Vec<PathBuf> {
    let mut stray: Vec<PathBuf> = walkdir::WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.path().extension().is_some_and(|ext| ext == "tera"))
        .filter(|e| !referenced.contains(e.path()))
        .map(|e| e.path().strip_prefix(dir).unwrap_or(e.path()).to_path_buf())
        .collect();
    stray.sort();
    stray
}
