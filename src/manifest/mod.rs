//! Turn a `karozu.toml` manifest into an [`Extension`] and its templates.

use std::path::Path;
use std::sync::Arc;

use crate::config::schema::{ManifestConfig, TemplateEntry};
use crate::config::load_manifest;
use crate::error::{KarozuError, Result};
use crate::extension::{CompilationResult, Extension};
use crate::props::{PropertySchema, PropertyValues};
use crate::template::engine::{check_bool_expr, eval_bool_expr};
use crate::template::{FileSpec, OperationKind, Replacement, Template, TeraFileTemplate};
use crate::utilities::UtilityRegistry;

/// A manifest template together with its inclusion condition.
pub struct ManifestTemplate {
    pub title: String,
    pub when: Option<String>,
    pub template: Template,
}

pub struct LoadedExtension {
    pub extension: Arc<Extension>,
    pub templates: Vec<ManifestTemplate>,
    pub warnings: Vec<String>,
}

impl LoadedExtension {
    /// Templates whose `when` condition holds for `values`, in manifest order.
    ///
    /// A condition that fails to evaluate, e.g. one reading an unset optional
    /// property, excludes its template.
    pub fn templates_for(&self, values: &PropertyValues) -> Vec<Template> {
        self.templates
            .iter()
            .filter(|entry| holds(entry.when.as_deref(), values))
            .map(|entry| entry.template.clone())
            .collect()
    }

    pub fn compile(&self, values: &PropertyValues) -> Result<CompilationResult> {
        let values = self
            .extension
            .schema()
            .validate(self.extension.name(), values)?;
        let templates = self.templates_for(&values);
        self.extension.compile(&templates, &values)
    }
}

/// Load the manifest in `dir` and build its extension.
pub fn load_extension(dir: &Path) -> Result<LoadedExtension> {
    let config = load_manifest(dir)?;
    build_extension(&config, dir)
}

pub fn build_extension(config: &ManifestConfig, root: &Path) -> Result<LoadedExtension> {
    let mut warnings = Vec::new();
    if config.extension.description.is_empty() {
        warnings.push("No 'description' specified in [extension] section".to_string());
    }
    if config.extension.author.is_empty() {
        warnings.push("No 'author' specified in [extension] section".to_string());
    }

    let schema = build_schema(config)?;
    config.dependencies.check(&schema)?;
    let utilities = build_utilities(config)?;

    for script in &config.scripts {
        check_when(script.when.as_deref(), || {
            format!("script '{}'", script.script.script)
        })?;
    }
    for command in &config.commands {
        check_when(command.when.as_deref(), || {
            format!("command '{}'", command.command.command)
        })?;
    }

    let rules = config.dependencies.clone();
    let scripts = config.scripts.clone();
    let commands = config.commands.clone();

    let extension = Extension::builder(&config.extension.name)
        .version(&config.extension.version)
        .description(&config.extension.description)
        .author(&config.extension.author)
        .schema(schema)
        .dependencies(move |_| rules.clone())
        .utilities(&utilities)
        .post_install_scripts(move |values| {
            scripts
                .iter()
                .filter(|s| holds(s.when.as_deref(), values))
                .map(|s| s.script.clone())
                .collect()
        })
        .commands(move |values| {
            commands
                .iter()
                .filter(|c| holds(c.when.as_deref(), values))
                .map(|c| c.command.clone())
                .collect()
        })
        .build()?;

    let mut templates = Vec::new();
    for entry in &config.templates {
        check_when(entry.when.as_deref(), || format!("template '{}'", entry.title))?;
        let raw = read_template_entry(root, entry)?;
        let parsed = TeraFileTemplate::parse(&entry.title, raw)?;
        templates.push(ManifestTemplate {
            title: entry.title.clone(),
            when: entry.when.clone(),
            template: Template::from_tera(&extension, parsed),
        });
    }

    Ok(LoadedExtension {
        extension,
        templates,
        warnings,
    })
}

pub fn build_schema(config: &ManifestConfig) -> Result<PropertySchema> {
    config
        .properties
        .iter()
        .fold(PropertySchema::builder(), |builder, (name, prop)| {
            builder.property(prop.to_property(name))
        })
        .build()
}

/// Resolve `[utilities]` aliases against the base set.
pub fn build_utilities(config: &ManifestConfig) -> Result<UtilityRegistry> {
    let base = UtilityRegistry::base();
    let mut extra = UtilityRegistry::default();
    for (alias, target) in &config.utilities {
        let Some(f) = base.get(target) else {
            return Err(KarozuError::ManifestInvalid {
                item: format!("utility '{alias}'"),
                reason: format!("'{target}' is not a base utility"),
            });
        };
        let f = Arc::clone(f);
        extra = extra.with_args(alias, move |s, args| f(s, args));
    }
    Ok(extra)
}

/// Build the raw (unrendered) `FileSpec` for a manifest template entry.
///
/// A `source` file becomes the `content` of an append, otherwise the `template`.
pub fn read_template_entry(root: &Path, entry: &TemplateEntry) -> Result<FileSpec> {
    let mut spec = FileSpec {
        title: entry.title.clone(),
        description: entry.description.clone(),
        path: entry.path.clone(),
        operation: entry.operation,
        template: entry.template.clone(),
        replacements: None,
        content: entry.content.clone(),
    };

    if !entry.replacements.is_empty() {
        spec.replacements = Some(
            entry
                .replacements
                .iter()
                .map(|r| Replacement::new(&r.old, &r.new))
                .collect(),
        );
    }

    if let Some(source) = &entry.source {
        let path = root.join(source);
        if !path.exists() {
            return Err(KarozuError::TemplateSourceMissing { path });
        }
        let text = std::fs::read_to_string(&path).map_err(|e| KarozuError::Io {
            context: format!("reading {}", path.display()),
            source: e,
        })?;
        if entry.operation == Some(OperationKind::Append) {
            spec.content = Some(text);
        } else {
            spec.template = Some(text);
        }
    }

    Ok(spec)
}

fn check_when(expr: Option<&str>, target: impl FnOnce() -> String) -> Result<()> {
    if let Some(expr) = expr {
        check_bool_expr(expr).map_err(|e| KarozuError::WhenEvaluation {
            target: target(),
            source: e,
        })?;
    }
    Ok(())
}

/// Evaluation errors count as false; syntax was checked at load.
fn holds(expr: Option<&str>, values: &PropertyValues) -> bool {
    expr.map_or(true, |e| eval_bool_expr(e, values).unwrap_or(false))
}
