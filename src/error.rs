#![allow(unused_assignments)]

use std::fmt;
use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

/// A single property/value pair that failed schema validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaViolation {
    pub property: String,
    pub value: Option<String>,
    pub kind: ViolationKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViolationKind {
    /// Value is not one of the declared choices.
    NotAllowed { choices: Vec<String> },
    /// Required property has no value and no default.
    Missing,
    /// Property is not declared in the schema.
    Undeclared,
}

impl fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ViolationKind::NotAllowed { choices } => write!(
                f,
                "{}={:?} is not one of [{}]",
                self.property,
                self.value.as_deref().unwrap_or_default(),
                choices.join(", ")
            ),
            ViolationKind::Missing => write!(f, "{} is required", self.property),
            ViolationKind::Undeclared => write!(
                f,
                "{}={:?} is not a declared property",
                self.property,
                self.value.as_deref().unwrap_or_default()
            ),
        }
    }
}

fn join_violations(violations: &[SchemaViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, Error, Diagnostic)]
pub enum KarozuError {
    #[error("Invalid properties for extension '{extension}': {}", join_violations(.violations))]
    #[diagnostic(help("Pass one of the declared choices for each property (-d key=value)"))]
    SchemaValidation {
        extension: String,
        violations: Vec<SchemaViolation>,
    },

    #[error(
        "Template '{title}' does not match operation '{operation}': expected [{}], found [{}]",
        .expected.join(", "),
        .found.join(", ")
    )]
    #[diagnostic(help(
        "create needs `template`, edit needs non-empty `replacements`, append needs `content`, delete needs nothing"
    ))]
    TemplateShape {
        title: String,
        operation: String,
        expected: Vec<&'static str>,
        found: Vec<&'static str>,
    },

    #[error("Invalid dependency rule for '{property}'{}: {reason}", .value.as_ref().map(|v| format!(" = '{v}'")).unwrap_or_default())]
    #[diagnostic(help("Dependency rules may only reference declared properties and their choices"))]
    InvalidDependencyRule {
        property: String,
        value: Option<String>,
        reason: String,
    },

    #[error("Invalid property definition for '{property}': {reason}")]
    InvalidSchema { property: String, reason: String },

    #[error("Extension definition is missing '{field}'")]
    IncompleteDefinition { field: &'static str },

    #[error("Template belongs to a different extension than '{extension}'")]
    #[diagnostic(help("Bind templates with Template::new(&extension, ..) using the extension you compile with"))]
    ForeignTemplate { extension: String },

    #[error("Extension manifest not found at {path}")]
    #[diagnostic(help("Ensure the extension directory contains a karozu.toml file"))]
    ManifestNotFound { path: PathBuf },

    #[error("Failed to parse karozu.toml")]
    #[diagnostic(help("Check the TOML syntax in your karozu.toml file"))]
    ManifestParse {
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid {item} in karozu.toml: {reason}")]
    ManifestInvalid { item: String, reason: String },

    #[error("Template source not found: {path}")]
    TemplateSourceMissing { path: PathBuf },

    #[error("Template rendering failed for {template}")]
    #[diagnostic(help("Check your Tera template syntax"))]
    RenderError {
        template: String,
        #[source]
        source: tera::Error,
    },

    #[error("Invalid 'when' expression for {target}")]
    WhenEvaluation {
        target: String,
        #[source]
        source: tera::Error,
    },

    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize compilation result")]
    Serialize {
        #[source]
        source: serde_json::Error,
    },

    #[error("Glob pattern error: {pattern}")]
    GlobPattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("Prompt cancelled by user")]
    PromptCancelled,

    #[error("File watcher failed: {message}")]
    Watch { message: String },
}

pub type Result<T> = std::result::Result<T, KarozuError>;
