pub mod dependency;
pub mod output;

use std::fmt;
use std::sync::Arc;

use crate::error::{KarozuError, Result};
use crate::props::{PropertySchema, PropertyValues};
use crate::template::Template;
use crate::utilities::UtilityRegistry;

pub use dependency::{Dependency, DependencyRules, ResolvedDependencies};
pub use output::{Command, CompilationResult, InstallScript};

type RulesFn = dyn Fn(&PropertyValues) -> DependencyRules + Send + Sync;
type ScriptsFn = dyn Fn(&PropertyValues) -> Vec<InstallScript> + Send + Sync;
type CommandsFn = dyn Fn(&PropertyValues) -> Vec<Command> + Send + Sync;

/// The static definition of a scaffoldable unit.
///
/// Immutable once built and shared through `Arc` by every template bound to
/// it, so concurrent compile calls need no locking.
pub struct Extension {
    name: String,
    version: String,
    description: String,
    author: String,
    schema: PropertySchema,
    dependencies: Box<RulesFn>,
    utilities: UtilityRegistry,
    post_install_scripts: Option<Box<ScriptsFn>>,
    commands: Option<Box<CommandsFn>>,
}

impl fmt::Debug for Extension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Extension")
            .field("name", &self.name)
            .field("version", &self.version)
            .field("schema", &self.schema)
            .field("utilities", &self.utilities)
            .finish_non_exhaustive()
    }
}

impl Extension {
    pub fn builder(name: impl Into<String>) -> ExtensionBuilder {
        ExtensionBuilder {
            name: name.into(),
            version: "0.0.0".to_string(),
            description: String::new(),
            author: String::new(),
            schema: None,
            dependencies: None,
            utilities: UtilityRegistry::default(),
            post_install_scripts: None,
            commands: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn schema(&self) -> &PropertySchema {
        &self.schema
    }

    /// Base utilities merged with this extension's own entries.
    pub fn utilities(&self) -> &UtilityRegistry {
        &self.utilities
    }

    /// Validate `values`, resolve dependencies and compile `templates` in order.
    ///
    /// The first failing step aborts the call; no partial result is returned.
    pub fn compile(
        &self,
        templates: &[Template],
        values: &PropertyValues,
    ) -> Result<CompilationResult> {
        let values = self.schema.validate(&self.name, values)?;

        let rules = (self.dependencies)(&values);
        rules.check(&self.schema)?;
        let ResolvedDependencies {
            dependencies,
            dev_dependencies,
        } = rules.resolve(&self.schema, &values);

        let templates = templates
            .iter()
            .map(|template| {
                if !std::ptr::eq(Arc::as_ptr(template.extension()), self) {
                    return Err(KarozuError::ForeignTemplate {
                        extension: self.name.clone(),
                    });
                }
                template.compile(&values)
            })
            .collect::<Result<Vec<_>>>()?;

        let post_install_scripts = self
            .post_install_scripts
            .as_ref()
            .map(|f| f(&values))
            .unwrap_or_default();
        let commands = self
            .commands
            .as_ref()
            .map(|f| f(&values))
            .unwrap_or_default();

        Ok(CompilationResult {
            dependencies,
            dev_dependencies,
            templates,
            post_install_scripts,
            commands,
        })
    }
}

pub struct ExtensionBuilder {
    name: String,
    version: String,
    description: String,
    author: String,
    schema: Option<PropertySchema>,
    dependencies: Option<Box<RulesFn>>,
    utilities: UtilityRegistry,
    post_install_scripts: Option<Box<ScriptsFn>>,
    commands: Option<Box<CommandsFn>>,
}

impl ExtensionBuilder {
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into();
        self
    }

    pub fn schema(mut self, schema: PropertySchema) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Dependency rules computed from the validated values of each compile.
    pub fn dependencies<F>(mut self, f: F) -> Self
    where
        F: Fn(&PropertyValues) -> DependencyRules + Send + Sync + 'static,
    {
        self.dependencies = Some(Box::new(f));
        self
    }

    /// Add an extension-specific utility; it shadows a base utility of the same name.
    pub fn utility<F>(mut self, name: &str, f: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.utilities = self.utilities.with(name, f);
        self
    }

    pub fn utilities(mut self, utilities: &UtilityRegistry) -> Self {
        self.utilities = self.utilities.merged(utilities);
        self
    }

    pub fn post_install_scripts<F>(mut self, f: F) -> Self
    where
        F: Fn(&PropertyValues) -> Vec<InstallScript> + Send + Sync + 'static,
    {
        self.post_install_scripts = Some(Box::new(f));
        self
    }

    pub fn commands<F>(mut self, f: F) -> Self
    where
        F: Fn(&PropertyValues) -> Vec<Command> + Send + Sync + 'static,
    {
        self.commands = Some(Box::new(f));
        self
    }

    pub fn build(self) -> Result<Arc<Extension>> {
        let schema = self
            .schema
            .ok_or(KarozuError::IncompleteDefinition { field: "schema" })?;
        let dependencies = self
            .dependencies
            .ok_or(KarozuError::IncompleteDefinition {
                field: "dependencies",
            })?;

        Ok(Arc::new(Extension {
            name: self.name,
            version: self.version,
            description: self.description,
            author: self.author,
            schema,
            dependencies,
            utilities: UtilityRegistry::base().merged(&self.utilities),
            post_install_scripts: self.post_install_scripts,
            commands: self.commands,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::{FileSpec, OperationKind};

    fn schema() -> PropertySchema {
        PropertySchema::builder()
            .select("dbType", ["postgres", "mysql", "sqlite"])
            .build()
            .unwrap()
    }

    fn extension() -> Arc<Extension> {
        Extension::builder("drizzle-orm")
            .version("1.0.0")
            .schema(schema())
            .dependencies(|_| {
                DependencyRules::new()
                    .default_deps([Dependency::latest("A"), Dependency::latest("B").dev()])
                    .when("dbType", "mysql", [Dependency::latest("C")])
            })
            .commands(|_| vec![Command::new("drizzle-kit migrate").named("migrate")])
            .build()
            .unwrap()
    }

    #[test]
    fn test_build_requires_schema_and_rules() {
        let err = Extension::builder("x")
            .dependencies(|_| DependencyRules::new())
            .build()
            .unwrap_err();
        assert!(matches!(err, KarozuError::IncompleteDefinition { field: "schema" }));

        let err = Extension::builder("x").schema(schema()).build().unwrap_err();
        assert!(matches!(
            err,
            KarozuError::IncompleteDefinition {
                field: "dependencies"
            }
        ));
    }

    #[test]
    fn test_compile_without_templates() {
        let values = PropertyValues::new().with("dbType", "mysql");
        let result = extension().compile(&[], &values).unwrap();

        assert_eq!(result.dependencies, ["A", "C"]);
        assert_eq!(result.dev_dependencies, ["B"]);
        assert!(result.templates.is_empty());
        assert!(result.post_install_scripts.is_empty());
        assert_eq!(result.commands[0].command, "drizzle-kit migrate");
    }

    #[test]
    fn test_compile_rejects_rules_outside_schema() {
        let ext = Extension::builder("bad")
            .schema(schema())
            .dependencies(|_| DependencyRules::new().when("dbType", "oracle", Vec::new()))
            .build()
            .unwrap();
        let values = PropertyValues::new().with("dbType", "mysql");
        let err = ext.compile(&[], &values).unwrap_err();
        assert!(matches!(err, KarozuError::InvalidDependencyRule { .. }));
    }

    #[test]
    fn test_compile_rejects_foreign_template() {
        let other = extension();
        let template = Template::new(&other, |_| {
            FileSpec::new("x", "", "x.ts").operation(OperationKind::Delete)
        });
        let values = PropertyValues::new().with("dbType", "mysql");
        let err = extension().compile(&[template], &values).unwrap_err();
        assert!(matches!(err, KarozuError::ForeignTemplate { .. }));
    }

    #[test]
    fn test_extension_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Extension>();
        assert_send_sync::<Template>();
    }
}
