pub mod descriptor;
pub mod engine;

use std::fmt;
use std::sync::Arc;

use crate::error::Result;
use crate::extension::Extension;
use crate::props::PropertyValues;
use crate::utilities::UtilityRegistry;

pub use descriptor::{FileDescriptor, FileOperation, FileSpec, OperationKind, Replacement};
pub use engine::TeraFileTemplate;

/// What a render function sees: the validated values and the extension's utilities.
pub struct RenderContext<'a> {
    pub props: &'a PropertyValues,
    pub utilities: &'a UtilityRegistry,
}

type RenderFn = dyn Fn(&RenderContext<'_>) -> Result<FileSpec> + Send + Sync;

/// A render function bound to the extension whose utilities it uses.
#[derive(Clone)]
pub struct Template {
    extension: Arc<Extension>,
    render: Arc<RenderFn>,
}

impl fmt::Debug for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Template")
            .field("extension", &self.extension.name())
            .finish_non_exhaustive()
    }
}

impl Template {
    pub fn new<F>(extension: &Arc<Extension>, render: F) -> Self
    where
        F: Fn(&RenderContext<'_>) -> FileSpec + Send + Sync + 'static,
    {
        Self::try_new(extension, move |ctx| Ok(render(ctx)))
    }

    /// Like [`Template::new`], for render functions that can fail.
    pub fn try_new<F>(extension: &Arc<Extension>, render: F) -> Self
    where
        F: Fn(&RenderContext<'_>) -> Result<FileSpec> + Send + Sync + 'static,
    {
        Self {
            extension: Arc::clone(extension),
            render: Arc::new(render),
        }
    }

    /// Bind a parsed Tera template to `extension`.
    pub fn from_tera(extension: &Arc<Extension>, template: TeraFileTemplate) -> Self {
        Self::try_new(extension, move |ctx| template.render(ctx))
    }

    pub fn extension(&self) -> &Arc<Extension> {
        &self.extension
    }

    /// Render with `values` and normalize into a checked descriptor.
    ///
    /// The render function runs on every call; nothing is cached.
    pub fn compile(&self, values: &PropertyValues) -> Result<FileDescriptor> {
        let ctx = RenderContext {
            props: values,
            utilities: self.extension.utilities(),
        };
        (self.render)(&ctx)?.normalize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::KarozuError;
    use crate::extension::DependencyRules;
    use crate::props::PropertySchema;

    fn extension() -> Arc<Extension> {
        Extension::builder("test-ext")
            .version("0.1.0")
            .schema(
                PropertySchema::builder()
                    .select("dbType", ["postgres", "mysql"])
                    .build()
                    .unwrap(),
            )
            .dependencies(|_| DependencyRules::new())
            .utility("capitalize", |s| {
                let mut chars = s.chars();
                chars
                    .next()
                    .map(|c| c.to_uppercase().chain(chars).collect::<String>())
                    .unwrap_or_default()
            })
            .build()
            .unwrap()
    }

    #[test]
    fn test_compile_passes_props_and_utilities() {
        let ext = extension();
        let template = Template::new(&ext, |ctx| {
            let db = ctx.props.get("dbType").unwrap_or_default();
            let dialect = ctx.utilities.call("capitalize", db).unwrap_or_default();
            FileSpec::new("Config", "", "drizzle.config.ts")
                .template(format!("dialect: {dialect}"))
        });

        let values = PropertyValues::new().with("dbType", "mysql");
        let descriptor = template.compile(&values).unwrap();
        assert_eq!(
            descriptor.operation,
            FileOperation::Create {
                template: "dialect: Mysql".into()
            }
        );
    }

    #[test]
    fn test_compile_reinvokes_render_every_call() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let template = Template::new(&extension(), move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            FileSpec::new("Old", "", "old.ts").operation(OperationKind::Delete)
        });

        let values = PropertyValues::new().with("dbType", "postgres");
        let first = template.compile(&values).unwrap();
        let second = template.compile(&values).unwrap();
        assert_eq!(first, second);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_render_error_propagates() {
        let tera = TeraFileTemplate::parse(
            "broken",
            FileSpec::new("t", "", "p").content("{{ props.dbType | no_such_filter }}"),
        )
        .unwrap();
        let template = Template::from_tera(&extension(), tera);
        let values = PropertyValues::new().with("dbType", "mysql");
        let err = template.compile(&values).unwrap_err();
        assert!(matches!(err, KarozuError::RenderError { .. }));
    }
}
