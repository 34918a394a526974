//! Tera-backed rendering for templates declared in a manifest.
//!
//! Every string field of a [`FileSpec`] is treated as a Tera template and
//! rendered against a context holding `props`. Utilities are exposed as Tera
//! filters, so `{{ props.dbType | title_case }}` calls the registry entry.

use std::collections::HashMap;
use std::sync::Arc;

use tera::{Context, Tera, Value};

use super::descriptor::{FileSpec, Replacement};
use super::RenderContext;
use crate::error::{KarozuError, Result};
use crate::props::PropertyValues;
use crate::utilities::{UtilityFn, UtilityRegistry};

const TITLE: &str = "title";
const DESCRIPTION: &str = "description";
const PATH: &str = "path";
const TEMPLATE: &str = "template";
const CONTENT: &str = "content";

pub fn build_context(values: &PropertyValues) -> Context {
    let mut context = Context::new();
    context.insert("props", values);
    context
}

/// Register each utility as a Tera filter of the same name.
///
/// Filter arguments are passed to the utility as strings, ordered by argument
/// name.
pub fn register_utilities(tera: &mut Tera, utilities: &UtilityRegistry) {
    for (name, f) in utilities.iter() {
        tera.register_filter(name, utility_filter(Arc::clone(f)));
    }
}

fn utility_filter(
    f: Arc<UtilityFn>,
) -> impl Fn(&Value, &HashMap<String, Value>) -> tera::Result<Value> + Send + Sync {
    move |value: &Value, args: &HashMap<String, Value>| {
        let input = value_to_string(value);
        let mut named: Vec<_> = args.iter().collect();
        named.sort_by(|a, b| a.0.cmp(b.0));
        let owned: Vec<String> = named
            .into_iter()
            .map(|(_, v)| value_to_string(v))
            .collect();
        let borrowed: Vec<&str> = owned.iter().map(String::as_str).collect();
        Ok(Value::String(f(&input, borrowed.as_slice())))
    }
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Evaluate a Tera boolean expression against property values.
pub fn eval_bool_expr(
    expr: &str,
    values: &PropertyValues,
) -> std::result::Result<bool, tera::Error> {
    let mut tera = Tera::default();
    let template_str = format!("{{% if {expr} %}}true{{% else %}}false{{% endif %}}");
    tera.add_raw_template("__when__", &template_str)?;
    let result = tera.render("__when__", &build_context(values))?;
    Ok(result.trim() == "true")
}

/// Parse a boolean expression without evaluating it.
pub fn check_bool_expr(expr: &str) -> std::result::Result<(), tera::Error> {
    let template = format!("{{% if {expr} %}}ok{{% endif %}}");
    Tera::default().add_raw_template("__check__", &template)?;
    Ok(())
}

/// A [`FileSpec`] whose string fields are Tera sources, parsed once.
#[derive(Debug, Clone)]
pub struct TeraFileTemplate {
    name: String,
    raw: FileSpec,
    tera: Tera,
}

impl TeraFileTemplate {
    pub fn parse(name: &str, raw: FileSpec) -> Result<Self> {
        let mut sources: Vec<(String, &str)> = vec![
            (TITLE.to_string(), raw.title.as_str()),
            (DESCRIPTION.to_string(), raw.description.as_str()),
            (PATH.to_string(), raw.path.as_str()),
        ];
        if let Some(template) = &raw.template {
            sources.push((TEMPLATE.to_string(), template.as_str()));
        }
        if let Some(content) = &raw.content {
            sources.push((CONTENT.to_string(), content.as_str()));
        }
        for (i, r) in raw.replacements.iter().flatten().enumerate() {
            sources.push((replacement_key(i, "old"), r.old_string.as_str()));
            sources.push((replacement_key(i, "new"), r.new_string.as_str()));
        }

        let mut tera = Tera::default();
        tera.add_raw_templates(sources)
            .map_err(|e| KarozuError::RenderError {
                template: name.to_string(),
                source: e,
            })?;

        Ok(Self {
            name: name.to_string(),
            raw,
            tera,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn render(&self, ctx: &RenderContext<'_>) -> Result<FileSpec> {
        let mut tera = self.tera.clone();
        register_utilities(&mut tera, ctx.utilities);
        let context = build_context(ctx.props);

        let render = |key: &str| {
            tera.render(key, &context)
                .map_err(|e| KarozuError::RenderError {
                    template: format!("{} ({key})", self.name),
                    source: e,
                })
        };

        let replacements = match &self.raw.replacements {
            Some(list) => Some(
                (0..list.len())
                    .map(|i| {
                        Ok(Replacement::new(
                            render(&replacement_key(i, "old"))?,
                            render(&replacement_key(i, "new"))?,
                        ))
                    })
                    .collect::<Result<Vec<_>>>()?,
            ),
            None => None,
        };

        Ok(FileSpec {
            title: render(TITLE)?,
            description: render(DESCRIPTION)?,
            path: render(PATH)?,
            operation: self.raw.operation,
            template: self.raw.template.as_ref().map(|_| render(TEMPLATE)).transpose()?,
            replacements,
            content: self.raw.content.as_ref().map(|_| render(CONTENT)).transpose()?,
        })
    }
}

fn replacement_key(index: usize, side: &str) -> String {
    format!("replacements.{index}.{side}")
}
