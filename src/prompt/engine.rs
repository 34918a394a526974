use std::collections::HashMap;

use crate::error::{KarozuError, Result};
use crate::props::{Property, PropertySchema, PropertyValues};

#[derive(Default)]
pub struct PromptOptions {
    pub data_overrides: HashMap<String, String>,
    pub use_defaults: bool,
    /// When false, properties without an override or default are left unset.
    pub interactive: bool,
}

/// Gather a value for each schema property: overrides first, then defaults
/// (with `use_defaults`), then an interactive select.
///
/// Overrides are not checked here; compilation validates the collected values
/// and reports every offending pair at once.
pub fn collect_values(schema: &PropertySchema, options: &PromptOptions) -> Result<PropertyValues> {
    let mut values = PropertyValues::new();

    for prop in schema.properties() {
        if let Some(value) = options.data_overrides.get(&prop.name) {
            values.insert(&prop.name, value);
            continue;
        }

        if options.use_defaults {
            if let Some(default) = &prop.default {
                values.insert(&prop.name, default);
                continue;
            }
            if !prop.required {
                continue;
            }
        }

        if !options.interactive {
            continue;
        }

        let answer = prompt_property(prop)?;
        values.insert(&prop.name, &answer);
    }

    // Undeclared overrides are kept so validation can name them.
    for (name, value) in &options.data_overrides {
        if schema.get(name).is_none() {
            values.insert(name, value);
        }
    }

    Ok(values)
}

fn prompt_property(prop: &Property) -> Result<String> {
    let prompt_text = prop.prompt.as_deref().unwrap_or(&prop.name);
    let mut prompt = inquire::Select::new(prompt_text, prop.choices.clone());
    if let Some(default) = &prop.default {
        if let Some(idx) = prop.choices.iter().position(|c| c == default) {
            prompt = prompt.with_starting_cursor(idx);
        }
    }
    prompt.prompt().map_err(|_| KarozuError::PromptCancelled)
}

/// Split `key=value` pairs; entries without `=` are dropped.
pub fn parse_data_pairs(data: &[String]) -> Vec<(String, String)> {
    data.iter()
        .filter_map(|kv| {
            let (key, value) = kv.split_once('=')?;
            Some((key.trim().to_string(), value.trim().to_string()))
        })
        .collect()
}
