//! Property schema and the values validated against it.
//!
//! A schema is an ordered list of properties, each restricted to a closed set
//! of string choices. Declaration order is significant: dependency resolution
//! walks properties in this order.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{KarozuError, Result, SchemaViolation, ViolationKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    pub name: String,
    pub choices: Vec<String>,
    pub required: bool,
    pub default: Option<String>,
    pub prompt: Option<String>,
}

impl Property {
    pub fn allows(&self, value: &str) -> bool {
        self.choices.iter().any(|c| c == value)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertySchema {
    properties: Vec<Property>,
}

#[derive(Default)]
pub struct PropertySchemaBuilder {
    properties: Vec<Property>,
}

impl PropertySchemaBuilder {
    /// Declare a required property restricted to `choices`.
    pub fn select<I, S>(self, name: &str, choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.property(Property {
            name: name.to_string(),
            choices: choices.into_iter().map(Into::into).collect(),
            required: true,
            default: None,
            prompt: None,
        })
    }

    pub fn property(mut self, property: Property) -> Self {
        self.properties.push(property);
        self
    }

    pub fn build(self) -> Result<PropertySchema> {
        for (idx, prop) in self.properties.iter().enumerate() {
            let invalid = |reason: &str| KarozuError::InvalidSchema {
                property: prop.name.clone(),
                reason: reason.to_string(),
            };

            if self.properties[..idx].iter().any(|p| p.name == prop.name) {
                return Err(invalid("declared more than once"));
            }
            if prop.choices.is_empty() {
                return Err(invalid("must declare at least one choice"));
            }
            for (i, choice) in prop.choices.iter().enumerate() {
                if prop.choices[..i].contains(choice) {
                    return Err(invalid(&format!("choice '{choice}' is listed twice")));
                }
            }
            if let Some(default) = &prop.default {
                if !prop.allows(default) {
                    return Err(invalid(&format!(
                        "default '{default}' is not one of the choices"
                    )));
                }
            }
        }

        Ok(PropertySchema {
            properties: self.properties,
        })
    }
}

impl PropertySchema {
    pub fn builder() -> PropertySchemaBuilder {
        PropertySchemaBuilder::default()
    }

    /// Properties in declaration order.
    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    pub fn get(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name == name)
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Check `values` against the declared domains.
    ///
    /// Every violation is collected before failing, so the caller sees all
    /// offending pairs at once. Absent optional properties pick up their
    /// default; the returned values are what compilation should run with.
    pub fn validate(&self, extension: &str, values: &PropertyValues) -> Result<PropertyValues> {
        let mut violations = Vec::new();
        let mut resolved = BTreeMap::new();

        for prop in &self.properties {
            match values.get(&prop.name) {
                Some(value) if prop.allows(value) => {
                    resolved.insert(prop.name.clone(), value.to_string());
                }
                Some(value) => violations.push(SchemaViolation {
                    property: prop.name.clone(),
                    value: Some(value.to_string()),
                    kind: ViolationKind::NotAllowed {
                        choices: prop.choices.clone(),
                    },
                }),
                None => {
                    if let Some(default) = &prop.default {
                        resolved.insert(prop.name.clone(), default.clone());
                    } else if prop.required {
                        violations.push(SchemaViolation {
                            property: prop.name.clone(),
                            value: None,
                            kind: ViolationKind::Missing,
                        });
                    }
                }
            }
        }

        for (name, value) in values.iter() {
            if self.get(name).is_none() {
                violations.push(SchemaViolation {
                    property: name.to_string(),
                    value: Some(value.to_string()),
                    kind: ViolationKind::Undeclared,
                });
            }
        }

        if !violations.is_empty() {
            return Err(KarozuError::SchemaValidation {
                extension: extension.to_string(),
                violations,
            });
        }

        Ok(PropertyValues(resolved))
    }
}

/// Property name to chosen value for a single compilation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropertyValues(BTreeMap<String, String>);

impl PropertyValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: &str) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: &str, value: &str) {
        self.0.insert(name.to_string(), value.to_string());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for PropertyValues
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}
