use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{KarozuError, Result};
use crate::props::{PropertySchema, PropertyValues};

fn latest() -> String {
    "latest".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    #[serde(rename = "package")]
    pub package_name: String,
    /// `latest` or a version range such as `^3.6.0`.
    #[serde(default = "latest")]
    pub version: String,
    #[serde(default)]
    pub dev: bool,
}

impl Dependency {
    pub fn new(package_name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            package_name: package_name.into(),
            version: version.into(),
            dev: false,
        }
    }

    pub fn latest(package_name: impl Into<String>) -> Self {
        Self::new(package_name, latest())
    }

    /// Mark as a development dependency.
    pub fn dev(mut self) -> Self {
        self.dev = true;
        self
    }
}

/// Unconditional dependencies plus per-property, per-value additions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyRules {
    #[serde(default)]
    pub default: Vec<Dependency>,
    #[serde(default, rename = "when")]
    pub by_property: BTreeMap<String, BTreeMap<String, Vec<Dependency>>>,
}

impl DependencyRules {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn default_deps(mut self, deps: impl IntoIterator<Item = Dependency>) -> Self {
        self.default.extend(deps);
        self
    }

    /// Dependencies added when `property` is set to `value`.
    pub fn when(
        mut self,
        property: &str,
        value: &str,
        deps: impl IntoIterator<Item = Dependency>,
    ) -> Self {
        self.by_property
            .entry(property.to_string())
            .or_default()
            .entry(value.to_string())
            .or_default()
            .extend(deps);
        self
    }

    /// Reject property keys the schema does not declare and value keys outside
    /// the property's choices.
    pub fn check(&self, schema: &PropertySchema) -> Result<()> {
        for (property, by_value) in &self.by_property {
            let Some(declared) = schema.get(property) else {
                return Err(KarozuError::InvalidDependencyRule {
                    property: property.clone(),
                    value: None,
                    reason: "property is not declared in the schema".into(),
                });
            };
            for value in by_value.keys() {
                if !declared.allows(value) {
                    return Err(KarozuError::InvalidDependencyRule {
                        property: property.clone(),
                        value: Some(value.clone()),
                        reason: format!("value is not one of [{}]", declared.choices.join(", ")),
                    });
                }
            }
        }
        Ok(())
    }

    /// Split applicable dependencies into runtime and dev package names.
    ///
    /// Defaults come first, then each property's list in schema declaration
    /// order. Nothing is deduplicated: a package listed twice appears twice.
    pub fn resolve(&self, schema: &PropertySchema, values: &PropertyValues) -> ResolvedDependencies {
        let mut resolved = ResolvedDependencies::default();
        resolved.extend(&self.default);

        for prop in schema.properties() {
            let Some(value) = values.get(&prop.name) else {
                continue;
            };
            if let Some(deps) = self
                .by_property
                .get(&prop.name)
                .and_then(|by_value| by_value.get(value))
            {
                resolved.extend(deps);
            }
        }

        resolved
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedDependencies {
    pub dependencies: Vec<String>,
    pub dev_dependencies: Vec<String>,
}

impl ResolvedDependencies {
    fn extend(&mut self, deps: &[Dependency]) {
        for dep in deps {
            if dep.dev {
                self.dev_dependencies.push(dep.package_name.clone());
            } else {
                self.dependencies.push(dep.package_name.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> PropertySchema {
        PropertySchema::builder()
            .select("dbType", ["postgres", "mysql", "sqlite"])
            .select("provider", ["neon", "turso", "planetscale"])
            .build()
            .unwrap()
    }

    #[test]
    fn test_defaults_then_property_lists() {
        let rules = DependencyRules::new()
            .default_deps([Dependency::latest("A"), Dependency::latest("B").dev()])
            .when("dbType", "mysql", [Dependency::latest("C")]);
        let values = PropertyValues::new().with("dbType", "mysql");

        let resolved = rules.resolve(&schema(), &values);
        assert_eq!(resolved.dependencies, ["A", "C"]);
        assert_eq!(resolved.dev_dependencies, ["B"]);
    }

    #[test]
    fn test_property_lists_follow_schema_order() {
        // Inserted provider-first; schema declares dbType first.
        let rules = DependencyRules::new()
            .when("provider", "turso", [Dependency::latest("@libsql/client")])
            .when("dbType", "sqlite", [Dependency::latest("better-sqlite3")]);
        let values = PropertyValues::new()
            .with("provider", "turso")
            .with("dbType", "sqlite");

        let resolved = rules.resolve(&schema(), &values);
        assert_eq!(resolved.dependencies, ["better-sqlite3", "@libsql/client"]);
    }

    #[test]
    fn test_duplicates_are_kept() {
        let rules = DependencyRules::new()
            .default_deps([Dependency::latest("A"), Dependency::latest("T").dev()])
            .when("dbType", "postgres", [Dependency::latest("A"), Dependency::latest("T").dev()]);
        let values = PropertyValues::new().with("dbType", "postgres");

        let resolved = rules.resolve(&schema(), &values);
        assert_eq!(resolved.dependencies, ["A", "A"]);
        assert_eq!(resolved.dev_dependencies, ["T", "T"]);
    }

    #[test]
    fn test_unmatched_value_adds_nothing() {
        let rules = DependencyRules::new().when("dbType", "mysql", [Dependency::latest("mysql2")]);
        let values = PropertyValues::new().with("dbType", "postgres");
        assert_eq!(rules.resolve(&schema(), &values), ResolvedDependencies::default());
    }

    #[test]
    fn test_check_rejects_undeclared_property() {
        let rules = DependencyRules::new().when("orm", "prisma", [Dependency::latest("prisma")]);
        let err = rules.check(&schema()).unwrap_err();
        assert!(matches!(err, KarozuError::InvalidDependencyRule { value: None, .. }));
    }

    #[test]
    fn test_check_rejects_value_outside_choices() {
        let rules = DependencyRules::new().when("dbType", "oracle", [Dependency::latest("oracledb")]);
        let err = rules.check(&schema()).unwrap_err();
        assert!(err.to_string().contains("'dbType' = 'oracle'"));
    }

    #[test]
    fn test_rules_deserialize_from_toml() {
        let rules: DependencyRules = toml::from_str(
            r#"
[[default]]
package = "drizzle-orm"
version = "^2.0.0"

[[default]]
package = "drizzle-kit"
dev = true

[[when.dbType.mysql]]
package = "mysql2"
"#,
        )
        .unwrap();
        assert_eq!(rules.default[1].version, "latest");
        assert!(rules.default[1].dev);
        assert_eq!(rules.by_property["dbType"]["mysql"][0].package_name, "mysql2");
    }
}
