//! Named string transforms handed to every template render function.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

use regex_lite::{Captures, Regex};

/// A utility takes the input string plus positional arguments.
pub type UtilityFn = dyn Fn(&str, &[&str]) -> String + Send + Sync;

#[derive(Clone, Default)]
pub struct UtilityRegistry {
    entries: BTreeMap<String, Arc<UtilityFn>>,
}

impl fmt::Debug for UtilityRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.entries.keys()).finish()
    }
}

impl UtilityRegistry {
    /// The base set every extension starts from.
    pub fn base() -> Self {
        Self::default()
            .with("format_path", |s| s.replace('\\', "/"))
            .with("kebab_case", kebab_case)
            .with("camel_case", camel_case)
            .with("title_case", title_case)
            .with("trim", |s| s.trim().to_string())
            .with_args("truncate", truncate)
            .with("upper_case", |s| s.to_uppercase())
            .with("lower_case", |s| s.to_lowercase())
    }

    /// Register a single-argument transform. Replaces any entry of the same name.
    pub fn with<F>(self, name: &str, f: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.with_args(name, move |s, _| f(s))
    }

    pub fn with_args<F>(mut self, name: &str, f: F) -> Self
    where
        F: Fn(&str, &[&str]) -> String + Send + Sync + 'static,
    {
        self.entries.insert(name.to_string(), Arc::new(f));
        self
    }

    /// Layer `overrides` on top of `self`; same-named entries in `overrides` win.
    pub fn merged(mut self, overrides: &UtilityRegistry) -> Self {
        for (name, f) in &overrides.entries {
            self.entries.insert(name.clone(), Arc::clone(f));
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<&Arc<UtilityFn>> {
        self.entries.get(name)
    }

    /// Apply a utility by name. Unknown names yield `None`.
    pub fn call(&self, name: &str, input: &str) -> Option<String> {
        self.call_with(name, input, &[])
    }

    pub fn call_with(&self, name: &str, input: &str, args: &[&str]) -> Option<String> {
        self.entries.get(name).map(|f| f(input, args))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<UtilityFn>)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

fn regex(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("static utility regex"))
}

fn kebab_case(s: &str) -> String {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(&RE, r"([a-z])([A-Z])")
        .replace_all(s, "${1}-${2}")
        .to_lowercase()
}

fn camel_case(s: &str) -> String {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(&RE, r"-([a-z])")
        .replace_all(s, |caps: &Captures| caps[1].to_uppercase())
        .into_owned()
}

fn title_case(s: &str) -> String {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(&RE, r"\w\S*")
        .replace_all(s, |caps: &Captures| {
            let word = &caps[0];
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .into_owned()
}

/// `truncate(s, [length])`: longer inputs are cut and suffixed with `...`.
fn truncate(s: &str, args: &[&str]) -> String {
    let Some(length) = args.first().and_then(|a| a.trim().parse::<usize>().ok()) else {
        return s.to_string();
    };
    if s.chars().count() > length {
        let mut cut: String = s.chars().take(length).collect();
        cut.push_str("...");
        cut
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("format_path", r"src\lib\db.ts", "src/lib/db.ts")]
    #[case("kebab_case", "DrizzleConfig", "drizzle-config")]
    #[case("kebab_case", "dbInstance", "db-instance")]
    #[case("camel_case", "db-instance-file", "dbInstanceFile")]
    #[case("title_case", "hello WORLD from rust", "Hello World From Rust")]
    #[case("trim", "  padded \n", "padded")]
    #[case("upper_case", "mysql", "MYSQL")]
    #[case("lower_case", "MySQL", "mysql")]
    fn test_base_utilities(#[case] name: &str, #[case] input: &str, #[case] expected: &str) {
        let utilities = UtilityRegistry::base();
        assert_eq!(utilities.call(name, input).as_deref(), Some(expected));
    }

    #[rstest]
    #[case("abcdefgh", &["3"], "abc...")]
    #[case("abc", &["3"], "abc")]
    #[case("abc", &[], "abc")]
    #[case("abc", &["nope"], "abc")]
    fn test_truncate(#[case] input: &str, #[case] args: &[&str], #[case] expected: &str) {
        let utilities = UtilityRegistry::base();
        assert_eq!(
            utilities.call_with("truncate", input, args).as_deref(),
            Some(expected)
        );
    }

    #[test]
    fn test_unknown_utility_is_absent() {
        assert_eq!(UtilityRegistry::base().call("no_such_thing", "x"), None);
    }

    #[test]
    fn test_merged_overrides_shadow_base() {
        let extra = UtilityRegistry::default()
            .with("upper_case", |s| format!("<{s}>"))
            .with("capitalize", |s| s.to_string());
        let merged = UtilityRegistry::base().merged(&extra);

        assert_eq!(merged.call("upper_case", "x").as_deref(), Some("<x>"));
        assert!(merged.contains("capitalize"));
        assert!(merged.contains("kebab_case"));
    }
}
