//! Recompile an extension whenever its manifest or templates change.
//!
//! Only one compile runs at a time. Change events that arrive while a compile
//! is in flight are dropped rather than queued.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::channel;
use std::sync::Arc;
use std::time::Duration;

use console::style;
use globset::{Glob, GlobSet, GlobSetBuilder};
use notify_debouncer_mini::{new_debouncer, notify::RecursiveMode, DebouncedEventKind};

use crate::error::{KarozuError, Result};
use crate::manifest::load_extension;
use crate::props::PropertyValues;

pub const DEFAULT_OUTPUT_FILE: &str = "compiled.json";

const WATCHED_PATTERNS: &[&str] = &["**/*.toml", "**/*.tera"];

pub struct WatchOptions {
    pub extension_dir: PathBuf,
    pub values: PropertyValues,
    /// Written next to the manifest; never itself triggers a recompile.
    pub output_file_name: String,
}

/// Single in-flight guard shared between the event loop and compile workers.
#[derive(Clone, Default)]
pub struct CompileGuard {
    busy: Arc<AtomicBool>,
}

/// Held for the duration of one compile; releases the guard on drop.
pub struct CompileTicket {
    busy: Arc<AtomicBool>,
}

impl CompileGuard {
    /// Claim the guard, or `None` if a compile is already running.
    pub fn try_begin(&self) -> Option<CompileTicket> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| CompileTicket {
                busy: Arc::clone(&self.busy),
            })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

impl Drop for CompileTicket {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

/// Decides which changed paths warrant a recompile.
pub struct ChangeFilter {
    watched: GlobSet,
    output_file_name: String,
}

impl ChangeFilter {
    pub fn new(output_file_name: &str) -> Result<Self> {
        let mut builder = GlobSetBuilder::new();
        for pattern in WATCHED_PATTERNS {
            let glob = Glob::new(pattern).map_err(|e| KarozuError::GlobPattern {
                pattern: pattern.to_string(),
                source: e,
            })?;
            builder.add(glob);
        }
        let watched = builder.build().map_err(|e| KarozuError::GlobPattern {
            pattern: "<watched>".into(),
            source: e,
        })?;

        Ok(Self {
            watched,
            output_file_name: output_file_name.to_string(),
        })
    }

    pub fn is_relevant(&self, path: &Path) -> bool {
        let is_output = path
            .file_name()
            .is_some_and(|name| name.to_string_lossy() == self.output_file_name);
        !is_output && self.watched.is_match(path)
    }
}

/// Load, compile and write the result as pretty JSON. Returns the output path.
pub fn recompile(
    extension_dir: &Path,
    values: &PropertyValues,
    output_file_name: &str,
) -> Result<PathBuf> {
    let loaded = load_extension(extension_dir)?;
    let result = loaded.compile(values)?;
    let output_path = extension_dir.join(output_file_name);
    crate::write_result(&result, &output_path)?;
    Ok(output_path)
}

/// Watch `options.extension_dir` until the watcher shuts down.
pub fn watch(options: WatchOptions) -> Result<()> {
    let extension_dir = options.extension_dir.canonicalize().map_err(|e| KarozuError::Io {
        context: format!("resolving {}", options.extension_dir.display()),
        source: e,
    })?;
    let filter = ChangeFilter::new(&options.output_file_name)?;
    let guard = CompileGuard::default();

    println!("{}", style("Karozu watcher").bold());
    println!(
        "  Listening for changes in: {}",
        style(extension_dir.display()).cyan()
    );
    println!("{}", style("---------------").dim());

    let (tx, rx) = channel();
    let mut debouncer =
        new_debouncer(Duration::from_millis(300), tx).map_err(|e| KarozuError::Watch {
            message: e.to_string(),
        })?;
    debouncer
        .watcher()
        .watch(&extension_dir, RecursiveMode::Recursive)
        .map_err(|e| KarozuError::Watch {
            message: e.to_string(),
        })?;

    for events in rx {
        let events = match events {
            Ok(events) => events,
            Err(e) => {
                eprintln!("{} Watch error: {e:?}", style("✗").red().bold());
                continue;
            }
        };

        let Some(changed) = events
            .iter()
            .find(|e| matches!(e.kind, DebouncedEventKind::Any) && filter.is_relevant(&e.path))
            .map(|e| e.path.clone())
        else {
            continue;
        };

        let Some(ticket) = guard.try_begin() else {
            continue;
        };

        let dir = extension_dir.clone();
        let values = options.values.clone();
        let output_file_name = options.output_file_name.clone();
        std::thread::spawn(move || {
            let _ticket = ticket;
            match recompile(&dir, &values, &output_file_name) {
                Ok(output) => println!(
                    "{} Compiled {} -> {}",
                    style("✓").green().bold(),
                    changed.strip_prefix(&dir).unwrap_or(&changed).display(),
                    style(output.display()).cyan()
                ),
                Err(e) => eprintln!("{} {:?}", style("✗").red().bold(), miette::Report::new(e)),
            }
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_guard_allows_one_compile_at_a_time() {
        let guard = CompileGuard::default();
        let ticket = guard.try_begin().expect("first claim succeeds");
        assert!(guard.is_busy());
        assert!(guard.try_begin().is_none());
        assert!(guard.clone().try_begin().is_none());

        drop(ticket);
        assert!(!guard.is_busy());
        assert!(guard.try_begin().is_some());
    }

    #[rstest]
    #[case("ext/karozu.toml", true)]
    #[case("ext/templates/config.ts.tera", true)]
    #[case("ext/compiled.json", false)]
    #[case("ext/README.md", false)]
    #[case("ext/src/index.ts", false)]
    fn test_change_filter(#[case] path: &str, #[case] relevant: bool) {
        let filter = ChangeFilter::new(DEFAULT_OUTPUT_FILE).unwrap();
        assert_eq!(filter.is_relevant(Path::new(path)), relevant);
    }

    #[test]
    fn test_output_file_is_never_relevant() {
        let filter = ChangeFilter::new("out.toml").unwrap();
        assert!(!filter.is_relevant(Path::new("ext/out.toml")));
        assert!(filter.is_relevant(Path::new("ext/karozu.toml")));
    }

    #[test]
    fn test_recompile_writes_output() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("karozu.toml"),
            r#"
[extension]
name = "tiny"
version = "0.1.0"

[properties.dbType]
choices = ["mysql"]

[[dependencies.default]]
package = "drizzle-orm"
"#,
        )
        .unwrap();

        let values = PropertyValues::new().with("dbType", "mysql");
        let output = recompile(dir.path(), &values, DEFAULT_OUTPUT_FILE).unwrap();
        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(output).unwrap()).unwrap();
        assert_eq!(json["dependencies"][0], "drizzle-orm");
        assert_eq!(json["devDependencies"].as_array().unwrap().len(), 0);
    }
}
