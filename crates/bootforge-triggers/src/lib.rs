//! # Bootforge Triggers
//!
//! Pre/post hooks executed around mutations.
//!
//! Triggers come in two flavors:
//!
//! - **filesystem triggers**: executables discovered by glob under
//!   `<root>/<event-path>/*` (e.g. `delete/system/pre/*`), executed in
//!   lexical order with positional string arguments
//! - **in-process callables**: registered under an event path and
//!   invoked `(args) -> i32` in registration-name order, before any
//!   filesystem triggers for the same event
//!
//! Triggers are best-effort side effects, not transactional
//! participants: a failing trigger is logged and never rolls back the
//! mutation it surrounds.

#![warn(missing_docs)]
#![warn(clippy::all)]

use bootforge_types::{Result, TriggerDispatch};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;
use tracing::{debug, warn};

/// Signature of an in-process trigger.
pub type Callable = dyn Fn(&[String]) -> i32 + Send + Sync;

/// Discovers and executes triggers for mutation event paths.
pub struct TriggerRunner {
    root: PathBuf,
    // event path -> name -> callable; BTreeMap gives registration-name order
    registry: RwLock<BTreeMap<String, BTreeMap<String, Arc<Callable>>>>,
}

impl TriggerRunner {
    /// A runner discovering filesystem triggers under `root`.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            registry: RwLock::new(BTreeMap::new()),
        }
    }

    /// Register an in-process callable under an event path.
    ///
    /// Callables for one event run in lexical `name` order, before the
    /// event's filesystem triggers.
    pub fn register(&self, event: impl Into<String>, name: impl Into<String>, callable: Arc<Callable>) {
        self.registry
            .write()
            .entry(event.into())
            .or_default()
            .insert(name.into(), callable);
    }

    /// Remove a registered callable.
    pub fn unregister(&self, event: &str, name: &str) {
        if let Some(entries) = self.registry.write().get_mut(event) {
            entries.remove(name);
        }
    }

    fn run_callables(&self, event: &str, args: &[String]) {
        let callables: Vec<(String, Arc<Callable>)> = match self.registry.read().get(event) {
            Some(entries) => entries
                .iter()
                .map(|(name, cb)| (name.clone(), cb.clone()))
                .collect(),
            None => Vec::new(),
        };

        for (name, callable) in callables {
            debug!("running registered trigger '{}' for '{}'", name, event);
            let status = callable(args);
            if status != 0 {
                warn!(
                    "registered trigger '{}' for '{}' returned {}",
                    name, event, status
                );
            }
        }
    }

    fn run_executables(&self, event: &str, args: &[String]) {
        let pattern = self.root.join(event).join("*");
        let matches = match glob::glob(&pattern.to_string_lossy()) {
            Ok(paths) => paths,
            Err(e) => {
                warn!("bad trigger glob for '{}': {}", event, e);
                return;
            }
        };

        // glob yields paths in alphabetical order already
        for entry in matches {
            let path = match entry {
                Ok(path) => path,
                Err(e) => {
                    warn!("unreadable trigger under '{}': {}", event, e);
                    continue;
                }
            };
            if !path.is_file() {
                continue;
            }
            debug!("running trigger {:?}", path);
            match Command::new(&path).args(args).status() {
                Ok(status) if status.success() => {}
                Ok(status) => warn!("trigger {:?} exited {}", path, status),
                Err(e) => warn!("trigger {:?} failed to start: {}", path, e),
            }
        }
    }
}

impl TriggerDispatch for TriggerRunner {
    fn run(&self, event: &str, args: &[String]) -> Result<()> {
        self.run_callables(event, args);
        self.run_executables(event, args);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::fs;
    use tempfile::TempDir;

    #[cfg(unix)]
    fn write_script(dir: &Path, name: &str, body: &str) {
        use std::os::unix::fs::PermissionsExt;
        fs::create_dir_all(dir).unwrap();
        let path = dir.join(name);
        fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn test_filesystem_triggers_run_in_lexical_order() {
        let temp = TempDir::new().unwrap();
        let event_dir = temp.path().join("add").join("system").join("post");
        let out = temp.path().join("out.txt");

        write_script(
            &event_dir,
            "20-second",
            &format!("echo second >> {}", out.display()),
        );
        write_script(
            &event_dir,
            "10-first",
            &format!("echo first >> {}", out.display()),
        );

        let runner = TriggerRunner::new(temp.path());
        runner
            .run("add/system/post", &["box1".to_string()])
            .unwrap();

        let content = fs::read_to_string(&out).unwrap();
        assert_eq!(content, "first\nsecond\n");
    }

    #[cfg(unix)]
    #[test]
    fn test_trigger_receives_positional_args() {
        let temp = TempDir::new().unwrap();
        let event_dir = temp.path().join("delete").join("distro").join("pre");
        let out = temp.path().join("args.txt");

        write_script(&event_dir, "record-args", &format!("echo \"$1\" >> {}", out.display()));

        let runner = TriggerRunner::new(temp.path());
        runner
            .run("delete/distro/pre", &["fedora".to_string()])
            .unwrap();

        assert_eq!(fs::read_to_string(&out).unwrap(), "fedora\n");
    }

    #[cfg(unix)]
    #[test]
    fn test_failing_trigger_is_not_an_error() {
        let temp = TempDir::new().unwrap();
        let event_dir = temp.path().join("sync").join("post");
        write_script(&event_dir, "explode", "exit 1");

        let runner = TriggerRunner::new(temp.path());
        assert!(runner.run("sync/post", &[]).is_ok());
    }

    #[test]
    fn test_missing_event_dir_is_fine() {
        let temp = TempDir::new().unwrap();
        let runner = TriggerRunner::new(temp.path());
        assert!(runner.run("add/repo/pre", &[]).is_ok());
    }

    #[test]
    fn test_registered_callables_run_in_name_order() {
        let temp = TempDir::new().unwrap();
        let runner = TriggerRunner::new(temp.path());

        let calls: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));

        let calls_b = calls.clone();
        runner.register(
            "add/system/pre",
            "b-notify",
            Arc::new(move |args: &[String]| {
                calls_b.lock().push(format!("b:{}", args.join(",")));
                0
            }),
        );
        let calls_a = calls.clone();
        runner.register(
            "add/system/pre",
            "a-audit",
            Arc::new(move |args: &[String]| {
                calls_a.lock().push(format!("a:{}", args.join(",")));
                0
            }),
        );

        runner
            .run("add/system/pre", &["box1".to_string()])
            .unwrap();

        assert_eq!(*calls.lock(), vec!["a:box1".to_string(), "b:box1".to_string()]);
    }

    #[test]
    fn test_failing_callable_is_not_an_error() {
        let temp = TempDir::new().unwrap();
        let runner = TriggerRunner::new(temp.path());
        runner.register("add/system/pre", "grumpy", Arc::new(|_: &[String]| 13));
        assert!(runner.run("add/system/pre", &[]).is_ok());
    }
}
