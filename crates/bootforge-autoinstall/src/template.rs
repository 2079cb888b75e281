//! The default `$variable` substitution engine.

use bootforge_core::util::data::value_to_display;
use bootforge_types::{Result, TemplateEngine, TemplateVars};
use parking_lot::Mutex;
use regex::{Captures, Regex};

/// Minimal template engine: substitutes `$name` and `${name}` tokens
/// from the variable map.
///
/// - `\$` escapes a literal dollar sign
/// - unknown tokens stay literal and are recorded as diagnostics,
///   retrievable via [`TemplateEngine::last_errors`]
/// - maps render `key=value`-style, lists space-joined
pub struct VariableTemplateEngine {
    pattern: Regex,
    last_errors: Mutex<Vec<String>>,
}

impl VariableTemplateEngine {
    /// Create the engine.
    pub fn new() -> Self {
        // escaped dollar first, then braced, then bare tokens
        let pattern = Regex::new(r"\\\$|\$\{([A-Za-z_][A-Za-z0-9_]*)\}|\$([A-Za-z_][A-Za-z0-9_]*)")
            .expect("template token pattern is valid");
        Self {
            pattern,
            last_errors: Mutex::new(Vec::new()),
        }
    }
}

impl Default for VariableTemplateEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateEngine for VariableTemplateEngine {
    fn render(&self, text: &str, vars: &TemplateVars) -> Result<String> {
        let mut errors: Vec<String> = Vec::new();

        let rendered = self.pattern.replace_all(text, |caps: &Captures| {
            let token = caps.get(0).map(|m| m.as_str()).unwrap_or_default();
            if token == "\\$" {
                return "$".to_string();
            }
            let key = caps
                .get(1)
                .or_else(|| caps.get(2))
                .map(|m| m.as_str())
                .unwrap_or_default();
            match vars.get(key) {
                Some(value) => value_to_display(value),
                None => {
                    errors.push(format!("unresolved variable '{}'", key));
                    token.to_string()
                }
            }
        });

        *self.last_errors.lock() = errors;
        Ok(rendered.into_owned())
    }

    fn last_errors(&self) -> Vec<String> {
        self.last_errors.lock().clone()
    }
}
