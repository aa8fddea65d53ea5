//! Variable substitution for transcoder argument templates.

use std::collections::HashMap;
use std::path::Path;

use mediagate_core::ByteRange;

/// Placeholders a profile may reference. An argument consisting of exactly
/// one of these with no value set is dropped; inside a larger argument an
/// unset placeholder renders as the empty string.
pub const PLACEHOLDERS: &[&str] = &["input", "mime", "range", "range_start", "range_end"];

/// Variable substitution context for command templates.
///
/// Supports variable substitution in strings using the `{varname}` syntax.
///
/// # Example
///
/// ```
/// use mediagate_av::TemplateContext;
/// use std::path::Path;
///
/// let ctx = TemplateContext::new()
///     .with_input(Path::new("/music/track.flac"))
///     .with_var("mime", "audio/L16");
///
/// assert_eq!(ctx.substitute("{input}"), "/music/track.flac");
/// assert_eq!(
///     ctx.render_args(&["-i".to_string(), "{input}".to_string(), "{range}".to_string()]),
///     vec!["-i".to_string(), "/music/track.flac".to_string()]
/// );
/// ```
#[derive(Debug, Clone, Default)]
pub struct TemplateContext {
    vars: HashMap<String, String>,
}

impl TemplateContext {
    /// Create a new empty template context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `{input}` to the source file.
    pub fn with_input(mut self, input: &Path) -> Self {
        self.vars
            .insert("input".to_string(), input.display().to_string());
        self
    }

    /// Set `{range}`, `{range_start}`, and `{range_end}` when a range is
    /// given. `{range_end}` stays unset for open-ended ranges.
    pub fn with_range(mut self, range: Option<ByteRange>) -> Self {
        if let Some(range) = range {
            self.vars.insert("range".to_string(), range.to_string());
            self.vars
                .insert("range_start".to_string(), range.start.to_string());
            if let Some(end) = range.end {
                self.vars.insert("range_end".to_string(), end.to_string());
            }
        }
        self
    }

    /// Add a custom variable.
    pub fn with_var(mut self, key: &str, value: &str) -> Self {
        self.vars.insert(key.to_string(), value.to_string());
        self
    }

    /// Get a variable value.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(|s| s.as_str())
    }

    /// Substitute variables in a single pass; substituted values are never
    /// re-expanded. Unknown `{names}` are kept verbatim unless they are one
    /// of [`PLACEHOLDERS`].
    pub fn substitute(&self, template: &str) -> String {
        let mut out = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            match after.find('}') {
                Some(close) if !after[..close].contains('{') => {
                    let name = &after[..close];
                    if let Some(value) = self.vars.get(name) {
                        out.push_str(value);
                    } else if !PLACEHOLDERS.contains(&name) {
                        out.push('{');
                        out.push_str(name);
                        out.push('}');
                    }
                    rest = &after[close + 1..];
                }
                _ => {
                    out.push('{');
                    rest = after;
                }
            }
        }
        out.push_str(rest);
        out
    }

    /// Render an argument list, dropping arguments that are a bare unset
    /// placeholder.
    pub fn render_args(&self, templates: &[String]) -> Vec<String> {
        templates
            .iter()
            .filter(|t| !self.is_unset_placeholder(t))
            .map(|t| self.substitute(t))
            .collect()
    }

    fn is_unset_placeholder(&self, arg: &str) -> bool {
        arg.strip_prefix('{')
            .and_then(|a| a.strip_suffix('}'))
            .is_some_and(|name| PLACEHOLDERS.contains(&name) && !self.vars.contains_key(name))
    }
}
