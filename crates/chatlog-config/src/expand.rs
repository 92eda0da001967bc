//! `${VAR}` references in string settings.
//!
//! Only the braced forms are recognized: `${VAR}` must be set, `${VAR:-x}`
//! falls back to `x`. A bare `$` is literal, which matters for shortcode
//! values such as `"$"` or `"💲"`.

use crate::ConfigError;

/// Marker error for a variable the lookup does not know.
struct Unset;

/// Expands variable references in settings, reading values through `lookup`.
pub(crate) struct EnvExpander<F> {
    lookup: F,
}

impl EnvExpander<fn(&str) -> Option<String>> {
    /// Expander reading the process environment.
    pub(crate) fn process() -> Self {
        Self::new(process_env)
    }
}

fn process_env(var: &str) -> Option<String> {
    std::env::var(var).ok()
}

impl<F: Fn(&str) -> Option<String>> EnvExpander<F> {
    pub(crate) fn new(lookup: F) -> Self {
        Self { lookup }
    }

    /// Expand the setting `field` in place.
    pub(crate) fn expand(&self, field: &str, value: &mut String) -> Result<(), ConfigError> {
        if !value.contains("${") {
            return Ok(());
        }

        let expanded = shellexpand::env_with_context(value.as_str(), |var| {
            (self.lookup)(var).map(Some).ok_or(Unset)
        })
        .map_err(|e| ConfigError::EnvVar {
            field: field.to_owned(),
            message: format!("${{{}}} not set", e.var_name),
        })?;

        *value = expanded.into_owned();
        Ok(())
    }
}
