//! Deterministic memo keys.
//!
//! A [`MemoKey`] is built from the qualified name of the memoized call plus a
//! canonical string for every argument, joined with `:`. Two calls share a
//! cached value only when all of these parts are identical.

use std::fmt;

/// Cache key for a memoized call.
///
/// # Example
///
/// ```
/// use chatlog_memo::MemoKey;
///
/// let key = MemoKey::new("Directory::member").arg(42).arg(7);
/// assert_eq!(key.as_str(), "Directory::member:42:7");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MemoKey(String);

impl MemoKey {
    /// Start a key for the call site `qualified_name`.
    #[must_use]
    pub fn new(qualified_name: &str) -> Self {
        Self(qualified_name.to_owned())
    }

    /// Append an argument through its [`Display`](fmt::Display) form.
    #[must_use]
    pub fn arg(mut self, value: impl fmt::Display) -> Self {
        self.0.push(':');
        self.0.push_str(&value.to_string());
        self
    }

    /// Append an argument through its [`Debug`](fmt::Debug) form.
    ///
    /// Use for values without a natural textual form, such as tuples or
    /// options, where `Debug` still distinguishes every value.
    #[must_use]
    pub fn arg_debug(mut self, value: &impl fmt::Debug) -> Self {
        self.0.push(':');
        self.0.push_str(&format!("{value:?}"));
        self
    }

    /// Append an argument that has no textual form at all.
    ///
    /// The argument is represented by its type name, so every value of `T`
    /// maps to the same key part: `<path::to::T>`.
    #[must_use]
    pub fn arg_opaque<T: ?Sized>(mut self) -> Self {
        self.0.push_str(":<");
        self.0.push_str(std::any::type_name::<T>());
        self.0.push('>');
        self
    }

    /// The canonical key string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MemoKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_key_without_args_is_name() {
        assert_eq!(MemoKey::new("fetch_user").as_str(), "fetch_user");
    }

    #[test]
    fn test_key_joins_args_with_colon() {
        let key = MemoKey::new("Directory::role").arg(1).arg("admin");
        assert_eq!(key.as_str(), "Directory::role:1:admin");
    }

    #[test]
    fn test_argument_order_matters() {
        let a = MemoKey::new("f").arg(1).arg(2);
        let b = MemoKey::new("f").arg(2).arg(1);
        assert_ne!(a, b);
    }

    #[test]
    fn test_call_site_matters() {
        let a = MemoKey::new("Directory::member").arg(5);
        let b = MemoKey::new("Directory::channel").arg(5);
        assert_ne!(a, b);
    }

    #[test]
    fn test_debug_arg() {
        let key = MemoKey::new("f").arg_debug(&Some(3));
        assert_eq!(key.as_str(), "f:Some(3)");
    }

    #[test]
    fn test_opaque_arg_uses_type_name() {
        struct Handle;
        let key = MemoKey::new("f").arg_opaque::<Handle>();
        assert!(key.as_str().starts_with("f:<"));
        assert!(key.as_str().ends_with("Handle>"));
    }
}
