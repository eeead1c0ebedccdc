//! Environment access
//!
//! Components never read the process environment directly; they are handed
//! an [`Environment`] so tests can supply a fixed map instead.

use std::collections::HashMap;
use std::path::PathBuf;

/// Read-only view of environment variables.
///
/// Implementations report empty values as unset.
pub trait Environment {
    fn var(&self, key: &str) -> Option<String>;

    /// Read a variable as a filesystem path
    fn path(&self, key: &str) -> Option<PathBuf> {
        self.var(key).map(PathBuf::from)
    }
}

/// The environment of the running process
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnvironment;

impl Environment for ProcessEnvironment {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var_os(key)
            .map(|v| v.to_string_lossy().into_owned())
            .filter(|v| !v.is_empty())
    }

    // Paths keep their raw bytes; only `var` goes through a lossy conversion
    fn path(&self, key: &str) -> Option<PathBuf> {
        std::env::var_os(key)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
    }
}

/// A fixed set of variables
#[derive(Debug, Clone, Default)]
pub struct MapEnvironment {
    vars: HashMap<String, String>,
}

impl MapEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a variable, builder style
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(key.into(), value.into());
        self
    }
}

impl Environment for MapEnvironment {
    fn var(&self, key: &str) -> Option<String> {
        self.vars.get(key).filter(|v| !v.is_empty()).cloned()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MapEnvironment {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_values_are_unset() {
        let env = MapEnvironment::new().with("A", "").with("B", "/opt/ndk");
        assert_eq!(env.var("A"), None);
        assert_eq!(env.path("B"), Some(PathBuf::from("/opt/ndk")));
        assert_eq!(env.var("C"), None);
    }

    #[test]
    fn test_collect_from_pairs() {
        let env: MapEnvironment = [("BUILD_TYPE", "Debug")].into_iter().collect();
        assert_eq!(env.var("BUILD_TYPE").as_deref(), Some("Debug"));
    }

    #[cfg(unix)]
    #[test]
    fn test_process_path_keeps_non_utf8_bytes() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let key = "NDK_MATRIX_TEST_NON_UTF8_PATH";
        let raw = OsStr::from_bytes(b"/opt/ndk-\xe9");
        std::env::set_var(key, raw);

        assert_eq!(ProcessEnvironment.path(key), Some(PathBuf::from(raw)));
        assert_eq!(ProcessEnvironment.var(key).as_deref(), Some("/opt/ndk-\u{FFFD}"));

        std::env::set_var(key, "");
        assert_eq!(ProcessEnvironment.path(key), None);
        std::env::remove_var(key);
    }
}
