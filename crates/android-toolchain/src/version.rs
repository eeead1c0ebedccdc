//! Version ordering for side-by-side NDK directories (`ndk/23.1.7779620`).

use std::cmp::Ordering;
use std::path::{Path, PathBuf};

/// Numeric key of a versioned directory name.
///
/// Each dot-separated segment contributes its leading digits, so `9.0`
/// sorts before `10.0` and `25.2.9519653` before `26.1.10909125`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NdkVersion {
    segments: Vec<u64>,
    name: String,
}

impl NdkVersion {
    /// Parse a directory name; `None` if it does not start with a digit
    pub fn parse(name: &str) -> Option<Self> {
        if !name.starts_with(|c: char| c.is_ascii_digit()) {
            return None;
        }

        let segments = name
            .split('.')
            .map(|segment| {
                let digits: String = segment.chars().take_while(|c| c.is_ascii_digit()).collect();
                digits.parse::<u64>().unwrap_or(0)
            })
            .collect();

        Some(Self {
            segments,
            name: name.to_string(),
        })
    }
}

impl Ord for NdkVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.segments.len().max(other.segments.len());
        for i in 0..len {
            let a = self.segments.get(i).copied().unwrap_or(0);
            let b = other.segments.get(i).copied().unwrap_or(0);
            match a.cmp(&b) {
                Ordering::Equal => continue,
                unequal => return unequal,
            }
        }
        self.name.cmp(&other.name)
    }
}

impl PartialOrd for NdkVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Highest-versioned immediate subdirectory of `container`
pub fn highest_version_dir(container: &Path) -> Option<PathBuf> {
    let entries = std::fs::read_dir(container).ok()?;

    entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_dir())
        .filter_map(|entry| {
            let name = entry.file_name();
            NdkVersion::parse(name.to_str()?).map(|version| (version, entry.path()))
        })
        .max_by(|(a, _), (b, _)| a.cmp(b))
        .map(|(_, path)| path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(name: &str) -> NdkVersion {
        NdkVersion::parse(name).unwrap()
    }

    #[test]
    fn test_numeric_not_lexicographic() {
        assert!(v("9.0") < v("10.0"));
        assert!(v("21.0") < v("22.0"));
        assert!(v("22.0") < v("23.1"));
        assert!(v("25.2.9519653") < v("26.1.10909125"));
        assert!(v("26.1") < v("26.1.1"));
    }

    #[test]
    fn test_suffixed_segments() {
        assert!(v("21.4.7075529") < v("27.0.12077973-beta1"));
        assert!(NdkVersion::parse("r25c").is_none());
        assert!(NdkVersion::parse("latest").is_none());
        assert!(NdkVersion::parse(".DS_Store").is_none());
    }

    #[test]
    fn test_highest_version_dir() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["21.0", "23.1", "22.0", "notes"] {
            std::fs::create_dir(dir.path().join(name)).unwrap();
        }
        std::fs::write(dir.path().join("99.0"), "a file, not a directory").unwrap();

        assert_eq!(highest_version_dir(dir.path()), Some(dir.path().join("23.1")));
    }

    #[test]
    fn test_empty_container() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(highest_version_dir(dir.path()), None);
        assert_eq!(highest_version_dir(&dir.path().join("missing")), None);
    }
}
