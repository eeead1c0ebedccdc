//! Toolchain Detection
//!
//! Finds the Android NDK to build against. Sources are consulted strictly in
//! [`SEARCH_ORDER`]; the first one that names a directory wins and is then
//! validated, later sources are never looked at.

use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use ndk_matrix_core::Environment;

use crate::ndk::{NdkInfo, TOOLCHAIN_MARKER};
use crate::version::highest_version_dir;

/// Primary NDK root variable
pub const NDK_HOME_ENV: &str = "ANDROID_NDK_HOME";

/// Secondary NDK root variable
pub const NDK_ROOT_ENV: &str = "ANDROID_NDK_ROOT";

/// SDK root variable probed for a bundled NDK
pub const SDK_HOME_ENV: &str = "ANDROID_HOME";

/// Alternate SDK root variable
pub const SDK_ROOT_ENV: &str = "ANDROID_SDK_ROOT";

/// Legacy single-NDK directory inside an SDK
const BUNDLE_DIR: &str = "ndk-bundle";

/// Side-by-side NDK container inside an SDK
const VERSIONED_DIR: &str = "ndk";

/// Toolchain detection errors
#[derive(Debug, thiserror::Error)]
pub enum LocatorError {
    #[error(
        "Android NDK not found; pass --ndk <path> or set ANDROID_NDK_HOME \
         (also checked: ANDROID_NDK_ROOT, ANDROID_HOME, ANDROID_SDK_ROOT and the usual install locations)"
    )]
    NotFound,
    #[error("invalid Android NDK at {path:?} (from {source_kind}): missing {marker}")]
    Invalid {
        path: PathBuf,
        marker: &'static str,
        source_kind: CandidateSource,
    },
}

/// Where a candidate NDK path came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateSource {
    CommandLine,
    NdkVariable(&'static str),
    SdkVariable(&'static str),
    Conventional,
}

impl fmt::Display for CandidateSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CandidateSource::CommandLine => f.write_str("--ndk"),
            CandidateSource::NdkVariable(var) => write!(f, "${}", var),
            CandidateSource::SdkVariable(var) => write!(f, "${} SDK", var),
            CandidateSource::Conventional => f.write_str("default install location"),
        }
    }
}

/// Sources in priority order
pub const SEARCH_ORDER: &[CandidateSource] = &[
    CandidateSource::CommandLine,
    CandidateSource::NdkVariable(NDK_HOME_ENV),
    CandidateSource::NdkVariable(NDK_ROOT_ENV),
    CandidateSource::SdkVariable(SDK_HOME_ENV),
    CandidateSource::SdkVariable(SDK_ROOT_ENV),
    CandidateSource::Conventional,
];

/// A path some source proposed as the NDK root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub path: PathBuf,
    pub source: CandidateSource,
}

/// Host operating systems with known NDK install locations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostOs {
    MacOs,
    Linux,
    Other,
}

impl HostOs {
    /// The OS this binary runs on
    pub fn current() -> Self {
        if cfg!(target_os = "macos") {
            HostOs::MacOs
        } else if cfg!(target_os = "linux") {
            HostOs::Linux
        } else {
            HostOs::Other
        }
    }

    /// Conventional NDK locations, most preferred first
    pub fn conventional_paths(&self, home: Option<&Path>) -> Vec<PathBuf> {
        let mut paths = Vec::new();

        match self {
            HostOs::MacOs => {
                if let Some(home) = home {
                    let sdk = home.join("Library").join("Android").join("sdk");
                    paths.push(sdk.join(BUNDLE_DIR));
                    paths.push(sdk.join(VERSIONED_DIR));
                }
                paths.push(PathBuf::from("/opt/homebrew/share/android-ndk"));
                paths.push(PathBuf::from("/usr/local/share/android-ndk"));
            }
            HostOs::Linux => {
                if let Some(home) = home {
                    let sdk = home.join("Android").join("Sdk");
                    paths.push(sdk.join(BUNDLE_DIR));
                    paths.push(sdk.join(VERSIONED_DIR));
                }
                paths.push(PathBuf::from("/opt/android-ndk"));
                paths.push(PathBuf::from("/opt/android-sdk").join(VERSIONED_DIR));
                paths.push(PathBuf::from("/usr/local/android-ndk"));
            }
            HostOs::Other => {}
        }

        paths
    }
}

/// Resolves and validates the NDK root
pub struct ToolchainLocator<'a> {
    override_path: Option<PathBuf>,
    env: &'a dyn Environment,
    conventional: Vec<PathBuf>,
}

impl<'a> ToolchainLocator<'a> {
    /// Create a locator using the host's conventional install locations
    pub fn new(env: &'a dyn Environment) -> Self {
        let home = dirs::home_dir();
        Self {
            override_path: None,
            env,
            conventional: HostOs::current().conventional_paths(home.as_deref()),
        }
    }

    /// Set an explicit NDK path that beats every other source
    pub fn with_override(mut self, path: Option<PathBuf>) -> Self {
        self.override_path = path;
        self
    }

    /// Replace the conventional install locations
    pub fn with_conventional_paths(mut self, paths: Vec<PathBuf>) -> Self {
        self.conventional = paths;
        self
    }

    /// First candidate in [`SEARCH_ORDER`], not yet validated
    pub fn find_candidate(&self) -> Option<Candidate> {
        SEARCH_ORDER.iter().find_map(|source| {
            let path = self.probe(source);
            debug!("NDK source {}: {:?}", source, path);
            path.map(|path| Candidate {
                path,
                source: *source,
            })
        })
    }

    /// Find the NDK root and check it contains the CMake toolchain file
    pub fn locate(&self) -> Result<NdkInfo, LocatorError> {
        let candidate = self.find_candidate().ok_or(LocatorError::NotFound)?;

        // CMake runs from inside the build directory, so the root must be absolute
        let root = match candidate.path.canonicalize() {
            Ok(root) if root.join(TOOLCHAIN_MARKER).is_file() => root,
            _ => {
                return Err(LocatorError::Invalid {
                    path: candidate.path,
                    marker: TOOLCHAIN_MARKER,
                    source_kind: candidate.source,
                })
            }
        };

        let info = NdkInfo::read(&root);
        info!(
            "Using Android NDK {} at {:?} (from {})",
            info.revision.as_deref().unwrap_or("(unknown revision)"),
            info.path,
            candidate.source
        );
        Ok(info)
    }

    fn probe(&self, source: &CandidateSource) -> Option<PathBuf> {
        match source {
            CandidateSource::CommandLine => self.override_path.clone(),
            CandidateSource::NdkVariable(var) => self.env.path(var),
            CandidateSource::SdkVariable(var) => self.env.path(var).and_then(|sdk| probe_sdk(&sdk)),
            CandidateSource::Conventional => self.conventional.iter().find_map(|p| probe_conventional(p)),
        }
    }
}

/// Look for an NDK inside an SDK root: `ndk-bundle`, then the newest `ndk/<version>`
pub fn probe_sdk(sdk: &Path) -> Option<PathBuf> {
    let bundle = sdk.join(BUNDLE_DIR);
    if bundle.is_dir() {
        return Some(bundle);
    }

    let container = sdk.join(VERSIONED_DIR);
    if container.is_dir() {
        return highest_version_dir(&container);
    }

    None
}

fn probe_conventional(path: &Path) -> Option<PathBuf> {
    if !path.is_dir() {
        return None;
    }

    if path.file_name().is_some_and(|name| name == VERSIONED_DIR) {
        highest_version_dir(path)
    } else {
        Some(path.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndk_matrix_core::MapEnvironment;
    use tempfile::TempDir;

    fn make_ndk(path: &Path) {
        let marker = path.join(TOOLCHAIN_MARKER);
        std::fs::create_dir_all(marker.parent().unwrap()).unwrap();
        std::fs::write(&marker, "# toolchain").unwrap();
    }

    fn canonical(path: &Path) -> PathBuf {
        path.canonicalize().unwrap()
    }

    fn locator<'a>(env: &'a MapEnvironment) -> ToolchainLocator<'a> {
        ToolchainLocator::new(env).with_conventional_paths(Vec::new())
    }

    #[test]
    fn test_nothing_found() {
        let env = MapEnvironment::new();
        assert!(matches!(locator(&env).locate(), Err(LocatorError::NotFound)));
    }

    #[test]
    fn test_override_without_marker_is_invalid() {
        let dir = TempDir::new().unwrap();
        let env = MapEnvironment::new();

        let err = locator(&env)
            .with_override(Some(dir.path().to_path_buf()))
            .locate()
            .unwrap_err();

        match &err {
            LocatorError::Invalid { path, marker, source_kind } => {
                assert_eq!(path, dir.path());
                assert_eq!(*marker, TOOLCHAIN_MARKER);
                assert_eq!(*source_kind, CandidateSource::CommandLine);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        let message = err.to_string();
        assert!(message.contains(&dir.path().display().to_string()) || message.contains(&format!("{:?}", dir.path())));
        assert!(message.contains(TOOLCHAIN_MARKER));
    }

    #[test]
    fn test_override_beats_environment() {
        let explicit = TempDir::new().unwrap();
        let from_env = TempDir::new().unwrap();
        make_ndk(explicit.path());
        make_ndk(from_env.path());
        let env = MapEnvironment::new().with(NDK_HOME_ENV, from_env.path().to_string_lossy());

        let info = locator(&env)
            .with_override(Some(explicit.path().to_path_buf()))
            .locate()
            .unwrap();
        assert_eq!(info.path, canonical(explicit.path()));
    }

    #[test]
    fn test_first_source_wins_even_when_invalid() {
        let broken = TempDir::new().unwrap();
        let good = TempDir::new().unwrap();
        make_ndk(good.path());
        let env = MapEnvironment::new()
            .with(NDK_HOME_ENV, broken.path().to_string_lossy())
            .with(NDK_ROOT_ENV, good.path().to_string_lossy());

        let err = locator(&env).locate().unwrap_err();
        assert!(matches!(
            err,
            LocatorError::Invalid { source_kind: CandidateSource::NdkVariable(NDK_HOME_ENV), .. }
        ));
    }

    #[test]
    fn test_secondary_variable() {
        let ndk = TempDir::new().unwrap();
        make_ndk(ndk.path());
        let env = MapEnvironment::new()
            .with(NDK_HOME_ENV, "")
            .with(NDK_ROOT_ENV, ndk.path().to_string_lossy());

        let candidate = locator(&env).find_candidate().unwrap();
        assert_eq!(candidate.source, CandidateSource::NdkVariable(NDK_ROOT_ENV));
        assert_eq!(locator(&env).locate().unwrap().path, canonical(ndk.path()));
    }

    #[test]
    fn test_sdk_picks_highest_version() {
        let sdk = TempDir::new().unwrap();
        for version in ["21.0", "23.1", "22.0"] {
            make_ndk(&sdk.path().join("ndk").join(version));
        }
        let env = MapEnvironment::new().with(SDK_HOME_ENV, sdk.path().to_string_lossy());

        let info = locator(&env).locate().unwrap();
        assert_eq!(info.path, canonical(&sdk.path().join("ndk").join("23.1")));
    }

    #[test]
    fn test_sdk_prefers_bundle() {
        let sdk = TempDir::new().unwrap();
        make_ndk(&sdk.path().join("ndk-bundle"));
        make_ndk(&sdk.path().join("ndk").join("26.1.10909125"));
        let env = MapEnvironment::new().with(SDK_ROOT_ENV, sdk.path().to_string_lossy());

        let candidate = locator(&env).find_candidate().unwrap();
        assert_eq!(candidate.path, sdk.path().join("ndk-bundle"));
        assert_eq!(candidate.source, CandidateSource::SdkVariable(SDK_ROOT_ENV));
    }

    #[test]
    fn test_empty_sdk_falls_through() {
        let empty_sdk = TempDir::new().unwrap();
        let sdk = TempDir::new().unwrap();
        make_ndk(&sdk.path().join("ndk").join("25.2.9519653"));
        let env = MapEnvironment::new()
            .with(SDK_HOME_ENV, empty_sdk.path().to_string_lossy())
            .with(SDK_ROOT_ENV, sdk.path().to_string_lossy());

        let info = locator(&env).locate().unwrap();
        assert_eq!(info.path, canonical(&sdk.path().join("ndk").join("25.2.9519653")));
    }

    #[test]
    fn test_conventional_paths() {
        let root = TempDir::new().unwrap();
        let missing = root.path().join("opt").join("android-ndk");
        let container = root.path().join("Android").join("Sdk").join("ndk");
        make_ndk(&container.join("9.0"));
        make_ndk(&container.join("10.0"));
        let env = MapEnvironment::new();

        let info = ToolchainLocator::new(&env)
            .with_conventional_paths(vec![missing, container.clone()])
            .locate()
            .unwrap();
        assert_eq!(info.path, canonical(&container.join("10.0")));
    }

    #[test]
    fn test_host_conventional_paths() {
        let home = Path::new("/home/dev");
        let linux = HostOs::Linux.conventional_paths(Some(home));
        assert_eq!(linux[0], home.join("Android/Sdk/ndk-bundle"));
        assert!(linux.contains(&PathBuf::from("/opt/android-ndk")));

        let mac = HostOs::MacOs.conventional_paths(None);
        assert_eq!(mac[0], PathBuf::from("/opt/homebrew/share/android-ndk"));

        assert!(HostOs::Other.conventional_paths(Some(home)).is_empty());
    }

    #[test]
    fn test_relative_root_is_made_absolute() {
        let cwd = std::env::current_dir().unwrap();
        let ndk = TempDir::new_in(&cwd).unwrap();
        make_ndk(ndk.path());
        let relative = Path::new(".").join(ndk.path().file_name().unwrap());
        let env = MapEnvironment::new().with(NDK_HOME_ENV, relative.to_string_lossy());

        let info = locator(&env).locate().unwrap();
        assert!(info.path.is_absolute());
        assert_eq!(info.path, canonical(ndk.path()));
        assert!(info.toolchain_file().is_file());
    }

    #[test]
    fn test_missing_root_is_invalid() {
        let root = TempDir::new().unwrap();
        let gone = root.path().join("android-ndk-r26");
        let env = MapEnvironment::new();

        let err = locator(&env).with_override(Some(gone.clone())).locate().unwrap_err();
        assert!(matches!(err, LocatorError::Invalid { ref path, .. } if *path == gone));
    }
}
