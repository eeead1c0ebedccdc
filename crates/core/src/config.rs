//! Build Settings
//!
//! Resolves the settings of one run from, lowest precedence first:
//! - Built-in defaults
//! - The `ndk-matrix.toml` settings file
//! - Environment variables (`BUILD_TYPE`, `ANDROID_PLATFORM`)
//! - Command-line overrides

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;
use tracing::{debug, info};

use crate::env::Environment;
use crate::error::{CoreError, Result};

/// Default settings file name, looked up in the project root
pub const SETTINGS_FILE_NAME: &str = "ndk-matrix.toml";

/// Environment variable holding the default build type
pub const BUILD_TYPE_ENV: &str = "BUILD_TYPE";

/// Environment variable holding the default API level
pub const API_LEVEL_ENV: &str = "ANDROID_PLATFORM";

/// Default minimum API level
pub const DEFAULT_API_LEVEL: u32 = 24;

/// Default build directory prefix
pub const DEFAULT_BUILD_DIR_PREFIX: &str = "build-android";

/// Default CMake generator
pub const DEFAULT_GENERATOR: &str = "Ninja";

/// Default C++ standard library
pub const DEFAULT_STL: &str = "c++_static";

/// CMake variable that receives the architecture tag
pub const DEFAULT_ARCH_VARIABLE: &str = "WITNESS_ARCH";

/// Features switched off when cross-compiling for Android
pub const DEFAULT_DISABLED_FEATURES: &[&str] = &["WITNESS_SCRIPT", "WITNESS_BUILD_TESTS"];

/// CMake build type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(try_from = "String")]
pub enum BuildType {
    #[default]
    Release,
    Debug,
    RelWithDebInfo,
}

impl BuildType {
    /// Name as passed to `CMAKE_BUILD_TYPE`
    pub fn as_str(&self) -> &'static str {
        match self {
            BuildType::Release => "Release",
            BuildType::Debug => "Debug",
            BuildType::RelWithDebInfo => "RelWithDebInfo",
        }
    }
}

impl fmt::Display for BuildType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BuildType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "release" => Ok(BuildType::Release),
            "debug" => Ok(BuildType::Debug),
            "relwithdebinfo" => Ok(BuildType::RelWithDebInfo),
            _ => Err(CoreError::InvalidBuildType(s.to_string())),
        }
    }
}

impl TryFrom<String> for BuildType {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

/// Minimum Android API level, accepted as `24` or `android-24`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ApiLevel(u32);

impl ApiLevel {
    pub fn new(level: u32) -> Result<Self> {
        if level == 0 {
            return Err(CoreError::InvalidApiLevel(level.to_string()));
        }
        Ok(Self(level))
    }

    pub fn get(&self) -> u32 {
        self.0
    }

    /// Value for `ANDROID_PLATFORM`
    pub fn platform_name(&self) -> String {
        format!("android-{}", self.0)
    }
}

impl Default for ApiLevel {
    fn default() -> Self {
        Self(DEFAULT_API_LEVEL)
    }
}

impl fmt::Display for ApiLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ApiLevel {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let digits = trimmed.strip_prefix("android-").unwrap_or(trimmed);
        digits
            .parse::<u32>()
            .map_err(|_| CoreError::InvalidApiLevel(s.to_string()))
            .and_then(|level| {
                ApiLevel::new(level).map_err(|_| CoreError::InvalidApiLevel(s.to_string()))
            })
    }
}

/// API level as written in the settings file
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawApiLevel {
    Number(u32),
    Text(String),
}

impl RawApiLevel {
    fn resolve(&self) -> Result<ApiLevel> {
        match self {
            RawApiLevel::Number(n) => ApiLevel::new(*n),
            RawApiLevel::Text(s) => s.parse(),
        }
    }
}

/// `[cmake]` table of the settings file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CmakeSection {
    /// Variable that receives the architecture tag
    pub arch_variable: Option<String>,
    /// Options forced `OFF` for the Android build
    pub disable: Option<Vec<String>>,
    /// Additional `-D` definitions
    #[serde(default)]
    pub defines: BTreeMap<String, String>,
}

/// Contents of `ndk-matrix.toml`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SettingsFile {
    pub build_type: Option<BuildType>,
    pub api_level: Option<RawApiLevel>,
    pub ndk: Option<PathBuf>,
    pub jobs: Option<u32>,
    pub build_dir_prefix: Option<String>,
    pub generator: Option<String>,
    pub stl: Option<String>,
    #[serde(default)]
    pub cmake: CmakeSection,
}

impl SettingsFile {
    /// Parse a settings file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| CoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut file: SettingsFile = toml::from_str(&content).map_err(|source| CoreError::SettingsParse {
            path: path.to_path_buf(),
            source,
        })?;
        // A relative NDK path is relative to the file, not to the caller's cwd
        if let (Some(ndk), Some(dir)) = (&file.ndk, path.parent()) {
            if ndk.is_relative() {
                file.ndk = Some(dir.join(ndk));
            }
        }
        info!("Loaded settings from {:?}", path);
        Ok(file)
    }

    /// Load an explicitly named file, or the default one in `project_dir` if present
    pub fn discover(project_dir: &Path, explicit: Option<&Path>) -> Result<Option<Self>> {
        if let Some(path) = explicit {
            if !path.is_file() {
                return Err(CoreError::SettingsNotFound(path.to_path_buf()));
            }
            return Self::load(path).map(Some);
        }

        let default_path = project_dir.join(SETTINGS_FILE_NAME);
        if default_path.is_file() {
            Self::load(&default_path).map(Some)
        } else {
            debug!("No settings file at {:?}", default_path);
            Ok(None)
        }
    }
}

/// Explicit command-line values; these always win
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub build_type: Option<BuildType>,
    pub api_level: Option<ApiLevel>,
    pub ndk: Option<PathBuf>,
    pub jobs: Option<u32>,
    pub build_dir_prefix: Option<String>,
    pub generator: Option<String>,
    pub clean: bool,
}

/// Fully resolved settings of one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub build_type: BuildType,
    pub api_level: ApiLevel,
    /// Explicit NDK path; `None` lets the locator search
    pub ndk_override: Option<PathBuf>,
    pub jobs: Option<u32>,
    pub build_dir_prefix: String,
    pub generator: String,
    pub stl: String,
    pub arch_variable: String,
    pub disabled_features: Vec<String>,
    pub extra_defines: Vec<(String, String)>,
    pub clean: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            build_type: BuildType::default(),
            api_level: ApiLevel::default(),
            ndk_override: None,
            jobs: None,
            build_dir_prefix: DEFAULT_BUILD_DIR_PREFIX.to_string(),
            generator: DEFAULT_GENERATOR.to_string(),
            stl: DEFAULT_STL.to_string(),
            arch_variable: DEFAULT_ARCH_VARIABLE.to_string(),
            disabled_features: DEFAULT_DISABLED_FEATURES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            extra_defines: Vec::new(),
            clean: false,
        }
    }
}

impl Settings {
    /// Layer defaults, settings file, environment and overrides
    pub fn resolve(
        file: Option<&SettingsFile>,
        env: &dyn Environment,
        overrides: &Overrides,
    ) -> Result<Self> {
        let mut settings = Settings::default();

        if let Some(file) = file {
            settings.apply_file(file)?;
        }

        // Variables shadowed by an explicit override are not parsed at all
        if overrides.build_type.is_none() {
            if let Some(value) = env.var(BUILD_TYPE_ENV) {
                settings.build_type = value.parse().map_err(|e: CoreError| e.for_key(BUILD_TYPE_ENV))?;
            }
        }
        if overrides.api_level.is_none() {
            if let Some(value) = env.var(API_LEVEL_ENV) {
                settings.api_level = value.parse().map_err(|e: CoreError| e.for_key(API_LEVEL_ENV))?;
            }
        }

        settings.apply_overrides(overrides)?;

        debug!(?settings, "Resolved build settings");
        Ok(settings)
    }

    fn apply_file(&mut self, file: &SettingsFile) -> Result<()> {
        if let Some(build_type) = file.build_type {
            self.build_type = build_type;
        }
        if let Some(level) = &file.api_level {
            self.api_level = level.resolve().map_err(|e| e.for_key("api_level"))?;
        }
        if let Some(ndk) = &file.ndk {
            self.ndk_override = Some(ndk.clone());
        }
        if let Some(jobs) = file.jobs {
            self.jobs = Some(validate_jobs(jobs, "jobs")?);
        }
        if let Some(prefix) = &file.build_dir_prefix {
            self.build_dir_prefix = validate_prefix(prefix, "build_dir_prefix")?;
        }
        if let Some(generator) = &file.generator {
            self.generator = generator.clone();
        }
        if let Some(stl) = &file.stl {
            self.stl = stl.clone();
        }
        if let Some(var) = &file.cmake.arch_variable {
            self.arch_variable = var.clone();
        }
        if let Some(disable) = &file.cmake.disable {
            self.disabled_features = disable.clone();
        }
        self.extra_defines = file
            .cmake
            .defines
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Ok(())
    }

    fn apply_overrides(&mut self, overrides: &Overrides) -> Result<()> {
        if let Some(build_type) = overrides.build_type {
            self.build_type = build_type;
        }
        if let Some(level) = overrides.api_level {
            self.api_level = level;
        }
        if let Some(ndk) = &overrides.ndk {
            self.ndk_override = Some(ndk.clone());
        }
        if let Some(jobs) = overrides.jobs {
            self.jobs = Some(validate_jobs(jobs, "--jobs")?);
        }
        if let Some(prefix) = &overrides.build_dir_prefix {
            self.build_dir_prefix = validate_prefix(prefix, "--prefix")?;
        }
        if let Some(generator) = &overrides.generator {
            self.generator = generator.clone();
        }
        self.clean = overrides.clean;
        Ok(())
    }
}

fn validate_jobs(jobs: u32, key: &str) -> Result<u32> {
    if jobs == 0 {
        return Err(CoreError::InvalidSetting {
            key: key.to_string(),
            message: "parallelism must be at least 1".to_string(),
        });
    }
    Ok(jobs)
}

// The prefix becomes part of a single directory name
fn validate_prefix(prefix: &str, key: &str) -> Result<String> {
    if prefix.is_empty() || prefix.contains(['/', '\\']) || prefix == "." || prefix == ".." {
        return Err(CoreError::InvalidSetting {
            key: key.to_string(),
            message: format!("'{}' is not a plain directory name", prefix),
        });
    }
    Ok(prefix.to_string())
}
