//! Build Configuration
//!
//! The immutable per-run configuration shared by every build job.

use std::path::PathBuf;

use ndk_matrix_android_toolchain::{Abi, NdkInfo};
use ndk_matrix_core::{ApiLevel, BuildType, Settings};

/// Build configuration
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Project root directory (holds the top-level CMakeLists.txt)
    pub project_dir: PathBuf,

    /// Validated NDK installation
    pub ndk: NdkInfo,

    /// CMake build type
    pub build_type: BuildType,

    /// Minimum API level
    pub api_level: ApiLevel,

    /// Build directories are named `<prefix>-<abi>`
    pub build_dir_prefix: String,

    /// CMake generator
    pub generator: String,

    /// `ANDROID_STL` value
    pub stl: String,

    /// Variable that receives the architecture tag
    pub arch_variable: String,

    /// Options forced `OFF`
    pub disabled_features: Vec<String>,

    /// Extra `-D` definitions
    pub extra_defines: Vec<(String, String)>,

    /// Remove existing build directories first
    pub clean: bool,

    /// Parallel jobs
    pub jobs: Option<u32>,
}

impl BuildConfig {
    /// Combine resolved settings with the located NDK
    pub fn from_settings(project_dir: impl Into<PathBuf>, settings: &Settings, ndk: NdkInfo) -> Self {
        Self {
            project_dir: project_dir.into(),
            ndk,
            build_type: settings.build_type,
            api_level: settings.api_level,
            build_dir_prefix: settings.build_dir_prefix.clone(),
            generator: settings.generator.clone(),
            stl: settings.stl.clone(),
            arch_variable: settings.arch_variable.clone(),
            disabled_features: settings.disabled_features.clone(),
            extra_defines: settings.extra_defines.clone(),
            clean: settings.clean,
            jobs: settings.jobs,
        }
    }

    /// Name of the build directory for an ABI
    pub fn build_dir_name(&self, abi: Abi) -> String {
        format!("{}-{}", self.build_dir_prefix, abi.abi_name())
    }

    /// Build directory for an ABI
    pub fn build_dir(&self, abi: Abi) -> PathBuf {
        self.project_dir.join(self.build_dir_name(abi))
    }
}
