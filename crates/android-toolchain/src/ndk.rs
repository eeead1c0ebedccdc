//! NDK ABIs and installations
//!
//! Maps Android ABI names onto the architecture tags the w1tn3ss CMake
//! project expects, and reads metadata from an NDK root.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

/// Relative path of the file that marks a directory as an NDK root
pub const TOOLCHAIN_MARKER: &str = "build/cmake/android.toolchain.cmake";

/// ABI errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AbiError {
    #[error("unsupported platform '{0}' (expected one of: arm64-v8a, armeabi-v7a, x86_64, x86)")]
    Unsupported(String),
}

/// Target ABI
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Abi {
    #[default]
    Arm64V8a,
    ArmeabiV7a,
    X86_64,
    X86,
}

impl Abi {
    /// Get the ABI name as passed to `ANDROID_ABI`
    pub fn abi_name(&self) -> &'static str {
        match self {
            Abi::Arm64V8a => "arm64-v8a",
            Abi::ArmeabiV7a => "armeabi-v7a",
            Abi::X86_64 => "x86_64",
            Abi::X86 => "x86",
        }
    }

    /// Architecture tag understood by the native project
    pub fn arch(&self) -> Arch {
        match self {
            Abi::Arm64V8a => Arch::Arm64,
            Abi::ArmeabiV7a => Arch::Arm,
            Abi::X86_64 => Arch::X64,
            Abi::X86 => Arch::X86,
        }
    }

    /// All supported ABIs, in build order
    pub fn all() -> &'static [Abi] {
        &[Abi::Arm64V8a, Abi::ArmeabiV7a, Abi::X86_64, Abi::X86]
    }
}

impl fmt::Display for Abi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.abi_name())
    }
}

impl FromStr for Abi {
    type Err = AbiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Abi::all()
            .iter()
            .copied()
            .find(|abi| abi.abi_name() == s)
            .ok_or_else(|| AbiError::Unsupported(s.to_string()))
    }
}

/// Architecture tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arch {
    Arm64,
    Arm,
    X64,
    X86,
}

impl Arch {
    pub fn as_str(&self) -> &'static str {
        match self {
            Arch::Arm64 => "arm64",
            Arch::Arm => "arm",
            Arch::X64 => "x64",
            Arch::X86 => "x86",
        }
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Map a platform identifier straight to its architecture tag
pub fn arch_for(platform: &str) -> Result<Arch, AbiError> {
    platform.parse::<Abi>().map(|abi| abi.arch())
}

/// A validated NDK installation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NdkInfo {
    pub path: PathBuf,
    /// `Pkg.Revision` from `source.properties`, when readable
    pub revision: Option<String>,
}

impl NdkInfo {
    /// Describe an NDK root that already passed marker validation
    pub fn read(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            revision: read_revision(path),
        }
    }

    /// Absolute path of the CMake toolchain file
    pub fn toolchain_file(&self) -> PathBuf {
        self.path.join(TOOLCHAIN_MARKER)
    }
}

fn read_revision(path: &Path) -> Option<String> {
    let source_props = path.join("source.properties");
    let content = match std::fs::read_to_string(&source_props) {
        Ok(content) => content,
        Err(e) => {
            debug!("No readable source.properties in {:?}: {}", path, e);
            return None;
        }
    };

    content.lines().find_map(|line| {
        let (key, value) = line.split_once('=')?;
        (key.trim() == "Pkg.Revision").then(|| value.trim().to_string())
    })
}
