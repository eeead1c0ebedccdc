//! Android Build Engine
//!
//! Cross-compiles a CMake project for Android ABIs, one isolated build
//! directory per ABI.

pub mod cmake;
pub mod config;
pub mod process;
pub mod runner;

pub use config::BuildConfig;
pub use process::{ExternalProcess, ProcessInvocation, ProcessOutput, SystemProcess};
pub use runner::{BuildDriver, BuildOutput, BuildProgress, JobState};

use std::fmt;
use std::path::PathBuf;

use ndk_matrix_android_toolchain::Abi;

/// External steps of a build job
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Configure,
    Build,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Configure => f.write_str("configure"),
            Step::Build => f.write_str("build"),
        }
    }
}

/// Build errors
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("failed to prepare build directory {path:?}: {source}")]
    Directory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{step} step for {abi} failed: {program} {status}{}", format_tail(.stderr_tail))]
    ToolFailed {
        abi: Abi,
        step: Step,
        program: String,
        status: String,
        stderr_tail: String,
    },
}

fn format_tail(tail: &str) -> String {
    if tail.is_empty() {
        String::new()
    } else {
        format!("\n{}", tail)
    }
}
