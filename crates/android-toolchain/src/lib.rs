//! Android Toolchain
//!
//! Handles the Android side of a build:
//! - ABI names and their architecture tags
//! - Locating and validating the NDK
//! - Ordering side-by-side NDK versions

pub mod detector;
pub mod ndk;
pub mod version;

pub use detector::{Candidate, CandidateSource, HostOs, LocatorError, ToolchainLocator};
pub use ndk::{arch_for, Abi, AbiError, Arch, NdkInfo, TOOLCHAIN_MARKER};
pub use version::NdkVersion;
