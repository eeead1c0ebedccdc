//! ndk-matrix - Android NDK build matrix for w1tn3ss
//!
//! Locates an Android NDK and cross-compiles a CMake project for one or
//! more Android ABIs, each in its own build directory.
//!
//! ## Architecture
//!
//! - `ndk-matrix-core`: layered build settings and the environment seam
//! - `ndk-matrix-android-toolchain`: ABI mapping and NDK detection
//! - `ndk-matrix-build-engine`: CMake invocations and the build driver

#![warn(clippy::all)]

pub mod commands;

// Re-export main components for library usage
pub use ndk_matrix_android_toolchain as toolchain;
pub use ndk_matrix_build_engine as build;
pub use ndk_matrix_core as config;
