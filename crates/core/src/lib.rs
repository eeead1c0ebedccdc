//! ndk-matrix Core - settings and shared types
//!
//! This crate owns everything that is decided once per run before any
//! toolchain probing or building happens: the layered build settings and
//! the environment seam the other crates read variables through.

pub mod config;
pub mod env;
pub mod error;

pub use config::{ApiLevel, BuildType, Overrides, Settings, SettingsFile};
pub use env::{Environment, MapEnvironment, ProcessEnvironment};
pub use error::{CoreError, Result};
