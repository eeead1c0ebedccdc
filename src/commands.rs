//! CLI commands for ndk-matrix
//!
//! Turns parsed command-line options into a sequence of per-ABI builds.

use std::path::PathBuf;

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use ndk_matrix_android_toolchain::{Abi, AbiError, ToolchainLocator};
use ndk_matrix_build_engine::{
    BuildConfig, BuildDriver, BuildOutput, BuildProgress, ExternalProcess, JobState, SystemProcess,
};
use ndk_matrix_core::{Environment, Overrides, ProcessEnvironment, Settings, SettingsFile};

/// Tools that must be on PATH before anything is built
pub const REQUIRED_TOOLS: &[&str] = &["cmake"];

/// Front-end errors
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("required tool '{0}' not found on PATH; install it and try again")]
    MissingPrerequisite(String),
}

/// What the command runs against: environment, processes and tool lookup
pub struct Host<'a, P: ExternalProcess> {
    pub env: &'a dyn Environment,
    pub process: &'a P,
    pub find_tool: fn(&str) -> bool,
    /// Replaces the host's conventional NDK locations when set
    pub ndk_search_paths: Option<Vec<PathBuf>>,
}

impl Host<'static, SystemProcess> {
    /// The real process environment, PATH and subprocesses
    pub fn system() -> Self {
        Self {
            env: &ProcessEnvironment,
            process: &SystemProcess,
            find_tool: |tool| which::which(tool).is_ok(),
            ndk_search_paths: None,
        }
    }
}

/// Build command options
#[derive(Debug, Clone, Default)]
pub struct BuildCommand {
    pub project_dir: PathBuf,
    pub config_file: Option<PathBuf>,
    pub platforms: Vec<String>,
    pub all: bool,
    pub overrides: Overrides,
}

impl BuildCommand {
    /// Execute the build command
    pub async fn execute<P: ExternalProcess>(&self, host: &Host<'_, P>) -> Result<Vec<BuildOutput>> {
        let abis = resolve_platforms(self.all, &self.platforms)?;

        let project_dir = self
            .project_dir
            .canonicalize()
            .with_context(|| format!("project directory {:?} not found", self.project_dir))?;

        let file = SettingsFile::discover(&project_dir, self.config_file.as_deref())?;
        let settings = Settings::resolve(file.as_ref(), host.env, &self.overrides)?;

        preflight(REQUIRED_TOOLS, host.find_tool)?;

        let mut locator = ToolchainLocator::new(host.env).with_override(settings.ndk_override.clone());
        if let Some(paths) = &host.ndk_search_paths {
            locator = locator.with_conventional_paths(paths.clone());
        }
        let ndk = locator.locate()?;

        let config = BuildConfig::from_settings(project_dir, &settings, ndk);
        info!(
            "Building {} for {} ({}, API {})",
            config.project_dir.display(),
            abis.iter().map(Abi::abi_name).collect::<Vec<_>>().join(", "),
            config.build_type,
            config.api_level
        );

        let (tx, mut rx) = mpsc::unbounded_channel();
        let driver = BuildDriver::new(&config, host.process).with_progress(tx);

        // The sender lives in the driver, so the reporter ends once the builds do
        let builds = async move { driver.build_all(&abis).await };
        let reporter = async {
            while let Some(progress) = rx.recv().await {
                report_progress(&progress);
            }
        };
        let (outputs, ()) = tokio::join!(builds, reporter);
        Ok(outputs?)
    }
}

/// Decide which ABIs to build.
///
/// `--all` wins over listed platforms; with nothing listed the default ABI is built.
pub fn resolve_platforms(all: bool, listed: &[String]) -> Result<Vec<Abi>, AbiError> {
    if all {
        if !listed.is_empty() {
            warn!("--all given, ignoring listed platforms: {}", listed.join(" "));
        }
        return Ok(Abi::all().to_vec());
    }

    if listed.is_empty() {
        return Ok(vec![Abi::default()]);
    }

    let mut abis: Vec<Abi> = Vec::with_capacity(listed.len());
    for name in listed {
        let abi: Abi = name.parse()?;
        if abis.contains(&abi) {
            warn!("{} listed more than once, building it once", abi);
        } else {
            abis.push(abi);
        }
    }
    Ok(abis)
}

/// Check every required tool resolves
pub fn preflight(tools: &[&str], find_tool: fn(&str) -> bool) -> Result<(), CommandError> {
    for tool in tools {
        if !find_tool(tool) {
            return Err(CommandError::MissingPrerequisite(tool.to_string()));
        }
    }
    Ok(())
}

/// Status line for a progress event; plain state changes only go to debug
pub fn describe_progress(progress: &BuildProgress) -> Option<String> {
    match progress {
        BuildProgress::State { abi, state } => {
            let label = match state {
                JobState::Pending => "queued",
                JobState::DirPrepared => "build directory ready",
                JobState::Configured => "configured",
                JobState::Built => "built",
                JobState::Failed => "failed",
            };
            debug!("{}: {}", abi, label);
            None
        }
        BuildProgress::Completed { output } => Some(format!(
            "✓ {} ({}) done in {:.1}s",
            output.abi,
            output.arch,
            output.duration.as_secs_f64()
        )),
        BuildProgress::Failed { abi, .. } => Some(format!("✗ {} failed, remaining platforms skipped", abi)),
    }
}

fn report_progress(progress: &BuildProgress) {
    if let Some(line) = describe_progress(progress) {
        info!("{}", line);
    }
}

/// Print one line per built ABI
pub fn print_summary(outputs: &[BuildOutput]) {
    println!("Build summary:");
    for output in outputs {
        println!(
            "  ✓ {:<12} {:<6} {:>7.1}s  {}",
            output.abi.abi_name(),
            output.arch.as_str(),
            output.duration.as_secs_f64(),
            output.build_dir.display()
        );
    }
    println!("All {} platform(s) built successfully", outputs.len());
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_default_platform() {
        assert_eq!(resolve_platforms(false, &[]).unwrap(), vec![Abi::Arm64V8a]);
    }

    #[test]
    fn test_listed_platforms_keep_order() {
        let abis = resolve_platforms(false, &names(&["x86", "arm64-v8a", "x86"])).unwrap();
        assert_eq!(abis, vec![Abi::X86, Abi::Arm64V8a]);
    }

    #[test]
    fn test_all_overrides_listed() {
        let abis = resolve_platforms(true, &names(&["x86", "bogus"])).unwrap();
        assert_eq!(abis, Abi::all().to_vec());
    }

    #[test]
    fn test_unsupported_platform_rejects_whole_list() {
        let err = resolve_platforms(false, &names(&["arm64-v8a", "mips"])).unwrap_err();
        assert_eq!(err, AbiError::Unsupported("mips".into()));
    }

    #[test]
    fn test_describe_progress() {
        let output = BuildOutput {
            abi: Abi::ArmeabiV7a,
            arch: Abi::ArmeabiV7a.arch(),
            build_dir: PathBuf::from("/src/build-android-armeabi-v7a"),
            duration: std::time::Duration::from_millis(1500),
        };
        assert_eq!(
            describe_progress(&BuildProgress::Completed { output }).as_deref(),
            Some("✓ armeabi-v7a (arm) done in 1.5s")
        );

        let failed = BuildProgress::Failed {
            abi: Abi::X86,
            error: "cmake exited with status 1".into(),
        };
        assert_eq!(
            describe_progress(&failed).as_deref(),
            Some("✗ x86 failed, remaining platforms skipped")
        );

        let state = BuildProgress::State {
            abi: Abi::X86,
            state: JobState::Configured,
        };
        assert_eq!(describe_progress(&state), None);
    }

    #[test]
    fn test_preflight() {
        assert!(preflight(&["cmake"], |_| true).is_ok());
        let err = preflight(&["cmake"], |tool| tool != "cmake").unwrap_err();
        assert_eq!(err.to_string(), "required tool 'cmake' not found on PATH; install it and try again");
    }
}
