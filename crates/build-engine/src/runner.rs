//! Build Runner
//!
//! Drives each ABI through prepare, configure and build, one after another.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use ndk_matrix_android_toolchain::{Abi, Arch};

use crate::process::{ExternalProcess, ProcessInvocation, ProcessOutput};
use crate::{cmake, BuildConfig, BuildError, Step};

/// Lines of stderr kept in a failure report
const STDERR_TAIL_LINES: usize = 20;

/// Lifecycle of one build job
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Pending,
    DirPrepared,
    Configured,
    Built,
    Failed,
}

/// Result of a successful job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOutput {
    pub abi: Abi,
    pub arch: Arch,
    pub build_dir: PathBuf,
    pub duration: Duration,
}

/// Build progress
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildProgress {
    State { abi: Abi, state: JobState },
    Completed { output: BuildOutput },
    Failed { abi: Abi, error: String },
}

/// One ABI's trip through the driver
#[derive(Debug)]
struct BuildJob {
    abi: Abi,
    build_dir: PathBuf,
    state: JobState,
}

impl BuildJob {
    fn new(abi: Abi, build_dir: PathBuf) -> Self {
        Self {
            abi,
            build_dir,
            state: JobState::Pending,
        }
    }
}

/// Build driver that runs jobs against a configuration
pub struct BuildDriver<'a, P: ExternalProcess> {
    config: &'a BuildConfig,
    process: &'a P,
    progress: Option<mpsc::UnboundedSender<BuildProgress>>,
}

impl<'a, P: ExternalProcess> BuildDriver<'a, P> {
    pub fn new(config: &'a BuildConfig, process: &'a P) -> Self {
        Self {
            config,
            process,
            progress: None,
        }
    }

    /// Report state changes on a channel
    pub fn with_progress(mut self, tx: mpsc::UnboundedSender<BuildProgress>) -> Self {
        self.progress = Some(tx);
        self
    }

    /// Build every ABI in order, stopping at the first failure
    pub async fn build_all(&self, abis: &[Abi]) -> Result<Vec<BuildOutput>, BuildError> {
        let mut outputs = Vec::with_capacity(abis.len());
        for (index, abi) in abis.iter().enumerate() {
            info!("[{}/{}] Building {}", index + 1, abis.len(), abi);
            outputs.push(self.build(*abi).await?);
        }
        Ok(outputs)
    }

    /// Build a single ABI
    pub async fn build(&self, abi: Abi) -> Result<BuildOutput, BuildError> {
        let mut job = BuildJob::new(abi, self.config.build_dir(abi));
        self.report(BuildProgress::State { abi, state: job.state });

        match self.drive(&mut job).await {
            Ok(output) => {
                self.report(BuildProgress::Completed { output: output.clone() });
                Ok(output)
            }
            Err(e) => {
                error!("{} build failed in state {:?}: {}", abi, job.state, e);
                self.advance(&mut job, JobState::Failed);
                self.report(BuildProgress::Failed { abi, error: e.to_string() });
                Err(e)
            }
        }
    }

    async fn drive(&self, job: &mut BuildJob) -> Result<BuildOutput, BuildError> {
        let start = Instant::now();
        let arch = job.abi.arch();
        debug!("{} maps to arch {}", job.abi, arch);

        self.prepare_dir(job).await?;
        self.advance(job, JobState::DirPrepared);

        let configure = cmake::configure(self.config, job.abi, &job.build_dir);
        self.run_step(job.abi, Step::Configure, configure).await?;
        self.advance(job, JobState::Configured);

        let build = cmake::build(self.config, &job.build_dir);
        self.run_step(job.abi, Step::Build, build).await?;
        self.advance(job, JobState::Built);

        let output = BuildOutput {
            abi: job.abi,
            arch,
            build_dir: job.build_dir.clone(),
            duration: start.elapsed(),
        };
        info!(
            "{} built in {:.2}s: {:?}",
            output.abi,
            output.duration.as_secs_f64(),
            output.build_dir
        );
        Ok(output)
    }

    async fn prepare_dir(&self, job: &BuildJob) -> Result<(), BuildError> {
        let dir = &job.build_dir;
        let io_err = |source: std::io::Error| BuildError::Directory {
            path: dir.clone(),
            source,
        };

        if self.config.clean && tokio::fs::try_exists(dir).await.map_err(io_err)? {
            warn!("Removing {:?} (--clean)", dir);
            tokio::fs::remove_dir_all(dir).await.map_err(io_err)?;
        }

        tokio::fs::create_dir_all(dir).await.map_err(io_err)?;
        Ok(())
    }

    async fn run_step(
        &self,
        abi: Abi,
        step: Step,
        invocation: ProcessInvocation,
    ) -> Result<ProcessOutput, BuildError> {
        info!("{} {}: {}", abi, step, invocation);

        let output = self
            .process
            .run(&invocation)
            .await
            .map_err(|source| BuildError::Spawn {
                program: invocation.program.clone(),
                source,
            })?;

        if !output.success() {
            return Err(BuildError::ToolFailed {
                abi,
                step,
                program: invocation.program,
                status: describe_status(output.code),
                stderr_tail: output.stderr_tail(STDERR_TAIL_LINES),
            });
        }

        Ok(output)
    }

    fn advance(&self, job: &mut BuildJob, next: JobState) {
        debug!("{}: {:?} -> {:?}", job.abi, job.state, next);
        job.state = next;
        self.report(BuildProgress::State { abi: job.abi, state: next });
    }

    fn report(&self, progress: BuildProgress) {
        if let Some(tx) = &self.progress {
            let _ = tx.send(progress);
        }
    }
}

fn describe_status(code: Option<i32>) -> String {
    match code {
        Some(code) => format!("exited with status {}", code),
        None => "was terminated by a signal".to_string(),
    }
}
