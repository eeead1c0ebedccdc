//! ndk-matrix
//!
//! Command-line entry point: parses options, sets up logging and drives the
//! per-ABI builds.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser};
use tracing::{debug, error, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use ndk_matrix::commands::{print_summary, BuildCommand, Host};
use ndk_matrix::config::{ApiLevel, BuildType, Overrides};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Cross-compile w1tn3ss for Android through the NDK CMake toolchain
#[derive(Debug, Parser)]
#[command(name = "ndk-matrix", version, about)]
struct Cli {
    /// Build type: Release, Debug or RelWithDebInfo [default: Release, env: BUILD_TYPE]
    #[arg(short = 't', long = "type", value_name = "TYPE")]
    build_type: Option<BuildType>,

    /// Minimum Android API level [default: 24, env: ANDROID_PLATFORM]
    #[arg(short = 'p', long = "platform", value_name = "API-LEVEL")]
    api_level: Option<ApiLevel>,

    /// Android NDK root (overrides ANDROID_NDK_HOME and friends)
    #[arg(short = 'n', long = "ndk", value_name = "PATH")]
    ndk: Option<PathBuf>,

    /// Delete each build directory before building
    #[arg(short, long)]
    clean: bool,

    /// Parallel build jobs
    #[arg(short, long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
    jobs: Option<u32>,

    /// Build every supported platform
    #[arg(long)]
    all: bool,

    /// Project root containing CMakeLists.txt
    #[arg(short = 'C', long = "project", value_name = "DIR", default_value = ".")]
    project: PathBuf,

    /// Settings file [default: <project>/ndk-matrix.toml]
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Build directory prefix [default: build-android]
    #[arg(long, value_name = "NAME")]
    prefix: Option<String>,

    /// CMake generator [default: Ninja]
    #[arg(short = 'G', long, value_name = "NAME")]
    generator: Option<String>,

    /// More logging (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, conflicts_with = "quiet")]
    verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long)]
    quiet: bool,

    /// Platforms to build: arm64-v8a, armeabi-v7a, x86_64, x86 [default: arm64-v8a]
    #[arg(value_name = "PLATFORM")]
    platforms: Vec<String>,
}

impl Cli {
    fn into_command(self) -> BuildCommand {
        BuildCommand {
            project_dir: self.project,
            config_file: self.config,
            platforms: self.platforms,
            all: self.all,
            overrides: Overrides {
                build_type: self.build_type,
                api_level: self.api_level,
                ndk: self.ndk,
                jobs: self.jobs,
                build_dir_prefix: self.prefix,
                generator: self.generator,
                clean: self.clean,
            },
        }
    }

    fn log_level(&self) -> Level {
        if self.quiet {
            return Level::WARN;
        }
        match self.verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    }
}

/// Main entry point
#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.log_level());

    debug!("ndk-matrix v{} starting", VERSION);

    let command = cli.into_command();
    let host = Host::system();

    match command.execute(&host).await {
        Ok(outputs) => {
            print_summary(&outputs);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Initialize logging; RUST_LOG wins over the command-line level
fn init_logging(level: Level) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_ascii_lowercase()));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("failed to set tracing subscriber: {}", e);
    }
}
