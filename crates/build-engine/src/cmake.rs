//! CMake invocations for an NDK cross build.

use std::path::Path;

use ndk_matrix_android_toolchain::Abi;

use crate::config::BuildConfig;
use crate::process::ProcessInvocation;

/// Program used for both the configure and the build step
pub const CMAKE_PROGRAM: &str = "cmake";

fn define(name: &str, value: impl AsRef<str>) -> String {
    format!("-D{}={}", name, value.as_ref())
}

/// Configure step, run inside the ABI's build directory
pub fn configure(config: &BuildConfig, abi: Abi, build_dir: &Path) -> ProcessInvocation {
    let ndk = config.ndk.path.display().to_string();

    let mut invocation = ProcessInvocation::new(CMAKE_PROGRAM, build_dir)
        .arg("-S")
        .arg(config.project_dir.display().to_string())
        .arg("-B")
        .arg(build_dir.display().to_string())
        .arg("-G")
        .arg(config.generator.as_str())
        .arg(define("CMAKE_BUILD_TYPE", config.build_type.as_str()))
        .arg(define("CMAKE_TOOLCHAIN_FILE", config.ndk.toolchain_file().display().to_string()))
        .arg(define("ANDROID_NDK", &ndk))
        .arg(define("ANDROID_ABI", abi.abi_name()))
        .arg(define("ANDROID_PLATFORM", config.api_level.platform_name()))
        .arg(define("ANDROID_STL", &config.stl))
        .arg(define(&config.arch_variable, abi.arch().as_str()));

    for feature in &config.disabled_features {
        invocation = invocation.arg(define(feature, "OFF"));
    }
    for (name, value) in &config.extra_defines {
        invocation = invocation.arg(define(name, value));
    }

    invocation
}

/// Build step against an already configured directory
pub fn build(config: &BuildConfig, build_dir: &Path) -> ProcessInvocation {
    let mut invocation = ProcessInvocation::new(CMAKE_PROGRAM, build_dir)
        .arg("--build")
        .arg(build_dir.display().to_string());

    if let Some(jobs) = config.jobs {
        invocation = invocation.arg("--parallel").arg(jobs.to_string());
    }

    invocation
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndk_matrix_android_toolchain::NdkInfo;
    use ndk_matrix_core::{ApiLevel, BuildType, Settings};
    use std::path::PathBuf;

    fn config() -> BuildConfig {
        let ndk = NdkInfo {
            path: PathBuf::from("/opt/ndk/26.1"),
            revision: None,
        };
        BuildConfig::from_settings("/src/w1tn3ss", &Settings::default(), ndk)
    }

    #[test]
    fn test_configure_arguments() {
        let mut config = config();
        config.build_type = BuildType::Debug;
        config.api_level = ApiLevel::new(28).unwrap();
        let dir = config.build_dir(Abi::ArmeabiV7a);

        let invocation = configure(&config, Abi::ArmeabiV7a, &dir);
        assert_eq!(invocation.program, "cmake");
        assert_eq!(invocation.cwd, dir);
        assert_eq!(
            invocation.args,
            vec![
                "-S",
                "/src/w1tn3ss",
                "-B",
                "/src/w1tn3ss/build-android-armeabi-v7a",
                "-G",
                "Ninja",
                "-DCMAKE_BUILD_TYPE=Debug",
                "-DCMAKE_TOOLCHAIN_FILE=/opt/ndk/26.1/build/cmake/android.toolchain.cmake",
                "-DANDROID_NDK=/opt/ndk/26.1",
                "-DANDROID_ABI=armeabi-v7a",
                "-DANDROID_PLATFORM=android-28",
                "-DANDROID_STL=c++_static",
                "-DWITNESS_ARCH=arm",
                "-DWITNESS_SCRIPT=OFF",
                "-DWITNESS_BUILD_TESTS=OFF",
            ]
        );
    }

    #[test]
    fn test_extra_defines_follow_features() {
        let mut config = config();
        config.disabled_features = vec!["WITNESS_SCRIPT".into()];
        config.extra_defines = vec![("WITNESS_QJS".into(), "OFF".into())];
        let dir = config.build_dir(Abi::X86);

        let args = configure(&config, Abi::X86, &dir).args;
        let tail: Vec<_> = args.iter().rev().take(3).rev().cloned().collect();
        assert_eq!(tail, vec!["-DWITNESS_ARCH=x86", "-DWITNESS_SCRIPT=OFF", "-DWITNESS_QJS=OFF"]);
    }

    #[test]
    fn test_build_arguments() {
        let mut config = config();
        let dir = config.build_dir(Abi::X86_64);
        assert_eq!(build(&config, &dir).args, vec!["--build", "/src/w1tn3ss/build-android-x86_64"]);

        config.jobs = Some(8);
        assert_eq!(
            build(&config, &dir).args,
            vec!["--build", "/src/w1tn3ss/build-android-x86_64", "--parallel", "8"]
        );
    }
}
