//! Test harness for cleave integration tests

#![allow(dead_code)]

use std::path::Path;
use std::process::Command;

pub use cleave::test_utils::TestWorkspace;

/// Output of one binary invocation.
pub struct RunOutput {
    pub stdout: String,
    pub stderr: String,
    pub code: Option<i32>,
}

impl RunOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

pub fn run_cleave(dir: &Path, args: &[&str]) -> RunOutput {
    let binary = env!("CARGO_BIN_EXE_cleave");
    let output = Command::new(binary)
        .args(args)
        .current_dir(dir)
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to run cleave");

    RunOutput {
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        code: output.status.code(),
    }
}

/// Parse the `--json` summary printed on stdout.
pub fn json_summary(output: &RunOutput) -> serde_json::Value {
    serde_json::from_str(&output.stdout)
        .unwrap_or_else(|e| panic!("stdout is not JSON ({}): {}", e, output.stdout))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_harness_creates_temp_dir() {
        let workspace = TestWorkspace::new();
        assert!(workspace.path().exists());
    }

    #[test]
    fn test_harness_add_file() {
        let workspace = TestWorkspace::new();
        let file_path = workspace.add_file("src/Foo.cpp", "int Foo::bar() { return 1; }");
        assert!(file_path.exists());
        assert_eq!(workspace.read("src/Foo.cpp"), "int Foo::bar() { return 1; }");
    }
}
