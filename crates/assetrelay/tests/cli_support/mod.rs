#![allow(dead_code)]

use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

pub fn assetrelay_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_assetrelay"))
}

/// Isolated relay home plus source and destination directories.
pub struct CliEnv {
    _temp: TempDir,
    pub home: PathBuf,
    pub source_dir: PathBuf,
    pub dest_dir: PathBuf,
}

impl CliEnv {
    pub fn new() -> Self {
        let temp = TempDir::new().expect("create temp dir");
        let home = temp.path().join("home");
        let source_dir = temp.path().join("source");
        let dest_dir = temp.path().join("dest");
        fs::create_dir_all(&source_dir).expect("create source dir");
        fs::create_dir_all(&dest_dir).expect("create dest dir");
        Self {
            _temp: temp,
            home,
            source_dir,
            dest_dir,
        }
    }

    pub fn config_path(&self) -> PathBuf {
        self.home.join("assetrelay.toml")
    }

    pub fn ledger_path(&self) -> PathBuf {
        self.home.join("ledger.json")
    }

    /// Write a usable configuration pointing at this env's directories.
    pub fn write_config(&self, extra: &str) {
        fs::create_dir_all(&self.home).expect("create home");
        let content = format!(
            "source_dir = {:?}\ndestination_dir = {:?}\npoll_interval_secs = 1\n{}",
            self.source_dir.display().to_string(),
            self.dest_dir.display().to_string(),
            extra
        );
        fs::write(self.config_path(), content).expect("write config");
    }

    pub fn write_source(&self, name: &str, content: &str) -> PathBuf {
        let path = self.source_dir.join(name);
        fs::write(&path, content).expect("write source file");
        path
    }

    pub fn run(&self, args: &[&str]) -> Output {
        run_cli(args, &[("ASSETRELAY_HOME", path_str(&self.home))])
    }

    pub fn run_json<T: DeserializeOwned>(&self, args: &[&str]) -> (Output, T) {
        let output = self.run(args);
        let value = parse_json_stdout(&output, args);
        let parsed = serde_json::from_value(value).expect("failed to deserialize JSON output");
        (output, parsed)
    }
}

fn path_str(path: &Path) -> &str {
    path.to_str().expect("temp paths are UTF-8")
}

pub fn run_cli(args: &[&str], envs: &[(&str, &str)]) -> Output {
    let mut cmd = Command::new(assetrelay_bin());
    cmd.args(args);
    for (key, value) in envs {
        cmd.env(key, value);
    }
    cmd.output().expect("failed to execute assetrelay CLI")
}

pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

pub fn assert_cli_success(output: &Output, args: &[&str]) {
    assert!(
        output.status.success(),
        "command failed: {}\nstdout:\n{}\nstderr:\n{}",
        args.join(" "),
        stdout(output),
        stderr(output)
    );
}

pub fn assert_cli_failure(output: &Output, args: &[&str]) {
    assert_eq!(
        output.status.code(),
        Some(1),
        "expected exit code 1: {}\nstdout:\n{}\nstderr:\n{}",
        args.join(" "),
        stdout(output),
        stderr(output)
    );
}

fn parse_json_stdout(output: &Output, args: &[&str]) -> serde_json::Value {
    let stdout = stdout(output);
    let json_start = stdout.find(|c| c == '{' || c == '[').unwrap_or_else(|| {
        panic!(
            "no JSON payload found in output of {}\nstdout:\n{}\nstderr:\n{}",
            args.join(" "),
            stdout,
            stderr(output)
        )
    });
    let mut deserializer = serde_json::Deserializer::from_str(&stdout[json_start..]);
    serde_json::Value::deserialize(&mut deserializer).unwrap_or_else(|err| {
        panic!(
            "failed to parse JSON output: {}\nstdout:\n{}\nstderr:\n{}",
            err,
            stdout,
            stderr(output)
        )
    })
}
