//! `jext` CLI entrypoint.
//!
//! Packages the extension at the given path and, with `--push`, uploads the
//! release files to the extension's update server. On success the paths of
//! the two produced files are printed to stdout.

use clap::Parser;
use jext::cli::Cli;
use jext::error::Result;
use jext::publish;
use jext::release::{self, ReleaseOutput};
use std::io::Write;

fn main() {
    let cli = Cli::parse();
    let mut stderr = std::io::stderr();
    let mut stdout = std::io::stdout();
    let exit_code = report(run(&cli), &mut stdout, &mut stderr);
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

fn run(cli: &Cli) -> Result<ReleaseOutput> {
    // Validate the publish arguments before touching any file.
    let push = cli.push_target()?;

    let output = release::build_release(&cli.path)?;

    if let Some(target) = push {
        publish::push_release(&target.config, &target.remote_dir, &output)?;
    }

    Ok(output)
}

fn report(result: Result<ReleaseOutput>, stdout: &mut dyn Write, stderr: &mut dyn Write) -> i32 {
    match result {
        Ok(output) => {
            write_line(stdout, &output.package_path);
            write_line(stdout, &output.descriptor_path);
            0
        }
        Err(err) => {
            write_line(stderr, format!("error: {err}"));
            1
        }
    }
}

fn write_line(out: &mut dyn Write, message: impl std::fmt::Display) {
    if writeln!(out, "{message}").is_err() {
        // Best-effort reporting; ignore write failures.
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use jext::error::JextError;

    #[test]
    fn report_prints_both_paths_and_returns_zero() {
        let output = ReleaseOutput {
            package_path: Utf8PathBuf::from("/ext/mod_example/mod_example-1.0.0.zip"),
            descriptor_path: Utf8PathBuf::from("/ext/mod_example/updates/extension.xml"),
        };

        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let exit_code = report(Ok(output), &mut stdout, &mut stderr);

        assert_eq!(exit_code, 0);
        let printed = String::from_utf8(stdout).expect("stdout was not UTF-8");
        assert_eq!(
            printed,
            "/ext/mod_example/mod_example-1.0.0.zip\n/ext/mod_example/updates/extension.xml\n"
        );
        assert!(stderr.is_empty());
    }

    #[test]
    fn report_prints_error_and_returns_one() {
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let exit_code = report(
            Err(JextError::MissingPushArguments),
            &mut stdout,
            &mut stderr,
        );

        assert_eq!(exit_code, 1);
        assert!(stdout.is_empty());
        let message = String::from_utf8(stderr).expect("stderr was not UTF-8");
        assert!(message.starts_with("error: "));
        assert!(message.contains("--push"));
    }

    #[test]
    fn invalid_push_arguments_fail_before_any_file_is_touched() {
        let dir = tempfile::tempdir().expect("temp dir");
        let root =
            Utf8PathBuf::from_path_buf(dir.path().join("mod_example")).expect("utf-8 root");
        std::fs::create_dir_all(&root).expect("create extension dir");
        let stale = root.join("mod_example-0.1.0.zip");
        std::fs::write(&stale, b"stale").expect("plant stale package");

        let cli = Cli::parse_from(["jext", "--push", root.as_str()]);
        let err = run(&cli).expect_err("expected config error");

        assert!(matches!(err, JextError::MissingPushArguments));
        // No cleanup or build ran.
        assert!(stale.is_file());
    }
}
