use anyhow::{Context, bail};
use std::fs;
use std::path::Path;
use std::process::{Command, ExitStatus};
use tracing::debug;

use crate::error::GrunError;

pub const GO_ENV: &str = "GRUN_GO";
pub const PROGRAM_FILE: &str = "tmp.go";

/// Captured result of running the generated program. Both streams are kept
/// as raw bytes so they can be relayed unchanged.
#[derive(Debug)]
pub struct RunOutput {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub status: ExitStatus,
}

impl RunOutput {
    pub fn success(&self) -> bool {
        self.status.success()
    }

    /// The child's exit code; 1 when it was killed by a signal.
    pub fn exit_code(&self) -> i32 {
        self.status.code().unwrap_or(1)
    }
}

/// The `go` command (or whatever binary stands in for it).
#[derive(Clone, Debug)]
pub struct Toolchain {
    go: String,
}

impl Default for Toolchain {
    fn default() -> Self {
        Self::new("go")
    }
}

impl Toolchain {
    pub fn new(go: impl Into<String>) -> Self {
        Self { go: go.into() }
    }

    /// `go list -e all`: every package resolvable from the current directory.
    pub fn list_packages(&self) -> anyhow::Result<String> {
        let out = Command::new(&self.go)
            .args(["list", "-e", "all"])
            .output()
            .with_context(|| format!("failed to execute {}", self.go))?;
        if !out.status.success() {
            bail!(
                "{} list failed ({}): {}",
                self.go,
                out.status,
                String::from_utf8_lossy(&out.stderr).trim()
            );
        }
        Ok(String::from_utf8_lossy(&out.stdout).into_owned())
    }

    /// Stage `program` (and an optional extra source file) in a fresh temp
    /// directory and `go run` it with `passthrough` after a `--` separator.
    /// The directory is removed when this returns, whatever the outcome.
    pub fn execute(
        &self,
        program: &str,
        aux: Option<&Path>,
        passthrough: &[String],
    ) -> Result<RunOutput, GrunError> {
        let staging = tempfile::Builder::new()
            .prefix("grun")
            .tempdir()
            .context("create staging directory")
            .map_err(GrunError::Render)?;
        let program_path = staging.path().join(PROGRAM_FILE);
        fs::write(&program_path, program)
            .with_context(|| format!("write {}", program_path.display()))
            .map_err(GrunError::Render)?;

        let mut cmd = Command::new(&self.go);
        cmd.arg("run").arg(&program_path);
        if let Some(aux) = aux {
            let name = aux
                .file_name()
                .with_context(|| format!("{} is not a file", aux.display()))
                .map_err(GrunError::Render)?;
            let dest = staging.path().join(name);
            fs::copy(aux, &dest)
                .with_context(|| format!("copy {} to {}", aux.display(), dest.display()))
                .map_err(GrunError::Render)?;
            cmd.arg(dest);
        }
        cmd.arg("--").args(passthrough);
        debug!(?cmd, "running generated program");

        let out = cmd.output().map_err(|source| GrunError::Spawn {
            program: self.go.clone(),
            source,
        })?;
        Ok(RunOutput {
            stdout: out.stdout,
            stderr: out.stderr,
            status: out.status,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{PROGRAM_FILE, Toolchain};
    use crate::error::GrunError;
    use crate::pkg::catalog::ModuleCatalog;
    use crate::synth::shortcuts::AliasTable;
    use crate::synth::{OutputMode, synthesize_program};
    use std::path::Path;

    #[cfg(unix)]
    #[test]
    fn execute_passes_program_aux_file_and_separator() {
        let dir = tempfile::tempdir().expect("aux dir");
        let aux = dir.path().join("helpers.go");
        std::fs::write(&aux, "package main\n").expect("write aux");

        let out = Toolchain::new("echo")
            .execute("package main\n", Some(&aux), &["a".to_string(), "b c".to_string()])
            .expect("execute");
        assert!(out.success());
        let stdout = String::from_utf8(out.stdout).expect("echo output is utf-8");
        let words: Vec<&str> = stdout.split_whitespace().collect();
        assert_eq!(words[0], "run");
        assert!(words[1].ends_with(PROGRAM_FILE));
        assert!(words[2].ends_with("helpers.go"));
        assert_eq!(&words[3..], &["--", "a", "b", "c"]);

        let staged = Path::new(words[1]).parent().expect("staging dir");
        assert!(!staged.exists(), "staging directory must be removed");
    }

    #[cfg(unix)]
    #[test]
    fn non_zero_exit_is_surfaced() {
        let out = Toolchain::new("false")
            .execute("package main\n", None, &[])
            .expect("spawned");
        assert!(!out.success());
        assert_eq!(out.exit_code(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn child_output_bytes_and_exit_code_are_kept_verbatim() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().expect("script dir");
        let script = dir.path().join("fake-go");
        std::fs::write(
            &script,
            "#!/bin/sh\nprintf '\\377\\376'\nprintf '\\377' >&2\nexit 3\n",
        )
        .expect("write script");
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755))
            .expect("chmod script");

        let out = Toolchain::new(script.display().to_string())
            .execute("package main\n", None, &[])
            .expect("spawned");
        assert_eq!(out.stdout, vec![0xff, 0xfe]);
        assert_eq!(out.stderr, vec![0xff]);
        assert!(!out.success());
        assert_eq!(out.exit_code(), 3);
    }

    #[test]
    fn missing_binary_is_a_spawn_error() {
        let err = Toolchain::new("grun-no-such-binary")
            .execute("package main\n", None, &[])
            .expect_err("missing toolchain");
        assert!(matches!(err, GrunError::Spawn { .. }));
    }

    #[test]
    fn missing_aux_file_is_a_render_error() {
        let err = Toolchain::new("go")
            .execute("package main\n", Some(Path::new("/definitely/not/here.go")), &[])
            .expect_err("missing aux");
        assert!(matches!(err, GrunError::Render(_)));
    }

    fn run_go(expr: &str, output: OutputMode) -> String {
        let program = synthesize_program(
            expr,
            output,
            &AliasTable::default(),
            &ModuleCatalog::default(),
        );
        let out = Toolchain::default()
            .execute(&program, None, &[])
            .expect("go run");
        assert!(out.success(), "go run failed: {}", String::from_utf8_lossy(&out.stderr));
        String::from_utf8_lossy(&out.stdout).trim().to_string()
    }

    #[test]
    #[ignore = "requires a Go toolchain on PATH"]
    fn go_split_with_shortcut() {
        assert_eq!(
            run_go(r#"S.Split(S.TrimSpace(" hello dolly "), " ")"#, OutputMode::Plain),
            "[hello dolly]"
        );
    }

    #[test]
    #[ignore = "requires a Go toolchain on PATH"]
    fn go_split_as_flat_json() {
        assert_eq!(
            run_go(r#"strings.Split("hello dolly", " ")"#, OutputMode::Flat),
            r#"["hello","dolly"]"#
        );
    }

    #[test]
    #[ignore = "requires a Go toolchain on PATH"]
    fn go_regex_shortcut() {
        assert_eq!(
            run_go(r#"R("^[a-z]\\d+").MatchString("z234 hey")"#, OutputMode::Plain),
            "true"
        );
    }

    #[test]
    #[ignore = "requires a Go toolchain on PATH"]
    fn go_statement_then_expression() {
        assert_eq!(
            run_go(r#"rx := R("^[a-z]\\d+"); rx.MatchString("k243 ")"#, OutputMode::Plain),
            "true"
        );
        assert_eq!(
            run_go(
                r#"m := R("^[a-z]\\d+").MatchString;  m("k243 "), m(" v50")"#,
                OutputMode::Plain
            ),
            "true false"
        );
    }

    #[test]
    #[ignore = "requires a Go toolchain on PATH"]
    fn go_json_reports_unmarshalable_value_and_continues() {
        let out = run_go(r#"1, M.Inf(1), "ok""#, OutputMode::Flat);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "1");
        assert!(lines[1].starts_with("cannot convert +Inf to JSON:"));
        assert_eq!(lines[2], r#""ok""#);
    }
}
