//! External tool execution primitives.

use serde::Serialize;
use std::path::Path;
use std::process::Command;

/// Exit status reported when a program cannot be spawned, matching the
/// shell's "command not found".
pub const SPAWN_FAILED_EXIT_CODE: i32 = 127;

/// Captured result of one external program run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandOutput {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub stdout: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub stderr: String,
    pub success: bool,
    pub exit_code: i32,
}

/// Run `program` with `args` directly (no shell) and wait for it to exit.
///
/// Never fails: a spawn error is folded into a failed output with
/// [`SPAWN_FAILED_EXIT_CODE`] and the error text on stderr.
pub fn execute(program: &str, args: &[String], current_dir: Option<&Path>) -> CommandOutput {
    let mut cmd = Command::new(program);
    cmd.args(args);

    if let Some(dir) = current_dir {
        cmd.current_dir(dir);
    }

    match cmd.output() {
        Ok(out) => CommandOutput {
            stdout: String::from_utf8_lossy(&out.stdout).to_string(),
            stderr: String::from_utf8_lossy(&out.stderr).to_string(),
            success: out.status.success(),
            // Killed by a signal: no code, still a failure
            exit_code: out.status.code().unwrap_or(1),
        },
        Err(e) => CommandOutput {
            stdout: String::new(),
            stderr: format!("Failed to run {}: {}", program, e),
            success: false,
            exit_code: SPAWN_FAILED_EXIT_CODE,
        },
    }
}

/// Human-readable command line for reports. Arguments containing shell
/// metacharacters are single-quoted.
pub fn display_command(program: &str, args: &[String]) -> String {
    std::iter::once(program)
        .chain(args.iter().map(String::as_str))
        .map(quote_for_display)
        .collect::<Vec<_>>()
        .join(" ")
}

fn quote_for_display(arg: &str) -> String {
    const SHELL_META: &[char] = &[
        ' ', '\t', '\n', '\'', '"', '\\', '$', '`', '!', '*', '?', '(', ')', '<', '>', '|', '&',
        ';', '#',
    ];

    if arg.is_empty() {
        return "''".to_string();
    }
    if !arg.contains(SHELL_META) {
        return arg.to_string();
    }
    format!("'{}'", arg.replace('\'', "'\\''"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(args: &[&str]) -> Vec<String> {
        args.iter().map(|a| a.to_string()).collect()
    }

    #[test]
    fn execute_captures_stdout() {
        let output = execute("echo", &strings(&["hello"]), None);
        assert!(output.success);
        assert_eq!(output.exit_code, 0);
        assert_eq!(output.stdout.trim(), "hello");
    }

    #[test]
    fn execute_reports_non_zero_exit() {
        let output = execute("sh", &strings(&["-c", "echo broken >&2; exit 3"]), None);
        assert!(!output.success);
        assert_eq!(output.exit_code, 3);
        assert_eq!(output.stderr.trim(), "broken");
    }

    #[test]
    fn execute_missing_program_reports_127() {
        let output = execute("nonexistent_command_xyz", &[], None);
        assert!(!output.success);
        assert_eq!(output.exit_code, SPAWN_FAILED_EXIT_CODE);
        assert!(output.stderr.contains("nonexistent_command_xyz"));
    }

    #[test]
    fn execute_honors_current_dir() {
        let dir = tempfile::tempdir().unwrap();
        let output = execute("pwd", &[], Some(dir.path()));
        assert!(output.success);
        let reported = std::fs::canonicalize(output.stdout.trim()).unwrap();
        assert_eq!(reported, std::fs::canonicalize(dir.path()).unwrap());
    }

    #[test]
    fn display_command_quotes_only_when_needed() {
        let line = display_command(
            "dot",
            &strings(&["-Tpng", "/tmp/a b/classes.dot", "-o", "it's.png"]),
        );
        assert_eq!(line, "dot -Tpng '/tmp/a b/classes.dot' -o 'it'\\''s.png'");
    }
}
