use starbase_styles::{Style, Stylize, color};
use std::ffi::OsStr;
use std::io;
use std::process::{Output, Stdio};
use thiserror::Error;
use tokio::process::Command;
use tracing::trace;

#[derive(Error, Debug, miette::Diagnostic)]
pub enum CaskProcessError {
    #[diagnostic(code(cask::process::command_failed))]
    #[error("Failed to execute command {}.", .command.style(Style::Shell))]
    FailedCommand {
        command: String,
        #[source]
        error: Box<io::Error>,
    },

    #[diagnostic(code(cask::process::command_failed))]
    #[error(
        "Command {} returned a {code} exit code.\n{}",
        .command.style(Style::Shell),
        .stderr.style(Style::MutedLight),
    )]
    FailedCommandNonZeroExit {
        command: String,
        code: i32,
        stderr: String,
    },
}

fn format_command_line<'a>(program: &OsStr, args: impl Iterator<Item = &'a OsStr>) -> String {
    let args = args.map(|arg| arg.to_string_lossy()).collect::<Vec<_>>();

    if args.is_empty() {
        return program.to_string_lossy().to_string();
    }

    format!(
        "{} {}",
        program.to_string_lossy(),
        shell_words::join(args)
    )
}

fn handle_output(
    command_line: String,
    output: io::Result<Output>,
) -> Result<String, CaskProcessError> {
    let output = output.map_err(|error| CaskProcessError::FailedCommand {
        command: command_line.clone(),
        error: Box::new(error),
    })?;

    let stderr = String::from_utf8(output.stderr).unwrap_or_default();
    let stdout = String::from_utf8(output.stdout).unwrap_or_default();
    let code = output.status.code().unwrap_or(-1);

    trace!(
        code,
        stderr = if stderr.len() > 250 {
            "<truncated>"
        } else {
            &stderr
        },
        "Ran command {}",
        color::shell(&command_line)
    );

    if code != 0 {
        return Err(CaskProcessError::FailedCommandNonZeroExit {
            command: command_line,
            code,
            stderr,
        });
    }

    Ok(stdout)
}

/// Run a command to completion with piped output and return its stdout.
/// A non-zero exit code is returned as an error.
pub async fn exec_command(command: &mut Command) -> Result<String, CaskProcessError> {
    let inner = command.as_std();
    let command_line = format_command_line(inner.get_program(), inner.get_args());

    trace!(
        cwd = ?inner.get_current_dir(),
        "Running command {}", color::shell(&command_line)
    );

    let output = command
        .stderr(Stdio::piped())
        .stdout(Stdio::piped())
        .output()
        .await;

    handle_output(command_line, output)
}

/// Like [`exec_command`], for callers outside of an async context.
pub fn exec_command_blocking(command: &mut std::process::Command) -> Result<String, CaskProcessError> {
    let command_line = format_command_line(command.get_program(), command.get_args());

    trace!(
        cwd = ?command.get_current_dir(),
        "Running command {}", color::shell(&command_line)
    );

    let output = command
        .stderr(Stdio::piped())
        .stdout(Stdio::piped())
        .output();

    handle_output(command_line, output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_arguments_for_display() {
        let mut command = std::process::Command::new("ditto");
        command.args(["/Volumes/Ink Well/Inkwell.app", "it's.app", "plain"]);

        assert_eq!(
            format_command_line(command.get_program(), command.get_args()),
            "ditto '/Volumes/Ink Well/Inkwell.app' 'it'\\''s.app' plain"
        );
    }

    #[cfg(unix)]
    #[test]
    fn returns_stdout() {
        let stdout = exec_command_blocking(std::process::Command::new("sh").args(["-c", "echo 14.5"]))
            .unwrap();

        assert_eq!(stdout.trim(), "14.5");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn errors_on_non_zero_exit() {
        let result = exec_command(Command::new("sh").args(["-c", "echo boom >&2; exit 3"])).await;

        assert!(matches!(
            result,
            Err(CaskProcessError::FailedCommandNonZeroExit { code: 3, ref stderr, .. })
                if stderr.trim() == "boom"
        ));
    }

    #[test]
    fn errors_for_missing_program() {
        let result = exec_command_blocking(&mut std::process::Command::new("cask-missing-binary"));

        assert!(matches!(result, Err(CaskProcessError::FailedCommand { .. })));
    }
}
