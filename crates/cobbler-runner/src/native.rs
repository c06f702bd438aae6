use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use crate::cancellation;
use crate::command_spec::CommandSpec;
use crate::error::RunnerError;
use crate::kill::kill_process_group;
use crate::output::ProcessOutput;

/// Runs a [`CommandSpec`] with an optional wall-clock timeout, killing the
/// whole process group if the deadline passes (spec.md §6.4 "termination on
/// timeout: process group is killed").
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    async fn run(
        &self,
        spec: &CommandSpec,
        stdin: Option<&str>,
        timeout: Duration,
    ) -> Result<ProcessOutput, RunnerError>;
}

/// The only runner this workspace ships: a direct native spawn via
/// `tokio::process::Command`. Unlike the cross-platform runner this was
/// grounded on, there is no WSL/native detection here — the operator surface
/// is a single POSIX host.
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeRunner;

#[async_trait]
impl ProcessRunner for NativeRunner {
    async fn run(
        &self,
        spec: &CommandSpec,
        stdin: Option<&str>,
        timeout: Duration,
    ) -> Result<ProcessOutput, RunnerError> {
        let program = spec.program_name();
        let mut command = spec.to_tokio_command();
        command.stdin(Stdio::piped()).stdout(Stdio::piped()).stderr(Stdio::piped());

        #[cfg(unix)]
        unsafe {
            use std::os::unix::process::CommandExt;
            command.pre_exec(|| {
                libc::setpgid(0, 0);
                Ok(())
            });
        }

        let mut child = command.spawn().map_err(|e| RunnerError::SpawnFailed {
            program: program.clone(),
            reason: e.to_string(),
        })?;
        let pid = child.id();

        if let Some(content) = stdin
            && let Some(mut pipe) = child.stdin.take()
        {
            pipe.write_all(content.as_bytes())
                .await
                .map_err(|e| RunnerError::StdinWrite {
                    program: program.clone(),
                    reason: e.to_string(),
                })?;
        }

        let mut cancel_rx = cancellation::receiver();
        if *cancel_rx.borrow() {
            if let Some(pid) = pid {
                kill_process_group(pid);
            }
            tracing::warn!(program = %program, "cancellation already requested, process group killed before completion");
            return Ok(ProcessOutput::new(Vec::new(), Vec::new(), None, true));
        }

        tokio::select! {
            res = tokio::time::timeout(timeout, child.wait_with_output()) => match res {
                Ok(Ok(output)) => Ok(ProcessOutput::new(
                    output.stdout,
                    output.stderr,
                    output.status.code(),
                    false,
                )),
                Ok(Err(e)) => Err(RunnerError::Wait {
                    program,
                    reason: e.to_string(),
                }),
                Err(_elapsed) => {
                    if let Some(pid) = pid {
                        kill_process_group(pid);
                    }
                    tracing::warn!(
                        program = %program,
                        timeout_secs = timeout.as_secs(),
                        "subprocess timed out, process group killed"
                    );
                    Ok(ProcessOutput::new(Vec::new(), Vec::new(), None, true))
                }
            },
            _ = cancel_rx.changed() => {
                if let Some(pid) = pid {
                    kill_process_group(pid);
                }
                tracing::warn!(program = %program, "SIGINT received, process group killed");
                Ok(ProcessOutput::new(Vec::new(), Vec::new(), None, true))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn runs_a_simple_command() {
        let runner = NativeRunner;
        let spec = CommandSpec::new("echo").arg("hello");
        let out = runner.run(&spec, None, Duration::from_secs(5)).await.unwrap();
        assert!(out.success());
        assert_eq!(out.stdout_lossy().trim(), "hello");
    }

    #[tokio::test]
    async fn feeds_stdin_to_the_child() {
        let runner = NativeRunner;
        let spec = CommandSpec::new("cat");
        let out = runner
            .run(&spec, Some("piped in\n"), Duration::from_secs(5))
            .await
            .unwrap();
        assert!(out.success());
        assert_eq!(out.stdout_lossy(), "piped in\n");
    }

    #[tokio::test]
    async fn kills_on_timeout() {
        let runner = NativeRunner;
        let spec = CommandSpec::new("sleep").arg("5");
        let out = runner
            .run(&spec, None, Duration::from_millis(100))
            .await
            .unwrap();
        assert!(out.timed_out);
        assert!(out.exit_code.is_none());
    }
}
