use std::time::Duration;

use camino::Utf8Path;
use cobbler_runner::{CommandSpec, ProcessRunner};

use crate::error::LlmError;
use crate::stream::{Usage, extract_text_payload, find_result_usage};
use crate::yaml_block::extract_yaml_block;

/// Outcome of one LLM invocation: the decoded token usage (zeroed on parse
/// failure) and the fenced yaml block pulled from the textual payload.
#[derive(Debug, Clone)]
pub struct LlmOutput {
    pub usage: Usage,
    pub usage_parse_failed: bool,
    pub yaml: String,
    pub raw_stdout: Vec<u8>,
}

/// Invokes a configured LLM subprocess (C1) with a rendered prompt on
/// stdin and decodes its newline-delimited JSON result stream (spec.md sec
/// 4.6).
pub struct LlmGateway<R: ProcessRunner> {
    runner: R,
    spec: CommandSpec,
    timeout: Duration,
}

impl<R: ProcessRunner> LlmGateway<R> {
    #[must_use]
    pub fn new(runner: R, spec: CommandSpec, timeout: Duration) -> Self {
        Self { runner, spec, timeout }
    }

    /// Run the LLM with `prompt` on stdin, in working directory `dir`.
    ///
    /// # Errors
    /// Returns [`LlmError::Timeout`] or [`LlmError::NonZeroExit`] when the
    /// subprocess itself fails, and [`LlmError::NoYamlBlock`] when no
    /// fenced yaml block could be extracted from the textual output — the
    /// signal the executor (C8) retries on.
    pub async fn invoke(&self, dir: &Utf8Path, prompt: &str) -> Result<LlmOutput, LlmError> {
        let spec = self.spec.clone().cwd(dir);
        let output = self.runner.run(&spec, Some(prompt), self.timeout).await?;

        if output.timed_out {
            return Err(LlmError::Timeout);
        }
        if output.exit_code != Some(0) {
            return Err(LlmError::NonZeroExit {
                code: output.exit_code,
                stderr: output.stderr_lossy(),
            });
        }

        let stdout = output.stdout_lossy();
        let (usage, usage_parse_failed) = match find_result_usage(&stdout) {
            Some(usage) => (usage, false),
            None => {
                tracing::warn!("LLM output stream carried no result record, treating usage as zero");
                (Usage::default(), true)
            }
        };

        let text = extract_text_payload(&stdout);
        let yaml = extract_yaml_block(&text).ok_or(LlmError::NoYamlBlock)?;

        Ok(LlmOutput {
            usage,
            usage_parse_failed,
            yaml,
            raw_stdout: output.stdout,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use cobbler_runner::{ProcessOutput, RunnerError};
    use std::sync::Mutex;

    struct StubRunner {
        response: Mutex<Option<ProcessOutput>>,
    }

    #[async_trait]
    impl ProcessRunner for StubRunner {
        async fn run(&self, _spec: &CommandSpec, _stdin: Option<&str>, _timeout: Duration) -> Result<ProcessOutput, RunnerError> {
            Ok(self.response.lock().unwrap().take().unwrap())
        }
    }

    fn stub(stdout: &str, exit_code: Option<i32>, timed_out: bool) -> StubRunner {
        StubRunner {
            response: Mutex::new(Some(ProcessOutput::new(stdout.as_bytes().to_vec(), Vec::new(), exit_code, timed_out))),
        }
    }

    #[tokio::test]
    async fn successful_invocation_decodes_usage_and_yaml() {
        let stdout = "{\"message\":{\"content\":[{\"type\":\"text\",\"text\":\"```yaml\\nindex: 1\\n```\"}]}}\n\
             {\"type\":\"result\",\"usage\":{\"input_tokens\":5,\"output_tokens\":9},\"cost_usd\":0.1}\n";
        let gateway = LlmGateway::new(stub(stdout, Some(0), false), CommandSpec::new("claude"), Duration::from_secs(5));
        let out = gateway.invoke(Utf8Path::new("."), "prompt").await.unwrap();
        assert_eq!(out.yaml, "index: 1");
        assert_eq!(out.usage.input_tokens, 5);
        assert!(!out.usage_parse_failed);
    }

    #[tokio::test]
    async fn missing_result_record_zeroes_usage_but_still_extracts_yaml() {
        let stdout = "{\"message\":{\"content\":[{\"type\":\"text\",\"text\":\"```yaml\\na: 1\\n```\"}]}}\n";
        let gateway = LlmGateway::new(stub(stdout, Some(0), false), CommandSpec::new("claude"), Duration::from_secs(5));
        let out = gateway.invoke(Utf8Path::new("."), "prompt").await.unwrap();
        assert_eq!(out.usage, Usage::default());
        assert!(out.usage_parse_failed);
        assert_eq!(out.yaml, "a: 1");
    }

    #[tokio::test]
    async fn missing_yaml_block_is_a_parse_failure() {
        let stdout = "{\"message\":{\"content\":[{\"type\":\"text\",\"text\":\"no fences\"}]}}\n{\"type\":\"result\"}\n";
        let gateway = LlmGateway::new(stub(stdout, Some(0), false), CommandSpec::new("claude"), Duration::from_secs(5));
        let err = gateway.invoke(Utf8Path::new("."), "prompt").await.unwrap_err();
        assert!(matches!(err, LlmError::NoYamlBlock));
    }

    #[tokio::test]
    async fn timeout_is_surfaced_before_stream_decoding() {
        let gateway = LlmGateway::new(stub("", None, true), CommandSpec::new("claude"), Duration::from_secs(5));
        let err = gateway.invoke(Utf8Path::new("."), "prompt").await.unwrap_err();
        assert!(matches!(err, LlmError::Timeout));
    }

    #[tokio::test]
    async fn non_zero_exit_is_surfaced_before_stream_decoding() {
        let gateway = LlmGateway::new(stub("", Some(1), false), CommandSpec::new("claude"), Duration::from_secs(5));
        let err = gateway.invoke(Utf8Path::new("."), "prompt").await.unwrap_err();
        assert!(matches!(err, LlmError::NonZeroExit { code: Some(1), .. }));
    }
}
