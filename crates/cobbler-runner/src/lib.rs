//! Secure subprocess execution: every external tool (VCS, issue store CLI,
//! LLM CLI) is invoked through [`CommandSpec`], argv-style only, with an
//! enforced timeout and process-group teardown on expiry.

mod cancellation;
mod command_spec;
mod error;
mod kill;
mod native;
mod output;

pub use cancellation::{is_cancelled, request_cancellation};
pub use command_spec::CommandSpec;
pub use error::RunnerError;
pub use native::{NativeRunner, ProcessRunner};
pub use output::ProcessOutput;
