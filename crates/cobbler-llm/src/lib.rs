//! LLM gateway (spec.md sec 4.6): invokes the subprocess runner (C1) with a
//! rendered prompt on stdin and decodes the newline-delimited JSON result
//! stream emitted on stdout.

mod error;
mod gateway;
mod stream;
mod yaml_block;

pub use error::LlmError;
pub use gateway::{LlmGateway, LlmOutput};
pub use stream::{Usage, extract_text_payload, find_result_usage};
pub use yaml_block::extract_yaml_block;
