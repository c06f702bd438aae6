use serde::Deserialize;

/// Token usage and cost reported by the final `result` record (spec.md sec
/// 4.6, 6.4). Fields absent from the wire record default to zero.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Usage {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub cache_creation_tokens: u64,
    pub cache_read_tokens: u64,
    pub cost_usd: f64,
}

#[derive(Debug, Deserialize, Default)]
struct RawUsage {
    #[serde(default)]
    input_tokens: u64,
    #[serde(default)]
    output_tokens: u64,
    #[serde(default)]
    cache_creation_tokens: u64,
    #[serde(default)]
    cache_read_tokens: u64,
}

#[derive(Debug, Deserialize)]
struct RawRecord {
    #[serde(rename = "type")]
    record_type: Option<String>,
    #[serde(default)]
    usage: Option<RawUsage>,
    #[serde(default)]
    cost_usd: Option<f64>,
}

/// Parse `stdout` line by line, scanning from the end for the first record
/// with `type = "result"` (spec.md sec 4.6). Missing or malformed records
/// yield `None` so the caller can treat token counts as zero.
#[must_use]
pub fn find_result_usage(stdout: &str) -> Option<Usage> {
    for line in stdout.lines().rev() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let Ok(record) = serde_json::from_str::<RawRecord>(trimmed) else {
            continue;
        };
        if record.record_type.as_deref() != Some("result") {
            continue;
        }
        let usage = record.usage.unwrap_or_default();
        return Some(Usage {
            input_tokens: usage.input_tokens,
            output_tokens: usage.output_tokens,
            cache_creation_tokens: usage.cache_creation_tokens,
            cache_read_tokens: usage.cache_read_tokens,
            cost_usd: record.cost_usd.unwrap_or(0.0),
        });
    }
    None
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: Option<String>,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MessageBody {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct TextRecord {
    #[serde(default)]
    message: Option<MessageBody>,
}

/// Extract the concatenated textual payload from every record whose
/// `message.content` carries one or more `{"type":"text"}` blocks (spec.md
/// sec 4.6). Records that are not valid JSON, or carry no text content, are
/// skipped without affecting the result.
#[must_use]
pub fn extract_text_payload(stdout: &str) -> String {
    let mut out = String::new();
    for line in stdout.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let Ok(record) = serde_json::from_str::<TextRecord>(trimmed) else {
            continue;
        };
        let Some(message) = record.message else { continue };
        for block in message.content {
            if block.block_type.as_deref() == Some("text")
                && let Some(text) = block.text
            {
                out.push_str(&text);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_the_last_result_record_scanning_in_reverse() {
        let stdout = "{\"type\":\"assistant\"}\n\
             {\"type\":\"result\",\"usage\":{\"input_tokens\":10,\"output_tokens\":20},\"cost_usd\":0.5}\n\
             noise that is not json\n";
        let usage = find_result_usage(stdout).unwrap();
        assert_eq!(usage.input_tokens, 10);
        assert_eq!(usage.output_tokens, 20);
        assert!((usage.cost_usd - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn missing_result_record_yields_none() {
        let stdout = "{\"type\":\"assistant\"}\n{\"type\":\"system\"}\n";
        assert!(find_result_usage(stdout).is_none());
    }

    #[test]
    fn malformed_final_line_is_skipped_in_favor_of_an_earlier_valid_record() {
        let stdout = "{\"type\":\"result\",\"usage\":{\"input_tokens\":1,\"output_tokens\":2}}\n{not json";
        let usage = find_result_usage(stdout).unwrap();
        assert_eq!(usage.input_tokens, 1);
    }

    #[test]
    fn missing_usage_object_defaults_to_zero() {
        let stdout = "{\"type\":\"result\"}\n";
        let usage = find_result_usage(stdout).unwrap();
        assert_eq!(usage, Usage::default());
    }

    #[test]
    fn extracts_and_concatenates_text_blocks_in_stream_order() {
        let stdout = "{\"message\":{\"content\":[{\"type\":\"text\",\"text\":\"hello \"}]}}\n\
             {\"type\":\"result\"}\n\
             {\"message\":{\"content\":[{\"type\":\"text\",\"text\":\"world\"}]}}\n";
        assert_eq!(extract_text_payload(stdout), "hello world");
    }

    #[test]
    fn ignores_non_text_content_blocks() {
        let stdout = "{\"message\":{\"content\":[{\"type\":\"tool_use\",\"text\":null}]}}\n";
        assert_eq!(extract_text_payload(stdout), "");
    }
}
