//! Stub LLM CLI for integration tests.
//!
//! Mimics the wire contract of spec.md §6.4 without making a real API call:
//! reads a UTF-8 prompt on stdin, writes newline-delimited JSON records to
//! stdout, and exits 0 on success. `--scenario` selects which shape of
//! response to produce, so tests can exercise the gateway's parsing without
//! a live subprocess.

use std::io::{self, IsTerminal, Read, Write};
use std::time::Duration;

use clap::{Arg, ArgAction, Command};

fn main() {
    let matches = Command::new("claude-stub")
        .about("Stub LLM CLI for cobbler integration tests")
        .arg(Arg::new("scenario").long("scenario").default_value("success"))
        .arg(Arg::new("output-format").long("output-format").default_value("stream-json"))
        .arg(Arg::new("model").long("model").default_value("stub"))
        .arg(Arg::new("no-sleep").long("no-sleep").action(ArgAction::SetTrue))
        .get_matches();

    let scenario = matches.get_one::<String>("scenario").unwrap().as_str();
    let no_sleep = matches.get_flag("no-sleep");

    // Drain stdin even for scenarios that never look at the prompt, so the
    // caller's write half doesn't block on a full pipe (spec.md §6.4 stdin
    // piping).
    let mut prompt = String::new();
    if !io::stdin().is_terminal() {
        let _ = io::stdin().read_to_string(&mut prompt);
    }

    match scenario {
        "timeout" => {
            if !no_sleep {
                std::thread::sleep(Duration::from_secs(3600));
            }
            std::process::exit(0);
        }
        "error" => {
            eprintln!("stub: simulated subprocess failure");
            std::process::exit(1);
        }
        "no-result" => {
            emit_assistant_text(&sample_yaml());
            std::process::exit(0);
        }
        "no-yaml-block" => {
            emit_assistant_text("no fenced block here, just prose.");
            emit_result(120, 40);
            std::process::exit(0);
        }
        _ => {
            emit_assistant_text(&sample_yaml());
            emit_result(120, 40);
            std::process::exit(0);
        }
    }
}

fn emit_assistant_text(text: &str) {
    let record = serde_json::json!({
        "type": "assistant",
        "message": {
            "content": [{"type": "text", "text": text}],
        },
    });
    println_line(&record);
}

fn emit_result(input_tokens: u64, output_tokens: u64) {
    let record = serde_json::json!({
        "type": "result",
        "usage": {
            "input_tokens": input_tokens,
            "output_tokens": output_tokens,
            "cache_creation_tokens": 0,
            "cache_read_tokens": 0,
        },
        "cost_usd": 0.01,
    });
    println_line(&record);
}

fn println_line(record: &serde_json::Value) {
    let mut stdout = io::stdout();
    let _ = writeln!(stdout, "{record}");
}

/// A task batch matching the description schema of spec.md §3
/// ("Description schema"), fenced the way the gateway expects
/// (`extract_yaml_block`).
fn sample_yaml() -> String {
    "Here is the proposed batch:\n\n\
     ```yaml\n\
     tasks:\n\
     \x20 - index: 0\n\
     \x20   depends_on: -1\n\
     \x20   title: Add a stub task\n\
     \x20   deliverable_type: feature\n\
     \x20   required_reading: []\n\
     \x20   files:\n\
     \x20     - path: src/stub.rs\n\
     \x20       action: create\n\
     \x20   requirements:\n\
     \x20     - id: R1\n\
     \x20       text: Does something small and verifiable\n\
     \x20   acceptance_criteria:\n\
     \x20     - id: A1\n\
     \x20       text: A test exercises the new behavior\n\
     \x20   design_decisions: []\n\
     ```\n"
        .to_string()
}
