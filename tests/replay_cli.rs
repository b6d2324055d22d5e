//! Tests for the interceptor-replay binary

use std::io::Write;
use std::process::Command;
use tempfile::NamedTempFile;

const DEFINITIONS: &str = r##"
- name: Watcher
  serverId: srv
  channelIncludePattern: "#one,#two"
  channelExcludePattern: "#two-ops"
  rules:
    - label: swearing
      messageMode: REGEX
      messagePattern: "(damn|heck)"
      nickMode: LIKE
      nickPattern: ali
"##;

fn temp_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp file");
    file.write_all(contents.as_bytes()).expect("write temp file");
    file
}

#[test]
fn test_replay_prints_json_hits() {
    let definitions = temp_file(DEFINITIONS);
    let events = temp_file(concat!(
        r##"{"server_id":"srv","channel":"#one","from_nick":"alice","##,
        r##""from_hostmask":"alice!i@h","text":"oh heck","event_type":"message"}"##,
        "\n",
        r##"{"server_id":"srv","channel":"#two-ops","from_nick":"alice","##,
        r##""from_hostmask":"alice!i@h","text":"oh heck","event_type":"message"}"##,
        "\n",
        "not json\n",
        "\n",
    ));

    let output = Command::new(env!("CARGO_BIN_EXE_interceptor-replay"))
        .arg("--definitions")
        .arg(definitions.path())
        .arg("--output")
        .arg("json")
        .arg(events.path())
        .output()
        .expect("run interceptor-replay");

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8(output.stdout).unwrap();
    let hits: Vec<serde_json::Value> = stdout
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0]["reason"], "swearing");
    assert_eq!(hits[0]["interceptorName"], "Watcher");
    assert_eq!(hits[0]["channel"], "#one");
}

#[test]
fn test_replay_rejects_invalid_definitions() {
    let definitions = temp_file(concat!(
        "- name: Broken\n",
        "  rules:\n",
        "    - messageMode: REGEX\n",
        "      messagePattern: \"(heck\"\n",
    ));
    let events = temp_file("");

    let output = Command::new(env!("CARGO_BIN_EXE_interceptor-replay"))
        .arg("--definitions")
        .arg(definitions.path())
        .arg(events.path())
        .output()
        .expect("run interceptor-replay");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Failed to load definitions"), "stderr: {}", stderr);
}

#[test]
fn test_replay_keeps_every_event_past_queue_capacity() {
    let definitions = temp_file(DEFINITIONS);
    let config = temp_file("pipeline:\n  queue_capacity: 2\nhit_history_capacity: 1000\n");
    let lines: String = (0..600)
        .map(|i| {
            format!(
                concat!(
                    r##"{{"server_id":"srv","channel":"#one","from_nick":"alice","##,
                    r##""from_hostmask":"alice!i@h","text":"heck {}","event_type":"message"}}"##,
                    "\n"
                ),
                i
            )
        })
        .collect();
    let events = temp_file(&lines);

    let output = Command::new(env!("CARGO_BIN_EXE_interceptor-replay"))
        .arg("--definitions")
        .arg(definitions.path())
        .arg("--config")
        .arg(config.path())
        .arg("--output")
        .arg("json")
        .arg(events.path())
        .output()
        .expect("run interceptor-replay");

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8(output.stdout).unwrap();
    let mut texts: Vec<String> = stdout
        .lines()
        .map(|l| {
            let hit: serde_json::Value = serde_json::from_str(l).unwrap();
            hit["text"].as_str().unwrap().to_string()
        })
        .collect();
    texts.sort();
    texts.dedup();
    assert_eq!(texts.len(), 600);
}
