use std::fs;

use serde_json::json;
use tether::{CallReport, parse_calls, policy, read_anchored, run_calls, schemas_json};
use tether_edit::fingerprint;
use tether_tools::DispatchSettings;

#[test]
fn schemas_list_fourteen_function_tools() {
    let parsed: serde_json::Value = serde_json::from_str(&schemas_json().unwrap()).unwrap();
    let tools = parsed.as_array().unwrap();
    assert_eq!(tools.len(), 14);
    assert!(tools.iter().all(|t| t["type"] == "function"));
}

#[test]
fn policy_uses_overrides() {
    let text = policy(&DispatchSettings::default(), Some("/srv/app"), Some(3)).unwrap();
    assert!(text.contains("`/srv/app`"));
    assert!(text.contains("At most 3 mutating tool calls"));
    assert!(policy(&DispatchSettings::default(), Some("relative"), None).is_err());
}

#[test]
fn read_anchored_prints_references() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("f.txt");
    fs::write(&path, "one\ntwo\n").unwrap();
    let out = read_anchored(&path, Some(2), None).unwrap();
    assert_eq!(out, format!("2:{}|two\n", fingerprint("two")));
}

#[test]
fn parse_calls_accepts_one_or_many() {
    let one = parse_calls(r#"{"name":"git_status"}"#).unwrap();
    assert_eq!(one.len(), 1);
    assert_eq!(one[0].id, "call_1");
    assert_eq!(one[0].arguments, json!({}));

    let many = parse_calls(r#"[{"name":"a","arguments":{}},{"id":"x","name":"b"}]"#).unwrap();
    assert_eq!(many[0].id, "call_1");
    assert_eq!(many[1].id, "x");

    assert!(parse_calls("[]").is_err());
    assert!(parse_calls("not json").is_err());
}

#[test]
fn a_turn_edits_files_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("main.txt"), "alpha\nbeta\ngamma\n").unwrap();

    let calls = parse_calls(
        &json!([
            {
                "name": "edit_file",
                "arguments": {
                    "path": "main.txt",
                    "edits": [
                        { "op": "delete_line", "ref": format!("2:{}", fingerprint("beta")) }
                    ]
                }
            },
            { "name": "write_file", "arguments": { "path": "docs/new.md", "content": "# New\n" } },
            { "name": "git_status" },
            { "name": "read_file", "arguments": { "path": "../escape" } }
        ])
        .to_string(),
    )
    .unwrap();

    let reports = run_calls(dir.path(), DispatchSettings::default(), &calls).unwrap();
    assert_eq!(reports.len(), 4);

    let CallReport::Result(edit) = &reports[0] else {
        panic!("edit_file runs locally");
    };
    assert!(!edit.is_error, "{}", edit.content);
    assert_eq!(
        fs::read_to_string(dir.path().join("main.txt")).unwrap(),
        "alpha\ngamma\n"
    );
    assert_eq!(
        fs::read_to_string(dir.path().join("docs/new.md")).unwrap(),
        "# New\n"
    );
    assert!(matches!(&reports[2], CallReport::Forward { name, .. } if name == "git_status"));
    let CallReport::Result(escape) = &reports[3] else {
        panic!("rejections are results");
    };
    assert!(escape.is_error);
    assert!(escape.content.contains("outside the workspace root"));
}

#[test]
fn reports_serialize_by_variant() {
    let report = CallReport::Forward {
        name: "exec".to_string(),
        arguments: json!({ "command": "ls" }),
    };
    assert_eq!(
        serde_json::to_value(&report).unwrap(),
        json!({ "forward": { "name": "exec", "arguments": { "command": "ls" } } })
    );
}
