//! End-to-end tests for the export command against a mocked Slack API

use std::fs;
use std::path::Path;
use std::time::Duration;

use httpmock::prelude::*;
use serde_json::{json, Value};
use slack_dm_export::commands::export;
use slack_dm_export::{Config, Error, ErrorKind};

const BASE_TS: i64 = 1_700_000_000;

fn test_config(server: &MockServer, output_dir: &Path) -> Config {
    Config {
        token: Some("xoxb-test".to_string()),
        api_url: server.url("/api"),
        page_size: 100,
        request_timeout: Duration::from_secs(5),
        output_dir: output_dir.to_path_buf(),
        time_format: "%Y-%m-%d %H:%M:%S".to_string(),
        self_label: "You".to_string(),
    }
}

fn ts(offset: i64) -> String {
    format!("{}.000000", BASE_TS + offset)
}

/// Newest-first message objects for offsets in `range`.
fn history_messages(range: std::ops::Range<i64>) -> Vec<Value> {
    range
        .rev()
        .map(|i| {
            let user = if i % 2 == 0 { "U2" } else { "U1" };
            json!({"type": "message", "user": user, "text": format!("message {:03}", i), "ts": ts(i)})
        })
        .collect()
}

fn mock_directory(server: &MockServer) {
    server.mock(|when, then| {
        when.method(GET)
            .path("/api/conversations.list")
            .header("authorization", "Bearer xoxb-test");
        then.status(200).json_body(json!({
            "ok": true,
            "channels": [
                {"id": "D1", "is_im": true, "user": "U3"},
                {"id": "D2", "is_im": true, "user": "U2"}
            ]
        }));
    });
    server.mock(|when, then| {
        when.method(GET).path("/api/users.list");
        then.status(200).json_body(json!({
            "ok": true,
            "members": [
                {"id": "U1", "name": "me"},
                {"id": "U2", "name": "bob"},
                {"id": "U4", "name": "carol"}
            ]
        }));
    });
}

fn read_rows(path: &Path) -> Vec<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_path(path)
        .expect("csv reader");
    reader
        .records()
        .map(|r| r.expect("record").iter().map(str::to_string).collect())
        .collect()
}

#[tokio::test]
async fn exports_250_messages_in_three_pages() {
    let server = MockServer::start_async().await;
    let temp = tempfile::tempdir().expect("tempdir");
    mock_directory(&server);

    let first = server.mock(|when, then| {
        when.method(GET)
            .path("/api/conversations.history")
            .query_param("channel", "D2")
            .query_param("limit", "100")
            .query_param_missing("latest");
        then.status(200)
            .json_body(json!({"ok": true, "messages": history_messages(150..250), "has_more": true}));
    });
    let second = server.mock(|when, then| {
        when.method(GET)
            .path("/api/conversations.history")
            .query_param("latest", ts(150));
        then.status(200)
            .json_body(json!({"ok": true, "messages": history_messages(50..150), "has_more": true}));
    });
    let third = server.mock(|when, then| {
        when.method(GET)
            .path("/api/conversations.history")
            .query_param("latest", ts(50));
        then.status(200)
            .json_body(json!({"ok": true, "messages": history_messages(0..50), "has_more": false}));
    });

    let config = test_config(&server, temp.path());
    let summary = export::run(&config, "bob").await.expect("export");

    first.assert_calls(1);
    second.assert_calls(1);
    third.assert_calls(1);
    assert_eq!(summary.fetches, 3);
    assert_eq!(summary.messages, 250);
    assert_eq!(summary.path, temp.path().join("bob-message-history.csv"));

    let rows = read_rows(&summary.path);
    assert_eq!(rows.len(), 251);
    assert_eq!(rows[0], vec!["Time", "Author", "Content", "Is Starred"]);
    for (i, row) in rows[1..].iter().enumerate() {
        assert_eq!(row[2], format!("message {:03}", i));
        let expected_author = if i % 2 == 0 { "bob" } else { "You" };
        assert_eq!(row[1], expected_author);
        assert_eq!(row[3], "");
    }
}

#[tokio::test]
async fn empty_conversation_writes_header_only() {
    let server = MockServer::start_async().await;
    let temp = tempfile::tempdir().expect("tempdir");
    mock_directory(&server);

    let history = server.mock(|when, then| {
        when.method(GET).path("/api/conversations.history");
        then.status(200)
            .json_body(json!({"ok": true, "messages": [], "has_more": false}));
    });

    let config = test_config(&server, temp.path());
    let summary = export::run(&config, "bob").await.expect("export");

    history.assert_calls(1);
    assert_eq!(summary.messages, 0);
    assert_eq!(
        fs::read_to_string(&summary.path).expect("file"),
        "Time,Author,Content,Is Starred\n"
    );
}

#[tokio::test]
async fn starred_marker_is_exported() {
    let server = MockServer::start_async().await;
    let temp = tempfile::tempdir().expect("tempdir");
    mock_directory(&server);

    server.mock(|when, then| {
        when.method(GET).path("/api/conversations.history");
        then.status(200).json_body(json!({
            "ok": true,
            "messages": [
                {"user": "U2", "text": "pin this", "ts": ts(2), "is_starred": true},
                {"text": "bot note", "ts": ts(1), "subtype": "bot_message", "bot_id": "B1"}
            ],
            "has_more": false
        }));
    });

    let config = test_config(&server, temp.path());
    let summary = export::run(&config, "bob").await.expect("export");

    let rows = read_rows(&summary.path);
    assert_eq!(rows[1][1..], ["You", "bot note", ""]);
    assert_eq!(rows[2][1..], ["bob", "pin this", "yes"]);
}

#[tokio::test]
async fn unknown_user_aborts_before_history() {
    let server = MockServer::start_async().await;
    let temp = tempfile::tempdir().expect("tempdir");
    mock_directory(&server);

    let history = server.mock(|when, then| {
        when.method(GET).path("/api/conversations.history");
        then.status(200)
            .json_body(json!({"ok": true, "messages": [], "has_more": false}));
    });

    let config = test_config(&server, temp.path());
    let err = export::run(&config, "nobody").await.unwrap_err();

    assert!(matches!(err, Error::UserNotFound(ref n) if n == "nobody"));
    assert_eq!(err.kind(), ErrorKind::Resolution);
    history.assert_calls(0);
    assert!(!temp.path().join("nobody-message-history.csv").exists());
}

#[tokio::test]
async fn user_without_dm_aborts() {
    let server = MockServer::start_async().await;
    let temp = tempfile::tempdir().expect("tempdir");
    mock_directory(&server);

    let err = export::run(&test_config(&server, temp.path()), "carol")
        .await
        .unwrap_err();

    assert!(matches!(err, Error::ConversationNotFound(ref n) if n == "carol"));
    assert!(fs::read_dir(temp.path()).expect("dir").next().is_none());
}

#[tokio::test]
async fn api_failure_mid_history_writes_nothing() {
    let server = MockServer::start_async().await;
    let temp = tempfile::tempdir().expect("tempdir");
    mock_directory(&server);

    server.mock(|when, then| {
        when.method(GET)
            .path("/api/conversations.history")
            .query_param_missing("latest");
        then.status(200)
            .json_body(json!({"ok": true, "messages": history_messages(0..100), "has_more": true}));
    });
    server.mock(|when, then| {
        when.method(GET)
            .path("/api/conversations.history")
            .query_param("latest", ts(0));
        then.status(200)
            .json_body(json!({"ok": false, "error": "ratelimited"}));
    });

    let err = export::run(&test_config(&server, temp.path()), "bob")
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Transport);
    assert!(fs::read_dir(temp.path()).expect("dir").next().is_none());
}

#[tokio::test]
async fn missing_token_fails_before_any_request() {
    let server = MockServer::start_async().await;
    let temp = tempfile::tempdir().expect("tempdir");

    let any = server.mock(|when, then| {
        when.method(GET);
        then.status(200).json_body(json!({"ok": true}));
    });

    let mut config = test_config(&server, temp.path());
    config.token = None;
    let err = export::run(&config, "bob").await.unwrap_err();

    assert!(matches!(err, Error::MissingCredential(_)));
    assert_eq!(err.kind(), ErrorKind::Configuration);
    any.assert_calls(0);
}
