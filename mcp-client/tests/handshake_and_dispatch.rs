//! S1 (handshake happy path) and S2 (concurrent tool calls, out-of-order
//! replies) from spec §8.
#![allow(clippy::unwrap_used)]

use std::collections::HashMap;

use mcp_client::McpClient;
use mcp_types::Implementation;

fn mock_server_path() -> String {
    env!("CARGO_BIN_EXE_mcp_mock_server").to_string()
}

fn client_info() -> Implementation {
    Implementation { name: "test-client".to_string(), version: "0.0.0".to_string() }
}

#[tokio::test]
async fn handshake_happy_path_sends_initialized_after_success() {
    let log_file = tempfile::NamedTempFile::new().unwrap();
    let log_path = log_file.path().to_path_buf();
    // SAFETY: this test process does not otherwise touch env vars
    // concurrently; tokio::test runs each test on its own thread/runtime.
    unsafe {
        std::env::set_var("MOCK_LOG_PATH", &log_path);
    }

    let client = McpClient::new_stdio_client(
        &mock_server_path(),
        &["handshake".to_string()],
        &HashMap::new(),
    )
    .await
    .unwrap();

    let result = client.initialize(client_info()).await.unwrap();

    assert_eq!(result.protocol_version, "2024-11-05");
    assert!(result.capabilities.tools.is_some());

    // Give the writer task a moment to flush the notification frame before
    // the mock server exits and we read its log.
    tokio::time::sleep(std::time::Duration::from_millis(150)).await;
    client.disconnect().await;

    let logged = std::fs::read_to_string(&log_path).unwrap_or_default();
    assert!(
        logged.contains("notifications/initialized"),
        "expected the initialized notification to have been written, got: {logged}"
    );
}

#[tokio::test]
async fn concurrent_tool_calls_are_matched_by_id_despite_out_of_order_replies() {
    let client = McpClient::new_stdio_client(
        &mock_server_path(),
        &["concurrent".to_string()],
        &HashMap::new(),
    )
    .await
    .unwrap();

    client.initialize(client_info()).await.unwrap();

    let args = |q: &str| HashMap::from([("q".to_string(), serde_json::Value::String(q.to_string()))]);

    let (ra, rb, rc) = tokio::join!(
        client.call_tool("search", args("a")),
        client.call_tool("search", args("b")),
        client.call_tool("search", args("c")),
    );

    pretty_assertions::assert_eq!(
        (ra.unwrap().content, rb.unwrap().content, rc.unwrap().content),
        ("reply-a".to_string(), "reply-b".to_string(), "reply-c".to_string())
    );

    client.disconnect().await;
}
