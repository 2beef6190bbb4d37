//! A tiny scripted MCP server used only by this crate's integration tests.
//! Performs the handshake, answers `tools/list` with one `search` tool, and
//! answers every `tools/call` with the content of `$MOCK_TOOL_CONTENT` — the
//! manager passes this through the per-source env overlay, so each spawned
//! instance can be scripted to return a different source's payload shape.

use std::io::BufRead;
use std::io::Write;

fn read_line(stdin: &mut impl BufRead) -> Option<String> {
    let mut line = String::new();
    match stdin.read_line(&mut line) {
        Ok(0) => None,
        Ok(_) => Some(line.trim_end().to_string()),
        Err(_) => None,
    }
}

fn request_id(line: &str) -> Option<i64> {
    let value: serde_json::Value = serde_json::from_str(line).ok()?;
    value.get("id")?.as_i64()
}

fn write_response(stdout: &mut impl Write, id: i64, result: serde_json::Value) {
    let frame = serde_json::json!({"jsonrpc": "2.0", "id": id, "result": result});
    let _ = writeln!(stdout, "{frame}");
    let _ = stdout.flush();
}

fn main() {
    let stdin = std::io::stdin();
    let mut stdin = stdin.lock();
    let mut stdout = std::io::stdout();
    let content = std::env::var("MOCK_TOOL_CONTENT").unwrap_or_else(|_| "[]".to_string());

    let Some(line) = read_line(&mut stdin) else { return };
    let Some(id) = request_id(&line) else { return };
    write_response(
        &mut stdout,
        id,
        serde_json::json!({
            "protocolVersion": "2024-11-05",
            "capabilities": {"tools": {"listChanged": false}},
            "serverInfo": {"name": "x", "version": "1"},
        }),
    );
    let Some(_initialized) = read_line(&mut stdin) else { return };

    loop {
        let Some(line) = read_line(&mut stdin) else { break };
        let Some(id) = request_id(&line) else { continue };
        let method = serde_json::from_str::<serde_json::Value>(&line)
            .ok()
            .and_then(|v| v.get("method").and_then(|m| m.as_str()).map(str::to_string));
        match method.as_deref() {
            Some("tools/list") => {
                write_response(
                    &mut stdout,
                    id,
                    serde_json::json!({"tools": [{"name": "search", "description": null, "inputSchema": null}]}),
                );
            }
            _ => {
                write_response(
                    &mut stdout,
                    id,
                    serde_json::json!({"content": [{"type": "text", "text": content}]}),
                );
            }
        }
    }
}
