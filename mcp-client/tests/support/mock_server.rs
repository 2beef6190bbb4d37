//! A tiny scripted MCP server used only by this crate's integration tests.
//! Picks its behavior from `argv[1]`; logs every line it reads on stdin to
//! the file named by `$MOCK_LOG_PATH` (if set) so tests can assert on what
//! the client actually wrote, not just what it received back.

use std::io::BufRead;
use std::io::Write;

fn log_line(line: &str) {
    if let Ok(path) = std::env::var("MOCK_LOG_PATH") {
        if let Ok(mut f) = std::fs::OpenOptions::new().create(true).append(true).open(path) {
            let _ = writeln!(f, "{line}");
        }
    }
}

fn read_line(stdin: &mut impl BufRead) -> Option<String> {
    let mut line = String::new();
    match stdin.read_line(&mut line) {
        Ok(0) => None,
        Ok(_) => {
            let line = line.trim_end().to_string();
            log_line(&line);
            Some(line)
        }
        Err(_) => None,
    }
}

fn request_id(line: &str) -> Option<i64> {
    let value: serde_json::Value = serde_json::from_str(line).ok()?;
    value.get("id")?.as_i64()
}

fn param_str(line: &str, pointer: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(line).ok()?;
    value.pointer(pointer)?.as_str().map(str::to_string)
}

fn write_response(stdout: &mut impl Write, id: i64, result: serde_json::Value) {
    let frame = serde_json::json!({"jsonrpc": "2.0", "id": id, "result": result});
    let _ = writeln!(stdout, "{frame}");
    let _ = stdout.flush();
}

/// Consume the `initialize` request, reply, then consume the
/// `notifications/initialized` notification that follows it.
fn do_handshake(stdin: &mut impl BufRead, stdout: &mut impl Write) -> Option<()> {
    let line = read_line(stdin)?;
    let id = request_id(&line)?;
    write_response(
        stdout,
        id,
        serde_json::json!({
            "protocolVersion": "2024-11-05",
            "capabilities": {"tools": {"listChanged": false}},
            "serverInfo": {"name": "x", "version": "1"},
        }),
    );
    read_line(stdin)?;
    Some(())
}

fn main() {
    let scenario = std::env::args().nth(1).unwrap_or_default();
    let stdin = std::io::stdin();
    let mut stdin = stdin.lock();
    let mut stdout = std::io::stdout();

    match scenario.as_str() {
        "handshake" => {
            let _ = do_handshake(&mut stdin, &mut stdout);
        }
        "concurrent" => {
            let Some(()) = do_handshake(&mut stdin, &mut stdout) else { return };
            let mut by_q: std::collections::HashMap<String, i64> = std::collections::HashMap::new();
            for _ in 0..3 {
                let Some(line) = read_line(&mut stdin) else { return };
                let Some(id) = request_id(&line) else { continue };
                if let Some(q) = param_str(&line, "/params/arguments/q") {
                    by_q.insert(q, id);
                }
            }
            for q in ["c", "a", "b"] {
                if let Some(id) = by_q.get(q) {
                    write_response(
                        &mut stdout,
                        *id,
                        serde_json::json!({"content": [{"type": "text", "text": format!("reply-{q}")}]}),
                    );
                }
            }
        }
        "crash_mid_call" => {
            let Some(()) = do_handshake(&mut stdin, &mut stdout) else { return };
            let Some(_line) = read_line(&mut stdin) else { return };
            // Exit without ever replying to the call: stdout closes mid-RPC.
        }
        "sequential_ids" => {
            // Reply to the handshake, then to every request it receives
            // afterwards with an empty tools/list result, until stdin closes.
            let Some(()) = do_handshake(&mut stdin, &mut stdout) else { return };
            loop {
                let Some(line) = read_line(&mut stdin) else { break };
                if let Some(id) = request_id(&line) {
                    write_response(&mut stdout, id, serde_json::json!({"tools": []}));
                }
            }
        }
        _ => {}
    }
}
