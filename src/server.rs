use anyhow::Result;
use serde_json::json;
use std::io::{BufRead, Write};
use std::path::PathBuf;

use crate::config::Config;
use crate::help::find_help;
use crate::indexer::build_index;
use crate::listing::render_listing;
use crate::viewer::render_file_view;
use crate::xml_builder::build_index_xml;

pub const INVALID_DIRECTORY_MESSAGE: &str = "Invalid directory! Please enter a valid directory path.";

/// Stdio JSON-RPC front end. Holds configuration only; every call indexes
/// from scratch.
pub struct Server {
    cfg: Config,
}

impl Server {
    pub fn new(cfg: Config) -> Self {
        Self { cfg }
    }

    fn tool_list(&self, id: serde_json::Value) -> serde_json::Value {
        json!({
            "jsonrpc": "2.0",
            "id": id,
            "result": {
                "tools": [
                    {
                        "name": "search_functions",
                        "description": "Index a Hamilton library directory and list every HSL function (name, arguments, return type, file, line, help document). Resolves .hsl/.hs_/.hsi duplicates so each library is reported once.",
                        "inputSchema": {
                            "type": "object",
                            "properties": {
                                "directory": { "type": "string", "description": "Absolute path of the library root to index" },
                                "search_filter": { "type": "string", "description": "Optional: case-insensitive substring of the function name. Supports OR via `foo|bar`." },
                                "format": { "type": "string", "enum": ["text", "json", "xml"], "description": "Optional: output format (default text)" }
                            },
                            "required": ["directory"]
                        }
                    },
                    {
                        "name": "view_file",
                        "description": "Show a source file with one line highlighted, e.g. the `line_number` of a search_functions result.",
                        "inputSchema": {
                            "type": "object",
                            "properties": {
                                "file_path": { "type": "string" },
                                "line_number": { "type": "integer", "minimum": 1 },
                                "context_lines": { "type": "integer", "description": "Optional: only show this many lines around the target" }
                            },
                            "required": ["file_path", "line_number"]
                        }
                    },
                    {
                        "name": "find_help",
                        "description": "Locate the help document (.chm) for a library stem in a directory.",
                        "inputSchema": {
                            "type": "object",
                            "properties": {
                                "stem": { "type": "string", "description": "File name without extension, e.g. 'HSLPump'" },
                                "directory": { "type": "string" }
                            },
                            "required": ["stem", "directory"]
                        }
                    }
                ]
            }
        })
    }

    fn tool_call(&self, id: serde_json::Value, params: &serde_json::Value) -> serde_json::Value {
        let name = params.get("name").and_then(|n| n.as_str()).unwrap_or("");
        let args = params.get("arguments").cloned().unwrap_or(json!({}));

        let ok = |text: String| {
            json!({
                "jsonrpc": "2.0",
                "id": id,
                "result": { "content": [{"type":"text","text": text }], "isError": false }
            })
        };

        let err = |msg: String| {
            json!({
                "jsonrpc": "2.0",
                "id": id,
                "result": { "content": [{"type":"text","text": msg }], "isError": true }
            })
        };

        match name {
            "search_functions" => {
                let Some(dir) = args.get("directory").and_then(|v| v.as_str()) else {
                    return err("Missing directory".to_string());
                };
                let index = match build_index(&PathBuf::from(dir), &self.cfg) {
                    Ok(index) => index,
                    Err(e) if e.is_invalid_root() => return err(format!("{INVALID_DIRECTORY_MESSAGE} ({dir})")),
                    Err(e) => return err(format!("indexing failed: {e}")),
                };
                let index = match args.get("search_filter").and_then(|v| v.as_str()) {
                    Some(f) => index.filter(f),
                    None => index,
                };

                match args.get("format").and_then(|v| v.as_str()).unwrap_or("text") {
                    "text" => ok(render_listing(&index)),
                    "json" => match serde_json::to_string_pretty(&index) {
                        Ok(s) => ok(s),
                        Err(e) => err(format!("json encoding failed: {e}")),
                    },
                    "xml" => match build_index_xml(&index) {
                        Ok(s) => ok(s),
                        Err(e) => err(format!("xml encoding failed: {e}")),
                    },
                    other => err(format!("Unknown format: {other}")),
                }
            }
            "view_file" => {
                let Some(p) = args.get("file_path").and_then(|v| v.as_str()) else {
                    return err("Missing file_path".to_string());
                };
                let Some(line) = args.get("line_number").and_then(|v| v.as_u64()) else {
                    return err("Missing line_number".to_string());
                };
                let context = args
                    .get("context_lines")
                    .and_then(|v| v.as_u64())
                    .map(|n| usize::try_from(n).unwrap_or(usize::MAX));
                match render_file_view(&PathBuf::from(p), line as usize, context) {
                    Ok(s) => ok(s),
                    Err(e) => err(format!("{e:#}")),
                }
            }
            "find_help" => {
                let Some(stem) = args.get("stem").and_then(|v| v.as_str()) else {
                    return err("Missing stem".to_string());
                };
                let Some(dir) = args.get("directory").and_then(|v| v.as_str()) else {
                    return err("Missing directory".to_string());
                };
                match find_help(stem, &PathBuf::from(dir), &self.cfg.extensions) {
                    Some(p) => ok(p.to_string_lossy().to_string()),
                    None => ok(format!("No help document for `{stem}` in {dir}")),
                }
            }
            _ => err(format!("Tool not found: {name}")),
        }
    }

    /// Answer one JSON-RPC message; `None` for notifications.
    pub fn handle_message(&self, msg: &serde_json::Value) -> Option<serde_json::Value> {
        // Notifications carry no "id" and get no reply.
        let id = msg.get("id").cloned()?;
        let method = msg.get("method").and_then(|m| m.as_str()).unwrap_or("");

        let reply = match method {
            "initialize" => json!({
                "jsonrpc": "2.0",
                "id": id,
                "result": {
                    "protocolVersion": msg.get("params").and_then(|p| p.get("protocolVersion")).cloned().unwrap_or(json!("2024-11-05")),
                    "capabilities": { "tools": { "listChanged": false } },
                    "serverInfo": { "name": "hslfind", "version": env!("CARGO_PKG_VERSION") }
                }
            }),
            "ping" => json!({
                "jsonrpc": "2.0",
                "id": id,
                "result": {}
            }),
            "tools/list" => self.tool_list(id),
            "tools/call" => {
                let params = msg.get("params").cloned().unwrap_or(json!({}));
                self.tool_call(id, &params)
            }
            // No resources or prompts are served.
            "resources/list" => json!({
                "jsonrpc": "2.0",
                "id": id,
                "result": { "resources": [] }
            }),
            "prompts/list" => json!({
                "jsonrpc": "2.0",
                "id": id,
                "result": { "prompts": [] }
            }),
            _ => json!({
                "jsonrpc": "2.0",
                "id": id,
                "error": { "code": -32601, "message": format!("Method not found: {method}") }
            }),
        };

        Some(reply)
    }
}

pub fn run_stdio_server(cfg: Config) -> Result<()> {
    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();

    let server = Server::new(cfg);
    tracing::info!("stdio server ready");

    for line in stdin.lock().lines() {
        let Ok(line) = line else { continue };
        if line.trim().is_empty() {
            continue;
        }

        let msg: serde_json::Value = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(error = %e, "dropping malformed message");
                continue;
            }
        };

        let Some(reply) = server.handle_message(&msg) else {
            continue;
        };

        writeln!(stdout, "{}", reply)?;
        stdout.flush()?;
    }

    Ok(())
}
