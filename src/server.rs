//! Line-delimited JSON-RPC 2.0 tool server speaking the MCP `initialize`, `ping`, `tools/list`
//! and `tools/call` methods.
//!
//! Requests are read one per line. Every `tools/call` runs on its own task so a slow portal
//! call never blocks the reader; responses are funneled through a single writer task and may
//! therefore arrive out of request order. Messages without an `id` are notifications and are
//! never answered.

// std
use std::io::Result as IoResult;
// crates.io
use serde_json::json;
use tokio::{
	io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader},
	sync::mpsc::{self, UnboundedSender},
	task::JoinSet,
};
// self
use crate::{_prelude::*, portal::AcademicClient, tools};

/// MCP protocol revision reported by `initialize`.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// JSON-RPC error codes used by the server.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RpcErrorCode {
	/// Line is not valid JSON.
	ParseError,
	/// JSON is not a JSON-RPC request.
	InvalidRequest,
	/// Method is not supported.
	MethodNotFound,
	/// Parameters are missing or malformed.
	InvalidParams,
}
impl RpcErrorCode {
	/// Numeric JSON-RPC code.
	pub const fn code(self) -> i64 {
		match self {
			RpcErrorCode::ParseError => -32700,
			RpcErrorCode::InvalidRequest => -32600,
			RpcErrorCode::MethodNotFound => -32601,
			RpcErrorCode::InvalidParams => -32602,
		}
	}
}

#[derive(Debug)]
enum Dispatch {
	Reply(Value),
	Call { id: Value, name: String, arguments: Value },
	Ignore,
}

/// Serves tool calls on the process's stdin/stdout until stdin closes.
pub async fn serve_stdio(client: Arc<AcademicClient>) -> IoResult<()> {
	serve(client, tokio::io::stdin(), tokio::io::stdout()).await
}

/// Serves tool calls read from `reader`, writing responses to `writer`, until `reader` ends.
///
/// In-flight tool calls are awaited before returning.
pub async fn serve<R, W>(client: Arc<AcademicClient>, reader: R, writer: W) -> IoResult<()>
where
	R: AsyncRead + Unpin,
	W: 'static + AsyncWrite + Unpin + Send,
{
	let (tx, rx) = mpsc::unbounded_channel::<Value>();
	let writer_task = tokio::spawn(write_responses(writer, rx));
	let mut lines = BufReader::new(reader).lines();
	let mut calls = JoinSet::new();

	#[cfg(feature = "tracing")]
	tracing::info!(protocol = PROTOCOL_VERSION, "Tool server is listening on stdio.");

	while let Some(line) = lines.next_line().await? {
		if line.trim().is_empty() {
			continue;
		}

		match route(&line) {
			Dispatch::Reply(response) => respond(&tx, response),
			Dispatch::Call { id, name, arguments } => {
				let client = client.clone();
				let tx = tx.clone();

				calls.spawn(async move {
					let outcome = tools::dispatch(&client, &name, arguments).await;

					#[cfg(feature = "tracing")]
					{
						if let Err(err) = &outcome {
							tracing::warn!(tool = %name, kind = %err.kind(), "Tool call failed: {err}");
						}
					}

					respond(&tx, success(id, tools::call_result(outcome)));
				});
			},
			Dispatch::Ignore => {},
		}

		while calls.try_join_next().is_some() {}
	}

	while calls.join_next().await.is_some() {}

	drop(tx);

	writer_task.await.map_err(std::io::Error::other)?
}

async fn write_responses<W>(mut writer: W, mut rx: mpsc::UnboundedReceiver<Value>) -> IoResult<()>
where
	W: AsyncWrite + Unpin,
{
	while let Some(response) = rx.recv().await {
		let mut line = response.to_string();

		line.push('\n');
		writer.write_all(line.as_bytes()).await?;
		writer.flush().await?;
	}

	writer.shutdown().await
}

fn respond(tx: &UnboundedSender<Value>, response: Value) {
	if tx.send(response).is_err() {
		#[cfg(feature = "tracing")]
		tracing::warn!("Response writer is gone; dropping a response.");
	}
}

fn route(line: &str) -> Dispatch {
	let message = match serde_json::from_str::<Value>(line) {
		Ok(message) => message,
		Err(e) => return Dispatch::Reply(failure(Value::Null, RpcErrorCode::ParseError, e.to_string())),
	};
	let Some(object) = message.as_object() else {
		return Dispatch::Reply(failure(
			Value::Null,
			RpcErrorCode::InvalidRequest,
			"expected a JSON object".into(),
		));
	};
	let id = object.get("id").cloned();
	let Some(method) = object.get("method").and_then(Value::as_str) else {
		return match id {
			Some(id) => Dispatch::Reply(failure(
				id,
				RpcErrorCode::InvalidRequest,
				"missing method".into(),
			)),
			None => Dispatch::Ignore,
		};
	};
	// Notifications (`notifications/initialized`, `notifications/cancelled`, ...) get no reply.
	let Some(id) = id else {
		return Dispatch::Ignore;
	};
	let params = object.get("params").cloned().unwrap_or(Value::Null);

	#[cfg(feature = "tracing")]
	tracing::debug!(method, "Handling request.");

	match method {
		"initialize" => Dispatch::Reply(success(
			id,
			json!({
				"protocolVersion": PROTOCOL_VERSION,
				"capabilities": { "tools": { "listChanged": false } },
				"serverInfo": {
					"name": env!("CARGO_PKG_NAME"),
					"version": env!("CARGO_PKG_VERSION"),
				},
			}),
		)),
		"ping" => Dispatch::Reply(success(id, json!({}))),
		"tools/list" => Dispatch::Reply(success(id, json!({ "tools": tools::tool_specs() }))),
		"tools/call" => {
			let name = params.get("name").and_then(Value::as_str).map(str::to_owned);
			let Some(name) = name else {
				return Dispatch::Reply(failure(
					id,
					RpcErrorCode::InvalidParams,
					"tools/call requires a string `name`".into(),
				));
			};
			let arguments = params.get("arguments").cloned().unwrap_or(Value::Null);

			Dispatch::Call { id, name, arguments }
		},
		other => Dispatch::Reply(failure(
			id,
			RpcErrorCode::MethodNotFound,
			format!("method `{other}` is not supported"),
		)),
	}
}

fn success(id: Value, result: Value) -> Value {
	json!({ "jsonrpc": "2.0", "id": id, "result": result })
}

fn failure(id: Value, code: RpcErrorCode, message: String) -> Value {
	json!({ "jsonrpc": "2.0", "id": id, "error": { "code": code.code(), "message": message } })
}

#[cfg(test)]
mod tests {
	// crates.io
	use tokio::io::AsyncReadExt;
	// self
	use super::*;
	use crate::_preludet::*;

	async fn exchange(input: &str) -> Vec<Value> {
		let (client, _http) = scripted_client();
		let (writer, mut output) = tokio::io::duplex(64 * 1024);

		serve(Arc::new(client), input.as_bytes(), writer).await.expect("Server should exit cleanly.");

		let mut text = String::new();

		output.read_to_string(&mut text).await.expect("Output should be readable.");

		text.lines()
			.map(|line| serde_json::from_str(line).expect("Every response should be JSON."))
			.collect()
	}

	fn by_id(responses: &[Value], id: i64) -> &Value {
		responses.iter().find(|r| r["id"] == id).expect("Response with the id should exist.")
	}

	#[tokio::test]
	async fn lifecycle_and_listing() {
		let responses = exchange(concat!(
			r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#,
			"\n",
			r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
			"\n",
			r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#,
			"\n",
			r#"{"jsonrpc":"2.0","id":3,"method":"ping"}"#,
			"\n",
		))
		.await;

		assert_eq!(responses.len(), 3);
		assert_eq!(by_id(&responses, 1)["result"]["protocolVersion"], PROTOCOL_VERSION);
		assert_eq!(
			by_id(&responses, 2)["result"]["tools"].as_array().map(Vec::len),
			Some(tools::Tool::ALL.len())
		);
		assert_eq!(by_id(&responses, 3)["result"], json!({}));
	}

	#[tokio::test]
	async fn framing_errors_use_standard_codes() {
		let responses = exchange(concat!(
			"{not json\n",
			r#"[1,2]"#,
			"\n",
			r#"{"jsonrpc":"2.0","id":4,"method":"resources/list"}"#,
			"\n",
			r#"{"jsonrpc":"2.0","id":5,"method":"tools/call","params":{}}"#,
			"\n",
		))
		.await;
		let codes = responses.iter().map(|r| r["error"]["code"].as_i64()).collect::<Vec<_>>();

		assert!(codes.contains(&Some(-32700)));
		assert!(codes.contains(&Some(-32600)));
		assert_eq!(by_id(&responses, 4)["error"]["code"], -32601);
		assert_eq!(by_id(&responses, 5)["error"]["code"], -32602);
	}

	#[tokio::test]
	async fn tool_failures_are_tool_results() {
		let responses = exchange(concat!(
			r#"{"jsonrpc":"2.0","id":6,"method":"tools/call","params":{"name":"get_weather"}}"#,
			"\n",
			r#"{"jsonrpc":"2.0","id":7,"method":"tools/call","params":{"name":"health_check","arguments":{}}}"#,
			"\n",
		))
		.await;
		let unknown = by_id(&responses, 6);
		let health = by_id(&responses, 7);

		assert_eq!(unknown["result"]["isError"], true);
		assert_eq!(unknown["result"]["structuredContent"]["kind"], "validation");
		assert_eq!(health["result"]["isError"], false);
	}
}
