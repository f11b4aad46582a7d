use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{AgentError, AgentResult};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Usage {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub total_tokens: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning_tokens: Option<u64>,
}

/// One hosted tool invocation the model made while answering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCall {
    pub tool_call_id: String,
    pub tool_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentReply {
    pub text: String,
    pub reasoning: Option<String>,
    pub usage: Option<Usage>,
    pub tool: Vec<ToolCall>,
}

fn joined_texts(items: Option<&Value>, kind: &str) -> Vec<String> {
    items
        .and_then(Value::as_array)
        .map(|parts| {
            parts
                .iter()
                .filter(|p| p.get("type").and_then(Value::as_str) == Some(kind))
                .filter_map(|p| p.get("text").and_then(Value::as_str))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn parse_usage(usage: &Value) -> Usage {
    let count = |v: Option<&Value>| v.and_then(Value::as_u64).unwrap_or(0);
    Usage {
        input_tokens: count(usage.get("input_tokens")),
        output_tokens: count(usage.get("output_tokens")),
        total_tokens: count(usage.get("total_tokens")),
        reasoning_tokens: usage
            .pointer("/output_tokens_details/reasoning_tokens")
            .and_then(Value::as_u64),
    }
}

/// Collect answer text, reasoning summaries, web searches and usage from a
/// Responses API payload.
pub fn parse_reply(payload: &Value) -> AgentResult<AgentReply> {
    if let Some(message) = payload.pointer("/error/message").and_then(Value::as_str) {
        return Err(AgentError::Api {
            status: 200,
            message: message.to_string(),
        });
    }

    let output = payload
        .get("output")
        .and_then(Value::as_array)
        .ok_or_else(|| AgentError::InvalidResponse("missing output items".to_string()))?;

    let mut text = Vec::new();
    let mut reasoning = Vec::new();
    let mut tool = Vec::new();

    for item in output {
        match item.get("type").and_then(Value::as_str) {
            Some("message") => text.extend(joined_texts(item.get("content"), "output_text")),
            Some("reasoning") => {
                reasoning.extend(joined_texts(item.get("summary"), "summary_text"))
            }
            Some("web_search_call") => tool.push(ToolCall {
                tool_call_id: item
                    .get("id")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                tool_name: "web_search_preview".to_string(),
                query: item
                    .pointer("/action/query")
                    .and_then(Value::as_str)
                    .map(str::to_string),
                status: item.get("status").and_then(Value::as_str).map(str::to_string),
            }),
            _ => {}
        }
    }

    Ok(AgentReply {
        text: text.join("\n\n"),
        reasoning: (!reasoning.is_empty()).then(|| reasoning.join("\n\n")),
        usage: payload.get("usage").map(parse_usage),
        tool,
    })
}
