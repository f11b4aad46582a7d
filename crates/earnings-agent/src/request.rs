use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{AgentError, AgentResult};
use crate::AgentConfig;

pub const SYSTEM_PROMPT: &str = "You are an expert financial analyst. Analyze earnings reports and provide detailed insights on company performance, revenue, profitability, market implications, and key financial metrics. Focus on actionable investment insights. You MUST use web search";

pub const DEFAULT_PDF_PROMPT: &str = "Analyze this earnings report PDF";

/// A chat turn as the browser sends it. `content` may be a plain string or a
/// list of parts; UI clients sometimes send `parts` instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parts: Vec<Value>,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: Some(Value::String(text.into())),
            parts: Vec::new(),
        }
    }

    /// Concatenated text of the message.
    pub fn text(&self) -> String {
        fn part_texts(parts: &[Value]) -> String {
            parts
                .iter()
                .filter_map(|p| p.as_str().or_else(|| p.get("text").and_then(Value::as_str)))
                .collect::<Vec<_>>()
                .join("\n")
        }

        match &self.content {
            Some(Value::String(text)) => text.clone(),
            Some(Value::Array(parts)) => part_texts(parts),
            _ => part_texts(&self.parts),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PdfAttachment {
    pub filename: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone)]
pub enum AgentRequest {
    /// A running conversation from the chat page.
    Messages(Vec<ChatMessage>),
    /// A single prompt, optionally with an earnings report attached.
    Prompt {
        text: String,
        pdf: Option<PdfAttachment>,
    },
}

impl AgentRequest {
    /// Prompt from an upload form; blank text falls back to the stock prompt.
    pub fn upload(text: Option<String>, pdf: Option<PdfAttachment>) -> Self {
        let text = text
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_PDF_PROMPT.to_string());
        AgentRequest::Prompt { text, pdf }
    }

    /// Text of the latest user turn, for transcripts and logs.
    pub fn prompt_text(&self) -> String {
        match self {
            AgentRequest::Messages(messages) => messages
                .iter()
                .rev()
                .find(|m| m.role == "user")
                .map(ChatMessage::text)
                .unwrap_or_default(),
            AgentRequest::Prompt { text, .. } => text.clone(),
        }
    }

    fn input(&self) -> AgentResult<Value> {
        match self {
            AgentRequest::Messages(messages) => {
                let items: Vec<Value> = messages
                    .iter()
                    .filter(|m| {
                        matches!(m.role.as_str(), "user" | "assistant" | "system" | "developer")
                    })
                    .map(|m| json!({ "role": m.role, "content": m.text() }))
                    .collect();
                if items.is_empty() {
                    return Err(AgentError::InvalidRequest(
                        "messages must not be empty".to_string(),
                    ));
                }
                Ok(Value::Array(items))
            }
            AgentRequest::Prompt { text, pdf } => {
                let mut content = vec![json!({ "type": "input_text", "text": text })];
                if let Some(pdf) = pdf {
                    content.push(json!({
                        "type": "input_file",
                        "filename": pdf.filename,
                        "file_data":
                            format!("data:application/pdf;base64,{}", BASE64.encode(&pdf.bytes)),
                    }));
                }
                Ok(json!([{ "role": "user", "content": content }]))
            }
        }
    }

    /// Responses API request body.
    pub fn to_body(&self, config: &AgentConfig) -> AgentResult<Value> {
        Ok(json!({
            "model": config.model,
            "instructions": SYSTEM_PROMPT,
            "input": self.input()?,
            "reasoning": { "effort": config.reasoning_effort, "summary": "auto" },
            "tools": [{
                "type": "web_search_preview",
                "search_context_size": config.search_context_size,
            }],
        }))
    }
}
