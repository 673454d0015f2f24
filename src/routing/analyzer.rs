//! Derives a [`RequestDescriptor`] from a messages-style request body.
//!
//! Content blocks are a tagged union keyed by their `type` field; shapes the
//! analyzer does not know deserialize to [`ContentBlock::Unrecognized`] and
//! contribute nothing to the estimate.

use serde::{Deserialize, Serialize};
use tiktoken_rs::CoreBPE;

use super::RequestDescriptor;
use crate::config::ConfigSnapshot;

/// Minimal view of an inbound messages request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RouteRequest {
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<MessageContent>,
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thinking: Option<ThinkingConfig>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: MessageContent,
}

/// Either a bare string or a list of typed blocks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Blocks(Vec<ContentBlock>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text {
        text: String,
    },
    ToolUse {
        #[serde(default)]
        id: String,
        name: String,
        #[serde(default)]
        input: serde_json::Value,
    },
    ToolResult {
        #[serde(default)]
        tool_use_id: String,
        #[serde(default)]
        content: serde_json::Value,
    },
    Thinking {
        #[serde(default)]
        thinking: String,
    },
    Image {
        #[serde(default)]
        source: serde_json::Value,
    },
    #[serde(other)]
    Unrecognized,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThinkingConfig {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget_tokens: Option<u64>,
}

impl ThinkingConfig {
    pub fn is_enabled(&self) -> bool {
        self.kind.eq_ignore_ascii_case("enabled")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

impl ToolSpec {
    pub fn is_web_search(&self) -> bool {
        self.name.starts_with("web_search")
            || self
                .kind
                .as_deref()
                .is_some_and(|kind| kind.starts_with("web_search"))
    }
}

/// Builds descriptors; holds the BPE encoder, which is costly to construct.
pub struct RequestAnalyzer {
    encoder: Option<CoreBPE>,
}

impl RequestAnalyzer {
    /// Uses `cl100k_base`, falling back to a character heuristic when the
    /// encoder cannot be built.
    pub fn new() -> Self {
        let encoder = match tiktoken_rs::cl100k_base() {
            Ok(encoder) => Some(encoder),
            Err(e) => {
                tracing::warn!(error = %e, "cl100k_base unavailable, using heuristic token counts");
                None
            }
        };
        Self { encoder }
    }

    /// Character heuristic only (roughly four characters per token).
    pub fn heuristic() -> Self {
        Self { encoder: None }
    }

    pub fn count_tokens(&self, text: &str) -> u64 {
        match &self.encoder {
            Some(encoder) => encoder.encode_with_special_tokens(text).len() as u64,
            None => (text.chars().count() as u64).div_ceil(4),
        }
    }

    pub fn analyze(&self, request: &RouteRequest, snapshot: &ConfigSnapshot) -> RequestDescriptor {
        let mut tokens = 0u64;
        if let Some(system) = &request.system {
            tokens += self.count_content(system);
        }
        for message in &request.messages {
            tokens += self.count_content(&message.content);
        }

        RequestDescriptor {
            estimated_context_size: i64::try_from(tokens).unwrap_or(i64::MAX),
            requested_model: request.model.clone(),
            thinking_requested: request.thinking.as_ref().is_some_and(ThinkingConfig::is_enabled),
            web_search_requested: request.tools.iter().any(ToolSpec::is_web_search),
            is_background: snapshot.is_background_model(&request.model),
        }
    }

    fn count_content(&self, content: &MessageContent) -> u64 {
        match content {
            MessageContent::Text(text) => self.count_tokens(text),
            MessageContent::Blocks(blocks) => blocks.iter().map(|b| self.count_block(b)).sum(),
        }
    }

    fn count_block(&self, block: &ContentBlock) -> u64 {
        match block {
            ContentBlock::Text { text } => self.count_tokens(text),
            ContentBlock::Thinking { thinking } => self.count_tokens(thinking),
            ContentBlock::ToolUse { name, input, .. } => {
                self.count_tokens(name) + self.count_json(input)
            }
            ContentBlock::ToolResult { content, .. } => self.count_json(content),
            ContentBlock::Image { .. } | ContentBlock::Unrecognized => 0,
        }
    }

    fn count_json(&self, value: &serde_json::Value) -> u64 {
        match value {
            serde_json::Value::Null => 0,
            serde_json::Value::String(s) => self.count_tokens(s),
            other => self.count_tokens(&other.to_string()),
        }
    }
}

impl Default for RequestAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}
