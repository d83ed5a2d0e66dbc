//! 对话生成客户端
//!
//! 以单词为种子请求后端生成示例对话。单次请求/响应，结果是否派发
//! 进进度存储由调用方决定。

use serde::{Deserialize, Serialize};

use super::{build_client, post_with_retry, ApiConfig, ApiError};

/// 对话中的一轮
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationTurn {
    /// 说话人标识
    pub speaker: String,
    /// 目标语言文本
    pub text: String,
    /// 拼音
    pub pinyin: String,
    /// 译文
    pub translation: String,
    /// 本轮音频引用
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
}

/// 生成的示例对话
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Conversation {
    /// 种子单词
    pub word: Option<String>,
    /// 生成器版本
    pub generator_version: Option<String>,
    /// 有序对话轮次
    pub turns: Vec<ConversationTurn>,
}

pub struct ConversationClient {
    config: ApiConfig,
    client: reqwest::Client,
}

impl ConversationClient {
    pub fn new(config: ApiConfig) -> Self {
        let client = build_client(&config);
        Self { config, client }
    }

    pub fn from_env() -> Self {
        Self::new(ApiConfig::from_env())
    }

    /// 生成示例对话
    pub async fn generate(
        &self,
        word: &str,
        generator_version: &str,
    ) -> Result<Conversation, ApiError> {
        let url = self.config.endpoint("api/conversation");
        let payload = serde_json::json!({
            "word": word,
            "generatorVersion": generator_version,
        });

        let resp = post_with_retry(&self.client, &url, &payload).await?;
        let conversation: Conversation = resp.json().await?;
        if conversation.turns.is_empty() {
            return Err(ApiError::EmptyConversation);
        }
        Ok(conversation)
    }
}
