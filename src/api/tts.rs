//! TTS 语音合成客户端
//!
//! 给定目标语言文本，换取可播放的音频字节；播放本身由 UI 层负责。

use bytes::Bytes;

use super::{build_client, post_with_retry, ApiConfig, ApiError};

pub struct TtsClient {
    config: ApiConfig,
    client: reqwest::Client,
}

impl TtsClient {
    pub fn new(config: ApiConfig) -> Self {
        let client = build_client(&config);
        Self { config, client }
    }

    pub fn from_env() -> Self {
        Self::new(ApiConfig::from_env())
    }

    /// 合成音频
    ///
    /// 返回 `audio/*` 字节流；其他 content-type 视为协议错误。
    pub async fn synthesize(&self, text: &str) -> Result<Bytes, ApiError> {
        let url = self.config.endpoint("api/tts");
        let payload = serde_json::json!({ "text": text });

        let resp = post_with_retry(&self.client, &url, &payload).await?;

        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        if !content_type.starts_with("audio/") {
            return Err(ApiError::UnexpectedContentType(content_type));
        }

        Ok(resp.bytes().await?)
    }
}
