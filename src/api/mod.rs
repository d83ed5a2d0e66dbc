//! 后端协作方客户端
//!
//! TTS 与对话生成都是简单的请求/响应外部协作方，不属于进度核心的
//! 状态机。网络失败以可重试错误的形式返回调用方，绝不触碰进度存储；
//! 迟到的响应只要不经 `StoreHandle::dispatch` 派发就不会产生任何
//! 状态影响，单写者性质由此保持。

pub mod conversation;
pub mod tts;

pub use conversation::{Conversation, ConversationClient, ConversationTurn};
pub use tts::TtsClient;

use std::time::Duration;

use log::warn;
use thiserror::Error;
use tokio::time::sleep;

const DEFAULT_BASE_URL: &str = "http://localhost:3000";
const DEFAULT_TIMEOUT_MS: u64 = 15_000;
const MAX_RETRIES: usize = 3;
const BASE_BACKOFF_MS: u64 = 200;

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl ApiConfig {
    pub fn from_env() -> Self {
        let base_url = env_string("DANCI_API_BASE_URL")
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let timeout =
            Duration::from_millis(env_u64("DANCI_API_TIMEOUT").unwrap_or(DEFAULT_TIMEOUT_MS));
        Self {
            base_url: base_url.trim().trim_end_matches('/').to_string(),
            timeout,
        }
    }

    pub fn with_base_url<S: Into<String>>(base_url: S) -> Self {
        Self {
            base_url: base_url.into().trim().trim_end_matches('/').to_string(),
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("HTTP {status}: {body}")]
    HttpStatus {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("JSON decode failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unexpected content type: {0}")]
    UnexpectedContentType(String),
    #[error("empty conversation")]
    EmptyConversation,
    #[error("retries exhausted")]
    RetriesExhausted,
}

pub(crate) fn build_client(config: &ApiConfig) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(config.timeout)
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

pub(crate) async fn post_with_retry(
    client: &reqwest::Client,
    url: &str,
    payload: &serde_json::Value,
) -> Result<reqwest::Response, ApiError> {
    let mut last_error: Option<ApiError> = None;

    for retry in 0..=MAX_RETRIES {
        match client.post(url).json(payload).send().await {
            Ok(resp) => {
                let status = resp.status();
                if status.is_success() {
                    return Ok(resp);
                }
                let body = resp.text().await.unwrap_or_default();
                let err = ApiError::HttpStatus { status, body };
                if retry < MAX_RETRIES && is_retryable(status) {
                    let backoff = Duration::from_millis(BASE_BACKOFF_MS * (1 << retry));
                    warn!("backend request failed with {status}, retry {retry}");
                    sleep(backoff).await;
                    last_error = Some(err);
                    continue;
                }
                return Err(err);
            }
            Err(e) => {
                let err = ApiError::Request(e);
                if retry < MAX_RETRIES {
                    let backoff = Duration::from_millis(BASE_BACKOFF_MS * (1 << retry));
                    warn!("backend request error, retry {retry}");
                    sleep(backoff).await;
                    last_error = Some(err);
                    continue;
                }
                return Err(err);
            }
        }
    }

    Err(last_error.unwrap_or(ApiError::RetriesExhausted))
}

fn is_retryable(status: reqwest::StatusCode) -> bool {
    status == reqwest::StatusCode::TOO_MANY_REQUESTS
        || status == reqwest::StatusCode::REQUEST_TIMEOUT
        || status.is_server_error()
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_u64(key: &str) -> Option<u64> {
    env_string(key)?.parse().ok()
}
