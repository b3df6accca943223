//! 文本生成服务: 将浪费汇总改写为简短的自然语言报告。

use crate::config::SummarizerConfig;
use crate::models::WasteSummary;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(thiserror::Error, Debug)]
pub enum SummarizerError {
    /// 未配置 API key
    #[error("text generation is not configured (GEMINI_API_KEY missing)")]
    NotConfigured,
    #[error("text generation request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("text generation service returned {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("text generation service returned no text")]
    EmptyResponse,
}

/// 文本生成接口
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, SummarizerError>;
}

/// 构造提示词, 汇总数据以 JSON 形式嵌入
pub fn build_prompt(summary: &WasteSummary) -> String {
    let data = serde_json::to_string(summary).unwrap_or_else(|_| format!("{:?}", summary));
    format!(
        "In not more than 6 lines (not including lists): \
         Given this food waste data where each item has 'leftovers', \
         'wasted', and 'total_waste' (leftovers + wasted), \
         {data}, identify the major contributor to total waste \
         and approximate its percentage of overall waste. \
         Briefly compare leftovers vs explicit wasted portions and \
         recommend a short list of similar foods to the items with the \
         lowest total waste that could be emphasized more. \
         Return the response cleanly in markdown."
    )
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl GenerateResponse {
    /// 第一个候选的所有文本片段拼接
    fn into_text(self) -> Option<String> {
        let content = self.candidates.into_iter().next()?.content?;
        let text: String = content.parts.into_iter().filter_map(|p| p.text).collect();
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

/// Gemini generateContent 客户端
pub struct GeminiClient {
    client: Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl GeminiClient {
    pub fn new(client: Client, config: &SummarizerConfig) -> Self {
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
        }
    }

    /// 按配置构建带超时的 HTTP 客户端
    pub fn from_config(config: &SummarizerConfig) -> Result<Self, SummarizerError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self::new(client, config))
    }
}

#[async_trait]
impl Summarizer for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, SummarizerError> {
        let api_key = self.api_key.as_deref().ok_or(SummarizerError::NotConfigured)?;

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );
        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
        };

        let resp = self
            .client
            .post(url)
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            tracing::warn!("Text generation failed with {}", status);
            return Err(SummarizerError::Status { status, body });
        }

        let parsed: GenerateResponse = resp.json().await?;
        parsed.into_text().ok_or(SummarizerError::EmptyResponse)
    }
}
