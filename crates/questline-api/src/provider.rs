//! Text generation backends for the AI mentor routes.
//!
//! [`TextGenerator`] is object-safe so the server can choose an
//! implementation at runtime (or none at all). [`OpenAiCompatible`] speaks the
//! chat-completions protocol offered by most hosted and local model servers.

use std::{future::Future, pin::Pin, time::Duration};

use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

#[derive(Debug, Error)]
pub enum ProviderError {
  #[error("request failed: {0}")]
  Http(#[from] reqwest::Error),

  #[error("provider returned {status}: {body}")]
  Status { status: u16, body: String },

  #[error("malformed provider response: {0}")]
  Malformed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  User,
  Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
  pub role:    Role,
  pub content: String,
}

/// A system instruction followed by the conversation so far.
#[derive(Debug, Clone)]
pub struct Prompt {
  pub system: String,
  pub turns:  Vec<Turn>,
}

impl Prompt {
  pub fn single(system: impl Into<String>, user: impl Into<String>) -> Self {
    Self {
      system: system.into(),
      turns:  vec![Turn { role: Role::User, content: user.into() }],
    }
  }
}

pub trait TextGenerator: Send + Sync {
  fn generate<'a>(&'a self, prompt: Prompt) -> BoxFuture<'a, Result<String, ProviderError>>;
}

// ─── OpenAI-compatible ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct AiConfig {
  /// e.g. `https://api.openai.com/v1`
  pub base_url:     String,
  pub api_key:      String,
  pub model:        String,
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 { 30 }

/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct OpenAiCompatible {
  client: Client,
  config: AiConfig,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
  model:    &'a str,
  messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
  role:    &'a str,
  content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
  choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
  message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
  content: Option<String>,
}

impl OpenAiCompatible {
  pub fn new(config: AiConfig) -> Result<Self, ProviderError> {
    let client = Client::builder()
      .timeout(Duration::from_secs(config.timeout_secs))
      .build()?;
    Ok(Self { client, config })
  }

  fn url(&self) -> String {
    format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
  }

  async fn complete(&self, prompt: Prompt) -> Result<String, ProviderError> {
    let mut messages = vec![ChatMessage { role: "system", content: &prompt.system }];
    messages.extend(prompt.turns.iter().map(|turn| ChatMessage {
      role:    match turn.role {
        Role::User => "user",
        Role::Assistant => "assistant",
      },
      content: &turn.content,
    }));
    let body = ChatRequest { model: &self.config.model, messages };

    let resp = self
      .client
      .post(self.url())
      .bearer_auth(&self.config.api_key)
      .json(&body)
      .send()
      .await?;

    let status = resp.status();
    if !status.is_success() {
      let body = resp.text().await.unwrap_or_default();
      return Err(ProviderError::Status { status: status.as_u16(), body });
    }

    let parsed: ChatResponse = resp.json().await?;
    parsed
      .choices
      .into_iter()
      .next()
      .and_then(|choice| choice.message.content)
      .filter(|content| !content.trim().is_empty())
      .ok_or_else(|| ProviderError::Malformed("response contained no message".into()))
  }
}

impl TextGenerator for OpenAiCompatible {
  fn generate<'a>(&'a self, prompt: Prompt) -> BoxFuture<'a, Result<String, ProviderError>> {
    Box::pin(self.complete(prompt))
  }
}
