//! AI mentor routes. Each handler builds a [`Prompt`] and hands it to the
//! configured [`TextGenerator`](crate::provider::TextGenerator).
//!
//! | Method | Path | Body | Response |
//! |--------|------|------|----------|
//! | `POST` | `/ai/chat` | `{message, history?}` | `{response}` |
//! | `POST` | `/ai/explain` | `{code, language?}` | `{explanation}` |
//! | `POST` | `/ai/debug` | `{code, error?, language?}` | `{solution}` |
//! | `POST` | `/ai/quiz` | `{topic, difficulty?}` | [`Quiz`] |

use std::sync::Arc;

use axum::{Json, extract::State};
use questline_core::{catalog::Difficulty, store::Store};
use serde::{Deserialize, Serialize};

use crate::{
  AppState,
  auth::CurrentUser,
  error::ApiError,
  provider::{Prompt, ProviderError, Role, TextGenerator, Turn},
};

/// Older turns beyond this are dropped from the prompt.
pub const MAX_HISTORY_TURNS: usize = 20;

const MENTOR_SYSTEM: &str = "You are a friendly programming mentor on a gamified learning \
                             platform. Keep answers short, concrete and encouraging.";
const EXPLAIN_SYSTEM: &str = "You explain source code to learners. Walk through what the code \
                              does step by step, then summarise it in one sentence.";
const DEBUG_SYSTEM: &str = "You help learners debug. Identify the most likely bug, explain why \
                            it happens and show a corrected version of the code.";
const QUIZ_SYSTEM: &str = "You write multiple-choice quiz questions. Reply with a single JSON \
                           object and nothing else, shaped as {\"question\": string, \
                           \"options\": [string], \"correctAnswer\": number (zero-based index \
                           into options), \"explanation\": string}.";

// ─── Bodies ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ChatBody {
  pub message: String,
  #[serde(default)]
  pub history: Vec<Turn>,
}

#[derive(Debug, Deserialize)]
pub struct ExplainBody {
  pub code:     String,
  pub language: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DebugBody {
  pub code:     String,
  pub error:    Option<String>,
  pub language: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct QuizBody {
  pub topic:      String,
  pub difficulty: Option<Difficulty>,
}

#[derive(Debug, Serialize)]
pub struct ChatReply {
  pub response: String,
}

#[derive(Debug, Serialize)]
pub struct Explanation {
  pub explanation: String,
}

#[derive(Debug, Serialize)]
pub struct Solution {
  pub solution: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quiz {
  pub question:       String,
  pub options:        Vec<String>,
  pub correct_answer: usize,
  pub explanation:    String,
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

fn generator<S>(state: &AppState<S>) -> Result<Arc<dyn TextGenerator>, ApiError> {
  state
    .ai
    .clone()
    .ok_or_else(|| ApiError::Unavailable("AI provider is not configured".into()))
}

async fn run<S>(state: &AppState<S>, route: &str, prompt: Prompt) -> Result<String, ApiError> {
  let ai = generator(state)?;
  ai.generate(prompt).await.map_err(|e| {
    tracing::warn!(route, error = %e, "AI provider request failed");
    ApiError::Upstream(e)
  })
}

fn require(field: &str, value: &str) -> Result<(), ApiError> {
  if value.trim().is_empty() {
    return Err(ApiError::BadRequest(format!("{field} must not be empty")));
  }
  Ok(())
}

fn fenced(code: &str, language: Option<&str>) -> String {
  format!("```{}\n{}\n```", language.unwrap_or_default(), code)
}

/// Parse a generated quiz, tolerating a surrounding Markdown code fence.
pub fn parse_quiz(raw: &str) -> Result<Quiz, ProviderError> {
  let trimmed = raw.trim();
  let body = trimmed
    .strip_prefix("```")
    .map(|rest| {
      let rest = rest.strip_prefix("json").unwrap_or(rest);
      rest.strip_suffix("```").unwrap_or(rest)
    })
    .unwrap_or(trimmed)
    .trim();

  let quiz: Quiz = serde_json::from_str(body)
    .map_err(|e| ProviderError::Malformed(format!("quiz is not valid JSON: {e}")))?;
  if quiz.options.len() < 2 {
    return Err(ProviderError::Malformed("quiz needs at least two options".into()));
  }
  if quiz.correct_answer >= quiz.options.len() {
    return Err(ProviderError::Malformed(format!(
      "correct answer {} is out of range for {} options",
      quiz.correct_answer,
      quiz.options.len()
    )));
  }
  Ok(quiz)
}

// ─── Handlers ────────────────────────────────────────────────────────────────

/// `POST /ai/chat`
pub async fn chat<S>(
  State(state): State<AppState<S>>,
  _current: CurrentUser,
  Json(body): Json<ChatBody>,
) -> Result<Json<ChatReply>, ApiError>
where
  S: Store + 'static,
{
  require("message", &body.message)?;
  let skip = body.history.len().saturating_sub(MAX_HISTORY_TURNS);
  let mut turns: Vec<Turn> = body.history.into_iter().skip(skip).collect();
  turns.push(Turn { role: Role::User, content: body.message });

  let prompt = Prompt { system: MENTOR_SYSTEM.into(), turns };
  let response = run(&state, "chat", prompt).await?;
  Ok(Json(ChatReply { response }))
}

/// `POST /ai/explain`
pub async fn explain<S>(
  State(state): State<AppState<S>>,
  _current: CurrentUser,
  Json(body): Json<ExplainBody>,
) -> Result<Json<Explanation>, ApiError>
where
  S: Store + 'static,
{
  require("code", &body.code)?;
  let user = format!(
    "Explain this code:\n\n{}",
    fenced(&body.code, body.language.as_deref())
  );
  let explanation = run(&state, "explain", Prompt::single(EXPLAIN_SYSTEM, user)).await?;
  Ok(Json(Explanation { explanation }))
}

/// `POST /ai/debug`
pub async fn debug<S>(
  State(state): State<AppState<S>>,
  _current: CurrentUser,
  Json(body): Json<DebugBody>,
) -> Result<Json<Solution>, ApiError>
where
  S: Store + 'static,
{
  require("code", &body.code)?;
  let mut user = format!(
    "Find the bug in this code:\n\n{}",
    fenced(&body.code, body.language.as_deref())
  );
  if let Some(error) = body.error.as_deref().filter(|e| !e.trim().is_empty()) {
    user.push_str("\n\nIt fails with:\n");
    user.push_str(error);
  }
  let solution = run(&state, "debug", Prompt::single(DEBUG_SYSTEM, user)).await?;
  Ok(Json(Solution { solution }))
}

/// `POST /ai/quiz`
pub async fn quiz<S>(
  State(state): State<AppState<S>>,
  _current: CurrentUser,
  Json(body): Json<QuizBody>,
) -> Result<Json<Quiz>, ApiError>
where
  S: Store + 'static,
{
  require("topic", &body.topic)?;
  let difficulty = body.difficulty.unwrap_or(Difficulty::Beginner);
  let user = format!("Write one {difficulty} question about {}.", body.topic.trim());
  let raw = run(&state, "quiz", Prompt::single(QUIZ_SYSTEM, user)).await?;
  let quiz = parse_quiz(&raw).map_err(|e| {
    tracing::warn!(error = %e, "AI provider returned an unusable quiz");
    ApiError::Upstream(e)
  })?;
  Ok(Json(quiz))
}
