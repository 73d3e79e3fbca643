use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use trivet_core::TriviaQuestion;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TriviaSourceError {
    #[error("trivia source request failed: {0}")]
    Transport(String),
    #[error("trivia source returned status {0}")]
    Status(u16),
    #[error("trivia source payload malformed: {0}")]
    MalformedPayload(String),
}

/// Random-question provider. Any error is fatal to the round that asked:
/// surfaced, never retried.
#[async_trait]
pub trait TriviaSource: Send + Sync {
    async fn fetch_random(&self) -> Result<TriviaQuestion, TriviaSourceError>;
}

#[async_trait]
impl<T> TriviaSource for std::sync::Arc<T>
where
    T: TriviaSource + ?Sized,
{
    async fn fetch_random(&self) -> Result<TriviaQuestion, TriviaSourceError> {
        (**self).fetch_random().await
    }
}

/// HTTP client for a jservice-style random endpoint returning a JSON array
/// of `{ category: { title }, question, answer }` objects.
pub struct HttpTriviaSource {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpTriviaSource {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self { client: reqwest::Client::new(), endpoint: endpoint.into() }
    }
}

#[async_trait]
impl TriviaSource for HttpTriviaSource {
    async fn fetch_random(&self) -> Result<TriviaQuestion, TriviaSourceError> {
        let response = self
            .client
            .get(&self.endpoint)
            .send()
            .await
            .map_err(|error| TriviaSourceError::Transport(error.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TriviaSourceError::Status(status.as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|error| TriviaSourceError::Transport(error.to_string()))?;

        parse_payload(&body)
    }
}

#[derive(Debug, Deserialize)]
struct RawQuestion {
    category: RawCategory,
    question: String,
    answer: String,
}

#[derive(Debug, Deserialize)]
struct RawCategory {
    title: String,
}

/// Takes the first element of the payload array; extra elements are
/// allowed and ignored, an empty array or blank answer is malformed.
fn parse_payload(body: &[u8]) -> Result<TriviaQuestion, TriviaSourceError> {
    let questions: Vec<RawQuestion> = serde_json::from_slice(body)
        .map_err(|error| TriviaSourceError::MalformedPayload(error.to_string()))?;

    let first = questions
        .into_iter()
        .next()
        .ok_or_else(|| TriviaSourceError::MalformedPayload("empty question list".to_owned()))?;

    if first.answer.trim().is_empty() {
        return Err(TriviaSourceError::MalformedPayload("question has a blank answer".to_owned()));
    }

    Ok(TriviaQuestion {
        category: first.category.title,
        prompt: first.question,
        raw_answer: first.answer,
    })
}
