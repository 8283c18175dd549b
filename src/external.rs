// src/external.rs
use crate::config::Config;
use crate::knowledge::{KnowledgeStore, truncate_chars};
use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const SYSTEM_PROMPT: &str = "Ты умный помощник. Отвечай кратко и по-русски.";
const MIN_SENTENCE_CHARS: usize = 12;
const MAX_EXTRACT_CHARS: usize = 180;

/// Внешний источник ответов. Любой сбой означает "ответа нет".
#[async_trait]
pub trait ExternalAnswerSource: Send + Sync {
    async fn fetch(&self, message: &str) -> Option<String>;
}

#[derive(Clone, Debug)]
pub struct ExternalSettings {
    pub wiki_api_url: String,
    pub wiki_timeout: Duration,
    pub llm_api_url: String,
    pub llm_api_key: Option<String>,
    pub llm_model: String,
    pub llm_temperature: f32,
    pub llm_timeout: Duration,
}

impl From<&Config> for ExternalSettings {
    fn from(config: &Config) -> Self {
        Self {
            wiki_api_url: config.wiki_api_url.clone(),
            wiki_timeout: Duration::from_secs(config.wiki_timeout_secs),
            llm_api_url: config.llm_api_url.clone(),
            llm_api_key: config.llm_api_key.clone().filter(|key| !key.is_empty()),
            llm_model: config.llm_model.clone(),
            llm_temperature: config.llm_temperature,
            llm_timeout: Duration::from_secs(config.llm_timeout_secs),
        }
    }
}

#[derive(Deserialize)]
struct WikiSummary {
    extract: Option<String>,
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: [ChatCompletionMessage<'a>; 2],
    temperature: f32,
}

#[derive(Serialize)]
struct ChatCompletionMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatCompletionChoice>,
}

#[derive(Deserialize)]
struct ChatCompletionChoice {
    message: Option<ChatCompletionContent>,
}

#[derive(Deserialize)]
struct ChatCompletionContent {
    content: Option<String>,
}

/// Сначала краткая статья из энциклопедии, затем LLM.
pub struct HttpAnswerSource {
    settings: ExternalSettings,
    wiki_client: Client,
    llm_client: Client,
    knowledge: KnowledgeStore,
}

impl HttpAnswerSource {
    pub fn new(settings: ExternalSettings, knowledge: KnowledgeStore) -> Result<Self, reqwest::Error> {
        let wiki_client = Client::builder().timeout(settings.wiki_timeout).build()?;
        let llm_client = Client::builder().timeout(settings.llm_timeout).build()?;
        Ok(Self {
            settings,
            wiki_client,
            llm_client,
            knowledge,
        })
    }

    async fn encyclopedia_summary(&self, message: &str) -> Option<String> {
        let key = message.replace(' ', "_");
        let mut url = Url::parse(&self.settings.wiki_api_url).ok()?;
        url.path_segments_mut().ok()?.pop_if_empty().push(&key);

        let response = match self.wiki_client.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!("Encyclopedia lookup failed: {}", e);
                return None;
            }
        };
        if response.status() != StatusCode::OK {
            tracing::debug!("Encyclopedia lookup returned {}", response.status());
            return None;
        }
        let summary: WikiSummary = match response.json().await {
            Ok(summary) => summary,
            Err(e) => {
                tracing::debug!("Encyclopedia response is not a summary: {}", e);
                return None;
            }
        };
        summary.extract.and_then(|extract| first_sentence(&extract))
    }

    async fn generate(&self, message: &str) -> Option<String> {
        let api_key = self.settings.llm_api_key.as_deref()?;
        let url = format!(
            "{}/chat/completions",
            self.settings.llm_api_url.trim_end_matches('/')
        );
        let request = ChatCompletionRequest {
            model: &self.settings.llm_model,
            messages: [
                ChatCompletionMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatCompletionMessage {
                    role: "user",
                    content: message,
                },
            ],
            temperature: self.settings.llm_temperature,
        };

        let response = match self
            .llm_client
            .post(&url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("LLM request failed: {}", e);
                return None;
            }
        };
        if !response.status().is_success() {
            tracing::warn!("LLM request returned {}", response.status());
            return None;
        }
        let completion: ChatCompletionResponse = match response.json().await {
            Ok(completion) => completion,
            Err(e) => {
                tracing::warn!("LLM response is malformed: {}", e);
                return None;
            }
        };
        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .filter(|content| !content.trim().is_empty())
    }
}

#[async_trait]
impl ExternalAnswerSource for HttpAnswerSource {
    async fn fetch(&self, message: &str) -> Option<String> {
        if let Some(summary) = self.encyclopedia_summary(message).await {
            return Some(summary);
        }

        let answer = self.generate(message).await?;
        // Запоминаем ответ сразу; повтор той же фразы позже будет проигнорирован
        if let Err(e) = self.knowledge.learn(message, &answer).await {
            tracing::warn!("Failed to save LLM answer: {}", e);
        }
        Some(answer)
    }
}

/// Первое предложение выдержки, либо её начало, если предложение слишком короткое.
fn first_sentence(extract: &str) -> Option<String> {
    let first = extract.split(['.', '!', '?']).next().unwrap_or_default();
    let summary = if first.chars().count() > MIN_SENTENCE_CHARS {
        first.to_string()
    } else {
        truncate_chars(extract, MAX_EXTRACT_CHARS)
    };
    if summary.trim().is_empty() {
        None
    } else {
        Some(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use mockito::{Matcher, Server};

    fn settings(server_url: &str, api_key: Option<&str>) -> ExternalSettings {
        ExternalSettings {
            wiki_api_url: format!("{server_url}/page/summary"),
            wiki_timeout: Duration::from_secs(2),
            llm_api_url: format!("{server_url}/v1/openai"),
            llm_api_key: api_key.map(str::to_string),
            llm_model: "test-model".to_string(),
            llm_temperature: 0.3,
            llm_timeout: Duration::from_secs(5),
        }
    }

    async fn source(server_url: &str, api_key: Option<&str>) -> (HttpAnswerSource, KnowledgeStore) {
        let knowledge = KnowledgeStore::new(db::test_pool().await);
        let source = HttpAnswerSource::new(settings(server_url, api_key), knowledge.clone()).unwrap();
        (source, knowledge)
    }

    #[test]
    fn long_first_sentence_is_used() {
        assert_eq!(
            first_sentence("Rust is a systems language. It is fast.").as_deref(),
            Some("Rust is a systems language")
        );
    }

    #[test]
    fn short_first_sentence_falls_back_to_prefix() {
        let extract = format!("Short one. {}", "x".repeat(300));
        let summary = first_sentence(&extract).unwrap();
        assert_eq!(summary.chars().count(), MAX_EXTRACT_CHARS);
        assert!(summary.starts_with("Short one."));
    }

    #[test]
    fn empty_extract_is_no_result() {
        assert_eq!(first_sentence(""), None);
    }

    #[tokio::test]
    async fn encyclopedia_hit_skips_llm() {
        let mut server = Server::new_async().await;
        let wiki = server
            .mock("GET", "/page/summary/Rust_language")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"extract": "Rust is a multi-paradigm language. More text."}"#)
            .create_async()
            .await;
        let llm = server
            .mock("POST", "/v1/openai/chat/completions")
            .expect(0)
            .create_async()
            .await;

        let (source, knowledge) = source(&server.url(), Some("key")).await;
        let answer = source.fetch("Rust language").await;

        assert_eq!(answer.as_deref(), Some("Rust is a multi-paradigm language"));
        assert_eq!(knowledge.count().await.unwrap(), 0);
        wiki.assert_async().await;
        llm.assert_async().await;
    }

    #[tokio::test]
    async fn missing_article_falls_through_to_llm_and_learns() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/page/summary/unknown_thing")
            .with_status(404)
            .create_async()
            .await;
        let llm = server
            .mock("POST", "/v1/openai/chat/completions")
            .match_header("authorization", "Bearer key")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "model": "test-model",
                "messages": [
                    {"role": "system", "content": SYSTEM_PROMPT},
                    {"role": "user", "content": "unknown thing"}
                ]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"choices": [{"message": {"role": "assistant", "content": "Generated"}}]}"#)
            .create_async()
            .await;

        let (source, knowledge) = source(&server.url(), Some("key")).await;
        let answer = source.fetch("unknown thing").await;

        assert_eq!(answer.as_deref(), Some("Generated"));
        assert_eq!(
            knowledge.lookup("unknown thing").await.unwrap().as_deref(),
            Some("Generated")
        );
        llm.assert_async().await;
    }

    #[tokio::test]
    async fn no_api_key_means_no_llm_call() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/page/summary/nothing")
            .with_status(404)
            .create_async()
            .await;
        let llm = server
            .mock("POST", "/v1/openai/chat/completions")
            .expect(0)
            .create_async()
            .await;

        let (source, _) = source(&server.url(), None).await;
        assert_eq!(source.fetch("nothing").await, None);
        llm.assert_async().await;
    }

    #[tokio::test]
    async fn malformed_llm_response_is_no_result() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/page/summary/broken")
            .with_status(200)
            .with_body("not json")
            .create_async()
            .await;
        server
            .mock("POST", "/v1/openai/chat/completions")
            .with_status(200)
            .with_body(r#"{"error": "quota"}"#)
            .create_async()
            .await;

        let (source, knowledge) = source(&server.url(), Some("key")).await;
        assert_eq!(source.fetch("broken").await, None);
        assert_eq!(knowledge.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn silent_upstream_times_out() {
        // Принимает соединения и никогда не отвечает
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut open = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                open.push(socket);
            }
        });

        let mut settings = settings(&format!("http://{addr}"), Some("key"));
        settings.wiki_timeout = Duration::from_millis(300);
        settings.llm_timeout = Duration::from_millis(300);
        let knowledge = KnowledgeStore::new(db::test_pool().await);
        let source = HttpAnswerSource::new(settings, knowledge.clone()).unwrap();

        let started = std::time::Instant::now();
        assert_eq!(source.fetch("тишина").await, None);
        assert!(started.elapsed() < Duration::from_secs(3));
        assert_eq!(knowledge.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn unreachable_upstream_is_no_result() {
        // Порт 9 (discard) на localhost обычно закрыт
        let (source, _) = source("http://127.0.0.1:9", Some("key")).await;
        assert_eq!(source.fetch("anything").await, None);
    }
}
