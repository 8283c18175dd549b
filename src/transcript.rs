// src/transcript.rs
use crate::models::{ChatTranscript, Speaker};
use moka::future::Cache;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Chat,
    Support,
}

const CHANNELS: [Channel; 2] = [Channel::Chat, Channel::Support];

/// Истории диалогов по сессиям. Не сохраняются между перезапусками.
#[derive(Clone)]
pub struct TranscriptStore {
    cache: Cache<(String, Channel), ChatTranscript>,
}

impl TranscriptStore {
    pub fn new(idle_ttl: Duration) -> Self {
        Self {
            cache: Cache::builder()
                .max_capacity(10_000)
                .time_to_idle(idle_ttl)
                .build(),
        }
    }

    pub async fn load(&self, session_id: &str, channel: Channel) -> ChatTranscript {
        self.cache
            .get(&(session_id.to_string(), channel))
            .await
            .unwrap_or_default()
    }

    /// Дописывает вопрос и ответ одним шагом и возвращает историю после записи.
    /// Параллельные запросы одной сессии не затирают реплики друг друга.
    pub async fn record_exchange(
        &self,
        session_id: &str,
        channel: Channel,
        question: &str,
        answer: &str,
    ) -> ChatTranscript {
        self.cache
            .entry((session_id.to_string(), channel))
            .and_upsert_with(|existing| {
                let mut transcript = existing.map(|entry| entry.into_value()).unwrap_or_default();
                transcript.push(Speaker::User, question);
                transcript.push(Speaker::Assistant, answer);
                std::future::ready(transcript)
            })
            .await
            .into_value()
    }

    pub async fn clear(&self, session_id: &str, channel: Channel) {
        self.cache
            .invalidate(&(session_id.to_string(), channel))
            .await;
    }

    /// Сброс всех историй сессии (выход из аккаунта).
    pub async fn clear_session(&self, session_id: &str) {
        for channel in CHANNELS {
            self.clear(session_id, channel).await;
        }
    }
}
