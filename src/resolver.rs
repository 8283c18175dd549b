// src/resolver.rs
use crate::external::ExternalAnswerSource;
use crate::keywords::KeywordTable;
use crate::knowledge::{KnowledgeStore, MAX_ANSWER_CHARS, truncate_chars};
use std::sync::Arc;

pub const FILLER_ANSWER: &str =
    "Интересный вопрос! Я обязательно изучу это глубже и скоро смогу ответить.";

// Замены для "уникализации" текста из энциклопедии
const SUBSTITUTIONS: [(&str, &str); 2] = [(" — ", " это "), (" Википедия", " энциклопедия")];

fn localize(text: &str) -> String {
    SUBSTITUTIONS
        .iter()
        .fold(text.to_string(), |acc, (from, to)| acc.replace(from, to))
}

/// Подбор ответа: база знаний, затем ключевые слова, затем внешний источник.
/// Ответы из внешнего источника и заглушка запоминаются в базе знаний.
#[derive(Clone)]
pub struct AnswerResolver {
    knowledge: KnowledgeStore,
    keywords: KeywordTable,
    external: Arc<dyn ExternalAnswerSource>,
}

impl AnswerResolver {
    pub fn new(
        knowledge: KnowledgeStore,
        keywords: KeywordTable,
        external: Arc<dyn ExternalAnswerSource>,
    ) -> Self {
        Self {
            knowledge,
            keywords,
            external,
        }
    }

    /// Всегда возвращает какой-нибудь текст; ошибки хранилища и сети не выходят наружу.
    pub async fn resolve(&self, message: &str) -> String {
        if message.trim().is_empty() {
            return FILLER_ANSWER.to_string();
        }
        let message_lower = message.to_lowercase();

        match self.knowledge.lookup(&message_lower).await {
            Ok(Some(answer)) => {
                tracing::debug!("Answered from knowledge base");
                return answer;
            }
            Ok(None) => {}
            Err(e) => tracing::warn!("Knowledge lookup failed: {}", e),
        }

        if let Some(answer) = self.keywords.answer_for(&message_lower) {
            tracing::debug!("Answered from keyword table");
            return answer.to_string();
        }

        let answer = match self.external.fetch(message).await {
            Some(found) if !found.trim().is_empty() => {
                truncate_chars(&localize(&found), MAX_ANSWER_CHARS)
            }
            _ => FILLER_ANSWER.to_string(),
        };
        self.remember(message, answer).await
    }

    // Возвращаем сохранённый текст, даже если он отличается от answer: повтор вопроса даёт тот же ответ
    async fn remember(&self, message: &str, answer: String) -> String {
        match self.knowledge.learn(message, &answer).await {
            Ok(stored) => stored,
            Err(e) => {
                tracing::warn!("Failed to learn answer: {}", e);
                answer
            }
        }
    }
}
