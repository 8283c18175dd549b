// src/knowledge.rs
use crate::db;
use sqlx::SqlitePool;

pub const MAX_PHRASE_CHARS: usize = 120;
pub const MAX_ANSWER_CHARS: usize = 350;

/// Обрезка по символам, а не по байтам.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

/// Самообучающаяся база "фраза -> ответ". Записи только добавляются.
#[derive(Clone)]
pub struct KnowledgeStore {
    pool: SqlitePool,
}

impl KnowledgeStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Ответ первой записи, чья фраза встречается в сообщении.
    pub async fn lookup(&self, message_lower: &str) -> Result<Option<String>, sqlx::Error> {
        Ok(db::find_knowledge_in(&self.pool, message_lower)
            .await?
            .map(|entry| entry.answer))
    }

    /// Запоминает ответ на сообщение, если такой фразы ещё нет.
    ///
    /// Фраза приводится к нижнему регистру и обрезается до 120 символов,
    /// ответ до 350. Повторная вставка той же фразы молча игнорируется.
    /// Возвращает ответ, который в итоге хранится для этой фразы.
    pub async fn learn(&self, message: &str, answer: &str) -> Result<String, sqlx::Error> {
        let phrase = truncate_chars(&message.to_lowercase(), MAX_PHRASE_CHARS);
        let answer = truncate_chars(answer, MAX_ANSWER_CHARS);
        if phrase.is_empty() {
            return Ok(answer);
        }

        if db::insert_knowledge_if_absent(&self.pool, &phrase, &answer).await? {
            tracing::debug!("Learned new phrase '{}'", phrase);
            return Ok(answer);
        }
        tracing::debug!("Phrase '{}' already known, keeping stored answer", phrase);
        Ok(db::get_knowledge_by_phrase(&self.pool, &phrase)
            .await?
            .map(|entry| entry.answer)
            .unwrap_or(answer))
    }

    #[cfg(test)]
    pub(crate) async fn count(&self) -> Result<i64, sqlx::Error> {
        db::count_knowledge(&self.pool).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store() -> KnowledgeStore {
        KnowledgeStore::new(db::test_pool().await)
    }

    #[tokio::test]
    async fn duplicate_phrase_keeps_first_answer() {
        let knowledge = store().await;
        assert_eq!(knowledge.learn("Что такое Rust", "язык").await.unwrap(), "язык");
        assert_eq!(
            knowledge.learn("что такое rust", "гриб").await.unwrap(),
            "язык"
        );
        assert_eq!(knowledge.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn lookup_matches_substring_of_lowered_message() {
        let knowledge = store().await;
        knowledge.learn("Борщ", "Свёкла и капуста").await.unwrap();

        let hit = knowledge.lookup("как сварить борщ?").await.unwrap();
        assert_eq!(hit.as_deref(), Some("Свёкла и капуста"));
        assert!(knowledge.lookup("как сварить суп?").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn long_phrase_and_answer_are_truncated() {
        let knowledge = store().await;
        let message = "я".repeat(200);
        let answer = "ы".repeat(500);

        let stored = knowledge.learn(&message, &answer).await.unwrap();
        assert_eq!(stored.chars().count(), MAX_ANSWER_CHARS);

        let entry = db::get_knowledge_by_phrase(&knowledge.pool, &"я".repeat(MAX_PHRASE_CHARS))
            .await
            .unwrap();
        assert!(entry.is_some());
    }

    #[tokio::test]
    async fn empty_phrase_is_never_stored() {
        let knowledge = store().await;
        knowledge.learn("", "ответ").await.unwrap();
        assert_eq!(knowledge.count().await.unwrap(), 0);
    }

    #[test]
    fn truncation_counts_characters() {
        assert_eq!(truncate_chars("привет", 3), "при");
        assert_eq!(truncate_chars("hi", 10), "hi");
    }
}
