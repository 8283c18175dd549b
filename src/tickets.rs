// src/tickets.rs
use crate::db;
use crate::models::{SupportTicket, TicketView};
use sqlx::SqlitePool;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TicketError {
    #[error("ticket text must not be empty")]
    EmptyText,
    #[error("ticket not found")]
    NotFound,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Обращения в поддержку. Текст не редактируется, тикеты не удаляются.
#[derive(Clone)]
pub struct TicketStore {
    pool: SqlitePool,
}

impl TicketStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn file_ticket(
        &self,
        user_id: i64,
        text: &str,
        is_tariff_request: bool,
    ) -> Result<i64, TicketError> {
        if text.trim().is_empty() {
            return Err(TicketError::EmptyText);
        }
        let id = db::create_ticket(&self.pool, user_id, text, is_tariff_request).await?;
        tracing::info!("Ticket {} filed by user {}", id, user_id);
        Ok(id)
    }

    /// Сохраняет ответ оператора и возвращает обновлённый тикет.
    pub async fn answer_ticket(
        &self,
        ticket_id: i64,
        answer: &str,
    ) -> Result<SupportTicket, TicketError> {
        if answer.trim().is_empty() {
            return Err(TicketError::EmptyText);
        }
        if !db::set_ticket_answer(&self.pool, ticket_id, answer).await? {
            return Err(TicketError::NotFound);
        }
        self.get(ticket_id).await
    }

    async fn get(&self, ticket_id: i64) -> Result<SupportTicket, TicketError> {
        db::get_ticket(&self.pool, ticket_id)
            .await?
            .ok_or(TicketError::NotFound)
    }

    /// Все тикеты, новые первыми.
    pub async fn list_all(&self) -> Result<Vec<TicketView>, TicketError> {
        Ok(db::list_tickets(&self.pool).await?)
    }
}
