// src/models.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;

/// Тариф хранится как метка, лимиты не применяются.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Tariff {
    #[default]
    Demo,
    Standart,
    Premium,
}

impl Tariff {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tariff::Demo => "demo",
            Tariff::Standart => "standart",
            Tariff::Premium => "premium",
        }
    }
}

impl FromStr for Tariff {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "demo" => Ok(Tariff::Demo),
            "standart" => Ok(Tariff::Standart),
            "premium" => Ok(Tariff::Premium),
            other => Err(format!("unknown tariff '{other}'")),
        }
    }
}

impl fmt::Display for Tariff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, FromRow)]
pub struct User {
    pub id: i64,
    pub login: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_admin: bool,
    pub tariff: Tariff,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn role(&self) -> &'static str {
        if self.is_admin { "admin" } else { "user" }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, FromRow)]
pub struct SupportTicket {
    pub id: i64,
    pub user_id: i64,
    pub text: String,
    pub answer: Option<String>,
    pub is_tariff_request: bool,
    pub created_at: DateTime<Utc>,
}

/// Тикет вместе с логином автора, для админки.
#[derive(Serialize, Deserialize, Clone, Debug, FromRow)]
pub struct TicketView {
    pub id: i64,
    pub user_id: i64,
    pub login: Option<String>,
    pub text: String,
    pub answer: Option<String>,
    pub is_tariff_request: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Clone, Debug, FromRow)]
pub struct KnowledgeEntry {
    pub id: i64,
    pub phrase: String,
    pub answer: String,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    User,
    Assistant,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ChatMessage {
    pub speaker: Speaker,
    pub text: String,
}

/// История диалога одной сессии. Живёт только в памяти.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct ChatTranscript {
    pub messages: Vec<ChatMessage>,
}

impl ChatTranscript {
    pub fn push(&mut self, speaker: Speaker, text: impl Into<String>) {
        self.messages.push(ChatMessage {
            speaker,
            text: text.into(),
        });
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Claims {
    pub sub: String, // user_id
    pub sid: String, // session id
    pub exp: usize,
}

#[derive(Serialize, Deserialize)]
pub struct LoginRequest {
    pub login: String,
    pub password: String,
}

#[derive(Serialize, Deserialize)]
pub struct RegisterRequest {
    pub login: String,
    pub password: String,
}

#[derive(Serialize, Deserialize)]
pub struct MessageRequest {
    pub text: String,
}

#[derive(Serialize, Deserialize)]
pub struct TariffRequest {
    pub message: String,
}

#[derive(Serialize, Deserialize)]
pub struct AnswerTicketRequest {
    pub answer: String,
}

#[derive(Serialize, Deserialize)]
pub struct SetTariffRequest {
    pub tariff: Tariff,
}
