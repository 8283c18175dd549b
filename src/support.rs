// src/support.rs
use crate::auth::AuthSession;
use crate::chat;
use crate::models::MessageRequest;
use crate::resolver::AnswerResolver;
use crate::tickets::{TicketError, TicketStore};
use crate::transcript::{Channel, TranscriptStore};
use actix_web::{HttpResponse, get, post, web};
use serde_json::json;

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(get_support);
    cfg.service(ask_support);
    cfg.service(file_ticket);
}

#[get("/support")]
pub async fn get_support(
    transcripts: web::Data<TranscriptStore>,
    session: AuthSession,
) -> Result<HttpResponse, actix_web::Error> {
    let transcript = transcripts.load(&session.session_id, Channel::Support).await;
    Ok(HttpResponse::Ok().json(json!({"transcript": transcript})))
}

// Бот поддержки отвечает так же, как основной чат, но в своей истории
#[post("/support")]
pub async fn ask_support(
    resolver: web::Data<AnswerResolver>,
    transcripts: web::Data<TranscriptStore>,
    session: AuthSession,
    req: web::Json<MessageRequest>,
) -> Result<HttpResponse, actix_web::Error> {
    Ok(chat::ask(&resolver, &transcripts, &session, Channel::Support, &req.text).await)
}

/// Вопрос живому оператору.
#[post("/support/tickets")]
pub async fn file_ticket(
    tickets: web::Data<TicketStore>,
    session: AuthSession,
    req: web::Json<MessageRequest>,
) -> Result<HttpResponse, actix_web::Error> {
    match tickets.file_ticket(session.user_id, &req.text, false).await {
        Ok(ticket_id) => Ok(HttpResponse::Created().json(json!({
            "message": "Your question was sent to an operator",
            "ticket_id": ticket_id,
        }))),
        Err(TicketError::EmptyText) => {
            Ok(HttpResponse::BadRequest().json(json!({"error": "Message must not be empty"})))
        }
        Err(e) => {
            tracing::error!("Ticket creation error: {}", e);
            Ok(HttpResponse::InternalServerError().json(json!({"error": "Internal server error"})))
        }
    }
}
