// src/admin.rs
use crate::accounts::{AccountError, AccountStore};
use crate::auth::AuthSession;
use crate::models::{AnswerTicketRequest, SetTariffRequest, User};
use crate::tickets::{TicketError, TicketStore};
use actix_web::{HttpResponse, get, post, web};
use serde_json::json;

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(list_users);
    cfg.service(list_tickets);
    cfg.service(answer_ticket);
    cfg.service(set_user_tariff);
}

fn internal_error() -> HttpResponse {
    HttpResponse::InternalServerError().json(json!({"error": "Internal server error"}))
}

// Роль проверяется по базе на каждый запрос, а не по токену
async fn require_admin(accounts: &AccountStore, session: &AuthSession) -> Result<User, HttpResponse> {
    match accounts.find(session.user_id).await {
        Ok(user) if user.is_admin => Ok(user),
        Ok(_) | Err(AccountError::NotFound) => {
            Err(HttpResponse::Forbidden().json(json!({"error": "Admin access required"})))
        }
        Err(e) => {
            tracing::error!("Database error checking admin rights: {}", e);
            Err(internal_error())
        }
    }
}

#[get("/admin/users")]
pub async fn list_users(
    accounts: web::Data<AccountStore>,
    session: AuthSession,
) -> Result<HttpResponse, actix_web::Error> {
    if let Err(response) = require_admin(&accounts, &session).await {
        return Ok(response);
    }
    match accounts.list().await {
        Ok(users) => Ok(HttpResponse::Ok().json(json!({"users": users}))),
        Err(e) => {
            tracing::error!("Database error listing users: {}", e);
            Ok(internal_error())
        }
    }
}

#[get("/admin/tickets")]
pub async fn list_tickets(
    accounts: web::Data<AccountStore>,
    tickets: web::Data<TicketStore>,
    session: AuthSession,
) -> Result<HttpResponse, actix_web::Error> {
    if let Err(response) = require_admin(&accounts, &session).await {
        return Ok(response);
    }
    match tickets.list_all().await {
        Ok(tickets) => Ok(HttpResponse::Ok().json(json!({"tickets": tickets}))),
        Err(e) => {
            tracing::error!("Database error listing tickets: {}", e);
            Ok(internal_error())
        }
    }
}

#[post("/admin/tickets/{ticket_id}/answer")]
pub async fn answer_ticket(
    accounts: web::Data<AccountStore>,
    tickets: web::Data<TicketStore>,
    session: AuthSession,
    path: web::Path<i64>,
    req: web::Json<AnswerTicketRequest>,
) -> Result<HttpResponse, actix_web::Error> {
    let admin = match require_admin(&accounts, &session).await {
        Ok(admin) => admin,
        Err(response) => return Ok(response),
    };
    let ticket_id = path.into_inner();

    match tickets.answer_ticket(ticket_id, &req.answer).await {
        Ok(ticket) => {
            tracing::info!("Admin '{}' answered ticket {}", admin.login, ticket_id);
            Ok(HttpResponse::Ok().json(json!({"message": "Answer saved", "ticket": ticket})))
        }
        Err(TicketError::EmptyText) => {
            Ok(HttpResponse::BadRequest().json(json!({"error": "Answer must not be empty"})))
        }
        Err(TicketError::NotFound) => {
            Ok(HttpResponse::NotFound().json(json!({"error": "Ticket not found"})))
        }
        Err(e) => {
            tracing::error!("Database error answering ticket: {}", e);
            Ok(internal_error())
        }
    }
}

#[post("/admin/users/{user_id}/tariff")]
pub async fn set_user_tariff(
    accounts: web::Data<AccountStore>,
    session: AuthSession,
    path: web::Path<i64>,
    req: web::Json<SetTariffRequest>,
) -> Result<HttpResponse, actix_web::Error> {
    let admin = match require_admin(&accounts, &session).await {
        Ok(admin) => admin,
        Err(response) => return Ok(response),
    };
    let user_id = path.into_inner();

    match accounts.set_tariff(user_id, req.tariff).await {
        Ok(()) => {
            tracing::info!(
                "Admin '{}' set tariff {} for user {}",
                admin.login,
                req.tariff,
                user_id
            );
            Ok(HttpResponse::Ok().json(json!({"user_id": user_id, "tariff": req.tariff})))
        }
        Err(AccountError::NotFound) => {
            Ok(HttpResponse::NotFound().json(json!({"error": "User not found"})))
        }
        Err(e) => {
            tracing::error!("Database error setting tariff: {}", e);
            Ok(internal_error())
        }
    }
}
