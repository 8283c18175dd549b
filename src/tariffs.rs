// src/tariffs.rs
use crate::accounts::{AccountError, AccountStore};
use crate::auth::AuthSession;
use crate::config::Config;
use crate::models::{Tariff, TariffRequest};
use crate::tickets::{TicketError, TicketStore};
use actix_web::{HttpResponse, get, post, web};
use serde::Serialize;
use serde_json::json;

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(list_tariffs);
    cfg.service(purchase_instructions);
    cfg.service(request_tariff);
    cfg.service(get_user_profile);
}

#[derive(Serialize, Clone, Debug)]
pub struct TariffPlan {
    pub tariff: Tariff,
    pub title: &'static str,
    pub price_rub: u32,
    pub questions_per_month: Option<u32>,
    pub perks: &'static str,
}

pub static CATALOG: [TariffPlan; 3] = [
    TariffPlan {
        tariff: Tariff::Demo,
        title: "Демо",
        price_rub: 0,
        questions_per_month: None,
        perks: "Обычный чат.",
    },
    TariffPlan {
        tariff: Tariff::Standart,
        title: "Стандарт",
        price_rub: 199,
        questions_per_month: Some(600),
        perks: "Приоритетная поддержка.",
    },
    TariffPlan {
        tariff: Tariff::Premium,
        title: "Премиум",
        price_rub: 399,
        questions_per_month: Some(2000),
        perks: "VIP поддержка.",
    },
];

pub fn plan(tariff: Tariff) -> &'static TariffPlan {
    match tariff {
        Tariff::Demo => &CATALOG[0],
        Tariff::Standart => &CATALOG[1],
        Tariff::Premium => &CATALOG[2],
    }
}

/// Текст заявки на смену тарифа, как его увидит администратор.
pub fn request_text(tariff: Tariff, message: &str) -> String {
    format!("Заявка на тариф {tariff}: {}", message.trim())
}

#[get("/tariffs")]
pub async fn list_tariffs() -> Result<HttpResponse, actix_web::Error> {
    Ok(HttpResponse::Ok().json(json!({"tariffs": CATALOG})))
}

// Оплата вручную: переводом с логином в комментарии, затем заявка
#[get("/tariffs/{tariff}/purchase")]
pub async fn purchase_instructions(
    config: web::Data<Config>,
    path: web::Path<String>,
    _session: AuthSession,
) -> Result<HttpResponse, actix_web::Error> {
    let Ok(tariff) = path.parse::<Tariff>() else {
        return Ok(HttpResponse::NotFound().json(json!({"error": "Unknown tariff"})));
    };
    if tariff == Tariff::Demo {
        return Ok(HttpResponse::BadRequest().json(json!({"error": "Demo tariff is free"})));
    }
    let plan = plan(tariff);
    let payee = config
        .payment_phone
        .clone()
        .unwrap_or_else(|| "реквизиты уточните в поддержке".to_string());

    Ok(HttpResponse::Ok().json(json!({
        "tariff": plan.tariff,
        "title": plan.title,
        "amount_rub": plan.price_rub,
        "payee": payee,
        "steps": [
            format!("Оплатите {}₽ по реквизитам: {}", plan.price_rub, payee),
            "В сообщении к переводу напишите свой логин и выбранный тариф.",
            "После оплаты отправьте заявку или напишите в поддержку.",
        ],
    })))
}

#[post("/tariffs/{tariff}/request")]
pub async fn request_tariff(
    tickets: web::Data<TicketStore>,
    path: web::Path<String>,
    session: AuthSession,
    req: web::Json<TariffRequest>,
) -> Result<HttpResponse, actix_web::Error> {
    let Ok(tariff) = path.parse::<Tariff>() else {
        return Ok(HttpResponse::NotFound().json(json!({"error": "Unknown tariff"})));
    };
    if req.message.trim().is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({"error": "Message must not be empty"})));
    }
    let text = request_text(tariff, &req.message);

    match tickets.file_ticket(session.user_id, &text, true).await {
        Ok(ticket_id) => Ok(HttpResponse::Created().json(json!({
            "message": "Request sent, we will contact you",
            "ticket_id": ticket_id,
        }))),
        Err(TicketError::EmptyText) => {
            Ok(HttpResponse::BadRequest().json(json!({"error": "Message must not be empty"})))
        }
        Err(e) => {
            tracing::error!("Tariff request error: {}", e);
            Ok(HttpResponse::InternalServerError().json(json!({"error": "Internal server error"})))
        }
    }
}

#[get("/user/profile")]
pub async fn get_user_profile(
    accounts: web::Data<AccountStore>,
    session: AuthSession,
) -> Result<HttpResponse, actix_web::Error> {
    match accounts.find(session.user_id).await {
        Ok(user) => Ok(HttpResponse::Ok().json(json!({
            "user_id": user.id,
            "login": user.login,
            "tariff": user.tariff,
            "role": user.role(),
        }))),
        Err(AccountError::NotFound) => {
            Ok(HttpResponse::NotFound().json(json!({"error": "User not found"})))
        }
        Err(e) => {
            tracing::error!("Database error fetching user profile: {}", e);
            Ok(HttpResponse::InternalServerError().json(json!({"error": "Internal server error"})))
        }
    }
}
