// src/auth.rs
use crate::accounts::{AccountError, AccountStore};
use crate::config::Config;
use crate::models::{Claims, LoginRequest, RegisterRequest, User};
use crate::transcript::TranscriptStore;
use actix_web::dev::Payload;
use actix_web::error::{ErrorInternalServerError, InternalError};
use actix_web::http::header::AUTHORIZATION;
use actix_web::{FromRequest, HttpRequest, HttpResponse, post, web};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde_json::json;
use std::future::{Ready, ready};
use uuid::Uuid;

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(login);
    cfg.service(register);
    cfg.service(logout);
}

/// Пользователь и сессия из заголовка `Authorization: Bearer <jwt>`.
#[derive(Clone, Debug)]
pub struct AuthSession {
    pub user_id: i64,
    pub session_id: String,
}

impl FromRequest for AuthSession {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(session_from_request(req))
    }
}

fn unauthorized() -> actix_web::Error {
    InternalError::from_response(
        "unauthorized",
        HttpResponse::Unauthorized().json(json!({"error": "Unauthorized"})),
    )
    .into()
}

fn session_from_request(req: &HttpRequest) -> Result<AuthSession, actix_web::Error> {
    let config = req
        .app_data::<web::Data<Config>>()
        .ok_or_else(|| ErrorInternalServerError("config is not registered"))?;

    let token = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or_else(unauthorized)?;

    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_ref()),
        &Validation::default(),
    )
    .map_err(|e| {
        tracing::debug!("Rejected session token: {}", e);
        unauthorized()
    })?;

    let user_id = data.claims.sub.parse::<i64>().map_err(|_| unauthorized())?;
    Ok(AuthSession {
        user_id,
        session_id: data.claims.sid,
    })
}

/// Выпускает токен для новой сессии.
pub fn issue_token(config: &Config, user_id: i64) -> Result<String, jsonwebtoken::errors::Error> {
    let expiration = Utc::now() + Duration::hours(config.session_ttl_hours as i64);
    let claims = Claims {
        sub: user_id.to_string(),
        sid: Uuid::new_v4().to_string(),
        exp: expiration.timestamp() as usize,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_ref()),
    )
}

fn session_response(config: &Config, user: &User, created: bool) -> HttpResponse {
    match issue_token(config, user.id) {
        Ok(token) => {
            let body = json!({
                "token": token,
                "user_id": user.id,
                "login": user.login,
                "tariff": user.tariff,
                "is_admin": user.is_admin,
            });
            if created {
                HttpResponse::Created().json(body)
            } else {
                HttpResponse::Ok().json(body)
            }
        }
        Err(e) => {
            tracing::error!("Token generation error: {}", e);
            HttpResponse::InternalServerError().json(json!({"error": "Internal server error"}))
        }
    }
}

#[post("/auth/login")]
pub async fn login(
    accounts: web::Data<AccountStore>,
    config: web::Data<Config>,
    req: web::Json<LoginRequest>,
) -> Result<HttpResponse, actix_web::Error> {
    match accounts.authenticate(&req.login, &req.password).await {
        Ok(user) => Ok(session_response(&config, &user, false)),
        Err(AccountError::InvalidCredentials) => {
            Ok(HttpResponse::Unauthorized().json(json!({"error": "Invalid login or password"})))
        }
        Err(e) => {
            tracing::error!("Login failed: {}", e);
            Ok(HttpResponse::InternalServerError().json(json!({"error": "Internal server error"})))
        }
    }
}

#[post("/auth/register")]
pub async fn register(
    accounts: web::Data<AccountStore>,
    config: web::Data<Config>,
    req: web::Json<RegisterRequest>,
) -> Result<HttpResponse, actix_web::Error> {
    match accounts.register(&req.login, &req.password).await {
        Ok(user) => {
            tracing::info!("Registered user '{}' with id {}", user.login, user.id);
            Ok(session_response(&config, &user, true))
        }
        Err(AccountError::AlreadyExists) => {
            Ok(HttpResponse::Conflict().json(json!({"error": "User already exists"})))
        }
        Err(e @ AccountError::EmptyField(_)) => {
            Ok(HttpResponse::BadRequest().json(json!({"error": e.to_string()})))
        }
        Err(e) => {
            tracing::error!("User creation error: {}", e);
            Ok(HttpResponse::InternalServerError().json(json!({"error": "Internal server error"})))
        }
    }
}

#[post("/auth/logout")]
pub async fn logout(
    transcripts: web::Data<TranscriptStore>,
    session: AuthSession,
) -> Result<HttpResponse, actix_web::Error> {
    transcripts.clear_session(&session.session_id).await;
    Ok(HttpResponse::Ok().json(json!({"message": "Logged out"})))
}
