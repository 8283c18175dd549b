// src/lib.rs
use actix_web::web;

pub mod accounts;
pub mod admin;
pub mod auth;
pub mod chat;
pub mod config;
pub mod db;
pub mod external;
pub mod keywords;
pub mod knowledge;
pub mod models;
pub mod resolver;
pub mod support;
pub mod tariffs;
pub mod tickets;
pub mod transcript;

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.configure(auth::init_routes)
        .configure(chat::init_routes)
        .configure(support::init_routes)
        .configure(tariffs::init_routes)
        .configure(admin::init_routes);
}
