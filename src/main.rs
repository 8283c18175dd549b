// src/main.rs
use actix_web::{App, HttpServer, middleware::Logger, web};
use clap::{Parser, Subcommand};
use neiro_chat::accounts::AccountStore;
use neiro_chat::config::Config;
use neiro_chat::external::{ExternalSettings, HttpAnswerSource};
use neiro_chat::keywords::KeywordTable;
use neiro_chat::knowledge::KnowledgeStore;
use neiro_chat::resolver::AnswerResolver;
use neiro_chat::tickets::TicketStore;
use neiro_chat::transcript::TranscriptStore;
use neiro_chat::{db, init_routes};
use std::io::Error;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(name = "neiro_chat", about = "Chat service with a self-learning answer base")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Create tables, ensure the bootstrap admin and start serving (default)
    Serve,
    /// Drop and recreate all tables, then recreate the bootstrap admin
    ResetDb,
}

fn startup_error(context: &str, e: impl std::fmt::Display) -> Error {
    Error::other(format!("{context}: {e}"))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| startup_error("Failed to set tracing subscriber", e))?;

    let cli = Cli::parse();
    let config = Config::from_env()
        .map_err(|e| startup_error("Failed to load config from environment", e))?;

    let pool = db::connect(&config.database_url)
        .await
        .map_err(|e| startup_error("Failed to open database", e))?;
    let accounts = AccountStore::new(pool.clone(), config.bcrypt_cost);

    match cli.command.unwrap_or(Command::Serve) {
        Command::ResetDb => {
            db::reset_schema(&pool)
                .await
                .map_err(|e| startup_error("Failed to reset database", e))?;
            accounts
                .ensure_bootstrap_admin(&config.admin_login, &config.admin_password)
                .await
                .map_err(|e| startup_error("Failed to create admin", e))?;
            tracing::info!("Database reset, admin account '{}' recreated", config.admin_login);
            Ok(())
        }
        Command::Serve => {
            db::init_schema(&pool)
                .await
                .map_err(|e| startup_error("Failed to create tables", e))?;
            accounts
                .ensure_bootstrap_admin(&config.admin_login, &config.admin_password)
                .await
                .map_err(|e| startup_error("Failed to create admin", e))?;
            serve(config, pool, accounts).await
        }
    }
}

async fn serve(config: Config, pool: sqlx::SqlitePool, accounts: AccountStore) -> std::io::Result<()> {
    tracing::info!("Starting chat service");

    let knowledge = KnowledgeStore::new(pool.clone());
    let source = HttpAnswerSource::new(ExternalSettings::from(&config), knowledge.clone())
        .map_err(|e| startup_error("Failed to build HTTP client", e))?;
    if config.llm_api_key.is_none() {
        tracing::info!("LLM_API_KEY is not set, generative fallback disabled");
    }
    let resolver = AnswerResolver::new(knowledge, KeywordTable::default(), Arc::new(source));
    let tickets = TicketStore::new(pool);
    let transcripts = TranscriptStore::new(Duration::from_secs(config.session_ttl_hours * 3600));

    let bind = (config.bind_address.clone(), config.port);
    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(accounts.clone()))
            .app_data(web::Data::new(tickets.clone()))
            .app_data(web::Data::new(resolver.clone()))
            .app_data(web::Data::new(transcripts.clone()))
            .app_data(web::Data::new(config.clone()))
            .wrap(Logger::default())
            .configure(init_routes)
    })
    .bind(bind)?
    .run()
    .await
}
