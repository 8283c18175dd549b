// src/db.rs
use crate::models::{KnowledgeEntry, SupportTicket, Tariff, TicketView, User};
use chrono::Utc;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;

const SCHEMA: [&str; 3] = [
    "CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        login TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        is_admin INTEGER NOT NULL DEFAULT 0,
        tariff TEXT NOT NULL DEFAULT 'demo',
        created_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS support_tickets (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL REFERENCES users(id),
        text TEXT NOT NULL,
        answer TEXT,
        is_tariff_request INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS knowledge (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        phrase TEXT NOT NULL UNIQUE,
        answer TEXT NOT NULL
    )",
];

pub async fn connect(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
    SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
}

pub async fn init_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }
    Ok(())
}

/// Удаляет все таблицы и создаёт их заново.
/// Счётчик id пользователей продолжается: id из выданных ранее токенов не достанется новому пользователю.
pub async fn reset_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    init_schema(pool).await?;
    let last_user_id: Option<i64> =
        sqlx::query_scalar("SELECT seq FROM sqlite_sequence WHERE name = 'users'")
            .fetch_optional(pool)
            .await?;

    for table in ["support_tickets", "knowledge", "users"] {
        sqlx::query(&format!("DROP TABLE IF EXISTS {table}"))
            .execute(pool)
            .await?;
    }
    init_schema(pool).await?;

    if let Some(seq) = last_user_id {
        sqlx::query("INSERT INTO sqlite_sequence (name, seq) VALUES ('users', ?)")
            .bind(seq)
            .execute(pool)
            .await?;
    }
    Ok(())
}

// --- users

const USER_COLUMNS: &str = "id, login, password_hash, is_admin, tariff, created_at";

pub async fn get_user_by_login(pool: &SqlitePool, login: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE login = ?"))
        .bind(login)
        .fetch_optional(pool)
        .await
}

pub async fn get_user_by_id(pool: &SqlitePool, id: i64) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn list_users(pool: &SqlitePool) -> Result<Vec<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY id"))
        .fetch_all(pool)
        .await
}

/// Возвращает `None`, если логин уже занят.
pub async fn create_user(
    pool: &SqlitePool,
    login: &str,
    password_hash: &str,
    is_admin: bool,
    tariff: Tariff,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "INSERT INTO users (login, password_hash, is_admin, tariff, created_at)
         VALUES (?, ?, ?, ?, ?)
         ON CONFLICT(login) DO NOTHING
         RETURNING {USER_COLUMNS}"
    ))
    .bind(login)
    .bind(password_hash)
    .bind(is_admin)
    .bind(tariff)
    .bind(Utc::now())
    .fetch_optional(pool)
    .await
}

pub async fn update_user_tariff(
    pool: &SqlitePool,
    user_id: i64,
    tariff: Tariff,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE users SET tariff = ? WHERE id = ?")
        .bind(tariff)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
pub(crate) async fn count_users_with_login(pool: &SqlitePool, login: &str) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE login = ?")
        .bind(login)
        .fetch_one(pool)
        .await
}

// --- support tickets

pub async fn create_ticket(
    pool: &SqlitePool,
    user_id: i64,
    text: &str,
    is_tariff_request: bool,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        "INSERT INTO support_tickets (user_id, text, is_tariff_request, created_at)
         VALUES (?, ?, ?, ?) RETURNING id",
    )
    .bind(user_id)
    .bind(text)
    .bind(is_tariff_request)
    .bind(Utc::now())
    .fetch_one(pool)
    .await
}

pub async fn get_ticket(pool: &SqlitePool, id: i64) -> Result<Option<SupportTicket>, sqlx::Error> {
    sqlx::query_as::<_, SupportTicket>(
        "SELECT id, user_id, text, answer, is_tariff_request, created_at FROM support_tickets WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn set_ticket_answer(
    pool: &SqlitePool,
    ticket_id: i64,
    answer: &str,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE support_tickets SET answer = ? WHERE id = ?")
        .bind(answer)
        .bind(ticket_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn list_tickets(pool: &SqlitePool) -> Result<Vec<TicketView>, sqlx::Error> {
    sqlx::query_as::<_, TicketView>(
        "SELECT t.id, t.user_id, u.login, t.text, t.answer, t.is_tariff_request, t.created_at
         FROM support_tickets t LEFT JOIN users u ON u.id = t.user_id
         ORDER BY t.id DESC",
    )
    .fetch_all(pool)
    .await
}

// --- knowledge

/// Первая (по id) запись, фраза которой входит в сообщение.
pub async fn find_knowledge_in(
    pool: &SqlitePool,
    message_lower: &str,
) -> Result<Option<KnowledgeEntry>, sqlx::Error> {
    sqlx::query_as::<_, KnowledgeEntry>(
        "SELECT id, phrase, answer FROM knowledge
         WHERE phrase <> '' AND instr(?, phrase) > 0
         ORDER BY id LIMIT 1",
    )
    .bind(message_lower)
    .fetch_optional(pool)
    .await
}

pub async fn get_knowledge_by_phrase(
    pool: &SqlitePool,
    phrase: &str,
) -> Result<Option<KnowledgeEntry>, sqlx::Error> {
    sqlx::query_as::<_, KnowledgeEntry>("SELECT id, phrase, answer FROM knowledge WHERE phrase = ?")
        .bind(phrase)
        .fetch_optional(pool)
        .await
}

/// Вставка без перезаписи: при совпадении фразы ничего не меняется.
pub async fn insert_knowledge_if_absent(
    pool: &SqlitePool,
    phrase: &str,
    answer: &str,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO knowledge (phrase, answer) VALUES (?, ?) ON CONFLICT(phrase) DO NOTHING",
    )
    .bind(phrase)
    .bind(answer)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
pub(crate) async fn count_knowledge(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM knowledge")
        .fetch_one(pool)
        .await
}

#[cfg(test)]
pub(crate) async fn test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    init_schema(&pool).await.unwrap();
    pool
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reset_drops_all_rows() {
        let pool = test_pool().await;
        create_user(&pool, "bob", "hash", false, Tariff::Demo)
            .await
            .unwrap();
        insert_knowledge_if_absent(&pool, "кот", "мяу").await.unwrap();

        reset_schema(&pool).await.unwrap();

        assert!(list_users(&pool).await.unwrap().is_empty());
        assert_eq!(count_knowledge(&pool).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn reset_does_not_reuse_user_ids() {
        let pool = test_pool().await;
        let bob = create_user(&pool, "bob", "hash", false, Tariff::Demo)
            .await
            .unwrap()
            .unwrap();

        reset_schema(&pool).await.unwrap();
        let alice = create_user(&pool, "alice", "hash", false, Tariff::Demo)
            .await
            .unwrap()
            .unwrap();

        assert!(alice.id > bob.id);
        assert!(get_user_by_id(&pool, bob.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn reset_of_empty_database_creates_tables() {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .unwrap();

        reset_schema(&pool).await.unwrap();
        assert!(list_users(&pool).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn knowledge_lookup_prefers_oldest_match() {
        let pool = test_pool().await;
        insert_knowledge_if_absent(&pool, "кот", "первый").await.unwrap();
        insert_knowledge_if_absent(&pool, "кот ест", "второй")
            .await
            .unwrap();

        let entry = find_knowledge_in(&pool, "мой кот ест рыбу")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(entry.answer, "первый");
        assert!(find_knowledge_in(&pool, "собака").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn tickets_come_back_newest_first() {
        let pool = test_pool().await;
        let user = create_user(&pool, "ann", "hash", false, Tariff::Demo)
            .await
            .unwrap()
            .unwrap();
        let first = create_ticket(&pool, user.id, "one", false).await.unwrap();
        let second = create_ticket(&pool, user.id, "two", true).await.unwrap();

        let tickets = list_tickets(&pool).await.unwrap();
        let ids: Vec<i64> = tickets.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![second, first]);
        assert_eq!(tickets[0].login.as_deref(), Some("ann"));
    }
}
