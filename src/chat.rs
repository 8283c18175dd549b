// src/chat.rs
use crate::auth::AuthSession;
use crate::models::MessageRequest;
use crate::resolver::AnswerResolver;
use crate::transcript::{Channel, TranscriptStore};
use actix_web::{HttpResponse, delete, get, post, web};
use serde_json::json;

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(get_chat);
    cfg.service(post_chat);
    cfg.service(clear_chat);
}

/// Общий обработчик вопроса для чата и бота поддержки.
pub(crate) async fn ask(
    resolver: &AnswerResolver,
    transcripts: &TranscriptStore,
    session: &AuthSession,
    channel: Channel,
    text: &str,
) -> HttpResponse {
    let text = text.trim();
    if text.is_empty() {
        return HttpResponse::BadRequest().json(json!({"error": "Message must not be empty"}));
    }

    let answer = resolver.resolve(text).await;
    let transcript = transcripts
        .record_exchange(&session.session_id, channel, text, &answer)
        .await;

    HttpResponse::Ok().json(json!({
        "answer": answer,
        "transcript": transcript,
    }))
}

#[get("/chat")]
pub async fn get_chat(
    transcripts: web::Data<TranscriptStore>,
    session: AuthSession,
) -> Result<HttpResponse, actix_web::Error> {
    let transcript = transcripts.load(&session.session_id, Channel::Chat).await;
    Ok(HttpResponse::Ok().json(json!({"transcript": transcript})))
}

#[post("/chat")]
pub async fn post_chat(
    resolver: web::Data<AnswerResolver>,
    transcripts: web::Data<TranscriptStore>,
    session: AuthSession,
    req: web::Json<MessageRequest>,
) -> Result<HttpResponse, actix_web::Error> {
    Ok(ask(&resolver, &transcripts, &session, Channel::Chat, &req.text).await)
}

#[delete("/chat")]
pub async fn clear_chat(
    transcripts: web::Data<TranscriptStore>,
    session: AuthSession,
) -> Result<HttpResponse, actix_web::Error> {
    transcripts.clear(&session.session_id, Channel::Chat).await;
    Ok(HttpResponse::Ok().json(json!({"message": "Chat cleared"})))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::external::ExternalAnswerSource;
    use crate::keywords::KeywordTable;
    use crate::knowledge::KnowledgeStore;
    use crate::models::Speaker;
    use async_trait::async_trait;
    use std::sync::Arc;
    use std::time::Duration;

    struct SlowSource;

    #[async_trait]
    impl ExternalAnswerSource for SlowSource {
        async fn fetch(&self, message: &str) -> Option<String> {
            tokio::time::sleep(Duration::from_millis(200)).await;
            Some(format!("{message} — животное"))
        }
    }

    #[actix_web::test]
    async fn parallel_questions_in_one_session_keep_all_turns() {
        let knowledge = KnowledgeStore::new(db::test_pool().await);
        let resolver = AnswerResolver::new(knowledge, KeywordTable::default(), Arc::new(SlowSource));
        let transcripts = TranscriptStore::new(Duration::from_secs(60));
        let session = AuthSession {
            user_id: 1,
            session_id: "s".to_string(),
        };

        let (first, second) = tokio::join!(
            ask(&resolver, &transcripts, &session, Channel::Chat, "зебра"),
            ask(&resolver, &transcripts, &session, Channel::Chat, "жираф"),
        );
        assert!(first.status().is_success());
        assert!(second.status().is_success());

        let transcript = transcripts.load("s", Channel::Chat).await;
        assert_eq!(transcript.len(), 4);
        for pair in transcript.messages.chunks(2) {
            assert_eq!(pair[0].speaker, Speaker::User);
            assert_eq!(pair[1].speaker, Speaker::Assistant);
            assert_eq!(pair[1].text, format!("{} это животное", pair[0].text));
        }
    }
}
