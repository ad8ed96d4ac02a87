use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use rand::distr::Alphanumeric;
use tracing::{debug, info, warn};

use estate_db::Database;
use estate_types::models::Sender;

use crate::completion::{CompletionError, CompletionService};
use crate::compose::{self, LeadMentions};
use crate::intent::{Classification, Intent, classify};

/// Reply used whenever the completion service cannot answer.
pub const FALLBACK_REPLY: &str = "I'm here to help with real estate! I can list our buyers and \
sellers, summarize active leads, or help you buy or sell a property. What would you like to do?";

/// Intent label stored on every chat row.
pub const CHAT_INTENT_LABEL: &str = "PROPERTY";

const SESSION_SUFFIX_LEN: usize = 8;

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("chat storage failure: {0}")]
    Storage(#[from] anyhow::Error),
}

/// Outcome of one chat turn.
#[derive(Debug, Clone)]
pub struct ChatTurn {
    pub session_id: String,
    pub reply: String,
    pub intent: Intent,
    pub automation: Option<&'static str>,
}

pub struct ChatResolver {
    db: Arc<Database>,
    completion: Arc<dyn CompletionService>,
    timeout: Duration,
}

impl ChatResolver {
    pub fn new(db: Arc<Database>, completion: Arc<dyn CompletionService>, timeout: Duration) -> Self {
        Self {
            db,
            completion,
            timeout,
        }
    }

    /// Answer one message and append the user/bot pair to the session log.
    ///
    /// A missing or blank `session_id` gets a freshly minted one, returned in
    /// the turn for the caller to reuse.
    pub async fn handle_turn(
        &self,
        message: &str,
        session_id: Option<String>,
    ) -> Result<ChatTurn, ChatError> {
        let session_id = session_id
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(mint_session_id);

        let classification = classify(message);
        debug!(
            session_id = %session_id,
            intent = classification.intent.as_str(),
            property_query = classification.is_property_query,
            "Classified chat message"
        );

        let reply = if classification.is_property_query {
            self.compose_property_reply(message).await?
        } else {
            self.delegate(message).await
        };

        self.persist(&session_id, message, &reply, classification).await?;

        info!(session_id = %session_id, "Chat turn stored");
        Ok(ChatTurn {
            session_id,
            reply,
            intent: classification.intent,
            automation: classification.intent.automation(),
        })
    }

    async fn compose_property_reply(&self, message: &str) -> anyhow::Result<String> {
        let mentions = LeadMentions::from_message(message);

        if !mentions.any() {
            let (buyers, sellers) = self
                .db
                .call(|db| Ok((db.list_buyers()?, db.list_sellers()?)))
                .await?;
            return Ok(compose::summary(&buyers, &sellers));
        }

        let mut sections = Vec::new();
        if mentions.buyers {
            let buyers = self.db.call(|db| db.list_buyers()).await?;
            sections.push(compose::list_buyers(&buyers));
        }
        if mentions.sellers {
            let sellers = self.db.call(|db| db.list_sellers()).await?;
            sections.push(compose::list_sellers(&sellers));
        }
        Ok(sections.join("\n\n"))
    }

    /// Ask the completion service. Never fails and never retries.
    async fn delegate(&self, message: &str) -> String {
        let result = match tokio::time::timeout(self.timeout, self.completion.complete(message)).await {
            Ok(inner) => inner,
            Err(_) => Err(CompletionError::Timeout(self.timeout)),
        };

        match result {
            Ok(text) => text,
            Err(CompletionError::NotConfigured) => FALLBACK_REPLY.to_string(),
            Err(e) => {
                warn!("Completion service failed, using fallback reply: {}", e);
                FALLBACK_REPLY.to_string()
            }
        }
    }

    async fn persist(
        &self,
        session_id: &str,
        message: &str,
        reply: &str,
        classification: Classification,
    ) -> anyhow::Result<()> {
        let automation = classification.intent.automation();

        // User row first so history keeps submission order
        let (sid, text) = (session_id.to_string(), message.to_string());
        self.db
            .call(move |db| {
                db.insert_chat_message(&sid, Sender::User, &text, Some(CHAT_INTENT_LABEL), automation)
            })
            .await?;

        let (sid, text) = (session_id.to_string(), reply.to_string());
        self.db
            .call(move |db| {
                db.insert_chat_message(&sid, Sender::Bot, &text, Some(CHAT_INTENT_LABEL), automation)
            })
            .await?;

        Ok(())
    }
}

/// `session_<unix millis>_<random alphanumerics>`. Collisions are unlikely,
/// not impossible.
pub fn mint_session_id() -> String {
    let suffix: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(SESSION_SUFFIX_LEN)
        .map(char::from)
        .collect();
    format!("session_{}_{}", chrono::Utc::now().timestamp_millis(), suffix)
}
