use std::fmt::Debug;

use chrono::{DateTime, Utc};
use log::*;
use serde::{Deserialize, Serialize};

use crate::{
    db_types::{ChatMessage, Conversation, ConversationId, NewMessage, UserId},
    events::{EventProducers, MessageSentEvent},
    live::{ChangeFeed, Topic},
    market_api::errors::MarketError,
    traits::{ConversationManagement, ProfileManagement},
};

/// Shown for a participant whose display name is not known yet.
pub const FALLBACK_DISPLAY_NAME: &str = "User";

/// One row of a user's conversation list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationSummary {
    pub conversation_id: ConversationId,
    pub other_participant: UserId,
    pub other_name: String,
    pub last_message: String,
    pub last_message_at: Option<DateTime<Utc>>,
    /// Set when the last message came from the other participant. Not a read receipt.
    pub unread: bool,
}

impl ConversationSummary {
    pub fn for_viewer(conversation: &Conversation, viewer: &UserId) -> Self {
        let (other, name) = conversation.counterpart(viewer);
        let other_name = if name.trim().is_empty() { FALLBACK_DISPLAY_NAME.to_string() } else { name.to_string() };
        Self {
            conversation_id: conversation.id.clone(),
            other_participant: other.clone(),
            other_name,
            last_message: conversation.last_message.clone(),
            last_message_at: conversation.last_message_at,
            unread: conversation.last_sender_id.as_ref().map(|s| s != viewer).unwrap_or(false),
        }
    }
}

/// The Conversation Channel between pairs of users.
pub struct ChatApi<B> {
    db: B,
    producers: EventProducers,
    feed: ChangeFeed,
}

impl<B> Debug for ChatApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ChatApi")
    }
}

impl<B> ChatApi<B> {
    pub fn new(db: B, producers: EventProducers, feed: ChangeFeed) -> Self {
        Self { db, producers, feed }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B> ChatApi<B>
where B: ConversationManagement + ProfileManagement
{
    /// Sends `message` from `actor` to `recipient`, opening their conversation if this is the first contact.
    pub async fn send_message(
        &self,
        actor: &UserId,
        recipient: &UserId,
        message: NewMessage,
    ) -> Result<(Conversation, ChatMessage), MarketError> {
        if actor == recipient {
            return Err(MarketError::InvalidInput("Cannot start a conversation with yourself".into()));
        }
        if &message.sender_id != actor {
            return Err(MarketError::Forbidden(format!("{actor} cannot send messages as {}", message.sender_id)));
        }
        if message.is_empty() {
            return Err(MarketError::InvalidInput("A message needs text or an attachment".into()));
        }
        let conversation_id = ConversationId::for_pair(actor, recipient);
        let existing = self.db.fetch_conversation(&conversation_id).await?;
        if let Some(c) = existing.as_ref().filter(|c| !(c.has_participant(actor) && c.has_participant(recipient))) {
            warn!("💬️ Conversation {conversation_id} belongs to {:?}, not {actor} and {recipient}", c.participants);
            return Err(not_a_participant(actor, &conversation_id));
        }
        let sender_name = self.display_name(actor, existing.as_ref(), Some(&message.sender_name)).await?;
        let recipient_name = self.display_name(recipient, existing.as_ref(), None).await?;
        let mut message = message;
        if message.sender_name.trim().is_empty() {
            message.sender_name = sender_name.clone();
        }
        let participants = [(actor.clone(), sender_name), (recipient.clone(), recipient_name)];
        let (conversation, message) = self.db.append_message(&conversation_id, participants, message).await?;
        debug!("💬️ Message {} (#{}) appended to {conversation_id}", message.id, message.seq);
        self.notify(&conversation, &message).await;
        Ok((conversation, message))
    }

    /// Sends into an existing conversation by id.
    pub async fn send_to_conversation(
        &self,
        actor: &UserId,
        conversation_id: &ConversationId,
        message: NewMessage,
    ) -> Result<(Conversation, ChatMessage), MarketError> {
        let recipient = match self.db.fetch_conversation(conversation_id).await? {
            Some(c) if c.has_participant(actor) => c.counterpart(actor).0.clone(),
            Some(_) => return Err(not_a_participant(actor, conversation_id)),
            None => match conversation_id.participants() {
                Some((a, b)) if &a == actor => b,
                Some((a, b)) if &b == actor => a,
                _ => return Err(not_a_participant(actor, conversation_id)),
            },
        };
        self.send_message(actor, &recipient, message).await
    }

    /// The messages of a conversation, oldest first. Only its participants may read it.
    pub async fn messages(
        &self,
        viewer: &UserId,
        conversation_id: &ConversationId,
    ) -> Result<Vec<ChatMessage>, MarketError> {
        match self.db.fetch_conversation(conversation_id).await? {
            Some(c) if c.has_participant(viewer) => Ok(self.db.fetch_messages(conversation_id).await?),
            Some(_) => Err(not_a_participant(viewer, conversation_id)),
            // Nobody has written yet. The would-be participants see an empty conversation.
            None if conversation_id.involves(viewer) => Ok(Vec::new()),
            None => Err(not_a_participant(viewer, conversation_id)),
        }
    }

    /// The conversation list of `viewer`, most recently active first.
    pub async fn list_conversations(&self, viewer: &UserId) -> Result<Vec<ConversationSummary>, MarketError> {
        let conversations = self.db.fetch_conversations_for(viewer).await?;
        Ok(conversations.iter().map(|c| ConversationSummary::for_viewer(c, viewer)).collect())
    }

    async fn display_name(
        &self,
        user: &UserId,
        existing: Option<&Conversation>,
        supplied: Option<&String>,
    ) -> Result<String, MarketError> {
        if let Some(profile) = self.db.fetch_profile(user).await? {
            return Ok(profile.display_name().to_string());
        }
        if let Some(name) = supplied.filter(|n| !n.trim().is_empty()) {
            return Ok(name.clone());
        }
        let cached = existing.and_then(|c| {
            c.participants.iter().position(|p| p == user).map(|i| c.participant_names[i].clone())
        });
        Ok(cached.filter(|n| !n.trim().is_empty()).unwrap_or_else(|| FALLBACK_DISPLAY_NAME.to_string()))
    }

    async fn notify(&self, conversation: &Conversation, message: &ChatMessage) {
        let [a, b] = &conversation.participants;
        self.feed.publish(vec![
            Topic::Conversation(conversation.id.clone()),
            Topic::Inbox(a.clone()),
            Topic::Inbox(b.clone()),
        ]);
        for emitter in &self.producers.message_sent_producer {
            let event = MessageSentEvent { conversation: conversation.clone(), message: message.clone() };
            emitter.publish_event(event).await;
        }
    }
}

fn not_a_participant(user: &UserId, conversation_id: &ConversationId) -> MarketError {
    MarketError::PermissionDenied(format!("{user} is not a participant of conversation {conversation_id}"))
}

#[cfg(test)]
mod test {
    use super::*;

    fn conversation(last_sender: Option<&str>, names: [&str; 2]) -> Conversation {
        Conversation {
            id: ConversationId::for_pair(&UserId::from("ana"), &UserId::from("budi")),
            participants: [UserId::from("ana"), UserId::from("budi")],
            participant_names: [names[0].to_string(), names[1].to_string()],
            last_message: "Sudah dikirim".into(),
            last_message_at: Some(Utc::now()),
            last_sender_id: last_sender.map(UserId::from),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn unread_means_the_other_side_spoke_last() {
        let c = conversation(Some("budi"), ["Ana", "Budi Tailor"]);
        let ana = ConversationSummary::for_viewer(&c, &UserId::from("ana"));
        assert!(ana.unread);
        assert_eq!(ana.other_name, "Budi Tailor");
        assert_eq!(ana.other_participant, UserId::from("budi"));
        let budi = ConversationSummary::for_viewer(&c, &UserId::from("budi"));
        assert!(!budi.unread);
        assert_eq!(budi.other_name, "Ana");
    }

    #[test]
    fn missing_names_fall_back() {
        let c = conversation(None, ["", "Budi"]);
        let summary = ConversationSummary::for_viewer(&c, &UserId::from("budi"));
        assert_eq!(summary.other_name, FALLBACK_DISPLAY_NAME);
        assert!(!summary.unread);
    }
}
