use crate::{
    db_types::{ChatMessage, Conversation, ConversationId, NewMessage, UserId},
    traits::StoreError,
};

#[allow(async_fn_in_trait)]
pub trait ConversationManagement {
    /// Appends a message to the conversation, creating the conversation on first contact.
    ///
    /// The store assigns the message timestamp. Timestamps are strictly increasing within a conversation, whatever
    /// the senders' clocks say. The conversation summary (last message, its time and sender) is updated in the same
    /// write as the append. `participants` carries the two ids with their display names; names are only used to
    /// seed the conversation document the first time.
    async fn append_message(
        &self,
        conversation_id: &ConversationId,
        participants: [(UserId, String); 2],
        message: NewMessage,
    ) -> Result<(Conversation, ChatMessage), StoreError>;

    async fn fetch_conversation(&self, conversation_id: &ConversationId) -> Result<Option<Conversation>, StoreError>;

    /// Every conversation `user` takes part in, most recently active first.
    async fn fetch_conversations_for(&self, user: &UserId) -> Result<Vec<Conversation>, StoreError>;

    /// The messages of a conversation in display order (timestamp ascending).
    async fn fetch_messages(&self, conversation_id: &ConversationId) -> Result<Vec<ChatMessage>, StoreError>;
}
