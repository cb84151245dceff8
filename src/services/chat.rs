//! Customer support chat and the product assistant.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{failed, fetch_list, required, ListQuery, ServiceResult};
use crate::resource::{read_empty, ListBuilder, RecordList};
use crate::{FanStore, ServiceError};

/// Longest message the support chat accepts.
pub const MAX_MESSAGE_LENGTH: usize = 2000;

/// A support thread between a customer and the staff.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    /// Unique identifier.
    #[serde(deserialize_with = "crate::resource::deserialize_id")]
    pub id: String,
    /// Subject shown in the conversation list.
    #[serde(default)]
    pub title: Option<String>,
    /// The customer who opened the thread.
    #[serde(default, deserialize_with = "crate::resource::deserialize_optional_id")]
    pub customer_id: Option<String>,
    /// Preview of the latest message.
    #[serde(default)]
    pub last_message: Option<String>,
    /// Messages the caller has not read yet.
    #[serde(default)]
    pub unread_count: u32,
    /// Time of the latest activity.
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// One message of a conversation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    /// Unique identifier.
    #[serde(deserialize_with = "crate::resource::deserialize_id")]
    pub id: String,
    /// The conversation it belongs to.
    #[serde(default, deserialize_with = "crate::resource::deserialize_optional_id")]
    pub conversation_id: Option<String>,
    /// Author, absent for assistant answers.
    #[serde(default, deserialize_with = "crate::resource::deserialize_optional_id")]
    pub sender_id: Option<String>,
    /// Author display name.
    #[serde(default)]
    pub sender_name: Option<String>,
    /// Text of the message.
    pub content: String,
    /// Whether the product assistant wrote it.
    #[serde(default, alias = "isBot")]
    pub from_bot: bool,
    /// Sending time.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// What the product assistant answered.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssistantReply {
    /// The answer.
    #[serde(alias = "answer", alias = "message")]
    pub reply: String,
    /// Follow-up questions offered to the customer.
    #[serde(default)]
    pub suggestions: Vec<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct OutgoingMessage<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    conversation_id: Option<&'a str>,
    content: &'a str,
}

#[derive(Serialize)]
struct Question<'a> {
    message: &'a str,
}

/// Customer support chat and the product assistant.
pub struct Chat<'a> {
    client: &'a FanStore,
}

impl FanStore {
    /// Customer support chat.
    #[must_use]
    pub const fn chat(&self) -> Chat<'_> {
        Chat { client: self }
    }
}

impl Chat<'_> {
    /// Conversations visible to the signed-in user, latest first.
    pub async fn conversations(&self) -> ServiceResult<RecordList<Conversation>> {
        self.client
            .get_list(&self.client.endpoint("chat/conversations"), None)
            .await
            .map_err(|error| failed(error, "Failed to load conversations."))
    }

    /// A page of messages of one conversation.
    pub async fn messages(&self, conversation_id: &str, query: &ListQuery) -> ServiceResult<RecordList<ChatMessage>> {
        let conversation_id = required(conversation_id, "Conversation id")?;
        let url = self
            .client
            .endpoint_with("chat/conversations", &[conversation_id.as_str(), "messages"]);

        fetch_list(
            query.apply(ListBuilder::at(self.client, url)),
            "Failed to load messages.",
        )
        .await
    }

    /// Posts a message.
    ///
    /// Without a `conversation_id` the backend opens a new conversation.
    pub async fn send(&self, conversation_id: Option<&str>, content: &str) -> ServiceResult<ChatMessage> {
        let content = checked_message(content)?;
        let message = OutgoingMessage {
            conversation_id: conversation_id.map(str::trim).filter(|id| !id.is_empty()),
            content: &content,
        };

        self.client
            .post_data(&self.client.endpoint("chat/messages"), &message)
            .await
            .map_err(|error| failed(error, "Failed to send message."))
    }

    /// Marks every message of a conversation as read.
    pub async fn mark_read(&self, conversation_id: &str) -> ServiceResult<()> {
        let conversation_id = required(conversation_id, "Conversation id")?;
        let url = self
            .client
            .endpoint_with("chat/conversations", &[conversation_id.as_str(), "read"]);

        let request = self.client.request_post(&url);
        let response = self
            .client
            .send(request)
            .await
            .map_err(|error| failed(error, "Failed to update conversation."))?;

        read_empty(response)
            .await
            .map_err(|error| failed(error, "Failed to update conversation."))
    }

    /// Asks the product assistant a question.
    pub async fn ask_assistant(&self, question: &str) -> ServiceResult<AssistantReply> {
        let question = checked_message(question)?;

        self.client
            .post_data(&self.client.endpoint("chat/bot"), &Question { message: &question })
            .await
            .map_err(|error| failed(error, "The assistant is unavailable right now."))
    }
}

fn checked_message(content: &str) -> ServiceResult<String> {
    let content = required(content, "Message")?;

    if content.chars().count() > MAX_MESSAGE_LENGTH {
        return Err(ServiceError::invalid_input(format!(
            "Message cannot be longer than {MAX_MESSAGE_LENGTH} characters."
        )));
    }

    Ok(content)
}
