use entity::conversation::{self, Message, MessageDraft};
use platform_api::ApiResult;
use platform_client::{BackendClient, Direction};
use tracing::{instrument, warn};
use uuid::Uuid;

use crate::service::{CrudService, ListParams};

/// Conversation threads and their messages.
#[derive(Clone)]
pub struct ConversationService {
    threads: CrudService<conversation::Model>,
    messages: CrudService<Message>,
}

impl ConversationService {
    pub fn new(client: BackendClient) -> Self {
        Self {
            threads: CrudService::new(client.clone()),
            messages: CrudService::new(client),
        }
    }

    pub fn threads(&self) -> &CrudService<conversation::Model> {
        &self.threads
    }

    pub async fn inbox(&self, params: ListParams) -> ApiResult<Vec<conversation::Model>> {
        self.threads
            .list(params.ordered("last_message_at", Direction::Desc))
            .await
    }

    /// Messages of one thread, oldest first.
    pub async fn messages(&self, conversation_id: Uuid, params: ListParams) -> ApiResult<Vec<Message>> {
        params
            .ordered("created_at", Direction::Asc)
            .apply(self.messages.query().eq("conversation_id", conversation_id))
            .select()
            .await
    }

    /// Stores the message and bumps the thread's last activity.
    #[instrument(name = "crm.conversations.send_message", skip(self, draft), fields(conversation = %draft.conversation_id))]
    pub async fn send_message(&self, draft: &MessageDraft) -> ApiResult<Message> {
        let message = self.messages.create(draft).await?;
        let changes = conversation::Changes {
            last_message_at: Some(message.created_at),
            ..Default::default()
        };
        if let Err(err) = self.threads.update(draft.conversation_id, &changes).await {
            warn!(error = %err, "message stored but thread activity not updated");
        }
        Ok(message)
    }

    pub async fn mark_read(&self, conversation_id: Uuid) -> ApiResult<conversation::Model> {
        let changes = conversation::Changes {
            unread_count: Some(0),
            ..Default::default()
        };
        self.threads.update(conversation_id, &changes).await
    }
}
