use crate::error::Result;
use crate::teams::{Channel, Chat, ChatType, Member, Team, User};
use async_trait::async_trait;

/// Remote Teams API as seen by the resolver
///
/// Each call returns the full, unfiltered candidate list; matching happens
/// on the resolver side. Failures surface as `TeamsResolverError::Remote`.
#[async_trait]
pub trait TeamsApi: Send + Sync {
    async fn list_joined_teams(&self) -> Result<Vec<Team>>;

    async fn list_channels(&self, team_id: &str) -> Result<Vec<Channel>>;

    async fn list_channel_members(&self, team_id: &str, channel_id: &str)
    -> Result<Vec<Member>>;

    /// Chats of the signed-in user, restricted to `chat_type`, with members expanded
    async fn list_chats(&self, chat_type: ChatType) -> Result<Vec<Chat>>;

    async fn list_chat_members(&self, chat_id: &str) -> Result<Vec<Member>>;

    /// Directory users whose name, mail or UPN may equal `reference`
    async fn find_users(&self, reference: &str) -> Result<Vec<User>>;
}
