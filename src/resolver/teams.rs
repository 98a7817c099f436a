//! Reference resolution for each Teams resource kind

use crate::cache::{CacheHandler, CacheKeyBuilder, Pepper};
use crate::config::Settings;
use crate::error::{Result, TeamsResolverError};
use crate::resolver::engine::{Resolver, ResolverContext};
use crate::resolver::extract::match_single;
use crate::resolver::patterns;
use crate::teams::{Channel, Chat, ChatType, Member, Team, TeamsApi, User};
use std::sync::Arc;

const TEAM: &str = "team";
const CHANNEL: &str = "channel";
const CHANNEL_MEMBER: &str = "channel member";
const ONE_ON_ONE_CHAT: &str = "one-on-one chat";
const GROUP_CHAT: &str = "group chat";
const GROUP_CHAT_MEMBER: &str = "group chat member";
const USER: &str = "user";

/// Resolves names, topics and emails to Teams IDs
pub struct TeamsResolver {
    api: Arc<dyn TeamsApi>,
    resolver: Resolver,
    keys: CacheKeyBuilder,
}

impl TeamsResolver {
    pub fn new(api: Arc<dyn TeamsApi>, resolver: Resolver, keys: CacheKeyBuilder) -> Self {
        Self {
            api,
            resolver,
            keys,
        }
    }

    /// Wire a resolver from loaded settings
    pub fn from_settings(api: Arc<dyn TeamsApi>, settings: &Settings) -> Result<Self> {
        let cache = CacheHandler::from_config(&settings.cache)?.map(Arc::new);

        // Keyring reads and the first-run prompt block, so load before resolving
        let pepper = Pepper::configured(settings.resolver.pepper.as_deref());
        if cache.is_some() {
            pepper.get();
        }

        let resolver = Resolver::new(cache).with_fetch_timeout(settings.resolver.fetch_timeout);
        Ok(Self::new(
            api,
            resolver,
            CacheKeyBuilder::new(Arc::new(pepper)),
        ))
    }

    pub fn cache(&self) -> Option<&Arc<CacheHandler>> {
        self.resolver.cache()
    }

    pub fn keys(&self) -> &CacheKeyBuilder {
        &self.keys
    }

    pub async fn resolve_team_ref(&self, reference: &str) -> Result<String> {
        let reference = reference.trim();
        let ctx = ResolverContext::new(
            TEAM,
            reference,
            patterns::is_guid,
            || self.keys.team(reference),
            || self.api.list_joined_teams(),
            |teams: Vec<Team>, r: &str| match_single(TEAM, r, &teams, |t| t.display_name == r),
        );
        self.resolver.resolve(ctx).await
    }

    pub async fn resolve_channel_ref(&self, team_id: &str, reference: &str) -> Result<String> {
        let team_id = coordinate(team_id)?;
        let reference = reference.trim();
        let ctx = ResolverContext::new(
            CHANNEL,
            reference,
            patterns::is_channel_id,
            || self.keys.channel(team_id, reference),
            || self.api.list_channels(team_id),
            |channels: Vec<Channel>, r: &str| {
                match_single(CHANNEL, r, &channels, |c| c.display_name == r)
            },
        );
        self.resolver.resolve(ctx).await
    }

    pub async fn resolve_channel_member_ref(
        &self,
        team_id: &str,
        channel_id: &str,
        reference: &str,
    ) -> Result<String> {
        let team_id = coordinate(team_id)?;
        let channel_id = coordinate(channel_id)?;
        let reference = reference.trim();
        let ctx = ResolverContext::new(
            CHANNEL_MEMBER,
            reference,
            patterns::is_membership_id,
            || self.keys.channel_member(team_id, channel_id, reference),
            || self.api.list_channel_members(team_id, channel_id),
            |members: Vec<Member>, r: &str| {
                match_single(CHANNEL_MEMBER, r, &members, |m| m.matches(r))
            },
        );
        self.resolver.resolve(ctx).await
    }

    /// One-on-one chat with the user named by `user_ref`
    pub async fn resolve_one_on_one_chat_ref(&self, user_ref: &str) -> Result<String> {
        let user_ref = user_ref.trim();
        let ctx = ResolverContext::new(
            ONE_ON_ONE_CHAT,
            user_ref,
            patterns::is_one_on_one_chat_id,
            || self.keys.direct_chat(user_ref),
            || self.api.list_chats(ChatType::OneOnOne),
            |chats: Vec<Chat>, r: &str| {
                match_single(ONE_ON_ONE_CHAT, r, &chats, |c| {
                    c.chat_type == ChatType::OneOnOne && c.members.iter().any(|m| m.matches(r))
                })
            },
        );
        self.resolver.resolve(ctx).await
    }

    pub async fn resolve_group_chat_ref(&self, topic: &str) -> Result<String> {
        let topic = topic.trim();
        let ctx = ResolverContext::new(
            GROUP_CHAT,
            topic,
            patterns::is_group_chat_id,
            || self.keys.group_chat(topic),
            || self.api.list_chats(ChatType::Group),
            |chats: Vec<Chat>, r: &str| {
                match_single(GROUP_CHAT, r, &chats, |c| c.topic.as_deref() == Some(r))
            },
        );
        self.resolver.resolve(ctx).await
    }

    pub async fn resolve_group_chat_member_ref(
        &self,
        chat_id: &str,
        reference: &str,
    ) -> Result<String> {
        let chat_id = coordinate(chat_id)?;
        let reference = reference.trim();
        let ctx = ResolverContext::new(
            GROUP_CHAT_MEMBER,
            reference,
            patterns::is_membership_id,
            || self.keys.group_chat_member(chat_id, reference),
            || self.api.list_chat_members(chat_id),
            |members: Vec<Member>, r: &str| {
                match_single(GROUP_CHAT_MEMBER, r, &members, |m| m.matches(r))
            },
        );
        self.resolver.resolve(ctx).await
    }

    pub async fn resolve_user_ref(&self, reference: &str) -> Result<String> {
        let reference = reference.trim();
        let ctx = ResolverContext::new(
            USER,
            reference,
            patterns::is_guid,
            || self.keys.user(reference),
            || self.api.find_users(reference),
            |users: Vec<User>, r: &str| {
                // A directory search with no hits means the user does not exist
                if users.is_empty() {
                    return Err(TeamsResolverError::ResourceNotFound {
                        kind: USER,
                        reference: r.to_string(),
                    });
                }
                match_single(USER, r, &users, |u| u.matches(r))
            },
        );
        self.resolver.resolve(ctx).await
    }
}

/// Parent coordinates must be present
fn coordinate(value: &str) -> Result<&str> {
    let value = value.trim();
    if value.is_empty() {
        return Err(TeamsResolverError::EmptyReference);
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::testing::RecordingCache;
    use crate::cache::{StaticPepper, TaskRunner};
    use crate::error::RequestError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeApi {
        teams: Vec<Team>,
        channels: Vec<Channel>,
        members: Vec<Member>,
        chats: Vec<Chat>,
        users: Vec<User>,
        failure: Option<RequestError>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeApi {
        fn record(&self, call: String) -> Result<()> {
            self.calls.lock().unwrap().push(call);
            match &self.failure {
                Some(e) => Err(e.clone().into()),
                None => Ok(()),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl TeamsApi for FakeApi {
        async fn list_joined_teams(&self) -> Result<Vec<Team>> {
            self.record("teams".to_string())?;
            Ok(self.teams.clone())
        }

        async fn list_channels(&self, team_id: &str) -> Result<Vec<Channel>> {
            self.record(format!("channels {team_id}"))?;
            Ok(self.channels.clone())
        }

        async fn list_channel_members(
            &self,
            team_id: &str,
            channel_id: &str,
        ) -> Result<Vec<Member>> {
            self.record(format!("channel members {team_id} {channel_id}"))?;
            Ok(self.members.clone())
        }

        async fn list_chats(&self, chat_type: ChatType) -> Result<Vec<Chat>> {
            self.record(format!("chats {chat_type:?}"))?;
            Ok(self
                .chats
                .iter()
                .filter(|c| c.chat_type == chat_type)
                .cloned()
                .collect())
        }

        async fn list_chat_members(&self, chat_id: &str) -> Result<Vec<Member>> {
            self.record(format!("chat members {chat_id}"))?;
            Ok(self.members.clone())
        }

        async fn find_users(&self, reference: &str) -> Result<Vec<User>> {
            self.record(format!("users {reference}"))?;
            Ok(self.users.clone())
        }
    }

    fn member(id: &str, user_id: &str, name: &str, email: &str) -> Member {
        Member {
            id: id.to_string(),
            user_id: user_id.to_string(),
            display_name: name.to_string(),
            email: Some(email.to_string()),
        }
    }

    fn keys() -> CacheKeyBuilder {
        CacheKeyBuilder::new(Arc::new(Pepper::new(StaticPepper::new("pepper"))))
    }

    fn resolver(api: Arc<FakeApi>, store: Option<Arc<RecordingCache>>) -> TeamsResolver {
        let cache = store.map(|s| Arc::new(CacheHandler::new(s, TaskRunner::sync())));
        TeamsResolver::new(api, Resolver::new(cache), keys())
    }

    #[tokio::test]
    async fn test_team_by_name() {
        let api = Arc::new(FakeApi {
            teams: vec![
                Team {
                    id: "t1".to_string(),
                    display_name: "Engineering".to_string(),
                },
                Team {
                    id: "t2".to_string(),
                    display_name: "Sales".to_string(),
                },
            ],
            ..Default::default()
        });
        let store = Arc::new(RecordingCache::default());
        let teams = resolver(api.clone(), Some(store.clone()));

        assert_eq!(teams.resolve_team_ref(" Sales ").await.unwrap(), "t2");
        assert!(store.calls().contains(&"set $team$:Sales t2".to_string()));

        // Second lookup is served from the cache
        assert_eq!(teams.resolve_team_ref("Sales").await.unwrap(), "t2");
        assert_eq!(api.calls(), vec!["teams".to_string()]);
    }

    #[tokio::test]
    async fn test_team_guid_passes_through() {
        let api = Arc::new(FakeApi::default());
        let teams = resolver(api.clone(), Some(Arc::new(RecordingCache::default())));
        let guid = "0f8f7d9e-6b2a-4c1d-9e3f-5a6b7c8d9e0f";

        assert_eq!(teams.resolve_team_ref(guid).await.unwrap(), guid);
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_channel_scenario() {
        let api = Arc::new(FakeApi {
            channels: vec![
                Channel {
                    id: "c1".to_string(),
                    display_name: "General".to_string(),
                },
                Channel {
                    id: "c2".to_string(),
                    display_name: "Random".to_string(),
                },
            ],
            ..Default::default()
        });
        let store = Arc::new(RecordingCache::default());
        let teams = resolver(api.clone(), Some(store.clone()));

        assert_eq!(teams.resolve_channel_ref("t1", "General").await.unwrap(), "c1");
        let sets: Vec<_> = store
            .calls()
            .into_iter()
            .filter(|c| c.starts_with("set"))
            .collect();
        assert_eq!(sets, vec!["set $channel$:t1:General c1".to_string()]);
        assert_eq!(api.calls(), vec!["channels t1".to_string()]);
    }

    #[tokio::test]
    async fn test_channel_requires_team() {
        let teams = resolver(Arc::new(FakeApi::default()), None);
        let err = teams.resolve_channel_ref("  ", "General").await.unwrap_err();
        assert!(matches!(err, TeamsResolverError::EmptyReference));
    }

    #[tokio::test]
    async fn test_channel_member_by_email_is_hashed_in_key() {
        let api = Arc::new(FakeApi {
            members: vec![
                member("MCMjMQ==", "u1", "Jane Doe", "jane@contoso.com"),
                member("MCMjMg==", "u2", "John Roe", "john@contoso.com"),
            ],
            ..Default::default()
        });
        let store = Arc::new(RecordingCache::default());
        let teams = resolver(api, Some(store.clone()));

        let id = teams
            .resolve_channel_member_ref("t1", "c1", "Jane@Contoso.com")
            .await
            .unwrap();
        assert_eq!(id, "MCMjMQ==");

        let expected_key = keys().channel_member("t1", "c1", "jane@contoso.com");
        assert!(
            store
                .calls()
                .contains(&format!("set {} MCMjMQ==", expected_key))
        );
        assert!(store.calls().iter().all(|c| !c.contains("jane")));
    }

    #[tokio::test]
    async fn test_names_differing_in_case_stay_distinct_in_cache() {
        let api = Arc::new(FakeApi {
            members: vec![
                member("MCMjMQ==", "u1", "Alex", "alex.one@contoso.com"),
                member("MCMjMg==", "u2", "alex", "alex.two@contoso.com"),
            ],
            ..Default::default()
        });
        let cold = resolver(api.clone(), None)
            .resolve_channel_member_ref("t1", "c1", "alex")
            .await
            .unwrap();

        let warm = resolver(api, Some(Arc::new(RecordingCache::default())));
        let upper = warm
            .resolve_channel_member_ref("t1", "c1", "Alex")
            .await
            .unwrap();
        let lower = warm
            .resolve_channel_member_ref("t1", "c1", "alex")
            .await
            .unwrap();

        assert_eq!(cold, "MCMjMg==");
        assert_eq!(upper, "MCMjMQ==");
        assert_eq!(lower, cold);
    }

    #[tokio::test]
    async fn test_member_ambiguous_display_name() {
        let api = Arc::new(FakeApi {
            members: vec![
                member("MCMjMQ==", "u1", "Alex Kim", "alex.kim@contoso.com"),
                member("MCMjMg==", "u2", "Alex Kim", "alex.kim2@contoso.com"),
            ],
            ..Default::default()
        });
        let teams = resolver(api, None);

        let err = teams
            .resolve_group_chat_member_ref("19:x@thread.v2", "Alex Kim")
            .await
            .unwrap_err();
        match err {
            TeamsResolverError::ResourceAmbiguous { candidates, .. } => {
                assert_eq!(candidates.len(), 2);
                assert!(candidates[0].ends_with("(ID: MCMjMQ==)"));
                assert!(candidates[1].ends_with("(ID: MCMjMg==)"));
            }
            other => panic!("expected ambiguity, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_one_on_one_chat_by_member() {
        let me = member("MCMjMA==", "me", "Me", "me@contoso.com");
        let api = Arc::new(FakeApi {
            chats: vec![
                Chat {
                    id: "19:me_u1@unq.gbl.spaces".to_string(),
                    topic: None,
                    chat_type: ChatType::OneOnOne,
                    members: vec![
                        me.clone(),
                        member("MCMjMQ==", "u1", "Jane", "jane@contoso.com"),
                    ],
                },
                Chat {
                    id: "19:me_u2@unq.gbl.spaces".to_string(),
                    topic: None,
                    chat_type: ChatType::OneOnOne,
                    members: vec![me, member("MCMjMg==", "u2", "John", "john@contoso.com")],
                },
            ],
            ..Default::default()
        });
        let teams = resolver(api.clone(), None);

        assert_eq!(
            teams
                .resolve_one_on_one_chat_ref("john@contoso.com")
                .await
                .unwrap(),
            "19:me_u2@unq.gbl.spaces"
        );
        assert_eq!(
            teams
                .resolve_one_on_one_chat_ref("19:me_u1@unq.gbl.spaces")
                .await
                .unwrap(),
            "19:me_u1@unq.gbl.spaces"
        );
        assert_eq!(api.calls(), vec!["chats OneOnOne".to_string()]);
    }

    #[tokio::test]
    async fn test_group_chat_by_topic() {
        let api = Arc::new(FakeApi {
            chats: vec![
                Chat {
                    id: "19:a@thread.v2".to_string(),
                    topic: Some("Launch".to_string()),
                    chat_type: ChatType::Group,
                    members: vec![],
                },
                Chat {
                    id: "19:b@thread.v2".to_string(),
                    topic: None,
                    chat_type: ChatType::Group,
                    members: vec![],
                },
            ],
            ..Default::default()
        });
        let teams = resolver(api, None);

        assert_eq!(
            teams.resolve_group_chat_ref("Launch").await.unwrap(),
            "19:a@thread.v2"
        );
        assert!(matches!(
            teams.resolve_group_chat_ref("Retro").await,
            Err(TeamsResolverError::ResourceNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_no_chats_is_unavailable() {
        let teams = resolver(Arc::new(FakeApi::default()), None);
        assert!(matches!(
            teams.resolve_group_chat_ref("Launch").await,
            Err(TeamsResolverError::ResourcesUnavailable { .. })
        ));
    }

    #[tokio::test]
    async fn test_user_search_without_hits_is_not_found() {
        let teams = resolver(Arc::new(FakeApi::default()), None);
        assert!(matches!(
            teams.resolve_user_ref("ghost@contoso.com").await,
            Err(TeamsResolverError::ResourceNotFound { kind: "user", .. })
        ));
    }

    #[tokio::test]
    async fn test_user_by_upn() {
        let api = Arc::new(FakeApi {
            users: vec![User {
                id: "u1".to_string(),
                display_name: "Jane Doe".to_string(),
                mail: None,
                user_principal_name: Some("jane@contoso.com".to_string()),
            }],
            ..Default::default()
        });
        let teams = resolver(api.clone(), None);

        assert_eq!(teams.resolve_user_ref("jane@contoso.com").await.unwrap(), "u1");
        assert_eq!(api.calls(), vec!["users jane@contoso.com".to_string()]);
    }

    #[tokio::test]
    async fn test_not_found_remote_error_clears_cache() {
        let api = Arc::new(FakeApi {
            failure: Some(RequestError::new(404, "team gone")),
            ..Default::default()
        });
        let store = Arc::new(RecordingCache::default());
        store.preload("$team$:Sales", &["t2", "t9"]);
        let teams = resolver(api, Some(store.clone()));

        let err = teams.resolve_channel_ref("t2", "General").await.unwrap_err();
        assert_eq!(err.status_code(), Some(404));
        assert_eq!(store.calls().iter().filter(|c| *c == "clear").count(), 1);
        assert!(store.entries.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_from_settings_with_disabled_cache() {
        let settings = Settings {
            cache: crate::config::CacheConfig {
                mode: crate::config::CacheMode::Disabled,
                ..Default::default()
            },
            resolver: crate::config::ResolverConfig {
                fetch_timeout: None,
                pepper: Some("configured".to_string()),
            },
        };
        let teams = TeamsResolver::from_settings(Arc::new(FakeApi::default()), &settings).unwrap();
        assert!(teams.cache().is_none());
        assert!(!teams.keys().pepper().is_loaded());
    }

    #[tokio::test]
    async fn test_from_settings_loads_pepper_before_first_resolve() {
        let dir = tempfile::TempDir::new().unwrap();
        let settings = Settings {
            cache: crate::config::CacheConfig {
                mode: crate::config::CacheMode::Sync,
                provider: crate::config::CacheProvider::JsonFile,
                path: dir.path().join("cache.json"),
            },
            resolver: crate::config::ResolverConfig {
                fetch_timeout: None,
                pepper: Some("configured".to_string()),
            },
        };
        let teams = TeamsResolver::from_settings(Arc::new(FakeApi::default()), &settings).unwrap();

        assert!(teams.cache().is_some());
        assert!(teams.keys().pepper().is_loaded());
        assert_eq!(teams.keys().pepper().get(), "configured");
    }
}
