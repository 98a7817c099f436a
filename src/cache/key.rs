//! Namespaced cache keys
//!
//! Keys look like `$channel$:<team id>:<channel name>`. Every part is
//! trimmed; parts that identify a person are replaced by a peppered SHA-256
//! digest so the cache file never holds emails or UPNs in the clear.

use crate::cache::pepper::Pepper;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

const HASH_SEPARATOR: &str = ":";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheNamespace {
    Team,
    Channel,
    ChannelMember,
    GroupChat,
    DirectChat,
    GroupChatMember,
    User,
}

impl CacheNamespace {
    pub const ALL: [CacheNamespace; 7] = [
        CacheNamespace::Team,
        CacheNamespace::Channel,
        CacheNamespace::ChannelMember,
        CacheNamespace::GroupChat,
        CacheNamespace::DirectChat,
        CacheNamespace::GroupChatMember,
        CacheNamespace::User,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CacheNamespace::Team => "team",
            CacheNamespace::Channel => "channel",
            CacheNamespace::ChannelMember => "channel-member",
            CacheNamespace::GroupChat => "group-chat",
            CacheNamespace::DirectChat => "direct-chat",
            CacheNamespace::GroupChatMember => "group-chat-member",
            CacheNamespace::User => "user",
        }
    }
}

impl fmt::Display for CacheNamespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CacheNamespace {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|ns| ns.as_str() == s.trim())
            .ok_or_else(|| format!("unknown cache namespace '{}'", s))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey(pub String);

impl CacheKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One component of a cache key
#[derive(Debug, Clone, Copy)]
pub enum KeyPart<'a> {
    /// IDs, names and topics, stored verbatim
    Plain(&'a str),
    /// Emails, UPNs and other person references, stored hashed
    Identity(&'a str),
}

/// Peppered one-way hash of a value, hex encoded
pub fn hash_identity(pepper: &str, value: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(pepper.as_bytes());
    hasher.update(HASH_SEPARATOR.as_bytes());
    hasher.update(value.as_bytes());
    hex::encode(hasher.finalize())
}

/// Builds cache keys, hashing identity parts with the process pepper
#[derive(Debug, Clone)]
pub struct CacheKeyBuilder {
    pepper: Arc<Pepper>,
}

impl CacheKeyBuilder {
    pub fn new(pepper: Arc<Pepper>) -> Self {
        Self { pepper }
    }

    pub fn pepper(&self) -> &Pepper {
        &self.pepper
    }

    pub fn build(&self, namespace: CacheNamespace, parts: &[KeyPart<'_>]) -> CacheKey {
        let mut key = format!("${}$", namespace.as_str());
        for part in parts {
            key.push(':');
            match part {
                KeyPart::Plain(value) => key.push_str(value.trim()),
                KeyPart::Identity(value) => key.push_str(&self.hash(value)),
            }
        }
        CacheKey(key)
    }

    /// Hash of the trimmed identity reference
    ///
    /// Emails and UPNs match case-insensitively and are folded first. Names
    /// and object IDs match exactly, so their case is kept.
    pub fn hash(&self, value: &str) -> String {
        let value = value.trim();
        if value.contains('@') {
            hash_identity(self.pepper.get(), &value.to_ascii_lowercase())
        } else {
            hash_identity(self.pepper.get(), value)
        }
    }

    pub fn team(&self, name: &str) -> CacheKey {
        self.build(CacheNamespace::Team, &[KeyPart::Plain(name)])
    }

    pub fn channel(&self, team_id: &str, name: &str) -> CacheKey {
        self.build(
            CacheNamespace::Channel,
            &[KeyPart::Plain(team_id), KeyPart::Plain(name)],
        )
    }

    pub fn channel_member(&self, team_id: &str, channel_id: &str, user_ref: &str) -> CacheKey {
        self.build(
            CacheNamespace::ChannelMember,
            &[
                KeyPart::Plain(team_id),
                KeyPart::Plain(channel_id),
                KeyPart::Identity(user_ref),
            ],
        )
    }

    pub fn group_chat(&self, topic: &str) -> CacheKey {
        self.build(CacheNamespace::GroupChat, &[KeyPart::Plain(topic)])
    }

    pub fn direct_chat(&self, user_ref: &str) -> CacheKey {
        self.build(CacheNamespace::DirectChat, &[KeyPart::Identity(user_ref)])
    }

    pub fn group_chat_member(&self, chat_id: &str, user_ref: &str) -> CacheKey {
        self.build(
            CacheNamespace::GroupChatMember,
            &[KeyPart::Plain(chat_id), KeyPart::Identity(user_ref)],
        )
    }

    pub fn user(&self, user_ref: &str) -> CacheKey {
        self.build(CacheNamespace::User, &[KeyPart::Identity(user_ref)])
    }
}
