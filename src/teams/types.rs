use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    pub id: String,
    pub display_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Channel {
    pub id: String,
    pub display_name: String,
}

/// Membership of a user in a channel or chat
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    /// Membership ID (e.g., "MCMjMSMj...")
    pub id: String,

    /// Azure AD object ID of the member
    pub user_id: String,

    pub display_name: String,

    pub email: Option<String>,
}

impl Member {
    /// Does `reference` name this member by user ID, display name or email?
    ///
    /// Email comparison ignores case; everything else is exact.
    pub fn matches(&self, reference: &str) -> bool {
        self.user_id == reference
            || self.display_name == reference
            || self
                .email
                .as_deref()
                .is_some_and(|email| email.eq_ignore_ascii_case(reference))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChatType {
    OneOnOne,
    Group,
    Meeting,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chat {
    pub id: String,
    pub topic: Option<String>,
    pub chat_type: ChatType,
    #[serde(default)]
    pub members: Vec<Member>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub display_name: String,
    pub mail: Option<String>,
    pub user_principal_name: Option<String>,
}

impl User {
    pub fn matches(&self, reference: &str) -> bool {
        let same = |v: &Option<String>| {
            v.as_deref()
                .is_some_and(|v| v.eq_ignore_ascii_case(reference))
        };
        self.id == reference
            || self.display_name == reference
            || same(&self.mail)
            || same(&self.user_principal_name)
    }
}
