//! Structural checks for references that are already Teams IDs

use regex::Regex;
use std::sync::LazyLock;

static CHANNEL_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^19:[^\s@]+@thread\.(tacv2|skype)$").expect("valid channel id regex")
});

static GROUP_CHAT_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^19:[^\s@]+@thread\.v2$").expect("valid chat id regex"));

static ONE_ON_ONE_CHAT_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^19:[^\s@]+@unq\.gbl\.spaces$").expect("valid one-on-one chat id regex")
});

// Membership IDs are base64 and start with the encoding of "0#"
static MEMBERSHIP_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^MCMj[A-Za-z0-9+/]+={0,2}$").expect("valid membership id regex")
});

/// Team, user and tenant IDs
pub fn is_guid(reference: &str) -> bool {
    reference.len() == 36 && uuid::Uuid::try_parse(reference).is_ok()
}

/// `19:<thread>@thread.tacv2` or legacy `@thread.skype`
pub fn is_channel_id(reference: &str) -> bool {
    CHANNEL_ID_RE.is_match(reference)
}

/// `19:<thread>@thread.v2`
pub fn is_group_chat_id(reference: &str) -> bool {
    GROUP_CHAT_ID_RE.is_match(reference)
}

/// `19:<user>_<user>@unq.gbl.spaces`
pub fn is_one_on_one_chat_id(reference: &str) -> bool {
    ONE_ON_ONE_CHAT_ID_RE.is_match(reference)
}

/// Any chat ID
pub fn is_chat_id(reference: &str) -> bool {
    is_group_chat_id(reference) || is_one_on_one_chat_id(reference)
}

pub fn is_membership_id(reference: &str) -> bool {
    MEMBERSHIP_ID_RE.is_match(reference)
}
