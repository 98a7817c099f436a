//! Exact matching of a reference against fetched candidates

use crate::error::{Result, TeamsResolverError};
use crate::teams::{Channel, Chat, Member, Team, User};

/// Something a reference can resolve to
pub trait Candidate {
    fn id(&self) -> &str;

    /// Human readable name used when listing matches for `reference`
    fn label(&self, reference: &str) -> String;
}

impl Candidate for Team {
    fn id(&self) -> &str {
        &self.id
    }

    fn label(&self, _reference: &str) -> String {
        self.display_name.clone()
    }
}

impl Candidate for Channel {
    fn id(&self) -> &str {
        &self.id
    }

    fn label(&self, _reference: &str) -> String {
        self.display_name.clone()
    }
}

impl Candidate for Member {
    fn id(&self) -> &str {
        &self.id
    }

    fn label(&self, _reference: &str) -> String {
        match &self.email {
            Some(email) => format!("{} <{}>", self.display_name, email),
            None => self.display_name.clone(),
        }
    }
}

impl Candidate for Chat {
    fn id(&self) -> &str {
        &self.id
    }

    /// Topic if set, otherwise the member `reference` names
    fn label(&self, reference: &str) -> String {
        if let Some(topic) = self.topic.as_deref().filter(|t| !t.is_empty()) {
            return topic.to_string();
        }
        match self.members.iter().find(|m| m.matches(reference)) {
            Some(member) => member.display_name.clone(),
            None => self
                .members
                .iter()
                .map(|m| m.display_name.as_str())
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}

impl Candidate for User {
    fn id(&self) -> &str {
        &self.id
    }

    fn label(&self, _reference: &str) -> String {
        match self.user_principal_name.as_deref().or(self.mail.as_deref()) {
            Some(upn) => format!("{} <{}>", self.display_name, upn),
            None => self.display_name.clone(),
        }
    }
}

/// Resolve `reference` to the ID of the one candidate satisfying `is_match`
///
/// Zero matches is `ResourceNotFound`, several is `ResourceAmbiguous` listing
/// every match in fetch order, and a lone match without an ID is
/// `ResourceEmptyId`. An empty candidate list is `ResourcesUnavailable`.
pub fn match_single<T, F>(
    kind: &'static str,
    reference: &str,
    candidates: &[T],
    is_match: F,
) -> Result<String>
where
    T: Candidate,
    F: Fn(&T) -> bool,
{
    if candidates.is_empty() {
        return Err(TeamsResolverError::ResourcesUnavailable { kind });
    }

    let matches: Vec<&T> = candidates.iter().filter(|&c| is_match(c)).collect();

    match matches.as_slice() {
        [] => Err(TeamsResolverError::ResourceNotFound {
            kind,
            reference: reference.to_string(),
        }),
        [only] if only.id().is_empty() => Err(TeamsResolverError::ResourceEmptyId {
            kind,
            reference: reference.to_string(),
        }),
        [only] => Ok(only.id().to_string()),
        many => Err(TeamsResolverError::ResourceAmbiguous {
            kind,
            reference: reference.to_string(),
            candidates: many
                .iter()
                .map(|c| format!("{} (ID: {})", c.label(reference), c.id()))
                .collect(),
        }),
    }
}
