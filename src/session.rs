//! Session state shared by the poll tasks and the user-triggered handlers.

use crate::Identity;
use std::sync::{Arc, PoisonError, RwLock};

/// Holds the identity of the current mailbox, if one has been provisioned.
///
/// Cloning shares the same slot. At most one identity is held at a time.
#[derive(Debug, Clone, Default)]
pub struct Session {
    identity: Arc<RwLock<Option<Identity>>>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// The active identity, or `None` before provisioning and after teardown.
    pub fn identity(&self) -> Option<Identity> {
        self.identity
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Install `identity`, replacing any previous one.
    pub fn replace(&self, identity: Identity) -> Option<Identity> {
        self.identity
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(identity)
    }

    pub fn clear(&self) -> Option<Identity> {
        self.identity
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}

/// What the page shows for the provisioned mailbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
    /// `uuid@domain`, also the clipboard text of the address field.
    pub mailbox: String,
    /// Feed URL put on the clipboard by the RSS link.
    pub rss_url: String,
}

impl Address {
    pub fn new(identity: &Identity, domain: &str, rss_url: impl Into<String>) -> Self {
        Self {
            mailbox: format!("{identity}@{domain}"),
            rss_url: rss_url.into(),
        }
    }
}
