//! Wire models for the mailbox service.

use serde::Deserialize;
use std::fmt;

/// Opaque token naming a temporary mailbox.
///
/// The server hands one out on `POST /user/`. The client never looks inside
/// it; it only ends up in endpoint paths and in the display address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// User record returned by the create/renew endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct UserRecord {
    /// Server-side row id.
    #[serde(default)]
    pub id: Option<i64>,
    /// The mailbox identity.
    pub uuid: Identity,
    /// Unix time of the last renewal.
    #[serde(default)]
    pub last_active: Option<f64>,
}

/// One row of the inbox listing.
#[derive(Debug, Clone, Deserialize)]
pub struct MailSummary {
    /// Message id, used in detail and render paths.
    pub id: i64,
    /// Envelope sender.
    pub sender: String,
    /// Subject line; may be missing or empty.
    #[serde(default)]
    pub subject: Option<String>,
    /// Receive time, `%Y-%m-%d %H:%M:%S`.
    pub create_time: String,
    /// Date header of the message.
    #[serde(default)]
    pub send_time: Option<String>,
}

/// Full message as returned by `GET /mail/{uuid}/{id}`.
///
/// Every field is optional because the server answers `{}` for an unknown id.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MailDetail {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub sender: Option<String>,
    /// Plain text body.
    #[serde(default)]
    pub content: Option<String>,
    /// HTML body.
    #[serde(default)]
    pub html_content: Option<String>,
    #[serde(default)]
    pub create_time: Option<String>,
    #[serde(default)]
    pub send_time: Option<String>,
}
