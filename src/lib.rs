//! Temporary mailbox client
//!
//! An async Rust client for a self-hosted disposable email service, together with the
//! page logic that drives it: a [`Mailbox`] controller that provisions an address and
//! polls its inbox, and a [`Notifier`] for transient toast messages.
//!
//! # Example
//! ```no_run
//! use tempmail_client::Client;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), tempmail_client::Error> {
//!     let client = Client::new("https://mail.example.com")?;
//!     let user = client.create_user(None).await?;
//!     println!("Created: {}@mail.example.com", user.uuid);
//!
//!     let messages = client.list_mail(&user.uuid).await?;
//!     for msg in messages {
//!         println!("From: {}, Subject: {:?}", msg.sender, msg.subject);
//!     }
//!
//!     client.delete_user(&user.uuid).await?;
//!     Ok(())
//! }
//! ```

mod client;
mod error;
pub mod mailbox;
mod models;
pub mod notify;
pub mod schedule;
mod session;

pub use client::{Client, ClientBuilder};
pub use error::Error;
pub use mailbox::{DetailView, MailRow, Mailbox, MailboxConfig, MailboxView, Phase, Release};
pub use models::{Identity, MailDetail, MailSummary, UserRecord};
pub use notify::{Notifier, Position, Toast, ToastConfig, ToastEvent, ToastId};
pub use session::{Address, Session};

/// Result type alias for mailbox operations.
///
/// This is equivalent to `std::result::Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
