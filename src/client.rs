//! Async client for the temporary mailbox HTTP service.
//!
//! This module provides an async [`Client`] and [`ClientBuilder`] for the REST-like
//! endpoints served next to the SMTP sink.
//!
//! Typical flow:
//! 1) Build a client (`Client::new` or `Client::builder().build()`)
//! 2) Create an identity via [`Client::create_user`]
//! 3) Poll the inbox via [`Client::list_mail`]
//! 4) Fetch message metadata via [`Client::mail_detail`]
//! 5) Optionally destroy the identity via [`Client::delete_user`]

use crate::{Error, Identity, MailDetail, MailSummary, Result, UserRecord};
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{Method, StatusCode, Url};
use std::fmt;
use std::time::Duration;
use tracing::debug;

/// Async client for the temporary mailbox service.
///
/// The underlying `reqwest::Client` keeps a cookie store: the server remembers the
/// identity in a `uuid` cookie, so a bare [`Client::create_user`] from the same client
/// renews the current identity instead of allocating a new one. Clone the client to
/// share that session.
#[derive(Clone)]
pub struct Client {
    http: reqwest::Client,
    proxy: Option<String>,
    user_agent: String,
    base_url: Url,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("http", &"<reqwest::Client>")
            .field("proxy", &self.proxy)
            .field("user_agent", &self.user_agent)
            .field("base_url", &self.base_url.as_str())
            .finish()
    }
}

impl Client {
    /// Create a [`ClientBuilder`] for configuring a new client.
    ///
    /// # Examples
    /// ```no_run
    /// # use tempmail_client::Client;
    /// # fn main() -> Result<(), tempmail_client::Error> {
    /// let client = Client::builder()
    ///     .base_url("https://mail.example.com")
    ///     .user_agent("my-app/1.0")
    ///     .build()?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Create a client for the service at `base_url` using default settings.
    ///
    /// # Errors
    /// Returns an error if `base_url` is not a valid URL or the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        ClientBuilder::new().base_url(base_url).build()
    }

    /// Get the proxy URL configured for this client (if any).
    pub fn proxy(&self) -> Option<&str> {
        self.proxy.as_deref()
    }

    /// Base URL every endpoint is resolved against.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Create or renew an identity.
    ///
    /// With `None` the server reuses the identity from the session cookie, or allocates a
    /// fresh one. With `Some(uuid)` it claims that exact identity, creating it when unknown.
    /// Either way the identity's `last_active` time is refreshed.
    ///
    /// # Errors
    /// Returns an error if the request fails, the server rejects the identity (HTTP 400
    /// for malformed tokens), or the response is not a user record.
    ///
    /// # Examples
    /// ```no_run
    /// # use tempmail_client::Client;
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), tempmail_client::Error> {
    /// let client = Client::new("https://mail.example.com")?;
    /// let user = client.create_user(None).await?;
    /// println!("{}", user.uuid);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn create_user(&self, uuid: Option<&Identity>) -> Result<UserRecord> {
        let path = match uuid {
            Some(uuid) => format!("user/{uuid}"),
            None => "user/".to_string(),
        };
        self.request_json(Method::POST, &path).await
    }

    /// Destroy an identity together with all its messages.
    ///
    /// # Errors
    /// Returns [`Error::Status`] with 404 if the identity does not exist.
    pub async fn delete_user(&self, uuid: &Identity) -> Result<()> {
        self.request_status(Method::DELETE, &format!("user/{uuid}"))
            .await?;
        Ok(())
    }

    /// Retrieve the inbox listing for an identity.
    ///
    /// The server returns at most 32 messages, newest first; the order is kept as is.
    ///
    /// # Examples
    /// ```no_run
    /// # use tempmail_client::Client;
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), tempmail_client::Error> {
    /// let client = Client::new("https://mail.example.com")?;
    /// let user = client.create_user(None).await?;
    /// for mail in client.list_mail(&user.uuid).await? {
    ///     println!("{}: {:?}", mail.sender, mail.subject);
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub async fn list_mail(&self, uuid: &Identity) -> Result<Vec<MailSummary>> {
        self.request_json(Method::GET, &format!("mail/{uuid}")).await
    }

    /// Drop every message of an identity while keeping the identity itself.
    pub async fn clear_mailbox(&self, uuid: &Identity) -> Result<()> {
        self.request_status(Method::DELETE, &format!("mail/{uuid}"))
            .await?;
        Ok(())
    }

    /// Fetch the metadata and bodies of one message.
    ///
    /// An unknown `mail_id` yields an empty [`MailDetail`], not an error.
    pub async fn mail_detail(&self, uuid: &Identity, mail_id: i64) -> Result<MailDetail> {
        self.request_json(Method::GET, &format!("mail/{uuid}/{mail_id}"))
            .await
    }

    /// Fetch the HTML document the detail frame displays.
    pub async fn fetch_rendered(&self, uuid: &Identity, mail_id: i64) -> Result<String> {
        let url = self.iframe_url(uuid, mail_id)?;
        self.request_text(Method::GET, url).await
    }

    /// Fetch the RSS feed of an identity. Reading the feed also renews the identity.
    pub async fn fetch_rss(&self, uuid: &Identity) -> Result<String> {
        let url = self.rss_url(uuid)?;
        self.request_text(Method::GET, url).await
    }

    /// URL of the bare message rendering loaded into the detail frame.
    pub fn iframe_url(&self, uuid: &Identity, mail_id: i64) -> Result<Url> {
        self.endpoint(&format!("mail/{uuid}/{mail_id}/iframe"))
    }

    /// URL of the full-page rendering opened in a new tab.
    pub fn show_url(&self, uuid: &Identity, mail_id: i64) -> Result<Url> {
        self.endpoint(&format!("mail/{uuid}/{mail_id}/show"))
    }

    /// URL of the identity's RSS feed.
    pub fn rss_url(&self, uuid: &Identity) -> Result<Url> {
        self.endpoint(&format!("mail/{uuid}/rss"))
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path)?)
    }

    async fn request_json<T>(&self, method: Method, path: &str) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let url = self.endpoint(path)?;
        let body = self.execute_request(method, url).await?;
        let parsed = serde_json::from_slice::<T>(&body)?;
        Ok(parsed)
    }

    async fn request_text(&self, method: Method, url: Url) -> Result<String> {
        let body = self.execute_request(method, url).await?;
        Ok(String::from_utf8_lossy(&body).into_owned())
    }

    async fn request_status(&self, method: Method, path: &str) -> Result<StatusCode> {
        let url = self.endpoint(path)?;
        let response = self.send_checked(method, url).await?;
        Ok(response.status())
    }

    async fn execute_request(&self, method: Method, url: Url) -> Result<Vec<u8>> {
        let response = self.send_checked(method, url).await?;
        let status = response.status();
        let body = response.bytes().await?;
        debug!(status = status.as_u16(), bytes = body.len(), "mailbox API response");
        Ok(body.to_vec())
    }

    /// Send the request and turn a non-success status into [`Error::Status`].
    async fn send_checked(&self, method: Method, url: Url) -> Result<reqwest::Response> {
        debug!(%method, %url, "mailbox API request");

        let response = self
            .http
            .request(method, url)
            .headers(self.headers())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Self::status_error(status, response).await);
        }
        Ok(response)
    }

    async fn status_error(status: StatusCode, response: reqwest::Response) -> Error {
        // Read a small body snippet for diagnostics without wasting too much bandwidth.
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unavailable>".to_string())
            .chars()
            .take(512)
            .collect::<String>();
        Error::Status { status, body }
    }

    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Ok(value) = HeaderValue::from_str(&self.user_agent) {
            headers.insert(USER_AGENT, value);
        }
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/json, text/javascript, */*; q=0.01"),
        );
        headers.insert(
            "X-Requested-With",
            HeaderValue::from_static("XMLHttpRequest"),
        );
        headers
    }
}

const USER_AGENT_VALUE: &str = concat!("tempmail-client/", env!("CARGO_PKG_VERSION"));

/// Builder for configuring a [`Client`].
///
/// # Defaults
/// - Base URL `http://127.0.0.1:8888/` (the service's default listen port)
/// - No proxy
/// - `danger_accept_invalid_certs = false`
/// - A crate-identifying user agent
/// - Reqwest default timeout (none)
#[derive(Debug, Clone)]
pub struct ClientBuilder {
    base_url: String,
    proxy: Option<String>,
    danger_accept_invalid_certs: bool,
    user_agent: String,
    timeout: Option<Duration>,
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self {
            base_url: "http://127.0.0.1:8888/".to_string(),
            proxy: None,
            danger_accept_invalid_certs: false,
            user_agent: USER_AGENT_VALUE.to_string(),
            timeout: None,
        }
    }

    /// Set the service base URL. A path prefix is kept; endpoints resolve below it.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set a proxy URL (e.g. `"http://127.0.0.1:8080"`).
    pub fn proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }

    /// Configure whether to accept invalid TLS certificates (default: `false`).
    ///
    /// # Security
    /// Accepting invalid certificates is unsafe on untrusted networks.
    pub fn danger_accept_invalid_certs(mut self, value: bool) -> Self {
        self.danger_accept_invalid_certs = value;
        self
    }

    /// Override the default user agent string.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set a request timeout applied to all operations.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the [`Client`].
    ///
    /// # Errors
    /// Returns an error if the base URL does not parse or the HTTP client cannot be
    /// constructed (e.g., invalid proxy URL).
    pub fn build(self) -> Result<Client> {
        let mut base = self.base_url.clone();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base)?;

        let mut builder = reqwest::Client::builder()
            .danger_accept_invalid_certs(self.danger_accept_invalid_certs);

        if let Some(proxy_url) = &self.proxy {
            builder = builder.proxy(reqwest::Proxy::all(proxy_url)?);
        }

        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        // The identity cookie must survive between requests.
        let http = builder.cookie_store(true).build()?;

        Ok(Client {
            http,
            proxy: self.proxy,
            user_agent: self.user_agent,
            base_url,
        })
    }
}
