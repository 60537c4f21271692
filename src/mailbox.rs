//! Mailbox controller: provisions an identity, keeps the message list fresh, shows
//! message detail, and releases the identity on request.
//!
//! The controller never touches a screen itself. Everything the page would write into
//! its DOM goes through [`MailboxView`], and toasts go through the controller's
//! [`Notifier`].

use crate::notify::{Notifier, Position, ToastConfig, ToastId};
use crate::schedule::{FirstRun, PeriodicTask};
use crate::session::{Address, Session};
use crate::{Client, Error, Identity, MailSummary, Result};
use reqwest::Url;
use std::sync::Arc;
use std::time::Duration;
use tokio::time;
use tracing::{debug, info, warn};

/// Label shown for messages without a subject.
pub const NO_SUBJECT: &str = "无主题";
/// Text shown in place of the list when the inbox is empty.
pub const EMPTY_PLACEHOLDER: &str = "暂无邮件可以显示。";
/// Prefix of the subject label in the detail pane.
pub const SUBJECT_PREFIX: &str = "主题：";

const SUCCESS_GREEN: &str = "#2ecc71";
const DANGER_RED: &str = "#e74c3c";
const WHITE: &str = "#fff";

/// Lifecycle of a [`Mailbox`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Uninitialized,
    /// Waiting for, or stuck after a failed, identity request.
    Provisioning,
    Active,
    /// Identity released; `start` again to get a fresh one.
    TornDown,
}

/// One row of the message table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailRow {
    pub id: i64,
    pub sender: String,
    /// Subject, or [`NO_SUBJECT`] when missing or empty.
    pub subject: String,
    pub create_time: String,
}

impl From<&MailSummary> for MailRow {
    fn from(mail: &MailSummary) -> Self {
        let subject = match mail.subject.as_deref() {
            Some(s) if !s.is_empty() => s.to_string(),
            _ => NO_SUBJECT.to_string(),
        };
        Self {
            id: mail.id,
            sender: mail.sender.clone(),
            subject,
            create_time: mail.create_time.clone(),
        }
    }
}

/// What the detail pane shows for an opened message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailView {
    pub mail_id: i64,
    /// `主题：<subject>`.
    pub subject_label: String,
    /// Source of the embedded frame. The embedder sizes the frame to its content once
    /// loaded.
    pub frame_src: Url,
    /// Target of the "open in new tab" link.
    pub newtab_href: Url,
}

/// Rendering surface of the mailbox page.
///
/// Methods are called from the poll tasks as well as from the user-triggered handlers,
/// hence `Send + Sync`.
pub trait MailboxView: Send + Sync + 'static {
    /// Show the provisioned address and the feed URL offered for copying.
    fn show_address(&self, address: &Address);

    /// Replace the message table with `rows`, kept in the given order.
    fn render_mail(&self, rows: &[MailRow]);

    /// Replace the message table with a placeholder paragraph.
    fn show_placeholder(&self, text: &str);

    /// Point the "open in new tab" link at nothing (`#`, no target) while a detail
    /// request is in flight.
    fn reset_newtab(&self);

    fn show_detail(&self, detail: &DetailView);

    /// Start over as a freshly loaded page would.
    fn reload(&self);
}

/// Timing and display settings of a [`Mailbox`].
#[derive(Debug, Clone)]
pub struct MailboxConfig {
    /// Domain appended to the identity to form the display address.
    pub domain: String,
    pub list_interval: Duration,
    pub keepalive_interval: Duration,
    /// Wait between the release toast and the reload.
    pub reload_delay: Duration,
}

impl Default for MailboxConfig {
    fn default() -> Self {
        Self {
            domain: "localhost".to_string(),
            list_interval: Duration::from_millis(1678),
            keepalive_interval: Duration::from_secs(60),
            reload_delay: Duration::from_secs(1),
        }
    }
}

impl MailboxConfig {
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            ..Self::default()
        }
    }

    pub fn list_interval(mut self, interval: Duration) -> Self {
        self.list_interval = interval;
        self
    }

    pub fn keepalive_interval(mut self, interval: Duration) -> Self {
        self.keepalive_interval = interval;
        self
    }

    pub fn reload_delay(mut self, delay: Duration) -> Self {
        self.reload_delay = delay;
        self
    }

    /// Both poll intervals must be non-zero.
    pub fn validate(&self) -> Result<()> {
        if self.list_interval.is_zero() {
            return Err(Error::InvalidInterval { task: "mail-list" });
        }
        if self.keepalive_interval.is_zero() {
            return Err(Error::InvalidInterval { task: "keep-alive" });
        }
        Ok(())
    }
}

/// Result of [`Mailbox::release`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Release {
    /// Server confirmed; the toast was shown before the reload.
    Deleted,
    /// Request failed or no identity was active; reloaded at once.
    Failed,
}

/// Drives one temporary mailbox.
pub struct Mailbox<V: MailboxView> {
    client: Client,
    view: Arc<V>,
    notifier: Notifier,
    session: Session,
    config: MailboxConfig,
    phase: Phase,
    tasks: Vec<PeriodicTask>,
}

impl<V: MailboxView> Mailbox<V> {
    pub fn new(client: Client, view: Arc<V>, config: MailboxConfig) -> Self {
        Self {
            client,
            view,
            notifier: Notifier::new(),
            session: Session::new(),
            config,
            phase: Phase::Uninitialized,
            tasks: Vec::new(),
        }
    }

    /// Use `notifier` for toasts instead of a private one.
    pub fn with_notifier(mut self, notifier: Notifier) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    pub fn view(&self) -> &Arc<V> {
        &self.view
    }

    /// Request an identity, show its address, and start the list and keep-alive polls.
    ///
    /// On failure the mailbox stays in [`Phase::Provisioning`]; nothing is retried and
    /// nothing is shown. Calling this while already active returns the current identity.
    ///
    /// # Errors
    /// Returns [`Error::InvalidInterval`] without contacting the server if a poll interval
    /// is zero, and the identity request's error if that fails.
    ///
    /// Must be called inside a tokio runtime.
    pub async fn start(&mut self) -> Result<Identity> {
        if self.phase == Phase::Active {
            if let Some(identity) = self.session.identity() {
                return Ok(identity);
            }
        }
        self.config.validate()?;

        self.phase = Phase::Provisioning;
        info!("requesting mailbox identity");
        let user = match self.client.create_user(None).await {
            Ok(user) => user,
            Err(err) => {
                warn!(error = %err, "identity request failed");
                return Err(err);
            }
        };
        let identity = user.uuid;

        let rss_url = self.client.rss_url(&identity)?;
        let address = Address::new(&identity, &self.config.domain, rss_url.as_str());
        self.session.replace(identity.clone());
        self.view.show_address(&address);

        let poller = ListPoller {
            client: self.client.clone(),
            view: self.view.clone(),
            session: self.session.clone(),
        };
        self.tasks.push(PeriodicTask::start(
            "mail-list",
            self.config.list_interval,
            FirstRun::Immediately,
            move || {
                let poller = poller.clone();
                async move { poller.poll().await }
            },
        ));

        let client = self.client.clone();
        self.tasks.push(PeriodicTask::start(
            "keep-alive",
            self.config.keepalive_interval,
            FirstRun::AfterInterval,
            move || {
                let client = client.clone();
                async move {
                    // The session cookie makes this renew the current identity.
                    if let Err(err) = client.create_user(None).await {
                        debug!(error = %err, "keep-alive request failed");
                    }
                }
            },
        ));

        self.phase = Phase::Active;
        info!(mailbox = %address.mailbox, "mailbox active");
        Ok(identity)
    }

    /// Fetch the message list once and redraw it.
    ///
    /// Returns the number of rows shown.
    pub async fn refresh(&self) -> Result<usize> {
        ListPoller {
            client: self.client.clone(),
            view: self.view.clone(),
            session: self.session.clone(),
        }
        .refresh()
        .await
    }

    /// Show the detail of `mail_id`. Re-fetched on every call.
    pub async fn open_message(&self, mail_id: i64) -> Result<()> {
        let identity = self.session.identity().ok_or(Error::NoIdentity)?;
        self.view.reset_newtab();

        let detail = match self.client.mail_detail(&identity, mail_id).await {
            Ok(detail) => detail,
            Err(err) => {
                warn!(mail_id, error = %err, "detail request failed");
                return Err(err);
            }
        };

        let view = DetailView {
            mail_id,
            subject_label: format!("{SUBJECT_PREFIX}{}", detail.subject.unwrap_or_default()),
            frame_src: self.client.iframe_url(&identity, mail_id)?,
            newtab_href: self.client.show_url(&identity, mail_id)?,
        };
        self.view.show_detail(&view);
        Ok(())
    }

    /// Destroy the identity and reload.
    ///
    /// On success a toast announces the deletion and the reload follows after
    /// [`MailboxConfig::reload_delay`]. On failure the reload happens at once, silently.
    pub async fn release(&mut self) -> Release {
        let outcome = match self.session.identity() {
            Some(identity) => match self.client.delete_user(&identity).await {
                Ok(()) => Release::Deleted,
                Err(err) => {
                    warn!(error = %err, "identity release failed");
                    Release::Failed
                }
            },
            None => {
                warn!("release requested without an identity");
                Release::Failed
            }
        };

        if outcome == Release::Deleted {
            self.notifier.show(
                ToastConfig::new("删除成功", "邮箱及数据已删除，正在分配新邮箱")
                    .background(DANGER_RED)
                    .text_color(WHITE)
                    .position(Position::TopRight)
                    .duration_secs(1.0),
            );
            time::sleep(self.config.reload_delay).await;
        }

        self.tear_down();
        self.view.reload();
        outcome
    }

    /// Feedback for a successful copy to the clipboard.
    pub fn copy_succeeded(&self, text: &str) -> ToastId {
        info!(text, "copied to clipboard");
        self.notifier.show(
            ToastConfig::new("复制成功", text)
                .background(SUCCESS_GREEN)
                .text_color(WHITE)
                .position(Position::TopRight)
                .duration_secs(1.2),
        )
    }

    /// Feedback for a failed copy to the clipboard.
    pub fn copy_failed(&self) -> ToastId {
        self.notifier.show(
            ToastConfig::new("复制失败", "无法复制文本，请手动复制")
                .background(DANGER_RED)
                .text_color(WHITE)
                .position(Position::TopRight)
                .duration_secs(1.2),
        )
    }

    fn tear_down(&mut self) {
        for task in self.tasks.drain(..) {
            task.stop();
        }
        self.session.clear();
        self.phase = Phase::TornDown;
        info!("mailbox torn down");
    }
}

struct ListPoller<V> {
    client: Client,
    view: Arc<V>,
    session: Session,
}

impl<V> Clone for ListPoller<V> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            view: self.view.clone(),
            session: self.session.clone(),
        }
    }
}

impl<V: MailboxView> ListPoller<V> {
    async fn poll(&self) {
        if let Err(err) = self.refresh().await {
            warn!(error = %err, "mail list poll failed");
        }
    }

    async fn refresh(&self) -> Result<usize> {
        let identity = self.session.identity().ok_or(Error::NoIdentity)?;
        let mails = self.client.list_mail(&identity).await?;

        if mails.is_empty() {
            self.view.show_placeholder(EMPTY_PLACEHOLDER);
            return Ok(0);
        }

        let rows: Vec<MailRow> = mails.iter().map(MailRow::from).collect();
        self.view.render_mail(&rows);
        Ok(rows.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::ToastEvent;
    use httpmock::Method::{DELETE, GET, POST};
    use httpmock::MockServer;
    use serde_json::json;
    use std::sync::{Mutex, MutexGuard};
    use tokio::time::Instant;

    #[derive(Debug, Default)]
    struct Screen {
        address: Option<Address>,
        rows: Vec<MailRow>,
        placeholder: Option<String>,
        renders: usize,
        newtab_resets: usize,
        detail: Option<DetailView>,
        reloads: Vec<Instant>,
        // Toast headings on screen at each reload.
        toasts_at_reload: Vec<Vec<String>>,
    }

    #[derive(Debug, Default)]
    struct RecordingView {
        screen: Mutex<Screen>,
        notifier: Notifier,
    }

    impl RecordingView {
        fn screen(&self) -> MutexGuard<'_, Screen> {
            self.screen.lock().unwrap()
        }
    }

    impl MailboxView for RecordingView {
        fn show_address(&self, address: &Address) {
            self.screen().address = Some(address.clone());
        }

        fn render_mail(&self, rows: &[MailRow]) {
            let mut screen = self.screen();
            screen.rows = rows.to_vec();
            screen.placeholder = None;
            screen.renders += 1;
        }

        fn show_placeholder(&self, text: &str) {
            let mut screen = self.screen();
            screen.rows.clear();
            screen.placeholder = Some(text.to_string());
            screen.renders += 1;
        }

        fn reset_newtab(&self) {
            self.screen().newtab_resets += 1;
        }

        fn show_detail(&self, detail: &DetailView) {
            self.screen().detail = Some(detail.clone());
        }

        fn reload(&self) {
            let headings = self
                .notifier
                .snapshot()
                .into_iter()
                .flat_map(|c| c.toasts)
                .map(|e| e.toast.config.heading)
                .collect();
            let mut screen = self.screen();
            screen.reloads.push(Instant::now());
            screen.toasts_at_reload.push(headings);
        }
    }

    fn fast_config() -> MailboxConfig {
        MailboxConfig::new("mail.example.com")
            .list_interval(Duration::from_millis(50))
            .keepalive_interval(Duration::from_millis(100))
            .reload_delay(Duration::from_millis(200))
    }

    fn mailbox(server: &MockServer, config: MailboxConfig) -> Mailbox<RecordingView> {
        let client = Client::new(server.base_url()).unwrap();
        let view = RecordingView::default();
        let notifier = view.notifier.clone();
        Mailbox::new(client, Arc::new(view), config).with_notifier(notifier)
    }

    fn mock_identity(server: &MockServer) -> httpmock::Mock<'_> {
        server.mock(|when, then| {
            when.method(POST).path("/user/");
            then.status(200).json_body(json!({ "id": 1, "uuid": "0f3a9c21" }));
        })
    }

    async fn wait_until(view: &RecordingView, done: impl Fn(&Screen) -> bool) {
        let deadline = Instant::now() + Duration::from_secs(3);
        while !done(&*view.screen()) {
            assert!(Instant::now() < deadline, "view never reached expected state");
            time::sleep(Duration::from_millis(10)).await;
        }
    }

    #[tokio::test]
    async fn start_shows_address_and_feed_url() {
        let server = MockServer::start();
        mock_identity(&server);
        server.mock(|when, then| {
            when.method(GET).path("/mail/0f3a9c21");
            then.status(200).json_body(json!([]));
        });

        let mut mailbox = mailbox(&server, fast_config());
        let identity = mailbox.start().await.unwrap();

        assert_eq!(identity.as_str(), "0f3a9c21");
        assert_eq!(mailbox.phase(), Phase::Active);
        let address = mailbox.view().screen().address.clone().unwrap();
        assert_eq!(address.mailbox, "0f3a9c21@mail.example.com");
        assert_eq!(address.rss_url, server.url("/mail/0f3a9c21/rss"));
    }

    #[tokio::test]
    async fn failed_provisioning_stays_in_provisioning() {
        let server = MockServer::start();
        let create = server.mock(|when, then| {
            when.method(POST).path("/user/");
            then.status(500);
        });

        let mut mailbox = mailbox(&server, fast_config());
        assert_eq!(mailbox.phase(), Phase::Uninitialized);
        assert!(mailbox.start().await.is_err());

        time::sleep(Duration::from_millis(300)).await;
        assert_eq!(mailbox.phase(), Phase::Provisioning);
        assert!(mailbox.view().screen().address.is_none());
        assert!(mailbox.session().identity().is_none());
        assert_eq!(create.hits(), 1);
    }

    #[tokio::test]
    async fn empty_inbox_shows_placeholder_and_no_rows() {
        let server = MockServer::start();
        mock_identity(&server);
        server.mock(|when, then| {
            when.method(GET).path("/mail/0f3a9c21");
            then.status(200).json_body(json!([]));
        });

        let mut mailbox = mailbox(&server, fast_config());
        mailbox.start().await.unwrap();
        wait_until(mailbox.view(), |s| s.renders > 0).await;

        let screen = mailbox.view().screen();
        assert_eq!(screen.placeholder.as_deref(), Some(EMPTY_PLACEHOLDER));
        assert!(screen.rows.is_empty());
    }

    #[tokio::test]
    async fn list_poll_renders_one_row_per_message_in_server_order() {
        let server = MockServer::start();
        mock_identity(&server);
        let list = server.mock(|when, then| {
            when.method(GET).path("/mail/0f3a9c21");
            then.status(200).json_body(json!([
                { "id": 12, "sender": "c@example.com", "subject": "newest",
                  "create_time": "2024-01-03 00:00:00" },
                { "id": 30, "sender": "b@example.com", "subject": "",
                  "create_time": "2024-01-02 00:00:00" },
                { "id": 4, "sender": "a@example.com", "subject": null,
                  "create_time": "2024-01-01 00:00:00" }
            ]));
        });

        let mut mailbox = mailbox(&server, fast_config());
        mailbox.start().await.unwrap();
        wait_until(mailbox.view(), |s| s.renders >= 2).await;

        let screen = mailbox.view().screen();
        assert!(screen.placeholder.is_none());
        let ids: Vec<i64> = screen.rows.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![12, 30, 4]);
        assert_eq!(screen.rows[0].subject, "newest");
        assert_eq!(screen.rows[1].subject, NO_SUBJECT);
        assert_eq!(screen.rows[2].subject, NO_SUBJECT);
        assert!(list.hits() >= 2);
    }

    #[tokio::test]
    async fn poll_errors_leave_the_previous_list_in_place() {
        let server = MockServer::start();
        mock_identity(&server);
        let mut list = server.mock(|when, then| {
            when.method(GET).path("/mail/0f3a9c21");
            then.status(200).json_body(json!([
                { "id": 1, "sender": "a@example.com", "subject": "hi",
                  "create_time": "2024-01-01 00:00:00" }
            ]));
        });

        let mut mailbox = mailbox(&server, fast_config());
        mailbox.start().await.unwrap();
        wait_until(mailbox.view(), |s| s.renders > 0).await;

        list.delete();
        server.mock(|when, then| {
            when.method(GET).path("/mail/0f3a9c21");
            then.status(500);
        });
        // Let a poll already in flight land before counting.
        time::sleep(Duration::from_millis(100)).await;
        let renders = mailbox.view().screen().renders;
        time::sleep(Duration::from_millis(200)).await;

        let screen = mailbox.view().screen();
        assert_eq!(screen.renders, renders);
        assert_eq!(screen.rows.len(), 1);
    }

    #[tokio::test]
    async fn keep_alive_renews_the_identity_periodically() {
        let server = MockServer::start();
        let create = mock_identity(&server);
        server.mock(|when, then| {
            when.method(GET).path("/mail/0f3a9c21");
            then.status(200).json_body(json!([]));
        });

        let mut mailbox = mailbox(&server, fast_config());
        mailbox.start().await.unwrap();
        time::sleep(Duration::from_millis(350)).await;

        assert!(create.hits() >= 3, "expected provisioning plus keep-alives");
    }

    #[tokio::test]
    async fn opening_a_message_updates_subject_frame_and_link() {
        let server = MockServer::start();
        mock_identity(&server);
        server.mock(|when, then| {
            when.method(GET).path("/mail/0f3a9c21");
            then.status(200).json_body(json!([]));
        });
        let detail = server.mock(|when, then| {
            when.method(GET).path("/mail/0f3a9c21/42");
            then.status(200).json_body(json!({ "id": 42, "subject": "Welcome" }));
        });

        let mut mailbox = mailbox(&server, fast_config());
        mailbox.start().await.unwrap();
        mailbox.open_message(42).await.unwrap();
        mailbox.open_message(42).await.unwrap();

        let screen = mailbox.view().screen();
        let shown = screen.detail.clone().unwrap();
        assert_eq!(shown.subject_label, "主题：Welcome");
        assert!(shown.frame_src.as_str().ends_with("/mail/0f3a9c21/42/iframe"));
        assert!(shown.newtab_href.as_str().ends_with("/mail/0f3a9c21/42/show"));
        assert_eq!(screen.newtab_resets, 2);
        assert_eq!(detail.hits(), 2);
    }

    #[tokio::test]
    async fn opening_without_identity_is_rejected() {
        let server = MockServer::start();
        let mailbox = mailbox(&server, fast_config());
        assert!(matches!(mailbox.open_message(1).await, Err(Error::NoIdentity)));
    }

    #[tokio::test]
    async fn successful_release_toasts_then_reloads_after_delay() {
        let server = MockServer::start();
        mock_identity(&server);
        server.mock(|when, then| {
            when.method(GET).path("/mail/0f3a9c21");
            then.status(200).json_body(json!([]));
        });
        let delete = server.mock(|when, then| {
            when.method(DELETE).path("/user/0f3a9c21");
            then.status(200);
        });

        let mut mailbox = mailbox(&server, fast_config());
        mailbox.start().await.unwrap();
        let mut events = mailbox.notifier().subscribe();

        let started = Instant::now();
        assert_eq!(mailbox.release().await, Release::Deleted);

        let reloaded_at = mailbox.view().screen().reloads[0];
        assert!(reloaded_at - started >= Duration::from_millis(200));
        assert!(matches!(events.try_recv(), Ok(ToastEvent::Shown { .. })));
        let screen = mailbox.view().screen();
        assert_eq!(screen.toasts_at_reload, vec![vec!["删除成功".to_string()]]);
        drop(screen);
        assert_eq!(mailbox.phase(), Phase::TornDown);
        assert!(mailbox.session().identity().is_none());
        delete.assert();
    }

    #[tokio::test]
    async fn failed_release_reloads_at_once_without_toast() {
        let server = MockServer::start();
        mock_identity(&server);
        server.mock(|when, then| {
            when.method(GET).path("/mail/0f3a9c21");
            then.status(200).json_body(json!([]));
        });
        server.mock(|when, then| {
            when.method(DELETE).path("/user/0f3a9c21");
            then.status(404).json_body(json!({ "code": 404 }));
        });

        let config = fast_config().reload_delay(Duration::from_secs(5));
        let mut mailbox = mailbox(&server, config);
        mailbox.start().await.unwrap();

        let started = Instant::now();
        assert_eq!(mailbox.release().await, Release::Failed);

        assert!(started.elapsed() < Duration::from_secs(2));
        assert_eq!(mailbox.view().screen().reloads.len(), 1);
        assert_eq!(mailbox.view().screen().toasts_at_reload, vec![Vec::<String>::new()]);
        assert!(mailbox.notifier().is_empty());
        assert_eq!(mailbox.phase(), Phase::TornDown);
    }

    #[tokio::test]
    async fn start_while_active_returns_current_identity() {
        let server = MockServer::start();
        let create = mock_identity(&server);
        server.mock(|when, then| {
            when.method(GET).path("/mail/0f3a9c21");
            then.status(200).json_body(json!([]));
        });

        let mut mailbox = mailbox(&server, fast_config().keepalive_interval(Duration::from_secs(60)));
        let first = mailbox.start().await.unwrap();
        let second = mailbox.start().await.unwrap();

        assert_eq!(first, second);
        assert_eq!(mailbox.phase(), Phase::Active);
        assert_eq!(mailbox.tasks.len(), 2);
        assert_eq!(create.hits(), 1);
    }

    #[tokio::test]
    async fn zero_interval_is_rejected_before_contacting_the_server() {
        let server = MockServer::start();
        let create = mock_identity(&server);

        for config in [
            fast_config().list_interval(Duration::ZERO),
            fast_config().keepalive_interval(Duration::ZERO),
        ] {
            let mut mailbox = mailbox(&server, config);
            assert!(matches!(
                mailbox.start().await,
                Err(Error::InvalidInterval { .. })
            ));
            assert_eq!(mailbox.phase(), Phase::Uninitialized);
            assert!(mailbox.session().identity().is_none());
            assert!(mailbox.view().screen().address.is_none());
            assert!(mailbox.tasks.is_empty());
        }
        assert_eq!(create.hits(), 0);
    }

    #[tokio::test]
    async fn teardown_stops_polling_and_start_runs_fresh() {
        let server = MockServer::start();
        let create = mock_identity(&server);
        let list = server.mock(|when, then| {
            when.method(GET).path("/mail/0f3a9c21");
            then.status(200).json_body(json!([]));
        });
        server.mock(|when, then| {
            when.method(DELETE).path("/user/0f3a9c21");
            then.status(200);
        });

        let mut mailbox = mailbox(&server, fast_config().reload_delay(Duration::ZERO));
        mailbox.start().await.unwrap();
        mailbox.release().await;

        time::sleep(Duration::from_millis(50)).await;
        let hits = list.hits();
        time::sleep(Duration::from_millis(200)).await;
        assert_eq!(list.hits(), hits);

        let creates = create.hits();
        mailbox.start().await.unwrap();
        assert_eq!(mailbox.phase(), Phase::Active);
        assert_eq!(create.hits(), creates + 1);
    }

    #[tokio::test]
    async fn copy_feedback_uses_matching_toasts() {
        let server = MockServer::start();
        let mailbox = mailbox(&server, fast_config());

        mailbox.copy_succeeded("0f3a9c21@mail.example.com");
        mailbox.copy_failed();

        let board = mailbox.notifier().snapshot();
        let toasts = &board[0].toasts;
        assert_eq!(toasts[0].toast.config.heading, "复制失败");
        assert_eq!(toasts[0].toast.config.background, DANGER_RED);
        assert_eq!(toasts[1].toast.config.heading, "复制成功");
        assert_eq!(toasts[1].toast.config.text, "0f3a9c21@mail.example.com");
        assert_eq!(toasts[1].toast.config.duration, Duration::from_secs_f64(1.2));
    }
}
