//! Toast notifications.
//!
//! A [`Notifier`] owns a board of containers, one per screen [`Position`], each holding
//! its toasts newest first. Containers are created on first use and kept in creation
//! order, which is the order a renderer should stack them in the document.
//!
//! A toast that is not permanent expires after its duration. Hovering it cancels the
//! pending expiry and leaving it starts a fresh one of the full duration; the time already
//! waited is not credited. Expiry and closing both fade the toast out before removing it.

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time;
use tracing::{debug, info};

/// Default fade-in/fade-out animation time.
pub const DEFAULT_FADE: Duration = Duration::from_millis(300);

/// Screen corner (or edge center) a toast is stacked in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Position {
    TopLeft,
    #[default]
    TopRight,
    TopCenter,
    BottomLeft,
    BottomRight,
    BottomCenter,
}

impl Position {
    pub fn as_str(self) -> &'static str {
        match self {
            Position::TopLeft => "top-left",
            Position::TopRight => "top-right",
            Position::TopCenter => "top-center",
            Position::BottomLeft => "bottom-left",
            Position::BottomRight => "bottom-right",
            Position::BottomCenter => "bottom-center",
        }
    }

    /// CSS class of this position's container.
    pub fn container_class(self) -> String {
        format!("ui-alert-content-{}", self.as_str())
    }

    /// Markup of the empty container appended to the body on first use.
    pub fn container_html(self) -> String {
        format!(
            r#"<div class="ui-alert-content {}" style="width: inherit;"></div>"#,
            self.container_class()
        )
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Options for one toast.
#[derive(Debug, Clone, PartialEq)]
pub struct ToastConfig {
    pub heading: String,
    pub text: String,
    pub text_color: String,
    pub background: String,
    pub position: Position,
    /// Icon class name, rendered as `<i class="{icon} icon">`.
    pub icon: String,
    pub duration: Duration,
    /// Permanent toasts never expire; they only go away when closed.
    pub permanent: bool,
}

impl Default for ToastConfig {
    fn default() -> Self {
        Self {
            heading: "title".to_string(),
            text: "message".to_string(),
            text_color: "#19c3aa".to_string(),
            background: "#fff".to_string(),
            position: Position::TopRight,
            icon: String::new(),
            duration: Duration::from_secs(5),
            permanent: false,
        }
    }
}

impl ToastConfig {
    pub fn new(heading: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            heading: heading.into(),
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn text_color(mut self, color: impl Into<String>) -> Self {
        self.text_color = color.into();
        self
    }

    pub fn background(mut self, color: impl Into<String>) -> Self {
        self.background = color.into();
        self
    }

    pub fn position(mut self, position: Position) -> Self {
        self.position = position;
        self
    }

    pub fn icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = icon.into();
        self
    }

    pub fn duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Duration in (possibly fractional) seconds. Negative values and NaN mean zero;
    /// values too large for a [`Duration`] saturate to [`Duration::MAX`].
    pub fn duration_secs(self, secs: f64) -> Self {
        let duration = if secs.is_nan() || secs <= 0.0 {
            Duration::ZERO
        } else {
            Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
        };
        self.duration(duration)
    }

    pub fn permanent(mut self, permanent: bool) -> Self {
        self.permanent = permanent;
        self
    }
}

/// Handle naming one toast on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ToastId(u64);

/// A shown toast.
#[derive(Debug, Clone, PartialEq)]
pub struct Toast {
    pub id: ToastId,
    pub config: ToastConfig,
}

impl Toast {
    /// Markup of the message element: icon, close control, heading and body, with the
    /// configured colors inlined.
    pub fn render_html(&self) -> String {
        let c = &self.config;
        format!(
            concat!(
                r#"<div id="messages" class="ui icon message" style="background-color: {bg}; "#,
                r#"box-shadow: 0 0 0 1px rgba(255,255,255,.5) inset,0 0 0 0 transparent;">"#,
                r#"<i class="{icon} icon" style="color: {fg};"></i>"#,
                r#"<i class="close icon" style="color: {fg};" id="messageclose"></i>"#,
                r#"<div style="color: {fg}; margin-right: 10px;">"#,
                r#"<div class="header">{heading}</div><p> {text}</p></div></div>"#
            ),
            bg = escape(&c.background),
            fg = escape(&c.text_color),
            icon = escape(&c.icon),
            heading = escape(&c.heading),
            text = escape(&c.text),
        )
    }
}

fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastPhase {
    /// On screen, possibly with an expiry pending.
    Visible,
    /// Fading out; removal follows after the fade time.
    FadingOut,
}

/// Board changes, in the order they happen.
#[derive(Debug, Clone, PartialEq)]
pub enum ToastEvent {
    /// Prepended to the container at `position` and faded in.
    Shown { id: ToastId, position: Position },
    FadingOut { id: ToastId },
    Removed { id: ToastId },
}

/// One toast as seen by [`Notifier::snapshot`].
#[derive(Debug, Clone, PartialEq)]
pub struct BoardEntry {
    pub toast: Toast,
    pub phase: ToastPhase,
    pub hovered: bool,
}

/// One container as seen by [`Notifier::snapshot`], toasts first child first.
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerView {
    pub position: Position,
    pub toasts: Vec<BoardEntry>,
}

struct Slot {
    toast: Toast,
    phase: ToastPhase,
    hovered: bool,
    // Bumped on every arm/disarm; a firing timer only acts if it still matches.
    timer: u64,
    armed: bool,
}

struct Container {
    position: Position,
    slots: VecDeque<Slot>,
}

#[derive(Default)]
struct Board {
    next_id: u64,
    containers: Vec<Container>,
}

impl Board {
    fn slot_mut(&mut self, id: ToastId) -> Option<&mut Slot> {
        self.containers
            .iter_mut()
            .flat_map(|c| c.slots.iter_mut())
            .find(|s| s.toast.id == id)
    }

    fn remove(&mut self, id: ToastId) -> bool {
        for container in &mut self.containers {
            if let Some(index) = container.slots.iter().position(|s| s.toast.id == id) {
                container.slots.remove(index);
                return true;
            }
        }
        false
    }
}

/// Shows and expires toasts. Cheap to clone; clones share the board.
///
/// All methods that start timers must be called inside a tokio runtime.
#[derive(Clone)]
pub struct Notifier {
    board: Arc<Mutex<Board>>,
    events: broadcast::Sender<ToastEvent>,
    fade: Duration,
}

impl fmt::Debug for Notifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notifier")
            .field("fade", &self.fade)
            .field("toasts", &self.len())
            .finish()
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier {
    pub fn new() -> Self {
        Self::with_fade(DEFAULT_FADE)
    }

    /// Notifier whose fade animations take `fade`.
    pub fn with_fade(fade: Duration) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            board: Arc::new(Mutex::new(Board::default())),
            events,
            fade,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ToastEvent> {
        self.events.subscribe()
    }

    /// Show a toast as the first child of its position's container.
    pub fn show(&self, config: ToastConfig) -> ToastId {
        let position = config.position;
        let permanent = config.permanent;
        let id = {
            let mut board = self.board();
            let id = ToastId(board.next_id);
            board.next_id += 1;

            let index = match board.containers.iter().position(|c| c.position == position) {
                Some(index) => index,
                None => {
                    debug!(%position, "creating toast container");
                    board.containers.push(Container {
                        position,
                        slots: VecDeque::new(),
                    });
                    board.containers.len() - 1
                }
            };
            board.containers[index].slots.push_front(Slot {
                toast: Toast { id, config },
                phase: ToastPhase::Visible,
                hovered: false,
                timer: 0,
                armed: false,
            });
            id
        };

        info!(toast = id.0, %position, permanent, "toast shown");
        self.emit(ToastEvent::Shown { id, position });
        if !permanent {
            self.arm(id);
        }
        id
    }

    /// Pointer entered the toast: cancel its pending expiry.
    pub fn pointer_enter(&self, id: ToastId) {
        let mut board = self.board();
        let Some(slot) = board.slot_mut(id) else {
            return;
        };
        if slot.toast.config.permanent || slot.phase == ToastPhase::FadingOut {
            return;
        }
        slot.hovered = true;
        slot.timer += 1;
        slot.armed = false;
    }

    /// Pointer left the toast: restart its expiry from the full duration.
    pub fn pointer_leave(&self, id: ToastId) {
        {
            let mut board = self.board();
            let Some(slot) = board.slot_mut(id) else {
                return;
            };
            if slot.toast.config.permanent || slot.phase == ToastPhase::FadingOut {
                return;
            }
            slot.hovered = false;
        }
        self.arm(id);
    }

    /// Close control of `owner` was clicked.
    ///
    /// The close handler resolves its target by the fixed message identifier, so it always
    /// closes the first toast in document order. That is `owner` only while a single toast
    /// is on screen. If that first toast is already fading out the click has no effect,
    /// even when other toasts are still visible.
    pub fn click_close(&self, owner: ToastId) {
        let target = {
            let board = self.board();
            board
                .containers
                .iter()
                .flat_map(|c| c.slots.iter())
                .map(|s| s.toast.id)
                .next()
        };
        if let Some(target) = target {
            if target != owner {
                debug!(owner = owner.0, target = target.0, "close resolved to first toast");
            }
            self.fade_out(target, None);
        }
    }

    /// Containers with their toasts, in document order.
    pub fn snapshot(&self) -> Vec<ContainerView> {
        self.board()
            .containers
            .iter()
            .map(|c| ContainerView {
                position: c.position,
                toasts: c
                    .slots
                    .iter()
                    .map(|s| BoardEntry {
                        toast: s.toast.clone(),
                        phase: s.phase,
                        hovered: s.hovered,
                    })
                    .collect(),
            })
            .collect()
    }

    pub fn phase(&self, id: ToastId) -> Option<ToastPhase> {
        self.board().slot_mut(id).map(|s| s.phase)
    }

    pub fn contains(&self, id: ToastId) -> bool {
        self.phase(id).is_some()
    }

    /// Number of toasts on the board, fading ones included.
    pub fn len(&self) -> usize {
        self.board().containers.iter().map(|c| c.slots.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn arm(&self, id: ToastId) {
        let (generation, duration) = {
            let mut board = self.board();
            let Some(slot) = board.slot_mut(id) else {
                return;
            };
            slot.timer += 1;
            slot.armed = true;
            (slot.timer, slot.toast.config.duration)
        };

        let notifier = self.clone();
        tokio::spawn(async move {
            time::sleep(duration).await;
            notifier.fade_out(id, Some(generation));
        });
    }

    /// Start the fade-out of `id`. With `Some(generation)` this is an expiry and only goes
    /// ahead if that timer was not cancelled or superseded meanwhile.
    fn fade_out(&self, id: ToastId, generation: Option<u64>) {
        {
            let mut board = self.board();
            let Some(slot) = board.slot_mut(id) else {
                return;
            };
            if slot.phase == ToastPhase::FadingOut {
                return;
            }
            if let Some(generation) = generation {
                if !slot.armed || slot.timer != generation {
                    return;
                }
            }
            slot.phase = ToastPhase::FadingOut;
            slot.armed = false;
            slot.timer += 1;
        }
        self.emit(ToastEvent::FadingOut { id });

        let notifier = self.clone();
        let fade = self.fade;
        tokio::spawn(async move {
            time::sleep(fade).await;
            if notifier.board().remove(id) {
                debug!(toast = id.0, "toast removed");
                notifier.emit(ToastEvent::Removed { id });
            }
        });
    }

    fn emit(&self, event: ToastEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    fn board(&self) -> MutexGuard<'_, Board> {
        self.board.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
