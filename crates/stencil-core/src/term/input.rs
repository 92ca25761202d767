//! Key source: raw-mode ownership, debounced key dispatch, subscriptions
//!
//! One `KeySource` is constructed by the binary's entry point and passed by
//! reference to everything that needs keyboard input. Raw terminal events are
//! read on a blocking task, coalesced through a debounce window, normalized,
//! and fanned out to channel-backed subscriptions.

use super::key::{normalize_key, KeyEvent, KeyName};
use crossterm::event::{self, Event, KeyEventKind, KeyModifiers};
use crossterm::terminal;
use crossterm::tty::IsTty;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::mpsc;

/// Quiet period after which the last buffered raw event is emitted.
///
/// Arrow keys arrive as multi-byte escape sequences; coalescing a burst into
/// its final event keeps consumers from seeing partial or duplicate
/// keystrokes. The flip side is that two legitimate presses landing inside
/// the same window collapse into one. Known trade-off, kept as-is.
pub const DEBOUNCE_WINDOW: Duration = Duration::from_millis(50);

/// How long the reader blocks waiting for terminal input per poll.
const READER_POLL: Duration = Duration::from_millis(50);

/// Whether this process has actually switched the terminal into raw mode.
/// Consulted by [`restore_terminal`] so last-resort hooks never disable a
/// mode that was never enabled.
static TERMINAL_RAW: AtomicBool = AtomicBool::new(false);

/// Restore the terminal to a usable state: leave raw mode if we entered it
/// and bring the cursor back. Safe to call from panic hooks and signal
/// handlers; never fails.
pub fn restore_terminal() {
    if TERMINAL_RAW.swap(false, Ordering::SeqCst) {
        let _ = terminal::disable_raw_mode();
    }
    let _ = console::Term::stderr().show_cursor();
}

/// A raw key as read from the terminal, before normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawKey {
    pub code: event::KeyCode,
    pub ctrl: bool,
}

impl RawKey {
    pub fn plain(code: event::KeyCode) -> Self {
        Self { code, ctrl: false }
    }

    fn is_ctrl_c(&self) -> bool {
        self.ctrl && matches!(self.code, event::KeyCode::Char('c'))
    }

    fn normalize(&self) -> KeyEvent {
        let raw = match self.code {
            event::KeyCode::Char(c) => Some(c),
            _ => None,
        };
        KeyEvent {
            raw,
            name: normalize_key(self.code),
            ctrl: self.ctrl,
        }
    }
}

type EventTx = mpsc::UnboundedSender<KeyEvent>;

#[derive(Default)]
struct Registry {
    /// Name-filtered subscriptions, in registration order
    named: Vec<(u64, KeyName, EventTx)>,
    /// Wildcard subscriptions, invoked after the named ones
    any: Vec<(u64, EventTx)>,
    next_id: u64,
}

struct Shared {
    registry: Mutex<Registry>,
    /// Whether raw events are currently forwarded to the dispatch pipeline
    delivering: AtomicBool,
    /// Logical raw-mode flag for this source. Idempotent: double enable is a
    /// no-op, as is disabling when already disabled.
    raw_enabled: AtomicBool,
    /// Whether the input stream is an interactive terminal. When it is not,
    /// enabling raw mode degrades to resuming delivery only.
    interactive: bool,
}

impl Shared {
    fn lock_registry(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn enable_raw_mode(&self) -> io::Result<()> {
        self.delivering.store(true, Ordering::SeqCst);
        if self.raw_enabled.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        if self.interactive && !TERMINAL_RAW.swap(true, Ordering::SeqCst) {
            terminal::enable_raw_mode()?;
        }
        Ok(())
    }

    fn disable_raw_mode(&self) -> io::Result<()> {
        self.delivering.store(false, Ordering::SeqCst);
        if !self.raw_enabled.swap(false, Ordering::SeqCst) {
            return Ok(());
        }
        if self.interactive && TERMINAL_RAW.swap(false, Ordering::SeqCst) {
            terminal::disable_raw_mode()?;
        }
        Ok(())
    }

    /// Deliver one normalized event: name-matching subscribers first, then
    /// wildcard subscribers, each group in registration order. Subscriptions
    /// whose receiving end went away are pruned.
    fn emit(&self, event: KeyEvent) {
        log::trace!("key event: {:?}", event);
        let mut registry = self.lock_registry();
        registry
            .named
            .retain(|(_, name, tx)| *name != event.name || tx.send(event).is_ok());
        registry.any.retain(|(_, tx)| tx.send(event).is_ok());
    }
}

/// Handle to the process's keyboard input.
pub struct KeySource {
    raw_tx: mpsc::UnboundedSender<RawKey>,
    shared: Arc<Shared>,
}

impl KeySource {
    /// Create a key source reading from the real terminal. Must be called
    /// within a Tokio runtime.
    pub fn new() -> Self {
        let interactive = io::stdin().is_tty();
        Self::build(interactive, true)
    }

    /// Create a key source with no terminal reader. Events are supplied via
    /// [`KeySource::inject`] and flow through the same debounce pipeline.
    pub fn detached() -> Self {
        Self::build(false, false)
    }

    fn build(interactive: bool, spawn_reader: bool) -> Self {
        let (raw_tx, raw_rx) = mpsc::unbounded_channel();
        let shared = Arc::new(Shared {
            registry: Mutex::new(Registry::default()),
            delivering: AtomicBool::new(false),
            raw_enabled: AtomicBool::new(false),
            interactive,
        });

        tokio::spawn(dispatch_loop(raw_rx, Arc::clone(&shared)));

        if spawn_reader {
            let tx = raw_tx.clone();
            let reader_shared = Arc::clone(&shared);
            tokio::task::spawn_blocking(move || reader_loop(tx, reader_shared));
        }

        Self { raw_tx, shared }
    }

    /// Switch the terminal to character-at-a-time delivery and resume event
    /// forwarding. Idempotent. On a non-interactive stream this only resumes
    /// delivery without touching the terminal and never errors.
    pub fn enable_raw_mode(&self) -> io::Result<()> {
        self.shared.enable_raw_mode()
    }

    /// Restore line-buffered delivery and pause event forwarding. Idempotent;
    /// always safe to call even if raw mode was never enabled.
    pub fn disable_raw_mode(&self) -> io::Result<()> {
        self.shared.disable_raw_mode()
    }

    /// Whether this source currently considers itself the raw-mode owner.
    pub fn raw_mode_active(&self) -> bool {
        self.shared.raw_enabled.load(Ordering::SeqCst)
    }

    /// Enable raw mode and return a guard that disables it again when
    /// dropped, on every exit path.
    pub fn raw_guard(&self) -> io::Result<RawModeGuard> {
        self.enable_raw_mode()?;
        Ok(RawModeGuard {
            shared: Arc::clone(&self.shared),
        })
    }

    /// Subscribe to events with a specific name.
    pub fn on(&self, name: KeyName) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut registry = self.shared.lock_registry();
        let id = registry.next_id;
        registry.next_id += 1;
        registry.named.push((id, name, tx));
        Subscription {
            id,
            rx,
            shared: Arc::clone(&self.shared),
        }
    }

    /// Subscribe to every normalized event regardless of name.
    pub fn on_any(&self) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut registry = self.shared.lock_registry();
        let id = registry.next_id;
        registry.next_id += 1;
        registry.any.push((id, tx));
        Subscription {
            id,
            rx,
            shared: Arc::clone(&self.shared),
        }
    }

    /// Resolve with the next event of any name, then unsubscribe. Used for
    /// press-any-key prompts.
    pub async fn wait_for_key(&self) -> Option<KeyEvent> {
        let mut sub = self.on_any();
        sub.recv().await
    }

    /// Feed a raw key into the debounce pipeline (tests, simulated input).
    pub fn inject(&self, raw: RawKey) {
        let _ = self.raw_tx.send(raw);
    }
}

/// Scoped raw-mode acquisition: pairs enable with a guaranteed disable.
pub struct RawModeGuard {
    shared: Arc<Shared>,
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        if let Err(err) = self.shared.disable_raw_mode() {
            log::debug!("failed to leave raw mode: {err}");
        }
    }
}

/// A live subscription. Dropping it unsubscribes.
pub struct Subscription {
    id: u64,
    rx: mpsc::UnboundedReceiver<KeyEvent>,
    shared: Arc<Shared>,
}

impl Subscription {
    /// Receive the next event. `None` means the key source went away.
    pub async fn recv(&mut self) -> Option<KeyEvent> {
        self.rx.recv().await
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let mut registry = self.shared.lock_registry();
        registry.named.retain(|(id, _, _)| *id != self.id);
        registry.any.retain(|(id, _)| *id != self.id);
    }
}

/// Blocking terminal reader. Forwards key presses while delivery is resumed;
/// exits once the key source is gone.
fn reader_loop(tx: mpsc::UnboundedSender<RawKey>, shared: Arc<Shared>) {
    loop {
        if tx.is_closed() {
            return;
        }
        if !shared.delivering.load(Ordering::SeqCst) {
            std::thread::sleep(READER_POLL);
            continue;
        }
        match event::poll(READER_POLL) {
            Ok(false) => {}
            Ok(true) => match event::read() {
                Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                    let raw = RawKey {
                        code: key.code,
                        ctrl: key.modifiers.contains(KeyModifiers::CONTROL),
                    };
                    if tx.send(raw).is_err() {
                        return;
                    }
                }
                Ok(_) => {}
                Err(err) => {
                    log::debug!("terminal read failed: {err}");
                    return;
                }
            },
            Err(err) => {
                log::debug!("terminal poll failed: {err}");
                return;
            }
        }
    }
}

/// Debounce and dispatch. Buffers raw events until the window elapses with
/// no further input, then normalizes and emits exactly the last one.
/// Ctrl+C bypasses the pipeline: restore the terminal and exit immediately.
async fn dispatch_loop(mut raw_rx: mpsc::UnboundedReceiver<RawKey>, shared: Arc<Shared>) {
    while let Some(first) = raw_rx.recv().await {
        if first.is_ctrl_c() {
            restore_terminal();
            std::process::exit(0);
        }
        let mut last = first;
        loop {
            match tokio::time::timeout(DEBOUNCE_WINDOW, raw_rx.recv()).await {
                Ok(Some(next)) => {
                    if next.is_ctrl_c() {
                        restore_terminal();
                        std::process::exit(0);
                    }
                    last = next;
                }
                Ok(None) => return,
                Err(_) => break,
            }
        }
        shared.emit(last.normalize());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyCode;
    use tokio::time::timeout;

    const RECV_BUDGET: Duration = Duration::from_millis(500);

    #[tokio::test]
    async fn test_debounce_emits_only_last_of_burst() {
        let keys = KeySource::detached();
        let mut sub = keys.on_any();

        keys.inject(RawKey::plain(KeyCode::Down));
        keys.inject(RawKey::plain(KeyCode::Up));
        keys.inject(RawKey::plain(KeyCode::Enter));

        let event = timeout(RECV_BUDGET, sub.recv())
            .await
            .expect("debounce window should elapse")
            .expect("source alive");
        assert_eq!(event.name, KeyName::Enter);

        // The earlier keystrokes of the burst were coalesced away.
        let extra = timeout(Duration::from_millis(120), sub.recv()).await;
        assert!(extra.is_err());
    }

    #[tokio::test]
    async fn test_separated_keys_arrive_individually() {
        let keys = KeySource::detached();
        let mut sub = keys.on_any();

        keys.inject(RawKey::plain(KeyCode::Down));
        tokio::time::sleep(DEBOUNCE_WINDOW + Duration::from_millis(30)).await;
        keys.inject(RawKey::plain(KeyCode::Down));

        let first = timeout(RECV_BUDGET, sub.recv()).await.unwrap().unwrap();
        let second = timeout(RECV_BUDGET, sub.recv()).await.unwrap().unwrap();
        assert_eq!(first.name, KeyName::Down);
        assert_eq!(second.name, KeyName::Down);
    }

    #[tokio::test]
    async fn test_named_subscription_filters_by_name() {
        let keys = KeySource::detached();
        let mut enters = keys.on(KeyName::Enter);

        keys.inject(RawKey::plain(KeyCode::Down));
        tokio::time::sleep(DEBOUNCE_WINDOW + Duration::from_millis(30)).await;
        keys.inject(RawKey::plain(KeyCode::Enter));

        let event = timeout(RECV_BUDGET, enters.recv()).await.unwrap().unwrap();
        assert_eq!(event.name, KeyName::Enter);
    }

    #[tokio::test]
    async fn test_duplicate_subscriptions_both_fire() {
        let keys = KeySource::detached();
        let mut first = keys.on_any();
        let mut second = keys.on_any();

        keys.inject(RawKey::plain(KeyCode::Tab));

        let a = timeout(RECV_BUDGET, first.recv()).await.unwrap().unwrap();
        let b = timeout(RECV_BUDGET, second.recv()).await.unwrap().unwrap();
        assert_eq!(a.name, KeyName::Tab);
        assert_eq!(b.name, KeyName::Tab);
    }

    #[tokio::test]
    async fn test_dropped_subscription_stops_receiving() {
        let keys = KeySource::detached();
        let gone = keys.on_any();
        drop(gone);
        let mut live = keys.on_any();

        keys.inject(RawKey::plain(KeyCode::Esc));
        let event = timeout(RECV_BUDGET, live.recv()).await.unwrap().unwrap();
        assert_eq!(event.name, KeyName::Escape);
    }

    #[tokio::test]
    async fn test_wait_for_key_resolves_once() {
        let keys = KeySource::detached();
        let (event, ()) = tokio::join!(keys.wait_for_key(), async {
            keys.inject(RawKey::plain(KeyCode::Char('x')));
        });
        assert_eq!(event.unwrap().name, KeyName::Char('x'));
    }

    #[tokio::test]
    async fn test_raw_mode_enable_is_idempotent() {
        let keys = KeySource::detached();
        keys.enable_raw_mode().unwrap();
        keys.enable_raw_mode().unwrap();
        keys.disable_raw_mode().unwrap();
        assert!(!keys.raw_mode_active());
        // Disabling again stays a no-op.
        keys.disable_raw_mode().unwrap();
        assert!(!keys.raw_mode_active());
    }

    #[tokio::test]
    async fn test_raw_guard_releases_on_drop() {
        let keys = KeySource::detached();
        {
            let _guard = keys.raw_guard().unwrap();
            assert!(keys.raw_mode_active());
        }
        assert!(!keys.raw_mode_active());
    }

    #[test]
    fn test_ctrl_c_detection() {
        let ctrl_c = RawKey {
            code: KeyCode::Char('c'),
            ctrl: true,
        };
        assert!(ctrl_c.is_ctrl_c());
        assert!(!RawKey::plain(KeyCode::Char('c')).is_ctrl_c());
    }
}
