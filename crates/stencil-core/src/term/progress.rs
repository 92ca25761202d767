//! Progress tracker: an ordered step checklist rendered as a tree, with a
//! rate-limited live updater for flicker-free redraws

use super::surface::Surface;
use colored::Colorize;
use std::io::{self, Stdout, Write};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Redraw cadence of the live updater: ten flushes per second.
pub const FLUSH_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    Pending,
    Running,
    Done,
    Error,
    Skipped,
}

/// One named unit of progress. Unique by key within its tracker.
#[derive(Debug, Clone)]
pub struct Step {
    pub key: String,
    pub label: String,
    pub status: StepStatus,
    pub detail: String,
}

type RefreshFn = Box<dyn Fn(String) + Send + Sync>;

/// Ordered list of steps for one long-running operation. Insertion order is
/// render order. Status transitions are not enforced; the last write wins.
pub struct Tracker {
    title: String,
    steps: Vec<Step>,
    refresh: Option<RefreshFn>,
}

impl Tracker {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            steps: Vec::new(),
            refresh: None,
        }
    }

    /// Attach a refresh hook invoked with a fresh frame on every mutation.
    pub fn set_refresh(&mut self, hook: impl Fn(String) + Send + Sync + 'static) {
        self.refresh = Some(Box::new(hook));
    }

    /// Register a pending step. First registration wins: a duplicate key is
    /// ignored, not merged.
    pub fn add(&mut self, key: &str, label: &str) {
        if self.steps.iter().any(|step| step.key == key) {
            return;
        }
        self.steps.push(Step {
            key: key.to_string(),
            label: label.to_string(),
            status: StepStatus::Pending,
            detail: String::new(),
        });
        self.notify();
    }

    /// Set a step's status. Unknown keys are created on the fly (with the
    /// key doubling as the label); `detail` only overwrites when non-empty.
    pub fn update(&mut self, key: &str, status: StepStatus, detail: &str) {
        match self.steps.iter_mut().find(|step| step.key == key) {
            Some(step) => {
                step.status = status;
                if !detail.is_empty() {
                    step.detail = detail.to_string();
                }
            }
            None => self.steps.push(Step {
                key: key.to_string(),
                label: key.to_string(),
                status,
                detail: detail.to_string(),
            }),
        }
        self.notify();
    }

    pub fn start(&mut self, key: &str, detail: &str) {
        self.update(key, StepStatus::Running, detail);
    }

    pub fn complete(&mut self, key: &str, detail: &str) {
        self.update(key, StepStatus::Done, detail);
    }

    pub fn error(&mut self, key: &str, detail: &str) {
        self.update(key, StepStatus::Error, detail);
    }

    pub fn skip(&mut self, key: &str, detail: &str) {
        self.update(key, StepStatus::Skipped, detail);
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Render the current state as a tree: title, then one branch line per
    /// step with a status glyph and optional dimmed detail.
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("{}\n", self.title.as_str().bold()));
        let last = self.steps.len().saturating_sub(1);
        for (idx, step) in self.steps.iter().enumerate() {
            let branch = if idx == last { "└─" } else { "├─" };
            let glyph = match step.status {
                StepStatus::Pending => "○".dimmed(),
                StepStatus::Running => "○".cyan().bold(),
                StepStatus::Done => "●".green(),
                StepStatus::Error => "●".red(),
                StepStatus::Skipped => "○".yellow(),
            };
            out.push_str(&format!("{} {} {}", branch.dimmed(), glyph, step.label));
            if !step.detail.is_empty() {
                out.push_str(&format!(" {}", format!("({})", step.detail).as_str().dimmed()));
            }
            out.push('\n');
        }
        out
    }

    fn notify(&self) {
        if let Some(hook) = &self.refresh {
            let frame = self.render();
            // A panicking refresh hook must not take the step list down.
            if catch_unwind(AssertUnwindSafe(|| hook(frame))).is_err() {
                log::debug!("refresh hook panicked; frame dropped");
            }
        }
    }
}

/// Rate-limiting redraw scheduler. Keeps only the latest pending frame and
/// flushes it through a [`Surface`] at [`FLUSH_INTERVAL`], so bursty status
/// updates cost a bounded number of redraws while the final flush always
/// shows the most recent state.
pub struct LiveUpdater<W: Write + Send + 'static> {
    pending: Arc<Mutex<Option<String>>>,
    surface: Arc<Mutex<Surface<W>>>,
    task: JoinHandle<()>,
}

impl LiveUpdater<Stdout> {
    pub fn stdout() -> Self {
        Self::spawn(Surface::stdout())
    }
}

impl<W: Write + Send + 'static> LiveUpdater<W> {
    /// Start the periodic flush task over the given surface.
    pub fn spawn(surface: Surface<W>) -> Self {
        let pending: Arc<Mutex<Option<String>>> = Arc::new(Mutex::new(None));
        let surface = Arc::new(Mutex::new(surface));
        let task = tokio::spawn(flush_loop(Arc::clone(&pending), Arc::clone(&surface)));
        Self {
            pending,
            surface,
            task,
        }
    }

    /// A hook suitable for [`Tracker::set_refresh`]: stores the frame,
    /// discarding any not-yet-flushed predecessor.
    pub fn refresher(&self) -> impl Fn(String) + Send + Sync + 'static {
        let pending = Arc::clone(&self.pending);
        move |frame| {
            *pending.lock().unwrap_or_else(|e| e.into_inner()) = Some(frame);
        }
    }

    /// Stop the periodic flush, draw the final frame once, and leave the
    /// cursor below it. No further redraws happen afterwards.
    pub async fn finish(self, frame: &str) -> io::Result<()> {
        let LiveUpdater { surface, task, .. } = self;
        task.abort();
        let _ = task.await;
        let mut surface = surface.lock().unwrap_or_else(|e| e.into_inner());
        surface.draw(frame)
    }
}

async fn flush_loop<W: Write + Send + 'static>(
    pending: Arc<Mutex<Option<String>>>,
    surface: Arc<Mutex<Surface<W>>>,
) {
    let mut ticker = tokio::time::interval(FLUSH_INTERVAL);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    loop {
        ticker.tick().await;
        let frame = pending.lock().unwrap_or_else(|e| e.into_inner()).take();
        if let Some(frame) = frame {
            let mut surface = surface.lock().unwrap_or_else(|e| e.into_inner());
            if let Err(err) = surface.draw(&frame) {
                log::debug!("progress redraw failed: {err}");
            }
        }
    }
}
