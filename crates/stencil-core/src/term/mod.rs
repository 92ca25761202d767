//! Terminal interaction engine
//!
//! Four pieces, leaves first: `key`/`input` capture raw keystrokes and turn
//! them into debounced, normalized events; `surface` redraws in place by
//! erasing exactly the lines it wrote last; `select` is a single-selection
//! menu on top of both; `progress` renders a live step checklist with a
//! bounded redraw rate. The selector and the tracker never talk to each
//! other.

pub mod input;
pub mod key;
pub mod progress;
pub mod select;
pub mod surface;

pub use input::{restore_terminal, KeySource, RawKey, RawModeGuard, Subscription, DEBOUNCE_WINDOW};
pub use key::{normalize_key, KeyEvent, KeyName};
pub use progress::{LiveUpdater, Step, StepStatus, Tracker, FLUSH_INTERVAL};
pub use select::{Phase, SelectItem, Selector};
pub use surface::{Surface, DEFAULT_WIDTH};
