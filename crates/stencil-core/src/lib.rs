//! Stencil Core - scaffolding engine with a hand-rolled terminal layer
//!
//! The interesting part lives in [`term`]: a raw-mode key source with
//! debounced dispatch, an erase-in-place render surface, a single-selection
//! menu, and a progress tracker with a rate-limited live updater. Everything
//! else is thin plumbing around it:
//!
//! - [`templates`] fetches template archives (remote or local) and writes
//!   their files into the project directory
//! - [`runtime`] probes external tools (git)
//! - [`project`] bootstraps the git repository
//! - [`create`] is the interactive flow binaries dispatch into
//!
//! Binaries implement [`ProductConfig`] to supply template URLs and
//! product-specific text, construct one [`term::KeySource`], and call
//! [`run`].

pub mod create;
pub mod product;
pub mod project;
pub mod runtime;
pub mod templates;
pub mod term;
pub mod ui;

// Re-export main types for convenience
pub use create::{run, CreateArgs};
pub use product::ProductConfig;
pub use templates::{RootManifest, TemplateFetcher, TemplateManifest, TemplateSource};
pub use term::{KeyEvent, KeyName, KeySource, SelectItem, Selector, StepStatus, Tracker};
