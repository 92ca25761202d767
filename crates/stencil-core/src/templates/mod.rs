//! Template retrieval and materialization

pub mod copier;
pub mod fetcher;
pub mod manifest;
pub mod version;

pub use copier::copy_template;
pub use fetcher::{FetchError, TemplateFetcher, TemplateSource};
pub use manifest::{RootManifest, TemplateManifest};
