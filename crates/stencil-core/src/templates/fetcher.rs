//! Template fetching from remote (release assets) or a local directory
//!
//! Both paths go through zip archives for identical behavior: remote
//! templates are downloaded as pre-built zips, local template folders are
//! zipped on the fly, and either is extracted into an in-memory cache.

use super::manifest::{RootManifest, TemplateManifest};
use crate::product::ProductConfig;
use std::collections::HashMap;
use std::io::{Cursor, Read, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use url::Url;
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid template URL '{url}'")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("template URL cannot have path segments: {0}")]
    CannotBeABase(Url),

    #[error("failed to fetch {url}")]
    Transport {
        url: Url,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP {status} fetching {url}")]
    Status { url: Url, status: reqwest::StatusCode },

    #[error("failed to read {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid manifest for '{name}'")]
    Manifest {
        name: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("template '{name}' archive is malformed")]
    Archive {
        name: String,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("template '{0}' archive is missing template.yaml")]
    MissingManifest(String),

    #[error("file '{file}' not found in template '{template}'")]
    MissingFile { template: String, file: String },
}

/// Template source: a remote base URL or a local directory.
#[derive(Debug, Clone)]
pub enum TemplateSource {
    Remote(Url),
    Local(PathBuf),
}

impl TemplateSource {
    /// Remote source from the product config, honoring its env override.
    pub fn from_config<C: ProductConfig>(config: &C) -> Result<Self, FetchError> {
        let url_str = std::env::var(config.template_url_env())
            .unwrap_or_else(|_| config.default_template_url().to_string());
        let url = Url::parse(&url_str).map_err(|source| FetchError::InvalidUrl {
            url: url_str,
            source,
        })?;
        Ok(Self::Remote(url))
    }

    pub fn local(path: PathBuf) -> Self {
        Self::Local(path)
    }
}

/// Extracted template contents, keyed by path relative to the template root.
#[derive(Debug, Clone)]
struct TemplateCache {
    manifest: TemplateManifest,
    files: HashMap<String, Vec<u8>>,
}

/// Retrieves templates and keeps extracted archives cached per name.
pub struct TemplateFetcher {
    source: TemplateSource,
    client: reqwest::Client,
    cache: HashMap<String, TemplateCache>,
}

impl TemplateFetcher {
    pub fn new(source: TemplateSource, user_agent: &str) -> Self {
        Self {
            source,
            client: reqwest::Client::builder()
                .user_agent(user_agent)
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
            cache: HashMap::new(),
        }
    }

    pub fn from_config<C: ProductConfig>(config: &C) -> Result<Self, FetchError> {
        let source = TemplateSource::from_config(config)?;
        Ok(Self::new(source, config.user_agent()))
    }

    pub fn from_local(path: PathBuf, user_agent: &str) -> Self {
        Self::new(TemplateSource::local(path), user_agent)
    }

    /// Append a path segment to a base URL, preserving query parameters.
    fn build_url(base: &Url, segment: &str) -> Result<Url, FetchError> {
        let mut url = base.clone();
        url.path_segments_mut()
            .map_err(|_| FetchError::CannotBeABase(base.clone()))?
            .pop_if_empty()
            .push(segment);
        Ok(url)
    }

    async fn http_get(&self, url: Url) -> Result<Vec<u8>, FetchError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|source| FetchError::Transport {
                url: url.clone(),
                source,
            })?;
        if !response.status().is_success() {
            return Err(FetchError::Status {
                url,
                status: response.status(),
            });
        }
        response
            .bytes()
            .await
            .map(|bytes| bytes.to_vec())
            .map_err(|source| FetchError::Transport { url, source })
    }

    /// Fetch the root manifest listing available templates.
    pub async fn fetch_root_manifest(&self) -> Result<RootManifest, FetchError> {
        let content = match &self.source {
            TemplateSource::Remote(base) => {
                let url = Self::build_url(base, "template.yaml")?;
                let bytes = self.http_get(url).await?;
                String::from_utf8_lossy(&bytes).into_owned()
            }
            TemplateSource::Local(path) => {
                let manifest_path = path.join("template.yaml");
                tokio::fs::read_to_string(&manifest_path)
                    .await
                    .map_err(|source| FetchError::Io {
                        path: manifest_path,
                        source,
                    })?
            }
        };
        serde_yaml::from_str(&content).map_err(|source| FetchError::Manifest {
            name: "root".to_string(),
            source,
        })
    }

    /// Build a zip for a local template folder so local and remote sources
    /// behave identically downstream.
    fn build_local_zip(template_dir: &Path, template_name: &str) -> Result<Vec<u8>, FetchError> {
        let template_path = template_dir.join(template_name);
        let mut buffer = Vec::new();
        {
            let mut zip = ZipWriter::new(Cursor::new(&mut buffer));
            let options =
                SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

            for entry in WalkDir::new(&template_path)
                .into_iter()
                .filter_map(|entry| entry.ok())
            {
                if !entry.file_type().is_file() {
                    continue;
                }
                let relative = entry
                    .path()
                    .strip_prefix(&template_path)
                    .unwrap_or_else(|_| entry.path());
                let zip_path = format!(
                    "{}/{}",
                    template_name,
                    relative.to_string_lossy().replace('\\', "/")
                );
                let content =
                    std::fs::read(entry.path()).map_err(|source| FetchError::Io {
                        path: entry.path().to_path_buf(),
                        source,
                    })?;
                zip.start_file(zip_path.as_str(), options)
                    .map_err(|source| FetchError::Archive {
                        name: template_name.to_string(),
                        source,
                    })?;
                zip.write_all(&content).map_err(|source| FetchError::Io {
                    path: entry.path().to_path_buf(),
                    source,
                })?;
            }

            zip.finish().map_err(|source| FetchError::Archive {
                name: template_name.to_string(),
                source,
            })?;
        }
        Ok(buffer)
    }

    /// Extract a template zip into the cache. Entries are stored relative to
    /// the template root (the `<name>/` prefix is stripped).
    fn extract_zip(zip_bytes: &[u8], template_name: &str) -> Result<TemplateCache, FetchError> {
        let cursor = Cursor::new(zip_bytes);
        let mut archive =
            ZipArchive::new(cursor).map_err(|source| FetchError::Archive {
                name: template_name.to_string(),
                source,
            })?;

        let prefix = format!("{}/", template_name);
        let mut files: HashMap<String, Vec<u8>> = HashMap::new();
        let mut manifest: Option<TemplateManifest> = None;

        for index in 0..archive.len() {
            let mut file = archive
                .by_index(index)
                .map_err(|source| FetchError::Archive {
                    name: template_name.to_string(),
                    source,
                })?;
            if file.is_dir() {
                continue;
            }
            let full_path = file.name().to_string();
            let relative = full_path
                .strip_prefix(prefix.as_str())
                .unwrap_or(full_path.as_str())
                .to_string();

            let mut contents = Vec::new();
            file.read_to_end(&mut contents)
                .map_err(|source| FetchError::Io {
                    path: PathBuf::from(&full_path),
                    source,
                })?;

            if relative == "template.yaml" {
                let text = String::from_utf8_lossy(&contents);
                manifest = Some(serde_yaml::from_str(&text).map_err(|source| {
                    FetchError::Manifest {
                        name: template_name.to_string(),
                        source,
                    }
                })?);
            }
            files.insert(relative, contents);
        }

        let manifest =
            manifest.ok_or_else(|| FetchError::MissingManifest(template_name.to_string()))?;
        Ok(TemplateCache { manifest, files })
    }

    async fn ensure_cached(&mut self, template_name: &str) -> Result<(), FetchError> {
        if self.cache.contains_key(template_name) {
            return Ok(());
        }
        log::debug!("fetching template '{template_name}'");

        let zip_bytes = match &self.source {
            TemplateSource::Remote(base) => {
                let url = Self::build_url(base, &format!("{template_name}.zip"))?;
                self.http_get(url).await?
            }
            TemplateSource::Local(path) => Self::build_local_zip(path, template_name)?,
        };

        let cache = Self::extract_zip(&zip_bytes, template_name)?;
        self.cache.insert(template_name.to_string(), cache);
        Ok(())
    }

    fn cached(&self, template_name: &str) -> Result<&TemplateCache, FetchError> {
        self.cache
            .get(template_name)
            .ok_or_else(|| FetchError::MissingManifest(template_name.to_string()))
    }

    /// Fetch a specific template's manifest.
    pub async fn fetch_template_manifest(
        &mut self,
        template_name: &str,
    ) -> Result<TemplateManifest, FetchError> {
        self.ensure_cached(template_name).await?;
        Ok(self.cached(template_name)?.manifest.clone())
    }

    /// List the files a template ships, in stable order.
    pub async fn template_files(&mut self, template_name: &str) -> Result<Vec<String>, FetchError> {
        self.ensure_cached(template_name).await?;
        let mut files: Vec<String> = self.cached(template_name)?.files.keys().cloned().collect();
        files.sort();
        Ok(files)
    }

    /// Fetch a file from a template as bytes.
    pub async fn fetch_file_bytes(
        &mut self,
        template_name: &str,
        file_path: &str,
    ) -> Result<Vec<u8>, FetchError> {
        self.ensure_cached(template_name).await?;
        self.cached(template_name)?
            .files
            .get(file_path)
            .cloned()
            .ok_or_else(|| FetchError::MissingFile {
                template: template_name.to_string(),
                file: file_path.to_string(),
            })
    }
}
