//! Materialize fetched template files into the project directory

use super::fetcher::TemplateFetcher;
use anyhow::{Context, Result};
use std::path::{Component, Path, PathBuf};
use tokio::fs;

/// Turn a template-relative path into a safe path fragment. Rejects
/// absolute paths and anything that escapes the project directory.
fn sanitize_relative(path: &str) -> Option<PathBuf> {
    let candidate = Path::new(path);
    let mut clean = PathBuf::new();
    for component in candidate.components() {
        match component {
            Component::Normal(part) => clean.push(part),
            Component::CurDir => {}
            _ => return None,
        }
    }
    if clean.as_os_str().is_empty() {
        None
    } else {
        Some(clean)
    }
}

/// Copy every file of a cached template into `project_dir`, creating parent
/// directories as needed. The template's own manifest is not copied.
/// `progress` is invoked once per written file with (done, total, path).
pub async fn copy_template<F>(
    fetcher: &mut TemplateFetcher,
    template_name: &str,
    project_dir: &Path,
    mut progress: F,
) -> Result<Vec<String>>
where
    F: FnMut(usize, usize, &str),
{
    let files: Vec<String> = fetcher
        .template_files(template_name)
        .await?
        .into_iter()
        .filter(|path| path != "template.yaml")
        .collect();
    let total = files.len();

    let mut copied = Vec::with_capacity(total);
    for (index, file_path) in files.into_iter().enumerate() {
        let Some(relative) = sanitize_relative(&file_path) else {
            log::debug!("skipping unsafe template path '{file_path}'");
            continue;
        };
        let bytes = fetcher.fetch_file_bytes(template_name, &file_path).await?;
        let dest = project_dir.join(&relative);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::write(&dest, &bytes)
            .await
            .with_context(|| format!("Failed to write {}", dest.display()))?;
        progress(index + 1, total, &file_path);
        copied.push(file_path);
    }

    Ok(copied)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_relative_paths_pass() {
        assert_eq!(
            sanitize_relative("src/main.rs"),
            Some(PathBuf::from("src/main.rs"))
        );
        assert_eq!(
            sanitize_relative("./README.md"),
            Some(PathBuf::from("README.md"))
        );
    }

    #[test]
    fn test_escaping_paths_are_rejected() {
        assert_eq!(sanitize_relative("../outside.txt"), None);
        assert_eq!(sanitize_relative("src/../../outside.txt"), None);
        assert_eq!(sanitize_relative("/etc/passwd"), None);
        assert_eq!(sanitize_relative(""), None);
    }
}
