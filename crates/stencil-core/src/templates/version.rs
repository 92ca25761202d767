//! CLI / template version compatibility

use semver::Version;

/// Warn when the running CLI is older than the version a template was built
/// for. Returns `None` when either version string fails to parse; an
/// unparseable version is no reason to block scaffolding.
pub fn check_compatibility(
    cli_version: &str,
    template_version: &str,
    upgrade_command: &str,
) -> Option<String> {
    let cli = parse_version(cli_version)?;
    let template = parse_version(template_version)?;

    if cli < template {
        Some(format!(
            "This template targets CLI version {} or newer; you are running {}. Consider updating: {}",
            template_version, cli_version, upgrade_command
        ))
    } else {
        None
    }
}

/// Parse a version string, tolerating a leading `v`.
fn parse_version(version: &str) -> Option<Version> {
    Version::parse(version.strip_prefix('v').unwrap_or(version)).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_older_cli_gets_a_warning() {
        let warning = check_compatibility("0.1.0", "0.2.0", "cargo install stencil-tools --force");
        assert!(warning.unwrap().contains("0.2.0"));
    }

    #[test]
    fn test_matching_and_newer_cli_pass_silently() {
        assert!(check_compatibility("0.2.0", "0.2.0", "upgrade").is_none());
        assert!(check_compatibility("0.3.0", "0.2.0", "upgrade").is_none());
    }

    #[test]
    fn test_unparseable_versions_do_not_warn() {
        assert!(check_compatibility("not-a-version", "0.2.0", "upgrade").is_none());
        assert!(check_compatibility("0.2.0", "garbage", "upgrade").is_none());
    }

    #[test]
    fn test_leading_v_is_tolerated() {
        let warning = check_compatibility("v0.1.0", "v0.2.0", "upgrade");
        assert!(warning.is_some());
    }
}
