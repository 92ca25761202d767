//! Template manifest types and parsing

use serde::{Deserialize, Serialize};

/// Root manifest (`template.yaml`): lists the available template names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RootManifest {
    pub templates: Vec<String>,
}

/// Per-template manifest (`<name>/template.yaml`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateManifest {
    /// Display name of the template
    pub name: String,

    /// Description of what the template provides
    pub description: String,

    /// Semver version for CLI compatibility checking
    pub version: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_root_manifest() {
        let yaml = "templates:\n  - quickstart\n  - api-service\n";
        let manifest: RootManifest = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(manifest.templates, vec!["quickstart", "api-service"]);
    }

    #[test]
    fn test_parse_template_manifest() {
        let yaml = "name: Quickstart\ndescription: Minimal starter\nversion: 0.2.0\n";
        let manifest: TemplateManifest = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(manifest.name, "Quickstart");
        assert_eq!(manifest.version, "0.2.0");
    }

    #[test]
    fn test_missing_fields_are_an_error() {
        let yaml = "name: Incomplete\n";
        assert!(serde_yaml::from_str::<TemplateManifest>(yaml).is_err());
    }
}
