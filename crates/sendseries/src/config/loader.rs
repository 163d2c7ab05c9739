use std::path::{Path, PathBuf};

use crate::config::schema::Settings;
use crate::error::ConfigError;

/// Returns the default settings location: `<config dir>/sendseries/config.yaml`.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("sendseries").join("config.yaml"))
}

pub fn load_settings<P: AsRef<Path>>(path: P) -> Result<Settings, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_settings_from_str(&content)
}

/// Loads `path` when it exists and falls back to the defaults otherwise.
pub fn load_settings_or_default<P: AsRef<Path>>(path: P) -> Result<Settings, ConfigError> {
    let path = path.as_ref();
    if path.exists() {
        log::debug!("Loading settings from {}", path.display());
        load_settings(path)
    } else {
        log::debug!("No settings at {}, using defaults", path.display());
        Ok(Settings::default())
    }
}

pub fn load_settings_from_str(content: &str) -> Result<Settings, ConfigError> {
    // An empty YAML document deserializes as null.
    if content.trim().is_empty() {
        return Ok(Settings::default());
    }

    let settings: Settings = serde_yaml::from_str(content)?;

    validate_settings(&settings)?;

    Ok(settings)
}

fn validate_settings(settings: &Settings) -> Result<(), ConfigError> {
    if settings.git_path.trim().is_empty() {
        return Err(ConfigError::Validation {
            message: "gitPath must not be empty".to_string(),
        });
    }

    for (name, list) in [
        ("defaultTos", &settings.default_tos),
        ("defaultCcs", &settings.default_ccs),
    ] {
        if list.iter().any(|email| email.trim().is_empty()) {
            return Err(ConfigError::Validation {
                message: format!("{} must not contain empty addresses", name),
            });
        }
    }

    if let Some(command) = &settings.browser_command {
        if command.trim().is_empty() {
            return Err(ConfigError::Validation {
                message: "browserCommand must not be empty when set".to_string(),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_empty_config() {
        let settings = load_settings_from_str("").unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.default_subject_prefix, "PATCH");
    }

    #[test]
    fn test_load_partial_config() {
        let settings = load_settings_from_str(
            r#"
defaultSubjectPrefix: RFC PATCH net-next
defaultCcs:
  - netdev@vger.kernel.org
formatPatchArgs: ["--base=auto"]
"#,
        )
        .unwrap();
        assert_eq!(settings.default_subject_prefix, "RFC PATCH net-next");
        assert_eq!(settings.default_ccs, vec!["netdev@vger.kernel.org"]);
        assert_eq!(settings.format_patch_args, vec!["--base=auto"]);
        assert_eq!(settings.git_path, "git");
    }

    #[test]
    fn test_empty_git_path_rejected() {
        let err = load_settings_from_str("gitPath: ''").unwrap_err();
        assert!(matches!(err, ConfigError::Validation { .. }));
    }

    #[test]
    fn test_empty_default_recipient_rejected() {
        let err = load_settings_from_str("defaultTos: ['a@b.c', ' ']").unwrap_err();
        assert!(err.to_string().contains("defaultTos"));
    }

    #[test]
    fn test_invalid_yaml() {
        let err = load_settings_from_str("defaultTos: {").unwrap_err();
        assert!(matches!(err, ConfigError::ParseYaml(_)));
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = load_settings_or_default(dir.path().join("config.yaml")).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "archiveUrlPrefix: https://example.org/m/\n").unwrap();
        let settings = load_settings_or_default(&path).unwrap();
        assert_eq!(settings.archive_url("abc@x"), "https://example.org/m/abc@x");
    }
}
