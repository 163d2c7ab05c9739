//! Integration tests for loading settings files.

use std::path::{Path, PathBuf};

use sendseries::{load_settings, load_settings_or_default, ConfigError, SeriesDefaults, Settings};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

#[test]
fn test_load_fixture() {
    let settings = load_settings(fixture("config.yaml")).expect("Should load fixture");

    assert_eq!(settings.default_subject_prefix, "PATCH net-next");
    assert_eq!(settings.default_tos, vec!["netdev@vger.kernel.org"]);
    assert_eq!(settings.get_maintainer_cc_args, vec!["--no-git"]);
    assert_eq!(settings.format_patch_args, vec!["--base=auto"]);
    assert_eq!(settings.browser_command.as_deref(), Some("firefox --new-tab"));

    // Keys absent from the file keep their defaults.
    assert_eq!(settings.git_path, "git");
    assert_eq!(settings.maintainers_path, "MAINTAINERS");
    assert_eq!(
        settings.get_maintainer_to_args,
        Settings::default().get_maintainer_to_args
    );

    let root = Path::new("/src/linux");
    assert_eq!(
        settings.checkpatch(root),
        PathBuf::from("/src/linux/tools/checkpatch.pl")
    );
    assert_eq!(
        settings.archive_url("1@example.org"),
        "https://lists.example.org/r/1@example.org"
    );
}

#[test]
fn test_defaults_seed_new_series() {
    let settings = load_settings(fixture("config.yaml")).unwrap();
    let series = SeriesDefaults::from(&settings).series();

    assert_eq!(series.prefix, "PATCH net-next");
    assert_eq!(series.version, 1);
    assert_eq!(series.nb_patches, 1);
    assert_eq!(series.tos, vec!["netdev@vger.kernel.org"]);
    assert_eq!(series.ccs, vec!["ada@example.org"]);
}

#[test]
fn test_missing_file() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("config.yaml");

    assert!(matches!(
        load_settings(&path),
        Err(ConfigError::ReadFile { .. })
    ));
    assert_eq!(load_settings_or_default(&path).unwrap(), Settings::default());
}

#[test]
fn test_invalid_file() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("config.yaml");

    std::fs::write(&path, "gitPath: ''\n").unwrap();
    assert!(matches!(
        load_settings(&path),
        Err(ConfigError::Validation { .. })
    ));

    std::fs::write(&path, "defaultTos: [unclosed\n").unwrap();
    assert!(matches!(
        load_settings(&path),
        Err(ConfigError::ParseYaml(_))
    ));
}
