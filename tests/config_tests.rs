use std::path::PathBuf;
use std::time::Duration;

use figure_rotator::config::{Configuration, DEFAULT_INTERVAL};
use rand::RngCore;

#[test]
fn parse_kebab_case_config() {
    let yaml = r#"
figure-library-path: "/figures"
"#;
    let cfg: Configuration = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(cfg.figure_library_path, PathBuf::from("/figures"));
    assert_eq!(cfg.interval, DEFAULT_INTERVAL);
    assert_eq!(cfg.interval, Duration::from_millis(10_000));
    assert_eq!(cfg.shuffle_seed, None);
    assert_eq!(cfg.command_queue_capacity, 16);
}

#[test]
fn parse_humantime_interval_and_seed() {
    let yaml = r#"
figure-library-path: "/figures"
interval: 2s 500ms
shuffle-seed: 7
command-queue-capacity: 4
"#;
    let cfg: Configuration = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(cfg.interval, Duration::from_millis(2_500));
    assert_eq!(cfg.shuffle_seed, Some(7));
    assert_eq!(cfg.command_queue_capacity, 4);
}

#[test]
fn unknown_fields_are_rejected() {
    let yaml = r#"
figure-library-path: "/figures"
transition: fade
"#;
    assert!(serde_yaml::from_str::<Configuration>(yaml).is_err());
}

#[test]
fn library_path_is_required() {
    assert!(serde_yaml::from_str::<Configuration>("interval: 5s\n").is_err());
}

#[test]
fn validation_rejects_degenerate_values() {
    let zero_interval = Configuration {
        figure_library_path: PathBuf::from("/figures"),
        interval: Duration::ZERO,
        ..Configuration::default()
    };
    assert!(zero_interval.validated().is_err());

    let zero_queue = Configuration {
        figure_library_path: PathBuf::from("/figures"),
        command_queue_capacity: 0,
        ..Configuration::default()
    };
    assert!(zero_queue.validated().is_err());

    assert!(Configuration::default().validated().is_err());
}

#[test]
fn seeded_configs_shuffle_identically() {
    let cfg = Configuration {
        figure_library_path: PathBuf::from("/figures"),
        shuffle_seed: Some(99),
        ..Configuration::default()
    };
    assert_eq!(cfg.shuffle_rng().next_u64(), cfg.shuffle_rng().next_u64());
}

#[test]
fn loads_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.yaml");
    std::fs::write(&path, "figure-library-path: /srv/figures\ninterval: 1m\n").unwrap();

    let cfg = Configuration::from_yaml_file(&path)
        .unwrap()
        .validated()
        .unwrap();
    assert_eq!(cfg.figure_library_path, PathBuf::from("/srv/figures"));
    assert_eq!(cfg.interval, Duration::from_secs(60));
}
