use super::*;

const MINIMAL: &str = r#"
[lrs]
lock_file = "/tmp/lrs/lrsd.lock"
mount_prefix = "/mnt/lrs"
families = ["tape", "dir"]
dss_path = "/tmp/lrs/dss.json"

[io_sched.tape]
dispatch_algo = "fair_share"

[io_sched.dir]
dispatch_algo = "fifo"

[drive_type.lto5_drive]
models = ["ULT3580-HH5", "ULTRIUM-HH5"]

[fair_share.tape.LTO5]
min_write = 1
max_write = 4
"#;

fn write_config(dir: &tempfile::TempDir, text: &str) -> std::path::PathBuf {
    let path = dir.path().join("lrs.toml");
    std::fs::write(&path, text).unwrap();
    path
}

#[test]
fn loads_a_minimal_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(&dir, MINIMAL);

    let config = Config::load(&path).unwrap();

    assert_eq!(config.lrs.mount_prefix, "/mnt/lrs");
    assert_eq!(config.families().unwrap(), vec![lrs_core::Family::Tape, lrs_core::Family::Dir]);
    assert_eq!(config.lrs.max_dispatch_delay_ms, 2_000);
}

#[test]
fn rejects_an_unknown_family() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(
        &dir,
        r#"
[lrs]
lock_file = "/tmp/lrs/lrsd.lock"
mount_prefix = "/mnt/lrs"
families = ["floppy"]
dss_path = "/tmp/lrs/dss.json"
"#,
    );

    let config = Config::load(&path).unwrap();

    assert!(config.families().is_err());
}

#[test]
fn resolve_technology_is_case_sensitive() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(&dir, MINIMAL);
    let config = Config::load(&path).unwrap();

    assert_eq!(config.resolve_technology("ULT3580-HH5"), Some("LTO5".to_string()));
    assert_eq!(config.resolve_technology("ult3580-hh5"), None);
    assert_eq!(config.resolve_technology("unknown-model"), None);
}

#[test]
fn dispatcher_for_builds_fair_share_with_the_configured_max() {
    use lrs_engine::dispatch::{DeviceSnapshot, DispatchKind, DispatchRequest};

    let dir = tempfile::tempdir().unwrap();
    let path = write_config(&dir, MINIMAL);
    let config = Config::load(&path).unwrap();
    let dispatcher = config.dispatcher_for(lrs_core::Family::Tape).unwrap();

    let candidates = vec![DeviceSnapshot {
        id: lrs_core::DeviceId::new("drv1"),
        is_idle: true,
        is_online: true,
        is_sched_ready: true,
        technology: Some("LTO5".to_string()),
        loaded_medium: None,
    }];
    let request = DispatchRequest {
        kind: DispatchKind::Write,
        target_medium: None,
        technology: Some("LTO5".to_string()),
    };

    // `[fair_share.tape.LTO5] max_write = 4` admits four in-flight writes
    // and denies the fifth.
    for _ in 0..4 {
        assert!(dispatcher.select(&candidates, &request).is_some());
    }
    assert!(dispatcher.select(&candidates, &request).is_none());
}

#[test]
fn dispatcher_for_falls_back_to_fifo_when_unconfigured() {
    use lrs_engine::dispatch::{DeviceSnapshot, DispatchKind, DispatchRequest};

    let dir = tempfile::tempdir().unwrap();
    let path = write_config(&dir, MINIMAL);
    let config = Config::load(&path).unwrap();
    let dispatcher = config.dispatcher_for(lrs_core::Family::Rados).unwrap();

    let candidates = vec![DeviceSnapshot {
        id: lrs_core::DeviceId::new("drv1"),
        is_idle: true,
        is_online: true,
        is_sched_ready: true,
        technology: None,
        loaded_medium: None,
    }];
    let request = DispatchRequest {
        kind: DispatchKind::Read,
        target_medium: None,
        technology: None,
    };

    // `fifo` has no in-flight accounting: it keeps picking the same device.
    assert!(dispatcher.select(&candidates, &request).is_some());
    assert!(dispatcher.select(&candidates, &request).is_some());
}

#[test]
fn dispatcher_for_rejects_an_unknown_algo() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(
        &dir,
        r#"
[lrs]
lock_file = "/tmp/lrs/lrsd.lock"
mount_prefix = "/mnt/lrs"
families = ["dir"]
dss_path = "/tmp/lrs/dss.json"

[io_sched.dir]
dispatch_algo = "round_robin"
"#,
    );
    let config = Config::load(&path).unwrap();

    assert!(config.dispatcher_for(lrs_core::Family::Dir).is_err());
}
