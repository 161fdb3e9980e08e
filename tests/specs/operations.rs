//! Allocation/release/format specs (`spec.md` §4.2, §4.3, §4.6).

use crate::prelude::*;

#[test]
fn registers_a_medium_and_completes_a_write_then_release_cycle() {
    let daemon = Daemon::start_with_dir_drive();

    daemon
        .admin()
        .args(&[
            "medium", "register",
            "--family", "dir",
            "--id", "vol0",
            "--model", "dirmodel",
            "--fs-type", "posix",
        ])
        .passes();

    let alloc = daemon
        .admin()
        .args(&["write-alloc", "--family", "dir", "--medium-id", "vol0"])
        .passes();
    alloc.stdout_has("vol0");

    daemon
        .admin()
        .args(&[
            "release",
            "--family", "dir",
            "--device-id", "drive0",
            "--medium-id", "vol0",
            "--written-bytes", "4096",
        ])
        .passes();
}

#[test]
fn read_alloc_fails_fast_when_the_medium_does_not_exist() {
    let daemon = Daemon::start_with_dir_drive();

    let output = daemon
        .admin()
        .args(&["read-alloc", "--family", "dir", "--medium-id", "missing"])
        .fails();
    assert_eq!(output.code(), Some(libc::ENODEV));
}

#[test]
fn formats_a_registered_medium() {
    let daemon = Daemon::start_with_dir_drive();

    daemon
        .admin()
        .args(&[
            "medium", "register",
            "--family", "dir",
            "--id", "vol1",
            "--model", "dirmodel",
            "--fs-type", "posix",
        ])
        .passes();

    daemon
        .admin()
        .args(&[
            "format",
            "--family", "dir",
            "--medium-id", "vol1",
            "--fs-type", "posix",
            "--unlock",
        ])
        .passes();
}

#[test]
fn format_fails_fast_with_enodev_for_an_unregistered_medium() {
    let daemon = Daemon::start_with_dir_drive();

    let output = daemon
        .admin()
        .args(&[
            "format",
            "--family", "dir",
            "--medium-id", "does-not-exist",
            "--fs-type", "posix",
            "--unlock",
        ])
        .fails();
    assert_eq!(output.code(), Some(libc::ENODEV));
}

#[test]
fn adds_a_second_device_at_runtime_via_notify() {
    let daemon = Daemon::start_with_dir_drive();

    let drive1 = daemon.path().join("drives/drive1");
    std::fs::create_dir_all(&drive1).unwrap();
    std::fs::create_dir_all(daemon.path().join("mnt/drive1")).unwrap();

    daemon
        .admin()
        .args(&[
            "device", "add",
            "--family", "dir",
            "--id", "drive1",
            "--model", "dirmodel",
            "--path", drive1.to_str().unwrap(),
        ])
        .passes();
}
