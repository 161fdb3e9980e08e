//! Daemon startup/shutdown specs (`spec.md` §4.4, §4.5, §6 exit codes).

use crate::prelude::*;

#[test]
fn responds_to_ping_once_lock_recovery_completes() {
    let daemon = Daemon::start_with_dir_drive();
    daemon.admin().args(&["ping"]).passes().stdout_has("Pong");
}

#[test]
fn refuses_a_second_instance_with_eexist() {
    let daemon = Daemon::start_with_dir_drive();
    let output = daemon.second_instance_fails_to_start();
    assert!(!output.status.success());
    assert_eq!(output.status.code(), Some(libc::EEXIST));
}

#[test]
fn refuses_to_start_with_no_devices_with_enxio() {
    let output = lrsd_fails_to_start_without_devices();
    assert!(!output.status.success());
    assert_eq!(output.status.code(), Some(libc::ENXIO));
}
