// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[tokio::test]
async fn lookups_resolve_registered_slots() {
    let lib = DummyLibraryAdapter::new();
    lib.register_drive("/data/drive0", 0);
    lib.register_medium("vol0", 1);

    assert_eq!(
        lib.drive_lookup("/data/drive0").await.expect("drive"),
        ElementAddress::Drive(0)
    );
    assert_eq!(
        lib.media_lookup("vol0").await.expect("medium"),
        ElementAddress::Slot(1)
    );
}

#[tokio::test]
async fn unknown_lookup_is_medium_not_found() {
    let lib = DummyLibraryAdapter::new();
    assert!(matches!(
        lib.drive_lookup("/nope").await,
        Err(LibraryError::MediumNotFound)
    ));
}

#[tokio::test]
async fn move_is_vacuously_instantaneous() {
    let lib = DummyLibraryAdapter::new();
    lib.media_move(ElementAddress::Slot(1), ElementAddress::Drive(0))
        .await
        .expect("move");
}

#[tokio::test]
async fn scan_lists_every_registered_slot() {
    let lib = DummyLibraryAdapter::new();
    lib.register_drive("/data/drive0", 0);
    lib.register_medium("vol0", 1);
    let entries = lib.scan().await.expect("scan");
    assert_eq!(entries.len(), 2);
}
