use std::fs;
use std::sync::Arc;
use std::thread;

use sshman_core::{Identity, IdentityStore, StoreError};

mod common;
use common::{identity, init_test_logging, open_temp_store, temp_config};

#[test]
fn init_creates_empty_file_and_reopening_leaves_it_untouched() {
    init_test_logging();
    let (_dir, path) = temp_config();
    assert!(!path.exists());

    let mut store = IdentityStore::open(&path).expect("first open should create the file");
    assert!(path.exists());
    assert!(store.list().unwrap().is_empty());

    let before = fs::read(&path).unwrap();
    let mut reopened = IdentityStore::open(&path).expect("second open should succeed");
    assert!(reopened.list().unwrap().is_empty());
    assert_eq!(fs::read(&path).unwrap(), before, "reopening must not rewrite the file");
}

#[test]
fn malformed_files_are_reported_as_corrupt() {
    init_test_logging();
    let payloads: [&[u8]; 7] = [
        b"{}",
        b"not json at all",
        b"",
        br#"{"identities": null}"#,
        b"[]",
        &[0xff, 0xfe, 0x00, 0x7b],
        b"{\"identities\": [\xff]}",
    ];
    for payload in payloads {
        let (_dir, path) = temp_config();
        fs::write(&path, payload).unwrap();

        let err = IdentityStore::open(&path).expect_err("corrupt file must not open");
        match err {
            StoreError::ConfigCorrupt { path: reported, .. } => assert_eq!(reported, path),
            other => panic!("payload {payload:?} gave {other:?}"),
        }
    }
}

#[test]
fn corruption_after_open_surfaces_on_next_read() {
    let (_dir, mut store) = open_temp_store();
    fs::write(store.path(), "{}").unwrap();
    assert!(matches!(
        store.list().unwrap_err(),
        StoreError::ConfigCorrupt { .. }
    ));
    assert!(matches!(
        store.insert(identity("x")).unwrap_err(),
        StoreError::ConfigCorrupt { .. }
    ));
}

#[test]
fn second_insert_with_same_name_is_rejected() {
    init_test_logging();
    let (_dir, mut store) = open_temp_store();

    store.insert(identity("test")).expect("first insert should succeed");
    let err = store
        .insert(Identity::new("test", "other", "198.51.100.1", 2022, "different"))
        .expect_err("duplicate name must be rejected");
    assert!(matches!(err, StoreError::DuplicateName { ref name } if name == "test"));

    let listed = store.list().unwrap();
    assert_eq!(listed, vec![identity("test")]);
}

#[test]
fn insert_then_list_round_trips_every_field_in_order() {
    let (_dir, mut store) = open_temp_store();
    let first = Identity::new("a", "u1", "1.1.1.1", 22, "d1");
    let second = Identity::new("b", "u2", "2.2.2.2:2200", 0, "");
    let third = Identity::new("c", "", "host.example", 0, "no user");

    store.insert(first.clone()).unwrap();
    store.insert(second.clone()).unwrap();
    store.insert(third.clone()).unwrap();

    assert_eq!(store.list().unwrap(), vec![first, second, third]);
}

#[test]
fn delete_removes_only_the_named_entry() {
    let (_dir, mut store) = open_temp_store();
    store.insert(Identity::new("a", "u1", "1.1.1.1", 22, "d1")).unwrap();
    store.insert(identity("b")).unwrap();
    store.insert(identity("c")).unwrap();

    store.delete("a").expect("first delete should succeed");
    let err = store.delete("a").expect_err("second delete must fail");
    assert!(matches!(err, StoreError::NotFound { ref name } if name == "a"));

    assert_eq!(store.list().unwrap(), vec![identity("b"), identity("c")]);
}

#[test]
fn lookup_of_unknown_name_is_not_found() {
    let (_dir, mut store) = open_temp_store();
    assert!(matches!(
        store.lookup("missing").unwrap_err(),
        StoreError::NotFound { .. }
    ));

    store.insert(identity("present")).unwrap();
    assert!(matches!(
        store.lookup("missing").unwrap_err(),
        StoreError::NotFound { ref name } if name == "missing"
    ));
    assert!(matches!(
        store.lookup("Present").unwrap_err(),
        StoreError::NotFound { .. }
    ));
    assert_eq!(store.lookup("present").unwrap(), identity("present"));
}

#[test]
fn writes_are_visible_through_a_fresh_handle() {
    let (_dir, path) = temp_config();
    {
        let mut writer = IdentityStore::open(&path).unwrap();
        writer.insert(identity("persisted")).unwrap();
        writer.insert(identity("removed")).unwrap();
        writer.delete("removed").unwrap();
    }

    let mut reader = IdentityStore::open(&path).unwrap();
    assert_eq!(reader.list().unwrap(), vec![identity("persisted")]);
    assert_eq!(reader.lookup("persisted").unwrap(), identity("persisted"));
}

#[cfg(unix)]
#[test]
fn concurrent_handles_do_not_lose_inserts() {
    init_test_logging();
    let (_dir, path) = temp_config();
    IdentityStore::open(&path).unwrap();
    let path = Arc::new(path);

    let writers: Vec<_> = (0..8)
        .map(|worker| {
            let path = Arc::clone(&path);
            thread::spawn(move || {
                let mut store = IdentityStore::open(path.as_path()).unwrap();
                for n in 0..5 {
                    store.insert(identity(&format!("w{worker}-{n}"))).unwrap();
                }
            })
        })
        .collect();
    for writer in writers {
        writer.join().expect("writer thread panicked");
    }

    let mut store = IdentityStore::open(path.as_path()).unwrap();
    let names: Vec<String> = store.list().unwrap().into_iter().map(|i| i.name).collect();
    assert_eq!(names.len(), 40, "every insert must survive: {names:?}");
    for worker in 0..8 {
        let own: Vec<&String> = names
            .iter()
            .filter(|n| n.starts_with(&format!("w{worker}-")))
            .collect();
        let expected: Vec<String> = (0..5).map(|n| format!("w{worker}-{n}")).collect();
        assert_eq!(own, expected.iter().collect::<Vec<_>>(), "per-writer order is kept");
    }
}
