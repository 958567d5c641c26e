use super::test_utils::*;

#[test]
fn delete_should_remove_the_entry() {
    let server = create_storage();
    let key = Bytes::from("key");
    server
        .store
        .set(key.clone(), from_string("data"), 0, 0, 4)
        .unwrap();

    let deleted = server.store.delete(&key);
    assert!(deleted.is_ok());

    match server.store.get(&key) {
        Ok(_) => unreachable!(),
        Err(err) => assert_eq!(err, CacheError::NotFound),
    }
}

#[test]
fn delete_should_fail_when_key_is_absent() {
    let server = create_storage();
    let result = server.store.delete(&Bytes::from("missing"));
    match result {
        Ok(_) => unreachable!(),
        Err(err) => assert_eq!(err, CacheError::NotFound),
    }
}

#[test]
fn delete_is_idempotent() {
    let server = create_storage();
    let key = Bytes::from("key");
    server
        .store
        .set(key.clone(), from_string("data"), 0, 0, 4)
        .unwrap();

    assert!(server.store.delete(&key).is_ok());
    assert_eq!(server.store.delete(&key), Err(CacheError::NotFound));
    assert_eq!(server.store.delete(&key), Err(CacheError::NotFound));
}

#[test]
fn delete_should_not_find_expired_entry() {
    let server = create_storage();
    let key = Bytes::from("key");
    server
        .store
        .set(key.clone(), from_string("stale"), 0, 1, 5)
        .unwrap();
    server.timer.add_seconds(2);

    let result = server.store.delete(&key);
    match result {
        Ok(_) => unreachable!(),
        Err(err) => assert_eq!(err, CacheError::NotFound),
    }
}
