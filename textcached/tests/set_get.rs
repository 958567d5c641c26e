mod common;

use common::{spawn_server, TextcachedServerParamsBuilder, TextClient};

#[test]
fn set_get_round_trip() {
    let server = spawn_server(TextcachedServerParamsBuilder::new());
    let mut client = TextClient::connect(&server.address());

    let reply = client.store("set foo 0 0 5", "hello");
    assert_eq!(reply, "STORED");

    let (flags, byte_count, payload) = client.get("foo").unwrap();
    assert_eq!(flags, 0);
    assert_eq!(byte_count, 5);
    assert_eq!(payload, "hello");
}

#[test]
fn get_on_missing_key_replies_end() {
    let server = spawn_server(TextcachedServerParamsBuilder::new());
    let mut client = TextClient::connect(&server.address());

    assert_eq!(client.get("nothing-here"), None);
}

#[test]
fn flags_round_trip_verbatim() {
    let server = spawn_server(TextcachedServerParamsBuilder::new());
    let mut client = TextClient::connect(&server.address());

    assert_eq!(client.store("set tagged 4294967295 0 3", "abc"), "STORED");
    let (flags, _, _) = client.get("tagged").unwrap();
    assert_eq!(flags, u32::MAX);
}

#[test]
fn payload_with_spaces_round_trips() {
    let server = spawn_server(TextcachedServerParamsBuilder::new());
    let mut client = TextClient::connect(&server.address());

    assert_eq!(client.store("set phrase 0 0 11", "hello world"), "STORED");
    let (_, _, payload) = client.get("phrase").unwrap();
    assert_eq!(payload, "hello world");
}

#[test]
fn set_overwrites_previous_value() {
    let server = spawn_server(TextcachedServerParamsBuilder::new());
    let mut client = TextClient::connect(&server.address());

    client.store("set foo 1 0 3", "old");
    client.store("set foo 2 0 3", "new");

    let (flags, _, payload) = client.get("foo").unwrap();
    assert_eq!(flags, 2);
    assert_eq!(payload, "new");
}

#[test]
fn two_connections_see_the_same_store() {
    let server = spawn_server(TextcachedServerParamsBuilder::new());
    let mut writer = TextClient::connect(&server.address());
    let mut reader = TextClient::connect(&server.address());

    assert_eq!(writer.store("set shared 0 0 4", "data"), "STORED");
    let (_, _, payload) = reader.get("shared").unwrap();
    assert_eq!(payload, "data");
}
