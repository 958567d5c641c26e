use crate::mock::mock_server::{
    create_text_handler, create_text_handler_with_capacity, HandlerWithMocks,
};
use crate::mock::mock_server::SetableTimer;
use crate::protocol::text::{
    CapacityRequest, CommandError, DeleteRequest, GetRequest, StoreRequest, TextCommand,
    TextResponse, Verb,
};
use bytes::Bytes;

fn store_request(verb: Verb, key: &str, payload: &str) -> StoreRequest {
    StoreRequest {
        verb,
        key: Bytes::from(key.to_string()),
        flags: 0,
        exptime: 0,
        byte_count: payload.len() as u32,
        noreply: false,
        payload: Bytes::from(payload.to_string()),
    }
}

fn set_command(key: &str, payload: &str) -> TextCommand {
    TextCommand::Set(store_request(Verb::Set, key, payload))
}

fn get_command(key: &str) -> TextCommand {
    TextCommand::Get(GetRequest {
        key: Bytes::from(key.to_string()),
    })
}

fn expect_value(response: Option<TextResponse>) -> (u32, u32, Bytes) {
    match response {
        Some(TextResponse::Value(value)) => (value.flags, value.byte_count, value.payload),
        other => panic!("expected a value block, got {:?}", other),
    }
}

#[test]
fn set_then_get_round_trips() {
    let server = create_text_handler();
    let mut request = store_request(Verb::Set, "k", "hello");
    request.flags = 7;
    let response = server.handler.handle_command(Ok(TextCommand::Set(request)));
    assert_eq!(response, Some(TextResponse::Stored));

    let (flags, byte_count, payload) = expect_value(server.handler.handle_command(Ok(get_command("k"))));
    assert_eq!(flags, 7);
    assert_eq!(byte_count, 5);
    assert_eq!(payload, Bytes::from("hello"));
}

#[test]
fn get_on_a_missing_key_replies_end() {
    let server = create_text_handler();
    let response = server.handler.handle_command(Ok(get_command("missing")));
    assert_eq!(response, Some(TextResponse::End));
}

#[test]
fn noreply_mutation_is_silent_but_applied() {
    let server = create_text_handler();
    let mut request = store_request(Verb::Set, "k", "hello");
    request.noreply = true;
    let response = server.handler.handle_command(Ok(TextCommand::Set(request)));
    assert_eq!(response, None);

    let (_, _, payload) = expect_value(server.handler.handle_command(Ok(get_command("k"))));
    assert_eq!(payload, Bytes::from("hello"));
}

#[test]
fn add_on_an_existing_key_is_not_stored_even_with_noreply() {
    let server = create_text_handler();
    server.handler.handle_command(Ok(set_command("k", "old")));

    let mut request = store_request(Verb::Add, "k", "new");
    request.noreply = true;
    let response = server.handler.handle_command(Ok(TextCommand::Add(request)));
    // failure outcomes are reported regardless of noreply
    assert_eq!(response, Some(TextResponse::NotStored));
}

#[test]
fn add_on_an_absent_key_behaves_like_set() {
    let server = create_text_handler();
    let response = server
        .handler
        .handle_command(Ok(TextCommand::Add(store_request(Verb::Add, "k", "data"))));
    assert_eq!(response, Some(TextResponse::Stored));
}

#[test]
fn replace_on_an_absent_key_is_not_stored() {
    let server = create_text_handler();
    let response = server.handler.handle_command(Ok(TextCommand::Replace(
        store_request(Verb::Replace, "k", "data"),
    )));
    assert_eq!(response, Some(TextResponse::NotStored));
}

#[test]
fn append_concatenates_without_separator() {
    let server = create_text_handler();
    server.handler.handle_command(Ok(set_command("k", "Foo")));
    let response = server.handler.handle_command(Ok(TextCommand::Append(
        store_request(Verb::Append, "k", "bar"),
    )));
    assert_eq!(response, Some(TextResponse::Stored));

    let (_, byte_count, payload) = expect_value(server.handler.handle_command(Ok(get_command("k"))));
    assert_eq!(payload, Bytes::from("Foobar"));
    // the declared byte count of the original entry is preserved
    assert_eq!(byte_count, 3);
}

#[test]
fn prepend_concatenates_without_separator() {
    let server = create_text_handler();
    server.handler.handle_command(Ok(set_command("k", "bar")));
    let response = server.handler.handle_command(Ok(TextCommand::Prepend(
        store_request(Verb::Prepend, "k", "Foo"),
    )));
    assert_eq!(response, Some(TextResponse::Stored));

    let (_, _, payload) = expect_value(server.handler.handle_command(Ok(get_command("k"))));
    assert_eq!(payload, Bytes::from("Foobar"));
}

#[test]
fn append_on_an_absent_key_is_not_stored() {
    let server = create_text_handler();
    let response = server.handler.handle_command(Ok(TextCommand::Append(
        store_request(Verb::Append, "missing", "bar"),
    )));
    assert_eq!(response, Some(TextResponse::NotStored));
}

#[test]
fn delete_replies_deleted_then_end() {
    let server = create_text_handler();
    server.handler.handle_command(Ok(set_command("k", "data")));

    let delete = TextCommand::Delete(DeleteRequest {
        key: Bytes::from("k"),
    });
    assert_eq!(
        server.handler.handle_command(Ok(delete.clone())),
        Some(TextResponse::Deleted)
    );
    assert_eq!(
        server.handler.handle_command(Ok(delete)),
        Some(TextResponse::End)
    );
    assert_eq!(
        server.handler.handle_command(Ok(get_command("k"))),
        Some(TextResponse::End)
    );
}

#[test]
fn expired_entry_reads_as_end() {
    let server = create_text_handler();
    let mut request = store_request(Verb::Set, "k", "data");
    request.exptime = 5;
    server.handler.handle_command(Ok(TextCommand::Set(request)));

    server.timer.add_seconds(6);
    assert_eq!(
        server.handler.handle_command(Ok(get_command("k"))),
        Some(TextResponse::End)
    );
}

#[test]
fn negative_exptime_reads_as_end_immediately() {
    let server = create_text_handler();
    let mut request = store_request(Verb::Set, "k", "data");
    request.exptime = -1;
    assert_eq!(
        server.handler.handle_command(Ok(TextCommand::Set(request))),
        Some(TextResponse::Stored)
    );
    assert_eq!(
        server.handler.handle_command(Ok(get_command("k"))),
        Some(TextResponse::End)
    );
}

#[test]
fn capacity_overflow_reports_the_distinguished_error_and_clears() {
    let server = create_text_handler_with_capacity(2);
    server.handler.handle_command(Ok(set_command("a", "1")));
    server.handler.handle_command(Ok(set_command("b", "2")));

    let response = server.handler.handle_command(Ok(set_command("c", "3")));
    match response {
        Some(TextResponse::Error(err)) => {
            assert_eq!(err.reason, "store is at maximum capacity");
        }
        other => panic!("expected the capacity error, got {:?}", other),
    }

    assert_eq!(
        server.handler.handle_command(Ok(get_command("a"))),
        Some(TextResponse::End)
    );
    assert_eq!(
        server.handler.handle_command(Ok(set_command("c", "3"))),
        Some(TextResponse::Stored)
    );
}

#[test]
fn increment_and_decrement_acknowledge() {
    let server = create_text_handler();
    assert_eq!(
        server
            .handler
            .handle_command(Ok(TextCommand::Increment(CapacityRequest { delta: 5 }))),
        Some(TextResponse::Incremented)
    );
    assert_eq!(
        server
            .handler
            .handle_command(Ok(TextCommand::Decrement(CapacityRequest { delta: 3 }))),
        Some(TextResponse::Decremented)
    );
}

#[test]
fn increment_raises_the_ceiling_for_real() {
    let server = create_text_handler_with_capacity(1);
    server.handler.handle_command(Ok(set_command("a", "1")));
    server
        .handler
        .handle_command(Ok(TextCommand::Increment(CapacityRequest { delta: 1 })));
    assert_eq!(
        server.handler.handle_command(Ok(set_command("b", "2"))),
        Some(TextResponse::Stored)
    );
}

#[test]
fn grammar_errors_are_rendered_as_error_replies() {
    let server = create_text_handler();
    let response = server.handler.handle_command(Err(CommandError::BadFlags));
    match response {
        Some(TextResponse::Error(err)) => {
            assert_eq!(err.reason, "flags field is missing or not a valid number");
        }
        other => panic!("expected an error reply, got {:?}", other),
    }
}

#[test]
fn successful_mutations_are_journaled() {
    let HandlerWithMocks {
        handler,
        mut journal_receiver,
        ..
    } = create_text_handler();

    handler.handle_command(Ok(set_command("k", "hello")));
    let event = journal_receiver.try_recv().unwrap();
    assert_eq!(event.connection, 1);
    assert!(event.text.contains("set k"));
    assert!(event.text.ends_with("-> STORED"));
}

#[test]
fn reads_and_failed_mutations_are_not_journaled() {
    let HandlerWithMocks {
        handler,
        mut journal_receiver,
        ..
    } = create_text_handler();

    handler.handle_command(Ok(get_command("missing")));
    handler.handle_command(Ok(TextCommand::Replace(store_request(
        Verb::Replace,
        "missing",
        "x",
    ))));
    handler.handle_command(Err(CommandError::BadDelta));
    assert!(journal_receiver.try_recv().is_err());
}

#[test]
fn delete_success_is_journaled() {
    let HandlerWithMocks {
        handler,
        mut journal_receiver,
        ..
    } = create_text_handler();

    handler.handle_command(Ok(set_command("k", "v")));
    handler.handle_command(Ok(TextCommand::Delete(DeleteRequest {
        key: Bytes::from("k"),
    })));

    let first = journal_receiver.try_recv().unwrap();
    assert!(first.text.starts_with("set"));
    let second = journal_receiver.try_recv().unwrap();
    assert_eq!(second.text, "delete k -> DELETED");
}
