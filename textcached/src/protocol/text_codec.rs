use std::io;

use crate::protocol::text::{
    parse_header, CommandError, HeaderOutcome, PendingStore, TextCommand, TextResponse,
};
use bytes::{BufMut, Bytes, BytesMut};
use std::io::{Error, ErrorKind};
use tokio_util::codec::{Decoder, Encoder};

/// What the decoder hands the dispatcher for each logical request: either
/// a complete command or the grammar error to report for it.
pub type CommandResult = std::result::Result<TextCommand, CommandError>;

#[derive(Debug, PartialEq)]
enum RequestParserState {
    AwaitingHeader,
    AwaitingPayload(PendingStore),
}

/// Session framer for the text protocol. Lines end in `\n` with an
/// optional preceding `\r`; write verbs span two lines (header, payload).
pub struct MemcacheTextCodec {
    state: RequestParserState,
    max_frame_length: usize,
}

impl MemcacheTextCodec {
    pub fn new(max_frame_length: usize) -> MemcacheTextCodec {
        MemcacheTextCodec {
            state: RequestParserState::AwaitingHeader,
            max_frame_length,
        }
    }

    fn take_line(&self, src: &mut BytesMut) -> Result<Option<Bytes>, io::Error> {
        match src.iter().position(|byte| *byte == b'\n') {
            Some(index) => {
                if index > self.max_frame_length {
                    return Err(Error::new(
                        ErrorKind::InvalidData,
                        "Line exceeds maximum item size",
                    ));
                }
                let mut line = src.split_to(index + 1);
                line.truncate(index);
                if line.last() == Some(&b'\r') {
                    line.truncate(index - 1);
                }
                Ok(Some(line.freeze()))
            }
            None if src.len() > self.max_frame_length => Err(Error::new(
                ErrorKind::InvalidData,
                "Line exceeds maximum item size",
            )),
            None => Ok(None),
        }
    }
}

impl Decoder for MemcacheTextCodec {
    type Item = CommandResult;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<CommandResult>, io::Error> {
        loop {
            let line = match self.take_line(src)? {
                Some(line) => line,
                None => return Ok(None),
            };
            match std::mem::replace(&mut self.state, RequestParserState::AwaitingHeader) {
                RequestParserState::AwaitingHeader => match parse_header(&line) {
                    Ok(HeaderOutcome::Complete(command)) => return Ok(Some(Ok(command))),
                    Ok(HeaderOutcome::NeedsPayload(pending)) => {
                        // header consumed, keep scanning for the payload line
                        self.state = RequestParserState::AwaitingPayload(pending);
                    }
                    Ok(HeaderOutcome::Empty) => {}
                    Err(err) => return Ok(Some(Err(err))),
                },
                RequestParserState::AwaitingPayload(pending) => {
                    return Ok(Some(pending.complete(line)));
                }
            }
        }
    }
}

impl Encoder<TextResponse> for MemcacheTextCodec {
    type Error = io::Error;

    fn encode(&mut self, response: TextResponse, dst: &mut BytesMut) -> Result<(), io::Error> {
        match response {
            TextResponse::Stored => dst.put_slice(b"STORED\r\n"),
            TextResponse::NotStored => dst.put_slice(b"NOT_STORED\r\n"),
            TextResponse::Deleted => dst.put_slice(b"DELETED\r\n"),
            TextResponse::End => dst.put_slice(b"END\r\n"),
            TextResponse::Incremented => dst.put_slice(b"INCREMENT\r\n"),
            TextResponse::Decremented => dst.put_slice(b"DECREMENT\r\n"),
            TextResponse::Value(value) => {
                dst.put_slice(b"VALUE ");
                dst.put_slice(&value.key);
                dst.put_slice(format!(" {} {}\r\n", value.flags, value.byte_count).as_bytes());
                dst.put_slice(&value.payload);
                dst.put_slice(b"\r\n");
            }
            TextResponse::Error(err) => {
                dst.put_slice(b"ERROR: ");
                dst.put_slice(err.reason.as_bytes());
                dst.put_slice(b"\r\n");
            }
        }
        Ok(())
    }
}
