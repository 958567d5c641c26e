use bytes::Bytes;
use serde_derive::{Deserialize, Serialize};
use std::fmt;

/// Verbs understood by the text protocol.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verb {
    Set,
    Add,
    Replace,
    Append,
    Prepend,
    Get,
    Delete,
    Increment,
    Decrement,
}

impl Verb {
    pub fn from_token(token: &[u8]) -> Option<Verb> {
        match token {
            b"set" => Some(Verb::Set),
            b"add" => Some(Verb::Add),
            b"replace" => Some(Verb::Replace),
            b"append" => Some(Verb::Append),
            b"prepend" => Some(Verb::Prepend),
            b"get" => Some(Verb::Get),
            b"delete" => Some(Verb::Delete),
            b"increment" => Some(Verb::Increment),
            b"decrement" => Some(Verb::Decrement),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::Set => "set",
            Verb::Add => "add",
            Verb::Replace => "replace",
            Verb::Append => "append",
            Verb::Prepend => "prepend",
            Verb::Get => "get",
            Verb::Delete => "delete",
            Verb::Increment => "increment",
            Verb::Decrement => "decrement",
        }
    }

    /// Write verbs carry their payload on the line after the header.
    pub fn needs_payload(&self) -> bool {
        matches!(
            self,
            Verb::Set | Verb::Add | Verb::Replace | Verb::Append | Verb::Prepend
        )
    }
}

/// Grammar-level failures. Each aborts only the current command; the
/// connection stays open and the client sees `ERROR: <reason>`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommandError {
    UnknownCommand,
    WrongArgumentCount(Verb),
    BadFlags,
    BadExptime,
    BadByteCount,
    BadDelta,
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::UnknownCommand => write!(f, "unknown command"),
            CommandError::WrongArgumentCount(verb) => {
                write!(f, "wrong number of arguments for '{}'", verb.as_str())
            }
            CommandError::BadFlags => {
                write!(f, "flags field is missing or not a valid number")
            }
            CommandError::BadExptime => {
                write!(f, "exptime field is missing or not a valid number")
            }
            CommandError::BadByteCount => {
                write!(f, "byte count field is missing or not a valid number")
            }
            CommandError::BadDelta => {
                write!(f, "delta field is missing or not a valid number")
            }
        }
    }
}

/// Write-verb request: validated header fields plus the payload line that
/// followed them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StoreRequest {
    pub verb: Verb,
    pub key: Bytes,
    pub flags: u32,
    pub exptime: i64,
    pub byte_count: u32,
    pub noreply: bool,
    pub payload: Bytes,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GetRequest {
    pub key: Bytes,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DeleteRequest {
    pub key: Bytes,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CapacityRequest {
    pub delta: u64,
}

/// Client request
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum TextCommand {
    Set(StoreRequest),
    Add(StoreRequest),
    Replace(StoreRequest),
    Append(StoreRequest),
    Prepend(StoreRequest),
    Get(GetRequest),
    Delete(DeleteRequest),
    Increment(CapacityRequest),
    Decrement(CapacityRequest),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ValueResponse {
    pub key: Bytes,
    pub flags: u32,
    pub byte_count: u32,
    pub payload: Bytes,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub reason: String,
}

/// Server response
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum TextResponse {
    Stored,
    NotStored,
    Value(ValueResponse),
    End,
    Deleted,
    Incremented,
    Decremented,
    Error(ErrorResponse),
}

impl TextResponse {
    pub fn error(reason: impl Into<String>) -> TextResponse {
        TextResponse::Error(ErrorResponse {
            reason: reason.into(),
        })
    }
}

/// A write command whose header has been read but whose payload line has
/// not arrived yet. Numeric fields stay raw until the payload is in, so a
/// field error can never desynchronize the framer.
#[derive(Clone, Debug, PartialEq)]
pub struct PendingStore {
    verb: Verb,
    key: Bytes,
    flags: Bytes,
    exptime: Bytes,
    byte_count: Bytes,
    noreply: bool,
}

impl PendingStore {
    /// Attaches the payload line and finishes field validation.
    pub fn complete(self, payload: Bytes) -> Result<TextCommand, CommandError> {
        let flags = parse_u32(&self.flags).ok_or(CommandError::BadFlags)?;
        let exptime = parse_i64(&self.exptime).ok_or(CommandError::BadExptime)?;
        let byte_count = parse_u32(&self.byte_count).ok_or(CommandError::BadByteCount)?;
        let request = StoreRequest {
            verb: self.verb,
            key: self.key,
            flags,
            exptime,
            byte_count,
            noreply: self.noreply,
            payload,
        };
        Ok(match self.verb {
            Verb::Set => TextCommand::Set(request),
            Verb::Add => TextCommand::Add(request),
            Verb::Replace => TextCommand::Replace(request),
            Verb::Append => TextCommand::Append(request),
            Verb::Prepend => TextCommand::Prepend(request),
            _ => unreachable!("only payload verbs are held as pending"),
        })
    }
}

/// Outcome of parsing one line in header position.
#[derive(Debug, PartialEq)]
pub enum HeaderOutcome {
    /// header-only verb, ready for dispatch
    Complete(TextCommand),
    /// write verb: the next line is this command's payload
    NeedsPayload(PendingStore),
    /// blank line, nothing to do
    Empty,
}

pub fn parse_header(line: &[u8]) -> Result<HeaderOutcome, CommandError> {
    let tokens = tokenize(line);
    let verb_token = match tokens.first() {
        Some(token) => *token,
        None => return Ok(HeaderOutcome::Empty),
    };
    let verb = Verb::from_token(verb_token).ok_or(CommandError::UnknownCommand)?;

    match verb {
        Verb::Get => {
            expect_arity(verb, &tokens, 2)?;
            Ok(HeaderOutcome::Complete(TextCommand::Get(GetRequest {
                key: copy_token(tokens[1]),
            })))
        }
        Verb::Delete => {
            expect_arity(verb, &tokens, 2)?;
            Ok(HeaderOutcome::Complete(TextCommand::Delete(
                DeleteRequest {
                    key: copy_token(tokens[1]),
                },
            )))
        }
        Verb::Increment | Verb::Decrement => {
            expect_arity(verb, &tokens, 2)?;
            let delta = parse_u64(tokens[1]).ok_or(CommandError::BadDelta)?;
            let request = CapacityRequest { delta };
            Ok(HeaderOutcome::Complete(match verb {
                Verb::Increment => TextCommand::Increment(request),
                _ => TextCommand::Decrement(request),
            }))
        }
        _ => {
            debug_assert!(verb.needs_payload());
            // write verbs: key flags exptime bytes, optional trailing noreply
            if tokens.len() != 5 && tokens.len() != 6 {
                return Err(CommandError::WrongArgumentCount(verb));
            }
            let noreply = if tokens.len() == 6 {
                if tokens[5] != b"noreply" {
                    return Err(CommandError::WrongArgumentCount(verb));
                }
                true
            } else {
                false
            };
            Ok(HeaderOutcome::NeedsPayload(PendingStore {
                verb,
                key: copy_token(tokens[1]),
                flags: copy_token(tokens[2]),
                exptime: copy_token(tokens[3]),
                byte_count: copy_token(tokens[4]),
                noreply,
            }))
        }
    }
}

fn expect_arity(verb: Verb, tokens: &[&[u8]], arity: usize) -> Result<(), CommandError> {
    if tokens.len() != arity {
        return Err(CommandError::WrongArgumentCount(verb));
    }
    Ok(())
}

fn tokenize(line: &[u8]) -> Vec<&[u8]> {
    line.split(|byte| *byte == b' ' || *byte == b'\t')
        .filter(|token| !token.is_empty())
        .collect()
}

fn copy_token(token: &[u8]) -> Bytes {
    Bytes::copy_from_slice(token)
}

fn parse_u32(token: &[u8]) -> Option<u32> {
    std::str::from_utf8(token).ok()?.parse().ok()
}

fn parse_u64(token: &[u8]) -> Option<u64> {
    std::str::from_utf8(token).ok()?.parse().ok()
}

fn parse_i64(token: &[u8]) -> Option<i64> {
    std::str::from_utf8(token).ok()?.parse().ok()
}
