pub mod delete;
pub mod executable;
pub mod flush;
pub mod get;
pub mod mget;
pub mod mset;
pub mod set;

use bytes::Bytes;
use std::{str, vec};
use thiserror::Error as ThisError;

use crate::commands::executable::Executable;
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

use delete::Delete;
use flush::Flush;
use get::Get;
use mget::Mget;
use mset::Mset;
use set::Set;

/// The command registry: every command the server answers, constructed at
/// parse time and never mutated while serving requests. Adding a command
/// means adding a variant here plus its module.
#[derive(Debug, PartialEq)]
pub enum Command {
    Get(Get),
    Set(Set),
    Delete(Delete),
    Flush(Flush),
    Mget(Mget),
    Mset(Mset),
}

impl Executable for Command {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        match self {
            Command::Get(cmd) => cmd.exec(store),
            Command::Set(cmd) => cmd.exec(store),
            Command::Delete(cmd) => cmd.exec(store),
            Command::Flush(cmd) => cmd.exec(store),
            Command::Mget(cmd) => cmd.exec(store),
            Command::Mset(cmd) => cmd.exec(store),
        }
    }
}

impl TryFrom<Frame> for Command {
    type Error = Error;

    fn try_from(frame: Frame) -> Result<Self, Self::Error> {
        // Fully framed requests arrive as an array of tokens. Anything
        // text-like is treated as one inline command line and split on
        // whitespace, so `GET foo` works alongside `*2\r\n$3\r\nGET\r\n...`.
        let tokens = match frame {
            Frame::Array(frames) => frames,
            Frame::Simple(line) | Frame::Text(line) => inline_tokens(&line),
            Frame::Bulk(bytes) => {
                let line = str::from_utf8(&bytes).map_err(CommandParserError::InvalidUTF8String)?;
                inline_tokens(line)
            }
            frame => {
                return Err(CommandParserError::InvalidFrame {
                    expected: "array or text command line".to_string(),
                    actual: frame,
                }
                .into())
            }
        };

        if tokens.is_empty() {
            return Err(CommandParserError::MissingCommand.into());
        }

        let parser = &mut CommandParser {
            parts: tokens.into_iter(),
        };

        let command_name = parser.parse_command_name()?;

        match &command_name[..] {
            "GET" => Get::try_from(parser).map(Command::Get),
            "SET" => Set::try_from(parser).map(Command::Set),
            "DELETE" => Delete::try_from(parser).map(Command::Delete),
            "FLUSH" => Flush::try_from(parser).map(Command::Flush),
            "MGET" => Mget::try_from(parser).map(Command::Mget),
            "MSET" => Mset::try_from(parser).map(Command::Mset),
            _ => Err(CommandParserError::UnknownCommand {
                command: command_name,
            }
            .into()),
        }
    }
}

fn inline_tokens(line: &str) -> Vec<Frame> {
    line.split_whitespace()
        .map(|token| Frame::Bulk(Bytes::copy_from_slice(token.as_bytes())))
        .collect()
}

pub(crate) struct CommandParser {
    parts: vec::IntoIter<Frame>,
}

impl CommandParser {
    fn parse_command_name(&mut self) -> Result<String, CommandParserError> {
        let command_name = self.parts.next().ok_or(CommandParserError::EndOfStream)?;

        match command_name {
            // Command names are case-insensitive; normalize to upper case.
            Frame::Simple(s) | Frame::Text(s) => Ok(s.to_uppercase()),
            Frame::Bulk(bytes) => str::from_utf8(&bytes[..])
                .map(|s| s.to_uppercase())
                .map_err(CommandParserError::InvalidUTF8String),
            frame => Err(CommandParserError::InvalidFrame {
                expected: "simple or bulk string".to_string(),
                actual: frame,
            }),
        }
    }

    pub(crate) fn next_bytes(&mut self) -> Result<Bytes, CommandParserError> {
        let frame = self.parts.next().ok_or(CommandParserError::EndOfStream)?;

        match frame {
            Frame::Simple(s) | Frame::Text(s) => Ok(Bytes::from(s)),
            Frame::Bulk(bytes) => Ok(bytes),
            frame => Err(CommandParserError::InvalidFrame {
                expected: "simple or bulk string".to_string(),
                actual: frame,
            }),
        }
    }

    /// Rejects trailing arguments once a command has consumed its arity.
    pub(crate) fn finish(&mut self, command: &str) -> Result<(), CommandParserError> {
        match self.parts.next() {
            Some(_) => Err(CommandParserError::wrong_arity(command)),
            None => Ok(()),
        }
    }
}

#[derive(Debug, ThisError, PartialEq)]
pub(crate) enum CommandParserError {
    #[error("ERR invalid request; expected {expected}, got {actual}")]
    InvalidFrame { expected: String, actual: Frame },
    #[error("ERR unrecognized command: {command}")]
    UnknownCommand { command: String },
    #[error("ERR missing command")]
    MissingCommand,
    #[error("ERR wrong number of arguments for {command}")]
    WrongNumberOfArguments { command: String },
    #[error("ERR invalid UTF-8 string")]
    InvalidUTF8String(#[from] str::Utf8Error),
    #[error("ERR attempting to extract a value failed due to the request being fully consumed")]
    EndOfStream,
}

impl CommandParserError {
    pub(crate) fn wrong_arity(command: &str) -> CommandParserError {
        CommandParserError::WrongNumberOfArguments {
            command: command.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_get_command_with_bulk_strings() {
        let frame = Frame::Array(vec![
            Frame::Bulk(Bytes::from("GET")),
            Frame::Bulk(Bytes::from("foo")),
        ]);

        let command = Command::try_from(frame).unwrap();

        assert_eq!(
            command,
            Command::Get(Get {
                key: Bytes::from("foo")
            })
        );
    }

    #[test]
    fn command_name_is_case_insensitive() {
        let frame = Frame::Array(vec![
            Frame::Bulk(Bytes::from("get")),
            Frame::Bulk(Bytes::from("foo")),
        ]);

        let command = Command::try_from(frame).unwrap();

        assert_eq!(
            command,
            Command::Get(Get {
                key: Bytes::from("foo")
            })
        );
    }

    #[test]
    fn parse_inline_command_line() {
        let frame = Frame::Simple("SET foo bar".to_string());

        let command = Command::try_from(frame).unwrap();

        assert_eq!(
            command,
            Command::Set(Set {
                key: Bytes::from("foo"),
                value: Bytes::from("bar"),
            })
        );
    }

    #[test]
    fn parse_inline_command_from_bulk_frame() {
        let frame = Frame::Bulk(Bytes::from("DELETE foo"));

        let command = Command::try_from(frame).unwrap();

        assert_eq!(
            command,
            Command::Delete(Delete {
                key: Bytes::from("foo")
            })
        );
    }

    #[test]
    fn unknown_command() {
        let frame = Frame::Array(vec![
            Frame::Bulk(Bytes::from("NOPE")),
            Frame::Bulk(Bytes::from("foo")),
        ]);

        let err = Command::try_from(frame).err().unwrap();
        let err = err.downcast_ref::<CommandParserError>().unwrap();

        assert_eq!(
            *err,
            CommandParserError::UnknownCommand {
                command: "NOPE".to_string()
            }
        );
    }

    #[test]
    fn empty_request() {
        let frame = Frame::Array(vec![]);

        let err = Command::try_from(frame).err().unwrap();
        let err = err.downcast_ref::<CommandParserError>().unwrap();

        assert_eq!(*err, CommandParserError::MissingCommand);
    }

    #[test]
    fn blank_inline_line() {
        let frame = Frame::Simple("   ".to_string());

        let err = Command::try_from(frame).err().unwrap();
        let err = err.downcast_ref::<CommandParserError>().unwrap();

        assert_eq!(*err, CommandParserError::MissingCommand);
    }

    #[test]
    fn non_command_frame() {
        let frame = Frame::Integer(42);

        let err = Command::try_from(frame).err().unwrap();
        let err = err.downcast_ref::<CommandParserError>().unwrap();

        assert_eq!(
            *err,
            CommandParserError::InvalidFrame {
                expected: "array or text command line".to_string(),
                actual: Frame::Integer(42)
            }
        );
    }
}
