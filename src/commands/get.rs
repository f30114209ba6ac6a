use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::{CommandParser, CommandParserError};
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

/// Get the value of `key`. A key that was never written, or was deleted,
/// yields the absent sentinel, never an empty bulk string.
#[derive(Debug, PartialEq)]
pub struct Get {
    pub key: Bytes,
}

impl Executable for Get {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        match store.get(&self.key) {
            Some(value) => Ok(Frame::Bulk(value)),
            None => Ok(Frame::Null),
        }
    }
}

impl TryFrom<&mut CommandParser> for Get {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = match parser.next_bytes() {
            Ok(key) => key,
            Err(CommandParserError::EndOfStream) => {
                return Err(CommandParserError::wrong_arity("GET").into())
            }
            Err(err) => return Err(err.into()),
        };
        parser.finish("GET")?;

        Ok(Self { key })
    }
}
