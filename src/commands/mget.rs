use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::{CommandParser, CommandParserError};
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

/// Read every given key in one pass, replying with an array of values in key
/// order. Absent keys appear as the null sentinel.
#[derive(Debug, PartialEq)]
pub struct Mget {
    pub keys: Vec<Bytes>,
}

impl Executable for Mget {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        let values = store
            .mget(&self.keys)
            .into_iter()
            .map(|value| match value {
                Some(value) => Frame::Bulk(value),
                None => Frame::Null,
            })
            .collect();

        Ok(Frame::Array(values))
    }
}

impl TryFrom<&mut CommandParser> for Mget {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let mut keys = vec![];

        loop {
            match parser.next_bytes() {
                Ok(key) => keys.push(key),
                Err(CommandParserError::EndOfStream) if !keys.is_empty() => break,
                Err(CommandParserError::EndOfStream) => {
                    return Err(CommandParserError::wrong_arity("MGET").into())
                }
                Err(err) => return Err(err.into()),
            }
        }

        Ok(Self { keys })
    }
}
