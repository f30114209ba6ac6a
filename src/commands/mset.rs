use bytes::Bytes;
use itertools::Itertools;

use crate::commands::executable::Executable;
use crate::commands::{CommandParser, CommandParserError};
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

/// Write several key/value pairs in one pass, replying with how many pairs
/// were written. The argument list must pair up evenly; an odd argument count
/// is rejected before anything is written.
#[derive(Debug, PartialEq)]
pub struct Mset {
    pub pairs: Vec<(Bytes, Bytes)>,
}

impl Executable for Mset {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        let written = store.mset(self.pairs);
        Ok(Frame::Integer(written as i64))
    }
}

impl TryFrom<&mut CommandParser> for Mset {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let mut args = vec![];

        loop {
            match parser.next_bytes() {
                Ok(arg) => args.push(arg),
                Err(CommandParserError::EndOfStream) => break,
                Err(err) => return Err(err.into()),
            }
        }

        if args.is_empty() || args.len() % 2 != 0 {
            return Err(CommandParserError::wrong_arity("MSET").into());
        }

        let pairs = args.into_iter().tuples().collect();

        Ok(Self { pairs })
    }
}
