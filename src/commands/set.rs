use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::{CommandParser, CommandParserError};
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

/// Set `key` to `value`, replacing any existing value. Acknowledged with the
/// integer 1.
#[derive(Debug, PartialEq)]
pub struct Set {
    pub key: Bytes,
    pub value: Bytes,
}

impl Executable for Set {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        store.set(self.key, self.value);
        Ok(Frame::Integer(1))
    }
}

impl TryFrom<&mut CommandParser> for Set {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let (key, value) = match (parser.next_bytes(), parser.next_bytes()) {
            (Ok(key), Ok(value)) => (key, value),
            (Err(CommandParserError::EndOfStream), _)
            | (_, Err(CommandParserError::EndOfStream)) => {
                return Err(CommandParserError::wrong_arity("SET").into())
            }
            (Err(err), _) | (_, Err(err)) => return Err(err.into()),
        };
        parser.finish("SET")?;

        Ok(Self { key, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::Command;

    #[test]
    fn acknowledges_with_one() {
        let frame = Frame::Array(vec![
            Frame::Bulk(Bytes::from("SET")),
            Frame::Bulk(Bytes::from("key1")),
            Frame::Bulk(Bytes::from("value1")),
        ]);
        let cmd = Command::try_from(frame).unwrap();

        assert_eq!(
            cmd,
            Command::Set(Set {
                key: Bytes::from("key1"),
                value: Bytes::from("value1"),
            })
        );

        let store = Store::new();
        let result = cmd.exec(store.clone()).unwrap();

        assert_eq!(result, Frame::Integer(1));
        assert_eq!(store.get(b"key1"), Some(Bytes::from("value1")));
    }

    #[test]
    fn overwrites_existing_value() {
        let store = Store::new();
        store.set(Bytes::from("key1"), Bytes::from("old"));

        let frame = Frame::Array(vec![
            Frame::Bulk(Bytes::from("SET")),
            Frame::Bulk(Bytes::from("key1")),
            Frame::Bulk(Bytes::from("new")),
        ]);
        let cmd = Command::try_from(frame).unwrap();
        let result = cmd.exec(store.clone()).unwrap();

        assert_eq!(result, Frame::Integer(1));
        assert_eq!(store.get(b"key1"), Some(Bytes::from("new")));
    }

    #[test]
    fn missing_value() {
        let frame = Frame::Array(vec![
            Frame::Bulk(Bytes::from("SET")),
            Frame::Bulk(Bytes::from("key1")),
        ]);
        let err = Command::try_from(frame).err().unwrap();
        let err = err.downcast_ref::<CommandParserError>().unwrap();

        assert_eq!(*err, CommandParserError::wrong_arity("SET"));
    }
}
