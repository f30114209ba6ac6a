use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::{CommandParser, CommandParserError};
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

/// Remove `key` if present. Replies 1 when an entry was removed, 0 otherwise.
#[derive(Debug, PartialEq)]
pub struct Delete {
    pub key: Bytes,
}

impl Executable for Delete {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        let removed = store.delete(&self.key);
        Ok(Frame::Integer(i64::from(removed)))
    }
}

impl TryFrom<&mut CommandParser> for Delete {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = match parser.next_bytes() {
            Ok(key) => key,
            Err(CommandParserError::EndOfStream) => {
                return Err(CommandParserError::wrong_arity("DELETE").into())
            }
            Err(err) => return Err(err.into()),
        };
        parser.finish("DELETE")?;

        Ok(Self { key })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::Command;

    #[test]
    fn removes_existing_key() {
        let store = Store::new();
        store.set(Bytes::from("key1"), Bytes::from("1"));

        let frame = Frame::Array(vec![
            Frame::Bulk(Bytes::from("DELETE")),
            Frame::Bulk(Bytes::from("key1")),
        ]);
        let cmd = Command::try_from(frame).unwrap();
        let result = cmd.exec(store.clone()).unwrap();

        assert_eq!(result, Frame::Integer(1));
        assert_eq!(store.get(b"key1"), None);
    }

    #[test]
    fn missing_key_replies_zero() {
        let store = Store::new();

        let frame = Frame::Array(vec![
            Frame::Bulk(Bytes::from("DELETE")),
            Frame::Bulk(Bytes::from("key1")),
        ]);
        let cmd = Command::try_from(frame).unwrap();
        let result = cmd.exec(store).unwrap();

        assert_eq!(result, Frame::Integer(0));
    }

    #[test]
    fn no_arguments() {
        let frame = Frame::Array(vec![Frame::Bulk(Bytes::from("DELETE"))]);
        let err = Command::try_from(frame).err().unwrap();
        let err = err.downcast_ref::<CommandParserError>().unwrap();

        assert_eq!(*err, CommandParserError::wrong_arity("DELETE"));
    }
}
