use crate::commands::executable::Executable;
use crate::commands::CommandParser;
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

/// Remove every entry, replying with how many were removed. The store itself
/// survives; a FLUSH on an empty store replies 0.
#[derive(Debug, PartialEq)]
pub struct Flush;

impl Executable for Flush {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        let removed = store.clear();
        Ok(Frame::Integer(removed as i64))
    }
}

impl TryFrom<&mut CommandParser> for Flush {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        parser.finish("FLUSH")?;
        Ok(Self)
    }
}
