use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::{CommandParser, CommandParserError};
use crate::frame::Frame;
use crate::Error;

/// Returns a copy of the first argument as a bulk string, byte-for-byte.
/// Without an argument the reply is the empty bulk string.
///
/// Ref: <https://redis.io/docs/latest/commands/echo>
#[derive(Debug, PartialEq)]
pub struct Echo {
    pub payload: Option<Bytes>,
}

impl Executable for Echo {
    fn exec(self) -> Result<Frame, Error> {
        Ok(Frame::Bulk(self.payload.unwrap_or_else(Bytes::new)))
    }
}

impl TryFrom<&mut CommandParser> for Echo {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let payload = match parser.next_bytes() {
            Ok(payload) => Some(payload),
            Err(CommandParserError::EndOfStream) => None,
            Err(err) => return Err(err.into()),
        };

        Ok(Self { payload })
    }
}
