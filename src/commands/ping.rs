use crate::commands::executable::Executable;
use crate::commands::CommandParser;
use crate::frame::Frame;
use crate::Error;

/// Replies with the fixed status `PONG`. Unlike the Redis variant, any
/// arguments are accepted and ignored rather than echoed back.
///
/// Ref: <https://redis.io/docs/latest/commands/ping>
#[derive(Debug, PartialEq)]
pub struct Ping;

impl Executable for Ping {
    fn exec(self) -> Result<Frame, Error> {
        Ok(Frame::Simple(String::from("PONG")))
    }
}

impl TryFrom<&mut CommandParser> for Ping {
    type Error = Error;

    fn try_from(_parser: &mut CommandParser) -> Result<Self, Self::Error> {
        Ok(Self)
    }
}
