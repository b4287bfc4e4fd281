use tracing::debug;

use crate::commands::executable::Executable;
use crate::frame::Frame;
use crate::Error;

/// Catch-all for command names this server does not implement. The peer gets
/// an error reply and the connection stays open for further commands.
#[derive(Debug, PartialEq)]
pub struct Unknown {
    pub name: String,
}

impl Executable for Unknown {
    fn exec(self) -> Result<Frame, Error> {
        debug!("unrecognized command: {:?}", self.name);

        Ok(Frame::Error(String::from("ERR unknown command")))
    }
}
