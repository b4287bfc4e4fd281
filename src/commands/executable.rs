use crate::frame::Frame;
use crate::Error;

/// Every command produces exactly one reply frame and mutates nothing.
pub trait Executable {
    fn exec(self) -> Result<Frame, Error>;
}
