use bytes::{Buf, BytesMut};
use std::env;
use std::io::Cursor;
use thiserror::Error as ThisError;
use tokio_util::codec::Decoder;

use crate::frame::{self, Frame};

#[derive(Debug, ThisError)]
pub enum Error {
    /// The peer closed the connection in the middle of a frame.
    #[error("stream ended before a complete frame was available")]
    EndOfStream,
    #[error("frame size exceeds limit")]
    FrameTooLarge,
    #[error("protocol error; {0}")]
    Protocol(#[from] frame::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Stream-to-frame bridge: buffers socket bytes until `Frame::parse` can
/// produce an entire request, then removes the parsed bytes from the buffer.
pub struct FrameCodec;

impl FrameCodec {
    fn max_frame_size() -> usize {
        env::var("MAX_FRAME_SIZE")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(512 * 1024 * 1024)
    }
}

impl Decoder for FrameCodec {
    type Item = Frame;
    type Error = Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.len() > FrameCodec::max_frame_size() {
            return Err(Error::FrameTooLarge);
        }

        let mut cursor = Cursor::new(&src[..]);
        let frame = match Frame::parse(&mut cursor) {
            Ok(frame) => frame,
            // Not enough data to parse a frame; wait for more bytes.
            Err(frame::Error::Incomplete) => return Ok(None),
            Err(err) => return Err(err.into()),
        };

        // Remove the parsed frame from the buffer.
        let position = cursor.position() as usize;
        src.advance(position);

        Ok(Some(frame))
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.decode(src)? {
            Some(frame) => Ok(Some(frame)),
            // A clean disconnect between frames; mid-frame it is a truncation.
            None if src.is_empty() => Ok(None),
            None => Err(Error::EndOfStream),
        }
    }
}
