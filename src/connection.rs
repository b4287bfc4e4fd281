use futures::StreamExt;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio_util::codec::FramedRead;
use uuid::Uuid;

use crate::codec::{self, FrameCodec};
use crate::frame::Frame;

/// One accepted connection. Incoming bytes are buffered by the framed reader
/// until a complete request frame is available; replies are serialized and
/// written back on the same socket. Dropping the connection closes the
/// socket, which covers every exit path of the handler loop.
pub struct Connection {
    pub id: Uuid,
    reader: FramedRead<OwnedReadHalf, FrameCodec>,
    pub writer: OwnedWriteHalf,
}

impl Connection {
    pub fn new(stream: TcpStream) -> Connection {
        let (read_half, write_half) = stream.into_split();

        Connection {
            id: Uuid::new_v4(),
            reader: FramedRead::new(read_half, FrameCodec),
            writer: write_half,
        }
    }

    /// Reads the next request frame. `Ok(None)` means the peer disconnected
    /// cleanly between frames.
    pub async fn read_frame(&mut self) -> Result<Option<Frame>, codec::Error> {
        self.reader.next().await.transpose()
    }
}
