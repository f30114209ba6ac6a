use futures::StreamExt;
use tokio::io::AsyncWriteExt;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio_util::codec::FramedRead;
use uuid::Uuid;

use crate::codec::FrameCodec;
use crate::frame::Frame;
use crate::Error;

/// One end of a persistent connection: a framed reader over the read half of
/// the socket, plus the write half for responses.
pub struct Connection {
    reader: FramedRead<OwnedReadHalf, FrameCodec>,
    writer: OwnedWriteHalf,
    pub id: Uuid,
}

impl Connection {
    pub fn new(stream: TcpStream) -> Connection {
        let (read_half, write_half) = stream.into_split();

        Connection {
            reader: FramedRead::new(read_half, FrameCodec),
            writer: write_half,
            id: Uuid::new_v4(),
        }
    }

    /// Reads the next frame. `Ok(None)` means the peer disconnected cleanly
    /// between frames; an error means the stream is unusable (malformed frame
    /// or the peer vanished mid-frame).
    pub async fn read_frame(&mut self) -> Result<Option<Frame>, Error> {
        self.reader.next().await.transpose()
    }

    /// Serializes the whole frame up front and sends it as one write.
    pub async fn write_frame(&mut self, frame: &Frame) -> Result<(), Error> {
        let bytes = frame.serialize();
        self.writer.write_all(&bytes).await?;
        self.writer.flush().await?;
        Ok(())
    }
}
