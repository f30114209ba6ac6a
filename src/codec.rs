use bytes::{Buf, BytesMut};
use std::convert::TryInto;
use std::env;
use std::io::Cursor;
use tokio_util::codec::Decoder;

use crate::frame::{self, Frame};
use crate::Error;

/// Turns the inbound byte stream into frames.
///
/// An incomplete frame leaves the buffer untouched and yields `None` until
/// more bytes arrive. End of stream with an empty buffer is the clean
/// disconnect; end of stream mid-frame surfaces as an error and aborts the
/// connection.
pub struct FrameCodec;

impl FrameCodec {
    fn max_frame_size() -> usize {
        env::var("MAX_FRAME_SIZE")
            .map(|s| s.parse().expect("MAX_FRAME_SIZE must be a number"))
            .unwrap_or(512 * 1024 * 1024)
    }
}

impl Decoder for FrameCodec {
    type Item = Frame;
    type Error = Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.len() > FrameCodec::max_frame_size() {
            return Err("frame size exceeds limit".into());
        }

        let mut cursor = Cursor::new(&src[..]);
        let frame = match Frame::parse(&mut cursor) {
            Ok(frame) => frame,
            // Not enough data to parse a frame yet.
            Err(frame::Error::Incomplete) => return Ok(None),
            Err(err) => return Err(err.into()),
        };

        let position: usize = cursor
            .position()
            .try_into()
            .expect("cursor position is too large");

        // Remove the parsed frame from the buffer.
        src.advance(position);

        Ok(Some(frame))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    #[test]
    fn decode_whole_frame() {
        let mut codec = FrameCodec;
        let mut buffer = BytesMut::from(&b":42\r\n"[..]);

        let frame = codec.decode(&mut buffer).unwrap();

        assert_eq!(frame, Some(Frame::Integer(42)));
        assert!(buffer.is_empty());
    }

    #[test]
    fn decode_partial_frame_waits_for_more_data() {
        let mut codec = FrameCodec;
        let mut buffer = BytesMut::from(&b"$5\r\nhel"[..]);

        let frame = codec.decode(&mut buffer).unwrap();
        assert_eq!(frame, None);
        // The partial frame stays buffered.
        assert_eq!(&buffer[..], b"$5\r\nhel");

        buffer.extend_from_slice(b"lo\r\n");
        let frame = codec.decode(&mut buffer).unwrap();
        assert_eq!(frame, Some(Frame::Bulk(Bytes::from("hello"))));
    }

    #[test]
    fn decode_consumes_one_frame_at_a_time() {
        let mut codec = FrameCodec;
        let mut buffer = BytesMut::from(&b"+OK\r\n:7\r\n"[..]);

        assert_eq!(
            codec.decode(&mut buffer).unwrap(),
            Some(Frame::Simple("OK".to_string()))
        );
        assert_eq!(codec.decode(&mut buffer).unwrap(), Some(Frame::Integer(7)));
        assert_eq!(codec.decode(&mut buffer).unwrap(), None);
    }

    #[test]
    fn decode_invalid_tag_is_an_error() {
        let mut codec = FrameCodec;
        let mut buffer = BytesMut::from(&b"#nope\r\n"[..]);

        assert!(codec.decode(&mut buffer).is_err());
    }
}
