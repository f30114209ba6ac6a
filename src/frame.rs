//! Wire protocol frames.
//!
//! Every frame starts with a one-byte tag identifying its variant, followed by
//! the variant's contents. Lines are terminated by CRLF. Bulk payloads are
//! length-prefixed; a declared length of -1 is the absent/null sentinel,
//! distinct from an empty payload.

use std::fmt;

use bytes::Buf;
use bytes::Bytes;
use std::io::Cursor;
use std::string::FromUtf8Error;
use thiserror::Error as ThisError;

static CRLF: &[u8; 2] = b"\r\n";

#[derive(Debug, ThisError)]
pub enum Error {
    #[error("not enough data is available to parse an entire frame")]
    Incomplete,
    #[error("invalid frame data type: {0}")]
    InvalidDataType(u8),
    #[error("protocol error; {0}")]
    Malformed(String),
}

#[derive(Clone, Debug, PartialEq)]
pub enum Frame {
    Simple(String),
    Error(String),
    Integer(i64),
    Bulk(Bytes),
    /// UTF-8 text with its own tag, so a decoder can tell text payloads apart
    /// from raw bulk bytes.
    Text(String),
    Null,
    Array(Vec<Frame>),
    /// Key/value pairs. Insertion order is not significant; a duplicate key
    /// overwrites the earlier pair.
    Map(Vec<(Frame, Frame)>),
    /// Unique elements, encoded like an array under its own tag.
    Set(Vec<Frame>),
}

impl Frame {
    /// Parses exactly one frame out of `src`, leaving the cursor just past it.
    ///
    /// Returns `Error::Incomplete` when the buffer does not yet hold a whole
    /// frame. The caller decides whether that means "wait for more bytes" or,
    /// at end of stream, "the peer disconnected".
    pub fn parse(src: &mut Cursor<&[u8]>) -> Result<Self, Error> {
        let first_byte = get_byte(src)?;
        let data_type = DataType::try_from(first_byte)?;

        match data_type {
            DataType::SimpleString => {
                let bytes = get_line(src)?.to_vec();
                let string = String::from_utf8(bytes)?;
                Ok(Frame::Simple(string))
            }
            DataType::SimpleError => {
                let bytes = get_line(src)?.to_vec();
                let string = String::from_utf8(bytes)?;
                Ok(Frame::Error(string))
            }
            DataType::Integer => {
                let integer = get_integer_line(src)?;
                Ok(Frame::Integer(integer))
            }
            // $<length>\r\n<data>\r\n
            DataType::BulkString => {
                let length = get_integer_line(src)?;

                if length == -1 {
                    return Ok(Frame::Null);
                }

                let data = get_payload(src, length)?;
                Ok(Frame::Bulk(data))
            }
            // ^<length>\r\n<utf8>\r\n
            DataType::TextString => {
                let length = get_integer_line(src)?;
                let data = get_payload(src, length)?;
                let string = String::from_utf8(data.to_vec())?;
                Ok(Frame::Text(string))
            }
            // *<number-of-elements>\r\n<element-1>...<element-n>
            DataType::Array => {
                let length = get_count_line(src)?;

                let mut frames = Vec::with_capacity(length);
                for _ in 0..length {
                    let frame = Self::parse(src)?;
                    frames.push(frame);
                }

                Ok(Frame::Array(frames))
            }
            // %<number-of-pairs>\r\n<key-1><value-1>...<key-n><value-n>
            DataType::Map => {
                let pairs_count = get_count_line(src)?;

                let mut pairs: Vec<(Frame, Frame)> = Vec::with_capacity(pairs_count);
                for _ in 0..pairs_count {
                    let key = Self::parse(src)?;
                    let value = Self::parse(src)?;

                    // A duplicate key overwrites the earlier pair.
                    match pairs.iter().position(|(existing, _)| *existing == key) {
                        Some(index) => pairs[index].1 = value,
                        None => pairs.push((key, value)),
                    }
                }

                Ok(Frame::Map(pairs))
            }
            // &<number-of-elements>\r\n<element-1>...<element-n>
            DataType::Set => {
                let length = get_count_line(src)?;

                let mut elements: Vec<Frame> = Vec::with_capacity(length);
                for _ in 0..length {
                    let element = Self::parse(src)?;
                    if !elements.contains(&element) {
                        elements.push(element);
                    }
                }

                Ok(Frame::Set(elements))
            }
        }
    }

    pub fn serialize(&self) -> Vec<u8> {
        match self {
            Frame::Simple(s) => {
                let mut bytes = Vec::with_capacity(1 + s.len() + CRLF.len());
                bytes.push(u8::from(DataType::SimpleString));
                bytes.extend_from_slice(s.as_bytes());
                bytes.extend_from_slice(CRLF);
                bytes
            }
            Frame::Error(s) => {
                let mut bytes = Vec::with_capacity(1 + s.len() + CRLF.len());
                bytes.push(u8::from(DataType::SimpleError));
                bytes.extend_from_slice(s.as_bytes());
                bytes.extend_from_slice(CRLF);
                bytes
            }
            Frame::Integer(i) => {
                let digits = i.to_string();
                let mut bytes = Vec::with_capacity(1 + digits.len() + CRLF.len());
                bytes.push(u8::from(DataType::Integer));
                bytes.extend_from_slice(digits.as_bytes());
                bytes.extend_from_slice(CRLF);
                bytes
            }
            Frame::Bulk(data) => {
                serialize_blob(u8::from(DataType::BulkString), data)
            }
            Frame::Text(s) => serialize_blob(u8::from(DataType::TextString), s.as_bytes()),
            Frame::Null => b"$-1\r\n".to_vec(),
            Frame::Array(elements) => {
                let mut bytes = serialize_count(u8::from(DataType::Array), elements.len());
                for frame in elements {
                    bytes.extend(frame.serialize());
                }
                bytes
            }
            Frame::Map(pairs) => {
                let mut bytes = serialize_count(u8::from(DataType::Map), pairs.len());
                for (key, value) in pairs {
                    bytes.extend(key.serialize());
                    bytes.extend(value.serialize());
                }
                bytes
            }
            Frame::Set(elements) => {
                let mut bytes = serialize_count(u8::from(DataType::Set), elements.len());
                for frame in elements {
                    bytes.extend(frame.serialize());
                }
                bytes
            }
        }
    }
}

fn serialize_blob(tag: u8, data: &[u8]) -> Vec<u8> {
    let length = data.len().to_string();
    let mut bytes = Vec::with_capacity(1 + length.len() + CRLF.len() + data.len() + CRLF.len());
    bytes.push(tag);
    bytes.extend_from_slice(length.as_bytes());
    bytes.extend_from_slice(CRLF);
    bytes.extend_from_slice(data);
    bytes.extend_from_slice(CRLF);
    bytes
}

fn serialize_count(tag: u8, count: usize) -> Vec<u8> {
    let count = count.to_string();
    let mut bytes = Vec::with_capacity(1 + count.len() + CRLF.len());
    bytes.push(tag);
    bytes.extend_from_slice(count.as_bytes());
    bytes.extend_from_slice(CRLF);
    bytes
}

impl From<Frame> for Vec<u8> {
    fn from(frame: Frame) -> Self {
        frame.serialize()
    }
}

// Scalar conversions used by command handlers to build responses.

impl From<Bytes> for Frame {
    fn from(bytes: Bytes) -> Self {
        Frame::Bulk(bytes)
    }
}

impl From<String> for Frame {
    fn from(s: String) -> Self {
        Frame::Text(s)
    }
}

impl From<&str> for Frame {
    fn from(s: &str) -> Self {
        Frame::Text(s.to_string())
    }
}

impl From<bool> for Frame {
    fn from(b: bool) -> Self {
        Frame::Integer(i64::from(b))
    }
}

impl From<i64> for Frame {
    fn from(i: i64) -> Self {
        Frame::Integer(i)
    }
}

// Fractional precision does not survive the wire; callers must not rely on it.
impl From<f64> for Frame {
    fn from(f: f64) -> Self {
        Frame::Integer(f as i64)
    }
}

impl<T: Into<Frame>> From<Option<T>> for Frame {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => value.into(),
            None => Frame::Null,
        }
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Frame::Simple(s) => write!(f, "+{}", s),
            Frame::Error(s) => write!(f, "-{}", s),
            Frame::Integer(i) => write!(f, ":{}", i),
            Frame::Bulk(bytes) => write!(f, "${}", String::from_utf8_lossy(bytes)),
            Frame::Text(s) => write!(f, "^{}", s),
            Frame::Null => write!(f, "$-1"),
            Frame::Array(elements) => {
                write!(f, "*{}", elements.len())?;
                for frame in elements {
                    write!(f, " {}", frame)?;
                }
                Ok(())
            }
            Frame::Map(pairs) => {
                write!(f, "%{}", pairs.len())?;
                for (key, value) in pairs {
                    write!(f, " {}={}", key, value)?;
                }
                Ok(())
            }
            Frame::Set(elements) => {
                write!(f, "&{}", elements.len())?;
                for frame in elements {
                    write!(f, " {}", frame)?;
                }
                Ok(())
            }
        }
    }
}

/// Returns the bytes of one CRLF-terminated line, with the terminator
/// stripped, advancing the cursor past it.
fn get_line<'a>(src: &mut Cursor<&'a [u8]>) -> Result<&'a [u8], Error> {
    let start = src.position() as usize;
    let end = src.get_ref().len();

    let line_end = src.get_ref()[start..end]
        .windows(2)
        .position(|window| window == CRLF)
        .ok_or(Error::Incomplete)
        .map(|index| start + index)?;

    src.set_position((line_end + CRLF.len()) as u64);

    Ok(&src.get_ref()[start..line_end])
}

fn get_integer_line(src: &mut Cursor<&[u8]>) -> Result<i64, Error> {
    let line = get_line(src)?;
    let string =
        std::str::from_utf8(line).map_err(|_| Error::Malformed("invalid integer line".into()))?;
    string
        .parse::<i64>()
        .map_err(|_| Error::Malformed(format!("invalid integer line: {:?}", string)))
}

/// An element (or pair) count for a composite frame. Unlike a bulk length, a
/// negative count has no sentinel meaning and is a protocol violation.
fn get_count_line(src: &mut Cursor<&[u8]>) -> Result<usize, Error> {
    let count = get_integer_line(src)?;
    usize::try_from(count).map_err(|_| Error::Malformed(format!("negative count: {}", count)))
}

/// Reads exactly `length + 2` bytes and returns the first `length`. The
/// declared length never includes the trailing terminator, which is discarded
/// without being validated against its content.
fn get_payload(src: &mut Cursor<&[u8]>, length: i64) -> Result<Bytes, Error> {
    let length = usize::try_from(length)
        .map_err(|_| Error::Malformed(format!("invalid payload length: {}", length)))?;

    if src.remaining() < length + CRLF.len() {
        return Err(Error::Incomplete);
    }

    let start = src.position() as usize;
    let data = Bytes::copy_from_slice(&src.get_ref()[start..start + length]);
    src.advance(length + CRLF.len());

    Ok(data)
}

fn get_byte(src: &mut Cursor<&[u8]>) -> Result<u8, Error> {
    if !src.has_remaining() {
        return Err(Error::Incomplete);
    }
    Ok(src.get_u8())
}

#[derive(Debug)]
enum DataType {
    SimpleString, // '+'
    SimpleError,  // '-'
    Integer,      // ':'
    BulkString,   // '$'
    TextString,   // '^'
    Array,        // '*'
    Map,          // '%'
    Set,          // '&'
}

impl TryFrom<u8> for DataType {
    type Error = Error;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        match byte {
            b'+' => Ok(Self::SimpleString),
            b'-' => Ok(Self::SimpleError),
            b':' => Ok(Self::Integer),
            b'$' => Ok(Self::BulkString),
            b'^' => Ok(Self::TextString),
            b'*' => Ok(Self::Array),
            b'%' => Ok(Self::Map),
            b'&' => Ok(Self::Set),
            _ => Err(Error::InvalidDataType(byte)),
        }
    }
}

impl From<DataType> for u8 {
    fn from(value: DataType) -> Self {
        match value {
            DataType::SimpleString => b'+',
            DataType::SimpleError => b'-',
            DataType::Integer => b':',
            DataType::BulkString => b'$',
            DataType::TextString => b'^',
            DataType::Array => b'*',
            DataType::Map => b'%',
            DataType::Set => b'&',
        }
    }
}

impl From<FromUtf8Error> for Error {
    fn from(_src: FromUtf8Error) -> Error {
        Error::Malformed("invalid UTF-8 in frame".to_string())
    }
}
