use bytes::Bytes;
use tokio::net::{TcpStream, ToSocketAddrs};

use crate::connection::Connection;
use crate::frame::Frame;
use crate::Error;

/// A client speaking the same wire protocol as the server. Requests go out as
/// an array of bulk strings; an Error frame in the response surfaces as an
/// `Err`, everything else is handed back to the caller.
pub struct Client {
    conn: Connection,
}

impl Client {
    pub async fn connect<A: ToSocketAddrs>(addr: A) -> Result<Client, Error> {
        let stream = TcpStream::connect(addr).await?;
        Ok(Client {
            conn: Connection::new(stream),
        })
    }

    pub async fn execute(&mut self, tokens: Vec<Bytes>) -> Result<Frame, Error> {
        let request = Frame::Array(tokens.into_iter().map(Frame::Bulk).collect());
        self.conn.write_frame(&request).await?;

        match self.conn.read_frame().await? {
            Some(Frame::Error(message)) => Err(message.into()),
            Some(frame) => Ok(frame),
            None => Err("server closed the connection".into()),
        }
    }

    pub async fn get(&mut self, key: &[u8]) -> Result<Option<Bytes>, Error> {
        let tokens = vec![Bytes::from_static(b"GET"), Bytes::copy_from_slice(key)];

        match self.execute(tokens).await? {
            Frame::Bulk(value) => Ok(Some(value)),
            Frame::Null => Ok(None),
            frame => Err(format!("unexpected GET response: {}", frame).into()),
        }
    }

    pub async fn set(&mut self, key: &[u8], value: &[u8]) -> Result<i64, Error> {
        let tokens = vec![
            Bytes::from_static(b"SET"),
            Bytes::copy_from_slice(key),
            Bytes::copy_from_slice(value),
        ];

        self.integer_reply(tokens, "SET").await
    }

    pub async fn delete(&mut self, key: &[u8]) -> Result<i64, Error> {
        let tokens = vec![Bytes::from_static(b"DELETE"), Bytes::copy_from_slice(key)];

        self.integer_reply(tokens, "DELETE").await
    }

    pub async fn flush(&mut self) -> Result<i64, Error> {
        self.integer_reply(vec![Bytes::from_static(b"FLUSH")], "FLUSH")
            .await
    }

    pub async fn mget(&mut self, keys: &[&[u8]]) -> Result<Vec<Option<Bytes>>, Error> {
        let mut tokens = vec![Bytes::from_static(b"MGET")];
        tokens.extend(keys.iter().map(|key| Bytes::copy_from_slice(key)));

        let values = match self.execute(tokens).await? {
            Frame::Array(values) => values,
            frame => return Err(format!("unexpected MGET response: {}", frame).into()),
        };

        values
            .into_iter()
            .map(|frame| match frame {
                Frame::Bulk(value) => Ok(Some(value)),
                Frame::Null => Ok(None),
                frame => Err(format!("unexpected MGET element: {}", frame).into()),
            })
            .collect()
    }

    pub async fn mset(&mut self, pairs: &[(&[u8], &[u8])]) -> Result<i64, Error> {
        let mut tokens = vec![Bytes::from_static(b"MSET")];
        for (key, value) in pairs {
            tokens.push(Bytes::copy_from_slice(key));
            tokens.push(Bytes::copy_from_slice(value));
        }

        self.integer_reply(tokens, "MSET").await
    }

    async fn integer_reply(&mut self, tokens: Vec<Bytes>, command: &str) -> Result<i64, Error> {
        match self.execute(tokens).await? {
            Frame::Integer(i) => Ok(i),
            frame => Err(format!("unexpected {} response: {}", command, frame).into()),
        }
    }
}
