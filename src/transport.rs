//! Request/reply transport.
//!
//! The assemblers produce a [`Command`]; a [`Transport`] delivers it and
//! hands back the raw reply frame for the reply shapers. [`Connection`] is the
//! provided implementation: one request in flight at a time over any tokio
//! byte stream, with no retry and no reconnect.

use crate::commands::Command;
use crate::config::ClientConfig;
use crate::error::{ConfigError, Error, Result};
use crate::protocol::{Frame, RespParser};
use bytes::{Bytes, BytesMut};
use std::future::Future;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufWriter};
use tokio::net::TcpStream;
use tracing::{debug, trace, warn};

/// Buffer size for reading from the socket.
const READ_BUFFER_SIZE: usize = 8 * 1024;

/// Delivers a command and returns its reply.
pub trait Transport: Send {
    /// Send `command` and wait for its reply. Error replies surface as
    /// [`Error::Server`].
    fn send(&mut self, command: Command) -> impl Future<Output = Result<Frame>> + Send;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn send(&mut self, command: Command) -> impl Future<Output = Result<Frame>> + Send {
        (**self).send(command)
    }
}

/// A connection to one server.
pub struct Connection<S = TcpStream> {
    /// Underlying stream
    stream: BufWriter<S>,
    /// Reply parser
    parser: RespParser,
    /// Serialized request
    write_buffer: BytesMut,
    /// Socket read buffer
    read_buffer: Vec<u8>,
    /// Time allowed for one reply
    command_timeout: Option<Duration>,
    /// Set while a request awaits its reply
    in_flight: bool,
}

impl Connection<TcpStream> {
    /// Dial the configured endpoint and run the session handshake.
    pub async fn connect(config: &ClientConfig) -> Result<Self> {
        if config.tls {
            return Err(ConfigError::Unsupported("tls".to_string()).into());
        }

        let addr = (config.host.as_str(), config.port);
        let stream = tokio::time::timeout(config.connect_timeout, TcpStream::connect(addr))
            .await
            .map_err(|_| Error::Timeout)??;
        stream.set_nodelay(true)?;
        debug!("Connected to {}:{}", config.host, config.port);

        let mut conn = Self::new(stream, config);
        conn.handshake(config).await?;
        Ok(conn)
    }
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    /// Wrap an established stream. No handshake is performed.
    pub fn new(stream: S, config: &ClientConfig) -> Self {
        Self {
            stream: BufWriter::new(stream),
            parser: RespParser::with_limits(config.parser_limits()),
            write_buffer: BytesMut::with_capacity(4096),
            read_buffer: vec![0u8; READ_BUFFER_SIZE],
            command_timeout: config.command_timeout,
            in_flight: false,
        }
    }

    /// Run `AUTH`, `SELECT` and `CLIENT SETNAME` as configured.
    pub async fn handshake(&mut self, config: &ClientConfig) -> Result<()> {
        if let Some((username, password)) = config.credentials() {
            let mut auth = vec![bulk("AUTH")];
            if let Some(username) = username {
                auth.push(bulk(username));
            }
            auth.push(bulk(password));
            self.request(&Frame::Array(auth)).await?;
        }

        if config.database != 0 {
            let select = Frame::Array(vec![bulk("SELECT"), bulk(&config.database.to_string())]);
            self.request(&select).await?;
        }

        if let Some(name) = &config.client_name {
            let setname = Frame::Array(vec![bulk("CLIENT"), bulk("SETNAME"), bulk(name)]);
            self.request(&setname).await?;
        }

        Ok(())
    }

    /// Write one request frame and read exactly one reply.
    pub async fn request(&mut self, request: &Frame) -> Result<Frame> {
        if self.in_flight {
            return Err(Error::Connection(
                "connection out of sync after an abandoned request".to_string(),
            ));
        }

        let reply = match self.command_timeout {
            Some(limit) => tokio::time::timeout(limit, self.exchange(request))
                .await
                .map_err(|_| Error::Timeout)??,
            None => self.exchange(request).await?,
        };

        match reply {
            Frame::Error(msg) => {
                warn!("Server error reply: {}", msg);
                Err(Error::Server(msg))
            }
            other => Ok(other),
        }
    }

    async fn exchange(&mut self, request: &Frame) -> Result<Frame> {
        self.in_flight = true;

        self.write_buffer.clear();
        request.serialize(&mut self.write_buffer);
        trace!("Writing {} bytes", self.write_buffer.len());
        self.stream.write_all(&self.write_buffer).await?;
        self.stream.flush().await?;

        let reply = self.read_frame().await?;
        self.in_flight = false;
        Ok(reply)
    }

    async fn read_frame(&mut self) -> Result<Frame> {
        loop {
            if let Some(frame) = self.parser.parse()? {
                return Ok(frame);
            }

            let n = self.stream.get_mut().read(&mut self.read_buffer).await?;
            if n == 0 {
                debug!("Connection closed by peer");
                return Err(Error::Connection("connection closed by peer".to_string()));
            }
            trace!("Read {} bytes", n);
            self.parser.extend(&self.read_buffer[..n]);
        }
    }
}

impl<S> Transport for Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn send(&mut self, command: Command) -> Result<Frame> {
        trace!("Sending {}", command.command_type().as_str());
        self.request(&command.to_frame()).await
    }
}

impl<S> std::fmt::Debug for Connection<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("command_timeout", &self.command_timeout)
            .field("in_flight", &self.in_flight)
            .finish()
    }
}

fn bulk(s: &str) -> Frame {
    Frame::Bulk(Bytes::copy_from_slice(s.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::parse_frame;
    use tokio::io::duplex;

    #[tokio::test]
    async fn test_tls_is_refused() {
        let config = ClientConfig::new().tls(true);
        let err = Connection::connect(&config).await.unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::Unsupported(_))));
    }

    #[tokio::test]
    async fn test_peer_close_is_connection_error() {
        let (client, server) = duplex(1024);
        drop(server);
        let mut conn = Connection::new(client, &ClientConfig::new());
        let err = conn.request(&bulk("PING")).await.unwrap_err();
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_request_reads_one_reply() {
        let (client, mut server) = duplex(1024);
        let mut conn = Connection::new(client, &ClientConfig::new());

        let peer = tokio::spawn(async move {
            let mut buf = vec![0u8; 256];
            let n = server.read(&mut buf).await.unwrap();
            let request = parse_frame(&buf[..n]).unwrap();
            server.write_all(b"+PONG\r\n").await.unwrap();
            request
        });

        let reply = conn
            .request(&Frame::Array(vec![bulk("PING")]))
            .await
            .unwrap();
        assert_eq!(reply, Frame::simple("PONG"));
        assert_eq!(peer.await.unwrap(), Frame::Array(vec![bulk("PING")]));
    }
}
