//! Byte-stream links to the autopilot

use crate::error::{RouterError, RouterResult};
use bridge_config::LinkEndpoint;
use std::fmt;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpStream, UnixStream};
use tracing::info;

pub(crate) type LinkReader = Box<dyn AsyncRead + Send + Unpin>;
pub(crate) type LinkWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// A connected, bidirectional byte stream
///
/// Any `AsyncRead + AsyncWrite` works: TCP, Unix sockets, or an in-memory
/// `tokio::io::duplex` pair in tests.
pub struct Link {
    pub(crate) name: String,
    pub(crate) reader: LinkReader,
    pub(crate) writer: LinkWriter,
}

impl Link {
    pub fn new<S>(name: impl Into<String>, stream: S) -> Self
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let (reader, writer) = tokio::io::split(stream);
        Self {
            name: name.into(),
            reader: Box::new(reader),
            writer: Box::new(writer),
        }
    }

    /// Open a connection to `endpoint`
    pub async fn connect(endpoint: &LinkEndpoint) -> RouterResult<Self> {
        let connect_err = |source| RouterError::Connect {
            endpoint: endpoint.to_string(),
            source,
        };

        let link = match endpoint {
            LinkEndpoint::Tcp { host, port } => {
                let stream = TcpStream::connect((host.as_str(), *port))
                    .await
                    .map_err(connect_err)?;
                stream.set_nodelay(true).map_err(connect_err)?;
                let (reader, writer) = stream.into_split();
                Self {
                    name: endpoint.to_string(),
                    reader: Box::new(reader),
                    writer: Box::new(writer),
                }
            }
            LinkEndpoint::Unix { path } => {
                let stream = UnixStream::connect(path).await.map_err(connect_err)?;
                let (reader, writer) = stream.into_split();
                Self {
                    name: endpoint.to_string(),
                    reader: Box::new(reader),
                    writer: Box::new(writer),
                }
            }
        };

        info!(link = %link.name, "Link connected");
        Ok(link)
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Link").field("name", &self.name).finish()
    }
}
