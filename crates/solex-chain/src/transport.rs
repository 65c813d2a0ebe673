//! Blocking HTTP transport behind a trait so the RPC client stays testable.
use std::fmt;
use std::io::Read;

/// Transport-level failure, before any JSON-RPC interpretation.
#[derive(Debug, Clone)]
pub enum TransportError {
    /// The node answered with a non-2xx HTTP status.
    Status(u16, String),
    /// The request never completed (DNS, refused connection, broken pipe).
    Transport(String),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Status(status, text) => write!(f, "http status {status}: {text}"),
            Self::Transport(message) => write!(f, "transport: {message}"),
        }
    }
}

/// One POST of a JSON-RPC envelope. Implementations may block; the client
/// runs them under `spawn_blocking`.
pub trait RpcTransport: Send + Sync {
    fn post(&self, url: &str, body: &[u8]) -> Result<Vec<u8>, TransportError>;
}

/// ureq-backed production transport.
#[derive(Debug, Default, Clone)]
pub struct HttpTransport;

impl RpcTransport for HttpTransport {
    fn post(&self, url: &str, body: &[u8]) -> Result<Vec<u8>, TransportError> {
        let response = ureq::post(url)
            .set("content-type", "application/json")
            .send_bytes(body)
            .map_err(|error| match error {
                ureq::Error::Status(status, response) => {
                    TransportError::Status(status, response.status_text().to_string())
                }
                ureq::Error::Transport(transport) => {
                    TransportError::Transport(transport.to_string())
                }
            })?;

        let mut raw = Vec::new();
        response
            .into_reader()
            .read_to_end(&mut raw)
            .map_err(|error| TransportError::Transport(error.to_string()))?;
        Ok(raw)
    }
}
