use std::sync::Arc;
use std::time::Duration;

use bytes::{Buf, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::{timeout_at, Instant};

use crate::config::VirtualHosts;
use crate::http::parser::{parse_http_request, ParseError};
use crate::http::request::Request;
use crate::http::response::Response;
use crate::http::router::{self, Route};
use crate::http::writer::ResponseWriter;

const READ_BUFFER_SIZE: usize = 4096;

/// Serves one accepted connection until it closes.
pub async fn handle_connection<S>(
    stream: S,
    hosts: Arc<VirtualHosts>,
    idle_timeout: Duration,
) -> anyhow::Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    Connection::new(stream, hosts, idle_timeout).run().await
}

pub struct Connection<S> {
    stream: S,
    buffer: BytesMut,
    hosts: Arc<VirtualHosts>,
    idle_timeout: Duration,
    state: ConnectionState,
}

pub enum ConnectionState {
    AwaitingRequest,
    Processing(Request),
    Writing(ResponseWriter, bool), // bool = keep_alive?
    Closed,
}

/// Result of one attempt to read a request.
#[derive(Debug)]
pub enum ReadOutcome {
    Request(Request),
    /// Peer closed before sending any byte of a new request.
    Closed,
    /// Deadline passed before any byte of a new request arrived.
    TimedOut,
    /// Parse failure, or the request was cut short by EOF or the deadline.
    Malformed(ParseError),
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S, hosts: Arc<VirtualHosts>, idle_timeout: Duration) -> Self {
        Self {
            stream,
            buffer: BytesMut::with_capacity(READ_BUFFER_SIZE),
            hosts,
            idle_timeout,
            state: ConnectionState::AwaitingRequest,
        }
    }

    pub async fn run(&mut self) -> anyhow::Result<()> {
        loop {
            match std::mem::replace(&mut self.state, ConnectionState::Closed) {
                ConnectionState::AwaitingRequest => {
                    let deadline = Instant::now() + self.idle_timeout;

                    self.state = match self.read_request(deadline).await? {
                        ReadOutcome::Request(req) => ConnectionState::Processing(req),
                        ReadOutcome::Closed => {
                            tracing::debug!("Peer closed connection");
                            ConnectionState::Closed
                        }
                        ReadOutcome::TimedOut => {
                            tracing::debug!("Connection idle timeout");
                            ConnectionState::Closed
                        }
                        ReadOutcome::Malformed(e) => {
                            tracing::warn!(error = %e, "Bad request");
                            self.reject().await;
                            ConnectionState::Closed
                        }
                    };
                }

                ConnectionState::Processing(req) => {
                    let response = Self::handle_request(&self.hosts, &req).await;
                    let keep_alive = req.keep_alive() && !response.closes_connection();

                    let writer = ResponseWriter::new(&response);

                    tracing::info!(
                        method = %req.method,
                        host = %req.host,
                        path = %req.path,
                        user_agent = req.header("User-Agent").unwrap_or("-"),
                        status = response.status.as_u16(),
                        bytes = writer.total_bytes(),
                        keep_alive,
                        "Request served"
                    );

                    self.state = ConnectionState::Writing(writer, keep_alive);
                }

                ConnectionState::Writing(mut writer, keep_alive) => {
                    writer.write_to_stream(&mut self.stream).await?;

                    if keep_alive {
                        self.state = ConnectionState::AwaitingRequest; // go back for next request
                    } else {
                        self.state = ConnectionState::Closed;
                    }
                }

                ConnectionState::Closed => {
                    break;
                }
            }
        }

        // Peer may already be gone
        let _ = self.stream.shutdown().await;
        Ok(())
    }

    /// Reads exactly one request, waiting no later than `deadline`.
    ///
    /// Bytes past the end of the request stay buffered for the next cycle.
    pub async fn read_request(&mut self, deadline: Instant) -> anyhow::Result<ReadOutcome> {
        loop {
            // Try parsing whatever we already have
            if !self.buffer.is_empty() {
                match parse_http_request(&self.buffer) {
                    Ok((request, consumed)) => {
                        self.buffer.advance(consumed);
                        return Ok(ReadOutcome::Request(request));
                    }

                    Err(ParseError::Incomplete) => {
                        // Need more data → fall through to read
                    }

                    Err(e) => {
                        self.buffer.clear();
                        return Ok(ReadOutcome::Malformed(e));
                    }
                }
            }

            let started = !self.buffer.is_empty();

            match timeout_at(deadline, self.stream.read_buf(&mut self.buffer)).await {
                Err(_elapsed) if started => {
                    return Ok(ReadOutcome::Malformed(ParseError::Incomplete));
                }
                Err(_elapsed) => return Ok(ReadOutcome::TimedOut),
                Ok(Ok(0)) if started => {
                    return Ok(ReadOutcome::Malformed(ParseError::Incomplete));
                }
                Ok(Ok(0)) => return Ok(ReadOutcome::Closed),
                Ok(Ok(_)) => {}
                Ok(Err(e)) => return Err(e.into()),
            }
        }
    }

    /// Sends a 400 for a request that could not be parsed.
    ///
    /// The peer may already be gone, so a failed write is not an error.
    async fn reject(&mut self) {
        let mut writer = ResponseWriter::new(&Response::bad_request(true));

        if let Err(e) = writer.write_to_stream(&mut self.stream).await {
            tracing::debug!(error = %e, "Could not deliver 400 response");
        }
    }

    async fn handle_request(hosts: &VirtualHosts, req: &Request) -> Response {
        match router::route(hosts, req).await {
            Route::File(path) => match Response::from_file(&path, req.close).await {
                Ok(response) => response,
                Err(e) => {
                    tracing::error!(path = %path.display(), error = %e, "Failed to read file");
                    Response::internal_error()
                }
            },
            Route::NotFound => Response::not_found(req.close),
            Route::BadRequest => Response::bad_request(req.close),
        }
    }
}
