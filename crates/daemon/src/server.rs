// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Socket server and connection handling.

use std::time::{Duration, Instant};

use hb_core::{ChatHub, Cursor, PollOutcome, TemplateRenderer, UuidIdGen};
use thiserror::Error;
use tokio::io::AsyncReadExt;
use tokio::net::unix::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{UnixListener, UnixStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::protocol::{self, Request, Response, PROTOCOL_VERSION};

/// Hub type served by the daemon
pub type RoomHub = ChatHub<UuidIdGen, TemplateRenderer>;

/// How many trailing characters of an author's name prefix their messages
const AUTHOR_TAG_LEN: usize = 5;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Protocol error: {0}")]
    Protocol(#[from] protocol::ProtocolError),

    #[error("Request read timeout")]
    Timeout,
}

/// State shared by every connection task
#[derive(Clone)]
pub struct ServerContext {
    pub hub: RoomHub,
    pub start_time: Instant,
    /// Cancelled when the daemon shuts down; parent of every poll's token
    pub shutdown: CancellationToken,
    pub io_timeout: Duration,
}

impl ServerContext {
    pub fn new(hub: RoomHub, io_timeout: Duration) -> Self {
        Self {
            hub,
            start_time: Instant::now(),
            shutdown: CancellationToken::new(),
            io_timeout,
        }
    }
}

/// Accept connections until shutdown is requested, one task per connection
pub async fn serve(listener: &UnixListener, ctx: ServerContext) {
    loop {
        tokio::select! {
            _ = ctx.shutdown.cancelled() => {
                info!("Shutdown requested, no longer accepting connections");
                break;
            }

            result = listener.accept() => {
                match result {
                    Ok((stream, _)) => {
                        let ctx = ctx.clone();
                        tokio::spawn(async move {
                            if let Err(e) = handle_connection(ctx, stream).await {
                                error!("Error handling connection: {}", e);
                            }
                        });
                    }
                    Err(e) => {
                        error!("Error accepting connection: {}", e);
                    }
                }
            }
        }
    }
}

/// Handle a single client connection
pub async fn handle_connection(ctx: ServerContext, stream: UnixStream) -> Result<(), ServerError> {
    // Split stream for reading/writing
    let (mut reader, mut writer) = stream.into_split();

    // Read request with timeout
    let request = match protocol::read_request(&mut reader, ctx.io_timeout).await {
        Ok(req) => req,
        Err(protocol::ProtocolError::Timeout) => {
            error!("Request read timeout");
            return Err(ServerError::Timeout);
        }
        Err(protocol::ProtocolError::ConnectionClosed) => {
            debug!("Client disconnected before sending request");
            return Ok(());
        }
        Err(e) => {
            error!("Failed to read request: {}", e);
            return Err(ServerError::Protocol(e));
        }
    };

    debug!("Received request: {:?}", request);

    let response = match request {
        Request::Poll { cursor } => return handle_poll(&ctx, cursor, reader, writer).await,

        Request::Publish { body, author, next } => {
            return handle_publish(&ctx, body, author, next, writer).await
        }

        Request::Ping => Response::Pong,

        Request::Hello { version: _ } => Response::Hello {
            version: PROTOCOL_VERSION.to_string(),
        },

        Request::Join => {
            let name = uuid::Uuid::new_v4().to_string();
            let visitor = ctx.hub.join();
            info!(visitor, "visitor joined");
            Response::Joined { name, visitor }
        }

        Request::History => Response::Messages {
            messages: ctx.hub.history(),
        },

        Request::Status => Response::Status {
            uptime_secs: ctx.start_time.elapsed().as_secs(),
            messages: ctx.hub.len(),
            capacity: ctx.hub.capacity(),
            waiters: ctx.hub.waiter_count(),
            visitors: ctx.hub.visitors(),
        },

        Request::Shutdown => {
            // Respond before cancelling so the client sees the acknowledgement
            protocol::write_response(&mut writer, &Response::ShuttingDown, ctx.io_timeout)
                .await?;
            ctx.shutdown.cancel();
            return Ok(());
        }
    };

    debug!("Sending response: {:?}", response);

    // Write response with timeout
    protocol::write_response(&mut writer, &response, ctx.io_timeout).await?;

    Ok(())
}

/// Publish a message. The publisher's response is written before the
/// message is appended and other subscribers are woken.
async fn handle_publish(
    ctx: &ServerContext,
    body: String,
    author: Option<String>,
    next: Option<String>,
    mut writer: OwnedWriteHalf,
) -> Result<(), ServerError> {
    let body = tag_with_author(author.as_deref(), &body);
    let io_timeout = ctx.io_timeout;

    let reply = &mut writer;
    let published = ctx
        .hub
        .publish(body, move |message| async move {
            let response = match next {
                Some(location) => Response::Redirect { location },
                None => Response::Message { message },
            };
            protocol::write_response(reply, &response, io_timeout).await
        })
        .await;

    match published {
        Ok(delivered) => Ok(delivered?),
        Err(e) => {
            warn!(error = %e, "publish failed");
            let response = Response::Error {
                message: e.to_string(),
            };
            protocol::write_response(&mut writer, &response, io_timeout).await?;
            Ok(())
        }
    }
}

/// Hold the connection open until messages newer than `cursor` exist.
///
/// Writes nothing if the client disconnects or the daemon shuts down first.
async fn handle_poll(
    ctx: &ServerContext,
    cursor: Cursor,
    reader: OwnedReadHalf,
    mut writer: OwnedWriteHalf,
) -> Result<(), ServerError> {
    let cancel = ctx.shutdown.child_token();
    let watcher = tokio::spawn(watch_disconnect(reader, cancel.clone()));

    let outcome = ctx.hub.poll(&cursor, &cancel).await;
    watcher.abort();

    match outcome {
        PollOutcome::Cancelled => {
            debug!(%cursor, "poll abandoned");
            Ok(())
        }
        PollOutcome::Ready(messages) => {
            if cancel.is_cancelled() {
                debug!(%cursor, "connection closed, dropping poll response");
                return Ok(());
            }
            let response = Response::Messages { messages };
            protocol::write_response(&mut writer, &response, ctx.io_timeout).await?;
            Ok(())
        }
    }
}

/// Cancel `cancel` once the client closes its end of the connection.
///
/// A poll connection carries a single request, so any read completing
/// (EOF, error or stray bytes) means the exchange is over.
async fn watch_disconnect(mut reader: OwnedReadHalf, cancel: CancellationToken) {
    let mut buf = [0u8; 1];
    tokio::select! {
        _ = cancel.cancelled() => {}
        result = reader.read(&mut buf) => {
            match result {
                Ok(0) => debug!("client disconnected"),
                Ok(_) => warn!("unexpected data after poll request, closing"),
                Err(e) => debug!(error = %e, "poll connection read failed"),
            }
            cancel.cancel();
        }
    }
}

/// Prefix a message body with the tail of its author's pseudo-identity
fn tag_with_author(author: Option<&str>, body: &str) -> String {
    match author {
        Some(name) => {
            let skip = name.chars().count().saturating_sub(AUTHOR_TAG_LEN);
            let tag: String = name.chars().skip(skip).collect();
            format!("{} :  {}", tag, body)
        }
        None => body.to_string(),
    }
}

#[cfg(test)]
#[path = "server_tests.rs"]
mod tests;
