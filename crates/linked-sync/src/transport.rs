//! Reconnecting SSE transport.
//!
//! [`SseTransport`] owns the HTTP connection behind one map's event stream.
//! It is pull-based: each call to [`SseTransport::next`] yields the next
//! lifecycle change or frame. When the connection drops it waits for the
//! reconnect delay and reopens with the last seen event id as
//! `last_event_id`, so the backend replays whatever was missed.
//!
//! A `204 No Content` or any 4xx answer is permanent: the transport reports
//! it and then only yields [`TransportEvent::Closed`].

use std::collections::VecDeque;
use std::time::Duration;

use reqwest::{Response, StatusCode};
use tracing::{debug, info};

use linked_core::{EventId, MapId};

use crate::client::ApiClient;
use crate::error::StreamError;
use crate::sse::{SseDecoder, SseFrame, SseItem};

#[derive(Debug)]
pub enum TransportEvent {
    /// A connection was (re)established.
    Opened,
    Frame(SseFrame),
    /// The connection failed or dropped. A retry follows unless the failure
    /// was permanent.
    Failed(StreamError),
    /// No further events will be produced.
    Closed,
}

enum State {
    Connect { after_delay: bool },
    Open(Response),
    Done,
}

pub struct SseTransport {
    client: ApiClient,
    map_id: MapId,
    decoder: SseDecoder,
    reconnect_delay: Duration,
    pending: VecDeque<SseFrame>,
    state: State,
}

impl SseTransport {
    pub fn new(client: ApiClient, map_id: MapId, resume: Option<EventId>) -> Self {
        let reconnect_delay = client.reconnect_delay();
        SseTransport {
            client,
            map_id,
            decoder: SseDecoder::with_last_id(resume.map(|id| id.0)),
            reconnect_delay,
            pending: VecDeque::new(),
            state: State::Connect { after_delay: false },
        }
    }

    /// Cursor that the next reconnect will resume from.
    pub fn last_event_id(&self) -> Option<EventId> {
        self.decoder.last_event_id().map(EventId::from)
    }

    pub fn reconnect_delay(&self) -> Duration {
        self.reconnect_delay
    }

    /// Waits for the next transport event.
    ///
    /// Not cancel-safe: dropping the future mid-connect ends the transport.
    pub async fn next(&mut self) -> TransportEvent {
        loop {
            if let Some(frame) = self.pending.pop_front() {
                return TransportEvent::Frame(frame);
            }

            match std::mem::replace(&mut self.state, State::Done) {
                State::Done => return TransportEvent::Closed,

                State::Connect { after_delay } => {
                    if after_delay {
                        tokio::time::sleep(self.reconnect_delay).await;
                    }
                    return self.connect().await;
                }

                State::Open(mut response) => match response.chunk().await {
                    Ok(Some(bytes)) => {
                        for item in self.decoder.push(&bytes) {
                            match item {
                                SseItem::Frame(frame) => self.pending.push_back(frame),
                                SseItem::Retry(ms) => {
                                    debug!(map_id = %self.map_id, ms, "server set reconnect delay");
                                    self.reconnect_delay = Duration::from_millis(ms);
                                }
                            }
                        }
                        self.state = State::Open(response);
                    }
                    Ok(None) => {
                        self.state = State::Connect { after_delay: true };
                        return TransportEvent::Failed(StreamError::Ended);
                    }
                    Err(err) => {
                        self.state = State::Connect { after_delay: true };
                        return TransportEvent::Failed(StreamError::Request(err));
                    }
                },
            }
        }
    }

    async fn connect(&mut self) -> TransportEvent {
        let cursor = self.last_event_id();
        debug!(map_id = %self.map_id, cursor = ?cursor, "opening event stream");

        let response = match self
            .client
            .events_request(self.map_id, cursor.as_ref())
            .send()
            .await
        {
            Ok(response) => response,
            Err(err) => {
                self.state = State::Connect { after_delay: true };
                return TransportEvent::Failed(StreamError::Request(err));
            }
        };

        let status = response.status();
        if status == StatusCode::NO_CONTENT {
            info!(map_id = %self.map_id, "event stream closed by server");
            return TransportEvent::Closed;
        }
        if status.is_client_error() {
            return TransportEvent::Failed(StreamError::Status {
                status: status.as_u16(),
            });
        }
        if !status.is_success() {
            self.state = State::Connect { after_delay: true };
            return TransportEvent::Failed(StreamError::Status {
                status: status.as_u16(),
            });
        }

        self.decoder.reset();
        self.state = State::Open(response);
        TransportEvent::Opened
    }
}
