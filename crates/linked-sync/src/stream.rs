//! Typed event stream for one open map.
//!
//! [`MapEventStream`] is a thin wrapper over [`SseTransport`]: a background
//! task decodes frames into [`MapEvent`]s and forwards them, in arrival
//! order, over a channel. It adds no retry logic of its own. Malformed and
//! unknown frames are dropped one at a time without ending the stream. A
//! `sync_error` is delivered and then ends the stream.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use linked_core::{CoreError, EventId, MapEvent, MapId};

use crate::client::ApiClient;
use crate::error::StreamError;
use crate::transport::{SseTransport, TransportEvent};

const CHANNEL_CAPACITY: usize = 256;

/// What the consumer of a [`MapEventStream`] sees.
#[derive(Debug)]
pub enum StreamMessage {
    /// The transport confirmed an open connection. Sent again after every
    /// reconnect.
    Connected,
    /// Advisory only; the transport retries on its own.
    TransportError(StreamError),
    Event {
        id: Option<EventId>,
        event: MapEvent,
    },
    /// The server ended the stream for good.
    Closed,
}

pub struct MapEventStream {
    map_id: MapId,
    rx: mpsc::Receiver<StreamMessage>,
    task: JoinHandle<()>,
    cursor: Option<EventId>,
    closed: bool,
}

impl MapEventStream {
    /// Opens the stream for `map_id`. With a `resume` cursor the backend
    /// replays every event after it first.
    pub fn open(client: ApiClient, map_id: MapId, resume: Option<EventId>) -> Self {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let transport = SseTransport::new(client, map_id, resume.clone());
        let task = tokio::spawn(pump(transport, tx));

        MapEventStream {
            map_id,
            rx,
            task,
            cursor: resume,
            closed: false,
        }
    }

    pub fn map_id(&self) -> MapId {
        self.map_id
    }

    /// Id of the last event handed out by [`MapEventStream::next`].
    pub fn last_event_id(&self) -> Option<&EventId> {
        self.cursor.as_ref()
    }

    /// Waits for the next message. `None` once the stream has ended or was
    /// closed.
    pub async fn next(&mut self) -> Option<StreamMessage> {
        if self.closed {
            return None;
        }

        let message = self.rx.recv().await;
        if let Some(StreamMessage::Event { id: Some(id), .. }) = &message {
            self.cursor = Some(id.clone());
        }
        message
    }

    /// Stops the stream. Safe to call more than once.
    pub fn close(&mut self) {
        if !self.closed {
            debug!(map_id = %self.map_id, "closing event stream");
        }
        self.closed = true;
        self.task.abort();
        self.rx.close();
    }
}

impl Drop for MapEventStream {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn pump(mut transport: SseTransport, tx: mpsc::Sender<StreamMessage>) {
    loop {
        let message = match transport.next().await {
            TransportEvent::Opened => StreamMessage::Connected,
            TransportEvent::Failed(err) => {
                warn!(error = %err, "event stream transport error");
                StreamMessage::TransportError(err)
            }
            TransportEvent::Closed => {
                let _ = tx.send(StreamMessage::Closed).await;
                return;
            }
            TransportEvent::Frame(frame) => match MapEvent::decode(&frame.event, &frame.data) {
                Ok(event) => {
                    let terminal = event.ends_stream();
                    let id = frame.id.map(EventId);
                    if tx.send(StreamMessage::Event { id, event }).await.is_err() || terminal {
                        return;
                    }
                    continue;
                }
                Err(CoreError::UnknownEvent { name }) => {
                    debug!(event = %name, "ignoring unhandled event");
                    continue;
                }
                Err(err) => {
                    warn!(error = %err, "dropping malformed event");
                    continue;
                }
            },
        };

        if tx.send(message).await.is_err() {
            return;
        }
    }
}
