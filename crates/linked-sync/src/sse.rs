//! Incremental decoder for `text/event-stream` bodies.
//!
//! Bytes arrive in arbitrary chunks; [`SseDecoder::push`] buffers partial
//! lines and yields complete frames. Lines may end in LF, CR or CRLF, even
//! when the CR and LF land in different chunks. Comment lines (`:` prefix)
//! are keep-alives and produce nothing.
//!
//! An `id:` line only becomes the resume cursor once its frame is dispatched.
//! The cursor then survives later frames and [`SseDecoder::reset`], so a
//! connection that drops mid-frame resumes from the last frame actually
//! delivered. An empty `id:` sets the cursor to the empty string.

use linked_core::event::DEFAULT_EVENT_NAME;

/// One dispatched event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseFrame {
    /// Last event id seen at dispatch time, if any.
    pub id: Option<String>,
    pub event: String,
    pub data: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseItem {
    Frame(SseFrame),
    /// The server asked for a new reconnect delay, in milliseconds.
    Retry(u64),
}

#[derive(Debug, Default)]
pub struct SseDecoder {
    buf: Vec<u8>,
    event: Option<String>,
    data: String,
    has_data: bool,
    /// Id of the frame being received, committed on dispatch.
    pending_id: Option<String>,
    last_id: Option<String>,
    skip_lf: bool,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from a known cursor, as after a resumed reconnect.
    pub fn with_last_id(last_id: Option<String>) -> Self {
        SseDecoder {
            last_id,
            ..Self::default()
        }
    }

    pub fn last_event_id(&self) -> Option<&str> {
        self.last_id.as_deref()
    }

    /// Drops any half-received frame, its id included. The cursor is kept.
    pub fn reset(&mut self) {
        self.buf.clear();
        self.pending_id = None;
        self.event = None;
        self.data.clear();
        self.has_data = false;
        self.skip_lf = false;
    }

    pub fn push(&mut self, chunk: &[u8]) -> Vec<SseItem> {
        let mut items = Vec::new();
        let mut bytes = chunk;

        if self.skip_lf && !bytes.is_empty() {
            if bytes[0] == b'\n' {
                bytes = &bytes[1..];
            }
            self.skip_lf = false;
        }
        self.buf.extend_from_slice(bytes);

        let mut start = 0;
        while let Some(offset) = self.buf[start..]
            .iter()
            .position(|b| *b == b'\n' || *b == b'\r')
        {
            let end = start + offset;
            let line = String::from_utf8_lossy(&self.buf[start..end]).into_owned();

            start = if self.buf[end] == b'\r' {
                match self.buf.get(end + 1) {
                    Some(b'\n') => end + 2,
                    Some(_) => end + 1,
                    None => {
                        self.skip_lf = true;
                        end + 1
                    }
                }
            } else {
                end + 1
            };

            self.process_line(&line, &mut items);
        }

        self.buf.drain(..start);
        items
    }

    fn process_line(&mut self, line: &str, items: &mut Vec<SseItem>) {
        if line.is_empty() {
            self.dispatch(items);
            return;
        }
        if line.starts_with(':') {
            return;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        match field {
            "event" => self.event = Some(value.to_string()),
            "data" => {
                self.data.push_str(value);
                self.data.push('\n');
                self.has_data = true;
            }
            "id" if !value.contains('\0') => self.pending_id = Some(value.to_string()),
            "retry" => {
                if let Ok(ms) = value.parse::<u64>() {
                    items.push(SseItem::Retry(ms));
                }
            }
            _ => {}
        }
    }

    fn dispatch(&mut self, items: &mut Vec<SseItem>) {
        // A frame without data still moves the cursor.
        if let Some(id) = self.pending_id.take() {
            self.last_id = Some(id);
        }
        let event = self.event.take();
        if !self.has_data {
            return;
        }

        let mut data = std::mem::take(&mut self.data);
        if data.ends_with('\n') {
            data.pop();
        }
        self.has_data = false;

        items.push(SseItem::Frame(SseFrame {
            id: self.last_id.clone(),
            event: event
                .filter(|e| !e.is_empty())
                .unwrap_or_else(|| DEFAULT_EVENT_NAME.to_string()),
            data,
        }));
    }
}
