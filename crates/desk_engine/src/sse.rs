use bytes::{Buf, BytesMut};

/// Incremental decoder for a `text/event-stream` body.
///
/// Chunk boundaries may fall anywhere, including inside a UTF-8 sequence or
/// between `\r` and `\n`. The `data:` fields of one event are joined with
/// `\n` and emitted when the blank line closes the event. Comments and other
/// fields are skipped. Lines without a field name are emitted as they arrive
/// so a plain line stream still works.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buf: BytesMut,
    data: Vec<String>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one chunk and returns the messages it completed.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buf.extend_from_slice(chunk);
        let mut messages = Vec::new();
        while let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
            let raw = self.buf.split_to(pos);
            self.buf.advance(1);
            self.line(&raw, &mut messages);
        }
        messages
    }

    /// Flushes whatever the stream left unterminated.
    pub fn finish(&mut self) -> Vec<String> {
        let mut messages = Vec::new();
        if !self.buf.is_empty() {
            let raw = self.buf.split();
            self.line(&raw, &mut messages);
        }
        self.dispatch(&mut messages);
        messages
    }

    fn line(&mut self, raw: &[u8], out: &mut Vec<String>) {
        let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
        let text = String::from_utf8_lossy(raw);
        if text.is_empty() {
            self.dispatch(out);
            return;
        }
        if text.starts_with(':') || is_control_field(&text) {
            return;
        }
        match text.strip_prefix("data:") {
            Some(data) => {
                let data = data.strip_prefix(' ').unwrap_or(data);
                self.data.push(data.to_string());
            }
            None => {
                self.dispatch(out);
                out.push(text.into_owned());
            }
        }
    }

    fn dispatch(&mut self, out: &mut Vec<String>) {
        if self.data.is_empty() {
            return;
        }
        let message = self.data.join("\n");
        self.data.clear();
        if !message.is_empty() {
            out.push(message);
        }
    }
}

fn is_control_field(text: &str) -> bool {
    ["event:", "id:", "retry:"]
        .iter()
        .any(|prefix| text.starts_with(prefix))
}
