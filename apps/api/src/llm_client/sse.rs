//! Incremental decoder for `text/event-stream` bodies.
//!
//! Network chunks do not align with events, so bytes are buffered until a blank
//! line closes an event. Only `data:` fields are kept; multiple data lines in one
//! event are joined with `\n`.

#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    data: Vec<String>,
}

impl SseDecoder {
    /// Feeds raw bytes and returns the payloads of every event completed by them.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line);
            let line = line.trim_end_matches(&['\n', '\r'][..]);
            if let Some(event) = self.accept_line(line) {
                events.push(event);
            }
        }
        events
    }

    /// Flushes a trailing event that was not terminated by a blank line.
    pub fn finish(mut self) -> Option<String> {
        if !self.buffer.is_empty() {
            let rest = String::from_utf8_lossy(&self.buffer).into_owned();
            self.buffer.clear();
            if let Some(event) = self.accept_line(rest.trim_end_matches(&['\n', '\r'][..])) {
                return Some(event);
            }
        }
        self.take_event()
    }

    fn accept_line(&mut self, line: &str) -> Option<String> {
        if line.is_empty() {
            return self.take_event();
        }
        if let Some(value) = line.strip_prefix("data:") {
            self.data.push(value.strip_prefix(' ').unwrap_or(value).to_string());
        }
        // event:, id:, retry: and comments carry nothing we use
        None
    }

    fn take_event(&mut self) -> Option<String> {
        if self.data.is_empty() {
            return None;
        }
        let event = self.data.join("\n");
        self.data.clear();
        Some(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_events_split_across_chunks() {
        let mut decoder = SseDecoder::default();
        assert!(decoder.push(b"data: {\"a\":").is_empty());
        assert!(decoder.push(b"1}\n").is_empty());
        let events = decoder.push(b"\ndata: {\"b\":2}\r\n\r\n");
        assert_eq!(events, vec!["{\"a\":1}".to_string(), "{\"b\":2}".to_string()]);
    }

    #[test]
    fn test_multiline_data_and_comments() {
        let mut decoder = SseDecoder::default();
        let events = decoder.push(b": keep-alive\nevent: message\ndata: one\ndata: two\n\n");
        assert_eq!(events, vec!["one\ntwo".to_string()]);
    }

    #[test]
    fn test_finish_flushes_unterminated_event() {
        let mut decoder = SseDecoder::default();
        assert!(decoder.push(b"data: tail").is_empty());
        assert_eq!(decoder.finish(), Some("tail".to_string()));
    }

    #[test]
    fn test_finish_on_empty_stream() {
        assert_eq!(SseDecoder::default().finish(), None);
    }
}
