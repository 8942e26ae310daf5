//! Server-Sent Events (SSE) stream decoding.
//!
//! The streaming endpoints deliver events as lines bounded by blank-line
//! separators:
//!
//! ```text
//! data: {"key": "value"}
//!
//! data: {"another": "event"}
//!
//! data: [DONE]
//! ```
//!
//! [`SseDecoder`] turns raw bytes off the wire into data payloads, one per
//! event. The `[DONE]` sentinel ends the stream permanently.

/// Parse an SSE line to extract the data portion.
///
/// SSE lines are in the format: `data: <content>`
///
/// # Example
/// ```
/// use vultr_inference::sse::parse_sse_line;
///
/// let line = "data: {\"key\": \"value\"}";
/// assert_eq!(parse_sse_line(line), Some("{\"key\": \"value\"}"));
///
/// let line = "invalid";
/// assert_eq!(parse_sse_line(line), None);
/// ```
pub fn parse_sse_line(line: &str) -> Option<&str> {
    line.strip_prefix("data: ").map(|s| s.trim())
}

/// Check if an SSE data line indicates the stream is done.
///
/// # Example
/// ```
/// use vultr_inference::sse::is_done_marker;
///
/// assert!(is_done_marker("[DONE]"));
/// assert!(!is_done_marker("{\"data\": \"value\"}"));
/// ```
pub fn is_done_marker(data: &str) -> bool {
    data == "[DONE]"
}

/// Incremental decoder for an SSE byte stream.
///
/// Bytes are fed in as they arrive; complete data payloads come out one at
/// a time via [`next_payload`](Self::next_payload). Blank lines separate
/// events and are skipped, as is any non-blank line without the `data: `
/// prefix (provider comments and heartbeats). Once the `[DONE]` sentinel
/// is observed the decoder is exhausted for good: no further payloads are
/// produced, regardless of what else is buffered.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    done: bool,
}

impl SseDecoder {
    /// Create an empty decoder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the `[DONE]` sentinel has been observed.
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Append raw bytes received from the transport.
    ///
    /// Chunk boundaries carry no meaning; a line or a multi-byte character
    /// may be split across any number of chunks.
    pub fn feed(&mut self, chunk: &[u8]) {
        if self.done {
            return;
        }
        self.buffer.extend_from_slice(chunk);
    }

    /// Pop the next complete data payload, if one is buffered.
    ///
    /// Returns `None` when more bytes are needed or the stream is done;
    /// check [`is_done`](Self::is_done) to distinguish the two.
    pub fn next_payload(&mut self) -> Option<String> {
        while !self.done {
            let pos = self.buffer.iter().position(|&b| b == b'\n')?;
            let raw: Vec<u8> = self.buffer.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&raw);
            let line = line.trim();

            if line.is_empty() {
                continue;
            }

            let Some(data) = parse_sse_line(line) else {
                continue;
            };

            if is_done_marker(data) {
                self.done = true;
                break;
            }

            return Some(data.to_string());
        }
        None
    }

    /// Flush a trailing unterminated line once the transport reports EOF.
    pub fn finish(&mut self) -> Option<String> {
        if self.done || self.buffer.is_empty() {
            return None;
        }

        let tail = std::mem::take(&mut self.buffer);
        let line = String::from_utf8_lossy(&tail);
        let line = line.trim();

        let data = parse_sse_line(line)?;
        if is_done_marker(data) {
            self.done = true;
            return None;
        }

        Some(data.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sse_line() {
        assert_eq!(parse_sse_line("data: hello"), Some("hello"));
        assert_eq!(
            parse_sse_line("data: {\"key\": \"value\"}"),
            Some("{\"key\": \"value\"}")
        );
        assert_eq!(parse_sse_line("data:   spaces  "), Some("spaces"));
        assert_eq!(parse_sse_line("invalid"), None);
        assert_eq!(parse_sse_line(""), None);
    }

    #[test]
    fn test_is_done_marker() {
        assert!(is_done_marker("[DONE]"));
        assert!(!is_done_marker(""));
        assert!(!is_done_marker("data"));
        assert!(!is_done_marker("{\"key\": \"value\"}"));
    }

    #[test]
    fn test_single_event() {
        let mut decoder = SseDecoder::new();
        decoder.feed(b"data: {\"a\":1}\n\n");

        assert_eq!(decoder.next_payload().as_deref(), Some("{\"a\":1}"));
        assert_eq!(decoder.next_payload(), None);
        assert!(!decoder.is_done());
    }

    #[test]
    fn test_done_marker_exhausts_decoder() {
        let mut decoder = SseDecoder::new();
        decoder.feed(b"data: {\"a\":1}\n\ndata: [DONE]\n\n");

        assert_eq!(decoder.next_payload().as_deref(), Some("{\"a\":1}"));
        assert_eq!(decoder.next_payload(), None);
        assert!(decoder.is_done());
    }

    #[test]
    fn test_no_payloads_after_done() {
        let mut decoder = SseDecoder::new();
        decoder.feed(b"data: [DONE]\n\ndata: {\"late\":true}\n\n");

        assert_eq!(decoder.next_payload(), None);
        assert!(decoder.is_done());

        // Later feeds are ignored too.
        decoder.feed(b"data: {\"later\":true}\n\n");
        assert_eq!(decoder.next_payload(), None);
    }

    #[test]
    fn test_extra_blank_lines_do_not_change_event_count() {
        let mut decoder = SseDecoder::new();
        decoder.feed(b"\n\ndata: {\"a\":1}\n\n\n\ndata: [DONE]\n\n");

        assert_eq!(decoder.next_payload().as_deref(), Some("{\"a\":1}"));
        assert_eq!(decoder.next_payload(), None);
        assert!(decoder.is_done());
    }

    #[test]
    fn test_non_data_lines_ignored() {
        let mut decoder = SseDecoder::new();
        decoder.feed(b": heartbeat\nevent: ping\ndata: {\"a\":1}\n\ndata: [DONE]\n\n");

        assert_eq!(decoder.next_payload().as_deref(), Some("{\"a\":1}"));
        assert_eq!(decoder.next_payload(), None);
        assert!(decoder.is_done());
    }

    #[test]
    fn test_line_split_across_feeds() {
        let mut decoder = SseDecoder::new();

        decoder.feed(b"data: {\"con");
        assert_eq!(decoder.next_payload(), None);

        decoder.feed(b"tent\":\"hi\"}\n");
        assert_eq!(decoder.next_payload().as_deref(), Some("{\"content\":\"hi\"}"));
    }

    #[test]
    fn test_multibyte_char_split_across_feeds() {
        let mut decoder = SseDecoder::new();

        // "é" is 0xC3 0xA9; split it between two chunks.
        decoder.feed(b"data: {\"content\":\"\xc3");
        assert_eq!(decoder.next_payload(), None);

        decoder.feed(b"\xa9\"}\n");
        assert_eq!(
            decoder.next_payload().as_deref(),
            Some("{\"content\":\"\u{e9}\"}")
        );
    }

    #[test]
    fn test_crlf_line_endings() {
        let mut decoder = SseDecoder::new();
        decoder.feed(b"data: {\"a\":1}\r\n\r\ndata: [DONE]\r\n\r\n");

        assert_eq!(decoder.next_payload().as_deref(), Some("{\"a\":1}"));
        assert_eq!(decoder.next_payload(), None);
        assert!(decoder.is_done());
    }

    #[test]
    fn test_finish_flushes_trailing_line() {
        let mut decoder = SseDecoder::new();
        decoder.feed(b"data: {\"a\":1}");

        assert_eq!(decoder.next_payload(), None);
        assert_eq!(decoder.finish().as_deref(), Some("{\"a\":1}"));
        assert_eq!(decoder.finish(), None);
    }

    #[test]
    fn test_finish_with_trailing_done_marker() {
        let mut decoder = SseDecoder::new();
        decoder.feed(b"data: [DONE]");

        assert_eq!(decoder.finish(), None);
        assert!(decoder.is_done());
    }
}
