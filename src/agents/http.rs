//! HTTP plumbing shared by the remote backends and the Gemini provider

use reqwest::Url;

/// Append path segments to a base URL, percent-encoding each segment
pub fn endpoint_url(base: &Url, segments: &[&str]) -> Result<Url, String> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| format!("{} cannot be used as a base URL", base))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Parse a configured base URL, rejecting URLs that cannot take a path
pub fn parse_base_url(raw: &str) -> Result<Url, String> {
    let url = Url::parse(raw).map_err(|e| format!("invalid URL {}: {}", raw, e))?;
    if url.cannot_be_a_base() {
        return Err(format!("{} cannot be used as a base URL", raw));
    }
    Ok(url)
}

/// Incremental decoder for `text/event-stream` bodies
///
/// Bytes are buffered until a full line is available, so multi-byte
/// characters split across network chunks decode correctly. Each event's
/// `data:` lines are joined with `\n` and yielded when the blank line that
/// terminates the event arrives.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    data: Vec<String>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk of the body; returns the data payloads completed by it
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);

        let mut payloads = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line);
            let line = line.trim_end_matches(&['\n', '\r'][..]);

            if line.is_empty() {
                if let Some(payload) = self.take_event() {
                    payloads.push(payload);
                }
            } else if let Some(data) = line.strip_prefix("data:") {
                self.data.push(data.strip_prefix(' ').unwrap_or(data).to_string());
            }
            // Comments, event names and ids are not used by either producer
        }
        payloads
    }

    /// Flush an event left unterminated at end of body
    pub fn finish(mut self) -> Option<String> {
        if !self.buffer.is_empty() {
            let rest = std::mem::take(&mut self.buffer);
            let line = String::from_utf8_lossy(&rest);
            let line = line.trim_end_matches(&['\n', '\r'][..]);
            if let Some(data) = line.strip_prefix("data:") {
                self.data.push(data.strip_prefix(' ').unwrap_or(data).to_string());
            }
        }
        self.take_event()
    }

    fn take_event(&mut self) -> Option<String> {
        if self.data.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.data).join("\n"))
        }
    }
}
