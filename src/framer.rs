//! Incremental newline framing over a byte-chunk stream
//!
//! Chunk boundaries need not align with lines or with UTF-8 character
//! boundaries. A trailing partial character is held back until the next
//! chunk completes it; an invalid sequence decodes to U+FFFD.

/// Stateful decoder from byte chunks to complete text lines
#[derive(Debug, Default)]
pub struct LineFramer {
    /// Undecoded tail of the previous chunk (at most 3 bytes)
    pending: Vec<u8>,
    /// Decoded text not yet terminated by a newline
    carry: String,
}

impl LineFramer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk; returns the complete, non-blank lines it finished.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(chunk);
        // `carry` holds no newline before this point
        let scanned = self.carry.len();
        self.decode_pending();

        let Some(pos) = self.carry.get(scanned..).and_then(|text| text.rfind('\n')) else {
            return Vec::new();
        };
        let rest = self.carry.split_off(scanned + pos + 1);
        let complete = std::mem::replace(&mut self.carry, rest);
        complete
            .split('\n')
            .filter(|line| !line.trim().is_empty())
            .map(str::to_owned)
            .collect()
    }

    /// End of stream. Unterminated text is discarded; returns how many bytes
    /// (decoded text plus undecoded tail) were dropped.
    pub fn finish(&mut self) -> usize {
        let dropped = self.carry.len() + self.pending.len();
        self.carry.clear();
        self.pending.clear();
        dropped
    }

    /// Move every complete character from `pending` into `carry`.
    fn decode_pending(&mut self) {
        let mut input = self.pending.as_slice();
        loop {
            match std::str::from_utf8(input) {
                Ok(text) => {
                    self.carry.push_str(text);
                    input = &[];
                    break;
                }
                Err(e) => {
                    let (valid, after) = input.split_at(e.valid_up_to());
                    // valid_up_to() marks a verified UTF-8 prefix
                    self.carry.push_str(&String::from_utf8_lossy(valid));
                    match e.error_len() {
                        Some(bad) => {
                            self.carry.push(char::REPLACEMENT_CHARACTER);
                            input = after.get(bad..).unwrap_or_default();
                        }
                        // Incomplete sequence at the end: wait for more bytes
                        None => {
                            input = after;
                            break;
                        }
                    }
                }
            }
        }
        self.pending = input.to_vec();
    }
}
