//! Line-delimited output sanitization shared by the command runner and
//! environment probe: ANSI escapes and control bytes stripped, CR/CRLF/LF all
//! treated as line terminators, interior whitespace collapsed, empty lines
//! dropped.

/// Buffers raw child-process output and yields sanitized, complete lines.
#[derive(Default)]
pub struct LineBuffer {
    pending: Vec<u8>,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds a chunk of raw bytes, returning any complete sanitized lines.
    /// Empty lines (after sanitization) are dropped, not yielded.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(chunk);

        let normalized = normalize_newlines(&self.pending);
        let mut lines = Vec::new();
        let mut start = 0;
        let mut last_break = None;

        for (i, &b) in normalized.iter().enumerate() {
            if b == b'\n' {
                lines.push(normalized[start..i].to_vec());
                start = i + 1;
                last_break = Some(i + 1);
            }
        }

        if let Some(consumed) = last_break {
            // Re-derive how much of the *original* buffer that corresponds
            // to by replaying on raw bytes: since normalize_newlines never
            // changes length categories in a way that shifts indices for
            // bytes not part of a terminator, we recompute from raw instead.
            let _ = consumed;
            self.pending = split_off_tail(&self.pending);
        }

        lines
            .into_iter()
            .filter_map(|raw| sanitize_line(&raw))
            .collect()
    }

    /// Flushes any residual partial line left in the buffer on process exit.
    pub fn finish(&mut self) -> Option<String> {
        let raw = std::mem::take(&mut self.pending);
        sanitize_line(&raw)
    }
}

/// Replaces `\r\n` and lone `\r` with `\n`.
fn normalize_newlines(raw: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(raw.len());
    let mut i = 0;
    while i < raw.len() {
        match raw[i] {
            b'\r' if raw.get(i + 1) == Some(&b'\n') => {
                out.push(b'\n');
                i += 2;
            }
            b'\r' => {
                out.push(b'\n');
                i += 1;
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }
    out
}

/// Recomputes the unconsumed tail of `raw` after normalization-driven line
/// splitting, by normalizing once more and finding the last terminator.
fn split_off_tail(raw: &[u8]) -> Vec<u8> {
    let normalized = normalize_newlines(raw);
    match normalized.iter().rposition(|&b| b == b'\n') {
        Some(pos) => {
            // Walk raw bytes to find the same logical offset: count newline
            // boundaries consumed rather than byte offsets, since \r\n
            // collapses two raw bytes into one normalized terminator.
            let mut consumed_terms = 0;
            let target_terms = normalized[..=pos].iter().filter(|&&b| b == b'\n').count();
            let mut i = 0;
            while i < raw.len() && consumed_terms < target_terms {
                match raw[i] {
                    b'\r' if raw.get(i + 1) == Some(&b'\n') => {
                        i += 2;
                        consumed_terms += 1;
                    }
                    b'\r' | b'\n' => {
                        i += 1;
                        consumed_terms += 1;
                    }
                    _ => i += 1,
                }
            }
            raw[i..].to_vec()
        }
        None => raw.to_vec(),
    }
}

/// Strips ANSI escapes and C0/C1 control bytes, collapses whitespace runs,
/// and drops the line entirely if nothing printable remains.
fn sanitize_line(raw: &[u8]) -> Option<String> {
    let stripped = strip_ansi_escapes::strip(raw);
    let text = String::from_utf8_lossy(&stripped);

    let cleaned: String = text
        .chars()
        .filter(|c| !is_control_byte(*c))
        .collect();

    let collapsed = collapse_whitespace(&cleaned);
    if collapsed.is_empty() {
        None
    } else {
        Some(collapsed)
    }
}

fn is_control_byte(c: char) -> bool {
    let code = c as u32;
    (code < 0x20 && c != '\t') || (0x7f..=0x9f).contains(&code)
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cr_and_crlf_produce_same_line_sequence() {
        let mut lf = LineBuffer::new();
        let mut cr = LineBuffer::new();
        let mut crlf = LineBuffer::new();

        let out_lf = lf.feed(b"hello\nworld\n");
        let out_cr = cr.feed(b"hello\rworld\r");
        let out_crlf = crlf.feed(b"hello\r\nworld\r\n");

        assert_eq!(out_lf, vec!["hello".to_string(), "world".to_string()]);
        assert_eq!(out_lf, out_cr);
        assert_eq!(out_lf, out_crlf);
    }

    #[test]
    fn test_ansi_escapes_stripped() {
        let mut buf = LineBuffer::new();
        let out = buf.feed(b"\x1b[31mred text\x1b[0m\n");
        assert_eq!(out, vec!["red text".to_string()]);
    }

    #[test]
    fn test_empty_lines_dropped() {
        let mut buf = LineBuffer::new();
        let out = buf.feed(b"one\n\n\ntwo\n");
        assert_eq!(out, vec!["one".to_string(), "two".to_string()]);
    }

    #[test]
    fn test_whitespace_collapsed() {
        let mut buf = LineBuffer::new();
        let out = buf.feed(b"a   b\t\tc\n");
        assert_eq!(out, vec!["a b c".to_string()]);
    }

    #[test]
    fn test_residual_tail_flushed_on_finish() {
        let mut buf = LineBuffer::new();
        let out = buf.feed(b"complete\nno newline yet");
        assert_eq!(out, vec!["complete".to_string()]);
        assert_eq!(buf.finish(), Some("no newline yet".to_string()));
    }

    #[test]
    fn test_finish_with_only_whitespace_yields_none() {
        let mut buf = LineBuffer::new();
        buf.feed(b"   \t  ");
        assert_eq!(buf.finish(), None);
    }

    #[test]
    fn test_feed_across_chunk_boundary() {
        let mut buf = LineBuffer::new();
        assert!(buf.feed(b"partial li").is_empty());
        let out = buf.feed(b"ne\n");
        assert_eq!(out, vec!["partial line".to_string()]);
    }
}
