use crate::constants;
use bytes::Bytes;
use memchr::memmem::Finder;

/// Splits a fully buffered body along its boundary delimiters.
///
/// A delimiter is `--{boundary}`, optionally followed by the closing `--`,
/// followed by CRLF or the end of the body. Any other occurrence of
/// `--{boundary}` is part of the surrounding segment.
pub(crate) struct BodyBuffer {
    buf: Bytes,
    pos: usize,
    delimiter: Finder<'static>,
    seen_delimiter: bool,
    closed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SegmentKind {
    Preamble,
    Part,
    Epilogue,
}

impl BodyBuffer {
    pub fn new(buf: Bytes, boundary: &str) -> BodyBuffer {
        let delimiter = format!("{}{}", constants::BOUNDARY_EXT, boundary);

        BodyBuffer {
            buf,
            pos: 0,
            delimiter: Finder::new(delimiter.as_bytes()).into_owned(),
            seen_delimiter: false,
            closed: false,
        }
    }

    /// Yields the next segment with its kind, or `None` once the whole
    /// body is consumed.
    pub fn next_segment(&mut self) -> Option<(SegmentKind, Bytes)> {
        if self.pos > self.buf.len() {
            return None;
        }

        if self.closed {
            let epilogue = self.buf.slice(self.pos..);
            self.pos = self.buf.len() + 1;
            return Some((SegmentKind::Epilogue, epilogue));
        }

        let kind = if self.seen_delimiter {
            SegmentKind::Part
        } else {
            SegmentKind::Preamble
        };

        let start = self.pos;
        let mut search_from = start;

        while let Some(rel_idx) = self.delimiter.find(&self.buf[search_from..]) {
            let idx = search_from + rel_idx;

            if let Some((end, closing)) = self.match_delimiter_tail(idx + self.delimiter.needle().len()) {
                let segment = self.buf.slice(start..idx);
                self.pos = end;
                self.seen_delimiter = true;
                self.closed = closing;
                return Some((kind, segment));
            }

            search_from = idx + 1;
        }

        let segment = self.buf.slice(start..);
        self.pos = self.buf.len() + 1;

        // A body that never closes keeps its last segment as a part.
        Some((kind, segment))
    }

    // Returns the position after the delimiter and whether it was the
    // closing one.
    fn match_delimiter_tail(&self, mut idx: usize) -> Option<(usize, bool)> {
        let rest = &self.buf[idx..];
        let closing = rest.starts_with(constants::BOUNDARY_EXT.as_bytes());

        if closing {
            idx += constants::BOUNDARY_EXT.len();
        }

        let rest = &self.buf[idx..];

        if rest.starts_with(constants::CRLF.as_bytes()) {
            Some((idx + constants::CRLF.len(), closing))
        } else if rest.is_empty() {
            Some((idx, closing))
        } else {
            None
        }
    }
}

impl Iterator for BodyBuffer {
    type Item = (SegmentKind, Bytes);

    fn next(&mut self) -> Option<Self::Item> {
        self.next_segment()
    }
}
