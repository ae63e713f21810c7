use crate::constants;
use crate::content_disposition::ContentDisposition;
use http::header::{HeaderMap, HeaderName, HeaderValue};
use httparse::Header;
use std::convert::TryFrom;

/// Headers of one part, plus the disposition parameters recovered from them.
#[derive(Debug, Default)]
pub(crate) struct PartHeaders {
    pub(crate) headers: HeaderMap,
    pub(crate) disposition: ContentDisposition,
}

/// Parses a raw header block, including the blank line that terminates it.
///
/// Returns `None` when `httparse` rejects the block, when it holds more than
/// [`MAX_HEADERS`](constants::MAX_HEADERS) lines or when a header can not be
/// represented in a [`HeaderMap`]. The caller turns that into a malformed
/// part.
pub(crate) fn parse_header_block(block: &[u8]) -> Option<PartHeaders> {
    let mut headers = [httparse::EMPTY_HEADER; constants::MAX_HEADERS];

    let raw_headers = match httparse::parse_headers(block, &mut headers) {
        Ok(httparse::Status::Complete((_, raw_headers))) => raw_headers,
        Ok(httparse::Status::Partial) => {
            trace!("incomplete part header block: {:?}", String::from_utf8_lossy(block));
            return None;
        }
        Err(_err) => {
            trace!("failed to read part headers: {}", _err);
            return None;
        }
    };

    Some(PartHeaders {
        headers: convert_raw_headers_to_header_map(raw_headers)?,
        disposition: scan_content_disposition(raw_headers),
    })
}

fn convert_raw_headers_to_header_map(raw_headers: &[Header]) -> Option<HeaderMap> {
    let mut headers = HeaderMap::with_capacity(raw_headers.len());

    for raw_header in raw_headers {
        let name = HeaderName::try_from(raw_header.name).ok()?;
        let value = HeaderValue::try_from(raw_header.value).ok()?;

        // Repeated headers are all kept, in order.
        headers.append(name, value);
    }

    Some(headers)
}

// Every `Content-Disposition` line is scanned in order; a later line
// overrides the `name` or `filename` found on an earlier one.
fn scan_content_disposition(raw_headers: &[Header]) -> ContentDisposition {
    let mut disposition = ContentDisposition::default();

    for raw_header in raw_headers {
        if !raw_header.name.eq_ignore_ascii_case(constants::CONTENT_DISPOSITION) {
            continue;
        }

        let cd = ContentDisposition::parse(&String::from_utf8_lossy(raw_header.value));

        if cd.field_name.is_some() {
            disposition.field_name = cd.field_name;
        }
        if cd.file_name.is_some() {
            disposition.file_name = cd.file_name;
        }
    }

    disposition
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::header;

    #[test]
    fn test_parse_header_block() {
        let block = b"Content-Disposition: form-data; name=\"upload\"; filename=\"a.txt\"\r\nContent-Type: text/plain\r\n\r\n";
        let part = parse_header_block(block).unwrap();

        assert_eq!(part.disposition.field_name.as_deref(), Some("upload"));
        assert_eq!(part.disposition.file_name.as_deref(), Some("a.txt"));
        assert_eq!(part.headers.get(header::CONTENT_TYPE).unwrap(), "text/plain");
        assert_eq!(part.headers.len(), 2);
    }

    #[test]
    fn test_parse_header_block_case_insensitive_last_wins() {
        let block = b"content-DISPOSITION: form-data; name=\"a\"; filename=\"first.txt\"\r\nX-Other: 1\r\nCONTENT-DISPOSITION: form-data; filename=\"second.txt\"\r\n\r\n";
        let part = parse_header_block(block).unwrap();

        assert_eq!(part.disposition.field_name.as_deref(), Some("a"));
        assert_eq!(part.disposition.file_name.as_deref(), Some("second.txt"));
        assert_eq!(part.headers.get_all(header::CONTENT_DISPOSITION).iter().count(), 2);
    }

    #[test]
    fn test_parse_header_block_empty() {
        let part = parse_header_block(b"\r\n").unwrap();

        assert!(part.headers.is_empty());
        assert_eq!(part.disposition, ContentDisposition::default());
    }

    #[test]
    fn test_parse_header_block_rejects_garbage() {
        assert!(parse_header_block(b"not a header\r\n\r\n").is_none());
        assert!(parse_header_block(b"bad name: x\r\n\r\n").is_none());
        assert!(parse_header_block(b"X-Ok: yes\r\n").is_none());

        let mut block = Vec::new();
        for idx in 0..=constants::MAX_HEADERS {
            block.extend_from_slice(format!("X-Header-{}: {}\r\n", idx, idx).as_bytes());
        }
        block.extend_from_slice(b"\r\n");
        assert!(parse_header_block(&block).is_none());
    }
}
