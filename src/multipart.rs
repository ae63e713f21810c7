use crate::buffer::{BodyBuffer, SegmentKind};
use crate::constants;
use crate::constraints::Constraints;
use crate::helpers;
use crate::{Field, FormData};
use bytes::Bytes;
use memchr::memmem;

/// Decodes a fully buffered `multipart/form-data` body.
///
/// The body is split along `--{boundary}` delimiters. The preamble, the
/// epilogue after the closing delimiter and whitespace-only segments are
/// dropped; every other segment becomes one [`Field`], in body order.
///
/// Any malformed part fails the whole call with
/// [`Error::MalformedPart`](crate::Error::MalformedPart).
///
/// # Examples
///
/// ```
/// let body = "--X-BOUNDARY\r\nContent-Disposition: form-data; name=\"my_text_field\"\r\n\r\nabcd\r\n--X-BOUNDARY--\r\n";
/// let form = formpart::decode(body, "X-BOUNDARY").unwrap();
///
/// assert_eq!(form.len(), 1);
/// assert_eq!(form[0].name(), Some("my_text_field"));
/// assert_eq!(form[0].text(), "abcd");
/// ```
pub fn decode<B: Into<Bytes>>(body: B, boundary: &str) -> crate::Result<FormData> {
    decode_with_constraints(body, boundary, &Constraints::default())
}

/// Same as [`decode`], applying the given [`Constraints`] to the body and its
/// fields.
pub fn decode_with_constraints<B: Into<Bytes>>(
    body: B,
    boundary: &str,
    constraints: &Constraints,
) -> crate::Result<FormData> {
    let body = body.into();

    let whole_stream_limit = constraints.size_limit.whole_stream;
    if body.len() as u64 > whole_stream_limit {
        return Err(crate::Error::StreamSizeExceeded {
            limit: whole_stream_limit,
        });
    }

    let mut fields = Vec::new();

    for (kind, segment) in BodyBuffer::new(body, boundary) {
        if kind != SegmentKind::Part || segment.iter().all(u8::is_ascii_whitespace) {
            continue;
        }

        let field = decode_part(segment, fields.len(), constraints)?;
        trace!(
            "decoded field #{} name={:?} file_name={:?} size={}",
            field.index(),
            field.name(),
            field.file_name(),
            field.bytes().len()
        );

        fields.push(field);
    }

    Ok(FormData::from_fields(fields))
}

fn decode_part(segment: Bytes, idx: usize, constraints: &Constraints) -> crate::Result<Field> {
    let content_start = match split_point(&segment) {
        Some(split) => split,
        None => return Err(crate::Error::MalformedPart { segment }),
    };

    let mut content = segment.slice(content_start..);

    if !constraints.split_at_first_blank_line && memmem::find(&content, constants::CRLF_CRLF.as_bytes()).is_some() {
        return Err(crate::Error::MalformedPart { segment });
    }

    if content.ends_with(constants::CRLF.as_bytes()) {
        content.truncate(content.len() - constants::CRLF.len());
    }

    let part = match helpers::parse_header_block(&segment[..content_start]) {
        Some(part) => part,
        None => return Err(crate::Error::MalformedPart { segment }),
    };
    let field_name = part.disposition.field_name.as_deref();

    if !constraints.is_it_allowed(field_name) {
        return Err(crate::Error::UnknownField {
            field_name: field_name.map(str::to_owned),
        });
    }

    let field_size_limit = constraints.size_limit.extract_size_limit_for(field_name);
    if content.len() as u64 > field_size_limit {
        return Err(crate::Error::FieldSizeExceeded {
            limit: field_size_limit,
            field_name: field_name.map(str::to_owned),
        });
    }

    Ok(Field::from_part(part.headers, part.disposition, content, idx))
}

// Returns the start of the content, right after the first blank line.
fn split_point(segment: &[u8]) -> Option<usize> {
    memmem::find(segment, constants::CRLF_CRLF.as_bytes()).map(|idx| idx + constants::CRLF_CRLF.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SizeLimit;

    const TWO_FIELDS: &str = "--B\r\nContent-Disposition: form-data; name=\"foo\"\r\n\r\nbar\r\n--B\r\nContent-Disposition: form-data; name=\"upload\"; filename=\"a.txt\"\r\n\r\nhello\r\n--B--\r\n";

    #[test]
    fn test_decode_two_fields() {
        let form = decode(TWO_FIELDS, "B").unwrap();

        assert_eq!(form.len(), 2);
        assert_eq!(form[0].file_name(), None);
        assert_eq!(form[0].text(), "bar");
        assert_eq!(form[1].file_name(), Some("a.txt"));
        assert_eq!(form[1].bytes(), b"hello");
        assert_eq!(form[0].index(), 0);
        assert_eq!(form[1].index(), 1);
    }

    #[test]
    fn test_decode_multiline_content() {
        let body = "--B\r\nContent-Disposition: form-data; name=\"text\"\r\n\r\nline one\r\nline two\nline three\rend\r\n--B--\r\n";
        let form = decode(body, "B").unwrap();

        assert_eq!(form[0].text(), "line one\r\nline two\nline three\rend");
    }

    #[test]
    fn test_decode_empty_content() {
        let body = "--B\r\nContent-Disposition: form-data; name=\"empty\"\r\n\r\n\r\n--B--\r\n";
        let form = decode(body, "B").unwrap();

        assert_eq!(form.len(), 1);
        assert_eq!(form[0].text(), "");
    }

    #[test]
    fn test_decode_part_without_headers() {
        let err = decode("--B\r\n\r\nanonymous\r\n--B--\r\n", "B").unwrap_err();
        assert_eq!(err.malformed_segment().map(|s| &s[..]), Some(&b"\r\nanonymous\r\n"[..]));

        // An empty header block still needs its own blank line.
        let form = decode("--B\r\n\r\n\r\nanonymous\r\n--B--\r\n", "B").unwrap();
        assert_eq!(form.len(), 1);
        assert_eq!(form[0].name(), None);
        assert!(form[0].headers().is_empty());
        assert_eq!(form[0].text(), "anonymous");
    }

    #[test]
    fn test_decode_invalid_header_line() {
        let body = "--B\r\nContent-Disposition: form-data; name=\"a\"\r\nnot a header\r\n\r\nvalue\r\n--B--\r\n";
        let err = decode(body, "B").unwrap_err();

        assert!(err.malformed_segment().unwrap().ends_with(b"not a header\r\n\r\nvalue\r\n"));
    }

    #[test]
    fn test_decode_skips_whitespace_segments() {
        let body = "preamble\r\n--B\r\n  \r\n\t\r\n--B\r\nContent-Disposition: form-data; name=\"a\"\r\n\r\n1\r\n--B--\r\nepilogue";
        let form = decode(body, "B").unwrap();

        assert_eq!(form.len(), 1);
        assert_eq!(form[0].name(), Some("a"));
        assert_eq!(form[0].index(), 0);
    }

    #[test]
    fn test_decode_no_parts() {
        assert!(decode("--B--\r\n", "B").unwrap().is_empty());
        assert!(decode("", "B").unwrap().is_empty());
    }

    #[test]
    fn test_decode_missing_separator() {
        let body = "--B\r\nContent-Disposition: form-data; name=\"a\"\r\nno blank line\r\n--B--\r\n";
        let err = decode(body, "B").unwrap_err();

        assert_eq!(
            err.malformed_segment().map(|s| &s[..]),
            Some(&b"Content-Disposition: form-data; name=\"a\"\r\nno blank line\r\n"[..])
        );
    }

    #[test]
    fn test_decode_extra_blank_line() {
        let body = "--B\r\nContent-Disposition: form-data; name=\"a\"\r\n\r\nfirst\r\n\r\nsecond\r\n--B--\r\n";

        assert!(decode(body, "B").unwrap_err().malformed_segment().is_some());

        let constraints = Constraints::new().split_at_first_blank_line(true);
        let form = decode_with_constraints(body, "B", &constraints).unwrap();
        assert_eq!(form[0].text(), "first\r\n\r\nsecond");
    }

    #[test]
    fn test_decode_malformed_fails_whole_body() {
        let body = "--B\r\nContent-Disposition: form-data; name=\"ok\"\r\n\r\nfine\r\n--B\r\nbroken\r\n--B--\r\n";
        assert!(decode(body, "B").is_err());
    }

    #[test]
    fn test_decode_last_disposition_wins() {
        let body = "--B\r\nContent-Disposition: form-data; name=\"a\"; filename=\"one.txt\"\r\ncontent-disposition: form-data; name=\"a\"; filename=\"two.txt\"\r\n\r\nx\r\n--B--\r\n";
        let form = decode(body, "B").unwrap();

        assert_eq!(form[0].file_name(), Some("two.txt"));
    }

    #[test]
    fn test_decode_binary_file() {
        let mut body = b"--B\r\nContent-Disposition: form-data; name=\"f\"; filename=\"b.bin\"\r\n\r\n".to_vec();
        body.extend_from_slice(&[0x00, 0xff, 0xfe, 0x80, 0x0d, 0x0a, 0x2d, 0x2d]);
        body.extend_from_slice(b"\r\n--B--\r\n");

        let form = decode(body, "B").unwrap();
        assert_eq!(form[0].bytes(), &[0x00, 0xff, 0xfe, 0x80, 0x0d, 0x0a, 0x2d, 0x2d][..]);
    }

    #[test]
    fn test_decode_with_size_limits() {
        let constraints = Constraints::new().size_limit(SizeLimit::new().whole_stream(10));
        assert_eq!(
            decode_with_constraints(TWO_FIELDS, "B", &constraints),
            Err(crate::Error::StreamSizeExceeded { limit: 10 })
        );

        let constraints = Constraints::new().size_limit(SizeLimit::new().per_field(4));
        assert_eq!(
            decode_with_constraints(TWO_FIELDS, "B", &constraints),
            Err(crate::Error::FieldSizeExceeded {
                limit: 4,
                field_name: Some("upload".to_owned())
            })
        );

        let constraints = Constraints::new().size_limit(SizeLimit::new().per_field(4).for_field("upload", 5));
        assert_eq!(decode_with_constraints(TWO_FIELDS, "B", &constraints).unwrap().len(), 2);
    }

    #[test]
    fn test_decode_with_allowed_fields() {
        let constraints = Constraints::new().allowed_fields(vec!["foo"]);
        assert_eq!(
            decode_with_constraints(TWO_FIELDS, "B", &constraints),
            Err(crate::Error::UnknownField {
                field_name: Some("upload".to_owned())
            })
        );

        let constraints = Constraints::new().allowed_fields(vec!["foo", "upload"]);
        assert!(decode_with_constraints(TWO_FIELDS, "B", &constraints).is_ok());
    }
}
