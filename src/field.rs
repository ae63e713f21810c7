use crate::constants;
use crate::content_disposition::ContentDisposition;
use bytes::Bytes;
use encoding_rs::{Encoding, UTF_8};
use http::header::{self, HeaderMap, HeaderValue};
#[cfg(feature = "json")]
use serde::de::DeserializeOwned;
use std::convert::TryFrom;

/// A single decoded part of a `multipart/form-data` body.
///
/// A part whose `Content-Disposition` declares a `filename` parameter is a
/// [`Field::File`] and keeps its content as raw bytes. Every other part is a
/// [`Field::Value`] whose content was decoded to text, using the `charset`
/// of the part's `Content-Type` (UTF-8 by default).
///
/// # Examples
///
/// ```
/// use formpart::Field;
///
/// let body = "--X-BOUNDARY\r\nContent-Disposition: form-data; name=\"upload\"; filename=\"a.txt\"\r\n\r\nhello\r\n--X-BOUNDARY--\r\n";
/// let form = formpart::decode(body, "X-BOUNDARY").unwrap();
///
/// match &form[0] {
///     Field::File(file) => {
///         assert_eq!(file.file_name(), "a.txt");
///         assert_eq!(file.data(), "hello");
///     }
///     Field::Value(_) => unreachable!(),
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Field {
    /// A plain form value.
    Value(ValueField),
    /// A file upload.
    File(FileField),
}

/// A form value decoded to text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueField {
    meta: FieldMeta,
    value: String,
}

/// A file upload with its raw content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileField {
    meta: FieldMeta,
    file_name: String,
    data: Bytes,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct FieldMeta {
    name: Option<String>,
    headers: HeaderMap,
    idx: usize,
}

impl Field {
    pub(crate) fn from_part(
        headers: HeaderMap,
        disposition: ContentDisposition,
        content: Bytes,
        idx: usize,
    ) -> Field {
        let meta = FieldMeta {
            name: disposition.field_name,
            headers,
            idx,
        };

        match disposition.file_name {
            Some(file_name) => Field::File(FileField {
                meta,
                file_name,
                data: content,
            }),
            None => {
                let value = decode_text(&content, parse_content_type(&meta.headers).as_ref(), constants::DEFAULT_CHARSET);
                Field::Value(ValueField { meta, value })
            }
        }
    }

    /// Builds a plain value field with a generated `Content-Disposition`
    /// header, e.g. for encoding a request body with
    /// [`FormData::encode`](crate::FormData::encode).
    ///
    /// Fails with [`Error::InvalidHeaderValue`](crate::Error::InvalidHeaderValue)
    /// when the name can not be written in a header, e.g. it holds a line
    /// break.
    pub fn value<N: Into<String>, V: Into<String>>(name: N, value: V) -> crate::Result<Field> {
        let name = name.into();
        let mut headers = HeaderMap::new();
        insert_content_disposition(&mut headers, Some(&name), None)?;

        Ok(Field::Value(ValueField {
            meta: FieldMeta {
                name: Some(name),
                headers,
                idx: 0,
            },
            value: value.into(),
        }))
    }

    /// Builds a file field with a generated `Content-Disposition` header and,
    /// when given, a `Content-Type` header.
    ///
    /// Fails like [`value`](Field::value) when the name or the file name can
    /// not be written in a header.
    pub fn file<N, F, D>(name: N, file_name: F, content_type: Option<mime::Mime>, data: D) -> crate::Result<Field>
    where
        N: Into<String>,
        F: Into<String>,
        D: Into<Bytes>,
    {
        let name = name.into();
        let file_name = file_name.into();
        let mut headers = HeaderMap::new();
        insert_content_disposition(&mut headers, Some(&name), Some(&file_name))?;

        if let Some(mime) = content_type {
            headers.insert(header::CONTENT_TYPE, to_header_value(mime.to_string())?);
        }

        Ok(Field::File(FileField {
            meta: FieldMeta {
                name: Some(name),
                headers,
                idx: 0,
            },
            file_name,
            data: data.into(),
        }))
    }

    fn meta(&self) -> &FieldMeta {
        match self {
            Field::Value(field) => &field.meta,
            Field::File(field) => &field.meta,
        }
    }

    pub(crate) fn set_index(&mut self, idx: usize) {
        match self {
            Field::Value(field) => field.meta.idx = idx,
            Field::File(field) => field.meta.idx = idx,
        }
    }

    /// The field name found in the `Content-Disposition` header.
    pub fn name(&self) -> Option<&str> {
        self.meta().name.as_deref()
    }

    /// The file name found in the `Content-Disposition` header. Always `None`
    /// for a [`Field::Value`].
    pub fn file_name(&self) -> Option<&str> {
        match self {
            Field::File(field) => Some(field.file_name()),
            Field::Value(_) => None,
        }
    }

    /// Returns `true` if the part declared a file name.
    pub fn is_file(&self) -> bool {
        matches!(self, Field::File(_))
    }

    /// Get the content type of the field, if the part has a valid
    /// `Content-Type` header.
    pub fn content_type(&self) -> Option<mime::Mime> {
        parse_content_type(self.headers())
    }

    /// Get a map of the headers of the part. Header lines which could not
    /// be parsed are not present.
    pub fn headers(&self) -> &HeaderMap {
        &self.meta().headers
    }

    /// Get the index of this field in order they appeared in the body.
    pub fn index(&self) -> usize {
        self.meta().idx
    }

    /// The content of the field as bytes. For a [`Field::Value`] these are
    /// the UTF-8 bytes of the decoded text.
    pub fn bytes(&self) -> &[u8] {
        match self {
            Field::Value(field) => field.value.as_bytes(),
            Field::File(field) => &field.data,
        }
    }

    /// The content of the field as text.
    ///
    /// File content is decoded with the `charset` of its `Content-Type`,
    /// falling back to UTF-8. Invalid sequences are replaced.
    pub fn text(&self) -> String {
        self.text_with_charset(constants::DEFAULT_CHARSET)
    }

    /// Same as [`text`](Field::text), with a different fallback encoding for
    /// file content that has no `charset` parameter.
    pub fn text_with_charset(&self, default_encoding: &str) -> String {
        match self {
            Field::Value(field) => field.value.clone(),
            Field::File(field) => decode_text(&field.data, self.content_type().as_ref(), default_encoding),
        }
    }

    /// Deserializes the content of the field as JSON.
    ///
    /// # Optional
    ///
    /// This requires the optional `json` feature to be enabled.
    #[cfg(feature = "json")]
    #[cfg_attr(nightly, doc(cfg(feature = "json")))]
    pub fn json<T: DeserializeOwned>(&self) -> crate::Result<T> {
        serde_json::from_slice(self.bytes()).map_err(crate::Error::DecodeJson)
    }
}

impl ValueField {
    /// The field name found in the `Content-Disposition` header.
    pub fn name(&self) -> Option<&str> {
        self.meta.name.as_deref()
    }

    /// The decoded text of the field.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Get a map of the headers of the part.
    pub fn headers(&self) -> &HeaderMap {
        &self.meta.headers
    }

    /// Consumes the field, returning its text.
    pub fn into_value(self) -> String {
        self.value
    }
}

impl FileField {
    /// The field name found in the `Content-Disposition` header.
    pub fn name(&self) -> Option<&str> {
        self.meta.name.as_deref()
    }

    /// The file name found in the `Content-Disposition` header.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// The raw content of the upload.
    pub fn data(&self) -> &Bytes {
        &self.data
    }

    /// Get a map of the headers of the part.
    pub fn headers(&self) -> &HeaderMap {
        &self.meta.headers
    }

    /// Consumes the field, returning its raw content.
    pub fn into_data(self) -> Bytes {
        self.data
    }
}

fn insert_content_disposition(
    headers: &mut HeaderMap,
    name: Option<&str>,
    file_name: Option<&str>,
) -> crate::Result<()> {
    let value = to_header_value(ContentDisposition::render(name, file_name))?;
    headers.insert(header::CONTENT_DISPOSITION, value);
    Ok(())
}

fn to_header_value(value: String) -> crate::Result<HeaderValue> {
    match HeaderValue::try_from(value.as_str()) {
        Ok(header_value) => Ok(header_value),
        Err(err) => Err(crate::Error::InvalidHeaderValue {
            value,
            cause: err.into(),
        }),
    }
}

fn parse_content_type(headers: &HeaderMap) -> Option<mime::Mime> {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|val| val.to_str().ok())
        .and_then(|val| val.parse::<mime::Mime>().ok())
}

fn decode_text(bytes: &[u8], content_type: Option<&mime::Mime>, default_encoding: &str) -> String {
    let encoding_name = content_type
        .and_then(|mime| mime.get_param(mime::CHARSET))
        .map(|charset| charset.as_str())
        .unwrap_or(default_encoding);

    let encoding = Encoding::for_label(encoding_name.as_bytes()).unwrap_or(UTF_8);

    let (text, _, _) = encoding.decode(bytes);
    text.into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn part(headers: &[u8], content: &'static [u8]) -> Field {
        let mut block = headers.to_vec();
        block.extend_from_slice(constants::CRLF_CRLF.as_bytes());

        let parsed = crate::helpers::parse_header_block(&block).unwrap();
        Field::from_part(parsed.headers, parsed.disposition, Bytes::from_static(content), 0)
    }

    #[test]
    fn test_value_field() {
        let field = part(b"Content-Disposition: form-data; name=\"foo\"", b"bar");

        assert!(!field.is_file());
        assert_eq!(field.name(), Some("foo"));
        assert_eq!(field.file_name(), None);
        assert_eq!(field.content_type(), None);
        assert_eq!(field.text(), "bar");
        assert_eq!(field.bytes(), b"bar");
    }

    #[test]
    fn test_value_field_charset() {
        let field = part(
            b"Content-Disposition: form-data; name=\"foo\"\r\nContent-Type: text/plain; charset=iso-8859-1",
            b"caf\xe9",
        );

        match field {
            Field::Value(value) => assert_eq!(value.value(), "café"),
            Field::File(_) => panic!("expected a value field"),
        }
    }

    #[test]
    fn test_file_field() {
        let field = part(
            b"Content-Disposition: form-data; name=\"upload\"; filename=\"a.bin\"\r\nContent-Type: application/octet-stream",
            b"\x00\xff\r\n\x01",
        );

        assert!(field.is_file());
        assert_eq!(field.name(), Some("upload"));
        assert_eq!(field.file_name(), Some("a.bin"));
        assert_eq!(field.content_type(), Some(mime::APPLICATION_OCTET_STREAM));
        assert_eq!(field.bytes(), b"\x00\xff\r\n\x01");
    }

    #[test]
    fn test_file_text_uses_default_charset() {
        let field = part(b"Content-Disposition: form-data; name=\"f\"; filename=\"x.txt\"", b"caf\xe9");

        assert_eq!(field.text(), "caf\u{FFFD}");
        assert_eq!(field.text_with_charset("windows-1252"), "café");
    }

    #[test]
    fn test_builders() {
        let field = Field::value("foo", "bar").unwrap();
        assert_eq!(field.name(), Some("foo"));
        assert_eq!(
            field.headers().get(header::CONTENT_DISPOSITION).unwrap(),
            "form-data; name=\"foo\""
        );

        let field = Field::file("upload", "a.txt", Some(mime::TEXT_PLAIN), "hello").unwrap();
        assert_eq!(field.file_name(), Some("a.txt"));
        assert_eq!(field.content_type(), Some(mime::TEXT_PLAIN));
        assert_eq!(field.text(), "hello");
    }

    #[test]
    fn test_builders_reject_line_breaks() {
        match Field::value("bad\nname", "v") {
            Err(crate::Error::InvalidHeaderValue { value, .. }) => {
                assert_eq!(value, "form-data; name=\"bad\nname\"");
            }
            other => panic!("expected an invalid header value, got {:?}", other),
        }

        assert!(Field::file("upload", "a\r\n.txt", None, "x").is_err());
        assert!(Field::file("up\x00load", "a.txt", None, "x").is_err());
    }

    #[cfg(feature = "json")]
    #[test]
    fn test_json() {
        #[derive(serde::Deserialize, Debug, PartialEq)]
        struct Payload {
            id: u32,
        }

        let field = part(b"Content-Disposition: form-data; name=\"meta\"", b"{\"id\": 7}");
        assert_eq!(field.json::<Payload>(), Ok(Payload { id: 7 }));
    }
}
