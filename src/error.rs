use std::fmt::{self, Debug, Display, Formatter};

use bytes::Bytes;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A set of errors that can occur while decoding a multipart body and in
/// the other operations of this crate.
#[non_exhaustive]
pub enum Error {
    /// No `boundary=` parameter found in the `Content-Type` header.
    MissingBoundary,

    /// A part could not be split into exactly one header block and one
    /// content block. The offending segment is kept for diagnostics.
    MalformedPart { segment: Bytes },

    /// The `Content-Type` header is not `multipart/form-data`.
    NoMultipart,

    /// Failed to convert the `Content-Type` to [`mime::Mime`] type.
    DecodeContentType(mime::FromStrError),

    /// An unknown field is detected when multipart
    /// [`constraints`](crate::Constraints::allowed_fields) are added.
    UnknownField { field_name: Option<String> },

    /// The field content size exceeded the maximum limit.
    FieldSizeExceeded { limit: u64, field_name: Option<String> },

    /// The body size exceeded the maximum limit.
    StreamSizeExceeded { limit: u64 },

    /// A field built for encoding has a name, file name or content type
    /// which can not be written as a header value.
    InvalidHeaderValue { value: String, cause: BoxError },

    /// Reading a chunk of the body stream failed.
    StreamReadFailed(BoxError),

    /// Failed to decode the field content as `JSON` in
    /// [`field.json()`](crate::Field::json) method.
    #[cfg(feature = "json")]
    #[cfg_attr(nightly, doc(cfg(feature = "json")))]
    DecodeJson(serde_json::Error),
}

impl Error {
    /// Returns the raw segment of a [`Error::MalformedPart`] error.
    pub fn malformed_segment(&self) -> Option<&Bytes> {
        match self {
            Error::MalformedPart { segment } => Some(segment),
            _ => None,
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Error::MissingBoundary => write!(f, "multipart boundary not found in Content-Type"),
            Error::MalformedPart { segment } => write!(
                f,
                "malformed multipart part: headers and content are not separated by a single blank line: {:?}",
                String::from_utf8_lossy(segment)
            ),
            Error::NoMultipart => write!(f, "Content-Type is not multipart/form-data"),
            Error::DecodeContentType(e) => write!(f, "failed to convert Content-Type to `mime::Mime` type: {}", e),
            Error::UnknownField { field_name } => {
                write!(f, "unknown field received: {}", field_name.as_deref().unwrap_or("<unknown>"))
            }
            Error::FieldSizeExceeded { limit, field_name } => write!(
                f,
                "field '{}' exceeded the maximum size limit: {} bytes",
                field_name.as_deref().unwrap_or("<unknown>"),
                limit
            ),
            Error::StreamSizeExceeded { limit } => write!(f, "stream size exceeded the maximum limit: {} bytes", limit),
            Error::InvalidHeaderValue { value, cause } => {
                write!(f, "failed to write field header value {:?}: {}", value, cause)
            }
            Error::StreamReadFailed(e) => write!(f, "stream read failed: {}", e),
            #[cfg(feature = "json")]
            Error::DecodeJson(e) => write!(f, "failed to decode field data as JSON: {}", e),
        }
    }
}

impl Debug for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(self, f)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::DecodeContentType(e) => Some(e),
            Error::InvalidHeaderValue { cause, .. } => Some(cause.as_ref()),
            Error::StreamReadFailed(e) => Some(e.as_ref()),
            #[cfg(feature = "json")]
            Error::DecodeJson(e) => Some(e),
            _ => None,
        }
    }
}

impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        self.to_string().eq(&other.to_string())
    }
}

impl Eq for Error {}
