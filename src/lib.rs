//! A buffered decoder for `multipart/form-data` request bodies.
//!
//! It is meant for the request handlers of test fixture servers: the whole
//! body is already in memory, and a malformed body should fail loudly. The
//! decoder is a pure function over the body bytes and the boundary, so it can
//! be called from any thread or task without coordination.
//!
//! # Examples
//!
//! ```
//! use formpart::Field;
//!
//! let content_type = "multipart/form-data; boundary=X-BOUNDARY";
//! let body = "--X-BOUNDARY\r\nContent-Disposition: form-data; name=\"my_text_field\"\r\n\r\nabcd\r\n--X-BOUNDARY\r\nContent-Disposition: form-data; name=\"my_file_field\"; filename=\"a-text-file.txt\"\r\nContent-Type: text/plain\r\n\r\nHello world\r\n--X-BOUNDARY--\r\n";
//!
//! let boundary = formpart::parse_boundary(content_type).unwrap();
//! let form = formpart::decode(body, &boundary).unwrap();
//!
//! for field in &form {
//!     match field {
//!         Field::Value(value) => println!("{:?} = {}", value.name(), value.value()),
//!         Field::File(file) => println!("{:?} uploaded {} bytes", file.file_name(), file.data().len()),
//!     }
//! }
//! ```
//!
//! ## Optional features
//!
//! * `json`: adds [`Field::json`] for fields carrying JSON.
//! * `tokio-io`: adds [`FormData::from_reader`] for tokio readers.
//! * `log`: emits `trace` records through the [`log`](https://docs.rs/log) facade.

#![cfg_attr(nightly, feature(doc_cfg))]

pub use bytes;

macro_rules! trace {
    ($($arg:tt)*) => {
        #[cfg(feature = "log")]
        log::trace!($($arg)*);
    };
}

pub use constraints::Constraints;
pub use error::Error;
pub use field::{Field, FileField, ValueField};
pub use form_data::FormData;
pub use multipart::{decode, decode_with_constraints};
pub use size_limit::SizeLimit;

mod buffer;
mod constants;
mod constraints;
mod content_disposition;
mod error;
mod field;
mod form_data;
mod helpers;
mod multipart;
mod size_limit;

/// A Result type often returned from methods that can have `formpart` errors.
pub type Result<T> = std::result::Result<T, Error>;

/// Extracts the boundary from a `Content-Type` header value.
///
/// Everything after the first `boundary=` up to the end of the value is
/// returned as is, so the value is expected to end with the boundary
/// parameter. The media type is not checked; use [`parse_boundary`] for that.
///
/// # Examples
///
/// ```
/// assert_eq!(formpart::extract_boundary("multipart/form-data; boundary=ABC"), Ok("ABC".to_owned()));
/// assert!(formpart::extract_boundary("multipart/form-data").is_err());
/// ```
pub fn extract_boundary<T: AsRef<str>>(content_type: T) -> crate::Result<String> {
    let content_type = content_type.as_ref();

    content_type
        .find(constants::BOUNDARY_PARAM)
        .map(|idx| content_type[idx + constants::BOUNDARY_PARAM.len()..].to_owned())
        .ok_or(crate::Error::MissingBoundary)
}

/// Parses the `Content-Type` header to extract the boundary value, checking
/// that the media type is `multipart/form-data`.
///
/// # Examples
///
/// ```
/// let content_type = "multipart/form-data; boundary=\"ABCDEFG\"; charset=utf-8";
/// assert_eq!(formpart::parse_boundary(content_type), Ok("ABCDEFG".to_owned()));
/// ```
pub fn parse_boundary<T: AsRef<str>>(content_type: T) -> crate::Result<String> {
    let m = content_type
        .as_ref()
        .parse::<mime::Mime>()
        .map_err(crate::Error::DecodeContentType)?;

    if !(m.type_() == mime::MULTIPART && m.subtype() == mime::FORM_DATA) {
        return Err(crate::Error::NoMultipart);
    }

    m.get_param(mime::BOUNDARY)
        .map(|name| name.as_str().trim_matches('"').to_owned())
        .ok_or(crate::Error::MissingBoundary)
}
