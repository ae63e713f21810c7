use crate::constants;
use crate::constraints::Constraints;
use crate::field::{Field, FileField, ValueField};
use bytes::{BufMut, Bytes, BytesMut};
use futures_util::stream::{Stream, TryStreamExt};
use std::ops::Index;
#[cfg(feature = "tokio-io")]
use tokio::io::AsyncRead;
#[cfg(feature = "tokio-io")]
use tokio_util::io::ReaderStream;

/// The ordered fields of a decoded `multipart/form-data` body.
///
/// Fields keep the order of their parts in the body. Nothing is merged or
/// deduplicated, and there is no lookup by name: names are optional and may
/// repeat.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormData {
    fields: Vec<Field>,
}

impl FormData {
    pub(crate) fn from_fields(fields: Vec<Field>) -> FormData {
        FormData { fields }
    }

    /// Buffers the given [`Bytes`] stream and decodes it with the boundary.
    ///
    /// # Examples
    ///
    /// ```
    /// use formpart::FormData;
    /// use bytes::Bytes;
    /// use std::convert::Infallible;
    /// use futures_util::stream::once;
    ///
    /// # async fn run() {
    /// let data = "--X-BOUNDARY\r\nContent-Disposition: form-data; name=\"my_text_field\"\r\n\r\nabcd\r\n--X-BOUNDARY--\r\n";
    /// let stream = once(async move { Result::<Bytes, Infallible>::Ok(Bytes::from(data)) });
    ///
    /// let form = FormData::from_stream(stream, "X-BOUNDARY").await.unwrap();
    /// assert_eq!(form[0].text(), "abcd");
    /// # }
    /// # tokio::runtime::Runtime::new().unwrap().block_on(run());
    /// ```
    pub async fn from_stream<S, O, E>(stream: S, boundary: &str) -> crate::Result<FormData>
    where
        S: Stream<Item = Result<O, E>>,
        O: Into<Bytes>,
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        FormData::from_stream_with_constraints(stream, boundary, &Constraints::default()).await
    }

    /// Same as [`from_stream`](FormData::from_stream), applying the given
    /// [`Constraints`]. The whole stream limit is checked while buffering.
    pub async fn from_stream_with_constraints<S, O, E>(
        stream: S,
        boundary: &str,
        constraints: &Constraints,
    ) -> crate::Result<FormData>
    where
        S: Stream<Item = Result<O, E>>,
        O: Into<Bytes>,
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let limit = constraints.size_limit.whole_stream;
        let mut stream = Box::pin(stream);
        let mut buf = BytesMut::new();

        while let Some(chunk) = stream
            .try_next()
            .await
            .map_err(|err| crate::Error::StreamReadFailed(err.into()))?
        {
            let chunk: Bytes = chunk.into();

            if (buf.len() + chunk.len()) as u64 > limit {
                return Err(crate::Error::StreamSizeExceeded { limit });
            }

            buf.extend_from_slice(&chunk);
        }

        crate::decode_with_constraints(buf.freeze(), boundary, constraints)
    }

    /// Reads the given [`AsyncRead`] to the end and decodes it with the
    /// boundary.
    ///
    /// # Optional
    ///
    /// This requires the optional `tokio-io` feature to be enabled.
    ///
    /// # Examples
    ///
    /// ```
    /// use formpart::FormData;
    ///
    /// # async fn run() {
    /// let data = "--X-BOUNDARY\r\nContent-Disposition: form-data; name=\"my_text_field\"\r\n\r\nabcd\r\n--X-BOUNDARY--\r\n";
    /// let reader = data.as_bytes();
    ///
    /// let form = FormData::from_reader(reader, "X-BOUNDARY").await.unwrap();
    /// assert_eq!(form.len(), 1);
    /// # }
    /// # tokio::runtime::Runtime::new().unwrap().block_on(run());
    /// ```
    #[cfg(feature = "tokio-io")]
    #[cfg_attr(nightly, doc(cfg(feature = "tokio-io")))]
    pub async fn from_reader<R>(reader: R, boundary: &str) -> crate::Result<FormData>
    where
        R: AsyncRead,
    {
        FormData::from_stream(ReaderStream::new(reader), boundary).await
    }

    /// Same as [`from_reader`](FormData::from_reader), applying the given
    /// [`Constraints`].
    #[cfg(feature = "tokio-io")]
    #[cfg_attr(nightly, doc(cfg(feature = "tokio-io")))]
    pub async fn from_reader_with_constraints<R>(
        reader: R,
        boundary: &str,
        constraints: &Constraints,
    ) -> crate::Result<FormData>
    where
        R: AsyncRead,
    {
        FormData::from_stream_with_constraints(ReaderStream::new(reader), boundary, constraints).await
    }

    /// Encodes the fields as a `multipart/form-data` body with the given
    /// boundary.
    ///
    /// Each field is written with the headers it carries, so decoding the
    /// result with the same boundary gives back an equal `FormData` for text
    /// content without blank lines.
    ///
    /// # Examples
    ///
    /// ```
    /// use formpart::{Field, FormData};
    ///
    /// let form: FormData = vec![Field::value("foo", "bar").unwrap()].into_iter().collect();
    /// let body = form.encode("B");
    ///
    /// assert_eq!(&body[..], &b"--B\r\ncontent-disposition: form-data; name=\"foo\"\r\n\r\nbar\r\n--B--\r\n"[..]);
    /// ```
    pub fn encode(&self, boundary: &str) -> Bytes {
        let mut buf = BytesMut::new();

        for field in &self.fields {
            put_delimiter(&mut buf, boundary);
            buf.put_slice(constants::CRLF.as_bytes());

            for (name, value) in field.headers() {
                buf.put_slice(name.as_str().as_bytes());
                buf.put_slice(b": ");
                buf.put_slice(value.as_bytes());
                buf.put_slice(constants::CRLF.as_bytes());
            }

            // An empty header block still needs its own line.
            if field.headers().is_empty() {
                buf.put_slice(constants::CRLF.as_bytes());
            }

            buf.put_slice(constants::CRLF.as_bytes());
            buf.put_slice(field.bytes());
            buf.put_slice(constants::CRLF.as_bytes());
        }

        put_delimiter(&mut buf, boundary);
        buf.put_slice(constants::BOUNDARY_EXT.as_bytes());
        buf.put_slice(constants::CRLF.as_bytes());

        buf.freeze()
    }

    /// Number of decoded fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` when the body held no parts.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Get the field at the given position.
    pub fn get(&self, idx: usize) -> Option<&Field> {
        self.fields.get(idx)
    }

    /// All fields in body order.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Iterates over the fields in body order.
    pub fn iter(&self) -> std::slice::Iter<'_, Field> {
        self.fields.iter()
    }

    /// Iterates over the file uploads only, in body order.
    pub fn files(&self) -> impl Iterator<Item = &FileField> {
        self.fields.iter().filter_map(|field| match field {
            Field::File(file) => Some(file),
            Field::Value(_) => None,
        })
    }

    /// Iterates over the plain values only, in body order.
    pub fn values(&self) -> impl Iterator<Item = &ValueField> {
        self.fields.iter().filter_map(|field| match field {
            Field::Value(value) => Some(value),
            Field::File(_) => None,
        })
    }
}

fn put_delimiter(buf: &mut BytesMut, boundary: &str) {
    buf.put_slice(constants::BOUNDARY_EXT.as_bytes());
    buf.put_slice(boundary.as_bytes());
}

impl Index<usize> for FormData {
    type Output = Field;

    fn index(&self, idx: usize) -> &Field {
        &self.fields[idx]
    }
}

/// Collects fields into a `FormData`, re-numbering their indices in
/// iteration order.
impl std::iter::FromIterator<Field> for FormData {
    fn from_iter<I: IntoIterator<Item = Field>>(iter: I) -> FormData {
        let fields = iter
            .into_iter()
            .enumerate()
            .map(|(idx, mut field)| {
                field.set_index(idx);
                field
            })
            .collect();

        FormData { fields }
    }
}

impl IntoIterator for FormData {
    type Item = Field;
    type IntoIter = std::vec::IntoIter<Field>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

impl<'a> IntoIterator for &'a FormData {
    type Item = &'a Field;
    type IntoIter = std::slice::Iter<'a, Field>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}
