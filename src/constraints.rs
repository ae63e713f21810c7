use crate::size_limit::SizeLimit;

/// Represents some rules to be applied on the body and its fields while
/// decoding.
///
/// # Examples
///
/// ```
/// use formpart::{Constraints, SizeLimit};
///
/// let body = "--X-BOUNDARY\r\nContent-Disposition: form-data; name=\"my_text_field\"\r\n\r\nabcd\r\n--X-BOUNDARY--\r\n";
///
/// let constraints = Constraints::new()
///     .allowed_fields(vec!["my_text_field", "my_file_field"])
///     .size_limit(SizeLimit::new().whole_stream(15 * 1024 * 1024).per_field(10 * 1024 * 1024));
///
/// let form = formpart::decode_with_constraints(body, "X-BOUNDARY", &constraints).unwrap();
/// assert_eq!(form.len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Constraints {
    pub(crate) size_limit: SizeLimit,
    pub(crate) allowed_fields: Option<Vec<String>>,
    pub(crate) split_at_first_blank_line: bool,
}

impl Constraints {
    /// Creates a set of rules with default behaviour: no size limits, every
    /// field allowed and the strict blank-line policy.
    pub fn new() -> Constraints {
        Constraints::default()
    }

    /// Applies rules on the body size and on each field's content size.
    pub fn size_limit(self, size_limit: SizeLimit) -> Constraints {
        Constraints { size_limit, ..self }
    }

    /// Specify which fields are allowed, for any unknown field
    /// [`decode_with_constraints`](crate::decode_with_constraints) fails with
    /// [`Error::UnknownField`](crate::Error::UnknownField). A part without a
    /// `name` is always unknown once this list is set.
    pub fn allowed_fields<N: Into<String>>(self, allowed_fields: Vec<N>) -> Constraints {
        let allowed_fields = allowed_fields.into_iter().map(|item| item.into()).collect();

        Constraints {
            allowed_fields: Some(allowed_fields),
            ..self
        }
    }

    /// By default a part is rejected with
    /// [`Error::MalformedPart`](crate::Error::MalformedPart) when its content
    /// contains another `\r\n\r\n` sequence after the header separator.
    ///
    /// Enabling this splits only at the first blank line and keeps the rest
    /// of the segment as content, which accepts binary uploads.
    pub fn split_at_first_blank_line(self, enabled: bool) -> Constraints {
        Constraints {
            split_at_first_blank_line: enabled,
            ..self
        }
    }

    pub(crate) fn is_it_allowed(&self, field: Option<&str>) -> bool {
        if let Some(ref allowed_fields) = self.allowed_fields {
            field
                .map(|field| allowed_fields.iter().any(|item| item == field))
                .unwrap_or(false)
        } else {
            true
        }
    }
}
