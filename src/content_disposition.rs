use crate::constants;

/// The `name` and `filename` parameters of one `Content-Disposition` header.
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct ContentDisposition {
    pub(crate) field_name: Option<String>,
    pub(crate) file_name: Option<String>,
}

impl ContentDisposition {
    /// Parses a header value such as `form-data; name="a"; filename="b.txt"`.
    ///
    /// Parameter keys match case-insensitively. Surrounding quotes are
    /// stripped from values; nothing inside them is unescaped.
    pub(crate) fn parse(value: &str) -> ContentDisposition {
        let mut disposition = ContentDisposition::default();

        // The first token is the disposition type.
        for param in split_params(value).into_iter().skip(1) {
            let (key, val) = match param.find('=') {
                Some(idx) => (param[..idx].trim(), unquote(param[idx + 1..].trim())),
                None => continue,
            };

            if key.eq_ignore_ascii_case(constants::PARAM_NAME) {
                disposition.field_name = Some(val.to_owned());
            } else if key.eq_ignore_ascii_case(constants::PARAM_FILE_NAME) {
                disposition.file_name = Some(val.to_owned());
            }
        }

        disposition
    }

    /// Renders a `form-data` header value for the writer.
    pub(crate) fn render(field_name: Option<&str>, file_name: Option<&str>) -> String {
        let mut value = String::from(constants::FORM_DATA);

        if let Some(name) = field_name {
            value.push_str(&format!("; {}=\"{}\"", constants::PARAM_NAME, name));
        }

        if let Some(file_name) = file_name {
            value.push_str(&format!("; {}=\"{}\"", constants::PARAM_FILE_NAME, file_name));
        }

        value
    }
}

// Semicolons inside a quoted value do not split parameters.
fn split_params(value: &str) -> Vec<&str> {
    let mut params = Vec::new();
    let mut start = 0;
    let mut in_quotes = false;

    for (idx, ch) in value.char_indices() {
        match ch {
            '"' => in_quotes = !in_quotes,
            ';' if !in_quotes => {
                params.push(&value[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }

    params.push(&value[start..]);
    params
}

fn unquote(value: &str) -> &str {
    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        &value[1..value.len() - 1]
    } else {
        value
    }
}
