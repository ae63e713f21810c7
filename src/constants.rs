pub(crate) const DEFAULT_WHOLE_STREAM_SIZE_LIMIT: u64 = u64::MAX;
pub(crate) const DEFAULT_PER_FIELD_SIZE_LIMIT: u64 = u64::MAX;

pub(crate) const MAX_HEADERS: usize = 32;

pub(crate) const BOUNDARY_PARAM: &str = "boundary=";
pub(crate) const BOUNDARY_EXT: &str = "--";
pub(crate) const CRLF: &str = "\r\n";
pub(crate) const CRLF_CRLF: &str = "\r\n\r\n";

pub(crate) const CONTENT_DISPOSITION: &str = "content-disposition";
pub(crate) const FORM_DATA: &str = "form-data";
pub(crate) const PARAM_NAME: &str = "name";
pub(crate) const PARAM_FILE_NAME: &str = "filename";

pub(crate) const DEFAULT_CHARSET: &str = "utf-8";
