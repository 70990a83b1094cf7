pub(crate) const BOUNDARY_EXT: &str = "--";
pub(crate) const CRLF: &str = "\r\n";

pub(crate) const DEFAULT_CHARSET: &str = "UTF-8";
pub(crate) const DEFAULT_TENANT_HEADER: &str = "X-Backtory-Cdn-Id";
pub(crate) const DEFAULT_BUFFER_SIZE: usize = 4096;
pub(crate) const DEFAULT_CHANNEL_CAPACITY: usize = 16;

pub(crate) const DEFAULT_HTTP_PORT: u16 = 80;
pub(crate) const BEARER_PREFIX: &str = "Bearer ";
pub(crate) const NO_CACHE: &str = "no-cache";
