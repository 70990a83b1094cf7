use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;

use crate::boundary::{BoundaryGenerator, RandomBoundary};
use crate::constants;

/// Represents the configuration of an [`UploadSession`](crate::UploadSession).
///
/// # Examples
///
/// ```
/// use multipart_upload::UploadOptions;
///
/// let options = UploadOptions::new()
///     .tenant_header("X-Tenant-Id")
///     .buffer_size(8 * 1024)
///     .user_agent("uploader/1.0");
/// ```
#[derive(Clone)]
pub struct UploadOptions {
    pub(crate) charset: String,
    pub(crate) tenant_header: String,
    pub(crate) buffer_size: usize,
    pub(crate) channel_capacity: usize,
    pub(crate) user_agent: Option<String>,
    pub(crate) boundary_generator: Arc<dyn BoundaryGenerator>,
}

impl UploadOptions {
    /// Creates the default options, see [`Default`](#impl-Default).
    pub fn new() -> UploadOptions {
        UploadOptions::default()
    }

    /// Sets the charset announced in text parts and used to encode their values.
    pub fn charset<N: Into<String>>(mut self, charset: N) -> UploadOptions {
        self.charset = charset.into();
        self
    }

    /// Sets the name of the request header carrying the tenant identifier.
    pub fn tenant_header<N: Into<String>>(mut self, name: N) -> UploadOptions {
        self.tenant_header = name.into();
        self
    }

    /// Sets the size of the intermediate buffer used to copy file parts.
    ///
    /// A size of zero is raised to one byte.
    pub fn buffer_size(mut self, size: usize) -> UploadOptions {
        self.buffer_size = size.max(1);
        self
    }

    /// Sets how many body chunks may be queued ahead of the connection.
    pub fn channel_capacity(mut self, capacity: usize) -> UploadOptions {
        self.channel_capacity = capacity.max(1);
        self
    }

    /// Sends a `User-Agent` header with the request.
    pub fn user_agent<N: Into<String>>(mut self, user_agent: N) -> UploadOptions {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Replaces the generator used to pick the session's boundary.
    pub fn boundary_generator<G: BoundaryGenerator + 'static>(mut self, generator: G) -> UploadOptions {
        self.boundary_generator = Arc::new(generator);
        self
    }
}

impl Default for UploadOptions {
    /// Charset `UTF-8`, tenant header `X-Backtory-Cdn-Id`, a 4096 byte copy
    /// buffer, 16 queued chunks, no `User-Agent` and [`RandomBoundary`].
    fn default() -> Self {
        UploadOptions {
            charset: constants::DEFAULT_CHARSET.to_owned(),
            tenant_header: constants::DEFAULT_TENANT_HEADER.to_owned(),
            buffer_size: constants::DEFAULT_BUFFER_SIZE,
            channel_capacity: constants::DEFAULT_CHANNEL_CAPACITY,
            user_agent: None,
            boundary_generator: Arc::new(RandomBoundary),
        }
    }
}

impl Debug for UploadOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadOptions")
            .field("charset", &self.charset)
            .field("tenant_header", &self.tenant_header)
            .field("buffer_size", &self.buffer_size)
            .field("channel_capacity", &self.channel_capacity)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = UploadOptions::new();
        assert_eq!(options.charset, "UTF-8");
        assert_eq!(options.tenant_header, "X-Backtory-Cdn-Id");
        assert_eq!(options.buffer_size, 4096);
        assert_eq!(options.channel_capacity, 16);
        assert!(options.user_agent.is_none());
    }

    #[test]
    fn test_builder_overrides() {
        let options = UploadOptions::new()
            .charset("ISO-8859-1")
            .tenant_header("X-Tenant")
            .buffer_size(0)
            .channel_capacity(0)
            .user_agent("test-agent")
            .boundary_generator(|| "fixed".to_owned());

        assert_eq!(options.charset, "ISO-8859-1");
        assert_eq!(options.tenant_header, "X-Tenant");
        assert_eq!(options.buffer_size, 1);
        assert_eq!(options.channel_capacity, 1);
        assert_eq!(options.user_agent.as_deref(), Some("test-agent"));
        assert_eq!(options.boundary_generator.generate(), "fixed");
    }
}
