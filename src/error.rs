use std::fmt::{self, Debug, Display, Formatter};

use derive_more::Display;
use http::StatusCode;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A set of errors that can occur while building and sending a multipart
/// upload.
#[derive(Display)]
#[non_exhaustive]
pub enum Error {
    /// The destination URL couldn't be parsed.
    #[display(fmt = "invalid destination url {:?}: {}", url, cause)]
    InvalidUrl { url: String, cause: BoxError },

    /// The destination URL uses a scheme other than `http`.
    #[display(fmt = "unsupported url scheme: {}", _0)]
    UnsupportedScheme(String),

    /// The destination URL has no host to connect to.
    #[display(fmt = "destination url has no host: {}", _0)]
    MissingHost(String),

    /// Failed to open the TCP connection to the destination.
    #[display(fmt = "failed to connect to {}: {}", addr, cause)]
    ConnectFailed { addr: String, cause: BoxError },

    /// The HTTP/1.1 handshake with the destination failed.
    #[display(fmt = "http handshake failed: {}", _0)]
    HandshakeFailed(BoxError),

    /// A configured request header name couldn't be converted to
    /// [`HeaderName`](http::header::HeaderName).
    #[display(fmt = "invalid request header name {:?}: {}", name, cause)]
    InvalidHeaderName { name: String, cause: BoxError },

    /// A request header value couldn't be converted to
    /// [`HeaderValue`](http::header::HeaderValue).
    #[display(fmt = "invalid value for request header '{}': {}", name, cause)]
    InvalidHeaderValue { name: String, cause: BoxError },

    /// The configured charset isn't a known encoding label.
    #[display(fmt = "unsupported charset: {:?}", _0)]
    UnsupportedCharset(String),

    /// A line given to [`add_header_field`](crate::UploadSession::add_header_field)
    /// contains a CR or LF.
    #[display(fmt = "header field '{}' contains a line break", name)]
    InvalidHeaderLine { name: String },

    /// Reading the source of a file part failed.
    #[display(fmt = "failed to read file part '{}': {}", field_name, cause)]
    SourceReadFailed { field_name: String, cause: BoxError },

    /// The file given to [`add_file`](crate::UploadSession::add_file) couldn't be opened.
    #[display(fmt = "failed to open file {:?}: {}", path, cause)]
    FileOpenFailed { path: String, cause: BoxError },

    /// The request body couldn't be handed to the connection.
    #[display(fmt = "failed to write request body: {}", _0)]
    BodyWriteFailed(BoxError),

    /// A previous write failed and the session can't be used any more.
    ///
    /// When the failure was an early reply from the server, the session
    /// returns [`UnexpectedStatus`](Error::UnexpectedStatus) instead.
    #[display(fmt = "upload session failed earlier and can't accept more parts")]
    SessionFailed,

    /// The request couldn't be completed.
    #[display(fmt = "request failed: {}", _0)]
    RequestFailed(BoxError),

    /// The server answered with a status other than `200 OK` or `201 Created`.
    #[display(fmt = "server returned non-OK status: {}", "status.as_u16()")]
    UnexpectedStatus { status: StatusCode },

    /// Reading the response body failed.
    #[display(fmt = "failed to read response body: {}", _0)]
    ResponseReadFailed(BoxError),
}

impl Error {
    /// Returns the status code the server answered with, if this error was
    /// caused by a rejected upload.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::UnexpectedStatus { status } => Some(*status),
            _ => None,
        }
    }
}

impl Debug for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(self, f)
    }
}

impl std::error::Error for Error {}

impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        self.to_string().eq(&other.to_string())
    }
}

impl Eq for Error {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_only_for_rejected_uploads() {
        let err = Error::UnexpectedStatus {
            status: StatusCode::FORBIDDEN,
        };
        assert_eq!(err.status(), Some(StatusCode::FORBIDDEN));
        assert_eq!(err.to_string(), "server returned non-OK status: 403");

        assert_eq!(Error::SessionFailed.status(), None);
    }

    #[test]
    fn test_error_eq_by_message() {
        assert_eq!(
            Error::UnsupportedScheme("https".to_owned()),
            Error::UnsupportedScheme("https".to_owned())
        );
        assert_ne!(
            Error::UnsupportedScheme("https".to_owned()),
            Error::MissingHost("https".to_owned())
        );
    }
}
