//! An async client that streams `multipart/form-data` uploads to an HTTP endpoint.
//!
//! An [`UploadSession`] opens the connection and sends the request head as
//! soon as it is created, then writes each text field and file part straight
//! into the request body. Calling [`finish`](UploadSession::finish) writes the
//! closing boundary and returns the server's reply as lines when the upload
//! was accepted with `200 OK` or `201 Created`.
//!
//! # Examples
//!
//! ```no_run
//! use multipart_upload::{UploadOptions, UploadSession};
//!
//! # async fn run() -> multipart_upload::Result<()> {
//! let options = UploadOptions::new().tenant_header("X-Tenant-Id");
//! let mut session =
//!     UploadSession::with_options("http://localhost:8080/files", "tenant-1", "secret-token", options).await?;
//!
//! session.add_form_field("caption", "hello").await?;
//! session.add_file("file", "photo.jpg").await?;
//!
//! let lines = session.finish().await?;
//! println!("{:?}", lines);
//! # Ok(())
//! # }
//! ```

pub use boundary::{BoundaryGenerator, RandomBoundary};
pub use content_type::guess_content_type;
pub use error::Error;
pub use options::UploadOptions;
pub use session::UploadSession;

mod body;
mod boundary;
mod constants;
mod content_type;
mod error;
mod options;
mod part;
mod response;
mod session;
mod state;

/// A Result type often returned from methods that can have `multipart_upload` errors.
pub type Result<T> = std::result::Result<T, Error>;
