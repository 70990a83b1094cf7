use std::convert::TryFrom;
use std::fmt::{self, Debug, Formatter};
use std::path::Path;

use bytes::Bytes;
use http::header::{self, HeaderMap, HeaderName, HeaderValue};
use http::{Method, Request, Response, Uri};
use hyper::body::Incoming;
use hyper_util::rt::TokioIo;
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::body::ChannelBody;
use crate::constants;
use crate::content_type::guess_content_type;
use crate::options::UploadOptions;
use crate::part::{self, TextCharset};
use crate::response;
use crate::state::SessionState;

type RequestTask = JoinHandle<Result<Response<Incoming>, hyper::Error>>;

/// A single `multipart/form-data` POST request under construction.
///
/// The connection is opened and the request head is sent when the session is
/// created. Every `add_*` method then streams its part straight into the
/// request body, in call order, and [`finish`](UploadSession::finish) closes
/// the body and collects the server's reply.
///
/// A session must be created and driven inside a tokio runtime. Dropping it
/// at any point closes the connection.
///
/// # Examples
///
/// ```no_run
/// use multipart_upload::UploadSession;
///
/// # async fn run() -> multipart_upload::Result<()> {
/// let mut session = UploadSession::new("http://localhost:8080/upload", "tenant-1", "secret-token").await?;
///
/// session.add_form_field("caption", "hello").await?;
/// session.add_file_part("file", &[0x01u8, 0x02, 0x03][..], "x.bin").await?;
///
/// for line in session.finish().await? {
///     println!("{}", line);
/// }
/// # Ok(())
/// # }
/// ```
pub struct UploadSession {
    boundary: String,
    content_type: String,
    charset: TextCharset,
    buffer_size: usize,
    state: SessionState,
    body_tx: Option<mpsc::Sender<Bytes>>,
    request: Option<RequestTask>,
    connection: JoinHandle<()>,
}

impl UploadSession {
    /// Opens an upload to `url` with the default [`UploadOptions`].
    ///
    /// `tenant_id` is sent in the tenant header and `access_token` as a
    /// bearer token.
    pub async fn new<U, T, A>(url: U, tenant_id: T, access_token: A) -> crate::Result<UploadSession>
    where
        U: AsRef<str>,
        T: AsRef<str>,
        A: AsRef<str>,
    {
        UploadSession::with_options(url, tenant_id, access_token, UploadOptions::default()).await
    }

    /// Opens an upload to `url` with the given options.
    pub async fn with_options<U, T, A>(
        url: U,
        tenant_id: T,
        access_token: A,
        options: UploadOptions,
    ) -> crate::Result<UploadSession>
    where
        U: AsRef<str>,
        T: AsRef<str>,
        A: AsRef<str>,
    {
        let target = Target::parse(url.as_ref())?;
        let charset = TextCharset::resolve(&options.charset)?;

        let boundary = options.boundary_generator.generate();
        let content_type = format!("multipart/form-data; boundary={}", boundary);

        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, header_value("Host", &target.host_header)?);
        headers.insert(header::CONTENT_TYPE, header_value("Content-Type", &content_type)?);
        headers.insert(header::CACHE_CONTROL, HeaderValue::from_static(constants::NO_CACHE));
        headers.insert(header::PRAGMA, HeaderValue::from_static(constants::NO_CACHE));

        let tenant_header =
            HeaderName::try_from(options.tenant_header.as_str()).map_err(|err| crate::Error::InvalidHeaderName {
                name: options.tenant_header.clone(),
                cause: err.into(),
            })?;
        headers.insert(tenant_header, header_value(&options.tenant_header, tenant_id.as_ref())?);

        let authorization = format!("{}{}", constants::BEARER_PREFIX, access_token.as_ref());
        let mut authorization = header_value("Authorization", &authorization)?;
        authorization.set_sensitive(true);
        headers.insert(header::AUTHORIZATION, authorization);

        if let Some(user_agent) = options.user_agent.as_deref() {
            headers.insert(header::USER_AGENT, header_value("User-Agent", user_agent)?);
        }

        let stream = TcpStream::connect(target.addr.as_str())
            .await
            .map_err(|err| crate::Error::ConnectFailed {
                addr: target.addr.clone(),
                cause: err.into(),
            })?;

        let (mut sender, conn) = hyper::client::conn::http1::handshake::<_, ChannelBody>(TokioIo::new(stream))
            .await
            .map_err(|err| crate::Error::HandshakeFailed(err.into()))?;

        let connection = tokio::spawn(async move {
            if let Err(err) = conn.await {
                log::error!("upload connection closed with error: {}", err);
            }
        });

        let (body_tx, body) = ChannelBody::channel(options.channel_capacity);

        let mut req = Request::new(body);
        *req.method_mut() = Method::POST;
        *req.uri_mut() = target.path;
        *req.headers_mut() = headers;

        let request = tokio::spawn(async move {
            if let Err(err) = sender.ready().await {
                return Err(err);
            }
            sender.send_request(req).await
        });

        log::debug!(
            "opened upload to {} with boundary {} and charset {}",
            target.addr,
            boundary,
            charset.label()
        );

        Ok(UploadSession {
            boundary,
            content_type,
            charset,
            buffer_size: options.buffer_size,
            state: SessionState::new(),
            body_tx: Some(body_tx),
            request: Some(request),
            connection,
        })
    }

    /// The boundary separating the parts of this upload.
    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// The `Content-Type` header sent with the request.
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// The number of body bytes handed to the connection so far.
    pub fn bytes_written(&self) -> u64 {
        self.state.bytes_written
    }

    /// The number of form fields and file parts added so far.
    pub fn parts(&self) -> usize {
        self.state.parts
    }

    /// Adds a `text/plain` part holding `value`.
    pub async fn add_form_field<N, V>(&mut self, name: N, value: V) -> crate::Result<()>
    where
        N: AsRef<str>,
        V: AsRef<str>,
    {
        let name = name.as_ref();
        let chunk = part::form_field(&self.boundary, name, value.as_ref(), &self.charset);
        self.send(chunk).await?;

        self.state.parts += 1;
        log::debug!("added form field '{}'", name);
        Ok(())
    }

    /// Adds a binary part named `field_name` with the whole content of `source`.
    ///
    /// The part's `Content-Type` is guessed from `filename`. The source is
    /// consumed and dropped before this method returns, whether it succeeds
    /// or not. Returns `filename`.
    pub async fn add_file_part<N, R, F>(&mut self, field_name: N, mut source: R, filename: F) -> crate::Result<String>
    where
        N: AsRef<str>,
        R: AsyncRead + Unpin,
        F: Into<String>,
    {
        let field_name = field_name.as_ref();
        let filename = filename.into();
        let content_type = guess_content_type(&filename);

        let head = part::file_part_head(&self.boundary, field_name, &filename, &content_type);
        self.send(head).await?;

        let copied = self.copy_source(field_name, &mut source).await?;
        drop(source);

        self.send(part::part_end()).await?;

        self.state.parts += 1;
        log::debug!(
            "added file part '{}' ({}, {}, {} bytes)",
            field_name,
            filename,
            content_type,
            copied
        );
        Ok(filename)
    }

    /// Adds the file at `path` as a binary part, using its file name as the
    /// part's filename.
    pub async fn add_file<N, P>(&mut self, field_name: N, path: P) -> crate::Result<String>
    where
        N: AsRef<str>,
        P: AsRef<Path>,
    {
        self.state.ensure_writable()?;

        let path = path.as_ref();
        let file = File::open(path).await.map_err(|err| crate::Error::FileOpenFailed {
            path: path.display().to_string(),
            cause: err.into(),
        })?;

        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        self.add_file_part(field_name, file, filename).await
    }

    /// Writes a raw `name: value` line at the current position of the body.
    ///
    /// This is not an HTTP header: the request head is already on the wire
    /// once the session exists. A name or value containing CR or LF is
    /// rejected with [`Error::InvalidHeaderLine`](crate::Error::InvalidHeaderLine)
    /// and nothing is written.
    pub async fn add_header_field<N, V>(&mut self, name: N, value: V) -> crate::Result<()>
    where
        N: AsRef<str>,
        V: AsRef<str>,
    {
        let line = part::header_line(name.as_ref(), value.as_ref())?;
        self.send(line).await
    }

    /// Writes the closing boundary, ends the request and reads the reply.
    ///
    /// Returns the reply body as lines when the server answers `200 OK` or
    /// `201 Created`, otherwise fails with
    /// [`Error::UnexpectedStatus`](crate::Error::UnexpectedStatus) without
    /// reading the body. The connection is closed in both cases.
    ///
    /// A server that rejects the upload before reading the whole body is
    /// reported the same way, by the add-method that hit the closed
    /// connection and again by `finish`.
    pub async fn finish(mut self) -> crate::Result<Vec<String>> {
        let closing = part::closing_delimiter(&self.boundary);
        self.send(closing).await?;

        // Dropping the sender ends the chunked body.
        drop(self.body_tx.take());

        let request = self.request.take().ok_or(crate::Error::SessionFailed)?;
        let res = match request.await {
            Ok(Ok(res)) => res,
            Ok(Err(err)) => return Err(crate::Error::RequestFailed(err.into())),
            Err(err) => return Err(crate::Error::RequestFailed(err.into())),
        };

        log::debug!(
            "upload of {} parts ({} bytes) answered with {}",
            self.state.parts,
            self.state.bytes_written,
            res.status()
        );

        response::into_lines(res).await
    }

    async fn copy_source<R>(&mut self, field_name: &str, source: &mut R) -> crate::Result<u64>
    where
        R: AsyncRead + Unpin,
    {
        let mut buf = vec![0u8; self.buffer_size];
        let mut copied = 0u64;

        loop {
            let n = match source.read(&mut buf).await {
                Ok(0) => break,
                Ok(n) => n,
                Err(err) => {
                    return self.state.fail(crate::Error::SourceReadFailed {
                        field_name: field_name.to_owned(),
                        cause: err.into(),
                    });
                }
            };

            self.send(Bytes::copy_from_slice(&buf[..n])).await?;
            copied += n as u64;
        }

        Ok(copied)
    }

    async fn send(&mut self, chunk: Bytes) -> crate::Result<()> {
        self.state.ensure_writable()?;

        let tx = match self.body_tx.as_ref() {
            Some(tx) => tx,
            None => return Err(crate::Error::SessionFailed),
        };

        let len = chunk.len();
        if tx.send(chunk).await.is_err() {
            let err = self.early_reply().await;
            return self.state.fail(err);
        }

        self.state.bytes_written += len as u64;
        log::trace!("queued {} body bytes", len);
        Ok(())
    }

    /// Finds out why the connection stopped taking the body. A server that
    /// answered before reading everything yields its status.
    async fn early_reply(&mut self) -> crate::Error {
        self.body_tx = None;

        let closed = || crate::Error::BodyWriteFailed("connection closed before the request body was complete".into());

        let request = match self.request.take() {
            Some(request) => request,
            None => return closed(),
        };

        match request.await {
            Ok(Ok(res)) if !response::is_success(res.status()) => {
                log::debug!("upload answered early with {}", res.status());
                crate::Error::UnexpectedStatus { status: res.status() }
            }
            Ok(Err(err)) => crate::Error::BodyWriteFailed(err.into()),
            _ => closed(),
        }
    }
}

impl Drop for UploadSession {
    fn drop(&mut self) {
        if let Some(request) = self.request.take() {
            request.abort();
        }
        self.connection.abort();
    }
}

impl Debug for UploadSession {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadSession")
            .field("boundary", &self.boundary)
            .field("state", &self.state)
            .finish()
    }
}

/// Where the request goes: the socket address, the `Host` header and the
/// request target.
struct Target {
    addr: String,
    host_header: String,
    path: Uri,
}

impl Target {
    fn parse(url: &str) -> crate::Result<Target> {
        let uri = url.parse::<Uri>().map_err(|err| crate::Error::InvalidUrl {
            url: url.to_owned(),
            cause: err.into(),
        })?;

        match uri.scheme_str() {
            Some("http") => {}
            Some(scheme) => return Err(crate::Error::UnsupportedScheme(scheme.to_owned())),
            None => {
                return Err(crate::Error::InvalidUrl {
                    url: url.to_owned(),
                    cause: "url has no scheme".into(),
                });
            }
        }

        let host = match uri.host() {
            Some(host) if !host.is_empty() => host,
            _ => return Err(crate::Error::MissingHost(url.to_owned())),
        };

        let port = uri.port_u16().unwrap_or(constants::DEFAULT_HTTP_PORT);
        let host_header = match uri.port_u16() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_owned(),
        };

        let path = uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .filter(|pq| !pq.is_empty())
            .unwrap_or("/")
            .parse::<Uri>()
            .map_err(|err| crate::Error::InvalidUrl {
                url: url.to_owned(),
                cause: err.into(),
            })?;

        Ok(Target {
            addr: format!("{}:{}", host, port),
            host_header,
            path,
        })
    }
}

fn header_value(name: &str, value: &str) -> crate::Result<HeaderValue> {
    HeaderValue::from_str(value).map_err(|err| crate::Error::InvalidHeaderValue {
        name: name.to_owned(),
        cause: err.into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_parse() {
        let target = Target::parse("http://localhost:8080/api/upload?x=1").unwrap();
        assert_eq!(target.addr, "localhost:8080");
        assert_eq!(target.host_header, "localhost:8080");
        assert_eq!(target.path, "/api/upload?x=1");

        let target = Target::parse("http://example.com").unwrap();
        assert_eq!(target.addr, "example.com:80");
        assert_eq!(target.host_header, "example.com");
        assert_eq!(target.path, "/");

        let target = Target::parse("http://[::1]:9000/up").unwrap();
        assert_eq!(target.addr, "[::1]:9000");
        assert_eq!(target.path, "/up");
    }

    #[test]
    fn test_target_parse_errors() {
        assert_eq!(
            Target::parse("https://example.com/upload").err(),
            Some(crate::Error::UnsupportedScheme("https".to_owned()))
        );
        assert!(matches!(
            Target::parse("/upload"),
            Err(crate::Error::InvalidUrl { .. })
        ));
        assert!(matches!(
            Target::parse("not a url"),
            Err(crate::Error::InvalidUrl { .. })
        ));
    }

    #[tokio::test]
    async fn test_invalid_token_fails_before_connecting() {
        let err = UploadSession::new("http://127.0.0.1:1/upload", "tenant", "bad\ntoken")
            .await
            .unwrap_err();
        assert!(matches!(err, crate::Error::InvalidHeaderValue { ref name, .. } if name == "Authorization"));
    }

    #[tokio::test]
    async fn test_unknown_charset_fails_before_connecting() {
        let options = UploadOptions::new().charset("not-a-charset");
        let err = UploadSession::with_options("http://127.0.0.1:1/upload", "tenant", "token", options)
            .await
            .unwrap_err();
        assert_eq!(err, crate::Error::UnsupportedCharset("not-a-charset".to_owned()));
    }

    #[tokio::test]
    async fn test_invalid_tenant_header_name() {
        let options = UploadOptions::new().tenant_header("bad header");
        let err = UploadSession::with_options("http://127.0.0.1:1/upload", "tenant", "token", options)
            .await
            .unwrap_err();
        assert!(matches!(err, crate::Error::InvalidHeaderName { .. }));
    }
}
