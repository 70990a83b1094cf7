use std::borrow::Cow;

use encoding_rs::{Encoding, UTF_8};
use http::header::{self, HeaderMap};
use http::{Response, StatusCode};
use http_body::Body;
use http_body_util::BodyExt;

pub(crate) fn is_success(status: StatusCode) -> bool {
    status == StatusCode::OK || status == StatusCode::CREATED
}

/// Checks the reply status and, for `200`/`201`, reads the body as lines.
///
/// Any other status fails without touching the body.
pub(crate) async fn into_lines<B>(res: Response<B>) -> crate::Result<Vec<String>>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let status = res.status();
    if !is_success(status) {
        log::warn!("upload rejected with status {}", status);
        return Err(crate::Error::UnexpectedStatus { status });
    }

    let (parts, body) = res.into_parts();
    let bytes = body
        .collect()
        .await
        .map_err(|err| crate::Error::ResponseReadFailed(err.into()))?
        .to_bytes();

    log::debug!("upload accepted with status {}, {} bytes of reply", status, bytes.len());

    let text = decode(&bytes, response_charset(&parts.headers).as_deref());
    Ok(split_lines(&text))
}

fn response_charset(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|val| val.to_str().ok())
        .and_then(|val| val.parse::<mime::Mime>().ok())
        .and_then(|mime| mime.get_param(mime::CHARSET).map(|charset| charset.as_str().to_owned()))
}

fn decode(bytes: &[u8], charset: Option<&str>) -> String {
    let encoding = charset
        .and_then(|label| Encoding::for_label(label.as_bytes()))
        .unwrap_or(UTF_8);

    let (text, _, _) = encoding.decode(bytes);

    match text {
        Cow::Owned(s) => s,
        Cow::Borrowed(s) => String::from(s),
    }
}

/// Splits text into lines ended by `\n`, `\r` or `\r\n`.
///
/// Terminators are dropped and a trailing terminator doesn't start a new line.
pub(crate) fn split_lines(text: &str) -> Vec<String> {
    let bytes = text.as_bytes();
    let mut lines = Vec::new();
    let mut start = 0;

    while let Some(rel_idx) = memchr::memchr2(b'\r', b'\n', &bytes[start..]) {
        let idx = start + rel_idx;
        lines.push(text[start..idx].to_owned());

        start = idx + 1;
        if bytes[idx] == b'\r' && bytes.get(start) == Some(&b'\n') {
            start += 1;
        }
    }

    if start < bytes.len() {
        lines.push(text[start..].to_owned());
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http_body_util::Full;

    fn reply(status: u16, body: &'static [u8]) -> Response<Full<Bytes>> {
        Response::builder()
            .status(status)
            .body(Full::new(Bytes::from_static(body)))
            .unwrap()
    }

    #[test]
    fn test_split_lines() {
        assert_eq!(split_lines("OK\n"), vec!["OK"]);
        assert_eq!(split_lines("OK"), vec!["OK"]);
        assert_eq!(split_lines("a\r\nb\rc\nd"), vec!["a", "b", "c", "d"]);
        assert_eq!(split_lines("a\n\nb\n"), vec!["a", "", "b"]);
        assert_eq!(split_lines("héllo\r\nwörld\r\n"), vec!["héllo", "wörld"]);
        assert!(split_lines("").is_empty());
    }

    #[tokio::test]
    async fn test_success_statuses_yield_lines() {
        assert_eq!(into_lines(reply(200, b"OK\n")).await, Ok(vec!["OK".to_owned()]));
        assert_eq!(
            into_lines(reply(201, b"{\"id\":1}\r\ndone")).await,
            Ok(vec!["{\"id\":1}".to_owned(), "done".to_owned()])
        );
        assert_eq!(into_lines(reply(200, b"")).await, Ok(vec![]));
    }

    #[tokio::test]
    async fn test_other_statuses_fail() {
        for status in [202u16, 204, 301, 400, 401, 404, 500].iter() {
            let err = into_lines(reply(*status, b"nope\n")).await.unwrap_err();
            assert_eq!(err.status().map(|s| s.as_u16()), Some(*status));
        }
    }

    #[tokio::test]
    async fn test_reply_decoded_with_declared_charset() {
        let res = Response::builder()
            .status(200)
            .header(header::CONTENT_TYPE, "text/plain; charset=ISO-8859-1")
            .body(Full::new(Bytes::from_static(b"caf\xe9\n")))
            .unwrap();

        assert_eq!(into_lines(res).await, Ok(vec!["café".to_owned()]));
    }
}
