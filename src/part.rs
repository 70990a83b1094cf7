use std::borrow::Cow;

use bytes::{BufMut, Bytes, BytesMut};
use encoding_rs::Encoding;
use mime::Mime;

use crate::constants;

/// Escapes a value placed inside a quoted `Content-Disposition` parameter.
pub(crate) fn escape_quoted(value: &str) -> Cow<'_, str> {
    if !value.contains(|ch: char| matches!(ch, '"' | '\r' | '\n')) {
        return Cow::Borrowed(value);
    }

    let mut escaped = String::with_capacity(value.len() + 8);
    for ch in value.chars() {
        match ch {
            '"' => escaped.push_str("%22"),
            '\r' => escaped.push_str("%0D"),
            '\n' => escaped.push_str("%0A"),
            ch => escaped.push(ch),
        }
    }
    Cow::Owned(escaped)
}

/// A text-part charset: the label announced in `Content-Type` and the
/// encoding that produces the value bytes.
#[derive(Debug, Clone)]
pub(crate) struct TextCharset {
    label: String,
    encoding: &'static Encoding,
}

impl TextCharset {
    /// Resolves `label` to an encoding.
    ///
    /// Labels encoding_rs can only decode (UTF-16, `replacement`) are
    /// announced as the encoding actually written.
    pub(crate) fn resolve(label: &str) -> crate::Result<TextCharset> {
        let encoding = Encoding::for_label(label.as_bytes())
            .ok_or_else(|| crate::Error::UnsupportedCharset(label.to_owned()))?;

        let output = encoding.output_encoding();
        if output != encoding {
            log::warn!("charset {} can't be written, announcing {} instead", label, output.name());
            return Ok(TextCharset {
                label: output.name().to_owned(),
                encoding: output,
            });
        }

        Ok(TextCharset {
            label: label.to_owned(),
            encoding,
        })
    }

    pub(crate) fn label(&self) -> &str {
        &self.label
    }
}

fn put_line(buf: &mut BytesMut, line: &str) {
    buf.put_slice(line.as_bytes());
    buf.put_slice(constants::CRLF.as_bytes());
}

fn put_delimiter(buf: &mut BytesMut, boundary: &str) {
    buf.put_slice(constants::BOUNDARY_EXT.as_bytes());
    put_line(buf, boundary);
}

/// Encodes a complete text part: delimiter, headers, value and the closing CRLF.
pub(crate) fn form_field(boundary: &str, name: &str, value: &str, charset: &TextCharset) -> Bytes {
    let (value, _, _) = charset.encoding.encode(value);

    let mut buf = BytesMut::with_capacity(boundary.len() + name.len() + value.len() + 96);
    put_delimiter(&mut buf, boundary);
    put_line(
        &mut buf,
        &format!("Content-Disposition: form-data; name=\"{}\"", escape_quoted(name)),
    );
    put_line(&mut buf, &format!("Content-Type: text/plain; charset={}", charset.label));
    buf.put_slice(constants::CRLF.as_bytes());
    buf.put_slice(&value);
    buf.put_slice(constants::CRLF.as_bytes());
    buf.freeze()
}

/// Encodes the head of a file part, up to and including the blank line that
/// precedes the raw content.
pub(crate) fn file_part_head(boundary: &str, field_name: &str, filename: &str, content_type: &Mime) -> Bytes {
    let mut buf = BytesMut::with_capacity(boundary.len() + field_name.len() + filename.len() + 128);
    put_delimiter(&mut buf, boundary);
    put_line(
        &mut buf,
        &format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"",
            escape_quoted(field_name),
            escape_quoted(filename)
        ),
    );
    put_line(&mut buf, &format!("Content-Type: {}", content_type));
    put_line(&mut buf, "Content-Transfer-Encoding: binary");
    buf.put_slice(constants::CRLF.as_bytes());
    buf.freeze()
}

/// Encodes a raw `name: value` line written at the current body position.
///
/// Line breaks are rejected so the line can't forge delimiters or parts.
pub(crate) fn header_line(name: &str, value: &str) -> crate::Result<Bytes> {
    if name.contains(is_line_break) || value.contains(is_line_break) {
        return Err(crate::Error::InvalidHeaderLine { name: name.to_owned() });
    }

    let mut buf = BytesMut::with_capacity(name.len() + value.len() + 4);
    put_line(&mut buf, &format!("{}: {}", name, value));
    Ok(buf.freeze())
}

fn is_line_break(ch: char) -> bool {
    ch == '\r' || ch == '\n'
}

/// The CRLF that ends the raw content of a file part.
pub(crate) fn part_end() -> Bytes {
    Bytes::from_static(constants::CRLF.as_bytes())
}

/// Encodes the closing delimiter `--<boundary>--\r\n`.
pub(crate) fn closing_delimiter(boundary: &str) -> Bytes {
    let mut buf = BytesMut::with_capacity(boundary.len() + 6);
    buf.put_slice(constants::BOUNDARY_EXT.as_bytes());
    buf.put_slice(boundary.as_bytes());
    put_line(&mut buf, constants::BOUNDARY_EXT);
    buf.freeze()
}
