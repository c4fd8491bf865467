//! The unit of data handed to a publisher.
//!
//! A [`Message`] is a set of named string headers plus a text body. It is
//! immutable once built and cheap to clone, so the same message can be
//! handed to several publishers or retried by the caller.
//!
//! Broker clients that only carry a single value per record receive the
//! message rendered as a text envelope (see [`Message::to_envelope`]):
//!
//! ```text
//! FTMSG/1.0\r\n
//! Content-Type: application/json\r\n
//! X-Request-Id: tid_123\r\n
//! \r\n
//! {"foo":"bar"}
//! ```

use std::collections::BTreeMap;
use std::fmt;

/// First line of an encoded envelope.
pub const ENVELOPE_PREAMBLE: &str = "FTMSG/1.0";

const CRLF: &str = "\r\n";

/// A publish request payload.
///
/// Headers are unique by name; their order carries no meaning, so they are
/// kept sorted to make encoding deterministic.
///
/// # Examples
///
/// ```
/// use tenacious_producer::Message;
///
/// let message = Message::new([("X-Request-Id", "tid_123")], r#"{"foo":"bar"}"#);
/// assert_eq!(message.header("X-Request-Id"), Some("tid_123"));
/// assert_eq!(message.body(), r#"{"foo":"bar"}"#);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Message {
    #[cfg_attr(feature = "serde", serde(default))]
    headers: BTreeMap<String, String>,
    #[cfg_attr(feature = "serde", serde(default))]
    body: String,
}

impl Message {
    /// Creates a message from any collection of header pairs and a body.
    ///
    /// An empty header collection is valid and yields a message without
    /// headers. When the same name appears twice, the last value wins.
    pub fn new<I, K, V>(headers: I, body: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            headers: headers
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            body: body.into(),
        }
    }

    /// Creates a message that carries no headers.
    pub fn with_body(body: impl Into<String>) -> Self {
        Self {
            headers: BTreeMap::new(),
            body: body.into(),
        }
    }

    /// Starts building a message header by header.
    pub fn builder() -> MessageBuilder {
        MessageBuilder::default()
    }

    /// Returns all headers.
    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    /// Returns a single header value.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    /// Returns the body.
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Splits the message into its headers and body.
    pub fn into_parts(self) -> (BTreeMap<String, String>, String) {
        (self.headers, self.body)
    }

    /// Renders the message as a text envelope.
    ///
    /// The preamble line is followed by one `Name: value` line per header,
    /// an empty line, and the body verbatim. A CR or LF inside a header name
    /// or value is written as a space, so a header can never end the header
    /// block early.
    pub fn to_envelope(&self) -> String {
        let headers_len: usize = self
            .headers
            .iter()
            .map(|(k, v)| k.len() + v.len() + 4)
            .sum();
        let mut out =
            String::with_capacity(ENVELOPE_PREAMBLE.len() + headers_len + self.body.len() + 4);

        out.push_str(ENVELOPE_PREAMBLE);
        out.push_str(CRLF);
        for (name, value) in &self.headers {
            push_header_text(&mut out, name);
            out.push_str(": ");
            push_header_text(&mut out, value);
            out.push_str(CRLF);
        }
        out.push_str(CRLF);
        out.push_str(&self.body);
        out
    }

    /// Parses a text envelope back into a message.
    ///
    /// The header section ends at the first blank line (`\r\n\r\n`, or
    /// `\n\n` for envelopes that went through line-ending normalisation).
    /// Header lines without a `:` are skipped and the body is trimmed. Input
    /// without a header section is taken as a body-only message.
    ///
    /// ```
    /// use tenacious_producer::Message;
    ///
    /// let raw = "FTMSG/1.0\r\nX-Request-Id: tid_1\r\n\r\nhello";
    /// let message = Message::from_envelope(raw);
    /// assert_eq!(message.header("X-Request-Id"), Some("tid_1"));
    /// assert_eq!(message.body(), "hello");
    /// ```
    pub fn from_envelope(raw: &str) -> Self {
        let split = raw
            .find("\r\n\r\n")
            .map(|idx| (idx, 4))
            .or_else(|| raw.find("\n\n").map(|idx| (idx, 2)));

        let Some((idx, sep_len)) = split else {
            return Self::with_body(raw.trim());
        };

        let (head, rest) = raw.split_at(idx);
        let body = rest[sep_len..].trim();

        let headers = head
            .lines()
            .map(|line| line.trim_end_matches('\r'))
            .filter(|line| !line.starts_with("FTMSG/"))
            .filter_map(|line| line.split_once(':'))
            .map(|(name, value)| (name.trim(), value.trim()))
            .filter(|(name, _)| !name.is_empty());

        Self::new(headers, body)
    }
}

fn push_header_text(out: &mut String, text: &str) {
    out.extend(text.chars().map(|c| match c {
        '\r' | '\n' => ' ',
        c => c,
    }));
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_envelope())
    }
}

/// Builder for [`Message`].
#[derive(Debug, Default, Clone)]
pub struct MessageBuilder {
    headers: BTreeMap<String, String>,
    body: String,
}

impl MessageBuilder {
    /// Adds a header, replacing any previous value of the same name.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Sets the body.
    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// Builds the message.
    pub fn build(self) -> Message {
        Message {
            headers: self.headers,
            body: self.body,
        }
    }
}
