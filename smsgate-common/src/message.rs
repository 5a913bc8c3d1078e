//! Outgoing message representations
//!
//! A [`Message`] is either opaque [`RawMessage`] bytes, which carry no
//! addressing information a transport could use, or a structured [`Sms`]
//! exposing its `From` and `To` fields. Envelope resolution and API-style
//! transports branch on this tag rather than inspecting the payload.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{error::MessageParseError, phone::Phone};

const FROM: &str = "From";
const TO: &str = "To";

/// Opaque serialised message bytes
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawMessage(Arc<[u8]>);

impl RawMessage {
    #[must_use]
    pub fn new(bytes: impl Into<Arc<[u8]>>) -> Self {
        Self(bytes.into())
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for RawMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.0))
    }
}

impl From<&str> for RawMessage {
    fn from(value: &str) -> Self {
        Self(Arc::from(value.as_bytes()))
    }
}

impl From<Vec<u8>> for RawMessage {
    fn from(value: Vec<u8>) -> Self {
        Self(Arc::from(value))
    }
}

/// A structured SMS with addressing headers and a text body
///
/// # Examples
///
/// ```
/// use smsgate_common::{Phone, Sms};
///
/// let sms = Sms::new().from("+100").to(["+2000", "+3000"]).text("Hello");
/// assert_eq!(sms.from_phone(), Some(&Phone::new("+100")));
/// assert_eq!(sms.recipients().len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Sms {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    from: Option<Phone>,
    #[serde(default)]
    to: Vec<Phone>,
    #[serde(default)]
    headers: Vec<(String, String)>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

impl Sms {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the sender; an empty phone leaves it unset
    #[must_use]
    pub fn from(mut self, phone: impl Into<Phone>) -> Self {
        self.set_from(phone.into());
        self
    }

    /// Set or replace the recipients, dropping empty phones
    #[must_use]
    pub fn to<I, P>(mut self, phones: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<Phone>,
    {
        self.to.clear();
        self.to.extend(non_empty(phones));
        self
    }

    /// Append recipients, keeping the existing ones
    #[must_use]
    pub fn add_to<I, P>(mut self, phones: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<Phone>,
    {
        self.to.extend(non_empty(phones));
        self
    }

    #[must_use]
    pub fn text(mut self, body: impl Into<String>) -> Self {
        self.text = Some(body.into());
        self
    }

    /// Builder form of [`add_header`](Self::add_header)
    #[must_use]
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        self.add_header(name, value);
        self
    }

    /// Add an extra header
    ///
    /// Line breaks in the name or value are folded into single spaces so a
    /// header always serialises to one line.
    pub fn add_header(&mut self, name: impl AsRef<str>, value: impl AsRef<str>) {
        self.headers
            .push((fold_line(name.as_ref()), fold_line(value.as_ref())));
    }

    pub fn set_from(&mut self, phone: Phone) {
        self.from = (!phone.is_empty()).then_some(phone);
    }

    pub fn set_recipients(&mut self, phones: Vec<Phone>) {
        self.to = non_empty(phones).collect();
    }

    /// Check whether a header is present, `From` and `To` included.
    ///
    /// Header names are compared case-insensitively.
    #[must_use]
    pub fn has_header(&self, name: &str) -> bool {
        if name.eq_ignore_ascii_case(FROM) {
            return self.from.is_some();
        }

        if name.eq_ignore_ascii_case(TO) {
            return !self.to.is_empty();
        }

        self.headers.iter().any(|(key, _)| key.eq_ignore_ascii_case(name))
    }

    #[must_use]
    pub const fn from_phone(&self) -> Option<&Phone> {
        self.from.as_ref()
    }

    #[must_use]
    pub fn recipients(&self) -> &[Phone] {
        &self.to
    }

    #[must_use]
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    #[must_use]
    pub fn body(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Serialise into header lines, a blank line and the body
    #[must_use]
    pub fn to_raw(&self) -> RawMessage {
        let mut out = String::new();

        if let Some(from) = &self.from {
            out.push_str(&format!("{FROM}: {from}\r\n"));
        }

        if !self.to.is_empty() {
            let to = self
                .to
                .iter()
                .map(Phone::as_str)
                .collect::<Vec<_>>()
                .join(", ");
            out.push_str(&format!("{TO}: {to}\r\n"));
        }

        for (name, value) in &self.headers {
            out.push_str(name);
            out.push_str(": ");
            out.push_str(value);
            out.push_str("\r\n");
        }

        out.push_str("\r\n");

        if let Some(text) = &self.text {
            out.push_str(text);
        }

        RawMessage::from(out.as_str())
    }

    /// Parse a raw message (header block, blank line, body) into an `Sms`
    ///
    /// `From` keeps the first phone listed; `To` may be repeated and holds a
    /// comma separated list. Every other header is kept verbatim.
    ///
    /// # Errors
    ///
    /// Returns an error if the header block is malformed or `From` is empty.
    pub fn parse(raw: &[u8]) -> Result<Self, MessageParseError> {
        let parsed = mailparse::parse_mail(raw)?;
        let mut sms = Self::new();

        for header in &parsed.headers {
            let key = header.get_key();
            let value = header.get_value();

            if key.eq_ignore_ascii_case(FROM) {
                let phone = split_phones(&value)
                    .next()
                    .ok_or(MessageParseError::EmptyHeader(FROM))?;
                sms.from = Some(phone);
            } else if key.eq_ignore_ascii_case(TO) {
                sms.to.extend(split_phones(&value));
            } else {
                sms.add_header(key, value);
            }
        }

        let body = parsed.get_body()?;
        let body = body.trim_end_matches(['\r', '\n']);
        if !body.is_empty() {
            sms.text = Some(body.to_string());
        }

        Ok(sms)
    }
}

fn non_empty<I, P>(phones: I) -> impl Iterator<Item = Phone>
where
    I: IntoIterator<Item = P>,
    P: Into<Phone>,
{
    phones
        .into_iter()
        .map(Into::into)
        .filter(|phone: &Phone| !phone.is_empty())
}

fn fold_line(value: &str) -> String {
    value
        .split(['\r', '\n'])
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn split_phones(value: &str) -> impl Iterator<Item = Phone> + '_ {
    value
        .split(',')
        .map(str::trim)
        .filter(|phone| !phone.is_empty())
        .map(Phone::new)
}

/// An outgoing message, tagged by whether it can yield addressing information
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// Opaque bytes without usable sender/recipient fields
    Raw(RawMessage),
    /// A structured SMS exposing `From` and `To`
    Structured(Sms),
}

impl Message {
    #[must_use]
    pub const fn as_sms(&self) -> Option<&Sms> {
        match self {
            Self::Structured(sms) => Some(sms),
            Self::Raw(_) => None,
        }
    }

    pub const fn as_sms_mut(&mut self) -> Option<&mut Sms> {
        match self {
            Self::Structured(sms) => Some(sms),
            Self::Raw(_) => None,
        }
    }

    #[must_use]
    pub const fn is_structured(&self) -> bool {
        matches!(self, Self::Structured(_))
    }

    /// The serialised form of this message
    #[must_use]
    pub fn to_raw(&self) -> RawMessage {
        match self {
            Self::Raw(raw) => raw.clone(),
            Self::Structured(sms) => sms.to_raw(),
        }
    }

    /// A short label for logs: `sms` or `raw`
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Raw(_) => "raw",
            Self::Structured(_) => "sms",
        }
    }
}

impl From<Sms> for Message {
    fn from(value: Sms) -> Self {
        Self::Structured(value)
    }
}

impl From<RawMessage> for Message {
    fn from(value: RawMessage) -> Self {
        Self::Raw(value)
    }
}
