//! Transport DSN parsing
//!
//! A DSN selects and configures one transport:
//!
//! ```text
//! scheme://[user[:password]@]host[:port][?key=value&...]
//! ```
//!
//! User, password and query values are URL-decoded, so producers must
//! percent-encode reserved characters (`u%24er` decodes to `u$er`).

use std::{
    fmt::{self, Display},
    str::FromStr,
};

use ahash::AHashMap;
use percent_encoding::percent_decode_str;

use crate::error::DsnError;

/// Structured connection parameters of a single transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dsn {
    scheme: String,
    host: String,
    user: Option<String>,
    password: Option<String>,
    port: Option<u16>,
    options: AHashMap<String, String>,
}

impl Dsn {
    /// Build a DSN from already decoded parts
    ///
    /// # Errors
    ///
    /// Returns an error when `scheme` or `host` is empty.
    pub fn new(scheme: impl Into<String>, host: impl Into<String>) -> Result<Self, DsnError> {
        let scheme = scheme.into();
        let host = host.into();

        if scheme.is_empty() {
            return Err(DsnError::MissingScheme(format!("{scheme}://{host}")));
        }

        if host.is_empty() {
            return Err(DsnError::MissingHost(format!("{scheme}://{host}")));
        }

        Ok(Self {
            scheme,
            host,
            user: None,
            password: None,
            port: None,
            options: AHashMap::default(),
        })
    }

    #[must_use]
    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    #[must_use]
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    #[must_use]
    pub const fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    #[must_use]
    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    #[must_use]
    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    #[must_use]
    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    /// The parsed port, or `default` when none was given
    #[must_use]
    pub fn port(&self, default: Option<u16>) -> Option<u16> {
        self.port.or(default)
    }

    /// A query option; an empty value is still a present value
    #[must_use]
    pub fn option(&self, key: &str) -> Option<&str> {
        self.options.get(key).map(String::as_str)
    }

    #[must_use]
    pub fn option_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.option(key).unwrap_or(default)
    }

    #[must_use]
    pub const fn options(&self) -> &AHashMap<String, String> {
        &self.options
    }
}

impl FromStr for Dsn {
    type Err = DsnError;

    fn from_str(dsn: &str) -> Result<Self, Self::Err> {
        let malformed = || DsnError::Malformed(dsn.to_string());

        if dsn.trim().is_empty() {
            return Err(malformed());
        }

        let Some((scheme, rest)) = split_scheme(dsn) else {
            return Err(DsnError::MissingScheme(dsn.to_string()));
        };

        let Some(rest) = rest.strip_prefix("//") else {
            return Err(DsnError::MissingHost(dsn.to_string()));
        };

        if rest.is_empty() {
            return Err(malformed());
        }

        let (authority, rest) = rest.split_at(rest.find(['/', '?', '#']).unwrap_or(rest.len()));
        let query = rest
            .split_once('?')
            .map(|(_, query)| query.split_once('#').map_or(query, |(query, _)| query));

        if authority.chars().any(char::is_whitespace) {
            return Err(malformed());
        }

        let (userinfo, hostport) = match authority.rsplit_once('@') {
            Some((userinfo, hostport)) => (Some(userinfo), hostport),
            None => (None, authority),
        };

        let (host, port) = match hostport.rsplit_once(':') {
            Some((host, "")) => (host, None),
            Some((host, port)) => (host, Some(port.parse::<u16>().map_err(|_| malformed())?)),
            None => (hostport, None),
        };

        if host.is_empty() {
            return Err(DsnError::MissingHost(dsn.to_string()));
        }

        let (user, password) = match userinfo {
            Some(userinfo) => match userinfo.split_once(':') {
                Some((user, password)) => (Some(url_decode(user)), Some(url_decode(password))),
                None => (Some(url_decode(userinfo)), None),
            },
            None => (None, None),
        };

        let options = query
            .into_iter()
            .flat_map(|query| query.split('&'))
            .filter(|pair| !pair.is_empty())
            .map(|pair| match pair.split_once('=') {
                Some((key, value)) => (url_decode(key), url_decode(value)),
                None => (url_decode(pair), String::new()),
            })
            .collect();

        Ok(Self {
            scheme: scheme.to_string(),
            host: host.to_string(),
            user,
            password,
            port,
            options,
        })
    }
}

/// Split `scheme:` off the front, following the RFC 3986 scheme grammar
fn split_scheme(dsn: &str) -> Option<(&str, &str)> {
    let (scheme, rest) = dsn.split_once(':')?;
    let mut chars = scheme.chars();

    let valid = chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));

    valid.then_some((scheme, rest))
}

/// `+` is a space, then percent-decoding; invalid UTF-8 is replaced
fn url_decode(value: &str) -> String {
    let value = value.replace('+', " ");
    percent_decode_str(&value).decode_utf8_lossy().into_owned()
}

impl Display for Dsn {
    /// Renders the DSN for logs; the password is masked
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://", self.scheme)?;

        if let Some(user) = &self.user {
            f.write_str(user)?;
            if self.password.is_some() {
                f.write_str(":****")?;
            }
            f.write_str("@")?;
        }

        f.write_str(&self.host)?;

        if let Some(port) = self.port {
            write!(f, ":{port}")?;
        }

        let mut keys = self.options.keys().collect::<Vec<_>>();
        keys.sort();
        for (i, key) in keys.into_iter().enumerate() {
            let separator = if i == 0 { '?' } else { '&' };
            write!(f, "{separator}{key}={}", self.options[key])?;
        }

        Ok(())
    }
}
