//! Phone newtype for type safety
//!
//! Wraps phone strings so that recipients and senders can't be confused with
//! arbitrary text (message bodies, header values). Number validation and
//! normalisation are left to the caller; the only cleanup performed here is
//! trimming and dropping the `@carrier` suffix some gateways append.

use std::{
    fmt::{self, Display},
    ops::Deref,
    sync::Arc,
};

use serde::{Deserialize, Serialize};

const CARRIER_SUFFIX: &str = "@carrier";

/// A phone number used as a message sender or recipient
///
/// # Examples
///
/// ```
/// use smsgate_common::Phone;
///
/// let phone = Phone::new("+33600000000");
/// assert_eq!(phone.as_str(), "+33600000000");
///
/// let phone: Phone = "+100@carrier".into();
/// assert_eq!(phone.as_str(), "+100");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
#[repr(transparent)]
pub struct Phone(Arc<str>);

impl Phone {
    /// Create a new `Phone`, trimming whitespace and any `@carrier` suffix
    #[must_use]
    pub fn new(s: impl AsRef<str>) -> Self {
        let s = s.as_ref().trim();
        let s = s.strip_suffix(CARRIER_SUFFIX).unwrap_or(s);
        Self(Arc::from(s))
    }

    /// Get the phone as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Convert the phone into the inner `Arc<str>`
    #[must_use]
    pub fn into_inner(self) -> Arc<str> {
        self.0
    }
}

impl Display for Phone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Phone {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Deref for Phone {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<String> for Phone {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for Phone {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<&Phone> for Phone {
    fn from(phone: &Phone) -> Self {
        phone.clone()
    }
}

impl From<Phone> for String {
    fn from(phone: Phone) -> Self {
        phone.0.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phone_trims_and_strips_carrier() {
        assert_eq!(Phone::new("  +100 ").as_str(), "+100");
        assert_eq!(Phone::new("+100@carrier").as_str(), "+100");
        assert_eq!(Phone::new("+100@example").as_str(), "+100@example");
    }

    #[test]
    fn test_phone_equality_after_cleanup() {
        let a = Phone::from("+2000");
        let b = Phone::from(String::from("+2000@carrier"));
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "+2000");
    }

    #[test]
    fn test_phone_deref() {
        let phone = Phone::new("+100");
        assert!(phone.starts_with('+'));
        assert_eq!(phone.len(), 4);
    }
}
