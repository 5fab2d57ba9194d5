//! Redacting wrapper for secret values.

use std::fmt;

use serde::{Deserialize, Serialize};

const REDACTED: &str = "[redacted]";

/// A string that must never be logged or rendered in a plan.
///
/// `Debug` prints a fixed placeholder and there is deliberately no `Display`
/// impl. Serialization writes the raw value so it can be persisted in the
/// state file and sent on the wire; call [`Sensitive::expose`] to read it.
#[derive(Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Sensitive(String);

impl Sensitive {
    /// Wrap a secret value.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Borrow the raw secret.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Whether the secret is the empty string.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Sensitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

impl From<String> for Sensitive {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for Sensitive {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_is_redacted() {
        let secret = Sensitive::new("https://blob.example/sas?sig=abc");
        let rendered = format!("{secret:?}");
        assert_eq!(rendered, REDACTED);
        assert!(!rendered.contains("sig=abc"));
    }

    #[test]
    fn test_debug_redacted_inside_structs() {
        #[derive(Debug)]
        #[allow(dead_code)]
        struct Holder {
            url: Sensitive,
        }
        let rendered = format!("{:?}", Holder { url: "s3cr3t".into() });
        assert!(!rendered.contains("s3cr3t"));
    }

    #[test]
    fn test_serde_is_transparent() -> Result<(), serde_json::Error> {
        let secret = Sensitive::new("s1");
        let json = serde_json::to_string(&secret)?;
        assert_eq!(json, "\"s1\"");

        let back: Sensitive = serde_json::from_str(&json)?;
        assert_eq!(back.expose(), "s1");
        Ok(())
    }
}
