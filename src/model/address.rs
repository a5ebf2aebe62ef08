//! Sender address parsing (RFC 5322 §3.4).

/// A parsed email address.
///
/// # Examples
/// - `"Juan García <juan@ejemplo.com>"` → `display_name = "Juan García"`, `address = "juan@ejemplo.com"`
/// - `"<bounce@example.com>"` (a `Return-Path`) → `display_name = ""`, `address = "bounce@example.com"`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailAddress {
    /// Human-readable display name (may be empty).
    pub display_name: String,
    /// The bare email address (`user@domain`).
    pub address: String,
}

impl EmailAddress {
    /// Parse a single address from a header value.
    ///
    /// Supported formats:
    /// - `"user@domain.com"`
    /// - `"<user@domain.com>"`
    /// - `"Display Name <user@domain.com>"`
    /// - `"\"Display, Name\" <user@domain.com>"`
    ///
    /// Returns `None` for an empty value or the null reverse-path `<>`.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();

        let parsed = match (trimmed.rfind('<'), trimmed.rfind('>')) {
            (Some(open), Some(close)) if close > open => Self {
                display_name: strip_quotes(&trimmed[..open]),
                address: trimmed[open + 1..close].trim().to_string(),
            },
            _ => Self {
                display_name: String::new(),
                address: trimmed.to_string(),
            },
        };

        if parsed.address.is_empty() {
            None
        } else {
            Some(parsed)
        }
    }
}

/// Strip surrounding double-quotes and trim whitespace.
fn strip_quotes(s: &str) -> String {
    let trimmed = s.trim();
    if trimmed.starts_with('"') && trimmed.ends_with('"') && trimmed.len() >= 2 {
        trimmed[1..trimmed.len() - 1].trim().to_string()
    } else {
        trimmed.to_string()
    }
}

impl std::fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.display_name.is_empty() {
            f.write_str(&self.address)
        } else {
            write!(f, "{} <{}>", self.display_name, self.address)
        }
    }
}
