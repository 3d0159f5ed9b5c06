use std::fmt;

/// A wrapper type for API keys and other credentials
///
/// `Secret<T>` hides the inner value in debug output and display implementations
/// so a key can sit inside configs, adapters and error contexts without ever
/// reaching a log line. It deliberately does not implement `Serialize`.
///
/// # Examples
///
/// ```
/// use parley_core::Secret;
///
/// let api_key = Secret::new("sk-live-123".to_string());
/// assert_eq!(format!("{api_key}"), "••••••");
/// assert_eq!(format!("{api_key:?}"), "[REDACTED]");
/// ```
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Secret<T>(T);

impl<T> fmt::Debug for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl<T> fmt::Display for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("••••••")
    }
}

impl<T> Secret<T> {
    pub fn new(value: T) -> Self {
        Secret(value)
    }

    /// Gets a reference to the inner value
    ///
    /// Only call this at the point where the credential is written into a request.
    pub fn expose(&self) -> &T {
        &self.0
    }
}

impl Secret<String> {
    /// True when the credential is empty or whitespace only
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// Formats the credential as an HTTP bearer token
    pub(crate) fn bearer(&self) -> String {
        format!("Bearer {}", self.0.trim())
    }
}

impl From<String> for Secret<String> {
    fn from(value: String) -> Self {
        Secret(value)
    }
}

impl From<&str> for Secret<String> {
    fn from(value: &str) -> Self {
        Secret(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_debug() {
        let secret = Secret::new("api-key-123");
        assert_eq!(format!("{:?}", secret), "[REDACTED]");
    }

    #[test]
    fn test_secret_display() {
        let secret = Secret::new("api-key-123");
        assert_eq!(format!("{}", secret), "••••••");
    }

    #[test]
    fn test_secret_expose_and_bearer() {
        let secret = Secret::from(" api-key-123 ");
        assert_eq!(secret.expose(), " api-key-123 ");
        assert_eq!(secret.bearer(), "Bearer api-key-123");
    }

    #[test]
    fn test_blank_secret() {
        assert!(Secret::from("").is_blank());
        assert!(Secret::from("   ").is_blank());
        assert!(!Secret::from("k").is_blank());
    }
}
