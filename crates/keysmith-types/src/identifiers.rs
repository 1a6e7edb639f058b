//! Type-safe identifiers for hosts and secrets.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use crate::errors::{KeysmithError, Result};

/// A validated host name.
///
/// Host names must:
/// - Start with an ASCII letter or digit
/// - Contain only ASCII letters, digits, hyphens, underscores, and dots
///
/// # Example
///
/// ```
/// use keysmith_types::HostName;
///
/// let host = HostName::new("db.internal").unwrap();
/// assert_eq!(host.as_str(), "db.internal");
///
/// // Invalid names are rejected
/// assert!(HostName::new("-web").is_err());
/// assert!(HostName::new("web 1").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HostName(String);

impl HostName {
    /// Create a new validated host name.
    ///
    /// # Errors
    ///
    /// Returns an error if the name doesn't meet validation requirements.
    pub fn new(name: impl AsRef<str>) -> Result<Self> {
        let name = name.as_ref();
        if !Self::is_valid(name) {
            return Err(KeysmithError::Validation(format!(
                "Invalid host name '{}': must start with a letter or digit and contain only \
                letters, digits, '-', '_' and '.'",
                name
            )));
        }
        Ok(Self(name.to_string()))
    }

    /// Check if a name is valid without allocating.
    pub fn is_valid(name: &str) -> bool {
        let mut chars = name.chars();
        match chars.next() {
            Some(first) if first.is_ascii_alphanumeric() => {}
            _ => return false,
        }
        chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
    }

    /// Get the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Extract a host name from a host file path.
    ///
    /// The file stem (filename without extension) is the host name.
    ///
    /// # Errors
    ///
    /// Returns an error if the path doesn't contain a valid host name.
    pub fn from_path(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let path = path.as_ref();

        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| KeysmithError::Validation(
                format!("Cannot extract host name from path: {:?}", path)
            ))?;

        Self::new(stem)
    }
}

impl fmt::Display for HostName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for HostName {
    type Err = KeysmithError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for HostName {
    type Error = KeysmithError;

    fn try_from(s: String) -> Result<Self> {
        Self::new(s)
    }
}

impl From<HostName> for String {
    fn from(name: HostName) -> Self {
        name.0
    }
}

/// A validated secret name, unique within one host.
///
/// Secret names start with a letter, digit, or underscore and contain only
/// letters, digits, hyphens, and underscores. All-digit names are rejected
/// because `{{deps.N.*}}` placeholders read a number as a position.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SecretName(String);

impl SecretName {
    /// Create a new validated secret name.
    pub fn new(name: impl AsRef<str>) -> Result<Self> {
        let name = name.as_ref();
        if !Self::is_valid(name) {
            return Err(KeysmithError::Validation(format!(
                "Invalid secret name '{}': must contain only letters, digits, '-' and '_', \
                and not only digits",
                name
            )));
        }
        Ok(Self(name.to_string()))
    }

    /// Check if a name is valid without allocating.
    pub fn is_valid(name: &str) -> bool {
        let mut chars = name.chars();
        match chars.next() {
            Some(first) if first.is_ascii_alphanumeric() || first == '_' => {}
            _ => return false,
        }
        chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_'))
            && !name.bytes().all(|b| b.is_ascii_digit())
    }

    /// Get the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SecretName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SecretName {
    type Err = KeysmithError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for SecretName {
    type Error = KeysmithError;

    fn try_from(s: String) -> Result<Self> {
        Self::new(s)
    }
}

impl From<SecretName> for String {
    fn from(name: SecretName) -> Self {
        name.0
    }
}

/// One declaration site of a secret: the host and the name it uses there.
///
/// # Example
///
/// ```
/// use keysmith_types::{Definition, HostName, SecretName};
///
/// let def = Definition {
///     host: HostName::new("web").unwrap(),
///     secret: SecretName::new("tls-key").unwrap(),
/// };
///
/// assert_eq!(def.to_string(), "web:tls-key");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Definition {
    /// Declaring host
    pub host: HostName,
    /// Secret name on that host
    pub secret: SecretName,
}

impl fmt::Display for Definition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.secret)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_host_name_validation() {
        assert!(HostName::new("web").is_ok());
        assert!(HostName::new("web-1.example.org").is_ok());
        assert!(HostName::new("1host").is_ok());

        assert!(HostName::new("").is_err());
        assert!(HostName::new(".hidden").is_err());
        assert!(HostName::new("-web").is_err());
        assert!(HostName::new("web/1").is_err());
    }

    #[test]
    fn test_secret_name_validation() {
        assert!(SecretName::new("root-key").is_ok());
        assert!(SecretName::new("_private").is_ok());
        assert!(SecretName::new("2fa-seed").is_ok());

        assert!(SecretName::new("").is_err());
        assert!(SecretName::new("a.b").is_err());
        assert!(SecretName::new("-x").is_err());
    }

    #[test]
    fn test_secret_name_cannot_be_a_position() {
        assert!(SecretName::new("1").is_err());
        assert!(SecretName::new("007").is_err());
        let bad: std::result::Result<SecretName, _> = serde_yaml::from_str("\"0\"");
        assert!(bad.is_err());
    }

    #[test]
    fn test_host_name_from_path() {
        let host = HostName::from_path("hosts/db-1.yml").unwrap();
        assert_eq!(host.as_str(), "db-1");
    }

    #[test]
    fn test_serde_rejects_invalid_names() {
        let ok: std::result::Result<SecretName, _> = serde_yaml::from_str("root");
        assert!(ok.is_ok());
        let bad: std::result::Result<SecretName, _> = serde_yaml::from_str("\"bad name\"");
        assert!(bad.is_err());
    }

    proptest! {
        #[test]
        fn prop_valid_host_names_roundtrip(name in "[a-z0-9][a-z0-9._-]{0,20}") {
            let host = HostName::new(&name).unwrap();
            prop_assert_eq!(host.to_string(), name);
        }

        #[test]
        fn prop_whitespace_never_valid(prefix in "[a-z]{1,5}", suffix in "[a-z]{0,5}") {
            let name = format!("{} {}", prefix, suffix);
            prop_assert!(!HostName::is_valid(&name));
            prop_assert!(!SecretName::is_valid(&name));
        }
    }
}
