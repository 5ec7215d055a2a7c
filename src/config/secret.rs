//! Credential handling built on the secrecy crate
//!
//! The database connection string carries a password, so it is held in a
//! [`SecretString`]: memory is zeroed on drop, `Debug` output is redacted and
//! the value is only reachable through `expose_secret()`.
//!
//! # Example
//!
//! ```rust
//! use formbridge::config::secret_string;
//! use secrecy::ExposeSecret;
//!
//! let dsn = secret_string("postgresql://fb:pw@localhost/erp".to_string());
//! assert!(dsn.expose_secret().is_postgres_url());
//! assert_eq!(dsn.expose_secret().redacted(), "postgresql://***@localhost/erp");
//! assert!(!format!("{dsn:?}").contains("pw@"));
//! ```

use secrecy::{CloneableSecret, DebugSecret, Secret, SerializableSecret};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use zeroize::Zeroize;

/// String newtype satisfying the traits [`Secret`] requires
#[derive(Clone, Debug, Zeroize)]
#[zeroize(drop)]
pub struct SecretValue(String);

impl CloneableSecret for SecretValue {}
impl DebugSecret for SecretValue {}
impl SerializableSecret for SecretValue {}

impl From<String> for SecretValue {
    fn from(s: String) -> Self {
        SecretValue(s)
    }
}

impl AsRef<str> for SecretValue {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl SecretValue {
    /// True for `postgresql://` and `postgres://` URLs
    pub fn is_postgres_url(&self) -> bool {
        ["postgresql://", "postgres://"]
            .iter()
            .any(|scheme| self.0.starts_with(scheme))
    }

    /// Connection string with credentials removed, safe to log
    ///
    /// URL forms keep only what follows the last `@`. Key/value forms that
    /// mention a password are hidden entirely.
    pub fn redacted(&self) -> String {
        match self.0.rsplit_once('@') {
            Some((_, host)) => format!("postgresql://***@{host}"),
            None if self.0.contains("password") => "postgresql://***".to_string(),
            None => self.0.clone(),
        }
    }
}

impl Serialize for SecretValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SecretValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        String::deserialize(deserializer).map(SecretValue)
    }
}

/// Zeroing, redacted string
pub type SecretString = Secret<SecretValue>;

/// Wraps `value` in a [`SecretString`]
#[inline]
pub fn secret_string(value: String) -> SecretString {
    Secret::new(SecretValue::from(value))
}
