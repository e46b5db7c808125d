//! External gambling providers and the credentials used to reach them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::DomainError;

/// The closed set of external game providers a session can be launched on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderType {
    Evolution,
    Pragmatic,
    Microgaming,
    Habanero,
}

impl ProviderType {
    /// Every supported provider, in declaration order.
    pub const ALL: [ProviderType; 4] = [
        ProviderType::Evolution,
        ProviderType::Pragmatic,
        ProviderType::Microgaming,
        ProviderType::Habanero,
    ];

    /// Stable lowercase name used in storage and configuration.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Evolution => "evolution",
            Self::Pragmatic => "pragmatic",
            Self::Microgaming => "microgaming",
            Self::Habanero => "habanero",
        }
    }
}

impl fmt::Display for ProviderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| DomainError::UnknownProvider(s.to_string()))
    }
}

/// Credential set a root partner holds for one provider.
///
/// Read-only from this service's point of view. `Debug` never prints the
/// secret key or access token.
#[derive(Clone, PartialEq, Eq)]
pub struct ProviderCredential {
    pub provider: ProviderType,
    pub operator_code: String,
    pub secret_key: String,
    pub access_token: String,
}

impl fmt::Debug for ProviderCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderCredential")
            .field("provider", &self.provider)
            .field("operator_code", &self.operator_code)
            .field("secret_key", &"<redacted>")
            .field("access_token", &"<redacted>")
            .finish()
    }
}
