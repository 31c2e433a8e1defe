//! TLS protocol version ceiling

use openssl::ssl::SslVersion;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::common::RelayError;

/// Highest TLS protocol version the connector will negotiate
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TlsVersion {
    Tls1_0,
    Tls1_1,
    Tls1_2,
    Tls1_3,
}

impl TlsVersion {
    /// The openssl protocol constant for this version
    pub fn to_ssl_version(self) -> SslVersion {
        match self {
            Self::Tls1_0 => SslVersion::TLS1,
            Self::Tls1_1 => SslVersion::TLS1_1,
            Self::Tls1_2 => SslVersion::TLS1_2,
            Self::Tls1_3 => SslVersion::TLS1_3,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Tls1_0 => "1.0",
            Self::Tls1_1 => "1.1",
            Self::Tls1_2 => "1.2",
            Self::Tls1_3 => "1.3",
        }
    }
}

impl Default for TlsVersion {
    /// Remote nodes we talk to still terminate TLS 1.2 only
    #[inline]
    fn default() -> Self {
        Self::Tls1_2
    }
}

impl fmt::Display for TlsVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TLSv{}", self.as_str())
    }
}

impl FromStr for TlsVersion {
    type Err = RelayError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        let normalized = normalized
            .trim_start_matches("tlsv")
            .trim_start_matches("tls")
            .trim_start_matches('v')
            .replace('_', ".");

        match normalized.as_str() {
            "1" | "1.0" => Ok(Self::Tls1_0),
            "1.1" => Ok(Self::Tls1_1),
            "1.2" => Ok(Self::Tls1_2),
            "1.3" => Ok(Self::Tls1_3),
            _ => Err(RelayError::Config(format!(
                "Invalid TLS version: {}. Valid values are: 1.0, 1.1, 1.2, 1.3",
                s
            ))),
        }
    }
}

impl Serialize for TlsVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

// Accept "1.2", "TLSv1.2", "tls1_2" and friends
impl<'de> Deserialize<'de> for TlsVersion {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        TlsVersion::from_str(&s).map_err(serde::de::Error::custom)
    }
}
