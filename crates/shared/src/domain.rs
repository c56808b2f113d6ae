use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Direction of a transformation request. Selected explicitly by the user
/// and never changed while a request is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationMode {
    Encrypt,
    Decrypt,
}

impl OperationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationMode::Encrypt => "encrypt",
            OperationMode::Decrypt => "decrypt",
        }
    }
}

impl fmt::Display for OperationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperationMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "encrypt" => Ok(OperationMode::Encrypt),
            "decrypt" => Ok(OperationMode::Decrypt),
            other => Err(format!("unknown mode '{other}'")),
        }
    }
}

/// Transformation algorithms offered by the processing service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    Caesar,
    Fernet,
    Hash,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Caesar => "caesar",
            Method::Fernet => "fernet",
            Method::Hash => "hash",
        }
    }

    /// Fernet derives its key from a user secret; the other methods run
    /// with the service default.
    pub fn requires_secret(&self) -> bool {
        matches!(self, Method::Fernet)
    }

    /// Hashing is one-way; the service rejects decrypt requests for it.
    pub fn supports_decrypt(&self) -> bool {
        !matches!(self, Method::Hash)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "caesar" => Ok(Method::Caesar),
            "fernet" => Ok(Method::Fernet),
            "hash" => Ok(Method::Hash),
            other => Err(format!("unknown method '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrengthTier {
    Weak,
    Medium,
    Strong,
}

impl fmt::Display for StrengthTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            StrengthTier::Weak => "weak",
            StrengthTier::Medium => "medium",
            StrengthTier::Strong => "strong",
        };
        f.write_str(label)
    }
}

/// Result of scoring a candidate secret. `value` is always within 0..=100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrengthScore {
    pub value: u8,
    pub tier: StrengthTier,
}
