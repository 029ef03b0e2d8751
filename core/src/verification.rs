//! Identity verification state attached to a user.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum VerificationError {
    #[error("status is invalid")]
    InvalidStatus,

    #[error("provider is invalid")]
    InvalidProvider,
}

/// Progress of a user's identity verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VerificationStatus {
    Pending,
    NotStarted,
    Completed,
    Failed,
}

impl VerificationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            VerificationStatus::Pending => "pending",
            VerificationStatus::NotStarted => "not-started",
            VerificationStatus::Completed => "completed",
            VerificationStatus::Failed => "failed",
        }
    }
}

impl FromStr for VerificationStatus {
    type Err = VerificationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(VerificationStatus::Pending),
            "not-started" => Ok(VerificationStatus::NotStarted),
            "completed" => Ok(VerificationStatus::Completed),
            "failed" => Ok(VerificationStatus::Failed),
            _ => Err(VerificationError::InvalidStatus),
        }
    }
}

/// Third-party identity verification vendors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VerificationProvider {
    Veriff,
    Smile,
}

impl VerificationProvider {
    pub fn as_str(self) -> &'static str {
        match self {
            VerificationProvider::Veriff => "veriff",
            VerificationProvider::Smile => "smile",
        }
    }
}

impl FromStr for VerificationProvider {
    type Err = VerificationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "veriff" => Ok(VerificationProvider::Veriff),
            "smile" => Ok(VerificationProvider::Smile),
            _ => Err(VerificationError::InvalidProvider),
        }
    }
}

/// A verification status paired with the provider handling it, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verification {
    status: VerificationStatus,
    provider: Option<VerificationProvider>,
}

impl Verification {
    /// Parse a verification from its wire representation.
    pub fn new(status: &str, provider: Option<&str>) -> Result<Self, VerificationError> {
        let status = status.parse::<VerificationStatus>()?;
        let provider = provider
            .map(str::parse::<VerificationProvider>)
            .transpose()?;
        Ok(Self { status, provider })
    }

    pub fn from_parts(status: VerificationStatus, provider: Option<VerificationProvider>) -> Self {
        Self { status, provider }
    }

    /// A user who has not begun verification.
    pub fn not_started() -> Self {
        Self::from_parts(VerificationStatus::NotStarted, None)
    }

    pub fn status(&self) -> VerificationStatus {
        self.status
    }

    pub fn provider(&self) -> Option<VerificationProvider> {
        self.provider
    }
}

/// Renders as `status:provider`, with `null` for a missing provider.
impl fmt::Display for Verification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let provider = self.provider.map_or("null", VerificationProvider::as_str);
        write!(f, "{}:{provider}", self.status.as_str())
    }
}
