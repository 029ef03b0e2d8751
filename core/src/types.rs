//! Wire DTOs for the profile API.
//!
//! # Design
//! These types mirror the mock-server's schema but are defined independently.
//! The repository maps them to and from the `User` aggregate; validation
//! happens there, not during deserialization. Integration tests catch any
//! schema drift between the two crates.

use serde::{Deserialize, Serialize};

/// Profile returned by `GET /me`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProfileDto {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub phone_number: Option<String>,
    pub country_code: String,
    /// Absent for users who never started verification.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verification: Option<VerificationDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VerificationDto {
    pub status: String,
    #[serde(default)]
    pub provider: Option<String>,
}

/// Request payload for `PUT /update-me`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UpdateProfileDto {
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
}
