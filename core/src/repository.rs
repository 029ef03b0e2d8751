//! The user repository and its API-backed implementation.
//!
//! # Design
//! `UserApiRepository` turns `RequestOutput` envelopes into repository
//! results: a cancelled call is `Ok(None)`, an API error is mapped to a
//! user-facing message through the error-code table, and a success payload is
//! validated into a [`User`] aggregate.
//!
//! Every call runs on a child of the caller's token. Cancelling the caller
//! cancels the request; the repository never cancels the caller.

use async_trait::async_trait;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::client::{HttpClient, RequestInput, RequestOutput};
use crate::error::HttpClientError;
use crate::types::{ProfileDto, UpdateProfileDto};
use crate::user::{NewUser, User, UserError};
use crate::user_info::{NewUserInfo, UserInfo};
use crate::verification::{Verification, VerificationError};

pub const PROFILE_ENDPOINT: &str = "/me";
pub const UPDATE_PROFILE_ENDPOINT: &str = "/update-me";

const UNEXPECTED_ERROR_MESSAGE: &str = "An unexpected error occurred. Please try again.";

#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The API rejected the profile fetch.
    #[error("{0}")]
    GetProfile(String),

    /// The API rejected the profile update.
    #[error("{0}")]
    UpdateProfile(String),

    /// The API answered without a profile.
    #[error("{0}")]
    UserRepository(String),

    /// The profile failed domain validation.
    #[error(transparent)]
    InvalidProfile(#[from] UserError),

    #[error(transparent)]
    InvalidVerification(#[from] VerificationError),

    /// The payload did not match the wire schema.
    #[error("unexpected profile payload: {0}")]
    Decode(#[from] serde_json::Error),

    #[error(transparent)]
    Http(#[from] HttpClientError),
}

/// Resolve an API error code to a user-facing message.
pub fn error_message(code: &str) -> String {
    match code {
        "1000001" => "Please log in and try again.".to_owned(),
        _ => format!("An error with the status code {code} has occurred."),
    }
}

/// Loads and stores the signed-in user's profile.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fetch the profile. `Ok(None)` means the call was cancelled.
    async fn get_profile(&self, cancel: &CancellationToken) -> Result<Option<User>, RepositoryError>;

    /// Save the editable profile fields. `Ok(None)` means the call was cancelled.
    async fn update_profile(
        &self,
        cancel: &CancellationToken,
        user: &User,
    ) -> Result<Option<()>, RepositoryError>;
}

#[derive(Debug)]
pub struct UserApiRepository<C> {
    client: C,
}

impl<C: HttpClient> UserApiRepository<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }
}

#[async_trait]
impl<C: HttpClient> UserRepository for UserApiRepository<C> {
    async fn get_profile(&self, cancel: &CancellationToken) -> Result<Option<User>, RepositoryError> {
        let input = RequestInput::new(PROFILE_ENDPOINT, cancel.child_token());
        match self.client.get(input).await?.decode::<Option<ProfileDto>>()? {
            RequestOutput::Cancelled => Ok(None),
            RequestOutput::Error(error) => {
                tracing::debug!(
                    status = error.status_code,
                    code = %error.error_code,
                    "profile fetch failed"
                );
                Err(RepositoryError::GetProfile(error_message(&error.error_code)))
            }
            RequestOutput::Result(None) => Err(RepositoryError::UserRepository(
                UNEXPECTED_ERROR_MESSAGE.to_owned(),
            )),
            RequestOutput::Result(Some(dto)) => to_user(dto).map(Some),
        }
    }

    async fn update_profile(
        &self,
        cancel: &CancellationToken,
        user: &User,
    ) -> Result<Option<()>, RepositoryError> {
        let payload = UpdateProfileDto {
            first_name: user.first_name().to_owned(),
            last_name: user.last_name().to_owned(),
            phone_number: user.phone_number().to_owned(),
        };
        let input = RequestInput::new(UPDATE_PROFILE_ENDPOINT, cancel.child_token());
        match self.client.put(input, serde_json::to_value(payload)?).await? {
            RequestOutput::Cancelled => Ok(None),
            RequestOutput::Error(error) => {
                tracing::debug!(
                    status = error.status_code,
                    code = %error.error_code,
                    "profile update failed"
                );
                Err(RepositoryError::UpdateProfile(error_message(&error.error_code)))
            }
            RequestOutput::Result(_) => Ok(Some(())),
        }
    }
}

fn to_user(dto: ProfileDto) -> Result<User, RepositoryError> {
    let verification = match &dto.verification {
        Some(wire) => Verification::new(&wire.status, wire.provider.as_deref())?,
        None => Verification::not_started(),
    };
    let user_info = UserInfo::new(NewUserInfo {
        id: dto.id,
        first_name: dto.first_name,
        last_name: dto.last_name,
        email_address: dto.email,
        phone_number: dto.phone_number.unwrap_or_default(),
        country: dto.country_code,
    })
    .map_err(UserError::from)?;
    Ok(User::new(NewUser {
        user_info: Some(user_info),
        verification: Some(verification),
    })?)
}
