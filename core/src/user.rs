//! The `User` aggregate.
//!
//! # Design
//! A `User` exclusively owns one [`UserInfo`] and one [`Verification`].
//! Name changes are only allowed once verification has completed; the phone
//! number can be changed at any time.

use thiserror::Error;

use crate::user_info::{Country, UserInfo, UserInfoError};
use crate::verification::{Verification, VerificationStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum UserError {
    #[error("the user info is required")]
    UserInfoRequired,

    #[error("verification is required")]
    VerificationRequired,

    #[error("verification not complete")]
    VerificationIncomplete,

    #[error(transparent)]
    UserInfo(#[from] UserInfoError),
}

/// Parts for [`User::new`]. Both are required.
#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub user_info: Option<UserInfo>,
    pub verification: Option<Verification>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    user_info: UserInfo,
    verification: Verification,
}

impl User {
    pub fn new(input: NewUser) -> Result<Self, UserError> {
        let user_info = input.user_info.ok_or(UserError::UserInfoRequired)?;
        let verification = input.verification.ok_or(UserError::VerificationRequired)?;
        Ok(Self {
            user_info,
            verification,
        })
    }

    pub fn id(&self) -> i64 {
        self.user_info.id()
    }

    pub fn first_name(&self) -> &str {
        self.user_info.first_name()
    }

    pub fn last_name(&self) -> &str {
        self.user_info.last_name()
    }

    pub fn full_name(&self) -> String {
        self.user_info.full_name()
    }

    pub fn email_address(&self) -> &str {
        self.user_info.email_address()
    }

    pub fn phone_number(&self) -> &str {
        self.user_info.phone_number()
    }

    pub fn country(&self) -> Country {
        self.user_info.country()
    }

    pub fn verification(&self) -> &Verification {
        &self.verification
    }

    pub fn is_verified(&self) -> bool {
        self.verification.status() == VerificationStatus::Completed
    }

    /// Change the first name of a verified user.
    pub fn set_first_name(&mut self, input: impl Into<String>) -> Result<(), UserError> {
        self.ensure_verified()?;
        self.user_info.set_first_name(input)?;
        Ok(())
    }

    /// Change the last name of a verified user.
    pub fn set_last_name(&mut self, input: impl Into<String>) -> Result<(), UserError> {
        self.ensure_verified()?;
        self.user_info.set_last_name(input)?;
        Ok(())
    }

    pub fn set_phone_number(&mut self, input: impl Into<String>) -> Result<(), UserError> {
        self.user_info.set_phone_number(input)?;
        Ok(())
    }

    fn ensure_verified(&self) -> Result<(), UserError> {
        if self.is_verified() {
            Ok(())
        } else {
            Err(UserError::VerificationIncomplete)
        }
    }
}
