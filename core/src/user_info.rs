//! The `UserInfo` entity: a user's identity and contact details.
//!
//! # Design
//! Every field is validated on construction and again on every setter, so a
//! `UserInfo` value is always fully valid. A failed setter leaves the previous
//! value in place.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::rules;

/// Validation failures raised while building or mutating a [`UserInfo`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum UserInfoError {
    #[error("The first name must be a valid name containing only alphabets with hyphens and spaces in-between.")]
    FirstName,

    #[error("The last name must be a valid name containing only alphabets with hyphens and spaces in-between.")]
    LastName,

    #[error("The email address must be a valid email.")]
    Email,

    #[error("The phone number is not a recognized phone number type.")]
    PhoneNumber,

    #[error("The selected country is not supported.")]
    Country,
}

/// Countries the profile flow is available in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Country {
    Nigeria,
    Ghana,
    Kenya,
    UnitedStates,
}

/// All supported countries, in display order.
pub const SUPPORTED_COUNTRIES: [Country; 4] = [
    Country::Nigeria,
    Country::Ghana,
    Country::Kenya,
    Country::UnitedStates,
];

impl Country {
    /// ISO 3166-1 alpha-2 code.
    pub fn code(self) -> &'static str {
        match self {
            Country::Nigeria => "NG",
            Country::Ghana => "GH",
            Country::Kenya => "KE",
            Country::UnitedStates => "US",
        }
    }
}

impl FromStr for Country {
    type Err = UserInfoError;

    fn from_str(code: &str) -> Result<Self, Self::Err> {
        SUPPORTED_COUNTRIES
            .into_iter()
            .find(|country| country.code() == code)
            .ok_or(UserInfoError::Country)
    }
}

impl fmt::Display for Country {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Unvalidated input for [`UserInfo::new`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUserInfo {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email_address: String,
    pub phone_number: String,
    /// ISO 3166-1 alpha-2 country code.
    pub country: String,
}

/// A user's identity and contact details.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserInfo {
    id: i64,
    first_name: String,
    last_name: String,
    email_address: String,
    phone_number: String,
    country: Country,
}

impl UserInfo {
    /// Validate every field of `input` and build a `UserInfo`.
    ///
    /// Fields are checked in order (first name, last name, email, phone,
    /// country) and the first failure is returned.
    pub fn new(input: NewUserInfo) -> Result<Self, UserInfoError> {
        if !rules::is_human_name(&input.first_name) {
            return Err(UserInfoError::FirstName);
        }
        if !rules::is_human_name(&input.last_name) {
            return Err(UserInfoError::LastName);
        }
        if !rules::is_email_address(&input.email_address) {
            return Err(UserInfoError::Email);
        }
        if !rules::is_phone_number(&input.phone_number) {
            return Err(UserInfoError::PhoneNumber);
        }
        let country = input.country.parse::<Country>()?;

        Ok(Self {
            id: input.id,
            first_name: input.first_name,
            last_name: input.last_name,
            email_address: input.email_address,
            phone_number: input.phone_number,
            country,
        })
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    pub fn last_name(&self) -> &str {
        &self.last_name
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn email_address(&self) -> &str {
        &self.email_address
    }

    pub fn phone_number(&self) -> &str {
        &self.phone_number
    }

    pub fn country(&self) -> Country {
        self.country
    }

    pub fn set_first_name(&mut self, input: impl Into<String>) -> Result<(), UserInfoError> {
        let input = input.into();
        if !rules::is_human_name(&input) {
            return Err(UserInfoError::FirstName);
        }
        self.first_name = input;
        Ok(())
    }

    pub fn set_last_name(&mut self, input: impl Into<String>) -> Result<(), UserInfoError> {
        let input = input.into();
        if !rules::is_human_name(&input) {
            return Err(UserInfoError::LastName);
        }
        self.last_name = input;
        Ok(())
    }

    pub fn set_phone_number(&mut self, input: impl Into<String>) -> Result<(), UserInfoError> {
        let input = input.into();
        if !rules::is_phone_number(&input) {
            return Err(UserInfoError::PhoneNumber);
        }
        self.phone_number = input;
        Ok(())
    }
}
