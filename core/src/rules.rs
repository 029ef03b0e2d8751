//! Field validation predicates shared by the profile entities.
//!
//! Every rule is a pure function over `&str`. Patterns are compiled once and
//! cached for the lifetime of the process.

use std::sync::OnceLock;

use regex::Regex;

/// One or more name tokens. A token is at least two letters/digits with an
/// optional single hyphen join; trailing whitespace is tolerated only after a
/// second token.
const HUMAN_NAME_PATTERN: &str = r"^([\p{L}\p{N}]+(-[\p{L}\p{N}]+)?){2,}((\s([\p{L}\p{N}]+(-[\p{L}\p{N}]+)?){2,})+?(\s+)?)?$";

const EMAIL_PATTERN: &str = r#"^(([^<>()\[\]\\.,;:\s@"]+(\.[^<>()\[\]\\.,;:\s@"]+)*)|(".+"))@((\[[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}\])|(([a-zA-Z\-0-9]+\.)+[a-zA-Z]{2,}))$"#;

/// Nigerian mobile numbers written as `0XXXXXXXXXX` or `234XXXXXXXXXX`.
const NG_PHONE_PATTERN: &str = r"^(0|234)([789][01][0-9][0-9]{7})$";

static HUMAN_NAME_RE: OnceLock<Regex> = OnceLock::new();
static EMAIL_RE: OnceLock<Regex> = OnceLock::new();
static NG_PHONE_RE: OnceLock<Regex> = OnceLock::new();

fn compiled(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| {
        Regex::new(pattern)
            .unwrap_or_else(|error| panic!("validation regex failed to compile: {error}"))
    })
}

/// Returns `true` when `input` looks like a human first or last name.
pub fn is_human_name(input: &str) -> bool {
    compiled(&HUMAN_NAME_RE, HUMAN_NAME_PATTERN).is_match(input)
}

/// Returns `true` when `input` is a plausible email address.
pub fn is_email_address(input: &str) -> bool {
    compiled(&EMAIL_RE, EMAIL_PATTERN).is_match(input)
}

/// Returns `true` when `input` is a globally valid number in international
/// format, or a Nigerian mobile number in local shorthand.
pub fn is_phone_number(input: &str) -> bool {
    let globally_valid =
        phonenumber::parse(None, input).is_ok_and(|number| phonenumber::is_valid(&number));
    globally_valid || compiled(&NG_PHONE_RE, NG_PHONE_PATTERN).is_match(input)
}
