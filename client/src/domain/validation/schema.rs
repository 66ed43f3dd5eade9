//! Tagged schema descriptions for each client form.

use std::borrow::Cow;

/// Lower bound accepted for a graduation year at registration.
pub const REGISTRATION_YEAR_MIN: i32 = 1960;
/// Lower bound accepted for a graduation year on the profile editor.
pub const PROFILE_YEAR_MIN: i32 = 1950;
/// Years beyond the current one a profile may claim (expected graduation).
pub const PROFILE_YEAR_LOOKAHEAD: i32 = 10;
/// Minimum password length accepted at sign-in.
pub const LOGIN_PASSWORD_MIN: usize = 6;
/// Minimum password length accepted at registration.
pub const REGISTRATION_PASSWORD_MIN: usize = 8;
/// Maximum length of first and last names at registration.
pub const NAME_PART_MAX: usize = 50;
/// Bounds on the profile's full name.
pub const FULL_NAME_MIN: usize = 2;
/// Upper bound on the profile's full name.
pub const FULL_NAME_MAX: usize = 100;

/// Message reported on the confirmation field when the passwords differ.
pub const PASSWORD_MISMATCH: &str = "Passwords don't match";

/// Form field names shared by schemas, typed forms and adapters.
pub mod fields {
    /// Account email, on sign-in and sign-up.
    pub const EMAIL: &str = "email";
    /// Account password.
    pub const PASSWORD: &str = "password";
    /// Repeated password at sign-up.
    pub const CONFIRM_PASSWORD: &str = "confirmPassword";
    /// Given name at sign-up.
    pub const FIRST_NAME: &str = "firstName";
    /// Family name at sign-up.
    pub const LAST_NAME: &str = "lastName";
    /// Graduation year, on sign-up and the profile editor.
    pub const GRADUATION_YEAR: &str = "graduationYear";
    /// Display name in the profile editor.
    pub const FULL_NAME: &str = "fullName";
    /// Free-text biography.
    pub const BIO: &str = "bio";
    /// Optional avatar link.
    pub const AVATAR_URL: &str = "avatarUrl";
}

/// A single constraint applied to a trimmed field value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rule {
    /// Value must be non-empty.
    Required { message: Cow<'static, str> },
    /// Value must have at least `min` characters.
    MinChars {
        min: usize,
        message: Cow<'static, str>,
    },
    /// Value must have at most `max` characters.
    MaxChars {
        max: usize,
        message: Cow<'static, str>,
    },
    /// Value must be a syntactically valid email address.
    Email { message: Cow<'static, str> },
    /// Value must parse as an integer within `min..=max`.
    IntegerRange {
        min: i32,
        max: i32,
        message: Cow<'static, str>,
    },
    /// Value must equal the (trimmed) value of another field.
    Matches {
        other: &'static str,
        message: Cow<'static, str>,
    },
}

/// Constraints for one named field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    name: &'static str,
    optional: bool,
    rules: Vec<Rule>,
}

impl FieldSpec {
    /// A field that must satisfy every rule.
    #[must_use]
    pub fn required(name: &'static str) -> Self {
        Self {
            name,
            optional: false,
            rules: Vec::new(),
        }
    }

    /// A field whose rules only apply when a non-blank value is supplied.
    #[must_use]
    pub fn optional(name: &'static str) -> Self {
        Self {
            name,
            optional: true,
            rules: Vec::new(),
        }
    }

    /// Append a rule; rules are checked in insertion order.
    #[must_use]
    pub fn rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Field name used as the error key.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Whether a blank value skips the rules.
    pub fn is_optional(&self) -> bool {
        self.optional
    }

    /// Ordered rules for this field.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }
}

/// Ordered field specifications describing one form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormSchema {
    fields: Vec<FieldSpec>,
}

impl FormSchema {
    /// Build a schema from field specs.
    #[must_use]
    pub fn new(fields: Vec<FieldSpec>) -> Self {
        Self { fields }
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Sign-in form.
    #[must_use]
    pub fn login() -> Self {
        Self::new(vec![
            FieldSpec::required(fields::EMAIL).rule(Rule::Email {
                message: "Please enter a valid email address".into(),
            }),
            FieldSpec::required(fields::PASSWORD).rule(Rule::MinChars {
                min: LOGIN_PASSWORD_MIN,
                message: format!("Password must be at least {LOGIN_PASSWORD_MIN} characters")
                    .into(),
            }),
        ])
    }

    /// Sign-up form; graduation years run from 1960 to `current_year`.
    #[must_use]
    pub fn registration(current_year: i32) -> Self {
        Self::new(vec![
            name_part(fields::FIRST_NAME, "First name"),
            name_part(fields::LAST_NAME, "Last name"),
            FieldSpec::required(fields::EMAIL).rule(Rule::Email {
                message: "Please enter a valid email address".into(),
            }),
            FieldSpec::required(fields::GRADUATION_YEAR)
                .rule(Rule::Required {
                    message: "Please select your graduation year".into(),
                })
                .rule(Rule::IntegerRange {
                    min: REGISTRATION_YEAR_MIN,
                    max: current_year,
                    message: format!(
                        "Graduation year must be between {REGISTRATION_YEAR_MIN} and {current_year}"
                    )
                    .into(),
                }),
            FieldSpec::required(fields::PASSWORD).rule(Rule::MinChars {
                min: REGISTRATION_PASSWORD_MIN,
                message: format!(
                    "Password must be at least {REGISTRATION_PASSWORD_MIN} characters"
                )
                .into(),
            }),
            FieldSpec::required(fields::CONFIRM_PASSWORD).rule(Rule::Matches {
                other: fields::PASSWORD,
                message: PASSWORD_MISMATCH.into(),
            }),
        ])
    }

    /// Profile editor form; years run from 1950 to `current_year + 10`.
    #[must_use]
    pub fn profile_edit(current_year: i32) -> Self {
        Self::new(vec![
            FieldSpec::required(fields::FULL_NAME)
                .rule(Rule::MinChars {
                    min: FULL_NAME_MIN,
                    message: format!("Name must be at least {FULL_NAME_MIN} characters").into(),
                })
                .rule(Rule::MaxChars {
                    max: FULL_NAME_MAX,
                    message: format!("Name must be at most {FULL_NAME_MAX} characters").into(),
                }),
            FieldSpec::optional(fields::BIO).rule(Rule::MaxChars {
                max: crate::domain::profile::BIO_MAX,
                message: "Bio must be at most 500 characters".into(),
            }),
            FieldSpec::optional(fields::GRADUATION_YEAR).rule(Rule::IntegerRange {
                min: PROFILE_YEAR_MIN,
                max: current_year + PROFILE_YEAR_LOOKAHEAD,
                message: "Invalid graduation year".into(),
            }),
        ])
    }
}

fn name_part(name: &'static str, label: &str) -> FieldSpec {
    FieldSpec::required(name)
        .rule(Rule::Required {
            message: format!("{label} is required").into(),
        })
        .rule(Rule::MaxChars {
            max: NAME_PART_MAX,
            message: format!("{label} must be at most {NAME_PART_MAX} characters").into(),
        })
}
