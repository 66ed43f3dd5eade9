//! Authentication primitives such as login credentials and registrations.
//!
//! Constructors run the matching form schema first, so a value of these types
//! always satisfies the sign-in or sign-up rules before any gateway call.

use zeroize::Zeroizing;

use crate::domain::identity::EmailAddress;
use crate::domain::validation::{FormInput, FormSchema, ValidationResult, fields, validate};

/// Validated login credentials sent to the identity gateway.
///
/// ## Invariants
/// - `email` is trimmed and syntactically valid.
/// - `password` passed the length rule on its trimmed form but is sent
///   exactly as typed, so surrounding whitespace is never silently removed
///   from a secret.
///
/// # Examples
/// ```
/// use ecoba_client::domain::LoginCredentials;
///
/// let creds = LoginCredentials::try_from_parts(" ada@example.com ", "secret").unwrap();
/// assert_eq!(creds.email().as_ref(), "ada@example.com");
/// assert_eq!(creds.password(), "secret");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    email: EmailAddress,
    password: Zeroizing<String>,
}

impl LoginCredentials {
    /// Construct credentials from raw email/password inputs.
    pub fn try_from_parts(email: &str, password: &str) -> Result<Self, ValidationResult> {
        let input = FormInput::new()
            .with(fields::EMAIL, email)
            .with(fields::PASSWORD, password);
        Self::from_form(&input)
    }

    /// Construct credentials from a submitted sign-in form.
    pub fn from_form(input: &FormInput) -> Result<Self, ValidationResult> {
        let result = validate(&FormSchema::login(), input);
        if !result.is_valid() {
            return Err(result);
        }
        let email = parse_email(input)?;
        Ok(Self {
            email,
            password: Zeroizing::new(input.raw(fields::PASSWORD).to_owned()),
        })
    }

    /// Address used to look up the account.
    pub fn email(&self) -> &EmailAddress {
        &self.email
    }

    /// Password provided by the caller.
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

fn parse_email(input: &FormInput) -> Result<EmailAddress, ValidationResult> {
    EmailAddress::new(input.raw(fields::EMAIL))
        .map_err(|error| ValidationResult::single(fields::EMAIL, error.to_string()))
}

/// Validated sign-up form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    first_name: String,
    last_name: String,
    email: EmailAddress,
    graduation_year: i32,
    password: Zeroizing<String>,
}

impl Registration {
    /// Build from a form that already passed the registration schema.
    pub(crate) fn from_validated(input: &FormInput) -> Result<Self, ValidationResult> {
        let email = parse_email(input)?;
        let graduation_year = input
            .trimmed(fields::GRADUATION_YEAR)
            .parse::<i32>()
            .map_err(|_| {
                ValidationResult::single(
                    fields::GRADUATION_YEAR,
                    "Please select your graduation year",
                )
            })?;
        Ok(Self {
            first_name: input.trimmed(fields::FIRST_NAME).to_owned(),
            last_name: input.trimmed(fields::LAST_NAME).to_owned(),
            email,
            graduation_year,
            password: Zeroizing::new(input.raw(fields::PASSWORD).to_owned()),
        })
    }

    /// Given name.
    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    /// Family name.
    pub fn last_name(&self) -> &str {
        &self.last_name
    }

    /// Address to register.
    pub fn email(&self) -> &EmailAddress {
        &self.email
    }

    /// Graduation year within the accepted range.
    pub fn graduation_year(&self) -> i32 {
        self.graduation_year
    }

    /// Convert into the gateway request, joining the names for display.
    #[must_use]
    pub fn into_sign_up_request(self) -> SignUpRequest {
        SignUpRequest {
            display_name: format!("{} {}", self.first_name, self.last_name),
            email: self.email,
            password: self.password,
            graduation_year: self.graduation_year,
        }
    }
}

/// Account creation request handed to the identity gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignUpRequest {
    email: EmailAddress,
    password: Zeroizing<String>,
    display_name: String,
    graduation_year: i32,
}

impl SignUpRequest {
    /// Address to register.
    pub fn email(&self) -> &EmailAddress {
        &self.email
    }

    /// Password as typed.
    pub fn password(&self) -> &str {
        self.password.as_str()
    }

    /// Name stored on the provisioned profile.
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Graduation year stored on the provisioned profile.
    pub fn graduation_year(&self) -> i32 {
        self.graduation_year
    }
}
