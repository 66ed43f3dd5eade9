//! Schema-driven validation for sign-in, sign-up and profile forms.
//!
//! Validation is synchronous and pure. Every field is checked in one pass so
//! the presentation layer can display all problems at once; within a field
//! the first failing rule wins.

mod schema;

pub use schema::{
    FULL_NAME_MAX, FULL_NAME_MIN, FieldSpec, FormSchema, LOGIN_PASSWORD_MIN, NAME_PART_MAX,
    PASSWORD_MISMATCH, PROFILE_YEAR_LOOKAHEAD, PROFILE_YEAR_MIN, REGISTRATION_PASSWORD_MIN,
    REGISTRATION_YEAR_MIN, Rule, fields,
};

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Datelike;
use mockable::Clock;
use serde::Serialize;

use crate::domain::auth::{LoginCredentials, Registration};
use crate::domain::identity::email_regex;
use crate::domain::profile::ProfileUpdate;

/// Raw form values keyed by field name, exactly as typed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormInput {
    values: BTreeMap<String, String>,
}

impl FormInput {
    /// Empty form.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter.
    #[must_use]
    pub fn with(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(field, value);
        self
    }

    /// Replace the value of `field`.
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<String>) {
        self.values.insert(field.into(), value.into());
    }

    /// Raw value of `field`; missing fields read as empty.
    pub fn raw(&self, field: &str) -> &str {
        self.values.get(field).map_or("", String::as_str)
    }

    /// Trimmed value of `field`.
    pub fn trimmed(&self, field: &str) -> &str {
        self.raw(field).trim()
    }

    /// Trimmed value, or `None` when blank.
    pub fn non_blank(&self, field: &str) -> Option<String> {
        let value = self.trimmed(field);
        (!value.is_empty()).then(|| value.to_owned())
    }
}

impl<K, V> FromIterator<(K, V)> for FormInput
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }
}

/// Outcome of validating one form submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    valid: bool,
    field_errors: BTreeMap<String, String>,
}

impl ValidationResult {
    fn from_errors(field_errors: BTreeMap<String, String>) -> Self {
        Self {
            valid: field_errors.is_empty(),
            field_errors,
        }
    }

    /// Failed result carrying a single field error.
    pub(crate) fn single(field: &str, message: impl Into<String>) -> Self {
        Self::from_errors(BTreeMap::from([(field.to_owned(), message.into())]))
    }

    /// Whether every field passed.
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Message for `field`, if it failed.
    pub fn error_for(&self, field: &str) -> Option<&str> {
        self.field_errors.get(field).map(String::as_str)
    }

    /// All failing fields and their messages.
    pub fn field_errors(&self) -> &BTreeMap<String, String> {
        &self.field_errors
    }

    /// Names of the failing fields in sorted order.
    pub fn invalid_fields(&self) -> impl Iterator<Item = &str> {
        self.field_errors.keys().map(String::as_str)
    }
}

/// Validate `input` against `schema`.
///
/// # Examples
/// ```
/// use ecoba_client::domain::{FormInput, FormSchema, validate};
///
/// let input = FormInput::new()
///     .with("email", "ada@example.com")
///     .with("password", "secret");
/// assert!(validate(&FormSchema::login(), &input).is_valid());
/// ```
#[must_use]
pub fn validate(schema: &FormSchema, input: &FormInput) -> ValidationResult {
    let mut errors = BTreeMap::new();
    for field in schema.fields() {
        let value = input.trimmed(field.name());
        if field.is_optional() && value.is_empty() {
            continue;
        }
        if let Some(message) = field
            .rules()
            .iter()
            .find_map(|rule| check_rule(rule, value, input))
        {
            errors.insert(field.name().to_owned(), message);
        }
    }
    ValidationResult::from_errors(errors)
}

fn check_rule(rule: &Rule, value: &str, input: &FormInput) -> Option<String> {
    let passes = match rule {
        Rule::Required { .. } => !value.is_empty(),
        Rule::MinChars { min, .. } => value.chars().count() >= *min,
        Rule::MaxChars { max, .. } => value.chars().count() <= *max,
        Rule::Email { .. } => email_regex().is_match(value),
        Rule::IntegerRange { min, max, .. } => value
            .parse::<i32>()
            .is_ok_and(|year| (*min..=*max).contains(&year)),
        Rule::Matches { other, .. } => value == input.trimmed(other),
    };
    (!passes).then(|| rule_message(rule).to_owned())
}

fn rule_message(rule: &Rule) -> &str {
    match rule {
        Rule::Required { message }
        | Rule::MinChars { message, .. }
        | Rule::MaxChars { message, .. }
        | Rule::Email { message }
        | Rule::IntegerRange { message, .. }
        | Rule::Matches { message, .. } => message,
    }
}

/// Forms the client knows how to validate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormKind {
    Login,
    Registration,
    ProfileEdit,
}

/// Validator that resolves year-dependent schemas against a clock.
#[derive(Clone)]
pub struct CredentialValidator {
    clock: Arc<dyn Clock>,
}

impl CredentialValidator {
    /// Create a validator reading the current year from `clock`.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    fn current_year(&self) -> i32 {
        self.clock.utc().year()
    }

    /// Schema for `kind` as of the clock's current year.
    #[must_use]
    pub fn schema(&self, kind: FormKind) -> FormSchema {
        match kind {
            FormKind::Login => FormSchema::login(),
            FormKind::Registration => FormSchema::registration(self.current_year()),
            FormKind::ProfileEdit => FormSchema::profile_edit(self.current_year()),
        }
    }

    /// Validate a submission without converting it.
    #[must_use]
    pub fn submit_credential(&self, kind: FormKind, input: &FormInput) -> ValidationResult {
        validate(&self.schema(kind), input)
    }

    /// Validate a sign-in form into credentials.
    pub fn login(&self, input: &FormInput) -> Result<LoginCredentials, ValidationResult> {
        LoginCredentials::from_form(input)
    }

    /// Validate a sign-up form into a registration.
    pub fn registration(&self, input: &FormInput) -> Result<Registration, ValidationResult> {
        let result = self.submit_credential(FormKind::Registration, input);
        if !result.is_valid() {
            return Err(result);
        }
        Registration::from_validated(input)
    }

    /// Validate a profile editor form into an update.
    pub fn profile_edit(&self, input: &FormInput) -> Result<ProfileUpdate, ValidationResult> {
        let result = self.submit_credential(FormKind::ProfileEdit, input);
        if !result.is_valid() {
            return Err(result);
        }
        Ok(ProfileUpdate::from_validated(input))
    }
}

impl std::fmt::Debug for CredentialValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialValidator").finish_non_exhaustive()
    }
}
