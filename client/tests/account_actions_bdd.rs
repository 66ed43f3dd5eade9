//! Behaviour tests for sign-up, sign-in and sign-out against the provider.

mod support;

use ecoba_client::domain::FormInput;
use ecoba_client::domain::ports::IdentityGateway;
use ecoba_client::domain::validation::fields;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use support::{ClientWorld, DEFAULT_PASSWORD, registration_form, unquote};

#[fixture]
fn world() -> ClientWorld {
    ClientWorld::new()
}

fn sign_up(world: &ClientWorld, name: &str, email: &str) {
    let form = registration_form(unquote(name), unquote(email), DEFAULT_PASSWORD);
    let outcome = world.block_on(world.accounts().sign_up(&form));
    world.record(outcome);
    *world.submitted.borrow_mut() = Some(form);
}

#[given("the provider requires email confirmation")]
fn the_provider_requires_email_confirmation(world: &ClientWorld) {
    world.require_email_confirmation();
}

#[given("the visitor has signed up as {name} with {email}")]
fn the_visitor_has_signed_up_as(world: &ClientWorld, name: String, email: String) {
    sign_up(world, &name, &email);
}

#[when("the visitor signs up as {name} with {email}")]
fn the_visitor_signs_up_as(world: &ClientWorld, name: String, email: String) {
    sign_up(world, &name, &email);
}

#[when("the visitor signs up with mismatched passwords")]
fn the_visitor_signs_up_with_mismatched_passwords(world: &ClientWorld) {
    let form = registration_form("Mis Match", "mismatch@example.com", DEFAULT_PASSWORD)
        .with(fields::CONFIRM_PASSWORD, "something-else");
    let outcome = world.block_on(world.accounts().sign_up(&form));
    world.record(outcome);
}

#[when("the visitor signs in as {email} with password {password}")]
fn the_visitor_signs_in(world: &ClientWorld, email: String, password: String) {
    let form = FormInput::new()
        .with(fields::EMAIL, unquote(&email))
        .with(fields::PASSWORD, unquote(&password));
    let outcome = world.block_on(world.accounts().sign_in(&form));
    world.record(outcome);
}

#[when("the user signs out")]
fn the_user_signs_out(world: &ClientWorld) {
    let outcome = world.block_on(world.accounts().sign_out());
    world.record(outcome);
}

#[then("the action succeeds")]
fn the_action_succeeds(world: &ClientWorld) {
    let outcome = world.outcome.borrow();
    assert!(matches!(outcome.as_ref(), Some(Ok(()))), "{outcome:?}");
}

#[then("the action fails with {message}")]
fn the_action_fails_with(world: &ClientWorld, message: String) {
    assert_eq!(world.failure_description(), unquote(&message));
}

#[then("the submitted form is kept")]
fn the_submitted_form_is_kept(world: &ClientWorld) {
    let form = world.submitted.borrow();
    let form = form.as_ref().expect("a form was submitted");
    assert_eq!(form.raw(fields::PASSWORD), DEFAULT_PASSWORD);
    assert!(!form.raw(fields::EMAIL).is_empty());
}

#[then("the profile of {email} is named {name}")]
fn the_profile_is_named(world: &ClientWorld, email: String, name: String) {
    let identity = world
        .gateway()
        .current_identity()
        .expect("provider session");
    assert_eq!(identity.email().as_ref(), unquote(&email));
    let profile = world.profiles.get(identity.id()).expect("profile row");
    assert_eq!(profile.full_name.as_deref(), Some(unquote(&name)));
}

#[then("no account exists for {email}")]
fn no_account_exists_for(world: &ClientWorld, email: String) {
    let credentials = world
        .validator()
        .login(
            &FormInput::new()
                .with(fields::EMAIL, unquote(&email))
                .with(fields::PASSWORD, DEFAULT_PASSWORD),
        )
        .expect("well-formed credentials");
    let gateway = world.gateway();
    let attempt = world.block_on(gateway.sign_in(&credentials));
    assert!(attempt.is_err());
}

#[scenario(
    path = "tests/features/account_actions.feature",
    name = "Signing up with a new email"
)]
fn signing_up_with_a_new_email(world: ClientWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/account_actions.feature",
    name = "Signing up with an email that is already registered"
)]
fn signing_up_with_an_email_that_is_already_registered(world: ClientWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/account_actions.feature",
    name = "Signing in with the wrong password"
)]
fn signing_in_with_the_wrong_password(world: ClientWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/account_actions.feature",
    name = "Signing in before confirming the email address"
)]
fn signing_in_before_confirming_the_email_address(world: ClientWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/account_actions.feature",
    name = "Mismatched passwords never reach the provider"
)]
fn mismatched_passwords_never_reach_the_provider(world: ClientWorld) {
    drop(world);
}

#[scenario(path = "tests/features/account_actions.feature", name = "Signing out")]
fn signing_out(world: ClientWorld) {
    drop(world);
}
