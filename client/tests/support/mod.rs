//! Shared world and steps for the client behaviour suites.
//!
//! The world wires the in-memory provider and profile store to a real
//! session store on a current-thread runtime, so each step drives the same
//! code paths a host application would.

use std::cell::RefCell;
use std::sync::{Arc, Mutex};

use ecoba_client::domain::validation::fields;
use ecoba_client::domain::ports::{IdentityGateway, Navigator};
use ecoba_client::domain::{
    AccountService, ActionError, CredentialValidator, FormInput, GuardedView, LoginCredentials,
    ProfileEditor, Route, Session, SessionChange, SessionStore, Subscription,
};
use ecoba_client::outbound::memory::{InMemoryIdentityGateway, InMemoryProfileRepository};
use ecoba_client::test_support::{FixtureClock, RecordingNavigator};
use mockable::Clock;
use rstest_bdd_macros::{given, then, when};
use tokio::runtime::{Builder, Runtime};

pub const DEFAULT_PASSWORD: &str = "analytical-engine";
pub const DEFAULT_NAME: &str = "Ada Lovelace";

pub struct ClientWorld {
    runtime: Runtime,
    clock: Arc<dyn Clock>,
    pub profiles: Arc<InMemoryProfileRepository>,
    gateway: RefCell<Arc<InMemoryIdentityGateway>>,
    pub store: SessionStore,
    pub navigator: Arc<RecordingNavigator>,
    loading_trace: Arc<Mutex<Vec<bool>>>,
    subscriptions: RefCell<Vec<Subscription>>,
    views: RefCell<Vec<GuardedView>>,
    editor: RefCell<Option<ProfileEditor<InMemoryProfileRepository>>>,
    account_email: RefCell<Option<String>>,
    pub outcome: RefCell<Option<Result<(), ActionError>>>,
    pub submitted: RefCell<Option<FormInput>>,
}

impl ClientWorld {
    pub fn new() -> Self {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("runtime");
        let clock: Arc<dyn Clock> = Arc::new(FixtureClock::default());
        let profiles = Arc::new(InMemoryProfileRepository::new(Arc::clone(&clock)));
        let gateway = Arc::new(InMemoryIdentityGateway::new(Arc::clone(&profiles)));
        Self {
            runtime,
            clock,
            profiles,
            gateway: RefCell::new(gateway),
            store: SessionStore::new(),
            navigator: Arc::new(RecordingNavigator::new()),
            loading_trace: Arc::new(Mutex::new(Vec::new())),
            subscriptions: RefCell::new(Vec::new()),
            views: RefCell::new(Vec::new()),
            editor: RefCell::new(None),
            account_email: RefCell::new(None),
            outcome: RefCell::new(None),
            submitted: RefCell::new(None),
        }
    }

    pub fn block_on<F: std::future::Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }

    pub fn gateway(&self) -> Arc<InMemoryIdentityGateway> {
        Arc::clone(&self.gateway.borrow())
    }

    /// Replace the provider with one that holds new accounts until confirmed.
    pub fn require_email_confirmation(&self) {
        let gateway =
            InMemoryIdentityGateway::new(Arc::clone(&self.profiles)).requiring_email_confirmation();
        *self.gateway.borrow_mut() = Arc::new(gateway);
    }

    pub fn validator(&self) -> CredentialValidator {
        CredentialValidator::new(Arc::clone(&self.clock))
    }

    pub fn accounts(&self) -> AccountService<InMemoryIdentityGateway> {
        AccountService::new(self.gateway(), self.validator())
    }

    /// Register `email` directly with the provider, leaving it signed out.
    pub fn register(&self, email: &str) {
        let gateway = self.gateway();
        let request = self
            .validator()
            .registration(&registration_form(DEFAULT_NAME, email, DEFAULT_PASSWORD))
            .expect("valid registration")
            .into_sign_up_request();
        self.block_on(gateway.sign_up(&request)).expect("sign up");
        if gateway.current_identity().is_some() {
            gateway.simulate(SessionChange::signed_out());
        }
        *self.account_email.borrow_mut() = Some(email.to_owned());
    }

    pub fn sign_in_with_provider(&self) {
        let email = self
            .account_email
            .borrow()
            .clone()
            .expect("an account was registered");
        let credentials =
            LoginCredentials::try_from_parts(&email, DEFAULT_PASSWORD).expect("credentials");
        self.block_on(self.gateway().sign_in(&credentials))
            .expect("sign in");
    }

    /// Subscribe to the store, then run its bootstrap against the provider.
    pub fn start(&self) {
        let trace = Arc::clone(&self.loading_trace);
        let subscription = self.store.subscribe(Arc::new(move |session: &Session| {
            trace.lock().expect("trace").push(session.is_loading());
        }));
        self.subscriptions.borrow_mut().push(subscription);
        let gateway = self.gateway();
        self.block_on(self.store.initialize(gateway.as_ref()));
    }

    /// Number of loading true-to-false transitions observed since start.
    pub fn loading_resolutions(&self) -> usize {
        let trace = self.loading_trace.lock().expect("trace");
        std::iter::once(true)
            .chain(trace.iter().copied())
            .collect::<Vec<_>>()
            .windows(2)
            .filter(|pair| matches!(pair, [true, false]))
            .count()
    }

    pub fn open_view(&self, route: Route) {
        let navigator: Arc<dyn Navigator> = self.navigator.clone();
        let view = GuardedView::mount(&self.store, route, navigator);
        self.views.borrow_mut().push(view);
    }

    pub fn open_editor(&self) {
        let editor = ProfileEditor::new(
            self.store.clone(),
            Arc::clone(&self.profiles),
            self.validator(),
        );
        *self.editor.borrow_mut() = Some(editor);
    }

    pub fn with_editor<T>(
        &self,
        f: impl FnOnce(&ProfileEditor<InMemoryProfileRepository>) -> T,
    ) -> T {
        let editor = self.editor.borrow();
        f(editor.as_ref().expect("profile editor is open"))
    }

    pub fn record(&self, outcome: Result<(), ActionError>) {
        *self.outcome.borrow_mut() = Some(outcome);
    }

    pub fn failure_description(&self) -> String {
        let outcome = self.outcome.borrow();
        let error = match outcome.as_ref().expect("an action ran") {
            Ok(()) => panic!("expected the action to fail"),
            Err(error) => error,
        };
        error.notice().expect("failure notice").description.into_owned()
    }
}

/// Sign-up form for `name` split into first and last names.
pub fn registration_form(name: &str, email: &str, password: &str) -> FormInput {
    let (first, last) = name.split_once(' ').unwrap_or((name, ""));
    FormInput::new()
        .with(fields::FIRST_NAME, first)
        .with(fields::LAST_NAME, last)
        .with(fields::EMAIL, email)
        .with(fields::GRADUATION_YEAR, "2010")
        .with(fields::PASSWORD, password)
        .with(fields::CONFIRM_PASSWORD, password)
}

/// Gherkin values may arrive with their surrounding quotes.
pub fn unquote(value: &str) -> &str {
    value.trim().trim_matches('"')
}

#[given("a registered account for {email}")]
fn a_registered_account_for(world: &ClientWorld, email: String) {
    world.register(unquote(&email));
}

#[given("the account is signed in with the provider")]
fn the_account_is_signed_in_with_the_provider(world: &ClientWorld) {
    world.sign_in_with_provider();
}

#[given("a running client")]
fn a_running_client(world: &ClientWorld) {
    world.start();
}

#[given("the client has started")]
fn the_client_has_started(world: &ClientWorld) {
    world.start();
}

#[when("the client starts")]
fn the_client_starts(world: &ClientWorld) {
    world.start();
}

#[then("the session belongs to {email}")]
fn the_session_belongs_to(world: &ClientWorld, email: String) {
    let session = world.store.current();
    let identity = session.identity().expect("signed in");
    assert_eq!(identity.email().as_ref(), unquote(&email));
    assert!(!session.is_loading());
}

#[then("the session is signed out")]
fn the_session_is_signed_out(world: &ClientWorld) {
    let session = world.store.current();
    assert!(!session.is_loading());
    assert!(!session.is_authenticated());
}
