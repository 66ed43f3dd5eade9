//! Tests for the profile editor.

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use rstest::rstest;
use tokio::sync::oneshot;

use super::*;
use crate::domain::ports::MockProfileRepository;
use crate::domain::profile::ProfileUpdate;
use crate::domain::session::{SessionChange, SessionEvent};
use crate::domain::validation::fields;
use crate::test_support::{FixtureClock, StubIdentityGateway, identity};

fn validator() -> CredentialValidator {
    CredentialValidator::new(Arc::new(FixtureClock::default()))
}

fn stored_profile(id: &str) -> Profile {
    let created = Utc
        .with_ymd_and_hms(2026, 1, 10, 8, 0, 0)
        .single()
        .expect("fixture timestamp");
    Profile::provisioned(
        IdentityId::new(id).expect("id"),
        Some("Ada Lovelace".to_owned()),
        Some(2010),
        created,
    )
}

fn edit_form() -> FormInput {
    FormInput::new()
        .with(fields::FULL_NAME, "Ada King")
        .with(fields::BIO, "Analyst")
        .with(fields::GRADUATION_YEAR, "2011")
}

#[rstest]
#[tokio::test]
async fn load_applies_the_current_identity_profile() {
    let gateway = StubIdentityGateway::signed_in(identity("ada"));
    let store = gateway.resolved_store().await;
    let mut repository = MockProfileRepository::new();
    repository
        .expect_fetch_by_identity()
        .withf(|id| id.as_ref() == "ada")
        .times(1)
        .returning(|_| Ok(Some(stored_profile("ada"))));
    let editor = ProfileEditor::new(store, Arc::new(repository), validator());

    let loaded = editor.load().await.expect("load").applied().flatten();

    assert_eq!(loaded, Some(stored_profile("ada")));
    assert_eq!(editor.form().raw(fields::FULL_NAME), "Ada Lovelace");
    assert_eq!(editor.form().raw(fields::GRADUATION_YEAR), "2010");
}

#[rstest]
#[tokio::test]
async fn load_without_session_is_rejected_locally() {
    let gateway = StubIdentityGateway::signed_out();
    let store = gateway.resolved_store().await;
    let mut repository = MockProfileRepository::new();
    repository.expect_fetch_by_identity().never();
    let editor = ProfileEditor::new(store, Arc::new(repository), validator());

    let err = editor.load().await.expect_err("signed out");

    assert!(matches!(err, ActionError::NotAuthenticated));
}

#[rstest]
#[tokio::test]
async fn updates_always_target_the_identity_held_at_call_time() {
    let gateway = StubIdentityGateway::signed_in(identity("ada"));
    let store = gateway.resolved_store().await;
    let targets = Arc::new(Mutex::new(Vec::new()));
    let recorded = Arc::clone(&targets);
    let mut repository = MockProfileRepository::new();
    repository
        .expect_update_by_identity()
        .times(2)
        .returning(move |id, _| {
            recorded.lock().expect("targets").push(id.clone());
            Ok(())
        });
    repository
        .expect_fetch_by_identity()
        .returning(|id| Ok(Some(stored_profile(id.as_ref()))));
    let editor = ProfileEditor::new(store, Arc::new(repository), validator());

    editor.submit(&edit_form()).await.expect("first submit");
    gateway.emit(SessionChange::signed_in(identity("grace")));
    editor.submit(&edit_form()).await.expect("second submit");
    gateway.emit(SessionChange::signed_out());
    let err = editor.submit(&edit_form()).await.expect_err("signed out");

    assert!(matches!(err, ActionError::NotAuthenticated));
    let targets: Vec<String> = targets
        .lock()
        .expect("targets")
        .iter()
        .map(|id| id.as_ref().to_owned())
        .collect();
    assert_eq!(targets, vec!["ada", "grace"]);
}

#[rstest]
#[tokio::test]
async fn submit_sends_normalised_update_and_refetches() {
    let gateway = StubIdentityGateway::signed_in(identity("ada"));
    let store = gateway.resolved_store().await;
    let mut repository = MockProfileRepository::new();
    let expected = ProfileUpdate {
        full_name: Some("Ada King".to_owned()),
        bio: None,
        graduation_year: None,
        avatar_url: None,
    };
    repository
        .expect_update_by_identity()
        .withf(move |_, update| *update == expected)
        .times(1)
        .returning(|_, _| Ok(()));
    repository
        .expect_fetch_by_identity()
        .times(1)
        .returning(|_| Ok(Some(stored_profile("ada"))));
    let editor = ProfileEditor::new(store, Arc::new(repository), validator());

    let form = FormInput::new()
        .with(fields::FULL_NAME, " Ada King ")
        .with(fields::BIO, "  ")
        .with(fields::GRADUATION_YEAR, "");
    let outcome = editor.submit(&form).await.expect("submit");

    assert!(!outcome.is_discarded());
    assert!(!editor.is_saving());
}

#[rstest]
#[tokio::test]
async fn invalid_form_never_reaches_repository() {
    let gateway = StubIdentityGateway::signed_in(identity("ada"));
    let store = gateway.resolved_store().await;
    let mut repository = MockProfileRepository::new();
    repository.expect_update_by_identity().never();
    let editor = ProfileEditor::new(store, Arc::new(repository), validator());

    let form = edit_form().with(fields::BIO, "b".repeat(501));
    let err = editor.submit(&form).await.expect_err("bio too long");

    let result = err.validation().expect("validation");
    assert_eq!(result.invalid_fields().collect::<Vec<_>>(), vec![fields::BIO]);
}

#[rstest]
#[tokio::test]
async fn update_failure_keeps_edits_and_reports_update_notice() {
    let gateway = StubIdentityGateway::signed_in(identity("ada"));
    let store = gateway.resolved_store().await;
    let mut repository = MockProfileRepository::new();
    repository
        .expect_update_by_identity()
        .times(1)
        .returning(|_, _| Err(ProfileRepositoryError::connection("timeout")));
    repository.expect_fetch_by_identity().never();
    let editor = ProfileEditor::new(store, Arc::new(repository), validator());
    let form = edit_form();
    let before = form.clone();

    let err = editor.submit(&form).await.expect_err("update fails");

    assert_eq!(form, before);
    let notice = err.notice().expect("notice");
    assert_eq!(notice.description, "Failed to update profile. Please try again.");
    assert!(!editor.is_saving());
}

/// Repository whose calls block until the test opens the gate.
struct GatedRepository {
    gate: Mutex<Option<oneshot::Receiver<()>>>,
    fail: bool,
}

impl GatedRepository {
    fn new(fail: bool) -> (Self, oneshot::Sender<()>) {
        let (tx, rx) = oneshot::channel();
        let repository = Self {
            gate: Mutex::new(Some(rx)),
            fail,
        };
        (repository, tx)
    }

    async fn wait(&self) {
        let gate = self.gate.lock().expect("gate").take();
        if let Some(gate) = gate {
            let _ = gate.await;
        }
    }
}

#[async_trait]
impl ProfileRepository for GatedRepository {
    async fn fetch_by_identity(
        &self,
        identity_id: &IdentityId,
    ) -> Result<Option<Profile>, ProfileRepositoryError> {
        self.wait().await;
        if self.fail {
            return Err(ProfileRepositoryError::query("boom"));
        }
        Ok(Some(stored_profile(identity_id.as_ref())))
    }

    async fn update_by_identity(
        &self,
        _identity_id: &IdentityId,
        _update: &ProfileUpdate,
    ) -> Result<(), ProfileRepositoryError> {
        self.wait().await;
        if self.fail {
            return Err(ProfileRepositoryError::query("boom"));
        }
        Ok(())
    }
}

#[rstest]
#[case(false)]
#[case(true)]
#[tokio::test]
async fn load_resolving_after_unmount_is_discarded(#[case] fail: bool) {
    let gateway = StubIdentityGateway::signed_in(identity("ada"));
    let store = gateway.resolved_store().await;
    let (repository, gate) = GatedRepository::new(fail);
    let editor = ProfileEditor::new(store, Arc::new(repository), validator());

    let editor_ref = &editor;
    let (outcome, ()) = tokio::join!(editor_ref.load(), async move {
        editor_ref.unmount();
        gate.send(()).expect("open gate");
    });

    assert!(outcome.expect("discarded, not failed").is_discarded());
    assert_eq!(editor.profile(), None);
}

#[rstest]
#[tokio::test]
async fn failed_update_after_unmount_is_discarded() {
    let gateway = StubIdentityGateway::signed_in(identity("ada"));
    let store = gateway.resolved_store().await;
    let (repository, gate) = GatedRepository::new(true);
    let editor = ProfileEditor::new(store, Arc::new(repository), validator());

    let editor_ref = &editor;
    let form = edit_form();
    let (outcome, ()) = tokio::join!(editor_ref.submit(&form), async move {
        editor_ref.unmount();
        gate.send(()).expect("open gate");
    });

    assert!(outcome.expect("discarded, not failed").is_discarded());
    assert!(!editor.is_saving());
}

#[rstest]
#[case::switch_then_success(SessionChange::signed_in(identity("grace")), false)]
#[case::switch_then_failure(SessionChange::signed_in(identity("grace")), true)]
#[case::sign_out_then_success(SessionChange::signed_out(), false)]
#[case::sign_out_then_failure(SessionChange::signed_out(), true)]
#[tokio::test]
async fn load_resolving_for_a_previous_identity_is_discarded(
    #[case] change: SessionChange,
    #[case] fail: bool,
) {
    let gateway = StubIdentityGateway::signed_in(identity("ada"));
    let store = gateway.resolved_store().await;
    let (repository, gate) = GatedRepository::new(fail);
    let editor = ProfileEditor::new(store, Arc::new(repository), validator());

    let gateway_ref = &gateway;
    let (outcome, ()) = tokio::join!(editor.load(), async move {
        gateway_ref.emit(change);
        gate.send(()).expect("open gate");
    });

    assert!(outcome.expect("discarded, not failed").is_discarded());
    assert_eq!(editor.profile(), None);
    assert_eq!(editor.form(), FormInput::default());
}

#[rstest]
#[case::update_succeeds(false)]
#[case::update_fails(true)]
#[tokio::test]
async fn submit_resolving_after_identity_switch_leaves_view_untouched(#[case] fail: bool) {
    let gateway = StubIdentityGateway::signed_in(identity("ada"));
    let store = gateway.resolved_store().await;
    let (repository, gate) = GatedRepository::new(fail);
    let editor = ProfileEditor::new(store, Arc::new(repository), validator());

    let gateway_ref = &gateway;
    let form = edit_form();
    let (outcome, ()) = tokio::join!(editor.submit(&form), async move {
        gateway_ref.emit(SessionChange::signed_in(identity("grace")));
        gate.send(()).expect("open gate");
    });

    assert!(outcome.expect("discarded, not failed").is_discarded());
    assert_eq!(editor.profile(), None);
    assert!(!editor.is_saving());
}

#[rstest]
#[tokio::test]
async fn profile_for_the_same_identity_survives_a_token_refresh() {
    let gateway = StubIdentityGateway::signed_in(identity("ada"));
    let store = gateway.resolved_store().await;
    let (repository, gate) = GatedRepository::new(false);
    let editor = ProfileEditor::new(store, Arc::new(repository), validator());

    let gateway_ref = &gateway;
    let (outcome, ()) = tokio::join!(editor.load(), async move {
        gateway_ref.emit(SessionChange {
            event: SessionEvent::TokenRefreshed,
            identity: Some(identity("ada")),
        });
        gate.send(()).expect("open gate");
    });

    let loaded = outcome.expect("load").applied().flatten();
    assert_eq!(loaded, Some(stored_profile("ada")));
    assert_eq!(editor.profile(), Some(stored_profile("ada")));
}
