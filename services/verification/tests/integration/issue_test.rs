use registry_verification::domain::code::{SecureCodeGenerator, is_well_formed};
use registry_verification::domain::types::{VERIFICATION_CODE_ISSUED, VerificationPolicy};
use registry_verification::error::VerificationServiceError;
use registry_verification::usecase::verification::VerificationRegistry;

use registry_core::clock::SystemClock;

use crate::helpers::{BRIDE, InMemoryVerificationRepo, registry, start_time};

#[tokio::test]
async fn should_issue_active_code_expiring_in_ten_minutes() {
    let (registry, repo, _clock) = registry(&["482913"]);

    let code = registry.issue_code(BRIDE).await.unwrap();
    assert_eq!(code, "482913");

    let records = repo.for_email(BRIDE);
    assert_eq!(records.len(), 1, "expected exactly one record");
    let record = &records[0];
    assert_eq!(record.code, "482913");
    assert!(!record.verified, "new code should be active");
    assert_eq!(record.attempts, 0);
    assert_eq!(record.created_at, start_time());
    assert_eq!(record.expires_at, start_time() + chrono::Duration::minutes(10));
}

#[tokio::test]
async fn should_leave_at_most_one_active_code_after_reissue() {
    let (registry, repo, clock) = registry(&["111111", "222222"]);

    registry.issue_code(BRIDE).await.unwrap();
    clock.advance(chrono::Duration::seconds(30));
    registry.issue_code(BRIDE).await.unwrap();

    let records = repo.for_email(BRIDE);
    assert_eq!(records.len(), 2, "history is retained, not deleted");
    let active = repo.active_for(BRIDE);
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].code, "222222");
}

#[tokio::test]
async fn should_reject_superseded_code_as_invalid() {
    let (registry, _repo, _clock) = registry(&["111111", "222222"]);

    registry.issue_code(BRIDE).await.unwrap();
    registry.issue_code(BRIDE).await.unwrap();

    let outcome = registry.verify_code(BRIDE, "111111").await.unwrap();
    assert_eq!(outcome.message(), "INVALID_CODE");
}

#[tokio::test]
async fn should_not_touch_other_emails_on_reissue() {
    let (registry, repo, _clock) = registry(&["111111", "222222"]);

    registry.issue_code("groom@example.com").await.unwrap();
    registry.issue_code(BRIDE).await.unwrap();

    assert_eq!(repo.active_for("groom@example.com").len(), 1);
    assert_eq!(repo.active_for(BRIDE).len(), 1);
}

#[tokio::test]
async fn should_normalize_email_before_storing() {
    let (registry, repo, _clock) = registry(&["111111", "222222"]);

    registry.issue_code("  Bride@Example.COM ").await.unwrap();
    registry.issue_code(BRIDE).await.unwrap();

    assert_eq!(repo.for_email(BRIDE).len(), 2);
    assert_eq!(repo.active_for(BRIDE).len(), 1);
}

#[tokio::test]
async fn should_write_outbox_event_with_code() {
    let (registry, repo, _clock) = registry(&["730055"]);

    registry.issue_code(BRIDE).await.unwrap();

    let events = repo.events.lock().unwrap();
    assert_eq!(events.len(), 1);
    let event = &events[0];
    assert_eq!(event.kind, VERIFICATION_CODE_ISSUED);
    assert_eq!(event.payload["email"], BRIDE);
    assert_eq!(event.payload["code"], "730055");
    assert_eq!(event.aggregate_id, repo.for_email(BRIDE)[0].id);
}

#[tokio::test]
async fn should_reject_blank_email() {
    let (registry, repo, _clock) = registry(&[]);

    let result = registry.issue_code("   ").await;
    assert!(
        matches!(result, Err(VerificationServiceError::MissingEmail)),
        "expected MissingEmail, got {result:?}"
    );
    assert!(repo.snapshot().is_empty());
}

#[tokio::test]
async fn should_propagate_store_failure() {
    let (registry, repo, _clock) = registry(&["111111"]);
    repo.unavailable
        .store(true, std::sync::atomic::Ordering::SeqCst);

    let result = registry.issue_code(BRIDE).await;
    assert!(
        matches!(result, Err(VerificationServiceError::Internal(_))),
        "expected Internal, got {result:?}"
    );
}

#[tokio::test]
async fn should_fail_when_expiry_is_out_of_range() {
    let (mut registry, repo, _clock) = registry(&["111111"]);
    registry.policy.code_ttl = chrono::Duration::seconds(9_000_000_000_000);

    let result = registry.issue_code(BRIDE).await;
    assert!(
        matches!(result, Err(VerificationServiceError::Internal(_))),
        "expected Internal, got {result:?}"
    );
    assert!(repo.snapshot().is_empty());
}

#[tokio::test]
async fn should_issue_six_digit_codes_with_secure_generator() {
    let repo = InMemoryVerificationRepo::new();
    let registry = VerificationRegistry {
        records: repo.clone(),
        generator: SecureCodeGenerator,
        clock: SystemClock,
        policy: VerificationPolicy::default(),
    };

    for _ in 0..50 {
        let code = registry.issue_code(BRIDE).await.unwrap();
        assert!(is_well_formed(&code), "malformed code {code}");
    }
    assert_eq!(repo.active_for(BRIDE).len(), 1);
}
