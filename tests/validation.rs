mod common;

use common::{memory_cache, reputation, MockFormat, MockMailbox, MockRealtime, Realtime};
use zentinel_agent_email_reputation::{
    Reachability, Reason, ValidateOptions, ValidationError, ValidationResult,
};

#[tokio::test]
async fn malformed_addresses_never_reach_oracles() {
    let (_dir, store) = reputation(vec!["tempmail.com"]).await;
    let format = MockFormat::clean();
    let realtime = MockRealtime::new(Realtime::Answer(false));
    let mailbox = MockMailbox::new(Reachability::Safe);
    let validator = common::validator(store, format.clone())
        .with_realtime(realtime.clone())
        .with_mailbox(mailbox.clone());
    let options = ValidateOptions {
        deep: true,
        ..ValidateOptions::default()
    };

    for address in ["plainaddress", "user.example.com", "user@localhost", "@example", "   ", ""] {
        let result = validator.validate(address, &options).await.unwrap();
        assert!(!result.valid, "{address:?} should be rejected");
        assert_eq!(result.reason, Some(Reason::InvalidSyntax));
    }

    assert_eq!(format.calls(), 0);
    assert_eq!(realtime.calls(), 0);
    assert_eq!(mailbox.calls(), 0);
}

#[tokio::test]
async fn blocklisted_domains_short_circuit() {
    let (_dir, store) = reputation(vec!["tempmail.com"]).await;
    let format = MockFormat::clean();
    let realtime = MockRealtime::new(Realtime::Answer(false));
    let validator = common::validator(store, format.clone()).with_realtime(realtime.clone());

    for address in ["a@tempmail.com", "a@xyz.tempmail.com", "a@deep.xyz.tempmail.com"] {
        let result = validator
            .validate(address, &ValidateOptions::default())
            .await
            .unwrap();
        assert!(result.disposable, "{address} should be disposable");
        assert!(!result.valid);
        assert_eq!(result.reason, Some(Reason::Disposable));
    }

    assert_eq!(format.calls(), 0);
    assert_eq!(realtime.calls(), 0);
}

#[tokio::test]
async fn suffix_lookalikes_are_not_blocklisted() {
    let (_dir, store) = reputation(vec!["tempmail.com"]).await;
    let validator = common::validator(store, MockFormat::clean());

    let result = validator
        .validate("a@tempmail.com.example.org", &ValidateOptions::default())
        .await
        .unwrap();
    assert!(!result.disposable);
    assert!(result.valid);
}

#[tokio::test]
async fn repeated_validation_is_idempotent() {
    let (_dir, store) = reputation(vec![]).await;
    let validator = common::validator(store, MockFormat::clean())
        .with_realtime(MockRealtime::new(Realtime::Answer(false)))
        .with_mailbox(MockMailbox::new(Reachability::Safe))
        .with_cache(memory_cache());
    let options = ValidateOptions {
        deep: true,
        ..ValidateOptions::default()
    };

    let first = validator.validate("User@Example.org", &options).await.unwrap();
    let second = validator.validate("user@example.org", &options).await.unwrap();

    assert!(!first.cached);
    assert!(second.cached);
    assert_eq!(ValidationResult { cached: false, ..second }, first);
}

#[tokio::test]
async fn realtime_failure_fails_open() {
    let (_dir, store) = reputation(vec![]).await;
    let validator = common::validator(store, MockFormat::clean())
        .with_realtime(MockRealtime::new(Realtime::Fail));

    let result = validator
        .validate("user@example.org", &ValidateOptions::default())
        .await
        .unwrap();
    assert!(result.valid);
    assert!(result.reason.is_none());
    assert!(!result.disposable);
}

#[tokio::test(start_paused = true)]
async fn realtime_timeout_fails_open() {
    let (_dir, store) = reputation(vec![]).await;
    let realtime = MockRealtime::new(Realtime::Hang);
    let validator = common::validator(store, MockFormat::clean()).with_realtime(realtime.clone());

    let result = validator
        .validate("user@example.org", &ValidateOptions::default())
        .await
        .unwrap();
    assert!(result.valid);
    assert_eq!(realtime.calls(), 1);
}

#[tokio::test]
async fn realtime_flag_still_rejects() {
    let (_dir, store) = reputation(vec![]).await;
    let validator = common::validator(store, MockFormat::clean())
        .with_realtime(MockRealtime::new(Realtime::Answer(true)));

    let result = validator
        .validate("user@new-burner.example", &ValidateOptions::default())
        .await
        .unwrap();
    assert!(result.disposable);
}

#[tokio::test]
async fn deep_mode_without_backend_is_a_configuration_error() {
    let (_dir, store) = reputation(vec![]).await;
    let validator = common::validator(store, MockFormat::clean());
    let options = ValidateOptions {
        deep: true,
        ..ValidateOptions::default()
    };

    let err = validator
        .validate("user@example.org", &options)
        .await
        .unwrap_err();
    assert!(matches!(err, ValidationError::Configuration(_)));

    // Shallow mode with the same validator is unaffected.
    let shallow = validator
        .validate("user@example.org", &ValidateOptions::default())
        .await
        .unwrap();
    assert!(shallow.valid);
}

#[tokio::test]
async fn discovered_domains_are_matched_after_add() {
    let (_dir, store) = reputation(vec![]).await;
    let format = MockFormat::clean();
    let validator = common::validator(store.clone(), format.clone());

    let before = validator
        .validate("a@hot-new-burner.io", &ValidateOptions::default())
        .await
        .unwrap();
    assert!(before.valid);

    store.discovered().add(["hot-new-burner.io"]).await.unwrap();

    let after = validator
        .validate("a@hot-new-burner.io", &ValidateOptions::default())
        .await
        .unwrap();
    assert!(after.disposable);
    assert_eq!(format.calls(), 1);
}
