use crate::core::constants::{SUBSCRIPTION_CREATED, SUBSCRIPTION_DELETED, SUBSCRIPTION_UPDATED};
use crate::core::errors::SubsplitError;
use crate::core::services::SplitInput;
use crate::tests::{add_person, create_test_service, even_input, june, percentage_input, seed_admin};
use std::time::Duration;

#[tokio::test]
async fn test_create_even_subscription() {
    let service = create_test_service();
    let alice = seed_admin(&service).await;
    let bob = add_person(&service, &alice, "Bob", "11911110001").await;

    let details = service
        .create_subscription(even_input("  Netflix ", 55.9, 10, &alice, &[&bob]), &bob)
        .await
        .unwrap();
    assert_eq!(details.subscription.name, "Netflix");
    assert_eq!(details.subscription.payer_id, alice.id);
    assert_eq!(details.subscription.created_by, bob.id);
    assert_eq!(details.payer.as_ref().map(|p| p.id.as_str()), Some(alice.id.as_str()));
    assert_eq!(details.splits.len(), 1);
    assert_eq!(details.splits[0].split.custom_amount, None);
    assert_eq!(details.splits[0].participant.as_ref().unwrap().name, "Bob");

    let fetched = service.get_subscription(&details.subscription.id).await.unwrap();
    assert_eq!(fetched.subscription, details.subscription);
}

#[tokio::test]
async fn test_percentages_become_custom_amounts() {
    let service = create_test_service();
    let alice = seed_admin(&service).await;
    let bob = add_person(&service, &alice, "Bob", "11911110001").await;
    let carol = add_person(&service, &alice, "Carol", "11911110002").await;

    let details = service
        .create_subscription(
            percentage_input("Internet", 200.0, &alice, 20.0, &[(&bob, 50.0), (&carol, 30.0)]),
            &alice,
        )
        .await
        .unwrap();
    let mut amounts: Vec<(String, Option<f64>)> = details
        .splits
        .iter()
        .map(|s| (s.split.participant_id.clone(), s.split.custom_amount))
        .collect();
    amounts.sort_by(|a, b| a.0.cmp(&b.0));
    let mut expected = vec![(bob.id.clone(), Some(100.0)), (carol.id.clone(), Some(60.0))];
    expected.sort_by(|a, b| a.0.cmp(&b.0));
    assert_eq!(amounts, expected);
}

#[tokio::test]
async fn test_percentage_sum_must_be_100() {
    let service = create_test_service();
    let alice = seed_admin(&service).await;
    let bob = add_person(&service, &alice, "Bob", "11911110001").await;
    let carol = add_person(&service, &alice, "Carol", "11911110002").await;

    let result = service
        .create_subscription(
            percentage_input("Internet", 100.0, &alice, 20.0, &[(&bob, 50.0), (&carol, 20.0)]),
            &alice,
        )
        .await;
    assert!(matches!(result, Err(SubsplitError::PercentageSumMismatch(sum)) if (sum - 90.0).abs() < 1e-9));

    // Within tolerance.
    service
        .create_subscription(
            percentage_input("Thirds", 90.0, &alice, 33.33, &[(&bob, 33.33), (&carol, 33.34)]),
            &alice,
        )
        .await
        .unwrap();

    let result = service
        .create_subscription(
            percentage_input("Negative", 100.0, &alice, 120.0, &[(&bob, -20.0)]),
            &alice,
        )
        .await;
    assert!(matches!(result, Err(SubsplitError::InvalidInput(field, _)) if field == "percentage"));
}

#[tokio::test]
async fn test_mixed_split_modes_rejected() {
    let service = create_test_service();
    let alice = seed_admin(&service).await;
    let bob = add_person(&service, &alice, "Bob", "11911110001").await;
    let carol = add_person(&service, &alice, "Carol", "11911110002").await;

    let mut input = even_input("Netflix", 40.0, 10, &alice, &[&bob, &carol]);
    input.splits[0].percentage = Some(50.0);
    let result = service.create_subscription(input, &alice).await;
    assert!(matches!(result, Err(SubsplitError::MixedSplitModes)));

    let mut input = even_input("Netflix", 40.0, 10, &alice, &[&bob]);
    input.payer_percentage = Some(50.0);
    let result = service.create_subscription(input, &alice).await;
    assert!(matches!(result, Err(SubsplitError::MixedSplitModes)));
}

#[tokio::test]
async fn test_invalid_participants_rejected() {
    let service = create_test_service();
    let alice = seed_admin(&service).await;
    let bob = add_person(&service, &alice, "Bob", "11911110001").await;

    let result = service
        .create_subscription(even_input("Netflix", 40.0, 10, &alice, &[&alice]), &alice)
        .await;
    assert!(matches!(result, Err(SubsplitError::PayerInSplits(_))));

    let result = service
        .create_subscription(even_input("Netflix", 40.0, 10, &alice, &[&bob, &bob]), &alice)
        .await;
    assert!(matches!(result, Err(SubsplitError::DuplicateParticipant(id)) if id == bob.id));

    let mut input = even_input("Netflix", 40.0, 10, &alice, &[]);
    input.splits.push(SplitInput {
        participant_id: "nobody".to_string(),
        percentage: None,
    });
    let result = service.create_subscription(input, &alice).await;
    assert!(matches!(result, Err(SubsplitError::PersonNotFound(id)) if id == "nobody"));

    let mut input = even_input("Netflix", 40.0, 10, &alice, &[&bob]);
    input.payer_id = "nobody".to_string();
    let result = service.create_subscription(input, &alice).await;
    assert!(matches!(result, Err(SubsplitError::PersonNotFound(_))));
}

#[tokio::test]
async fn test_invalid_amount_and_billing_day_rejected() {
    let service = create_test_service();
    let alice = seed_admin(&service).await;
    let bob = add_person(&service, &alice, "Bob", "11911110001").await;

    for (amount, day, field) in [
        (-1.0, 10, "total_amount"),
        (10.001, 10, "total_amount"),
        (2_000_000.0, 10, "total_amount"),
        (f64::INFINITY, 10, "total_amount"),
        (40.0, 0, "billing_day"),
        (40.0, 32, "billing_day"),
    ] {
        let result = service
            .create_subscription(even_input("Netflix", amount, day, &alice, &[&bob]), &alice)
            .await;
        assert!(
            matches!(&result, Err(SubsplitError::InvalidInput(f, _)) if f == field),
            "amount {} day {} gave {:?}",
            amount,
            day,
            result.map(|d| d.subscription.id)
        );
    }

    let result = service
        .create_subscription(even_input("   ", 40.0, 10, &alice, &[&bob]), &alice)
        .await;
    assert!(matches!(result, Err(SubsplitError::InvalidInput(f, _)) if f == "name"));
    assert!(service.list_subscriptions().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_update_replaces_splits_wholesale() {
    let service = create_test_service();
    let alice = seed_admin(&service).await;
    let bob = add_person(&service, &alice, "Bob", "11911110001").await;
    let carol = add_person(&service, &alice, "Carol", "11911110002").await;
    let dave = add_person(&service, &alice, "Dave", "11911110003").await;

    let created = service
        .create_subscription(even_input("Netflix", 90.0, 10, &alice, &[&bob, &carol]), &alice)
        .await
        .unwrap();
    let id = created.subscription.id.clone();

    let updated = service
        .update_subscription(&id, even_input("Netflix 4K", 60.0, 15, &alice, &[&dave]), &alice)
        .await
        .unwrap();
    assert_eq!(updated.subscription.name, "Netflix 4K");
    assert_eq!(updated.subscription.billing_day, 15);
    assert_eq!(updated.subscription.created_at, created.subscription.created_at);
    assert_eq!(updated.splits.len(), 1);
    assert_eq!(updated.splits[0].split.participant_id, dave.id);

    assert!(service.get_balances(&bob, june()).await.unwrap().balances.is_empty());
    let dave_summary = service.get_balances(&dave, june()).await.unwrap();
    assert_eq!(dave_summary.balances[0].net_amount, -30.0);

    let result = service
        .update_subscription("missing", even_input("X", 1.0, 1, &alice, &[]), &alice)
        .await;
    assert!(matches!(result, Err(SubsplitError::SubscriptionNotFound(_))));
}

#[tokio::test]
async fn test_invalid_update_keeps_existing_splits() {
    let service = create_test_service();
    let alice = seed_admin(&service).await;
    let bob = add_person(&service, &alice, "Bob", "11911110001").await;

    let created = service
        .create_subscription(even_input("Netflix", 40.0, 10, &alice, &[&bob]), &alice)
        .await
        .unwrap();
    let result = service
        .update_subscription(
            &created.subscription.id,
            percentage_input("Netflix", 40.0, &alice, 10.0, &[(&bob, 10.0)]),
            &alice,
        )
        .await;
    assert!(matches!(result, Err(SubsplitError::PercentageSumMismatch(_))));

    let details = service.get_subscription(&created.subscription.id).await.unwrap();
    assert_eq!(details.splits.len(), 1);
    assert_eq!(details.splits[0].split.custom_amount, None);
}

#[tokio::test]
async fn test_delete_subscription_cascades_splits() {
    let service = create_test_service();
    let alice = seed_admin(&service).await;
    let bob = add_person(&service, &alice, "Bob", "11911110001").await;

    let created = service
        .create_subscription(even_input("Netflix", 40.0, 10, &alice, &[&bob]), &alice)
        .await
        .unwrap();
    let id = created.subscription.id;
    service.delete_subscription(&id, &alice).await.unwrap();

    assert!(matches!(
        service.get_subscription(&id).await,
        Err(SubsplitError::SubscriptionNotFound(_))
    ));
    assert!(service.get_balances(&bob, june()).await.unwrap().balances.is_empty());
    assert!(matches!(
        service.delete_subscription(&id, &alice).await,
        Err(SubsplitError::SubscriptionNotFound(_))
    ));

    let logs = service.get_app_logs(&alice).await.unwrap();
    for action in [SUBSCRIPTION_CREATED, SUBSCRIPTION_DELETED] {
        assert!(logs.iter().any(|l| l.action == action));
    }
    assert!(!logs.iter().any(|l| l.action == SUBSCRIPTION_UPDATED));
}

#[tokio::test]
async fn test_list_subscriptions_newest_first() {
    let service = create_test_service();
    let alice = seed_admin(&service).await;

    for name in ["First", "Second", "Third"] {
        service
            .create_subscription(even_input(name, 10.0, 1, &alice, &[]), &alice)
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    let names: Vec<String> = service
        .list_subscriptions()
        .await
        .unwrap()
        .into_iter()
        .map(|d| d.subscription.name)
        .collect();
    assert_eq!(names, vec!["Third", "Second", "First"]);
}
