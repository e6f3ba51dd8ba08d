use crate::core::constants::SETTLEMENT_MARKED;
use crate::core::errors::SubsplitError;
use crate::core::settlement::{BillingPeriod, annotate_settled, mark_entry_settled, settleable_amount};
use crate::tests::{add_person, create_test_service, even_input, june, seed_admin};
use chrono::NaiveDate;

#[tokio::test]
async fn test_mark_settled_flags_only_that_counterparty() {
    let service = create_test_service();
    let alice = seed_admin(&service).await;
    let bob = add_person(&service, &alice, "Bob", "11911110001").await;
    let carol = add_person(&service, &alice, "Carol", "11911110002").await;
    service
        .create_subscription(even_input("Netflix", 90.0, 10, &alice, &[&bob, &carol]), &alice)
        .await
        .unwrap();

    let payment = service.mark_settled(&alice, &bob.id, 30.0, june()).await.unwrap();
    assert_eq!(payment.receiver_id, alice.id);
    assert_eq!(payment.counterparty_id, bob.id);
    assert_eq!((payment.month, payment.year), (6, 2024));
    assert_eq!(payment.amount_paid, 30.0);

    let summary = service.get_balances(&alice, june()).await.unwrap();
    let bob_entry = summary.entry(&bob.id).unwrap();
    let carol_entry = summary.entry(&carol.id).unwrap();
    assert!(bob_entry.settled_this_month);
    assert!(!carol_entry.settled_this_month);
    // Settling never changes the amounts.
    assert_eq!(bob_entry.net_amount, 30.0);
    assert_eq!(summary.total_owed_to_user, 60.0);
}

#[tokio::test]
async fn test_mark_settled_stores_absolute_amount() {
    let service = create_test_service();
    let alice = seed_admin(&service).await;
    let bob = add_person(&service, &alice, "Bob", "11911110001").await;

    let payment = service.mark_settled(&bob, &alice.id, -16.73, june()).await.unwrap();
    assert_eq!(payment.amount_paid, 16.73);
    assert_eq!(payment.receiver_id, bob.id);
}

#[tokio::test]
async fn test_mark_settled_rejects_zero_balance() {
    let service = create_test_service();
    let alice = seed_admin(&service).await;
    let bob = add_person(&service, &alice, "Bob", "11911110001").await;
    service
        .create_subscription(even_input("Netflix", 40.0, 10, &alice, &[&bob]), &alice)
        .await
        .unwrap();

    let result = service.mark_settled(&alice, &bob.id, 0.0, june()).await;
    assert!(matches!(result, Err(SubsplitError::ZeroBalance)));

    let summary = service.get_balances(&alice, june()).await.unwrap();
    assert!(!summary.entry(&bob.id).unwrap().settled_this_month);
}

#[tokio::test]
async fn test_duplicate_settlement_keeps_first_record() {
    let service = create_test_service();
    let alice = seed_admin(&service).await;
    let bob = add_person(&service, &alice, "Bob", "11911110001").await;

    let first = service.mark_settled(&alice, &bob.id, 20.0, june()).await.unwrap();
    let second = service.mark_settled(&alice, &bob.id, 25.0, june()).await.unwrap();
    assert_eq!(first.id, second.id);
    assert_eq!(second.amount_paid, 20.0);

    let next_month = BillingPeriod { month: 7, year: 2024 };
    let third = service.mark_settled(&alice, &bob.id, 20.0, next_month).await.unwrap();
    assert_ne!(first.id, third.id);
}

#[tokio::test]
async fn test_settlement_is_scoped_to_its_month() {
    let service = create_test_service();
    let alice = seed_admin(&service).await;
    let bob = add_person(&service, &alice, "Bob", "11911110001").await;
    service
        .create_subscription(even_input("Netflix", 40.0, 10, &alice, &[&bob]), &alice)
        .await
        .unwrap();
    service.mark_settled(&alice, &bob.id, 20.0, june()).await.unwrap();

    let july = BillingPeriod { month: 7, year: 2024 };
    let summary = service.get_balances(&alice, july).await.unwrap();
    assert!(!summary.entry(&bob.id).unwrap().settled_this_month);

    let june_last_year = BillingPeriod { month: 6, year: 2023 };
    let summary = service.get_balances(&alice, june_last_year).await.unwrap();
    assert!(!summary.entry(&bob.id).unwrap().settled_this_month);
}

#[tokio::test]
async fn test_settle_entry_updates_loaded_summary() {
    let service = create_test_service();
    let alice = seed_admin(&service).await;
    let bob = add_person(&service, &alice, "Bob", "11911110001").await;
    service
        .create_subscription(even_input("Netflix", 40.0, 10, &alice, &[&bob]), &alice)
        .await
        .unwrap();

    let mut summary = service.get_balances(&alice, june()).await.unwrap();
    let payment = service
        .settle_entry(&alice, &mut summary, &bob.id, june())
        .await
        .unwrap();
    assert_eq!(payment.amount_paid, 20.0);
    assert!(summary.entry(&bob.id).unwrap().settled_this_month);

    let result = service.settle_entry(&alice, &mut summary, "nobody", june()).await;
    assert!(matches!(result, Err(SubsplitError::ZeroBalance)));

    let logs = service.get_app_logs(&alice).await.unwrap();
    let marked: Vec<_> = logs.iter().filter(|l| l.action == SETTLEMENT_MARKED).collect();
    assert_eq!(marked.len(), 1);
    assert_eq!(marked[0].details["counterparty_id"], bob.id.as_str());
}

#[tokio::test]
async fn test_settling_a_netted_out_balance_is_rejected() {
    let service = create_test_service();
    let alice = seed_admin(&service).await;
    let bob = add_person(&service, &alice, "Bob", "11911110001").await;
    service
        .create_subscription(even_input("Netflix", 40.0, 10, &alice, &[&bob]), &alice)
        .await
        .unwrap();
    service
        .create_subscription(even_input("Spotify", 40.0, 12, &bob, &[&alice]), &alice)
        .await
        .unwrap();

    let mut summary = service.get_balances(&alice, june()).await.unwrap();
    assert!(summary.entry(&bob.id).is_none());
    let result = service.settle_entry(&alice, &mut summary, &bob.id, june()).await;
    assert!(matches!(result, Err(SubsplitError::ZeroBalance)));

    let logs = service.get_app_logs(&alice).await.unwrap();
    assert!(!logs.iter().any(|l| l.action == SETTLEMENT_MARKED));
}

#[tokio::test]
async fn test_settlement_helpers() {
    assert_eq!(settleable_amount(-12.5).unwrap(), 12.5);
    assert!(matches!(settleable_amount(0.0), Err(SubsplitError::ZeroBalance)));
    assert!(matches!(settleable_amount(f64::NAN), Err(SubsplitError::ZeroBalance)));

    let period = BillingPeriod::of(NaiveDate::from_ymd_opt(2024, 12, 31).unwrap());
    assert_eq!(period, BillingPeriod { month: 12, year: 2024 });

    let service = create_test_service();
    let alice = seed_admin(&service).await;
    let bob = add_person(&service, &alice, "Bob", "11911110001").await;
    service
        .create_subscription(even_input("Netflix", 40.0, 10, &alice, &[&bob]), &alice)
        .await
        .unwrap();
    let mut summary = service.get_balances(&alice, june()).await.unwrap();

    assert!(!mark_entry_settled(&mut summary, "nobody"));
    assert!(mark_entry_settled(&mut summary, &bob.id));
    assert!(summary.entry(&bob.id).unwrap().settled_this_month);

    // Annotation reflects exactly the given records.
    annotate_settled(&mut summary, &[]);
    assert!(!summary.entry(&bob.id).unwrap().settled_this_month);
}
