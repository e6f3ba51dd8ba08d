use crate::core::formatting::format_money;
use crate::core::models::{notification::DueNotification, subscription::SubscriptionDetails};

/// Reminders for subscriptions billed on `day`, from `user_id`'s side: one
/// per subscription they pay for (money to receive) and one per subscription
/// they take part in (money to send).
pub fn due_today(user_id: &str, day: u32, subscriptions: &[SubscriptionDetails]) -> Vec<DueNotification> {
    let mut notifications = Vec::new();

    for details in subscriptions.iter().filter(|d| d.subscription.billing_day == day) {
        let subscription = &details.subscription;
        let split_count = details.splits.len();

        if subscription.payer_id == user_id {
            let to_receive: f64 = details
                .splits
                .iter()
                .map(|s| s.split.share(subscription.total_amount, split_count))
                .sum();
            if to_receive > 0.0 {
                notifications.push(DueNotification {
                    title: "You will receive today!".to_string(),
                    body: format!(
                        "{}: R$ {} from {} {}",
                        subscription.name,
                        format_money(to_receive),
                        split_count,
                        if split_count == 1 { "person" } else { "people" }
                    ),
                    tag: format!("receive-{}", subscription.id),
                });
            }
        }

        if let Some(own) = details.splits.iter().find(|s| s.split.participant_id == user_id) {
            let share = own.split.share(subscription.total_amount, split_count);
            let payer_name = details.payer.as_ref().map(|p| p.name.as_str()).unwrap_or("Payer");
            notifications.push(DueNotification {
                title: "You have expenses to settle today!".to_string(),
                body: format!("{}: R$ {} to {}", subscription.name, format_money(share), payer_name),
                tag: format!("pay-{}", subscription.id),
            });
        }
    }

    notifications
}
