use std::time::Duration;

pub const PERSON_CREATED: &str = "PERSON_CREATED";
pub const PERSON_UPDATED: &str = "PERSON_UPDATED";
pub const PERSON_DELETED: &str = "PERSON_DELETED";
pub const SUBSCRIPTION_CREATED: &str = "SUBSCRIPTION_CREATED";
pub const SUBSCRIPTION_UPDATED: &str = "SUBSCRIPTION_UPDATED";
pub const SUBSCRIPTION_DELETED: &str = "SUBSCRIPTION_DELETED";
pub const SETTLEMENT_MARKED: &str = "SETTLEMENT_MARKED";
pub const USER_LOGGED_IN: &str = "USER_LOGGED_IN";
pub const USER_LOGGED_OUT: &str = "USER_LOGGED_OUT";

/// Balances whose absolute value is at or below this are treated as settled.
pub const BALANCE_TOLERANCE: f64 = 0.01;

/// Allowed drift when checking that split percentages add up to 100.
pub const PERCENTAGE_TOLERANCE: f64 = 0.01;

/// Shortest period between two due-bill checks of one watcher.
pub const MIN_WATCH_PERIOD: Duration = Duration::from_secs(1);

pub const MAX_AMOUNT: f64 = 1_000_000.0;
pub const MAX_NAME_LENGTH: usize = 100;
pub const PHONE_DIGITS: usize = 11;
pub const PHONE_COUNTRY_CODE: &str = "55";

/// Bank bot that accepts PIX instructions over WhatsApp.
pub const BANK_WHATSAPP_NUMBER: &str = "5511400415150";
