use crate::core::constants::{BANK_WHATSAPP_NUMBER, PHONE_COUNTRY_CODE, PHONE_DIGITS};
use crate::core::errors::SubsplitError;
use crate::core::models::{
    balance::{BalanceEntry, BreakdownDirection, BreakdownLine},
    person::Person,
};
use log::warn;

/// Two decimals, rounded half away from zero, comma as decimal separator:
/// `16.73` becomes `"16,73"`.
pub fn format_money(value: f64) -> String {
    if !value.is_finite() {
        return "0,00".to_string();
    }
    let mut rounded = (value * 100.0).round() / 100.0;
    if rounded == 0.0 {
        rounded = 0.0; // no "-0,00"
    }
    format!("{:.2}", rounded).replace('.', ",")
}

pub fn digits_only(phone: &str) -> String {
    phone.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Receiver key for payment instructions: the phone's digits without the
/// Brazilian country code.
pub fn derive_pix_key(phone: &str) -> String {
    let digits = digits_only(phone);
    match digits.strip_prefix(PHONE_COUNTRY_CODE) {
        Some(rest) => rest.to_string(),
        None => digits,
    }
}

/// Phone digits with the country code, as the bank bot expects them.
pub fn format_phone_for_pix(phone: &str) -> String {
    let digits = digits_only(phone);
    if digits.len() == PHONE_DIGITS {
        format!("{}{}", PHONE_COUNTRY_CODE, digits)
    } else {
        digits
    }
}

/// Who receives the transfer that settles an entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PixReceiver {
    CurrentUser,
    Counterparty,
}

impl PixReceiver {
    pub fn for_entry(entry: &BalanceEntry) -> Result<Self, SubsplitError> {
        if entry.net_amount > 0.0 {
            Ok(PixReceiver::CurrentUser)
        } else if entry.net_amount < 0.0 {
            Ok(PixReceiver::Counterparty)
        } else {
            warn!(
                "Nothing to transfer between current user and {}",
                entry.counterparty.id
            );
            Err(SubsplitError::ZeroBalance)
        }
    }
}

pub fn pix_instruction(amount: f64, receiver_phone: &str) -> String {
    format!(
        "R${} para {}",
        format_money(amount.abs()),
        format_phone_for_pix(receiver_phone)
    )
}

pub fn whatsapp_link(instruction: &str) -> Result<String, SubsplitError> {
    let base = format!("https://wa.me/{}", BANK_WHATSAPP_NUMBER);
    url::Url::parse_with_params(&base, &[("text", instruction)])
        .map(|url| url.to_string())
        .map_err(|e| SubsplitError::InternalServerError(format!("Invalid WhatsApp link: {}", e)))
}

fn push_section(lines: &mut Vec<String>, heading: &str, cost_label: &str, items: &[&BreakdownLine]) {
    if items.is_empty() {
        return;
    }
    lines.push(heading.to_string());
    for item in items {
        lines.push(format!("- {}", item.name));
        lines.push(format!("  Total amount: R$ {}", format_money(item.total_amount)));
        lines.push(format!(
            "  {}: R$ {} (1/{})",
            cost_label,
            format_money(item.share_amount),
            item.participant_count.max(1)
        ));
    }
    lines.push(String::new());
}

fn push_net_instruction(lines: &mut Vec<String>, entry: &BalanceEntry, current_user: &Person) {
    let net = entry.net_amount;
    if net > 0.0 {
        lines.push(format!("You must transfer me: R$ {}", format_money(net)));
        let key = derive_pix_key(&current_user.phone);
        if !key.is_empty() {
            lines.push(format!("My PIX key: {}", key));
        }
    } else if net < 0.0 {
        lines.push(format!("I must transfer you: R$ {}", format_money(net.abs())));
        let key = derive_pix_key(&entry.counterparty.phone);
        if !key.is_empty() {
            lines.push(format!("Your PIX key: {}", key));
        }
    } else {
        lines.push("R$ 0,00".to_string());
    }
}

/// Plain-text report of one balance, written from the current user's point of
/// view and addressed to the counterparty.
pub fn build_summary_text(entry: &BalanceEntry, current_user: &Person) -> String {
    let paid_by_you: Vec<&BreakdownLine> = entry.lines(BreakdownDirection::YouOwe).collect();
    let paid_by_me: Vec<&BreakdownLine> = entry.lines(BreakdownDirection::OwedToYou).collect();

    let mut lines = vec!["Shared expenses summary".to_string(), String::new()];
    push_section(&mut lines, "Subscriptions paid by you:", "My proportional cost", &paid_by_you);
    push_section(&mut lines, "Subscriptions paid by me:", "Your proportional cost", &paid_by_me);

    if !paid_by_you.is_empty() && !paid_by_me.is_empty() {
        let you_paid: f64 = paid_by_you.iter().map(|l| l.share_amount).sum();
        let i_paid: f64 = paid_by_me.iter().map(|l| l.share_amount).sum();
        lines.push("Totals:".to_string());
        lines.push(format!("- You paid for me: R$ {}", format_money(you_paid)));
        lines.push(format!("- I paid for you: R$ {}", format_money(i_paid)));
        lines.push("--------------------------------".to_string());
    }
    push_net_instruction(&mut lines, entry, current_user);

    lines.join("\n")
}
