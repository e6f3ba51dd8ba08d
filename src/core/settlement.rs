use crate::core::errors::SubsplitError;
use crate::core::models::{balance::BalanceSummary, payment::MonthlyPayment};
use chrono::{Datelike, NaiveDate};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use utoipa::ToSchema;

/// Calendar month a settlement applies to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub struct BillingPeriod {
    pub month: u32,
    pub year: i32,
}

impl BillingPeriod {
    pub fn of(date: NaiveDate) -> Self {
        BillingPeriod {
            month: date.month(),
            year: date.year(),
        }
    }

    pub fn current() -> Self {
        Self::of(chrono::Local::now().date_naive())
    }
}

/// Flags every entry whose counterparty has a payment record this month.
/// Only existence matters; duplicates and amounts are ignored.
pub fn annotate_settled(summary: &mut BalanceSummary, payments: &[MonthlyPayment]) {
    let settled: HashSet<&str> = payments.iter().map(|p| p.counterparty_id.as_str()).collect();
    for entry in &mut summary.balances {
        entry.settled_this_month = settled.contains(entry.counterparty.id.as_str());
    }
    debug!("Annotated settlement state from {} payment records", payments.len());
}

/// Amount a settlement would record for `net_amount`, rejecting zero.
pub fn settleable_amount(net_amount: f64) -> Result<f64, SubsplitError> {
    let amount = net_amount.abs();
    if amount <= 0.0 || !amount.is_finite() {
        warn!("Rejected settlement of a zero balance");
        return Err(SubsplitError::ZeroBalance);
    }
    Ok(amount)
}

/// Local state update after a successful settlement write, without a reload.
pub fn mark_entry_settled(summary: &mut BalanceSummary, counterparty_id: &str) -> bool {
    match summary
        .balances
        .iter_mut()
        .find(|entry| entry.counterparty.id == counterparty_id)
    {
        Some(entry) => {
            entry.settled_this_month = true;
            true
        }
        None => false,
    }
}
