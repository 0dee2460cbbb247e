//! Expense totals, per-member balances and settle-up transfers.
//!
//! All arithmetic on shares happens in integer cents so every split adds back
//! up to the original amount exactly.

use crate::models::{Budget, Expense};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use uuid::Uuid;

/// Spending against the trip budget
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetStatus {
    pub total: Decimal,
    pub currency: String,
    pub spent: Decimal,
    pub remaining: Decimal,
    pub percent_used: Decimal,
    pub categories: Vec<CategoryStatus>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryStatus {
    pub category: String,
    pub limit: Decimal,
    pub spent: Decimal,
    pub remaining: Decimal,
}

/// What one member paid, what they owe, and the difference
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberBalance {
    pub user_id: Uuid,
    pub paid: Decimal,
    pub owed: Decimal,
    pub net: Decimal,
}

/// One payment that settles part of the group's debts
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transfer {
    pub from: Uuid,
    pub to: Uuid,
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseSummary {
    pub total: Decimal,
    pub currency: String,
    pub count: usize,
    pub by_category: BTreeMap<String, Decimal>,
    pub by_payer: BTreeMap<Uuid, Decimal>,
    pub budget: Option<BudgetStatus>,
    pub balances: Vec<MemberBalance>,
    pub settlements: Vec<Transfer>,
}

fn to_cents(amount: Decimal) -> i64 {
    (amount * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .unwrap_or(0)
}

fn from_cents(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

/// Split `cents` across `participants` (sorted), giving the leftover cents to
/// the first participants one each
pub fn split_cents(cents: i64, participants: &[Uuid]) -> Vec<(Uuid, i64)> {
    if participants.is_empty() {
        return Vec::new();
    }
    let n = participants.len() as i64;
    let share = cents / n;
    let remainder = cents % n;
    participants
        .iter()
        .enumerate()
        .map(|(i, id)| (*id, share + if (i as i64) < remainder { 1 } else { 0 }))
        .collect()
}

/// Who paid an expense: the recorded payer, else whoever created it
fn payer_of(expense: &Expense) -> Option<Uuid> {
    expense.paid_by.or(expense.created_by)
}

/// Net balance in cents per member. An empty `split_among` means everyone in `members`.
pub fn net_balances(expenses: &[Expense], members: &[Uuid]) -> BTreeMap<Uuid, (i64, i64)> {
    let mut members_sorted: Vec<Uuid> = members.to_vec();
    members_sorted.sort();
    members_sorted.dedup();

    // (paid, owed) in cents
    let mut ledger: BTreeMap<Uuid, (i64, i64)> =
        members_sorted.iter().map(|id| (*id, (0, 0))).collect();

    for expense in expenses {
        let Some(payer) = payer_of(expense) else {
            continue;
        };
        let cents = to_cents(expense.amount);

        let participants: Vec<Uuid> = if expense.split_among.is_empty() {
            members_sorted.clone()
        } else {
            let set: BTreeSet<Uuid> = expense.split_among.iter().copied().collect();
            set.into_iter().collect()
        };
        let participants = if participants.is_empty() {
            vec![payer]
        } else {
            participants
        };

        ledger.entry(payer).or_insert((0, 0)).0 += cents;
        for (id, share) in split_cents(cents, &participants) {
            ledger.entry(id).or_insert((0, 0)).1 += share;
        }
    }
    ledger
}

/// Greedy settle-up: the largest debtor pays the largest creditor until all
/// balances are zero. Ties break on user id.
pub fn settle_up(balances: &BTreeMap<Uuid, (i64, i64)>) -> Vec<Transfer> {
    let mut debtors: Vec<(Uuid, i64)> = Vec::new();
    let mut creditors: Vec<(Uuid, i64)> = Vec::new();
    for (id, (paid, owed)) in balances {
        let net = paid - owed;
        if net < 0 {
            debtors.push((*id, -net));
        } else if net > 0 {
            creditors.push((*id, net));
        }
    }
    let by_amount = |a: &(Uuid, i64), b: &(Uuid, i64)| b.1.cmp(&a.1).then(a.0.cmp(&b.0));
    debtors.sort_by(by_amount);
    creditors.sort_by(by_amount);

    let mut transfers = Vec::new();
    let (mut d, mut c) = (0, 0);
    while d < debtors.len() && c < creditors.len() {
        let amount = debtors[d].1.min(creditors[c].1);
        if amount > 0 {
            transfers.push(Transfer {
                from: debtors[d].0,
                to: creditors[c].0,
                amount: from_cents(amount),
            });
        }
        debtors[d].1 -= amount;
        creditors[c].1 -= amount;
        if debtors[d].1 == 0 {
            d += 1;
        }
        if creditors[c].1 == 0 {
            c += 1;
        }
    }
    transfers
}

fn budget_status(budget: &Budget, spent: Decimal, by_category: &BTreeMap<String, Decimal>) -> BudgetStatus {
    let percent_used = if budget.total > Decimal::ZERO {
        (spent / budget.total * Decimal::ONE_HUNDRED)
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    } else {
        Decimal::ZERO
    };

    let categories = budget
        .category_limits()
        .into_iter()
        .map(|(category, limit)| {
            let spent = by_category.get(&category).copied().unwrap_or(Decimal::ZERO);
            CategoryStatus {
                remaining: limit - spent,
                category,
                limit,
                spent,
            }
        })
        .collect();

    BudgetStatus {
        total: budget.total,
        currency: budget.currency.clone(),
        spent,
        remaining: budget.total - spent,
        percent_used,
        categories,
    }
}

/// Summarise a trip's expenses. Amounts are summed as recorded; no currency conversion.
pub fn compute_summary(
    expenses: &[Expense],
    budget: Option<&Budget>,
    members: &[Uuid],
) -> ExpenseSummary {
    let total: Decimal = expenses.iter().map(|e| e.amount).sum();

    let mut by_category: BTreeMap<String, Decimal> = BTreeMap::new();
    let mut by_payer: BTreeMap<Uuid, Decimal> = BTreeMap::new();
    for expense in expenses {
        *by_category.entry(expense.category.clone()).or_default() += expense.amount;
        if let Some(payer) = payer_of(expense) {
            *by_payer.entry(payer).or_default() += expense.amount;
        }
    }

    let ledger = net_balances(expenses, members);
    let balances = ledger
        .iter()
        .map(|(id, (paid, owed))| MemberBalance {
            user_id: *id,
            paid: from_cents(*paid),
            owed: from_cents(*owed),
            net: from_cents(paid - owed),
        })
        .collect();
    let settlements = settle_up(&ledger);

    let currency = budget
        .map(|b| b.currency.clone())
        .or_else(|| expenses.first().map(|e| e.currency.clone()))
        .unwrap_or_else(|| "USD".to_string());

    ExpenseSummary {
        total,
        currency,
        count: expenses.len(),
        budget: budget.map(|b| budget_status(b, total, &by_category)),
        by_category,
        by_payer,
        balances,
        settlements,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use serde_json::json;

    fn expense(amount: Decimal, category: &str, paid_by: Uuid, split: Vec<Uuid>) -> Expense {
        let now = Utc::now().naive_utc();
        Expense {
            id: Uuid::new_v4(),
            trip_id: Uuid::nil(),
            description: "test".into(),
            amount,
            currency: "EUR".into(),
            category: category.into(),
            date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            paid_by: Some(paid_by),
            split_among: split,
            created_by: Some(paid_by),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    fn sorted_ids(n: usize) -> Vec<Uuid> {
        let mut ids: Vec<Uuid> = (0..n).map(|_| Uuid::new_v4()).collect();
        ids.sort();
        ids
    }

    #[test]
    fn remainder_cents_go_to_first_participants() {
        let ids = sorted_ids(3);
        let shares = split_cents(100, &ids);
        assert_eq!(shares.iter().map(|s| s.1).collect::<Vec<_>>(), vec![34, 33, 33]);
        assert_eq!(shares.iter().map(|s| s.1).sum::<i64>(), 100);
        assert!(split_cents(100, &[]).is_empty());
    }

    #[test]
    fn empty_split_means_every_member() {
        let ids = sorted_ids(2);
        let expenses = vec![expense(Decimal::new(5000, 2), "FOOD", ids[0], vec![])];
        let ledger = net_balances(&expenses, &ids);
        assert_eq!(ledger[&ids[0]], (5000, 2500));
        assert_eq!(ledger[&ids[1]], (0, 2500));
    }

    #[test]
    fn settle_up_pays_creditors_back() {
        let ids = sorted_ids(3);
        let (a, b, c) = (ids[0], ids[1], ids[2]);
        // a pays 90 for all three, b pays 30 for all three
        let expenses = vec![
            expense(Decimal::new(90, 0), "FOOD", a, vec![]),
            expense(Decimal::new(30, 0), "TRANSPORT", b, vec![]),
        ];
        let summary = compute_summary(&expenses, None, &ids);

        assert_eq!(summary.total, Decimal::new(120, 0));
        assert_eq!(summary.by_payer[&a], Decimal::new(90, 0));
        assert_eq!(
            summary.settlements,
            vec![
                Transfer { from: c, to: a, amount: Decimal::new(4000, 2) },
                Transfer { from: b, to: a, amount: Decimal::new(1000, 2) },
            ]
        );
        let net: Decimal = summary.balances.iter().map(|b| b.net).sum();
        assert_eq!(net, Decimal::ZERO);
    }

    #[test]
    fn settled_group_needs_no_transfers() {
        let ids = sorted_ids(2);
        let expenses = vec![
            expense(Decimal::new(20, 0), "FOOD", ids[0], vec![]),
            expense(Decimal::new(20, 0), "FOOD", ids[1], vec![]),
        ];
        assert!(compute_summary(&expenses, None, &ids).settlements.is_empty());
    }

    #[test]
    fn budget_status_tracks_categories() {
        let ids = sorted_ids(1);
        let budget = Budget {
            id: Uuid::new_v4(),
            trip_id: Uuid::nil(),
            total: Decimal::new(200, 0),
            currency: "EUR".into(),
            categories: json!({ "FOOD": "100" }),
            updated_at: Utc::now().naive_utc(),
        };
        let expenses = vec![
            expense(Decimal::new(75, 0), "FOOD", ids[0], vec![]),
            expense(Decimal::new(25, 0), "TRANSPORT", ids[0], vec![]),
        ];
        let status = compute_summary(&expenses, Some(&budget), &ids).budget.unwrap();

        assert_eq!(status.spent, Decimal::new(100, 0));
        assert_eq!(status.remaining, Decimal::new(100, 0));
        assert_eq!(status.percent_used, Decimal::new(50, 0));
        assert_eq!(status.categories[0].remaining, Decimal::new(25, 0));
    }

    #[test]
    fn zero_budget_reports_zero_percent() {
        let budget = Budget {
            id: Uuid::new_v4(),
            trip_id: Uuid::nil(),
            total: Decimal::ZERO,
            currency: "USD".into(),
            categories: json!({}),
            updated_at: Utc::now().naive_utc(),
        };
        let status = compute_summary(&[], Some(&budget), &[]).budget.unwrap();
        assert_eq!(status.percent_used, Decimal::ZERO);
        assert_eq!(status.remaining, Decimal::ZERO);
    }
}
