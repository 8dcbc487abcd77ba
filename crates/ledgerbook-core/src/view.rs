//! Ledger view derivation
//!
//! An account's ledger is the union of the transactions posted to it and the
//! transactions that name it as their code account, the latter with debit and
//! credit swapped. Running balances always come from the full chronological
//! history; search and display order only decide which entries are shown and
//! where.

use rust_decimal::Decimal;
use std::cmp::Ordering;
use std::collections::HashMap;

use crate::models::{Account, LedgerEntry, Transaction};
use crate::types::{LedgerQuery, SortColumn, SortDirection};

/// Balance lookup keyed by transaction id and mirror flag
pub type BalanceMap = HashMap<(String, bool), Decimal>;

/// Project every transaction touching `account_id` into ledger entries.
///
/// Direct entries come first, then mirrored ones. Balances are left at zero.
pub fn project_entries(
    account_id: &str,
    accounts: &[Account],
    transactions: &[Transaction],
    unknown_label: &str,
) -> Vec<LedgerEntry> {
    let names: HashMap<&str, &str> = accounts
        .iter()
        .map(|a| (a.id.as_str(), a.name.as_str()))
        .collect();
    let name_of = |id: &str| -> String {
        names
            .get(id)
            .map(|n| n.to_string())
            .unwrap_or_else(|| unknown_label.to_string())
    };

    let direct = transactions
        .iter()
        .filter(|t| t.account_id == account_id)
        .map(|t| LedgerEntry {
            id: t.id.clone(),
            account_id: t.account_id.clone(),
            date: t.date,
            description: t.description.clone(),
            slip_no: t.slip_no.clone(),
            debit: t.debit,
            credit: t.credit,
            code_account_id: t.code_account_id.clone(),
            created_at: t.created_at,
            is_mirror: false,
            original_account_id: t.account_id.clone(),
            display_code: t.code_account_id.as_deref().map(&name_of).unwrap_or_default(),
            balance: Decimal::ZERO,
        });

    let mirrored = transactions
        .iter()
        .filter(|t| t.code_account_id.as_deref() == Some(account_id) && t.account_id != account_id)
        .map(|t| LedgerEntry {
            id: t.id.clone(),
            account_id: account_id.to_string(),
            date: t.date,
            description: t.description.clone(),
            slip_no: t.slip_no.clone(),
            debit: t.credit,
            credit: t.debit,
            code_account_id: Some(t.account_id.clone()),
            created_at: t.created_at,
            is_mirror: true,
            original_account_id: t.account_id.clone(),
            display_code: name_of(&t.account_id),
            balance: Decimal::ZERO,
        });

    direct.chain(mirrored).collect()
}

/// Running balance of each entry, accumulated in chronological order.
///
/// Entries are walked by date ascending, earliest `created_at` first on the
/// same date, starting from zero.
pub fn running_balances(entries: &[LedgerEntry]) -> BalanceMap {
    let mut chronological: Vec<&LedgerEntry> = entries.iter().collect();
    chronological.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.created_at.cmp(&b.created_at)));

    let mut balance = Decimal::ZERO;
    let mut balances = BalanceMap::with_capacity(chronological.len());
    for entry in chronological {
        balance += entry.net_amount();
        balances.insert(entry.key(), balance);
    }
    balances
}

/// Case-insensitive search over description, slip number, ISO date and code
pub fn matches_search(entry: &LedgerEntry, term: &str) -> bool {
    entry.description.to_lowercase().contains(term)
        || entry.slip_no.to_lowercase().contains(term)
        || entry.date.format("%Y-%m-%d").to_string().contains(term)
        || entry.display_code.to_lowercase().contains(term)
}

/// Display order for a column; ties go to the most recently entered row
pub fn compare_entries(
    a: &LedgerEntry,
    b: &LedgerEntry,
    column: SortColumn,
    direction: SortDirection,
) -> Ordering {
    let ordering = match column {
        SortColumn::Date => a.date.cmp(&b.date),
        SortColumn::Description => a.description.to_lowercase().cmp(&b.description.to_lowercase()),
        SortColumn::SlipNo => a.slip_no.to_lowercase().cmp(&b.slip_no.to_lowercase()),
        SortColumn::Debit => a.debit.cmp(&b.debit),
        SortColumn::Credit => a.credit.cmp(&b.credit),
        SortColumn::DisplayCode => a.display_code.to_lowercase().cmp(&b.display_code.to_lowercase()),
        SortColumn::Balance => return compare_by_balance(a, b, direction),
    };
    directed(ordering, direction).then_with(|| b.created_at.cmp(&a.created_at))
}

fn compare_by_balance(a: &LedgerEntry, b: &LedgerEntry, direction: SortDirection) -> Ordering {
    directed(
        a.balance.cmp(&b.balance).then_with(|| a.date.cmp(&b.date)),
        direction,
    )
}

fn directed(ordering: Ordering, direction: SortDirection) -> Ordering {
    match direction {
        SortDirection::Asc => ordering,
        SortDirection::Desc => ordering.reverse(),
    }
}

/// Build the finalized ledger view for one account
pub fn build_view(
    account_id: &str,
    accounts: &[Account],
    transactions: &[Transaction],
    query: &LedgerQuery,
    unknown_label: &str,
) -> Vec<LedgerEntry> {
    let all = project_entries(account_id, accounts, transactions, unknown_label);
    let balances = running_balances(&all);

    let mut entries: Vec<LedgerEntry> = match query.search_term() {
        Some(term) => all.into_iter().filter(|e| matches_search(e, &term)).collect(),
        None => all,
    };

    if query.sort != SortColumn::Balance {
        entries.sort_by(|a, b| compare_entries(a, b, query.sort, query.direction));
    }

    for entry in &mut entries {
        if let Some(balance) = balances.get(&entry.key()) {
            entry.balance = *balance;
        }
    }

    if query.sort == SortColumn::Balance {
        entries.sort_by(|a, b| compare_by_balance(a, b, query.direction));
    }

    entries
}

/// Debit-minus-credit total over an account's direct and mirrored entries
pub fn net_balance(account_id: &str, transactions: &[Transaction]) -> Decimal {
    transactions.iter().fold(Decimal::ZERO, |sum, t| {
        if t.account_id == account_id {
            sum + t.debit - t.credit
        } else if t.code_account_id.as_deref() == Some(account_id) {
            sum + t.credit - t.debit
        } else {
            sum
        }
    })
}
