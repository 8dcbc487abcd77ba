//! Core data models for the ledger

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use std::cmp::Ordering;

use super::types::BalanceType;
use crate::error::{CoreError, CoreResult};

/// A named ledger bucket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    /// Opaque unique identifier
    pub id: String,
    /// Display name, unique without regard to case
    pub name: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// Case-insensitive name comparison
    pub fn has_name(&self, name: &str) -> bool {
        self.name.trim().to_lowercase() == name.trim().to_lowercase()
    }

    /// Alphabetical order used for the account list
    pub fn cmp_by_name(&self, other: &Account) -> Ordering {
        self.name
            .to_lowercase()
            .cmp(&other.name.to_lowercase())
            .then_with(|| self.name.cmp(&other.name))
    }
}

/// A debit or credit posted to one account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// Unique transaction identifier
    pub id: String,
    /// Account the transaction is posted to
    pub account_id: String,
    /// Transaction date
    pub date: NaiveDate,
    /// Free text description
    pub description: String,
    /// User-assigned reference, unique across all transactions
    pub slip_no: String,
    /// Debit amount
    pub debit: Decimal,
    /// Credit amount
    pub credit: Decimal,
    /// Linked account that mirrors this transaction
    #[serde(
        default,
        deserialize_with = "empty_string_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub code_account_id: Option<String>,
    /// Creation timestamp, only used to break ties
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// Check if transaction is posted to or mirrored into an account
    pub fn involves_account(&self, account_id: &str) -> bool {
        self.account_id == account_id || self.code_account_id.as_deref() == Some(account_id)
    }

    /// Debit minus credit, as seen from the posting account
    pub fn net_amount(&self) -> Decimal {
        self.debit - self.credit
    }

    /// Storage order: newest date first, most recently entered first on ties
    pub fn cmp_recent_first(&self, other: &Transaction) -> Ordering {
        other
            .date
            .cmp(&self.date)
            .then_with(|| other.created_at.cmp(&self.created_at))
    }

    /// Slip number normalised for comparison
    pub fn slip_key(&self) -> String {
        normalize_slip_no(&self.slip_no)
    }

    /// True when both sides are within [`MAX_AMOUNT`] in magnitude
    pub fn amounts_in_range(&self) -> bool {
        let max = max_amount();
        self.debit.abs() <= max && self.credit.abs() <= max
    }

    /// Get a summary string
    pub fn summary(&self) -> String {
        format!("{} - {} ({})", self.date, self.description, self.slip_no)
    }
}

/// Request to add a transaction; id and timestamp are assigned by the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTransaction {
    pub account_id: String,
    pub date: NaiveDate,
    pub description: String,
    pub slip_no: String,
    #[serde(default)]
    pub debit: Decimal,
    #[serde(default)]
    pub credit: Decimal,
    #[serde(
        default,
        deserialize_with = "empty_string_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub code_account_id: Option<String>,
}

impl NewTransaction {
    /// Build the stored record
    pub fn into_transaction(self, id: String, created_at: DateTime<Utc>) -> Transaction {
        Transaction {
            id,
            account_id: self.account_id,
            date: self.date,
            description: self.description.trim().to_string(),
            slip_no: self.slip_no.trim().to_string(),
            debit: self.debit,
            credit: self.credit,
            code_account_id: self.code_account_id,
            created_at,
        }
    }
}

/// A transaction as seen from one account's ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    pub id: String,
    /// The account whose ledger shows this entry
    pub account_id: String,
    pub date: NaiveDate,
    pub description: String,
    pub slip_no: String,
    pub debit: Decimal,
    pub credit: Decimal,
    /// The other account involved, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_account_id: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Shown here because this account is the transaction's code account
    pub is_mirror: bool,
    /// Account the transaction is actually posted to
    pub original_account_id: String,
    /// Name of the other account, empty if none
    pub display_code: String,
    /// Running balance after this entry, in chronological order
    pub balance: Decimal,
}

impl LedgerEntry {
    /// Identity of this projection within balance lookups
    pub fn key(&self) -> (String, bool) {
        (self.id.clone(), self.is_mirror)
    }

    /// Debit minus credit from the viewing account's side
    pub fn net_amount(&self) -> Decimal {
        self.debit - self.credit
    }
}

/// Complete persisted dataset
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppData {
    pub accounts: Vec<Account>,
    pub transactions: Vec<Transaction>,
}

impl AppData {
    /// Reject datasets holding amounts the engine would not accept
    pub fn check_amounts(&self) -> CoreResult<()> {
        match self.transactions.iter().find(|t| !t.amounts_in_range()) {
            Some(t) => Err(CoreError::InvalidFormat {
                message: format!("Transaction {} has an amount above {}", t.id, MAX_AMOUNT),
            }),
            None => Ok(()),
        }
    }
}

/// Outcome of a slip number uniqueness check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlipNoValidation {
    pub unique: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conflicting_account_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conflicting_transaction_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conflicting_transaction_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conflicting_transaction_slip_no: Option<String>,
}

impl SlipNoValidation {
    /// No conflict found
    pub fn unique() -> Self {
        Self {
            unique: true,
            conflicting_account_name: None,
            conflicting_transaction_date: None,
            conflicting_transaction_description: None,
            conflicting_transaction_slip_no: None,
        }
    }

    /// Conflict with an existing transaction
    pub fn conflict(account_name: String, transaction: &Transaction) -> Self {
        Self {
            unique: false,
            conflicting_account_name: Some(account_name),
            conflicting_transaction_date: Some(transaction.date),
            conflicting_transaction_description: Some(transaction.description.clone()),
            conflicting_transaction_slip_no: Some(transaction.slip_no.clone()),
        }
    }
}

/// Total-to-date balance of one account
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AccountBalance {
    /// Absolute balance
    pub balance: Decimal,
    #[serde(rename = "type")]
    pub balance_type: BalanceType,
}

impl AccountBalance {
    /// Classify a signed debit-minus-credit total
    pub fn from_net(net: Decimal) -> Self {
        if net > Decimal::ZERO {
            Self { balance: net, balance_type: BalanceType::Debit }
        } else if net < Decimal::ZERO {
            Self { balance: net.abs(), balance_type: BalanceType::Credit }
        } else {
            Self { balance: Decimal::ZERO, balance_type: BalanceType::Zero }
        }
    }
}

/// Largest debit or credit a single transaction may carry, in whole units.
///
/// Keeps every account total far below the `Decimal` range.
pub const MAX_AMOUNT: i64 = 1_000_000_000_000_000;

pub fn max_amount() -> Decimal {
    Decimal::from(MAX_AMOUNT)
}

/// Trim and lowercase a slip number for comparison
pub fn normalize_slip_no(slip_no: &str) -> String {
    slip_no.trim().to_lowercase()
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}
