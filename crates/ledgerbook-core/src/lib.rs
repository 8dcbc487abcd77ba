//! Core ledger engine and business logic
//!
//! [`Ledger`] owns the account and transaction collections. Callers submit
//! mutations through it and read snapshots or derived views back; every
//! successful mutation is saved through the configured [`Storage`] and
//! reported to the [`Notifier`].

pub mod error;
pub mod models;
pub mod notify;
pub mod report;
pub mod storage;
pub mod types;
pub mod view;

use chrono::{NaiveDate, Utc};
use ledgerbook_config::Config;
use rust_decimal::Decimal;
use serde::Serialize;

pub use error::{CoreError, CoreResult, ErrorCode, ErrorDetails, ErrorSeverity};
pub use models::{
    max_amount, normalize_slip_no, Account, AccountBalance, AppData, LedgerEntry, NewTransaction,
    SlipNoValidation, Transaction, MAX_AMOUNT,
};
pub use notify::{LogNotifier, Notice, NoticeLevel, Notifier, NotifierRef, NullNotifier, RecordingNotifier};
pub use report::{LedgerReport, ReportRow, REPORT_HEADERS};
pub use storage::{JsonFileStorage, MemoryStorage, Storage, StorageRef};
pub use types::{BalanceType, LedgerQuery, SortColumn, SortDirection};

/// Borrowed view of the persisted layout
#[derive(Serialize)]
struct AppDataRef<'a> {
    accounts: &'a [Account],
    transactions: &'a [Transaction],
}

/// Suggested file name for a backup taken on `date`
pub fn backup_file_name(date: NaiveDate) -> String {
    format!("ledger_local_backup_{}.json", date.format("%Y-%m-%d"))
}

/// The ledger engine
pub struct Ledger {
    config: Config,
    accounts: Vec<Account>,
    transactions: Vec<Transaction>,
    storage: StorageRef,
    notifier: NotifierRef,
    unsaved_changes: bool,
}

impl Ledger {
    /// Create an empty ledger without reading storage
    pub fn new(config: Config, storage: StorageRef, notifier: NotifierRef) -> Self {
        Self {
            config,
            accounts: Vec::new(),
            transactions: Vec::new(),
            storage,
            notifier,
            unsaved_changes: false,
        }
    }

    /// Empty ledger backed by memory, reporting nowhere
    pub fn in_memory(config: Config) -> Self {
        Self::new(config, Box::new(MemoryStorage::new()), Box::new(NullNotifier))
    }

    /// Load the stored dataset, failing if it cannot be read or parsed
    pub fn load(config: Config, storage: StorageRef, notifier: NotifierRef) -> CoreResult<Self> {
        let mut ledger = Self::new(config, storage, notifier);
        ledger.reload()?;
        Ok(ledger)
    }

    /// Load the stored dataset, starting empty if it is unreadable
    pub fn open(config: Config, storage: StorageRef, notifier: NotifierRef) -> Self {
        let mut ledger = Self::new(config, storage, notifier);
        if let Err(e) = ledger.reload() {
            log::error!("Failed to load stored ledger, starting empty: {}", e);
            ledger.notifier.notify(&Notice {
                level: NoticeLevel::Failure,
                title: "Error".to_string(),
                message: "Failed to load data. Storage might be corrupted.".to_string(),
            });
        }
        ledger
    }

    /// Replace in-memory state with the stored dataset
    pub fn reload(&mut self) -> CoreResult<()> {
        let data = match self.storage.load()? {
            Some(blob) => serde_json::from_str::<AppData>(&blob)?,
            None => AppData::default(),
        };
        data.check_amounts()?;
        log::debug!(
            "Loaded {} accounts and {} transactions",
            data.accounts.len(),
            data.transactions.len()
        );
        self.replace_data(data);
        self.unsaved_changes = false;
        Ok(())
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Accounts in alphabetical order
    pub fn accounts(&self) -> &[Account] {
        &self.accounts
    }

    /// Transactions, newest date first
    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    /// Owned copy of the full dataset
    pub fn snapshot(&self) -> AppData {
        AppData {
            accounts: self.accounts.clone(),
            transactions: self.transactions.clone(),
        }
    }

    /// True when the last save failed and memory is ahead of storage
    pub fn has_unsaved_changes(&self) -> bool {
        self.unsaved_changes
    }

    // ==================== Account Management ====================

    pub fn get_account_by_id(&self, id: &str) -> Option<&Account> {
        self.accounts.iter().find(|a| a.id == id)
    }

    /// Case-insensitive lookup
    pub fn get_account_by_name(&self, name: &str) -> Option<&Account> {
        self.accounts.iter().find(|a| a.has_name(name))
    }

    /// Create an account with a unique name
    pub fn add_account(&mut self, name: &str) -> CoreResult<Account> {
        let name = name.trim();
        if name.is_empty() {
            return self.fail(CoreError::validation("Account name is required"));
        }
        if self.get_account_by_name(name).is_some() {
            return self.fail(CoreError::DuplicateName { name: name.to_string() });
        }

        let account = Account {
            id: ledgerbook_utils::generate_id(),
            name: name.to_string(),
            created_at: Utc::now(),
        };
        self.accounts.push(account.clone());
        self.sort_accounts();
        self.commit(format!("Account \"{}\" created.", account.name));
        Ok(account)
    }

    /// Rename an account
    pub fn update_account(&mut self, id: &str, new_name: &str) -> CoreResult<Account> {
        let new_name = new_name.trim();
        let Some(index) = self.accounts.iter().position(|a| a.id == id) else {
            return self.fail(CoreError::AccountNotFound { id: id.to_string() });
        };
        if new_name.is_empty() {
            return self.fail(CoreError::validation("Account name is required"));
        }
        if self.get_account_by_name(new_name).map_or(false, |other| other.id != id) {
            return self.fail(CoreError::DuplicateName { name: new_name.to_string() });
        }

        self.accounts[index].name = new_name.to_string();
        let account = self.accounts[index].clone();
        self.sort_accounts();
        self.commit(format!("Account \"{}\" updated.", account.name));
        Ok(account)
    }

    /// Remove an account and every transaction posted to or linked with it.
    ///
    /// Returns the removed account and the number of transactions removed with it.
    pub fn delete_account(&mut self, id: &str) -> CoreResult<(Account, usize)> {
        let Some(index) = self.accounts.iter().position(|a| a.id == id) else {
            return self.fail(CoreError::AccountNotFound { id: id.to_string() });
        };

        let account = self.accounts.remove(index);
        let before = self.transactions.len();
        self.transactions.retain(|t| !t.involves_account(id));
        let removed = before - self.transactions.len();

        self.commit(format!("Account \"{}\" and its transactions deleted.", account.name));
        Ok((account, removed))
    }

    // ==================== Transaction Management ====================

    pub fn get_transaction_by_id(&self, id: &str) -> Option<&Transaction> {
        self.transactions.iter().find(|t| t.id == id)
    }

    /// Transactions posted to or mirrored into an account, newest first
    pub fn get_transactions_for_account(&self, account_id: &str) -> Vec<Transaction> {
        self.transactions
            .iter()
            .filter(|t| t.involves_account(account_id))
            .cloned()
            .collect()
    }

    /// Check a slip number against every transaction except `excluding_id`.
    ///
    /// Blank slip numbers are reported unique; adding or editing a transaction
    /// rejects them before this check runs.
    pub fn is_slip_no_unique(&self, slip_no: &str, excluding_id: Option<&str>) -> SlipNoValidation {
        let key = normalize_slip_no(slip_no);
        if key.is_empty() {
            return SlipNoValidation::unique();
        }

        let conflict = self
            .transactions
            .iter()
            .find(|t| Some(t.id.as_str()) != excluding_id && t.slip_key() == key);

        match conflict {
            Some(t) => {
                let account_name = self
                    .get_account_by_id(&t.account_id)
                    .map(|a| a.name.clone())
                    .unwrap_or_else(|| "an unknown account".to_string());
                SlipNoValidation::conflict(account_name, t)
            }
            None => SlipNoValidation::unique(),
        }
    }

    /// Record a new transaction
    pub fn add_transaction(&mut self, new: NewTransaction) -> CoreResult<Transaction> {
        if let Err(e) = self.validate_transaction(
            &new.account_id,
            &new.description,
            &new.slip_no,
            new.debit,
            new.credit,
            new.code_account_id.as_deref(),
            None,
        ) {
            return self.fail(e);
        }

        let transaction = new.into_transaction(ledgerbook_utils::generate_id(), Utc::now());
        self.transactions.push(transaction.clone());
        self.sort_transactions();
        self.commit("Transaction added.".to_string());
        Ok(transaction)
    }

    /// Replace a stored transaction; its id and creation time are kept
    pub fn update_transaction(&mut self, updated: Transaction) -> CoreResult<Transaction> {
        let Some(index) = self.transactions.iter().position(|t| t.id == updated.id) else {
            return self.fail(CoreError::TransactionNotFound { id: updated.id });
        };
        if let Err(e) = self.validate_transaction(
            &updated.account_id,
            &updated.description,
            &updated.slip_no,
            updated.debit,
            updated.credit,
            updated.code_account_id.as_deref(),
            Some(&updated.id),
        ) {
            return self.fail(e);
        }

        let transaction = Transaction {
            description: updated.description.trim().to_string(),
            slip_no: updated.slip_no.trim().to_string(),
            created_at: self.transactions[index].created_at,
            ..updated
        };
        self.transactions[index] = transaction.clone();
        self.sort_transactions();
        self.commit("Transaction updated.".to_string());
        Ok(transaction)
    }

    /// Remove one transaction. Removing an unknown id is a no-op returning `None`.
    pub fn delete_transaction(&mut self, id: &str) -> Option<Transaction> {
        let index = self.transactions.iter().position(|t| t.id == id);
        match index {
            Some(index) => {
                let removed = self.transactions.remove(index);
                self.commit("Transaction deleted.".to_string());
                Some(removed)
            }
            None => {
                log::debug!("Transaction {} already absent", id);
                None
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn validate_transaction(
        &self,
        account_id: &str,
        description: &str,
        slip_no: &str,
        debit: Decimal,
        credit: Decimal,
        code_account_id: Option<&str>,
        excluding_id: Option<&str>,
    ) -> CoreResult<()> {
        if description.trim().is_empty() {
            return Err(CoreError::validation("Description is required"));
        }
        if slip_no.trim().is_empty() {
            return Err(CoreError::validation("Slip No. is required"));
        }
        if debit < Decimal::ZERO || credit < Decimal::ZERO {
            return Err(CoreError::validation("Amounts must not be negative"));
        }
        if (debit > Decimal::ZERO) == (credit > Decimal::ZERO) {
            return Err(CoreError::validation("Enter either a debit or a credit amount"));
        }
        if debit > max_amount() || credit > max_amount() {
            return Err(CoreError::validation(format!("Amounts must not exceed {}", MAX_AMOUNT)));
        }
        if self.get_account_by_id(account_id).is_none() {
            return Err(CoreError::AccountNotFound { id: account_id.to_string() });
        }
        if let Some(code) = code_account_id {
            if code == account_id {
                return Err(CoreError::validation("Code account must differ from the transaction's account"));
            }
            if self.get_account_by_id(code).is_none() {
                return Err(CoreError::AccountNotFound { id: code.to_string() });
            }
        }

        let check = self.is_slip_no_unique(slip_no, excluding_id);
        if !check.unique {
            return Err(CoreError::DuplicateSlip {
                slip_no: slip_no.trim().to_string(),
                account_name: check.conflicting_account_name.unwrap_or_default(),
                date: check.conflicting_transaction_date,
                description: check.conflicting_transaction_description,
            });
        }
        Ok(())
    }

    // ==================== Ledger Views ====================

    /// Query built from the configured default sort
    pub fn default_query(&self) -> LedgerQuery {
        LedgerQuery::sorted(self.config.ledger.default_sort, self.config.ledger.default_direction)
    }

    /// Direct and mirrored entries of one account with running balances
    pub fn ledger_view(&self, account_id: &str, query: &LedgerQuery) -> CoreResult<Vec<LedgerEntry>> {
        if self.get_account_by_id(account_id).is_none() {
            return Err(CoreError::AccountNotFound { id: account_id.to_string() });
        }
        let entries = view::build_view(
            account_id,
            &self.accounts,
            &self.transactions,
            query,
            &self.config.ledger.unknown_account_label,
        );
        log::debug!(
            "Ledger view for {}: {} entries (sort {} {})",
            account_id,
            entries.len(),
            query.sort,
            query.direction
        );
        Ok(entries)
    }

    /// Total-to-date balance and its sign
    pub fn calculate_account_balance(&self, account_id: &str) -> AccountBalance {
        AccountBalance::from_net(view::net_balance(account_id, &self.transactions))
    }

    /// Report of an account's ledger view, in the view's order.
    ///
    /// Without an explicit `line_limit` the configured default applies.
    pub fn export_report(
        &self,
        account_id: &str,
        query: &LedgerQuery,
        line_limit: Option<usize>,
        generated_on: NaiveDate,
    ) -> CoreResult<LedgerReport> {
        let entries = self.ledger_view(account_id, query)?;
        let account_name = self
            .get_account_by_id(account_id)
            .map(|a| a.name.clone())
            .unwrap_or_default();
        LedgerReport::build(
            &account_name,
            &entries,
            line_limit.or(self.config.report.default_line_limit),
            &self.config,
            generated_on,
        )
    }

    // ==================== Backup & Restore ====================

    /// Complete, lossless snapshot as pretty-printed JSON
    pub fn backup_data(&self) -> CoreResult<String> {
        let json = serde_json::to_string_pretty(&self.data_ref())?;
        log::info!(
            "Backup created: {} accounts, {} transactions",
            self.accounts.len(),
            self.transactions.len()
        );
        Ok(json)
    }

    /// Replace all accounts and transactions with a backup
    pub fn restore_data(&mut self, json: &str) -> CoreResult<()> {
        let value: serde_json::Value = match serde_json::from_str(json) {
            Ok(value) => value,
            Err(e) => {
                return self.fail(CoreError::InvalidFormat {
                    message: format!("Data restore failed. Invalid JSON: {}", e),
                })
            }
        };

        let has_array = |key: &str| value.get(key).map_or(false, serde_json::Value::is_array);
        if !has_array("accounts") || !has_array("transactions") {
            return self.fail(CoreError::InvalidFormat {
                message: "Invalid backup file format: expected `accounts` and `transactions` arrays".to_string(),
            });
        }

        let data: AppData = match serde_json::from_value(value) {
            Ok(data) => data,
            Err(e) => {
                return self.fail(CoreError::InvalidFormat {
                    message: format!("Invalid backup record: {}", e),
                })
            }
        };

        if let Err(e) = data.check_amounts() {
            return self.fail(e);
        }

        self.replace_data(data);
        self.commit("Data restored successfully.".to_string());
        Ok(())
    }

    // ==================== Persistence ====================

    /// Save the current dataset; failures are reported and remembered
    pub fn persist(&mut self) -> CoreResult<()> {
        let result = serde_json::to_string(&self.data_ref())
            .map_err(CoreError::from)
            .and_then(|blob| self.storage.save(&blob));

        match result {
            Ok(()) => {
                self.unsaved_changes = false;
                Ok(())
            }
            Err(e) => {
                self.unsaved_changes = true;
                let e = match e {
                    CoreError::Storage { .. } => e,
                    other => CoreError::Storage { message: other.to_string() },
                };
                self.notifier.failure(&e);
                Err(e)
            }
        }
    }

    fn data_ref(&self) -> AppDataRef<'_> {
        AppDataRef {
            accounts: &self.accounts,
            transactions: &self.transactions,
        }
    }

    fn replace_data(&mut self, data: AppData) {
        self.accounts = data.accounts;
        self.transactions = data.transactions;
        self.sort_accounts();
        self.sort_transactions();
    }

    fn sort_accounts(&mut self) {
        self.accounts.sort_by(Account::cmp_by_name);
    }

    fn sort_transactions(&mut self) {
        self.transactions.sort_by(Transaction::cmp_recent_first);
    }

    /// Save and announce a successful mutation. A failed save does not undo it.
    fn commit(&mut self, message: String) {
        log::info!("{}", message);
        // persist() already reported the failure
        let _ = self.persist();
        self.notifier.success(&message);
    }

    fn fail<T>(&self, error: CoreError) -> CoreResult<T> {
        log::debug!("Rejected: [{}] {}", error.code(), error);
        self.notifier.failure(&error);
        Err(error)
    }
}

// ==================== Tests ====================

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    fn ledger() -> Ledger {
        Ledger::in_memory(Config::default())
    }

    fn shared_ledger() -> (Ledger, Rc<MemoryStorage>, Rc<RecordingNotifier>) {
        let storage = Rc::new(MemoryStorage::new());
        let notifier = Rc::new(RecordingNotifier::new());
        let ledger = Ledger::new(Config::default(), Box::new(storage.clone()), Box::new(notifier.clone()));
        (ledger, storage, notifier)
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 4, day).unwrap()
    }

    fn debit(account_id: &str, day: u32, slip: &str, amount: i64) -> NewTransaction {
        NewTransaction {
            account_id: account_id.to_string(),
            date: date(day),
            description: format!("Debit {}", slip),
            slip_no: slip.to_string(),
            debit: Decimal::from(amount),
            credit: Decimal::ZERO,
            code_account_id: None,
        }
    }

    fn credit(account_id: &str, day: u32, slip: &str, amount: i64) -> NewTransaction {
        NewTransaction {
            credit: Decimal::from(amount),
            debit: Decimal::ZERO,
            description: format!("Credit {}", slip),
            ..debit(account_id, day, slip, 0)
        }
    }

    #[test]
    fn test_add_account_rejects_duplicate_names_in_any_case() {
        let mut ledger = ledger();
        ledger.add_account("Petty Cash").unwrap();
        let err = ledger.add_account("  petty CASH ").unwrap_err();
        assert!(matches!(err, CoreError::DuplicateName { .. }));
        assert_eq!(ledger.accounts().len(), 1);
    }

    #[test]
    fn test_accounts_sorted_by_name() {
        let mut ledger = ledger();
        ledger.add_account("Sales").unwrap();
        ledger.add_account("bank").unwrap();
        ledger.add_account("Cash").unwrap();
        let names: Vec<&str> = ledger.accounts().iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["bank", "Cash", "Sales"]);
    }

    #[test]
    fn test_add_account_requires_name() {
        let mut ledger = ledger();
        assert!(matches!(ledger.add_account("   "), Err(CoreError::ValidationError { .. })));
    }

    #[test]
    fn test_update_account() {
        let mut ledger = ledger();
        let cash = ledger.add_account("Cash").unwrap();
        ledger.add_account("Bank").unwrap();

        let err = ledger.update_account(&cash.id, "BANK").unwrap_err();
        assert!(matches!(err, CoreError::DuplicateName { .. }));

        let renamed = ledger.update_account(&cash.id, "CASH").unwrap();
        assert_eq!(renamed.name, "CASH");
        assert_eq!(renamed.id, cash.id);
        assert_eq!(renamed.created_at, cash.created_at);

        let err = ledger.update_account("missing", "Other").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_get_account_lookups() {
        let mut ledger = ledger();
        let cash = ledger.add_account("Cash").unwrap();
        assert_eq!(ledger.get_account_by_id(&cash.id), Some(&cash));
        assert_eq!(ledger.get_account_by_name("cash").map(|a| a.id.clone()), Some(cash.id));
        assert!(ledger.get_account_by_id("nope").is_none());
        assert!(ledger.get_account_by_name("nope").is_none());
    }

    #[test]
    fn test_delete_account_cascades_to_linked_transactions() {
        let mut ledger = ledger();
        let a = ledger.add_account("A").unwrap();
        let b = ledger.add_account("B").unwrap();
        let c = ledger.add_account("C").unwrap();

        ledger.add_transaction(debit(&a.id, 1, "1", 10)).unwrap();
        let mut linked = debit(&b.id, 2, "2", 20);
        linked.code_account_id = Some(a.id.clone());
        ledger.add_transaction(linked).unwrap();
        let keep = ledger.add_transaction(debit(&b.id, 3, "3", 30)).unwrap();
        let mut other_link = credit(&c.id, 4, "4", 40);
        other_link.code_account_id = Some(b.id.clone());
        let keep_linked = ledger.add_transaction(other_link).unwrap();

        let (removed, count) = ledger.delete_account(&a.id).unwrap();
        assert_eq!(removed.id, a.id);
        assert_eq!(count, 2);
        let ids: Vec<&str> = ledger.transactions().iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec![keep_linked.id.as_str(), keep.id.as_str()]);

        assert!(ledger.delete_account(&a.id).unwrap_err().is_not_found());
    }

    #[test]
    fn test_mirrored_transaction_views() {
        let mut ledger = ledger();
        let x = ledger.add_account("X").unwrap();
        let y = ledger.add_account("Y").unwrap();
        let mut new = debit(&x.id, 1, "M1", 100);
        new.code_account_id = Some(y.id.clone());
        ledger.add_transaction(new).unwrap();

        let x_view = ledger.ledger_view(&x.id, &LedgerQuery::default()).unwrap();
        assert_eq!(x_view.len(), 1);
        assert_eq!(x_view[0].debit, Decimal::from(100));
        assert!(!x_view[0].is_mirror);

        let y_view = ledger.ledger_view(&y.id, &LedgerQuery::default()).unwrap();
        assert_eq!(y_view.len(), 1);
        assert_eq!(y_view[0].credit, Decimal::from(100));
        assert_eq!(y_view[0].debit, Decimal::ZERO);
        assert!(y_view[0].is_mirror);
        assert_eq!(y_view[0].display_code, "X");

        assert_eq!(ledger.get_transactions_for_account(&y.id).len(), 1);
    }

    #[test]
    fn test_ledger_view_unknown_account() {
        let ledger = ledger();
        assert!(ledger.ledger_view("nope", &LedgerQuery::default()).unwrap_err().is_not_found());
    }

    #[test]
    fn test_balance_survives_resorting() {
        let mut ledger = ledger();
        let x = ledger.add_account("X").unwrap();
        let mut first = debit(&x.id, 1, "1", 50);
        first.description = "Charlie".to_string();
        let mut second = credit(&x.id, 2, "2", 30);
        second.description = "Bravo".to_string();
        let mut third = debit(&x.id, 3, "3", 20);
        third.description = "Alpha".to_string();
        for tx in [first, second, third] {
            ledger.add_transaction(tx).unwrap();
        }

        let view = ledger
            .ledger_view(&x.id, &LedgerQuery::sorted(SortColumn::Description, SortDirection::Asc))
            .unwrap();
        let rows: Vec<(&str, Decimal)> = view.iter().map(|e| (e.description.as_str(), e.balance)).collect();
        assert_eq!(
            rows,
            vec![
                ("Alpha", Decimal::from(40)),
                ("Bravo", Decimal::from(20)),
                ("Charlie", Decimal::from(50)),
            ]
        );
    }

    #[test]
    fn test_slip_numbers_are_globally_unique_without_case() {
        let mut ledger = ledger();
        let x = ledger.add_account("X").unwrap();
        let y = ledger.add_account("Y").unwrap();
        ledger.add_transaction(debit(&x.id, 1, "A1", 10)).unwrap();

        let err = ledger.add_transaction(debit(&y.id, 2, " a1 ", 10)).unwrap_err();
        match err {
            CoreError::DuplicateSlip { account_name, date: conflict_date, description, .. } => {
                assert_eq!(account_name, "X");
                assert_eq!(conflict_date, Some(date(1)));
                assert_eq!(description.as_deref(), Some("Debit A1"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(ledger.transactions().len(), 1);
    }

    #[test]
    fn test_is_slip_no_unique() {
        let mut ledger = ledger();
        let x = ledger.add_account("X").unwrap();
        let tx = ledger.add_transaction(debit(&x.id, 1, "B7", 10)).unwrap();

        assert!(!ledger.is_slip_no_unique("b7", None).unique);
        assert!(ledger.is_slip_no_unique("b7", Some(&tx.id)).unique);
        assert!(ledger.is_slip_no_unique("B8", None).unique);
        assert!(ledger.is_slip_no_unique("   ", None).unique);

        let conflict = ledger.is_slip_no_unique("B7", None);
        assert_eq!(conflict.conflicting_account_name.as_deref(), Some("X"));
        assert_eq!(conflict.conflicting_transaction_slip_no.as_deref(), Some("B7"));
    }

    #[test]
    fn test_edit_keeps_own_slip_number() {
        let mut ledger = ledger();
        let x = ledger.add_account("X").unwrap();
        let tx = ledger.add_transaction(debit(&x.id, 1, "S-1", 10)).unwrap();

        let edited = Transaction {
            description: "Corrected".to_string(),
            slip_no: "s-1".to_string(),
            ..tx.clone()
        };
        let saved = ledger.update_transaction(edited).unwrap();
        assert_eq!(saved.description, "Corrected");
        assert_eq!(saved.created_at, tx.created_at);
        assert_eq!(ledger.get_transaction_by_id(&tx.id).unwrap().slip_no, "s-1");
    }

    #[test]
    fn test_edit_rejects_slip_of_another_transaction() {
        let mut ledger = ledger();
        let x = ledger.add_account("X").unwrap();
        ledger.add_transaction(debit(&x.id, 1, "S-1", 10)).unwrap();
        let second = ledger.add_transaction(debit(&x.id, 2, "S-2", 10)).unwrap();

        let edited = Transaction { slip_no: "S-1".to_string(), ..second.clone() };
        assert!(matches!(ledger.update_transaction(edited), Err(CoreError::DuplicateSlip { .. })));
        assert_eq!(ledger.get_transaction_by_id(&second.id), Some(&second));
    }

    #[test]
    fn test_update_unknown_transaction() {
        let mut ledger = ledger();
        let x = ledger.add_account("X").unwrap();
        let tx = ledger.add_transaction(debit(&x.id, 1, "S-1", 10)).unwrap();
        let ghost = Transaction { id: "ghost".to_string(), slip_no: "S-9".to_string(), ..tx };
        assert!(matches!(
            ledger.update_transaction(ghost),
            Err(CoreError::TransactionNotFound { .. })
        ));
    }

    #[test]
    fn test_transaction_validation() {
        let mut ledger = ledger();
        let x = ledger.add_account("X").unwrap();

        let mut both = debit(&x.id, 1, "1", 10);
        both.credit = Decimal::from(5);
        assert!(matches!(ledger.add_transaction(both), Err(CoreError::ValidationError { .. })));

        let neither = debit(&x.id, 1, "1", 0);
        assert!(matches!(ledger.add_transaction(neither), Err(CoreError::ValidationError { .. })));

        let mut negative = debit(&x.id, 1, "1", 10);
        negative.credit = Decimal::from(-5);
        assert!(matches!(ledger.add_transaction(negative), Err(CoreError::ValidationError { .. })));

        let mut blank = debit(&x.id, 1, "1", 10);
        blank.description = "  ".to_string();
        assert!(matches!(ledger.add_transaction(blank), Err(CoreError::ValidationError { .. })));

        let no_slip = debit(&x.id, 1, " ", 10);
        assert!(matches!(ledger.add_transaction(no_slip), Err(CoreError::ValidationError { .. })));

        let mut self_linked = debit(&x.id, 1, "1", 10);
        self_linked.code_account_id = Some(x.id.clone());
        assert!(matches!(ledger.add_transaction(self_linked), Err(CoreError::ValidationError { .. })));

        let mut dangling = debit(&x.id, 1, "1", 10);
        dangling.code_account_id = Some("gone".to_string());
        assert!(ledger.add_transaction(dangling).unwrap_err().is_not_found());

        assert!(ledger.add_transaction(debit("gone", 1, "1", 10)).unwrap_err().is_not_found());
        assert!(ledger.transactions().is_empty());
    }

    #[test]
    fn test_transactions_sorted_newest_first() {
        let mut ledger = ledger();
        let x = ledger.add_account("X").unwrap();
        ledger.add_transaction(debit(&x.id, 2, "b", 1)).unwrap();
        ledger.add_transaction(debit(&x.id, 9, "c", 1)).unwrap();
        ledger.add_transaction(debit(&x.id, 1, "a", 1)).unwrap();
        let days: Vec<NaiveDate> = ledger.transactions().iter().map(|t| t.date).collect();
        assert_eq!(days, vec![date(9), date(2), date(1)]);
    }

    #[test]
    fn test_delete_transaction_is_idempotent() {
        let mut ledger = ledger();
        let x = ledger.add_account("X").unwrap();
        let tx = ledger.add_transaction(debit(&x.id, 1, "1", 10)).unwrap();

        assert_eq!(ledger.delete_transaction(&tx.id), Some(tx.clone()));
        assert_eq!(ledger.delete_transaction(&tx.id), None);
        assert!(ledger.transactions().is_empty());
    }

    #[test]
    fn test_delete_transaction_does_not_cascade() {
        let mut ledger = ledger();
        let x = ledger.add_account("X").unwrap();
        let y = ledger.add_account("Y").unwrap();
        let mut linked = debit(&x.id, 1, "1", 10);
        linked.code_account_id = Some(y.id.clone());
        let linked = ledger.add_transaction(linked).unwrap();
        let other = ledger.add_transaction(debit(&y.id, 2, "2", 10)).unwrap();

        ledger.delete_transaction(&linked.id);
        assert_eq!(ledger.transactions(), &[other][..]);
        assert_eq!(ledger.accounts().len(), 2);
    }

    #[test]
    fn test_calculate_account_balance() {
        let mut ledger = ledger();
        let x = ledger.add_account("X").unwrap();
        let y = ledger.add_account("Y").unwrap();

        ledger.add_transaction(debit(&x.id, 1, "1", 80)).unwrap();
        let mut transfer = debit(&x.id, 2, "2", 20);
        transfer.code_account_id = Some(y.id.clone());
        ledger.add_transaction(transfer).unwrap();

        let x_balance = ledger.calculate_account_balance(&x.id);
        assert_eq!(x_balance.balance_type, BalanceType::Debit);
        assert_eq!(x_balance.balance, Decimal::from(100));

        let y_balance = ledger.calculate_account_balance(&y.id);
        assert_eq!(y_balance.balance_type, BalanceType::Credit);
        assert_eq!(y_balance.balance, Decimal::from(20));
    }

    #[test]
    fn test_balanced_account_is_zero() {
        let mut ledger = ledger();
        let x = ledger.add_account("X").unwrap();
        ledger.add_transaction(debit(&x.id, 1, "1", 75)).unwrap();
        ledger.add_transaction(credit(&x.id, 2, "2", 75)).unwrap();

        let balance = ledger.calculate_account_balance(&x.id);
        assert_eq!(balance.balance_type, BalanceType::Zero);
        assert_eq!(balance.balance, Decimal::ZERO);
    }

    #[test]
    fn test_backup_restore_round_trip() {
        let mut ledger = ledger();
        let x = ledger.add_account("X").unwrap();
        let y = ledger.add_account("Y").unwrap();
        let mut linked = debit(&x.id, 1, "1", 10);
        linked.code_account_id = Some(y.id.clone());
        ledger.add_transaction(linked).unwrap();
        let mut fractional = credit(&y.id, 2, "2", 0);
        fractional.credit = Decimal::new(1999, 2);
        ledger.add_transaction(fractional).unwrap();

        let before = ledger.snapshot();
        let backup = ledger.backup_data().unwrap();

        let mut restored = self::ledger();
        restored.add_account("Will be replaced").unwrap();
        restored.restore_data(&backup).unwrap();
        assert_eq!(restored.snapshot(), before);
    }

    #[test]
    fn test_restore_rejects_missing_transactions() {
        let mut ledger = ledger();
        let x = ledger.add_account("X").unwrap();
        ledger.add_transaction(debit(&x.id, 1, "1", 10)).unwrap();
        let before = ledger.snapshot();

        let err = ledger.restore_data(r#"{"accounts": []}"#).unwrap_err();
        assert!(matches!(err, CoreError::InvalidFormat { .. }));
        let err = ledger.restore_data(r#"{"accounts": [], "transactions": {}}"#).unwrap_err();
        assert!(matches!(err, CoreError::InvalidFormat { .. }));
        let err = ledger.restore_data("not json").unwrap_err();
        assert!(matches!(err, CoreError::InvalidFormat { .. }));
        let err = ledger
            .restore_data(r#"{"accounts": [{"id": 1}], "transactions": []}"#)
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidFormat { .. }));

        assert_eq!(ledger.snapshot(), before);
    }

    #[test]
    fn test_restore_sorts_and_accepts_numeric_amounts() {
        let mut ledger = ledger();
        let json = r#"{
            "accounts": [
                {"id": "2", "name": "Sales", "createdAt": "2024-01-01T00:00:00.000Z"},
                {"id": "1", "name": "Cash", "createdAt": "2024-01-01T00:00:00.000Z"}
            ],
            "transactions": [
                {"id": "a", "accountId": "1", "date": "2024-01-02", "description": "Old",
                 "slipNo": "1", "debit": 10, "credit": 0, "createdAt": "2024-01-02T00:00:00.000Z"},
                {"id": "b", "accountId": "1", "date": "2024-02-02", "description": "New",
                 "slipNo": "2", "debit": 0, "credit": 2.5, "codeAccountId": "2",
                 "createdAt": "2024-02-02T00:00:00.000Z"}
            ]
        }"#;
        ledger.restore_data(json).unwrap();

        assert_eq!(ledger.accounts()[0].name, "Cash");
        assert_eq!(ledger.transactions()[0].id, "b");
        assert_eq!(ledger.transactions()[0].credit, Decimal::new(25, 1));
        assert_eq!(ledger.calculate_account_balance("2").balance, Decimal::new(25, 1));
    }

    #[test]
    fn test_mutations_are_persisted_and_reported() {
        let (mut ledger, storage, notifier) = shared_ledger();
        let cash = ledger.add_account("Cash").unwrap();
        assert!(storage.blob().unwrap().contains(&cash.id));
        assert_eq!(notifier.last(), Some(Notice::success("Account \"Cash\" created.")));

        let err = ledger.add_account("cash").unwrap_err();
        assert!(matches!(err, CoreError::DuplicateName { .. }));
        assert!(notifier.last().unwrap().is_failure());
    }

    #[test]
    fn test_save_failure_keeps_memory_state() {
        let (mut ledger, storage, notifier) = shared_ledger();
        ledger.add_account("Cash").unwrap();
        storage.set_fail_saves(true);

        let bank = ledger.add_account("Bank").unwrap();
        assert!(ledger.get_account_by_id(&bank.id).is_some());
        assert!(ledger.has_unsaved_changes());
        assert!(!storage.blob().unwrap().contains(&bank.id));
        assert!(notifier
            .notices()
            .iter()
            .any(|n| n.is_failure() && n.message.contains("Storage error")));

        storage.set_fail_saves(false);
        ledger.persist().unwrap();
        assert!(!ledger.has_unsaved_changes());
        assert!(storage.blob().unwrap().contains(&bank.id));
    }

    #[test]
    fn test_load_reads_stored_data() {
        let storage = Rc::new(MemoryStorage::new());
        {
            let mut ledger = Ledger::new(Config::default(), Box::new(storage.clone()), Box::new(NullNotifier));
            let x = ledger.add_account("X").unwrap();
            ledger.add_transaction(debit(&x.id, 1, "1", 10)).unwrap();
        }
        let ledger = Ledger::load(Config::default(), Box::new(storage), Box::new(NullNotifier)).unwrap();
        assert_eq!(ledger.accounts().len(), 1);
        assert_eq!(ledger.transactions().len(), 1);
    }

    #[test]
    fn test_open_corrupt_storage_starts_empty() {
        let storage = MemoryStorage::with_blob("{broken");
        let notifier = Rc::new(RecordingNotifier::new());
        let ledger = Ledger::open(Config::default(), Box::new(storage), Box::new(notifier.clone()));
        assert!(ledger.accounts().is_empty());
        assert!(notifier.last().unwrap().message.contains("corrupted"));

        let strict = Ledger::load(
            Config::default(),
            Box::new(MemoryStorage::with_blob("{broken")),
            Box::new(NullNotifier),
        );
        assert!(matches!(strict, Err(CoreError::InvalidFormat { .. })));
    }

    #[test]
    fn test_export_report() {
        let mut ledger = ledger();
        let x = ledger.add_account("Petty Cash").unwrap();
        ledger.add_transaction(debit(&x.id, 1, "1", 50)).unwrap();
        ledger.add_transaction(credit(&x.id, 2, "2", 30)).unwrap();

        let report = ledger
            .export_report(&x.id, &ledger.default_query(), Some(1), date(30))
            .unwrap();
        assert_eq!(report.rows.len(), 1);
        assert_eq!(report.rows[0].slip_no, "2");
        assert_eq!(report.rows[0].balance, "20.00");
        assert_eq!(report.file_name(), "Petty_Cash_Ledger_2024-04-30_first_1_lines.txt");
    }

    #[test]
    fn test_backup_file_name() {
        assert_eq!(backup_file_name(date(7)), "ledger_local_backup_2024-04-07.json");
    }

    #[test]
    fn test_amounts_near_decimal_max_are_rejected() {
        let mut ledger = ledger();
        let x = ledger.add_account("X").unwrap();
        let huge: Decimal = "50000000000000000000000000000".parse().unwrap();

        for slip in ["H1", "H2"] {
            let mut tx = debit(&x.id, 1, slip, 0);
            tx.debit = huge;
            let err = ledger.add_transaction(tx).unwrap_err();
            assert!(matches!(err, CoreError::ValidationError { .. }));
        }

        let mut at_limit = debit(&x.id, 2, "L1", 0);
        at_limit.debit = max_amount();
        ledger.add_transaction(at_limit).unwrap();
        let mut again = debit(&x.id, 3, "L2", 0);
        again.debit = max_amount();
        ledger.add_transaction(again).unwrap();

        let balance = ledger.calculate_account_balance(&x.id);
        assert_eq!(balance.balance, max_amount() * Decimal::from(2));
        assert_eq!(ledger.ledger_view(&x.id, &LedgerQuery::default()).unwrap().len(), 2);
    }

    #[test]
    fn test_edit_rejects_oversized_amount() {
        let mut ledger = ledger();
        let x = ledger.add_account("X").unwrap();
        let tx = ledger.add_transaction(debit(&x.id, 1, "1", 10)).unwrap();

        let edited = Transaction { debit: max_amount() + Decimal::ONE, ..tx.clone() };
        assert!(matches!(ledger.update_transaction(edited), Err(CoreError::ValidationError { .. })));
        assert_eq!(ledger.get_transaction_by_id(&tx.id), Some(&tx));
    }

    #[test]
    fn test_restore_and_load_reject_oversized_amounts() {
        let json = r#"{
            "accounts": [{"id": "1", "name": "Cash", "createdAt": "2024-01-01T00:00:00Z"}],
            "transactions": [
                {"id": "a", "accountId": "1", "date": "2024-01-02", "description": "Big",
                 "slipNo": "1", "debit": "50000000000000000000000000000", "credit": "0",
                 "createdAt": "2024-01-02T00:00:00Z"},
                {"id": "b", "accountId": "1", "date": "2024-01-03", "description": "Bigger",
                 "slipNo": "2", "debit": "50000000000000000000000000000", "credit": "0",
                 "createdAt": "2024-01-03T00:00:00Z"}
            ]
        }"#;

        let mut ledger = ledger();
        ledger.add_account("Kept").unwrap();
        let before = ledger.snapshot();
        let err = ledger.restore_data(json).unwrap_err();
        assert!(matches!(err, CoreError::InvalidFormat { .. }));
        assert_eq!(ledger.snapshot(), before);

        let stored = Ledger::load(
            Config::default(),
            Box::new(MemoryStorage::with_blob(json)),
            Box::new(NullNotifier),
        );
        assert!(matches!(stored, Err(CoreError::InvalidFormat { .. })));
    }

    #[test]
    fn test_save_failure_reported_once() {
        let (mut ledger, storage, notifier) = shared_ledger();
        storage.set_fail_saves(true);
        ledger.add_account("Cash").unwrap();

        let failures = notifier.notices().iter().filter(|n| n.is_failure()).count();
        assert_eq!(failures, 1);
    }
}

