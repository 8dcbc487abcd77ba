//! Ledgerbook main entry point

use anyhow::{anyhow, bail, Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use ledgerbook_config::Config;
use ledgerbook_core::{
    backup_file_name, JsonFileStorage, Ledger, LedgerEntry, LedgerQuery, LogNotifier, NewTransaction,
    SortColumn, SortDirection, Transaction,
};
use ledgerbook_utils::format_amount;
use rust_decimal::Decimal;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "ledgerbook")]
#[command(author = "Ledgerbook Contributors")]
#[command(version = "0.1.0")]
#[command(about = "A local-first personal ledger with mirrored double entries", long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "ledgerbook.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Manage accounts
    #[command(subcommand)]
    Account(AccountCommand),
    /// Manage transactions
    #[command(subcommand)]
    Tx(TxCommand),
    /// Show the ledger of an account
    Ledger {
        account: String,
        #[command(flatten)]
        view: ViewArgs,
    },
    /// Show the total-to-date balance of an account
    Balance { account: String },
    /// Write a JSON backup of all data
    Backup {
        /// Output file, defaults to a dated file in the current directory
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Replace all data with a JSON backup
    Restore { file: PathBuf },
    /// Export a text report of an account's ledger
    Report {
        account: String,
        /// Keep only the first N rows
        #[arg(short, long)]
        limit: Option<usize>,
        /// Output file or directory; prints to stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[command(flatten)]
        view: ViewArgs,
    },
    /// Write the default configuration file
    InitConfig {
        #[arg(long)]
        force: bool,
    },
}

#[derive(Subcommand, Debug)]
enum AccountCommand {
    /// List accounts with their balances
    List,
    Add { name: String },
    Rename { name: String, new_name: String },
    /// Delete an account and every transaction linked to it
    Delete { name: String },
}

#[derive(Subcommand, Debug)]
enum TxCommand {
    Add {
        /// Account name
        account: String,
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(short, long)]
        description: String,
        #[arg(short, long)]
        slip: String,
        #[arg(long)]
        debit: Option<Decimal>,
        #[arg(long)]
        credit: Option<Decimal>,
        /// Linked account name
        #[arg(long)]
        code: Option<String>,
    },
    Edit {
        id: String,
        /// Move the transaction to another account
        #[arg(long)]
        account: Option<String>,
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(short, long)]
        description: Option<String>,
        #[arg(short, long)]
        slip: Option<String>,
        #[arg(long)]
        debit: Option<Decimal>,
        #[arg(long)]
        credit: Option<Decimal>,
        #[arg(long, conflicts_with = "clear_code")]
        code: Option<String>,
        /// Remove the linked account
        #[arg(long)]
        clear_code: bool,
    },
    Delete { id: String },
    Show { id: String },
}

#[derive(clap::Args, Debug)]
struct ViewArgs {
    /// Case-insensitive search over date, description, slip number and code
    #[arg(long)]
    search: Option<String>,
    /// date, description, slip-no, debit, credit, code or balance
    #[arg(long)]
    sort: Option<SortColumn>,
    /// asc or desc
    #[arg(long)]
    direction: Option<SortDirection>,
}

impl ViewArgs {
    fn query(&self, config: &Config) -> LedgerQuery {
        let mut query = LedgerQuery::sorted(
            self.sort.unwrap_or(config.ledger.default_sort),
            self.direction.unwrap_or(config.ledger.default_direction),
        );
        query.search = self.search.clone();
        query
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    if let Command::InitConfig { force } = args.command {
        return init_config(&args.config, force);
    }

    let config = match Config::load_or_default(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e.to_details());
            bail!("Failed to load configuration from {}", args.config.display());
        }
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(config.logging.level.as_str()))
        .init();

    let storage = JsonFileStorage::from_config(&config);
    log::debug!("Using data file {}", storage.path().display());
    let data_file = storage.path().to_path_buf();

    let mut ledger = Ledger::load(config, Box::new(storage), Box::new(LogNotifier))
        .with_context(|| format!("Failed to load ledger data from {}", data_file.display()))?;

    run(&mut ledger, args.command)?;

    if ledger.has_unsaved_changes() {
        bail!("Changes could not be saved to {}", data_file.display());
    }
    Ok(())
}

fn init_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!("{} already exists, use --force to overwrite", path.display());
    }
    fs::write(path, Config::generate_default())
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!("Wrote default configuration to {}", path.display());
    Ok(())
}

fn run(ledger: &mut Ledger, command: Command) -> Result<()> {
    match command {
        Command::Account(cmd) => run_account(ledger, cmd),
        Command::Tx(cmd) => run_tx(ledger, cmd),
        Command::Ledger { account, view } => {
            let id = find_account_id(ledger, &account)?;
            let entries = ledger.ledger_view(&id, &view.query(ledger.config()))?;
            print_ledger(ledger, &entries);
            Ok(())
        }
        Command::Balance { account } => {
            let id = find_account_id(ledger, &account)?;
            let balance = ledger.calculate_account_balance(&id);
            println!("{}: {} {}", account, amount(ledger, balance.balance), balance.balance_type);
            Ok(())
        }
        Command::Backup { output } => {
            let json = ledger.backup_data()?;
            let path = output.unwrap_or_else(|| PathBuf::from(backup_file_name(today())));
            fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))?;
            println!("Backup written to {}", path.display());
            Ok(())
        }
        Command::Restore { file } => {
            let json = fs::read_to_string(&file).with_context(|| format!("Failed to read {}", file.display()))?;
            ledger.restore_data(&json)?;
            println!(
                "Restored {} accounts and {} transactions",
                ledger.accounts().len(),
                ledger.transactions().len()
            );
            Ok(())
        }
        Command::Report { account, limit, output, view } => {
            let id = find_account_id(ledger, &account)?;
            let report = ledger.export_report(&id, &view.query(ledger.config()), limit, today())?;
            match output {
                Some(path) => {
                    let path = if path.is_dir() { path.join(report.file_name()) } else { path };
                    fs::write(&path, report.render_text())
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    println!("Report written to {}", path.display());
                }
                None => println!("{}", report.render_text()),
            }
            Ok(())
        }
        Command::InitConfig { .. } => Ok(()),
    }
}

fn run_account(ledger: &mut Ledger, cmd: AccountCommand) -> Result<()> {
    match cmd {
        AccountCommand::List => {
            for account in ledger.accounts() {
                let balance = ledger.calculate_account_balance(&account.id);
                println!(
                    "{:<30} {:>16} {}",
                    account.name,
                    amount(ledger, balance.balance),
                    balance.balance_type
                );
            }
        }
        AccountCommand::Add { name } => {
            let account = ledger.add_account(&name)?;
            println!("{}\t{}", account.id, account.name);
        }
        AccountCommand::Rename { name, new_name } => {
            let id = find_account_id(ledger, &name)?;
            let account = ledger.update_account(&id, &new_name)?;
            println!("Renamed {} to {}", name, account.name);
        }
        AccountCommand::Delete { name } => {
            let id = find_account_id(ledger, &name)?;
            let (account, removed) = ledger.delete_account(&id)?;
            println!("Deleted {} and {} transaction(s)", account.name, removed);
        }
    }
    Ok(())
}

fn run_tx(ledger: &mut Ledger, cmd: TxCommand) -> Result<()> {
    match cmd {
        TxCommand::Add { account, date, description, slip, debit, credit, code } => {
            let account_id = find_account_id(ledger, &account)?;
            let code_account_id = code.map(|name| find_account_id(ledger, &name)).transpose()?;
            let transaction = ledger.add_transaction(NewTransaction {
                account_id,
                date: date.unwrap_or_else(today),
                description,
                slip_no: slip,
                debit: debit.unwrap_or_default(),
                credit: credit.unwrap_or_default(),
                code_account_id,
            })?;
            println!("{}", transaction.id);
        }
        TxCommand::Edit { id, account, date, description, slip, debit, credit, code, clear_code } => {
            let current = ledger
                .get_transaction_by_id(&id)
                .cloned()
                .ok_or_else(|| anyhow!("Transaction not found: {}", id))?;

            let (debit, credit) = match (debit, credit) {
                (Some(d), Some(c)) => (d, c),
                (Some(d), None) => (d, Decimal::ZERO),
                (None, Some(c)) => (Decimal::ZERO, c),
                (None, None) => (current.debit, current.credit),
            };
            let code_account_id = match code {
                Some(name) => Some(find_account_id(ledger, &name)?),
                None if clear_code => None,
                None => current.code_account_id.clone(),
            };
            let account_id = match account {
                Some(name) => find_account_id(ledger, &name)?,
                None => current.account_id.clone(),
            };

            let updated = ledger.update_transaction(Transaction {
                account_id,
                date: date.unwrap_or(current.date),
                description: description.unwrap_or(current.description),
                slip_no: slip.unwrap_or(current.slip_no),
                debit,
                credit,
                code_account_id,
                ..current
            })?;
            print_transaction(ledger, &updated);
        }
        TxCommand::Delete { id } => match ledger.delete_transaction(&id) {
            Some(removed) => println!("Deleted {}", removed.summary()),
            None => println!("Transaction {} not found, nothing to delete", id),
        },
        TxCommand::Show { id } => {
            let transaction = ledger
                .get_transaction_by_id(&id)
                .ok_or_else(|| anyhow!("Transaction not found: {}", id))?;
            print_transaction(ledger, transaction);
        }
    }
    Ok(())
}

fn find_account_id(ledger: &Ledger, name: &str) -> Result<String> {
    ledger
        .get_account_by_name(name)
        .map(|a| a.id.clone())
        .ok_or_else(|| anyhow!("Account not found: {}", name))
}

fn account_name(ledger: &Ledger, id: &str) -> String {
    ledger
        .get_account_by_id(id)
        .map(|a| a.name.clone())
        .unwrap_or_else(|| ledger.config().ledger.unknown_account_label.clone())
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn amount(ledger: &Ledger, value: Decimal) -> String {
    let currency = &ledger.config().currency;
    format_amount(
        value,
        currency.decimal_places,
        &currency.thousands_separator,
        &currency.decimal_separator,
    )
}

fn side(ledger: &Ledger, value: Decimal) -> String {
    if value > Decimal::ZERO {
        amount(ledger, value)
    } else {
        "-".to_string()
    }
}

fn print_ledger(ledger: &Ledger, entries: &[LedgerEntry]) {
    println!(
        "{:<10}  {:<30} {:<10} {:<20} {:>14} {:>14} {:>14}",
        "Date", "Description", "Slip No.", "Code", "Debit", "Credit", "Balance"
    );
    for entry in entries {
        println!(
            "{:<10}  {:<30} {:<10} {:<20} {:>14} {:>14} {:>14}",
            entry.date.format("%Y-%m-%d"),
            entry.description,
            entry.slip_no,
            entry.display_code,
            side(ledger, entry.debit),
            side(ledger, entry.credit),
            amount(ledger, entry.balance)
        );
    }
}

fn print_transaction(ledger: &Ledger, tx: &Transaction) {
    println!("Id:          {}", tx.id);
    println!("Account:     {}", account_name(ledger, &tx.account_id));
    println!("Date:        {}", tx.date.format("%Y-%m-%d"));
    println!("Description: {}", tx.description);
    println!("Slip No.:    {}", tx.slip_no);
    println!("Debit:       {}", side(ledger, tx.debit));
    println!("Credit:      {}", side(ledger, tx.credit));
    if let Some(code) = &tx.code_account_id {
        println!("Code:        {}", account_name(ledger, code));
    }
    println!("Created:     {}", tx.created_at.to_rfc3339());
}
