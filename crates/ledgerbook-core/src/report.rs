//! Report export for a finalized ledger view
//!
//! Rows keep the exact order of the view they were built from; the code
//! column is not exported.

use chrono::format::{Item, StrftimeItems};
use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use ledgerbook_config::Config;
use ledgerbook_utils::{format_amount, sanitize_file_stem};

use crate::error::{CoreError, CoreResult};
use crate::models::LedgerEntry;

/// Column headers of an exported report
pub const REPORT_HEADERS: [&str; 7] = ["#", "Date", "Description", "Slip No.", "Debit", "Credit", "Balance"];

/// One formatted report line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRow {
    pub index: usize,
    pub date: String,
    pub description: String,
    pub slip_no: String,
    pub debit: String,
    pub credit: String,
    pub balance: String,
}

impl ReportRow {
    pub fn cells(&self) -> [String; 7] {
        [
            self.index.to_string(),
            self.date.clone(),
            self.description.clone(),
            self.slip_no.clone(),
            self.debit.clone(),
            self.credit.clone(),
            self.balance.clone(),
        ]
    }
}

/// Transaction report for one account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerReport {
    pub account_name: String,
    pub generated_on: NaiveDate,
    /// Row cap applied, `None` for all rows
    pub line_limit: Option<usize>,
    pub rows: Vec<ReportRow>,
}

impl LedgerReport {
    /// Format `entries` in their current order, keeping at most `line_limit` rows
    pub fn build(
        account_name: &str,
        entries: &[LedgerEntry],
        line_limit: Option<usize>,
        config: &Config,
        generated_on: NaiveDate,
    ) -> CoreResult<Self> {
        if line_limit == Some(0) {
            return Err(CoreError::validation("Line limit must be a positive number"));
        }

        let pattern = config.report.date_format.as_str();
        if StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error)) {
            return Err(CoreError::validation(format!("Invalid report date format: {}", pattern)));
        }

        let thousands = if config.report.group_thousands {
            config.currency.thousands_separator.as_str()
        } else {
            ""
        };
        let amount = |value: Decimal| {
            format_amount(
                value,
                config.currency.decimal_places,
                thousands,
                &config.currency.decimal_separator,
            )
        };
        let side = |value: Decimal| {
            if value > Decimal::ZERO {
                amount(value)
            } else {
                "-".to_string()
            }
        };

        let take = line_limit.unwrap_or(entries.len());
        let rows = entries
            .iter()
            .take(take)
            .enumerate()
            .map(|(i, entry)| ReportRow {
                index: i + 1,
                date: entry.date.format(pattern).to_string(),
                description: entry.description.clone(),
                slip_no: entry.slip_no.clone(),
                debit: side(entry.debit),
                credit: side(entry.credit),
                balance: amount(entry.balance),
            })
            .collect();

        Ok(Self {
            account_name: account_name.to_string(),
            generated_on,
            line_limit,
            rows,
        })
    }

    pub fn title(&self) -> String {
        format!("Transaction Report for {}", self.account_name)
    }

    /// Tab-separated text document
    pub fn render_text(&self) -> String {
        let mut out = format!(
            "{}\nGenerated on: {}/{}/{}\n\n",
            self.title(),
            self.generated_on.month(),
            self.generated_on.day(),
            self.generated_on.year()
        );
        out.push_str(&REPORT_HEADERS.join("\t"));
        out.push('\n');
        let lines: Vec<String> = self.rows.iter().map(|r| r.cells().join("\t")).collect();
        out.push_str(&lines.join("\n"));
        out
    }

    /// Suggested download file name
    pub fn file_name(&self) -> String {
        let lines = match self.line_limit {
            Some(n) => format!("_first_{}_lines", n),
            None => "_all_lines".to_string(),
        };
        format!(
            "{}_Ledger_{}{}.txt",
            sanitize_file_stem(&self.account_name),
            self.generated_on.format("%Y-%m-%d"),
            lines
        )
    }
}
