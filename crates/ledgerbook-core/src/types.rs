//! Basic types for the core ledger module

use serde::{Deserialize, Serialize};

pub use ledgerbook_config::{SortColumn, SortDirection};

/// Sign classification of an account's total balance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BalanceType {
    /// Debit-leaning (positive debit minus credit)
    #[serde(rename = "Dr")]
    Debit,
    /// Credit-leaning (negative debit minus credit)
    #[serde(rename = "Cr")]
    Credit,
    /// Exactly zero
    Zero,
}

impl std::str::FromStr for BalanceType {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dr" | "debit" => Ok(BalanceType::Debit),
            "cr" | "credit" => Ok(BalanceType::Credit),
            "zero" => Ok(BalanceType::Zero),
            _ => Err(format!("Invalid balance type: {}", s)),
        }
    }
}

impl std::fmt::Display for BalanceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BalanceType::Debit => write!(f, "Dr"),
            BalanceType::Credit => write!(f, "Cr"),
            BalanceType::Zero => write!(f, "Zero"),
        }
    }
}

/// Search and ordering applied to a ledger view
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LedgerQuery {
    /// Case-insensitive search term; blank keeps every entry
    pub search: Option<String>,
    /// Display sort column
    pub sort: SortColumn,
    /// Display sort direction
    pub direction: SortDirection,
}

impl LedgerQuery {
    /// Query sorted by a column in a direction, without search
    pub fn sorted(sort: SortColumn, direction: SortDirection) -> Self {
        Self { search: None, sort, direction }
    }

    /// Add a search term
    pub fn with_search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    /// Lowercased search term, if it is not blank
    pub fn search_term(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_balance_type_display() {
        assert_eq!(BalanceType::Debit.to_string(), "Dr");
        assert_eq!(BalanceType::Credit.to_string(), "Cr");
        assert_eq!("zero".parse::<BalanceType>().unwrap(), BalanceType::Zero);
        assert_eq!(serde_json::to_string(&BalanceType::Credit).unwrap(), "\"Cr\"");
    }

    #[test]
    fn test_query_defaults_to_date_desc() {
        let query = LedgerQuery::default();
        assert_eq!(query.sort, SortColumn::Date);
        assert_eq!(query.direction, SortDirection::Desc);
        assert_eq!(query.search_term(), None);
    }

    #[test]
    fn test_blank_search_is_ignored() {
        assert_eq!(LedgerQuery::default().with_search("   ").search_term(), None);
        assert_eq!(
            LedgerQuery::default().with_search(" Rent ").search_term(),
            Some("rent".to_string())
        );
    }
}
