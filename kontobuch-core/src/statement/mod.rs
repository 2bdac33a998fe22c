//! MT940 statement reading
//!
//! Statement text goes through two stages:
//!
//! - **tokenizer**: raw text to tagged blocks (`:61:...`, `:86:...`)
//! - **parser**: a stateful walk over the blocks producing one
//!   [`ParsedTransaction`] per `:61:`/`:86:` pair
//!
//! Field positions are fixed per tag and follow what German bank exports
//! actually produce, so parsing is done by offset rather than by pattern.

mod parser;
mod tokenizer;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

pub use parser::{parse_blocks, StatementParser};
pub use tokenizer::{split_blocks, tokenize, StatementBlock};

/// Parse statement text into transactions
pub fn parse_statement(text: &str) -> Result<Vec<ParsedTransaction>, ParseError> {
    parse_blocks(&split_blocks(text))
}

/// A transaction read from a statement, before reconciliation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedTransaction {
    /// Statement reference from `:20:`
    pub reference: Option<String>,
    /// Account number from `:25:`
    pub account: String,
    /// Opening balance of the statement group from `:60F:`
    pub opening_balance: Option<Decimal>,
    /// Value date
    pub date: NaiveDate,
    pub booking_date: NaiveDate,
    /// Signed amount, credits positive
    pub amount: Decimal,
    /// Last letter of the currency code, if the bank included it
    pub currency_code: Option<char>,
    pub transaction_type_code: String,
    pub transaction_type_name: String,
    pub purpose: String,
    pub purpose_addition: Option<String>,
    pub counterparty_account: Option<String>,
    pub counterparty_name: Option<String>,
    /// Only set on the last transaction of a statement group
    pub closing_balance: Option<ClosingBalance>,
}

/// Closing balance (`:62F:`) of a statement group
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClosingBalance {
    pub account: String,
    pub date: NaiveDate,
    pub balance: Decimal,
}

/// Malformed statement block
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("block {block} (:{tag}:): {reason}")]
pub struct ParseError {
    /// Zero-based index of the offending block
    pub block: usize,
    pub tag: String,
    pub reason: ParseErrorReason,
}

impl ParseError {
    pub fn new(block: usize, tag: impl Into<String>, reason: ParseErrorReason) -> Self {
        Self {
            block,
            tag: tag.into(),
            reason,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseErrorReason {
    #[error("payload too short for {0}")]
    Truncated(&'static str),

    #[error("invalid {field} '{value}'")]
    Invalid { field: &'static str, value: String },

    #[error("{0} missing")]
    Missing(&'static str),

    #[error("transaction detail without a preceding statement line")]
    DetailWithoutStatementLine,
}

impl ParseErrorReason {
    fn invalid(field: &'static str, value: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            value: value.into(),
        }
    }
}
