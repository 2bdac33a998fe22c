//! Stateful walk over statement blocks

use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use tracing::{debug, warn};

use super::{ClosingBalance, ParseError, ParseErrorReason, ParsedTransaction, StatementBlock};

type FieldResult<T> = Result<T, ParseErrorReason>;

/// SEPA purpose markers, in the order they are checked
const PURPOSE_MARKERS: [&str; 3] = ["SVWZ", "EREF", "KREF"];

/// Characters that may end the amount run of a `:61:` line
const AMOUNT_TERMINATORS: [char; 3] = ['S', 'N', 'F'];

/// Parse block strings (as produced by [`super::split_blocks`]) into transactions
pub fn parse_blocks<S: AsRef<str>>(blocks: &[S]) -> Result<Vec<ParsedTransaction>, ParseError> {
    let mut parser = StatementParser::new();
    for (index, raw) in blocks.iter().enumerate() {
        parser.feed(index, &StatementBlock::from_raw(raw.as_ref()))?;
    }
    let parsed = parser.finish();
    debug!(transactions = parsed.len(), "Statement parsed");
    Ok(parsed)
}

/// Values shared by all transactions of one statement group
#[derive(Debug, Clone, Default)]
struct GroupContext {
    reference: Option<String>,
    account: Option<String>,
    opening_balance: Option<Decimal>,
}

/// Decoded `:60F:` / `:62F:` payload
#[derive(Debug, Clone, Copy)]
struct Balance {
    date: NaiveDate,
    amount: Decimal,
}

/// Decoded `:61:` payload
#[derive(Debug, Clone)]
struct StatementLine {
    date: NaiveDate,
    booking_date: NaiveDate,
    amount: Decimal,
    currency_code: Option<char>,
}

/// Decoded `:86:` payload
#[derive(Debug, Clone, Default)]
struct TransactionDetail {
    type_code: String,
    type_name: String,
    purpose: String,
    purpose_addition: Option<String>,
    counterparty_account: Option<String>,
    counterparty_name: Option<String>,
}

/// A transaction whose statement line has been read, waiting for its detail
#[derive(Debug)]
struct TransactionDraft {
    reference: Option<String>,
    account: String,
    opening_balance: Option<Decimal>,
    line: StatementLine,
    detail: TransactionDetail,
}

impl TransactionDraft {
    fn into_parsed(self, closing_balance: Option<ClosingBalance>) -> ParsedTransaction {
        ParsedTransaction {
            reference: self.reference,
            account: self.account,
            opening_balance: self.opening_balance,
            date: self.line.date,
            booking_date: self.line.booking_date,
            amount: self.line.amount,
            currency_code: self.line.currency_code,
            transaction_type_code: self.detail.type_code,
            transaction_type_name: self.detail.type_name,
            purpose: self.detail.purpose,
            purpose_addition: self.detail.purpose_addition,
            counterparty_account: self.detail.counterparty_account,
            counterparty_name: self.detail.counterparty_name,
            closing_balance,
        }
    }
}

#[derive(Debug)]
enum ParserState {
    Idle,
    AccumulatingTransaction(Box<TransactionDraft>),
}

/// Accumulates transactions block by block
///
/// A transaction is opened by `:61:`, completed by `:86:` and emitted by
/// [`flush`](Self::flush), which runs on the next `:61:`, on `:62F:` and at
/// the end of input. `:20:` does not emit: a pending transaction keeps the
/// group values it was opened under.
#[derive(Debug)]
pub struct StatementParser {
    group: GroupContext,
    state: ParserState,
    parsed: Vec<ParsedTransaction>,
}

impl Default for StatementParser {
    fn default() -> Self {
        Self::new()
    }
}

impl StatementParser {
    pub fn new() -> Self {
        Self {
            group: GroupContext::default(),
            state: ParserState::Idle,
            parsed: Vec::new(),
        }
    }

    /// Process one block; `index` is only used in error reports
    pub fn feed(&mut self, index: usize, block: &StatementBlock) -> Result<(), ParseError> {
        let fail = |reason: ParseErrorReason| ParseError::new(index, block.tag.as_str(), reason);
        let payload = block.payload.as_str();

        match block.tag.as_str() {
            "20" => {
                let reference = payload.trim();
                self.group.reference = (!reference.is_empty()).then(|| reference.to_string());
            }
            "25" => {
                self.group.account = Some(parse_account(payload).map_err(fail)?);
            }
            "60F" => {
                let opening = parse_balance(payload).map_err(fail)?;
                self.group.opening_balance = Some(opening.amount);
            }
            "61" => {
                let line = parse_statement_line(payload).map_err(fail)?;
                let account = self
                    .group
                    .account
                    .clone()
                    .ok_or_else(|| fail(ParseErrorReason::Missing("account identification (:25:)")))?;
                self.flush(None);
                self.state = ParserState::AccumulatingTransaction(Box::new(TransactionDraft {
                    reference: self.group.reference.clone(),
                    account,
                    opening_balance: self.group.opening_balance,
                    line,
                    detail: TransactionDetail::default(),
                }));
            }
            "86" => {
                let detail = parse_detail(payload).map_err(fail)?;
                match &mut self.state {
                    ParserState::AccumulatingTransaction(draft) => draft.detail = detail,
                    ParserState::Idle => {
                        return Err(fail(ParseErrorReason::DetailWithoutStatementLine));
                    }
                }
            }
            "62F" => {
                let closing = parse_balance(payload).map_err(fail)?;
                if !self.flush(Some(closing)) {
                    warn!(block = index, "Closing balance without transactions, not recorded");
                }
                self.group = GroupContext::default();
            }
            other => {
                debug!(block = index, tag = other, "Ignoring block");
            }
        }

        Ok(())
    }

    /// Emit the pending transaction, if any
    fn flush(&mut self, closing: Option<Balance>) -> bool {
        match std::mem::replace(&mut self.state, ParserState::Idle) {
            ParserState::Idle => false,
            ParserState::AccumulatingTransaction(draft) => {
                let closing_balance = closing.map(|b| ClosingBalance {
                    account: draft.account.clone(),
                    date: b.date,
                    balance: b.amount,
                });
                self.parsed.push(draft.into_parsed(closing_balance));
                true
            }
        }
    }

    /// Flush the pending transaction and return everything parsed
    pub fn finish(mut self) -> Vec<ParsedTransaction> {
        self.flush(None);
        self.parsed
    }
}

/// `:25:` payload: `BLZ/ACCOUNT` or a bare account number / IBAN
fn parse_account(payload: &str) -> FieldResult<String> {
    let trimmed = payload.trim();
    let account = trimmed.rsplit('/').next().unwrap_or(trimmed).trim();
    if account.is_empty() {
        return Err(ParseErrorReason::Missing("account number"));
    }
    Ok(account.to_string())
}

/// `:60F:` / `:62F:` payload: mark, YYMMDD, currency, amount
fn parse_balance(payload: &str) -> FieldResult<Balance> {
    let sign = match payload.get(0..1) {
        Some("C") => Decimal::ONE,
        Some("D") => Decimal::NEGATIVE_ONE,
        Some(other) => return Err(ParseErrorReason::invalid("debit/credit mark", other)),
        None => return Err(ParseErrorReason::Truncated("debit/credit mark")),
    };
    let date = parse_date(payload.get(1..7).ok_or(ParseErrorReason::Truncated("date"))?)?;
    let raw_amount = payload
        .get(10..)
        .ok_or(ParseErrorReason::Truncated("amount"))?
        .trim();
    let amount =
        parse_amount(raw_amount).ok_or_else(|| ParseErrorReason::invalid("amount", raw_amount))?;

    Ok(Balance {
        date,
        amount: amount * sign,
    })
}

/// `:61:` payload: value date, booking date, mark, currency letter, amount
fn parse_statement_line(payload: &str) -> FieldResult<StatementLine> {
    let date = parse_date(payload.get(0..6).ok_or(ParseErrorReason::Truncated("value date"))?)?;
    let booking_date = parse_booking_date(
        date,
        payload
            .get(6..10)
            .ok_or(ParseErrorReason::Truncated("booking date"))?,
    )?;

    // Reversals carry a two letter mark, which shifts the currency letter
    let (sign, currency_position) = match payload.get(10..12) {
        Some("RC") => (Decimal::NEGATIVE_ONE, 12),
        Some("RD") => (Decimal::ONE, 12),
        _ => match payload.get(10..11) {
            Some("C") => (Decimal::ONE, 11),
            Some("D") => (Decimal::NEGATIVE_ONE, 11),
            Some(other) => return Err(ParseErrorReason::invalid("debit/credit mark", other)),
            None => return Err(ParseErrorReason::Truncated("debit/credit mark")),
        },
    };
    let currency_code = payload
        .get(currency_position..)
        .and_then(|rest| rest.chars().next())
        .filter(char::is_ascii_alphabetic);

    let tail = payload.get(11..).ok_or(ParseErrorReason::Truncated("amount"))?;
    let start = tail
        .find(|c: char| c.is_ascii_digit())
        .ok_or(ParseErrorReason::Missing("amount"))?;
    let run = &tail[start..];
    let end = run
        .find(|c: char| !(c.is_ascii_digit() || c == ','))
        .ok_or(ParseErrorReason::Missing("transaction type identification"))?;
    let terminator = run[end..].chars().next().unwrap_or_default();
    if !AMOUNT_TERMINATORS.contains(&terminator) {
        return Err(ParseErrorReason::invalid(
            "transaction type identification",
            terminator.to_string(),
        ));
    }
    let amount = parse_amount(&run[..end])
        .ok_or_else(|| ParseErrorReason::invalid("amount", &run[..end]))?;

    Ok(StatementLine {
        date,
        booking_date,
        amount: amount * sign,
        currency_code,
    })
}

/// `:86:` payload: structured narrative with `?NN` subfields
fn parse_detail(payload: &str) -> FieldResult<TransactionDetail> {
    let type_code = payload
        .get(0..3)
        .ok_or(ParseErrorReason::Truncated("transaction type code"))?;
    if !type_code.chars().all(|c| c.is_ascii_digit()) {
        return Err(ParseErrorReason::invalid("transaction type code", type_code));
    }
    let type_name = payload
        .get(6..)
        .map(|rest| rest.split('?').next().unwrap_or(rest))
        .unwrap_or_default()
        .trim();

    let joined = (20..=29)
        .filter_map(|n| subfield(payload, n))
        .collect::<Vec<_>>()
        .join(" ");
    let purpose_addition = PURPOSE_MARKERS
        .iter()
        .find(|marker| joined.starts_with(&format!("{marker}+")))
        .map(|marker| marker.to_string());
    let purpose = PURPOSE_MARKERS
        .iter()
        .fold(joined, |purpose, marker| purpose.replace(&format!("{marker}+"), ""));

    let counterparty_account = subfield(payload, 31)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);
    let counterparty_name = match (subfield(payload, 32), subfield(payload, 33)) {
        (Some(first), Some(second)) => Some(format!("{first} {second}")),
        (Some(only), None) | (None, Some(only)) => Some(only.to_string()),
        (None, None) => None,
    };

    Ok(TransactionDetail {
        type_code: type_code.to_string(),
        type_name: type_name.to_string(),
        purpose,
        purpose_addition,
        counterparty_account,
        counterparty_name,
    })
}

/// Text of subfield `?NN`, up to the next `?` or the end of the payload
fn subfield(payload: &str, number: u8) -> Option<&str> {
    let tag = format!("?{number:02}");
    let start = payload.find(&tag)? + tag.len();
    let rest = &payload[start..];
    Some(rest.split('?').next().unwrap_or(rest))
}

/// YYMMDD; years 00-69 are 20xx, 70-99 are 19xx
fn parse_date(raw: &str) -> FieldResult<NaiveDate> {
    if raw.len() != 6 || !raw.chars().all(|c| c.is_ascii_digit()) {
        return Err(ParseErrorReason::invalid("date", raw));
    }
    let number = |range: std::ops::Range<usize>| raw[range].parse::<u32>().unwrap_or_default();
    let yy = number(0..2) as i32;
    let year = if yy < 70 { 2000 + yy } else { 1900 + yy };
    NaiveDate::from_ymd_opt(year, number(2..4), number(4..6))
        .ok_or_else(|| ParseErrorReason::invalid("date", raw))
}

/// MMDD, with the year taken from the value date
///
/// Bookings across new year (value date in December, booking in January or
/// the reverse) move to the adjacent year.
fn parse_booking_date(value_date: NaiveDate, raw: &str) -> FieldResult<NaiveDate> {
    if raw.len() != 4 || !raw.chars().all(|c| c.is_ascii_digit()) {
        return Err(ParseErrorReason::invalid("booking date", raw));
    }
    let month = raw[0..2].parse::<u32>().unwrap_or_default();
    let day = raw[2..4].parse::<u32>().unwrap_or_default();
    let year = match (value_date.month(), month) {
        (12, 1) => value_date.year() + 1,
        (1, 12) => value_date.year() - 1,
        _ => value_date.year(),
    };
    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| ParseErrorReason::invalid("booking date", raw))
}

/// Cents are the smallest unit a statement carries
const MAX_FRACTION_DIGITS: usize = 2;

/// Decimal with a comma separator, e.g. `1234,5` or `50,`
fn parse_amount(raw: &str) -> Option<Decimal> {
    let mut normalized = raw.trim().replace(',', ".");
    if normalized.is_empty() {
        return None;
    }
    if normalized
        .split_once('.')
        .is_some_and(|(_, fraction)| fraction.len() > MAX_FRACTION_DIGITS)
    {
        return None;
    }
    if normalized.ends_with('.') {
        normalized.push('0');
    }
    if normalized.starts_with('.') {
        normalized.insert(0, '0');
    }
    Decimal::from_str(&normalized).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::statement::{parse_statement, split_blocks};

    const SAMPLE: &str = "\
:20:REF1
:25:DE00ACCOUNT
:60F:C230101EUR100,00
:61:2301150115CR50,00NTRFNONREF
:86:166?00GUTSCHRIFT?20SVWZ+Rent?31DE11111111?32Landlord
:61:2301200120DR20,00NDDTNONREF
:86:105?00LASTSCHRIFT?20EREF+Shop?31DE22222222?32Shop GmbH
:62F:C230131EUR130,00
";

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_sample_statement() {
        let parsed = parse_statement(SAMPLE).unwrap();
        assert_eq!(parsed.len(), 2);

        let first = &parsed[0];
        assert_eq!(first.reference.as_deref(), Some("REF1"));
        assert_eq!(first.account, "DE00ACCOUNT");
        assert_eq!(first.opening_balance, Some(Decimal::new(10000, 2)));
        assert_eq!(first.date, date(2023, 1, 15));
        assert_eq!(first.booking_date, date(2023, 1, 15));
        assert_eq!(first.amount, Decimal::new(5000, 2));
        assert_eq!(first.currency_code, Some('R'));
        assert_eq!(first.transaction_type_code, "166");
        assert_eq!(first.transaction_type_name, "GUTSCHRIFT");
        assert_eq!(first.purpose, "Rent");
        assert_eq!(first.purpose_addition.as_deref(), Some("SVWZ"));
        assert_eq!(first.counterparty_account.as_deref(), Some("DE11111111"));
        assert_eq!(first.counterparty_name.as_deref(), Some("Landlord"));
        assert!(first.closing_balance.is_none());

        let second = &parsed[1];
        assert_eq!(second.amount, Decimal::new(-2000, 2));
        assert_eq!(second.purpose, "Shop");
        assert_eq!(second.purpose_addition.as_deref(), Some("EREF"));
        assert_eq!(
            second.closing_balance,
            Some(ClosingBalance {
                account: "DE00ACCOUNT".to_string(),
                date: date(2023, 1, 31),
                balance: Decimal::new(13000, 2),
            })
        );
    }

    #[test]
    fn test_purpose_prefix_extraction() {
        let detail = parse_detail("166?00GUTSCHRIFT?20SVWZ+Invoice 123").unwrap();
        assert_eq!(detail.purpose, "Invoice 123");
        assert_eq!(detail.purpose_addition.as_deref(), Some("SVWZ"));
    }

    #[test]
    fn test_purpose_subfields_joined_in_order() {
        let detail =
            parse_detail("166?00GUTSCHRIFT?21second part?20EREF+NOTPROVIDED?22SVWZ+third").unwrap();
        assert_eq!(detail.purpose, "NOTPROVIDED second part third");
        assert_eq!(detail.purpose_addition.as_deref(), Some("EREF"));
    }

    #[test]
    fn test_purpose_without_marker() {
        let detail = parse_detail("166?00GUTSCHRIFT?20Plain text").unwrap();
        assert_eq!(detail.purpose, "Plain text");
        assert!(detail.purpose_addition.is_none());
    }

    #[test]
    fn test_counterparty_name_overflow() {
        let detail = parse_detail("166?00GUTSCHRIFT?20x?31DE99?32ACME Import?33GmbH").unwrap();
        assert_eq!(detail.counterparty_name.as_deref(), Some("ACME Import GmbH"));
        assert_eq!(detail.counterparty_account.as_deref(), Some("DE99"));

        let detail = parse_detail("166?00GUTSCHRIFT?32ACME Impo?33rt GmbH").unwrap();
        assert_eq!(detail.counterparty_name.as_deref(), Some("ACME Impo rt GmbH"));
    }

    #[test]
    fn test_detail_without_subfields() {
        let detail = parse_detail("166").unwrap();
        assert_eq!(detail.type_name, "");
        assert_eq!(detail.purpose, "");
        assert!(detail.counterparty_account.is_none());
        assert!(detail.counterparty_name.is_none());
    }

    #[test]
    fn test_detail_bad_type_code() {
        assert_eq!(
            parse_detail("AB").unwrap_err(),
            ParseErrorReason::Truncated("transaction type code")
        );
        assert!(matches!(
            parse_detail("X66?00FOO").unwrap_err(),
            ParseErrorReason::Invalid { field: "transaction type code", .. }
        ));
    }

    #[test]
    fn test_statement_line_marks() {
        let credit = parse_statement_line("2301150115C50,00NTRF").unwrap();
        assert_eq!(credit.amount, Decimal::new(5000, 2));
        assert_eq!(credit.currency_code, None);

        let debit = parse_statement_line("2301150115DR7,5NMSC").unwrap();
        assert_eq!(debit.amount, Decimal::new(-75, 1));

        let reversed_credit = parse_statement_line("2301150115RCR12,00NTRF").unwrap();
        assert_eq!(reversed_credit.amount, Decimal::new(-1200, 2));
        assert_eq!(reversed_credit.currency_code, Some('R'));

        let reversed_debit = parse_statement_line("2301150115RDR12,00NTRF").unwrap();
        assert_eq!(reversed_debit.amount, Decimal::new(1200, 2));
    }

    #[test]
    fn test_statement_line_terminators() {
        assert_eq!(
            parse_statement_line("2301150115C50,SMSC").unwrap().amount,
            Decimal::new(50, 0)
        );
        assert_eq!(
            parse_statement_line("2301150115C1,5FCHK").unwrap().amount,
            Decimal::new(15, 1)
        );
        assert!(matches!(
            parse_statement_line("2301150115C50,00XTRF").unwrap_err(),
            ParseErrorReason::Invalid { field: "transaction type identification", .. }
        ));
        assert_eq!(
            parse_statement_line("2301150115C50,00").unwrap_err(),
            ParseErrorReason::Missing("transaction type identification")
        );
    }

    #[test]
    fn test_statement_line_malformed_offsets() {
        assert_eq!(
            parse_statement_line("2301").unwrap_err(),
            ParseErrorReason::Truncated("value date")
        );
        assert_eq!(
            parse_statement_line("230115011").unwrap_err(),
            ParseErrorReason::Truncated("booking date")
        );
        assert_eq!(
            parse_statement_line("2301150115").unwrap_err(),
            ParseErrorReason::Truncated("debit/credit mark")
        );
        assert!(matches!(
            parse_statement_line("2301150115X50,00NTRF").unwrap_err(),
            ParseErrorReason::Invalid { field: "debit/credit mark", .. }
        ));
        assert_eq!(
            parse_statement_line("2301150115CRNTRF").unwrap_err(),
            ParseErrorReason::Missing("amount")
        );
        assert!(matches!(
            parse_statement_line("23X1150115C50,00NTRF").unwrap_err(),
            ParseErrorReason::Invalid { field: "date", .. }
        ));
    }

    #[test]
    fn test_booking_date_across_new_year() {
        let line = parse_statement_line("2312310102C1,00NTRF").unwrap();
        assert_eq!(line.date, date(2023, 12, 31));
        assert_eq!(line.booking_date, date(2024, 1, 2));

        let line = parse_statement_line("2401021231C1,00NTRF").unwrap();
        assert_eq!(line.booking_date, date(2023, 12, 31));
    }

    #[test]
    fn test_two_digit_year_pivot() {
        assert_eq!(parse_date("690101").unwrap(), date(2069, 1, 1));
        assert_eq!(parse_date("700101").unwrap(), date(1970, 1, 1));
        assert!(parse_date("231301").is_err());
    }

    #[test]
    fn test_debit_balances_are_negative() {
        let balance = parse_balance("D230101EUR1.234,56").unwrap_err();
        assert!(matches!(balance, ParseErrorReason::Invalid { field: "amount", .. }));

        let balance = parse_balance("D230101EUR1234,56").unwrap();
        assert_eq!(balance.amount, Decimal::new(-123456, 2));
        assert_eq!(balance.date, date(2023, 1, 1));

        let balance = parse_balance("C230101EUR0,\r ").unwrap();
        assert_eq!(balance.amount, Decimal::ZERO);
    }

    #[test]
    fn test_sub_cent_amounts_are_rejected() {
        let line = parse_statement_line("2301150115CR50,125NTRFNONREF").unwrap_err();
        assert!(matches!(line, ParseErrorReason::Invalid { field: "amount", .. }));

        let balance = parse_balance("C230131EUR150,125").unwrap_err();
        assert!(matches!(balance, ParseErrorReason::Invalid { field: "amount", .. }));

        let line = parse_statement_line("2301150115CR50,1NTRFNONREF").unwrap();
        assert_eq!(line.amount, Decimal::new(501, 1));
    }

    #[test]
    fn test_account_with_bank_code() {
        assert_eq!(parse_account("12345678/0123456789").unwrap(), "0123456789");
        assert_eq!(parse_account(" DE00ACCOUNT ").unwrap(), "DE00ACCOUNT");
        assert_eq!(
            parse_account("12345678/").unwrap_err(),
            ParseErrorReason::Missing("account number")
        );
    }

    #[test]
    fn test_transaction_without_detail_is_flushed() {
        let text = ":25:ACC\n:61:2301150115C1,00NTRF\n:61:2301160116D2,00NTRF\n:86:105?00LASTSCHRIFT";
        let parsed = parse_statement(text).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].transaction_type_code, "");
        assert_eq!(parsed[1].transaction_type_code, "105");
        assert!(parsed[1].closing_balance.is_none());
    }

    #[test]
    fn test_reference_does_not_flush_pending() {
        let text = "\
:20:REF1
:25:ACC1
:61:2301150115C1,00NTRF
:86:166?00GUTSCHRIFT?20first
:20:REF2
:25:ACC2
:61:2301160116C2,00NTRF
:86:166?00GUTSCHRIFT?20second
:62F:C230131EUR3,00
";
        let parsed = parse_statement(text).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].reference.as_deref(), Some("REF1"));
        assert_eq!(parsed[0].account, "ACC1");
        assert!(parsed[0].closing_balance.is_none());
        assert_eq!(parsed[1].account, "ACC2");
        assert_eq!(parsed[1].closing_balance.as_ref().unwrap().account, "ACC2");
    }

    #[test]
    fn test_closing_balance_resets_group() {
        let text = "\
:20:REF1
:25:ACC1
:60F:C230101EUR0,00
:61:2301150115C1,00NTRF
:86:166?00GUTSCHRIFT
:62F:C230131EUR1,00
:61:2302150215C1,00NTRF
";
        let err = parse_statement(text).unwrap_err();
        assert_eq!(err.block, 6);
        assert_eq!(err.tag, "61");
        assert_eq!(
            err.reason,
            ParseErrorReason::Missing("account identification (:25:)")
        );
    }

    #[test]
    fn test_closing_balance_without_transactions_is_dropped() {
        let text = ":20:REF\n:25:ACC\n:60F:C230101EUR5,00\n:62F:C230131EUR5,00";
        assert!(parse_statement(text).unwrap().is_empty());
    }

    #[test]
    fn test_detail_without_statement_line() {
        let err = parse_statement(":25:ACC\n:86:166?00GUTSCHRIFT").unwrap_err();
        assert_eq!(err.block, 1);
        assert_eq!(err.reason, ParseErrorReason::DetailWithoutStatementLine);
    }

    #[test]
    fn test_unknown_tags_are_ignored() {
        let text = ":20:REF\n:25:ACC\n:28C:00001/001\n:61:2301150115C1,00NTRF\n:64:C230131EUR1,00";
        let parsed = parse_statement(text).unwrap();
        assert_eq!(parsed.len(), 1);
    }

    #[test]
    fn test_parse_blocks_accepts_split_output() {
        let blocks = split_blocks(SAMPLE);
        assert_eq!(blocks.len(), 8);
        assert_eq!(parse_blocks(&blocks).unwrap().len(), 2);
    }

    #[test]
    fn test_empty_input() {
        assert!(parse_statement("").unwrap().is_empty());
    }
}
