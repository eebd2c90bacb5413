use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

const FIELD_SEPARATOR: char = ',';

/// Reason a non-blank input line could not be turned into a usable request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LineError {
    FieldCount { found: usize },
    EmptyAddress,
    InvalidAmount { value: String },
    NegativeAmount { value: String },
}

impl fmt::Display for LineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineError::FieldCount { found } => {
                write!(f, "expected `address,amount` but found {found} field(s)")
            }
            LineError::EmptyAddress => write!(f, "address field is empty"),
            LineError::InvalidAmount { value } => write!(f, "amount `{value}` is not a decimal"),
            LineError::NegativeAmount { value } => write!(f, "amount `{value}` is negative"),
        }
    }
}

impl std::error::Error for LineError {}

/// One parsed row of the address list.
///
/// Rows that fail to parse are still produced, carrying the [`LineError`] so a
/// single bad row never blocks the rest of the batch. Their amount is zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WithdrawalRequest {
    address: String,
    amount: Decimal,
    raw_line: String,
    line_number: usize,
    parse_error: Option<LineError>,
}

impl WithdrawalRequest {
    /// Builds a well-formed request directly, bypassing text parsing.
    pub fn new(address: impl Into<String>, amount: Decimal) -> Self {
        let address = address.into();
        let raw_line = format!("{address}{FIELD_SEPARATOR}{amount}");
        Self {
            address,
            amount,
            raw_line,
            line_number: 0,
            parse_error: None,
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    /// The trimmed source line, kept for error reporting.
    pub fn raw_line(&self) -> &str {
        &self.raw_line
    }

    /// 1-based line number in the submitted text, or 0 for requests built in code.
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    pub fn parse_error(&self) -> Option<&LineError> {
        self.parse_error.as_ref()
    }

    pub fn is_well_formed(&self) -> bool {
        self.parse_error.is_none()
    }
}

/// Parses line-oriented `address,amount` input.
///
/// Blank lines are dropped; every other line yields exactly one request, in
/// input order.
pub fn parse(raw_text: &str) -> Vec<WithdrawalRequest> {
    raw_text
        .lines()
        .enumerate()
        .filter_map(|(idx, line)| {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(parse_line(trimmed, idx + 1))
            }
        })
        .collect()
}

fn parse_line(line: &str, line_number: usize) -> WithdrawalRequest {
    let fields: Vec<&str> = line.split(FIELD_SEPARATOR).map(str::trim).collect();
    let address = fields.first().copied().unwrap_or_default().to_owned();

    let parsed = match fields.as_slice() {
        [address, amount] => parse_fields(address, amount),
        _ => Err(LineError::FieldCount {
            found: fields.len(),
        }),
    };

    let (amount, parse_error) = match parsed {
        Ok(amount) => (amount, None),
        Err(err) => (Decimal::ZERO, Some(err)),
    };

    WithdrawalRequest {
        address,
        amount,
        raw_line: line.to_owned(),
        line_number,
        parse_error,
    }
}

fn parse_fields(address: &str, amount: &str) -> Result<Decimal, LineError> {
    if address.is_empty() {
        return Err(LineError::EmptyAddress);
    }

    let value = Decimal::from_str(amount).map_err(|_| LineError::InvalidAmount {
        value: amount.to_owned(),
    })?;

    if value.is_sign_negative() && !value.is_zero() {
        return Err(LineError::NegativeAmount {
            value: amount.to_owned(),
        });
    }

    Ok(value)
}
