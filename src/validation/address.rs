use super::ValidationError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

const FALLBACK_MIN_LEN: usize = 30;
const FALLBACK_MAX_LEN: usize = 100;

static EVM: Lazy<Regex> = Lazy::new(|| compile(r"^0x[a-fA-F0-9]{40}$"));
static SOLANA: Lazy<Regex> = Lazy::new(|| compile(r"^[1-9A-HJ-NP-Za-km-z]{32,44}$"));
static BTC: Lazy<Regex> =
    Lazy::new(|| compile(r"^[13][a-km-zA-HJ-NP-Z1-9]{25,34}$|^bc1[a-z0-9]{39,59}$"));
static BCH: Lazy<Regex> =
    Lazy::new(|| compile(r"^[13][a-km-zA-HJ-NP-Z1-9]{25,34}$|^bitcoincash:[qp][a-z0-9]{41}$"));
static LTC: Lazy<Regex> = Lazy::new(|| compile(r"^[LM3][a-km-zA-HJ-NP-Z1-9]{26,33}$"));
static TRX: Lazy<Regex> = Lazy::new(|| compile(r"^T[A-Za-z1-9]{33}$"));
static DOT: Lazy<Regex> = Lazy::new(|| compile(r"^[1-9A-HJ-NP-Za-km-z]{47,48}$"));
static ADA: Lazy<Regex> = Lazy::new(|| compile(r"^addr1[a-zA-Z0-9]{98}$"));

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("address patterns are valid regular expressions")
}

/// How strictly addresses are matched against the declared asset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AddressPolicy {
    /// EVM and Solana-style addresses pass for any asset, known assets must
    /// match their pattern, unknown assets pass on length alone.
    #[default]
    Lenient,
    /// Only the declared asset's own pattern is accepted; unknown assets fail.
    Strict,
}

/// Returns the pattern registered for `asset`, ignoring any `-NETWORK` suffix.
fn asset_pattern(asset: &str) -> Option<&'static Regex> {
    let base = asset.split('-').next().unwrap_or(asset).trim();
    let pattern = match base.to_ascii_uppercase().as_str() {
        "BTC" => &BTC,
        "BCH" => &BCH,
        "LTC" => &LTC,
        "ETH" | "USDT" | "AVAX" | "BNB" | "MATIC" | "ARB" | "OP" => &EVM,
        "SOL" => &SOLANA,
        "TRX" => &TRX,
        "DOT" => &DOT,
        "ADA" => &ADA,
        _ => return None,
    };
    Some(Lazy::force(pattern))
}

/// Checks `address` against the chain-family patterns for `asset`.
pub fn validate_address(
    address: &str,
    asset: &str,
    policy: AddressPolicy,
) -> Result<(), ValidationError> {
    let known = asset_pattern(asset);

    let accepted = match policy {
        AddressPolicy::Lenient => {
            if EVM.is_match(address) || SOLANA.is_match(address) {
                true
            } else if let Some(pattern) = known {
                pattern.is_match(address)
            } else {
                (FALLBACK_MIN_LEN..=FALLBACK_MAX_LEN).contains(&address.chars().count())
            }
        }
        AddressPolicy::Strict => known.is_some_and(|pattern| pattern.is_match(address)),
    };

    if accepted {
        Ok(())
    } else {
        Err(ValidationError::InvalidAddressFormat {
            asset: asset.to_owned(),
        })
    }
}
