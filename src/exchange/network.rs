use serde::Serialize;

/// Default network per asset when the caller does not pick one.
const DEFAULT_NETWORKS: &[(&str, &str)] = &[
    ("ETH", "ERC20"),
    ("BTC", "Bitcoin"),
    ("BSC", "BSC"),
    ("TRX", "TRC20"),
    ("SOL", "Solana"),
    ("AVAX", "AVAX-C"),
    ("MATIC", "Polygon"),
    ("POL", "Polygon"),
    ("ARBITRUM", "Arbitrum One"),
    ("OP", "Optimism"),
    ("FTM", "Fantom"),
    ("KLAY", "Klaytn"),
    ("ONE", "Harmony"),
    ("CELO", "Celo"),
    ("AURORA", "Aurora"),
    ("ALGO", "Algorand"),
    ("NEAR", "NEAR"),
    ("ADA", "Cardano"),
    ("XRP", "Ripple"),
    ("DOT", "Polkadot"),
    ("ATOM", "Cosmos"),
    ("USDT", "ERC20"),
    ("USDC", "ERC20"),
    ("UNI", "ERC20"),
    ("LINK", "ERC20"),
    ("AAVE", "ERC20"),
    ("CAKE", "BSC"),
    ("QUICK", "Polygon"),
    ("JOE", "AVAX-C"),
    ("GMX", "Arbitrum One"),
];

/// Assets that can only be withdrawn over one fixed chain identifier.
const PINNED_CHAINS: &[(&str, &str)] = &[("POL", "POL-Polygon")];

/// A selectable network for an asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NetworkOption {
    pub value: &'static str,
    pub label: &'static str,
}

const fn option(value: &'static str, label: &'static str) -> NetworkOption {
    NetworkOption { value, label }
}

const USDT_NETWORKS: &[NetworkOption] = &[
    option("ERC20", "ERC20 (ETH)"),
    option("TRC20", "TRC20 (TRON)"),
    option("BSC", "BSC (BNB Chain)"),
    option("Polygon", "Polygon (MATIC)"),
    option("AVAX-C", "Avalanche C-Chain"),
    option("Arbitrum One", "Arbitrum"),
    option("Optimism", "Optimism"),
    option("Solana", "Solana"),
];

const USDC_NETWORKS: &[NetworkOption] = &[
    option("ERC20", "ERC20 (ETH)"),
    option("TRC20", "TRC20 (TRON)"),
    option("BSC", "BSC (BNB Chain)"),
    option("Polygon", "Polygon (MATIC)"),
];

const POL_NETWORKS: &[NetworkOption] = &[option("Polygon", "Polygon")];

/// Currency plus chain-qualified identifier sent with a withdrawal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChainId {
    pub currency: String,
    pub chain: String,
}

/// Networks offered for `asset`. Assets without a curated list only offer
/// their native network, reported as an empty slice.
pub fn network_options(asset: &str) -> &'static [NetworkOption] {
    match normalize(asset).as_str() {
        "USDT" => USDT_NETWORKS,
        "USDC" => USDC_NETWORKS,
        "POL" => POL_NETWORKS,
        _ => &[],
    }
}

/// Builds the chain-qualified identifier for `asset`.
///
/// Pinned assets always use their fixed chain. Otherwise an explicit network
/// wins, then the default-network table; unknown assets are sent as-is.
pub fn resolve_chain(asset: &str, network: Option<&str>) -> ChainId {
    let currency = normalize(asset);

    if let Some((_, chain)) = PINNED_CHAINS.iter().find(|(pinned, _)| *pinned == currency) {
        return ChainId {
            chain: (*chain).to_owned(),
            currency,
        };
    }

    let network = network
        .map(str::trim)
        .filter(|network| !network.is_empty())
        .or_else(|| default_network(&currency));

    let chain = match network {
        Some(network) => format!("{currency}-{network}"),
        None => currency.clone(),
    };

    ChainId { currency, chain }
}

fn default_network(currency: &str) -> Option<&'static str> {
    DEFAULT_NETWORKS
        .iter()
        .find(|(asset, _)| *asset == currency)
        .map(|(_, network)| *network)
}

/// Upper-cases the asset and strips any `-NETWORK` suffix.
fn normalize(asset: &str) -> String {
    asset
        .split('-')
        .next()
        .unwrap_or(asset)
        .trim()
        .to_ascii_uppercase()
}
