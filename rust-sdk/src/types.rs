use enhancer_interface::{Address, AssetId};
use serde::{Deserialize, Serialize};

use crate::error::EnhancerError;

/// Maximum number of assets a single batch may act on.
pub const MAX_SELECT_COUNT: usize = 64;

/// Transfer groups hold two transactions each, so half as many fit.
pub const MAX_TRANSFER_COUNT: usize = MAX_SELECT_COUNT / 2;

/// Network the client talks to; decides every endpoint base URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    #[default]
    Mainnet,
    Testnet,
}

impl Network {
    pub fn node_url(&self) -> &'static str {
        match self {
            Network::Mainnet => "https://mainnet-api.algonode.cloud",
            Network::Testnet => "https://testnet-api.algonode.cloud",
        }
    }

    pub fn indexer_url(&self) -> &'static str {
        match self {
            Network::Mainnet => "https://mainnet-idx.algonode.cloud",
            Network::Testnet => "https://testnet-idx.algonode.cloud",
        }
    }

    /// Explorer page for a collectible asset.
    pub fn asset_explorer_url(&self, asset_id: AssetId) -> String {
        match self {
            Network::Mainnet => format!("https://www.nftexplorer.app/asset/{}", asset_id),
            Network::Testnet => format!("https://testnet.explorer.perawallet.app/assets/{}", asset_id),
        }
    }

    /// Explorer page for a fungible token.
    pub fn token_explorer_url(&self, asset_id: AssetId) -> String {
        match self {
            Network::Mainnet => format!("https://algoexplorer.io/asset/{}", asset_id),
            Network::Testnet => format!("https://testnet.algoexplorer.io/asset/{}", asset_id),
        }
    }
}

impl std::str::FromStr for Network {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mainnet" => Ok(Network::Mainnet),
            "testnet" => Ok(Network::Testnet),
            other => Err(format!("unknown network: {}", other)),
        }
    }
}

/// Asset parameters as cached by the client.
///
/// Records are replaced as a whole when re-fetched, never patched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetRecord {
    pub id: AssetId,
    /// Empty when the ledger no longer reports a creator.
    pub creator: String,
    pub manager: String,
    pub decimals: u32,
    pub total_supply: u64,
    pub name: String,
    pub unit_name: String,
    pub url: String,
    pub reserve: String,
    pub deleted: bool,
}

impl AssetRecord {
    /// The creator as an address, if it is present and well formed.
    pub fn creator_address(&self) -> Option<Address> {
        let creator = self.creator.trim();
        if creator.is_empty() {
            return None;
        }
        creator.parse().ok()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AssetParamsResponse {
    #[serde(default)]
    pub creator: String,
    #[serde(default)]
    pub decimals: u32,
    #[serde(default)]
    pub manager: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub reserve: String,
    #[serde(default)]
    pub total: u64,
    #[serde(rename = "unit-name", default)]
    pub unit_name: String,
    #[serde(default)]
    pub url: String,
}

/// Asset entry as returned by the indexer.
#[derive(Debug, Clone, Deserialize)]
pub struct AssetResponse {
    pub index: AssetId,
    #[serde(rename = "created-at-round", default)]
    pub created_at_round: Option<u64>,
    #[serde(default)]
    pub deleted: bool,
    #[serde(default)]
    pub params: AssetParamsResponse,
}

impl From<AssetResponse> for AssetRecord {
    fn from(response: AssetResponse) -> Self {
        let params = response.params;
        Self {
            id: response.index,
            creator: params.creator,
            manager: params.manager,
            decimals: params.decimals,
            total_supply: params.total,
            name: params.name,
            unit_name: params.unit_name,
            url: params.url,
            reserve: params.reserve,
            deleted: response.deleted,
        }
    }
}

/// Account summary from `GET /v2/accounts/{addr}?exclude=all`.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountSummary {
    pub amount: u64,
    #[serde(rename = "min-balance", default)]
    pub min_balance: u64,
    #[serde(rename = "total-assets-opted-in", default)]
    pub total_assets_opted_in: u64,
    #[serde(rename = "total-created-assets", default)]
    pub total_created_assets: u64,
}

/// One asset holding of an account.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AccountAsset {
    pub amount: u64,
    #[serde(rename = "asset-id")]
    pub asset_id: AssetId,
    #[serde(rename = "opted-in-at-round", default)]
    pub opted_in_at_round: u64,
}

/// A confirmed asset-config transaction carrying a base64 note.
#[derive(Debug, Clone, Deserialize)]
pub struct AssetConfigTransaction {
    #[serde(rename = "confirmed-round", default)]
    pub confirmed_round: u64,
    #[serde(default)]
    pub note: String,
}

/// One transfer of a Send or Transfer batch, amount already in base units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferIntent {
    pub asset_id: AssetId,
    pub amount: u64,
    pub receiver: Address,
}

/// What a batch does to the selected assets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    OptIn,
    OptOut,
    Destroy,
    /// Direct transfer of every selected asset to one receiver.
    Send { amount: String, receiver: Address },
    /// Receiver opt-in and transfer bound in one atomic group per asset.
    Transfer { amount: String, receiver: Address },
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Operation::OptIn => "opt-in",
            Operation::OptOut => "opt-out",
            Operation::Destroy => "destroy",
            Operation::Send { .. } => "send",
            Operation::Transfer { .. } => "transfer",
        }
    }

    /// Amount text of the transfer kinds.
    pub fn amount(&self) -> Option<&str> {
        match self {
            Operation::Send { amount, .. } | Operation::Transfer { amount, .. } => {
                Some(amount.as_str())
            },
            _ => None,
        }
    }

    pub fn max_selection(&self) -> usize {
        match self {
            Operation::Transfer { .. } => MAX_TRANSFER_COUNT,
            _ => MAX_SELECT_COUNT,
        }
    }

    /// Whether a confirmed unit also leaves the displayed asset list.
    pub fn evicts_from_display(&self) -> bool {
        matches!(self, Operation::OptOut | Operation::Destroy)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeStatus {
    Success,
    Failed,
}

/// Result of one submitted unit of a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOutcome {
    pub asset_id: AssetId,
    pub status: OutcomeStatus,
    /// Confirmed transaction id on success.
    pub tx_id: Option<String>,
    /// User-facing reason on failure.
    pub error: Option<String>,
}

impl BatchOutcome {
    pub fn success(asset_id: AssetId, tx_id: String) -> Self {
        Self {
            asset_id,
            status: OutcomeStatus::Success,
            tx_id: Some(tx_id),
            error: None,
        }
    }

    pub fn failed(asset_id: AssetId, error: &EnhancerError) -> Self {
        Self {
            asset_id,
            status: OutcomeStatus::Failed,
            tx_id: None,
            error: Some(error.user_message()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == OutcomeStatus::Success
    }
}

/// Scales a user-entered decimal amount to base units.
///
/// Exact decimal arithmetic: `"1.5"` with 2 decimals is `150`. Zero,
/// negative, malformed, over-precise and overflowing input is rejected.
pub fn scale_amount(text: &str, decimals: u32) -> Result<u64, EnhancerError> {
    let invalid = || EnhancerError::InvalidAmount(text.to_string());
    let trimmed = text.trim();
    let (whole, fraction) = match trimmed.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (trimmed, ""),
    };
    if whole.is_empty() && fraction.is_empty() {
        return Err(invalid());
    }
    if !whole.chars().all(|c| c.is_ascii_digit()) || !fraction.chars().all(|c| c.is_ascii_digit())
    {
        return Err(invalid());
    }

    let fraction = fraction.trim_end_matches('0');
    if fraction.len() > decimals as usize {
        return Err(invalid());
    }

    let scale = 10u64.checked_pow(decimals).ok_or_else(invalid)?;
    let whole_units = if whole.is_empty() {
        0
    } else {
        whole.parse::<u64>().map_err(|_| invalid())?
    };
    let fraction_units = if fraction.is_empty() {
        0
    } else {
        let padding = 10u64
            .checked_pow(decimals - fraction.len() as u32)
            .ok_or_else(invalid)?;
        fraction
            .parse::<u64>()
            .map_err(|_| invalid())?
            .checked_mul(padding)
            .ok_or_else(invalid)?
    };

    let amount = whole_units
        .checked_mul(scale)
        .and_then(|units| units.checked_add(fraction_units))
        .ok_or_else(invalid)?;
    if amount == 0 {
        return Err(invalid());
    }
    Ok(amount)
}

/// Checks that `text` is a positive decimal amount some asset could hold.
///
/// Uses the smallest precision the text needs, so any failure here fails
/// for every decimals value too.
pub fn check_amount(text: &str) -> Result<(), EnhancerError> {
    let precision = text
        .trim()
        .split_once('.')
        .map_or(0, |(_, fraction)| fraction.trim_end_matches('0').len());
    let precision =
        u32::try_from(precision).map_err(|_| EnhancerError::InvalidAmount(text.to_string()))?;
    scale_amount(text, precision).map(|_| ())
}

/// How an asset's media is published, judged from its URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetStandard {
    /// Template URL resolved through the reserve address.
    Arc19,
    /// URL pointing at a JSON metadata file.
    Arc3,
    /// Media URL with metadata in the latest config note.
    Arc69,
    /// No IPFS-hosted media.
    Unknown,
}

impl AssetStandard {
    pub fn classify(url: &str) -> Self {
        if url.is_empty() || !url.contains("ipfs") {
            return AssetStandard::Unknown;
        }
        if url.starts_with("template-ipfs") {
            AssetStandard::Arc19
        } else if url.ends_with("#arc3") {
            AssetStandard::Arc3
        } else {
            AssetStandard::Arc69
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AssetStandard::Arc19 => "ARC19",
            AssetStandard::Arc3 => "ARC3",
            AssetStandard::Arc69 => "ARC69",
            AssetStandard::Unknown => "-",
        }
    }
}
