//! Node and indexer access.
//!
//! [`LedgerClient`] is the narrow surface the batch pipeline depends on;
//! [`HttpLedger`] implements it over HTTP and adds the read-only account and
//! asset queries used for display.

use std::future::Future;

use async_trait::async_trait;
use enhancer_interface::{Address, AssetId, SuggestedParams, TransactionParamsResponse};
use reqwest::{header::CONTENT_TYPE, Client, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize};
use tracing::{debug, warn};

use crate::{
    error::EnhancerError,
    types::{
        AccountAsset, AccountSummary, AssetConfigTransaction, AssetRecord, AssetResponse, Network,
    },
};

/// Page size requested from the indexer; a shorter page ends a listing.
pub const PAGE_LIMIT: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct NodeStatus {
    #[serde(rename = "last-round")]
    pub last_round: u64,
}

/// Pool state of a submitted transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PendingTransaction {
    #[serde(rename = "confirmed-round", default)]
    pub confirmed_round: Option<u64>,
    #[serde(rename = "pool-error", default)]
    pub pool_error: String,
}

impl PendingTransaction {
    pub fn is_confirmed(&self) -> bool {
        self.confirmed_round.unwrap_or(0) > 0
    }
}

/// Ledger operations the batch pipeline needs.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    async fn suggested_params(&self) -> Result<SuggestedParams, EnhancerError>;

    /// Asset parameters, including assets that have since been destroyed.
    async fn asset(&self, asset_id: AssetId) -> Result<AssetRecord, EnhancerError>;

    /// Submits concatenated signed transactions; returns the first id.
    async fn send_raw_transaction(&self, signed: &[u8]) -> Result<String, EnhancerError>;

    async fn status(&self) -> Result<NodeStatus, EnhancerError>;

    /// Blocks until the node has seen a block after `round`.
    async fn status_after_block(&self, round: u64) -> Result<NodeStatus, EnhancerError>;

    async fn pending_transaction(&self, tx_id: &str) -> Result<PendingTransaction, EnhancerError>;
}

/// One page of an indexer listing.
#[derive(Debug)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_token: Option<String>,
}

/// Drains a paginated listing, following `next` tokens while pages are full.
pub async fn collect_pages<T, F, Fut>(mut fetch: F) -> Result<Vec<T>, EnhancerError>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<Page<T>, EnhancerError>>,
{
    let mut items = Vec::new();
    let mut token = None;
    loop {
        let page = fetch(token.take()).await?;
        let full = page.items.len() >= PAGE_LIMIT;
        items.extend(page.items);
        match page.next_token {
            Some(next) if full && !next.is_empty() => token = Some(next),
            _ => break,
        }
    }
    Ok(items)
}

#[derive(Deserialize)]
struct ListingResponse<T> {
    #[serde(default = "Vec::new")]
    assets: Vec<T>,
    #[serde(rename = "next-token", default)]
    next_token: Option<String>,
}

#[derive(Deserialize)]
struct TransactionsResponse {
    #[serde(default)]
    transactions: Vec<AssetConfigTransaction>,
    #[serde(rename = "next-token", default)]
    next_token: Option<String>,
}

#[derive(Deserialize)]
struct SingleAssetResponse {
    asset: AssetResponse,
}

#[derive(Deserialize)]
struct SendResponse {
    #[serde(rename = "txId")]
    tx_id: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// HTTP client for a node and an indexer of one network.
#[derive(Debug, Clone)]
pub struct HttpLedger {
    http: Client,
    node_url: String,
    indexer_url: String,
}

impl HttpLedger {
    pub fn new(network: Network) -> Self {
        Self::with_urls(network.node_url(), network.indexer_url())
    }

    pub fn with_urls(node_url: impl Into<String>, indexer_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            node_url: node_url.into().trim_end_matches('/').to_string(),
            indexer_url: indexer_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn node_url(&self) -> &str {
        &self.node_url
    }

    pub fn indexer_url(&self) -> &str {
        &self.indexer_url
    }

    /// Balance and asset counters of an account.
    pub async fn account(&self, address: &Address) -> Result<AccountSummary, EnhancerError> {
        self.get_json(format!("{}/v2/accounts/{}?exclude=all", self.node_url, address))
            .await
    }

    /// Every asset the account holds, most recently opted-in first.
    pub async fn account_assets(
        &self,
        address: &Address,
    ) -> Result<Vec<AccountAsset>, EnhancerError> {
        let base = format!(
            "{}/v2/accounts/{}/assets?include-all=false&limit={}",
            self.indexer_url, address, PAGE_LIMIT
        );
        let mut assets = collect_pages(|token| {
            let url = page_url(&base, token);
            async move {
                let listing: ListingResponse<AccountAsset> = self.get_json(url).await?;
                Ok(Page {
                    items: listing.assets,
                    next_token: listing.next_token,
                })
            }
        })
        .await?;
        assets.sort_by(|a, b| b.opted_in_at_round.cmp(&a.opted_in_at_round));
        Ok(assets)
    }

    /// Every asset the account created.
    pub async fn created_assets(
        &self,
        address: &Address,
    ) -> Result<Vec<AssetRecord>, EnhancerError> {
        let base = format!(
            "{}/v2/accounts/{}/created-assets?include-all=false&limit={}",
            self.indexer_url, address, PAGE_LIMIT
        );
        let assets = collect_pages(|token| {
            let url = page_url(&base, token);
            async move {
                let listing: ListingResponse<AssetResponse> = self.get_json(url).await?;
                Ok(Page {
                    items: listing.assets,
                    next_token: listing.next_token,
                })
            }
        })
        .await?;
        Ok(assets.into_iter().map(AssetRecord::from).collect())
    }

    /// Configuration history of an asset.
    pub async fn asset_config_transactions(
        &self,
        asset_id: AssetId,
    ) -> Result<Vec<AssetConfigTransaction>, EnhancerError> {
        let base = format!(
            "{}/v2/assets/{}/transactions?tx-type=acfg&limit={}",
            self.indexer_url, asset_id, PAGE_LIMIT
        );
        collect_pages(|token| {
            let url = page_url(&base, token);
            async move {
                let response: TransactionsResponse = self.get_json(url).await?;
                Ok(Page {
                    items: response.transactions,
                    next_token: response.next_token,
                })
            }
        })
        .await
    }

    async fn get_json<T: DeserializeOwned>(&self, url: String) -> Result<T, EnhancerError> {
        debug!(%url, "GET");
        let response = self.http.get(&url).send().await?;
        let response = check_status(response).await?;
        Ok(response.json::<T>().await?)
    }
}

fn page_url(base: &str, token: Option<String>) -> String {
    match token {
        Some(token) => format!("{}&next={}", base, token),
        None => base.to_string(),
    }
}

async fn check_status(response: Response) -> Result<Response, EnhancerError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .map(|b| b.message)
        .unwrap_or(body);
    Err(EnhancerError::Api {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl LedgerClient for HttpLedger {
    async fn suggested_params(&self) -> Result<SuggestedParams, EnhancerError> {
        let response: TransactionParamsResponse = self
            .get_json(format!("{}/v2/transactions/params", self.node_url))
            .await?;
        Ok(SuggestedParams::try_from(response)?)
    }

    async fn asset(&self, asset_id: AssetId) -> Result<AssetRecord, EnhancerError> {
        let url = format!("{}/v2/assets/{}?include-all=true", self.indexer_url, asset_id);
        match self.get_json::<SingleAssetResponse>(url).await {
            Ok(response) => Ok(response.asset.into()),
            Err(EnhancerError::Api { status, .. }) if status == StatusCode::NOT_FOUND.as_u16() => {
                Err(EnhancerError::AssetNotFound(asset_id))
            },
            Err(e) => Err(e),
        }
    }

    async fn send_raw_transaction(&self, signed: &[u8]) -> Result<String, EnhancerError> {
        let url = format!("{}/v2/transactions", self.node_url);
        let response = self
            .http
            .post(&url)
            .header(CONTENT_TYPE, "application/x-binary")
            .body(signed.to_vec())
            .send()
            .await?;

        match check_status(response).await {
            Ok(response) => Ok(response.json::<SendResponse>().await?.tx_id),
            Err(EnhancerError::Api { status, message }) if status < 500 => {
                warn!(status, %message, "node rejected transaction");
                Err(EnhancerError::NodeRejected(message))
            },
            Err(e) => Err(e),
        }
    }

    async fn status(&self) -> Result<NodeStatus, EnhancerError> {
        self.get_json(format!("{}/v2/status", self.node_url)).await
    }

    async fn status_after_block(&self, round: u64) -> Result<NodeStatus, EnhancerError> {
        self.get_json(format!(
            "{}/v2/status/wait-for-block-after/{}",
            self.node_url, round
        ))
        .await
    }

    async fn pending_transaction(&self, tx_id: &str) -> Result<PendingTransaction, EnhancerError> {
        self.get_json(format!(
            "{}/v2/transactions/pending/{}?format=json",
            self.node_url, tx_id
        ))
        .await
    }
}
