//! Turns an [`Operation`] over selected assets into transaction groups.
//!
//! Every logical unit of a batch (one asset, or one transfer pair) becomes
//! one [`TransactionGroup`]. Multi-member groups are bound by a group id so
//! the ledger commits all members or none.

use enhancer_interface::{
    assign_group_id, Address, AssetId, AssetTransfer, GroupId, SuggestedParams, Transaction,
    TX_NOTE,
};
use tracing::{debug, warn};

use crate::{
    asset_cache::AssetCache,
    error::EnhancerError,
    rpc::LedgerClient,
    types::{check_amount, scale_amount, Operation, TransferIntent},
};

/// Ordered transactions committed atomically.
///
/// A group of more than one member carries the same group id on every
/// member; a single transaction carries none.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionGroup {
    transactions: Vec<Transaction>,
    group_id: Option<GroupId>,
}

impl TransactionGroup {
    pub fn new(mut transactions: Vec<Transaction>) -> Result<Self, EnhancerError> {
        let group_id = assign_group_id(&mut transactions)?;
        Ok(Self {
            transactions,
            group_id,
        })
    }

    pub fn single(transaction: Transaction) -> Result<Self, EnhancerError> {
        Self::new(vec![transaction])
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn group_id(&self) -> Option<GroupId> {
        self.group_id
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    /// Unsigned encodings of the members, in order.
    pub fn encode(&self) -> Result<Vec<Vec<u8>>, EnhancerError> {
        self.transactions
            .iter()
            .map(|txn| txn.encode().map_err(EnhancerError::from))
            .collect()
    }
}

/// The group built for one asset of a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedUnit {
    pub asset_id: AssetId,
    pub group: TransactionGroup,
}

/// An asset left out of a batch because its parameters could not be used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedAsset {
    pub asset_id: AssetId,
    pub reason: String,
}

/// Everything the factory produced for one batch, in selection order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchPlan {
    pub units: Vec<PlannedUnit>,
    pub skipped: Vec<SkippedAsset>,
}

impl BatchPlan {
    pub fn asset_ids(&self) -> Vec<AssetId> {
        self.units.iter().map(|unit| unit.asset_id).collect()
    }

    fn skip(&mut self, asset_id: AssetId, reason: impl Into<String>) {
        let reason = reason.into();
        warn!(asset_id, %reason, "skipping asset");
        self.skipped.push(SkippedAsset { asset_id, reason });
    }
}

/// Checks shared by every operation, in order: selection present, within
/// the operation's limit, real asset ids, a signer connected and, for the
/// transfer kinds, a usable amount. Nothing here touches the network.
pub fn validate_selection(
    operation: &Operation,
    asset_ids: &[AssetId],
    signer: Option<Address>,
) -> Result<Address, EnhancerError> {
    if asset_ids.is_empty() {
        return Err(EnhancerError::EmptySelection);
    }
    let max = operation.max_selection();
    if asset_ids.len() > max {
        return Err(EnhancerError::SelectionTooLarge { max });
    }
    if asset_ids.contains(&0) {
        return Err(EnhancerError::InvalidAssetId(0));
    }
    let signer = signer.ok_or(EnhancerError::NoWallet)?;
    if let Some(amount) = operation.amount() {
        check_amount(amount)?;
    }
    Ok(signer)
}

/// Builds transaction groups. Asset parameters come from the session cache,
/// with the ledger as fallback.
pub struct TransactionFactory<'a> {
    ledger: &'a dyn LedgerClient,
    note: Vec<u8>,
}

impl<'a> TransactionFactory<'a> {
    pub fn new(ledger: &'a dyn LedgerClient) -> Self {
        Self {
            ledger,
            note: TX_NOTE.as_bytes().to_vec(),
        }
    }

    pub fn note(&self) -> &[u8] {
        &self.note
    }

    /// Validates the selection and builds one unit per usable asset.
    ///
    /// Assets whose creator or decimals cannot be resolved, or whose
    /// decimals cannot hold the amount, are skipped and reported in
    /// [`BatchPlan::skipped`].
    pub async fn build(
        &self,
        cache: &mut AssetCache,
        operation: &Operation,
        asset_ids: &[AssetId],
        signer: Option<Address>,
    ) -> Result<BatchPlan, EnhancerError> {
        let signer = validate_selection(operation, asset_ids, signer)?;
        let params = self.ledger.suggested_params().await?;
        debug!(
            operation = operation.name(),
            assets = asset_ids.len(),
            first_valid = params.first_valid,
            "building batch"
        );

        let mut plan = BatchPlan::default();
        match operation {
            Operation::OptIn => {
                for &asset_id in asset_ids {
                    let group = self.opt_in(&params, signer, asset_id)?;
                    plan.units.push(PlannedUnit { asset_id, group });
                }
            },
            Operation::OptOut => {
                for &asset_id in asset_ids {
                    let close_to = match cache.resolve(self.ledger, asset_id).await {
                        Ok(record) if record.deleted => signer,
                        Ok(record) => match record.creator_address() {
                            Some(creator) => creator,
                            None => {
                                plan.skip(asset_id, "creator not found");
                                continue;
                            },
                        },
                        Err(e) => {
                            plan.skip(asset_id, e.to_string());
                            continue;
                        },
                    };
                    let group = self.opt_out(&params, signer, asset_id, close_to)?;
                    plan.units.push(PlannedUnit { asset_id, group });
                }
            },
            Operation::Destroy => {
                for &asset_id in asset_ids {
                    match cache.resolve(self.ledger, asset_id).await {
                        Ok(record) if record.creator.trim().is_empty() => {
                            plan.skip(asset_id, "creator not found");
                            continue;
                        },
                        Ok(_) => {},
                        Err(e) => {
                            plan.skip(asset_id, e.to_string());
                            continue;
                        },
                    }
                    let group = self.destroy(&params, signer, asset_id)?;
                    plan.units.push(PlannedUnit { asset_id, group });
                }
            },
            Operation::Send { amount, receiver } => {
                let intents = self
                    .intents(cache, &mut plan, asset_ids, amount, *receiver)
                    .await;
                for intent in intents {
                    let group = self.send(&params, signer, &intent)?;
                    plan.units.push(PlannedUnit {
                        asset_id: intent.asset_id,
                        group,
                    });
                }
            },
            Operation::Transfer { amount, receiver } => {
                let intents = self
                    .intents(cache, &mut plan, asset_ids, amount, *receiver)
                    .await;
                for intent in intents {
                    let group = self.transfer(&params, signer, &intent)?;
                    plan.units.push(PlannedUnit {
                        asset_id: intent.asset_id,
                        group,
                    });
                }
            },
        }
        Ok(plan)
    }

    /// Scales `amount` by each asset's decimals.
    async fn intents(
        &self,
        cache: &mut AssetCache,
        plan: &mut BatchPlan,
        asset_ids: &[AssetId],
        amount: &str,
        receiver: Address,
    ) -> Vec<TransferIntent> {
        let mut intents = Vec::with_capacity(asset_ids.len());
        for &asset_id in asset_ids {
            let scaled = match cache.resolve(self.ledger, asset_id).await {
                Ok(record) => scale_amount(amount, record.decimals),
                Err(e) => Err(e),
            };
            match scaled {
                Ok(amount) => intents.push(TransferIntent {
                    asset_id,
                    amount,
                    receiver,
                }),
                Err(e) => plan.skip(asset_id, e.to_string()),
            }
        }
        intents
    }

    /// Zero-amount transfer to self.
    pub fn opt_in(
        &self,
        params: &SuggestedParams,
        signer: Address,
        asset_id: AssetId,
    ) -> Result<TransactionGroup, EnhancerError> {
        TransactionGroup::single(self.self_transfer(params, signer, asset_id)?)
    }

    /// Zero-amount transfer to `close_to` that also closes any remaining
    /// balance to it.
    pub fn opt_out(
        &self,
        params: &SuggestedParams,
        signer: Address,
        asset_id: AssetId,
        close_to: Address,
    ) -> Result<TransactionGroup, EnhancerError> {
        let txn = Transaction::asset_transfer(
            AssetTransfer {
                sender: signer,
                receiver: close_to,
                amount: 0,
                asset_id,
                close_remainder_to: Some(close_to),
            },
            params,
            &self.note,
        )?;
        TransactionGroup::single(txn)
    }

    pub fn destroy(
        &self,
        params: &SuggestedParams,
        signer: Address,
        asset_id: AssetId,
    ) -> Result<TransactionGroup, EnhancerError> {
        TransactionGroup::single(Transaction::asset_destroy(
            signer,
            asset_id,
            params,
            &self.note,
        )?)
    }

    pub fn send(
        &self,
        params: &SuggestedParams,
        signer: Address,
        intent: &TransferIntent,
    ) -> Result<TransactionGroup, EnhancerError> {
        TransactionGroup::single(self.transfer_leg(params, signer, intent)?)
    }

    /// Receiver opt-in followed by the transfer, bound into one group.
    pub fn transfer(
        &self,
        params: &SuggestedParams,
        signer: Address,
        intent: &TransferIntent,
    ) -> Result<TransactionGroup, EnhancerError> {
        let opt_in = self.self_transfer(params, intent.receiver, intent.asset_id)?;
        let transfer = self.transfer_leg(params, signer, intent)?;
        TransactionGroup::new(vec![opt_in, transfer])
    }

    fn self_transfer(
        &self,
        params: &SuggestedParams,
        account: Address,
        asset_id: AssetId,
    ) -> Result<Transaction, EnhancerError> {
        Ok(Transaction::asset_transfer(
            AssetTransfer {
                sender: account,
                receiver: account,
                amount: 0,
                asset_id,
                close_remainder_to: None,
            },
            params,
            &self.note,
        )?)
    }

    fn transfer_leg(
        &self,
        params: &SuggestedParams,
        signer: Address,
        intent: &TransferIntent,
    ) -> Result<Transaction, EnhancerError> {
        if intent.amount == 0 {
            return Err(EnhancerError::InvalidAmount(intent.amount.to_string()));
        }
        Ok(Transaction::asset_transfer(
            AssetTransfer {
                sender: signer,
                receiver: intent.receiver,
                amount: intent.amount,
                asset_id: intent.asset_id,
                close_remainder_to: None,
            },
            params,
            &self.note,
        )?)
    }
}
