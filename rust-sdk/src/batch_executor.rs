//! # BatchExecutor
//!
//! Runs an [`Operation`] over a list of selected assets, one logical unit at
//! a time: build, sign, submit, confirm, then update the session.
//!
//! ## Overview
//!
//! Units are processed strictly in selection order and never concurrently,
//! since providers serialize approval prompts. A unit that fails does not
//! stop the ones after it; every unit ends with a [`BatchOutcome`]. A batch
//! that cannot be built at all starts no unit and is reported through
//! [`BatchReport::aborted`].
//!
//! Per unit the states move forward only:
//!
//! ```text
//! Pending -> Signing -> Submitted -> Confirmed
//!               |            |
//!               +-> Failed <-+
//! ```
//!
//! The transfer flow is split in two phases. [`BatchExecutor::create_transfer`]
//! signs every pair and returns a [`TransferStage`] without submitting
//! anything; [`BatchExecutor::send_transfer`] consumes the stage and submits
//! each pair as one broadcast, in the original order.
//!
//! ## Example
//!
//! ```no_run
//! use enhancer_sdk::{BatchExecutor, HttpLedger, Network, Operation, SessionState, SigningGateway};
//!
//! # async fn example(gateway: &SigningGateway) -> Result<(), enhancer_sdk::EnhancerError> {
//! let ledger = HttpLedger::new(Network::Testnet);
//! let mut session = SessionState::new();
//! session.selection.toggle(31566704);
//!
//! let ids = session.selection.ids().to_vec();
//! let executor = BatchExecutor::new(&ledger, gateway);
//! let report = executor.run(&mut session, &Operation::OptIn, &ids).await?;
//!
//! println!("Successful: {}, Failed: {}", report.successful_count(), report.failed_count());
//! # Ok(())
//! # }
//! ```

use enhancer_interface::{Address, AssetId, GroupId};
use tracing::{debug, info, warn};

use crate::{
    broadcaster::{Broadcaster, DEFAULT_CONFIRMATION_ROUNDS},
    error::EnhancerError,
    rpc::LedgerClient,
    session::SessionState,
    signing::{SignedPayload, SigningGateway},
    transaction_factory::{
        validate_selection, BatchPlan, PlannedUnit, SkippedAsset, TransactionFactory,
        TransactionGroup,
    },
    types::{BatchOutcome, Operation},
};

// ============================================================================
// Configuration & Types
// ============================================================================

/// Configuration for batch execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchConfig {
    /// Rounds the broadcaster waits for each group to confirm.
    pub confirmation_rounds: u64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            confirmation_rounds: DEFAULT_CONFIRMATION_ROUNDS,
        }
    }
}

impl BatchConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the confirmation bound. At least one round is always awaited.
    pub fn with_confirmation_rounds(mut self, rounds: u64) -> Self {
        self.confirmation_rounds = rounds.max(1);
        self
    }
}

/// Lifecycle of one unit of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum UnitState {
    Pending,
    Signing,
    Submitted,
    Confirmed,
    Failed,
}

/// A recorded state change of one unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitTransition {
    pub asset_id: AssetId,
    pub from: UnitState,
    pub to: UnitState,
}

/// Complete result of a batch run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// One entry per processed unit, in processing order.
    pub outcomes: Vec<BatchOutcome>,
    /// Assets left out while building the batch.
    pub skipped: Vec<SkippedAsset>,
    /// Every state change, in the order it happened.
    pub transitions: Vec<UnitTransition>,
    /// Set when the batch could not be built. No unit was started and the
    /// selection is left as it was.
    pub aborted: Option<String>,
}

impl BatchReport {
    /// Returns true if the batch was built and every processed unit
    /// succeeded.
    pub fn is_success(&self) -> bool {
        self.aborted.is_none() && self.outcomes.iter().all(BatchOutcome::is_success)
    }

    pub fn successful_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.outcomes.len() - self.successful_count()
    }

    pub fn successful_ids(&self) -> Vec<AssetId> {
        self.outcomes
            .iter()
            .filter(|o| o.is_success())
            .map(|o| o.asset_id)
            .collect()
    }

    pub fn failed_ids(&self) -> Vec<AssetId> {
        self.outcomes
            .iter()
            .filter(|o| !o.is_success())
            .map(|o| o.asset_id)
            .collect()
    }

    /// States a unit went through, starting with `Pending`.
    pub fn states_of(&self, asset_id: AssetId) -> Vec<UnitState> {
        let mut states = Vec::new();
        for t in self.transitions.iter().filter(|t| t.asset_id == asset_id) {
            if states.is_empty() {
                states.push(t.from);
            }
            states.push(t.to);
        }
        states
    }

    fn transition(&mut self, asset_id: AssetId, from: UnitState, to: UnitState) {
        debug!(asset_id, ?from, ?to, "unit transition");
        self.transitions.push(UnitTransition { asset_id, from, to });
    }

    fn fail(&mut self, asset_id: AssetId, from: UnitState, error: &EnhancerError) {
        let outcome = self.record_failure(asset_id, from, error);
        self.outcomes.push(outcome);
    }

    fn record_failure(
        &mut self,
        asset_id: AssetId,
        from: UnitState,
        error: &EnhancerError,
    ) -> BatchOutcome {
        self.transition(asset_id, from, UnitState::Failed);
        warn!(asset_id, error = %error, "unit failed");
        BatchOutcome::failed(asset_id, error)
    }

    fn succeed(&mut self, asset_id: AssetId, tx_id: String) {
        self.transition(asset_id, UnitState::Submitted, UnitState::Confirmed);
        info!(asset_id, %tx_id, "unit confirmed");
        self.outcomes.push(BatchOutcome::success(asset_id, tx_id));
    }
}

/// A signed transfer pair waiting to be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedTransfer {
    pub asset_id: AssetId,
    pub group_id: Option<GroupId>,
    pub payloads: Vec<SignedPayload>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum StageEntry {
    Ready(StagedTransfer),
    Failed(BatchOutcome),
}

/// Result of the create phase of a transfer: signed pairs plus the pairs
/// that could not be signed, in selection order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferStage {
    receiver: Address,
    entries: Vec<StageEntry>,
    skipped: Vec<SkippedAsset>,
    transitions: Vec<UnitTransition>,
    aborted: Option<String>,
}

impl TransferStage {
    pub fn receiver(&self) -> Address {
        self.receiver
    }

    /// Pairs ready to be sent.
    pub fn staged(&self) -> impl Iterator<Item = &StagedTransfer> {
        self.entries.iter().filter_map(|entry| match entry {
            StageEntry::Ready(staged) => Some(staged),
            StageEntry::Failed(_) => None,
        })
    }

    /// Pairs that failed to sign.
    pub fn failures(&self) -> impl Iterator<Item = &BatchOutcome> {
        self.entries.iter().filter_map(|entry| match entry {
            StageEntry::Failed(outcome) => Some(outcome),
            StageEntry::Ready(_) => None,
        })
    }

    /// Number of pairs ready to be sent.
    pub fn len(&self) -> usize {
        self.staged().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn skipped(&self) -> &[SkippedAsset] {
        &self.skipped
    }

    /// Why no pair could be built, if the batch failed as a whole.
    pub fn aborted(&self) -> Option<&str> {
        self.aborted.as_deref()
    }
}

// ============================================================================
// BatchExecutor
// ============================================================================

/// Orchestrates factory, gateway and broadcaster over a batch.
///
/// The session is borrowed mutably for the whole run, so two runs over the
/// same session cannot overlap.
pub struct BatchExecutor<'a> {
    ledger: &'a dyn LedgerClient,
    gateway: &'a SigningGateway,
    config: BatchConfig,
}

impl<'a> BatchExecutor<'a> {
    pub fn new(ledger: &'a dyn LedgerClient, gateway: &'a SigningGateway) -> Self {
        Self::with_config(ledger, gateway, BatchConfig::default())
    }

    pub fn with_config(
        ledger: &'a dyn LedgerClient,
        gateway: &'a SigningGateway,
        config: BatchConfig,
    ) -> Self {
        Self {
            ledger,
            gateway,
            config,
        }
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// Runs `operation` over `asset_ids`.
    ///
    /// Only batch-level validation returns `Err`, and always before any
    /// network call. Once units start, the run completes and every failure
    /// is reported in the returned outcomes. A transfer runs both of its
    /// phases back to back.
    pub async fn run(
        &self,
        session: &mut SessionState,
        operation: &Operation,
        asset_ids: &[AssetId],
    ) -> Result<BatchReport, EnhancerError> {
        if let Operation::Transfer { amount, receiver } = operation {
            let stage = self
                .create_transfer(session, asset_ids, amount, *receiver)
                .await?;
            return Ok(self.send_transfer(session, stage).await);
        }

        let signer = validate_selection(operation, asset_ids, self.gateway.active_address())?;
        let plan = match self.plan(session, operation, asset_ids, signer).await? {
            Ok(plan) => plan,
            Err(report) => return Ok(report),
        };

        let broadcaster = self.broadcaster();
        let mut report = BatchReport {
            skipped: plan.skipped,
            ..Default::default()
        };

        for PlannedUnit { asset_id, group } in plan.units {
            report.transition(asset_id, UnitState::Pending, UnitState::Signing);
            let payloads = match self.sign_unit(&group, &signer).await {
                Ok(payloads) => payloads,
                Err(e) => {
                    report.fail(asset_id, UnitState::Signing, &e);
                    continue;
                },
            };

            report.transition(asset_id, UnitState::Signing, UnitState::Submitted);
            match broadcaster.submit(&payloads).await {
                Ok(tx_id) => {
                    session.selection.remove(asset_id);
                    if operation.evicts_from_display() {
                        session.evict_displayed(asset_id);
                    }
                    report.succeed(asset_id, tx_id);
                },
                Err(e) => report.fail(asset_id, UnitState::Submitted, &e),
            }
        }

        info!(
            operation = operation.name(),
            successful = report.successful_count(),
            failed = report.failed_count(),
            skipped = report.skipped.len(),
            "batch finished"
        );
        Ok(report)
    }

    /// Create phase of a transfer: builds and signs one pair per asset,
    /// submitting nothing.
    ///
    /// The receiver must be a second account of the connected session.
    pub async fn create_transfer(
        &self,
        session: &mut SessionState,
        asset_ids: &[AssetId],
        amount: &str,
        receiver: Address,
    ) -> Result<TransferStage, EnhancerError> {
        let operation = Operation::Transfer {
            amount: amount.to_string(),
            receiver,
        };
        let signer = validate_selection(&operation, asset_ids, self.gateway.active_address())?;
        let accounts = self.gateway.accounts();
        if accounts.len() < 2 || receiver == signer || !accounts.contains(&receiver) {
            return Err(EnhancerError::InsufficientAccounts);
        }

        let mut stage = TransferStage {
            receiver,
            entries: Vec::with_capacity(asset_ids.len()),
            skipped: Vec::new(),
            transitions: Vec::new(),
            aborted: None,
        };
        let plan = match self.plan(session, &operation, asset_ids, signer).await? {
            Ok(plan) => plan,
            Err(report) => {
                stage.aborted = report.aborted;
                return Ok(stage);
            },
        };
        stage.skipped = plan.skipped;

        let mut log = BatchReport::default();
        for PlannedUnit { asset_id, group } in plan.units {
            log.transition(asset_id, UnitState::Pending, UnitState::Signing);
            match self.sign_unit(&group, &signer).await {
                // Signed pairs stay in Signing until the send phase.
                Ok(payloads) => stage.entries.push(StageEntry::Ready(StagedTransfer {
                    asset_id,
                    group_id: group.group_id(),
                    payloads,
                })),
                Err(e) => {
                    let outcome = log.record_failure(asset_id, UnitState::Signing, &e);
                    stage.entries.push(StageEntry::Failed(outcome));
                },
            }
        }
        stage.transitions = log.transitions;

        info!(
            staged = stage.len(),
            failed = stage.failures().count(),
            "transfer staged"
        );
        Ok(stage)
    }

    /// Send phase of a transfer: submits each staged pair as one broadcast,
    /// in the original order.
    pub async fn send_transfer(
        &self,
        session: &mut SessionState,
        stage: TransferStage,
    ) -> BatchReport {
        let broadcaster = self.broadcaster();
        let mut report = BatchReport {
            skipped: stage.skipped,
            transitions: stage.transitions,
            aborted: stage.aborted,
            ..Default::default()
        };

        for entry in stage.entries {
            let staged = match entry {
                StageEntry::Ready(staged) => staged,
                StageEntry::Failed(outcome) => {
                    report.outcomes.push(outcome);
                    continue;
                },
            };

            let asset_id = staged.asset_id;
            report.transition(asset_id, UnitState::Signing, UnitState::Submitted);
            match broadcaster.submit(&staged.payloads).await {
                Ok(tx_id) => {
                    session.selection.remove(asset_id);
                    report.succeed(asset_id, tx_id);
                },
                Err(e) => report.fail(asset_id, UnitState::Submitted, &e),
            }
        }

        info!(
            operation = "transfer",
            successful = report.successful_count(),
            failed = report.failed_count(),
            "batch finished"
        );
        report
    }

    fn broadcaster(&self) -> Broadcaster<'a> {
        Broadcaster::with_rounds(self.ledger, self.config.confirmation_rounds)
    }

    /// Builds the batch. A validation error is returned; any other build
    /// failure ends the batch before any unit starts and is reported in
    /// [`BatchReport::aborted`].
    async fn plan(
        &self,
        session: &mut SessionState,
        operation: &Operation,
        asset_ids: &[AssetId],
        signer: Address,
    ) -> Result<Result<BatchPlan, BatchReport>, EnhancerError> {
        let factory = TransactionFactory::new(self.ledger);
        match factory
            .build(&mut session.cache, operation, asset_ids, Some(signer))
            .await
        {
            Ok(plan) => Ok(Ok(plan)),
            Err(e) if e.is_validation() => Err(e),
            Err(e) => {
                warn!(
                    operation = operation.name(),
                    assets = asset_ids.len(),
                    error = %e,
                    "batch could not be built"
                );
                Ok(Err(BatchReport {
                    aborted: Some(e.user_message()),
                    ..Default::default()
                }))
            },
        }
    }

    async fn sign_unit(
        &self,
        group: &TransactionGroup,
        signer: &Address,
    ) -> Result<Vec<SignedPayload>, EnhancerError> {
        self.gateway
            .sign(std::slice::from_ref(group), signer)
            .await?
            .into_iter()
            .next()
            .ok_or(EnhancerError::SigningFailed)
    }
}
