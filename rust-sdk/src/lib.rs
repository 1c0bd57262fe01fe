// Public modules
pub mod asset_cache;
pub mod batch_executor;
pub mod broadcaster;
pub mod error;
pub mod metadata;
pub mod rpc;
pub mod selection;
pub mod session;
pub mod signing;
pub mod transaction_factory;
pub mod types;

// Re-exports for convenient public API
pub use asset_cache::AssetCache;
pub use batch_executor::{
    BatchConfig, BatchExecutor, BatchReport, StagedTransfer, TransferStage, UnitState,
    UnitTransition,
};
pub use broadcaster::Broadcaster;
pub use error::{user_facing_reason, EnhancerError};
pub use rpc::{HttpLedger, LedgerClient, NodeStatus, PendingTransaction};
pub use selection::SelectionSet;
pub use session::SessionState;
pub use signing::{
    ConnectionState, ProviderError, ProviderKind, SignRequest, SignedPayload, SigningGateway,
    WalletProvider,
};
pub use transaction_factory::{
    BatchPlan, PlannedUnit, SkippedAsset, TransactionFactory, TransactionGroup,
};
pub use types::{
    check_amount, scale_amount, AssetRecord, AssetStandard, BatchOutcome, Network, Operation, OutcomeStatus,
    TransferIntent, MAX_SELECT_COUNT, MAX_TRANSFER_COUNT,
};

pub use enhancer_interface as interface;

#[cfg(test)]
mod tests;
