use serde::Serialize;
use serde_bytes::ByteBuf;
use sha2::{Digest, Sha512_256};

use crate::{InterfaceError, Transaction};

/// Domain separation prefix for group hashes.
const GROUP_PREFIX: &[u8] = b"TG";

pub type GroupId = [u8; 32];

#[derive(Serialize)]
struct TxGroup {
    #[serde(rename = "txlist")]
    tx_ids: Vec<ByteBuf>,
}

/// Hash binding an ordered set of transactions into one atomic unit.
///
/// Member ids are taken with any existing group id cleared, so the result
/// only depends on the members and their order.
pub fn compute_group_id(transactions: &[Transaction]) -> Result<GroupId, InterfaceError> {
    let mut tx_ids = Vec::with_capacity(transactions.len());
    for txn in transactions {
        let mut bare = txn.clone();
        bare.group = None;
        tx_ids.push(ByteBuf::from(bare.raw_id()?.to_vec()));
    }

    let encoded = rmp_serde::to_vec_named(&TxGroup { tx_ids })?;
    let mut hasher = Sha512_256::new();
    hasher.update(GROUP_PREFIX);
    hasher.update(&encoded);
    Ok(hasher.finalize().into())
}

/// Stamps the group id on every member of a multi-member group.
///
/// A single transaction is not a group: its group id is cleared and `None`
/// is returned.
pub fn assign_group_id(
    transactions: &mut [Transaction],
) -> Result<Option<GroupId>, InterfaceError> {
    if transactions.len() <= 1 {
        for txn in transactions.iter_mut() {
            txn.group = None;
        }
        return Ok(None);
    }

    let group_id = compute_group_id(transactions)?;
    for txn in transactions.iter_mut() {
        txn.group = Some(group_id);
    }
    Ok(Some(group_id))
}
