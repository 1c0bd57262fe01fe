use data_encoding::BASE32_NOPAD;
use serde::{Serialize, Serializer};
use sha2::{Digest, Sha512_256};

use crate::{
    address::{serialize_key, serialize_optional_key},
    Address, AssetId, InterfaceError, SuggestedParams,
};

/// Domain separation prefix hashed in front of an encoded transaction.
const TX_PREFIX: &[u8] = b"TX";

/// Size a signature envelope adds to an encoded transaction: map header,
/// the `sig` and `txn` keys and a 64-byte binary signature.
const SIGNED_OVERHEAD: usize = 75;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionType {
    AssetTransfer,
    AssetConfig,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::AssetTransfer => "axfer",
            TransactionType::AssetConfig => "acfg",
        }
    }
}

impl Serialize for TransactionType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Fields of an asset transfer that vary per call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetTransfer {
    pub sender: Address,
    pub receiver: Address,
    pub amount: u64,
    pub asset_id: AssetId,
    /// Closes the sender's holding of the asset and sends any remainder here.
    pub close_remainder_to: Option<Address>,
}

/// An unsigned ledger transaction.
///
/// Field order matches the sorted key order of the canonical encoding and
/// every zero or empty field is left out of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transaction {
    #[serde(rename = "aamt", skip_serializing_if = "is_zero")]
    pub asset_amount: u64,
    #[serde(
        rename = "aclose",
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_optional_key"
    )]
    pub close_remainder_to: Option<Address>,
    #[serde(
        rename = "arcv",
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_optional_key"
    )]
    pub asset_receiver: Option<Address>,
    #[serde(rename = "caid", skip_serializing_if = "is_zero")]
    pub config_asset: AssetId,
    #[serde(rename = "fee", skip_serializing_if = "is_zero")]
    pub fee: u64,
    #[serde(rename = "fv", skip_serializing_if = "is_zero")]
    pub first_valid: u64,
    #[serde(rename = "gen", skip_serializing_if = "String::is_empty")]
    pub genesis_id: String,
    #[serde(rename = "gh", serialize_with = "serialize_hash")]
    pub genesis_hash: [u8; 32],
    #[serde(
        rename = "grp",
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_optional_hash"
    )]
    pub group: Option<[u8; 32]>,
    #[serde(rename = "lv", skip_serializing_if = "is_zero")]
    pub last_valid: u64,
    #[serde(rename = "note", skip_serializing_if = "Vec::is_empty", with = "serde_bytes")]
    pub note: Vec<u8>,
    #[serde(rename = "snd", serialize_with = "serialize_key")]
    pub sender: Address,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    #[serde(rename = "xaid", skip_serializing_if = "is_zero")]
    pub transfer_asset: AssetId,
}

fn is_zero(value: &u64) -> bool {
    *value == 0
}

fn serialize_hash<S: Serializer>(hash: &[u8; 32], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_bytes(hash)
}

fn serialize_optional_hash<S: Serializer>(
    hash: &Option<[u8; 32]>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match hash {
        Some(hash) => serializer.serialize_bytes(hash),
        None => serializer.serialize_none(),
    }
}

impl Transaction {
    /// Builds an asset transfer (also used for opt-in and opt-out) with the
    /// fee suggested by `params`.
    pub fn asset_transfer(
        transfer: AssetTransfer,
        params: &SuggestedParams,
        note: &[u8],
    ) -> Result<Self, InterfaceError> {
        let txn = Self {
            asset_amount: transfer.amount,
            close_remainder_to: transfer.close_remainder_to,
            asset_receiver: Some(transfer.receiver),
            transfer_asset: transfer.asset_id,
            ..Self::base(TransactionType::AssetTransfer, transfer.sender, params, note)
        };
        txn.with_suggested_fee(params)
    }

    /// Builds an asset destroy: an asset config transaction that carries
    /// only the asset id.
    pub fn asset_destroy(
        sender: Address,
        asset_id: AssetId,
        params: &SuggestedParams,
        note: &[u8],
    ) -> Result<Self, InterfaceError> {
        let txn = Self {
            config_asset: asset_id,
            ..Self::base(TransactionType::AssetConfig, sender, params, note)
        };
        txn.with_suggested_fee(params)
    }

    fn base(
        kind: TransactionType,
        sender: Address,
        params: &SuggestedParams,
        note: &[u8],
    ) -> Self {
        Self {
            asset_amount: 0,
            close_remainder_to: None,
            asset_receiver: None,
            config_asset: 0,
            fee: 0,
            first_valid: params.first_valid,
            genesis_id: params.genesis_id.clone(),
            genesis_hash: params.genesis_hash,
            group: None,
            last_valid: params.last_valid,
            note: note.to_vec(),
            sender,
            kind,
            transfer_asset: 0,
        }
    }

    /// Sets the fee for the encoding that carries it. A larger fee can
    /// widen the encoding, so repeat until the fee stops changing.
    fn with_suggested_fee(mut self, params: &SuggestedParams) -> Result<Self, InterfaceError> {
        loop {
            let fee = params.fee_for(self.estimate_signed_size()?);
            if fee <= self.fee {
                return Ok(self);
            }
            self.fee = fee;
        }
    }

    /// The asset this transaction acts on.
    pub fn asset_id(&self) -> AssetId {
        match self.kind {
            TransactionType::AssetTransfer => self.transfer_asset,
            TransactionType::AssetConfig => self.config_asset,
        }
    }

    /// Canonical MessagePack encoding.
    pub fn encode(&self) -> Result<Vec<u8>, InterfaceError> {
        Ok(rmp_serde::to_vec_named(self)?)
    }

    /// Bytes a signer signs: the `TX` prefix followed by the encoding.
    pub fn bytes_to_sign(&self) -> Result<Vec<u8>, InterfaceError> {
        let encoded = self.encode()?;
        let mut bytes = Vec::with_capacity(TX_PREFIX.len() + encoded.len());
        bytes.extend_from_slice(TX_PREFIX);
        bytes.extend_from_slice(&encoded);
        Ok(bytes)
    }

    pub fn raw_id(&self) -> Result<[u8; 32], InterfaceError> {
        Ok(Sha512_256::digest(self.bytes_to_sign()?).into())
    }

    /// Transaction id as shown by explorers and returned by the node.
    pub fn id(&self) -> Result<String, InterfaceError> {
        Ok(BASE32_NOPAD.encode(&self.raw_id()?))
    }

    pub fn estimate_signed_size(&self) -> Result<usize, InterfaceError> {
        Ok(self.encode()?.len() + SIGNED_OVERHEAD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TX_NOTE;

    fn params() -> SuggestedParams {
        SuggestedParams {
            fee_per_byte: 0,
            min_fee: 1_000,
            first_valid: 100,
            last_valid: 1_100,
            genesis_id: "testnet-v1.0".to_string(),
            genesis_hash: [9u8; 32],
        }
    }

    fn contains(haystack: &[u8], needle: &[u8]) -> bool {
        haystack.windows(needle.len()).any(|w| w == needle)
    }

    #[test]
    fn zero_amount_is_left_out_of_encoding() {
        let me = Address::new([1u8; 32]);
        let txn = Transaction::asset_transfer(
            AssetTransfer {
                sender: me,
                receiver: me,
                amount: 0,
                asset_id: 31566704,
                close_remainder_to: None,
            },
            &params(),
            TX_NOTE.as_bytes(),
        )
        .unwrap();

        let encoded = txn.encode().unwrap();
        assert!(!contains(&encoded, b"aamt"));
        assert!(!contains(&encoded, b"aclose"));
        assert!(contains(&encoded, b"arcv"));
        assert!(contains(&encoded, b"xaid"));
        assert!(contains(&encoded, TX_NOTE.as_bytes()));
        assert_eq!(txn.fee, 1_000);
    }

    #[test]
    fn destroy_carries_only_config_asset() {
        let me = Address::new([1u8; 32]);
        let txn = Transaction::asset_destroy(me, 42, &params(), b"").unwrap();
        let encoded = txn.encode().unwrap();
        assert!(contains(&encoded, b"caid"));
        assert!(contains(&encoded, b"acfg"));
        assert!(!contains(&encoded, b"arcv"));
        assert!(!contains(&encoded, b"note"));
        assert_eq!(txn.asset_id(), 42);
    }

    #[test]
    fn id_is_deterministic_and_content_bound() {
        let me = Address::new([1u8; 32]);
        let transfer = |amount| AssetTransfer {
            sender: me,
            receiver: me,
            amount,
            asset_id: 7,
            close_remainder_to: None,
        };
        let a = Transaction::asset_transfer(transfer(1), &params(), b"").unwrap();
        let b = Transaction::asset_transfer(transfer(1), &params(), b"").unwrap();
        let c = Transaction::asset_transfer(transfer(2), &params(), b"").unwrap();

        assert_eq!(a.id().unwrap(), b.id().unwrap());
        assert_ne!(a.id().unwrap(), c.id().unwrap());
        assert_eq!(a.id().unwrap().len(), 52);
    }

    #[test]
    fn per_byte_fee_covers_final_encoding() {
        let me = Address::new([1u8; 32]);
        let congested = SuggestedParams {
            fee_per_byte: 10,
            ..params()
        };
        let txn = Transaction::asset_transfer(
            AssetTransfer {
                sender: me,
                receiver: me,
                amount: 0,
                asset_id: 31566704,
                close_remainder_to: None,
            },
            &congested,
            TX_NOTE.as_bytes(),
        )
        .unwrap();

        let required = congested.fee_for(txn.estimate_signed_size().unwrap());
        assert!(txn.fee > congested.min_fee);
        assert!(txn.fee >= required, "fee {} < required {}", txn.fee, required);
    }

    #[test]
    fn bytes_to_sign_are_prefixed() {
        let me = Address::new([1u8; 32]);
        let txn = Transaction::asset_destroy(me, 42, &params(), b"").unwrap();
        let bytes = txn.bytes_to_sign().unwrap();
        assert_eq!(&bytes[..2], b"TX");
        assert_eq!(&bytes[2..], txn.encode().unwrap().as_slice());
    }
}
