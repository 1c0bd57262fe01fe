use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Deserialize;

use crate::InterfaceError;

/// Number of rounds a transaction stays valid after its first valid round.
pub const VALIDITY_WINDOW: u64 = 1000;

/// Raw `GET /v2/transactions/params` response.
#[derive(Debug, Clone, Deserialize)]
pub struct TransactionParamsResponse {
    #[serde(rename = "consensus-version", default)]
    pub consensus_version: String,
    pub fee: u64,
    #[serde(rename = "genesis-hash")]
    pub genesis_hash: String,
    #[serde(rename = "genesis-id")]
    pub genesis_id: String,
    #[serde(rename = "last-round")]
    pub last_round: u64,
    #[serde(rename = "min-fee")]
    pub min_fee: u64,
}

/// Network parameters every transaction of a batch is built against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestedParams {
    pub fee_per_byte: u64,
    pub min_fee: u64,
    pub first_valid: u64,
    pub last_valid: u64,
    pub genesis_id: String,
    pub genesis_hash: [u8; 32],
}

impl SuggestedParams {
    /// Fee for a transaction whose signed form is `signed_size` bytes.
    pub fn fee_for(&self, signed_size: usize) -> u64 {
        self.fee_per_byte
            .saturating_mul(signed_size as u64)
            .max(self.min_fee)
    }
}

impl TryFrom<TransactionParamsResponse> for SuggestedParams {
    type Error = InterfaceError;

    fn try_from(response: TransactionParamsResponse) -> Result<Self, Self::Error> {
        let decoded = STANDARD
            .decode(response.genesis_hash.as_bytes())
            .map_err(|_| InterfaceError::InvalidGenesisHash(response.genesis_hash.clone()))?;
        let genesis_hash: [u8; 32] = decoded
            .try_into()
            .map_err(|_| InterfaceError::InvalidGenesisHash(response.genesis_hash.clone()))?;

        Ok(Self {
            fee_per_byte: response.fee,
            min_fee: response.min_fee,
            first_valid: response.last_round,
            last_valid: response.last_round + VALIDITY_WINDOW,
            genesis_id: response.genesis_id,
            genesis_hash,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(genesis_hash: &str) -> TransactionParamsResponse {
        TransactionParamsResponse {
            consensus_version: "future".to_string(),
            fee: 0,
            genesis_hash: genesis_hash.to_string(),
            genesis_id: "testnet-v1.0".to_string(),
            last_round: 5_000,
            min_fee: 1_000,
        }
    }

    #[test]
    fn converts_node_response() {
        let hash = STANDARD.encode([7u8; 32]);
        let params = SuggestedParams::try_from(response(&hash)).unwrap();
        assert_eq!(params.first_valid, 5_000);
        assert_eq!(params.last_valid, 6_000);
        assert_eq!(params.genesis_hash, [7u8; 32]);
        assert_eq!(params.fee_for(250), 1_000);
    }

    #[test]
    fn per_byte_fee_wins_when_larger() {
        let hash = STANDARD.encode([7u8; 32]);
        let mut raw = response(&hash);
        raw.fee = 10;
        let params = SuggestedParams::try_from(raw).unwrap();
        assert_eq!(params.fee_for(250), 2_500);
    }

    #[test]
    fn rejects_short_genesis_hash() {
        let hash = STANDARD.encode([7u8; 16]);
        assert!(matches!(
            SuggestedParams::try_from(response(&hash)),
            Err(InterfaceError::InvalidGenesisHash(_))
        ));
    }
}
