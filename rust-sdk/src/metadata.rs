//! Asset metadata helpers: ARC-19 template URLs and ARC-69 config notes.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use data_encoding::BASE32_NOPAD;
use enhancer_interface::Address;
use serde_json::{Map, Value};

use crate::{error::EnhancerError, types::AssetConfigTransaction};

const TEMPLATE_SCHEME: &str = "template-ipfs://";

/// Multicodec codes accepted in ARC-19 templates.
const CODEC_RAW: u8 = 0x55;
const CODEC_DAG_PB: u8 = 0x70;

/// Multihash header for a 32-byte sha2-256 digest.
const SHA2_256: [u8; 2] = [0x12, 0x20];

fn codec_code(name: &str) -> Result<u8, EnhancerError> {
    match name {
        "raw" => Ok(CODEC_RAW),
        "dag-pb" => Ok(CODEC_DAG_PB),
        _ => Err(EnhancerError::UnknownCodec),
    }
}

fn codec_name(code: u8) -> Result<&'static str, EnhancerError> {
    match code {
        CODEC_RAW => Ok("raw"),
        CODEC_DAG_PB => Ok("dag-pb"),
        _ => Err(EnhancerError::UnknownCodec),
    }
}

/// Resolves an ARC-19 template URL against the asset's reserve address.
///
/// The reserve key is the sha2-256 digest of the content. Version 1 ids are
/// rendered as lowercase base32 with the `b` multibase prefix, version 0
/// ids as base58btc. Any path after the template is kept.
pub fn resolve_template_cid(url: &str, reserve: &str) -> Result<String, EnhancerError> {
    let invalid = || EnhancerError::InvalidTemplate(url.to_string());

    let body = url.strip_prefix(TEMPLATE_SCHEME).ok_or_else(invalid)?;
    let (template, rest) = body
        .strip_prefix('{')
        .and_then(|b| b.split_once('}'))
        .ok_or_else(invalid)?;

    let fields: Vec<&str> = template.split(':').collect();
    let [kind, version, codec, field, hash] = fields.as_slice() else {
        return Err(invalid());
    };
    if *kind != "ipfscid" || *field != "reserve" || *hash != "sha2-256" {
        return Err(invalid());
    }
    let codec = codec_code(codec)?;

    let reserve: Address = reserve
        .trim()
        .parse()
        .map_err(|_| EnhancerError::InvalidAddress(reserve.to_string()))?;
    let mut multihash = SHA2_256.to_vec();
    multihash.extend_from_slice(reserve.as_bytes());

    let cid = match *version {
        "0" => bs58::encode(&multihash).into_string(),
        "1" => {
            let mut bytes = vec![0x01, codec];
            bytes.extend_from_slice(&multihash);
            format!("b{}", BASE32_NOPAD.encode(&bytes).to_ascii_lowercase())
        },
        _ => return Err(invalid()),
    };
    Ok(format!("{}{}", cid, rest))
}

/// Reverse of [`resolve_template_cid`]: the template URL and reserve
/// address that publish a version 1 content id.
pub fn reserve_from_cid(cid: &str) -> Result<(String, Address), EnhancerError> {
    let invalid = || EnhancerError::InvalidTemplate(cid.to_string());

    let encoded = cid
        .strip_prefix('b')
        .ok_or_else(|| EnhancerError::InvalidTemplate("only version 1 ids are supported".into()))?;
    let bytes = BASE32_NOPAD
        .decode(encoded.to_ascii_uppercase().as_bytes())
        .map_err(|_| invalid())?;

    match bytes.as_slice() {
        [0x01, codec, 0x12, 0x20, digest @ ..] if digest.len() == 32 => {
            let codec = codec_name(*codec)?;
            let mut key = [0u8; 32];
            key.copy_from_slice(digest);
            Ok((
                format!("{}{{ipfscid:1:{}:reserve:sha2-256}}", TEMPLATE_SCHEME, codec),
                Address::new(key),
            ))
        },
        _ => Err(invalid()),
    }
}

/// `properties` of the ARC-69 note carried by the latest confirmed config
/// transaction. Empty when the note has none.
pub fn latest_note_properties(
    transactions: &[AssetConfigTransaction],
) -> Result<Map<String, Value>, EnhancerError> {
    let latest = transactions
        .iter()
        .max_by_key(|txn| txn.confirmed_round)
        .ok_or_else(|| EnhancerError::InvalidMetadata("no config transactions".into()))?;

    let note = STANDARD
        .decode(latest.note.trim())
        .map_err(|e| EnhancerError::InvalidMetadata(e.to_string()))?;
    let metadata: Value = serde_json::from_slice(&note)
        .map_err(|e| EnhancerError::InvalidMetadata(e.to_string()))?;

    Ok(match metadata.get("properties") {
        Some(Value::Object(properties)) => properties.clone(),
        _ => Map::new(),
    })
}
