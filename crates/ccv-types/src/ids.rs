//! # Identities
//!
//! Chain, channel and validator identities used on both sides of CCV.

use crate::errors::{CcvError, CcvResult};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Maximum length of a chain identifier.
pub const MAX_CHAIN_ID_LEN: usize = 50;

/// Type URL of an Ed25519 consensus key.
pub const ED25519_KEY_TYPE: &str = "/cosmos.crypto.ed25519.PubKey";

/// Type URL of a Secp256k1 consensus key.
pub const SECP256K1_KEY_TYPE: &str = "/cosmos.crypto.secp256k1.PubKey";

/// Unix timestamp in seconds, always taken from the block header.
pub type Timestamp = u64;

/// Consumer chain identifier.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ChainId(String);

impl ChainId {
    /// Create a chain id, rejecting blank or oversized values.
    pub fn new(id: impl Into<String>) -> CcvResult<Self> {
        let id = id.into();
        if id.trim().is_empty() || id.len() > MAX_CHAIN_ID_LEN {
            return Err(CcvError::InvalidChainId(id));
        }
        Ok(Self(id))
    }

    /// Borrow as `&str`.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ChainId {
    type Error = CcvError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ChainId> for String {
    fn from(id: ChainId) -> Self {
        id.0
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Channel identifier on the messaging transport.
///
/// Follows the transport's host identifier rules: 8 to 64 characters from
/// `[A-Za-z0-9._+-#[]<>]`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ChannelId(String);

impl ChannelId {
    /// Create a channel id after validating the identifier format.
    pub fn new(id: impl Into<String>) -> CcvResult<Self> {
        let id = id.into();
        validate_identifier(&id, 8, 64)
            .map_err(|reason| CcvError::InvalidHandshake(format!("channel id {id:?}: {reason}")))?;
        Ok(Self(id))
    }

    /// Borrow as `&str`.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ChannelId {
    type Error = CcvError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ChannelId> for String {
    fn from(id: ChannelId) -> Self {
        id.0
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Validate a host identifier (channel, client, connection ids).
pub fn validate_identifier(id: &str, min: usize, max: usize) -> Result<(), String> {
    if id.len() < min || id.len() > max {
        return Err(format!("length {} not in [{min}, {max}]", id.len()));
    }
    let valid = id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || "._+-#[]<>".contains(c));
    if !valid {
        return Err("contains invalid characters".to_string());
    }
    Ok(())
}

/// Consensus address: first 20 bytes of SHA-256 over the consensus public key.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ConsAddress([u8; 20]);

impl ConsAddress {
    /// Wrap raw address bytes.
    pub const fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Raw bytes.
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Parse from a 40 character hex string.
    pub fn from_hex(s: &str) -> CcvResult<Self> {
        let bytes = hex::decode(s)
            .map_err(|e| CcvError::InvalidPacket(format!("address {s:?}: {e}")))?;
        let arr: [u8; 20] = bytes
            .try_into()
            .map_err(|_| CcvError::InvalidPacket(format!("address {s:?}: expected 20 bytes")))?;
        Ok(Self(arr))
    }
}

impl TryFrom<String> for ConsAddress {
    type Error = CcvError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value)
    }
}

impl From<ConsAddress> for String {
    fn from(addr: ConsAddress) -> Self {
        hex::encode(addr.0)
    }
}

impl fmt::Display for ConsAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for ConsAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ConsAddress({})", hex::encode(self.0))
    }
}

/// Consensus public key of a validator.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "PubKeyJson", into = "PubKeyJson")]
pub enum ConsensusPubKey {
    /// Ed25519 (32 bytes).
    Ed25519([u8; 32]),
    /// Secp256k1, compressed SEC1 (33 bytes).
    Secp256k1([u8; 33]),
}

/// JSON form of a consensus key: `{"@type": <type url>, "key": <base64>}`.
#[derive(Clone, Debug, Serialize, Deserialize)]
struct PubKeyJson {
    #[serde(rename = "@type")]
    type_url: String,
    key: String,
}

impl ConsensusPubKey {
    /// Validate raw key bytes for a scheme given by its type URL.
    pub fn from_type_and_bytes(type_url: &str, bytes: &[u8]) -> CcvResult<Self> {
        match type_url {
            ED25519_KEY_TYPE => {
                let arr: [u8; 32] = bytes.try_into().map_err(|_| {
                    CcvError::InvalidKey(format!("ed25519 key must be 32 bytes, got {}", bytes.len()))
                })?;
                ed25519_dalek::VerifyingKey::from_bytes(&arr)
                    .map_err(|_| CcvError::InvalidKey("not an ed25519 curve point".to_string()))?;
                Ok(Self::Ed25519(arr))
            }
            SECP256K1_KEY_TYPE => {
                let arr: [u8; 33] = bytes.try_into().map_err(|_| {
                    CcvError::InvalidKey(format!(
                        "secp256k1 key must be 33 bytes, got {}",
                        bytes.len()
                    ))
                })?;
                k256::ecdsa::VerifyingKey::from_sec1_bytes(&arr)
                    .map_err(|_| CcvError::InvalidKey("not a secp256k1 curve point".to_string()))?;
                Ok(Self::Secp256k1(arr))
            }
            other => Err(CcvError::InvalidKey(format!("unknown key type {other:?}"))),
        }
    }

    /// Parse the JSON key form used in key-assignment messages.
    pub fn from_json(s: &str) -> CcvResult<Self> {
        let json: PubKeyJson =
            serde_json::from_str(s).map_err(|e| CcvError::InvalidKey(e.to_string()))?;
        Self::try_from(json)
    }

    /// Render as the JSON key form.
    pub fn to_json(&self) -> String {
        // Serializing two owned strings cannot fail.
        serde_json::to_string(&PubKeyJson::from(*self)).unwrap_or_default()
    }

    /// Deterministically derive an Ed25519 key from a secret seed.
    pub fn ed25519_from_seed(seed: [u8; 32]) -> Self {
        let signing = ed25519_dalek::SigningKey::from_bytes(&seed);
        Self::Ed25519(signing.verifying_key().to_bytes())
    }

    /// Type URL of the key scheme.
    pub fn type_url(&self) -> &'static str {
        match self {
            Self::Ed25519(_) => ED25519_KEY_TYPE,
            Self::Secp256k1(_) => SECP256K1_KEY_TYPE,
        }
    }

    /// Raw key bytes.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Ed25519(k) => k,
            Self::Secp256k1(k) => k,
        }
    }

    /// Consensus address of this key.
    pub fn address(&self) -> ConsAddress {
        let digest = Sha256::digest(self.as_bytes());
        let mut out = [0u8; 20];
        out.copy_from_slice(&digest[..20]);
        ConsAddress(out)
    }

    /// Verify a signature over `message`.
    ///
    /// Ed25519 expects a 64 byte signature, Secp256k1 a 64 byte `r || s`.
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> bool {
        match self {
            Self::Ed25519(key) => {
                use ed25519_dalek::Verifier;
                let Ok(vk) = ed25519_dalek::VerifyingKey::from_bytes(key) else {
                    return false;
                };
                let Ok(sig) = ed25519_dalek::Signature::from_slice(signature) else {
                    return false;
                };
                vk.verify(message, &sig).is_ok()
            }
            Self::Secp256k1(key) => {
                use k256::ecdsa::signature::Verifier;
                let Ok(vk) = k256::ecdsa::VerifyingKey::from_sec1_bytes(key) else {
                    return false;
                };
                let Ok(sig) = k256::ecdsa::Signature::from_slice(signature) else {
                    return false;
                };
                vk.verify(message, &sig).is_ok()
            }
        }
    }
}

impl TryFrom<PubKeyJson> for ConsensusPubKey {
    type Error = CcvError;

    fn try_from(json: PubKeyJson) -> Result<Self, Self::Error> {
        let bytes = BASE64
            .decode(json.key.as_bytes())
            .map_err(|e| CcvError::InvalidKey(format!("base64: {e}")))?;
        Self::from_type_and_bytes(&json.type_url, &bytes)
    }
}

impl From<ConsensusPubKey> for PubKeyJson {
    fn from(key: ConsensusPubKey) -> Self {
        Self {
            type_url: key.type_url().to_string(),
            key: BASE64.encode(key.as_bytes()),
        }
    }
}

impl fmt::Debug for ConsensusPubKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ed25519(k) => write!(f, "Ed25519({})", hex::encode(k)),
            Self::Secp256k1(k) => write!(f, "Secp256k1({})", hex::encode(k)),
        }
    }
}
