//! # Double-Vote Evidence
//!
//! Equivocation on a consumer chain: one validator signed two votes for
//! different blocks at the same height and round.

use ccv_types::{CcvError, CcvResult, ChainId, ConsAddress, ConsensusPubKey};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Domain tag of consumer vote sign bytes.
const VOTE_SIGN_DOMAIN: &[u8] = b"ccv/consumer-vote";

/// A signed consumer-chain vote.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    /// Consumer block height.
    pub height: u64,
    /// Consensus round.
    pub round: u32,
    /// Hash of the block voted for.
    pub block_hash: [u8; 32],
    /// Consumer consensus address of the signer.
    pub validator_address: ConsAddress,
    /// Signature over [`Vote::sign_bytes`].
    pub signature: Vec<u8>,
}

impl Vote {
    /// Bytes signed by the validator: SHA-256 over the chain id and vote fields.
    pub fn sign_bytes(&self, chain_id: &ChainId) -> Vec<u8> {
        let mut hasher = Sha256::new();
        hasher.update(VOTE_SIGN_DOMAIN);
        hasher.update([chain_id.as_str().len() as u8]);
        hasher.update(chain_id.as_str().as_bytes());
        hasher.update(self.height.to_be_bytes());
        hasher.update(self.round.to_be_bytes());
        hasher.update(self.block_hash);
        hasher.finalize().to_vec()
    }
}

/// Two conflicting votes by one validator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateVoteEvidence {
    pub vote_a: Vote,
    pub vote_b: Vote,
}

impl DuplicateVoteEvidence {
    /// Consumer address of the equivocating validator.
    pub fn validator_address(&self) -> ConsAddress {
        self.vote_a.validator_address
    }

    /// Infraction height on the consumer.
    pub fn height(&self) -> u64 {
        self.vote_a.height
    }

    /// Structural checks that need no key.
    pub fn validate_basic(&self) -> CcvResult<()> {
        let (a, b) = (&self.vote_a, &self.vote_b);
        if a.validator_address != b.validator_address {
            return Err(CcvError::InvalidEvidence(
                "votes are from different validators".to_string(),
            ));
        }
        if a.height != b.height || a.round != b.round {
            return Err(CcvError::InvalidEvidence(format!(
                "votes at different height/round: {}/{} vs {}/{}",
                a.height, a.round, b.height, b.round
            )));
        }
        if a.block_hash == b.block_hash {
            return Err(CcvError::InvalidEvidence(
                "votes are for the same block".to_string(),
            ));
        }
        Ok(())
    }

    /// Full verification against the signer's consumer key.
    pub fn verify(&self, chain_id: &ChainId, key: &ConsensusPubKey) -> CcvResult<()> {
        self.validate_basic()?;
        if key.address() != self.validator_address() {
            return Err(CcvError::InvalidEvidence(
                "key does not match the vote signer".to_string(),
            ));
        }
        for vote in [&self.vote_a, &self.vote_b] {
            if !key.verify(&vote.sign_bytes(chain_id), &vote.signature) {
                return Err(CcvError::InvalidEvidence(format!(
                    "bad signature on vote for block {}",
                    hex::encode(vote.block_hash)
                )));
            }
        }
        Ok(())
    }
}
