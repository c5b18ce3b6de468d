//! # Provider Messages
//!
//! Closed set of messages the provider module accepts. Dispatch is a single
//! `match` in the service.

use super::evidence::DuplicateVoteEvidence;
use super::params::ProviderParams;
use ccv_types::{CcvError, CcvResult, ChainId, ConsAddress, Timestamp};
use serde::{Deserialize, Serialize};

/// Register a new consumer chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumerAdditionProposal {
    pub chain_id: ChainId,
    /// Block time at which the chain launches.
    pub spawn_time: Timestamp,
    /// Consumer unbonding period, in seconds.
    pub unbonding_period: u64,
    /// Maximum validators sent to the consumer (`0` = unlimited).
    pub validator_set_cap: u32,
    /// Minimum power for a validator to be sent.
    pub min_power: i64,
    /// The consumer is an existing standalone chain.
    pub pre_ccv: bool,
}

impl ConsumerAdditionProposal {
    pub fn validate_basic(&self) -> CcvResult<()> {
        if self.unbonding_period == 0 {
            return Err(CcvError::InvalidParams(
                "consumer unbonding period must be positive".to_string(),
            ));
        }
        if self.min_power < 0 {
            return Err(CcvError::InvalidParams(format!(
                "min power cannot be negative: {}",
                self.min_power
            )));
        }
        Ok(())
    }
}

/// Stop a consumer chain at `stop_time`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumerRemovalProposal {
    pub chain_id: ChainId,
    pub stop_time: Timestamp,
}

/// Change how a registered chain's validator set is selected. Applies from
/// the next end block.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumerModificationProposal {
    pub chain_id: ChainId,
    /// Maximum validators sent to the consumer (`0` = unlimited).
    pub validator_set_cap: u32,
    /// Minimum power for a validator to be sent.
    pub min_power: i64,
}

impl ConsumerModificationProposal {
    pub fn validate_basic(&self) -> CcvResult<()> {
        if self.min_power < 0 {
            return Err(CcvError::InvalidParams(format!(
                "min power cannot be negative: {}",
                self.min_power
            )));
        }
        Ok(())
    }
}

/// Messages handled by the provider.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderMsg {
    /// Governance: register a consumer chain.
    ConsumerAddition(ConsumerAdditionProposal),
    /// Governance: stop a consumer chain.
    ConsumerRemoval(ConsumerRemovalProposal),
    /// Governance: change a chain's validator set cap and minimum power.
    ConsumerModification(ConsumerModificationProposal),
    /// Validator: use a different consensus key on a consumer.
    AssignConsumerKey {
        chain_id: ChainId,
        provider_addr: ConsAddress,
        /// JSON key: `{"@type": <type url>, "key": <base64>}`.
        consumer_key: String,
    },
    /// Anyone: submit equivocation evidence from a consumer.
    SubmitConsumerDoubleVoting {
        chain_id: ChainId,
        evidence: DuplicateVoteEvidence,
    },
    /// Governance: replace module parameters.
    UpdateParams(ProviderParams),
}

impl ProviderMsg {
    /// Type URL of the message.
    pub fn type_url(&self) -> &'static str {
        match self {
            Self::ConsumerAddition(_) => "/interchain_security.ccv.provider.v1.MsgConsumerAddition",
            Self::ConsumerRemoval(_) => "/interchain_security.ccv.provider.v1.MsgConsumerRemoval",
            Self::ConsumerModification(_) => {
                "/interchain_security.ccv.provider.v1.MsgConsumerModification"
            }
            Self::AssignConsumerKey { .. } => {
                "/interchain_security.ccv.provider.v1.MsgAssignConsumerKey"
            }
            Self::SubmitConsumerDoubleVoting { .. } => {
                "/interchain_security.ccv.provider.v1.MsgSubmitConsumerDoubleVoting"
            }
            Self::UpdateParams(_) => "/interchain_security.ccv.provider.v1.MsgUpdateParams",
        }
    }

    /// Stateless checks.
    pub fn validate_basic(&self) -> CcvResult<()> {
        match self {
            Self::ConsumerAddition(p) => p.validate_basic(),
            Self::ConsumerRemoval(_) => Ok(()),
            Self::ConsumerModification(p) => p.validate_basic(),
            Self::AssignConsumerKey { consumer_key, .. } => {
                if consumer_key.trim().is_empty() {
                    return Err(CcvError::InvalidKey("empty consumer key".to_string()));
                }
                Ok(())
            }
            Self::SubmitConsumerDoubleVoting { evidence, .. } => evidence.validate_basic(),
            Self::UpdateParams(params) => params.validate(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_addition_validation() {
        let mut p = ConsumerAdditionProposal {
            chain_id: ChainId::new("c").unwrap(),
            spawn_time: 0,
            unbonding_period: 10,
            validator_set_cap: 0,
            min_power: 0,
            pre_ccv: false,
        };
        assert!(ProviderMsg::ConsumerAddition(p.clone()).validate_basic().is_ok());
        p.unbonding_period = 0;
        assert!(ProviderMsg::ConsumerAddition(p).validate_basic().is_err());
    }

    #[test]
    fn test_type_urls_are_distinct() {
        let chain_id = ChainId::new("c").unwrap();
        let msgs = [
            ProviderMsg::ConsumerRemoval(ConsumerRemovalProposal {
                chain_id: chain_id.clone(),
                stop_time: 0,
            }),
            ProviderMsg::ConsumerModification(ConsumerModificationProposal {
                chain_id: chain_id.clone(),
                validator_set_cap: 3,
                min_power: 0,
            }),
            ProviderMsg::AssignConsumerKey {
                chain_id,
                provider_addr: ConsAddress::from_bytes([0; 20]),
                consumer_key: "{}".to_string(),
            },
            ProviderMsg::UpdateParams(ProviderParams::default()),
        ];
        let urls: std::collections::BTreeSet<&str> = msgs.iter().map(|m| m.type_url()).collect();
        assert_eq!(urls.len(), msgs.len());
    }

    #[test]
    fn test_modification_rejects_negative_min_power() {
        let p = ConsumerModificationProposal {
            chain_id: ChainId::new("c").unwrap(),
            validator_set_cap: 0,
            min_power: -1,
        };
        assert!(matches!(
            ProviderMsg::ConsumerModification(p).validate_basic(),
            Err(CcvError::InvalidParams(_))
        ));
    }
}
