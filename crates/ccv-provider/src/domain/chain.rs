//! # Consumer Chain Records
//!
//! A consumer chain is registered by `ConsumerAddition`, launched at its
//! spawn time and stopped either by `ConsumerRemoval` or when its channel
//! closes. The channel record carries the lifecycle state.

use super::msgs::ConsumerAdditionProposal;
use ccv_types::{ChainId, ChannelRecord, ChannelState, Timestamp};
use serde::{Deserialize, Serialize};

/// Provider-side light client type prefix for consumer clients.
pub const CLIENT_TYPE_PREFIX: &str = "07-tendermint";

/// Client id for the `counter`-th client created by the provider.
pub fn client_id_for(counter: u64) -> String {
    format!("{CLIENT_TYPE_PREFIX}-{counter}")
}

/// Data fixed when the chain launches.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchInfo {
    /// Provider-side client tracking the consumer.
    pub client_id: String,
    /// Provider height at launch; VSC id `0` resolves to it.
    pub launch_height: u64,
    /// Block time at launch.
    pub launch_time: Timestamp,
}

/// Provider-side record of a consumer chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumerChain {
    /// Chain id.
    pub chain_id: ChainId,
    /// Block time at which the chain launches.
    pub spawn_time: Timestamp,
    /// Block time at which the chain is stopped, once removal passed.
    pub stop_time: Option<Timestamp>,
    /// Consumer unbonding period, in seconds.
    pub unbonding_period: u64,
    /// Maximum validators sent to the consumer; `0` means unlimited.
    pub validator_set_cap: u32,
    /// Validators below this power are not sent to the consumer.
    pub min_power: i64,
    /// The consumer is a standalone chain changing over to CCV.
    pub pre_ccv: bool,
    /// Set once the chain launched.
    pub launch: Option<LaunchInfo>,
    /// CCV channel.
    pub channel: ChannelRecord,
}

impl ConsumerChain {
    /// Registered, not yet launched chain from an addition proposal.
    pub fn from_proposal(proposal: &ConsumerAdditionProposal) -> Self {
        Self {
            chain_id: proposal.chain_id.clone(),
            spawn_time: proposal.spawn_time,
            stop_time: None,
            unbonding_period: proposal.unbonding_period,
            validator_set_cap: proposal.validator_set_cap,
            min_power: proposal.min_power,
            pre_ccv: proposal.pre_ccv,
            launch: None,
            channel: ChannelRecord::default(),
        }
    }

    pub fn is_launched(&self) -> bool {
        self.launch.is_some()
    }

    pub fn is_closed(&self) -> bool {
        self.channel.state.is_terminal()
    }

    pub fn is_established(&self) -> bool {
        self.channel.is_established()
    }

    /// Launched and not stopped.
    pub fn is_running(&self) -> bool {
        self.is_launched() && !self.is_closed()
    }

    /// True if the chain should launch at `now`.
    pub fn launch_due(&self, now: Timestamp) -> bool {
        !self.is_launched() && !self.is_closed() && self.spawn_time <= now
    }

    /// True if a passed removal takes effect at `now`.
    pub fn stop_due(&self, now: Timestamp) -> bool {
        !self.is_closed() && self.stop_time.is_some_and(|t| t <= now)
    }

    pub fn state(&self) -> ChannelState {
        self.channel.state
    }
}
