//! # Inbound Ports
//!
//! What the provider module offers the host application.

use crate::domain::{ProviderGenesis, ProviderMsg};
use ccv_types::{
    Acknowledgement, BlockContext, CcvResult, ChainId, ChannelState, ConsAddress, TransportEvent,
};

/// Provider module API, called once per block step by the host.
pub trait ProviderApi {
    /// Load a genesis snapshot into an empty store.
    fn init_genesis(&mut self, ctx: BlockContext, genesis: ProviderGenesis) -> CcvResult<()>;

    /// Snapshot every provider table.
    fn export_genesis(&self) -> CcvResult<ProviderGenesis>;

    /// Launch and stop due chains, replenish the slash meter, drain the throttle queue.
    fn begin_block(&mut self, ctx: BlockContext) -> CcvResult<()>;

    /// Queue and send VSC packets, enforce VSC timeouts, advance the VSC id.
    fn end_block(&mut self, ctx: BlockContext) -> CcvResult<()>;

    /// Execute a message. State is untouched on error.
    fn handle_msg(&mut self, ctx: BlockContext, msg: ProviderMsg) -> CcvResult<()>;

    /// Process a transport callback. `RecvPacket` yields an acknowledgement.
    fn handle_event(
        &mut self,
        ctx: BlockContext,
        event: TransportEvent,
    ) -> CcvResult<Option<Acknowledgement>>;

    /// Staking hook. Returns true if the operation was put on hold.
    fn after_unbonding_initiated(
        &mut self,
        ctx: BlockContext,
        op_id: u64,
        validator: ConsAddress,
    ) -> CcvResult<bool>;

    /// Staking hook run before a validator is created. Rejects a consensus
    /// address that is, or was, a consumer key on any chain.
    fn before_validator_created(&self, cons_addr: &ConsAddress) -> CcvResult<()>;

    /// True once no consumer owes a maturity notification for `op_id`.
    fn can_complete(&self, op_id: u64) -> CcvResult<bool>;

    /// Consumer address `provider_addr` signs with on `chain_id`.
    fn consumer_addr(&self, chain_id: &ChainId, provider_addr: &ConsAddress)
        -> CcvResult<ConsAddress>;

    /// Provider validator owning `consumer_addr` on `chain_id`. `None` if the
    /// key is retired or no provider validator stands behind it.
    fn provider_addr(
        &self,
        chain_id: &ChainId,
        consumer_addr: &ConsAddress,
    ) -> CcvResult<Option<ConsAddress>>;

    /// Channel state of a consumer chain.
    fn channel_state(&self, chain_id: &ChainId) -> CcvResult<ChannelState>;
}
