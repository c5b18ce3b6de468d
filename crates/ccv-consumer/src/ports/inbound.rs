//! # Inbound Ports
//!
//! What the consumer module offers the host application.

use crate::domain::ConsumerGenesis;
use ccv_types::{
    Acknowledgement, BlockContext, CcvResult, ChainId, ChannelState, ConsAddress, Infraction,
    TransportEvent, ValidatorUpdate,
};

/// Consumer module API, called once per block step by the host.
pub trait ConsumerApi {
    /// Load the genesis handed over by the provider (or a restart export).
    /// Returns the validator set consensus should start with.
    fn init_genesis(
        &mut self,
        ctx: BlockContext,
        genesis: ConsumerGenesis,
    ) -> CcvResult<Vec<ValidatorUpdate>>;

    /// Snapshot the consumer state for a restart.
    fn export_genesis(&self) -> CcvResult<ConsumerGenesis>;

    /// Carry the current VSC id over to the next height.
    fn begin_block(&mut self, ctx: BlockContext) -> CcvResult<()>;

    /// Queue maturity notifications, send pending packets and return the
    /// validator updates for consensus.
    fn end_block(&mut self, ctx: BlockContext) -> CcvResult<Vec<ValidatorUpdate>>;

    /// Process a transport callback. `RecvPacket` yields an acknowledgement.
    fn handle_event(
        &mut self,
        ctx: BlockContext,
        event: TransportEvent,
    ) -> CcvResult<Option<Acknowledgement>>;

    /// Slashing hook: queue a slash request for the provider.
    fn slash(
        &mut self,
        ctx: BlockContext,
        addr: ConsAddress,
        power: i64,
        infraction_height: u64,
        infraction: Infraction,
    ) -> CcvResult<()>;

    /// Transaction filter consulted by the host's validation pipeline.
    fn is_message_allowed(&self, chain_id: &ChainId, type_url: &str) -> CcvResult<bool>;

    /// State of the channel to the provider.
    fn channel_state(&self) -> CcvResult<ChannelState>;
}
