//! # Consumer Service
//!
//! The main service implementing the consumer side of CCV.
//!
//! ## Architecture
//!
//! This service:
//! 1. Implements `ConsumerApi` for block steps, transport events and the
//!    slashing hook
//! 2. Runs every call on a write-set over the store and commits only on success
//! 3. Keeps at most one slash packet in flight towards the provider
//! 4. Uses dependency injection for the store and transport

mod api;
mod block;
mod genesis;
mod handshake;
mod keeper;
mod relay;
mod slashing;

pub(crate) use keeper::Keeper;

use crate::domain::{
    apply_changes, changeover_updates, is_message_allowed, merge_changes, ConsumerGenesis,
    ConsumerParams, CrossChainValidatorSet, HeightToVscId, InFlightPacket, MaturingVscPacket,
};
use crate::metrics;
use crate::ports::{ConsumerApi, PacketSender};
use crate::store::ConsumerStore;
use ccv_types::{
    decode_packet, encode_packet, validate_handshake, Acknowledgement, BlockContext,
    CachedKvStore, CcvError, CcvResult, ChainId, ChannelId, ChannelOrder, ChannelState,
    ConsAddress, ConsumerPacketData, ErrorKind, Infraction, KeyValueStore, Packet,
    SlashPacketData, SlashedValidator, TransportEvent, ValidatorUpdate, VscMaturedPacketData,
    VscPacketData, CCV_VERSION, CONSUMER_PORT_ID,
};
use std::collections::BTreeMap;
use tracing::{debug, error, info, warn};

/// The CCV Consumer Service.
pub struct ConsumerService<S, T>
where
    S: KeyValueStore,
    T: PacketSender,
{
    /// Key-value store for persistence.
    pub(crate) store: S,
    /// Packet transport towards the provider.
    pub(crate) transport: T,
    /// Chain id of this consumer.
    pub(crate) chain_id: ChainId,
}

/// Dependencies for ConsumerService
pub struct ConsumerDependencies<S, T> {
    pub store: S,
    pub transport: T,
}

impl<S, T> ConsumerService<S, T>
where
    S: KeyValueStore,
    T: PacketSender,
{
    /// Create a consumer service for `chain_id`. State is whatever the store
    /// already holds.
    pub fn new(deps: ConsumerDependencies<S, T>, chain_id: ChainId) -> Self {
        Self {
            store: deps.store,
            transport: deps.transport,
            chain_id,
        }
    }

    pub fn chain_id(&self) -> &ChainId {
        &self.chain_id
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Current validator set, by consumer address.
    pub fn cross_chain_validators(&self) -> CcvResult<CrossChainValidatorSet> {
        self.store.cross_chain_validators()
    }

    /// Packets waiting to be sent to the provider.
    pub fn pending_packets(&self) -> CcvResult<Vec<ConsumerPacketData>> {
        self.store.pending_packets()
    }

    /// Slash packet awaiting its acknowledgement.
    pub fn in_flight_slash(&self) -> CcvResult<Option<InFlightPacket>> {
        self.store.in_flight_slash()
    }

    /// Run `f` on a fresh write-set, committing it only if `f` succeeds.
    pub(crate) fn with_keeper<R>(
        &mut self,
        ctx: BlockContext,
        f: impl FnOnce(&mut Keeper<'_>) -> CcvResult<R>,
    ) -> CcvResult<R> {
        let params = self.store.params()?;
        let mut cache = CachedKvStore::new(&mut self.store);
        let result = {
            let mut keeper = Keeper {
                store: &mut cache,
                transport: &mut self.transport,
                chain_id: &self.chain_id,
                ctx,
                params,
            };
            f(&mut keeper)?
        };
        cache.commit()?;
        Ok(result)
    }
}
