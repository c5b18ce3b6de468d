//! # Provider Service
//!
//! The main service implementing the provider side of CCV.
//!
//! ## Architecture
//!
//! This service:
//! 1. Implements `ProviderApi` for block steps, messages and transport events
//! 2. Runs every call on a write-set over the store and commits only on success
//! 3. Gives each consumer its own nested write-set in `begin_block`/`end_block`,
//!    so an inconsistency on one chain is logged and skipped without
//!    blocking the others
//! 4. Uses dependency injection for the store, staking module and transport

mod api;
mod genesis;
mod keeper;
mod key_assignment;
mod lifecycle;
mod msgs;
mod relay;
mod throttle;
mod unbonding;
mod validator_set;

pub(crate) use keeper::{attributable_provider_addr, Keeper};

use crate::domain::{
    client_id_for, diff_validator_sets, initial_updates, plan_assignment, rank_validators,
    AssignedKey, AssignmentPlan, ConsumerAdditionProposal, ConsumerAddrRecord, ConsumerChain,
    ConsumerModificationProposal, ConsumerRemovalProposal, ConsumerState, ConsumerValidator,
    ConsumerValidatorSet, DuplicateVoteEvidence, GlobalSlashEntry, KeyRecord, KeyStatus,
    LastSentEntry, LaunchInfo,
    ProviderGenesis, ProviderMsg, ProviderParams, SlashMeter, ThrottleDecision, ThrottledEntry,
    ThrottledPacket, UnbondingIndexEntry, UnbondingOp, ValidatorInfo, VscIdToHeight, VscSendTime,
};
use crate::metrics;
use crate::ports::{PacketSender, ProviderApi, StakingKeeper};
use crate::store::ProviderStore;
use ccv_types::{
    decode_packet, encode_packet, validate_handshake, Acknowledgement, BlockContext,
    CachedKvStore, CcvError, CcvResult, ChainId, ChannelId, ChannelOrder, ChannelState,
    ConsAddress, ConsensusPubKey, ConsumerPacketData, ErrorKind, Infraction, KeyValueStore,
    Packet, SlashPacketData, Timestamp, TransportEvent, VscMaturedPacketData, VscPacketData,
    PROVIDER_PORT_ID,
};
use std::collections::BTreeSet;
use tracing::{debug, error, info, warn};

/// Client id of the provider chain on every consumer.
pub const PROVIDER_CLIENT_ID: &str = "07-tendermint-0";

/// The CCV Provider Service.
pub struct ProviderService<S, K, T>
where
    S: KeyValueStore,
    K: StakingKeeper,
    T: PacketSender,
{
    /// Key-value store for persistence.
    pub(crate) store: S,
    /// Host staking and slashing module.
    pub(crate) staking: K,
    /// Packet transport towards consumers.
    pub(crate) transport: T,
}

/// Dependencies for ProviderService
pub struct ProviderDependencies<S, K, T> {
    pub store: S,
    pub staking: K,
    pub transport: T,
}

impl<S, K, T> ProviderService<S, K, T>
where
    S: KeyValueStore,
    K: StakingKeeper,
    T: PacketSender,
{
    /// Create a provider service. State is whatever the store already holds.
    pub fn new(deps: ProviderDependencies<S, K, T>) -> Self {
        Self {
            store: deps.store,
            staking: deps.staking,
            transport: deps.transport,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn staking(&self) -> &K {
        &self.staking
    }

    pub fn staking_mut(&mut self) -> &mut K {
        &mut self.staking
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Current module parameters.
    pub fn params(&self) -> CcvResult<ProviderParams> {
        self.store.params()
    }

    /// Consumer genesis produced when `chain_id` launched.
    pub fn consumer_genesis(&self, chain_id: &ChainId) -> CcvResult<Option<ccv_consumer::ConsumerGenesis>> {
        self.store.consumer_genesis(chain_id)
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
                staking: &mut self.staking,
                transport: &mut self.transport,
                ctx,
                params,
            };
            f(&mut keeper)?
        };
        cache.commit()?;
        Ok(result)
    }
}
