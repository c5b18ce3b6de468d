//! # Network Harness
//!
//! One provider and its consumers sharing a block clock. After every block
//! step the relayer moves packets in both directions and carries the
//! acknowledgements straight back. A paused relayer holds a chain's packets
//! until it resumes; anything past its timeout is then delivered as a
//! timeout to the sender.

use anyhow::{anyhow, Result};
use ccv_consumer::{ConsumerApi, ConsumerDependencies, ConsumerGenesis, ConsumerService};
use ccv_provider::{
    ConsumerAdditionProposal, InMemoryStaking, ProviderApi, ProviderDependencies,
    ProviderGenesis, ProviderMsg, ProviderParams, ProviderService, ProviderStore,
    StakingKeeper, PROVIDER_CLIENT_ID,
};
use ccv_types::{
    decode_packet, Acknowledgement, BlockContext, ChainId, ChannelId, ChannelOrder,
    ConsAddress, ConsensusPubKey, ConsumerPacketData, Fraction, InMemoryKvStore,
    InMemoryTransport, Infraction, Packet, SentPacket, TransportEvent, ValidatorUpdate,
    VscPacketData, CCV_VERSION, CONSUMER_PORT_ID, PROVIDER_PORT_ID,
};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

pub type Provider = ProviderService<InMemoryKvStore, InMemoryStaking, InMemoryTransport>;
pub type Consumer = ConsumerService<InMemoryKvStore, InMemoryTransport>;

/// Seconds between blocks.
pub const BLOCK_TIME: u64 = 10;

/// Unbonding period of every consumer the harness registers.
pub const UNBONDING_PERIOD: u64 = 100;

/// Validator key derived from a one-byte seed.
pub fn key(seed: u8) -> ConsensusPubKey {
    ConsensusPubKey::ed25519_from_seed([seed; 32])
}

/// Consensus address of [`key`].
pub fn addr(seed: u8) -> ConsAddress {
    key(seed).address()
}

pub fn chain(id: &str) -> Result<ChainId> {
    Ok(ChainId::new(id)?)
}

/// Parameters tuned for short scenarios: one replenishment every ten blocks.
pub fn default_params() -> ProviderParams {
    ProviderParams {
        ccv_timeout_period: 200,
        vsc_timeout_period: 400,
        slash_meter_replenish_period: 100,
        slash_meter_replenish_fraction: Fraction::percent(10),
        slash_meter_ceiling_fraction: Fraction::percent(10),
        slash_meter_floor_fraction: Fraction::percent(5),
        max_throttled_packets: 100,
        downtime_jail_duration: 600,
        slash_fraction_double_sign: Fraction::percent(5),
    }
}

/// A running consumer chain.
pub struct ConsumerNode {
    pub service: Consumer,
    /// Channel id, identical on both ends.
    pub channel_id: ChannelId,
    /// Consensus validator set, built from the updates the module returned.
    pub consensus: BTreeMap<ConsAddress, i64>,
}

impl ConsumerNode {
    fn apply(&mut self, updates: &[ValidatorUpdate]) {
        for update in updates {
            if update.power == 0 {
                self.consensus.remove(&update.address());
            } else {
                self.consensus.insert(update.address(), update.power);
            }
        }
    }
}

/// A consumer packet as the provider received it.
#[derive(Clone, Debug)]
pub struct Delivery {
    pub chain_id: ChainId,
    pub data: ConsumerPacketData,
    pub ack: Acknowledgement,
}

enum Held {
    ToConsumer(SentPacket),
    ToProvider(SentPacket),
}

/// Provider, consumers and the relayer between them.
pub struct Network {
    pub provider: Provider,
    pub consumers: BTreeMap<ChainId, ConsumerNode>,
    /// Every packet the provider sent, in send order.
    pub provider_log: Vec<SentPacket>,
    /// Every consumer packet the provider received, in arrival order.
    pub deliveries: Vec<Delivery>,
    channels: BTreeMap<ChannelId, ChainId>,
    standalone: BTreeMap<ChainId, Vec<ConsensusPubKey>>,
    paused: BTreeSet<ChainId>,
    held: BTreeMap<ChainId, Vec<Held>>,
    ctx: BlockContext,
    next_channel: u64,
}

impl Network {
    /// Provider at height 1 with one validator per `(seed, power)`.
    pub fn new(validators: &[(u8, i64)], params: ProviderParams) -> Result<Self> {
        let staking =
            InMemoryStaking::with_validators(validators.iter().map(|&(s, p)| (key(s), p)));
        let mut provider = ProviderService::new(ProviderDependencies {
            store: InMemoryKvStore::new(),
            staking,
            transport: InMemoryTransport::new(),
        });
        let ctx = BlockContext::new(1, BLOCK_TIME);
        provider.init_genesis(
            ctx,
            ProviderGenesis {
                params,
                ..Default::default()
            },
        )?;
        Ok(Self {
            provider,
            consumers: BTreeMap::new(),
            provider_log: Vec::new(),
            deliveries: Vec::new(),
            channels: BTreeMap::new(),
            standalone: BTreeMap::new(),
            paused: BTreeSet::new(),
            held: BTreeMap::new(),
            ctx,
            next_channel: 0,
        })
    }

    /// Context of the last produced block.
    pub fn ctx(&self) -> BlockContext {
        self.ctx
    }

    pub fn staking_mut(&mut self) -> &mut InMemoryStaking {
        self.provider.staking_mut()
    }

    pub fn consumer(&self, chain_id: &ChainId) -> Result<&ConsumerNode> {
        self.consumers
            .get(chain_id)
            .ok_or_else(|| anyhow!("consumer {chain_id} is not running"))
    }

    pub fn consumer_mut(&mut self, chain_id: &ChainId) -> Result<&mut ConsumerNode> {
        self.consumers
            .get_mut(chain_id)
            .ok_or_else(|| anyhow!("consumer {chain_id} is not running"))
    }

    /// Register a consumer launching at `spawn_time`.
    pub fn add_consumer(&mut self, chain_id: &ChainId, spawn_time: u64, pre_ccv: bool) -> Result<()> {
        self.provider.handle_msg(
            self.ctx,
            ProviderMsg::ConsumerAddition(ConsumerAdditionProposal {
                chain_id: chain_id.clone(),
                spawn_time,
                unbonding_period: UNBONDING_PERIOD,
                validator_set_cap: 0,
                min_power: 0,
                pre_ccv,
            }),
        )?;
        Ok(())
    }

    /// Validators a pre-CCV chain runs with until its changeover, power 10 each.
    pub fn set_standalone(&mut self, chain_id: &ChainId, keys: Vec<ConsensusPubKey>) {
        self.standalone.insert(chain_id.clone(), keys);
    }

    /// Register a consumer that launches in the next block.
    pub fn launch_consumer(&mut self, chain_id: &ChainId) -> Result<()> {
        self.add_consumer(chain_id, self.ctx.time, false)?;
        self.produce_block()
    }

    /// Produce one block on every chain.
    pub fn produce_block(&mut self) -> Result<()> {
        self.ctx = self.ctx.next(BLOCK_TIME);
        let ctx = self.ctx;

        self.provider.begin_block(ctx)?;
        self.start_launched_consumers()?;
        for node in self.consumers.values_mut() {
            node.service.begin_block(ctx)?;
        }
        self.relay()?;

        self.provider.end_block(ctx)?;
        self.relay()?;

        for node in self.consumers.values_mut() {
            let updates = node.service.end_block(ctx)?;
            node.apply(&updates);
        }
        self.relay()
    }

    pub fn produce_blocks(&mut self, count: u64) -> Result<()> {
        for _ in 0..count {
            self.produce_block()?;
        }
        Ok(())
    }

    /// Queue a slash request on `chain_id` for the current height.
    pub fn slash_on_consumer(
        &mut self,
        chain_id: &ChainId,
        consumer_addr: ConsAddress,
        power: i64,
        infraction: Infraction,
    ) -> Result<()> {
        let ctx = self.ctx;
        self.consumer_mut(chain_id)?
            .service
            .slash(ctx, consumer_addr, power, ctx.height, infraction)?;
        Ok(())
    }

    /// Hold every packet to and from `chain_id`.
    pub fn pause_relayer(&mut self, chain_id: &ChainId) {
        self.paused.insert(chain_id.clone());
    }

    /// Deliver or time out the held packets of `chain_id`, then relay normally.
    pub fn resume_relayer(&mut self, chain_id: &ChainId) -> Result<()> {
        self.paused.remove(chain_id);
        for held in self.held.remove(chain_id).unwrap_or_default() {
            match held {
                Held::ToConsumer(sent) if self.expired(&sent) => {
                    debug!("relayer: VSC packet {} to {} timed out", sent.sequence, chain_id);
                    self.provider
                        .handle_event(self.ctx, TransportEvent::Timeout(packet_of(sent)))?;
                }
                Held::ToConsumer(sent) => self.deliver_to_consumer(chain_id, sent)?,
                Held::ToProvider(sent) if self.expired(&sent) => {
                    debug!("relayer: packet {} from {} timed out", sent.sequence, chain_id);
                    let ctx = self.ctx;
                    self.consumer_mut(chain_id)?
                        .service
                        .handle_event(ctx, TransportEvent::Timeout(packet_of(sent)))?;
                }
                Held::ToProvider(sent) => self.deliver_to_provider(chain_id, sent)?,
            }
        }
        self.relay()
    }

    /// Move packets until both directions are quiet.
    pub fn relay(&mut self) -> Result<()> {
        loop {
            let mut moved = false;

            for sent in self.provider.transport_mut().drain() {
                moved = true;
                self.provider_log.push(sent.clone());
                let chain_id = self
                    .channels
                    .get(&sent.channel_id)
                    .cloned()
                    .ok_or_else(|| anyhow!("no consumer behind {}", sent.channel_id))?;
                if self.paused.contains(&chain_id) {
                    self.held
                        .entry(chain_id)
                        .or_default()
                        .push(Held::ToConsumer(sent));
                } else {
                    self.deliver_to_consumer(&chain_id, sent)?;
                }
            }

            let chain_ids: Vec<ChainId> = self.consumers.keys().cloned().collect();
            for chain_id in chain_ids {
                let sent = self.consumer_mut(&chain_id)?.service.transport_mut().drain();
                for packet in sent {
                    moved = true;
                    if self.paused.contains(&chain_id) {
                        self.held
                            .entry(chain_id.clone())
                            .or_default()
                            .push(Held::ToProvider(packet));
                    } else {
                        self.deliver_to_provider(&chain_id, packet)?;
                    }
                }
            }

            if !moved {
                return Ok(());
            }
        }
    }

    /// Every VSC packet the provider sent to `chain_id`, decoded.
    pub fn vsc_packets_to(&self, chain_id: &ChainId) -> Result<Vec<VscPacketData>> {
        let channel_id = &self.consumer(chain_id)?.channel_id;
        self.provider_log
            .iter()
            .filter(|sent| &sent.channel_id == channel_id)
            .map(|sent| Ok(decode_packet(&sent.data)?))
            .collect()
    }

    /// Unjailed provider validators by power, as a consumer without
    /// key assignments should see them.
    pub fn provider_set(&self) -> BTreeMap<ConsAddress, i64> {
        self.provider
            .staking()
            .validators_by_power()
            .into_iter()
            .filter(|v| !v.jailed)
            .map(|v| (v.cons_addr, v.power))
            .collect()
    }

    /// Total bonded power of jailed validators.
    pub fn jailed_power(&self) -> i64 {
        let staking = self.provider.staking();
        staking
            .jailed_until
            .keys()
            .filter_map(|a| staking.validator(a))
            .map(|v| v.power)
            .sum()
    }

    /// Rebuild every module from its exported genesis on fresh stores.
    /// Staking and transports belong to the host and carry over.
    pub fn restart(&mut self) -> Result<()> {
        let ctx = self.ctx;
        let genesis = self.provider.export_genesis()?;
        let mut provider = ProviderService::new(ProviderDependencies {
            store: InMemoryKvStore::new(),
            staking: self.provider.staking().clone(),
            transport: self.provider.transport().clone(),
        });
        provider.init_genesis(ctx, genesis)?;
        self.provider = provider;

        for (chain_id, node) in self.consumers.iter_mut() {
            let genesis = node.service.export_genesis()?;
            let mut service = ConsumerService::new(
                ConsumerDependencies {
                    store: InMemoryKvStore::new(),
                    transport: node.service.transport().clone(),
                },
                chain_id.clone(),
            );
            service.init_genesis(ctx, genesis)?;
            node.service = service;
        }
        Ok(())
    }

    fn expired(&self, sent: &SentPacket) -> bool {
        self.ctx.time >= sent.timeout_timestamp
    }

    fn start_launched_consumers(&mut self) -> Result<()> {
        let launched: Vec<ChainId> = self
            .provider
            .store()
            .consumer_chains()?
            .into_iter()
            .filter(|c| c.is_launched() && !c.is_closed() && !self.consumers.contains_key(&c.chain_id))
            .map(|c| c.chain_id)
            .collect();

        for chain_id in launched {
            let mut genesis: ConsumerGenesis = self
                .provider
                .consumer_genesis(&chain_id)?
                .ok_or_else(|| anyhow!("{chain_id} launched without a consumer genesis"))?;
            let standalone = self.standalone.remove(&chain_id).unwrap_or_default();
            genesis.standalone_validators = standalone.clone();

            let channel_id = ChannelId::new(format!("channel-{}", self.next_channel))?;
            self.next_channel += 1;
            let mut node = ConsumerNode {
                service: ConsumerService::new(
                    ConsumerDependencies {
                        store: InMemoryKvStore::new(),
                        transport: InMemoryTransport::new(),
                    },
                    chain_id.clone(),
                ),
                channel_id: channel_id.clone(),
                consensus: standalone.iter().map(|k| (k.address(), 10)).collect(),
            };
            let initial = node.service.init_genesis(self.ctx, genesis)?;
            node.apply(&initial);
            self.handshake(&chain_id, &mut node)?;

            debug!("relayer: connected {} on {}", chain_id, channel_id);
            self.channels.insert(channel_id, chain_id.clone());
            self.consumers.insert(chain_id, node);
        }
        Ok(())
    }

    fn handshake(&mut self, chain_id: &ChainId, node: &mut ConsumerNode) -> Result<()> {
        let ctx = self.ctx;
        let channel_id = node.channel_id.clone();
        node.service.handle_event(
            ctx,
            TransportEvent::ChanOpenInit {
                channel_id: channel_id.clone(),
                port_id: CONSUMER_PORT_ID.to_string(),
                order: ChannelOrder::Ordered,
                version: CCV_VERSION.to_string(),
                client_id: PROVIDER_CLIENT_ID.to_string(),
            },
        )?;

        let client_id = self
            .provider
            .store()
            .require_chain(chain_id)?
            .launch
            .map(|l| l.client_id)
            .ok_or_else(|| anyhow!("{chain_id} has not launched"))?;
        self.provider.handle_event(
            ctx,
            TransportEvent::ChanOpenTry {
                chain_id: chain_id.clone(),
                channel_id: channel_id.clone(),
                port_id: PROVIDER_PORT_ID.to_string(),
                order: ChannelOrder::Ordered,
                version: CCV_VERSION.to_string(),
                client_id,
            },
        )?;

        node.service.handle_event(
            ctx,
            TransportEvent::ChanOpenAck {
                channel_id: channel_id.clone(),
                counterparty_version: CCV_VERSION.to_string(),
            },
        )?;
        self.provider
            .handle_event(ctx, TransportEvent::ChanOpenConfirm { channel_id })?;
        Ok(())
    }

    fn deliver_to_consumer(&mut self, chain_id: &ChainId, sent: SentPacket) -> Result<()> {
        let ctx = self.ctx;
        let packet = packet_of(sent);
        let ack = self
            .consumer_mut(chain_id)?
            .service
            .handle_event(ctx, TransportEvent::RecvPacket(packet.clone()))?
            .ok_or_else(|| anyhow!("{chain_id} returned no acknowledgement"))?;
        self.provider
            .handle_event(ctx, TransportEvent::Acknowledgement { packet, ack })?;
        Ok(())
    }

    fn deliver_to_provider(&mut self, chain_id: &ChainId, sent: SentPacket) -> Result<()> {
        let ctx = self.ctx;
        let packet = packet_of(sent);
        let data: ConsumerPacketData = decode_packet(&packet.data)?;
        let ack = self
            .provider
            .handle_event(ctx, TransportEvent::RecvPacket(packet.clone()))?
            .ok_or_else(|| anyhow!("provider returned no acknowledgement"))?;
        self.deliveries.push(Delivery {
            chain_id: chain_id.clone(),
            data,
            ack: ack.clone(),
        });
        self.consumer_mut(chain_id)?
            .service
            .handle_event(ctx, TransportEvent::Acknowledgement { packet, ack })?;
        Ok(())
    }
}

fn packet_of(sent: SentPacket) -> Packet {
    Packet {
        channel_id: sent.channel_id,
        sequence: sent.sequence,
        data: sent.data,
    }
}
