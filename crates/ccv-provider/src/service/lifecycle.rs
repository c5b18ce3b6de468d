//! # Consumer Lifecycle
//!
//! Registration, launch at spawn time, the provider half of the channel
//! handshake, and removal.

use super::*;
use ccv_consumer::{ConsumerGenesis, ConsumerParams};

impl Keeper<'_> {
    pub(crate) fn add_consumer(&mut self, proposal: ConsumerAdditionProposal) -> CcvResult<()> {
        if self.store.consumer_chain(&proposal.chain_id)?.is_some() {
            return Err(CcvError::ChainAlreadyRegistered(proposal.chain_id));
        }
        self.store
            .set_consumer_chain(&ConsumerChain::from_proposal(&proposal))?;
        info!(
            "[ccv-provider] registered consumer chain {} (spawn time {})",
            proposal.chain_id, proposal.spawn_time
        );
        Ok(())
    }

    pub(crate) fn remove_consumer(&mut self, proposal: ConsumerRemovalProposal) -> CcvResult<()> {
        let mut chain = self.store.require_chain(&proposal.chain_id)?;
        if chain.is_closed() {
            return Err(CcvError::UnknownChain(proposal.chain_id));
        }
        chain.stop_time = Some(proposal.stop_time);
        self.store.set_consumer_chain(&chain)?;
        info!(
            "[ccv-provider] consumer chain {} scheduled to stop at {}",
            proposal.chain_id, proposal.stop_time
        );
        Ok(())
    }

    pub(crate) fn modify_consumer(
        &mut self,
        proposal: ConsumerModificationProposal,
    ) -> CcvResult<()> {
        let mut chain = self.store.require_chain(&proposal.chain_id)?;
        if chain.is_closed() {
            return Err(CcvError::UnknownChain(proposal.chain_id));
        }
        chain.validator_set_cap = proposal.validator_set_cap;
        chain.min_power = proposal.min_power;
        self.store.set_consumer_chain(&chain)?;
        info!(
            "[ccv-provider] consumer chain {}: validator set cap {}, min power {}",
            proposal.chain_id, proposal.validator_set_cap, proposal.min_power
        );
        Ok(())
    }

    /// Stop chains past their stop time and launch chains past their spawn time.
    pub(crate) fn launch_and_stop_chains(&mut self) -> CcvResult<()> {
        let now = self.ctx.time;
        for chain in self.store.consumer_chains()? {
            let chain_id = chain.chain_id.clone();
            if chain.stop_due(now) {
                self.isolated(&chain_id, |k| k.stop_consumer_chain(&chain_id, "stop_time"))?;
            } else if chain.launch_due(now) {
                self.isolated(&chain_id, |k| k.launch_chain(chain))?;
            }
        }
        Ok(())
    }

    /// Create the consumer client and the consumer genesis.
    fn launch_chain(&mut self, mut chain: ConsumerChain) -> CcvResult<()> {
        let initial_set = self.next_consumer_set(&chain)?;
        if initial_set.is_empty() {
            warn!(
                "[ccv-provider] postponing launch of {}: no validator qualifies",
                chain.chain_id
            );
            return Ok(());
        }
        let counter = self.store.client_counter()?;
        let client_id = client_id_for(counter);
        self.store.set_client_counter(counter + 1)?;

        chain.launch = Some(LaunchInfo {
            client_id: client_id.clone(),
            launch_height: self.ctx.height,
            launch_time: self.ctx.time,
        });
        let params = ConsumerParams {
            ccv_timeout_period: self.params.ccv_timeout_period,
            unbonding_period: chain.unbonding_period,
        };
        let genesis = ConsumerGenesis::new_chain(
            params,
            PROVIDER_CLIENT_ID,
            initial_updates(&initial_set),
            chain.pre_ccv,
        );

        self.store.set_consumer_genesis(&chain.chain_id, &genesis)?;
        self.store.set_last_sent(&chain.chain_id, &initial_set)?;
        self.store.set_consumer_chain(&chain)?;
        info!(
            "[ccv-provider] launched consumer chain {} with client {} and {} validators",
            chain.chain_id,
            client_id,
            initial_set.len()
        );
        Ok(())
    }

    /// Provider side of the handshake: the consumer asked to open the channel.
    pub(crate) fn on_chan_open_try(
        &mut self,
        chain_id: ChainId,
        channel_id: ChannelId,
        port_id: &str,
        order: ChannelOrder,
        version: &str,
        client_id: &str,
    ) -> CcvResult<()> {
        validate_handshake(order, port_id, PROVIDER_PORT_ID, version)?;
        let mut chain = self.store.require_chain(&chain_id)?;
        let launch = chain.launch.as_ref().ok_or_else(|| {
            CcvError::InvalidHandshake(format!("consumer chain {chain_id} has not launched"))
        })?;
        if launch.client_id != client_id {
            return Err(CcvError::InvalidHandshake(format!(
                "client {client_id:?} does not match consumer client {:?}",
                launch.client_id
            )));
        }
        if chain.state() != ChannelState::Uninitialized {
            return Err(CcvError::ChannelAlreadyExists(chain_id));
        }

        chain
            .channel
            .transition_to(&chain_id, ChannelState::HandshakeInProgress)?;
        chain.channel.channel_id = Some(channel_id.clone());
        self.store.set_consumer_chain(&chain)?;
        self.store.set_channel_chain(&channel_id, &chain_id)?;
        debug!(
            "[ccv-provider] handshake started for {} on {}",
            chain_id, channel_id
        );
        Ok(())
    }

    pub(crate) fn on_chan_open_confirm(&mut self, channel_id: &ChannelId) -> CcvResult<()> {
        let mut chain = self.chain_for_channel(channel_id)?;
        chain
            .channel
            .transition_to(&chain.chain_id, ChannelState::Established)?;
        self.store.set_consumer_chain(&chain)?;
        info!(
            "[ccv-provider] CCV channel {} established with {}",
            channel_id, chain.chain_id
        );
        Ok(())
    }

    pub(crate) fn on_chan_close_confirm(&mut self, channel_id: &ChannelId) -> CcvResult<()> {
        let chain = self.chain_for_channel(channel_id)?;
        self.stop_consumer_chain(&chain.chain_id, "channel_closed")
    }
}
