//! # Channel Handshake
//!
//! The consumer opens the CCV channel; the provider only confirms it.

use super::*;

impl Keeper<'_> {
    pub(crate) fn on_chan_open_init(
        &mut self,
        channel_id: ChannelId,
        port_id: &str,
        order: ChannelOrder,
        version: &str,
        client_id: &str,
    ) -> CcvResult<()> {
        validate_handshake(order, port_id, CONSUMER_PORT_ID, version)?;
        let provider_client = self.store.provider_client_id()?.ok_or_else(|| {
            CcvError::InvalidHandshake("consumer genesis was never loaded".to_string())
        })?;
        if client_id != provider_client {
            return Err(CcvError::InvalidHandshake(format!(
                "client {client_id:?} is not the provider client {provider_client:?}"
            )));
        }

        let mut channel = self.store.channel()?;
        if channel.state != ChannelState::Uninitialized {
            return Err(CcvError::ChannelAlreadyExists(self.chain_id.clone()));
        }
        channel.transition_to(self.chain_id, ChannelState::HandshakeInProgress)?;
        channel.channel_id = Some(channel_id.clone());
        self.store.set_channel(&channel)?;
        info!(
            "[ccv-consumer] opening CCV channel {} to the provider",
            channel_id
        );
        Ok(())
    }

    pub(crate) fn on_chan_open_ack(
        &mut self,
        channel_id: &ChannelId,
        counterparty_version: &str,
    ) -> CcvResult<()> {
        self.require_own_channel(channel_id)?;
        if counterparty_version != CCV_VERSION {
            return Err(CcvError::InvalidHandshake(format!(
                "invalid counterparty version {counterparty_version:?}, expected {CCV_VERSION:?}"
            )));
        }
        let mut channel = self.store.channel()?;
        channel.transition_to(self.chain_id, ChannelState::Established)?;
        self.store.set_channel(&channel)?;
        info!("[ccv-consumer] CCV channel {} established", channel_id);
        Ok(())
    }

    pub(crate) fn on_chan_close_confirm(&mut self, channel_id: &ChannelId) -> CcvResult<()> {
        self.require_own_channel(channel_id)?;
        self.close_channel("closed by the provider")
    }
}
