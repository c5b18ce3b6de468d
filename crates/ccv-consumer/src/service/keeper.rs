//! # Keeper
//!
//! Borrowed view over the service's collaborators for the duration of one
//! call.

use super::*;

/// One call's write-set and transport.
pub(crate) struct Keeper<'a> {
    pub(crate) store: &'a mut dyn KeyValueStore,
    pub(crate) transport: &'a mut dyn PacketSender,
    pub(crate) chain_id: &'a ChainId,
    pub(crate) ctx: BlockContext,
    pub(crate) params: ConsumerParams,
}

impl Keeper<'_> {
    /// VSC id in effect at `height`. Heights without a mapping belong to the
    /// genesis set.
    pub(crate) fn vsc_id_at(&self, height: u64) -> CcvResult<u64> {
        Ok(self.store.height_vsc_id(height)?.unwrap_or(0))
    }

    /// Move the provider channel to `Closed`. Already closed is a no-op.
    pub(crate) fn close_channel(&mut self, reason: &str) -> CcvResult<()> {
        let mut channel = self.store.channel()?;
        if channel.state.is_terminal() {
            return Ok(());
        }
        channel.transition_to(self.chain_id, ChannelState::Closed)?;
        self.store.set_channel(&channel)?;
        error!(
            "[ccv-consumer] CCV channel of {} closed at height {}: {}",
            self.chain_id, self.ctx.height, reason
        );
        Ok(())
    }

    /// Fail unless `channel_id` is the channel recorded for the provider.
    pub(crate) fn require_own_channel(&self, channel_id: &ChannelId) -> CcvResult<()> {
        match self.store.channel()?.channel_id {
            Some(ref id) if id == channel_id => Ok(()),
            _ => Err(CcvError::UnknownChannel(channel_id.clone())),
        }
    }
}
