//! # Slash Requests
//!
//! Infractions seen by the consumer's consensus are forwarded to the
//! provider, which owns the stake.

use super::*;

impl Keeper<'_> {
    pub(crate) fn queue_slash(
        &mut self,
        address: ConsAddress,
        power: i64,
        infraction_height: u64,
        infraction: Infraction,
    ) -> CcvResult<()> {
        if self.store.is_pre_ccv()? {
            debug!(
                "[ccv-consumer] ignoring slash of {} before changeover",
                address
            );
            return Ok(());
        }
        if infraction == Infraction::Downtime && self.store.has_outstanding_downtime(&address)? {
            debug!(
                "[ccv-consumer] downtime of {} already reported, awaiting ack",
                address
            );
            return Ok(());
        }

        let data = SlashPacketData {
            validator: SlashedValidator { address, power },
            valset_update_id: self.vsc_id_at(infraction_height)?,
            infraction,
        };
        data.validate()?;

        if infraction == Infraction::Downtime {
            self.store.set_outstanding_downtime(&address)?;
        }
        let label = match infraction {
            Infraction::Downtime => "downtime",
            Infraction::DoubleSign => "double_sign",
        };
        info!(
            "[ccv-consumer] queued {} slash of {} at height {} (vsc {})",
            label, address, infraction_height, data.valset_update_id
        );
        self.store.push_pending_packet(ConsumerPacketData::Slash(data))?;
        metrics::record_slash_request(label);
        Ok(())
    }
}
