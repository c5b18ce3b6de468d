//! # Consumer Flows
//!
//! Changeover of a standalone chain, slash request delivery guarantees and
//! the transaction filter, observed from the consumer side.

#[cfg(test)]
mod tests {
    use crate::harness::*;
    use anyhow::Result;
    use ccv_consumer::ConsumerApi;
    use ccv_provider::{ProviderApi, ProviderParams};
    use ccv_types::{ChannelState, ConsumerPacketData, Fraction, Infraction};

    const VALIDATORS: [(u8, i64); 4] = [(1, 100), (2, 80), (3, 60), (4, 40)];

    /// Launched consumer whose provider channel is set by a first VSC.
    fn running(params: ProviderParams) -> Result<Network> {
        let mut net = Network::new(&VALIDATORS, params)?;
        net.launch_consumer(&chain("consumer-1")?)?;
        net.staking_mut().set_power(&addr(4), 45);
        net.produce_block()?;
        Ok(net)
    }

    fn generous_params() -> ProviderParams {
        ProviderParams {
            slash_meter_ceiling_fraction: Fraction::percent(100),
            ..default_params()
        }
    }

    fn slashes_for(net: &Network, seed: u8) -> usize {
        net.deliveries
            .iter()
            .filter(|d| matches!(&d.data, ConsumerPacketData::Slash(s) if s.validator.address == addr(seed)))
            .count()
    }

    // =========================================================================
    // CHANGEOVER
    // =========================================================================

    #[test]
    fn test_changeover_replaces_standalone_set() -> Result<()> {
        let mut net = Network::new(&VALIDATORS, default_params())?;
        let consumer = chain("standalone-1")?;
        net.add_consumer(&consumer, net.ctx().time, true)?;
        net.set_standalone(&consumer, vec![key(40), key(41), key(1)]);

        net.produce_block()?;

        let node = net.consumer(&consumer)?;
        assert_eq!(node.consensus, net.provider_set());
        assert!(!node.consensus.contains_key(&addr(40)));
        assert_eq!(node.consensus.get(&addr(1)), Some(&100));
        assert_eq!(node.service.cross_chain_validators()?.len(), VALIDATORS.len());
        Ok(())
    }

    // =========================================================================
    // SLASH DELIVERY
    // =========================================================================

    #[test]
    fn test_one_slash_in_flight_at_a_time() -> Result<()> {
        let mut net = running(generous_params())?;
        let consumer = chain("consumer-1")?;
        net.pause_relayer(&consumer);
        net.slash_on_consumer(&consumer, addr(1), 100, Infraction::Downtime)?;
        net.slash_on_consumer(&consumer, addr(2), 80, Infraction::Downtime)?;

        net.produce_blocks(3)?;
        let node = net.consumer(&consumer)?;
        assert!(node.service.in_flight_slash()?.is_some());
        assert_eq!(node.service.pending_packets()?.len(), 1);

        net.resume_relayer(&consumer)?;
        net.produce_block()?;
        assert!(net.provider.staking().is_jailed(&addr(1)));
        assert!(net.provider.staking().is_jailed(&addr(2)));
        Ok(())
    }

    #[test]
    fn test_timed_out_slash_is_resent() -> Result<()> {
        let mut net = running(generous_params())?;
        let consumer = chain("consumer-1")?;
        net.pause_relayer(&consumer);
        net.slash_on_consumer(&consumer, addr(1), 100, Infraction::Downtime)?;
        net.slash_on_consumer(&consumer, addr(2), 80, Infraction::Downtime)?;
        net.produce_block()?;

        let ccv_timeout = default_params().ccv_timeout_period;
        net.produce_blocks(ccv_timeout / BLOCK_TIME + 5)?;
        assert!(!net.provider.staking().is_jailed(&addr(1)));

        net.resume_relayer(&consumer)?;
        assert_eq!(slashes_for(&net, 1), 0);
        assert!(net.consumer(&consumer)?.service.in_flight_slash()?.is_none());

        net.produce_block()?;
        assert!(net.provider.staking().is_jailed(&addr(1)));
        assert_eq!(slashes_for(&net, 1), 1);

        net.produce_block()?;
        assert!(net.provider.staking().is_jailed(&addr(2)));
        Ok(())
    }

    #[test]
    fn test_double_sign_request_tombstones() -> Result<()> {
        let mut net = running(default_params())?;
        let consumer = chain("consumer-1")?;
        net.slash_on_consumer(&consumer, addr(2), 80, Infraction::DoubleSign)?;
        net.produce_block()?;

        let staking = net.provider.staking();
        let validator = staking.validator(&addr(2)).map(|v| (v.jailed, v.tombstoned));
        assert_eq!(validator, Some((true, true)));
        assert_eq!(staking.slashes.len(), 1);
        assert_eq!(staking.slashes[0].fraction, Fraction::percent(5));
        Ok(())
    }

    #[test]
    fn test_error_ack_closes_consumer_channel() -> Result<()> {
        let params = ProviderParams {
            max_throttled_packets: 1,
            ..default_params()
        };
        let mut net = running(params)?;
        let consumer = chain("consumer-1")?;
        for seed in 1..=3 {
            net.slash_on_consumer(&consumer, addr(seed), 100, Infraction::Downtime)?;
        }
        net.produce_blocks(3)?;

        let rejected = net.deliveries.iter().filter(|d| !d.ack.is_success()).count();
        assert_eq!(rejected, 1);
        let node = net.consumer(&consumer)?;
        assert_eq!(node.service.channel_state()?, ChannelState::Closed);
        assert!(!node
            .service
            .is_message_allowed(&consumer, "/cosmos.bank.v1beta1.MsgSend")?);
        Ok(())
    }

    // =========================================================================
    // MESSAGE FILTER
    // =========================================================================

    #[test]
    fn test_message_filter_on_running_consumer() -> Result<()> {
        let net = running(default_params())?;
        let consumer = chain("consumer-1")?;
        let service = &net.consumer(&consumer)?.service;

        assert!(service.is_message_allowed(&consumer, "/cosmos.bank.v1beta1.MsgSend")?);
        assert!(!service.is_message_allowed(&consumer, "/cosmos.slashing.v1beta1.MsgUnjail")?);
        assert!(!service.is_message_allowed(
            &consumer,
            "/cosmos.evidence.v1beta1.MsgSubmitEvidence"
        )?);
        assert!(!service.is_message_allowed(&chain("other-1")?, "/cosmos.bank.v1beta1.MsgSend")?);
        Ok(())
    }
}
