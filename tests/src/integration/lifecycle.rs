//! # Consumer Lifecycle
//!
//! Launch, validator set propagation, unbonding maturity, removal and
//! VSC timeout, driven through the relayer.

#[cfg(test)]
mod tests {
    use crate::harness::*;
    use anyhow::Result;
    use ccv_consumer::ConsumerApi;
    use ccv_provider::{ConsumerRemovalProposal, ProviderApi, ProviderMsg, ProviderStore};
    use ccv_types::ChannelState;

    const VALIDATORS: [(u8, i64); 4] = [(1, 100), (2, 80), (3, 60), (4, 40)];

    fn launched() -> Result<Network> {
        let mut net = Network::new(&VALIDATORS, default_params())?;
        net.launch_consumer(&chain("consumer-1")?)?;
        Ok(net)
    }

    // =========================================================================
    // LAUNCH
    // =========================================================================

    #[test]
    fn test_consumer_launches_at_spawn_time() -> Result<()> {
        let mut net = Network::new(&VALIDATORS, default_params())?;
        let consumer = chain("consumer-1")?;
        let spawn_time = net.ctx().time + 3 * BLOCK_TIME;
        net.add_consumer(&consumer, spawn_time, false)?;

        net.produce_blocks(2)?;
        assert!(net.consumers.is_empty());

        net.produce_block()?;
        let node = net.consumer(&consumer)?;
        assert_eq!(node.consensus, net.provider_set());
        assert_eq!(node.service.channel_state()?, ChannelState::Established);
        assert_eq!(net.provider.channel_state(&consumer)?, ChannelState::Established);
        Ok(())
    }

    #[test]
    fn test_no_vsc_packet_without_changes() -> Result<()> {
        let mut net = launched()?;
        net.produce_blocks(5)?;
        assert!(net.provider_log.is_empty());
        Ok(())
    }

    // =========================================================================
    // VALIDATOR SET PROPAGATION
    // =========================================================================

    #[test]
    fn test_power_changes_reach_consumer_consensus() -> Result<()> {
        let mut net = launched()?;
        let consumer = chain("consumer-1")?;

        net.staking_mut().set_power(&addr(2), 55);
        net.staking_mut().set_power(&addr(3), 0);
        net.produce_block()?;

        let consensus = &net.consumer(&consumer)?.consensus;
        assert_eq!(consensus.get(&addr(2)), Some(&55));
        assert!(!consensus.contains_key(&addr(3)));
        assert_eq!(consensus, &net.provider_set());

        let packets = net.vsc_packets_to(&consumer)?;
        assert_eq!(packets.len(), 1);
        assert_eq!(packets[0].validator_updates.len(), 2);
        Ok(())
    }

    #[test]
    fn test_vsc_ids_strictly_increase() -> Result<()> {
        let mut net = launched()?;
        let consumer = chain("consumer-1")?;
        for power in [90, 91, 92] {
            net.staking_mut().set_power(&addr(1), power);
            net.produce_blocks(2)?;
        }
        let ids: Vec<u64> = net
            .vsc_packets_to(&consumer)?
            .iter()
            .map(|p| p.valset_update_id)
            .collect();
        assert_eq!(ids.len(), 3);
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
        Ok(())
    }

    // =========================================================================
    // UNBONDING
    // =========================================================================

    #[test]
    fn test_unbonding_completes_after_consumer_maturity() -> Result<()> {
        let mut net = launched()?;
        let ctx = net.ctx();
        assert!(net.provider.after_unbonding_initiated(ctx, 7, addr(1))?);
        assert!(net.staking_mut().on_hold.contains(&7));

        net.produce_blocks(5)?;
        assert!(!net.provider.can_complete(7)?);

        net.produce_blocks(UNBONDING_PERIOD / BLOCK_TIME + 2)?;
        assert!(net.provider.can_complete(7)?);
        assert_eq!(net.provider.staking().released, vec![7]);
        Ok(())
    }

    #[test]
    fn test_unbonding_not_held_without_consumers() -> Result<()> {
        let mut net = Network::new(&VALIDATORS, default_params())?;
        let ctx = net.ctx();
        assert!(!net.provider.after_unbonding_initiated(ctx, 1, addr(1))?);
        assert!(net.provider.can_complete(1)?);
        Ok(())
    }

    // =========================================================================
    // REMOVAL AND TIMEOUT
    // =========================================================================

    #[test]
    fn test_removal_closes_channel() -> Result<()> {
        let mut net = launched()?;
        let consumer = chain("consumer-1")?;
        let stop_time = net.ctx().time + 2 * BLOCK_TIME;
        let ctx = net.ctx();
        net.provider.handle_msg(
            ctx,
            ProviderMsg::ConsumerRemoval(ConsumerRemovalProposal {
                chain_id: consumer.clone(),
                stop_time,
            }),
        )?;

        net.produce_blocks(3)?;
        assert!(net.provider.channel_state(&consumer)?.is_terminal());

        let sent = net.provider_log.len();
        net.staking_mut().set_power(&addr(1), 10);
        net.produce_block()?;
        assert_eq!(net.provider_log.len(), sent);
        Ok(())
    }

    #[test]
    fn test_unanswered_vsc_times_out_chain() -> Result<()> {
        let mut net = launched()?;
        let consumer = chain("consumer-1")?;
        net.pause_relayer(&consumer);

        net.staking_mut().set_power(&addr(1), 10);
        net.produce_block()?;
        assert_eq!(net.provider_log.len(), 1);

        let vsc_timeout = default_params().vsc_timeout_period;
        net.produce_blocks(vsc_timeout / BLOCK_TIME + 1)?;
        assert!(net.provider.channel_state(&consumer)?.is_terminal());
        assert!(net
            .provider
            .store()
            .require_chain(&consumer)?
            .is_closed());

        // The held packet expired long ago; the relayer reports its timeout.
        net.resume_relayer(&consumer)?;
        assert!(net.provider.channel_state(&consumer)?.is_terminal());
        Ok(())
    }
}
