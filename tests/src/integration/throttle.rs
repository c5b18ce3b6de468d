//! # Slash Throttling End to End
//!
//! Downtime requests from every consumer share one slash meter on the
//! provider. Jailing is bounded per replenish period and follows arrival
//! order across chains.

#[cfg(test)]
mod tests {
    use crate::harness::*;
    use anyhow::Result;
    use ccv_provider::ProviderStore;
    use ccv_types::{ConsAddress, ConsumerPacketData, Infraction};

    /// Ten validators of equal power; the tenth stays out of every slash.
    fn equal_validators() -> Vec<(u8, i64)> {
        (1..=10).map(|seed| (seed, 100)).collect()
    }

    /// Launch `chains` and send one VSC so consumer packets can flow.
    fn network_with(chains: &[&str]) -> Result<Network> {
        let mut net = Network::new(&equal_validators(), default_params())?;
        for chain_id in chains {
            net.add_consumer(&chain(chain_id)?, net.ctx().time, false)?;
        }
        net.produce_block()?;
        net.staking_mut().set_power(&addr(10), 90);
        net.produce_block()?;
        Ok(net)
    }

    /// Provider addresses of slash requests, in arrival order.
    fn slash_arrivals(net: &Network) -> Vec<ConsAddress> {
        net.deliveries
            .iter()
            .filter_map(|d| match &d.data {
                ConsumerPacketData::Slash(data) => Some(data.validator.address),
                ConsumerPacketData::VscMatured(_) => None,
            })
            .collect()
    }

    fn assert_jailed_prefix(net: &Network) {
        let arrivals = slash_arrivals(net);
        let staking = net.provider.staking();
        let jailed = arrivals.iter().take_while(|a| staking.is_jailed(a)).count();
        assert!(
            arrivals[jailed..].iter().all(|a| !staking.is_jailed(a)),
            "jailed set is not a prefix of arrival order at height {}",
            net.ctx().height
        );
    }

    #[test]
    fn test_jailed_power_bounded_per_replenish_period() -> Result<()> {
        let mut net = network_with(&["consumer-1"])?;
        let consumer = chain("consumer-1")?;
        for seed in 1..=9 {
            net.slash_on_consumer(&consumer, addr(seed), 100, Infraction::Downtime)?;
        }

        let mut replenishments = 0;
        let mut last_replenish = net.provider.store().slash_meter()?.map(|m| m.last_replenish);
        for _ in 0..80 {
            net.produce_block()?;
            let current = net.provider.store().slash_meter()?.map(|m| m.last_replenish);
            if current != last_replenish {
                replenishments += 1;
                last_replenish = current;
            }
            assert!(
                net.jailed_power() <= 150 + 100 * replenishments,
                "jailed {} after {} replenishments",
                net.jailed_power(),
                replenishments
            );
            assert_jailed_prefix(&net);
        }

        assert_eq!(slash_arrivals(&net).len(), 9);
        assert!(net.jailed_power() >= 400);
        assert!(!net.provider.staking().is_jailed(&addr(10)));
        Ok(())
    }

    #[test]
    fn test_throttled_slashes_applied_in_arrival_order_across_chains() -> Result<()> {
        let mut net = network_with(&["consumer-a", "consumer-b"])?;
        let a = chain("consumer-a")?;
        let b = chain("consumer-b")?;
        net.slash_on_consumer(&a, addr(1), 100, Infraction::Downtime)?;
        net.slash_on_consumer(&a, addr(2), 100, Infraction::Downtime)?;
        net.slash_on_consumer(&b, addr(3), 100, Infraction::Downtime)?;
        net.slash_on_consumer(&b, addr(4), 100, Infraction::Downtime)?;

        for _ in 0..50 {
            net.produce_block()?;
            assert_jailed_prefix(&net);
        }

        let arrivals = slash_arrivals(&net);
        assert_eq!(arrivals.len(), 4);
        assert_eq!(arrivals[..2], [addr(1), addr(3)]);
        assert!(arrivals.iter().all(|a| net.provider.staking().is_jailed(a)));
        assert_eq!(net.provider.store().global_queue_len()?, 0);
        Ok(())
    }

    #[test]
    fn test_slash_acks_clear_outstanding_downtime() -> Result<()> {
        let mut net = network_with(&["consumer-1"])?;
        let consumer = chain("consumer-1")?;
        net.slash_on_consumer(&consumer, addr(1), 100, Infraction::Downtime)?;
        net.produce_blocks(2)?;
        assert!(net.provider.staking().is_jailed(&addr(1)));

        let acked = net
            .vsc_packets_to(&consumer)?
            .iter()
            .any(|p| p.slash_acks.contains(&addr(1)));
        assert!(acked);

        // The validator is back after unjailing; a second downtime report
        // is accepted because the first one was acknowledged.
        net.staking_mut().unjail(&addr(1));
        net.produce_block()?;
        net.slash_on_consumer(&consumer, addr(1), 100, Infraction::Downtime)?;
        net.produce_block()?;
        assert_eq!(slash_arrivals(&net), vec![addr(1), addr(1)]);
        Ok(())
    }
}
