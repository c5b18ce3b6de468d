//! # Key Assignment Across Chains
//!
//! Validators sign consumer blocks with assigned keys; slashes against those
//! keys still reach the provider validator.

#[cfg(test)]
mod tests {
    use crate::harness::*;
    use anyhow::Result;
    use ccv_provider::{ProviderApi, ProviderMsg, ProviderParams};
    use ccv_types::{ChainId, ConsAddress, Fraction, Infraction};
    use rand::{rngs::StdRng, Rng, SeedableRng};
    use std::collections::{BTreeMap, BTreeSet};

    const VALIDATORS: [(u8, i64); 4] = [(1, 100), (2, 90), (3, 80), (4, 70)];

    fn assign(net: &mut Network, chain_id: &str, validator: u8, key_seed: u8) -> Result<()> {
        let ctx = net.ctx();
        net.provider.handle_msg(
            ctx,
            ProviderMsg::AssignConsumerKey {
                chain_id: chain(chain_id)?,
                provider_addr: addr(validator),
                consumer_key: key(key_seed).to_json(),
            },
        )?;
        Ok(())
    }

    #[test]
    fn test_key_assigned_before_launch_used_in_genesis() -> Result<()> {
        let mut net = Network::new(&VALIDATORS, default_params())?;
        let consumer = chain("consumer-1")?;
        net.add_consumer(&consumer, net.ctx().time + 2 * BLOCK_TIME, false)?;
        assign(&mut net, "consumer-1", 1, 21)?;

        net.produce_blocks(2)?;
        let consensus = &net.consumer(&consumer)?.consensus;
        assert_eq!(consensus.get(&addr(21)), Some(&100));
        assert!(!consensus.contains_key(&addr(1)));
        Ok(())
    }

    #[test]
    fn test_key_assigned_after_launch_swaps_consensus_key() -> Result<()> {
        let mut net = Network::new(&VALIDATORS, default_params())?;
        let consumer = chain("consumer-1")?;
        net.launch_consumer(&consumer)?;

        assign(&mut net, "consumer-1", 2, 22)?;
        net.produce_block()?;

        let consensus = &net.consumer(&consumer)?.consensus;
        assert_eq!(consensus.get(&addr(22)), Some(&90));
        assert!(!consensus.contains_key(&addr(2)));
        Ok(())
    }

    #[test]
    fn test_slash_with_assigned_key_jails_provider_validator() -> Result<()> {
        let params = ProviderParams {
            slash_meter_ceiling_fraction: Fraction::percent(100),
            ..default_params()
        };
        let mut net = Network::new(&VALIDATORS, params)?;
        let consumer = chain("consumer-1")?;
        net.launch_consumer(&consumer)?;
        assign(&mut net, "consumer-1", 3, 23)?;
        net.produce_block()?;

        net.slash_on_consumer(&consumer, addr(23), 80, Infraction::Downtime)?;
        net.produce_block()?;

        assert!(net.provider.staking().is_jailed(&addr(3)));
        let delivered = net.deliveries.last().map(|d| d.ack.is_success());
        assert_eq!(delivered, Some(true));
        Ok(())
    }

    #[test]
    fn test_random_assignments_never_change_key_owner() -> Result<()> {
        let mut rng = StdRng::seed_from_u64(7);
        let mut net = Network::new(&VALIDATORS, default_params())?;
        let consumer = chain("consumer-1")?;
        net.launch_consumer(&consumer)?;

        let mut owners: BTreeMap<ConsAddress, u8> =
            VALIDATORS.iter().map(|&(seed, _)| (addr(seed), seed)).collect();

        for step in 0..200 {
            let validator = rng.gen_range(1..=4u8);
            let key_seed = if rng.gen_bool(0.1) {
                rng.gen_range(1..=4u8)
            } else {
                rng.gen_range(30..=38u8)
            };

            if assign(&mut net, "consumer-1", validator, key_seed).is_ok() {
                let owner = *owners.entry(addr(key_seed)).or_insert(validator);
                assert_eq!(owner, validator, "step {step}: key {key_seed} changed owner");
            }

            if step % 10 == 9 {
                net.produce_block()?;
                check_consensus_attribution(&net, &consumer, &owners)?;
            }
        }
        Ok(())
    }

    /// Every consumer signer is attributable to exactly one provider
    /// validator, which signs with that key and has the same power.
    fn check_consensus_attribution(
        net: &Network,
        consumer: &ChainId,
        owners: &BTreeMap<ConsAddress, u8>,
    ) -> Result<()> {
        let mut seen = BTreeSet::new();
        for (consumer_addr, power) in &net.consumer(consumer)?.consensus {
            let provider_addr = net
                .provider
                .provider_addr(consumer, consumer_addr)?
                .ok_or_else(|| anyhow::anyhow!("{consumer_addr} is not attributable"))?;
            assert!(seen.insert(provider_addr), "{provider_addr} signs twice");
            assert_eq!(net.provider.consumer_addr(consumer, &provider_addr)?, *consumer_addr);
            assert_eq!(net.provider_set().get(&provider_addr), Some(power));
            if let Some(seed) = owners.get(consumer_addr) {
                assert_eq!(addr(*seed), provider_addr);
            }
        }
        assert_eq!(seen.len(), VALIDATORS.len());
        Ok(())
    }
}
