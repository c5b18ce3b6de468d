//! # Replica Determinism
//!
//! Two replicas fed the same block history must emit byte-identical packets
//! and end with identical state.

#[cfg(test)]
mod tests {
    use crate::harness::*;
    use anyhow::Result;
    use ccv_consumer::ConsumerApi;
    use ccv_provider::{ProviderApi, ProviderMsg, ProviderParams};
    use ccv_telemetry::{init_telemetry, TelemetryConfig};
    use ccv_types::{ChainId, ConsAddress, Fraction, Infraction};
    use rand::{rngs::StdRng, Rng, SeedableRng};

    const VALIDATORS: [(u8, i64); 6] = [(1, 100), (2, 90), (3, 80), (4, 70), (5, 60), (6, 50)];

    /// Random history: power changes, key assignments, unbondings and slash
    /// requests over two consumers. Rejected actions are part of the history.
    fn run_history(seed: u64, blocks: u64, params: ProviderParams) -> Result<Network> {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut net = Network::new(&VALIDATORS, params)?;
        let chains: Vec<ChainId> = vec![chain("consumer-a")?, chain("consumer-b")?];
        for chain_id in &chains {
            net.add_consumer(chain_id, net.ctx().time + BLOCK_TIME, false)?;
        }

        let mut next_op = 1;
        for _ in 0..blocks {
            let validator = rng.gen_range(1..=6u8);
            match rng.gen_range(0..6) {
                0 => {
                    let power = rng.gen_range(10..=120);
                    net.staking_mut().set_power(&addr(validator), power);
                }
                1 => {
                    let ctx = net.ctx();
                    let chain_id = chains[rng.gen_range(0..chains.len())].clone();
                    let _ = net.provider.handle_msg(
                        ctx,
                        ProviderMsg::AssignConsumerKey {
                            chain_id,
                            provider_addr: addr(validator),
                            consumer_key: key(rng.gen_range(40..=50)).to_json(),
                        },
                    );
                }
                2 => {
                    let ctx = net.ctx();
                    net.provider.after_unbonding_initiated(ctx, next_op, addr(validator))?;
                    next_op += 1;
                }
                3 => {
                    let chain_id = &chains[rng.gen_range(0..chains.len())];
                    if let Some((signer, power)) = pick_signer(&net, chain_id, &mut rng) {
                        net.slash_on_consumer(chain_id, signer, power, Infraction::Downtime)?;
                    }
                }
                _ => {}
            }
            net.produce_block()?;
        }
        Ok(net)
    }

    fn pick_signer(
        net: &Network,
        chain_id: &ChainId,
        rng: &mut StdRng,
    ) -> Option<(ConsAddress, i64)> {
        let consensus = &net.consumers.get(chain_id)?.consensus;
        if consensus.is_empty() {
            return None;
        }
        let index = rng.gen_range(0..consensus.len());
        consensus.iter().nth(index).map(|(a, p)| (*a, *p))
    }

    #[test]
    fn test_replicas_emit_identical_packets() -> Result<()> {
        let _ = init_telemetry(&TelemetryConfig::for_module("ccv_tests"));

        let first = run_history(42, 120, default_params())?;
        let second = run_history(42, 120, default_params())?;

        assert!(!first.provider_log.is_empty());
        assert_eq!(first.provider_log, second.provider_log);
        assert_eq!(first.deliveries.len(), second.deliveries.len());
        assert_eq!(first.provider.export_genesis()?, second.provider.export_genesis()?);
        for (chain_id, node) in &first.consumers {
            let other = second.consumer(chain_id)?;
            assert_eq!(node.service.export_genesis()?, other.service.export_genesis()?);
            assert_eq!(node.consensus, other.consensus);
        }
        Ok(())
    }

    #[test]
    fn test_vsc_updates_sorted_by_consumer_address() -> Result<()> {
        let net = run_history(7, 80, default_params())?;
        for chain_id in net.consumers.keys() {
            for packet in net.vsc_packets_to(chain_id)? {
                let addresses: Vec<_> = packet.validator_updates.iter().map(|u| u.address()).collect();
                assert!(
                    addresses.windows(2).all(|w| w[0] < w[1]),
                    "VSC {} to {} is not sorted",
                    packet.valset_update_id,
                    chain_id
                );
            }
        }
        Ok(())
    }

    #[test]
    fn test_consumer_sets_track_provider_power() -> Result<()> {
        // A meter wide enough that no slash waits, so no chain times out.
        let params = ProviderParams {
            slash_meter_ceiling_fraction: Fraction::percent(100),
            slash_meter_floor_fraction: Fraction::percent(100),
            ..default_params()
        };
        let mut net = run_history(11, 60, params)?;
        net.produce_blocks(20)?;
        for (chain_id, node) in &net.consumers {
            let total: i64 = node.consensus.values().sum();
            let expected: i64 = net.provider_set().values().sum();
            assert_eq!(total, expected, "{chain_id} drifted from the provider set");
            assert!(net.provider.channel_state(chain_id)?.is_established());
        }
        Ok(())
    }
}
