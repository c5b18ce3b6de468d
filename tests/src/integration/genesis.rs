//! # Genesis Export and Restart
//!
//! A network stopped mid-flight (throttled slashes, held unbondings,
//! assigned keys, unmatured VSCs) restarts from exported state and carries
//! on exactly as if it had never stopped.

#[cfg(test)]
mod tests {
    use crate::harness::*;
    use anyhow::Result;
    use ccv_consumer::ConsumerApi;
    use ccv_provider::domain::VscIdToHeight;
    use ccv_provider::{
        InMemoryStaking, ProviderApi, ProviderDependencies, ProviderGenesis, ProviderMsg,
        ProviderParams, ProviderService, ProviderStore,
    };
    use ccv_types::{
        BlockContext, ErrorKind, Fraction, InMemoryKvStore, InMemoryTransport, Infraction, VscPacketData,
    };
    use std::collections::BTreeMap;

    const VALIDATORS: [(u8, i64); 6] = [(1, 100), (2, 90), (3, 80), (4, 70), (5, 60), (6, 50)];

    /// One 90-power slash fits the meter, the next one has to wait.
    fn params() -> ProviderParams {
        ProviderParams {
            slash_meter_ceiling_fraction: Fraction::percent(20),
            slash_meter_floor_fraction: Fraction::percent(10),
            ..default_params()
        }
    }

    fn busy_network() -> Result<Network> {
        let mut net = Network::new(&VALIDATORS, params())?;
        let a = chain("consumer-a")?;
        let b = chain("consumer-b")?;
        net.add_consumer(&a, net.ctx().time, false)?;
        net.add_consumer(&b, net.ctx().time, false)?;
        net.produce_block()?;

        let ctx = net.ctx();
        net.provider.handle_msg(
            ctx,
            ProviderMsg::AssignConsumerKey {
                chain_id: a.clone(),
                provider_addr: addr(1),
                consumer_key: key(31).to_json(),
            },
        )?;
        net.staking_mut().set_power(&addr(6), 55);
        net.produce_block()?;

        let ctx = net.ctx();
        net.provider.after_unbonding_initiated(ctx, 1, addr(5))?;
        net.slash_on_consumer(&a, addr(2), 90, Infraction::Downtime)?;
        net.slash_on_consumer(&b, addr(3), 80, Infraction::Downtime)?;
        net.produce_blocks(3)?;
        Ok(net)
    }

    fn carry_on(net: &mut Network) -> Result<()> {
        net.staking_mut().set_power(&addr(4), 75);
        net.produce_blocks(5)?;
        net.slash_on_consumer(&chain("consumer-b")?, addr(6), 55, Infraction::Downtime)?;
        net.produce_blocks(25)
    }

    fn consumer_exports(net: &Network) -> Result<BTreeMap<String, ccv_consumer::ConsumerGenesis>> {
        net.consumers
            .iter()
            .map(|(chain_id, node)| Ok((chain_id.to_string(), node.service.export_genesis()?)))
            .collect()
    }

    fn empty_provider() -> ProviderService<InMemoryKvStore, InMemoryStaking, InMemoryTransport> {
        ProviderService::new(ProviderDependencies {
            store: InMemoryKvStore::new(),
            staking: InMemoryStaking::new(),
            transport: InMemoryTransport::new(),
        })
    }

    #[test]
    fn test_restart_preserves_exported_state() -> Result<()> {
        let mut net = busy_network()?;
        assert_eq!(net.provider.store().global_queue_len()?, 1);
        assert!(!net.provider.can_complete(1)?);

        let provider_before = net.provider.export_genesis()?;
        let consumers_before = consumer_exports(&net)?;
        net.restart()?;

        assert_eq!(net.provider.export_genesis()?, provider_before);
        assert_eq!(consumer_exports(&net)?, consumers_before);
        Ok(())
    }

    #[test]
    fn test_restarted_network_matches_uninterrupted_run() -> Result<()> {
        let mut uninterrupted = busy_network()?;
        let mut restarted = busy_network()?;
        restarted.restart()?;

        carry_on(&mut uninterrupted)?;
        carry_on(&mut restarted)?;

        assert_eq!(uninterrupted.provider_log, restarted.provider_log);
        assert_eq!(
            uninterrupted.provider.export_genesis()?,
            restarted.provider.export_genesis()?
        );
        assert_eq!(consumer_exports(&uninterrupted)?, consumer_exports(&restarted)?);
        assert_eq!(uninterrupted.jailed_power(), restarted.jailed_power());
        assert!(restarted.provider.can_complete(1)?);
        Ok(())
    }

    #[test]
    fn test_invalid_genesis_rejected_without_side_effects() -> Result<()> {
        let exported = busy_network()?.provider.export_genesis()?;
        assert!(!exported.throttle_queue.is_empty());
        assert!(!exported.unbonding_ops.is_empty());
        let ghost = chain("ghost-1")?;

        type Mutation = Box<dyn Fn(&mut ProviderGenesis)>;
        let ghost_queue = ghost.clone();
        let cases: Vec<(&str, Mutation)> = vec![
            ("zero valset id", Box::new(|g: &mut ProviderGenesis| g.valset_update_id = 0)),
            (
                "zero replenish period",
                Box::new(|g: &mut ProviderGenesis| g.params.slash_meter_replenish_period = 0),
            ),
            (
                "zero id in height mapping",
                Box::new(|g: &mut ProviderGenesis| {
                    g.valset_update_id_to_height.push(VscIdToHeight {
                        valset_update_id: 0,
                        height: 5,
                    })
                }),
            ),
            (
                "duplicate consumer",
                Box::new(|g: &mut ProviderGenesis| {
                    let state = g.consumer_states[0].clone();
                    g.consumer_states.push(state);
                }),
            ),
            (
                "repeated pending VSC id",
                Box::new(|g: &mut ProviderGenesis| {
                    let packet = VscPacketData::new(vec![], 9, vec![]);
                    g.consumer_states[0].pending_vsc_packets = vec![packet.clone(), packet];
                }),
            ),
            (
                "throttled slash from unknown chain",
                Box::new(move |g: &mut ProviderGenesis| g.throttle_queue[0].chain_id = ghost_queue.clone()),
            ),
            (
                "unbonding owed by unknown chain",
                Box::new(move |g: &mut ProviderGenesis| {
                    g.unbonding_ops[0].owed.insert(ghost.clone());
                }),
            ),
        ];

        for (name, mutate) in cases {
            let mut genesis = exported.clone();
            mutate(&mut genesis);
            let mut provider = empty_provider();
            let err = provider
                .init_genesis(BlockContext::new(10, 100), genesis)
                .expect_err(name);
            assert_eq!(err.kind(), ErrorKind::Validation, "{name}");
            assert!(provider.store().consumer_chains()?.is_empty(), "{name}");
        }

        let mut provider = empty_provider();
        provider.init_genesis(BlockContext::new(10, 100), exported)?;
        assert_eq!(provider.store().consumer_chains()?.len(), 2);
        Ok(())
    }
}
