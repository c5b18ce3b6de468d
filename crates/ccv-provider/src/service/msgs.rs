//! # Message Dispatch

use super::*;

impl Keeper<'_> {
    pub(crate) fn handle_msg(&mut self, msg: ProviderMsg) -> CcvResult<()> {
        msg.validate_basic()?;
        debug!("[ccv-provider] handling {}", msg.type_url());
        match msg {
            ProviderMsg::ConsumerAddition(proposal) => self.add_consumer(proposal),
            ProviderMsg::ConsumerRemoval(proposal) => self.remove_consumer(proposal),
            ProviderMsg::ConsumerModification(proposal) => self.modify_consumer(proposal),
            ProviderMsg::AssignConsumerKey {
                chain_id,
                provider_addr,
                consumer_key,
            } => self.assign_consumer_key(&chain_id, &provider_addr, &consumer_key),
            ProviderMsg::SubmitConsumerDoubleVoting { chain_id, evidence } => {
                self.handle_double_voting(&chain_id, &evidence)
            }
            ProviderMsg::UpdateParams(params) => {
                self.store.set_params(&params)?;
                info!("[ccv-provider] parameters updated");
                self.params = params;
                Ok(())
            }
        }
    }
}
