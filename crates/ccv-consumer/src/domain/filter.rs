//! # Message Filter
//!
//! Predicate consulted by the host's transaction pipeline before executing
//! a consumer-chain transaction.

use ccv_types::ChainId;

/// Modules whose messages are never executed on a consumer: evidence and
/// slashing are handled by the provider.
pub const DISABLED_MODULE_PREFIXES: [&str; 2] = ["/cosmos.evidence", "/cosmos.slashing"];

/// Messages needed to open the CCV channel, allowed before it is established.
pub const HANDSHAKE_MESSAGE_PREFIXES: [&str; 3] = [
    "/ibc.core.client",
    "/ibc.core.connection",
    "/ibc.core.channel",
];

/// True if a transaction carrying `type_url` for `chain_id` may execute on
/// `own_chain_id`.
pub fn is_message_allowed(
    own_chain_id: &ChainId,
    chain_id: &ChainId,
    type_url: &str,
    channel_established: bool,
) -> bool {
    if chain_id != own_chain_id {
        return false;
    }
    if DISABLED_MODULE_PREFIXES
        .iter()
        .any(|prefix| type_url.starts_with(prefix))
    {
        return false;
    }
    channel_established
        || HANDSHAKE_MESSAGE_PREFIXES
            .iter()
            .any(|prefix| type_url.starts_with(prefix))
}
