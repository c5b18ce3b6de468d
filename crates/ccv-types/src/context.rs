//! # Block Context
//!
//! Height and time of the block being executed. All time-dependent logic
//! reads the block header time from here, never the wall clock.

use crate::ids::Timestamp;
use serde::{Deserialize, Serialize};

/// Header data of the block being executed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockContext {
    /// Block height.
    pub height: u64,
    /// Block time, unix seconds.
    pub time: Timestamp,
}

impl BlockContext {
    pub fn new(height: u64, time: Timestamp) -> Self {
        Self { height, time }
    }

    /// Context of the following block, `block_time` seconds later.
    pub fn next(&self, block_time: u64) -> Self {
        Self {
            height: self.height + 1,
            time: self.time + block_time,
        }
    }
}
