//! The `source` module contains the [L1Source] trait, the view of L1 needed to create games, and
//! the in-memory [LocalL1] implementation.

use anyhow::Result;
use async_trait::async_trait;
use fault_dispute_solvers::fault::Claim;
use tokio::sync::Mutex;

/// The [L1Source] trait describes the L1 collaborators a game creator depends on.
#[async_trait]
pub trait L1Source: Send + Sync {
    /// Returns the index of the latest output proposal, or `None` if nothing has been proposed.
    async fn latest_output_index(&self) -> Result<Option<u64>>;

    /// Stores the current L1 block in the block oracle and returns the block number that was
    /// stored.
    async fn checkpoint(&self) -> Result<u64>;
}

#[derive(Debug, Default)]
struct LocalL1State {
    block_number: u64,
    outputs: Vec<Claim>,
    checkpoints: Vec<u64>,
}

/// A [LocalL1] is an in-memory chain. Every proposal and checkpoint is included in a new block.
#[derive(Debug, Default)]
pub struct LocalL1 {
    state: Mutex<LocalL1State>,
}

impl LocalL1 {
    pub fn new(block_number: u64) -> Self {
        Self {
            state: Mutex::new(LocalL1State {
                block_number,
                ..Default::default()
            }),
        }
    }

    /// Proposes an output root and returns its index.
    pub async fn propose_output(&self, output_root: Claim) -> u64 {
        let mut state = self.state.lock().await;
        state.block_number += 1;
        state.outputs.push(output_root);
        tracing::debug!(target: "local-l1", "Output #{} proposed in block #{}", state.outputs.len() - 1, state.block_number);
        (state.outputs.len() - 1) as u64
    }

    pub async fn block_number(&self) -> u64 {
        self.state.lock().await.block_number
    }

    /// Returns every block number stored by [L1Source::checkpoint].
    pub async fn checkpoints(&self) -> Vec<u64> {
        self.state.lock().await.checkpoints.clone()
    }
}

#[async_trait]
impl L1Source for LocalL1 {
    async fn latest_output_index(&self) -> Result<Option<u64>> {
        let state = self.state.lock().await;
        Ok(state.outputs.len().checked_sub(1).map(|i| i as u64))
    }

    async fn checkpoint(&self) -> Result<u64> {
        let mut state = self.state.lock().await;
        // The checkpoint transaction is included in a new block and stores its parent.
        let stored = state.block_number;
        state.block_number += 1;
        state.checkpoints.push(stored);
        Ok(stored)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[tokio::test]
    async fn tracks_outputs_and_checkpoints() {
        let l1 = LocalL1::new(10);
        assert_eq!(l1.latest_output_index().await.unwrap(), None);

        assert_eq!(l1.propose_output(Claim::repeat_byte(1)).await, 0);
        assert_eq!(l1.propose_output(Claim::repeat_byte(2)).await, 1);
        assert_eq!(l1.latest_output_index().await.unwrap(), Some(1));

        assert_eq!(l1.checkpoint().await.unwrap(), 12);
        assert_eq!(l1.block_number().await, 13);
        assert_eq!(l1.checkpoints().await, vec![12]);
    }
}
