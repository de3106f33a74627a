//! Trace providers and single-step verifiers for the fault dispute game.

use super::{Claim, FaultError, StepProof};
use ethers::types::Bytes;

mod alphabet;
pub use alphabet::{AlphabetTraceProvider, AlphabetVm, ALPHABET_ABSOLUTE_PRESTATE};

mod execution;
pub use execution::{ExecutionTraceProvider, ExecutionVm, Machine, DEFAULT_STEP_LIMIT};

/// The [TraceProvider] trait describes a participant's view of the execution trace. Every method
/// is deterministic over the provider's trace and the requested index.
pub trait TraceProvider: Send + Sync {
    /// Returns the depth of the game tree the trace is laid out under.
    fn max_depth(&self) -> u64;

    /// Returns the commitment to the state at trace index `index`.
    ///
    /// ### Takes
    /// - `index`: The trace index, at most `2^max_depth - 1`.
    ///
    /// ### Returns
    /// - `Ok(Claim)`: The commitment at `index`.
    /// - `Err(FaultError::InvalidIndex)`: The index is out of range.
    fn get(&self, index: u64) -> Result<Claim, FaultError>;

    /// Returns the preimage of the commitment at trace index `index`.
    fn state_at(&self, index: u64) -> Result<Bytes, FaultError>;

    /// Returns the state that precedes trace index 0.
    fn absolute_prestate(&self) -> Bytes;

    /// Returns the [StepProof] for the transition into trace index `index`.
    fn step(&self, index: u64) -> Result<StepProof, FaultError> {
        check_index(index, self.max_depth())?;
        let pre_state = if index == 0 {
            self.absolute_prestate()
        } else {
            self.state_at(index - 1)?
        };
        Ok(StepProof {
            pre_state,
            proof: Bytes::default(),
        })
    }
}

/// The [StepVerifier] trait is the VM that referees leaf level disputes.
pub trait StepVerifier: Send + Sync {
    /// Returns the commitment to a state preimage.
    fn state_hash(&self, state: &[u8]) -> Result<Claim, FaultError>;

    /// Returns the commitment to the absolute prestate of the VM.
    fn absolute_prestate_hash(&self) -> Claim;

    /// Executes a single step from `proof.pre_state` and returns the commitment to the resulting
    /// state at `trace_index`.
    fn verify_step(&self, trace_index: u64, proof: &StepProof) -> Result<Claim, FaultError>;
}

/// Returns the last trace index under a tree of depth `max_depth`: `2^max_depth - 1`.
pub fn last_index(max_depth: u64) -> u64 {
    if max_depth >= 64 {
        u64::MAX
    } else {
        (1u64 << max_depth) - 1
    }
}

/// Rejects trace indices that do not fit under a tree of depth `max_depth`.
pub(crate) fn check_index(index: u64, max_depth: u64) -> Result<(), FaultError> {
    if index > last_index(max_depth) {
        return Err(FaultError::InvalidIndex { index, max_depth });
    }
    Ok(())
}
