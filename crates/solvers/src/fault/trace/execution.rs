//! The execution module contains a [TraceProvider] over the step-by-step states of a [Machine],
//! along with the [ExecutionVm] that referees single steps of it.

use super::{check_index, StepVerifier, TraceProvider};
use crate::fault::{Claim, FaultError, StepProof, VmStatus};
use ethers::{types::Bytes, utils::keccak256};
use std::sync::{Arc, Mutex};

/// The default number of machine steps an [ExecutionTraceProvider] will compute before giving up.
pub const DEFAULT_STEP_LIMIT: u64 = 1 << 20;

/// The [Machine] trait is the interface to an external VM that can execute one instruction at a
/// time.
pub trait Machine: Send + Sync {
    /// Returns the state before the first instruction.
    fn initial_state(&self) -> Bytes;

    /// Executes a single instruction from `state`. `proof` carries any witness data the VM needs.
    fn step(&self, state: &[u8], proof: &[u8]) -> Result<Bytes, FaultError>;

    /// Returns the [VmStatus] of `state`. Anything other than [VmStatus::Unfinished] has exited.
    fn status(&self, state: &[u8]) -> VmStatus;
}

/// Commits to a machine state: `keccak256(state)` with the first byte replaced by the status.
fn commit<M: Machine>(machine: &M, state: &[u8]) -> Claim {
    let mut hash = keccak256(state);
    hash[0] = machine.status(state) as u8;
    Claim::from(hash)
}

/// Advances `state` by one instruction. An exited machine does not move.
fn advance<M: Machine>(machine: &M, state: &[u8], proof: &[u8]) -> Result<Bytes, FaultError> {
    if machine.status(state) != VmStatus::Unfinished {
        return Ok(Bytes::from(state.to_vec()));
    }
    machine.step(state, proof)
}

/// The [ExecutionTraceProvider] lays the states of a [Machine] run out as a trace. The state at
/// trace index `i` is the state after `i + 1` instructions; once the machine exits, its final
/// state repeats to the end of the trace.
pub struct ExecutionTraceProvider<M: Machine> {
    machine: Arc<M>,
    max_depth: u64,
    step_limit: u64,
    /// Memoised states, `states[i]` is the state at trace index `i`.
    states: Mutex<Vec<Bytes>>,
}

impl<M: Machine> ExecutionTraceProvider<M> {
    pub fn new(machine: Arc<M>, max_depth: u64) -> Self {
        Self::with_step_limit(machine, max_depth, DEFAULT_STEP_LIMIT)
    }

    pub fn with_step_limit(machine: Arc<M>, max_depth: u64, step_limit: u64) -> Self {
        Self {
            machine,
            max_depth,
            step_limit,
            states: Mutex::new(Vec::new()),
        }
    }
}

impl<M: Machine> TraceProvider for ExecutionTraceProvider<M> {
    fn max_depth(&self) -> u64 {
        self.max_depth
    }

    fn get(&self, index: u64) -> Result<Claim, FaultError> {
        let state = self.state_at(index)?;
        Ok(commit(self.machine.as_ref(), &state))
    }

    fn state_at(&self, index: u64) -> Result<Bytes, FaultError> {
        check_index(index, self.max_depth)?;
        let mut states = self
            .states
            .lock()
            .map_err(|_| FaultError::TraceUnavailable("state cache poisoned".to_string()))?;

        loop {
            if let Some(state) = usize::try_from(index).ok().and_then(|i| states.get(i)) {
                return Ok(state.clone());
            }

            let last = states
                .last()
                .cloned()
                .unwrap_or_else(|| self.machine.initial_state());
            if self.machine.status(&last) != VmStatus::Unfinished {
                return Ok(last);
            }
            if states.len() as u64 >= self.step_limit {
                return Err(FaultError::TraceUnavailable(format!(
                    "machine did not exit within {} steps",
                    self.step_limit
                )));
            }

            let next = self.machine.step(&last, &[])?;
            states.push(next);
            tracing::trace!(target: "execution-trace", "Computed state at trace index {}", states.len() - 1);
        }
    }

    fn absolute_prestate(&self) -> Bytes {
        self.machine.initial_state()
    }
}

/// The [ExecutionVm] referees single steps of a [Machine].
pub struct ExecutionVm<M: Machine> {
    machine: Arc<M>,
}

impl<M: Machine> ExecutionVm<M> {
    pub fn new(machine: Arc<M>) -> Self {
        Self { machine }
    }
}

impl<M: Machine> StepVerifier for ExecutionVm<M> {
    fn state_hash(&self, state: &[u8]) -> Result<Claim, FaultError> {
        Ok(commit(self.machine.as_ref(), state))
    }

    fn absolute_prestate_hash(&self) -> Claim {
        commit(self.machine.as_ref(), &self.machine.initial_state())
    }

    fn verify_step(&self, _: u64, proof: &StepProof) -> Result<Claim, FaultError> {
        let post = advance(self.machine.as_ref(), &proof.pre_state, &proof.proof)?;
        Ok(commit(self.machine.as_ref(), &post))
    }
}
