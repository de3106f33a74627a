//! The alphabet module contains the [TraceProvider] and [StepVerifier] implementations for the
//! mock alphabet VM. The alphabet VM's trace is a string of letters where each step increments
//! the previous letter by one.

use super::{check_index, StepVerifier, TraceProvider};
use crate::fault::{Claim, FaultError, StepProof};
use ethers::{
    abi::{self, Token},
    types::{Bytes, U256},
    utils::keccak256,
};
use std::sync::Arc;

/// The state preceding the first letter of the honest alphabet: the ascii letter before `a`.
pub const ALPHABET_ABSOLUTE_PRESTATE: u8 = b'a' - 1;

/// The [AlphabetTraceProvider] serves the trace of a claimed alphabet.
#[derive(Debug, Clone)]
pub struct AlphabetTraceProvider {
    /// The claimed alphabet. Indices past its end repeat the final letter.
    pub trace: Arc<[u8]>,
    /// The maximum depth of the dispute game position tree.
    pub max_depth: u64,
}

impl AlphabetTraceProvider {
    pub fn new(alphabet: &str, max_depth: u64) -> Self {
        Self {
            trace: Arc::from(alphabet.as_bytes()),
            max_depth,
        }
    }

    fn letter_at(&self, index: u64) -> u8 {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.trace.get(i))
            .or_else(|| self.trace.last())
            .copied()
            .unwrap_or(ALPHABET_ABSOLUTE_PRESTATE)
    }
}

impl TraceProvider for AlphabetTraceProvider {
    fn max_depth(&self) -> u64 {
        self.max_depth
    }

    fn get(&self, index: u64) -> Result<Claim, FaultError> {
        let state = self.state_at(index)?;
        Ok(Claim::from(keccak256(state)))
    }

    fn state_at(&self, index: u64) -> Result<Bytes, FaultError> {
        check_index(index, self.max_depth)?;
        Ok(encode_state(U256::from(index), U256::from(self.letter_at(index))))
    }

    fn absolute_prestate(&self) -> Bytes {
        abi::encode(&[Token::Uint(U256::from(ALPHABET_ABSOLUTE_PRESTATE))]).into()
    }
}

/// The [AlphabetVm] referees single steps of the alphabet trace.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlphabetVm;

impl StepVerifier for AlphabetVm {
    fn state_hash(&self, state: &[u8]) -> Result<Claim, FaultError> {
        Ok(Claim::from(keccak256(state)))
    }

    fn absolute_prestate_hash(&self) -> Claim {
        Claim::from(keccak256(abi::encode(&[Token::Uint(U256::from(
            ALPHABET_ABSOLUTE_PRESTATE,
        ))])))
    }

    fn verify_step(&self, trace_index: u64, proof: &StepProof) -> Result<Claim, FaultError> {
        let pre = proof.pre_state.as_ref();
        let letter = match pre.len() {
            32 => {
                if trace_index != 0 {
                    return Err(FaultError::InvalidStep(format!(
                        "the absolute prestate only precedes trace index 0, not {}",
                        trace_index
                    )));
                }
                U256::from_big_endian(pre)
            }
            64 => {
                let pre_index = U256::from_big_endian(&pre[..32]);
                if trace_index == 0 || pre_index != U256::from(trace_index - 1) {
                    return Err(FaultError::InvalidStep(format!(
                        "pre-state at trace index {} does not precede trace index {}",
                        pre_index, trace_index
                    )));
                }
                U256::from_big_endian(&pre[32..])
            }
            len => {
                return Err(FaultError::InvalidStep(format!(
                    "alphabet pre-state must be 32 or 64 bytes, got {}",
                    len
                )))
            }
        };

        let post = letter
            .checked_add(U256::one())
            .ok_or_else(|| FaultError::InvalidStep("letter overflow".to_string()))?;
        Ok(Claim::from(keccak256(encode_state(
            U256::from(trace_index),
            post,
        ))))
    }
}

/// ABI encodes an alphabet state: `(uint256 traceIndex, uint256 letter)`.
fn encode_state(trace_index: U256, letter: U256) -> Bytes {
    abi::encode(&[Token::Uint(trace_index), Token::Uint(letter)]).into()
}

#[cfg(test)]
mod test {
    use super::*;

    const CORRECT_ALPHABET: &str = "abcdefghijklmnop";
    const MAX_DEPTH: u64 = 4;

    #[test]
    fn alphabet_claim_encoding() {
        let provider = AlphabetTraceProvider::new(CORRECT_ALPHABET, MAX_DEPTH);
        for i in 0..16u64 {
            let expected = keccak256(abi::encode(&[
                Token::Uint(U256::from(i)),
                Token::Uint(U256::from(b'a' + i as u8)),
            ]));
            assert_eq!(provider.get(i).unwrap(), Claim::from(expected));
        }
    }

    #[test]
    fn rejects_out_of_range_index() {
        let provider = AlphabetTraceProvider::new(CORRECT_ALPHABET, MAX_DEPTH);
        assert_eq!(
            provider.get(16),
            Err(FaultError::InvalidIndex {
                index: 16,
                max_depth: MAX_DEPTH
            })
        );
        assert!(provider.step(16).is_err());
    }

    #[test]
    fn short_alphabet_repeats_last_letter() {
        let provider = AlphabetTraceProvider::new("abc", MAX_DEPTH);
        let full = AlphabetTraceProvider::new("abcccccccccccccc", MAX_DEPTH);
        assert_eq!(provider.get(15).unwrap(), full.get(15).unwrap());
    }

    #[test]
    fn honest_steps_reproduce_the_trace() {
        let provider = AlphabetTraceProvider::new(CORRECT_ALPHABET, MAX_DEPTH);
        let vm = AlphabetVm;
        assert_eq!(
            vm.state_hash(&provider.absolute_prestate()).unwrap(),
            vm.absolute_prestate_hash()
        );
        for i in 0..16u64 {
            let proof = provider.step(i).unwrap();
            assert_eq!(vm.verify_step(i, &proof).unwrap(), provider.get(i).unwrap());
        }
    }

    #[test]
    fn step_exposes_a_divergent_letter() {
        let honest = AlphabetTraceProvider::new(CORRECT_ALPHABET, MAX_DEPTH);
        let dishonest = AlphabetTraceProvider::new("abcdexyzijklmnop", MAX_DEPTH);
        let proof = honest.step(5).unwrap();
        assert_ne!(
            AlphabetVm.verify_step(5, &proof).unwrap(),
            dishonest.get(5).unwrap()
        );
    }

    #[test]
    fn step_rejects_misplaced_prestate() {
        let provider = AlphabetTraceProvider::new(CORRECT_ALPHABET, MAX_DEPTH);
        let proof = provider.step(3).unwrap();
        assert!(matches!(
            AlphabetVm.verify_step(7, &proof),
            Err(FaultError::InvalidStep(_))
        ));
        let absolute = provider.step(0).unwrap();
        assert!(matches!(
            AlphabetVm.verify_step(1, &absolute),
            Err(FaultError::InvalidStep(_))
        ));
    }
}
