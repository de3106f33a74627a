//! Errors produced by the fault dispute game core.

use super::{GameStatus, MoveKind};
use thiserror::Error;

/// Errors returned by trace providers, verifiers and the game state machine. A rejected move
/// never mutates the game.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FaultError {
    #[error("trace index {index} out of range for a trace of depth {max_depth}")]
    InvalidIndex { index: u64, max_depth: u64 },
    #[error("no claim at position {0}")]
    UnknownClaim(u128),
    #[error("claim at position {0} has already been countered")]
    AlreadyCountered(u128),
    #[error("move against position {position} exceeds the max depth of {max_depth}")]
    DepthExceeded { position: u128, max_depth: u64 },
    #[error("{kind} is not a valid move against a claim at depth {depth}")]
    InvalidMoveType { kind: MoveKind, depth: u64 },
    #[error("defend against position {0} restates the value it targets")]
    UncontestedDefend(u128),
    #[error("a claim already exists at position {0}")]
    DuplicatePosition(u128),
    #[error("invalid step: {0}")]
    InvalidStep(String),
    #[error("game is no longer in progress: {0}")]
    GameNotInProgress(GameStatus),
    #[error("root claim is missing")]
    MissingRootClaim,
    #[error("malformed game metadata: {0}")]
    MalformedMetadata(String),
    #[error("max depth {0} is outside of 1..=64")]
    InvalidMaxDepth(u64),
    #[error("trace unavailable: {0}")]
    TraceUnavailable(String),
}
