//! The types module contains all of the types relevant to the fault dispute game.

use ethers::types::{Address, Bytes, H256};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The [Claim] type represents a claim on the execution trace at a given trace index that is
/// made by a participant in a dispute game.
pub type Claim = H256;

/// The [GameType] enum defines the different flavors of fault dispute games that the factory
/// can create. The discriminant is the on-chain game type identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum GameType {
    /// A game over the mock alphabet VM trace.
    Alphabet = 0,
    /// A game over a full execution trace.
    Cannon = 1,
}

impl TryFrom<u8> for GameType {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(GameType::Alphabet),
            1 => Ok(GameType::Cannon),
            other => Err(other),
        }
    }
}

impl fmt::Display for GameType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameType::Alphabet => write!(f, "alphabet"),
            GameType::Cannon => write!(f, "cannon"),
        }
    }
}

/// The status of a dispute game. Once a game leaves [GameStatus::InProgress] it never returns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum GameStatus {
    #[default]
    InProgress = 0,
    ChallengerWins = 1,
    DefenderWins = 2,
}

impl GameStatus {
    /// Returns `true` if the game has been resolved.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, GameStatus::InProgress)
    }
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameStatus::InProgress => write!(f, "In Progress"),
            GameStatus::ChallengerWins => write!(f, "Challenger Wins"),
            GameStatus::DefenderWins => write!(f, "Defender Wins"),
        }
    }
}

/// The status byte stamped into the first byte of an execution trace commitment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum VmStatus {
    Valid = 0,
    Invalid = 1,
    Panic = 2,
    Unfinished = 3,
}

/// The [ClaimData] struct represents a [Claim] as well as the data associated with it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimData {
    /// The index of the parent claim in the DAG array. `None` for the root claim.
    pub parent_index: Option<usize>,
    /// Whether or not the current claim has ever been countered.
    pub countered: bool,
    /// The participant that countered this claim, if any.
    pub countered_by: Option<Address>,
    /// The claim that is being made at the trace index relative to the position.
    pub value: Claim,
    /// The position of the claim within the game tree.
    pub position: u128,
    /// The participant that made the claim.
    pub claimant: Address,
}

impl ClaimData {
    /// Returns `true` if this is the root claim of the game.
    pub fn is_root(&self) -> bool {
        self.parent_index.is_none()
    }
}

/// The data needed to execute a single VM step against a leaf claim.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepProof {
    /// The preimage of the agreed upon pre-state.
    pub pre_state: Bytes,
    /// Witness data for the VM. Opaque to the game.
    pub proof: Bytes,
}

/// The kind of a [Move], used in error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveKind {
    Attack,
    Defend,
    Step,
}

impl fmt::Display for MoveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoveKind::Attack => write!(f, "attack"),
            MoveKind::Defend => write!(f, "defend"),
            MoveKind::Step => write!(f, "step"),
        }
    }
}

/// A [Move] submitted against the claim at position `parent`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Move {
    /// Dispute the parent by claiming `value` at its left child.
    Attack { parent: u128, value: Claim },
    /// Bisect toward the later half by claiming `value` at the parent's right child.
    Defend { parent: u128, value: Claim },
    /// Counter a leaf claim by executing a single VM step.
    Step { parent: u128, proof: StepProof },
}

impl Move {
    /// Returns the [MoveKind] of the move.
    pub fn kind(&self) -> MoveKind {
        match self {
            Move::Attack { .. } => MoveKind::Attack,
            Move::Defend { .. } => MoveKind::Defend,
            Move::Step { .. } => MoveKind::Step,
        }
    }

    /// Returns the position of the claim that the move targets.
    pub fn parent(&self) -> u128 {
        match self {
            Move::Attack { parent, .. } | Move::Defend { parent, .. } | Move::Step { parent, .. } => {
                *parent
            }
        }
    }
}

/// The effect of an accepted [Move].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOutcome {
    /// A bisection move created a new claim.
    Created(ClaimData),
    /// A step countered an existing leaf claim. Holds the updated claim.
    Countered(ClaimData),
}

/// A [Response] is an action taken by a participant in the dispute game in response to
/// a claim made by another participant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// Do nothing.
    DoNothing,
    /// Create a counter claim against the claim at position `parent`.
    Move {
        is_attack: bool,
        parent: u128,
        value: Claim,
    },
    /// Perform a VM step against the leaf claim at position `parent`.
    Step { parent: u128, proof: StepProof },
}

impl Response {
    /// Converts the [Response] into a [Move], if there is one to make.
    pub fn into_move(self) -> Option<Move> {
        match self {
            Response::DoNothing => None,
            Response::Move {
                is_attack: true,
                parent,
                value,
            } => Some(Move::Attack { parent, value }),
            Response::Move {
                is_attack: false,
                parent,
                value,
            } => Some(Move::Defend { parent, value }),
            Response::Step { parent, proof } => Some(Move::Step { parent, proof }),
        }
    }
}
