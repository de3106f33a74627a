//! The game module holds the [DisputeGame] trait and the [FaultDisputeGame] state machine.

use super::{
    trace::StepVerifier, Claim, ClaimData, FaultError, GameMetadata, GameStatus, GameType, Move,
    MoveKind, MoveOutcome, Position, StepProof,
};
use ethers::types::{Address, Bytes};
use std::{collections::HashMap, fmt, sync::Arc};

/// The [DisputeGame] trait defines the interface of a dispute game as seen by orchestration.
pub trait DisputeGame {
    /// Returns the root claim of the dispute game.
    fn root_claim(&self) -> Claim;

    /// Returns the type of the dispute game being played.
    fn game_type(&self) -> GameType;

    /// Returns the current status of the dispute game.
    fn status(&self) -> GameStatus;

    /// Returns the encoded metadata the game was created with.
    fn extra_data(&self) -> Bytes;

    /// Fetch the [ClaimData] at the given index in the DAG array.
    ///
    /// ### Takes
    /// - `index`: The index of the claim in the DAG array.
    ///
    /// ### Returns
    /// - `Some(&ClaimData)`: The [ClaimData] at the given index.
    /// - `None`: No claim exists at the index.
    fn claim_data(&self, index: usize) -> Option<&ClaimData>;

    /// Validates and applies a [Move]. A rejected move leaves the game untouched.
    ///
    /// ### Takes
    /// - `claimant`: The participant submitting the move.
    /// - `mv`: The move to apply.
    ///
    /// ### Returns
    /// - `Ok(MoveOutcome)`: The claim that was created or countered.
    /// - `Err(FaultError)`: The move was rejected.
    fn apply_move(&mut self, claimant: Address, mv: Move) -> Result<MoveOutcome, FaultError>;

    /// Resolves the game. Calling this on a resolved game returns the stored status.
    fn resolve(&mut self) -> GameStatus;
}

/// A local copy of a fault dispute game. Claims live in a flat array in move order, indexed by
/// position, and reference their parent by array index.
#[derive(Clone)]
pub struct FaultDisputeGame {
    game_type: GameType,
    max_depth: u64,
    metadata: GameMetadata,
    status: GameStatus,
    claims: Vec<ClaimData>,
    positions: HashMap<u128, usize>,
    verifier: Arc<dyn StepVerifier>,
}

impl fmt::Debug for FaultDisputeGame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FaultDisputeGame")
            .field("game_type", &self.game_type)
            .field("max_depth", &self.max_depth)
            .field("metadata", &self.metadata)
            .field("status", &self.status)
            .field("claims", &self.claims)
            .finish_non_exhaustive()
    }
}

impl FaultDisputeGame {
    /// Creates a new game holding only the root claim.
    ///
    /// ### Takes
    /// - `game_type`: The type of the game.
    /// - `root_claim`: The commitment to the final trace index. Must not be zero.
    /// - `max_depth`: The depth of the position tree, within `1..=64`.
    /// - `metadata`: The decoded creation metadata.
    /// - `verifier`: The VM that referees steps.
    /// - `creator`: The claimant of the root claim.
    pub fn new(
        game_type: GameType,
        root_claim: Claim,
        max_depth: u64,
        metadata: GameMetadata,
        verifier: Arc<dyn StepVerifier>,
        creator: Address,
    ) -> Result<Self, FaultError> {
        if !(1..=64).contains(&max_depth) {
            return Err(FaultError::InvalidMaxDepth(max_depth));
        }
        if root_claim.is_zero() {
            return Err(FaultError::MissingRootClaim);
        }

        let root = ClaimData {
            parent_index: None,
            countered: false,
            countered_by: None,
            value: root_claim,
            position: 1,
            claimant: creator,
        };

        Ok(Self {
            game_type,
            max_depth,
            metadata,
            status: GameStatus::InProgress,
            claims: vec![root],
            positions: HashMap::from([(1, 0)]),
            verifier,
        })
    }

    /// Creates a new game from encoded metadata. See [FaultDisputeGame::new].
    pub fn with_extra_data(
        game_type: GameType,
        root_claim: Claim,
        max_depth: u64,
        extra_data: &[u8],
        verifier: Arc<dyn StepVerifier>,
        creator: Address,
    ) -> Result<Self, FaultError> {
        let metadata = GameMetadata::decode(extra_data)?;
        Self::new(game_type, root_claim, max_depth, metadata, verifier, creator)
    }

    pub fn max_depth(&self) -> u64 {
        self.max_depth
    }

    pub fn metadata(&self) -> GameMetadata {
        self.metadata
    }

    /// Returns every claim in move order.
    pub fn claims(&self) -> &[ClaimData] {
        &self.claims
    }

    pub fn claim_count(&self) -> usize {
        self.claims.len()
    }

    /// Returns the index and [ClaimData] of the claim at `position`, if one exists.
    pub fn claim_at(&self, position: u128) -> Option<(usize, &ClaimData)> {
        let index = *self.positions.get(&position)?;
        self.claims.get(index).map(|claim| (index, claim))
    }

    /// Walks up the ancestors of the claim at `index` looking for one that commits to
    /// `trace_index`.
    fn find_trace_ancestor(&self, index: usize, trace_index: u64) -> Option<&ClaimData> {
        let mut current = self.claims.get(index)?.parent_index;
        while let Some(i) = current {
            let claim = self.claims.get(i)?;
            if claim.position.trace_index(self.max_depth) == trace_index {
                return Some(claim);
            }
            current = claim.parent_index;
        }
        None
    }

    /// Returns the commitment a step against the leaf claim at `index` must start from: the
    /// absolute prestate for trace index 0, otherwise the ancestor committing to the previous
    /// trace index. Returns `None` when nothing in the game anchors the pre-state, in which case
    /// the leaf cannot be stepped.
    pub fn prestate_commitment(&self, index: usize) -> Option<Claim> {
        let trace_index = self.claims.get(index)?.position.trace_index(self.max_depth);
        if trace_index == 0 {
            return Some(self.verifier.absolute_prestate_hash());
        }
        self.find_trace_ancestor(index, trace_index - 1)
            .map(|ancestor| ancestor.value)
    }

    /// Checks a step against the leaf claim at `index` and returns `Ok` if it counters it.
    fn check_step(&self, index: usize, proof: &StepProof) -> Result<(), FaultError> {
        let leaf = &self.claims[index];
        let trace_index = leaf.position.trace_index(self.max_depth);

        let expected = self.prestate_commitment(index).ok_or_else(|| {
            FaultError::InvalidStep(format!(
                "no claim commits to the pre-state of trace index {}",
                trace_index
            ))
        })?;
        let pre_hash = self.verifier.state_hash(&proof.pre_state)?;
        if pre_hash != expected {
            return Err(FaultError::InvalidStep(format!(
                "pre-state {:?} does not match the agreed commitment {:?}",
                pre_hash, expected
            )));
        }

        let post = self.verifier.verify_step(trace_index, proof)?;
        if post == leaf.value {
            return Err(FaultError::InvalidStep(format!(
                "post-state at trace index {} matches the claim",
                trace_index
            )));
        }
        Ok(())
    }
}

impl DisputeGame for FaultDisputeGame {
    fn root_claim(&self) -> Claim {
        self.claims[0].value
    }

    fn game_type(&self) -> GameType {
        self.game_type
    }

    fn status(&self) -> GameStatus {
        self.status
    }

    fn extra_data(&self) -> Bytes {
        Bytes::from(self.metadata.encode().to_vec())
    }

    fn claim_data(&self, index: usize) -> Option<&ClaimData> {
        self.claims.get(index)
    }

    fn apply_move(&mut self, claimant: Address, mv: Move) -> Result<MoveOutcome, FaultError> {
        if self.status.is_terminal() {
            return Err(FaultError::GameNotInProgress(self.status));
        }

        let kind = mv.kind();
        let parent_pos = mv.parent();
        let (parent_index, parent) = self
            .claim_at(parent_pos)
            .ok_or(FaultError::UnknownClaim(parent_pos))?;
        if parent.countered {
            return Err(FaultError::AlreadyCountered(parent_pos));
        }
        let depth = parent_pos.depth();
        let parent_value = parent.value;

        match mv {
            Move::Attack { value, .. } | Move::Defend { value, .. } => {
                let is_attack = kind == MoveKind::Attack;
                let position = parent_pos.make_move(is_attack);
                if depth >= self.max_depth {
                    return Err(FaultError::DepthExceeded {
                        position,
                        max_depth: self.max_depth,
                    });
                }
                // The right child commits to the same trace index as its parent.
                if !is_attack && value == parent_value {
                    return Err(FaultError::UncontestedDefend(parent_pos));
                }
                if self.positions.contains_key(&position) {
                    return Err(FaultError::DuplicatePosition(position));
                }

                let claim = ClaimData {
                    parent_index: Some(parent_index),
                    countered: false,
                    countered_by: None,
                    value,
                    position,
                    claimant,
                };
                let parent = &mut self.claims[parent_index];
                parent.countered = true;
                parent.countered_by = Some(claimant);
                self.positions.insert(position, self.claims.len());
                self.claims.push(claim.clone());

                tracing::info!(target: "fault-dispute-game", "{} against position {} created claim {:?} at position {}", kind, parent_pos, value, position);
                Ok(MoveOutcome::Created(claim))
            }
            Move::Step { proof, .. } => {
                if depth != self.max_depth {
                    return Err(FaultError::InvalidMoveType { kind, depth });
                }
                self.check_step(parent_index, &proof)?;

                let parent = &mut self.claims[parent_index];
                parent.countered = true;
                parent.countered_by = Some(claimant);

                tracing::info!(target: "fault-dispute-game", "Step countered the leaf claim at position {}", parent_pos);
                Ok(MoveOutcome::Countered(parent.clone()))
            }
        }
    }

    fn resolve(&mut self) -> GameStatus {
        if self.status.is_terminal() {
            return self.status;
        }

        // Children always come after their parent in move order, so a reverse walk sees every
        // child before its parent. A claim stands unless a step countered it or one of its
        // children stands.
        let mut countered = vec![false; self.claims.len()];
        for (i, claim) in self.claims.iter().enumerate().rev() {
            if claim.countered && claim.position.depth() == self.max_depth {
                countered[i] = true;
            }
            if !countered[i] {
                if let Some(parent) = claim.parent_index {
                    countered[parent] = true;
                }
            }
        }

        self.status = if countered[0] {
            GameStatus::ChallengerWins
        } else {
            GameStatus::DefenderWins
        };
        tracing::info!(target: "fault-dispute-game", "Game resolved: {}", self.status);
        self.status
    }
}
