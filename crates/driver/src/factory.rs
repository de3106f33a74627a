//! The `factory` module contains the [DisputeGameFactory], which creates games bound to a root
//! claim and creation metadata, and the [GameHandle] used to interact with a created game.

use anyhow::{anyhow, Result};
use ethers::types::Address;
use fault_dispute_solvers::fault::{
    Claim, DisputeGame, FaultDisputeGame, FaultError, GameStatus, GameType, Move, MoveOutcome,
    StepVerifier,
};
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fmt, sync::Arc};
use tokio::sync::RwLock;

/// The index of a game within the [DisputeGameFactory].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GameId(pub usize);

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A shared handle to a created game. Moves take the write lock, so a game only ever has one
/// writer; reads clone a consistent snapshot under the read lock.
#[derive(Debug, Clone)]
pub struct GameHandle {
    id: GameId,
    game: Arc<RwLock<FaultDisputeGame>>,
}

impl GameHandle {
    pub fn id(&self) -> GameId {
        self.id
    }

    /// Applies a [Move] to the game. See [DisputeGame::apply_move].
    pub async fn apply_move(&self, claimant: Address, mv: Move) -> Result<MoveOutcome, FaultError> {
        self.game.write().await.apply_move(claimant, mv)
    }

    /// Resolves the game. See [DisputeGame::resolve].
    pub async fn resolve(&self) -> GameStatus {
        self.game.write().await.resolve()
    }

    pub async fn status(&self) -> GameStatus {
        self.game.read().await.status()
    }

    pub async fn root_claim(&self) -> Claim {
        self.game.read().await.root_claim()
    }

    pub async fn claim_count(&self) -> usize {
        self.game.read().await.claim_count()
    }

    /// Returns a copy of the game as of now.
    pub async fn snapshot(&self) -> FaultDisputeGame {
        self.game.read().await.clone()
    }
}

/// The implementation registered for a [GameType].
#[derive(Clone)]
struct GameImplementation {
    max_depth: u64,
    verifier: Arc<dyn StepVerifier>,
}

/// The [DisputeGameFactory] creates games from registered implementations and keeps every game it
/// created for lookup.
#[derive(Default)]
pub struct DisputeGameFactory {
    implementations: RwLock<HashMap<GameType, GameImplementation>>,
    games: RwLock<Vec<GameHandle>>,
}

impl DisputeGameFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the max depth and step verifier used for new games of `game_type`.
    pub async fn set_implementation(
        &self,
        game_type: GameType,
        max_depth: u64,
        verifier: Arc<dyn StepVerifier>,
    ) {
        tracing::info!(target: "dispute-factory", "Registered {} implementation with max depth {}", game_type, max_depth);
        self.implementations.write().await.insert(
            game_type,
            GameImplementation {
                max_depth,
                verifier,
            },
        );
    }

    /// Creates a new game.
    ///
    /// ### Takes
    /// - `game_type`: The registered [GameType] to create.
    /// - `root_claim`: The root claim. Must not be zero.
    /// - `extra_data`: The encoded 64 byte game metadata.
    /// - `creator`: The claimant of the root claim.
    ///
    /// ### Returns
    /// - `Ok(GameHandle)`: A handle to the created game.
    /// - `Err(anyhow::Error)`: No implementation is registered for `game_type`, or the game
    ///   rejected its inputs with a [FaultError].
    pub async fn create(
        &self,
        game_type: GameType,
        root_claim: Claim,
        extra_data: &[u8],
        creator: Address,
    ) -> Result<GameHandle> {
        let implementation = self
            .implementations
            .read()
            .await
            .get(&game_type)
            .cloned()
            .ok_or_else(|| anyhow!("No implementation registered for game type {}", game_type))?;

        let game = FaultDisputeGame::with_extra_data(
            game_type,
            root_claim,
            implementation.max_depth,
            extra_data,
            implementation.verifier,
            creator,
        )?;
        let anchor = game.metadata().anchor_block;

        let mut games = self.games.write().await;
        let handle = GameHandle {
            id: GameId(games.len()),
            game: Arc::new(RwLock::new(game)),
        };
        games.push(handle.clone());

        tracing::info!(target: "dispute-factory", "Created {} game {} with root claim {:?} anchored at L1 block #{}", game_type, handle.id, root_claim, anchor);
        Ok(handle)
    }

    /// Returns the game with the given [GameId].
    pub async fn game(&self, id: GameId) -> Option<GameHandle> {
        self.games.read().await.get(id.0).cloned()
    }

    pub async fn game_count(&self) -> usize {
        self.games.read().await.len()
    }

    /// Returns the status of the game with the given [GameId].
    pub async fn status(&self, id: GameId) -> Option<GameStatus> {
        match self.game(id).await {
            Some(handle) => Some(handle.status().await),
            None => None,
        }
    }
}
