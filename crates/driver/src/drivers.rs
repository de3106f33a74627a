//! The `drivers` module contains implementations of the [Driver] trait.

use crate::{factory::GameHandle, wait::CancelToken, Driver};
use anyhow::Result;
use async_trait::async_trait;
use ethers::types::Address;
use fault_dispute_solvers::fault::{FaultSolver, GameStatus};

/// An [Agent] is a [FaultSolver] bound to the address it submits moves from.
#[derive(Clone)]
pub struct Agent {
    pub solver: FaultSolver,
    pub address: Address,
}

impl Agent {
    pub fn new(solver: FaultSolver, address: Address) -> Self {
        Self { solver, address }
    }
}

/// The [GameDriver] plays a game to completion. Agents take turns answering every open claim;
/// once a full round passes without an accepted move the game is resolved.
pub struct GameDriver {
    game: GameHandle,
    agents: Vec<Agent>,
    cancel: CancelToken,
}

impl GameDriver {
    pub fn new(game: GameHandle, agents: Vec<Agent>, cancel: CancelToken) -> Self {
        Self {
            game,
            agents,
            cancel,
        }
    }

    /// Runs one round of every agent and returns the number of accepted moves.
    async fn round(&self) -> Result<usize> {
        let mut accepted = 0;
        for agent in &self.agents {
            let snapshot = self.game.snapshot().await;
            for response in agent.solver.available_moves(&snapshot)? {
                let Some(mv) = response.into_move() else {
                    continue;
                };
                let kind = mv.kind();
                match self.game.apply_move(agent.address, mv).await {
                    Ok(_) => accepted += 1,
                    Err(e) => {
                        // Soft failure, log the error and continue.
                        tracing::warn!(target: "game-driver", "{:?} rejected {}: {}", agent.address, kind, e);
                    }
                }
            }
        }
        Ok(accepted)
    }
}

#[async_trait]
impl Driver for GameDriver {
    async fn start_loop(self) -> Result<()> {
        tracing::info!(target: "game-driver", "Starting game driver for game {} with {} agents", self.game.id(), self.agents.len());

        while self.game.status().await == GameStatus::InProgress {
            if self.cancel.is_cancelled() {
                tracing::warn!(target: "game-driver", "Game driver cancelled before resolution");
                return Ok(());
            }

            let accepted = self.round().await?;
            tracing::debug!(target: "game-driver", "Round finished with {} accepted moves", accepted);
            if accepted == 0 {
                let status = self.game.resolve().await;
                tracing::info!(target: "game-driver", "No moves left, game {} resolved: {}", self.game.id(), status);
            }
        }

        Ok(())
    }
}
