//! The solver module contains the [FaultSolver], which picks the honest response to a claim from
//! a participant's view of the trace.

use super::{
    trace::TraceProvider, ClaimData, DisputeGame, FaultDisputeGame, FaultError, Position,
    Response,
};
use std::sync::Arc;

/// A [FaultSolver] plays one side of a fault dispute game using its own [TraceProvider].
#[derive(Clone)]
pub struct FaultSolver {
    provider: Arc<dyn TraceProvider>,
    /// Whether the solver defends the root claim. The defending side owns the even depths of the
    /// tree and the challenging side owns the odd depths.
    agree_with_root: bool,
}

impl FaultSolver {
    pub fn new(provider: Arc<dyn TraceProvider>, agree_with_root: bool) -> Self {
        Self {
            provider,
            agree_with_root,
        }
    }

    pub fn agree_with_root(&self) -> bool {
        self.agree_with_root
    }

    pub fn provider(&self) -> &Arc<dyn TraceProvider> {
        &self.provider
    }

    /// Returns `true` if the claim sits on a level made by this solver's side.
    fn owns_level(&self, claim: &ClaimData) -> bool {
        (claim.position.depth() % 2 == 0) == self.agree_with_root
    }

    /// Respond to a [ClaimData] made by a participant in the dispute game.
    ///
    /// ### Takes
    /// - `game`: The game the claim belongs to.
    /// - `claim_index`: The index of the claim in the DAG array.
    ///
    /// ### Returns
    /// - `Ok(Response)`: The response to the claim.
    /// - `Err(FaultError)`: The claim does not exist, or the trace could not be read.
    pub fn respond(
        &self,
        game: &FaultDisputeGame,
        claim_index: usize,
    ) -> Result<Response, FaultError> {
        let claim = game
            .claim_data(claim_index)
            .ok_or(FaultError::UnknownClaim(claim_index as u128))?;

        if claim.countered || self.owns_level(claim) {
            return Ok(Response::DoNothing);
        }

        let max_depth = game.max_depth();
        let trace_index = claim.position.trace_index(max_depth);
        // A claim that matches our trace disputes nothing we hold.
        if self.provider.get(trace_index)? == claim.value {
            return Ok(Response::DoNothing);
        }

        if claim.position.depth() < max_depth {
            let position = claim.position.make_move(true);
            return Ok(Response::Move {
                is_attack: true,
                parent: claim.position,
                value: self.provider.get(position.trace_index(max_depth))?,
            });
        }

        if game.prestate_commitment(claim_index).is_none() {
            tracing::debug!(target: "fault-solver", "No anchored pre-state for the leaf claim at position {}", claim.position);
            return Ok(Response::DoNothing);
        }
        tracing::debug!(target: "fault-solver", "Stepping against leaf claim at position {}", claim.position);
        Ok(Response::Step {
            parent: claim.position,
            proof: self.provider.step(trace_index)?,
        })
    }

    /// Returns the responses to every claim in the game that warrants one.
    pub fn available_moves(&self, game: &FaultDisputeGame) -> Result<Vec<Response>, FaultError> {
        let mut responses = Vec::new();
        for index in 0..game.claim_count() {
            let response = self.respond(game, index)?;
            if response != Response::DoNothing {
                responses.push(response);
            }
        }
        Ok(responses)
    }
}
