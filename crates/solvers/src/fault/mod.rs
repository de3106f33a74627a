//! Data structures, types, and the game state machine and solver implementations for the
//! fault dispute game variants.

mod position;
pub use position::{compute_gindex, Position};

mod types;
pub use types::*;

mod error;
pub use error::FaultError;

mod metadata;
pub use metadata::{GameMetadata, DEFAULT_METADATA_VERSION, METADATA_LEN};

pub mod trace;
pub use trace::{
    AlphabetTraceProvider, AlphabetVm, ExecutionTraceProvider, ExecutionVm, Machine,
    StepVerifier, TraceProvider,
};

mod game;
pub use game::{DisputeGame, FaultDisputeGame};

mod solver;
pub use solver::FaultSolver;
