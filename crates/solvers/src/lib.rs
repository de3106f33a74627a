//! The core of the fault dispute game: position arithmetic, the claim tree state machine, trace
//! providers for the alphabet and execution VMs, and the solver that plays the game honestly.

pub mod fault;
