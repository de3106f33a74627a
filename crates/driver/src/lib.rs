#![doc = include_str!("../README.md")]

use anyhow::Result;
use async_trait::async_trait;

mod config;
pub use config::DriverConfig;

pub mod creator;
pub use creator::GameCreator;

pub mod drivers;
pub use drivers::{Agent, GameDriver};

pub mod factory;
pub use factory::{DisputeGameFactory, GameHandle, GameId};

pub mod source;
pub use source::{L1Source, LocalL1};

pub mod wait;
pub use wait::{cancel_pair, wait_for, CancelHandle, CancelToken, WaitError};

/// The [Driver] trait defines the interface for all driver loops that are ran by the
/// `fault-dispute` binary.
#[async_trait]
pub trait Driver {
    /// Starts the [Driver] loop.
    async fn start_loop(self) -> Result<()>;
}
