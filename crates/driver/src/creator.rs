//! The `creator` module contains the [GameCreator], which waits for the prerequisites of a game,
//! checkpoints its anchor block and creates it through the [DisputeGameFactory].

use crate::{
    factory::{DisputeGameFactory, GameHandle},
    source::L1Source,
    wait::{wait_for, CancelToken, WaitError},
    DriverConfig,
};
use anyhow::Result;
use ethers::types::Address;
use fault_dispute_solvers::fault::{
    trace::last_index, AlphabetTraceProvider, Claim, GameMetadata, GameStatus, GameType,
    TraceProvider,
};
use std::sync::Arc;

/// The [GameCreator] starts new games once L1 is ready for them.
pub struct GameCreator {
    config: Arc<DriverConfig>,
    factory: Arc<DisputeGameFactory>,
    source: Arc<dyn L1Source>,
    creator: Address,
    cancel: CancelToken,
}

impl GameCreator {
    pub fn new(
        config: Arc<DriverConfig>,
        factory: Arc<DisputeGameFactory>,
        source: Arc<dyn L1Source>,
        creator: Address,
        cancel: CancelToken,
    ) -> Self {
        Self {
            config,
            factory,
            source,
            creator,
            cancel,
        }
    }

    /// Starts an alphabet game whose root claim is the last letter of `claimed_alphabet`'s trace.
    pub async fn start_alphabet_game(&self, claimed_alphabet: &str) -> Result<GameHandle> {
        let depth = self.config.alphabet_depth;
        let trace = AlphabetTraceProvider::new(claimed_alphabet, depth);
        let root_claim = trace.get(last_index(depth))?;
        self.start_game(GameType::Alphabet, root_claim).await
    }

    /// Starts a cannon game with an explicit root claim.
    pub async fn start_cannon_game(&self, root_claim: Claim) -> Result<GameHandle> {
        self.start_game(GameType::Cannon, root_claim).await
    }

    async fn start_game(&self, game_type: GameType, root_claim: Claim) -> Result<GameHandle> {
        self.wait_for_proposals().await?;
        let anchor = self.checkpoint_l1_block().await?;

        let extra_data = GameMetadata::new(self.config.metadata_version, anchor).encode();
        self.factory
            .create(game_type, root_claim, &extra_data, self.creator)
            .await
    }

    /// Waits until there are at least two proposals in the output oracle. This is the minimum
    /// required for creating a game.
    async fn wait_for_proposals(&self) -> Result<(), WaitError> {
        let source = Arc::clone(&self.source);
        wait_for(
            self.config.proposal_timeout,
            self.config.poll_interval,
            &self.cancel,
            || {
                let source = Arc::clone(&source);
                async move {
                    let index = source.latest_output_index().await?;
                    tracing::debug!(target: "game-creator", "Latest output index: {:?}", index);
                    anyhow::Ok(index.map_or(false, |i| i >= 1))
                }
            },
        )
        .await
        .map_err(|e| {
            tracing::error!(target: "game-creator", "Did not get two output roots: {}", e);
            e
        })
    }

    /// Stores the current L1 block in the oracle and returns the block number that was stored.
    async fn checkpoint_l1_block(&self) -> Result<u64> {
        let timeout = self.config.checkpoint_timeout;
        let block = tokio::time::timeout(timeout, self.source.checkpoint())
            .await
            .map_err(|_| WaitError::Timeout(timeout))??;
        tracing::info!(target: "game-creator", "Checkpointed L1 block #{}", block);
        Ok(block)
    }

    /// Waits for the game behind `handle` to reach `status`.
    pub async fn wait_for_status(
        &self,
        handle: &GameHandle,
        status: GameStatus,
    ) -> Result<(), WaitError> {
        wait_for(
            self.config.status_timeout,
            self.config.poll_interval,
            &self.cancel,
            move || async move { anyhow::Ok(handle.status().await == status) },
        )
        .await
    }

    /// Waits for the game behind `handle` to hold at least `count` claims.
    pub async fn wait_for_claim_count(
        &self,
        handle: &GameHandle,
        count: usize,
    ) -> Result<(), WaitError> {
        wait_for(
            self.config.status_timeout,
            self.config.poll_interval,
            &self.cancel,
            move || async move { anyhow::Ok(handle.claim_count().await >= count) },
        )
        .await
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{source::LocalL1, wait::cancel_pair};
    use async_trait::async_trait;
    use fault_dispute_solvers::fault::{AlphabetVm, DisputeGame, Move};
    use std::time::Duration;

    const CORRECT_ALPHABET: &str = "abcdefghijklmnop";

    fn config() -> Arc<DriverConfig> {
        Arc::new(DriverConfig {
            poll_interval: Duration::from_millis(5),
            proposal_timeout: Duration::from_millis(200),
            checkpoint_timeout: Duration::from_millis(200),
            status_timeout: Duration::from_millis(200),
            ..Default::default()
        })
    }

    async fn factory() -> Arc<DisputeGameFactory> {
        let factory = DisputeGameFactory::new();
        factory
            .set_implementation(GameType::Alphabet, 4, Arc::new(AlphabetVm))
            .await;
        Arc::new(factory)
    }

    /// An L1 whose checkpoint transaction never lands.
    struct StuckL1;

    #[async_trait]
    impl L1Source for StuckL1 {
        async fn latest_output_index(&self) -> Result<Option<u64>> {
            Ok(Some(5))
        }

        async fn checkpoint(&self) -> Result<u64> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn starts_alphabet_game_after_proposals() {
        let l1 = Arc::new(LocalL1::new(100));
        l1.propose_output(Claim::repeat_byte(1)).await;
        l1.propose_output(Claim::repeat_byte(2)).await;

        let (_handle, cancel) = cancel_pair();
        let creator = GameCreator::new(config(), factory().await, l1.clone(), Address::zero(), cancel);
        let handle = creator.start_alphabet_game(CORRECT_ALPHABET).await.unwrap();

        let game = handle.snapshot().await;
        let expected = AlphabetTraceProvider::new(CORRECT_ALPHABET, 4).get(15).unwrap();
        assert_eq!(game.root_claim(), expected);
        assert_eq!(game.metadata(), GameMetadata::new(8, 102));
        assert_eq!(l1.checkpoints().await, vec![102]);
    }

    #[tokio::test]
    async fn times_out_without_proposals() {
        let l1 = Arc::new(LocalL1::new(0));
        l1.propose_output(Claim::repeat_byte(1)).await;

        let (_handle, cancel) = cancel_pair();
        let creator = GameCreator::new(config(), factory().await, l1, Address::zero(), cancel);
        let err = creator.start_alphabet_game(CORRECT_ALPHABET).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<WaitError>(),
            Some(WaitError::Timeout(_))
        ));
    }

    #[tokio::test]
    async fn cancelled_creation_stops_waiting() {
        let (handle, cancel) = cancel_pair();
        handle.cancel();
        let creator = GameCreator::new(
            config(),
            factory().await,
            Arc::new(LocalL1::new(0)),
            Address::zero(),
            cancel,
        );
        let err = creator.start_alphabet_game(CORRECT_ALPHABET).await.unwrap_err();
        assert_eq!(err.downcast_ref::<WaitError>(), Some(&WaitError::Cancelled));
    }

    #[tokio::test]
    async fn checkpoint_is_bounded() {
        let (_handle, cancel) = cancel_pair();
        let creator = GameCreator::new(config(), factory().await, Arc::new(StuckL1), Address::zero(), cancel);
        let err = creator.start_alphabet_game(CORRECT_ALPHABET).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<WaitError>(),
            Some(WaitError::Timeout(_))
        ));
    }

    #[tokio::test]
    async fn unregistered_cannon_game_is_rejected() {
        let l1 = Arc::new(LocalL1::new(0));
        l1.propose_output(Claim::repeat_byte(1)).await;
        l1.propose_output(Claim::repeat_byte(2)).await;

        let (_handle, cancel) = cancel_pair();
        let creator = GameCreator::new(config(), factory().await, l1, Address::zero(), cancel);
        assert!(creator.start_cannon_game(Claim::repeat_byte(3)).await.is_err());
    }

    #[tokio::test]
    async fn waits_for_claims_and_status() {
        let l1 = Arc::new(LocalL1::new(0));
        l1.propose_output(Claim::repeat_byte(1)).await;
        l1.propose_output(Claim::repeat_byte(2)).await;

        let (_handle, cancel) = cancel_pair();
        let creator = GameCreator::new(config(), factory().await, l1, Address::zero(), cancel);
        let handle = creator.start_alphabet_game(CORRECT_ALPHABET).await.unwrap();

        assert!(creator.wait_for_claim_count(&handle, 2).await.is_err());

        let mover = handle.clone();
        tokio::spawn(async move {
            mover
                .apply_move(
                    Address::zero(),
                    Move::Attack {
                        parent: 1,
                        value: Claim::repeat_byte(9),
                    },
                )
                .await
                .unwrap();
            mover.resolve().await;
        });

        creator.wait_for_claim_count(&handle, 2).await.unwrap();
        creator
            .wait_for_status(&handle, GameStatus::ChallengerWins)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn game_waits_use_the_status_timeout() {
        let l1 = Arc::new(LocalL1::new(0));
        l1.propose_output(Claim::repeat_byte(1)).await;
        l1.propose_output(Claim::repeat_byte(2)).await;

        let config = Arc::new(DriverConfig {
            poll_interval: Duration::from_millis(5),
            proposal_timeout: Duration::from_secs(30),
            status_timeout: Duration::from_millis(50),
            ..Default::default()
        });
        let (_handle, cancel) = cancel_pair();
        let creator = GameCreator::new(config, factory().await, l1, Address::zero(), cancel);
        let handle = creator.start_alphabet_game(CORRECT_ALPHABET).await.unwrap();

        assert_eq!(
            creator.wait_for_status(&handle, GameStatus::DefenderWins).await,
            Err(WaitError::Timeout(Duration::from_millis(50)))
        );
    }
}
