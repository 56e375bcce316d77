use crate::config::Config;
use parking_lot::Mutex;
use std::sync::Arc;
use wager_client::executor::FixtureHouse;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    /// Handlers lock only for synchronous house calls, never across `.await`
    pub house: Arc<Mutex<FixtureHouse>>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let mut house = FixtureHouse::new(config.fixture.seed, config.fixture.initial_balance);
        if config.fixture.deferred_settlement {
            house.set_deferred_settlement(Some(1));
        }

        Self {
            config: Arc::new(config),
            house: Arc::new(Mutex::new(house)),
        }
    }
}
