pub mod bets;
pub mod health;
pub mod history;
pub mod sessions;
pub mod wallet;
