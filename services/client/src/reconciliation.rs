//! Authoritative wallet balance
//!
//! Every balance write in the client goes through [`BalanceReconciler`]:
//! session start and wallet fetch seed it, settlements replace it, and
//! deposit/withdraw confirmations adjust it once per transaction id. Server
//! values always win; nothing here predicts or corrects.

use parking_lot::Mutex;
use shared::Credits;
use std::collections::HashSet;
use tracing::{debug, error, info, warn};

use crate::domain::{BetId, BetResult};
use crate::events::{BalanceSource, EventBus, GameEvent};

#[derive(Debug, Clone, PartialEq)]
pub enum ReconciliationIssue {
    /// `balance_after != balance_before - bet_amount + win_amount`
    ArithmeticMismatch { expected: Credits, reported: Credits },
    /// The server's `balance_before` differs from the balance the client held
    BalanceDrift { local: Credits, server_before: Credits },
}

/// Client and server disagree about a settled bet. Logged, never fatal.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconciliationWarning {
    pub bet_id: BetId,
    pub issue: ReconciliationIssue,
}

/// Compare a settlement with balance arithmetic and the locally held balance
pub fn check_settlement(result: &BetResult, local_before: Option<Credits>) -> Vec<ReconciliationWarning> {
    let mut warnings = Vec::new();

    match result.expected_balance() {
        Ok(expected) if expected == result.new_balance => {}
        Ok(expected) => warnings.push(ReconciliationWarning {
            bet_id: result.bet_id.clone(),
            issue: ReconciliationIssue::ArithmeticMismatch {
                expected,
                reported: result.new_balance,
            },
        }),
        Err(e) => warn!(bet_id = %result.bet_id, error = %e, "Settlement amounts overflow"),
    }

    if let Some(local) = local_before {
        if local != result.balance_before {
            warnings.push(ReconciliationWarning {
                bet_id: result.bet_id.clone(),
                issue: ReconciliationIssue::BalanceDrift {
                    local,
                    server_before: result.balance_before,
                },
            });
        }
    }

    warnings
}

#[derive(Default)]
struct Ledger {
    balance: Option<Credits>,
    applied_transfers: HashSet<String>,
    /// Bumped on every balance write
    epoch: u64,
}

pub struct BalanceReconciler {
    ledger: Mutex<Ledger>,
    events: EventBus,
}

impl BalanceReconciler {
    pub fn new(events: EventBus) -> Self {
        Self {
            ledger: Mutex::new(Ledger::default()),
            events,
        }
    }

    /// Authoritative balance, `None` until first seeded
    pub fn balance(&self) -> Option<Credits> {
        self.ledger.lock().balance
    }

    /// Funds a new bet may draw on
    pub fn available(&self) -> Credits {
        self.balance().unwrap_or(Credits::ZERO)
    }

    /// Write counter; capture it before a balance read goes out
    pub fn epoch(&self) -> u64 {
        self.ledger.lock().epoch
    }

    /// Set the balance from a server read (session start, wallet fetch)
    pub fn seed(&self, server_balance: Credits, source: BalanceSource) {
        {
            let mut ledger = self.ledger.lock();
            ledger.balance = Some(server_balance);
            ledger.epoch += 1;
        }
        debug!(balance = %server_balance, ?source, "Balance seeded");
        self.publish_balance(server_balance, source);
    }

    /// Seed from a server read taken at `epoch`
    ///
    /// Returns false, leaving the balance alone, when any write landed after
    /// the read was issued.
    pub fn seed_if_unchanged(&self, epoch: u64, server_balance: Credits, source: BalanceSource) -> bool {
        {
            let mut ledger = self.ledger.lock();
            if ledger.epoch != epoch {
                debug!(
                    balance = %server_balance,
                    ?source,
                    read_epoch = epoch,
                    current_epoch = ledger.epoch,
                    "Discarding balance read older than the last write"
                );
                return false;
            }
            ledger.balance = Some(server_balance);
            ledger.epoch += 1;
        }
        debug!(balance = %server_balance, ?source, "Balance seeded");
        self.publish_balance(server_balance, source);
        true
    }

    /// Replace the balance with a settlement's `balance_after`
    pub fn apply(&self, result: &BetResult) -> Vec<ReconciliationWarning> {
        let previous = {
            let mut ledger = self.ledger.lock();
            ledger.epoch += 1;
            ledger.balance.replace(result.new_balance)
        };

        let warnings = check_settlement(result, previous);
        for warning in &warnings {
            warn!(
                bet_id = %warning.bet_id,
                issue = ?warning.issue,
                "Reconciliation warning: client and server disagree"
            );
            metrics::counter!("reconciliation_warnings_total").increment(1);
            self.events
                .publish(GameEvent::ReconciliationWarning(warning.clone()));
        }

        if result.new_balance.is_negative() {
            error!(
                bet_id = %result.bet_id,
                balance = %result.new_balance,
                "Server reported negative balance after settlement"
            );
            metrics::counter!("balance_anomalies_total").increment(1);
        }

        self.publish_balance(result.new_balance, BalanceSource::Settlement);
        warnings
    }

    /// Apply a confirmed deposit; returns false if already applied
    pub fn credit(&self, transaction_id: &str, amount: Credits) -> bool {
        self.transfer(transaction_id, amount, BalanceSource::Deposit)
    }

    /// Apply a confirmed withdrawal; returns false if already applied
    pub fn debit(&self, transaction_id: &str, amount: Credits) -> bool {
        self.transfer(transaction_id, amount, BalanceSource::Withdrawal)
    }

    fn transfer(&self, transaction_id: &str, amount: Credits, source: BalanceSource) -> bool {
        let updated = {
            let mut ledger = self.ledger.lock();
            if ledger.applied_transfers.contains(transaction_id) {
                debug!(transaction_id, "Transfer confirmation already applied");
                return false;
            }

            let Some(current) = ledger.balance else {
                // The next seed carries this transfer
                ledger.applied_transfers.insert(transaction_id.to_string());
                debug!(transaction_id, "Transfer confirmed before balance was seeded");
                return true;
            };

            let next = match source {
                BalanceSource::Withdrawal => current.checked_sub(amount),
                _ => current.checked_add(amount),
            };
            let next = match next {
                Ok(next) => next,
                Err(e) => {
                    error!(transaction_id, error = %e, "Transfer overflows balance");
                    return false;
                }
            };

            ledger.applied_transfers.insert(transaction_id.to_string());
            ledger.balance = Some(next);
            ledger.epoch += 1;
            next
        };

        if updated.is_negative() {
            error!(transaction_id, balance = %updated, "Balance negative after transfer");
        }
        info!(transaction_id, amount = %amount, balance = %updated, ?source, "Transfer applied");
        self.publish_balance(updated, source);
        true
    }

    fn publish_balance(&self, balance: Credits, source: BalanceSource) {
        self.events
            .publish(GameEvent::BalanceChanged { balance, source });
    }
}
