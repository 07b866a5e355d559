//! Exit registry: the authoritative map from UTXO position to exit record

use crate::constants::NULL_ADDRESS;
use crate::error::{ExitGameError, Result};
use crate::ledger::PayoutSink;
use crate::types::*;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
struct ExitRecord {
    owner: Address,
    amount: Amount,
    started_at: Timestamp,
    exitable_at: Timestamp,
    state: ExitState,
}

/// Exit records plus the finalization queue
///
/// Challenged exits are removed outright, so their position may be exited
/// again. Finalized exits stay behind as tombstones.
#[derive(Debug, Clone)]
pub struct ExitRegistry {
    dispute_period: u64,
    exits: BTreeMap<UtxoPosition, ExitRecord>,
    /// Pending exits ordered by (exitable_at, position)
    queue: BTreeSet<(Timestamp, UtxoPosition)>,
}

impl ExitRegistry {
    pub fn new(dispute_period: u64) -> Self {
        Self {
            dispute_period,
            exits: BTreeMap::new(),
            queue: BTreeSet::new(),
        }
    }

    pub fn dispute_period(&self) -> u64 {
        self.dispute_period
    }

    /// Check that `create` would succeed, without mutating
    pub fn ensure_vacant(&self, position: &UtxoPosition) -> Result<()> {
        match self.exits.get(position).map(|record| record.state) {
            Some(ExitState::Pending) => Err(ExitGameError::ExitAlreadyExists(*position)),
            Some(ExitState::Finalized) => Err(ExitGameError::ExitAlreadyFinalized(*position)),
            Some(ExitState::NonExistent) | None => Ok(()),
        }
    }

    /// Create: open a pending exit whose dispute window starts at `now`
    pub fn create(
        &mut self,
        position: UtxoPosition,
        owner: Address,
        amount: Amount,
        now: Timestamp,
    ) -> Result<Timestamp> {
        self.ensure_vacant(&position)?;

        let exitable_at = now.saturating_add(self.dispute_period);
        self.exits.insert(
            position,
            ExitRecord {
                owner,
                amount,
                started_at: now,
                exitable_at,
                state: ExitState::Pending,
            },
        );
        self.queue.insert((exitable_at, position));

        debug!(%position, exitable_at, "exit created");
        Ok(exitable_at)
    }

    /// Challenge: cancel a pending exit, returning the record it held
    pub fn challenge(&mut self, position: &UtxoPosition) -> Result<PlasmaExit> {
        let record = self.pending_record(position)?.clone();
        self.exits.remove(position);
        self.queue.remove(&(record.exitable_at, *position));

        debug!(%position, "exit cancelled");
        Ok(PlasmaExit {
            owner: record.owner,
            amount: record.amount,
            state: ExitState::NonExistent,
        })
    }

    /// Finalize: pay out a mature pending exit and leave a tombstone
    ///
    /// Requires `now - started_at >= dispute_period`. If the payout fails the
    /// record is left untouched.
    pub fn finalize<P: PayoutSink>(
        &mut self,
        position: &UtxoPosition,
        now: Timestamp,
        payouts: &mut P,
    ) -> Result<PlasmaExit> {
        let record = self.pending_record(position)?.clone();
        if now.saturating_sub(record.started_at) < self.dispute_period {
            return Err(ExitGameError::ExitNotMature {
                position: *position,
                exitable_at: record.exitable_at,
            });
        }

        payouts.transfer(&record.owner, record.amount)?;

        self.queue.remove(&(record.exitable_at, *position));
        self.exits.insert(
            *position,
            ExitRecord {
                owner: NULL_ADDRESS,
                amount: 0,
                started_at: record.started_at,
                exitable_at: record.exitable_at,
                state: ExitState::Finalized,
            },
        );

        debug!(%position, amount = %record.amount, "exit finalized");
        Ok(PlasmaExit {
            owner: record.owner,
            amount: record.amount,
            state: ExitState::Finalized,
        })
    }

    /// Get: always returns a record, zero-valued when no pending exit exists
    pub fn get(&self, position: &UtxoPosition) -> PlasmaExit {
        match self.exits.get(position) {
            Some(record) => PlasmaExit {
                owner: record.owner,
                amount: record.amount,
                state: record.state,
            },
            None => PlasmaExit::empty(ExitState::NonExistent),
        }
    }

    /// The pending exit at `position`, if any
    pub fn pending(&self, position: &UtxoPosition) -> Option<PlasmaExit> {
        self.pending_record(position).ok().map(|record| PlasmaExit {
            owner: record.owner,
            amount: record.amount,
            state: record.state,
        })
    }

    /// Next exit in finalization order
    pub fn next_exit(&self) -> Option<(Timestamp, UtxoPosition)> {
        self.queue.iter().next().copied()
    }

    /// Pending exits whose window has elapsed at `now`, in finalization order
    pub fn matured(&self, now: Timestamp) -> Vec<UtxoPosition> {
        self.queue
            .iter()
            .take_while(|(exitable_at, _)| *exitable_at <= now)
            .map(|(_, position)| *position)
            .collect()
    }

    pub fn pending_count(&self) -> usize {
        self.queue.len()
    }

    fn pending_record(&self, position: &UtxoPosition) -> Result<&ExitRecord> {
        match self.exits.get(position) {
            Some(record) if record.state == ExitState::Pending => Ok(record),
            _ => Err(ExitGameError::ExitNotFound(*position)),
        }
    }
}
