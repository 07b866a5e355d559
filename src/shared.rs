//! Serialized access to a root chain shared between callers
//!
//! Each call holds the lock for its whole validate-then-commit run, so racing
//! calls on the same position are totally ordered.

use crate::error::Result;
use crate::ledger::{Balances, PayoutSink};
use crate::root_chain::{FinalizeSummary, RootChain};
use crate::types::*;
use parking_lot::Mutex;
use std::sync::Arc;

pub struct SharedRootChain<P: PayoutSink = Balances> {
    inner: Arc<Mutex<RootChain<P>>>,
}

impl<P: PayoutSink> Clone for SharedRootChain<P> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<P: PayoutSink> SharedRootChain<P> {
    pub fn new(root_chain: RootChain<P>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(root_chain)),
        }
    }

    pub fn submit_block(&self, sender: &Address, root: Hash, now: Timestamp) -> Result<BlockNumber> {
        self.inner.lock().submit_block(sender, root, now)
    }

    pub fn deposit(&self, owner: &Address, amount: Amount, now: Timestamp) -> Result<BlockNumber> {
        self.inner.lock().deposit(owner, amount, now)
    }

    pub fn start_deposit_exit(
        &self,
        sender: &Address,
        utxo_position: u64,
        amount: Amount,
        now: Timestamp,
    ) -> Result<()> {
        self.inner.lock().start_deposit_exit(sender, utxo_position, amount, now)
    }

    pub fn start_exit(
        &self,
        sender: &Address,
        utxo_position: u64,
        encoded_tx: &[u8],
        proof: &[u8],
        signatures: &[u8],
        now: Timestamp,
    ) -> Result<()> {
        self.inner
            .lock()
            .start_exit(sender, utxo_position, encoded_tx, proof, signatures, now)
    }

    pub fn challenge_exit(
        &self,
        exiting_position: u64,
        spending_position: u64,
        spending_tx: &[u8],
        proof: &[u8],
        signatures: &[u8],
        confirmation_signatures: &[u8],
    ) -> Result<()> {
        self.inner.lock().challenge_exit(
            exiting_position,
            spending_position,
            spending_tx,
            proof,
            signatures,
            confirmation_signatures,
        )
    }

    pub fn finalize_exits(&self, now: Timestamp) -> FinalizeSummary {
        self.inner.lock().finalize_exits(now)
    }

    pub fn get_exit(&self, utxo_position: u64) -> PlasmaExit {
        self.inner.lock().get_exit(utxo_position)
    }

    /// Run a read-only closure against a consistent snapshot
    pub fn with<R>(&self, f: impl FnOnce(&RootChain<P>) -> R) -> R {
        f(&self.inner.lock())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExitGameConfig;
    use crate::error::ExitGameError;
    use crate::position::encode;
    use std::thread;

    #[test]
    fn test_racing_deposit_exits_admit_one() {
        let alice = [0xaa; 20];
        let chain = SharedRootChain::new(RootChain::new([0x01; 20], ExitGameConfig::default()).unwrap());
        let block = chain.deposit(&alice, 100, 0).unwrap();
        let position = encode(block, 0, 0).unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let chain = chain.clone();
                thread::spawn(move || chain.start_deposit_exit(&alice, position, 100, 1))
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(|e| matches!(e, ExitGameError::ExitAlreadyExists(_))));
        assert_eq!(chain.get_exit(position).amount, 100);
    }

    #[test]
    fn test_with_reads_state() {
        let chain = SharedRootChain::new(RootChain::new([0x01; 20], ExitGameConfig::default()).unwrap());
        chain.deposit(&[0xaa; 20], 7, 0).unwrap();
        assert_eq!(chain.with(|c| c.vault_balance()), 7);
    }
}
