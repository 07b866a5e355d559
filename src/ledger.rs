//! Root ledger collaborators: committed block roots and payouts

use crate::error::{ExitGameError, Result};
use crate::types::*;
use std::collections::{BTreeMap, HashMap};

/// Read access to committed child chain block roots
pub trait BlockRootStore {
    fn child_block(&self, block_number: BlockNumber) -> Option<ChildBlock>;

    fn block_root(&self, block_number: BlockNumber) -> Result<Hash> {
        self.child_block(block_number)
            .map(|block| block.root)
            .ok_or(ExitGameError::BlockNotFound(block_number))
    }
}

/// Destination of finalized exit payouts
pub trait PayoutSink {
    fn transfer(&mut self, to: &Address, amount: Amount) -> Result<()>;
}

/// Committed blocks, keyed by block number
#[derive(Debug, Clone, Default)]
pub struct ChildChainBlocks {
    blocks: BTreeMap<BlockNumber, ChildBlock>,
}

impl ChildChainBlocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a block; block numbers are never overwritten
    pub fn insert(&mut self, block_number: BlockNumber, block: ChildBlock) -> Result<()> {
        if self.blocks.contains_key(&block_number) {
            return Err(ExitGameError::Unauthorized(format!(
                "block {} already committed",
                block_number
            )));
        }
        self.blocks.insert(block_number, block);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

impl BlockRootStore for ChildChainBlocks {
    fn child_block(&self, block_number: BlockNumber) -> Option<ChildBlock> {
        self.blocks.get(&block_number).copied()
    }
}

/// In-memory account balances credited by payouts
#[derive(Debug, Clone, Default)]
pub struct Balances {
    accounts: HashMap<Address, Amount>,
}

impl Balances {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn balance_of(&self, address: &Address) -> Amount {
        self.accounts.get(address).copied().unwrap_or(0)
    }
}

impl PayoutSink for Balances {
    fn transfer(&mut self, to: &Address, amount: Amount) -> Result<()> {
        let balance = self.balance_of(to);
        let updated = balance.checked_add(amount).ok_or_else(|| {
            ExitGameError::InsufficientFunds(format!("balance overflow for {}", hex::encode(to)))
        })?;
        self.accounts.insert(*to, updated);
        Ok(())
    }
}
