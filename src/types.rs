//! Core plasma types for exit game validation

use serde::{Deserialize, Serialize};

/// Hash type: 256-bit Keccak digest
pub type Hash = [u8; 32];

/// Address type: 160-bit account identifier
pub type Address = [u8; 20];

/// Byte string type
pub type ByteString = Vec<u8>;

/// Amount of value held by an output
pub type Amount = u128;

/// Child chain block number
pub type BlockNumber = u64;

/// Root ledger time in seconds
pub type Timestamp = u64;

/// Location of an output: block × transaction index × output index
///
/// Field order matters: the derived ordering is lexicographic and matches the
/// numeric ordering of encoded positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UtxoPosition {
    pub block_number: BlockNumber,
    pub tx_index: u64,
    pub output_index: u64,
}

/// Transaction Output: owner × amount
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionOutput {
    pub owner: Address,
    pub amount: Amount,
}

/// Transaction: inputs (0..=2 spent positions) × outputs (1..=2)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub inputs: Vec<UtxoPosition>,
    pub outputs: Vec<TransactionOutput>,
}

/// Committed child chain block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildBlock {
    pub root: Hash,
    pub timestamp: Timestamp,
}

/// Lifecycle of an exit at a given position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExitState {
    NonExistent,
    Pending,
    Finalized,
}

/// Externally visible exit record
///
/// Absence is reported as the null owner with zero amount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlasmaExit {
    pub owner: Address,
    pub amount: Amount,
    pub state: ExitState,
}

impl PlasmaExit {
    pub fn empty(state: ExitState) -> Self {
        Self {
            owner: crate::constants::NULL_ADDRESS,
            amount: 0,
            state,
        }
    }
}
