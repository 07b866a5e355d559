//! UTXO position codec
//!
//! A position packs (block number, transaction index, output index) into one
//! integer: `block * 10^9 + tx_index * 10^4 + output_index`.

use crate::constants::*;
use crate::error::{ExitGameError, Result};
use crate::types::*;

/// Encode: ℕ × ℕ × ℕ → ℕ
///
/// Fails when any component exceeds its reserved digit width.
pub fn encode(block_number: BlockNumber, tx_index: u64, output_index: u64) -> Result<u64> {
    if block_number > MAX_BLOCK_NUMBER {
        return Err(ExitGameError::InvalidPosition(format!(
            "block number {} exceeds {}",
            block_number, MAX_BLOCK_NUMBER
        )));
    }
    if tx_index >= MAX_TX_INDEX {
        return Err(ExitGameError::InvalidPosition(format!(
            "transaction index {} exceeds {}",
            tx_index,
            MAX_TX_INDEX - 1
        )));
    }
    if output_index >= MAX_OUTPUT_INDEX {
        return Err(ExitGameError::InvalidPosition(format!(
            "output index {} exceeds {}",
            output_index,
            MAX_OUTPUT_INDEX - 1
        )));
    }

    Ok(block_number * BLOCK_OFFSET + tx_index * TX_OFFSET + output_index)
}

/// Decode: ℕ → ℕ × ℕ × ℕ
///
/// Total over `u64`; the inverse of [`encode`] on every encodable triple.
pub fn decode(position: u64) -> UtxoPosition {
    UtxoPosition {
        block_number: position / BLOCK_OFFSET,
        tx_index: (position % BLOCK_OFFSET) / TX_OFFSET,
        output_index: position % TX_OFFSET,
    }
}

impl UtxoPosition {
    pub fn new(block_number: BlockNumber, tx_index: u64, output_index: u64) -> Result<Self> {
        encode(block_number, tx_index, output_index)?;
        Ok(Self {
            block_number,
            tx_index,
            output_index,
        })
    }

    /// Decode and reject positions whose block number is out of range
    pub fn from_encoded(position: u64) -> Result<Self> {
        let decoded = decode(position);
        encode(decoded.block_number, decoded.tx_index, decoded.output_index)?;
        Ok(decoded)
    }

    pub fn encode(&self) -> Result<u64> {
        encode(self.block_number, self.tx_index, self.output_index)
    }

    /// Location of the producing transaction, without the output index
    pub fn tx_position(&self) -> (BlockNumber, u64) {
        (self.block_number, self.tx_index)
    }
}

impl std::fmt::Display for UtxoPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.block_number, self.tx_index, self.output_index)
    }
}
