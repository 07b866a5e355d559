//! Error types for exit game validation

use crate::types::UtxoPosition;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExitGameError {
    #[error("Invalid UTXO position: {0}")]
    InvalidPosition(String),

    #[error("Invalid inclusion proof: {0}")]
    InvalidProof(String),

    #[error("Invalid signature: {0}")]
    InvalidSignature(String),

    #[error("Exit already exists for position {0}")]
    ExitAlreadyExists(UtxoPosition),

    #[error("Exit already finalized for position {0}")]
    ExitAlreadyFinalized(UtxoPosition),

    #[error("No pending exit for position {0}")]
    ExitNotFound(UtxoPosition),

    #[error("Exit for position {position} matures at {exitable_at}")]
    ExitNotMature { position: UtxoPosition, exitable_at: u64 },

    #[error("Invalid transaction: {0}")]
    InvalidTransaction(String),

    #[error("Unknown block: {0}")]
    BlockNotFound(u64),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Deposit limit reached for current child block interval")]
    DepositLimitReached,

    #[error("Insufficient funds: {0}")]
    InsufficientFunds(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

pub type Result<T> = std::result::Result<T, ExitGameError>;
