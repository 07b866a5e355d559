//! # Plasma Exit Game
//!
//! Root ledger side of a two-layer plasma chain: deposits, exits, challenges
//! and finalization, together with the verification they rely on.
//!
//! ## Architecture
//!
//! The crate is layered leaf-first:
//! - Position codec (`position`): UTXO location ⇄ single integer key
//! - Proof verifier (`merkle`): inclusion of a transaction under a block root
//! - Signature verifier (`signature`): transaction and confirmation signers
//! - Exit registry (`registry`): position → exit record, plus the exit queue
//! - Controller (`root_chain`): deposit, start/challenge/finalize exits
//!
//! ## Design Principles
//!
//! 1. **Verify, then mutate**: every call validates fully before touching state
//! 2. **Explicit state**: the ledger is an owned value, never ambient
//! 3. **Exact error kinds**: each rejection names its reason
//! 4. **Exact Version Pinning**: all exit-game-critical cryptography pinned to exact versions
//!
//! ## Usage
//!
//! ```rust
//! use plasma_exit_game::*;
//!
//! let operator = [0x01; 20];
//! let alice = [0xaa; 20];
//! let mut chain = RootChain::new(operator, ExitGameConfig::default()).unwrap();
//!
//! let block = chain.deposit(&alice, 100, 0).unwrap();
//! let position = position::encode(block, 0, 0).unwrap();
//! chain.start_deposit_exit(&alice, position, 100, 0).unwrap();
//!
//! let summary = chain.finalize_exits(DISPUTE_PERIOD);
//! assert_eq!(summary.finalized.len(), 1);
//! assert_eq!(chain.payouts().balance_of(&alice), 100);
//! assert_eq!(chain.get_exit(position).amount, 0);
//! ```

pub mod types;
pub mod constants;
pub mod config;
pub mod error;
pub mod hash;
pub mod position;
pub mod transaction;
pub mod merkle;
pub mod signature;
pub mod ledger;
pub mod registry;
pub mod root_chain;
pub mod shared;

// Re-export commonly used types
pub use types::*;
pub use constants::*;
pub use config::ExitGameConfig;
pub use error::{ExitGameError, Result};
pub use ledger::{Balances, BlockRootStore, ChildChainBlocks, PayoutSink};
pub use merkle::FixedMerkleTree;
pub use registry::ExitRegistry;
pub use root_chain::{deposit_tree, FinalizeSummary, RootChain};
pub use shared::SharedRootChain;
