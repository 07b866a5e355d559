//! Plasma exit game demo
//!
//! Plays a child chain against the root chain: a deposit is exited, the exit
//! is challenged with a confirmed spend, and the spend's output is exited and
//! finalized instead.

use anyhow::{Context, Result};
use secp256k1::SecretKey;
use tracing::info;
use tracing_subscriber::EnvFilter;

use plasma_exit_game::{
    position,
    signature::{address_from_secret_key, confirmation_hash, sign_hash},
    transaction::leaf_hash,
    ExitGameConfig, FixedMerkleTree, RootChain, Transaction, TransactionOutput, MERKLE_DEPTH,
};

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => {
            let json = std::fs::read_to_string(&path).with_context(|| format!("reading {}", path))?;
            ExitGameConfig::from_json(&json)?
        }
        None => ExitGameConfig::default(),
    };
    info!(dispute_period = config.dispute_period, "Plasma exit game v{}", env!("CARGO_PKG_VERSION"));

    let operator_key = SecretKey::from_slice(&[0x01; 32])?;
    let alice_key = SecretKey::from_slice(&[0x0a; 32])?;
    let bob_key = SecretKey::from_slice(&[0x0b; 32])?;
    let operator = address_from_secret_key(&operator_key);
    let alice = address_from_secret_key(&alice_key);
    let bob = address_from_secret_key(&bob_key);

    let mut chain = RootChain::new(operator, config.clone())?;
    let mut now = 1_000;

    // Alice deposits and immediately tries to exit the deposit
    let deposit_block = chain.deposit(&alice, 100, now)?;
    let deposit_position = position::encode(deposit_block, 0, 0)?;
    chain.start_deposit_exit(&alice, deposit_position, 100, now)?;

    // Alice had already paid Bob on the child chain
    now += 10;
    let spend = Transaction {
        inputs: vec![position::decode(deposit_position)],
        outputs: vec![TransactionOutput { owner: bob, amount: 100 }],
    };
    let spend_tx = spend.encode()?;
    let spend_hash = spend.hash()?;
    let signatures = sign_hash(&spend_hash, &alice_key)?.to_vec();
    let tree = FixedMerkleTree::new(MERKLE_DEPTH, vec![leaf_hash(&spend_hash, &signatures)])?;
    let spend_block = chain.submit_block(&operator, tree.root(), now)?;
    let spend_position = position::encode(spend_block, 0, 0)?;
    let proof = tree.create_membership_proof(0)?;
    let confirmations = sign_hash(&confirmation_hash(&spend_hash, &tree.root()), &alice_key)?.to_vec();

    // Bob defeats Alice's exit and exits his own output
    chain.challenge_exit(deposit_position, spend_position, &spend_tx, &proof, &signatures, &confirmations)?;
    chain.start_exit(&bob, spend_position, &spend_tx, &proof, &signatures, now)?;

    let early = chain.finalize_exits(now);
    info!(finalized = early.finalized.len(), "finalization before the dispute period");

    let summary = chain.finalize_exits(now + config.dispute_period);
    info!(finalized = summary.finalized.len(), failed = summary.failed.len(), "finalization after the dispute period");
    info!(alice = %chain.payouts().balance_of(&alice), bob = %chain.payouts().balance_of(&bob), "final balances");

    Ok(())
}
