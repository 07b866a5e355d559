//! Root chain exit game controller
//!
//! Every state-changing call runs a read-only validation phase that yields a
//! claim, then commits the claim in a single registry mutation. A call that
//! fails leaves all state untouched.

use crate::config::ExitGameConfig;
use crate::constants::*;
use crate::error::{ExitGameError, Result};
use crate::ledger::{Balances, BlockRootStore, ChildChainBlocks, PayoutSink};
use crate::merkle::{self, FixedMerkleTree};
use crate::position;
use crate::registry::ExitRegistry;
use crate::signature::{confirmation_hash, recover_signer, split_signatures, verify_confirmation};
use crate::transaction::{leaf_hash, tx_hash};
use crate::types::*;
use tracing::{debug, info, warn};

/// Block tree holding a single deposit transaction at index 0
pub fn deposit_tree(owner: Address, amount: Amount) -> Result<FixedMerkleTree> {
    let tx = Transaction::deposit(owner, amount);
    let leaf = leaf_hash(&tx.hash()?, &[]);
    FixedMerkleTree::new(MERKLE_DEPTH, vec![leaf])
}

/// Validated start-exit request
#[derive(Debug, Clone, PartialEq, Eq)]
struct ExitClaim {
    position: UtxoPosition,
    owner: Address,
    amount: Amount,
}

/// Validated challenge request
#[derive(Debug, Clone, PartialEq, Eq)]
struct ChallengeClaim {
    exiting: UtxoPosition,
    spending: UtxoPosition,
}

/// Outcome of one finalization pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FinalizeSummary {
    /// Exits paid out, with the owner and amount they paid
    pub finalized: Vec<(UtxoPosition, PlasmaExit)>,
    /// Matured exits that could not be finalized in this pass
    pub failed: Vec<(UtxoPosition, ExitGameError)>,
}

/// Root ledger side of the plasma chain
#[derive(Debug, Clone)]
pub struct RootChain<P: PayoutSink = Balances> {
    config: ExitGameConfig,
    operator: Address,
    blocks: ChildChainBlocks,
    registry: ExitRegistry,
    payouts: P,
    current_child_block: BlockNumber,
    current_deposit_block: u64,
    vault_balance: Amount,
}

impl RootChain<Balances> {
    pub fn new(operator: Address, config: ExitGameConfig) -> Result<Self> {
        Self::with_payouts(operator, config, Balances::new())
    }
}

impl<P: PayoutSink> RootChain<P> {
    pub fn with_payouts(operator: Address, config: ExitGameConfig, payouts: P) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            registry: ExitRegistry::new(config.dispute_period),
            current_child_block: config.child_block_interval,
            current_deposit_block: 1,
            config,
            operator,
            blocks: ChildChainBlocks::new(),
            payouts,
            vault_balance: 0,
        })
    }

    /// SubmitBlock: record the next child block root (operator only)
    pub fn submit_block(&mut self, sender: &Address, root: Hash, now: Timestamp) -> Result<BlockNumber> {
        if *sender != self.operator {
            return Err(ExitGameError::Unauthorized(format!(
                "{} is not the operator",
                hex::encode(sender)
            )));
        }

        let block_number = self.current_child_block;
        let next_child_block = block_number
            .checked_add(self.config.child_block_interval)
            .filter(|next| *next <= MAX_BLOCK_NUMBER)
            .ok_or_else(|| ExitGameError::InvalidPosition("child chain block numbers exhausted".to_string()))?;

        self.blocks.insert(block_number, ChildBlock { root, timestamp: now })?;
        self.current_child_block = next_child_block;
        self.current_deposit_block = 1;

        info!(block_number, root = %hex::encode(root), "child block submitted");
        Ok(block_number)
    }

    /// Deposit: commit a single-output deposit block and credit the vault
    pub fn deposit(&mut self, owner: &Address, amount: Amount, now: Timestamp) -> Result<BlockNumber> {
        if amount == 0 {
            return Err(ExitGameError::InvalidAmount("deposit amount must be non-zero".to_string()));
        }
        if self.current_deposit_block >= self.config.child_block_interval {
            return Err(ExitGameError::DepositLimitReached);
        }
        let vault_balance = self
            .vault_balance
            .checked_add(amount)
            .ok_or_else(|| ExitGameError::InvalidAmount("vault balance overflow".to_string()))?;

        let root = deposit_tree(*owner, amount)?.root();
        let block_number = self.deposit_block_number();
        self.blocks.insert(block_number, ChildBlock { root, timestamp: now })?;
        self.current_deposit_block += 1;
        self.vault_balance = vault_balance;

        info!(block_number, owner = %hex::encode(owner), amount = %amount, "deposit recorded");
        Ok(block_number)
    }

    /// StartDepositExit: exit a deposit by restating its owner and amount
    pub fn start_deposit_exit(
        &mut self,
        sender: &Address,
        utxo_position: u64,
        amount: Amount,
        now: Timestamp,
    ) -> Result<()> {
        let result = self.validate_deposit_exit(sender, utxo_position, amount);
        self.commit_exit(result, now)
    }

    /// StartExit: open an exit on an output proven to be in a committed block
    ///
    /// Anyone may start the exit; the payout always goes to the output owner.
    pub fn start_exit(
        &mut self,
        sender: &Address,
        utxo_position: u64,
        encoded_tx: &[u8],
        proof: &[u8],
        signatures: &[u8],
        now: Timestamp,
    ) -> Result<()> {
        debug!(sender = %hex::encode(sender), utxo_position, "start exit requested");
        let result = self.validate_start_exit(utxo_position, encoded_tx, proof, signatures);
        self.commit_exit(result, now)
    }

    /// ChallengeExit: cancel an exit by proving its output was spent
    pub fn challenge_exit(
        &mut self,
        exiting_position: u64,
        spending_position: u64,
        spending_tx: &[u8],
        proof: &[u8],
        signatures: &[u8],
        confirmation_signatures: &[u8],
    ) -> Result<()> {
        let claim = match self.validate_challenge(
            exiting_position,
            spending_position,
            spending_tx,
            proof,
            signatures,
            confirmation_signatures,
        ) {
            Ok(claim) => claim,
            Err(e) => {
                debug!(exiting_position, spending_position, error = %e, "challenge rejected");
                return Err(e);
            }
        };

        let cancelled = self.registry.challenge(&claim.exiting)?;
        info!(
            exiting = %claim.exiting,
            spending = %claim.spending,
            owner = %hex::encode(cancelled.owner),
            "exit challenged"
        );
        Ok(())
    }

    /// FinalizeExits: pay out every pending exit whose window has elapsed
    ///
    /// Exits are processed oldest-maturing first, ties broken by position. A
    /// failure on one exit is recorded and does not stop the pass.
    pub fn finalize_exits(&mut self, now: Timestamp) -> FinalizeSummary {
        let mut summary = FinalizeSummary::default();

        for position in self.registry.matured(now) {
            match self.finalize_one(&position, now) {
                Ok(paid) => {
                    info!(%position, owner = %hex::encode(paid.owner), amount = %paid.amount, "exit finalized");
                    summary.finalized.push((position, paid));
                }
                Err(e) => {
                    warn!(%position, error = %e, "exit not finalized");
                    summary.failed.push((position, e));
                }
            }
        }

        summary
    }

    /// GetExit: total accessor, zero-valued when no exit is recorded
    pub fn get_exit(&self, utxo_position: u64) -> PlasmaExit {
        self.registry.get(&position::decode(utxo_position))
    }

    /// Next exit to be finalized, with the time it matures
    pub fn next_exit(&self) -> Option<(Timestamp, UtxoPosition)> {
        self.registry.next_exit()
    }

    pub fn child_block(&self, block_number: BlockNumber) -> Option<ChildBlock> {
        self.blocks.child_block(block_number)
    }

    pub fn current_child_block(&self) -> BlockNumber {
        self.current_child_block
    }

    pub fn current_deposit_block(&self) -> u64 {
        self.current_deposit_block
    }

    /// Block number the next deposit will occupy
    pub fn deposit_block_number(&self) -> BlockNumber {
        self.current_child_block - self.config.child_block_interval + self.current_deposit_block
    }

    pub fn vault_balance(&self) -> Amount {
        self.vault_balance
    }

    pub fn operator(&self) -> Address {
        self.operator
    }

    pub fn config(&self) -> &ExitGameConfig {
        &self.config
    }

    pub fn payouts(&self) -> &P {
        &self.payouts
    }

    fn is_deposit_block(&self, block_number: BlockNumber) -> bool {
        block_number % self.config.child_block_interval != 0
    }

    fn commit_exit(&mut self, claim: Result<ExitClaim>, now: Timestamp) -> Result<()> {
        let claim = match claim {
            Ok(claim) => claim,
            Err(e) => {
                debug!(error = %e, "exit rejected");
                return Err(e);
            }
        };

        let exitable_at = self.registry.create(claim.position, claim.owner, claim.amount, now)?;
        info!(
            position = %claim.position,
            owner = %hex::encode(claim.owner),
            amount = %claim.amount,
            exitable_at,
            "exit started"
        );
        Ok(())
    }

    fn validate_deposit_exit(
        &self,
        sender: &Address,
        utxo_position: u64,
        amount: Amount,
    ) -> Result<ExitClaim> {
        let position = UtxoPosition::from_encoded(utxo_position)?;
        if !self.is_deposit_block(position.block_number)
            || position.tx_index != 0
            || position.output_index != 0
        {
            return Err(ExitGameError::InvalidPosition(format!(
                "{} is not a deposit output",
                position
            )));
        }

        let root = self.blocks.block_root(position.block_number)?;
        if deposit_tree(*sender, amount)?.root() != root {
            return Err(ExitGameError::InvalidProof(format!(
                "deposit at {} does not match owner and amount",
                position
            )));
        }

        self.registry.ensure_vacant(&position)?;
        Ok(ExitClaim {
            position,
            owner: *sender,
            amount,
        })
    }

    fn validate_start_exit(
        &self,
        utxo_position: u64,
        encoded_tx: &[u8],
        proof: &[u8],
        signatures: &[u8],
    ) -> Result<ExitClaim> {
        // 1. Locate the output and its block
        let position = UtxoPosition::from_encoded(utxo_position)?;
        let root = self.blocks.block_root(position.block_number)?;

        // 2. Decode the transaction and pick the exiting output
        let tx = Transaction::decode(encoded_tx)?;
        let output = tx.outputs.get(position.output_index as usize).ok_or_else(|| {
            ExitGameError::InvalidPosition(format!(
                "output index {} out of range for {} outputs",
                position.output_index,
                tx.outputs.len()
            ))
        })?;
        let hash = tx_hash(encoded_tx);

        // 3. Check input signatures
        if self.is_deposit_block(position.block_number) {
            if !tx.inputs.is_empty() || position.tx_index != 0 {
                return Err(ExitGameError::InvalidTransaction(
                    "deposit blocks hold a single input-free transaction".to_string(),
                ));
            }
            if !signatures.is_empty() {
                return Err(ExitGameError::InvalidSignature(
                    "deposit transactions carry no signatures".to_string(),
                ));
            }
        } else {
            if tx.inputs.is_empty() {
                return Err(ExitGameError::InvalidTransaction(
                    "child block transaction spends no inputs".to_string(),
                ));
            }
            for signature in split_signatures(signatures, tx.inputs.len())? {
                recover_signer(&hash, signature)?;
            }
        }

        // 4. Check inclusion in the committed block
        check_inclusion(&leaf_hash(&hash, signatures), proof, position.tx_index, &root)?;

        // 5. Check the position is free
        self.registry.ensure_vacant(&position)?;

        Ok(ExitClaim {
            position,
            owner: output.owner,
            amount: output.amount,
        })
    }

    fn validate_challenge(
        &self,
        exiting_position: u64,
        spending_position: u64,
        spending_tx: &[u8],
        proof: &[u8],
        signatures: &[u8],
        confirmation_signatures: &[u8],
    ) -> Result<ChallengeClaim> {
        // 1. The exit must be pending
        let exiting = UtxoPosition::from_encoded(exiting_position)?;
        let spending = UtxoPosition::from_encoded(spending_position)?;
        let exit = self
            .registry
            .pending(&exiting)
            .ok_or(ExitGameError::ExitNotFound(exiting))?;

        // 2. The spend must come later and actually consume the exiting output
        if spending.tx_position() <= exiting.tx_position() {
            return Err(ExitGameError::InvalidTransaction(format!(
                "spending transaction at {} does not follow {}",
                spending, exiting
            )));
        }
        let root = self.blocks.block_root(spending.block_number)?;
        let tx = Transaction::decode(spending_tx)?;
        if spending.output_index as usize >= tx.outputs.len() {
            return Err(ExitGameError::InvalidPosition(format!(
                "output index {} out of range for {} outputs",
                spending.output_index,
                tx.outputs.len()
            )));
        }
        let input_index = tx.spends(&exiting).ok_or_else(|| {
            ExitGameError::InvalidTransaction(format!(
                "transaction at {} does not spend {}",
                spending, exiting
            ))
        })?;

        // 3. Every input is signed and confirmed by the same key, and the
        //    exiting input by the exit owner
        let hash = tx_hash(spending_tx);
        let confirmation = confirmation_hash(&hash, &root);
        let input_signatures = split_signatures(signatures, tx.inputs.len())?;
        let confirmations = split_signatures(confirmation_signatures, tx.inputs.len())?;

        for (i, (signature, confirmation_signature)) in
            input_signatures.iter().zip(confirmations.iter()).enumerate()
        {
            let signer = recover_signer(&hash, signature)?;
            if recover_signer(&confirmation, confirmation_signature)? != signer {
                return Err(ExitGameError::InvalidSignature(format!(
                    "confirmation {} not signed by input owner",
                    i
                )));
            }
            if i == input_index && signer != exit.owner {
                return Err(ExitGameError::InvalidSignature(format!(
                    "input {} not signed by exit owner",
                    i
                )));
            }
        }
        if !verify_confirmation(&hash, &root, confirmations[input_index], &exit.owner) {
            return Err(ExitGameError::InvalidSignature(
                "spend not confirmed by exit owner".to_string(),
            ));
        }

        // 4. The spend is included in its block
        check_inclusion(&leaf_hash(&hash, signatures), proof, spending.tx_index, &root)?;

        Ok(ChallengeClaim { exiting, spending })
    }

    fn finalize_one(&mut self, position: &UtxoPosition, now: Timestamp) -> Result<PlasmaExit> {
        let exit = self
            .registry
            .pending(position)
            .ok_or(ExitGameError::ExitNotFound(*position))?;
        let vault_balance = self.vault_balance.checked_sub(exit.amount).ok_or_else(|| {
            ExitGameError::InsufficientFunds(format!(
                "vault holds {}, exit at {} claims {}",
                self.vault_balance, position, exit.amount
            ))
        })?;

        let paid = self.registry.finalize(position, now, &mut self.payouts)?;
        self.vault_balance = vault_balance;
        Ok(paid)
    }
}

/// Require a full-depth proof that reduces `leaf` to `root`
fn check_inclusion(leaf: &Hash, proof: &[u8], index: u64, root: &Hash) -> Result<()> {
    if proof.len() != MERKLE_DEPTH * HASH_LENGTH {
        return Err(ExitGameError::InvalidProof(format!(
            "expected {} bytes, got {}",
            MERKLE_DEPTH * HASH_LENGTH,
            proof.len()
        )));
    }
    if !merkle::verify(leaf, proof, index, root) {
        return Err(ExitGameError::InvalidProof(
            "proof does not reduce to block root".to_string(),
        ));
    }
    Ok(())
}
