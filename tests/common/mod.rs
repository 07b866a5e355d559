//! Test harness playing the child chain against a root chain

#![allow(dead_code)]

use plasma_exit_game::position::{decode, encode};
use plasma_exit_game::signature::{address_from_secret_key, confirmation_hash, sign_hash};
use plasma_exit_game::transaction::leaf_hash;
use plasma_exit_game::*;
use secp256k1::SecretKey;
use std::collections::HashMap;

pub const START_TIME: Timestamp = 1_000_000;

pub struct Account {
    pub key: SecretKey,
    pub address: Address,
}

impl Account {
    pub fn new(seed: u8) -> Self {
        let key = SecretKey::from_slice(&[seed; 32]).unwrap();
        Self {
            address: address_from_secret_key(&key),
            key,
        }
    }
}

/// A transaction as the child chain stored it
#[derive(Clone)]
pub struct StoredTransaction {
    pub tx: Transaction,
    pub encoded: Vec<u8>,
    pub signatures: Vec<u8>,
    pub confirmations: Vec<u8>,
    pub block_number: BlockNumber,
    pub tx_index: u64,
}

/// Read-only oracle over everything the child chain has included
#[derive(Default)]
pub struct ChildChain {
    transactions: HashMap<(BlockNumber, u64), StoredTransaction>,
    trees: HashMap<BlockNumber, FixedMerkleTree>,
}

impl ChildChain {
    pub fn get_transaction(&self, utxo_position: u64) -> &StoredTransaction {
        let pos = decode(utxo_position);
        &self.transactions[&(pos.block_number, pos.tx_index)]
    }

    pub fn get_proof(&self, utxo_position: u64) -> Vec<u8> {
        let pos = decode(utxo_position);
        self.trees[&pos.block_number]
            .create_membership_proof(pos.tx_index)
            .unwrap()
    }

    pub fn get_root(&self, block_number: BlockNumber) -> Hash {
        self.trees[&block_number].root()
    }
}

pub struct TestingLanguage {
    pub root_chain: RootChain,
    pub child_chain: ChildChain,
    pub accounts: Vec<Account>,
    pub operator: Account,
    pub now: Timestamp,
}

impl TestingLanguage {
    pub fn new() -> Self {
        Self::with_config(ExitGameConfig::default())
    }

    pub fn with_config(config: ExitGameConfig) -> Self {
        let operator = Account::new(0x01);
        Self {
            root_chain: RootChain::new(operator.address, config).unwrap(),
            child_chain: ChildChain::default(),
            accounts: (0..4).map(|i| Account::new(0x10 + i)).collect(),
            operator,
            now: START_TIME,
        }
    }

    pub fn account(&self, index: usize) -> &Account {
        &self.accounts[index]
    }

    pub fn advance(&mut self, seconds: u64) {
        self.now += seconds;
    }

    /// Deposit on the root chain and mirror the deposit block on the child chain
    pub fn deposit(&mut self, owner: usize, amount: Amount) -> BlockNumber {
        let address = self.accounts[owner].address;
        let block_number = self.root_chain.deposit(&address, amount, self.now).unwrap();

        let tx = Transaction::deposit(address, amount);
        let tree = deposit_tree(address, amount).unwrap();
        self.child_chain.transactions.insert(
            (block_number, 0),
            StoredTransaction {
                encoded: tx.encode().unwrap(),
                tx,
                signatures: vec![],
                confirmations: vec![],
                block_number,
                tx_index: 0,
            },
        );
        self.child_chain.trees.insert(block_number, tree);
        block_number
    }

    /// Start an exit on `utxo_position` with data served by the child chain
    pub fn start_exit(&mut self, sender: usize, utxo_position: u64) -> Result<()> {
        let stored = self.child_chain.get_transaction(utxo_position).clone();
        let proof = self.child_chain.get_proof(utxo_position);
        let sender = self.accounts[sender].address;
        self.root_chain.start_exit(
            &sender,
            utxo_position,
            &stored.encoded,
            &proof,
            &stored.signatures,
            self.now,
        )
    }

    /// Spend `utxo_position` into a single new output, in a new child block
    pub fn spend_utxo(&mut self, utxo_position: u64, signer: usize, amount: Amount, new_owner: usize) -> u64 {
        self.spend_utxos(&[utxo_position], &[signer], vec![(new_owner, amount)])
    }

    /// Spend several positions, signed input by input, in a new child block
    pub fn spend_utxos(&mut self, inputs: &[u64], signers: &[usize], outputs: Vec<(usize, Amount)>) -> u64 {
        let tx = Transaction {
            inputs: inputs.iter().map(|p| decode(*p)).collect(),
            outputs: outputs
                .into_iter()
                .map(|(owner, amount)| TransactionOutput {
                    owner: self.accounts[owner].address,
                    amount,
                })
                .collect(),
        };
        let hash = tx.hash().unwrap();
        let mut signatures = Vec::new();
        for signer in signers {
            signatures.extend_from_slice(&sign_hash(&hash, &self.accounts[*signer].key).unwrap());
        }

        self.submit_block(vec![(tx, signatures)])
    }

    /// Commit a block of pre-signed transactions; returns output 0 of the first
    pub fn submit_block(&mut self, transactions: Vec<(Transaction, Vec<u8>)>) -> u64 {
        let leaves = transactions
            .iter()
            .map(|(tx, signatures)| leaf_hash(&tx.hash().unwrap(), signatures))
            .collect();
        let tree = FixedMerkleTree::new(MERKLE_DEPTH, leaves).unwrap();
        let block_number = self
            .root_chain
            .submit_block(&self.operator.address, tree.root(), self.now)
            .unwrap();

        for (i, (tx, signatures)) in transactions.into_iter().enumerate() {
            self.child_chain.transactions.insert(
                (block_number, i as u64),
                StoredTransaction {
                    encoded: tx.encode().unwrap(),
                    tx,
                    signatures,
                    confirmations: vec![],
                    block_number,
                    tx_index: i as u64,
                },
            );
        }
        self.child_chain.trees.insert(block_number, tree);
        encode(block_number, 0, 0).unwrap()
    }

    /// Sign the confirmation for input `input_index` of the transaction at `utxo_position`
    pub fn confirm(&mut self, utxo_position: u64, input_index: usize, signer: usize) {
        let pos = decode(utxo_position);
        let root = self.child_chain.get_root(pos.block_number);
        let key = self.accounts[signer].key;
        let stored = self
            .child_chain
            .transactions
            .get_mut(&(pos.block_number, pos.tx_index))
            .unwrap();

        let hash = stored.tx.hash().unwrap();
        let confirmation = sign_hash(&confirmation_hash(&hash, &root), &key).unwrap();
        let offset = input_index * SIGNATURE_LENGTH;
        if stored.confirmations.len() < offset + SIGNATURE_LENGTH {
            stored.confirmations.resize(stored.tx.inputs.len() * SIGNATURE_LENGTH, 0);
        }
        stored.confirmations[offset..offset + SIGNATURE_LENGTH].copy_from_slice(&confirmation);
    }

    /// (encoded tx, proof, signatures, confirmation signatures) of the spend
    pub fn get_challenge_proof(&self, _exiting: u64, spending: u64) -> (Vec<u8>, Vec<u8>, Vec<u8>, Vec<u8>) {
        let stored = self.child_chain.get_transaction(spending);
        (
            stored.encoded.clone(),
            self.child_chain.get_proof(spending),
            stored.signatures.clone(),
            stored.confirmations.clone(),
        )
    }

    pub fn challenge_exit(&mut self, exiting: u64, spending: u64) -> Result<()> {
        let (encoded, proof, signatures, confirmations) = self.get_challenge_proof(exiting, spending);
        self.root_chain
            .challenge_exit(exiting, spending, &encoded, &proof, &signatures, &confirmations)
    }

    pub fn get_plasma_exit(&self, utxo_position: u64) -> PlasmaExit {
        self.root_chain.get_exit(utxo_position)
    }

    pub fn finalize_exits(&mut self) -> FinalizeSummary {
        self.root_chain.finalize_exits(self.now)
    }
}

/// Deposit 100 for account 0, exit it, then spend and confirm the deposit.
/// Returns (exiting position, spending position).
pub fn start_exit_spend(testlang: &mut TestingLanguage) -> (u64, u64) {
    let amount = 100;
    let deposit_blknum = testlang.deposit(0, amount);
    let deposit_position = encode(deposit_blknum, 0, 0).unwrap();

    testlang.start_exit(0, deposit_position).unwrap();

    let spending_position = testlang.spend_utxo(deposit_position, 0, amount, 0);
    testlang.confirm(spending_position, 0, 0);

    (deposit_position, spending_position)
}
