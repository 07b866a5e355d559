//! Transaction codec and structural validation

use crate::constants::*;
use crate::error::{ExitGameError, Result};
use crate::hash::{keccak256, keccak256_pair};
use crate::position::decode;
use crate::types::*;

/// CheckTransaction: 𝒯𝒳 → {valid, invalid}
///
/// A transaction tx = (ins, outs) is well formed if and only if:
/// 1. |ins| ≤ M_max_inputs
/// 2. 1 ≤ |outs| ≤ M_max_outputs
/// 3. ∀i ∈ ins: i is an encodable position, and ins has no duplicates
/// 4. ∀o ∈ outs: o.owner ≠ 0 ∧ o.amount > 0
pub fn check_transaction(tx: &Transaction) -> Result<()> {
    // 1. Check input count limit
    if tx.inputs.len() > MAX_INPUTS {
        return Err(ExitGameError::InvalidTransaction(format!(
            "Too many inputs: {}",
            tx.inputs.len()
        )));
    }

    // 2. Check output count limits
    if tx.outputs.is_empty() || tx.outputs.len() > MAX_OUTPUTS {
        return Err(ExitGameError::InvalidTransaction(format!(
            "Invalid output count: {}",
            tx.outputs.len()
        )));
    }

    // 3. Check inputs are valid and distinct
    for (i, input) in tx.inputs.iter().enumerate() {
        input.encode()?;
        if tx.inputs[..i].contains(input) {
            return Err(ExitGameError::InvalidTransaction(format!(
                "Duplicate input {}",
                input
            )));
        }
    }

    // 4. Check outputs
    for (i, output) in tx.outputs.iter().enumerate() {
        if output.owner == NULL_ADDRESS {
            return Err(ExitGameError::InvalidTransaction(format!(
                "Null owner at output {}",
                i
            )));
        }
        if output.amount == 0 {
            return Err(ExitGameError::InvalidTransaction(format!(
                "Zero amount at output {}",
                i
            )));
        }
    }

    Ok(())
}

impl Transaction {
    /// Deposit transaction: no inputs, a single output to the depositor
    pub fn deposit(owner: Address, amount: Amount) -> Self {
        Self {
            inputs: vec![],
            outputs: vec![TransactionOutput { owner, amount }],
        }
    }

    /// Canonical encoding
    ///
    /// `[input_count u8][output_count u8]`, then each input as its encoded
    /// position (u64 big-endian), then each output as owner || amount (u128
    /// big-endian).
    pub fn encode(&self) -> Result<ByteString> {
        check_transaction(self)?;

        let mut data = Vec::with_capacity(
            2 + self.inputs.len() * INPUT_LENGTH + self.outputs.len() * OUTPUT_LENGTH,
        );
        data.push(self.inputs.len() as u8);
        data.push(self.outputs.len() as u8);

        for input in &self.inputs {
            data.extend_from_slice(&input.encode()?.to_be_bytes());
        }

        for output in &self.outputs {
            data.extend_from_slice(&output.owner);
            data.extend_from_slice(&output.amount.to_be_bytes());
        }

        Ok(data)
    }

    /// Strict inverse of [`Transaction::encode`]
    pub fn decode(data: &[u8]) -> Result<Self> {
        if data.len() < 2 {
            return Err(ExitGameError::InvalidTransaction(format!(
                "Encoding too short: {} bytes",
                data.len()
            )));
        }

        let input_count = data[0] as usize;
        let output_count = data[1] as usize;
        if input_count > MAX_INPUTS || output_count == 0 || output_count > MAX_OUTPUTS {
            return Err(ExitGameError::InvalidTransaction(format!(
                "Invalid counts: {} inputs, {} outputs",
                input_count, output_count
            )));
        }

        let expected = 2 + input_count * INPUT_LENGTH + output_count * OUTPUT_LENGTH;
        if data.len() != expected {
            return Err(ExitGameError::InvalidTransaction(format!(
                "Expected {} bytes, got {}",
                expected,
                data.len()
            )));
        }

        let mut cursor = 2;
        let mut inputs = Vec::with_capacity(input_count);
        for _ in 0..input_count {
            let mut raw = [0u8; INPUT_LENGTH];
            raw.copy_from_slice(&data[cursor..cursor + INPUT_LENGTH]);
            inputs.push(decode(u64::from_be_bytes(raw)));
            cursor += INPUT_LENGTH;
        }

        let mut outputs = Vec::with_capacity(output_count);
        for _ in 0..output_count {
            let mut owner = [0u8; ADDRESS_LENGTH];
            owner.copy_from_slice(&data[cursor..cursor + ADDRESS_LENGTH]);
            cursor += ADDRESS_LENGTH;

            let mut raw = [0u8; AMOUNT_LENGTH];
            raw.copy_from_slice(&data[cursor..cursor + AMOUNT_LENGTH]);
            cursor += AMOUNT_LENGTH;

            outputs.push(TransactionOutput {
                owner,
                amount: u128::from_be_bytes(raw),
            });
        }

        let tx = Self { inputs, outputs };
        check_transaction(&tx)?;
        Ok(tx)
    }

    /// Keccak-256 of the canonical encoding
    pub fn hash(&self) -> Result<Hash> {
        Ok(keccak256(&self.encode()?))
    }

    /// Index of the input spending `position`, if any
    pub fn spends(&self, position: &UtxoPosition) -> Option<usize> {
        self.inputs.iter().position(|input| input == position)
    }

    pub fn is_deposit(&self) -> bool {
        self.inputs.is_empty() && self.outputs.len() == 1
    }
}

/// Hash of an encoded transaction, as signed by its input owners
pub fn tx_hash(encoded_tx: &[u8]) -> Hash {
    keccak256(encoded_tx)
}

/// Merkle leaf committed for a transaction: H(tx_hash ‖ signatures)
pub fn leaf_hash(tx_hash: &Hash, signatures: &[u8]) -> Hash {
    keccak256_pair(tx_hash, signatures)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn position(block: u64, tx: u64, output: u64) -> UtxoPosition {
        UtxoPosition::new(block, tx, output).unwrap()
    }

    fn spend() -> Transaction {
        Transaction {
            inputs: vec![position(1, 0, 0), position(1000, 4, 1)],
            outputs: vec![
                TransactionOutput { owner: [0xaa; 20], amount: 60 },
                TransactionOutput { owner: [0xbb; 20], amount: 40 },
            ],
        }
    }

    #[test]
    fn test_check_transaction_valid() {
        assert!(check_transaction(&spend()).is_ok());
    }

    #[test]
    fn test_check_transaction_deposit() {
        let tx = Transaction::deposit([0xaa; 20], 100);
        assert!(check_transaction(&tx).is_ok());
        assert!(tx.is_deposit());
    }

    #[test]
    fn test_check_transaction_too_many_inputs() {
        let mut tx = spend();
        tx.inputs.push(position(2, 0, 0));
        assert!(matches!(check_transaction(&tx), Err(ExitGameError::InvalidTransaction(_))));
    }

    #[test]
    fn test_check_transaction_no_outputs() {
        let mut tx = spend();
        tx.outputs.clear();
        assert!(matches!(check_transaction(&tx), Err(ExitGameError::InvalidTransaction(_))));
    }

    #[test]
    fn test_check_transaction_duplicate_inputs() {
        let mut tx = spend();
        tx.inputs[1] = tx.inputs[0];
        assert!(matches!(check_transaction(&tx), Err(ExitGameError::InvalidTransaction(_))));
    }

    #[test]
    fn test_check_transaction_null_owner() {
        let mut tx = spend();
        tx.outputs[1].owner = NULL_ADDRESS;
        assert!(matches!(check_transaction(&tx), Err(ExitGameError::InvalidTransaction(_))));
    }

    #[test]
    fn test_check_transaction_zero_amount() {
        let mut tx = spend();
        tx.outputs[0].amount = 0;
        assert!(matches!(check_transaction(&tx), Err(ExitGameError::InvalidTransaction(_))));
    }

    #[test]
    fn test_encode_layout() {
        let tx = Transaction::deposit([0x11; 20], 100);
        let encoded = tx.encode().unwrap();
        assert_eq!(encoded.len(), 2 + OUTPUT_LENGTH);
        assert_eq!(encoded[0], 0);
        assert_eq!(encoded[1], 1);
        assert_eq!(&encoded[2..22], &[0x11; 20]);
        assert_eq!(encoded[encoded.len() - 1], 100);
    }

    #[test]
    fn test_decode_inverts_encode() {
        let tx = spend();
        assert_eq!(Transaction::decode(&tx.encode().unwrap()).unwrap(), tx);
    }

    #[test]
    fn test_decode_truncated() {
        let encoded = spend().encode().unwrap();
        let result = Transaction::decode(&encoded[..encoded.len() - 1]);
        assert!(matches!(result, Err(ExitGameError::InvalidTransaction(_))));
    }

    #[test]
    fn test_decode_trailing_bytes() {
        let mut encoded = spend().encode().unwrap();
        encoded.push(0);
        assert!(Transaction::decode(&encoded).is_err());
    }

    #[test]
    fn test_decode_empty() {
        assert!(Transaction::decode(&[]).is_err());
    }

    #[test]
    fn test_decode_bad_counts() {
        assert!(Transaction::decode(&[3, 1]).is_err());
        assert!(Transaction::decode(&[0, 0]).is_err());
    }

    #[test]
    fn test_decode_out_of_range_input() {
        let mut encoded = vec![1u8, 1u8];
        encoded.extend_from_slice(&u64::MAX.to_be_bytes());
        encoded.extend_from_slice(&[0x11; 20]);
        encoded.extend_from_slice(&1u128.to_be_bytes());
        assert!(matches!(Transaction::decode(&encoded), Err(ExitGameError::InvalidPosition(_))));
    }

    #[test]
    fn test_spends() {
        let tx = spend();
        assert_eq!(tx.spends(&position(1000, 4, 1)), Some(1));
        assert_eq!(tx.spends(&position(1000, 4, 0)), None);
    }

    #[test]
    fn test_hash_differs_between_transactions() {
        let a = Transaction::deposit([0x11; 20], 100);
        let b = Transaction::deposit([0x11; 20], 101);
        assert_ne!(a.hash().unwrap(), b.hash().unwrap());
        assert_eq!(a.hash().unwrap(), tx_hash(&a.encode().unwrap()));
    }

    #[test]
    fn test_leaf_hash_binds_signatures() {
        let hash = spend().hash().unwrap();
        assert_ne!(leaf_hash(&hash, &[]), leaf_hash(&hash, &[0u8; 65]));
        assert_eq!(leaf_hash(&hash, &[]), keccak256(&hash));
    }
}
