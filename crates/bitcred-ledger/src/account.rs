//! Scorer account: signs registry writes as INVOKE v3 transactions.
//!
//! The transaction hash is the Poseidon hash of the v3 fields with L1 and L2
//! gas bounds. Fees are never estimated: writes carry fixed L1 bounds, with
//! zero tip and no paymaster or deployment data.

use std::fmt;

use bitcred_core::Felt;
use serde::{Deserialize, Serialize};
use starknet_types_core::felt::Felt as StarkFelt;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::LedgerError;
use crate::selector::selector;

/// `"invoke"` as a short string.
const INVOKE_PREFIX: u128 = 0x696e_766f_6b65;
const L1_GAS: u64 = 0x4c31_5f47_4153;
const L2_GAS: u64 = 0x4c32_5f47_4153;
const TRANSACTION_VERSION: u64 = 3;

/// Gas limit and price cap for one resource.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct ResourceBound {
    pub max_amount: u64,
    pub max_price_per_unit: u128,
}

impl ResourceBound {
    /// Bounds for registry writes: 100_000 L1 gas at up to 1e12 per unit.
    pub const REGISTRY_WRITE: Self = Self { max_amount: 100_000, max_price_per_unit: 1_000_000_000_000 };

    /// `name (60 bits) | max_amount (64 bits) | max_price_per_unit (128 bits)`.
    fn packed(&self, name: u64) -> StarkFelt {
        let mut bytes = [0u8; 32];
        bytes[..8].copy_from_slice(&name.to_be_bytes());
        bytes[8..16].copy_from_slice(&self.max_amount.to_be_bytes());
        bytes[16..].copy_from_slice(&self.max_price_per_unit.to_be_bytes());
        StarkFelt::from_bytes_be(&bytes)
    }

    fn to_wire(self) -> ResourceBoundWire {
        ResourceBoundWire {
            max_amount: Felt::from(self.max_amount),
            max_price_per_unit: Felt::from_u128(self.max_price_per_unit),
        }
    }
}

/// A Stark-curve private key. Zeroized on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct ScorerKey {
    bytes: [u8; 32],
}

impl ScorerKey {
    pub fn from_hex(s: &str) -> Result<Self, LedgerError> {
        let felt = Felt::from_hex(s)?;
        if felt.is_zero() {
            return Err(LedgerError::Sign("private key is zero".into()));
        }
        Ok(Self { bytes: felt.to_be_bytes() })
    }

    fn secret(&self) -> StarkFelt {
        StarkFelt::from_bytes_be(&self.bytes)
    }

    pub fn public_key(&self) -> Result<Felt, LedgerError> {
        from_stark(starknet_crypto::get_public_key(&self.secret()))
    }
}

impl fmt::Debug for ScorerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScorerKey").field("bytes", &"[REDACTED]").finish()
    }
}

/// An approved scorer's account contract and its signing key.
#[derive(Clone, Debug)]
pub struct ScorerAccount {
    pub address: Felt,
    key: ScorerKey,
}

impl ScorerAccount {
    pub fn new(address: Felt, key: ScorerKey) -> Self {
        Self { address, key }
    }

    pub fn public_key(&self) -> Result<Felt, LedgerError> {
        self.key.public_key()
    }

    /// Sign `tx` for `chain_id`, returning `[r, s]`.
    pub fn sign(&self, tx: &InvokeV3, chain_id: Felt) -> Result<Vec<Felt>, LedgerError> {
        let hash = to_stark(tx.hash(chain_id)?);
        let secret = self.key.secret();
        let k = starknet_crypto::rfc6979_generate_k(&hash, &secret, None);
        let signature =
            starknet_crypto::sign(&secret, &hash, &k).map_err(|e| LedgerError::Sign(e.to_string()))?;
        Ok(vec![from_stark(signature.r)?, from_stark(signature.s)?])
    }
}

/// Account `__execute__` calldata for a single contract call.
pub fn execute_calldata(contract: Felt, entry_point: &str, calldata: &[Felt]) -> Vec<Felt> {
    let mut out = Vec::with_capacity(calldata.len() + 4);
    out.push(Felt::from(1u64));
    out.push(contract);
    out.push(selector(entry_point));
    out.push(Felt::from(calldata.len() as u64));
    out.extend_from_slice(calldata);
    out
}

/// The signed fields of an INVOKE v3 transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InvokeV3 {
    pub sender_address: Felt,
    pub calldata: Vec<Felt>,
    pub nonce: Felt,
    pub l1_gas: ResourceBound,
    pub l2_gas: ResourceBound,
}

impl InvokeV3 {
    pub fn hash(&self, chain_id: Felt) -> Result<Felt, LedgerError> {
        let fee_fields = [
            StarkFelt::ZERO,
            self.l1_gas.packed(L1_GAS),
            self.l2_gas.packed(L2_GAS),
        ];
        let calldata: Vec<StarkFelt> = self.calldata.iter().copied().map(to_stark).collect();
        let empty: [StarkFelt; 0] = [];
        let fields = [
            StarkFelt::from(INVOKE_PREFIX),
            StarkFelt::from(TRANSACTION_VERSION),
            to_stark(self.sender_address),
            starknet_crypto::poseidon_hash_many(&fee_fields[..]),
            starknet_crypto::poseidon_hash_many(&empty[..]),
            to_stark(chain_id),
            to_stark(self.nonce),
            // nonce and fee data availability both L1
            StarkFelt::ZERO,
            starknet_crypto::poseidon_hash_many(&empty[..]),
            starknet_crypto::poseidon_hash_many(&calldata[..]),
        ];
        from_stark(starknet_crypto::poseidon_hash_many(&fields[..]))
    }

    /// The `invoke_transaction` object of `starknet_addInvokeTransaction`.
    pub fn into_broadcast(self, signature: Vec<Felt>) -> BroadcastedInvoke {
        BroadcastedInvoke {
            kind: "INVOKE".into(),
            sender_address: self.sender_address,
            calldata: self.calldata,
            version: Felt::from(TRANSACTION_VERSION),
            signature,
            nonce: self.nonce,
            resource_bounds: ResourceBoundsWire {
                l1_gas: self.l1_gas.to_wire(),
                l2_gas: self.l2_gas.to_wire(),
            },
            tip: Felt::ZERO,
            paymaster_data: vec![],
            account_deployment_data: vec![],
            nonce_data_availability_mode: "L1".into(),
            fee_data_availability_mode: "L1".into(),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ResourceBoundWire {
    pub max_amount: Felt,
    pub max_price_per_unit: Felt,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ResourceBoundsWire {
    pub l1_gas: ResourceBoundWire,
    pub l2_gas: ResourceBoundWire,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct BroadcastedInvoke {
    #[serde(rename = "type")]
    pub kind: String,
    pub sender_address: Felt,
    pub calldata: Vec<Felt>,
    pub version: Felt,
    pub signature: Vec<Felt>,
    pub nonce: Felt,
    pub resource_bounds: ResourceBoundsWire,
    pub tip: Felt,
    pub paymaster_data: Vec<Felt>,
    pub account_deployment_data: Vec<Felt>,
    pub nonce_data_availability_mode: String,
    pub fee_data_availability_mode: String,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct InvokeResult {
    pub transaction_hash: Felt,
}

fn to_stark(felt: Felt) -> StarkFelt {
    StarkFelt::from_bytes_be(&felt.to_be_bytes())
}

fn from_stark(felt: StarkFelt) -> Result<Felt, LedgerError> {
    Ok(Felt::from_be_bytes(felt.to_bytes_be())?)
}
