//! EIP-712 envelopes for Hyperliquid actions.
//!
//! Two shapes exist:
//! - Core actions (orders, cancels, modifies, leverage) sign a phantom
//!   "Agent" struct `{source, connectionId}` where `connectionId` is the
//!   action hash. Domain "Exchange", chain id 1337.
//! - User-signed actions (withdrawals) sign the action's own fields minus
//!   `type` and `signatureChainId`. Domain "HyperliquidSignTransaction",
//!   chain id 42161 (mainnet) or 421614 (testnet).
//!
//! Both domains use version "1" and the zero verifying contract.
//!
//! User-signed primary types contain a colon ("HyperliquidTransaction:Withdraw"),
//! which Solidity identifiers cannot, so struct hashes are computed from the
//! field list here instead of through `sol!` types.

use std::borrow::Cow;

use alloy::primitives::{keccak256, Address, B256, U256};
use alloy::sol_types::Eip712Domain;
use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::error::{SignerError, SignerResult};

/// EIP-712 domain constants.
pub const CORE_DOMAIN_NAME: &str = "Exchange";
pub const USER_SIGNED_DOMAIN_NAME: &str = "HyperliquidSignTransaction";
pub const EIP712_DOMAIN_VERSION: &str = "1";
pub const CORE_CHAIN_ID: u64 = 1337;
pub const ARBITRUM_CHAIN_ID: u64 = 42161;
pub const ARBITRUM_TESTNET_CHAIN_ID: u64 = 421614;
pub const EIP712_VERIFYING_CONTRACT: Address = Address::ZERO;

pub const AGENT_PRIMARY_TYPE: &str = "Agent";
pub const WITHDRAW_PRIMARY_TYPE: &str = "HyperliquidTransaction:Withdraw";

/// Keys dropped from a user-signed action before it becomes the message.
const UNSIGNED_KEYS: [&str; 2] = ["type", "signatureChainId"];

/// One member of an EIP-712 struct type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypedField {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
}

impl TypedField {
    pub fn new(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
        }
    }
}

/// `(string source, bytes32 connectionId)`
pub fn agent_fields() -> Vec<TypedField> {
    vec![
        TypedField::new("source", "string"),
        TypedField::new("connectionId", "bytes32"),
    ]
}

/// `(string hyperliquidChain, string destination, string amount, uint64 time)`
pub fn withdraw_fields() -> Vec<TypedField> {
    vec![
        TypedField::new("hyperliquidChain", "string"),
        TypedField::new("destination", "string"),
        TypedField::new("amount", "string"),
        TypedField::new("time", "uint64"),
    ]
}

/// Everything needed to compute an EIP-712 signing hash.
#[derive(Debug, Clone, PartialEq)]
pub struct SignEnvelope {
    pub domain_name: String,
    pub primary_type: String,
    pub fields: Vec<TypedField>,
    pub message: Map<String, Value>,
    pub is_mainnet: bool,
}

impl SignEnvelope {
    /// Envelope for a core action: the phantom agent over `connection_id`.
    ///
    /// `source` is "a" on mainnet and "b" on testnet.
    pub fn l1_action(connection_id: B256, is_mainnet: bool) -> Self {
        let source = if is_mainnet { "a" } else { "b" };
        let mut message = Map::new();
        message.insert("source".to_string(), Value::from(source));
        message.insert(
            "connectionId".to_string(),
            Value::from(format!("0x{}", hex::encode(connection_id))),
        );
        Self {
            domain_name: CORE_DOMAIN_NAME.to_string(),
            primary_type: AGENT_PRIMARY_TYPE.to_string(),
            fields: agent_fields(),
            message,
            is_mainnet,
        }
    }

    /// Envelope for a user-signed action.
    ///
    /// The action is serialized to JSON and its `type` and `signatureChainId`
    /// keys are removed; the remaining keys form the message.
    ///
    /// # Errors
    /// `TypedData` if the action does not serialize to a JSON object.
    pub fn user_signed<T: Serialize>(
        action: &T,
        fields: Vec<TypedField>,
        primary_type: impl Into<String>,
        is_mainnet: bool,
    ) -> SignerResult<Self> {
        let mut message = match serde_json::to_value(action) {
            Ok(Value::Object(map)) => map,
            Ok(other) => {
                return Err(SignerError::TypedData(format!(
                    "user-signed action must be an object, got {other}"
                )))
            }
            Err(e) => return Err(SignerError::TypedData(e.to_string())),
        };
        for key in UNSIGNED_KEYS {
            message.shift_remove(key);
        }
        Ok(Self {
            domain_name: USER_SIGNED_DOMAIN_NAME.to_string(),
            primary_type: primary_type.into(),
            fields,
            message,
            is_mainnet,
        })
    }

    /// Chain id of the domain: 1337 for "Exchange", Arbitrum otherwise.
    pub fn chain_id(&self) -> u64 {
        if self.domain_name == CORE_DOMAIN_NAME {
            CORE_CHAIN_ID
        } else if self.is_mainnet {
            ARBITRUM_CHAIN_ID
        } else {
            ARBITRUM_TESTNET_CHAIN_ID
        }
    }

    pub fn domain(&self) -> Eip712Domain {
        Eip712Domain::new(
            Some(Cow::Owned(self.domain_name.clone())),
            Some(Cow::Borrowed(EIP712_DOMAIN_VERSION)),
            Some(U256::from(self.chain_id())),
            Some(EIP712_VERIFYING_CONTRACT),
            None,
        )
    }

    /// `Primary(type1 name1,type2 name2,...)`
    pub fn encode_type(&self) -> String {
        let members: Vec<String> = self
            .fields
            .iter()
            .map(|f| format!("{} {}", f.ty, f.name))
            .collect();
        format!("{}({})", self.primary_type, members.join(","))
    }

    /// keccak256(typeHash || encodeData(message))
    ///
    /// # Errors
    /// `TypedData` if a declared field is missing from the message or holds a
    /// value that does not fit its type.
    pub fn struct_hash(&self) -> SignerResult<B256> {
        let mut data = Vec::with_capacity(32 * (self.fields.len() + 1));
        data.extend_from_slice(keccak256(self.encode_type().as_bytes()).as_slice());
        for field in &self.fields {
            let value = self.message.get(&field.name).ok_or_else(|| {
                SignerError::TypedData(format!("message is missing field {}", field.name))
            })?;
            data.extend_from_slice(encode_value(field, value)?.as_slice());
        }
        Ok(keccak256(&data))
    }

    /// keccak256(0x19 || 0x01 || domainSeparator || structHash)
    ///
    /// # Errors
    /// See [`SignEnvelope::struct_hash`].
    pub fn signing_hash(&self) -> SignerResult<B256> {
        let mut digest_input = [0u8; 2 + 32 + 32];
        digest_input[0] = 0x19;
        digest_input[1] = 0x01;
        digest_input[2..34].copy_from_slice(self.domain().hash_struct().as_slice());
        digest_input[34..66].copy_from_slice(self.struct_hash()?.as_slice());
        Ok(keccak256(digest_input))
    }

    /// Complete typed-data document (`types`, `primaryType`, `domain`,
    /// `message`), in the shape `eth_signTypedData_v4` accepts.
    pub fn to_typed_data(&self) -> Value {
        let mut types = Map::new();
        types.insert(
            "EIP712Domain".to_string(),
            json!([
                {"name": "name", "type": "string"},
                {"name": "version", "type": "string"},
                {"name": "chainId", "type": "uint256"},
                {"name": "verifyingContract", "type": "address"},
            ]),
        );
        types.insert(self.primary_type.clone(), json!(self.fields));

        json!({
            "types": types,
            "primaryType": self.primary_type,
            "domain": {
                "name": self.domain_name,
                "version": EIP712_DOMAIN_VERSION,
                "chainId": self.chain_id(),
                "verifyingContract": EIP712_VERIFYING_CONTRACT.to_string(),
            },
            "message": self.message,
        })
    }
}

/// Encode one atomic member into its 32-byte slot.
fn encode_value(field: &TypedField, value: &Value) -> SignerResult<B256> {
    let mismatch = || {
        SignerError::TypedData(format!(
            "field {} is not a valid {}: {value}",
            field.name, field.ty
        ))
    };

    match field.ty.as_str() {
        "string" => {
            let s = value.as_str().ok_or_else(mismatch)?;
            Ok(keccak256(s.as_bytes()))
        }
        "bytes" => {
            let s = value.as_str().ok_or_else(mismatch)?;
            let bytes = hex::decode(s.strip_prefix("0x").unwrap_or(s))?;
            Ok(keccak256(&bytes))
        }
        "bytes32" => {
            let s = value.as_str().ok_or_else(mismatch)?;
            s.parse::<B256>().map_err(|_| mismatch())
        }
        "address" => {
            let s = value.as_str().ok_or_else(mismatch)?;
            let addr = s.parse::<Address>().map_err(|_| mismatch())?;
            Ok(addr.into_word())
        }
        "bool" => {
            let b = value.as_bool().ok_or_else(mismatch)?;
            Ok(B256::from(U256::from(u8::from(b)).to_be_bytes::<32>()))
        }
        ty if ty.starts_with("uint") => {
            let n = match value {
                Value::Number(n) => n.as_u64().map(U256::from),
                Value::String(s) => s.parse::<U256>().ok(),
                _ => None,
            }
            .ok_or_else(mismatch)?;
            Ok(B256::from(n.to_be_bytes::<32>()))
        }
        other => Err(SignerError::TypedData(format!(
            "unsupported field type {other} for {}",
            field.name
        ))),
    }
}
