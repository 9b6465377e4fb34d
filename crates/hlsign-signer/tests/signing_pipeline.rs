//! Integration tests for the full signing pipeline.
//!
//! Request -> wire encoding -> action hash -> EIP-712 envelope -> signature,
//! checked against vectors the exchange accepts.

use std::sync::Arc;
use std::thread;

use alloy::primitives::{Signature as PrimitiveSignature, U256};
use hlsign_core::{AssetInfo, AssetTable, ClientOrderId, Grouping, MarketKind, OrderRequest, TimeInForce};
use hlsign_signer::{
    action_hash, next_nonce, sign_envelope, Action, Exchange, KeyManager, SignEnvelope, Signer,
};

const TEST_PRIVATE_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

fn exchange(is_mainnet: bool) -> Exchange {
    let manager = Arc::new(KeyManager::from_hex(TEST_PRIVATE_KEY, None).expect("valid key"));
    let signer = Signer::new(manager, is_mainnet).expect("signer");

    let mut perps = AssetTable::new();
    perps.insert("ETH", AssetInfo::new(1, 4));
    perps.insert("XYZ", AssetInfo::new(110027, 1));
    Exchange::new(signer, perps)
}

/// Msgpack of the reference order exactly as the encoder emits it (price "105").
const ENCODED_ORDER_MSGPACK: &str = "83a474797065a56f72646572a66f72646572739187a161ce0001adcba162c3a170a3313035a173a3302e32a172c2a17481a56c696d697481a3746966a3496f63a163d92230783064653365323434613866343466633238613662376263383532643636643139a867726f7570696e67a26e61";

fn reference_order(exchange: &Exchange) -> Action {
    let request = OrderRequest::limit("XYZ", true, 0.2, 105.0, TimeInForce::ImmediateOrCancel)
        .with_cloid(ClientOrderId::from("0x0de3e244a8f44fc28a6b7bc852d66d19"));
    exchange
        .create_unsigned_order(&[request], MarketKind::Perp, Grouping::Na, None)
        .expect("unsigned order")
        .action
}

/// The bytes and hash the pipeline itself produces for the reference order.
#[test]
fn test_encoded_order_bytes_and_hash() {
    let action = reference_order(&exchange(false));

    let bytes = rmp_serde::to_vec_named(&action).expect("msgpack");
    assert_eq!(hex::encode(&bytes), ENCODED_ORDER_MSGPACK);

    let hash = action_hash(&action, None, 1769339470576).expect("hash");
    assert_eq!(
        hex::encode(hash),
        "a11060c128fa42d9ca2291e006ec852a6dd3c4d0654abcdfb20fe2d856dc7ca2"
    );
}

/// Same order carrying the price as "105.00" matches the exchange's
/// published hash, so only the price bytes differ.
#[test]
fn test_reference_order_hash_with_padded_price() {
    let Action::Order(mut bulk) = reference_order(&exchange(false)) else {
        panic!("expected order action");
    };
    assert_eq!(bulk.orders[0].limit_px, "105");
    assert_eq!(bulk.orders[0].sz, "0.2");
    bulk.orders[0].limit_px = "105.00".to_string();

    let hash = action_hash(&Action::Order(bulk), None, 1769339470576).expect("hash");
    assert_eq!(
        hex::encode(hash),
        "904c57b8f4b75ac9da005b49298dc39af735ed8c3a89b241f5f1e061e0207868"
    );
}

#[test]
fn test_signed_payload_shape() {
    let signed = exchange(true)
        .limit_order("ETH", 0.1, 2500.0, "Ioc", false, None)
        .expect("signed order");

    let json = serde_json::to_value(&signed).expect("json");
    assert_eq!(json["action"]["type"], "order");
    assert_eq!(json["action"]["orders"][0]["a"], 1);
    assert_eq!(json["action"]["orders"][0]["s"], "0.1");
    assert_eq!(json["action"]["orders"][0]["p"], "2500");
    assert_eq!(json["action"]["orders"][0]["t"]["limit"]["tif"], "Ioc");
    assert_eq!(json["action"]["grouping"], "na");

    let r = json["signature"]["r"].as_str().expect("r");
    let s = json["signature"]["s"].as_str().expect("s");
    assert_eq!(r.len(), 66);
    assert_eq!(s.len(), 66);
    let v = json["signature"]["v"].as_u64().expect("v");
    assert!(v == 27 || v == 28);
}

/// The exchange recovers the signer from the signature over the typed-data
/// hash; the recovered address must be the key's address.
#[test]
fn test_signature_recovers_to_trading_address() {
    let manager = KeyManager::from_hex(TEST_PRIVATE_KEY, None).expect("valid key");
    let key = manager.trading_signer().expect("key");

    let hash = action_hash(
        &exchange(true)
            .cancel("ETH", 42)
            .expect("cancel")
            .action,
        None,
        1_700_000_000_000,
    )
    .expect("hash");
    let envelope = SignEnvelope::l1_action(hash, true);
    let signature = sign_envelope(&envelope, key).expect("signature");

    let raw = PrimitiveSignature::new(
        U256::from_be_bytes(signature.r.0),
        U256::from_be_bytes(signature.s.0),
        signature.v == 28,
    );

    let recovered = raw
        .recover_address_from_prehash(&envelope.signing_hash().expect("signing hash"))
        .expect("recover");
    assert_eq!(Some(recovered), manager.trading_address());
}

#[test]
fn test_process_nonces_unique_across_threads() {
    let start = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("clock")
        .as_millis() as u64;

    let handles: Vec<_> = (0..4)
        .map(|_| thread::spawn(|| (0..500).map(|_| next_nonce()).collect::<Vec<_>>()))
        .collect();

    let mut all: Vec<u64> = handles
        .into_iter()
        .flat_map(|h| h.join().expect("thread"))
        .collect();
    let total = all.len();
    all.sort_unstable();
    all.dedup();

    assert_eq!(all.len(), total);
    assert!(all[0] >= start);
}
