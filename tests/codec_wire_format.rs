//! Wire format tests for payloads consumed inside the rollup
//!
//! These pin the exact bytes the rollup's input interpreter sees.

use alloy::primitives::{address, Address, U256};
use rollup_portal::{
    decode_withdrawal, encode_note, encode_raw_transaction, encode_withdrawal,
    split_raw_transaction, Asset, PortalError, TransferIntent, WithdrawalRequest,
};

#[test]
fn test_ether_withdraw_decodes_to_original() {
    let json = br#"{"method":"ether_withdraw","args":{"amount":"1000000000000000000"}}"#;
    let request = decode_withdrawal(json).unwrap();

    assert_eq!(
        request,
        WithdrawalRequest::ether(U256::from(1_000_000_000_000_000_000u128))
    );
    assert_eq!(&encode_withdrawal(&request).unwrap()[..], &json[..]);
}

#[test]
fn test_erc721_withdrawal_bytes() {
    let token = address!("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa");
    let request = WithdrawalRequest::erc721(token, U256::from(42)).unwrap();

    let bytes = encode_withdrawal(&request).unwrap();
    assert_eq!(
        String::from_utf8(bytes.to_vec()).unwrap(),
        r#"{"method":"erc721_withdrawal","args":{"erc721":"0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa","token_id":42}}"#
    );
}

#[test]
fn test_withdrawal_from_intent_with_token_decimals() {
    let token = address!("5fbdb2315678afecb367f032d93f642f64180aa3");
    let intent = TransferIntent::withdraw(Asset::fungible(token), Some("12.5"));

    let request = WithdrawalRequest::from_intent(&intent, 6).unwrap();
    let bytes = encode_withdrawal(&request).unwrap();
    assert_eq!(
        String::from_utf8(bytes.to_vec()).unwrap(),
        r#"{"method":"erc20_withdraw","args":{"erc20":"0x5fbdb2315678afecb367f032d93f642f64180aa3","amount":"12500000"}}"#
    );
}

#[test]
fn test_raw_transaction_prefix_and_body() {
    let prefix: Address = "0x1111111111111111111111111111111111111111".parse().unwrap();
    let bytes = encode_raw_transaction(prefix, "abcd").unwrap();

    assert_eq!(&bytes[..20], &[0x11u8; 20][..]);
    assert_eq!(&bytes[20..], &[0xabu8, 0xcd][..]);

    let (decoded_prefix, body) = split_raw_transaction(&bytes).unwrap();
    assert_eq!(decoded_prefix, prefix);
    assert_eq!(body, &[0xabu8, 0xcd][..]);
}

#[test]
fn test_raw_transaction_is_not_json() {
    let bytes = encode_raw_transaction(Address::ZERO, "7b7d").unwrap();
    // body happens to be "{}" but the payload starts with the address bytes
    assert_eq!(bytes[0], 0);
    assert!(decode_withdrawal(&bytes).is_err());
}

#[test]
fn test_odd_length_hex_is_encoding_error() {
    let err = encode_raw_transaction(Address::ZERO, "0xabc").unwrap_err();
    assert!(matches!(err, PortalError::Encoding(_)));
}

#[test]
fn test_note_is_plain_utf8() {
    let note = "Deposited (1.5) of ERC20 (0x5fbdb2315678afecb367f032d93f642f64180aa3).";
    assert_eq!(&encode_note(note)[..], note.as_bytes());
}
