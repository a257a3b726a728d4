//! Integration tests for the verifier gateway

use rand::rngs::OsRng;

use secretvault_runtime::{CallerId, RevealTarget, VaultError};
use secretvault_verifier::{NonceTable, RevealProof, VerifierAuthority, VerifierGateway, VerifyingKey};

fn alice() -> CallerId {
    CallerId::new("alice")
}

fn ops() -> RevealTarget {
    RevealTarget::category("Operations")
}

#[test]
fn test_issue_verify_consume_cycle() {
    let authority = VerifierAuthority::generate(&mut OsRng);
    let gateway = VerifierGateway::new(authority.verifying_key());
    let mut nonces = NonceTable::new();

    for nonce in [1, 2, 10] {
        let proof = authority.issue(alice(), ops(), nonce, &mut OsRng).unwrap();
        let consumed = gateway.verify(&proof, &alice(), &ops(), &nonces).unwrap();
        assert_eq!(consumed, nonce);
        nonces.consume(&alice(), &ops(), consumed);
    }

    assert_eq!(nonces.last_consumed(&alice(), &ops()), Some(10));
}

#[test]
fn test_nonces_are_per_caller_and_target() {
    let authority = VerifierAuthority::generate(&mut OsRng);
    let gateway = VerifierGateway::new(authority.verifying_key());
    let mut nonces = NonceTable::new();
    nonces.consume(&alice(), &ops(), 5);

    let bob = CallerId::new("bob");
    let proof = authority.issue(bob.clone(), ops(), 1, &mut OsRng).unwrap();
    assert!(gateway.verify(&proof, &bob, &ops(), &nonces).is_ok());

    let proof = authority.issue(alice(), RevealTarget::Total, 1, &mut OsRng).unwrap();
    assert!(gateway.verify(&proof, &alice(), &RevealTarget::Total, &nonces).is_ok());

    let proof = authority.issue(alice(), ops(), 5, &mut OsRng).unwrap();
    let err = gateway.verify(&proof, &alice(), &ops(), &nonces).unwrap_err();
    assert!(matches!(err, VaultError::ReplayDetected { nonce: 5 }));
}

#[test]
fn test_binding_checked_before_freshness() {
    let authority = VerifierAuthority::generate(&mut OsRng);
    let gateway = VerifierGateway::new(authority.verifying_key());
    let mut nonces = NonceTable::new();
    nonces.consume(&alice(), &ops(), 9);

    // Stale nonce and wrong target: the mismatch is reported
    let proof = authority.issue(alice(), RevealTarget::Total, 1, &mut OsRng).unwrap();
    let err = gateway.verify(&proof, &alice(), &ops(), &nonces).unwrap_err();
    assert!(matches!(err, VaultError::ProofMismatch(_)));
}

#[test]
fn test_freshness_checked_before_signature() {
    let authority = VerifierAuthority::generate(&mut OsRng);
    let gateway = VerifierGateway::new(authority.verifying_key());
    let mut nonces = NonceTable::new();
    nonces.consume(&alice(), &ops(), 3);

    let garbage = RevealProof::new(alice(), ops(), 2, vec![0xff; 64]);
    let err = gateway.verify(&garbage, &alice(), &ops(), &nonces).unwrap_err();
    assert!(matches!(err, VaultError::ReplayDetected { nonce: 2 }));
}

#[test]
fn test_malformed_signatures_rejected() {
    let authority = VerifierAuthority::generate(&mut OsRng);
    let gateway = VerifierGateway::new(authority.verifying_key());
    let nonces = NonceTable::new();

    for signature in [vec![], vec![0u8; 63], vec![0u8; 64], vec![0xff; 64], vec![1u8; 65]] {
        let proof = RevealProof::new(alice(), ops(), 1, signature);
        let err = gateway.verify(&proof, &alice(), &ops(), &nonces).unwrap_err();
        assert!(matches!(err, VaultError::ProofInvalid(_)));
    }
}

#[test]
fn test_proof_json_roundtrip_still_verifies() {
    let authority = VerifierAuthority::generate(&mut OsRng);
    let gateway = VerifierGateway::new(authority.verifying_key());
    let proof = authority.issue(alice(), ops(), 4, &mut OsRng).unwrap();

    let json = serde_json::to_string(&proof).unwrap();
    let restored: RevealProof = serde_json::from_str(&json).unwrap();
    assert!(gateway.verify(&restored, &alice(), &ops(), &NonceTable::new()).is_ok());
}

#[test]
fn test_authority_key_reload() {
    let authority = VerifierAuthority::generate(&mut OsRng);
    let reloaded = VerifierAuthority::from_secret_bytes(&authority.secret_bytes()).unwrap();
    assert_eq!(reloaded.verifying_key(), authority.verifying_key());

    let hex = authority.verifying_key().to_hex();
    assert_eq!(VerifyingKey::from_hex(&hex).unwrap(), authority.verifying_key());
}
