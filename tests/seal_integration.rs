use contract_seal::*;

const FIXTURE_PUB: &[u8] = include_bytes!("fixtures/se-encrypt-basic.pub");
const FIXTURE_PRIV: &[u8] = include_bytes!("fixtures/se-encrypt-basic.priv");

// A token assembled with a stock OpenSSL command line against the
// fixture key pair: `openssl rand` password, `openssl pkeyutl -encrypt
// ... rsa_padding_mode:pkcs1` wrapping and `openssl enc -aes-256-cbc
// -pbkdf2` payload encryption.
const KNOWN_TOKEN: &str = "hyper-protect-basic.Ct3MwYwMu5667Jik9mPtu1jePa3z25f8lz/+Z8c2lmgY8jFcuLOfiqjsX5xB5mXdr6aIKRyi9jFhl52OnGic3sDpeGP4mqUAj5EsKPqy4Fsq97pRc6j0Fc5hzsZXT3ocCBdGL+hm1vX+WZ6sB2HXlMUHIXeSYCh+iogELyzstdzgpVFT50ONRGfSJZ7jgAULLS7SAJxlVxAma6Y1Yed97CTWQ9ohnVAvqN7J7TSDWhkb5qBy4RAQMbl9T3A+sDBZU32Ezw5hjnQ/7tfNoUTod3XmIS1sDvgm+Ni+p5BI1D1qaJXMsBOZSIInuSdvxXGlJvlRCGaNovQH1Q4T72CBG+mDFGzyzABvyswno4MXInzCLYHO/8Hv+DXx9ZkTxo4VdOokO/dFid7Rsu3tP5pIT5j65yg1DtR/MIuu6gJ3JS8yopWuj+mN3hJL1owpbma4p40Gppovtad+fpSqbUCfE/+BBnhbc+qH40xz7udodvkRdJB4holfcRNC7B9hrtrLJGCIAuCTPhlq0xRaycem5T9aORRFFWPF1qmvPVB3XzX0+9ojM7gr2Gl6P5WiYdDh3GE5kVWFGR4UGOhVb4f5dr3+fIp9hes3CcyztwP9oLZOwCDSR1k8gbYgHpVXFleNwi/2vVg9pCY/TKcAo4wkTcf/EfpERhKQDwwh2Sj3Z8o=.U2FsdGVkX19EJs7C0oAIZmgFqYyBKHi6P95u9plYxvqrneprlzrzHDoAFXK4LpB7LNA32A1vG9+sS+Enpe+Zkvv6b9Fl/IdTOQTisVOs8upmVwooE9Al4dRA+l7ajcxOAlfICSiSPYNAwS7tZMSPtSYCqCaJyUES81YhnBa9HXg=";
const KNOWN_PASSWORD_HEX: &str =
    "000102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f";
const KNOWN_PAYLOAD: &[u8] = b"type: contract\nworkload: |\n  services:\n    app:\n      image: registry.example.com/app@sha256:deadbeef\n";

// `openssl dgst -sha256 -sign` over KNOWN_PAYLOAD with the fixture key
const KNOWN_SIGNATURE_B64: &str = "fS7AdusBIrPe3oIYNKkzMtCZxcrxgUVuYIoYm4XYSyV0NNlrZnLdeAsE6ikaQarBXJ2VsNSRgS95d8NHXgo7Pk9v5bPROwbwnyGUVKx8ygGiOsQuUDIvdaRYMurqWXPFshLYlgA3KHgYd6rtAhYFnzTEOHw8D9g+Y3laxR/Sl9Gk4jpGniZiXB5g7s4lZkG0Qbg8M2f26b1I3o6pn9nQdf9fkLj7uZM94x/sHa+XxGil1gUZmp2iHquaYXIfsw9DAN1l5TpLGI8Fa9kuZRb/C3syRyvtvBUH0guRD4OvbUu5ejzfmzF6Ls2d+YKzt94C8p7hk+vRaov2Tf/1L1iWIzaMarBwM9W4q4TGv764bvJNLKrCCwE6+a1fW7fjZtbDZySeMxn53zvBs4px9psjdcAqusIxE6Unu3Q8biWzlnc8zD2Y94SbqYvdgr/R2joMgYpvnhwoCVig5d7TewrmGg+xwY7VjsgXCw6n5indjw2+VA3ecV+iW+dj2/an+4F2kbUO+6iqcqEUQ3l8UUndSa4hyNAz6fjjkpibXAwIaS9d0VE1SkDNpDGyI21FU3iOIezpvuIzFTPX9sjhxfgTla+1OgG6y5cxuu+hxuwGWcx2SH1VLppg8cz8J/W6VEMRL52fkd1T9rMsxK/JXpSFekH2AosydtGG73FUlDTZOQI=";

fn fixture_private_key() -> PrivateKeyHandle {
    PrivateKeyHandle::from_pem(FIXTURE_PRIV).expect("Failed to parse fixture private key")
}

fn fixture_public_key() -> PublicKeyHandle {
    PublicKeyHandle::from_pem(FIXTURE_PUB).expect("Failed to parse fixture public key")
}

fn b64(data: &str) -> Vec<u8> {
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    STANDARD.decode(data).expect("Failed to decode base64")
}

#[test]
fn test_encrypt_basic_with_fresh_key_pair() {
    let backend = NativeBackend::new();
    let private = backend
        .generate_private_key()
        .expect("Failed to generate RSA key");
    let public = backend.public_key(&private).expect("Failed to derive public key");

    let payload = backend.random_password(1023).unwrap();
    let token = encrypt_basic(&backend, &backend, &backend, &public, &payload)
        .expect("Failed to seal payload");

    let wire = token.to_string();
    let segments: Vec<&str> = wire.split('.').collect();
    assert_eq!(segments.len(), 3);
    assert_eq!(segments[0], TOKEN_PREFIX);

    let recovered = decrypt_basic(&backend, &backend, &private, &wire)
        .expect("Failed to unseal payload");
    assert_eq!(recovered, payload);
}

#[test]
fn test_known_openssl_token_decrypts_natively() {
    let backend = NativeBackend::new();
    let recovered = decrypt_basic(&backend, &backend, &fixture_private_key(), KNOWN_TOKEN)
        .expect("Failed to unseal the tool-produced token");
    assert_eq!(recovered, KNOWN_PAYLOAD);
}

#[test]
fn test_known_token_segments_open_individually() {
    let backend = NativeBackend::new();
    let token: Token = KNOWN_TOKEN.parse().expect("Failed to parse token");
    let password = hex::decode(KNOWN_PASSWORD_HEX).unwrap();

    let unwrapped = backend
        .asymmetric_decrypt(&fixture_private_key(), &token.password_bytes().unwrap())
        .expect("Failed to unwrap password");
    assert_eq!(unwrapped, password);

    let payload = backend
        .symmetric_decrypt(&password, &token.payload_bytes().unwrap())
        .expect("Failed to decrypt payload");
    assert_eq!(payload, KNOWN_PAYLOAD);
}

#[test]
fn test_known_tool_signature_verifies_natively() {
    let backend = NativeBackend::new();
    let signature = b64(KNOWN_SIGNATURE_B64);

    let ok = backend
        .verify(&fixture_public_key(), KNOWN_PAYLOAD, &signature)
        .expect("Failed to verify");
    assert!(ok, "tool-produced signature must verify natively");

    let ok = backend
        .verify(&fixture_public_key(), b"tampered payload", &signature)
        .unwrap();
    assert!(!ok);
}

#[test]
fn test_unsealing_with_wrong_key_fails() {
    let backend = NativeBackend::new();
    let wrong_key = backend
        .generate_private_key()
        .expect("Failed to generate RSA key");

    let err = decrypt_basic(&backend, &backend, &wrong_key, KNOWN_TOKEN)
        .expect_err("wrong key should fail");
    assert!(matches!(err, SealError::Decryption(_)), "{err}");
}

#[test]
fn test_malformed_tokens_are_rejected() {
    let backend = NativeBackend::new();
    let private = fixture_private_key();

    for raw in [
        "hyper-protect-basic.QUJD",
        "hyper-protect-basic.QUJD.QUJD.QUJD",
        "wrong-prefix.QUJD.QUJD",
        "hyper-protect-basic..QUJD",
    ] {
        let err = decrypt_basic(&backend, &backend, &private, raw).expect_err(raw);
        assert!(matches!(err, SealError::TokenFormat(_)), "{raw}: {err}");
    }

    let err = decrypt_basic(&backend, &backend, &private, "hyper-protect-basic.!!!.QUJD")
        .expect_err("invalid base64 should fail");
    assert!(matches!(err, SealError::Encoding(_)), "{err}");
}

#[test]
fn test_oversized_password_is_rejected() {
    let backend = NativeBackend::new();
    let public = fixture_public_key();
    let oversized = vec![0u8; public.modulus_size()];

    let err = backend
        .asymmetric_encrypt(&public, &oversized)
        .expect_err("oversized message should fail");
    assert!(matches!(err, SealError::MessageTooLarge { .. }), "{err}");
}

#[test]
fn test_cross_backend_round_trips() {
    let Ok(tool) = OpenSslTool::discover() else {
        eprintln!("no usable openssl binary, skipping");
        return;
    };
    let native = NativeBackend::new();
    let private = fixture_private_key();
    let public = fixture_public_key();
    let payload = native.random_password(1023).unwrap();

    // sealed natively, unsealed by the tool
    let token = encrypt_basic(&native, &native, &native, &public, &payload).unwrap();
    let recovered = decrypt_basic(&tool, &tool, &private, &token.to_string())
        .expect("tool failed to unseal native token");
    assert_eq!(recovered, payload);

    // sealed by the tool, unsealed natively
    let token = encrypt_basic(&tool, &tool, &tool, &public, &payload)
        .expect("tool failed to seal");
    let recovered = decrypt_basic(&native, &native, &private, &token.to_string()).unwrap();
    assert_eq!(recovered, payload);

    // mixed primitives within one seal: tool password + wrapping,
    // native payload encryption
    let token = encrypt_basic(&tool, &tool, &native, &public, &payload).unwrap();
    let recovered = decrypt_basic(&native, &tool, &private, &token.to_string()).unwrap();
    assert_eq!(recovered, payload);
}

#[test]
fn test_cross_backend_signatures() {
    let Ok(tool) = OpenSslTool::discover() else {
        eprintln!("no usable openssl binary, skipping");
        return;
    };
    let native = NativeBackend::new();
    let private = fixture_private_key();
    let public = fixture_public_key();
    let data = b"attestation digest input";

    let tool_signature = tool.sign(&private, data).expect("tool failed to sign");
    assert!(native.verify(&public, data, &tool_signature).unwrap());

    let native_signature = native.sign(&private, data).unwrap();
    assert!(tool
        .verify(&public, data, &native_signature)
        .expect("tool failed to verify"));
    assert!(!tool.verify(&public, b"other data", &native_signature).unwrap());

    // both backends produce the same deterministic PKCS#1 v1.5 signature
    assert_eq!(tool_signature, native_signature);
}
