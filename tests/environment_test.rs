use contract_seal::*;

const FIXTURE_PUB: &[u8] = include_bytes!("fixtures/se-encrypt-basic.pub");
const FIXTURE_PRIV: &[u8] = include_bytes!("fixtures/se-encrypt-basic.priv");

fn round_trip(env: &EncryptionEnvironment) {
    let public = PublicKeyHandle::from_pem(FIXTURE_PUB).expect("Failed to parse public key");
    let private = PrivateKeyHandle::from_pem(FIXTURE_PRIV).expect("Failed to parse private key");

    let payload = env.random_password(1023).expect("Failed to generate payload");
    let token = env.encrypt_basic(&public, &payload).expect("Failed to seal");
    let recovered = env
        .decrypt_basic(&private, &token.to_string())
        .expect("Failed to unseal");
    assert_eq!(recovered, payload);

    assert_eq!(env.fingerprint(&public).unwrap().len(), 64);

    let signature = env.sign(&private, &payload).expect("Failed to sign");
    assert!(env.verify(&public, &payload, &signature).unwrap());
}

#[test]
fn test_default_environment_round_trips() {
    let env = EncryptionEnvironment::resolve();
    round_trip(&env);
}

#[test]
fn test_resolve_falls_back_on_unusable_override() {
    // an override pointing nowhere must not break resolution
    std::env::set_var(OPENSSL_BIN_ENV, "/somepath/openssl.exe");
    let env = EncryptionEnvironment::resolve();
    std::env::remove_var(OPENSSL_BIN_ENV);

    round_trip(&env);
}

#[test]
fn test_explicit_backends_round_trip() {
    round_trip(&EncryptionEnvironment::native());

    if let Ok(tool) = OpenSslTool::discover() {
        round_trip(&EncryptionEnvironment::with_backend(std::sync::Arc::new(
            tool,
        )));
    } else {
        eprintln!("no usable openssl binary, skipping tool environment");
    }
}
