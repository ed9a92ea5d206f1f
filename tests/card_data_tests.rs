use fintechx_core::crypto::{
    decrypt_aes_gcm, derive_key_pbkdf2, encrypt_aes_gcm, generate_random_bytes, IV_LEN, TAG_LEN,
};
use fintechx_core::pan::{detect_card_brand, generate_pan, luhn_check};

// A synthesized PAN goes through the same at-rest protection path the
// toolkit applies to stored card data.
#[test]
fn test_generated_pan_survives_at_rest_protection() {
    let pan = generate_pan("4", 16).expect("valid prefix and length");
    assert!(luhn_check(&pan));
    assert_eq!(detect_card_brand(&pan), "visa");

    let key = derive_key_pbkdf2("vault passphrase", b"per-merchant-salt", 10_000, 32)
        .expect("PBKDF2 accepts these parameters");
    let iv = generate_random_bytes(IV_LEN).expect("OS RNG available");

    let sealed = encrypt_aes_gcm(pan.as_bytes(), &key, &iv, b"merchant-123")
        .expect("key and iv sizes are valid");
    assert_eq!(sealed.len(), pan.len() + TAG_LEN);

    let opened = decrypt_aes_gcm(&sealed, &key, &iv, b"merchant-123")
        .expect("authentic ciphertext decrypts");
    assert_eq!(opened, pan.as_bytes());

    // A different merchant context must fail authentication.
    assert!(decrypt_aes_gcm(&sealed, &key, &iv, b"merchant-456").is_none());
}

#[test]
fn test_batch_of_pans_is_luhn_valid_and_unique_enough() {
    let batch = fintechx_core::pan::generate_pan_batch("51", 16, 50);
    assert_eq!(batch.len(), 50);
    for pan in &batch {
        assert!(luhn_check(pan));
        assert_eq!(detect_card_brand(pan), "mastercard");
    }

    let distinct: std::collections::HashSet<&String> = batch.iter().collect();
    // 13 random digits per PAN make collisions in a batch of 50 implausible.
    assert!(distinct.len() > 45);
}
