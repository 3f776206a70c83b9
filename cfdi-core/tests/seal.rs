mod common;

use cfdi_core::seal::{self, DigestAlgorithm, SealError, SealParams, SealScheme};

const MORAL_FOOBAR_SHA256: &str = "xQ6QZUXNORgZ2mtoJ65qqM+ViyMuncfdszvWcHUw/Sx2/u4ACePiqUlzg+eecExLz1/XUm3PnwptqA6d7rz+2GFvqh2NMRT03M1yOuMka0nC+dreEoxXf+zV4JthV44SvcGHEFQQNjalp/Nyyo5ZFNzWsNA871xqq+8AE2gQeGh/aAA01siTbQeHNVilPYwy8FLAgxHp10nMfk6Q5KCLeBt0Tg8HAk5vFndgSJx4dFxC5hYKkqWWPHVw92BttgPpPgd0FuWF6ueQhvmbtXpLCuiwcLnd8P5jvCmFDMUlMNTaTW2XDzB12CqlE4iBKb1VL53L9YfsmAkGaW22s2bDlQ==";
const FISICA_FOOBAR_SHA1: &str = "ow/erpwx9a1Awe7Ymugkqj2CmFPoTnmhRAhaJzswUG663NK4qrv0RCuZvVggpT9jBbIdWWmlxTaj1OOI3TE+GmGR1SWsthrB6uCsxNmS3yCcdUEIi5dKmv/Po7F2VVgfNsNp3sVYdqGkPC5DFhIgm3WqV43Hej9fn+35lsprsxb6GkS2TMExrerlNM4xDiLHb1mSuIWh0j2fViWzsvSuPDsxsvxso6r1Efy4o393fAmMzBC1yRnWg3zo0S8NfPUCfpZRpMB70UecyWZgt8QsmRXIdbU/yNkqouZRgCd0+rjGdpTL4dyO9vHfdWZG0ahQWVfGzRSmaDig815QPVkhpQ==";

#[test]
fn pkcs1v15_seals_are_deterministic() {
    let key = common::private_key("persona_moral");
    let sello = seal::seal("foobar", &key, SealParams::default()).expect("seal");
    assert_eq!(sello, MORAL_FOOBAR_SHA256);

    let key = common::private_key("persona_fisica");
    let params = SealParams::new(DigestAlgorithm::Sha1, SealScheme::Pkcs1v15);
    let sello = seal::seal(b"foobar", &key, params).expect("seal");
    assert_eq!(sello, FISICA_FOOBAR_SHA1);
}

#[test]
fn known_seal_verifies_against_certificate() {
    let cert = common::certificate("persona_moral");
    seal::verify_seal(
        "foobar",
        MORAL_FOOBAR_SHA256,
        cert.public_key(),
        SealParams::default(),
    )
    .expect("verify");
}

#[test]
fn altered_payload_fails_verification() {
    let cert = common::certificate("persona_moral");
    assert!(matches!(
        seal::verify_seal(
            "foobaz",
            MORAL_FOOBAR_SHA256,
            cert.public_key(),
            SealParams::default()
        ),
        Err(SealError::Verification(_))
    ));
}

#[test]
fn wrong_certificate_fails_verification() {
    let cert = common::certificate("persona_fisica");
    assert!(matches!(
        seal::verify_seal(
            "foobar",
            MORAL_FOOBAR_SHA256,
            cert.public_key(),
            SealParams::default()
        ),
        Err(SealError::Verification(_))
    ));
}

#[test]
fn digest_mismatch_fails_verification() {
    let cert = common::certificate("persona_fisica");
    let params = SealParams::new(DigestAlgorithm::Sha256, SealScheme::Pkcs1v15);
    assert!(seal::verify_seal("foobar", FISICA_FOOBAR_SHA1, cert.public_key(), params).is_err());
}

#[test]
fn non_base64_seal_is_an_encoding_error() {
    let cert = common::certificate("persona_moral");
    assert!(matches!(
        seal::verify_seal("foobar", "***", cert.public_key(), SealParams::default()),
        Err(SealError::InvalidEncoding(_))
    ));
}

#[test]
fn pss_seals_round_trip() {
    let (cert, key) = common::moral_pair();
    for digest in [
        DigestAlgorithm::Sha1,
        DigestAlgorithm::Sha256,
        DigestAlgorithm::Sha512,
    ] {
        let params = SealParams::new(digest, SealScheme::Pss);
        let first = seal::seal("||4.0|cadena||", &key, params).expect("seal");
        let second = seal::seal("||4.0|cadena||", &key, params).expect("seal");
        // random salt
        assert_ne!(first, second);
        seal::verify_seal("||4.0|cadena||", &first, cert.public_key(), params).expect("verify");
        seal::verify_seal("||4.0|cadena||", &second, cert.public_key(), params).expect("verify");
        assert!(
            seal::verify_seal(
                "||4.0|cadena||",
                &first,
                cert.public_key(),
                SealParams::new(digest, SealScheme::Pkcs1v15)
            )
            .is_err()
        );
    }
}

#[test]
fn unicode_payloads_are_sealed_as_utf8() {
    let (cert, key) = common::moral_pair();
    let payload = "||3.3|PEÑA & HIJOS|Año||";
    let sello = seal::seal(payload, &key, SealParams::default()).expect("seal");
    seal::verify_seal(payload.as_bytes(), &sello, cert.public_key(), SealParams::default())
        .expect("verify");
}
