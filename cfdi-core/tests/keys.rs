mod common;

use base64ct::{Base64, Encoding};
use cfdi_core::keys::{
    self, KeyStoreError, SubjectField, certificate_base64, certificate_serial_encoded,
    is_key_pair_match, subject_field,
};
use cfdi_core::rfc::is_valid_rfc;

#[test]
fn persona_moral_certificate_fields() {
    let cert = common::certificate("persona_moral");
    assert_eq!(certificate_serial_encoded(&cert), "30001000000400002429");
    assert_eq!(
        subject_field(&cert, SubjectField::TaxId).expect("tax id"),
        "EKU9003173C9"
    );
    assert_eq!(
        subject_field(&cert, SubjectField::HolderName).expect("holder name"),
        "ESCUELA KEMPER URGATE SA DE CV"
    );
    // only the legal representative's CURP follows the slash
    assert_eq!(subject_field(&cert, SubjectField::Curp).expect("curp"), "");
}

#[test]
fn persona_fisica_certificate_fields() {
    let cert = common::certificate("persona_fisica");
    assert_eq!(certificate_serial_encoded(&cert), "30001000000400002308");
    let tax_id = subject_field(&cert, SubjectField::TaxId).expect("tax id");
    assert_eq!(tax_id, "XIQB891116QE4");
    assert!(is_valid_rfc(&tax_id, false));
    assert_eq!(
        subject_field(&cert, SubjectField::HolderName).expect("holder name"),
        "BERENICE IBARRA QUINTANA"
    );
    assert_eq!(
        subject_field(&cert, SubjectField::Curp).expect("curp"),
        "XIQB891116MGRMZR05"
    );
}

#[test]
fn authority_certificate_has_no_tax_id() {
    let cert = common::certificate("ac_uat");
    assert!(matches!(
        subject_field(&cert, SubjectField::TaxId),
        Err(KeyStoreError::MissingSubjectAttribute(SubjectField::TaxId))
    ));
}

#[test]
fn certificate_base64_round_trips_der() {
    let der = common::read_fixture("certificados/persona_moral/certificado.cer");
    let cert = keys::load_certificate(&der).expect("certificate");
    assert_eq!(cert.der(), der.as_slice());

    let reloaded = keys::load_certificate(
        &Base64::decode_vec(&certificate_base64(&cert)).expect("base64"),
    )
    .expect("reload");
    assert_eq!(certificate_serial_encoded(&reloaded), "30001000000400002429");
}

#[test]
fn issuer_name_is_readable() {
    let cert = common::certificate("persona_moral");
    let issuer = cert.issuer_name();
    assert!(!issuer.is_empty());
    assert!(issuer.contains('='), "unexpected issuer {issuer}");
}

#[test]
fn wrong_passphrase_is_reported() {
    for holder in ["persona_moral", "persona_fisica"] {
        let der = common::read_fixture(&format!("certificados/{holder}/llave_privada.key"));
        for passphrase in ["not-the-passphrase", "x", "", "12345678b", "0", "9"] {
            let result = keys::load_private_key(&der, passphrase);
            assert!(
                matches!(result, Err(KeyStoreError::IncorrectPassphrase)),
                "{holder} with {passphrase:?}: {result:?}"
            );
        }
    }
}

#[test]
fn key_pairs_match_only_their_certificate() {
    let (moral_cert, moral_key) = common::moral_pair();
    let (fisica_cert, fisica_key) = common::fisica_pair();
    assert!(is_key_pair_match(&moral_cert, &moral_key));
    assert!(is_key_pair_match(&fisica_cert, &fisica_key));
    assert!(!is_key_pair_match(&moral_cert, &fisica_key));
    assert!(!is_key_pair_match(&fisica_cert, &moral_key));
}

#[test]
fn private_key_debug_is_redacted() {
    let key = common::private_key("persona_moral");
    assert_eq!(key.bits(), 2048);
    let debug = format!("{key:?}");
    assert!(!debug.contains("d:"), "debug output leaks key material: {debug}");
}
