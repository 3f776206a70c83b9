mod common;

use cfdi_core::document::{Comprobante, SealAttributes};
use cfdi_core::envelope::{self, EnvelopeParams};
use cfdi_core::keys::{KeyStoreError, certificate_base64, certificate_serial_encoded};
use cfdi_core::seal::{self, DigestAlgorithm, SealParams};
use cfdi_core::sign::{DocumentSigner, SigningError, verify_document};
use libxml::parser::Parser;

fn moral_signer() -> DocumentSigner {
    let (cert, key) = common::moral_pair();
    DocumentSigner::new(cert, key).expect("signer")
}

fn pago() -> Comprobante {
    Comprobante::from_path(common::fixture_path("xml/pago.xml")).expect("comprobante")
}

#[test]
fn seal_document_writes_the_three_attributes() {
    let signer = moral_signer();
    let mut comprobante = pago();
    let attributes = signer
        .seal_document(&mut comprobante, &common::chain_builder())
        .expect("seal");

    let expected_sello = seal::seal(
        common::expected_pago_chain(),
        &common::private_key("persona_moral"),
        SealParams::default(),
    )
    .expect("seal chain");
    assert_eq!(
        attributes,
        SealAttributes {
            sello: expected_sello,
            certificado: certificate_base64(signer.certificate()),
            no_certificado: "30001000000400002429".into(),
        }
    );
    assert_eq!(comprobante.seal_attributes(), attributes);
}

#[test]
fn sealed_document_verifies_after_reserialization() {
    let mut comprobante = pago();
    moral_signer()
        .seal_document(&mut comprobante, &common::chain_builder())
        .expect("seal");

    let reparsed = Comprobante::from_xml(&comprobante.to_xml()).expect("reparse");
    let cert = verify_document(&reparsed, &common::chain_builder()).expect("verify");
    assert_eq!(certificate_serial_encoded(&cert), "30001000000400002429");
}

#[test]
fn persona_fisica_can_seal_another_emisor() {
    let signer = DocumentSigner::from_der(
        &common::read_fixture("certificados/persona_fisica/certificado.cer"),
        &common::read_fixture("certificados/persona_fisica/llave_privada.key"),
        common::PASSPHRASE,
    )
    .expect("signer");
    let mut comprobante = pago();
    let attributes = signer
        .seal_document(&mut comprobante, &common::chain_builder())
        .expect("seal");
    assert_eq!(attributes.no_certificado, "30001000000400002308");
    verify_document(&comprobante, &common::chain_builder()).expect("verify");
}

#[test]
fn tampered_document_fails_verification() {
    let mut comprobante = pago();
    moral_signer()
        .seal_document(&mut comprobante, &common::chain_builder())
        .expect("seal");
    comprobante.set_attribute("Total", "100").expect("tamper");
    assert!(matches!(
        verify_document(&comprobante, &common::chain_builder()),
        Err(SigningError::InvalidSeal(_))
    ));
}

#[test]
fn foreign_no_certificado_is_a_serial_mismatch() {
    let mut comprobante = pago();
    moral_signer()
        .seal_document(&mut comprobante, &common::chain_builder())
        .expect("seal");
    comprobante
        .set_attribute("NoCertificado", "30001000000400002308")
        .expect("tamper");
    match verify_document(&comprobante, &common::chain_builder()) {
        Err(SigningError::SerialMismatch { expected, found }) => {
            assert_eq!(expected, "30001000000400002429");
            assert_eq!(found, "30001000000400002308");
        }
        other => panic!("unexpected result {other:?}"),
    }
}

#[test]
fn unsealed_document_is_missing_its_seal() {
    assert!(matches!(
        verify_document(&pago(), &common::chain_builder()),
        Err(SigningError::MissingSeal("Certificado"))
    ));

    let mut comprobante = pago();
    let signer = moral_signer();
    comprobante
        .set_attribute("Certificado", &certificate_base64(signer.certificate()))
        .expect("certificado");
    assert!(matches!(
        verify_document(&comprobante, &common::chain_builder()),
        Err(SigningError::MissingSeal("Sello"))
    ));
}

#[test]
fn crossed_certificate_and_key_are_rejected() {
    let result = DocumentSigner::new(
        common::certificate("persona_moral"),
        common::private_key("persona_fisica"),
    );
    assert!(matches!(result, Err(SigningError::KeyPairMismatch)));
}

#[test]
fn wrong_passphrase_surfaces_from_the_signer() {
    let result = DocumentSigner::from_der(
        &common::read_fixture("certificados/persona_moral/certificado.cer"),
        &common::read_fixture("certificados/persona_moral/llave_privada.key"),
        "wrong",
    );
    assert!(matches!(
        result,
        Err(SigningError::KeyStore(KeyStoreError::IncorrectPassphrase))
    ));
}

#[test]
fn unknown_family_cannot_be_sealed() {
    let mut comprobante =
        Comprobante::from_path(common::fixture_path("xml/recibo_pago.xml")).expect("comprobante");
    assert!(matches!(
        moral_signer().seal_document(&mut comprobante, &common::chain_builder()),
        Err(SigningError::UnknownFamily)
    ));
}

#[test]
fn signer_envelopes_verify() {
    let signer =
        moral_signer().with_envelope_params(EnvelopeParams::new(DigestAlgorithm::Sha256));
    let xml = common::read_fixture_string("xml/recibo_pago.xml");
    let signed = signer.sign_envelope(&xml).expect("sign");
    let doc = Parser::default().parse_string(&signed).expect("parse");
    let cert = envelope::verify_envelope(&doc).expect("verify");
    assert_eq!(certificate_serial_encoded(&cert), signer.serial());

    let mut doc = Parser::default().parse_string(&xml).expect("parse");
    signer.sign_envelope_document(&mut doc).expect("sign in place");
    envelope::verify_envelope(&doc).expect("verify in place");
}
