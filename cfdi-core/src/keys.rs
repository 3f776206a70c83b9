//! Certificate and private key handling for CSD (Certificado de Sello Digital) files.
use base64ct::{Base64, Encoding};
use const_oid::ObjectIdentifier;
use pkcs8::{EncryptedPrivateKeyInfo, PrivateKeyInfo};
use rsa::{
    RsaPrivateKey, RsaPublicKey,
    pkcs8::{DecodePublicKey, EncodePublicKey},
    traits::PublicKeyParts,
};
use std::fmt;
use thiserror::Error;
use tracing::debug;
use x509_cert::der::{Decode, Encode};

const X500_UNIQUE_IDENTIFIER: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.45");
const NAME: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.41");
const COMMON_NAME: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.3");
const SERIAL_NUMBER: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.5");

/// Errors emitted while loading certificates and keys.
#[derive(Debug, Error)]
pub enum KeyStoreError {
    #[error("incorrect passphrase for private key")]
    IncorrectPassphrase,
    #[error("malformed certificate: {0}")]
    MalformedCertificate(String),
    #[error("malformed private key: {0}")]
    MalformedKey(String),
    #[error("certificate subject has no {0} attribute")]
    MissingSubjectAttribute(SubjectField),
}

/// Subject attributes SAT places in CSD certificates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubjectField {
    /// RFC of the holder (x500UniqueIdentifier, 2.5.4.45).
    TaxId,
    /// Holder name (name, 2.5.4.41, falling back to commonName).
    HolderName,
    /// CURP of the holder (serialNumber, 2.5.4.5).
    Curp,
}

impl fmt::Display for SubjectField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SubjectField::TaxId => "x500UniqueIdentifier",
            SubjectField::HolderName => "name",
            SubjectField::Curp => "serialNumber",
        };
        f.write_str(label)
    }
}

/// A parsed X.509 certificate together with its original DER bytes.
#[derive(Debug, Clone)]
pub struct Certificate {
    inner: x509_cert::Certificate,
    public_key: RsaPublicKey,
    der: Vec<u8>,
}

impl Certificate {
    pub fn der(&self) -> &[u8] {
        &self.der
    }

    pub fn x509(&self) -> &x509_cert::Certificate {
        &self.inner
    }

    /// Big-endian bytes of the serial number integer.
    pub fn serial_bytes(&self) -> &[u8] {
        self.inner.tbs_certificate.serial_number.as_bytes()
    }

    /// Issuer distinguished name as written in `X509IssuerName`.
    pub fn issuer_name(&self) -> String {
        format_name(&self.inner.tbs_certificate.issuer)
    }

    pub fn public_key(&self) -> &RsaPublicKey {
        &self.public_key
    }

    fn subject_attribute(&self, oid: ObjectIdentifier) -> Option<String> {
        self.inner
            .tbs_certificate
            .subject
            .0
            .iter()
            .flat_map(|rdn| rdn.0.iter())
            .find(|atv| atv.oid == oid)
            .map(|atv| attribute_text(atv.value.value()))
    }
}

/// An RSA private key. Zeroized on drop and never printed.
pub struct PrivateKey {
    inner: RsaPrivateKey,
}

impl PrivateKey {
    pub fn public_key(&self) -> RsaPublicKey {
        self.inner.to_public_key()
    }

    /// Modulus size in bits.
    pub fn bits(&self) -> usize {
        self.inner.n().bits()
    }

    pub(crate) fn rsa(&self) -> &RsaPrivateKey {
        &self.inner
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKey")
            .field("bits", &self.bits())
            .finish_non_exhaustive()
    }
}

/// Parse a DER encoded certificate (`.cer`).
pub fn load_certificate(der: &[u8]) -> Result<Certificate, KeyStoreError> {
    let inner = x509_cert::Certificate::from_der(der)
        .map_err(|e| KeyStoreError::MalformedCertificate(format!("{e:?}")))?;
    let spki = inner
        .tbs_certificate
        .subject_public_key_info
        .to_der()
        .map_err(|e| KeyStoreError::MalformedCertificate(format!("{e:?}")))?;
    let public_key = RsaPublicKey::from_public_key_der(&spki)
        .map_err(|e| KeyStoreError::MalformedCertificate(format!("not an RSA key: {e:?}")))?;
    let cert = Certificate {
        inner,
        public_key,
        der: der.to_vec(),
    };
    debug!(serial = %certificate_serial_encoded(&cert), "loaded certificate");
    Ok(cert)
}

/// Decrypt a DER encoded PKCS#8 `EncryptedPrivateKeyInfo` (`.key`).
pub fn load_private_key(der: &[u8], passphrase: &str) -> Result<PrivateKey, KeyStoreError> {
    let encrypted = EncryptedPrivateKeyInfo::try_from(der)
        .map_err(|e| KeyStoreError::MalformedKey(format!("{e:?}")))?;
    let decrypted = encrypted
        .decrypt(passphrase.as_bytes())
        .map_err(classify_decrypt_error)?;
    // a wrong passphrase can still yield valid padding over garbage
    let info = PrivateKeyInfo::try_from(decrypted.as_bytes())
        .map_err(|_| KeyStoreError::IncorrectPassphrase)?;
    let inner = RsaPrivateKey::try_from(info)
        .map_err(|e| KeyStoreError::MalformedKey(format!("{e:?}")))?;
    Ok(PrivateKey { inner })
}

// pkcs5 0.7 reports a bad CBC padding (the usual wrong passphrase symptom)
// as `EncryptFailed` rather than `DecryptFailed`.
fn classify_decrypt_error(err: pkcs8::Error) -> KeyStoreError {
    match err {
        pkcs8::Error::EncryptedPrivateKey(
            pkcs8::pkcs5::Error::DecryptFailed | pkcs8::pkcs5::Error::EncryptFailed,
        ) => KeyStoreError::IncorrectPassphrase,
        other => KeyStoreError::MalformedKey(format!("{other:?}")),
    }
}

/// True when the certificate's public key belongs to `key`.
pub fn is_key_pair_match(cert: &Certificate, key: &PrivateKey) -> bool {
    let cert_spki = cert.public_key().to_public_key_der();
    let key_spki = key.public_key().to_public_key_der();
    match (cert_spki, key_spki) {
        (Ok(cert_spki), Ok(key_spki)) => cert_spki.as_bytes() == key_spki.as_bytes(),
        _ => false,
    }
}

/// The serial as SAT prints it in `NoCertificado`.
pub fn certificate_serial_encoded(cert: &Certificate) -> String {
    encode_serial(cert.serial_bytes())
}

pub fn certificate_base64(cert: &Certificate) -> String {
    Base64::encode_string(cert.der())
}

/// Read a subject attribute, keeping only the text before the first `/`.
pub fn subject_field(cert: &Certificate, field: SubjectField) -> Result<String, KeyStoreError> {
    let value = match field {
        SubjectField::TaxId => cert.subject_attribute(X500_UNIQUE_IDENTIFIER),
        SubjectField::HolderName => cert
            .subject_attribute(NAME)
            .or_else(|| cert.subject_attribute(COMMON_NAME)),
        SubjectField::Curp => cert.subject_attribute(SERIAL_NUMBER),
    }
    .ok_or(KeyStoreError::MissingSubjectAttribute(field))?;
    Ok(before_slash(&value))
}

// SAT serials are ASCII digits stored as the bytes of the integer; every
// second hex digit is the digit itself.
fn encode_serial(bytes: &[u8]) -> String {
    let hex: String = bytes.iter().map(|byte| format!("{byte:02x}")).collect();
    hex.trim_start_matches('0')
        .chars()
        .skip(1)
        .step_by(2)
        .collect()
}

// Most specific RDN first, each escaped on its own so a comma inside a value
// stays part of it.
fn format_name(name: &x509_cert::name::Name) -> String {
    name.0
        .iter()
        .rev()
        .map(|rdn| rdn.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn before_slash(value: &str) -> String {
    value.split('/').next().unwrap_or_default().trim().to_string()
}

fn attribute_text(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => bytes.iter().map(|&byte| byte as char).collect(),
    }
}
