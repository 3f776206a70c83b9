//! End-to-end sealing and verification of CFDI documents.
use crate::chain::{ChainBuilder, ChainError};
use crate::config::DocumentFamily;
use crate::document::{Comprobante, DocumentError, SealAttributes};
use crate::envelope::{self, EnvelopeError, EnvelopeParams};
use crate::keys::{
    self, Certificate, KeyStoreError, PrivateKey, SubjectField, certificate_base64,
    certificate_serial_encoded, is_key_pair_match,
};
use crate::seal::{self, SealError};
use base64ct::{Base64, Encoding};
use libxml::tree::Document;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum SigningError {
    #[error("Certificate and private key are not a key pair")]
    KeyPairMismatch,
    #[error("NoCertificado {found} does not match certificate serial {expected}")]
    SerialMismatch { expected: String, found: String },
    #[error("Document has no {0} attribute")]
    MissingSeal(&'static str),
    #[error("Document is not a recognized CFDI family")]
    UnknownFamily,
    #[error("Seal does not verify against the certificate: {0}")]
    InvalidSeal(String),
    #[error(transparent)]
    KeyStore(#[from] KeyStoreError),
    #[error(transparent)]
    Seal(#[from] SealError),
    #[error(transparent)]
    Chain(#[from] ChainError),
    #[error(transparent)]
    Envelope(#[from] EnvelopeError),
    #[error(transparent)]
    Document(#[from] DocumentError),
}

/// Owns a CSD certificate and its private key for the lifetime of the signer.
///
/// # Examples
/// ```rust,no_run
/// use cfdi_core::chain::ChainBuilder;
/// use cfdi_core::config::Config;
/// use cfdi_core::document::Comprobante;
/// use cfdi_core::sign::DocumentSigner;
///
/// let signer = DocumentSigner::from_der(
///     &std::fs::read("certificado.cer")?,
///     &std::fs::read("llave_privada.key")?,
///     "12345678a",
/// )?;
/// let mut comprobante = Comprobante::from_path("factura.xml")?;
/// let builder = ChainBuilder::new(Config::new("assets/xslt"));
/// let attributes = signer.seal_document(&mut comprobante, &builder)?;
/// # let _ = attributes;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug)]
pub struct DocumentSigner {
    certificate: Certificate,
    private_key: PrivateKey,
    envelope: EnvelopeParams,
}

impl DocumentSigner {
    pub fn from_der(
        cert_der: &[u8],
        private_key_der: &[u8],
        passphrase: &str,
    ) -> Result<Self, SigningError> {
        let certificate = keys::load_certificate(cert_der)?;
        let private_key = keys::load_private_key(private_key_der, passphrase)?;
        Self::new(certificate, private_key)
    }

    pub fn new(certificate: Certificate, private_key: PrivateKey) -> Result<Self, SigningError> {
        if !is_key_pair_match(&certificate, &private_key) {
            return Err(SigningError::KeyPairMismatch);
        }
        Ok(Self {
            certificate,
            private_key,
            envelope: EnvelopeParams::default(),
        })
    }

    pub fn with_envelope_params(mut self, params: EnvelopeParams) -> Self {
        self.envelope = params;
        self
    }

    pub fn certificate(&self) -> &Certificate {
        &self.certificate
    }

    pub fn serial(&self) -> String {
        certificate_serial_encoded(&self.certificate)
    }

    /// Write `NoCertificado` and `Certificado`, build the chain, then write `Sello`.
    pub fn seal_document(
        &self,
        comprobante: &mut Comprobante,
        chain: &ChainBuilder,
    ) -> Result<SealAttributes, SigningError> {
        let family = comprobante.family().ok_or(SigningError::UnknownFamily)?;
        self.warn_on_issuer_mismatch(comprobante);

        let no_certificado = self.serial();
        let certificado = certificate_base64(&self.certificate);
        comprobante.set_attribute("NoCertificado", &no_certificado)?;
        comprobante.set_attribute("Certificado", &certificado)?;

        let cadena = chain.build(&*comprobante, None)?;
        let sello = seal::seal(&cadena, &self.private_key, family.seal_params())?;
        comprobante.set_attribute("Sello", &sello)?;

        info!(serial = %no_certificado, family = family.as_str(), "sealed document");
        Ok(SealAttributes {
            sello,
            certificado,
            no_certificado,
        })
    }

    /// Append an enveloped signature to `xml` and return the signed document.
    pub fn sign_envelope(&self, xml: &str) -> Result<String, SigningError> {
        Ok(envelope::sign_envelope_xml(
            xml,
            &self.private_key,
            &self.certificate,
            self.envelope,
        )?)
    }

    pub fn sign_envelope_document(&self, doc: &mut Document) -> Result<(), SigningError> {
        Ok(envelope::sign_envelope(
            doc,
            &self.private_key,
            &self.certificate,
            self.envelope,
        )?)
    }

    fn warn_on_issuer_mismatch(&self, comprobante: &Comprobante) {
        let Ok(tax_id) = keys::subject_field(&self.certificate, SubjectField::TaxId) else {
            return;
        };
        if let Some(emisor) = comprobante.emisor_rfc() {
            if emisor != tax_id {
                warn!(emisor = %emisor, certificate = %tax_id, "Emisor Rfc differs from certificate holder");
            }
        }
    }
}

/// Check a sealed document: the embedded certificate must match
/// `NoCertificado` and `Sello` must verify over a freshly built chain.
pub fn verify_document(
    comprobante: &Comprobante,
    chain: &ChainBuilder,
) -> Result<Certificate, SigningError> {
    let attributes = comprobante.seal_attributes();
    if attributes.certificado.is_empty() {
        return Err(SigningError::MissingSeal("Certificado"));
    }
    if attributes.sello.is_empty() {
        return Err(SigningError::MissingSeal("Sello"));
    }

    let cert_der = Base64::decode_vec(&attributes.certificado)
        .map_err(|e| KeyStoreError::MalformedCertificate(format!("{e:?}")))?;
    let certificate = keys::load_certificate(&cert_der)?;
    let expected = certificate_serial_encoded(&certificate);
    if attributes.no_certificado != expected {
        return Err(SigningError::SerialMismatch {
            expected,
            found: attributes.no_certificado,
        });
    }

    let family: DocumentFamily = comprobante.family().ok_or(SigningError::UnknownFamily)?;
    let cadena = chain.build(comprobante, None)?;
    seal::verify_seal(
        &cadena,
        &attributes.sello,
        certificate.public_key(),
        family.seal_params(),
    )
    .map_err(|e| SigningError::InvalidSeal(e.to_string()))?;
    Ok(certificate)
}
