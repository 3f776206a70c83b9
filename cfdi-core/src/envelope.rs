//! Enveloped XML-DSig signatures over a whole document.
//!
//! The signature covers the document reached through `Reference URI=""` with
//! the enveloped-signature transform, canonicalized with inclusive C14N 1.0.
//! The `Signature` element is appended as the last child of the root.
use crate::config::Config;
use crate::keys::{self, Certificate, KeyStoreError, PrivateKey};
use crate::seal::{self, DigestAlgorithm, SealError, SealParams, SealScheme};
use crate::xml::{
    self, XmlError,
    constants::{
        C14N_ALGORITHM, DS_NS, ENVELOPED_SIGNATURE_TRANSFORM, RSA_SHA1_SIGNATURE_METHOD,
        RSA_SHA256_SIGNATURE_METHOD, RSA_SHA384_SIGNATURE_METHOD, RSA_SHA512_SIGNATURE_METHOD,
        SHA1_DIGEST_METHOD, SHA256_DIGEST_METHOD, SHA384_DIGEST_METHOD, SHA512_DIGEST_METHOD,
    },
    escape_text, first_child_named, import_fragment,
};
use base64ct::{Base64, Encoding};
use libxml::tree::{Document, Node};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum EnvelopeError {
    #[error("Document parse error: {0}")]
    DocumentParse(String),
    #[error("Failed to canonicalize xml: {0}")]
    Canonicalization(String),
    #[error(transparent)]
    Xml(XmlError),
    #[error("Missing {0} in signature")]
    MissingElement(&'static str),
    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),
    #[error("Digest value does not match the document")]
    DigestMismatch,
    #[error("Signature value is invalid: {0}")]
    SignatureInvalid(String),
    #[error(transparent)]
    Seal(#[from] SealError),
    #[error(transparent)]
    KeyStore(#[from] KeyStoreError),
}

impl From<XmlError> for EnvelopeError {
    fn from(err: XmlError) -> Self {
        match err {
            XmlError::Canonicalization(message) => EnvelopeError::Canonicalization(message),
            other => EnvelopeError::Xml(other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnvelopeParams {
    /// Hash for both the reference digest and the RSA signature.
    pub digest: DigestAlgorithm,
}

impl EnvelopeParams {
    pub fn new(digest: DigestAlgorithm) -> Self {
        Self { digest }
    }
}

impl Default for EnvelopeParams {
    fn default() -> Self {
        Self::new(DigestAlgorithm::Sha1)
    }
}

impl From<&Config> for EnvelopeParams {
    fn from(config: &Config) -> Self {
        Self::new(config.envelope_digest())
    }
}

pub fn digest_method_uri(digest: DigestAlgorithm) -> &'static str {
    match digest {
        DigestAlgorithm::Sha1 => SHA1_DIGEST_METHOD,
        DigestAlgorithm::Sha256 => SHA256_DIGEST_METHOD,
        DigestAlgorithm::Sha384 => SHA384_DIGEST_METHOD,
        DigestAlgorithm::Sha512 => SHA512_DIGEST_METHOD,
    }
}

pub fn signature_method_uri(digest: DigestAlgorithm) -> &'static str {
    match digest {
        DigestAlgorithm::Sha1 => RSA_SHA1_SIGNATURE_METHOD,
        DigestAlgorithm::Sha256 => RSA_SHA256_SIGNATURE_METHOD,
        DigestAlgorithm::Sha384 => RSA_SHA384_SIGNATURE_METHOD,
        DigestAlgorithm::Sha512 => RSA_SHA512_SIGNATURE_METHOD,
    }
}

fn digest_from_method_uri(uri: &str) -> Result<DigestAlgorithm, EnvelopeError> {
    ALGORITHMS
        .into_iter()
        .find(|digest| digest_method_uri(*digest) == uri)
        .ok_or_else(|| EnvelopeError::UnsupportedAlgorithm(uri.to_string()))
}

fn digest_from_signature_uri(uri: &str) -> Result<DigestAlgorithm, EnvelopeError> {
    ALGORITHMS
        .into_iter()
        .find(|digest| signature_method_uri(*digest) == uri)
        .ok_or_else(|| EnvelopeError::UnsupportedAlgorithm(uri.to_string()))
}

const ALGORITHMS: [DigestAlgorithm; 4] = [
    DigestAlgorithm::Sha1,
    DigestAlgorithm::Sha256,
    DigestAlgorithm::Sha384,
    DigestAlgorithm::Sha512,
];

/// Sign `doc` in place, appending a `Signature` as the root's last child.
pub fn sign_envelope(
    doc: &mut Document,
    key: &PrivateKey,
    cert: &Certificate,
    params: EnvelopeParams,
) -> Result<(), EnvelopeError> {
    // digest first: the signature must not be part of its own reference
    let canonical = xml::canonicalize(doc)?;
    let digest_b64 = Base64::encode_string(&params.digest.digest(canonical.as_bytes()));
    debug!(
        digest = params.digest.as_str(),
        bytes = canonical.len(),
        "computed enveloped reference digest"
    );

    let serial = keys::certificate_serial_encoded(cert);
    let signature_xml = format!(
        "<Signature xmlns=\"{DS_NS}\">{}<SignatureValue></SignatureValue>{}</Signature>",
        signed_info_xml(params.digest, &digest_b64),
        key_info_xml(cert, &serial),
    );
    let mut signature = import_fragment(doc, &signature_xml)?;
    let mut root = doc
        .get_root_element()
        .ok_or_else(|| EnvelopeError::DocumentParse("missing root element".into()))?;
    root.add_child(&mut signature)
        .map_err(|e| EnvelopeError::Xml(XmlError::Import(e.to_string())))?;

    let signed_info = first_child_named(&signature, "SignedInfo")
        .ok_or(EnvelopeError::MissingElement("SignedInfo"))?;
    let canonical_signed_info = xml::canonicalize_in_context(doc, &signed_info)?;
    let signature_value = seal::seal(
        canonical_signed_info,
        key,
        SealParams::new(params.digest, SealScheme::Pkcs1v15),
    )?;
    let mut value_node = first_child_named(&signature, "SignatureValue")
        .ok_or(EnvelopeError::MissingElement("SignatureValue"))?;
    value_node
        .set_content(&signature_value)
        .map_err(|e| EnvelopeError::Xml(XmlError::Import(e.to_string())))?;

    info!(serial = %serial, digest = params.digest.as_str(), "signed envelope");
    Ok(())
}

/// Parse `xml`, sign it and return the serialized result.
pub fn sign_envelope_xml(
    xml: &str,
    key: &PrivateKey,
    cert: &Certificate,
    params: EnvelopeParams,
) -> Result<String, EnvelopeError> {
    let mut doc =
        xml::parse_document(xml).map_err(|e| EnvelopeError::DocumentParse(e.to_string()))?;
    sign_envelope(&mut doc, key, cert, params)?;
    Ok(doc.to_string())
}

/// Check the root's trailing `Signature` and return the signing certificate.
pub fn verify_envelope(doc: &Document) -> Result<Certificate, EnvelopeError> {
    let root = doc
        .get_root_element()
        .ok_or_else(|| EnvelopeError::DocumentParse("missing root element".into()))?;
    let signature =
        trailing_signature(&root).ok_or(EnvelopeError::MissingElement("Signature"))?;

    let signed_info = first_child_named(&signature, "SignedInfo")
        .ok_or(EnvelopeError::MissingElement("SignedInfo"))?;
    let c14n_method = algorithm_of(&signed_info, "CanonicalizationMethod")?;
    if c14n_method != C14N_ALGORITHM {
        return Err(EnvelopeError::UnsupportedAlgorithm(c14n_method));
    }
    let signature_digest =
        digest_from_signature_uri(&algorithm_of(&signed_info, "SignatureMethod")?)?;
    let reference = first_child_named(&signed_info, "Reference")
        .ok_or(EnvelopeError::MissingElement("Reference"))?;
    if reference.get_attribute("URI").as_deref() != Some("") {
        return Err(EnvelopeError::UnsupportedAlgorithm(format!(
            "reference URI {:?}",
            reference.get_attribute("URI")
        )));
    }
    check_transforms(&reference)?;
    let reference_digest = digest_from_method_uri(&algorithm_of(&reference, "DigestMethod")?)?;
    let digest_value = element_text(&reference, "DigestValue")?;

    let expected = Base64::decode_vec(&digest_value)
        .map_err(|e| EnvelopeError::SignatureInvalid(format!("DigestValue: {e:?}")))?;
    let actual = reference_digest.digest(canonical_without_signature(doc)?.as_bytes());
    if expected != actual {
        return Err(EnvelopeError::DigestMismatch);
    }

    let key_info = first_child_named(&signature, "KeyInfo")
        .ok_or(EnvelopeError::MissingElement("KeyInfo"))?;
    let x509_data = first_child_named(&key_info, "X509Data")
        .ok_or(EnvelopeError::MissingElement("X509Data"))?;
    let cert_der = Base64::decode_vec(&element_text(&x509_data, "X509Certificate")?)
        .map_err(|e| KeyStoreError::MalformedCertificate(format!("{e:?}")))?;
    let cert = keys::load_certificate(&cert_der)?;

    let canonical_signed_info = xml::canonicalize_in_context(doc, &signed_info)?;
    let signature_value = element_text(&signature, "SignatureValue")?;
    seal::verify_seal(
        canonical_signed_info,
        &signature_value,
        cert.public_key(),
        SealParams::new(signature_digest, SealScheme::Pkcs1v15),
    )
    .map_err(|e| EnvelopeError::SignatureInvalid(e.to_string()))?;
    debug!(serial = %keys::certificate_serial_encoded(&cert), "verified envelope");
    Ok(cert)
}

fn signed_info_xml(digest: DigestAlgorithm, digest_b64: &str) -> String {
    format!(
        "<SignedInfo>\
         <CanonicalizationMethod Algorithm=\"{C14N_ALGORITHM}\"/>\
         <SignatureMethod Algorithm=\"{}\"/>\
         <Reference URI=\"\">\
         <Transforms><Transform Algorithm=\"{ENVELOPED_SIGNATURE_TRANSFORM}\"/></Transforms>\
         <DigestMethod Algorithm=\"{}\"/>\
         <DigestValue>{digest_b64}</DigestValue>\
         </Reference>\
         </SignedInfo>",
        signature_method_uri(digest),
        digest_method_uri(digest),
    )
}

fn key_info_xml(cert: &Certificate, serial: &str) -> String {
    format!(
        "<KeyInfo><X509Data>\
         <X509IssuerSerial>\
         <X509IssuerName>{}</X509IssuerName>\
         <X509SerialNumber>{serial}</X509SerialNumber>\
         </X509IssuerSerial>\
         <X509Certificate>{}</X509Certificate>\
         </X509Data></KeyInfo>",
        escape_text(&cert.issuer_name()),
        keys::certificate_base64(cert),
    )
}

fn trailing_signature(root: &Node) -> Option<Node> {
    root.get_child_elements()
        .into_iter()
        .last()
        .filter(|node| {
            node.get_name() == "Signature" && xml::node_namespace(node).as_deref() == Some(DS_NS)
        })
}

fn canonical_without_signature(doc: &Document) -> Result<String, EnvelopeError> {
    let copy = doc
        .dup()
        .map_err(|e| EnvelopeError::Canonicalization(format!("failed to duplicate xml: {e:?}")))?;
    let root = copy
        .get_root_element()
        .ok_or_else(|| EnvelopeError::DocumentParse("missing root element".into()))?;
    let mut signature =
        trailing_signature(&root).ok_or(EnvelopeError::MissingElement("Signature"))?;
    signature.unlink();
    Ok(xml::canonicalize_owned(&copy)?)
}

fn check_transforms(reference: &Node) -> Result<(), EnvelopeError> {
    let Some(transforms) = first_child_named(reference, "Transforms") else {
        return Ok(());
    };
    for transform in transforms.get_child_elements() {
        let algorithm = transform.get_attribute("Algorithm").unwrap_or_default();
        if algorithm != ENVELOPED_SIGNATURE_TRANSFORM && algorithm != C14N_ALGORITHM {
            return Err(EnvelopeError::UnsupportedAlgorithm(algorithm));
        }
    }
    Ok(())
}

fn algorithm_of(parent: &Node, element: &'static str) -> Result<String, EnvelopeError> {
    first_child_named(parent, element)
        .and_then(|node| node.get_attribute("Algorithm"))
        .ok_or(EnvelopeError::MissingElement(element))
}

fn element_text(parent: &Node, element: &'static str) -> Result<String, EnvelopeError> {
    let text: String = first_child_named(parent, element)
        .ok_or(EnvelopeError::MissingElement(element))?
        .get_content()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    if text.is_empty() {
        return Err(EnvelopeError::MissingElement(element));
    }
    Ok(text)
}
