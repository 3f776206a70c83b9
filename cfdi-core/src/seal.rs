//! Raw digest signing ("sello") of canonical chains.
use crate::config::ConfigParseError;
use crate::keys::PrivateKey;
use base64ct::{Base64, Encoding};
use rsa::{Pkcs1v15Sign, Pss, RsaPublicKey, traits::PublicKeyParts};
use serde::{Deserialize, Serialize};
use sha1::Sha1;
use sha2::{Digest, Sha256, Sha384, Sha512};
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SealError {
    #[error("Signing error: {0}")]
    Signing(String),
    #[error("Seal is not valid base64: {0}")]
    InvalidEncoding(String),
    #[error("Seal verification failed: {0}")]
    Verification(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DigestAlgorithm {
    Sha1,
    Sha256,
    Sha384,
    Sha512,
}

impl DigestAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            DigestAlgorithm::Sha1 => "sha1",
            DigestAlgorithm::Sha256 => "sha256",
            DigestAlgorithm::Sha384 => "sha384",
            DigestAlgorithm::Sha512 => "sha512",
        }
    }

    pub fn digest(&self, payload: &[u8]) -> Vec<u8> {
        match self {
            DigestAlgorithm::Sha1 => Sha1::digest(payload).to_vec(),
            DigestAlgorithm::Sha256 => Sha256::digest(payload).to_vec(),
            DigestAlgorithm::Sha384 => Sha384::digest(payload).to_vec(),
            DigestAlgorithm::Sha512 => Sha512::digest(payload).to_vec(),
        }
    }

    pub fn output_len(&self) -> usize {
        match self {
            DigestAlgorithm::Sha1 => 20,
            DigestAlgorithm::Sha256 => 32,
            DigestAlgorithm::Sha384 => 48,
            DigestAlgorithm::Sha512 => 64,
        }
    }

    pub(crate) fn pkcs1v15(&self) -> Pkcs1v15Sign {
        match self {
            DigestAlgorithm::Sha1 => Pkcs1v15Sign::new::<Sha1>(),
            DigestAlgorithm::Sha256 => Pkcs1v15Sign::new::<Sha256>(),
            DigestAlgorithm::Sha384 => Pkcs1v15Sign::new::<Sha384>(),
            DigestAlgorithm::Sha512 => Pkcs1v15Sign::new::<Sha512>(),
        }
    }

    fn pss(&self, salt_len: usize) -> Pss {
        match self {
            DigestAlgorithm::Sha1 => Pss::new_with_salt::<Sha1>(salt_len),
            DigestAlgorithm::Sha256 => Pss::new_with_salt::<Sha256>(salt_len),
            DigestAlgorithm::Sha384 => Pss::new_with_salt::<Sha384>(salt_len),
            DigestAlgorithm::Sha512 => Pss::new_with_salt::<Sha512>(salt_len),
        }
    }
}

impl FromStr for DigestAlgorithm {
    type Err = ConfigParseError;
    fn from_str(value: &str) -> Result<DigestAlgorithm, ConfigParseError> {
        match value.to_ascii_lowercase().replace('-', "").as_str() {
            "sha1" => Ok(DigestAlgorithm::Sha1),
            "sha256" => Ok(DigestAlgorithm::Sha256),
            "sha384" => Ok(DigestAlgorithm::Sha384),
            "sha512" => Ok(DigestAlgorithm::Sha512),
            _ => Err(ConfigParseError::Invalid {
                kind: "digest algorithm",
                input: value.to_string(),
            }),
        }
    }
}

/// RSA padding used for the seal.
/// - Pkcs1v15: deterministic, what CFDI 3.3 and 4.0 validators expect.
/// - Pss: probabilistic with the maximum salt length.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SealScheme {
    #[default]
    Pkcs1v15,
    Pss,
}

impl SealScheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            SealScheme::Pkcs1v15 => "pkcs1v15",
            SealScheme::Pss => "pss",
        }
    }
}

impl FromStr for SealScheme {
    type Err = ConfigParseError;
    fn from_str(value: &str) -> Result<SealScheme, ConfigParseError> {
        match value.to_ascii_lowercase().as_str() {
            "pkcs1v15" | "pkcs1" => Ok(SealScheme::Pkcs1v15),
            "pss" => Ok(SealScheme::Pss),
            _ => Err(ConfigParseError::Invalid {
                kind: "seal scheme",
                input: value.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SealParams {
    pub digest: DigestAlgorithm,
    pub scheme: SealScheme,
}

impl SealParams {
    pub fn new(digest: DigestAlgorithm, scheme: SealScheme) -> Self {
        Self { digest, scheme }
    }
}

impl Default for SealParams {
    fn default() -> Self {
        Self::new(DigestAlgorithm::Sha256, SealScheme::Pkcs1v15)
    }
}

/// Digest `payload` and sign the digest, returning the base64 seal.
///
/// # Examples
/// ```rust,no_run
/// use cfdi_core::keys::load_private_key;
/// use cfdi_core::seal::{seal, SealParams};
///
/// let key = load_private_key(&std::fs::read("llave.key")?, "12345678a")?;
/// let sello = seal("||3.3|A|123||", &key, SealParams::default())?;
/// # let _ = sello;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn seal(
    payload: impl AsRef<[u8]>,
    key: &PrivateKey,
    params: SealParams,
) -> Result<String, SealError> {
    let hashed = params.digest.digest(payload.as_ref());
    let signature = match params.scheme {
        SealScheme::Pkcs1v15 => key.rsa().sign(params.digest.pkcs1v15(), &hashed),
        SealScheme::Pss => {
            let salt_len = max_pss_salt_len(key.rsa().n().bits(), params.digest);
            key.rsa().sign_with_rng(
                &mut rand::thread_rng(),
                params.digest.pss(salt_len),
                &hashed,
            )
        }
    }
    .map_err(|e| SealError::Signing(format!("{e:?}")))?;
    Ok(Base64::encode_string(&signature))
}

/// Check a base64 seal over `payload` against `public_key`.
pub fn verify_seal(
    payload: impl AsRef<[u8]>,
    seal_b64: &str,
    public_key: &RsaPublicKey,
    params: SealParams,
) -> Result<(), SealError> {
    let signature = Base64::decode_vec(seal_b64.trim())
        .map_err(|e| SealError::InvalidEncoding(format!("{e:?}")))?;
    let hashed = params.digest.digest(payload.as_ref());
    match params.scheme {
        SealScheme::Pkcs1v15 => public_key.verify(params.digest.pkcs1v15(), &hashed, &signature),
        SealScheme::Pss => {
            let salt_len = max_pss_salt_len(public_key.n().bits(), params.digest);
            public_key.verify(params.digest.pss(salt_len), &hashed, &signature)
        }
    }
    .map_err(|e| SealError::Verification(format!("{e:?}")))
}

fn max_pss_salt_len(modulus_bits: usize, digest: DigestAlgorithm) -> usize {
    let em_len = modulus_bits.saturating_sub(1).div_ceil(8);
    em_len.saturating_sub(digest.output_len() + 2)
}
