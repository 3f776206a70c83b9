//! Rust toolkit for sealing and verifying CFDI fiscal documents (CSD keys, cadena original,
//! sello, enveloped signatures, complements and RFC validation).
//!
//! # Examples
//! ```rust
//! use cfdi_core::config::Config;
//! use cfdi_core::rfc::is_valid_rfc;
//!
//! let config = Config::new("assets/xslt");
//! # let _ = config;
//! assert!(is_valid_rfc("EKU9003173C9", false));
//! ```
pub mod chain;
pub mod complement;
pub mod config;
pub mod document;
pub mod envelope;
pub mod keys;
pub mod rfc;
pub mod seal;
pub mod sign;
pub mod xml;

use thiserror::Error;

/// Top-level error wrapper for core operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    KeyStore(#[from] keys::KeyStoreError),
    #[error(transparent)]
    Seal(#[from] seal::SealError),
    #[error(transparent)]
    Chain(#[from] chain::ChainError),
    #[error(transparent)]
    Envelope(#[from] envelope::EnvelopeError),
    #[error(transparent)]
    Complement(#[from] complement::ComplementError),
    #[error(transparent)]
    Document(#[from] document::DocumentError),
    #[error(transparent)]
    Signing(#[from] sign::SigningError),
    #[error(transparent)]
    Config(#[from] config::ConfigParseError),
    #[error(transparent)]
    Xml(#[from] xml::XmlError),
}
