//! Parsed CFDI documents and the seal attributes written onto them.
use crate::complement::{self, Complement, ComplementError, Nomina, Pagos, TimbreFiscalDigital};
use crate::config::DocumentFamily;
use crate::xml::{
    XmlError,
    constants::{NOMINA12_NS, PAGOS10_NS, TFD_NS},
    first_child_named, node_namespace, parse_document,
};
use libxml::tree::{Document, Node};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("Document parse error: {0}")]
    Parse(String),
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to set attribute {name}: {message}")]
    Attribute { name: String, message: String },
}

impl From<XmlError> for DocumentError {
    fn from(err: XmlError) -> Self {
        DocumentError::Parse(err.to_string())
    }
}

/// Anything a canonical chain can be built from. Every form is serialized
/// and re-parsed, so equivalent inputs yield the same chain.
#[derive(Clone, Copy)]
pub enum DocumentSource<'a> {
    Comprobante(&'a Comprobante),
    Document(&'a Document),
    Xml(&'a str),
    Bytes(&'a [u8]),
    Path(&'a Path),
}

impl DocumentSource<'_> {
    pub(crate) fn to_bytes(self) -> Result<Vec<u8>, DocumentError> {
        match self {
            DocumentSource::Comprobante(comprobante) => Ok(comprobante.to_xml().into_bytes()),
            DocumentSource::Document(doc) => Ok(doc.to_string().into_bytes()),
            DocumentSource::Xml(xml) => Ok(xml.as_bytes().to_vec()),
            DocumentSource::Bytes(bytes) => Ok(bytes.to_vec()),
            DocumentSource::Path(path) => read_path(path),
        }
    }

    pub(crate) fn to_document(self) -> Result<Document, DocumentError> {
        Ok(parse_document(self.to_bytes()?)?)
    }
}

impl<'a> From<&'a Comprobante> for DocumentSource<'a> {
    fn from(value: &'a Comprobante) -> Self {
        DocumentSource::Comprobante(value)
    }
}

impl<'a> From<&'a Document> for DocumentSource<'a> {
    fn from(value: &'a Document) -> Self {
        DocumentSource::Document(value)
    }
}

impl<'a> From<&'a str> for DocumentSource<'a> {
    fn from(value: &'a str) -> Self {
        DocumentSource::Xml(value)
    }
}

impl<'a> From<&'a String> for DocumentSource<'a> {
    fn from(value: &'a String) -> Self {
        DocumentSource::Xml(value)
    }
}

impl<'a> From<&'a [u8]> for DocumentSource<'a> {
    fn from(value: &'a [u8]) -> Self {
        DocumentSource::Bytes(value)
    }
}

impl<'a> From<&'a Vec<u8>> for DocumentSource<'a> {
    fn from(value: &'a Vec<u8>) -> Self {
        DocumentSource::Bytes(value)
    }
}

impl<'a> From<&'a Path> for DocumentSource<'a> {
    fn from(value: &'a Path) -> Self {
        DocumentSource::Path(value)
    }
}

impl<'a> From<&'a PathBuf> for DocumentSource<'a> {
    fn from(value: &'a PathBuf) -> Self {
        DocumentSource::Path(value)
    }
}

/// The three attributes sealing writes onto the root element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SealAttributes {
    pub sello: String,
    pub certificado: String,
    pub no_certificado: String,
}

/// A parsed CFDI with its complements already resolved.
pub struct Comprobante {
    doc: Document,
    complements: Vec<Complement>,
}

impl Comprobante {
    pub fn parse(input: impl AsRef<[u8]>) -> Result<Self, DocumentError> {
        let doc = parse_document(input)?;
        Ok(Self::from_document(doc))
    }

    pub fn from_xml(xml: &str) -> Result<Self, DocumentError> {
        Self::parse(xml)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DocumentError> {
        Self::parse(bytes)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, DocumentError> {
        Self::parse(read_path(path.as_ref())?)
    }

    pub fn from_document(doc: Document) -> Self {
        let complements = complement::resolve(&doc);
        Self { doc, complements }
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn to_xml(&self) -> String {
        self.doc.to_string()
    }

    pub fn version(&self) -> Option<String> {
        self.attribute("Version")
            .or_else(|| self.attribute("version"))
    }

    pub fn family(&self) -> Option<DocumentFamily> {
        let namespace = node_namespace(&self.root()?)?;
        DocumentFamily::detect(&namespace, &self.version()?)
    }

    pub fn attribute(&self, name: &str) -> Option<String> {
        self.root()?.get_attribute(name)
    }

    pub fn set_attribute(&mut self, name: &str, value: &str) -> Result<(), DocumentError> {
        let mut root = self.root().ok_or_else(|| DocumentError::Attribute {
            name: name.to_string(),
            message: "missing root element".into(),
        })?;
        root.set_attribute(name, value)
            .map_err(|e| DocumentError::Attribute {
                name: name.to_string(),
                message: e.to_string(),
            })
    }

    pub fn seal_attributes(&self) -> SealAttributes {
        SealAttributes {
            sello: self.attribute("Sello").unwrap_or_default(),
            certificado: self.attribute("Certificado").unwrap_or_default(),
            no_certificado: self.attribute("NoCertificado").unwrap_or_default(),
        }
    }

    pub fn set_seal_attributes(&mut self, attributes: &SealAttributes) -> Result<(), DocumentError> {
        self.set_attribute("NoCertificado", &attributes.no_certificado)?;
        self.set_attribute("Certificado", &attributes.certificado)?;
        self.set_attribute("Sello", &attributes.sello)
    }

    pub fn emisor_rfc(&self) -> Option<String> {
        first_child_named(&self.root()?, "Emisor")?.get_attribute("Rfc")
    }

    pub fn receptor_rfc(&self) -> Option<String> {
        first_child_named(&self.root()?, "Receptor")?.get_attribute("Rfc")
    }

    pub fn complements(&self) -> &[Complement] {
        &self.complements
    }

    /// `Err` when a Pagos complement is present but does not parse.
    pub fn pagos(&self) -> Result<Option<&Pagos>, ComplementError> {
        self.typed(PAGOS10_NS, |complement| match complement {
            Complement::Pagos(pagos) => Some(pagos),
            _ => None,
        })
    }

    pub fn timbre(&self) -> Result<Option<&TimbreFiscalDigital>, ComplementError> {
        self.typed(TFD_NS, |complement| match complement {
            Complement::TimbreFiscalDigital(tfd) => Some(tfd),
            _ => None,
        })
    }

    pub fn nomina(&self) -> Result<Option<&Nomina>, ComplementError> {
        self.typed(NOMINA12_NS, |complement| match complement {
            Complement::Nomina(nomina) => Some(nomina),
            _ => None,
        })
    }

    fn typed<'a, T>(
        &'a self,
        namespace: &str,
        select: impl Fn(&'a Complement) -> Option<&'a T>,
    ) -> Result<Option<&'a T>, ComplementError> {
        for complement in &self.complements {
            if let Some(found) = select(complement) {
                return Ok(Some(found));
            }
            if let Complement::Invalid(invalid) = complement {
                if invalid.raw.namespace.as_deref() == Some(namespace) {
                    return Err(invalid.error.clone());
                }
            }
        }
        Ok(None)
    }

    fn root(&self) -> Option<Node> {
        self.doc.get_root_element()
    }
}

impl fmt::Debug for Comprobante {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Comprobante")
            .field("family", &self.family())
            .field("complements", &self.complements)
            .finish()
    }
}

fn read_path(path: &Path) -> Result<Vec<u8>, DocumentError> {
    std::fs::read(path).map_err(|source| DocumentError::Io {
        path: path.to_path_buf(),
        source,
    })
}
