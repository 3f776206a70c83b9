//! Cadena original generation through the SAT XSLT stylesheets.
use crate::config::{Config, DocumentFamily};
use crate::document::{DocumentError, DocumentSource};
use crate::xml::node_namespace;
use libxml::tree::Document;
use libxslt::stylesheet::Stylesheet;
use std::path::PathBuf;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ChainError {
    #[error("No stylesheet available for {0}")]
    TransformNotFound(String),
    #[error("Stylesheet error: {0}")]
    Stylesheet(String),
    #[error("Transform error: {0}")]
    Transform(String),
    #[error("Failed to fetch stylesheet {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error(transparent)]
    Document(#[from] DocumentError),
}

/// Where the cadena original stylesheet is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StylesheetSource {
    Path(PathBuf),
    Url(String),
    /// Stylesheet contents; `base_url` resolves relative `xsl:include`s.
    Bytes { bytes: Vec<u8>, base_url: String },
}

impl StylesheetSource {
    fn load(&self) -> Result<Stylesheet, ChainError> {
        match self {
            StylesheetSource::Path(path) => {
                let path = path.to_str().ok_or_else(|| {
                    ChainError::Stylesheet(format!("non UTF-8 path: {}", path.display()))
                })?;
                reject_nul(path.as_bytes(), path)?;
                libxslt::parser::parse_file(path)
                    .map_err(|e| ChainError::Stylesheet(format!("{path}: {e:?}")))
            }
            StylesheetSource::Url(url) => {
                let bytes = fetch(url)?;
                reject_nul(&bytes, url)?;
                libxslt::parser::parse_bytes(bytes, url)
                    .map_err(|e| ChainError::Stylesheet(format!("{url}: {e:?}")))
            }
            StylesheetSource::Bytes { bytes, base_url } => {
                reject_nul(bytes, base_url)?;
                libxslt::parser::parse_bytes(bytes.clone(), base_url)
                    .map_err(|e| ChainError::Stylesheet(format!("{base_url}: {e:?}")))
            }
        }
    }
}

// libxslt hands its inputs to C as NUL terminated strings, which rules out
// UTF-16 stylesheets and embedded NULs.
fn reject_nul(bytes: &[u8], origin: &str) -> Result<(), ChainError> {
    if bytes.contains(&0) {
        return Err(ChainError::Stylesheet(format!(
            "{origin}: contains NUL bytes (only UTF-8 stylesheets are supported)"
        )));
    }
    Ok(())
}

/// Builds canonical chains. Nothing is cached between calls.
///
/// # Examples
/// ```rust,no_run
/// use cfdi_core::chain::ChainBuilder;
/// use cfdi_core::config::Config;
///
/// let builder = ChainBuilder::new(Config::new("assets/xslt"));
/// let xml = std::fs::read_to_string("factura.xml")?;
/// let cadena = builder.build(&xml, None)?;
/// # let _ = cadena;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct ChainBuilder {
    config: Config,
}

impl ChainBuilder {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Apply `stylesheet` (or the one resolved from the document's family)
    /// and return the text output.
    pub fn build<'a>(
        &self,
        document: impl Into<DocumentSource<'a>>,
        stylesheet: Option<&StylesheetSource>,
    ) -> Result<String, ChainError> {
        let doc = document.into().to_document()?;
        let source = match stylesheet {
            Some(source) => source.clone(),
            None => self.resolve_stylesheet(&doc)?,
        };
        let mut xslt = source.load()?;
        let result = xslt
            .transform(doc, Vec::new())
            .map_err(|e| ChainError::Transform(format!("{e:?}")))?;
        Ok(result.as_node().get_content())
    }

    /// Local `stylesheet_dir` first, then the official URL when remote
    /// stylesheets are allowed.
    pub fn resolve_stylesheet(&self, doc: &Document) -> Result<StylesheetSource, ChainError> {
        let family = detect_family(doc)?;
        if let Some(dir) = self.config.stylesheet_dir() {
            let candidate = dir.join(family.stylesheet_file());
            if candidate.is_file() {
                debug!(family = family.as_str(), path = %candidate.display(), "using local stylesheet");
                return Ok(StylesheetSource::Path(candidate));
            }
            debug!(family = family.as_str(), path = %candidate.display(), "local stylesheet not found");
        }
        if self.config.allow_remote_stylesheets() {
            debug!(family = family.as_str(), url = family.stylesheet_url(), "using remote stylesheet");
            return Ok(StylesheetSource::Url(family.stylesheet_url().to_string()));
        }
        Err(ChainError::TransformNotFound(format!(
            "{} (looked for {})",
            family.as_str(),
            family.stylesheet_file()
        )))
    }
}

fn detect_family(doc: &Document) -> Result<DocumentFamily, ChainError> {
    let root = doc
        .get_root_element()
        .ok_or_else(|| ChainError::TransformNotFound("document without root element".into()))?;
    let namespace = node_namespace(&root).unwrap_or_default();
    let version = root
        .get_attribute("Version")
        .or_else(|| root.get_attribute("version"))
        .unwrap_or_default();
    DocumentFamily::detect(&namespace, &version).ok_or_else(|| {
        ChainError::TransformNotFound(format!(
            "unrecognized document {{{namespace}}}{} version {version:?}",
            root.get_name()
        ))
    })
}

fn fetch(url: &str) -> Result<Vec<u8>, ChainError> {
    let response = reqwest::blocking::get(url)
        .and_then(|response| response.error_for_status())
        .map_err(|source| ChainError::Fetch {
            url: url.to_string(),
            source,
        })?;
    let bytes = response.bytes().map_err(|source| ChainError::Fetch {
        url: url.to_string(),
        source,
    })?;
    Ok(bytes.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::parse_document;

    const STYLESHEET: &str = r#"<xsl:stylesheet version="1.0" xmlns:xsl="http://www.w3.org/1999/XSL/Transform" xmlns:cfdi="http://www.sat.gob.mx/cfd/4"><xsl:output method="text"/><xsl:template match="/">||<xsl:value-of select="/cfdi:Comprobante/@Version"/>|<xsl:value-of select="/cfdi:Comprobante/@Total"/>||</xsl:template></xsl:stylesheet>"#;
    const DOCUMENT: &str = r#"<cfdi:Comprobante xmlns:cfdi="http://www.sat.gob.mx/cfd/4" Version="4.0" Total="10.00"/>"#;

    #[test]
    fn explicit_stylesheet_bytes_are_applied() {
        let source = StylesheetSource::Bytes {
            bytes: STYLESHEET.as_bytes().to_vec(),
            base_url: "inline.xslt".into(),
        };
        let chain = ChainBuilder::default()
            .build(DOCUMENT, Some(&source))
            .expect("chain");
        assert_eq!(chain, "||4.0|10.00||");
    }

    #[test]
    fn nul_bytes_are_a_stylesheet_error() {
        let utf16: Vec<u8> = STYLESHEET
            .encode_utf16()
            .flat_map(|unit| unit.to_le_bytes())
            .collect();
        let source = StylesheetSource::Bytes {
            bytes: utf16,
            base_url: "utf16.xslt".into(),
        };
        assert!(matches!(
            ChainBuilder::default().build(DOCUMENT, Some(&source)),
            Err(ChainError::Stylesheet(_))
        ));

        let source = StylesheetSource::Path(PathBuf::from("styles\0/cadena.xslt"));
        assert!(matches!(
            ChainBuilder::default().build(DOCUMENT, Some(&source)),
            Err(ChainError::Stylesheet(_))
        ));
    }

    #[test]
    fn unresolvable_family_is_transform_not_found() {
        let doc = parse_document(r#"<Factura Version="1.0"/>"#).expect("parse");
        assert!(matches!(
            ChainBuilder::default().resolve_stylesheet(&doc),
            Err(ChainError::TransformNotFound(_))
        ));
    }

    #[test]
    fn remote_resolution_uses_official_url() {
        let doc = parse_document(DOCUMENT).expect("parse");
        let builder = ChainBuilder::new(Config::default().with_remote_stylesheets(true));
        assert_eq!(
            builder.resolve_stylesheet(&doc).expect("resolve"),
            StylesheetSource::Url(DocumentFamily::Cfdi40.stylesheet_url().to_string())
        );
    }
}
