//! Resolution of the children of `cfdi:Complemento` into typed complements.
//!
//! Each known namespace maps to a parser in [`REGISTRY`]. Children in any
//! other namespace are kept verbatim as [`RawComplement`] so nothing a PAC or
//! third party added is lost. A registered child that fails to parse is kept
//! as [`Complement::Invalid`] together with its error.
pub mod nomina;
pub mod pagos;
pub mod timbre;

pub use nomina::Nomina;
pub use pagos::Pagos;
pub use timbre::TimbreFiscalDigital;

use crate::xml::{
    child_elements_named,
    constants::{NOMINA12_NS, PAGOS10_NS, TFD_NS},
    node_namespace,
};
use chrono::{NaiveDate, NaiveDateTime};
use libxml::tree::{Document, Node};
use thiserror::Error;
use tracing::{debug, warn};

/// Errors emitted while parsing a registered complement.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ComplementError {
    #[error("{complement}: missing required attribute {attribute}")]
    MissingAttribute {
        complement: &'static str,
        attribute: &'static str,
    },
    #[error("{complement}: missing required element {element}")]
    MissingElement {
        complement: &'static str,
        element: &'static str,
    },
    #[error("{complement}: invalid value for {attribute}: {value}")]
    InvalidValue {
        complement: &'static str,
        attribute: &'static str,
        value: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Complement {
    Pagos(Pagos),
    TimbreFiscalDigital(TimbreFiscalDigital),
    Nomina(Nomina),
    Unknown(RawComplement),
    Invalid(InvalidComplement),
}

impl Complement {
    pub fn namespace(&self) -> Option<&str> {
        match self {
            Complement::Pagos(_) => Some(PAGOS10_NS),
            Complement::TimbreFiscalDigital(_) => Some(TFD_NS),
            Complement::Nomina(_) => Some(NOMINA12_NS),
            Complement::Unknown(raw) => raw.namespace.as_deref(),
            Complement::Invalid(invalid) => invalid.raw.namespace.as_deref(),
        }
    }
}

/// A complement with no registered parser, serialized as found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawComplement {
    pub namespace: Option<String>,
    pub name: String,
    pub xml: String,
}

/// A registered complement whose content did not parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidComplement {
    pub raw: RawComplement,
    pub error: ComplementError,
}

type ComplementParser = fn(&Node) -> Result<Complement, ComplementError>;

/// Namespace to parser table. Adding a complement means one entry here and
/// one [`Complement`] variant.
pub static REGISTRY: &[(&str, ComplementParser)] = &[
    (PAGOS10_NS, parse_pagos),
    (TFD_NS, parse_timbre),
    (NOMINA12_NS, parse_nomina),
];

fn parse_pagos(node: &Node) -> Result<Complement, ComplementError> {
    Pagos::from_node(node).map(Complement::Pagos)
}

fn parse_timbre(node: &Node) -> Result<Complement, ComplementError> {
    TimbreFiscalDigital::from_node(node).map(Complement::TimbreFiscalDigital)
}

fn parse_nomina(node: &Node) -> Result<Complement, ComplementError> {
    Nomina::from_node(node).map(Complement::Nomina)
}

fn lookup(namespace: &str) -> Option<ComplementParser> {
    REGISTRY
        .iter()
        .find(|(registered, _)| *registered == namespace)
        .map(|(_, parser)| *parser)
}

/// Resolve every element child of the root's `Complemento` elements.
///
/// # Examples
/// ```rust,no_run
/// use cfdi_core::complement::{resolve, Complement};
/// use cfdi_core::document::Comprobante;
///
/// let comprobante = Comprobante::from_path("factura.xml")?;
/// for complement in resolve(comprobante.document()) {
///     if let Complement::TimbreFiscalDigital(tfd) = complement {
///         println!("{}", tfd.uuid);
///     }
/// }
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn resolve(doc: &Document) -> Vec<Complement> {
    let Some(root) = doc.get_root_element() else {
        return Vec::new();
    };
    let mut complements = Vec::new();
    for container in child_elements_named(&root, "Complemento") {
        for child in container.get_child_elements() {
            let namespace = node_namespace(&child);
            let raw = || RawComplement {
                namespace: namespace.clone(),
                name: child.get_name(),
                xml: doc.node_to_string(&child),
            };
            match namespace.as_deref().and_then(lookup) {
                Some(parser) => {
                    debug!(namespace = namespace.as_deref(), "parsing registered complement");
                    match parser(&child) {
                        Ok(complement) => complements.push(complement),
                        Err(error) => {
                            warn!(
                                namespace = namespace.as_deref(),
                                error = %error,
                                "registered complement did not parse"
                            );
                            complements.push(Complement::Invalid(InvalidComplement {
                                raw: raw(),
                                error,
                            }));
                        }
                    }
                }
                None => {
                    warn!(
                        namespace = namespace.as_deref(),
                        name = %child.get_name(),
                        "preserving unregistered complement"
                    );
                    complements.push(Complement::Unknown(raw()));
                }
            }
        }
    }
    complements
}

/// Attribute reader bound to one complement element.
pub(crate) struct Attributes<'a> {
    node: &'a Node,
    complement: &'static str,
}

impl<'a> Attributes<'a> {
    pub(crate) fn new(node: &'a Node, complement: &'static str) -> Self {
        Self { node, complement }
    }

    pub(crate) fn optional(&self, attribute: &'static str) -> Option<String> {
        self.node
            .get_attribute(attribute)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }

    pub(crate) fn required(&self, attribute: &'static str) -> Result<String, ComplementError> {
        self.optional(attribute)
            .ok_or(ComplementError::MissingAttribute {
                complement: self.complement,
                attribute,
            })
    }

    pub(crate) fn required_datetime(
        &self,
        attribute: &'static str,
    ) -> Result<NaiveDateTime, ComplementError> {
        let value = self.required(attribute)?;
        self.datetime(attribute, value)
    }

    pub(crate) fn required_date(
        &self,
        attribute: &'static str,
    ) -> Result<NaiveDate, ComplementError> {
        let value = self.required(attribute)?;
        NaiveDate::parse_from_str(&value, "%Y-%m-%d").map_err(|_| self.invalid(attribute, value))
    }

    pub(crate) fn optional_date(
        &self,
        attribute: &'static str,
    ) -> Result<Option<NaiveDate>, ComplementError> {
        self.optional(attribute)
            .map(|value| {
                NaiveDate::parse_from_str(&value, "%Y-%m-%d")
                    .map_err(|_| self.invalid(attribute, value))
            })
            .transpose()
    }

    pub(crate) fn optional_u32(
        &self,
        attribute: &'static str,
    ) -> Result<Option<u32>, ComplementError> {
        self.optional(attribute)
            .map(|value| value.parse().map_err(|_| self.invalid(attribute, value)))
            .transpose()
    }

    fn datetime(
        &self,
        attribute: &'static str,
        value: String,
    ) -> Result<NaiveDateTime, ComplementError> {
        NaiveDateTime::parse_from_str(&value, "%Y-%m-%dT%H:%M:%S")
            .map_err(|_| self.invalid(attribute, value))
    }

    fn invalid(&self, attribute: &'static str, value: String) -> ComplementError {
        ComplementError::InvalidValue {
            complement: self.complement,
            attribute,
            value,
        }
    }
}
