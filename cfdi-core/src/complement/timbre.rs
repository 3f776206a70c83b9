//! Timbre Fiscal Digital 1.1 (`http://www.sat.gob.mx/TimbreFiscalDigital`).
use super::{Attributes, ComplementError};
use chrono::NaiveDateTime;
use libxml::tree::Node;

const COMPLEMENT: &str = "TimbreFiscalDigital";

/// The stamp a PAC adds after validating the issuer's seal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimbreFiscalDigital {
    pub version: String,
    pub uuid: String,
    pub fecha_timbrado: NaiveDateTime,
    pub rfc_prov_certif: String,
    pub leyenda: Option<String>,
    /// Issuer seal being stamped; must equal the document's `Sello`.
    pub sello_cfd: String,
    pub no_certificado_sat: String,
    pub sello_sat: String,
}

impl TimbreFiscalDigital {
    pub(crate) fn from_node(node: &Node) -> Result<Self, ComplementError> {
        let attrs = Attributes::new(node, COMPLEMENT);
        Ok(Self {
            version: attrs.required("Version")?,
            uuid: attrs.required("UUID")?,
            fecha_timbrado: attrs.required_datetime("FechaTimbrado")?,
            rfc_prov_certif: attrs.required("RfcProvCertif")?,
            leyenda: attrs.optional("Leyenda"),
            sello_cfd: attrs.required("SelloCFD")?,
            no_certificado_sat: attrs.required("NoCertificadoSAT")?,
            sello_sat: attrs.required("SelloSAT")?,
        })
    }
}
