//! Recepción de pagos 1.0 (`http://www.sat.gob.mx/Pagos`).
use super::{Attributes, ComplementError};
use crate::xml::{child_elements_named, first_child_named};
use chrono::NaiveDateTime;
use libxml::tree::Node;

const COMPLEMENT: &str = "Pagos";

#[derive(Debug, Clone, PartialEq)]
pub struct Pagos {
    pub version: String,
    pub pagos: Vec<Pago>,
}

/// A single payment. Amounts are kept as written in the document.
#[derive(Debug, Clone, PartialEq)]
pub struct Pago {
    pub fecha_pago: NaiveDateTime,
    pub forma_de_pago: String,
    pub moneda: String,
    pub tipo_cambio: Option<String>,
    pub monto: String,
    pub num_operacion: Option<String>,
    pub rfc_emisor_cta_ord: Option<String>,
    pub nom_banco_ord_ext: Option<String>,
    pub cta_ordenante: Option<String>,
    pub rfc_emisor_cta_ben: Option<String>,
    pub cta_beneficiario: Option<String>,
    pub tipo_cad_pago: Option<String>,
    pub cert_pago: Option<String>,
    pub cad_pago: Option<String>,
    pub sello_pago: Option<String>,
    pub documentos: Vec<DoctoRelacionado>,
    pub impuestos: Vec<Impuestos>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DoctoRelacionado {
    pub id_documento: String,
    pub serie: Option<String>,
    pub folio: Option<String>,
    pub moneda: String,
    pub tipo_cambio: Option<String>,
    pub metodo_de_pago: String,
    pub num_parcialidad: Option<u32>,
    pub imp_saldo_ant: Option<String>,
    pub imp_pagado: Option<String>,
    pub imp_saldo_insoluto: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Impuestos {
    pub total_impuestos_retenidos: Option<String>,
    pub total_impuestos_trasladados: Option<String>,
    pub retenciones: Vec<Retencion>,
    pub traslados: Vec<Traslado>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Retencion {
    pub impuesto: String,
    pub importe: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Traslado {
    pub impuesto: String,
    pub tipo_factor: String,
    pub tasa_o_cuota: String,
    pub importe: String,
}

impl Pagos {
    pub(crate) fn from_node(node: &Node) -> Result<Self, ComplementError> {
        let attrs = Attributes::new(node, COMPLEMENT);
        let pagos = child_elements_named(node, "Pago")
            .iter()
            .map(Pago::from_node)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            version: attrs.required("Version")?,
            pagos,
        })
    }

    /// Related documents across every payment.
    pub fn documentos(&self) -> impl Iterator<Item = &DoctoRelacionado> {
        self.pagos.iter().flat_map(|pago| pago.documentos.iter())
    }
}

impl Pago {
    fn from_node(node: &Node) -> Result<Self, ComplementError> {
        let attrs = Attributes::new(node, COMPLEMENT);
        Ok(Self {
            fecha_pago: attrs.required_datetime("FechaPago")?,
            forma_de_pago: attrs.required("FormaDePagoP")?,
            moneda: attrs.required("MonedaP")?,
            tipo_cambio: attrs.optional("TipoCambioP"),
            monto: attrs.required("Monto")?,
            num_operacion: attrs.optional("NumOperacion"),
            rfc_emisor_cta_ord: attrs.optional("RfcEmisorCtaOrd"),
            nom_banco_ord_ext: attrs.optional("NomBancoOrdExt"),
            cta_ordenante: attrs.optional("CtaOrdenante"),
            rfc_emisor_cta_ben: attrs.optional("RfcEmisorCtaBen"),
            cta_beneficiario: attrs.optional("CtaBeneficiario"),
            tipo_cad_pago: attrs.optional("TipoCadPago"),
            cert_pago: attrs.optional("CertPago"),
            cad_pago: attrs.optional("CadPago"),
            sello_pago: attrs.optional("SelloPago"),
            documentos: child_elements_named(node, "DoctoRelacionado")
                .iter()
                .map(DoctoRelacionado::from_node)
                .collect::<Result<Vec<_>, _>>()?,
            impuestos: child_elements_named(node, "Impuestos")
                .iter()
                .map(Impuestos::from_node)
                .collect::<Result<Vec<_>, _>>()?,
        })
    }
}

impl DoctoRelacionado {
    fn from_node(node: &Node) -> Result<Self, ComplementError> {
        let attrs = Attributes::new(node, COMPLEMENT);
        Ok(Self {
            id_documento: attrs.required("IdDocumento")?,
            serie: attrs.optional("Serie"),
            folio: attrs.optional("Folio"),
            moneda: attrs.required("MonedaDR")?,
            tipo_cambio: attrs.optional("TipoCambioDR"),
            metodo_de_pago: attrs.required("MetodoDePagoDR")?,
            num_parcialidad: attrs.optional_u32("NumParcialidad")?,
            imp_saldo_ant: attrs.optional("ImpSaldoAnt"),
            imp_pagado: attrs.optional("ImpPagado"),
            imp_saldo_insoluto: attrs.optional("ImpSaldoInsoluto"),
        })
    }
}

impl Impuestos {
    fn from_node(node: &Node) -> Result<Self, ComplementError> {
        let attrs = Attributes::new(node, COMPLEMENT);
        let mut impuestos = Impuestos {
            total_impuestos_retenidos: attrs.optional("TotalImpuestosRetenidos"),
            total_impuestos_trasladados: attrs.optional("TotalImpuestosTrasladados"),
            ..Default::default()
        };
        if let Some(retenciones) = first_child_named(node, "Retenciones") {
            for retencion in child_elements_named(&retenciones, "Retencion") {
                let attrs = Attributes::new(&retencion, COMPLEMENT);
                impuestos.retenciones.push(Retencion {
                    impuesto: attrs.required("Impuesto")?,
                    importe: attrs.required("Importe")?,
                });
            }
        }
        if let Some(traslados) = first_child_named(node, "Traslados") {
            for traslado in child_elements_named(&traslados, "Traslado") {
                let attrs = Attributes::new(&traslado, COMPLEMENT);
                impuestos.traslados.push(Traslado {
                    impuesto: attrs.required("Impuesto")?,
                    tipo_factor: attrs.required("TipoFactor")?,
                    tasa_o_cuota: attrs.required("TasaOCuota")?,
                    importe: attrs.required("Importe")?,
                });
            }
        }
        Ok(impuestos)
    }
}
