//! Nómina 1.2 (`http://www.sat.gob.mx/nomina12`).
use super::{Attributes, ComplementError};
use crate::xml::{child_elements_named, first_child_named};
use chrono::NaiveDate;
use libxml::tree::Node;

const COMPLEMENT: &str = "Nomina";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Nomina {
    pub version: String,
    pub tipo_nomina: String,
    pub fecha_pago: NaiveDate,
    pub fecha_inicial_pago: NaiveDate,
    pub fecha_final_pago: NaiveDate,
    pub num_dias_pagados: String,
    pub total_percepciones: Option<String>,
    pub total_deducciones: Option<String>,
    pub total_otros_pagos: Option<String>,
    pub emisor: Option<Emisor>,
    pub receptor: Receptor,
    pub percepciones: Option<Percepciones>,
    pub deducciones: Option<Deducciones>,
    pub otros_pagos: Vec<OtroPago>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Emisor {
    pub curp: Option<String>,
    pub registro_patronal: Option<String>,
    pub rfc_patron_origen: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receptor {
    pub curp: String,
    pub num_seguridad_social: Option<String>,
    pub fecha_inicio_rel_laboral: Option<NaiveDate>,
    pub antiguedad: Option<String>,
    pub tipo_contrato: String,
    pub sindicalizado: Option<String>,
    pub tipo_jornada: Option<String>,
    pub tipo_regimen: String,
    pub num_empleado: String,
    pub departamento: Option<String>,
    pub puesto: Option<String>,
    pub riesgo_puesto: Option<String>,
    pub periodicidad_pago: String,
    pub banco: Option<String>,
    pub cuenta_bancaria: Option<String>,
    pub salario_base_cot_apor: Option<String>,
    pub salario_diario_integrado: Option<String>,
    pub clave_ent_fed: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Percepciones {
    pub total_sueldos: Option<String>,
    pub total_separacion_indemnizacion: Option<String>,
    pub total_jubilacion_pension_retiro: Option<String>,
    pub total_gravado: String,
    pub total_exento: String,
    pub percepciones: Vec<Percepcion>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Percepcion {
    pub tipo_percepcion: String,
    pub clave: String,
    pub concepto: String,
    pub importe_gravado: String,
    pub importe_exento: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deducciones {
    pub total_otras_deducciones: Option<String>,
    pub total_impuestos_retenidos: Option<String>,
    pub deducciones: Vec<Deduccion>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deduccion {
    pub tipo_deduccion: String,
    pub clave: String,
    pub concepto: String,
    pub importe: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtroPago {
    pub tipo_otro_pago: String,
    pub clave: String,
    pub concepto: String,
    pub importe: String,
    pub subsidio_causado: Option<String>,
}

impl Nomina {
    pub(crate) fn from_node(node: &Node) -> Result<Self, ComplementError> {
        let attrs = Attributes::new(node, COMPLEMENT);
        let receptor = first_child_named(node, "Receptor").ok_or(
            ComplementError::MissingElement {
                complement: COMPLEMENT,
                element: "Receptor",
            },
        )?;
        let otros_pagos = match first_child_named(node, "OtrosPagos") {
            Some(container) => child_elements_named(&container, "OtroPago")
                .iter()
                .map(OtroPago::from_node)
                .collect::<Result<Vec<_>, _>>()?,
            None => Vec::new(),
        };
        Ok(Self {
            version: attrs.required("Version")?,
            tipo_nomina: attrs.required("TipoNomina")?,
            fecha_pago: attrs.required_date("FechaPago")?,
            fecha_inicial_pago: attrs.required_date("FechaInicialPago")?,
            fecha_final_pago: attrs.required_date("FechaFinalPago")?,
            num_dias_pagados: attrs.required("NumDiasPagados")?,
            total_percepciones: attrs.optional("TotalPercepciones"),
            total_deducciones: attrs.optional("TotalDeducciones"),
            total_otros_pagos: attrs.optional("TotalOtrosPagos"),
            emisor: first_child_named(node, "Emisor").map(|emisor| Emisor::from_node(&emisor)),
            receptor: Receptor::from_node(&receptor)?,
            percepciones: first_child_named(node, "Percepciones")
                .map(|container| Percepciones::from_node(&container))
                .transpose()?,
            deducciones: first_child_named(node, "Deducciones")
                .map(|container| Deducciones::from_node(&container))
                .transpose()?,
            otros_pagos,
        })
    }
}

impl Emisor {
    fn from_node(node: &Node) -> Self {
        let attrs = Attributes::new(node, COMPLEMENT);
        Self {
            curp: attrs.optional("Curp"),
            registro_patronal: attrs.optional("RegistroPatronal"),
            rfc_patron_origen: attrs.optional("RfcPatronOrigen"),
        }
    }
}

impl Receptor {
    fn from_node(node: &Node) -> Result<Self, ComplementError> {
        let attrs = Attributes::new(node, COMPLEMENT);
        Ok(Self {
            curp: attrs.required("Curp")?,
            num_seguridad_social: attrs.optional("NumSeguridadSocial"),
            fecha_inicio_rel_laboral: attrs.optional_date("FechaInicioRelLaboral")?,
            antiguedad: attrs.optional("Antigüedad"),
            tipo_contrato: attrs.required("TipoContrato")?,
            sindicalizado: attrs.optional("Sindicalizado"),
            tipo_jornada: attrs.optional("TipoJornada"),
            tipo_regimen: attrs.required("TipoRegimen")?,
            num_empleado: attrs.required("NumEmpleado")?,
            departamento: attrs.optional("Departamento"),
            puesto: attrs.optional("Puesto"),
            riesgo_puesto: attrs.optional("RiesgoPuesto"),
            periodicidad_pago: attrs.required("PeriodicidadPago")?,
            banco: attrs.optional("Banco"),
            cuenta_bancaria: attrs.optional("CuentaBancaria"),
            salario_base_cot_apor: attrs.optional("SalarioBaseCotApor"),
            salario_diario_integrado: attrs.optional("SalarioDiarioIntegrado"),
            clave_ent_fed: attrs.required("ClaveEntFed")?,
        })
    }
}

impl Percepciones {
    fn from_node(node: &Node) -> Result<Self, ComplementError> {
        let attrs = Attributes::new(node, COMPLEMENT);
        let mut percepciones = Vec::new();
        for percepcion in child_elements_named(node, "Percepcion") {
            let attrs = Attributes::new(&percepcion, COMPLEMENT);
            percepciones.push(Percepcion {
                tipo_percepcion: attrs.required("TipoPercepcion")?,
                clave: attrs.required("Clave")?,
                concepto: attrs.required("Concepto")?,
                importe_gravado: attrs.required("ImporteGravado")?,
                importe_exento: attrs.required("ImporteExento")?,
            });
        }
        Ok(Self {
            total_sueldos: attrs.optional("TotalSueldos"),
            total_separacion_indemnizacion: attrs.optional("TotalSeparacionIndemnizacion"),
            total_jubilacion_pension_retiro: attrs.optional("TotalJubilacionPensionRetiro"),
            total_gravado: attrs.required("TotalGravado")?,
            total_exento: attrs.required("TotalExento")?,
            percepciones,
        })
    }
}

impl Deducciones {
    fn from_node(node: &Node) -> Result<Self, ComplementError> {
        let attrs = Attributes::new(node, COMPLEMENT);
        let mut deducciones = Vec::new();
        for deduccion in child_elements_named(node, "Deduccion") {
            let attrs = Attributes::new(&deduccion, COMPLEMENT);
            deducciones.push(Deduccion {
                tipo_deduccion: attrs.required("TipoDeduccion")?,
                clave: attrs.required("Clave")?,
                concepto: attrs.required("Concepto")?,
                importe: attrs.required("Importe")?,
            });
        }
        Ok(Self {
            total_otras_deducciones: attrs.optional("TotalOtrasDeducciones"),
            total_impuestos_retenidos: attrs.optional("TotalImpuestosRetenidos"),
            deducciones,
        })
    }
}

impl OtroPago {
    fn from_node(node: &Node) -> Result<Self, ComplementError> {
        let attrs = Attributes::new(node, COMPLEMENT);
        let subsidio_causado = first_child_named(node, "SubsidioAlEmpleo")
            .and_then(|subsidio| Attributes::new(&subsidio, COMPLEMENT).optional("SubsidioCausado"));
        Ok(Self {
            tipo_otro_pago: attrs.required("TipoOtroPago")?,
            clave: attrs.required("Clave")?,
            concepto: attrs.required("Concepto")?,
            importe: attrs.required("Importe")?,
            subsidio_causado,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::parse_document;

    const NOMINA: &str = r#"<nomina12:Nomina xmlns:nomina12="http://www.sat.gob.mx/nomina12" Version="1.2" TipoNomina="O" FechaPago="2021-03-15" FechaInicialPago="2021-03-01" FechaFinalPago="2021-03-15" NumDiasPagados="15.000" TotalPercepciones="7500.00" TotalDeducciones="850.00" TotalOtrosPagos="0.00">
        <nomina12:Emisor RegistroPatronal="B5510768108"/>
        <nomina12:Receptor Curp="XIQB891116MGRMZR05" NumSeguridadSocial="12345678901" FechaInicioRelLaboral="2015-01-01" Antigüedad="P322W" TipoContrato="01" TipoRegimen="02" NumEmpleado="120" PeriodicidadPago="04" ClaveEntFed="JAL"/>
        <nomina12:Percepciones TotalSueldos="7500.00" TotalGravado="7500.00" TotalExento="0.00">
            <nomina12:Percepcion TipoPercepcion="001" Clave="00500" Concepto="Sueldos, Salarios Rayas y Jornales" ImporteGravado="7500.00" ImporteExento="0.00"/>
        </nomina12:Percepciones>
        <nomina12:Deducciones TotalImpuestosRetenidos="850.00">
            <nomina12:Deduccion TipoDeduccion="002" Clave="00301" Concepto="ISR" Importe="850.00"/>
        </nomina12:Deducciones>
        <nomina12:OtrosPagos>
            <nomina12:OtroPago TipoOtroPago="002" Clave="00002" Concepto="Subsidio para el empleo" Importe="0.00">
                <nomina12:SubsidioAlEmpleo SubsidioCausado="0.00"/>
            </nomina12:OtroPago>
        </nomina12:OtrosPagos>
    </nomina12:Nomina>"#;

    #[test]
    fn parses_payroll() {
        let doc = parse_document(NOMINA).expect("parse");
        let root = doc.get_root_element().expect("root");
        let nomina = Nomina::from_node(&root).expect("nomina");

        assert_eq!(nomina.tipo_nomina, "O");
        assert_eq!(nomina.fecha_pago, NaiveDate::from_ymd_opt(2021, 3, 15).expect("date"));
        assert_eq!(nomina.receptor.antiguedad.as_deref(), Some("P322W"));
        assert_eq!(nomina.receptor.clave_ent_fed, "JAL");
        assert_eq!(
            nomina.emisor.and_then(|e| e.registro_patronal).as_deref(),
            Some("B5510768108")
        );
        let percepciones = nomina.percepciones.expect("percepciones");
        assert_eq!(percepciones.percepciones.len(), 1);
        assert_eq!(
            nomina.deducciones.expect("deducciones").deducciones[0].concepto,
            "ISR"
        );
        assert_eq!(nomina.otros_pagos[0].subsidio_causado.as_deref(), Some("0.00"));
    }

    #[test]
    fn receptor_is_required() {
        let doc = parse_document(
            r#"<nomina12:Nomina xmlns:nomina12="http://www.sat.gob.mx/nomina12" Version="1.2" TipoNomina="O" FechaPago="2021-03-15" FechaInicialPago="2021-03-01" FechaFinalPago="2021-03-15" NumDiasPagados="15"/>"#,
        )
        .expect("parse");
        let root = doc.get_root_element().expect("root");
        assert!(matches!(
            Nomina::from_node(&root),
            Err(ComplementError::MissingElement {
                element: "Receptor",
                ..
            })
        ));
    }
}
