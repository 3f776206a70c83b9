pub(crate) const CFDI33_NS: &str = "http://www.sat.gob.mx/cfd/3";
pub(crate) const CFDI40_NS: &str = "http://www.sat.gob.mx/cfd/4";
pub(crate) const TFD_NS: &str = "http://www.sat.gob.mx/TimbreFiscalDigital";
pub(crate) const PAGOS10_NS: &str = "http://www.sat.gob.mx/Pagos";
pub(crate) const NOMINA12_NS: &str = "http://www.sat.gob.mx/nomina12";

pub(crate) const CFDI33_STYLESHEET_URL: &str =
    "http://www.sat.gob.mx/sitio_internet/cfd/3/cadenaoriginal_3_3/cadenaoriginal_3_3.xslt";
pub(crate) const CFDI40_STYLESHEET_URL: &str =
    "http://www.sat.gob.mx/sitio_internet/cfd/4/cadenaoriginal_4_0/cadenaoriginal_4_0.xslt";
pub(crate) const TFD11_STYLESHEET_URL: &str =
    "http://www.sat.gob.mx/sitio_internet/cfd/TimbreFiscalDigital/cadenaoriginal_TFD_1_1.xslt";

pub(crate) const DS_NS: &str = "http://www.w3.org/2000/09/xmldsig#";
pub(crate) const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";
pub(crate) const C14N_ALGORITHM: &str = "http://www.w3.org/TR/2001/REC-xml-c14n-20010315";
pub(crate) const ENVELOPED_SIGNATURE_TRANSFORM: &str =
    "http://www.w3.org/2000/09/xmldsig#enveloped-signature";

pub(crate) const SHA1_DIGEST_METHOD: &str = "http://www.w3.org/2000/09/xmldsig#sha1";
pub(crate) const SHA256_DIGEST_METHOD: &str = "http://www.w3.org/2001/04/xmlenc#sha256";
pub(crate) const SHA384_DIGEST_METHOD: &str = "http://www.w3.org/2001/04/xmldsig-more#sha384";
pub(crate) const SHA512_DIGEST_METHOD: &str = "http://www.w3.org/2001/04/xmlenc#sha512";

pub(crate) const RSA_SHA1_SIGNATURE_METHOD: &str = "http://www.w3.org/2000/09/xmldsig#rsa-sha1";
pub(crate) const RSA_SHA256_SIGNATURE_METHOD: &str =
    "http://www.w3.org/2001/04/xmldsig-more#rsa-sha256";
pub(crate) const RSA_SHA384_SIGNATURE_METHOD: &str =
    "http://www.w3.org/2001/04/xmldsig-more#rsa-sha384";
pub(crate) const RSA_SHA512_SIGNATURE_METHOD: &str =
    "http://www.w3.org/2001/04/xmldsig-more#rsa-sha512";
