use cfdi_core::chain::ChainBuilder;
use cfdi_core::config::Config;
use cfdi_core::keys::{self, Certificate, PrivateKey};
use std::path::{Path, PathBuf};

pub const PASSPHRASE: &str = "12345678a";

#[allow(dead_code)]
pub const PAGO_UUID: &str = "970E4F32-0F14-4F9F-9A1A-2B8B7C7D1E01";

#[allow(dead_code)]
pub fn fixture_path(relative: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(relative)
}

#[allow(dead_code)]
pub fn read_fixture(relative: &str) -> Vec<u8> {
    let path = fixture_path(relative);
    std::fs::read(&path).unwrap_or_else(|e| panic!("read {}: {e}", path.display()))
}

#[allow(dead_code)]
pub fn read_fixture_string(relative: &str) -> String {
    String::from_utf8(read_fixture(relative)).expect("fixture utf-8")
}

#[allow(dead_code)]
pub fn certificate(holder: &str) -> Certificate {
    keys::load_certificate(&read_fixture(&format!("certificados/{holder}/certificado.cer")))
        .expect("load certificate")
}

#[allow(dead_code)]
pub fn private_key(holder: &str) -> PrivateKey {
    keys::load_private_key(
        &read_fixture(&format!("certificados/{holder}/llave_privada.key")),
        PASSPHRASE,
    )
    .expect("load private key")
}

#[allow(dead_code)]
pub fn moral_pair() -> (Certificate, PrivateKey) {
    (certificate("persona_moral"), private_key("persona_moral"))
}

#[allow(dead_code)]
pub fn fisica_pair() -> (Certificate, PrivateKey) {
    (certificate("persona_fisica"), private_key("persona_fisica"))
}

#[allow(dead_code)]
pub fn chain_builder() -> ChainBuilder {
    ChainBuilder::new(Config::new(fixture_path("stylesheets")))
}

#[allow(dead_code)]
pub fn expected_pago_chain() -> String {
    format!(
        "||3.3|A|123|2021-03-01T12:00:00|30001000000400002429|0|XXX|0|P|45079\
         |EKU9003173C9|ESCUELA KEMPER URGATE SA DE CV|601\
         |XIQB891116QE4|BERENICE IBARRA QUINTANA|P01\
         |84111506|1|ACT|Pago|0|0\
         |1.0|2021-03-01T12:00:00|03|MXN|1160.00\
         |{PAGO_UUID}|F|99|MXN|PPD|1|1160.00|1160.00|0.00||"
    )
}
