//! Fixed portal endpoints.
//!
//! These are protocol constants of the portal, not configuration.

/// Host of the authentication service.
pub const SAT_HOST_CFDI_AUTH: &str = "https://cfdiau.sat.gob.mx";

/// Host of the CFDI portal.
pub const SAT_HOST_PORTAL_CFDI: &str = "https://portalcfdi.facturaelectronica.sat.gob.mx";

/// Portal home page.
pub const SAT_URL_PORTAL_CFDI: &str = "https://portalcfdi.facturaelectronica.sat.gob.mx/";

/// Password (CIEC) login entry point.
pub const SAT_URL_CIEC_LOGIN: &str =
    "https://cfdiau.sat.gob.mx/nidp/wsfed/ep?id=SATUPCFDiCon&sid=0&option=credential&sid=0";

/// Certificate (FIEL) login entry point.
pub const SAT_URL_FIEL_LOGIN: &str =
    "https://cfdiau.sat.gob.mx/nidp/app/login?id=SATx509Custom&sid=0&option=credential&sid=0";

/// Applet URL echoed back in the certificate login form.
pub const SAT_URL_FIEL_APPLET: &str = "https://cfdiau.sat.gob.mx/nidp/app/login?id=SATx509Custom";

/// Search page for issued documents.
pub const SAT_URL_PORTAL_CFDI_CONSULTA_EMISOR: &str =
    "https://portalcfdi.facturaelectronica.sat.gob.mx/ConsultaEmisor.aspx";

/// Search page for received documents.
pub const SAT_URL_PORTAL_CFDI_CONSULTA_RECEPTOR: &str =
    "https://portalcfdi.facturaelectronica.sat.gob.mx/ConsultaReceptor.aspx";

/// Hosts whose cookies make up a portal session.
pub const COOKIE_HOSTS: [&str; 2] = [SAT_URL_PORTAL_CFDI, "https://cfdiau.sat.gob.mx/"];
