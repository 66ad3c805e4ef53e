//! Builders for the portal pages the workflows read.

use std::fmt::Write;

/// One row of a search result table.
#[derive(Debug, Clone, Default)]
pub struct ResultRow {
    /// Folio fiscal as shown by the portal.
    pub uuid: String,
    /// Issuer RFC.
    pub rfc_emisor: String,
    /// Issuer name.
    pub nombre_emisor: String,
    /// Receiver RFC.
    pub rfc_receptor: String,
    /// Issue date.
    pub fecha_emision: String,
    /// Total amount.
    pub total: String,
    /// Voucher state.
    pub estado_comprobante: String,
    /// Relative XML download link.
    pub xml_link: Option<String>,
    /// Relative PDF download link.
    pub pdf_link: Option<String>,
}

impl ResultRow {
    /// Creates a row with plausible values and both download links.
    #[must_use]
    pub fn new(uuid: impl Into<String>) -> Self {
        let uuid = uuid.into();
        Self {
            xml_link: Some(format!("RecuperaCfdi.aspx?Datos={uuid}")),
            pdf_link: Some(format!("RepresentacionImpresa.aspx?Datos={uuid}")),
            uuid,
            rfc_emisor: "AAA010101AAA".into(),
            nombre_emisor: "Empresa  Emisora\n SA de CV".into(),
            rfc_receptor: "BBB010101BBB".into(),
            fecha_emision: "2024-01-15T10:20:30".into(),
            total: "$1,160.00".into(),
            estado_comprobante: "Vigente".into(),
        }
    }

    /// Removes the XML download button.
    #[must_use]
    pub fn without_xml(mut self) -> Self {
        self.xml_link = None;
        self
    }

    /// Removes the PDF download button.
    #[must_use]
    pub fn without_pdf(mut self) -> Self {
        self.pdf_link = None;
        self
    }
}

const RESULT_HEADERS: [&str; 8] = [
    "Acciones",
    "Folio Fiscal",
    "RFC Emisor",
    "Nombre o Razón Social del Emisor",
    "RFC Receptor",
    "Fecha de Emisión",
    "Total",
    "Estado del Comprobante",
];

/// Builds the search page with the main form and the given hidden state.
#[must_use]
pub fn search_form_page(view_state: &str) -> String {
    format!(
        r#"<html><head><meta http-equiv="Content-Type" content="text/html; charset=utf-16"></head>
<body><form name="aspnetForm" method="post" id="aspnetForm">
<input type="hidden" name="__VIEWSTATE" id="__VIEWSTATE" value="{view_state}" />
<input type="hidden" name="__EVENTVALIDATION" id="__EVENTVALIDATION" value="ev-{view_state}" />
<input type="hidden" name="__VIEWSTATEGENERATOR" value="A1B2C3D4" />
<input type="checkbox" name="seleccionador" checked="checked" />
<input type="text" name="ctl00$MainContent$TxtUUID" value="" />
<input type="radio" name="ctl00$MainContent$FiltroCentral" value="RdoFolioFiscal" checked="checked" />
<input type="radio" name="ctl00$MainContent$FiltroCentral" value="RdoFechas" />
</form></body></html>"#
    )
}

/// Formats one partial-postback record.
#[must_use]
pub fn delta_record(kind: &str, id: &str, content: &str) -> String {
    format!("{}|{kind}|{id}|{content}|", content.encode_utf16().count())
}

/// Builds the certificate challenge page. `token_field` is the name of the
/// token input; `None` leaves the token out entirely.
#[must_use]
pub fn challenge_page(token_field: Option<&str>, token: &str) -> String {
    let token_input = match token_field {
        Some("") => format!(r#"<input type="hidden" value="{token}" />"#),
        Some(name) => format!(r#"<input type="hidden" name="{name}" value="{token}" />"#),
        None => String::new(),
    };
    format!(
        r#"<html><body><form id="certform" method="post">{token_input}
<input type="hidden" name="ks" value="null" /></form></body></html>"#
    )
}

/// Builds a search response holding the result table with `rows`.
#[must_use]
pub fn results_page(rows: &[ResultRow]) -> String {
    let mut html = String::from(
        r#"<html><body><div id="ctl00_MainContent_PnlResultados"><table id="ctl00_MainContent_tblResult"><tr>"#,
    );
    for header in RESULT_HEADERS {
        let _ = write!(html, "<th><span>{header}</span></th>");
    }
    html.push_str("</tr>");

    for row in rows {
        html.push_str("<tr><td><div>");
        if let Some(ref link) = row.xml_link {
            let _ = write!(
                html,
                r#"<span id="BtnDescarga" onclick="return AccionCfdi('{link}','Recuperacion');"></span>"#
            );
        }
        if let Some(ref link) = row.pdf_link {
            let _ = write!(
                html,
                r#"<span id="BtnRI" onclick="recuperaRepresentacionImpresa('{link}');"></span>"#
            );
        }
        html.push_str("</div></td>");
        for value in [
            &row.uuid,
            &row.rfc_emisor,
            &row.nombre_emisor,
            &row.rfc_receptor,
            &row.fecha_emision,
            &row.total,
            &row.estado_comprobante,
        ] {
            let _ = write!(html, "<td><span>{value}</span></td>");
        }
        html.push_str("</tr>");
    }

    html.push_str("</table></div></body></html>");
    html
}
