//! Fixture builders shared by unit tests.

use std::sync::Once;

static INIT: Once = Once::new();

pub fn init_logging() {
    INIT.call_once(|| {
        let _ = env_logger::builder().is_test(true).try_init();
    });
}

/// One `DettaglioLinee` block.
#[derive(Debug, Clone)]
pub struct LineFixture {
    pub description: Option<String>,
    pub total: String,
    pub vat: String,
}

impl LineFixture {
    pub fn new(description: &str, total: &str) -> Self {
        Self {
            description: Some(description.to_string()),
            total: total.to_string(),
            vat: "22.00".to_string(),
        }
    }

    pub fn without_description(total: &str) -> Self {
        Self {
            description: None,
            total: total.to_string(),
            vat: "22.00".to_string(),
        }
    }
}

/// One `DatiRiepilogo` block.
#[derive(Debug, Clone)]
pub struct SummaryFixture {
    pub vat: String,
    pub taxable: String,
    pub tax: String,
}

impl SummaryFixture {
    pub fn new(vat: &str, taxable: &str, tax: &str) -> Self {
        Self {
            vat: vat.to_string(),
            taxable: taxable.to_string(),
            tax: tax.to_string(),
        }
    }
}

/// Minimal but realistic FPR12 invoice.
#[derive(Debug, Clone)]
pub struct InvoiceFixture {
    pub number: String,
    pub date: String,
    pub seller: String,
    pub lines: Vec<LineFixture>,
    pub summaries: Vec<SummaryFixture>,
}

impl InvoiceFixture {
    pub fn new(number: &str) -> Self {
        Self {
            number: number.to_string(),
            date: "2024-03-15".to_string(),
            seller: "ACME S.r.l.".to_string(),
            lines: Vec::new(),
            summaries: vec![SummaryFixture::new("22.00", "100.00", "22.00")],
        }
    }

    pub fn line(mut self, line: LineFixture) -> Self {
        self.lines.push(line);
        self
    }

    pub fn summaries(mut self, summaries: Vec<SummaryFixture>) -> Self {
        self.summaries = summaries;
        self
    }

    pub fn xml(&self) -> String {
        let mut lines = String::new();
        for (i, line) in self.lines.iter().enumerate() {
            lines.push_str("      <DettaglioLinee>\n");
            lines.push_str(&format!("        <NumeroLinea>{}</NumeroLinea>\n", i + 1));
            if let Some(description) = &line.description {
                lines.push_str(&format!("        <Descrizione>{}</Descrizione>\n", description));
            }
            lines.push_str(&format!(
                "        <PrezzoTotale>{}</PrezzoTotale>\n        <AliquotaIVA>{}</AliquotaIVA>\n",
                line.total, line.vat
            ));
            lines.push_str("      </DettaglioLinee>\n");
        }
        let mut summaries = String::new();
        for s in &self.summaries {
            summaries.push_str(&format!(
                "      <DatiRiepilogo>\n        <AliquotaIVA>{}</AliquotaIVA>\n        <ImponibileImporto>{}</ImponibileImporto>\n        <Imposta>{}</Imposta>\n        <EsigibilitaIVA>I</EsigibilitaIVA>\n      </DatiRiepilogo>\n",
                s.vat, s.taxable, s.tax
            ));
        }
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<p:FatturaElettronica versione="FPR12" xmlns:p="http://ivaservizi.agenziaentrate.gov.it/docs/xsd/fatture/v1.2">
  <FatturaElettronicaHeader>
    <DatiTrasmissione>
      <IdTrasmittente><IdPaese>IT</IdPaese><IdCodice>01234567890</IdCodice></IdTrasmittente>
      <ProgressivoInvio>00001</ProgressivoInvio>
      <FormatoTrasmissione>FPR12</FormatoTrasmissione>
      <CodiceDestinatario>0000000</CodiceDestinatario>
    </DatiTrasmissione>
    <CedentePrestatore>
      <DatiAnagrafici>
        <IdFiscaleIVA><IdPaese>IT</IdPaese><IdCodice>01234567890</IdCodice></IdFiscaleIVA>
        <Anagrafica><Denominazione>{seller}</Denominazione></Anagrafica>
        <RegimeFiscale>RF01</RegimeFiscale>
      </DatiAnagrafici>
      <Sede>
        <Indirizzo>Via Roma</Indirizzo>
        <NumeroCivico>1</NumeroCivico>
        <CAP>00100</CAP>
        <Comune>Roma</Comune>
        <Nazione>IT</Nazione>
      </Sede>
    </CedentePrestatore>
    <CessionarioCommittente>
      <DatiAnagrafici>
        <CodiceFiscale>RSSMRA80A01H501U</CodiceFiscale>
        <Anagrafica><Nome>Mario</Nome><Cognome>Rossi</Cognome></Anagrafica>
      </DatiAnagrafici>
    </CessionarioCommittente>
  </FatturaElettronicaHeader>
  <FatturaElettronicaBody>
    <DatiGenerali>
      <DatiGeneraliDocumento>
        <TipoDocumento>TD01</TipoDocumento>
        <Divisa>EUR</Divisa>
        <Data>{date}</Data>
        <Numero>{number}</Numero>
        <ImportoTotaleDocumento>122.00</ImportoTotaleDocumento>
      </DatiGeneraliDocumento>
    </DatiGenerali>
    <DatiBeniServizi>
{lines}{summaries}    </DatiBeniServizi>
  </FatturaElettronicaBody>
</p:FatturaElettronica>
"#,
            seller = self.seller,
            date = self.date,
            number = self.number,
            lines = lines,
            summaries = summaries,
        )
    }
}

/// Write a ZIP at `path` holding `(name, content)` entries.
pub fn zip_fixture(path: &std::path::Path, entries: &[(&str, String)]) {
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    let mut writer = zip::ZipWriter::new(std::fs::File::create(path).unwrap());
    for (name, content) in entries {
        writer
            .start_file(name.to_string(), SimpleFileOptions::default())
            .unwrap();
        writer.write_all(content.as_bytes()).unwrap();
    }
    writer.finish().unwrap();
}
