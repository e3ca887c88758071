#![allow(dead_code)]

use std::io::Write;
use std::path::Path;
use zip::write::SimpleFileOptions;

/// Minimal invoice with one `DettaglioLinee` block per description.
pub fn invoice_xml(number: &str, descriptions: &[&str]) -> String {
    let lines: String = descriptions
        .iter()
        .enumerate()
        .map(|(i, d)| {
            format!(
                "<DettaglioLinee><NumeroLinea>{}</NumeroLinea><Descrizione>{}</Descrizione><PrezzoTotale>{}.00</PrezzoTotale></DettaglioLinee>",
                i + 1,
                d,
                (i + 1) * 10
            )
        })
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<p:FatturaElettronica versione="FPR12" xmlns:p="http://ivaservizi.agenziaentrate.gov.it/docs/xsd/fatture/v1.2">
<FatturaElettronicaHeader><CedentePrestatore><DatiAnagrafici><Anagrafica><Denominazione>ACME S.r.l.</Denominazione></Anagrafica></DatiAnagrafici></CedentePrestatore></FatturaElettronicaHeader>
<FatturaElettronicaBody>
<DatiGenerali><DatiGeneraliDocumento><TipoDocumento>TD01</TipoDocumento><Data>2024-05-02</Data><Numero>{number}</Numero></DatiGeneraliDocumento></DatiGenerali>
<DatiBeniServizi>{lines}<DatiRiepilogo><AliquotaIVA>22.00</AliquotaIVA><Imposta>6.60</Imposta></DatiRiepilogo></DatiBeniServizi>
</FatturaElettronicaBody>
</p:FatturaElettronica>
"#
    )
}

pub fn write_zip(path: &Path, entries: &[(&str, &str)]) {
    let mut writer = zip::ZipWriter::new(std::fs::File::create(path).unwrap());
    for (name, content) in entries {
        writer
            .start_file(name.to_string(), SimpleFileOptions::default())
            .unwrap();
        writer.write_all(content.as_bytes()).unwrap();
    }
    writer.finish().unwrap();
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
