use std::process::ExitCode;

fn main() -> ExitCode {
    match fattura_xml_lib::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
