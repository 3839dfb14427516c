use std::process::ExitCode;

fn main() -> ExitCode {
    spectral_lib::run()
}
