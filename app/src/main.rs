use std::process::ExitCode;

fn main() -> ExitCode {
    speechbatch_lib::run()
}
