use std::process::ExitCode;

fn main() -> ExitCode {
    match closure_cli::main_entry() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err:#}");
            ExitCode::from(closure_cli::exit_status_for(&err))
        }
    }
}
