use mesh_geom::app::{run, Grid2GridArgs};
use std::process::ExitCode;

fn main() -> ExitCode {
    env_logger::init();

    let args = match Grid2GridArgs::parse(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::from(2);
        }
    };
    match run(&args) {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err}");
            eprintln!("grid2grid: {err}");
            ExitCode::FAILURE
        }
    }
}
