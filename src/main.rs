use std::process::ExitCode;

use triangle::app;
use triangle::config::Config;
use triangle::logger::Logger;
use triangle::platform::X11Egl;

fn main() -> ExitCode {
    Logger::init();

    match app::run(&X11Egl, &Config::default()) {
        Ok(reason) => {
            log::info!("exiting ({reason})");
            ExitCode::SUCCESS
        }
        Err(err) => {
            log::error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}
