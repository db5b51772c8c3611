//! Native application packager.
//!
//! Builds application images and installers (.deb, .rpm, .app, .dmg, .pkg,
//! .exe) from prepared application files by driving the packaging tools of
//! the host platform.

use app_packager::cli;
use std::process;

#[tokio::main]
async fn main() {
    let exit_code = match cli::run().await {
        Ok(code) => code,
        Err(e) => {
            let output = cli::OutputManager::new(false, false);
            let message = match e.advice() {
                Some(advice) => format!("{e}\n  Advice to fix: {advice}"),
                None => e.to_string(),
            };
            let _ = output.error(&message);
            1
        }
    };

    process::exit(exit_code);
}
