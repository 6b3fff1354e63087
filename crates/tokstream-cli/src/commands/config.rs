use anyhow::Result;
use colored::Colorize;
use tokstream_infrastructure::{AppConfig, ConfigService};

/// Prints the config file location and the effective configuration.
pub fn run(service: &ConfigService, config: &AppConfig, init: bool) -> Result<()> {
    let path = service.path().display();
    if init {
        if service.ensure_file()? {
            eprintln!("{}", format!("Created {path}").bright_green());
        } else {
            eprintln!("{}", format!("{path} already exists").bright_black());
        }
    }

    println!("# {path}");
    print!("{}", toml::to_string_pretty(config)?);
    Ok(())
}
