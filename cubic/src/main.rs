use std::{env, path::PathBuf};

use cubic::HeadlessDriver;
use cubic_core::config::WorldConfig;

const DEFAULT_CONFIG_PATH: &str = "cubic_config.json5";

fn main() -> anyhow::Result<()> {
    cubic::logger::init("info")?;

    let config_path = env::args_os()
        .nth(1)
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);
    let config = WorldConfig::load_or_create(&config_path)?;

    let mut driver = HeadlessDriver::new(config)?;
    driver.load_view()?;
    driver.run();
    driver.shutdown()?;

    Ok(())
}
