use std::path::Path;

use crate::cli::commands::InitArgs;
use crate::io::config_io;

pub fn cmd_init(args: InitArgs, data_dir: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let path = config_io::write_default_config(data_dir, args.force)?;
    let config = config_io::read_config(data_dir)?;
    println!("Wrote {}", path.display());
    println!(
        "Set ${} before running `tw generate` or `tw adjust`.",
        config.ai.api_key_env
    );
    Ok(())
}
