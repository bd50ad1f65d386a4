use crate::config::generate::generate_starter_config;
use std::fs;
use std::path::PathBuf;

pub fn init(stdout: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config_content = generate_starter_config();

    if stdout {
        print!("{}", config_content);
        return Ok(());
    }

    // Try to write to ~/.config/streamgate/config.yml first
    let config_path = if let Some(home_dir) = dirs::home_dir() {
        let user_config = home_dir.join(".config/streamgate/config.yml");

        if let Some(parent) = user_config.parent() {
            match fs::create_dir_all(parent) {
                Ok(_) => Some(user_config),
                Err(_) => {
                    eprintln!("Warning: Could not create directory {}", parent.display());
                    eprintln!("Falling back to /etc/streamgate/config.yml");
                    None
                }
            }
        } else {
            None
        }
    } else {
        None
    };

    let config_path = config_path.unwrap_or_else(|| PathBuf::from("/etc/streamgate/config.yml"));

    if config_path.exists() {
        eprintln!(
            "Error: Config file already exists at {}",
            config_path.display()
        );
        eprintln!("Remove it first or use --stdout to print the config");
        std::process::exit(1);
    }

    if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent)?;
    }

    fs::write(&config_path, config_content)?;

    println!("Config file written to {}", config_path.display());
    Ok(())
}
