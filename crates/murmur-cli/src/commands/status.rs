//! `murmur status` -- show configuration status and diagnostics.
//!
//! Reports where configuration came from, the dispatch thresholds, which
//! domains are registered and whether their programs are on `PATH`, and
//! whether the speech model and hue credential are present.
//!
//! # Example
//!
//! ```text
//! murmur status
//! ```

use comfy_table::{Table, presets::UTF8_FULL};

use murmur_core::Domain;
use murmur_platform::config_loader::CONFIG_ENV_VAR;
use murmur_platform::{NativePlatform, Platform};
use murmur_types::config::Config;

use super::{discover_config_path, load_config};

/// Run the status command.
pub async fn run(config_override: Option<&str>) -> anyhow::Result<()> {
    let platform = NativePlatform::new();

    println!("murmur status");
    println!("=============");
    println!();

    let config_path = discover_config_path(&platform, config_override);
    let found = match &config_path {
        Some(path) => platform.fs().exists(path).await,
        None => false,
    };
    match config_path {
        Some(ref path) if found => {
            println!("Config: {}", path.display());
        }
        _ => {
            println!("Config: not found");
            println!("  Searched: ~/.murmur/config.json");
            println!("  Set {CONFIG_ENV_VAR} env var to override");
            println!();
            println!("Using defaults:");
        }
    }

    let config = load_config(&platform, config_override).await?;

    println!();
    println!("Dispatch:");
    println!("  Threshold:            {}", config.dispatch.threshold);
    println!("  Diagnostic threshold: {}", config.dispatch.diagnostic_threshold);
    println!(
        "  Case sensitive:       {}",
        yes_no(!config.dispatch.case_insensitive)
    );
    println!(
        "  Partial results:      {}",
        yes_no(config.dispatch.partial_results)
    );
    match config.dispatch.process_timeout_secs {
        Some(secs) => println!("  Process timeout:      {secs}s"),
        None => println!("  Process timeout:      none"),
    }

    println!();
    println!("{}", domain_table(&config));

    println!();
    let model = &config.voice.stt.model_path;
    println!(
        "Speech model: {} ({})",
        model.display(),
        present(platform.fs().is_dir(model).await)
    );
    let credential = config.hue.pairing_path();
    println!(
        "Hue credential: {} ({})",
        credential.display(),
        present(platform.fs().exists(&credential).await)
    );
    println!(
        "Microphone support: {}",
        if cfg!(feature = "microphone") {
            "compiled in"
        } else {
            "not compiled in (use `listen --stdin`)"
        }
    );

    Ok(())
}

fn domain_table(config: &Config) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(["DOMAIN", "ENABLED", "KEYWORDS", "PROGRAM", "ON PATH"]);
    for domain in Domain::ALL {
        let program = domain.program(config);
        table.add_row([
            domain.name().to_string(),
            yes_no(domain.enabled(config)).to_string(),
            domain.aliases(config).join(", "),
            program.to_string(),
            yes_no(which::which(program).is_ok()).to_string(),
        ]);
    }
    table
}

fn yes_no(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}

fn present(value: bool) -> &'static str {
    if value { "present" } else { "missing" }
}
