use std::fs;

use crate::cli::commands::InitArgs;
use crate::cli::handlers::Context;
use crate::io::settings_io;
use crate::model::paths::INBOX_FILE;
use crate::model::settings::is_valid_base_dir;

const INBOX_TEMPLATE: &str = "## Inbox\n";

pub fn cmd_init(ctx: &Context, args: InitArgs) -> Result<(), Box<dyn std::error::Error>> {
    let dir = match &ctx.vault_dir {
        Some(dir) => dir.clone(),
        None => std::env::current_dir()?,
    };

    if !is_valid_base_dir(&args.base_dir) {
        return Err(format!(
            "invalid base dir \"{}\": use a single folder name without '/', '\\' or ':'",
            args.base_dir
        )
        .into());
    }
    let base_dir = args.base_dir.trim();

    // Warn about an enclosing vault
    if let Some(parent) = dir.parent()
        && let Ok(parent_root) = settings_io::discover_vault(parent)
    {
        eprintln!("Note: enclosing vault found at {}/", parent_root.display());
        eprintln!("Creating new vault in {}/", dir.display());
    }

    settings_io::init_settings(&dir, base_dir)?;

    let base = dir.join(base_dir);
    fs::create_dir_all(&base)?;
    let inbox = base.join(INBOX_FILE);
    if !inbox.exists() {
        fs::write(&inbox, INBOX_TEMPLATE)?;
    }

    println!("Initialized weekplan vault in {}/", dir.display());
    println!("  {}", settings_io::SETTINGS_FILE);
    println!("  {}/{}", base_dir, INBOX_FILE);
    Ok(())
}
