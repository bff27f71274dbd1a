use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use pagemark_editor::codec;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Annotation file to check
    pub input: PathBuf,
}

pub fn validate(args: ValidateArgs) -> Result<()> {
    println!("{} {}", "Validating".green().bold(), args.input.display());

    let tree = codec::load_from(&args.input)
        .with_context(|| format!("validation failed for {}", args.input.display()))?;

    let pages = tree.pages();
    println!(
        "   {} {} regions across {} pages, {} top-level",
        "✓".green(),
        tree.len(),
        pages.len(),
        tree.roots().len(),
    );
    Ok(())
}
