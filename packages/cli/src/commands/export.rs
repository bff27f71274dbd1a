use anyhow::Result;
use clap::Args;
use colored::Colorize;
use pagemark_editor::codec;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Annotation file to read
    pub input: PathBuf,

    /// Where to write the normalized file
    #[arg(short, long)]
    pub out: PathBuf,
}

/// Load (with full validation) and re-serialize. The output is
/// byte-deterministic for a given tree, so this doubles as a formatting
/// normalizer for files produced elsewhere.
pub fn export(args: ExportArgs) -> Result<()> {
    let tree = codec::load_from(&args.input)?;
    codec::save_to(&args.out, &tree)?;

    println!(
        "{} {} regions -> {}",
        "Exported".green().bold(),
        tree.len(),
        args.out.display()
    );
    Ok(())
}
