use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use pagemark_editor::{codec, AnnotationDocument};
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct EditArgs {
    /// Annotation file to edit in place
    pub input: PathBuf,

    /// Id of the region to edit
    #[arg(long)]
    pub id: String,

    /// Patch as JSON over the mutable fields, e.g.
    /// `{"category": "table", "description": "results table"}`.
    /// Structural fields are rejected.
    #[arg(long)]
    pub patch: String,
}

pub fn edit(args: EditArgs) -> Result<()> {
    let mut doc = AnnotationDocument::load(&args.input)?;

    let value: serde_json::Value =
        serde_json::from_str(&args.patch).context("patch is not valid JSON")?;
    let patch = codec::patch_from_json(&args.id, &value)?;

    doc.edit_region(&args.id, patch)?;
    doc.save()?;

    println!(
        "{} region {} in {}",
        "Edited".green().bold(),
        args.id,
        args.input.display()
    );
    Ok(())
}
