use anyhow::Result;
use clap::Args;
use colored::Colorize;
use pagemark_editor::codec;
use std::collections::BTreeMap;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct StatsArgs {
    /// Annotation file to summarize
    pub input: PathBuf,

    /// Also break counts down per page
    #[arg(short, long)]
    pub per_page: bool,
}

pub fn stats(args: StatsArgs) -> Result<()> {
    let tree = codec::load_from(&args.input)?;

    println!("{} {}", "Stats for".green().bold(), args.input.display());
    println!("   {} regions, {} pages", tree.len(), tree.pages().len());
    println!();

    let mut by_category: BTreeMap<String, usize> = BTreeMap::new();
    let mut described = 0usize;
    for record in tree.reading_order() {
        *by_category.entry(record.category.name().to_string()).or_default() += 1;
        if !record.description.is_empty() {
            described += 1;
        }
    }

    println!("   {}", "By category:".bold());
    for (name, count) in &by_category {
        println!("     {:12} {}", name, count);
    }
    println!();
    println!(
        "   {} of {} regions have a description",
        described,
        tree.len()
    );

    if args.per_page {
        println!();
        println!("   {}", "By page:".bold());
        for page in tree.pages() {
            println!("     page {:4} {:4} regions", page, tree.regions_on_page(page).len());
        }
    }
    Ok(())
}
