use anyhow::{anyhow, Result};
use clap::Args;
use colored::Colorize;
use pagemark_editor::query::{self, DescriptionFilter, RegionFilter};
use pagemark_editor::{codec, Category};
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct FindArgs {
    /// Annotation file to search
    pub input: PathBuf,

    /// Match these categories (repeatable)
    #[arg(short, long)]
    pub category: Vec<String>,

    /// Match regions whose text contains this (case-insensitive)
    #[arg(short, long)]
    pub text: Option<String>,

    /// Only regions that already have a description
    #[arg(long, conflicts_with = "undescribed")]
    pub described: bool,

    /// Only regions that still lack a description
    #[arg(long)]
    pub undescribed: bool,

    /// Restrict to a page range, e.g. `3` or `2..7`
    #[arg(short, long)]
    pub pages: Option<String>,
}

pub fn find(args: FindArgs) -> Result<()> {
    let tree = codec::load_from(&args.input)?;

    let mut filter = RegionFilter::new();
    for name in &args.category {
        filter = filter.with_category(Category::parse(name));
    }
    if let Some(text) = &args.text {
        filter = filter.with_text_contains(text.clone());
    }
    if args.described {
        filter = filter.with_description(DescriptionFilter::NonEmpty);
    } else if args.undescribed {
        filter = filter.with_description(DescriptionFilter::Empty);
    }

    let pages = args.pages.as_deref().map(parse_page_range).transpose()?;

    let mut count = 0usize;
    for record in query::find(&tree, &filter, pages) {
        count += 1;
        let preview: String = record.text.chars().take(60).collect();
        println!(
            "{} p{:<3} {:10} {}",
            record.id.dimmed(),
            record.page,
            record.category.name().cyan(),
            preview
        );
    }
    println!();
    println!("{} {} matching regions", "Found".green().bold(), count);
    Ok(())
}

/// `7` means page 7 only; `2..7` is inclusive on both ends.
fn parse_page_range(s: &str) -> Result<std::ops::RangeInclusive<u32>> {
    if let Some((lo, hi)) = s.split_once("..") {
        let lo: u32 = lo.parse().map_err(|_| anyhow!("bad page range: {s}"))?;
        let hi: u32 = hi.parse().map_err(|_| anyhow!("bad page range: {s}"))?;
        Ok(lo..=hi)
    } else {
        let page: u32 = s.parse().map_err(|_| anyhow!("bad page number: {s}"))?;
        Ok(page..=page)
    }
}
