use std::collections::HashSet;
use std::io::{self, SeekFrom, Write};
use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, Context};
use colored::Colorize;
use dagfs_api::{ApiConfig, Client};
use dagfs_dag::Node;
use dagfs_types::ContentHash;
use dagfs_unixfs::UnixFs;
use serde_json::json;
use tracing::debug;

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = api_config(cli.config.as_deref(), cli.api.as_deref())?;
    debug!(api = %config.base_url(), "using daemon");
    let client = Client::from_config(&config)?;
    let fs = UnixFs::new(Arc::new(client))?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match cli.command {
        Command::Cat(args) => cmd_cat(&fs, &args.reference, &mut out),
        Command::Read(args) => cmd_read(&fs, &args, &mut out),
        Command::Ls(args) => cmd_ls(&fs, &args.reference, &mut out),
        Command::Links(args) => cmd_links(&fs, &args.reference, &cli.format, &mut out),
        Command::Tree(args) => cmd_tree(&fs, &args, &mut out),
        Command::Stat(args) => cmd_stat(&fs, &args.reference, &cli.format, &mut out),
    }
}

fn api_config(path: Option<&Path>, api: Option<&str>) -> anyhow::Result<ApiConfig> {
    let mut config = match path {
        Some(path) => ApiConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => ApiConfig::default(),
    };
    if let Some(api) = api {
        let (host, port) = api
            .rsplit_once(':')
            .ok_or_else(|| anyhow!("--api expects HOST:PORT, got {api:?}"))?;
        config.host = host.to_string();
        config.port = port
            .parse()
            .with_context(|| format!("invalid port in {api:?}"))?;
    }
    Ok(config)
}

fn cmd_cat(fs: &UnixFs, reference: &str, out: &mut dyn Write) -> anyhow::Result<()> {
    let written = fs.file(reference)?.copy_to(out)?;
    debug!(reference, bytes = written, "cat");
    out.flush()?;
    Ok(())
}

fn cmd_read(fs: &UnixFs, args: &ReadArgs, out: &mut dyn Write) -> anyhow::Result<()> {
    let mut stream = fs.open(&args.reference, "rb")?;
    stream.seek_to(SeekFrom::Start(args.offset))?;
    let bytes = stream.read_bytes(args.length)?;
    out.write_all(&bytes)?;
    out.flush()?;
    Ok(())
}

fn cmd_ls(fs: &UnixFs, reference: &str, out: &mut dyn Write) -> anyhow::Result<()> {
    let dir = fs.dir(reference)?;
    for link in dir.node().links()? {
        writeln!(
            out,
            "{}  {:>10}  {}",
            link.hash().as_str().dimmed(),
            link.size(),
            link.name().bold()
        )?;
    }
    Ok(())
}

fn cmd_links(
    fs: &UnixFs,
    reference: &str,
    format: &OutputFormat,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    let node = fs.node(reference)?;
    let links = node.links()?;
    match format {
        OutputFormat::Json => {
            let records: Vec<_> = links.iter().map(|l| l.to_record()).collect();
            serde_json::to_writer_pretty(&mut *out, &records)?;
            writeln!(out)?;
        }
        OutputFormat::Text => {
            for (i, link) in links.iter().enumerate() {
                writeln!(
                    out,
                    "{:>4}  {}  {:>10}  {}",
                    i,
                    link.hash().as_str().yellow(),
                    link.size(),
                    link.name()
                )?;
            }
        }
    }
    Ok(())
}

fn cmd_tree(fs: &UnixFs, args: &TreeArgs, out: &mut dyn Write) -> anyhow::Result<()> {
    let root = fs.node(&args.reference)?;
    writeln!(out, "{}", root.hash().as_str().yellow().bold())?;
    let mut seen = HashSet::from([root.hash().clone()]);
    walk_tree(&root, 1, args.depth, &mut seen, out)
}

/// Print every link below `node`. A node reached a second time is listed but
/// not descended into again.
fn walk_tree(
    node: &Node,
    depth: usize,
    max_depth: Option<usize>,
    seen: &mut HashSet<ContentHash>,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    let indent = "  ".repeat(depth);
    for link in node.links()? {
        let name = if link.name().is_empty() { "(unnamed)" } else { link.name() };
        if !seen.insert(link.hash().clone()) {
            writeln!(out, "{indent}{} {} {}", name, link.hash().short().dimmed(), "(seen)".dimmed())?;
            continue;
        }
        writeln!(out, "{indent}{} {}", name.bold(), link.hash().short().dimmed())?;
        if max_depth.map_or(true, |max| depth < max) {
            let child = link.follow();
            walk_tree(&child, depth + 1, max_depth, seen, out)?;
            child.flush();
        }
    }
    Ok(())
}

fn cmd_stat(
    fs: &UnixFs,
    reference: &str,
    format: &OutputFormat,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    let stat = fs.stat(reference)?;
    match format {
        OutputFormat::Json => {
            let blocks: Vec<_> = stat
                .blocks
                .iter()
                .map(|(offset, size)| json!({ "Offset": offset, "Size": size }))
                .collect();
            let value = json!({
                "Hash": stat.hash.as_str(),
                "Type": stat.kind.to_string(),
                "Size": stat.size,
                "Links": stat.links,
                "Blocks": blocks,
            });
            serde_json::to_writer_pretty(&mut *out, &value)?;
            writeln!(out)?;
        }
        OutputFormat::Text => {
            writeln!(out, "Hash:   {}", stat.hash.as_str().yellow())?;
            writeln!(out, "Type:   {}", stat.kind.to_string().cyan())?;
            writeln!(out, "Size:   {}", stat.size)?;
            writeln!(out, "Links:  {}", stat.links)?;
            if !stat.blocks.is_empty() {
                writeln!(out, "Blocks:")?;
                for (i, (offset, size)) in stat.blocks.iter().enumerate() {
                    writeln!(out, "  [{i}] offset {offset} size {size}")?;
                }
            }
        }
    }
    Ok(())
}
