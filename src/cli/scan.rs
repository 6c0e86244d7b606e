use crate::cli::CliContext;
use crate::core::cancel::CancelToken;
use crate::core::{entry, walker};
use anyhow::{bail, Context, Result};
use chrono::{DateTime, Local};
use clap::Args;
use comfy_table::{presets::UTF8_FULL, Attribute, Cell, Table};
use serde::Serialize;
use std::fs;
use std::path::Path;

#[derive(Args, Debug)]
pub struct ScanArgs {
    /// Output format: table|json
    #[arg(long, default_value = "table")]
    pub format: String,
}

#[derive(Debug, Serialize)]
pub struct ScanItem {
    pub folder: String,
    pub name: String,
    pub size_bytes: Option<u64>,
    pub modified: Option<String>,
}

/// Walk the store without decrypting anything.
pub fn collect(root: &Path) -> Result<Vec<ScanItem>> {
    let cancel = CancelToken::new();
    let (paths, slot) = walker::walk_secret_files(root, &cancel)?;

    let mut items = Vec::new();
    for path in paths.iter() {
        let relative = path.strip_prefix(root).unwrap_or(path.as_path());
        let (folder, name) = entry::split_entry_path(relative);
        let meta = fs::metadata(&path).ok();
        let size_bytes = meta.as_ref().map(|m| m.len());
        let modified = meta.and_then(|m| m.modified().ok()).map(|t| {
            let dt: DateTime<Local> = t.into();
            dt.format("%Y-%m-%d %H:%M:%S").to_string()
        });
        items.push(ScanItem {
            folder,
            name,
            size_bytes,
            modified,
        });
    }

    match slot.recv() {
        Ok(result) => result.with_context(|| format!("scan {}", root.display()))?,
        Err(_) => bail!("walk of {} stopped unexpectedly", root.display()),
    }

    items.sort_by(|a, b| a.folder.cmp(&b.folder).then_with(|| a.name.cmp(&b.name)));
    Ok(items)
}

pub fn run(ctx: &CliContext, args: ScanArgs) -> Result<()> {
    if args.format != "table" && args.format != "json" {
        bail!("invalid format: {} (use table|json)", args.format);
    }
    let root = &ctx.paths.root;
    if !root.is_dir() {
        bail!("password store not found: {}", root.display());
    }

    let items = collect(root)?;

    if args.format == "json" {
        let json = serde_json::to_string_pretty(&items).context("serialize scan")?;
        println!("{}", json);
        return Ok(());
    }

    if items.is_empty() {
        println!("No entries found in {}", root.display());
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec![
        Cell::new("Folder").add_attribute(Attribute::Bold),
        Cell::new("Name").add_attribute(Attribute::Bold),
        Cell::new("Size").add_attribute(Attribute::Bold),
        Cell::new("Modified").add_attribute(Attribute::Bold),
    ]);

    let count = items.len();
    for item in items {
        let size = item
            .size_bytes
            .map(|s| format!("{} B", s))
            .unwrap_or_else(|| "-".to_string());
        let modified = item.modified.unwrap_or_else(|| "-".to_string());
        table.add_row(vec![item.folder, item.name, size, modified]);
    }

    println!("{}", table);
    println!("\n{} entries in {}", count, ctx.paths);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_collect_sorted_entries() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("Work/ssh")).unwrap();
        fs::write(dir.path().join("Work/ssh/host.gpg"), b"1234").unwrap();
        fs::write(dir.path().join("banking.gpg"), b"12").unwrap();
        fs::write(dir.path().join(".gpg-id"), b"KEY").unwrap();

        let items = collect(dir.path()).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].folder, "/");
        assert_eq!(items[0].name, "banking");
        assert_eq!(items[0].size_bytes, Some(2));
        assert_eq!(items[1].folder, "Work/ssh");
        assert_eq!(items[1].name, "host");
    }

    #[test]
    fn test_collect_missing_root_fails() {
        let dir = TempDir::new().unwrap();
        assert!(collect(&dir.path().join("missing")).is_err());
    }
}
