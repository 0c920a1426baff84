//!
//! indexset command-line tool
//! --------------------------
//! Inspect and edit index tables stored on the local filesystem through the same
//! index-set dispatcher the services use. Settings come from `INDEXSET_*`
//! environment variables and can be overridden with flags.
//!
//! Usage:
//!   indexset_cli [--root DIR] [--user-based] [--emit-dirs] <command> ...
//!     list    <table> [user] [--bypass-cache] [--json]
//!     get     <table> <user|-> <file>
//!     put     <table> <user|-> <file> <local-path>
//!     delete  <table> <user|-> <file>
//!     refresh <table>

use anyhow::{bail, Context, Result};
use indexset::{new_index_set, FsObjectClient, IndexFile, IndexSet, StorageConfig, StorageOverrides};
use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

fn parse_value_arg(args: &[String], flag: &str) -> Option<String> {
    let mut i = 0;
    while i < args.len() {
        if args[i] == flag && i + 1 < args.len() {
            return Some(args[i + 1].clone());
        }
        i += 1;
    }
    None
}

fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|a| a == flag)
}

/// Positional arguments with flags (and the values of value-flags) removed.
fn positional(args: &[String]) -> Vec<String> {
    let mut out = Vec::new();
    let mut i = 0;
    while i < args.len() {
        let a = &args[i];
        if a == "--root" {
            i += 2;
            continue;
        }
        if a.starts_with("--") {
            i += 1;
            continue;
        }
        out.push(a.clone());
        i += 1;
    }
    out
}

/// `-` is the empty tenant used by common index sets.
fn user_arg(s: &str) -> &str {
    if s == "-" { "" } else { s }
}

fn usage() -> ! {
    eprintln!("usage: indexset_cli [--root DIR] [--user-based] [--emit-dirs] <list|get|put|delete|refresh> ...");
    std::process::exit(2);
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))?;
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let args: Vec<String> = env::args().skip(1).collect();
    let cli = StorageOverrides {
        root: parse_value_arg(&args, "--root").map(PathBuf::from),
        user_based_index: has_flag(&args, "--user-based").then_some(true),
        emit_directory_entries: has_flag(&args, "--emit-dirs").then_some(true),
        list_cache_ttl_ms: None,
    };
    let cfg = StorageConfig::from_layers(&StorageConfig::from_env(), &cli);
    info!(
        target: "indexset",
        "indexset_cli: root='{}' user_based={} emit_dirs={}",
        cfg.root.display(), cfg.user_based_index, cfg.emit_directory_entries
    );

    let client = Arc::new(FsObjectClient::from_config(&cfg));
    let set = new_index_set(client, cfg.user_based_index);

    let pos = positional(&args);
    let Some(cmd) = pos.first() else { usage() };
    match (cmd.as_str(), &pos[1..]) {
        ("list", [table]) => print_listing(&set, table, "", &args).await?,
        ("list", [table, user]) => print_listing(&set, table, user_arg(user), &args).await?,
        ("get", [table, user, file]) => {
            let mut r = set.get_file(table, user_arg(user), file).await?;
            let mut out = tokio::io::stdout();
            tokio::io::copy(&mut r, &mut out).await?;
        }
        ("put", [table, user, file, local]) => {
            let mut src = tokio::fs::File::open(local)
                .await
                .with_context(|| format!("open local file '{}'", local))?;
            set.put_file(table, user_arg(user), file, &mut src).await?;
            info!(target: "indexset", "uploaded '{}' as {}/{}", local, table, file);
        }
        ("delete", [table, user, file]) => {
            if let Err(e) = set.delete_file(table, user_arg(user), file).await {
                if set.is_file_not_found_err(&e) {
                    bail!("{}/{} does not exist", table, file);
                }
                return Err(e);
            }
        }
        ("refresh", [table]) => set.refresh_index_table_cache(table).await,
        _ => usage(),
    }
    Ok(())
}

async fn print_listing(set: &dyn IndexSet, table: &str, user: &str, args: &[String]) -> Result<()> {
    let files = set.list_files(table, user, has_flag(args, "--bypass-cache")).await?;
    let out = render_listing(&files, has_flag(args, "--json"))?;
    if !out.is_empty() {
        println!("{}", out);
    }
    Ok(())
}

/// One tab-separated line per file, or a JSON array with `--json`.
fn render_listing(files: &[IndexFile], json: bool) -> Result<String> {
    if json {
        return Ok(serde_json::to_string(files)?);
    }
    Ok(files
        .iter()
        .map(|f| format!("{}\t{}\t{}", f.modified_at.to_rfc3339(), f.size, f.name))
        .collect::<Vec<_>>()
        .join("\n"))
}
