//! Removal of synthetic directory entries from listings.
//!
//! Object stores with a hierarchical namespace (Azure Data Lake gen2 behind the blob
//! API, for one) report every directory that has children as an object of its own.
//! Handing those to the layers above would make them try to download and open a
//! directory. Index files are never named after a path-prefix of another index file,
//! so any entry whose cleaned name is the parent directory of some other entry can be
//! dropped without asking the backend for sizes or attributes.

use std::collections::HashSet;

use super::IndexFile;

/// Drop every entry whose cleaned name is the parent directory of another entry.
///
/// The relative order of the survivors is kept. The input vector is consumed and
/// its allocation reused; the returned vector is the result.
pub fn filter_out_directories(mut files: Vec<IndexFile>) -> Vec<IndexFile> {
    let dirs: HashSet<String> = files
        .iter()
        .map(|f| parent_dir(&f.name))
        .filter(|d| d != ".")
        .collect();
    if dirs.is_empty() {
        return files;
    }
    files.retain(|f| !dirs.contains(&clean_path(&f.name)));
    files
}

/// Everything before the last `/`, cleaned. `"."` when there is no separator.
///
/// `"a/b/c.txt"` gives `"a/b"`, `"a/"` gives `"a"`, `"/x"` gives `"/"`.
pub fn parent_dir(name: &str) -> String {
    match name.rfind('/') {
        Some(idx) => clean_path(&name[..=idx]),
        None => ".".to_string(),
    }
}

/// Lexical path normalization for `/`-separated names: collapses repeated
/// separators, drops `.` segments, resolves `..` against the preceding segment and
/// strips trailing separators. The empty string cleans to `"."`.
pub fn clean_path(path: &str) -> String {
    if path.is_empty() {
        return ".".to_string();
    }
    let rooted = path.starts_with('/');
    let mut out: Vec<&str> = Vec::new();
    for seg in path.split('/') {
        match seg {
            "" | "." => {}
            ".." => {
                if out.last().is_some_and(|last| *last != "..") {
                    out.pop();
                } else if !rooted {
                    // `..` above a rooted path stays at the root
                    out.push("..");
                }
            }
            s => out.push(s),
        }
    }
    let joined = out.join("/");
    if rooted {
        format!("/{joined}")
    } else if joined.is_empty() {
        ".".to_string()
    } else {
        joined
    }
}

#[cfg(test)]
#[path = "dirs_tests.rs"]
mod dirs_tests;
