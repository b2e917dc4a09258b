//! Build script for auscult-ai
//!
//! Embeds the identification shown in the startup log and the page header:
//! `GIT_HASH` (with a `-dirty` suffix for uncommitted changes),
//! `BUILD_TIMESTAMP` (RFC 3339; honours `SOURCE_DATE_EPOCH` for reproducible
//! builds) and `BUILD_PROFILE`.

use std::process::Command;

use chrono::{DateTime, Local, SecondsFormat, Utc};

const UNKNOWN: &str = "unknown";

/// Trimmed stdout of a successful `git` invocation
fn git_output(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    String::from_utf8(output.stdout)
        .ok()
        .map(|s| s.trim().to_string())
}

fn git_hash() -> String {
    let Some(hash) = git_output(&["rev-parse", "--short=8", "HEAD"]).filter(|h| !h.is_empty())
    else {
        return UNKNOWN.to_string();
    };
    match git_output(&["status", "--porcelain", "--untracked-files=no"]) {
        Some(changes) if !changes.is_empty() => format!("{}-dirty", hash),
        _ => hash,
    }
}

fn build_timestamp() -> String {
    let pinned = std::env::var("SOURCE_DATE_EPOCH")
        .ok()
        .and_then(|raw| raw.trim().parse::<i64>().ok())
        .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0));
    match pinned {
        Some(at) => at.to_rfc3339_opts(SecondsFormat::Secs, true),
        None => Local::now().to_rfc3339_opts(SecondsFormat::Secs, false),
    }
}

fn main() {
    let profile = std::env::var("PROFILE").unwrap_or_else(|_| UNKNOWN.to_string());

    println!("cargo:rustc-env=GIT_HASH={}", git_hash());
    println!("cargo:rustc-env=BUILD_TIMESTAMP={}", build_timestamp());
    println!("cargo:rustc-env=BUILD_PROFILE={}", profile);

    // No rerun-if-* lines: any of them would stop the hash and timestamp
    // from refreshing on every build
}
