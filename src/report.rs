//! Terminal output for the CLI
//!
//! Startup banner for `serve` and the record dump for `inspect`.

use crate::record::LogRecord;
use console::style;
use humansize::{format_size, BINARY};
use std::net::SocketAddr;
use std::path::Path;

/// Format a number with thousands separators
pub fn format_number(n: u64) -> String {
    let s = n.to_string();
    let bytes: Vec<_> = s.bytes().rev().collect();

    let chunks: Vec<String> = bytes
        .chunks(3)
        .map(|chunk| chunk.iter().rev().map(|&b| b as char).collect::<String>())
        .collect();

    chunks.into_iter().rev().collect::<Vec<_>>().join(",")
}

/// On-disk size of the database file, if it exists
pub fn database_size(path: &Path) -> Option<u64> {
    std::fs::metadata(path).ok().map(|m| m.len())
}

fn print_database_line(db_path: &Path) {
    match database_size(db_path) {
        Some(size) => println!(
            "  {} {} ({})",
            style("Database:").bold(),
            db_path.display(),
            format_size(size, BINARY)
        ),
        None => println!("  {} {}", style("Database:").bold(), db_path.display()),
    }
}

/// Print a header when the server starts
pub fn print_serve_header(addr: SocketAddr, db_path: &Path, data_dir: &Path, records: u64) {
    println!();
    println!("{} {}", style("log-forge").cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("{}", style("─".repeat(50)).dim());
    println!("  {} http://{}", style("Listening:").bold(), addr);
    print_database_line(db_path);
    println!("  {} {}", style("Records:").bold(), format_number(records));
    println!("  {} {}", style("Data dir:").bold(), data_dir.display());
    println!();
}

/// Print the inspection summary followed by the records as pretty JSON
pub fn print_inspection(db_path: &Path, total: u64, records: &[LogRecord]) -> serde_json::Result<()> {
    println!();
    println!("{}", style("Log Store").green().bold());
    println!("{}", style("─".repeat(50)).dim());
    print_database_line(db_path);
    println!("  {} {}", style("Records:").bold(), format_number(total));
    println!(
        "  {} {}",
        style("Showing:").bold(),
        format_number(records.len() as u64)
    );
    println!();

    for record in records {
        println!("{}", serde_json::to_string_pretty(record)?);
    }
    Ok(())
}
