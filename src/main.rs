use pdb_container::{AppInfo, AppInfoLayout, Database, LoadOptions};
use std::env;
use std::fs::File;
use std::io::BufReader;

/// Number of leading payload bytes shown per entry.
const PREVIEW_BYTES: usize = 16;

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <path-to-pdb-or-prc> [--categories] [--encoding <LABEL>]", args[0]);
        std::process::exit(1);
    }

    let path = &args[1];
    let mut options = LoadOptions::default();
    if args.iter().any(|arg| arg == "--categories") {
        options = options.with_appinfo_layout(AppInfoLayout::Standard);
    }
    if let Some(idx) = args.iter().position(|arg| arg == "--encoding") {
        match args.get(idx + 1) {
            Some(label) => match options.with_encoding_label(label) {
                Ok(updated) => options = updated,
                Err(e) => {
                    eprintln!("ERROR: {}", e);
                    std::process::exit(1);
                }
            },
            None => {
                eprintln!("ERROR: --encoding flag requires an argument.");
                std::process::exit(1);
            }
        }
    }

    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) => {
            eprintln!("ERROR: Cannot open {}: {}", path, e);
            std::process::exit(1);
        }
    };

    let db = match Database::load_with(&mut BufReader::new(file), &options) {
        Ok(db) => db,
        Err(e) => {
            eprintln!("\nERROR: Failed to read database");
            eprintln!("  {}", e);
            std::process::exit(1);
        }
    };

    let header = db.header();
    println!("Database Information:");
    println!("  Name: {}", header.name);
    println!("  Type: {}  Creator: {}", header.db_type, header.creator);
    println!("  Attributes: {:#06x} ({})", header.attributes, header.entry_kind());
    println!("  Encoding: {}", db.encoding().name());
    println!("  Version: {}  Modification number: {}", header.version, header.modnum);
    let show_time = |t: Option<chrono::DateTime<chrono::Utc>>| {
        t.map(|t| t.to_rfc3339()).unwrap_or_else(|| "never".to_string())
    };
    println!("  Created: {}", show_time(db.ctime()));
    println!("  Modified: {}", show_time(db.mtime()));
    println!("  Backed up: {}", show_time(db.backup_time()));

    println!("\nBlocks:");
    match db.appinfo() {
        Some(AppInfo::Standard(info)) => {
            println!("  App-info: standard, {} bytes of application data", info.rest.len());
            for (i, category) in info.categories.slots().iter().enumerate() {
                if !category.name.is_empty() {
                    println!("    [{:2}] {} (id {})", i, category.name, category.id);
                }
            }
        }
        Some(AppInfo::Opaque(bytes)) => println!("  App-info: {} bytes", bytes.len()),
        None => println!("  App-info: none"),
    }
    match db.sortinfo() {
        Some(bytes) => println!("  Sort-info: {} bytes", bytes.len()),
        None => println!("  Sort-info: none"),
    }

    println!("\nIndex ({} entries):", db.index().len());
    for entry in db.index() {
        let Some(blob) = db.blob(entry.id()) else {
            continue;
        };
        let bytes = blob.dump();
        let preview = hex::encode(&bytes[..bytes.len().min(PREVIEW_BYTES)]);
        let attributes = entry
            .attributes()
            .map(|a| format!(" attr={:#04x}", a.0))
            .unwrap_or_default();
        println!(
            "  {} @{} len={}{} {}{}",
            entry.id(),
            entry.offset(),
            bytes.len(),
            attributes,
            preview,
            if bytes.len() > PREVIEW_BYTES { "..." } else { "" }
        );
    }
}
