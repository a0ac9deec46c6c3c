use std::error::Error;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;

use garment_erp::{
    CategoryNode, fixture_categories, flatten_hierarchy, initialize_db, insert_category,
};

/// A utility for creating a category database for manual testing of garment_erp.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,

    /// A JSON file holding an array of category records to load instead of
    /// the built-in sample categories.
    #[arg(long, short)]
    categories: Option<String>,
}

/// Create and populate a database for manual testing.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    match output_path.extension() {
        None => {
            eprintln!("Output path must include a file extension (e.g., 'categories.db').");
            exit(1);
        }
        Some(extension) if extension.is_empty() => {
            eprintln!("Output path must include a file extension (e.g., 'categories.db').");
            exit(1);
        }
        _ => {}
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    let categories = match &args.categories {
        Some(path) => {
            println!("Loading categories from {path:#?}");
            let reader = BufReader::new(File::open(path)?);
            let records: Vec<CategoryNode> = serde_json::from_reader(reader)?;
            flatten_hierarchy(records)
        }
        None => fixture_categories(),
    };

    println!("Creating database at {output_path:#?}");
    let connection = Connection::open(output_path)?;

    initialize_db(&connection)?;

    println!("Inserting {} categories...", categories.len());
    for category in &categories {
        insert_category(category, &connection)?;
    }

    println!("Success!");

    Ok(())
}
