use std::env;
use std::fs;
use std::path::Path;

use anyhow::Context;
use notebook_doc::{parse_notebook, serialize_notebook, serialize_notebook_with, SerializeOptions};

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <notebook.ipynb> [indent]", args[0]);
        eprintln!("Parses a v4 notebook and prints its canonical serialization");
        std::process::exit(1);
    }

    let path = Path::new(&args[1]);
    let notebook_json =
        fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;

    let notebook = parse_notebook(&notebook_json)
        .with_context(|| format!("Failed to parse {:?}", path))?;

    let output = match args.get(2) {
        Some(indent) => {
            let indent = indent
                .parse::<usize>()
                .with_context(|| format!("Invalid indent {:?}", indent))?;
            serialize_notebook_with(&notebook, &SerializeOptions::default().with_indent(indent))?
        }
        None => serialize_notebook(&notebook)?,
    };

    eprintln!(
        "{} cells, nbformat {}",
        notebook.len(),
        notebook.version()
    );
    print!("{}", output);

    Ok(())
}
