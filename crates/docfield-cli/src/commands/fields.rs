//! Fields command - list what each document type extracts.

use clap::Args;
use console::style;

use docfield_core::DocType;

use super::parse_doc_type;

/// Arguments for the fields command.
#[derive(Args)]
pub struct FieldsArgs {
    /// Document type; all types when omitted
    #[arg(value_parser = parse_doc_type)]
    doc_type: Option<DocType>,

    /// Print as JSON
    #[arg(long)]
    json: bool,
}

pub async fn run(args: FieldsArgs) -> anyhow::Result<()> {
    let doc_types: Vec<DocType> = match args.doc_type {
        Some(doc_type) => vec![doc_type],
        None => DocType::ALL.to_vec(),
    };

    if args.json {
        let listing: serde_json::Map<String, serde_json::Value> = doc_types
            .iter()
            .map(|doc_type| {
                let mut names = Vec::new();
                if doc_type.has_document_number() {
                    names.push("document_number");
                }
                names.extend_from_slice(doc_type.field_names());
                (doc_type.to_string(), serde_json::json!(names))
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&listing)?);
        return Ok(());
    }

    for doc_type in doc_types {
        println!(
            "{} ({})",
            style(doc_type).bold(),
            doc_type.category().key()
        );
        if doc_type.has_document_number() {
            println!("  document_number");
        }
        for name in doc_type.field_names() {
            println!("  {}", name);
        }
    }

    Ok(())
}
