//! # reportgen CLI
//!
//! Usage:
//!   reportgen report.json -o display-list.json
//!   echo '{ ... }' | reportgen
//!   reportgen --example > report.json
//!   reportgen report.json --resolved
//!   reportgen --attributes

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use reportgen::cascade::HandlerTable;
use reportgen::Template;

#[derive(Parser, Debug)]
#[command(name = "reportgen", version)]
#[command(about = "Render a report template to a display list", long_about = None)]
struct Cli {
    /// Template JSON (stdin if not given)
    #[arg(value_name = "FILE")]
    input: Option<PathBuf>,

    /// Output file (stdout if not given)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Print the resolved paint states instead of rendering
    #[arg(long, default_value_t = false)]
    resolved: bool,

    /// Print an example template and exit
    #[arg(long, default_value_t = false)]
    example: bool,

    /// List the supported attribute names and exit
    #[arg(long, default_value_t = false)]
    attributes: bool,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("reportgen=warn"))
        .init();

    let cli = Cli::parse();
    if cli.example {
        print!("{}", EXAMPLE_REPORT);
        return ExitCode::SUCCESS;
    }
    if cli.attributes {
        for name in HandlerTable::standard().names() {
            println!("{}", name);
        }
        return ExitCode::SUCCESS;
    }

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("✗ {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> reportgen::Result<()> {
    let input = match &cli.input {
        Some(path) => fs::read_to_string(path)?,
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };

    let template = Template::from_json(&input)?;
    let output = if cli.resolved {
        serde_json::to_string_pretty(template.resolved())?
    } else {
        template.record()?.to_json()?
    };

    match &cli.output {
        Some(path) => {
            fs::write(path, &output)?;
            eprintln!(
                "✓ {} page(s), {} bytes written to {}",
                template.resolved().page_count(),
                output.len(),
                path.display()
            );
        }
        None => println!("{}", output),
    }
    Ok(())
}

const EXAMPLE_REPORT: &str = r##"{
  "attributes": [
    { "name": "title", "value": "Quarterly Report" },
    { "name": "font-family", "value": "helvetica" },
    { "name": "font-size", "value": "3.5mm" }
  ],
  "styles": [
    {
      "name": "heading",
      "attributes": [
        { "name": "font-style", "value": "bold" },
        { "name": "font-size", "value": "150%" },
        { "name": "border-bottom-width", "value": "0.3" }
      ]
    },
    {
      "name": "amount",
      "attributes": [
        { "name": "text-align", "value": "RM" },
        { "name": "width", "value": "30mm" }
      ]
    }
  ],
  "size": "A4",
  "units": "mm",
  "orientation": "P",
  "header": {
    "attributes": [{ "name": "font-size", "value": "3mm" }],
    "cells": [{ "text": "ACME Corp. internal", "attributes": [{ "name": "width", "value": "100%" }] }]
  },
  "footer": {
    "cells": [{ "text": "Page ${page} of ${total}", "attributes": [{ "name": "text-align", "value": "CM" }] }]
  },
  "pages": [
    {
      "bookmark_title": "Summary",
      "cells": [
        { "text": "Summary", "style_list": ["heading"], "attributes": [{ "name": "width", "value": "100%" }] },
        { "text": "Revenue", "attributes": [{ "name": "width", "value": "60mm" }, { "name": "display", "value": "column" }] },
        { "text": "1,204,000.00", "style_list": ["amount"] }
      ]
    },
    {
      "attributes": [{ "name": "background-color", "value": "#f4f4f4" }],
      "cells": [
        { "text": "Notes", "style_list": ["heading"], "attributes": [{ "name": "width", "value": "100%" }] },
        { "text": "Figures are unaudited.", "attributes": [{ "name": "font-style", "value": "italic" }] }
      ]
    }
  ],
  "bookmarks": true,
  "page_bookmark_template": "Page ${page}",
  "watermark": {
    "text": "DRAFT",
    "attributes": [
      { "name": "font-color", "value": "#30ff0000" },
      { "name": "font-size", "value": "20mm" }
    ]
  }
}
"##;
