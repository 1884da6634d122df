//! # Worksheet PDF CLI
//!
//! Usage:
//!   worksheet-pdf request.json -o worksheet.pdf
//!   echo '{ ... }' | worksheet-pdf -o worksheet.pdf
//!   worksheet-pdf --config options.json request.json
//!   worksheet-pdf --example > request.json

use std::error::Error;
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use clap::Parser;
use worksheet_pdf::{ExportError, ExportOptions, ExportRequest};

/// Export a worksheet (and any stored answers) to a fillable PDF.
#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    /// Export request JSON. Reads stdin when omitted.
    input: Option<PathBuf>,

    /// Where to write the PDF.
    #[arg(short, long, default_value = "output.pdf")]
    output: PathBuf,

    /// Export options JSON (page size, margins, theme, branding).
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Print a sample export request and exit.
    #[arg(long)]
    example: bool,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    if cli.example {
        print!("{}", example_request_json());
        return;
    }

    match run(&cli) {
        Ok(len) => eprintln!("\u{2713} Written {} bytes to {}", len, cli.output.display()),
        Err(err) => {
            eprintln!("\u{2717} {}", err);
            print_error_sources(err.as_ref());
            std::process::exit(1);
        }
    }
}

fn run(cli: &Cli) -> Result<usize, Box<dyn Error>> {
    let input = match &cli.input {
        Some(path) => fs::read_to_string(path)?,
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };

    let options = match &cli.config {
        Some(path) => {
            let text = fs::read_to_string(path)?;
            serde_json::from_str::<ExportOptions>(&text).map_err(ExportError::from)?
        }
        None => ExportOptions::default(),
    };

    let request: ExportRequest = serde_json::from_str(&input).map_err(ExportError::from)?;
    let bytes = worksheet_pdf::export_with_options(&request, &options)?;
    fs::write(&cli.output, &bytes)?;
    Ok(bytes.len())
}

fn print_error_sources(mut error: &(dyn Error + 'static)) {
    while let Some(source) = error.source() {
        eprintln!("  caused by: {}", source);
        error = source;
    }
}

fn example_request_json() -> &'static str {
    r##"{
  "title": "Thought Record",
  "description": "Catch, check and change an unhelpful thought.",
  "instructions": "Fill this in as soon as you can after noticing a shift in mood.",
  "show_branding": true,
  "schema": {
    "version": 1,
    "sections": [
      {
        "id": "situation",
        "title": "Situation",
        "step": 1,
        "fields": [
          { "id": "when", "label": "When did it happen?", "type": "date", "required": true },
          { "id": "where", "label": "Where were you?", "type": "text", "placeholder": "At work, at home..." },
          { "id": "what", "label": "What happened?", "type": "textarea", "rows": 4 }
        ]
      },
      {
        "id": "feelings",
        "title": "Feelings",
        "step": 2,
        "fields": [
          {
            "id": "emotions",
            "label": "Which emotions did you notice?",
            "type": "checklist",
            "options": [
              { "id": "anxious", "label": "Anxious" },
              { "id": "sad", "label": "Sad" },
              { "id": "angry", "label": "Angry" }
            ]
          },
          {
            "id": "intensity",
            "label": "How strong was it?",
            "type": "likert",
            "min": 0,
            "max": 10,
            "anchors": { "0": "None", "10": "Severe" }
          }
        ]
      },
      {
        "id": "evidence",
        "title": "Weighing the evidence",
        "step": 3,
        "fields": [
          {
            "id": "log",
            "label": "Evidence",
            "type": "table",
            "min_rows": 3,
            "columns": [
              { "id": "for", "label": "For the thought", "width": 1 },
              { "id": "against", "label": "Against the thought", "width": 1 }
            ]
          },
          {
            "id": "belief",
            "label": "Belief now",
            "type": "number",
            "unit": "%"
          }
        ]
      }
    ]
  },
  "values": {
    "where": "Office",
    "emotions": ["anxious"],
    "intensity": 7,
    "log": [
      { "for": "My manager frowned", "against": "She was reading a long email" }
    ]
  }
}
"##
}
