//! letterfill CLI - recommendation letter template filler

use std::fs;
use std::path::{Path, PathBuf};

use clap::builder::PossibleValuesParser;
use clap::{Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use letterfill::fill::{missing_placeholders, preview, scan_tokens, STANDARD_FONTS, STANDARD_SIZES};
use letterfill::{
    parse_file_with_options, FillReport, JsonFormat, LetterFill, LetterOverrides, LetterRecord,
    ParseOptions, Placeholder, PlaceholderOutcome,
};

/// Output name used when none is given.
const DEFAULT_NAME: &str = "recommendation_letter";

/// Font used when only a size is given.
const DEFAULT_FONT: &str = "Arial";

/// Size used when only a font is given.
const DEFAULT_SIZE: f32 = 11.0;

/// Characters of each value shown in the fill report.
const PREVIEW_CHARS: usize = 50;

#[derive(Parser)]
#[command(name = "letterfill")]
#[command(author = "iyulab")]
#[command(version)]
#[command(about = "Fill recommendation-letter Word templates", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Fill a template with a letter
    Fill {
        /// Word template (.docx or .dotx)
        #[arg(value_name = "TEMPLATE")]
        template: PathBuf,

        /// Letter record as a JSON file
        #[arg(long, value_name = "FILE", conflicts_with_all = ["letter_url", "letter_id"])]
        letter: Option<PathBuf>,

        /// Letter record as JSON fetched from a URL
        #[arg(long, value_name = "URL", conflicts_with = "letter_id")]
        letter_url: Option<String>,

        /// Id of a letter held by the letter store
        #[arg(long, value_name = "ID")]
        letter_id: Option<String>,

        /// Base URL of the letter store
        #[arg(long, value_name = "URL", env = "LETTERFILL_STORE_URL")]
        store_url: Option<String>,

        /// Letter body (overrides the record)
        #[arg(long)]
        text: Option<String>,

        /// Addressee (overrides the record; empty removes the line)
        #[arg(long)]
        addressee: Option<String>,

        /// Salutation (overrides the record)
        #[arg(long)]
        salutation: Option<String>,

        /// Date line (overrides the record; defaults to today)
        #[arg(long)]
        date: Option<String>,

        /// Font for the letter text
        #[arg(long, value_parser = PossibleValuesParser::new(STANDARD_FONTS.iter().copied()))]
        font: Option<String>,

        /// Font size in points
        #[arg(long, value_parser = parse_size)]
        size: Option<f32>,

        /// Replace tokens inside their runs, keeping every run's formatting
        #[arg(long)]
        in_run: bool,

        /// Remove blank paragraphs right after the date line
        #[arg(long)]
        collapse_date_blanks: bool,

        /// Tolerate damaged package metadata
        #[arg(long)]
        lenient: bool,

        /// Output file
        #[arg(short, long, value_name = "FILE", conflicts_with = "name")]
        output: Option<PathBuf>,

        /// Output file name without extension
        #[arg(long, value_name = "NAME")]
        name: Option<String>,
    },

    /// List the placeholder tokens a template carries
    Inspect {
        /// Word template
        #[arg(value_name = "TEMPLATE")]
        template: PathBuf,
    },

    /// Extract plain text from a Word file
    Text {
        /// Input Word file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Dump the document model as JSON
    Json {
        /// Input Word file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Output compact JSON
        #[arg(long)]
        compact: bool,
    },

    /// Show document information
    Info {
        /// Input Word file
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// Show version information
    Version,
}

/// Where the letter record comes from.
enum LetterSource {
    File(PathBuf),
    Url(String),
    Store { base: String, id: String },
    Arguments,
}

fn parse_size(value: &str) -> Result<f32, String> {
    let size: f32 = value
        .parse()
        .map_err(|_| format!("'{}' is not a number", value))?;
    if STANDARD_SIZES.contains(&size) {
        Ok(size)
    } else {
        let sizes: Vec<String> = STANDARD_SIZES.iter().map(|s| s.to_string()).collect();
        Err(format!("size must be one of {}", sizes.join(", ")))
    }
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Some(Commands::Fill {
            template,
            letter,
            letter_url,
            letter_id,
            store_url,
            text,
            addressee,
            salutation,
            date,
            font,
            size,
            in_run,
            collapse_date_blanks,
            lenient,
            output,
            name,
        }) => {
            let source: Result<LetterSource, Box<dyn std::error::Error>> =
                match (letter, letter_url, letter_id) {
                    (Some(path), _, _) => Ok(LetterSource::File(path)),
                    (_, Some(url), _) => Ok(LetterSource::Url(url)),
                    (_, _, Some(id)) => match store_url {
                        Some(base) => Ok(LetterSource::Store { base, id }),
                        None => {
                            Err("--letter-id needs --store-url or LETTERFILL_STORE_URL".into())
                        }
                    },
                    _ => Ok(LetterSource::Arguments),
                };
            let overrides = LetterOverrides {
                text,
                addressee,
                salutation,
                date,
            };
            let output = output.unwrap_or_else(|| {
                PathBuf::from(format!("{}.docx", name.as_deref().unwrap_or(DEFAULT_NAME)))
            });
            let format = match (font, size) {
                (None, None) => None,
                (font, size) => Some((
                    font.unwrap_or_else(|| DEFAULT_FONT.to_string()),
                    size.unwrap_or(DEFAULT_SIZE),
                )),
            };

            source.and_then(|source| {
                cmd_fill(
                    &template,
                    source,
                    &overrides,
                    format,
                    in_run,
                    collapse_date_blanks,
                    lenient,
                    &output,
                )
            })
        }
        Some(Commands::Inspect { template }) => cmd_inspect(&template),
        Some(Commands::Text { input, output }) => cmd_text(&input, output.as_deref()),
        Some(Commands::Json {
            input,
            output,
            compact,
        }) => cmd_json(&input, output.as_deref(), compact),
        Some(Commands::Info { input }) => cmd_info(&input),
        Some(Commands::Version) => {
            cmd_version();
            Ok(())
        }
        None => {
            println!("{}", "Usage: letterfill fill <TEMPLATE> --letter <FILE>".yellow());
            println!("       letterfill --help for more information");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

#[allow(clippy::too_many_arguments)]
fn cmd_fill(
    template: &Path,
    source: LetterSource,
    overrides: &LetterOverrides,
    format: Option<(String, f32)>,
    in_run: bool,
    collapse_date_blanks: bool,
    lenient: bool,
    output: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let pb = ProgressBar::new(3);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {msg}")?
            .progress_chars("#>-"),
    );

    pb.set_message("Loading letter...");
    let record = match source {
        LetterSource::File(path) => LetterRecord::from_reader(fs::File::open(path)?)?,
        LetterSource::Url(url) => fetch_letter(&url)?,
        LetterSource::Store { base, id } => {
            let url = format!("{}/get-letter/{}", base.trim_end_matches('/'), id);
            fetch_letter(&url)?
        }
        LetterSource::Arguments => LetterRecord::default(),
    };
    // Dated once so the report shows the date written into the document.
    let letter = record.with_overrides(overrides).dated();
    letter.validate()?;
    pb.inc(1);

    pb.set_message("Filling template...");
    let mut builder = LetterFill::new();
    if lenient {
        builder = builder.lenient();
    }
    if in_run {
        builder = builder.in_run();
    }
    if collapse_date_blanks {
        builder = builder.collapse_date_blanks();
    }
    if let Some((font, size)) = format {
        builder = builder.with_font(font, size)?;
    }
    let placeholders = letter.placeholders();
    let filled = builder.fill_file(template, &letter)?;
    pb.inc(1);

    pb.set_message("Writing document...");
    fs::write(output, &filled.bytes)?;
    pb.inc(1);
    pb.finish_and_clear();

    print_report(&filled.report, |p| placeholders.get(p).unwrap_or_default());

    if filled.report.is_empty() {
        println!(
            "\n{}",
            "No placeholders were replaced; check the template's tokens.".yellow()
        );
    }
    println!("\n{} {}", "Saved to".green(), output.display());

    Ok(())
}

fn print_report<'a>(report: &FillReport, value: impl Fn(Placeholder) -> &'a str) {
    println!("{}", "Placeholders".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    for (placeholder, outcome) in &report.outcomes {
        match outcome {
            PlaceholderOutcome::Replaced { .. } => println!(
                "✅ {} → {}",
                placeholder.token(),
                preview(value(*placeholder), PREVIEW_CHARS)
            ),
            PlaceholderOutcome::Removed => {
                println!("✅ {} → (line removed)", placeholder.token())
            }
            PlaceholderOutcome::NotFound => println!(
                "{} {} (not found in template)",
                "❌".red(),
                placeholder.token()
            ),
        }
    }

    for warning in &report.warnings {
        println!("{} {}", "⚠".yellow(), warning);
    }
}

fn fetch_letter(url: &str) -> Result<LetterRecord, Box<dyn std::error::Error>> {
    log::debug!("Fetching letter from {}", url);

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let response = reqwest::get(url).await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(Box::<dyn std::error::Error>::from("Letter not found"));
        }
        let body = response.error_for_status()?.text().await?;
        Ok(LetterRecord::from_json(&body)?)
    })
}

fn cmd_inspect(template: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let options = ParseOptions::new().lenient();
    let doc = parse_file_with_options(template, options)?;
    let tokens = scan_tokens(&doc);

    println!("{}", "Tokens".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    for token in &tokens {
        let marker = if token.is_known() {
            "•".green()
        } else {
            "?".yellow()
        };
        println!(
            "{} {} {} {}",
            marker,
            token.token,
            format!("at {}", token.location).dimmed(),
            preview(&token.paragraph_text, PREVIEW_CHARS).dimmed()
        );
    }

    let missing = missing_placeholders(&doc);

    println!();
    if missing.is_empty() {
        println!("{}", "All placeholders present.".green());
    } else {
        for placeholder in missing {
            println!("{} {} (not found in template)", "❌".red(), placeholder.token());
        }
    }

    Ok(())
}

fn cmd_text(input: &Path, output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let text = letterfill::extract_text(input)?;

    if let Some(path) = output {
        fs::write(path, &text)?;
        println!("{} {}", "Saved to".green(), path.display());
    } else {
        println!("{}", text);
    }

    Ok(())
}

fn cmd_json(
    input: &Path,
    output: Option<&Path>,
    compact: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let format = if compact {
        JsonFormat::Compact
    } else {
        JsonFormat::Pretty
    };

    let json = letterfill::to_json(input, format)?;

    if let Some(path) = output {
        fs::write(path, &json)?;
        println!("{} {}", "Saved to".green(), path.display());
    } else {
        println!("{}", json);
    }

    Ok(())
}

fn cmd_info(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    // Lenient: show what we can even when package metadata is damaged
    let options = ParseOptions::new().lenient();
    let doc = parse_file_with_options(input, options)?;

    println!("{}", "Document Information".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    println!("{}: {}", "File".bold(), input.display());
    println!("{}: {}", "Kind".bold(), doc.metadata.kind.label());
    println!("{}: {}", "Main part".bold(), doc.main_part());

    if let Some(ref title) = doc.metadata.title {
        println!("{}: {}", "Title".bold(), title);
    }
    if let Some(ref creator) = doc.metadata.creator {
        println!("{}: {}", "Author".bold(), creator);
    }
    if let Some(ref last) = doc.metadata.last_modified_by {
        println!("{}: {}", "Last modified by".bold(), last);
    }
    if let Some(ref created) = doc.metadata.created {
        println!("{}: {}", "Created".bold(), created);
    }
    if let Some(ref modified) = doc.metadata.modified {
        println!("{}: {}", "Modified".bold(), modified);
    }

    println!();
    println!("{}", "Content Statistics".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    let text = doc.plain_text();
    println!("{}: {}", "Paragraphs".bold(), doc.paragraph_count());
    println!("{}: {}", "Tables".bold(), doc.table_count());
    println!("{}: {}", "Words".bold(), text.split_whitespace().count());
    println!("{}: {}", "Characters".bold(), text.chars().count());
    println!("{}: {}", "Package parts".bold(), doc.parts().len());
    println!("{}: {}", "Media".bold(), doc.media_count());

    Ok(())
}

fn cmd_version() {
    println!("{} {}", "letterfill".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("Recommendation letter template filler");
    println!();
    println!("Repository: {}", "https://github.com/iyulab/letterfill".dimmed());
    println!("License: MIT");
    println!(
        "Fonts: {}; sizes: {}",
        STANDARD_FONTS.join(", "),
        STANDARD_SIZES
            .iter()
            .map(|s| s.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    );
}
