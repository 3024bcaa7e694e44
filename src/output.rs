//! Printing ranked lists.
//!
//! Five formats are supported:
//!
//! - [`OutputFormat::Simple`] - titles only, one per line
//! - [`OutputFormat::Wide`] - rank, title, score, raw rating and vote count
//! - [`OutputFormat::Json`] - a JSON array of objects
//! - [`OutputFormat::Yaml`] - a YAML sequence of mappings
//! - [`OutputFormat::Csv`] - CSV with a header row
//!
//! # Examples
//!
//! ```rust
//! use mangarank::output::{OutputFormat, write_ranked};
//! use mangarank::{Candidate, RankedCandidate};
//!
//! let ranked = vec![RankedCandidate {
//!     candidate: Candidate {
//!         id: "abc".into(),
//!         title: "Yotsuba&!".into(),
//!         rating: 9.2,
//!         votes: 4000,
//!         follows: 50_000,
//!     },
//!     score: 9.13,
//! }];
//!
//! let mut out = Vec::new();
//! write_ranked(&mut out, &ranked, OutputFormat::Simple).unwrap();
//! assert_eq!(String::from_utf8(out).unwrap(), "Yotsuba&!\n");
//! ```

use serde::Serialize;
use std::fmt;
use std::io::Write;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::types::RankedCandidate;

/// Output format for a ranked list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum OutputFormat {
    Simple,
    #[default]
    Wide,
    Json,
    Yaml,
    Csv,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OutputFormat::Simple => "simple",
            OutputFormat::Wide => "wide",
            OutputFormat::Json => "json",
            OutputFormat::Yaml => "yaml",
            OutputFormat::Csv => "csv",
        };
        f.write_str(name)
    }
}

impl FromStr for OutputFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "simple" => Ok(OutputFormat::Simple),
            "wide" => Ok(OutputFormat::Wide),
            "json" => Ok(OutputFormat::Json),
            "yaml" | "yml" => Ok(OutputFormat::Yaml),
            "csv" => Ok(OutputFormat::Csv),
            other => Err(Error::parse(format!("unknown output format '{}'", other))),
        }
    }
}

/// One serialized entry of the JSON, YAML and CSV formats.
#[derive(Debug, Serialize)]
struct OutputRow<'a> {
    id: &'a str,
    title: &'a str,
    url: String,
    rating: f64,
    score: f64,
    votes: u64,
    follows: u64,
}

impl<'a> From<&'a RankedCandidate> for OutputRow<'a> {
    fn from(entry: &'a RankedCandidate) -> Self {
        Self {
            id: &entry.candidate.id,
            title: &entry.candidate.title,
            url: entry.candidate.url(),
            rating: entry.candidate.rating,
            score: entry.score,
            votes: entry.candidate.votes,
            follows: entry.candidate.follows,
        }
    }
}

const CSV_HEADER: &str = "id,title,url,rating,score,votes,follows";

/// Writes `ranked` to `out` in the requested format.
///
/// # Errors
///
/// [`Error::Io`] if writing fails, [`Error::Json`] or [`Error::Yaml`] if
/// encoding fails.
pub fn write_ranked<W: Write>(
    out: &mut W,
    ranked: &[RankedCandidate],
    format: OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Simple => {
            for entry in ranked {
                writeln!(out, "{}", entry.candidate.title)?;
            }
        }
        OutputFormat::Wide => {
            for (i, entry) in ranked.iter().enumerate() {
                writeln!(
                    out,
                    "{:>3}. {:72} {:.2} ({:.2} x {})",
                    i + 1,
                    entry.candidate.title,
                    entry.score,
                    entry.candidate.rating,
                    entry.candidate.votes
                )?;
            }
        }
        OutputFormat::Json => {
            let rows: Vec<OutputRow<'_>> = ranked.iter().map(OutputRow::from).collect();
            serde_json::to_writer(&mut *out, &rows)?;
            writeln!(out)?;
        }
        OutputFormat::Yaml => {
            let rows: Vec<OutputRow<'_>> = ranked.iter().map(OutputRow::from).collect();
            serde_yaml::to_writer(&mut *out, &rows)?;
        }
        OutputFormat::Csv => {
            writeln!(out, "{}", CSV_HEADER)?;
            for entry in ranked {
                let row = OutputRow::from(entry);
                writeln!(
                    out,
                    "{},{},{},{},{},{},{}",
                    csv_field(row.id),
                    csv_field(row.title),
                    csv_field(&row.url),
                    row.rating,
                    row.score,
                    row.votes,
                    row.follows
                )?;
            }
        }
    }

    out.flush()?;
    Ok(())
}

/// Quotes a CSV field when it contains a delimiter, quote or line break.
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
