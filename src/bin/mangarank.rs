//! mangarank - rank MangaDex search results by Bayesian-averaged rating
//!
//! Credentials for account-specific content preferences are read from
//! `MANGADEX_USERNAME` and `MANGADEX_PASSWORD`. Logs go to stderr so the
//! ranked list on stdout can be piped.

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use std::collections::BTreeSet;
use std::io::Write;
use tracing::info;
use tracing_subscriber::EnvFilter;

use mangarank::prelude::*;
use mangarank::sources::MangaDexCatalog;
use mangarank::types::DEFAULT_PAGES;

/// Rank manga from MangaDex by a vote-weighted rating
#[derive(Parser, Debug)]
#[command(name = "mangarank", version, about, long_about = None)]
struct Args {
    /// Tags which manga must match. Omit to match any tags
    #[arg(short = 'm', long = "match-tags", num_args = 1.., value_name = "TAG")]
    match_tags: Vec<String>,

    /// Tags which manga must not match. Omit to disable tag exclusion
    #[arg(short = 'x', long = "exclude-tags", num_args = 1.., value_name = "TAG")]
    exclude_tags: Vec<String>,

    /// Print the available tags and exit
    #[arg(short, long)]
    list_tags: bool,

    /// Number of search result pages to read (100 titles each). Titles whose
    /// vote breakdown is missing from the batch statistics cost one extra
    /// request each, so large values can take minutes
    #[arg(short, long, default_value_t = DEFAULT_PAGES, value_name = "N")]
    pages: usize,

    /// Print at most this many entries
    #[arg(short = 'n', long, value_name = "N")]
    limit: Option<usize>,

    /// Only print entries whose adjusted rating is above this value (0.0 to 10.0)
    #[arg(long, value_name = "RATING", value_parser = parse_rating)]
    minimum_rating: Option<f64>,

    /// Votes at which a title's own average and the overall mean weigh the same
    #[arg(long, value_name = "VOTES", value_parser = parse_votes, conflicts_with = "min_votes_percentile")]
    min_votes: Option<f64>,

    /// Derive the vote threshold from this percentile of the fetched vote counts
    #[arg(long, value_name = "PERCENTILE", value_parser = parse_percentile)]
    min_votes_percentile: Option<f64>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Wide)]
    format: OutputFormat,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn threshold(&self) -> ConfidenceThreshold {
        match (self.min_votes, self.min_votes_percentile) {
            (_, Some(percentile)) => ConfidenceThreshold::Percentile(percentile),
            (Some(votes), None) => ConfidenceThreshold::Fixed(votes),
            (None, None) => ConfidenceThreshold::default(),
        }
    }

    fn filters(&self) -> Result<SearchFilters> {
        let filters = SearchFiltersBuilder::default()
            .include_tags(self.match_tags.iter().cloned().collect::<BTreeSet<_>>())
            .exclude_tags(self.exclude_tags.iter().cloned().collect::<BTreeSet<_>>())
            .pages(self.pages)
            .build()?;
        Ok(filters)
    }
}

fn parse_bounded(value: &str, min: f64, max: f64) -> std::result::Result<f64, String> {
    let parsed: f64 = value
        .parse()
        .map_err(|_| format!("'{}' is not a number", value))?;
    if !parsed.is_finite() || parsed < min || parsed > max {
        return Err(format!("must be between {} and {}", min, max));
    }
    Ok(parsed)
}

fn parse_rating(value: &str) -> std::result::Result<f64, String> {
    parse_bounded(value, 0.0, 10.0)
}

fn parse_votes(value: &str) -> std::result::Result<f64, String> {
    parse_bounded(value, 1.0, f64::MAX).map_err(|_| "must be a number of at least 1".to_string())
}

fn parse_percentile(value: &str) -> std::result::Result<f64, String> {
    parse_bounded(value, 0.0, 100.0)
}

/// Filter directives: a non-empty `RUST_LOG` wins, then `--verbose`.
fn log_directives(verbose: bool, rust_log: Option<String>) -> String {
    match rust_log {
        Some(directives) if !directives.trim().is_empty() => directives,
        _ if verbose => "mangarank=debug".to_string(),
        _ => "warn".to_string(),
    }
}

fn init_logging(verbose: bool) {
    let directives = log_directives(verbose, std::env::var(EnvFilter::DEFAULT_ENV).ok());
    let filter = EnvFilter::try_new(directives).unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Args::parse();
    init_logging(args.verbose);

    // Contradictory filters fail before anything is sent
    let filters = args.filters()?;
    filters.validate()?;

    let catalog = MangaDexCatalog::new(CatalogConfig::from_env())
        .authenticate()
        .await
        .wrap_err("Could not log in to MangaDex")?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    if args.list_tags {
        let tags = catalog
            .tags()
            .await
            .wrap_err("Could not fetch the MangaDex tag list")?;
        for tag in tags {
            writeln!(out, "{}", tag.name.to_lowercase())?;
        }
        return Ok(());
    }

    let ranker = Ranker::new(args.threshold());
    let mut ranked = catalog
        .search()
        .filters(filters)
        .rank(&ranker)
        .await
        .wrap_err("Could not fetch candidates from MangaDex")?;

    if let Some(minimum) = args.minimum_rating {
        ranked = ranked.above(minimum);
    }
    if let Some(limit) = args.limit {
        ranked = ranked.top(limit);
    }

    info!(entries = ranked.len(), format = %args.format, "Printing ranking");
    write_ranked(&mut out, &ranked, args.format)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rust_log_overrides_verbose() {
        assert_eq!(
            log_directives(true, Some("mangarank=trace".to_string())),
            "mangarank=trace"
        );
        assert_eq!(log_directives(false, Some("info".to_string())), "info");
    }

    #[test]
    fn test_default_log_levels() {
        assert_eq!(log_directives(true, None), "mangarank=debug");
        assert_eq!(log_directives(false, None), "warn");
        assert_eq!(log_directives(true, Some("  ".to_string())), "mangarank=debug");
    }

    #[test]
    fn test_yaml_format_flag() {
        let args = Args::try_parse_from(["mangarank", "-f", "yaml"]).unwrap();
        assert_eq!(args.format, OutputFormat::Yaml);

        let args = Args::try_parse_from(["mangarank"]).unwrap();
        assert_eq!(args.format, OutputFormat::Wide);
        assert_eq!(args.pages, DEFAULT_PAGES);
    }

    #[test]
    fn test_threshold_flags() {
        let args = Args::try_parse_from(["mangarank", "--min-votes", "120"]).unwrap();
        assert_eq!(args.threshold(), ConfidenceThreshold::Fixed(120.0));

        let args = Args::try_parse_from(["mangarank", "--min-votes-percentile", "75"]).unwrap();
        assert_eq!(args.threshold(), ConfidenceThreshold::Percentile(75.0));

        assert!(
            Args::try_parse_from(["mangarank", "--min-votes", "5", "--min-votes-percentile", "50"])
                .is_err()
        );
        assert!(Args::try_parse_from(["mangarank", "--min-votes", "0"]).is_err());
    }
}
