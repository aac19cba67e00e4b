use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use futures::stream::{self, StreamExt};

use masthead::report::{format_block, render_report};
use masthead::resolver::resolve;
use masthead::source::{find_known, ResolutionResult, Source, KNOWN_SOURCES};

/// How many sources resolve at once. Seeds inside one source stay
/// strictly sequential; only independent sources overlap.
const MAX_CONCURRENT_SOURCES: usize = 4;

/// Source resolved when neither `--source` nor `--url` is given.
const DEFAULT_SOURCE: &str = "pravda";

#[derive(Parser, Debug)]
#[command(
    name = "masthead",
    version,
    about = "Fetch news headlines via RSS/Atom discovery, with an HTML fallback for blocked or feedless sites"
)]
struct Args {
    /// Built-in source name, or "all" for every built-in source
    #[arg(long, value_name = "NAME")]
    source: Option<String>,

    /// Resolve this page or feed URL instead of a built-in source
    #[arg(long, value_name = "URL")]
    url: Option<String>,

    /// Maximum headlines per source (values <= 0 fall back to the
    /// extraction default of 50)
    #[arg(long, default_value_t = 40, allow_negative_numbers = true)]
    limit: i64,

    /// Keep only titles containing this substring (case-insensitive,
    /// any script)
    #[arg(long, value_name = "WORD")]
    keyword: Option<String>,

    /// Permit a browser-imitating retry pass for pages that block the
    /// standard client
    #[arg(long)]
    alternate: bool,

    /// Mirror the report to this file
    #[arg(long, value_name = "FILE")]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Diagnostics are opt-in via RUST_LOG; the report itself owns stdout.
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let sources = select_sources(&args)?;

    let allow_alternate = args.alternate;
    let mut resolutions = stream::iter(sources)
        .map(|source| async move {
            let result = resolve(&source, allow_alternate).await;
            (source, result)
        })
        .buffered(MAX_CONCURRENT_SOURCES);

    let mut resolved: Vec<(String, ResolutionResult)> = Vec::new();
    while let Some((source, result)) = resolutions.next().await {
        let result =
            result.with_context(|| format!("failed to resolve source '{}'", source.name))?;

        print!("{}", format_block(&source.name, &result));
        println!();
        resolved.push((source.name, result));
    }

    let total_items: usize = resolved.iter().map(|(_, result)| result.items.len()).sum();

    if let Some(path) = &args.output {
        let report = render_report(resolved.iter().map(|(name, result)| (name.as_str(), result)));
        std::fs::write(path, &report)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        println!("Saved report to {}", path.display());
    }

    // Every requested source coming up empty means the run found nothing,
    // even though each individual empty source is a legitimate outcome.
    if total_items == 0 {
        std::process::exit(1);
    }
    Ok(())
}

/// Expands the CLI selection into concrete sources. `--url` wins over
/// `--source`; an unknown source name is the one selection error worth
/// failing on before any network traffic.
fn select_sources(args: &Args) -> Result<Vec<Source>> {
    if let Some(url) = &args.url {
        return Ok(vec![Source {
            name: "custom".to_string(),
            seeds: vec![url.clone()],
            keyword: args.keyword.clone(),
            limit: args.limit,
        }]);
    }

    let selection = args.source.as_deref().unwrap_or(DEFAULT_SOURCE);
    if selection.eq_ignore_ascii_case("all") {
        return Ok(KNOWN_SOURCES
            .iter()
            .map(|known| known.to_source(args.keyword.clone(), args.limit))
            .collect());
    }

    match find_known(selection) {
        Some(known) => Ok(vec![known.to_source(args.keyword.clone(), args.limit)]),
        None => {
            let names: Vec<&str> = KNOWN_SOURCES.iter().map(|known| known.name).collect();
            bail!(
                "unknown source '{}': expected one of {}, \"all\", or --url",
                selection,
                names.join(", ")
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_args(argv: &[&str]) -> Args {
        Args::parse_from(argv)
    }

    #[test]
    fn test_default_selection_is_pravda() {
        let sources = select_sources(&parse_args(&["masthead"])).unwrap();
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].name, "pravda");
        assert_eq!(sources[0].limit, 40);
        assert_eq!(sources[0].keyword, None);
    }

    #[test]
    fn test_url_takes_precedence_over_source() {
        let args = parse_args(&[
            "masthead",
            "--source",
            "bbc",
            "--url",
            "https://example.com/news",
            "--keyword",
            "tech",
            "--limit",
            "5",
        ]);
        let sources = select_sources(&args).unwrap();
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].name, "custom");
        assert_eq!(sources[0].seeds, vec!["https://example.com/news".to_string()]);
        assert_eq!(sources[0].keyword.as_deref(), Some("tech"));
        assert_eq!(sources[0].limit, 5);
    }

    #[test]
    fn test_all_expands_to_every_known_source() {
        let sources = select_sources(&parse_args(&["masthead", "--source", "all"])).unwrap();
        assert_eq!(sources.len(), KNOWN_SOURCES.len());
        assert_eq!(sources[0].name, KNOWN_SOURCES[0].name);
    }

    #[test]
    fn test_source_lookup_is_case_insensitive() {
        let sources = select_sources(&parse_args(&["masthead", "--source", "BBC"])).unwrap();
        assert_eq!(sources[0].name, "bbc");
    }

    #[test]
    fn test_unknown_source_is_rejected() {
        let error = select_sources(&parse_args(&["masthead", "--source", "nosuch"]))
            .unwrap_err()
            .to_string();
        assert!(error.contains("unknown source 'nosuch'"));
        assert!(error.contains("pravda"));
    }

    #[test]
    fn test_negative_limit_is_accepted_verbatim() {
        // Clamping to the default cap happens at extraction time, not in
        // argument handling.
        let args = parse_args(&["masthead", "--limit", "-1"]);
        let sources = select_sources(&args).unwrap();
        assert_eq!(sources[0].limit, -1);
    }
}
