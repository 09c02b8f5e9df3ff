use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use docchunk::{
    ChunkConfig, ChunkStats, ChunkStore, Document, HeuristicTokenizer, SemanticChunker, TextChunk,
    logging,
};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn};
use walkdir::WalkDir;

/// Form feed separating pages in extracted text
const PAGE_FEED: char = '\x0c';

/// Characters of content shown per chunk in summaries
const PREVIEW_CHARS: usize = 60;

#[derive(Debug, Parser)]
#[command(name = "docchunk", version, about = "Structure-aware document chunking")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Chunk one text file
    Chunk(ChunkArgs),

    /// Print chunk statistics for one text file as JSON
    Stats {
        input: PathBuf,

        #[command(flatten)]
        options: ChunkOptions,
    },

    /// Chunk every .txt and .md file under a directory
    Batch {
        dir: PathBuf,

        #[command(flatten)]
        options: ChunkOptions,
    },

    /// Inspect chunks stored in a database
    Show(ShowArgs),
}

#[derive(Debug, Args)]
struct ChunkArgs {
    /// Extracted text; pages separated by form feeds
    input: PathBuf,

    #[command(flatten)]
    options: ChunkOptions,

    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,

    /// Persist chunks to this SQLite database
    #[arg(long)]
    db: Option<PathBuf>,

    /// Document id used in the database (defaults to the file stem)
    #[arg(long, requires = "db")]
    document_id: Option<String>,
}

#[derive(Debug, Args)]
struct ChunkOptions {
    /// TOML file with chunker settings
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    min_tokens: Option<usize>,

    #[arg(long)]
    max_tokens: Option<usize>,

    #[arg(long)]
    overlap_tokens: Option<usize>,

    /// Skip heading detection (no section titles or parent chunks)
    #[arg(long)]
    no_structure: bool,

    #[arg(long)]
    no_dedup: bool,

    /// Fold undersized chunks into their successors
    #[arg(long)]
    merge_small: bool,
}

#[derive(Debug, Args)]
struct ShowArgs {
    #[arg(long)]
    db: PathBuf,

    #[arg(long)]
    document_id: String,

    /// Include parent and child chunks
    #[arg(long)]
    hierarchy: bool,

    /// Only chunks containing this text (case-insensitive)
    #[arg(long)]
    query: Option<String>,

    #[arg(long, default_value_t = 20)]
    limit: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Summary,
}

impl ChunkOptions {
    fn config(&self) -> Result<ChunkConfig> {
        let mut config = match &self.config {
            Some(path) => ChunkConfig::from_file(path)?,
            None => ChunkConfig::default(),
        };

        if let Some(min_tokens) = self.min_tokens {
            config.min_tokens = min_tokens;
        }
        if let Some(max_tokens) = self.max_tokens {
            config.max_tokens = max_tokens;
        }
        if let Some(overlap_tokens) = self.overlap_tokens {
            config.overlap_tokens = overlap_tokens;
        }
        if self.no_structure {
            config.detect_structure = false;
        }
        if self.no_dedup {
            config.enable_deduplication = false;
        }

        Ok(config)
    }

    fn chunker(&self) -> Result<SemanticChunker> {
        let chunker = SemanticChunker::new(self.config()?, HeuristicTokenizer)
            .context("Invalid chunker settings")?;
        Ok(chunker)
    }

    fn finish(&self, chunker: &SemanticChunker, chunks: Vec<TextChunk>) -> Vec<TextChunk> {
        if self.merge_small {
            chunker.merge_small_chunks(chunks)
        } else {
            chunks
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match cli.command {
        Commands::Chunk(args) => run_chunk(args),
        Commands::Stats { input, options } => run_stats(&input, &options),
        Commands::Batch { dir, options } => run_batch(&dir, &options),
        Commands::Show(args) => run_show(args),
    }
}

fn run_chunk(args: ChunkArgs) -> Result<()> {
    let chunker = args.options.chunker()?;
    let document = read_document(&args.input)?;
    let chunks = chunker
        .chunk_document(&document)
        .with_context(|| format!("Failed to chunk {}", args.input.display()))?;
    let chunks = args.options.finish(&chunker, chunks);

    if let Some(db_path) = &args.db {
        let document_id = match &args.document_id {
            Some(id) => id.clone(),
            None => file_stem(&args.input),
        };
        let mut store = ChunkStore::open(db_path)?;
        let title = args.input.file_name().and_then(|n| n.to_str());
        store.upsert_document(&document_id, title, document.page_count())?;
        let stored = store.store_chunks(&document_id, &chunks)?;
        info!("Stored {} chunks as {} in {}", stored, document_id, db_path.display());
    }

    match args.format {
        OutputFormat::Json => print_json(&chunks),
        OutputFormat::Summary => {
            print_summary(&chunks);
            Ok(())
        }
    }
}

fn run_stats(input: &Path, options: &ChunkOptions) -> Result<()> {
    let chunker = options.chunker()?;
    let document = read_document(input)?;
    let chunks = chunker
        .chunk_document(&document)
        .with_context(|| format!("Failed to chunk {}", input.display()))?;
    let chunks = options.finish(&chunker, chunks);

    print_json(&ChunkStats::from_chunks(&chunks))
}

fn run_batch(dir: &Path, options: &ChunkOptions) -> Result<()> {
    let start_time = Instant::now();
    let chunker = options.chunker()?;

    let paths: Vec<PathBuf> = WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext == "txt" || ext == "md")
        })
        .collect();

    let mut inputs = Vec::with_capacity(paths.len());
    for path in paths {
        match read_document(&path) {
            Ok(document) => inputs.push((path, document)),
            Err(e) => warn!("Skipping {}: {:#}", path.display(), e),
        }
    }

    let documents: Vec<Document> = inputs.iter().map(|(_, d)| d.clone()).collect();
    let results = chunker.chunk_documents(&documents);

    let mut total_chunks = 0;
    let mut failures = 0;
    for ((path, _), result) in inputs.iter().zip(results) {
        match result {
            Ok(chunks) => {
                let chunks = options.finish(&chunker, chunks);
                let stats = ChunkStats::from_chunks(&chunks);
                total_chunks += stats.total_chunks;
                println!(
                    "✓ {}: {} chunks, {} tokens, {} sections",
                    path.display(),
                    stats.total_chunks,
                    stats.total_tokens,
                    stats.distinct_sections
                );
            }
            Err(e) => {
                failures += 1;
                println!("✗ {}: {}", path.display(), e);
            }
        }
    }

    println!(
        "\n{} files, {} chunks, {} failures [{:.2}s]",
        inputs.len(),
        total_chunks,
        failures,
        start_time.elapsed().as_secs_f64()
    );
    Ok(())
}

fn run_show(args: ShowArgs) -> Result<()> {
    let store = ChunkStore::open(&args.db)?;

    let chunks = match &args.query {
        Some(query) => store.search_chunks(&args.document_id, query, args.limit)?,
        None => {
            let mut chunks = store.document_chunks(&args.document_id, args.hierarchy)?;
            chunks.truncate(args.limit);
            chunks
        }
    };

    print_summary(&chunks);
    Ok(())
}

/// Load a text file, splitting pages on form feeds
fn read_document(path: &Path) -> Result<Document> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let pages: Vec<&str> = text.split(PAGE_FEED).collect();
    Ok(Document::from_pages(&pages))
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("document")
        .to_string()
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", json);
    Ok(())
}

fn print_summary(chunks: &[TextChunk]) {
    for chunk in chunks {
        let marker = if chunk.metadata.is_parent { "P" } else { " " };
        let pages = match (chunk.start_page, chunk.end_page) {
            (Some(start), Some(end)) if start != end => format!("p{}-{}", start, end),
            (Some(start), _) => format!("p{}", start),
            _ => "-".to_string(),
        };
        let preview: String = chunk
            .content
            .chars()
            .take(PREVIEW_CHARS)
            .map(|c| if c.is_whitespace() { ' ' } else { c })
            .collect();
        println!(
            "{}[{:>4}] L{} {:>5} tokens {:<7} {:<24} {}",
            marker,
            chunk.chunk_index,
            chunk.chunk_level,
            chunk.token_count,
            pages,
            chunk.section_title.as_deref().unwrap_or("-"),
            preview
        );
    }

    let stats = ChunkStats::from_chunks(chunks);
    println!(
        "\n{} chunks, {} tokens (min {}, max {}, avg {:.1}), {} parents",
        stats.total_chunks,
        stats.total_tokens,
        stats.min_tokens,
        stats.max_tokens,
        stats.avg_tokens,
        stats.parent_chunks
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_chunk_overrides() {
        let cli = Cli::try_parse_from([
            "docchunk",
            "chunk",
            "report.txt",
            "--min-tokens",
            "50",
            "--max-tokens",
            "120",
            "--no-dedup",
            "--format",
            "summary",
        ])
        .unwrap();

        let Commands::Chunk(args) = cli.command else {
            panic!("expected chunk command");
        };
        assert_eq!(args.format, OutputFormat::Summary);

        let config = args.options.config().unwrap();
        assert_eq!(config.min_tokens, 50);
        assert_eq!(config.max_tokens, 120);
        assert_eq!(config.overlap_tokens, 200);
        assert!(!config.enable_deduplication);
        assert!(config.detect_structure);
        // Overlap default exceeds the new max
        assert!(args.options.chunker().is_err());
    }

    #[test]
    fn test_overrides_layer_on_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chunker.toml");
        std::fs::write(&path, "max_tokens = 500\n").unwrap();

        let cli = Cli::try_parse_from([
            "docchunk",
            "stats",
            "report.txt",
            "--config",
            path.to_str().unwrap(),
            "--min-tokens",
            "100",
        ])
        .unwrap();

        let Commands::Stats { options, .. } = cli.command else {
            panic!("expected stats command");
        };
        let chunker = options.chunker().unwrap();
        assert_eq!(chunker.config().min_tokens, 100);
        assert_eq!(chunker.config().max_tokens, 500);
        assert_eq!(chunker.config().overlap_tokens, 200);
    }

    #[test]
    fn test_document_id_requires_db() {
        let result = Cli::try_parse_from(["docchunk", "chunk", "a.txt", "--document-id", "x"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_read_document_splits_pages() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("paged.txt");
        std::fs::write(&path, "Page one.\x0cPage two.").unwrap();

        let document = read_document(&path).unwrap();
        assert_eq!(document.page_count(), 2);
        assert_eq!(document.text, "Page one.\n\nPage two.");
        assert_eq!(file_stem(&path), "paged");
    }
}
