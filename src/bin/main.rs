use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use tower_lsp_server::ls_types::{Position, PublishDiagnosticsParams, Range};
use url::Url;
use utsushi::UtsushiResult;
use utsushi::config::load_settings;
use utsushi::error::UtsushiError;
use utsushi::expansion::ExpansionOutput;
use utsushi::lsp::{LineMap, to_lsp_diagnostic, url_to_uri};
use utsushi::mapping::{IdentityMapper, PositionMapper, SegmentMap};
use utsushi::remap::from_expander;

/// Inspect recorded expander output: segment maps, offsets and diagnostics
#[derive(Parser)]
#[command(name = "utsushi")]
#[command(version)]
#[command(about = "Inspect recorded expander output")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Direction {
    /// Original offset to expanded offset
    ToExpanded,
    /// Expanded offset to original offset
    ToOriginal,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the segment mapping of an expansion output file
    Check {
        /// Expander output (JSON)
        expansion: PathBuf,
    },
    /// Translate an offset or span through the segment mapping
    Map {
        /// Expander output (JSON)
        expansion: PathBuf,

        #[arg(value_enum)]
        direction: Direction,

        /// Byte offset to translate
        offset: usize,

        /// Translate the span [offset, offset + length) instead of a single offset
        #[arg(long)]
        length: Option<usize>,
    },
    /// Translate an LSP range in the expanded code to the original source
    Range {
        /// Expander output (JSON); its `code` is the expanded text
        expansion: PathBuf,

        /// Original source file the output was produced from
        source: PathBuf,

        start_line: u32,
        start_character: u32,
        end_line: u32,
        end_character: u32,
    },
    /// Print the expander diagnostics of a source file as LSP diagnostics
    Diagnostics {
        /// Expander output (JSON)
        expansion: PathBuf,

        /// Original source file the output was produced from
        source: PathBuf,

        /// Project configuration file merged over the user configuration
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Check { expansion } => check(&expansion),
        Commands::Map {
            expansion,
            direction,
            offset,
            length,
        } => map(&expansion, direction, offset, length),
        Commands::Range {
            expansion,
            source,
            start_line,
            start_character,
            end_line,
            end_character,
        } => range(
            &expansion,
            &source,
            Range::new(
                Position::new(start_line, start_character),
                Position::new(end_line, end_character),
            ),
        ),
        Commands::Diagnostics {
            expansion,
            source,
            config,
        } => diagnostics(&expansion, &source, config.as_deref()),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn read_output(path: &Path) -> UtsushiResult<ExpansionOutput> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

fn mapper_for(output: ExpansionOutput) -> UtsushiResult<Box<dyn PositionMapper>> {
    Ok(match output.segment_mapping {
        Some(mapping) => Box::new(SegmentMap::from_mapping(mapping)?),
        None => Box::new(IdentityMapper),
    })
}

fn check(path: &Path) -> UtsushiResult<()> {
    let output = read_output(path)?;
    let Some(mapping) = output.segment_mapping else {
        println!("No segment mapping; positions map by identity");
        return Ok(());
    };
    let map = SegmentMap::from_mapping(mapping)?;
    println!(
        "OK: {} segment(s), {} generated region(s)",
        map.segments().len(),
        map.generated_regions().len()
    );
    Ok(())
}

fn map(
    path: &Path,
    direction: Direction,
    offset: usize,
    length: Option<usize>,
) -> UtsushiResult<()> {
    let mapper = mapper_for(read_output(path)?)?;

    match (direction, length) {
        (Direction::ToExpanded, None) => println!("{}", mapper.original_to_expanded(offset)),
        (Direction::ToExpanded, Some(length)) => {
            let span = mapper.map_span_to_expanded(offset, length);
            println!("{} {}", span.start, span.length);
        }
        (Direction::ToOriginal, None) => match mapper.expanded_to_original(offset) {
            Some(mapped) => println!("{}", mapped),
            None => return Err(generated_error(mapper.as_ref(), offset)),
        },
        (Direction::ToOriginal, Some(length)) => {
            match mapper.map_span_to_original(offset, length) {
                Some(span) => println!("{} {}", span.start, span.length),
                None => return Err(generated_error(mapper.as_ref(), offset)),
            }
        }
    }
    Ok(())
}

fn generated_error(mapper: &dyn PositionMapper, offset: usize) -> UtsushiError {
    match mapper.generated_by(offset) {
        Some(label) => UtsushiError::invalid_input(format!(
            "offset {} is inside code generated by '{}'",
            offset, label
        )),
        None => UtsushiError::invalid_input(format!(
            "span at offset {} ends inside generated code",
            offset
        )),
    }
}

fn range(path: &Path, source: &Path, expanded_range: Range) -> UtsushiResult<()> {
    let output = read_output(path)?;
    let span = LineMap::new(&output.code).range_to_span(expanded_range);
    let mapper = mapper_for(output)?;
    let Some(mapped) = mapper.map_span_to_original(span.start, span.length) else {
        return Err(generated_error(mapper.as_ref(), span.start));
    };
    let text = std::fs::read_to_string(source)?;
    println!(
        "{}",
        serde_json::to_string(&LineMap::new(&text).span_to_range(mapped))?
    );
    Ok(())
}

fn diagnostics(path: &Path, source: &Path, config: Option<&Path>) -> UtsushiResult<()> {
    let settings = load_settings(config)?;
    let output = read_output(path)?;
    let text = std::fs::read_to_string(source)?;
    let lines = LineMap::new(&text);
    let uri = Url::from_file_path(std::fs::canonicalize(source)?)
        .ok()
        .as_ref()
        .and_then(url_to_uri)
        .ok_or_else(|| {
            UtsushiError::invalid_input(format!("cannot build a URI for {}", source.display()))
        })?;

    let converted: Vec<_> = output
        .diagnostics
        .iter()
        .map(|diagnostic| {
            to_lsp_diagnostic(
                &from_expander(diagnostic, &settings.diagnostic_source),
                &lines,
            )
        })
        .collect();
    let params = PublishDiagnosticsParams::new(uri, converted, None);
    println!("{}", serde_json::to_string_pretty(&params)?);
    Ok(())
}
