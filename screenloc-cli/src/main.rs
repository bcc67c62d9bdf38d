use clap::Parser;
use screenloc::image::io::load_gray_image;
use screenloc::{
    FindStrategy, ImageComparer, LocateRequest, LocatorConfig, Match, MatchLocator, Pattern,
    Region, ScaleConfig, SearchBackend, StaticCapture, SystemClock, ZnccBackend, ZnccConfig,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

const SCHEMA_JSON: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.schema.json"));
const EXAMPLE_JSON: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.example.json"));

#[derive(Parser, Debug)]
#[command(author, version, about = "ScreenLoc CLI (JSON config driven)")]
struct Cli {
    /// Path to the JSON configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "config.json")]
    config: PathBuf,
    /// Print the JSON schema and exit.
    #[arg(long)]
    print_schema: bool,
    /// Print an example config and exit.
    #[arg(long)]
    print_example: bool,
    /// Enable tracing output for performance profiling.
    #[arg(long)]
    trace: bool,
}

#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
enum Mode {
    #[default]
    Locate,
    Compare,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
enum StrategyConfig {
    #[default]
    All,
    Best,
    First,
    Each,
}

impl From<StrategyConfig> for FindStrategy {
    fn from(value: StrategyConfig) -> Self {
        match value {
            StrategyConfig::All => FindStrategy::All,
            StrategyConfig::Best => FindStrategy::Best,
            StrategyConfig::First => FindStrategy::First,
            StrategyConfig::Each => FindStrategy::Each,
        }
    }
}

fn to_region([x, y, w, h]: [i32; 4]) -> Region {
    Region::new(x, y, w, h)
}

#[derive(Debug, Deserialize)]
struct PatternJson {
    name: String,
    path: String,
    #[serde(default)]
    declared_regions: Vec<[i32; 4]>,
    #[serde(default)]
    fixed: bool,
    #[serde(default)]
    fixed_region: Option<[i32; 4]>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct RequestJson {
    strategy: StrategyConfig,
    similarity: f64,
    max_matches: Option<usize>,
    search_regions: Vec<[i32; 4]>,
}

impl Default for RequestJson {
    fn default() -> Self {
        let request = LocateRequest::default();
        Self {
            strategy: StrategyConfig::All,
            similarity: request.similarity(),
            max_matches: None,
            search_regions: Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct LocatorJson {
    scale_search: bool,
    merge_adjacent: bool,
    max_hits_per_search: usize,
}

impl Default for LocatorJson {
    fn default() -> Self {
        let cfg = LocatorConfig::default();
        Self {
            scale_search: cfg.scale_search,
            merge_adjacent: cfg.merge_adjacent,
            max_hits_per_search: cfg.max_hits_per_search,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct ScaleJson {
    candidates: Vec<f64>,
    min_similarity: f64,
    tie_epsilon: f64,
}

impl Default for ScaleJson {
    fn default() -> Self {
        let cfg = ScaleConfig::default();
        Self {
            candidates: cfg.candidates,
            min_similarity: cfg.min_similarity,
            tie_epsilon: cfg.tie_epsilon,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct BackendJson {
    parallel: bool,
    min_var_i: f32,
    scan_limit: usize,
    suppress_overlaps: bool,
}

impl Default for BackendJson {
    fn default() -> Self {
        let cfg = ZnccConfig::default();
        Self {
            parallel: cfg.parallel,
            min_var_i: cfg.min_var_i,
            scan_limit: cfg.scan_limit,
            suppress_overlaps: cfg.suppress_overlaps,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Config {
    mode: Mode,
    scene_path: String,
    output_path: Option<String>,
    patterns: Vec<PatternJson>,
    request: RequestJson,
    locator: LocatorJson,
    scale: ScaleJson,
    backend: BackendJson,
}

#[derive(Debug, Serialize)]
struct MatchRecord {
    pattern: Option<String>,
    x: i32,
    y: i32,
    w: i32,
    h: i32,
    center: (i32, i32),
    confidence: f64,
    scale: f64,
}

impl From<&Match> for MatchRecord {
    fn from(value: &Match) -> Self {
        Self {
            pattern: value.name.clone(),
            x: value.region.x(),
            y: value.region.y(),
            w: value.region.w(),
            h: value.region.h(),
            center: value.location(),
            confidence: value.confidence,
            scale: value.scale,
        }
    }
}

#[derive(Debug, Serialize)]
struct Output {
    best: Option<MatchRecord>,
    matches: Vec<MatchRecord>,
}

fn load_pattern(cfg: PatternJson) -> Result<Arc<Pattern>, Box<dyn std::error::Error>> {
    let image = load_gray_image(&cfg.path)?;
    let mut pattern = Pattern::new(cfg.name, Some(image))
        .with_declared_regions(cfg.declared_regions.into_iter().map(to_region).collect())
        .with_fixed(cfg.fixed);
    if let Some(region) = cfg.fixed_region {
        pattern = pattern.with_fixed_region(to_region(region));
    }
    Ok(Arc::new(pattern))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.trace {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env().add_directive("screenloc=info".parse()?))
            .with_target(false)
            .init();
    }

    if cli.print_schema {
        println!("{SCHEMA_JSON}");
        return Ok(());
    }
    if cli.print_example {
        println!("{EXAMPLE_JSON}");
        return Ok(());
    }

    let config_text = fs::read_to_string(&cli.config)?;
    let config: Config = serde_json::from_str(&config_text)?;
    if config.scene_path.is_empty() || config.patterns.is_empty() {
        return Err("scene_path and at least one pattern must be set in the config".into());
    }

    let scene = load_gray_image(&config.scene_path)?;
    let patterns = config
        .patterns
        .into_iter()
        .map(load_pattern)
        .collect::<Result<Vec<_>, _>>()?;

    let backend: Arc<dyn SearchBackend> = Arc::new(ZnccBackend::with_config(ZnccConfig {
        parallel: config.backend.parallel,
        min_var_i: config.backend.min_var_i,
        scan_limit: config.backend.scan_limit,
        suppress_overlaps: config.backend.suppress_overlaps,
    })?);

    let matches = match config.mode {
        Mode::Locate => {
            let locator = MatchLocator::with_config(
                backend,
                Arc::new(StaticCapture::new(scene)),
                Arc::new(SystemClock::new()),
                LocatorConfig {
                    scale_search: config.locator.scale_search,
                    merge_adjacent: config.locator.merge_adjacent,
                    max_hits_per_search: config.locator.max_hits_per_search,
                    ..LocatorConfig::default()
                },
            )?
            .with_scale_config(ScaleConfig {
                candidates: config.scale.candidates,
                min_similarity: config.scale.min_similarity,
                tie_epsilon: config.scale.tie_epsilon,
            })?;

            let mut request = LocateRequest::new()
                .with_patterns(patterns)
                .with_strategy(config.request.strategy.into())
                .with_similarity(config.request.similarity);
            if let Some(max_matches) = config.request.max_matches {
                request = request.with_max_matches(max_matches);
            }
            if !config.request.search_regions.is_empty() {
                request = request.with_search_regions(
                    config
                        .request
                        .search_regions
                        .into_iter()
                        .map(to_region)
                        .collect::<Vec<_>>(),
                );
            }
            locator.locate(&request)?
        }
        Mode::Compare => {
            let comparer =
                ImageComparer::new(backend).with_min_similarity(config.request.similarity);
            let target = Arc::new(Pattern::new("scene", Some(scene)));
            let best = comparer.compare_best(&patterns, Some(&target))?;
            if best.is_empty() {
                Vec::new()
            } else {
                vec![best]
            }
        }
    };

    let best = matches
        .iter()
        .max_by(|a, b| a.confidence.total_cmp(&b.confidence))
        .map(MatchRecord::from);
    let output = Output {
        best,
        matches: matches.iter().map(MatchRecord::from).collect(),
    };
    let json = serde_json::to_string_pretty(&output)?;

    match config.output_path {
        Some(path) => fs::write(path, json)?,
        None => println!("{json}"),
    }

    Ok(())
}
