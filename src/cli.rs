use crate::config::{Config, load_config};
use crate::evaluation::{compare_strategies, timed_layout};
use crate::geometry::{GeoPoint, Rect};
use crate::layout::{ArchimedeanPacker, LayoutRequest, Strategy};
use crate::layout_dump::{CloudDump, ComparisonDump, write_json};
use crate::poi::{Point, center_label, center_label_rect, display_name, prepare_points, within_radius};
use crate::text_metrics::{FontMeasurer, HeuristicMeasurer, TextMeasure};
use anyhow::{Context, Result};
use clap::Parser;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "poicloud",
    version,
    about = "Lay out point-of-interest labels as a bearing-preserving word cloud"
)]
pub struct Args {
    /// Input JSON array of points, or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Geographic center as LNG,LAT
    #[arg(long = "center", value_parser = parse_center, allow_hyphen_values = true)]
    pub center: GeoPoint,

    /// Placement strategy (single-angle-radial, multi-angle-radial, archimedean-spiral)
    #[arg(short = 's', long = "strategy")]
    pub strategy: Option<Strategy>,

    /// Config file (JSON5)
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Output file. Defaults to stdout.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Canvas width
    #[arg(short = 'w', long = "width")]
    pub width: Option<f32>,

    /// Canvas height
    #[arg(short = 'H', long = "height")]
    pub height: Option<f32>,

    /// Only keep points within this many kilometres of the center
    #[arg(long = "radius-km")]
    pub radius_km: Option<f64>,

    /// Do not reserve a label on the center
    #[arg(long = "no-center-label")]
    pub no_center_label: bool,

    /// Run every strategy and write their metrics side by side
    #[arg(long = "compare")]
    pub compare: bool,

    /// Measure text with built-in character widths instead of system fonts
    #[arg(long = "fast-text")]
    pub fast_text: bool,

    /// More log output (-v debug, -vv trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let mut config = load_config(args.config.as_deref())?;
    if let Some(width) = args.width {
        config.canvas.width = width;
    }
    if let Some(height) = args.height {
        config.canvas.height = height;
    }
    if let Some(strategy) = args.strategy {
        config.strategy = strategy;
    }

    let mut points = read_points(args.input.as_deref())?;
    if let Some(radius_km) = args.radius_km {
        let before = points.len();
        points = within_radius(&points, args.center, radius_km);
        tracing::info!(kept = points.len(), dropped = before - points.len(), radius_km, "filtered by radius");
    }
    prepare_points(&mut points, &config.font);

    if args.fast_text {
        execute(&args, &config, points, &HeuristicMeasurer)
    } else {
        let measurer = FontMeasurer::new().with_line_height(config.font.line_height);
        execute(&args, &config, points, &measurer)
    }
}

fn execute<M: TextMeasure + ?Sized>(
    args: &Args,
    config: &Config,
    points: Vec<Point>,
    measurer: &M,
) -> Result<()> {
    if args.compare {
        let dump = build_comparison(args, config, points, measurer)?;
        return write_json(args.output.as_deref(), &dump);
    }
    let dump = build_dump(args, config, points, measurer)?;
    write_json(args.output.as_deref(), &dump)
}

/// Take the center label out of `points` and measure its reserved rectangle.
fn reserve_center_label<M: TextMeasure + ?Sized>(
    args: &Args,
    config: &Config,
    points: &mut Vec<Point>,
    measurer: &M,
) -> Option<(String, Rect)> {
    if args.no_center_label {
        return None;
    }
    let (center_x, center_y) = config.canvas.center();
    let label = center_label(points, args.center, &config.font);
    if let Some(source) = label.source {
        // The nearest point is drawn as the center label, not as a satellite.
        points.remove(source);
    }
    let rect = center_label_rect(&label.text, &config.font, measurer, center_x, center_y);
    Some((label.text, rect))
}

fn build_dump<M: TextMeasure + ?Sized>(
    args: &Args,
    config: &Config,
    mut points: Vec<Point>,
    measurer: &M,
) -> Result<CloudDump> {
    let (center_x, center_y) = config.canvas.center();
    // The packer cannot keep a reserved box clear; the nearest point stays a
    // word and the largest word takes the center instead.
    let reserved = if config.strategy.is_bearing_constrained() {
        reserve_center_label(args, config, &mut points, measurer)
    } else {
        None
    };

    let request = LayoutRequest::new(&points, args.center, center_x, center_y, config)
        .with_reserved(reserved.as_ref().map(|(_, rect)| *rect));
    let language = config.font.language;
    let packer = ArchimedeanPacker::new(&config.packer);
    let timed = pollster::block_on(timed_layout(
        &request,
        measurer,
        |point: &Point| display_name(point, language),
        &packer,
    ))
    .with_context(|| format!("{} layout failed", request.strategy))?;

    let mut dump = CloudDump::new(
        request.strategy,
        args.center,
        center_x,
        center_y,
        &timed.placements,
        timed.metrics,
    );
    if let Some((text, rect)) = &reserved {
        dump = dump.with_center_label(text, *rect);
    }
    Ok(dump)
}

fn build_comparison<M: TextMeasure + ?Sized>(
    args: &Args,
    config: &Config,
    mut points: Vec<Point>,
    measurer: &M,
) -> Result<ComparisonDump> {
    let (center_x, center_y) = config.canvas.center();
    let reserved = reserve_center_label(args, config, &mut points, measurer);
    let request = LayoutRequest::new(&points, args.center, center_x, center_y, config)
        .with_reserved(reserved.map(|(_, rect)| rect));
    let language = config.font.language;
    let packer = ArchimedeanPacker::new(&config.packer);
    let reports = pollster::block_on(compare_strategies(
        &request,
        measurer,
        |point: &Point| display_name(point, language),
        &packer,
    ))?;
    Ok(ComparisonDump {
        center: args.center,
        label_count: points.len(),
        reports,
    })
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn read_points(path: Option<&Path>) -> Result<Vec<Point>> {
    let content = match path {
        Some(path) if path != Path::new("-") => std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?,
        _ => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };
    let points: Vec<Point> = serde_json::from_str(&content).context("parsing points")?;
    Ok(points)
}

/// Parse `LNG,LAT` in degrees.
pub fn parse_center(value: &str) -> std::result::Result<GeoPoint, String> {
    let (lng, lat) = value
        .split_once(',')
        .ok_or_else(|| format!("expected LNG,LAT, got '{value}'"))?;
    let lng: f64 = lng
        .trim()
        .parse()
        .map_err(|_| format!("invalid longitude '{}'", lng.trim()))?;
    let lat: f64 = lat
        .trim()
        .parse()
        .map_err(|_| format!("invalid latitude '{}'", lat.trim()))?;
    if !(-180.0..=180.0).contains(&lng) || !(-90.0..=90.0).contains(&lat) {
        return Err(format!("center {lng},{lat} is out of range"));
    }
    Ok(GeoPoint::new(lng, lat))
}
