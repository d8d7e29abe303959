//! despeck: clean up vector artwork from the command line.
//!
//! Reads an SVG file, applies one editing operation and writes the result
//! next to the input (or to `-o`), printing a per-operation diagnostics
//! report. Useful for:
//!
//! - Painting stray speckles into the surrounding color along a drag path
//! - Merging overlapping same-color shapes into single outlines
//! - Collapsing an edge-touching background into one flat region
//! - Removing lines, open paths and other rendering artifacts
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin despeck -- [--json] [--config-json JSON] <COMMAND> <INPUT> [-o OUTPUT]
//! ```
//!
//! Set `RUST_LOG=debug` to see per-shape decisions.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::{Args, Parser, Subcommand, ValueEnum};
use despeck_engine::diagnostics::measure;
use despeck_engine::index::build_items;
use despeck_engine::{
    BackgroundMode, BackgroundOptions, BackgroundPolicy, Canvas, CleanupOptions, Clock, Color,
    EngineError, Editor, HitMode, OperationDiagnostics, Outcome, Point, SessionDiagnostics,
    SourceFilter, SpeckleAction, SpeckleOptions, UnionOptions,
};
use despeck_svg::{SvgMetadata, output_file_name, read_scene, write_scene};
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Speckle removal and cleanup for SVG artwork.
///
/// Every editing command reads the input, applies one operation, writes
/// the edited document and prints timing and change counts.
#[derive(Parser)]
#[command(name = "despeck", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Output diagnostics as JSON instead of a human-readable report.
    #[arg(long, global = true)]
    json: bool,

    /// Full options for the command as a JSON string.
    ///
    /// When provided, the command's option flags are ignored. The JSON must
    /// be a valid serialization of the command's options (`SpeckleOptions`,
    /// `UnionOptions`, `BackgroundOptions` or `CleanupOptions`).
    #[arg(long, global = true)]
    config_json: Option<String>,
}

#[derive(Subcommand)]
enum Command {
    /// Print shape count, canvas, palette and detected background.
    Info {
        /// Input SVG file.
        input: PathBuf,
    },
    /// Drag the magic eraser through one or more points.
    Brush(BrushArgs),
    /// Merge overlapping same-color shapes.
    Union(UnionArgs),
    /// Flatten or remove the edge-touching background.
    Flatten(FlattenArgs),
    /// Remove lines, open paths, stroke-only and tiny shapes.
    Cleanup(CleanupArgs),
}

/// Input and output files shared by the editing commands.
#[derive(Args)]
struct Files {
    /// Input SVG file.
    input: PathBuf,

    /// Output SVG file (default: `<name>-updated.svg` next to the input).
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Args)]
struct BrushArgs {
    #[command(flatten)]
    files: Files,

    /// Brush sample as `X,Y` in canvas coordinates. Repeat for a drag.
    #[arg(long = "at", value_parser = parse_point, required = true)]
    points: Vec<Point>,

    /// Brush radius.
    #[arg(long, default_value_t = SpeckleOptions::DEFAULT_BRUSH_RADIUS)]
    radius: f64,

    /// Largest bbox area that still counts as a speckle.
    #[arg(long, default_value_t = SpeckleOptions::DEFAULT_MAX_AREA)]
    max_area: f64,

    /// Fill color to act on, or `all`.
    #[arg(long, value_parser = parse_source, default_value = "all")]
    source: Source,

    /// With `--source all`, also act on the detected background color.
    #[arg(long)]
    include_background: bool,

    /// Color speckles are merged into or recolored to.
    #[arg(long, value_parser = parse_color, default_value = "#ffffff")]
    target: Color,

    /// What happens to each speckle.
    #[arg(long, value_enum, default_value_t = Action::Absorb)]
    action: Action,

    /// Hit-test against bounding boxes only.
    #[arg(long)]
    bounds_only: bool,

    /// Let paths larger than `--max-area` be recolored.
    #[arg(long)]
    include_large_paths: bool,
}

#[derive(Args)]
struct UnionArgs {
    #[command(flatten)]
    files: Files,

    /// Only merge shapes of this color. Repeat for several; default is
    /// every color.
    #[arg(long = "color", value_parser = parse_color)]
    colors: Vec<Color>,
}

#[derive(Args)]
struct FlattenArgs {
    #[command(flatten)]
    files: Files,

    /// How the background color is chosen.
    #[arg(long, value_enum, default_value_t = Policy::EdgeArea)]
    policy: Policy,

    /// Background color for `--policy color`.
    #[arg(long, value_parser = parse_color)]
    color: Option<Color>,

    /// Luminance threshold for `--policy lightest`.
    #[arg(long, default_value_t = BackgroundPolicy::DEFAULT_MIN_LUMINANCE)]
    min_luminance: f64,

    /// Fill of the flattened background (default: the detected color).
    #[arg(long, value_parser = parse_color)]
    fill: Option<Color>,

    /// Delete the background shapes instead of flattening them.
    #[arg(long, conflicts_with = "fill")]
    remove: bool,

    /// Edge contact tolerance.
    #[arg(long, default_value_t = BackgroundOptions::DEFAULT_EPSILON)]
    epsilon: f64,
}

#[derive(Args)]
struct CleanupArgs {
    #[command(flatten)]
    files: Files,

    /// Shapes with a bbox area below this are removed.
    #[arg(long, default_value_t = CleanupOptions::DEFAULT_MIN_AREA)]
    min_area: f64,
}

/// Brush source selection.
#[derive(Clone)]
enum Source {
    All,
    Color(Color),
}

/// Speckle action selection.
#[derive(Clone, Copy, ValueEnum)]
enum Action {
    /// Recolor to the target color.
    Recolor,
    /// Absorb into an enclosing target-colored path, else recolor.
    Absorb,
    /// Absorb into an enclosing target-colored path, else remove.
    AbsorbOrRemove,
}

/// Background policy selection.
#[derive(Clone, Copy, ValueEnum)]
enum Policy {
    /// Largest area among edge-touching colors.
    EdgeArea,
    /// Lightest color when bright enough, else the largest.
    Lightest,
    /// The color given by `--color`.
    Color,
}

fn parse_color(raw: &str) -> Result<Color, String> {
    match Color::parse(raw) {
        Ok(Some(color)) => Ok(color),
        Ok(None) => Err(format!("{raw:?} is not a paint color")),
        Err(e) => Err(e.to_string()),
    }
}

fn parse_source(raw: &str) -> Result<Source, String> {
    if raw.trim().eq_ignore_ascii_case("all") {
        Ok(Source::All)
    } else {
        parse_color(raw).map(Source::Color)
    }
}

fn parse_point(raw: &str) -> Result<Point, String> {
    let (x, y) = raw
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y but got {raw:?}"))?;
    let coordinate = |s: &str| {
        s.trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| format!("invalid coordinate {s:?}"))
    };
    Ok(Point::new(coordinate(x)?, coordinate(y)?))
}

/// Parse `--config-json` when given, else build options from the flags.
fn options<T: DeserializeOwned>(
    config_json: Option<&str>,
    from_flags: impl FnOnce() -> Result<T, String>,
) -> Result<T, String> {
    if let Some(json) = config_json {
        return serde_json::from_str(json).map_err(|e| format!("Error parsing --config-json: {e}"));
    }
    from_flags()
}

fn speckle_options(args: &BrushArgs) -> SpeckleOptions {
    SpeckleOptions {
        max_area: args.max_area,
        brush_radius: args.radius,
        source: match &args.source {
            Source::All => SourceFilter::All {
                exclude_background: !args.include_background,
            },
            Source::Color(color) => SourceFilter::Single(color.clone()),
        },
        action: match args.action {
            Action::Recolor => SpeckleAction::Recolor,
            Action::Absorb => SpeckleAction::Absorb,
            Action::AbsorbOrRemove => SpeckleAction::AbsorbOrRemove,
        },
        hit_mode: if args.bounds_only {
            HitMode::Bounds
        } else {
            HitMode::Precise
        },
        include_large_paths: args.include_large_paths,
        ..SpeckleOptions::new(args.target.clone())
    }
}

fn background_options(args: &FlattenArgs) -> Result<BackgroundOptions, String> {
    let policy = match args.policy {
        Policy::EdgeArea => BackgroundPolicy::EdgeArea,
        Policy::Lightest => BackgroundPolicy::Lightest {
            min_luminance: args.min_luminance,
        },
        Policy::Color => BackgroundPolicy::Color(
            args.color
                .clone()
                .ok_or("--policy color requires --color")?,
        ),
    };
    Ok(BackgroundOptions {
        policy,
        mode: if args.remove {
            BackgroundMode::Remove
        } else {
            BackgroundMode::Flatten {
                fill: args.fill.clone(),
            }
        },
        epsilon: args.epsilon,
    })
}

/// One validated editing request.
enum Edit {
    Brush(Vec<Point>, SpeckleOptions),
    Union(UnionOptions),
    Flatten(BackgroundOptions),
    Cleanup(CleanupOptions),
}

impl Edit {
    fn from_cli(command: &Command, config_json: Option<&str>) -> Result<Option<Self>, String> {
        let edit = match command {
            Command::Info { .. } => return Ok(None),
            Command::Brush(args) => Self::Brush(
                args.points.clone(),
                options(config_json, || Ok(speckle_options(args)))?,
            ),
            Command::Union(args) => Self::Union(options(config_json, || {
                Ok(UnionOptions {
                    colors: (!args.colors.is_empty()).then(|| args.colors.clone()),
                    ..UnionOptions::default()
                })
            })?),
            Command::Flatten(args) => {
                Self::Flatten(options(config_json, || background_options(args))?)
            }
            Command::Cleanup(args) => Self::Cleanup(options(config_json, || {
                Ok(CleanupOptions {
                    min_area: args.min_area,
                })
            })?),
        };
        Ok(Some(edit))
    }

    fn apply(&self, editor: &mut Editor) -> Result<Outcome, EngineError> {
        match self {
            Self::Brush(points, options) => {
                editor.begin_stroke(options.clone())?;
                for point in points {
                    editor.stroke_to(*point)?;
                }
                editor.end_stroke()
            }
            Self::Union(options) => editor.union_merge(options),
            Self::Flatten(options) => editor.flatten_background(options),
            Self::Cleanup(options) => editor.cleanup(options),
        }
    }
}

const fn input_path(command: &Command) -> &PathBuf {
    match command {
        Command::Info { input } => input,
        Command::Brush(args) => &args.files.input,
        Command::Union(args) => &args.files.input,
        Command::Flatten(args) => &args.files.input,
        Command::Cleanup(args) => &args.files.input,
    }
}

const fn output_path(command: &Command) -> Option<&PathBuf> {
    match command {
        Command::Info { .. } => None,
        Command::Brush(args) => args.files.output.as_ref(),
        Command::Union(args) => args.files.output.as_ref(),
        Command::Flatten(args) => args.files.output.as_ref(),
        Command::Cleanup(args) => args.files.output.as_ref(),
    }
}

fn file_name(path: &Path) -> &str {
    path.file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("drawing.svg")
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    let edit = match Edit::from_cli(&cli.command, cli.config_json.as_deref()) {
        Ok(edit) => edit,
        Err(msg) => {
            eprintln!("{msg}");
            return ExitCode::FAILURE;
        }
    };

    let input = input_path(&cli.command);
    let text = match std::fs::read_to_string(input) {
        Ok(text) => text,
        Err(e) => {
            eprintln!("Error reading {}: {e}", input.display());
            return ExitCode::FAILURE;
        }
    };
    let name = file_name(input);

    let mut session = SessionDiagnostics::new(Some(name.to_owned()));
    let (scene, duration) = measure(&StdClock, || read_scene(&text));
    let scene = match scene {
        Ok(scene) => scene,
        Err(e) => {
            eprintln!("Error loading {}: {e}", input.display());
            return ExitCode::FAILURE;
        }
    };
    let mut editor = Editor::new();
    let loaded = editor.load(scene, name);
    eprintln!("{}", loaded.status);
    session.push(OperationDiagnostics::new(
        &loaded,
        duration,
        0,
        editor.scene().len(),
    ));

    let Some(edit) = edit else {
        return print_json_or(cli.json, &Summary::new(&editor), Summary::report);
    };

    let before = editor.scene().len();
    let (outcome, duration) = measure(&StdClock, || edit.apply(&mut editor));
    let outcome = match outcome {
        Ok(outcome) => outcome,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };
    eprintln!("{}", outcome.status);
    session.push(OperationDiagnostics::new(
        &outcome,
        duration,
        before,
        editor.scene().len(),
    ));

    let output = output_path(&cli.command)
        .cloned()
        .unwrap_or_else(|| input.with_file_name(output_file_name(name)));
    let title = input.file_stem().and_then(|s| s.to_str()).unwrap_or(name);
    let metadata = SvgMetadata {
        title: Some(title),
        description: None,
    };
    let svg = write_scene(editor.scene(), &metadata);
    match std::fs::write(&output, &svg) {
        Ok(()) => eprintln!("SVG written to {} ({} bytes)", output.display(), svg.len()),
        Err(e) => {
            eprintln!("Error writing SVG to {}: {e}", output.display());
            return ExitCode::FAILURE;
        }
    }

    print_json_or(cli.json, &session, SessionDiagnostics::report)
}

/// Print `value` as pretty JSON, or its human-readable report.
fn print_json_or<T: Serialize>(json: bool, value: &T, report: fn(&T) -> String) -> ExitCode {
    if !json {
        println!("{}", report(value));
        return ExitCode::SUCCESS;
    }
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error serializing diagnostics: {e}");
            ExitCode::FAILURE
        }
    }
}

/// [`Clock`] implementation backed by [`std::time::Instant`].
struct StdClock;

impl Clock for StdClock {
    type Instant = Instant;

    fn now(&self) -> Instant {
        Instant::now()
    }

    fn elapsed(&self, since: &Instant) -> Duration {
        since.elapsed()
    }
}

/// Output of the `info` command.
#[derive(Serialize)]
struct Summary {
    shapes: usize,
    canvas: Canvas,
    palette: Vec<PaletteEntry>,
    background: Option<String>,
}

#[derive(Serialize)]
struct PaletteEntry {
    color: String,
    /// Total bbox area of the shapes filled with this color.
    area: f64,
}

impl Summary {
    fn new(editor: &Editor) -> Self {
        let items = build_items(editor.scene(), editor.kernel());
        let palette = editor
            .palette()
            .into_iter()
            .map(|color| PaletteEntry {
                area: items
                    .iter()
                    .filter(|i| i.color.as_ref() == Some(&color))
                    .map(|i| i.area)
                    .sum(),
                color: color.to_display_hex(),
            })
            .collect();
        let background = editor
            .background_color(
                &BackgroundPolicy::EdgeArea,
                BackgroundOptions::DEFAULT_EPSILON,
            )
            .map(|c| c.to_display_hex());
        Self {
            shapes: editor.scene().len(),
            canvas: editor.scene().canvas,
            palette,
            background,
        }
    }

    fn report(&self) -> String {
        let mut lines = vec![
            format!("Shapes: {}", self.shapes),
            format!("Canvas: {}", describe_canvas(&self.canvas)),
            format!(
                "Background: {}",
                self.background.as_deref().unwrap_or("(none detected)")
            ),
            String::new(),
            format!("{:<12} {:>14}", "Color", "Area"),
            "-".repeat(27),
        ];
        for entry in &self.palette {
            lines.push(format!("{:<12} {:>14.2}", entry.color, entry.area));
        }
        lines.join("\n")
    }
}

fn describe_canvas(canvas: &Canvas) -> String {
    let size = match (canvas.width, canvas.height) {
        (Some(w), Some(h)) => format!("{w} x {h}"),
        _ => "unsized".to_owned(),
    };
    match canvas.view_box {
        Some(vb) => format!(
            "{size}, viewBox {} {} {} {}",
            vb.x, vb.y, vb.width, vb.height
        ),
        None => size,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    // --- argument parsing ---

    #[test]
    fn points_and_colors_parse() {
        assert_eq!(parse_point("1.5, -2").unwrap(), Point::new(1.5, -2.0));
        assert!(parse_point("3").is_err());
        assert!(parse_point("a,1").is_err());
        assert_eq!(parse_color("#fff").unwrap(), Color::Rgb(255, 255, 255));
        assert!(parse_color("none").is_err());
        assert!(matches!(parse_source("ALL").unwrap(), Source::All));
    }

    #[test]
    fn brush_flags_build_options() {
        let cli = Cli::parse_from([
            "despeck", "brush", "in.svg", "--at", "1,2", "--at", "3,4", "--source", "#111",
            "--action", "absorb-or-remove", "--bounds-only",
        ]);
        let edit = Edit::from_cli(&cli.command, None).unwrap();
        assert!(matches!(edit, Some(Edit::Brush(ref points, _)) if points.len() == 2));
        let Some(Edit::Brush(_, options)) = edit else {
            return;
        };
        assert_eq!(options.source, SourceFilter::Single(Color::Rgb(17, 17, 17)));
        assert_eq!(options.action, SpeckleAction::AbsorbOrRemove);
        assert_eq!(options.hit_mode, HitMode::Bounds);
        assert_eq!(options.target, SpeckleOptions::DEFAULT_TARGET);
    }

    #[test]
    fn brush_spares_background_unless_included() {
        let defaults = Cli::parse_from(["despeck", "brush", "in.svg", "--at", "1,2"]);
        let edit = Edit::from_cli(&defaults.command, None).unwrap();
        assert!(matches!(
            edit,
            Some(Edit::Brush(_, ref o)) if o.source == SourceFilter::default()
        ));

        let included = Cli::parse_from([
            "despeck", "brush", "in.svg", "--at", "1,2", "--include-background",
        ]);
        let edit = Edit::from_cli(&included.command, None).unwrap();
        assert!(matches!(
            edit,
            Some(Edit::Brush(_, ref o))
                if o.source == SourceFilter::All { exclude_background: false }
        ));
    }

    // --- config json ---

    #[test]
    fn config_json_replaces_flags() {
        let cli = Cli::parse_from([
            "despeck",
            "cleanup",
            "in.svg",
            "--min-area",
            "9",
            "--config-json",
            r#"{"min_area": 2.0}"#,
        ]);
        let edit = Edit::from_cli(&cli.command, cli.config_json.as_deref()).unwrap();
        assert!(matches!(edit, Some(Edit::Cleanup(o)) if (o.min_area - 2.0).abs() < f64::EPSILON));
    }

    #[test]
    fn bad_config_json_is_reported() {
        let err = options::<CleanupOptions>(Some("{"), || Ok(CleanupOptions::default())).unwrap_err();
        assert!(err.starts_with("Error parsing --config-json:"));
    }

    #[test]
    fn color_policy_needs_a_color() {
        let cli = Cli::parse_from(["despeck", "flatten", "in.svg", "--policy", "color"]);
        assert!(Edit::from_cli(&cli.command, None).is_err());
    }

    #[test]
    fn default_output_sits_next_to_input() {
        let cli = Cli::parse_from(["despeck", "union", "art/Logo.SVG"]);
        let input = input_path(&cli.command);
        assert!(output_path(&cli.command).is_none());
        assert_eq!(
            input.with_file_name(output_file_name(file_name(input))),
            PathBuf::from("art/Logo-updated.svg")
        );
    }
}
