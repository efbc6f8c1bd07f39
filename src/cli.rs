use crate::config::{Config, load_config};
use crate::ir::{FamilySnapshot, NodeChange};
use crate::render::{render_svg, write_output_svg};
use crate::view::{DisplayContext, ViewModel};
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "kinlay", version, about = "Lay out a family tree snapshot as positioned nodes and edges")]
pub struct Args {
    /// Snapshot JSON file (people + relationships) or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Output file. Defaults to stdout for JSON and SVG.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short = 'e', long = "outputFormat", value_enum, default_value = "json")]
    pub output_format: OutputFormat,

    /// Config file (JSON5)
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Person whose tree is laid out first
    #[arg(long = "root")]
    pub root: Option<String>,

    /// Width of the viewing surface; narrow widths tighten spacing
    #[arg(short = 'w', long = "viewportWidth")]
    pub viewport_width: Option<f32>,

    /// JSON array of node moves/resizes to apply before layout
    #[arg(long = "changes")]
    pub changes: Option<PathBuf>,

    /// Write the snapshot back out after applying --changes
    #[arg(long = "saveSnapshot", requires = "changes")]
    pub save_snapshot: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace); RUST_LOG wins when set
    #[arg(long = "logLevel", default_value = "warn")]
    pub log_level: String,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Svg,
    Png,
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    let _logger = flexi_logger::Logger::try_with_env_or_str(&args.log_level)?
        .log_to_stderr()
        .start()?;

    let mut config = load_config(args.config.as_deref())
        .with_context(|| format!("loading config {:?}", args.config))?;
    if let Some(width) = args.viewport_width {
        config.layout = config.layout.for_viewport(width);
    }

    let mut snapshot = read_snapshot(args.input.as_deref())?;
    if let Some(path) = args.changes.as_deref() {
        apply_changes(&mut snapshot, path)?;
        if let Some(out) = args.save_snapshot.as_deref() {
            let json = serde_json::to_string_pretty(&snapshot)?;
            std::fs::write(out, json).with_context(|| format!("writing {}", out.display()))?;
        }
    }

    let context = DisplayContext::new(config.display.clone(), snapshot.is_locked);
    let view = crate::compute_view(&snapshot, args.root.as_deref(), &context, &config.layout);
    log::info!(
        "{} node(s), {} edge(s)",
        view.nodes.len(),
        view.edges.len()
    );

    write_view(&view, &config, args.output_format, args.output.as_deref())
}

fn read_snapshot(path: Option<&Path>) -> Result<FamilySnapshot> {
    if let Some(path) = path
        && path != Path::new("-")
    {
        return FamilySnapshot::load(path).with_context(|| format!("reading {}", path.display()));
    }
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(FamilySnapshot::from_json(&buf)?)
}

fn apply_changes(snapshot: &mut FamilySnapshot, path: &Path) -> Result<()> {
    let contents = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let changes: Vec<NodeChange> = serde_json::from_str(&contents)?;
    for change in &changes {
        if snapshot.apply_node_change(change) == 0 {
            log::warn!("change {change:?} matched no person");
        }
    }
    Ok(())
}

fn write_view(
    view: &ViewModel,
    config: &Config,
    format: OutputFormat,
    output: Option<&Path>,
) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(view)?;
            match output {
                Some(path) => std::fs::write(path, json)?,
                None => println!("{json}"),
            }
            Ok(())
        }
        OutputFormat::Svg => {
            let svg = render_svg(view, &config.theme, &config.layout, &config.render);
            write_output_svg(&svg, output)
        }
        OutputFormat::Png => {
            let output = output.ok_or_else(|| anyhow::anyhow!("Output path required for png output"))?;
            write_png(view, config, output)
        }
    }
}

#[cfg(feature = "png")]
fn write_png(view: &ViewModel, config: &Config, output: &Path) -> Result<()> {
    let svg = render_svg(view, &config.theme, &config.layout, &config.render);
    crate::render::write_output_png(&svg, output, &config.render)
}

#[cfg(not(feature = "png"))]
fn write_png(_view: &ViewModel, _config: &Config, _output: &Path) -> Result<()> {
    Err(anyhow::anyhow!("built without png support"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_flags() {
        let args = Args::try_parse_from([
            "kinlay",
            "-i",
            "tree.json",
            "-e",
            "svg",
            "--root",
            "p1",
            "-w",
            "600",
        ])
        .unwrap();
        assert_eq!(args.output_format, OutputFormat::Svg);
        assert_eq!(args.root.as_deref(), Some("p1"));
        assert_eq!(args.viewport_width, Some(600.0));
        assert_eq!(args.log_level, "warn");
    }

    #[test]
    fn save_snapshot_needs_changes() {
        let result = Args::try_parse_from(["kinlay", "--saveSnapshot", "out.json"]);
        assert!(result.is_err());
    }

    #[test]
    fn changes_file_pins_people() {
        let dir = std::env::temp_dir().join(format!("kinlay-changes-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("changes.json");
        std::fs::write(
            &path,
            r#"[{"kind": "moved", "person_id": "a", "x": 10, "y": 20}]"#,
        )
        .unwrap();
        let mut snapshot = FamilySnapshot {
            people: vec![crate::ir::Person::new("a")],
            ..Default::default()
        };
        apply_changes(&mut snapshot, &path).unwrap();
        assert_eq!(snapshot.people[0].placement.pinned(), Some((10.0, 20.0)));
        std::fs::remove_dir_all(&dir).ok();
    }
}
