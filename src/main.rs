use anyhow::{Context, Result, bail};
use clap::{Args as ClapArgs, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Instant;

use tmdd_correct::calibration::{CalibrationReport, CorrectionGrid, load_control_points};
use tmdd_correct::config::FileConfig;
use tmdd_correct::tmdd::{
    NetworkSnapshot, Selection, UpdateTime, build_document, correct_directory,
    discover_networks, link_geometry_rows, read_document, write_document, write_geometry_csv,
};

/// Export traffic networks as TMDD JSON and correct simulation coordinate distortion
///
/// Examples:
///   # Correct every raw network in ./data on a 2x1 zone grid
///   tmdd-correct correct -H 2 -V 1
///
///   # Export link geometry of corrected networks for plotting
///   tmdd-correct export-csv
///
///   # Build a TMDD document from extracted model records
///   tmdd-correct build --snapshot model.json --output data/tmdd.json
#[derive(Parser, Debug)]
#[command(name = "tmdd-correct")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to config file (optional, auto-searches tmdd-correct.toml if not provided)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Correct the coordinates of every uncorrected network in the data directory
    Correct(CorrectArgs),
    /// Write link geometry of network files as lat,lon,id CSV
    ExportCsv(ExportCsvArgs),
    /// Build a TMDD document from extracted network records
    Build(BuildArgs),
}

#[derive(ClapArgs, Debug)]
struct CorrectArgs {
    /// Number of zones along the longitude axis
    #[arg(short = 'H', long)]
    horizontal: Option<usize>,

    /// Number of zones along the latitude axis
    #[arg(short = 'V', long)]
    vertical: Option<usize>,

    /// Directory holding the network JSON files
    #[arg(short = 'd', long)]
    data_dir: Option<PathBuf>,

    /// Simulation-space control points (longitude,latitude CSV)
    #[arg(long)]
    source: Option<PathBuf>,

    /// Real-world control points, index-aligned with --source
    #[arg(long)]
    target: Option<PathBuf>,

    /// Correct points on a single thread
    #[arg(long)]
    sequential: bool,
}

#[derive(ClapArgs, Debug)]
struct ExportCsvArgs {
    /// Directory holding the network JSON files
    #[arg(short = 'd', long)]
    data_dir: Option<PathBuf>,

    /// Export a single network file instead of every corrected file
    #[arg(short = 'f', long)]
    file: Option<PathBuf>,
}

#[derive(ClapArgs, Debug)]
struct BuildArgs {
    /// JSON file of extracted junction and section records
    #[arg(short = 's', long)]
    snapshot: PathBuf,

    /// Output TMDD JSON path
    #[arg(short = 'o', long)]
    output: PathBuf,

    #[arg(long)]
    organization_id: Option<String>,

    #[arg(long)]
    network_id: Option<String>,

    #[arg(long)]
    network_name: Option<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let total_start = Instant::now();

    let file_config: FileConfig = if let Some(ref config_path) = args.config {
        if config_path.exists() {
            let contents = std::fs::read_to_string(config_path)
                .context(format!("Failed to read config file: {:?}", config_path))?;
            toml::from_str(&contents).context("Failed to parse config file")?
        } else {
            bail!("Config file not found: {:?}", config_path);
        }
    } else {
        FileConfig::load().unwrap_or_default()
    };
    let verbose = args.verbose || file_config.verbose;

    println!("tmdd-correct - TMDD Network Coordinate Correction");
    println!("=================================================");
    println!();

    match args.command {
        Command::Correct(cmd) => run_correct(cmd, &file_config, verbose)?,
        Command::ExportCsv(cmd) => run_export_csv(cmd, &file_config, verbose)?,
        Command::Build(cmd) => run_build(cmd, &file_config)?,
    }

    println!();
    println!(
        "Done! Total time: {:.1}s",
        total_start.elapsed().as_secs_f32()
    );

    Ok(())
}

fn run_correct(cmd: CorrectArgs, config: &FileConfig, verbose: bool) -> Result<()> {
    let (Some(horizontal), Some(vertical)) = (
        cmd.horizontal.or(config.horizontal),
        cmd.vertical.or(config.vertical),
    ) else {
        bail!("-H/--horizontal and -V/--vertical are required. Example: tmdd-correct correct -H 2 -V 1");
    };
    let data_dir = cmd.data_dir.unwrap_or_else(|| config.data_dir.clone());
    let source = cmd.source.unwrap_or_else(|| config.source_samples.clone());
    let target = cmd.target.unwrap_or_else(|| config.target_samples.clone());
    let parallel = !cmd.sequential && config.parallel;

    if verbose {
        println!("Configuration:");
        println!("  Zones: {} horizontal x {} vertical", horizontal, vertical);
        println!("  Data directory: {}", data_dir.display());
        println!("  Source samples: {}", source.display());
        println!("  Target samples: {}", target.display());
        println!("  Parallel: {}", parallel);
        println!();
    }

    let spinner = create_spinner("Loading control points...");
    let start = Instant::now();
    let pairs = load_control_points(&source, &target).context("Failed to load control points")?;
    spinner.finish_with_message(format!(
        "Loaded {} control point pairs [{:.1}s]",
        pairs.len(),
        start.elapsed().as_secs_f32()
    ));

    let spinner = create_spinner("Fitting zone transforms...");
    let start = Instant::now();
    let grid = CorrectionGrid::build(&pairs, horizontal, vertical)
        .context("Failed to build correction grid")?;
    let report = grid.report();
    spinner.finish_with_message(format!(
        "Partitioned into {} horizontal and {} vertical zones, {} total: {} [{:.1}s]",
        horizontal,
        vertical,
        report.total_zones(),
        report.summary(),
        start.elapsed().as_secs_f32()
    ));
    print_calibration_report(&grid, &report, verbose);

    let spinner = create_spinner(&format!("Correcting networks in {}...", data_dir.display()));
    let start = Instant::now();
    let corrected = match correct_directory(&data_dir, &grid, parallel) {
        Ok(corrected) => corrected,
        Err(e) => {
            spinner.finish_and_clear();
            return Err(e).context(format!(
                "Failed to correct networks in {}; no output was written",
                data_dir.display()
            ));
        }
    };
    spinner.finish_with_message(format!(
        "Corrected {} networks [{:.1}s]",
        corrected.len(),
        start.elapsed().as_secs_f32()
    ));

    for network in &corrected {
        println!(
            "  {}: {} links, {} nodes, {} points -> {}",
            network.stem,
            network.summary.links,
            network.summary.nodes,
            network.summary.points_corrected,
            network.output.display()
        );
        if verbose {
            println!("    Source: {}", network.input.display());
        }
    }

    Ok(())
}

fn print_calibration_report(grid: &CorrectionGrid, report: &CalibrationReport, verbose: bool) {
    println!();
    println!("Control points per zone (rows are latitude bands, lowest first):");
    for row in report.count_matrix() {
        println!("  {:?}", row);
    }

    if verbose {
        let envelope = grid.envelope();
        println!(
            "  Calibration envelope: lon [{}, {}], lat [{}, {}] ({:.4} x {:.4} deg)",
            envelope.min_lon,
            envelope.max_lon,
            envelope.min_lat,
            envelope.max_lat,
            envelope.width(),
            envelope.height()
        );
        println!("  Longitude bounds: {:?}", grid.lon_bounds());
        println!("  Latitude bounds:  {:?}", grid.lat_bounds());
        for (index, zone) in grid.zones() {
            println!(
                "  Zone ({}, {}): {} points, {}, M = {:?}",
                index.lat,
                index.lon,
                zone.control_points().len(),
                zone.status().describe(),
                zone.transform().rows()
            );
        }
    }

    for zone in report.uncorrected() {
        eprintln!(
            "Warning: zone ({}, {}) will not be corrected: {} ({} points)",
            zone.index.lat,
            zone.index.lon,
            zone.status.describe(),
            zone.point_count
        );
    }
    println!();
}

fn run_export_csv(cmd: ExportCsvArgs, config: &FileConfig, verbose: bool) -> Result<()> {
    let data_dir = cmd.data_dir.unwrap_or_else(|| config.data_dir.clone());

    let targets: Vec<PathBuf> = match cmd.file {
        Some(file) => vec![file],
        None => discover_networks(&data_dir, Selection::Corrected)
            .context(format!("Failed to list networks in {}", data_dir.display()))?
            .into_iter()
            .map(|n| n.path)
            .collect(),
    };
    if targets.is_empty() {
        bail!("No corrected network JSON files found in {}", data_dir.display());
    }

    for path in targets {
        let spinner = create_spinner(&format!("Processing {}...", path.display()));
        let doc = read_document(&path).context(format!("Failed to read {}", path.display()))?;
        let rows = link_geometry_rows(&doc);

        let output = path.with_extension("csv");
        write_geometry_csv(&rows, &output)
            .context(format!("Failed to write {}", output.display()))?;
        spinner.finish_with_message(format!(
            "Exported {} vertices from {} links -> {}",
            rows.len(),
            doc.link_inventory.links.len(),
            output.display()
        ));
        if verbose {
            println!("  Source: {}", path.display());
        }
    }

    Ok(())
}

fn run_build(cmd: BuildArgs, config: &FileConfig) -> Result<()> {
    let mut settings = config.export.settings();
    if let Some(id) = cmd.organization_id {
        settings.organization_id = id;
    }
    if let Some(id) = cmd.network_id {
        settings.network_id = id;
    }
    if let Some(name) = cmd.network_name {
        settings.network_name = name;
    }

    let spinner = create_spinner("Reading network records...");
    let snapshot = read_snapshot(&cmd.snapshot)?;
    spinner.finish_with_message(format!(
        "Read {} junctions and {} sections",
        snapshot.junctions.len(),
        snapshot.sections.len()
    ));

    let spinner = create_spinner("Building TMDD document...");
    let updated = UpdateTime::now(&config.export.utc_offset);
    let doc = build_document(&snapshot, &settings, &updated)
        .context("Failed to build TMDD document")?;
    write_document(&doc, &cmd.output)
        .context(format!("Failed to write {}", cmd.output.display()))?;
    spinner.finish_with_message(format!(
        "Wrote {} links and {} nodes -> {}",
        doc.link_inventory.links.len(),
        doc.node_inventory.nodes.len(),
        cmd.output.display()
    ));

    Ok(())
}

fn read_snapshot(path: &Path) -> Result<NetworkSnapshot> {
    let contents = std::fs::read_to_string(path)
        .context(format!("Failed to read snapshot file: {}", path.display()))?;
    serde_json::from_str(&contents).context(format!("Failed to parse snapshot file: {}", path.display()))
}

fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(80));
    pb
}
