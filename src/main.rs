use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use nestcam::{init_logging, Config, Job, MaterialPreset, BUILD_DATE, VERSION};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "nestcam")]
#[command(about = "Nest DXF parts on a sheet and generate Mach3 G-code")]
#[command(version)]
struct Cli {
    /// Log as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Nest parts and write the nested DXF
    Nest(JobArgs),

    /// Nest parts, then generate toolpaths and G-code
    Gcode(JobArgs),

    /// Manage configuration files
    Config {
        /// Write a default configuration to this path (.json or .toml),
        /// or to the user configuration file when no path is given
        #[arg(long)]
        init: Option<PathBuf>,
    },
}

#[derive(Args)]
struct JobArgs {
    /// Part drawings (DXF)
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Configuration file (.json or .toml), defaults to the user
    /// configuration file when one exists
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Material preset (e.g. plywood_12mm)
    #[arg(short, long)]
    material: Option<String>,

    /// Sheet width in mm
    #[arg(long)]
    sheet_width: Option<f64>,

    /// Sheet height in mm
    #[arg(long)]
    sheet_height: Option<f64>,

    /// Gap between parts in mm
    #[arg(long)]
    spacing: Option<f64>,

    /// Output directory
    #[arg(short, long, default_value = "output")]
    output_dir: PathBuf,

    /// Base name of the output files
    #[arg(short, long, default_value = "nest")]
    name: String,
}

impl JobArgs {
    fn into_job(self, gcode: bool) -> Result<Job> {
        let path = match self.config.clone() {
            Some(path) => Some(path),
            None => Config::default_path().ok().filter(|p| p.exists()),
        };
        let mut config = match &path {
            Some(path) => Config::load_from_file(path)
                .with_context(|| format!("Failed to load {}", path.display()))?,
            None => Config::default(),
        };
        if let Some(name) = &self.material {
            MaterialPreset::find(name)?.apply_to(&mut config);
        }
        if let Some(width) = self.sheet_width {
            config.nesting.sheet_width = width;
        }
        if let Some(height) = self.sheet_height {
            config.nesting.sheet_height = height;
        }
        if let Some(spacing) = self.spacing {
            config.nesting.spacing = spacing;
        }

        let mut job = Job::new(self.name, config, self.output_dir).with_gcode(gcode);
        for file in self.files {
            job = job.with_file(file);
        }
        job.timestamp = Some(chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string());
        Ok(job)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_json)?;
    info!("NestCAM {} (built {})", VERSION, BUILD_DATE);

    match cli.command {
        Commands::Nest(args) => run(args.into_job(false)?),
        Commands::Gcode(args) => run(args.into_job(true)?),
        Commands::Config { init } => {
            let init = match init {
                Some(path) => path,
                None => Config::default_path()?,
            };
            Config::default()
                .save_to_file(&init)
                .with_context(|| format!("Failed to write {}", init.display()))?;
            info!("Default configuration written to {}", init.display());
            Ok(())
        }
    }
}

fn run(job: Job) -> Result<()> {
    let report = job.run()?;
    println!("{}", report.to_json()?);
    Ok(())
}
