//! spiral-lamp: builds the lamp shell and diffuser and writes them as STL.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use lamp_core::SolidReport;
use lamp_kernel::{write_stl, ImplicitKernel, Kernel, KernelBundle, KernelConfig};
use lamp_types::DesignConstants;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "spiral-lamp")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Spiral lamp shell and diffuser generator", long_about = None)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build both solids and write lamp.stl and lamp_diffuser.stl
    Generate {
        /// JSON file overriding any of the default constants
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// JSON file with kernel sampling settings
        #[arg(long)]
        kernel_config: Option<PathBuf>,
        /// Directory the STL files are written to
        #[arg(short, long, default_value = ".")]
        out_dir: PathBuf,
        /// Lattice spacing for tessellation and reports, in millimetres
        #[arg(long, default_value_t = 0.5)]
        cell_size: f64,
        /// Print the solid reports as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the default constants as JSON
    Constants,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Generate {
            config,
            kernel_config,
            out_dir,
            cell_size,
            json,
        } => {
            let constants = load_constants(config.as_deref())?;
            let kernel_config = load_kernel_config(kernel_config.as_deref())?;
            let mut kernel = ImplicitKernel::with_config(kernel_config);
            let reports = run(&mut kernel, &constants, &out_dir, cell_size)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&reports)?);
            } else {
                for report in &reports {
                    println!("{report}");
                }
            }
        }
        Commands::Constants => {
            println!("{}", serde_json::to_string_pretty(&DesignConstants::default())?);
        }
    }
    Ok(())
}

fn load_constants(path: Option<&Path>) -> Result<DesignConstants> {
    let Some(path) = path else {
        return Ok(DesignConstants::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading constants from {}", path.display()))?;
    let constants: DesignConstants = serde_json::from_str(&text)
        .with_context(|| format!("parsing constants in {}", path.display()))?;
    Ok(constants)
}

fn load_kernel_config(path: Option<&Path>) -> Result<KernelConfig> {
    let Some(path) = path else {
        return Ok(KernelConfig::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading kernel settings from {}", path.display()))?;
    Ok(serde_json::from_str(&text)?)
}

/// Build, export and measure both solids.
fn run(
    kernel: &mut dyn KernelBundle,
    constants: &DesignConstants,
    out_dir: &Path,
    cell_size: f64,
) -> Result<Vec<SolidReport>> {
    let solids = lamp_core::generate(&mut *kernel, constants)?;
    fs::create_dir_all(out_dir)
        .with_context(|| format!("creating {}", out_dir.display()))?;

    let mut reports = Vec::with_capacity(2);
    for (name, solid) in [("lamp", &solids.shell), ("lamp_diffuser", &solids.diffuser)] {
        let mesh = kernel.tessellate(solid, cell_size)?;
        let path = out_dir.join(format!("{name}.stl"));
        let file = File::create(&path).with_context(|| format!("creating {}", path.display()))?;
        let mut sink = BufWriter::new(file);
        write_stl(&mesh, name, &mut sink)?;
        sink.flush()?;
        info!(
            path = %path.display(),
            triangles = mesh.triangle_count(),
            "wrote STL"
        );
        reports.push(SolidReport::measure(
            kernel.as_introspect(),
            name,
            solid,
            cell_size,
        )?);
    }
    Ok(reports)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lamp_kernel::MockKernel;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("spiral-lamp-{}-{name}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn partial_config_keeps_other_defaults() {
        let dir = scratch_dir("config");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("lamp.json");
        fs::write(&path, r#"{ "loops": 2.0, "hole_diameter": 5.0 }"#).unwrap();

        let c = load_constants(Some(&path)).unwrap();
        assert_eq!(c.loops, 2.0);
        assert_eq!(c.hole_diameter, 5.0);
        assert_eq!(c.width, DesignConstants::default().width);
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn missing_config_names_the_file() {
        let err = load_constants(Some(Path::new("/nonexistent/lamp.json"))).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/lamp.json"));
    }

    #[test]
    fn run_writes_both_files() {
        let dir = scratch_dir("run");
        let mut kernel = MockKernel::new();
        let reports = run(&mut kernel, &DesignConstants::default(), &dir, 2.0).unwrap();
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].name, "lamp");
        assert_eq!(reports[1].name, "lamp_diffuser");
        for name in ["lamp.stl", "lamp_diffuser.stl"] {
            let bytes = fs::read(dir.join(name)).unwrap();
            // 80-byte header, count, then 50 bytes per triangle of the mock box.
            assert_eq!(bytes.len(), 84 + 12 * 50);
        }
        fs::remove_dir_all(&dir).unwrap();
    }
}
