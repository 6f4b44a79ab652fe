use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use clap::Parser;
use log::LevelFilter;
use oif_pure::discover::find_headers;
use oif_pure::{load_image, DecodeOptions, Exporter, FitsExporter, NormalizedImage};

/// Convert IRAF OIF images (.imh header + .pix pixels) to FITS.
///
/// The ".pix" file with the same root name as each ".imh" file is found
/// automatically. Output is written as <root>.fits.
#[derive(Parser, Debug)]
#[command(name = "imh2fits")]
#[command(version, about, long_about = None)]
struct Args {
    /// Print debug output
    #[arg(short, long)]
    debug: bool,

    /// List files rather than convert
    #[arg(short, long)]
    list: bool,

    /// Force byte swapping
    #[arg(short, long)]
    swap: bool,

    /// Print verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Print FITS validation warnings
    #[arg(short, long)]
    warnings: bool,

    /// Directory the FITS files are written to
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// ".imh" files to convert; all under the current directory if omitted
    files: Vec<PathBuf>,
}

impl Args {
    fn level(&self) -> LevelFilter {
        if self.debug {
            LevelFilter::Debug
        } else if self.verbose {
            LevelFilter::Info
        } else {
            LevelFilter::Warn
        }
    }

    fn options(&self) -> DecodeOptions {
        DecodeOptions::new()
            .with_force_swap(self.swap)
            .with_warnings(self.warnings)
    }
}

/// `%g`-style rendering: six significant digits, trailing zeros dropped,
/// exponent form outside `1e-4..1e6`.
fn compact(x: f64) -> String {
    if !x.is_finite() {
        return x.to_string();
    }
    let sci = format!("{x:.5e}");
    let Some((mantissa, exp)) = sci.split_once('e') else {
        return sci;
    };
    let exp: i32 = exp.parse().unwrap_or(0);
    if (-4..6).contains(&exp) {
        let fixed = format!("{:.*}", (5 - exp) as usize, x);
        trim_zeros(&fixed).to_string()
    } else {
        let sign = if exp < 0 { '-' } else { '+' };
        format!("{}e{sign}{:02}", trim_zeros(mantissa), exp.abs())
    }
}

fn trim_zeros(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}

fn summary(path: &Path, image: &NormalizedImage) -> String {
    let mut out = format!("{:>20}{}", path.display(), image.describe());
    if let Some(stats) = image.stats() {
        out.push_str(&format!(
            "\n\t\tmean: {}  min: {}  max: {}",
            compact(stats.mean),
            compact(stats.min),
            compact(stats.max)
        ));
    }
    out
}

fn output_path(header: &Path, output_dir: &Path) -> PathBuf {
    let mut name = header.file_stem().unwrap_or(header.as_os_str()).to_os_string();
    name.push(".fits");
    output_dir.join(name)
}

fn is_header(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("imh"))
        .unwrap_or(false)
}

fn convert(header: &Path, args: &Args, exporter: &FitsExporter) -> Result<()> {
    let image = load_image(header, &args.options())?;
    let out = output_path(header, &args.output_dir);
    if args.list || args.verbose {
        println!("{}", summary(&out, &image));
    }
    if !args.list {
        exporter
            .export(&image, &out)
            .with_context(|| format!("converting {}", header.display()))?;
        log::info!("wrote {}", out.display());
    }
    Ok(())
}

fn run(args: &Args) -> Result<usize> {
    let files = if args.files.is_empty() {
        find_headers(Path::new(".")).context("searching for .imh files")?
    } else {
        args.files.clone()
    };

    let exporter = FitsExporter::new(args.options());
    let mut failures = 0;
    for file in &files {
        if !is_header(file) {
            log::warn!("skipping {}: not an .imh file", file.display());
            continue;
        }
        if let Err(e) = convert(file, args, &exporter) {
            log::error!("{e:#}");
            failures += 1;
        }
    }
    Ok(failures)
}

fn main() -> Result<()> {
    let args = Args::parse();
    env_logger::Builder::new()
        .filter_level(args.level())
        .parse_default_env()
        .init();

    let failures = run(&args)?;
    if failures > 0 {
        log::error!("{failures} file(s) failed");
        process::exit(1);
    }
    Ok(())
}
