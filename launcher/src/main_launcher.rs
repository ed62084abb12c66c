use pixie_pattern::core::{path_to_filename, path_with_prefixed_filename};
use pixie_pattern::{
    build_grid, generate, legend, render_pattern, symbol_text, Bitmap, Catalog, PatternSettings,
};

use anyhow::{anyhow, bail, Context, Result};
use directories::ProjectDirs;
use log::{debug, info};

use std::convert::TryFrom;
use std::path::{Path, PathBuf};

const USAGE: &str = "\
Usage: pixie_pattern [--config <path>] [--catalog <path>] [-v] <command> ...
  resize  <height> <input> [output]
  reduce  <height> <input> [output]
  pattern <height> <colors> <input> [output-dir]";

#[derive(Debug, PartialEq)]
enum Command {
    Resize {
        height: u32,
        input: PathBuf,
        output: Option<PathBuf>,
    },
    Reduce {
        height: u32,
        input: PathBuf,
        output: Option<PathBuf>,
    },
    Pattern {
        height: u32,
        color_count: usize,
        input: PathBuf,
        output_dir: Option<PathBuf>,
    },
}

#[derive(Debug, PartialEq)]
struct CommandlineArgs {
    config_path: Option<PathBuf>,
    catalog_path: Option<PathBuf>,
    verbose: bool,
    command: Command,
}

////////////////////////////////////////////////////////////////////////////////////////////////////
// Commandline

fn parse_commandline(args: &[String]) -> Result<CommandlineArgs> {
    let mut config_path = None;
    let mut catalog_path = None;
    let mut verbose = false;
    let mut positional: Vec<&str> = Vec::new();

    let mut args_iter = args.iter();
    while let Some(arg) = args_iter.next() {
        match arg.as_str() {
            "--config" => {
                let value = args_iter.next().context("--config expects a path")?;
                config_path = Some(PathBuf::from(value));
            }
            "--catalog" => {
                let value = args_iter.next().context("--catalog expects a path")?;
                catalog_path = Some(PathBuf::from(value));
            }
            "-v" | "--verbose" => verbose = true,
            "-h" | "--help" => bail!("{}", USAGE),
            _ => positional.push(arg.as_str()),
        }
    }

    let command = match positional.as_slice() {
        ["resize", height, input, rest @ ..] if rest.len() <= 1 => Command::Resize {
            height: parse_height(height)?,
            input: PathBuf::from(input),
            output: rest.first().map(PathBuf::from),
        },
        ["reduce", height, input, rest @ ..] if rest.len() <= 1 => Command::Reduce {
            height: parse_height(height)?,
            input: PathBuf::from(input),
            output: rest.first().map(PathBuf::from),
        },
        ["pattern", height, colors, input, rest @ ..] if rest.len() <= 1 => Command::Pattern {
            height: parse_height(height)?,
            color_count: parse_color_count(colors)?,
            input: PathBuf::from(input),
            output_dir: rest.first().map(PathBuf::from),
        },
        [] => bail!("Missing command\n{}", USAGE),
        [command, ..] if !["resize", "reduce", "pattern"].contains(command) => {
            bail!("Unsupported command '{}'\n{}", command, USAGE)
        }
        _ => bail!("Wrong number of arguments\n{}", USAGE),
    };

    Ok(CommandlineArgs {
        config_path,
        catalog_path,
        verbose,
        command,
    })
}

fn parse_positive(value: &str, what: &str) -> Result<i64> {
    let number: i64 = value
        .trim()
        .parse()
        .map_err(|_| anyhow!("Invalid {} '{}': expected an integer", what, value))?;
    if number <= 0 {
        bail!("Invalid {} {}: must be positive", what, number);
    }
    Ok(number)
}

fn parse_height(value: &str) -> Result<u32> {
    let height = parse_positive(value, "height")?;
    u32::try_from(height).map_err(|_| anyhow!("Invalid height {}: too large", height))
}

fn parse_color_count(value: &str) -> Result<usize> {
    let color_count = parse_positive(value, "color count")?;
    usize::try_from(color_count).map_err(|_| anyhow!("Invalid color count {}: too large", color_count))
}

////////////////////////////////////////////////////////////////////////////////////////////////////
// Paths

fn get_executable_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|executable_path| executable_path.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Relative resource paths that do not exist in the current working dir are looked up next to
/// the executable
fn resolve_resource_path(path: &Path) -> PathBuf {
    if path.is_absolute() || path.exists() {
        return path.to_path_buf();
    }
    let candidate = get_executable_dir().join(path);
    if candidate.exists() {
        candidate
    } else {
        path.to_path_buf()
    }
}

fn get_default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "pixie_pattern")
        .map(|project_dirs| project_dirs.config_dir().join("settings.json"))
}

/// Example:
/// input: "photos/cat.png"
///
/// This returns:
/// "resized_cat.png"
fn get_resized_output_path(input: &Path) -> PathBuf {
    PathBuf::from(format!("resized_{}", path_to_filename(input)))
}

fn get_image_stem(input: &Path) -> String {
    input
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "pattern".to_owned())
}

////////////////////////////////////////////////////////////////////////////////////////////////////
// Loading resources

fn load_settings(config_path: Option<&Path>) -> Result<PatternSettings> {
    if let Some(config_path) = config_path {
        return PatternSettings::load(config_path)
            .with_context(|| format!("Cannot load settings '{}'", config_path.display()));
    }

    match get_default_config_path() {
        Some(default_path) if default_path.exists() => PatternSettings::load(&default_path)
            .with_context(|| format!("Cannot load settings '{}'", default_path.display())),
        _ => {
            debug!("No settings file found, using defaults");
            Ok(PatternSettings::default())
        }
    }
}

fn load_catalog(catalog_path: &Path) -> Result<Catalog> {
    let catalog_path = resolve_resource_path(catalog_path);
    let catalog = Catalog::load(&catalog_path)
        .with_context(|| format!("Cannot load thread catalog '{}'", catalog_path.display()))?;
    if catalog.is_empty() {
        bail!("Thread catalog '{}' is empty", catalog_path.display());
    }
    info!(
        "Loaded {} threads from '{}'",
        catalog.len(),
        catalog_path.display()
    );
    Ok(catalog)
}

fn open_image(path: &Path) -> Result<Bitmap> {
    Bitmap::open(path).with_context(|| format!("Cannot load image '{}'", path.display()))
}

fn save_image(image: &Bitmap, path: &Path) -> Result<()> {
    image
        .save(path)
        .with_context(|| format!("Cannot save image '{}'", path.display()))
}

fn resize_image(image: &Bitmap, height: u32) -> Result<Bitmap> {
    image
        .resized_to_height(height)
        .with_context(|| format!("Cannot resize image to height {}", height))
}

////////////////////////////////////////////////////////////////////////////////////////////////////
// Commands

fn command_resize(input: &Path, output: &Path, height: u32) -> Result<()> {
    let image = open_image(input)?;
    let resized = resize_image(&image, height)?;
    save_image(&resized, output)?;
    println!("Image resized and saved successfully to {}", output.display());
    Ok(())
}

fn command_reduce(input: &Path, output: &Path, height: u32, catalog: &Catalog) -> Result<()> {
    let image = open_image(input)?;
    let resized = resize_image(&image, height)?;
    save_image(&resized, output)?;

    let reduced = pixie_pattern::reduce(&resized, catalog).context("Cannot reduce image colors")?;
    let reduced_path = path_with_prefixed_filename(output, "reduced_");
    save_image(&reduced, &reduced_path)?;

    let grid = build_grid(&reduced, catalog, true)?;
    print!("{}", symbol_text(&grid));
    println!(
        "Image resized to {} and reduced to {}",
        output.display(),
        reduced_path.display()
    );
    Ok(())
}

fn command_pattern(
    input: &Path,
    output_dir: &Path,
    settings: &PatternSettings,
    catalog: &Catalog,
) -> Result<()> {
    let image = open_image(input)?;
    let pattern = generate(&image, catalog, settings).context("Cannot generate pattern")?;

    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("Cannot create directory '{}'", output_dir.display()))?;

    let image_stem = get_image_stem(input);
    save_image(
        &pattern.reduced,
        &output_dir.join(format!("{}_reduced.png", image_stem)),
    )?;
    for style in &settings.styles {
        let rendered = render_pattern(
            &pattern.grid,
            *style,
            settings.cell_size,
            settings.stitch_thickness,
        )?;
        let output_path = output_dir.join(format!("{}_{}.png", image_stem, style.file_suffix()));
        save_image(&rendered, &output_path)?;
        info!("Wrote '{}'", output_path.display());
    }

    print!("{}", symbol_text(&pattern.grid));
    println!();
    for entry in legend(&pattern.grid) {
        println!(
            "{}  {:>5}  {:<32} {:>6} stitches",
            entry.thread.symbol.unwrap_or('?'),
            entry.thread.id,
            entry.thread.name,
            entry.count
        );
    }
    println!(
        "Pattern of {}x{} stitches written to {}",
        pattern.grid.width,
        pattern.grid.height,
        output_dir.display()
    );
    Ok(())
}

////////////////////////////////////////////////////////////////////////////////////////////////////
// Main

fn init_logging(verbose: bool) -> Result<()> {
    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{} {}] {}",
                record.level(),
                record.target(),
                message
            ))
        })
        .level(level)
        .chain(std::io::stderr())
        .apply()
        .context("Cannot initialize logging")
}

fn run() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let args = parse_commandline(&args)?;
    init_logging(args.verbose)?;

    let settings = load_settings(args.config_path.as_deref())?;
    let catalog_path = args
        .catalog_path
        .clone()
        .unwrap_or_else(|| settings.catalog_path.clone());

    match args.command {
        Command::Resize {
            height,
            input,
            output,
        } => {
            let output = output.unwrap_or_else(|| get_resized_output_path(&input));
            command_resize(&input, &output, height)
        }
        Command::Reduce {
            height,
            input,
            output,
        } => {
            let catalog = load_catalog(&catalog_path)?;
            let output = output.unwrap_or_else(|| get_resized_output_path(&input));
            command_reduce(&input, &output, height, &catalog)
        }
        Command::Pattern {
            height,
            color_count,
            input,
            output_dir,
        } => {
            let catalog = load_catalog(&catalog_path)?;
            let settings = PatternSettings {
                height,
                color_count,
                ..settings
            };
            let output_dir = output_dir.unwrap_or_else(|| settings.output_dir.clone());
            command_pattern(&input, &output_dir, &settings, &catalog)
        }
    }
}

fn main() {
    if let Err(error) = run() {
        eprintln!("Error: {:?}", error);
        std::process::exit(1);
    }
}
