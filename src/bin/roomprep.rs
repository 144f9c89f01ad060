use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use room_image_prep_wasm::{
    AspectPreset, CropRect, EditRecipe, ExportConfig, PaletteConfig, PaletteExtractor, RasterImage,
    collage_bytes, edit_bytes,
};
use std::fs;
use std::path::{Path, PathBuf};

/// Prepare room photos: extract palettes, apply edits, build comparisons.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the dominant colors of each input as JSON
    Palette {
        /// One or more input image paths
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// JSON file overriding palette extraction settings
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Apply brightness/contrast/rotation/crop and write the result
    Edit {
        input: PathBuf,

        /// Output path (default: `<input>.edited.<jpg|png>` next to the input)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// JSON edit recipe; individual flags below override its fields
        #[arg(short, long)]
        recipe: Option<PathBuf>,

        /// Brightness percentage (50-150)
        #[arg(short, long)]
        brightness: Option<i32>,

        /// Contrast percentage (50-150)
        #[arg(short = 'k', long)]
        contrast: Option<i32>,

        /// Clockwise rotation in degrees (multiple of 90)
        #[arg(long)]
        rotate: Option<u32>,

        /// Crop ratio preset: Free, 1:1, 4:3, 3:4, 16:9, 9:16
        #[arg(short, long)]
        aspect: Option<AspectPreset>,

        /// Crop rectangle in percent as x,y,width,height
        #[arg(long)]
        crop: Option<String>,

        /// JPEG quality (1-100)
        #[arg(short, long, default_value_t = room_image_prep_wasm::DEFAULT_JPEG_QUALITY)]
        quality: u8,

        /// Write PNG instead of JPEG
        #[arg(long)]
        png: bool,
    },

    /// Side-by-side before/after image
    Collage {
        original: PathBuf,
        generated: PathBuf,

        /// Output path (default: `<original>.comparison.jpg`)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    match args.command {
        Command::Palette { inputs, config } => {
            let config = match config {
                Some(path) => read_json::<PaletteConfig>(&path)?,
                None => PaletteConfig::default(),
            };
            let extractor = PaletteExtractor::new(config).context("invalid palette config")?;

            let mut report = serde_json::Map::new();
            for input in &inputs {
                let bytes = fs::read(input).with_context(|| format!("reading {}", input.display()))?;
                let image = RasterImage::decode(&bytes)
                    .with_context(|| format!("decoding {}", input.display()))?;
                let palette = extractor.extract(&image);
                report.insert(input.display().to_string(), serde_json::to_value(&palette)?);
            }
            println!("{}", serde_json::to_string_pretty(&report)?);
        }

        Command::Edit {
            input,
            output,
            recipe,
            brightness,
            contrast,
            rotate,
            aspect,
            crop,
            quality,
            png,
        } => {
            let mut recipe = match recipe {
                Some(path) => read_json::<EditRecipe>(&path)?,
                None => EditRecipe::default(),
            };
            if let Some(b) = brightness {
                recipe.brightness = b;
            }
            if let Some(c) = contrast {
                recipe.contrast = c;
            }
            if let Some(degrees) = rotate {
                if degrees % 90 != 0 {
                    bail!("rotation must be a multiple of 90, got {degrees}");
                }
                recipe.quarter_turns = degrees / 90;
            }
            if aspect.is_some() {
                recipe.aspect = aspect;
            }
            if let Some(spec) = crop {
                recipe.crop = Some(parse_crop(&spec)?);
            }

            let export = if png { ExportConfig::png() } else { ExportConfig::jpeg(quality) };
            let bytes = fs::read(&input).with_context(|| format!("reading {}", input.display()))?;
            let encoded = edit_bytes(&bytes, &recipe, &export).context("edit failed")?;
            let output = output.unwrap_or_else(|| sibling(&input, "edited", &export));
            write_output(&output, &encoded)?;
        }

        Command::Collage {
            original,
            generated,
            output,
        } => {
            let a = fs::read(&original).with_context(|| format!("reading {}", original.display()))?;
            let b = fs::read(&generated).with_context(|| format!("reading {}", generated.display()))?;
            let export = ExportConfig::default();
            let encoded = collage_bytes(&a, &b, &export).context("collage failed")?;
            let output = output.unwrap_or_else(|| sibling(&original, "comparison", &export));
            write_output(&output, &encoded)?;
        }
    }

    Ok(())
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

fn parse_crop(spec: &str) -> Result<CropRect> {
    let parts: Vec<f64> = spec
        .split(',')
        .map(|p| p.trim().parse::<f64>())
        .collect::<std::result::Result<_, _>>()
        .with_context(|| format!("invalid crop `{spec}`"))?;
    let [x, y, width, height] = parts[..] else {
        bail!("crop needs four values x,y,width,height, got `{spec}`");
    };
    Ok(CropRect::new(x, y, width, height))
}

/// `<dir>/<stem>.<tag>.<ext>` beside `input`.
fn sibling(input: &Path, tag: &str, export: &ExportConfig) -> PathBuf {
    let stem = input.file_stem().unwrap_or_default().to_string_lossy();
    input.with_file_name(format!("{stem}.{tag}.{}", export.format.extension()))
}

fn write_output(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, bytes)?;
    println!("Saved → {}", path.display());
    Ok(())
}
