use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
    process::ExitCode,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use clap::{Parser, ValueEnum};
use num_traits::AsPrimitive;
use serde::de::DeserializeOwned;
use string_art_core::{
    generate_sequence_with,
    verboser::{Message, Verboser},
    DarknessField, FieldOptions, Float, Grid, Options, PinLayout, Sampling, Shape, SourceImage,
    ViewTransform,
};
use thiserror::Error;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Input file path.
    #[arg()]
    input: PathBuf,

    /// Number of pins around the output surface.
    #[arg(short, long, default_value_t = 256)]
    pins: usize,

    /// Layout of the pins (circle/square).
    #[arg(long, default_value_t = Shape::Circle)]
    shape: Shape,

    /// Distance in pixels kept between the pins and the border.
    #[arg(long)]
    margin: Option<f64>,

    /// Chords to draw.
    #[arg(short, long, default_value_t = 3000)]
    lines: usize,

    /// Width in pixels of the output surface.
    #[arg(long, default_value_t = 800)]
    width: usize,

    /// Height in pixels of the output surface.
    #[arg(long, default_value_t = 800)]
    height: usize,

    /// Output pixels per source pixel. The image covers the surface when unset.
    #[arg(short, long)]
    zoom: Option<f64>,

    #[arg(long, requires = "zoom", allow_negative_numbers = true)]
    offset_x: Option<f64>,

    #[arg(long, requires = "zoom", allow_negative_numbers = true)]
    offset_y: Option<f64>,

    /// Pin the thread starts from.
    #[arg(long, default_value_t = 0)]
    start_pin: usize,

    /// JSON file with the sequencing options. Flags below override it.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Recently visited pins that can not be chosen next.
    #[arg(long)]
    exclusion_window: Option<usize>,

    /// Times the same chord may be drawn, 0 for no limit.
    #[arg(long)]
    max_repeats: Option<usize>,

    /// Ink removed by every chord, within [0, 1].
    #[arg(long)]
    ink_weight: Option<f64>,

    /// Best chord score at which the run stops.
    #[arg(long)]
    threshold: Option<f64>,

    /// Darkness mode of processing.
    #[arg(long)]
    darkness_mode: Option<DarknessMode>,

    /// Minimum pin count between linked pins.
    #[arg(long)]
    min_pin_distance: Option<usize>,

    #[arg(long, default_value_t = SamplingMode::Bilinear)]
    sampling: SamplingMode,

    /// Precision of calculations (Single/Double).
    #[arg(long, default_value_t = Precision::Single)]
    precision: Precision,

    /// Stops sequencing after this many seconds, keeping the chords drawn so far.
    #[arg(long)]
    time_limit: Option<u64>,

    /// Logs progress every this many chords.
    #[arg(short, long, default_value_t = 500)]
    interval: usize,

    /// Output directory. Defaults to `output` next to the input file.
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[arg(long, default_value_t = 0.5)]
    line_thickness: f64,
}

#[derive(Clone, Copy, Debug)]
enum DarknessMode {
    Flat,
    Percentage,
}

impl ValueEnum for DarknessMode {
    fn value_variants<'a>() -> &'a [Self] {
        &[Self::Flat, Self::Percentage]
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        Some(match self {
            Self::Flat => clap::builder::PossibleValue::new("Flat")
                .alias("flat")
                .alias("Flatten")
                .alias("flatten"),
            Self::Percentage => clap::builder::PossibleValue::new("Percentage")
                .alias("percentage")
                .alias("per")
                .alias("Per"),
        })
    }
}

impl From<DarknessMode> for string_art_core::DarknessMode {
    fn from(mode: DarknessMode) -> Self {
        match mode {
            DarknessMode::Flat => Self::Flat,
            DarknessMode::Percentage => Self::Percentage,
        }
    }
}

#[derive(Clone, Copy, Debug)]
enum SamplingMode {
    Nearest,
    Bilinear,
}

impl ValueEnum for SamplingMode {
    fn value_variants<'a>() -> &'a [Self] {
        &[Self::Nearest, Self::Bilinear]
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        Some(match self {
            Self::Nearest => clap::builder::PossibleValue::new("Nearest").alias("nearest"),
            Self::Bilinear => clap::builder::PossibleValue::new("Bilinear")
                .alias("bilinear")
                .alias("linear"),
        })
    }
}

impl std::fmt::Display for SamplingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Nearest => write!(f, "Nearest"),
            Self::Bilinear => write!(f, "Bilinear"),
        }
    }
}

impl From<SamplingMode> for Sampling {
    fn from(mode: SamplingMode) -> Self {
        match mode {
            SamplingMode::Nearest => Self::Nearest,
            SamplingMode::Bilinear => Self::Bilinear,
        }
    }
}

#[derive(Clone, Copy, Debug)]
enum Precision {
    Single,
    Double,
}

impl ValueEnum for Precision {
    fn value_variants<'a>() -> &'a [Self] {
        &[Self::Single, Self::Double]
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        Some(match self {
            Self::Single => clap::builder::PossibleValue::new("Single")
                .alias("single")
                .alias("f32"),
            Self::Double => clap::builder::PossibleValue::new("Double")
                .alias("double")
                .alias("f64"),
        })
    }
}

impl std::fmt::Display for Precision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Single => write!(f, "Single"),
            Self::Double => write!(f, "Double"),
        }
    }
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    StringArt(#[from] string_art_core::Error),
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config file: {0}")]
    Config(#[from] serde_json::Error),
    #[error("invalid input file name {0:?}")]
    FileName(PathBuf),
}

/// Reports progress through `tracing`.
struct Progress {
    interval: usize,
    lines: usize,
}

impl Verboser for Progress {
    fn verbose(&mut self, message: Message) {
        match message {
            Message::CreatingPin(index) => tracing::trace!("Placing pin {index}."),
            Message::BuildingField(done, total) => {
                tracing::debug!("Darkness field rows {done}/{total}.")
            }
            Message::Computing(done) => {
                if self.interval > 0 && done > 0 && done % self.interval == 0 {
                    tracing::info!("{done}/{} chords drawn.", self.lines);
                }
            }
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let result = match args.precision {
        Precision::Single => with_precision::<f32>(&args),
        Precision::Double => with_precision::<f64>(&args),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn with_precision<S: Float + DeserializeOwned>(args: &Args) -> Result<(), CliError>
where
    usize: AsPrimitive<S>,
    u8: AsPrimitive<S>,
{
    let options = load_options::<S>(args)?;
    let mut progress = Progress {
        interval: args.interval,
        lines: args.lines,
    };

    let image = image::open(&args.input)?.to_rgba8();
    let source = SourceImage::try_from(&image)?;
    let output = Grid::new(args.width, args.height);
    let view = match args.zoom {
        Some(zoom) => ViewTransform::new(
            S::from_f64(zoom),
            S::from_f64(args.offset_x.unwrap_or(0.0)),
            S::from_f64(args.offset_y.unwrap_or(0.0)),
        )?,
        None => ViewTransform::fit(source.grid(), output)?,
    };
    let field = DarknessField::build(
        &source,
        output,
        &view,
        &FieldOptions {
            sampling: args.sampling.into(),
        },
        &mut progress,
    )?;

    let mut layout = PinLayout::new(args.shape, args.pins);
    if let Some(margin) = args.margin {
        layout = layout.with_margin(S::from_f64(margin));
    }
    let pins = layout.build(args.width.as_(), args.height.as_(), &mut progress)?;

    let cancel = Arc::new(AtomicBool::new(false));
    if let Some(seconds) = args.time_limit {
        let cancel = Arc::clone(&cancel);
        std::thread::spawn(move || {
            std::thread::sleep(Duration::from_secs(seconds));
            tracing::warn!("Time limit of {seconds}s reached, stopping.");
            cancel.store(true, Ordering::Relaxed);
        });
    }
    let art = generate_sequence_with(
        &pins,
        field,
        args.start_pin,
        args.lines,
        &options,
        &cancel,
        &mut progress,
    )?;
    if art.completed_early() {
        tracing::warn!(
            "Stopped after {} of {} chords ({:?}).",
            art.sequence.len(),
            art.requested,
            art.termination
        );
    }

    let file_name = args
        .input
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| CliError::FileName(args.input.clone()))?;
    let out_folder = args.output.clone().unwrap_or_else(|| {
        args.input
            .parent()
            .unwrap_or(Path::new("."))
            .join("output")
    });
    std::fs::create_dir_all(&out_folder)?;

    let svg_path = out_folder.join(format!("{file_name}.svg"));
    svg::save(
        &svg_path,
        &art.build_svg(&pins, output, S::from_f64(args.line_thickness)),
    )?;
    let png_path = out_folder.join(format!("{file_name}.png"));
    art.build_rgb(&pins, output)?.save(&png_path)?;
    let txt_path = out_folder.join(format!("{file_name}.txt"));
    std::fs::write(&txt_path, art.build_instructions())?;
    tracing::info!(
        "Saved {}, {} and {}.",
        svg_path.display(),
        png_path.display(),
        txt_path.display()
    );
    Ok(())
}

fn load_options<S: Float + DeserializeOwned>(args: &Args) -> Result<Options<S>, CliError> {
    let mut options: Options<S> = match &args.config {
        Some(path) => serde_json::from_reader(BufReader::new(File::open(path)?))?,
        None => Options::default(),
    };
    if let Some(window) = args.exclusion_window {
        options.exclusion_window = window;
    }
    if let Some(repeats) = args.max_repeats {
        options.max_repeats_per_edge = (repeats > 0).then_some(repeats);
    }
    if let Some(weight) = args.ink_weight {
        options.ink_weight = S::from_f64(weight);
    }
    if let Some(threshold) = args.threshold {
        options.termination_threshold = S::from_f64(threshold);
    }
    if let Some(mode) = args.darkness_mode {
        options.darkness_mode = mode.into();
    }
    if let Some(distance) = args.min_pin_distance {
        options.min_pin_distance = distance;
    }
    Ok(options)
}
