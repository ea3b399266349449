use std::{net::SocketAddr, path::PathBuf, sync::Arc};

use anyhow::Context as _;
use clap::Parser;
use countdown::{
    FrameIndex, GenerationRequest, GeneratorConfig, ServeConfig, ServeProfile, TextRendererFactory,
    assemble,
    encode_ffmpeg::ensure_parent_dir,
    http::{ApiServer, ServiceState},
    render_frame_at,
    telemetry::init_logging,
    text::{DEFAULT_FONT_PATH, DEFAULT_FONT_SIZE_PX},
};

#[derive(Parser, Debug)]
#[command(name = "countdown", version, about = "Render countdown timer videos")]
struct Cli {
    /// Countdown length in seconds.
    #[arg(default_value_t = 60.0)]
    duration: f64,

    /// Frame width in pixels.
    #[arg(default_value_t = 1920)]
    width: u32,

    /// Frame height in pixels.
    #[arg(default_value_t = 1080)]
    height: u32,

    /// Container format of the output file.
    #[arg(long, default_value = "mp4", value_parser = ["mp4", "avi", "mkv", "wmv", "flv"])]
    format: String,

    /// Run the HTTP service instead of writing a single file.
    #[arg(long)]
    api: bool,

    /// Use the production service profile (port 8000, 4 workers, info logs).
    #[arg(long, requires = "api")]
    prod: bool,

    /// TrueType font used for the countdown label.
    #[arg(long, default_value = DEFAULT_FONT_PATH)]
    font: PathBuf,

    /// Label font size in pixels.
    #[arg(long, default_value_t = DEFAULT_FONT_SIZE_PX)]
    font_size: f32,

    /// Directory that receives generated files.
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,

    /// Service listen address (overrides the profile).
    #[arg(long, requires = "api")]
    bind: Option<SocketAddr>,

    /// Service worker threads (overrides the profile).
    #[arg(long, requires = "api")]
    workers: Option<usize>,

    /// Write frame INDEX as a PNG instead of encoding a video.
    #[arg(long, value_name = "INDEX", conflicts_with = "api")]
    png_frame: Option<u64>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let generator = GeneratorConfig {
        font_path: cli.font.clone(),
        font_size_px: cli.font_size,
        output_dir: cli.out_dir.clone(),
    };

    if cli.api {
        return cmd_serve(&cli, generator);
    }

    init_logging("info")?;
    match cli.png_frame {
        Some(index) => cmd_png_frame(&cli, &generator, index),
        None => cmd_render(&cli, &generator),
    }
}

fn cmd_render(cli: &Cli, generator: &GeneratorConfig) -> anyhow::Result<()> {
    let request = GenerationRequest::new(cli.duration, cli.width, cli.height, &cli.format)?;
    let font = generator.load_font()?;
    let mut text = font.create()?;
    let base = generator.output_name_base(&request.output_name_base());

    let path = assemble(&request, &base, text.as_mut())?;

    println!("Video saved as {}", path.display());
    Ok(())
}

fn cmd_png_frame(cli: &Cli, generator: &GeneratorConfig, index: u64) -> anyhow::Result<()> {
    let request = GenerationRequest::new(cli.duration, cli.width, cli.height, &cli.format)?;
    if index >= request.frame_count() {
        anyhow::bail!(
            "frame {index} is out of range: a {}s countdown has {} frames",
            request.duration_secs,
            request.frame_count()
        );
    }

    let font = generator.load_font()?;
    let mut text = font.create()?;
    let frame = render_frame_at(
        FrameIndex(index),
        request.duration_secs,
        request.resolution,
        text.as_mut(),
    )?;

    let base = generator.output_name_base(&request.output_name_base());
    let mut name = base.into_os_string();
    name.push(format!("_frame{index}.png"));
    let out = PathBuf::from(name);
    ensure_parent_dir(&out)?;
    frame.save_png(&out)?;

    println!("Frame saved as {}", out.display());
    Ok(())
}

fn cmd_serve(cli: &Cli, generator: GeneratorConfig) -> anyhow::Result<()> {
    let profile = if cli.prod {
        ServeProfile::Production
    } else {
        ServeProfile::Development
    };
    let mut serve = ServeConfig::for_profile(profile);
    if let Some(bind) = cli.bind {
        serve.bind = bind;
    }
    if let Some(workers) = cli.workers {
        serve.workers = workers;
    }
    serve.validate()?;
    init_logging(serve.default_log_level())?;

    let font = generator
        .load_font()
        .with_context(|| format!("load font '{}'", generator.font_path.display()))?;
    tracing::info!(
        ?profile,
        bind = %serve.bind,
        workers = serve.workers,
        font = font.source(),
        "starting countdown service"
    );

    let state = ServiceState::new(generator, Arc::new(font), serve.workers);
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(serve.workers)
        .max_blocking_threads(serve.max_blocking_threads())
        .thread_name("countdown-worker")
        .enable_all()
        .build()
        .context("build tokio runtime")?;

    runtime.block_on(ApiServer::new(state).serve(serve.bind))
}
