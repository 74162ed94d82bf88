//! ID Capture CLI
//!
//! Command-line driver for the document capture flow: runs the crop
//! mapping on literal numbers, submits files through the upload path, or
//! walks the camera path interactively.

use clap::{Args, Parser, Subcommand};
use id_capture::{
    capture::{AcquisitionState, Camera, FileConfig},
    geometry::{map_guide_to_source, CoverFit, GuideRect, Size},
    metrics::{MetricsRegistry, MetricsSnapshot},
    payload::StdoutSink,
    session::{Country, DocType, Step},
    ControllerError, FlowController,
};
use std::io::BufRead;
use std::path::PathBuf;
use std::sync::mpsc;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "id-capture", version, about = "Guided identity document capture")]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Map a guide rectangle into source pixels
    Map(MapArgs),
    /// List the document types offered per country
    Options,
    /// Submit document images from files
    Upload(UploadArgs),
    /// Capture document images from the camera
    Camera(CameraArgs),
}

#[derive(Args)]
struct MapArgs {
    /// Displayed video width and height
    #[arg(long, num_args = 2, value_names = ["W", "H"], required = true)]
    display: Vec<f64>,
    /// Native source width and height
    #[arg(long, num_args = 2, value_names = ["W", "H"], required = true)]
    source: Vec<f64>,
    /// Guide x, y, width, height relative to the video element
    #[arg(long, num_args = 4, value_names = ["X", "Y", "W", "H"], required = true, allow_negative_numbers = true)]
    guide: Vec<f64>,
}

#[derive(Args)]
struct DocumentArgs {
    /// Issuing country (CN or SG)
    #[arg(long, default_value = "CN")]
    country: Country,
    /// Document type ("national-id" or "passport")
    #[arg(long, default_value = "national-id")]
    doc_type: DocType,
}

#[derive(Args)]
struct UploadArgs {
    #[command(flatten)]
    document: DocumentArgs,
    /// Front side (or passport photo page)
    #[arg(long)]
    front: PathBuf,
    /// Back side of a national ID
    #[arg(long)]
    back: Option<PathBuf>,
    /// Print compact JSON
    #[arg(long)]
    compact: bool,
}

#[derive(Args)]
struct CameraArgs {
    #[command(flatten)]
    document: DocumentArgs,
    /// Camera device index
    #[arg(long)]
    device: Option<u32>,
    /// Treat the hosting context as insecure
    #[arg(long)]
    insecure: bool,
}

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => match FileConfig::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Failed to load config {}: {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => FileConfig::default(),
    };

    let result = match cli.command {
        Command::Map(args) => run_map(&args),
        Command::Options => {
            run_options();
            Ok(())
        }
        Command::Upload(args) => run_upload(&config, &args),
        Command::Camera(args) => run_camera(config, &args),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run_map(args: &MapArgs) -> Result<(), ControllerError> {
    let display = Size::new(args.display[0], args.display[1]);
    let source = Size::new(args.source[0], args.source[1]);
    let guide = GuideRect::new(args.guide[0], args.guide[1], args.guide[2], args.guide[3]);

    let fit = CoverFit::new(display, source)?;
    info!(
        scale = fit.scale,
        offset_x = fit.offset_x,
        offset_y = fit.offset_y,
        "Cover fit"
    );

    let region = map_guide_to_source(display, source, guide)?;
    println!(
        "x={:.2} y={:.2} width={:.2} height={:.2}",
        region.x, region.y, region.width, region.height
    );
    Ok(())
}

fn run_options() {
    for country in Country::ALL {
        println!("{}", country.label());
        for option in DocType::options_for(country) {
            let marker = if option.enabled { "+" } else { "-" };
            println!("  {} {}", marker, option.doc_type);
        }
    }
}

fn select_document<C: Camera>(
    flow: &mut FlowController<C, StdoutSink>,
    document: &DocumentArgs,
) -> Result<(), ControllerError> {
    flow.select_country(document.country)?;
    flow.select_doc_type(document.doc_type)?;
    flow.continue_to_method()
}

fn run_upload(config: &FileConfig, args: &UploadArgs) -> Result<(), ControllerError> {
    let pretty = config.output.pretty && !args.compact;
    let mut flow = FlowController::from_config(
        id_capture::MockCamera::new(),
        StdoutSink::stdout(pretty),
        config,
    );
    let metrics = MetricsPublisher::start(config.output.metrics_port);

    select_document(&mut flow, &args.document)?;
    flow.choose_upload()?;

    info!(side = flow.session().side_label(), path = %args.front.display(), "Uploading");
    flow.upload_file(&args.front)?;

    if flow.session().step() != Step::Success {
        let Some(back) = &args.back else {
            eprintln!("{} requires --back", flow.session().doc_type());
            std::process::exit(2);
        };
        info!(side = flow.session().side_label(), path = %back.display(), "Uploading");
        flow.upload_file(back)?;
    } else if args.back.is_some() {
        warn!("Ignoring --back: {} has a single page", flow.session().doc_type());
    }

    metrics.publish(&flow);
    flow.confirm()?;
    metrics.publish(&flow);
    Ok(())
}

/// Input events for the interactive camera loop.
enum Input {
    Line(String),
    Interrupt,
    Closed,
}

fn run_camera(mut config: FileConfig, args: &CameraArgs) -> Result<(), ControllerError> {
    if let Some(device) = args.device {
        config.capture.device_id = device;
    }
    if args.insecure {
        config.capture.secure_context = false;
    }

    let mut flow = FlowController::from_config(
        open_camera(),
        StdoutSink::stdout(config.output.pretty),
        &config,
    );
    let metrics = MetricsPublisher::start(config.output.metrics_port);

    let (tx, rx) = mpsc::channel();
    let interrupt = tx.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        let _ = interrupt.send(Input::Interrupt);
    }) {
        warn!(error = %e, "Failed to install interrupt handler");
    }
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            match line {
                Ok(line) => {
                    if tx.send(Input::Line(line)).is_err() {
                        return;
                    }
                }
                Err(_) => break,
            }
        }
        let _ = tx.send(Input::Closed);
    });

    select_document(&mut flow, &args.document)?;
    report_acquisition(flow.choose_camera()?);
    prompt(&flow);
    metrics.publish(&flow);

    for input in rx {
        let command = match input {
            Input::Line(line) => line.trim().to_ascii_lowercase(),
            Input::Interrupt | Input::Closed => {
                info!("Leaving capture; releasing camera");
                break;
            }
        };

        let outcome = match command.as_str() {
            "" | "c" | "capture" => flow.capture_from_camera(),
            "r" | "retry" => flow.retry_camera().map(report_acquisition),
            "b" | "back" => flow.back(),
            "q" | "quit" => break,
            other => {
                println!("Unknown command: {other}");
                Ok(())
            }
        };
        if let Err(e) = outcome {
            warn!(error = %e, "Action failed");
        }

        metrics.publish(&flow);
        match flow.session().step() {
            Step::Success => {
                flow.confirm()?;
                metrics.publish(&flow);
                break;
            }
            Step::Camera => prompt(&flow),
            _ => {
                info!("Left the camera step");
                break;
            }
        }
    }

    Ok(())
}

fn open_camera() -> Box<dyn Camera> {
    #[cfg(feature = "camera")]
    {
        Box::new(id_capture::capture::NativeCamera::new())
    }
    #[cfg(not(feature = "camera"))]
    {
        info!("Built without the camera feature; using mock camera input");
        Box::new(id_capture::MockCamera::new())
    }
}

fn report_acquisition(state: &AcquisitionState) {
    match state {
        AcquisitionState::Granted { width, height } => {
            info!(width, height, "Camera ready");
        }
        AcquisitionState::Denied(e) => {
            println!("{}", e.user_message());
            println!("Type 'retry' to request camera access again, or 'back' to go back.");
        }
        AcquisitionState::Pending => info!("Requesting camera access..."),
    }
}

fn prompt<C: Camera>(flow: &FlowController<C, StdoutSink>) {
    println!(
        "[{}] Align the document inside the frame and press Enter to capture ('back', 'retry', 'quit').",
        flow.session().side_label()
    );
}

/// Pushes controller counters to the metrics registry, and serves them when
/// built with the `metrics` feature and a non-zero port is configured.
struct MetricsPublisher {
    registry: Option<MetricsRegistry>,
    #[cfg(feature = "metrics")]
    shared: Option<std::sync::Arc<tokio::sync::RwLock<id_capture::metrics::MetricsState>>>,
}

impl MetricsPublisher {
    #[cfg(feature = "metrics")]
    fn start(port: u16) -> Self {
        use id_capture::metrics::{MetricsServer, MetricsServerConfig};

        let registry = Self::local_registry();
        let Some(registry) = registry.filter(|_| port != 0) else {
            return Self {
                registry,
                shared: None,
            };
        };

        let server = MetricsServer::new(MetricsServerConfig::with_port(port), registry);
        let shared = server.state();
        std::thread::spawn(move || {
            let runtime = match tokio::runtime::Runtime::new() {
                Ok(runtime) => runtime,
                Err(e) => {
                    warn!(error = %e, "Failed to start metrics runtime");
                    return;
                }
            };
            if let Err(e) = runtime.block_on(server.run()) {
                warn!(error = %e, "Metrics server stopped");
            }
        });

        Self {
            registry: None,
            shared: Some(shared),
        }
    }

    #[cfg(not(feature = "metrics"))]
    fn start(port: u16) -> Self {
        if port != 0 {
            warn!(port, "Metrics port configured but built without the metrics feature");
        }
        Self {
            registry: Self::local_registry(),
        }
    }

    fn local_registry() -> Option<MetricsRegistry> {
        match MetricsRegistry::new() {
            Ok(registry) => Some(registry),
            Err(e) => {
                warn!(error = %e, "Metrics disabled");
                None
            }
        }
    }

    fn publish<C: Camera>(&self, flow: &FlowController<C, StdoutSink>) {
        let snapshot = MetricsSnapshot::from_controller(flow);

        #[cfg(feature = "metrics")]
        {
            if let Some(shared) = &self.shared {
                shared.blocking_write().update(&snapshot);
            }
        }

        if let Some(registry) = &self.registry {
            registry.update(&snapshot);
            if let Ok(text) = registry.encode() {
                tracing::debug!(metrics = %text, "Flow metrics");
            }
        }
    }
}
