use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use log::LevelFilter;
use pagesnap::{
    CaptureTarget, ExportConfig, ExportOrchestrator, FitMode, Notification, Orientation,
    PageFormat, PageSize, PaginationPlanner, ReportView, Rgb, SourceImage, Unit,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pagesnap", version, about = "Paginated PDF export of report snapshots")]
struct Cli {
    /// JSON configuration file; flags override its values
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Capture a view and write it as a paginated PDF
    Export(ExportArgs),
    /// Print the page plan for an image size without exporting
    Plan(PlanArgs),
}

#[derive(Args)]
struct PageArgs {
    /// Paper size (a3, a4, a5, letter, legal)
    #[arg(long)]
    page: Option<PageSize>,

    /// Landscape pages
    #[arg(long)]
    landscape: bool,

    /// Document unit (mm, pt, in)
    #[arg(long)]
    unit: Option<Unit>,

    /// Fit policy (tile, shrink-to-page)
    #[arg(long)]
    fit: Option<FitMode>,
}

impl PageArgs {
    fn apply(&self, config: &mut ExportConfig) {
        if let Some(page) = self.page {
            config.writer.format = page;
        }
        if self.landscape {
            config.writer.orientation = Orientation::Landscape;
        }
        if let Some(unit) = self.unit {
            config.writer.unit = unit;
        }
        if let Some(fit) = self.fit {
            config.fit_mode = fit;
        }
    }
}

#[derive(Args)]
struct ExportArgs {
    /// Pre-rendered snapshot image to export
    #[arg(long, conflicts_with_all = ["url", "selector"])]
    snapshot: Option<PathBuf>,

    /// Page to capture (requires the `cdp` feature)
    #[arg(long, requires = "selector")]
    url: Option<String>,

    /// CSS selector of the element to capture
    #[arg(long, requires = "url")]
    selector: Option<String>,

    /// Report label used in the output file name (defaults to the snapshot file name)
    #[arg(long)]
    label: Option<String>,

    /// Output directory
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// Milliseconds to wait before capturing
    #[arg(long)]
    settle_ms: Option<u64>,

    /// Background behind transparent pixels, as #rrggbb
    #[arg(long)]
    background: Option<Rgb>,

    /// Print the export report as JSON
    #[arg(long)]
    json: bool,

    #[command(flatten)]
    page: PageArgs,
}

#[derive(Args)]
struct PlanArgs {
    /// Source image width in pixels
    #[arg(long)]
    width: u32,

    /// Source image height in pixels
    #[arg(long)]
    height: u32,

    /// Print the plan as JSON
    #[arg(long)]
    json: bool,

    #[command(flatten)]
    page: PageArgs,
}

fn init_logging(verbose: bool) {
    let default = if verbose { LevelFilter::Debug } else { LevelFilter::Info };
    env_logger::Builder::new()
        .filter_level(default)
        .parse_default_env()
        .init();
}

async fn run_export(mut config: ExportConfig, args: ExportArgs) -> anyhow::Result<()> {
    args.page.apply(&mut config);
    if let Some(out) = args.out {
        config.output_dir = out;
    }
    if let Some(ms) = args.settle_ms {
        config.settle_delay_ms = ms;
    }
    if let Some(bg) = args.background {
        config.capture.background = Some(bg);
    }

    let target = match (args.snapshot, args.url, args.selector) {
        (Some(path), _, _) => Some(CaptureTarget::File(path)),
        (None, Some(url), Some(selector)) => Some(CaptureTarget::Element { url, selector }),
        _ => None,
    };
    let label = args
        .label
        .or_else(|| match &target {
            Some(CaptureTarget::File(path)) => {
                path.file_name().map(|n| n.to_string_lossy().into_owned())
            }
            _ => None,
        })
        .unwrap_or_else(|| "report".to_string());

    let worker = pagesnap::new_capture_worker(&config)
        .await
        .context("failed to start the snapshot renderer")?;
    let mut exporter = ExportOrchestrator::new(worker, config)?;
    exporter.on_outcome(|n| match n {
        Notification::Success(msg) => println!("{}", msg),
        Notification::Failure(msg) => eprintln!("{}", msg),
    });

    let result = exporter.export_current_view(&ReportView { label, target }).await;
    exporter.into_renderer().close().await.ok();

    // the failure notification above has already been printed
    let Ok(report) = result else {
        std::process::exit(1);
    };
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{} ({} page(s))", report.path.display(), report.page_count);
    }
    Ok(())
}

fn run_plan(mut config: ExportConfig, args: PlanArgs) -> anyhow::Result<()> {
    args.page.apply(&mut config);
    let source = SourceImage::new(args.width, args.height)?;
    let (w, h) = config.writer.page_dimensions();
    let page = PageFormat::new(w, h)?;
    let plan = PaginationPlanner::new(config.fit_mode)
        .with_max_pages(config.max_pages)
        .plan(&source, &page)?;

    if args.json {
        let placements: Vec<_> = plan
            .iter()
            .map(|p| {
                serde_json::json!({
                    "page_index": p.page_index,
                    "draw_width": p.draw_width,
                    "draw_height": p.draw_height,
                    "vertical_offset": p.vertical_offset,
                })
            })
            .collect();
        let out = serde_json::json!({
            "page_width": w,
            "page_height": h,
            "fitted_width": plan.fitted_width(),
            "fitted_height": plan.fitted_height(),
            "placements": placements,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!(
        "{}x{} px on {:.2}x{:.2} page: fitted {:.2}x{:.2}, {} page(s)",
        args.width,
        args.height,
        w,
        h,
        plan.fitted_width(),
        plan.fitted_height(),
        plan.page_count()
    );
    for p in &plan {
        println!("  page {:>3}  offset {:>10.2}", p.page_index, p.vertical_offset);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match &cli.config {
        Some(path) => ExportConfig::from_json_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => ExportConfig::default(),
    };

    match cli.command {
        Command::Export(args) => {
            if args.snapshot.is_none() && args.url.is_none() {
                bail!("pass --snapshot <PATH> or --url <URL> --selector <CSS>");
            }
            run_export(config, args).await
        }
        Command::Plan(args) => run_plan(config, args),
    }
}
