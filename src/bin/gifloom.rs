use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "gifloom", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Split sprite sheets into tile PNGs.
    Split(SplitArgs),
    /// Bind a template to material images and write a GIF.
    Build(BuildArgs),
    /// Apply one template to many sprite sheets.
    Batch(BatchArgs),
    /// Print a JSON summary of a GIF file.
    Info(InfoArgs),
    /// Print a JSON summary of a template file.
    Template(TemplateArgs),
}

#[derive(Args, Debug)]
struct GridArgs {
    /// Number of columns (with --rows).
    #[arg(long, requires = "rows", conflicts_with_all = ["tile_width", "tile_height"])]
    cols: Option<u32>,

    /// Number of rows (with --cols).
    #[arg(long, requires = "cols")]
    rows: Option<u32>,

    /// Tile width in pixels (with --tile-height).
    #[arg(long, requires = "tile_height")]
    tile_width: Option<u32>,

    /// Tile height in pixels (with --tile-width).
    #[arg(long, requires = "tile_width")]
    tile_height: Option<u32>,

    /// Keep only these cells, as `row,col` pairs separated by `;` (e.g. `0,0;0,2`).
    #[arg(long)]
    positions: Option<String>,
}

impl GridArgs {
    fn spec(&self) -> anyhow::Result<gifloom::GridSpec> {
        match (self.cols, self.rows, self.tile_width, self.tile_height) {
            (Some(cols), Some(rows), None, None) => Ok(gifloom::GridSpec::ByCount { cols, rows }),
            (None, None, Some(tile_width), Some(tile_height)) => {
                Ok(gifloom::GridSpec::ByTileSize {
                    tile_width,
                    tile_height,
                })
            }
            _ => anyhow::bail!("pass either --cols/--rows or --tile-width/--tile-height"),
        }
    }

    fn selection(&self) -> anyhow::Result<gifloom::TileSelection> {
        let Some(raw) = &self.positions else {
            return Ok(gifloom::TileSelection::All);
        };
        let positions = raw
            .split(';')
            .filter(|p| !p.trim().is_empty())
            .map(|pair| {
                let (row, col) = pair
                    .split_once(',')
                    .with_context(|| format!("position '{pair}' is not 'row,col'"))?;
                Ok(gifloom::TilePosition::new(
                    row.trim().parse().with_context(|| format!("bad row in '{pair}'"))?,
                    col.trim().parse().with_context(|| format!("bad column in '{pair}'"))?,
                ))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;
        if positions.is_empty() {
            anyhow::bail!("--positions selects no cells");
        }
        Ok(gifloom::TileSelection::positions(positions))
    }
}

#[derive(Args, Debug)]
struct OutputArgs {
    /// Output width; overrides the template's settings.
    #[arg(long, requires = "height")]
    width: Option<u32>,

    /// Output height; overrides the template's settings.
    #[arg(long, requires = "width")]
    height: Option<u32>,

    /// Loop count (0 loops forever).
    #[arg(long)]
    loop_count: Option<u16>,

    /// Palette size: 16, 32, 64, 128 or 256.
    #[arg(long)]
    colors: Option<u16>,

    /// Keep fully transparent pixels transparent.
    #[arg(long)]
    transparent: bool,

    /// Render frames on the calling thread.
    #[arg(long)]
    no_parallel: bool,
}

impl OutputArgs {
    /// Template settings first, then explicit flags on top.
    fn settings(&self, template: &gifloom::Template) -> anyhow::Result<gifloom::GifSettings> {
        let mut s = match &template.settings {
            Some(ts) => ts.apply_to(gifloom::GifSettings::default()),
            None => gifloom::GifSettings::default(),
        };
        if let (Some(w), Some(h)) = (self.width, self.height) {
            s = s.with_output_size(w, h);
        }
        if let Some(n) = self.loop_count {
            s.loop_count = n;
        }
        if let Some(c) = self.colors {
            s.palette_size = gifloom::PaletteSize::try_from(c)?;
        }
        if self.transparent {
            s.transparent_background = true;
        }
        if self.no_parallel {
            s.threading.parallel = false;
        }
        s.validate()?;
        Ok(s)
    }
}

#[derive(Args, Debug)]
struct SplitArgs {
    /// Sprite sheets to split.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    #[command(flatten)]
    grid: GridArgs,

    /// Directory for the tile PNGs.
    #[arg(long)]
    out_dir: PathBuf,
}

#[derive(Args, Debug)]
struct BuildArgs {
    /// Template JSON.
    #[arg(long)]
    template: PathBuf,

    /// Material images, bound to template slots in order.
    #[arg(required = true)]
    materials: Vec<PathBuf>,

    #[command(flatten)]
    output: OutputArgs,

    /// Output GIF path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Args, Debug)]
struct BatchArgs {
    /// Template JSON.
    #[arg(long)]
    template: PathBuf,

    /// Sprite sheets, one GIF each.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    #[command(flatten)]
    grid: GridArgs,

    #[command(flatten)]
    output: OutputArgs,

    /// Directory for the generated GIFs.
    #[arg(long)]
    out_dir: PathBuf,
}

#[derive(Args, Debug)]
struct InfoArgs {
    /// GIF file to inspect.
    input: PathBuf,
}

#[derive(Args, Debug)]
struct TemplateArgs {
    /// Template JSON to summarize.
    input: PathBuf,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Split(args) => cmd_split(args),
        Command::Build(args) => cmd_build(args),
        Command::Batch(args) => cmd_batch(args),
        Command::Info(args) => cmd_info(args),
        Command::Template(args) => cmd_template(args),
    }
}

fn read_bytes(path: &Path) -> anyhow::Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("read '{}'", path.display()))
}

fn source_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn create_dir(dir: &Path) -> anyhow::Result<()> {
    std::fs::create_dir_all(dir).with_context(|| format!("create output dir '{}'", dir.display()))
}

fn cmd_split(args: SplitArgs) -> anyhow::Result<()> {
    let spec = args.grid.spec()?;
    let mut ws = gifloom::Workspace::new();

    let mut rasters = Vec::with_capacity(args.inputs.len());
    for path in &args.inputs {
        let raster = gifloom::decode_image(&read_bytes(path)?)
            .with_context(|| format!("decode '{}'", path.display()))?;
        rasters.push((source_name(path), raster));
    }
    let sources: Vec<_> = rasters
        .iter()
        .map(|(name, raster)| gifloom::TileSource {
            name: name.as_str(),
            raster,
        })
        .collect();

    let outcome = ws.split(&sources, spec, &args.grid.selection()?)?;
    for skip in &outcome.skipped {
        eprintln!("skipped {}: {}", skip.name, skip.reason);
    }

    create_dir(&args.out_dir)?;
    for (file_name, png) in ws.export_png(&outcome.materials)? {
        let path = args.out_dir.join(file_name);
        std::fs::write(&path, png).with_context(|| format!("write png '{}'", path.display()))?;
    }
    eprintln!(
        "wrote {} tiles to {}",
        outcome.materials.len(),
        args.out_dir.display()
    );
    Ok(())
}

fn cmd_build(args: BuildArgs) -> anyhow::Result<()> {
    let template = gifloom::Template::load(&args.template)?;
    let settings = args.output.settings(&template)?;

    let mut ws = gifloom::Workspace::new();
    for path in &args.materials {
        ws.load_image(&source_name(path), &read_bytes(path)?)
            .with_context(|| format!("load material '{}'", path.display()))?;
    }
    ws.apply_template(&template, &gifloom::BindMode::FirstN)?;

    let stats = ws.export_gif_to_file(&settings, &args.out, None)?;
    eprintln!(
        "wrote {} ({} frames, {} bytes)",
        args.out.display(),
        stats.frames,
        stats.bytes
    );
    Ok(())
}

fn cmd_batch(args: BatchArgs) -> anyhow::Result<()> {
    let template = gifloom::Template::load(&args.template)?;
    let job = gifloom::BatchJob {
        settings: args.output.settings(&template)?,
        grid: args.grid.spec()?,
        selection: args.grid.selection()?,
        template,
    };

    let sources = args
        .inputs
        .iter()
        .map(|path| {
            Ok(gifloom::BatchSource {
                name: source_name(path),
                bytes: read_bytes(path)?,
            })
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    let report = gifloom::process_batch(&job, &sources, None)?;

    create_dir(&args.out_dir)?;
    for item in &report.items {
        match &item.result {
            Ok(gif) => {
                let path = args.out_dir.join(&item.file_name);
                gif.save(&path)
                    .with_context(|| format!("write gif '{}'", path.display()))?;
                eprintln!("wrote {}", path.display());
            }
            Err(e) => eprintln!("failed {}: {e}", item.name),
        }
    }
    eprintln!(
        "{} succeeded, {} failed",
        report.succeeded(),
        report.failed()
    );
    if report.failed() > 0 {
        anyhow::bail!("{} of {} sources failed", report.failed(), report.items.len());
    }
    Ok(())
}

fn cmd_info(args: InfoArgs) -> anyhow::Result<()> {
    let info = gifloom::inspect_gif(&read_bytes(&args.input)?)?;
    println!("{}", serde_json::to_string_pretty(&info)?);
    Ok(())
}

fn cmd_template(args: TemplateArgs) -> anyhow::Result<()> {
    let template = gifloom::Template::load(&args.input)?;
    println!("{}", serde_json::to_string_pretty(&template.info())?);
    Ok(())
}
