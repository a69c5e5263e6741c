use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "layercraft", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a saved project document to a PNG.
    Render(RenderArgs),
    /// List the canvas presets.
    Presets,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Input project document JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Directory relative image sources resolve against (defaults to the document's directory).
    #[arg(long)]
    assets: Option<PathBuf>,

    /// Directory holding `{Family}-{Variant}.ttf` font files.
    #[arg(long)]
    fonts: Option<PathBuf>,

    /// Font used when a text layer's face cannot be found.
    #[arg(long)]
    fallback_font: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Presets => cmd_presets(),
    }
}

fn read_document(path: &Path) -> anyhow::Result<layercraft::ProjectDocument> {
    let f = File::open(path).with_context(|| format!("open document '{}'", path.display()))?;
    let r = BufReader::new(f);
    let doc: layercraft::ProjectDocument =
        serde_json::from_reader(r).with_context(|| "parse project document JSON")?;
    doc.validate()?;
    Ok(doc)
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let doc = read_document(&args.in_path)?;
    let mut session = layercraft::ProjectSession::open(doc)?
        .with_settings(layercraft::EngineSettings::from_env());

    if let Some(path) = &args.fallback_font {
        let bytes = std::fs::read(path)
            .with_context(|| format!("read fallback font '{}'", path.display()))?;
        session.set_fallback_font(bytes);
    }

    let assets_root = match &args.assets {
        Some(dir) => dir.clone(),
        None => args
            .in_path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .to_path_buf(),
    };
    let mut loader = layercraft::FsResourceLoader::new(assets_root);
    if let Some(dir) = &args.fonts {
        loader = loader.with_font_dir(dir);
    }
    session.pump_resources(&mut loader);

    let frame = session.render_clean()?;
    let png = frame.to_png()?;

    if let Some(parent) = args.out.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    std::fs::write(&args.out, png)
        .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_presets() -> anyhow::Result<()> {
    for preset in layercraft::DesignPreset::ALL {
        let size = preset.size();
        println!(
            "{:<16} {:>5}x{:<5} {}",
            preset.design_type(),
            size.width,
            size.height,
            preset.label()
        );
    }
    Ok(())
}
