use clap::Parser;
use md2svg::{Error, ExportOptions, RenderConfig};
use std::path::PathBuf;

/// Markdown to SVG mind-map exporter
#[derive(Parser, Debug)]
#[command(name = "md2svg", version, about, long_about = None)]
struct Cli {
    /// Input Markdown file
    input: PathBuf,

    /// Output SVG file (defaults to the input path with a .svg extension)
    output: Option<PathBuf>,

    /// Directory of static assets for the render host; its template.html
    /// overrides the embedded template page
    #[arg(long)]
    assets: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let options = ExportOptions {
        assets: cli.assets,
        render: RenderConfig::default(),
    };

    match md2svg::export(&cli.input, cli.output.as_deref(), &options) {
        Ok(path) => {
            println!("Exported {}", path.display());
            Ok(())
        }
        Err(Error::InputNotFound(path)) => {
            eprintln!("File not found: {}", path.display());
            std::process::exit(1);
        }
        Err(err) => Err(err.into()),
    }
}
