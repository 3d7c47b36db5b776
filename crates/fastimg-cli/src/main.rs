use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser;
use fastimg_core::Pipeline;

mod script;

#[derive(Parser, Debug)]
#[command(name = "fastimg", version, about = "Run an edit script over an image")]
struct Cli {
    /// Input image: a file path or a data URL.
    #[arg(long = "in")]
    in_path: String,

    /// Edit script JSON (a list of operations). Omitted = export only.
    #[arg(long)]
    script: Option<PathBuf>,

    /// Output file path. Omitted with --data-url prints to stdout.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Print the export as a data URL instead of writing bytes.
    #[arg(long, default_value_t = false)]
    data_url: bool,

    /// Export MIME type, e.g. image/jpeg (default: inferred from input).
    #[arg(long = "type")]
    mime: Option<String>,

    /// Export quality in [0, 1] (ignored by lossless formats).
    #[arg(long, default_value_t = 1.0)]
    quality: f64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let steps = match &cli.script {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("reading script {}", path.display()))?;
            script::parse(&json)?
        }
        None => Vec::new(),
    };

    let mut pipeline = Pipeline::new(cli.in_path.as_str());
    pipeline.ready().await.context("loading input image")?;
    script::run(&mut pipeline, &steps).await?;

    if cli.data_url {
        let url = pipeline
            .to_data_url(cli.mime.as_deref(), cli.quality)
            .await?;
        match &cli.out {
            Some(path) => std::fs::write(path, url)
                .with_context(|| format!("writing {}", path.display()))?,
            None => println!("{url}"),
        }
        return Ok(());
    }

    let out = cli
        .out
        .as_ref()
        .context("--out is required unless --data-url is set")?;
    let blob = pipeline.to_blob(cli.mime.as_deref(), cli.quality).await?;
    std::fs::write(out, &blob.bytes).with_context(|| format!("writing {}", out.display()))?;
    eprintln!(
        "wrote {} ({} bytes, {})",
        out.display(),
        blob.bytes.len(),
        blob.content_type
    );
    Ok(())
}
