use clap::{Parser, Subcommand};
use emoticon_cache::assets::DirAssets;
use emoticon_cache::resolver::FsImageLoader;
use emoticon_cache::{Builder, Resolver, check, config, output};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "emoticons")]
#[command(about = "Inspect and validate an emoticon catalog")]
#[command(long_about = "\
Inspect and validate an emoticon catalog

The catalog is an XML document inside the asset directory that maps tags
to image files, grouped by catalog title:

  assets/
  └── emoticons/
      ├── emoji.xml                # <Catalog Title=\"source\">
      │                            #   <Emoticon Tag=\"[smile]\" File=\"s1\"/>
      ├── source/                  # Default pages come from this group
      │   ├── s1.gif               # Animated rendition
      │   └── s1.png               # Still rendition (optional)
      └── extra/
          └── p1.gif

Static lookups prefer <file>.png and fall back to the first frame of
<file>.gif. Animated lookups always decode <file>.gif.

Run 'emoticons gen-config' to generate a documented emoticons.toml.")]
#[command(version)]
struct Cli {
    /// Asset directory containing the catalog
    #[arg(long, default_value = "assets", global = true)]
    assets: PathBuf,

    /// Configuration file (stock defaults apply if missing)
    #[arg(long, default_value = "emoticons.toml", global = true)]
    config: PathBuf,

    /// Host files directory; stickers default to <files-dir>/sticker
    #[arg(long, global = true)]
    files_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the padded default pages
    Pages,
    /// Resolve one tag and show its still and animated renditions
    Lookup { tag: String },
    /// Split message text into literal and tag segments
    Split { text: String },
    /// Decode every catalog entry and report failures
    Check {
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Decode a downloaded sticker from the sticker directory
    Sticker { name: String },
    /// Print a stock emoticons.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    let resolver = || build_resolver(&cli);

    match &cli.command {
        Command::Pages => {
            let resolver = resolver()?;
            output::print_pages(resolver.table());
        }
        Command::Lookup { tag } => {
            let resolver = resolver()?;
            let still = resolver.resolve_static(tag);
            let animated = resolver.resolve_animated(tag);
            output::print_lookup(
                tag,
                resolver.lookup(tag),
                still.as_deref(),
                animated.as_deref(),
            );
        }
        Command::Split { text } => {
            let resolver = resolver()?;
            output::print_segments(&resolver.split(text), resolver.table());
        }
        Command::Check { json } => {
            let report = check::check(&resolver()?);
            if *json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                output::print_check_report(&report);
            }
            if !report.is_clean() {
                std::process::exit(1);
            }
            if !*json {
                println!("==> Catalog is valid");
            }
        }
        Command::Sticker { name } => {
            let sticker = resolver()?.try_resolve_sticker(name)?;
            match sticker {
                Some(img) => {
                    let (w, h) = img.dimensions();
                    println!("{} {}x{}", img.path(), w, h);
                }
                None => println!("{} (not found)", name),
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Load configuration and the catalog under `--assets`.
fn build_resolver(cli: &Cli) -> Result<Resolver, Box<dyn std::error::Error>> {
    let config = config::load_config(&cli.config)?;
    let mut builder = Builder::with_config(config)
        .assets(DirAssets::new(&cli.assets))
        .image_loader(FsImageLoader);
    if let Some(dir) = &cli.files_dir {
        builder = builder.files_dir(dir);
    }
    log::info!(
        "loading {} from {}",
        builder.config().catalog.document_path(),
        cli.assets.display()
    );
    Ok(builder.build()?)
}
