use clap::{Parser, Subcommand};
use lit_catalog::{catalog, config, fingerprint, output, validate};
use std::path::PathBuf;
use std::process::ExitCode;

/// Package version on a release tag, `dev@<hash>` otherwise.
fn version_string() -> &'static str {
    if env!("LIT_CATALOG_RELEASE") == "true" {
        return env!("CARGO_PKG_VERSION");
    }
    match env!("LIT_CATALOG_GIT_HASH") {
        "" => "dev@unknown",
        hash => Box::leak(format!("dev@{hash}").into_boxed_str()),
    }
}

#[derive(Parser)]
#[command(name = "lit-catalog")]
#[command(about = "Build and validate the JSON catalog of literary works")]
#[command(long_about = "\
Build and validate the JSON catalog of literary works

Authors write translations in Markdown with YAML frontmatter. `build`
converts them into a JSON tree for the front-end; `validate` checks the
generated tree.

Source structure:

  content/
  ├── languages.json               # Language registry (hand-maintained)
  └── authors/
      └── yanka-kupala/
          ├── info.json            # Author descriptor
          └── works/
              └── kurgan/
                  ├── metadata.json  # Work descriptor (type: poem | prose)
                  ├── be.md          # One document per language
                  └── en.md

Generated structure:

  public/
  ├── metadata/index.json          # Catalog index with statistics
  ├── metadata/languages.json
  └── authors/<author>/works/<work>/content/<lang>.json

Run 'lit-catalog gen-config' to generate a documented config.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Project root (holds config.toml, content/ and public/)
    #[arg(long, default_value = ".", global = true)]
    root: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Convert the source tree into the generated JSON tree
    Build,
    /// Check the generated tree; exits 1 if any violation is found
    Validate,
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    match cli.command {
        Command::Build => {
            let config = config::load_config(&cli.root)?;
            init_thread_pool(&config.processing);
            println!(
                "==> Building {} \u{2192} {}",
                config.source_dir(&cli.root).display(),
                config.output_dir(&cli.root).display()
            );
            let report = catalog::build(&cli.root, &config)?;
            output::print_build_output(&report);
            println!("==> Build complete");
        }
        Command::Validate => {
            let config = config::load_config(&cli.root)?;
            let output_dir = config.output_dir(&cli.root);
            println!("==> Validating {}", output_dir.display());
            let report = validate::validate(&output_dir)?;
            let fp = fingerprint::tree_fingerprint(&output_dir)?;
            output::print_validation_output(&report, Some(&fp));
            if !report.is_valid() {
                return Ok(ExitCode::FAILURE);
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Initialize the rayon thread pool based on processing config.
///
/// Capped at the number of available CPU cores.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
