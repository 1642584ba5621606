use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use plugcalc::config::{self, FileConfig, Overrides, Settings};
use plugcalc::format::StyleOptions;
use plugcalc::shell::{Shell, StdinLines, write_farewell};
use plugcalc::utils::{self, derive_level, init_logging};
use plugcalc::{log_debug, log_warn};

/// plugcalc - interactive calculator with pluggable commands
///
/// Interactive commands:
///   menu                 List available commands
///   exit                 Quit (Ctrl-C / Ctrl-D also quit)
///   <name> [args...]     Run a command, e.g. `add 5 10`
///
/// Plugins:
///   Bundled plugins (modulus) load unless --no-bundled.
///   Shared libraries in the plugin directory export `PLUGCALC_PLUGIN`
///   (see `plugcalc::export_plugin!`).
///
/// Global flags / env:
///   -v / -vv / -vvv      Increase log verbosity (stderr)
///   -q / --quiet         Errors only
///   -p / --plugin-dir    Plugin directory (or PLUGCALC_PLUGIN_DIR; default ./plugins)
///   -c / --config        Config file, YAML or .json (or PLUGCALC_CONFIG)
#[derive(Parser, Debug)]
#[command(
    name = "plugcalc",
    version,
    author,
    about = "plugcalc - interactive calculator with pluggable commands",
    disable_help_subcommand = true
)]
pub struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Silence all non-error diagnostics
    #[arg(short, long)]
    quiet: bool,

    /// Directory scanned for plugin shared libraries
    #[arg(short = 'p', long = "plugin-dir", value_name = "DIR")]
    plugin_dir: Option<PathBuf>,

    /// Configuration file (YAML, or JSON with a .json extension)
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Do not load plugins compiled into the binary
    #[arg(long)]
    no_bundled: bool,

    /// Disable ANSI colors (NO_COLOR is honoured too)
    #[arg(long)]
    no_color: bool,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            config: self.config.clone(),
            plugin_dir: self.plugin_dir.clone(),
            no_bundled: self.no_bundled,
            no_color: self.no_color,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let level = derive_level(cli.verbose, cli.quiet);
    init_logging(level);
    utils::install_quiet_panic_hook();

    let overrides = cli.overrides();
    let env = |key: &str| std::env::var(key).ok();

    let file = match config::config_path(&overrides, env) {
        Some(path) => match config::load(&path) {
            Ok(file) => {
                log_debug!("loaded config from {}", path.display());
                file
            }
            Err(e) => {
                eprintln!("Invalid config: {e:#}");
                std::process::exit(2);
            }
        },
        None => FileConfig::default(),
    };
    let settings = Settings::resolve(&overrides, env, &file);
    log_debug!("effective settings: {settings:?}");

    let (registry, _report) = plugcalc::startup_registry(&settings);

    install_interrupt_handler();

    let style = StyleOptions {
        use_color: settings.color,
    };
    let mut shell = Shell::new(registry, io::stdout())
        .with_style(style)
        .with_prompt(settings.prompt);
    shell
        .run(&mut StdinLines::stdin())
        .context("Failed to write to the terminal")?;
    Ok(())
}

/// Ctrl-C ends the session like `exit` does. This handler is the only
/// interrupt path on a real terminal: a blocked stdin read is never woken.
fn install_interrupt_handler() {
    if let Err(err) = ctrlc::set_handler(|| {
        let _ = write_farewell(&mut io::stdout());
        std::process::exit(0);
    }) {
        log_warn!("cannot install Ctrl-C handler: {err}");
    }
}
