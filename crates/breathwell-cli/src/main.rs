use clap::{CommandFactory, Parser, Subcommand};

mod commands;
mod cue;
mod logging;

#[derive(Parser)]
#[command(name = "breathwell", version, about = "Breathwell guided-breathing timer")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    /// Write logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run or simulate a breathing session
    Session {
        #[command(subcommand)]
        action: commands::session::SessionAction,
    },
    /// Browse the technique catalog
    Technique {
        #[command(subcommand)]
        action: commands::technique::TechniqueAction,
    },
    /// Inspect breath patterns
    Pattern {
        #[command(subcommand)]
        action: commands::pattern::PatternAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Print shell completions
    Completions {
        shell: clap_complete::Shell,
    },
}

fn main() {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose, cli.log_json);

    let result = match cli.command {
        Commands::Session { action } => commands::session::run(action),
        Commands::Technique { action } => commands::technique::run(action),
        Commands::Pattern { action } => commands::pattern::run(action),
        Commands::Config { action } => commands::config::run(action),
        Commands::Completions { shell } => {
            clap_complete::generate(
                shell,
                &mut Cli::command(),
                "breathwell",
                &mut std::io::stdout(),
            );
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
