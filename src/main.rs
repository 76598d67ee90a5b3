mod app;
mod board;
mod config;
mod editor;
mod input;
mod remote;
mod ui;

use clap::Parser;

use config::{Config, ConfigError};

#[derive(Parser)]
#[command(
    name = "nokan",
    version,
    about = "A keyboard-first kanban TUI for a remote Notion task database"
)]
struct Cli {
    /// Database to open (overrides NOTION_DATABASE_ID)
    #[arg(long)]
    database: Option<String>,
}

fn main() {
    // Install color_eyre for unexpected panics/errors (developer bugs).
    let _ = color_eyre::install();
    let cli = Cli::parse();

    let config = match Config::from_env(cli.database) {
        Ok(config) => config,
        Err(e) => {
            print_config_error(&e);
            std::process::exit(1);
        }
    };

    let client = match remote::Client::new(&config) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("error: could not initialize the remote client: {e}");
            std::process::exit(1);
        }
    };

    let mut terminal = ratatui::init();
    let result = app::run(&mut terminal, &client, &config);
    ratatui::restore();

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

/// Print a corrective message for missing configuration, the one error
/// class that is fatal: it happens before the board exists.
fn print_config_error(error: &ConfigError) {
    eprintln!("error: {error}");
    eprintln!();
    eprintln!("nokan needs two environment variables:");
    eprintln!("  NOTION_TOKEN        an integration token");
    eprintln!("                      (create one at https://www.notion.so/my-integrations)");
    eprintln!("  NOTION_DATABASE_ID  the task database to display");
    eprintln!("                      (share the database with the integration, then copy");
    eprintln!("                      the ID from its URL, or pass --database)");
    eprintln!();
    eprintln!("Optional: EDITOR selects the editor for ^E (default: {})", config::DEFAULT_EDITOR);
}
