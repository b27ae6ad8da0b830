// src/bingo_terminal.rs
// Terminal front end for the bingo card.
//
// Interactive Controls:
// - Arrows (or h/j/k/l): move the cursor
// - ENTER/SPACE: mark or unmark the spot under the cursor
// - r: reset the card (asks for confirmation)
// - s: copy the share URL and show the QR link
// - ESC/q: exit, printing the URL that restores the card

use std::error::Error;

use clap::Parser;
use url::Url;

use location_bingo::config::TerminalConfig;
use location_bingo::controller::BoardController;
use location_bingo::logging::{LogLevel, set_log_level};
use location_bingo::terminal;

#[derive(Parser)]
#[command(name = env!("CARGO_BIN_NAME"))]
#[command(about = "Location Bingo Terminal - Play the bingo card in the terminal")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Args {
    /// Share URL to resume from
    url: Option<Url>,

    /// Page the share links point to, overrides conf/terminal.conf
    #[arg(long)]
    base_url: Option<Url>,
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    // Keep log lines from scribbling over the board
    set_log_level(LogLevel::Error);

    let mut config = TerminalConfig::load_or_default()?;
    if let Some(base_url) = args.base_url {
        config.base_url = base_url;
    }

    let controller = match &args.url {
        Some(url) => BoardController::from_url(url),
        None => BoardController::default(),
    };

    let controller = terminal::run(controller, &config.base_url)?;

    println!("訪問済み {}/25 ({}%)", controller.visited_count(), controller.progress_percent());
    if let Some(code) = controller.reward_code() {
        println!("クーポン: {code}");
    }
    println!("{}", controller.share_url(&config.base_url));

    Ok(())
}
