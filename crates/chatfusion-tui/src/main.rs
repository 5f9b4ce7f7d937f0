use anyhow::Result;
use chatfusion_core::Config;
use tracing::{debug, info, warn};

mod app;
mod handler;
mod logging;
mod tui;
mod ui;

use app::App;
use tui::{EventHandler, Tui};

#[tokio::main]
async fn main() -> Result<()> {
    logging::init();
    info!("starting chatfusion");

    let config = Config::load().unwrap_or_else(|err| {
        warn!(error = %err, "could not load config; using defaults");
        Config::new()
    });
    let mut app = App::new(&config)?;

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = EventHandler::new();

    let result = run(&mut terminal, &mut app, &mut events).await;

    tui::restore()?;
    info!("chatfusion exited");
    result
}

async fn run(terminal: &mut Tui, app: &mut App, events: &mut EventHandler) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        tokio::select! {
            event = events.next() => match event {
                Some(event) => handler::handle_event(app, event),
                None => break,
            },
            resolution = app.next_resolution() => {
                debug!(?resolution, "completion applied");
            }
        }
    }
    Ok(())
}
