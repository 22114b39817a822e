use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tracing::{info, info_span, warn};

use termtyper::app::{Effect, Services, Session};
use termtyper::config::Config;
use termtyper::event::EventHandler;
use termtyper::generator::EmbeddedWords;
use termtyper::logging;
use termtyper::remote;
use termtyper::store::json_store::JsonAccountStore;
use termtyper::ui::theme::Theme;

#[derive(Parser)]
#[command(name = "termtyper", version, about = "Terminal typing-speed trainer")]
struct Cli {
    #[arg(short, long, help = "Theme name")]
    theme: Option<String>,

    #[arg(short, long, help = "Word pool to draw drills from")]
    words: Option<String>,

    #[arg(long, help = "Guest timer length in seconds")]
    time: Option<u32>,

    #[arg(short, long, help = "Path to config file")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Play in this terminal (default)
    Run,
    /// Serve sessions to telnet clients
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Write the default config file
    InitConfig,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = Config::load(cli.config.as_deref())?;

    if let Some(theme) = cli.theme {
        config.theme = theme;
    }
    if let Some(words) = cli.words {
        config.word_pool = words;
    }
    if let Some(secs) = cli.time {
        config.guest_drill.timed_drill_secs = secs;
        config.normalize();
    }

    match cli.command.unwrap_or(Command::Run) {
        Command::InitConfig => {
            let path = config.save(cli.config.as_deref())?;
            println!("wrote {}", path.display());
            Ok(())
        }
        Command::Serve { host, port } => {
            if let Some(host) = host {
                config.host = host;
            }
            if let Some(port) = port {
                config.port = port;
            }
            logging::init_stderr(&config.log_level);
            let (config, theme, services) = prepare(config)?;
            let runtime = tokio::runtime::Runtime::new().context("starting tokio runtime")?;
            runtime.block_on(remote::serve(config, theme, services))
        }
        Command::Run => {
            logging::init_file(&config.log_level, &config.data_dir())?;
            let (config, theme, services) = prepare(config)?;
            run_local(config, theme, services)
        }
    }
}

fn prepare(config: Config) -> Result<(Arc<Config>, Theme, Services)> {
    let words = EmbeddedWords::load()?;
    if words.pool_size(&config.word_pool).is_none() {
        bail!(
            "unknown word pool {:?}, available: {}",
            config.word_pool,
            words.pool_names().join(", ")
        );
    }

    let theme = Theme::load(&config.theme).unwrap_or_else(|err| {
        warn!(error = %err, "using the default theme");
        Theme::default()
    });
    let accounts = JsonAccountStore::with_base_dir(config.data_dir())?;
    let services = Services {
        words: Arc::new(words),
        accounts: Arc::new(accounts),
    };
    Ok((Arc::new(config), theme, services))
}

fn run_local(config: Arc<Config>, theme: Theme, services: Services) -> Result<()> {
    let tick_rate = config.tick_rate();
    let mut session = Session::new(config, theme, services);
    let _span = info_span!("session", peer = "local").entered();
    info!("local session started");

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    let events = EventHandler::new(tick_rate);

    let result = run_session(&mut terminal, &mut session, &events);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    info!("local session ended");
    if let Err(err) = result {
        eprintln!("Error: {err:?}");
    }
    Ok(())
}

fn run_session(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    session: &mut Session,
    events: &EventHandler,
) -> Result<()> {
    loop {
        terminal.draw(|frame| session.render(frame))?;

        if session.handle_event(events.next()?)? == Effect::Quit {
            return Ok(());
        }
    }
}
