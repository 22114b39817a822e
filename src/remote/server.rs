use std::io;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::cursor::{Hide, Show};
use crossterm::queue;
use crossterm::terminal::{Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::Rect;
use ratatui::{Terminal, TerminalOptions, Viewport};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::OwnedReadHalf;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{Instrument, debug, info, info_span, warn};

use crate::app::{Effect, Services, Session, SessionEvent};
use crate::config::Config;
use crate::remote::telnet::{self, ClientInput, Decoder};
use crate::ui::theme::Theme;

const READ_BUF: usize = 1024;
const EVENT_QUEUE: usize = 256;

/// Renders a session into bytes for one remote terminal.
struct RemoteScreen {
    terminal: Terminal<CrosstermBackend<Vec<u8>>>,
}

impl RemoteScreen {
    fn new(size: (u16, u16)) -> io::Result<Self> {
        let terminal = Terminal::with_options(
            CrosstermBackend::new(Vec::new()),
            TerminalOptions {
                viewport: Viewport::Fixed(Rect::new(0, 0, size.0, size.1)),
            },
        )?;
        Ok(Self { terminal })
    }

    fn enter(&mut self) -> io::Result<Vec<u8>> {
        let mut out = Vec::new();
        queue!(out, EnterAlternateScreen, Hide, Clear(ClearType::All))?;
        Ok(out)
    }

    fn leave(&mut self) -> io::Result<Vec<u8>> {
        let mut out = self.take();
        queue!(out, Show, LeaveAlternateScreen)?;
        Ok(out)
    }

    fn resize(&mut self, size: (u16, u16)) -> io::Result<()> {
        if self.terminal.get_frame().area() != Rect::new(0, 0, size.0, size.1) {
            self.terminal.resize(Rect::new(0, 0, size.0, size.1))?;
            self.terminal.clear()?;
        }
        Ok(())
    }

    /// Draws and returns only the bytes that changed since the last frame.
    fn draw(&mut self, session: &Session) -> io::Result<Vec<u8>> {
        self.terminal.draw(|frame| session.render(frame))?;
        Ok(self.take())
    }

    fn take(&mut self) -> Vec<u8> {
        std::mem::take(self.terminal.backend_mut().writer_mut())
    }
}

/// Accepts telnet clients on the configured address until Ctrl+C.
pub async fn serve(config: Arc<Config>, theme: Theme, services: Services) -> Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!(%addr, "listening for telnet clients");

    tokio::select! {
        result = serve_on(listener, config, theme, services) => result,
        _ = tokio::signal::ctrl_c() => {
            info!("shutting down");
            Ok(())
        }
    }
}

/// Runs one session task per accepted connection.
pub async fn serve_on(
    listener: TcpListener,
    config: Arc<Config>,
    theme: Theme,
    services: Services,
) -> Result<()> {
    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(err) => {
                warn!(error = %err, "accept failed");
                continue;
            }
        };
        let session = Session::new(config.clone(), theme.clone(), services.clone());
        let tick_rate = config.tick_rate();
        tokio::spawn(
            async move {
                info!("client connected");
                match run_connection(stream, session, tick_rate).await {
                    Ok(()) => info!("client disconnected"),
                    Err(err) => warn!(error = %err, "session ended with error"),
                }
            }
            .instrument(info_span!("session", %peer)),
        );
    }
}

async fn read_client(mut reader: OwnedReadHalf, tx: mpsc::Sender<SessionEvent>) {
    let mut decoder = Decoder::new();
    let mut buf = [0u8; READ_BUF];
    loop {
        let n = match reader.read(&mut buf).await {
            Ok(0) => return,
            Ok(n) => n,
            Err(err) => {
                debug!(error = %err, "read failed");
                return;
            }
        };
        for input in decoder.feed(&buf[..n]) {
            let event = match input {
                ClientInput::Key(key) => SessionEvent::Key(key),
                ClientInput::Resize(w, h) => SessionEvent::Resize(w, h),
            };
            if tx.send(event).await.is_err() {
                return;
            }
        }
    }
}

async fn run_connection(stream: TcpStream, mut session: Session, tick_rate: Duration) -> Result<()> {
    stream.set_nodelay(true)?;
    let (reader, mut writer) = stream.into_split();
    writer.write_all(&telnet::negotiation()).await?;

    let (tx, mut rx) = mpsc::channel(EVENT_QUEUE);
    let reader_task = tokio::spawn(read_client(reader, tx).in_current_span());

    let mut screen = RemoteScreen::new(session.size())?;
    writer.write_all(&screen.enter()?).await?;

    let mut ticker = time::interval(tick_rate);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut last_tick = Instant::now();

    let outcome = loop {
        let frame = screen.draw(&session)?;
        writer.write_all(&frame).await?;

        let event = tokio::select! {
            event = rx.recv() => match event {
                Some(event) => event,
                None => break Ok(()),
            },
            _ = ticker.tick() => {
                let now = Instant::now();
                let dt = now - last_tick;
                last_tick = now;
                SessionEvent::Tick(dt)
            }
        };
        let resized = matches!(event, SessionEvent::Resize(..));

        // account lookups touch the disk
        match tokio::task::block_in_place(|| session.handle_event(event)) {
            Ok(Effect::Continue) => {}
            Ok(Effect::Quit) => break Ok(()),
            Err(err) => break Err(anyhow::Error::from(err)),
        }
        if resized {
            debug!(size = ?session.size(), "client resized");
            screen.resize(session.size())?;
        }
    };

    reader_task.abort();
    writer.write_all(&screen.leave()?).await?;
    writer.shutdown().await.ok();
    outcome
}

