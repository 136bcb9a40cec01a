use std::io::{self, BufRead, Write};
use std::sync::mpsc::{self, TryRecvError};
use std::thread;
use std::time::Duration;

use jobwatch_core::{update, AppState, Msg};
use jobwatch_logging::jobwatch_debug;

use super::effects::EffectRunner;
use super::ui::input::{parse_line, InputCommand, HELP};
use super::ui::render::{render, RenderOptions};

/// How long one loop iteration waits for an engine event.
const TICK: Duration = Duration::from_millis(100);

enum InputEvent {
    Line(String),
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Message loop for one interactive session: core state, effect execution
/// and rendering to `out`.
pub struct WatchLoop<W: Write> {
    state: AppState,
    runner: EffectRunner,
    options: RenderOptions,
    output_dir: String,
    out: W,
}

impl<W: Write> WatchLoop<W> {
    pub fn new(runner: EffectRunner, options: RenderOptions, output_dir: String, out: W) -> Self {
        Self {
            state: AppState::new(),
            runner,
            options,
            output_dir,
            out,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn out(&self) -> &W {
        &self.out
    }

    pub fn dispatch(&mut self, msg: Msg) {
        let state = std::mem::take(&mut self.state);
        let (state, effects) = update(state, msg);
        self.state = state;
        self.runner.enqueue(effects);
    }

    /// Applies the next engine event, if one arrives within `timeout`.
    pub fn pump(&mut self, timeout: Duration) -> bool {
        match self.runner.next_msg(timeout) {
            Some(msg) => {
                self.dispatch(msg);
                true
            }
            None => false,
        }
    }

    pub fn handle_line(&mut self, line: &str) -> io::Result<Flow> {
        let command = match parse_line(line) {
            Ok(Some(command)) => command,
            Ok(None) => return Ok(Flow::Continue),
            Err(err) => {
                writeln!(self.out, "{err}")?;
                return Ok(Flow::Continue);
            }
        };
        jobwatch_debug!("Input command {:?}", command);

        match command {
            InputCommand::Quit => return Ok(Flow::Quit),
            InputCommand::Help => writeln!(self.out, "{HELP}")?,
            InputCommand::Show => self.render()?,
            other => {
                if let Some(msg) = other.to_msg(&self.output_dir) {
                    self.dispatch(msg);
                }
            }
        }
        Ok(Flow::Continue)
    }

    pub fn render_if_dirty(&mut self) -> io::Result<()> {
        if self.state.consume_dirty() {
            self.render()?;
        }
        Ok(())
    }

    fn render(&mut self) -> io::Result<()> {
        let view = self.state.view();
        for line in render(&view, &self.options) {
            writeln!(self.out, "{line}")?;
        }
        writeln!(self.out)?;
        self.out.flush()
    }

    /// Nothing left to wait for: no live poll loop, no submission and no
    /// outstanding engine request.
    pub fn is_settled(&self) -> bool {
        let polling = self
            .state
            .session()
            .is_some_and(|session| session.is_live());
        !polling && !self.state.is_submitting() && self.runner.is_idle()
    }
}

/// Runs the session until `quit`, or until stdin closes and the job has settled.
pub fn run_watch<W: Write>(mut app: WatchLoop<W>, initial: Vec<Msg>) -> io::Result<()> {
    let (input_tx, input_rx) = mpsc::channel();
    spawn_stdin_reader(input_tx);

    for msg in initial {
        app.dispatch(msg);
    }
    app.render_if_dirty()?;

    let mut stdin_open = true;
    loop {
        while stdin_open {
            match input_rx.try_recv() {
                Ok(InputEvent::Line(line)) => {
                    if app.handle_line(&line)? == Flow::Quit {
                        return Ok(());
                    }
                }
                Ok(InputEvent::Closed) | Err(TryRecvError::Disconnected) => stdin_open = false,
                Err(TryRecvError::Empty) => break,
            }
        }

        app.pump(TICK);
        app.render_if_dirty()?;

        if !stdin_open && app.is_settled() {
            return Ok(());
        }
    }
}

fn spawn_stdin_reader(tx: mpsc::Sender<InputEvent>) {
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(InputEvent::Line(line)).is_err() {
                return;
            }
        }
        let _ = tx.send(InputEvent::Closed);
    });
}
