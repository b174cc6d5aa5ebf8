//! Protocol session driving search, replay and self-play.

use std::fmt::Display;
use std::io::{self, BufRead, Write};
use std::str::FromStr;

use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::core::{EngineConfig, SearchRng};
use crate::mcts::{NodeId, ParallelSearch, SearchError, SearchTree};
use crate::nn::{Apprentice, ApprenticeError};
use crate::rules::Environment;
use crate::training::SelfPlayRunner;

use super::command::{Command, CommandError};

/// Errors that abort one command. The session itself continues.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error(transparent)]
    Command(#[from] CommandError),

    #[error("illegal move {0}")]
    IllegalMove(String),

    #[error(transparent)]
    Search(#[from] SearchError),

    #[error(transparent)]
    Apprentice(#[from] ApprenticeError),

    #[error("output failed: {0}")]
    Io(#[from] io::Error),
}

/// Whether the session keeps reading commands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Control {
    Continue,
    Quit,
}

/// A protocol session over one environment and one apprentice.
///
/// The search tree is always rooted at the current position. A `position`
/// that extends the previous line keeps the statistics under the reached
/// node and drops everything else; any other `position` starts a fresh
/// tree, as does `ucinewgame`.
pub struct UciSession<'a, E, P>
where
    E: Environment,
    P: Apprentice<E::State, E::Action>,
{
    env: &'a E,
    apprentice: P,
    config: EngineConfig,

    /// Position `startpos` refers to.
    initial: E::State,

    /// Current working position.
    state: E::State,

    /// Tree rooted at `state`.
    tree: SearchTree<E::State>,

    /// Moves from `initial` to the tree's root.
    line: Vec<E::Action>,

    last_best: Option<E::Action>,
    rng: SearchRng,
    selfplay: SelfPlayRunner<'a, E>,
}

impl<'a, E, P> UciSession<'a, E, P>
where
    E: Environment,
    E::Action: FromStr + Display,
    <E::Action as FromStr>::Err: Display,
    P: Apprentice<E::State, E::Action>,
{
    pub fn new(env: &'a E, apprentice: P, initial: E::State, config: EngineConfig) -> Self {
        let mut rng = SearchRng::new(config.search.seed);
        let selfplay = SelfPlayRunner::new(env, initial.clone(), config.selfplay.clone(), config.search.clone())
            .with_model_path(config.protocol.model_path.clone())
            .with_rng(rng.fork());
        let tree = SearchTree::new(initial.clone());
        Self {
            env,
            apprentice,
            tree,
            line: Vec::new(),
            state: initial.clone(),
            initial,
            config,
            last_best: None,
            rng,
            selfplay,
        }
    }

    /// Current working position.
    #[must_use]
    pub fn state(&self) -> &E::State {
        &self.state
    }

    #[must_use]
    pub fn tree(&self) -> &SearchTree<E::State> {
        &self.tree
    }

    /// Node holding the current position, always the tree's root.
    #[must_use]
    pub fn node(&self) -> NodeId {
        self.tree.root()
    }

    #[must_use]
    pub fn apprentice(&self) -> &P {
        &self.apprentice
    }

    /// Read commands until `quit` or end of input.
    ///
    /// End of input behaves like `quit`.
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, out: &mut W) -> io::Result<()> {
        for line in input.lines() {
            if self.handle_line(&line?, out)? == Control::Quit {
                return Ok(());
            }
        }
        info!("input closed");
        self.handle_line("quit", out).map(|_| ())
    }

    /// Parse and execute one line.
    ///
    /// Command failures are reported on `out` as `info string error: ...`;
    /// only output failures are returned.
    pub fn handle_line<W: Write>(&mut self, line: &str, out: &mut W) -> io::Result<Control> {
        let result = Command::parse(line)
            .map_err(ProtocolError::from)
            .and_then(|command| match command {
                Some(command) => self.execute(command, out),
                None => Ok(Control::Continue),
            });

        match result {
            Ok(control) => Ok(control),
            Err(ProtocolError::Io(e)) => Err(e),
            Err(e) => {
                error!(line, error = %e, "command failed");
                writeln!(out, "info string error: {e}")?;
                out.flush()?;
                Ok(Control::Continue)
            }
        }
    }

    /// Execute one parsed command.
    pub fn execute<W: Write>(&mut self, command: Command, out: &mut W) -> Result<Control, ProtocolError> {
        match command {
            Command::Uci => {
                writeln!(out, "id name {}", self.config.protocol.engine_name)?;
                writeln!(out, "id author {}", self.config.protocol.engine_author)?;
                writeln!(out, "uciok")?;
            }
            Command::IsReady => writeln!(out, "readyok")?,
            Command::NewGame => self.new_game(),
            Command::Position { moves } => self.set_position(&moves)?,
            Command::Go => {
                let action = self.go()?;
                writeln!(out, "bestmove {action}")?;
                self.last_best = Some(action);
            }
            Command::Stop => match &self.last_best {
                Some(action) => writeln!(out, "bestmove {action}")?,
                None => warn!("stop before any search"),
            },
            Command::Quit => {
                // Quitting never depends on the save succeeding.
                let path = &self.config.protocol.model_path;
                match self.apprentice.save(path) {
                    Ok(()) => info!(path = %path.display(), "saved apprentice"),
                    Err(e) => {
                        error!(path = %path.display(), error = %e, "failed to save apprentice");
                        writeln!(out, "info string error: {}", ProtocolError::from(e))?;
                    }
                }
                out.flush()?;
                return Ok(Control::Quit);
            }
            Command::SelfPlay { turns } => {
                info!(turns, "starting self-play");
                let finished = self.selfplay.run(&mut self.apprentice, turns)?;
                writeln!(
                    out,
                    "info string selfplay {turns} turns, {} games finished, {}",
                    finished.len(),
                    self.selfplay.tally()
                )?;
            }
        }
        out.flush()?;
        Ok(Control::Continue)
    }

    fn new_game(&mut self) {
        self.state = self.initial.clone();
        self.tree.reset(self.initial.clone());
        self.line.clear();
        self.last_best = None;
    }

    /// Replay `moves` from the start and re-root the tree on the result.
    ///
    /// Nothing changes unless every move parses and is legal.
    fn set_position(&mut self, moves: &[String]) -> Result<(), ProtocolError> {
        let mut state = self.initial.clone();
        let mut actions = Vec::with_capacity(moves.len());
        for text in moves {
            let action: E::Action = text
                .parse()
                .map_err(|e| ProtocolError::IllegalMove(format!("{text:?}: {e}")))?;
            if !self.env.actions(&state).contains(&action) {
                return Err(ProtocolError::IllegalMove(format!("{text:?}")));
            }
            state = self.env.transition(&state, &action);
            actions.push(action);
        }

        if actions.starts_with(&self.line) {
            let fresh = &actions[self.line.len()..];
            if !fresh.is_empty() {
                let root = self.tree.root();
                let reached = self.tree.play(self.env, root, fresh);
                self.tree = self.tree.subtree(reached);
            }
        } else {
            debug!(moves = actions.len(), "position leaves the searched line; starting a fresh tree");
            self.tree.reset(state.clone());
        }

        self.line = actions;
        self.state = state;
        Ok(())
    }

    /// Choose an action for the current position.
    fn go(&mut self) -> Result<E::Action, ProtocolError> {
        let actions = self.env.actions(&self.state);
        if self.env.is_terminal(&self.state) && !actions.is_empty() {
            warn!(state = ?self.state, "terminal state with legal actions; choosing at random");
            if let Some(action) = self.rng.choose(&actions) {
                return Ok(action.clone());
            }
        }

        let mut search = ParallelSearch::new(self.env, &self.apprentice, self.config.search.clone())
            .with_rng(self.rng.fork());
        let root = self.tree.root();
        let action = search.search(&mut self.tree, root, self.config.protocol.go_iterations)?;
        info!(
            action = %action,
            iterations = search.stats().iterations,
            time_us = search.stats().time_us,
            "search finished"
        );
        Ok(action)
    }
}
