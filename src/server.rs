//! # TCP Game Server
//!
//! Single-threaded and blocking: one game connection is accepted and played to completion
//! before the next accept. The blocking read of the next fixed-size message is the only
//! suspension point. In training mode the server stops after its first connection; in
//! evaluation mode it goes back to waiting for another game.

use std::io::{ErrorKind, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream};

use tracing::{debug, error, info, warn};

use crate::agent::{DdqnAgent, EpsilonSchedule};
use crate::approximator::{FunctionApproximator, QNetwork};
use crate::artifacts::RunArtifacts;
use crate::config::{RunConfig, SessionMode};
use crate::error::{PongError, Result};
use crate::protocol::GameFrame;
use crate::session::{EpisodeSummary, FrameKind, Session};

/// Connection lifecycle of the server loop.
enum Phase {
    AwaitingConnection,
    SessionActive(TcpStream, SocketAddr),
    ConnectionClosing(SocketAddr, Result<SessionEnd>),
}

/// How a session that did not fail came to an end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The game closed the connection between messages
    Disconnected,
    /// The configured number of episodes was played
    EpisodesComplete,
}

/// Summary of one served connection.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionReport {
    pub end: SessionEnd,
    pub frames: u64,
    pub episodes: Vec<EpisodeSummary>,
}

/// Read exactly `buf.len()` bytes.
///
/// Returns `Ok(false)` if the peer closed the stream before the first byte of the message,
/// which is the normal end of a session. A stream closed mid-message is a protocol error and
/// an expired read deadline is [`PongError::ConnectionTimeout`].
///
/// Framing is by length only and is not recovered: bytes past the end of an oversized message
/// are read as the start of the next one.
pub fn read_message<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<bool> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) if filled == 0 => return Ok(false),
            Ok(0) => {
                return Err(PongError::protocol(
                    format!("stream closed after {} of {} bytes", filled, buf.len()),
                    &buf[..filled],
                ))
            }
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                return Err(PongError::ConnectionTimeout)
            }
            Err(e) => return Err(e.into()),
        }
    }
    Ok(true)
}

pub struct Server<A: FunctionApproximator> {
    config: RunConfig,
    agents: Vec<DdqnAgent<A>>,
    artifacts: Option<RunArtifacts>,
}

impl Server<QNetwork> {
    /// Build agents from a finalized config, preload weights and prepare the run directory.
    ///
    /// Any weight file that fails to load aborts startup.
    pub fn from_config(config: RunConfig) -> Result<Self> {
        let num_agents = config.session.variant.num_agents();
        let mut agents = Vec::with_capacity(num_agents);
        for i in 0..num_agents {
            let mut agent_config = config.agent.clone();
            agent_config.seed = config.agent.seed.map(|s| s.wrapping_add(i as u64));
            let mut agent = DdqnAgent::from_config(agent_config)?;

            if let Some(path) = config.artifacts.load_weights.get(i) {
                agent.load(path)?;
                info!(agent = i + 1, path = %path.display(), "loaded weights");
            }
            if let SessionMode::Evaluation { epsilon } = config.session.mode {
                agent.set_schedule(EpsilonSchedule::fixed(epsilon));
            }
            agents.push(agent);
        }

        let artifacts = RunArtifacts::create(&config.artifacts, num_agents)?;
        for (i, agent) in agents.iter().enumerate() {
            artifacts.write_agent_parameters(i, agent.config(), agent.epsilon())?;
        }
        artifacts.write_run_parameters(&config)?;
        info!(dir = %artifacts.dir().display(), "run artifacts ready");

        Ok(Server::new(config, agents, Some(artifacts)))
    }
}

impl<A: FunctionApproximator> Server<A> {
    pub fn new(config: RunConfig, agents: Vec<DdqnAgent<A>>, artifacts: Option<RunArtifacts>) -> Self {
        Server {
            config,
            agents,
            artifacts,
        }
    }

    pub fn agents(&self) -> &[DdqnAgent<A>] {
        &self.agents
    }

    pub fn artifacts(&self) -> Option<&RunArtifacts> {
        self.artifacts.as_ref()
    }

    /// Bind the configured address and serve until done.
    pub fn run(&mut self) -> Result<()> {
        let listener = TcpListener::bind(&self.config.server.address)?;
        info!(address = %listener.local_addr()?, "starting up");
        self.serve_listener(listener)
    }

    /// Accept and serve connections on an already bound listener.
    pub fn serve_listener(&mut self, listener: TcpListener) -> Result<()> {
        let training = self.config.session.mode.is_training();
        let mut phase = Phase::AwaitingConnection;

        loop {
            phase = match phase {
                Phase::AwaitingConnection => {
                    info!("waiting for a connection");
                    let (stream, peer) = listener.accept()?;
                    info!(%peer, "connection accepted");
                    Phase::SessionActive(stream, peer)
                }
                Phase::SessionActive(stream, peer) => {
                    let result = self.serve_connection(stream);
                    Phase::ConnectionClosing(peer, result)
                }
                Phase::ConnectionClosing(peer, result) => {
                    self.close_session();
                    match result {
                        Ok(end) => info!(%peer, ?end, "session closed, replay memory erased"),
                        Err(e) if e.is_session_local() => warn!(%peer, error = %e, "session ended early"),
                        Err(e) => error!(%peer, error = %e, "session failed"),
                    }
                    if training {
                        info!("training over");
                        return Ok(());
                    }
                    Phase::AwaitingConnection
                }
            };
        }
    }

    fn serve_connection(&mut self, mut stream: TcpStream) -> Result<SessionEnd> {
        stream.set_read_timeout(self.config.server.read_timeout())?;
        stream.set_nodelay(true)?;
        let result = self.serve_stream(&mut stream).map(|report| report.end);
        if let Err(e) = stream.shutdown(Shutdown::Both) {
            debug!(error = %e, "socket already closed");
        }
        result
    }

    /// Play one session over any byte stream.
    pub fn serve_stream<S: Read + Write>(&mut self, stream: &mut S) -> Result<SessionReport> {
        let mut session = Session::new(self.config.session.clone(), &self.agents);
        let num_agents = session.num_agents();
        let training = self.config.session.mode.is_training();
        let save_weights = training && self.config.artifacts.save_weights;

        stream.write_all(session.opening_message().encode(num_agents).as_bytes())?;

        let mut buf = vec![0u8; self.config.session.message_len()];
        let mut episodes = Vec::new();

        while !session.is_finished() {
            if !read_message(stream, &mut buf)? {
                info!(frames = session.state().frame_count - 1, "data stream from client stopped");
                return Ok(SessionReport {
                    end: SessionEnd::Disconnected,
                    frames: session.state().frame_count - 1,
                    episodes,
                });
            }

            let frame = GameFrame::decode(&buf, num_agents)?;
            let outcome = session.step(&mut self.agents, &frame)?;
            stream.write_all(outcome.outbound.encode(num_agents).as_bytes())?;

            if outcome.kind == FrameKind::Terminal {
                if let Some(summary) = outcome.episode {
                    self.finish_episode(&summary, save_weights)?;
                    episodes.push(summary);
                }
            }
        }

        stream.flush()?;
        Ok(SessionReport {
            end: SessionEnd::EpisodesComplete,
            frames: session.state().frame_count - 1,
            episodes,
        })
    }

    fn finish_episode(&mut self, summary: &EpisodeSummary, save_weights: bool) -> Result<()> {
        if let Some(artifacts) = self.artifacts.as_mut() {
            artifacts.record_episode(summary)?;
            if save_weights {
                for (i, agent) in self.agents.iter().enumerate() {
                    agent.save(&artifacts.weight_path(i, summary.episode))?;
                }
            }
        }
        Ok(())
    }

    /// Per-connection teardown: forget experience and flush the episode log.
    fn close_session(&mut self) {
        for agent in &mut self.agents {
            agent.reset_memory();
        }
        if let Some(artifacts) = self.artifacts.as_mut() {
            if let Err(e) = artifacts.flush() {
                warn!(error = %e, "failed to flush episode log");
            }
        }
    }
}
