//! Connection manager: the async driver around the state machine.
//!
//! One tokio task per link owns the [`Transport`] and the [`Connection`]
//! exclusively; callers interact through channels. A `select!` loop drives
//! four inputs: the shutdown signal, the outbound frame queue, a periodic
//! tick for heartbeats and timeout detection, and the socket. Liveness
//! checks run on the tick, so a silent peer is detected even when nothing
//! arrives.

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::MissedTickBehavior;
use tracing::{info, trace, warn};

use crate::connection::{Action, Connection, LinkState, Role};
use crate::core::config::LinkConfig;
use crate::core::constants::MAX_PAYLOAD;
use crate::core::error::{ConnectionError, ErrorReason, LinkError, LinkResult};
use crate::packet::Packet;
use crate::transport::{NetworkStats, Transport};

/// Events surfaced to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEvent {
    /// Handshake started.
    Connecting,
    /// Handshake completed.
    Connected {
        /// Remote address.
        peer: SocketAddr,
        /// Session identifier negotiated during the handshake.
        session_id: u32,
    },
    /// An audio frame arrived.
    Frame {
        /// Opaque frame bytes, exactly as sent by the peer.
        payload: Vec<u8>,
        /// Sender-assigned sequence number.
        sequence: u32,
        /// Cumulative count of frames presumed lost so far.
        lost: u64,
    },
    /// The connection ended gracefully (either side).
    Disconnected,
    /// The connection attempt failed.
    Error(ErrorReason),
}

/// Receiving half of the caller surface.
#[derive(Debug)]
pub struct LinkEvents {
    rx: mpsc::Receiver<LinkEvent>,
}

impl LinkEvents {
    /// Receive the next event. Returns `None` once the driver task has
    /// exited and all buffered events are drained.
    pub async fn recv(&mut self) -> Option<LinkEvent> {
        self.rx.recv().await
    }

    /// Wait until the link is connected.
    ///
    /// Skips intermediate events and returns the peer address and session
    /// id, or the reason the attempt ended instead.
    pub async fn wait_connected(&mut self) -> Result<(SocketAddr, u32), ConnectionError> {
        while let Some(event) = self.recv().await {
            match event {
                LinkEvent::Connected { peer, session_id } => return Ok((peer, session_id)),
                LinkEvent::Error(reason) => return Err(reason.into()),
                LinkEvent::Disconnected => return Err(ConnectionError::Closed),
                LinkEvent::Connecting | LinkEvent::Frame { .. } => {}
            }
        }
        Err(ConnectionError::Closed)
    }
}

/// Sending half of the caller surface.
///
/// Dropping the handle shuts the driver task down; [`LinkHandle::disconnect`]
/// does the same but reads as intent.
#[derive(Debug)]
pub struct LinkHandle {
    frame_tx: mpsc::Sender<Vec<u8>>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    state_rx: watch::Receiver<LinkState>,
    stats_rx: watch::Receiver<NetworkStats>,
    local_addr: SocketAddr,
}

impl LinkHandle {
    /// Enqueue one opaque audio frame for sending. Never blocks: when the
    /// queue is full the frame is dropped, because a frame that waited in a
    /// queue is already too old to play.
    pub fn send_frame(&self, payload: Vec<u8>) -> Result<(), ConnectionError> {
        match self.frame_tx.try_send(payload) {
            Ok(()) => Ok(()),
            Err(mpsc::error::TrySendError::Full(_)) => {
                trace!("outbound frame queue full, frame dropped");
                Ok(())
            }
            Err(mpsc::error::TrySendError::Closed(_)) => Err(ConnectionError::Closed),
        }
    }

    /// Gracefully tear the connection down.
    pub fn disconnect(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }

    /// Current connection state.
    pub fn state(&self) -> LinkState {
        *self.state_rx.borrow()
    }

    /// Latest statistics snapshot.
    pub fn stats(&self) -> NetworkStats {
        *self.stats_rx.borrow()
    }

    /// Local address the link is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}

impl Drop for LinkHandle {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

/// Entry points for creating links.
#[derive(Debug)]
pub struct LinkManager;

impl LinkManager {
    /// Bind `config.local_port` and wait for inbound connections.
    ///
    /// The listener serves one connection at a time and recycles itself
    /// when a connection ends, for any number of sequential connections.
    pub async fn listen(config: LinkConfig) -> LinkResult<(LinkHandle, LinkEvents)> {
        let bind: SocketAddr = ([0, 0, 0, 0], config.local_port).into();
        let transport = Transport::bind(bind).await?;
        Self::spawn(transport, config, Role::Listener, None)
    }

    /// Bind an ephemeral port and dial `peer`.
    ///
    /// Drives a single connection to `Connected` or a terminal error; there
    /// is no automatic redial beyond the configured handshake retries.
    pub async fn connect(
        config: LinkConfig,
        peer: SocketAddr,
    ) -> LinkResult<(LinkHandle, LinkEvents)> {
        let bind: SocketAddr = ([0, 0, 0, 0], 0).into();
        let transport = Transport::bind(bind).await?;
        Self::spawn(transport, config, Role::Dialer, Some(peer))
    }

    fn spawn(
        transport: Transport,
        config: LinkConfig,
        role: Role,
        peer: Option<SocketAddr>,
    ) -> LinkResult<(LinkHandle, LinkEvents)> {
        let local_addr = transport.local_addr()?;
        let (event_tx, event_rx) = mpsc::channel(config.event_queue_depth);
        let (frame_tx, frame_rx) = mpsc::channel(config.send_queue_depth);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let (state_tx, state_rx) = watch::channel(LinkState::Disconnected);
        let (stats_tx, stats_rx) = watch::channel(NetworkStats::default());

        let driver = Driver {
            transport,
            conn: Connection::new(role, config.clone()),
            config,
            dial_peer: peer,
            event_tx,
            state_tx,
            stats_tx,
            frame_rx,
            shutdown_rx,
        };
        tokio::spawn(driver.run());

        let handle = LinkHandle {
            frame_tx,
            shutdown_tx: Some(shutdown_tx),
            state_rx,
            stats_rx,
            local_addr,
        };
        let events = LinkEvents { rx: event_rx };
        Ok((handle, events))
    }
}

/// Why the driver loop must stop or recycle.
enum LoopOutcome {
    Continue,
    /// The connection reached a terminal state.
    Terminal,
    /// The socket itself failed; nothing more can be driven through it.
    Fatal,
}

struct Driver {
    transport: Transport,
    conn: Connection,
    config: LinkConfig,
    dial_peer: Option<SocketAddr>,
    event_tx: mpsc::Sender<LinkEvent>,
    state_tx: watch::Sender<LinkState>,
    stats_tx: watch::Sender<NetworkStats>,
    frame_rx: mpsc::Receiver<Vec<u8>>,
    shutdown_rx: oneshot::Receiver<()>,
}

impl Driver {
    async fn run(mut self) {
        // Tick fast enough that handshake and heartbeat deadlines are seen
        // promptly even with short test intervals.
        let period = (self.config.heartbeat_interval / 4).max(Duration::from_millis(5));
        let mut tick = tokio::time::interval(period);
        tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

        if let Some(peer) = self.dial_peer {
            let actions = self.conn.connect(peer, Instant::now());
            if matches!(self.apply(actions).await, LoopOutcome::Fatal) {
                return;
            }
        }

        loop {
            let outcome = tokio::select! {
                biased;

                _ = &mut self.shutdown_rx => {
                    let actions = self.conn.disconnect();
                    self.apply(actions).await;
                    break;
                }

                _ = tick.tick() => {
                    let actions = self.conn.on_tick(Instant::now());
                    self.apply(actions).await
                }

                frame = self.frame_rx.recv() => match frame {
                    Some(payload) => self.send_frame(payload).await,
                    // All handles are gone; treat like a shutdown.
                    None => {
                        let actions = self.conn.disconnect();
                        self.apply(actions).await;
                        break;
                    }
                },

                received = self.transport.recv() => match received {
                    Ok(event) => match event.result {
                        Ok(packet) => {
                            let actions =
                                self.conn.handle_packet(&packet, event.from, Instant::now());
                            self.apply(actions).await
                        }
                        // Undecodable datagram: already counted, keep going.
                        Err(_) => LoopOutcome::Continue,
                    },
                    Err(error) => {
                        warn!(%error, "socket receive failed");
                        let _ = self.event_tx.send(LinkEvent::Error(ErrorReason::Unreachable)).await;
                        LoopOutcome::Fatal
                    }
                },
            };

            self.publish_stats();
            match outcome {
                LoopOutcome::Continue => {}
                LoopOutcome::Terminal => {
                    if self.dial_peer.is_some() {
                        break;
                    }
                    // Listener: free the slot for the next connection.
                    self.conn.reset();
                    let _ = self.state_tx.send(LinkState::Disconnected);
                }
                LoopOutcome::Fatal => break,
            }
        }

        let stats = self.snapshot();
        info!(stats = ?stats.to_fields(), "link driver stopped");
    }

    /// Encode and send one caller frame.
    async fn send_frame(&mut self, payload: Vec<u8>) -> LoopOutcome {
        if payload.len() > MAX_PAYLOAD {
            warn!(size = payload.len(), max = MAX_PAYLOAD, "frame too large, dropped");
            return LoopOutcome::Continue;
        }
        let Some(packet) = self.conn.data_packet(payload) else {
            trace!("frame dropped, not connected");
            return LoopOutcome::Continue;
        };
        self.send(&packet).await
    }

    /// Perform the actions the machine asked for.
    async fn apply(&mut self, actions: Vec<Action>) -> LoopOutcome {
        let mut outcome = LoopOutcome::Continue;
        for action in actions {
            match action {
                Action::Send(packet) => {
                    if matches!(self.send(&packet).await, LoopOutcome::Fatal) {
                        return LoopOutcome::Fatal;
                    }
                }
                Action::Deliver {
                    payload,
                    sequence,
                    lost,
                } => {
                    // Frames are droppable: a caller that stopped reading
                    // does not get a growing backlog of stale audio.
                    let event = LinkEvent::Frame {
                        payload,
                        sequence,
                        lost,
                    };
                    if self.event_tx.try_send(event).is_err() {
                        trace!(sequence, "event queue full, frame dropped");
                    }
                }
                Action::Transition(state) => {
                    let _ = self.state_tx.send(state);
                    if let Some(event) = self.event_for(state) {
                        let _ = self.event_tx.send(event).await;
                    }
                    if state.is_terminal() {
                        outcome = LoopOutcome::Terminal;
                    }
                }
            }
        }
        outcome
    }

    async fn send(&mut self, packet: &Packet) -> LoopOutcome {
        let Some(peer) = self.conn.peer() else {
            return LoopOutcome::Continue;
        };
        match self.transport.send(packet, peer).await {
            Ok(()) => LoopOutcome::Continue,
            Err(LinkError::Packet(error)) => {
                warn!(%error, "unencodable packet dropped");
                LoopOutcome::Continue
            }
            Err(error) => {
                warn!(%error, ?peer, "send failed, peer unreachable");
                let _ = self.state_tx.send(LinkState::Error(ErrorReason::Unreachable));
                let _ = self
                    .event_tx
                    .send(LinkEvent::Error(ErrorReason::Unreachable))
                    .await;
                LoopOutcome::Fatal
            }
        }
    }

    fn event_for(&self, state: LinkState) -> Option<LinkEvent> {
        match state {
            LinkState::Connecting => Some(LinkEvent::Connecting),
            LinkState::Connected => {
                let peer = self.conn.peer()?;
                let session_id = self.conn.session_id()?;
                Some(LinkEvent::Connected { peer, session_id })
            }
            LinkState::Disconnected => Some(LinkEvent::Disconnected),
            LinkState::Error(reason) => Some(LinkEvent::Error(reason)),
            LinkState::Disconnecting => None,
        }
    }

    fn snapshot(&self) -> NetworkStats {
        NetworkStats {
            packets_sent: self.transport.packets_sent(),
            packets_received: self.transport.packets_received(),
            packets_dropped: self.transport.packets_dropped(),
            packets_lost: self.conn.frames_lost(),
            packets_out_of_order: self.conn.frames_out_of_order(),
            rtt_ms: self.conn.rtt_ms(),
            jitter_ms: self.conn.jitter_ms(),
        }
    }

    fn publish_stats(&self) {
        let _ = self.stats_tx.send(self.snapshot());
    }
}
