//! Connection lifecycle state machine.
//!
//! The machine is sans-IO: it consumes decoded packets and explicit
//! [`Instant`]s and returns [`Action`]s for the manager to perform. No
//! socket, no timer, no task lives here, which keeps every timing edge
//! (handshake retries, heartbeat misses, peer silence) unit-testable
//! without sleeping.
//!
//! Handshake (three-way):
//!
//! ```text
//! Dialer                        Listener
//!   | -- HandshakeRequest(sid) -->  |   listener adopts proposed session id
//!   | <-- HandshakeAccept(sid) ---  |
//!   | -- HandshakeConfirm ------->  |   both sides Connected
//! ```

use std::net::SocketAddr;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::core::config::LinkConfig;
use crate::core::error::ErrorReason;
use crate::packet::{Packet, PacketType};
use crate::transport::{HeartbeatTracker, RttEstimator};

pub mod sequence;

pub use sequence::{SequenceStatus, SequenceTracker};

/// Which side of the connection this machine plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Initiates the handshake.
    Dialer,
    /// Waits for a handshake request.
    Listener,
}

/// Connection lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    /// No connection; a listener in this state accepts handshake requests.
    Disconnected,
    /// Handshake in progress.
    Connecting,
    /// Handshake complete; data and heartbeats flow.
    Connected,
    /// Graceful teardown in progress.
    Disconnecting,
    /// The connection attempt failed. Terminal for the attempt, not the
    /// process: a listener resets back to `Disconnected`.
    Error(ErrorReason),
}

impl LinkState {
    /// Whether this state ends the connection attempt.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Disconnected | Self::Error(_))
    }
}

/// What the manager must do in response to an input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Send this packet to the peer.
    Send(Packet),
    /// Deliver a received audio frame to the caller.
    Deliver {
        /// Opaque frame bytes.
        payload: Vec<u8>,
        /// Sender-assigned sequence number.
        sequence: u32,
        /// Cumulative count of frames presumed lost so far.
        lost: u64,
    },
    /// The machine changed state.
    Transition(LinkState),
}

/// One peer-to-peer connection.
///
/// Data packets and control packets (handshake, heartbeat, disconnect) use
/// separate sequence counters: only the data stream feeds the
/// [`SequenceTracker`], so heartbeats never register as audio loss. The
/// control counter starts at 1 and skips 0 on wrap because a heartbeat echo
/// of 0 means "nothing to echo".
#[derive(Debug)]
pub struct Connection {
    role: Role,
    config: LinkConfig,
    state: LinkState,
    peer: Option<SocketAddr>,
    session_id: Option<u32>,

    next_data_sequence: u32,
    next_control_sequence: u32,
    tracker: SequenceTracker,
    rtt: RttEstimator,
    heartbeat: HeartbeatTracker,

    /// Last time anything arrived from the peer.
    last_received: Option<Instant>,
    /// Last time we emitted a heartbeat.
    last_heartbeat_sent: Option<Instant>,
    /// Handshake requests sent in this attempt (dialer only).
    handshake_attempts: u32,
    /// When the current handshake attempt (or accept wait) started.
    attempt_started: Option<Instant>,
}

impl Connection {
    /// Create a machine in `Disconnected` with the given role.
    pub fn new(role: Role, config: LinkConfig) -> Self {
        let tolerance = config.reorder_tolerance;
        Self {
            role,
            config,
            state: LinkState::Disconnected,
            peer: None,
            session_id: None,
            next_data_sequence: 1,
            next_control_sequence: 1,
            tracker: SequenceTracker::new(tolerance),
            rtt: RttEstimator::new(),
            heartbeat: HeartbeatTracker::new(),
            last_received: None,
            last_heartbeat_sent: None,
            handshake_attempts: 0,
            attempt_started: None,
        }
    }

    /// Current state.
    pub fn state(&self) -> LinkState {
        self.state
    }

    /// Peer address, once known.
    pub fn peer(&self) -> Option<SocketAddr> {
        self.peer
    }

    /// Negotiated session identifier, once the handshake proposed one.
    pub fn session_id(&self) -> Option<u32> {
        self.session_id
    }

    /// Data frames presumed lost so far.
    pub fn frames_lost(&self) -> u64 {
        self.tracker.lost()
    }

    /// Data frames delivered out of order so far.
    pub fn frames_out_of_order(&self) -> u64 {
        self.tracker.out_of_order()
    }

    /// Smoothed RTT in milliseconds, 0.0 before the first heartbeat echo.
    /// Upper bound: samples include the peer's heartbeat scheduling delay
    /// (see [`RttEstimator::srtt_ms`]).
    pub fn rtt_ms(&self) -> f64 {
        self.rtt.srtt_ms()
    }

    /// RTT variance in milliseconds.
    pub fn jitter_ms(&self) -> f64 {
        self.rtt.jitter_ms()
    }

    fn next_control(&mut self) -> u32 {
        let seq = self.next_control_sequence;
        self.next_control_sequence = match seq.wrapping_add(1) {
            0 => 1,
            next => next,
        };
        seq
    }

    fn transition(&mut self, state: LinkState, actions: &mut Vec<Action>) {
        if self.state != state {
            debug!(from = ?self.state, to = ?state, role = ?self.role, "state transition");
            self.state = state;
            actions.push(Action::Transition(state));
        }
    }

    /// Build the next outbound data packet. Valid only while `Connected`;
    /// in any other state the frame is silently dropped (stale audio has no
    /// value once the link is gone).
    pub fn data_packet(&mut self, payload: Vec<u8>) -> Option<Packet> {
        if self.state != LinkState::Connected {
            return None;
        }
        let seq = self.next_data_sequence;
        self.next_data_sequence = self.next_data_sequence.wrapping_add(1);
        Some(Packet::data(seq, payload))
    }

    /// Start dialing `peer`. Proposes a random session id in the request.
    pub fn connect(&mut self, peer: SocketAddr, now: Instant) -> Vec<Action> {
        let mut actions = Vec::new();
        if self.state != LinkState::Disconnected {
            return actions;
        }

        let session_id = rand::random::<u32>();
        self.peer = Some(peer);
        self.session_id = Some(session_id);
        self.handshake_attempts = 1;
        self.attempt_started = Some(now);

        info!(?peer, session_id, "dialing");
        self.transition(LinkState::Connecting, &mut actions);
        let seq = self.next_control();
        actions.push(Action::Send(Packet::handshake_request(seq, session_id)));
        actions
    }

    /// Request a graceful teardown.
    pub fn disconnect(&mut self) -> Vec<Action> {
        let mut actions = Vec::new();
        if !matches!(self.state, LinkState::Connecting | LinkState::Connected) {
            return actions;
        }

        info!(peer = ?self.peer, "disconnecting");
        self.transition(LinkState::Disconnecting, &mut actions);
        // Best effort, sent once. If it is lost the far side converges via
        // its heartbeat timeout.
        let seq = self.next_control();
        actions.push(Action::Send(Packet::disconnect(seq)));
        self.transition(LinkState::Disconnected, &mut actions);
        actions
    }

    /// Reset to a fresh `Disconnected`, keeping role and config. Used by a
    /// listener to recycle the slot for the next inbound connection.
    pub fn reset(&mut self) {
        *self = Self::new(self.role, self.config.clone());
    }

    /// Feed one decoded packet into the machine.
    pub fn handle_packet(
        &mut self,
        packet: &Packet,
        from: SocketAddr,
        now: Instant,
    ) -> Vec<Action> {
        let mut actions = Vec::new();

        // A listener with no connection accepts a request from anyone.
        if self.role == Role::Listener
            && self.state == LinkState::Disconnected
            && packet.packet_type == PacketType::HandshakeRequest
        {
            let Some(session_id) = packet.session_id() else {
                warn!(?from, "handshake request without session id");
                return actions;
            };
            self.peer = Some(from);
            self.session_id = Some(session_id);
            self.attempt_started = Some(now);
            self.last_received = Some(now);

            info!(peer = ?from, session_id, "accepting handshake");
            self.transition(LinkState::Connecting, &mut actions);
            let seq = self.next_control();
            actions.push(Action::Send(Packet::handshake_accept(seq, session_id)));
            return actions;
        }

        // Everything else must come from the established peer.
        if self.peer != Some(from) {
            debug!(?from, expected = ?self.peer, "packet from unexpected address");
            return actions;
        }
        self.last_received = Some(now);

        match (self.state, packet.packet_type) {
            // Dialer: accept completes our side of the handshake.
            (LinkState::Connecting, PacketType::HandshakeAccept) if self.role == Role::Dialer => {
                if packet.session_id() != self.session_id {
                    debug!("handshake accept with mismatched session id");
                    return actions;
                }
                let seq = self.next_control();
                actions.push(Action::Send(Packet::handshake_confirm(seq)));
                info!(peer = ?self.peer, session_id = ?self.session_id, "connected");
                self.transition(LinkState::Connected, &mut actions);
            }

            // Listener: confirm completes the handshake.
            (LinkState::Connecting, PacketType::HandshakeConfirm)
                if self.role == Role::Listener =>
            {
                info!(peer = ?self.peer, session_id = ?self.session_id, "connected");
                self.transition(LinkState::Connected, &mut actions);
            }

            // Listener: duplicated request while awaiting confirm means our
            // accept was lost. Resend it.
            (LinkState::Connecting, PacketType::HandshakeRequest)
                if self.role == Role::Listener =>
            {
                if let Some(session_id) = self.session_id
                    && packet.session_id() == Some(session_id)
                {
                    let seq = self.next_control();
                    actions.push(Action::Send(Packet::handshake_accept(seq, session_id)));
                }
            }

            // Dialer: duplicated accept after we connected means our confirm
            // was lost. Resend it.
            (LinkState::Connected, PacketType::HandshakeAccept) if self.role == Role::Dialer => {
                if packet.session_id() == self.session_id {
                    let seq = self.next_control();
                    actions.push(Action::Send(Packet::handshake_confirm(seq)));
                }
            }

            (LinkState::Connected, PacketType::Data) => match self.tracker.classify(packet.sequence)
            {
                SequenceStatus::InOrder | SequenceStatus::Reordered => {
                    actions.push(Action::Deliver {
                        payload: packet.payload.clone(),
                        sequence: packet.sequence,
                        lost: self.tracker.lost(),
                    });
                }
                SequenceStatus::Stale => {
                    debug!(sequence = packet.sequence, "stale data packet dropped");
                }
            },

            (LinkState::Connected, PacketType::Heartbeat) => {
                self.heartbeat.on_peer_heartbeat(packet.sequence);
                if let Some(echo) = packet.heartbeat_echo()
                    && let Some(sample) = self.heartbeat.on_echo(echo, now)
                {
                    self.rtt.update(sample);
                }
            }

            (LinkState::Connecting | LinkState::Connected, PacketType::Disconnect) => {
                info!(peer = ?self.peer, "peer disconnected");
                self.transition(LinkState::Disconnected, &mut actions);
            }

            (state, packet_type) => {
                debug!(?state, ?packet_type, "packet ignored in current state");
            }
        }

        actions
    }

    /// Advance the machine's clocks. The manager calls this on a periodic
    /// tick; all timeout detection happens here so it works during silence.
    pub fn on_tick(&mut self, now: Instant) -> Vec<Action> {
        let mut actions = Vec::new();

        match self.state {
            LinkState::Connecting => {
                let Some(started) = self.attempt_started else {
                    return actions;
                };
                if now.saturating_duration_since(started) < self.config.handshake_timeout {
                    return actions;
                }

                match self.role {
                    Role::Dialer => {
                        if self.handshake_attempts > self.config.handshake_retries {
                            warn!(
                                attempts = self.handshake_attempts,
                                "handshake retries exhausted"
                            );
                            self.transition(
                                LinkState::Error(ErrorReason::HandshakeTimeout),
                                &mut actions,
                            );
                        } else if let Some(session_id) = self.session_id {
                            self.handshake_attempts += 1;
                            self.attempt_started = Some(now);
                            debug!(attempt = self.handshake_attempts, "resending handshake");
                            let seq = self.next_control();
                            actions
                                .push(Action::Send(Packet::handshake_request(seq, session_id)));
                        }
                    }
                    Role::Listener => {
                        // Confirm never arrived; free the slot for the next
                        // request.
                        debug!(peer = ?self.peer, "confirm timeout, recycling listener");
                        self.reset();
                        actions.push(Action::Transition(LinkState::Disconnected));
                    }
                }
            }

            LinkState::Connected => {
                if let Some(last) = self.last_received
                    && now.saturating_duration_since(last) >= self.config.peer_timeout()
                {
                    warn!(
                        silence_ms = now.saturating_duration_since(last).as_millis() as u64,
                        "peer timed out"
                    );
                    self.transition(LinkState::Error(ErrorReason::PeerTimeout), &mut actions);
                    return actions;
                }

                let due = match self.last_heartbeat_sent {
                    None => true,
                    Some(sent) => {
                        now.saturating_duration_since(sent) >= self.config.heartbeat_interval
                    }
                };
                if due {
                    let seq = self.next_control();
                    self.heartbeat.on_send(seq, now);
                    self.last_heartbeat_sent = Some(now);
                    actions.push(Action::Send(Packet::heartbeat(seq, self.heartbeat.echo())));
                }
            }

            LinkState::Disconnected | LinkState::Disconnecting | LinkState::Error(_) => {}
        }

        actions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn addr(port: u16) -> SocketAddr {
        format!("127.0.0.1:{port}").parse().unwrap()
    }

    fn config() -> LinkConfig {
        LinkConfig {
            handshake_timeout: Duration::from_millis(100),
            handshake_retries: 2,
            heartbeat_interval: Duration::from_millis(100),
            heartbeat_miss_threshold: 3,
            ..LinkConfig::default()
        }
    }

    fn sent(actions: &[Action]) -> Vec<&Packet> {
        actions
            .iter()
            .filter_map(|a| match a {
                Action::Send(p) => Some(p),
                _ => None,
            })
            .collect()
    }

    fn transitions(actions: &[Action]) -> Vec<LinkState> {
        actions
            .iter()
            .filter_map(|a| match a {
                Action::Transition(s) => Some(*s),
                _ => None,
            })
            .collect()
    }

    /// Drive both machines through the full handshake; returns them
    /// connected to each other.
    fn connected_pair(now: Instant) -> (Connection, Connection) {
        let dialer_addr = addr(4000);
        let listener_addr = addr(4001);
        let mut dialer = Connection::new(Role::Dialer, config());
        let mut listener = Connection::new(Role::Listener, config());

        let actions = dialer.connect(listener_addr, now);
        let request = sent(&actions)[0].clone();

        let actions = listener.handle_packet(&request, dialer_addr, now);
        let accept = sent(&actions)[0].clone();

        let actions = dialer.handle_packet(&accept, listener_addr, now);
        let confirm = sent(&actions)[0].clone();
        assert_eq!(dialer.state(), LinkState::Connected);

        listener.handle_packet(&confirm, dialer_addr, now);
        assert_eq!(listener.state(), LinkState::Connected);

        (dialer, listener)
    }

    #[test]
    fn test_three_way_handshake() {
        let now = Instant::now();
        let (dialer, listener) = connected_pair(now);

        assert_eq!(dialer.peer(), Some(addr(4001)));
        assert_eq!(listener.peer(), Some(addr(4000)));
        assert!(dialer.session_id().is_some());
        assert_eq!(dialer.session_id(), listener.session_id());
    }

    #[test]
    fn test_handshake_request_types() {
        let now = Instant::now();
        let mut dialer = Connection::new(Role::Dialer, config());

        let actions = dialer.connect(addr(4001), now);
        assert_eq!(transitions(&actions), vec![LinkState::Connecting]);
        let packets = sent(&actions);
        assert_eq!(packets.len(), 1);
        assert_eq!(packets[0].packet_type, PacketType::HandshakeRequest);
        assert_eq!(packets[0].session_id(), dialer.session_id());
    }

    #[test]
    fn test_dialer_retries_then_times_out() {
        let now = Instant::now();
        let mut dialer = Connection::new(Role::Dialer, config());
        dialer.connect(addr(4001), now);

        // Two retries configured: ticks at 100ms and 200ms resend.
        for i in 1..=2u64 {
            let actions = dialer.on_tick(now + Duration::from_millis(100 * i));
            let packets = sent(&actions);
            assert_eq!(packets.len(), 1, "retry {i} not sent");
            assert_eq!(packets[0].packet_type, PacketType::HandshakeRequest);
        }

        // Third expiry exhausts the budget.
        let actions = dialer.on_tick(now + Duration::from_millis(300));
        assert_eq!(
            transitions(&actions),
            vec![LinkState::Error(ErrorReason::HandshakeTimeout)]
        );
        assert!(sent(&actions).is_empty());

        // And stays terminal: later ticks do nothing.
        assert!(dialer.on_tick(now + Duration::from_secs(10)).is_empty());
    }

    #[test]
    fn test_listener_recycles_after_confirm_timeout() {
        let now = Instant::now();
        let mut listener = Connection::new(Role::Listener, config());

        let request = Packet::handshake_request(1, 777);
        listener.handle_packet(&request, addr(4000), now);
        assert_eq!(listener.state(), LinkState::Connecting);

        let actions = listener.on_tick(now + Duration::from_millis(150));
        assert_eq!(transitions(&actions), vec![LinkState::Disconnected]);

        // Slot is fresh: a new request from a different peer is accepted.
        let request2 = Packet::handshake_request(1, 888);
        let actions = listener.handle_packet(&request2, addr(5000), now + Duration::from_millis(200));
        assert_eq!(listener.state(), LinkState::Connecting);
        assert_eq!(listener.peer(), Some(addr(5000)));
        assert_eq!(sent(&actions)[0].session_id(), Some(888));
    }

    #[test]
    fn test_listener_sequential_connections() {
        let mut now = Instant::now();
        let mut listener = Connection::new(Role::Listener, config());

        for i in 0..5u16 {
            let peer = addr(4100 + i);
            let request = Packet::handshake_request(1, 1000 + u32::from(i));
            listener.handle_packet(&request, peer, now);
            let confirm = Packet::handshake_confirm(2);
            listener.handle_packet(&confirm, peer, now);
            assert_eq!(listener.state(), LinkState::Connected);
            assert_eq!(listener.peer(), Some(peer));

            // Peer goes away; timeout then recycle for the next one.
            let actions = listener.on_tick(now + Duration::from_millis(350));
            assert_eq!(
                transitions(&actions),
                vec![LinkState::Error(ErrorReason::PeerTimeout)]
            );
            listener.reset();
            assert_eq!(listener.state(), LinkState::Disconnected);
            now += Duration::from_secs(1);
        }
    }

    #[test]
    fn test_peer_timeout_after_silence() {
        let now = Instant::now();
        let (mut dialer, _) = connected_pair(now);

        // 100ms interval, miss threshold 3: 350ms of silence is past the
        // 300ms budget.
        let actions = dialer.on_tick(now + Duration::from_millis(250));
        assert!(transitions(&actions).is_empty());

        let actions = dialer.on_tick(now + Duration::from_millis(350));
        assert_eq!(
            transitions(&actions),
            vec![LinkState::Error(ErrorReason::PeerTimeout)]
        );
    }

    #[test]
    fn test_any_packet_resets_liveness() {
        let now = Instant::now();
        let (mut dialer, mut listener) = connected_pair(now);

        // A heartbeat at 250ms defers the timeout.
        let hb_actions = listener.on_tick(now + Duration::from_millis(250));
        let heartbeat = sent(&hb_actions)[0].clone();
        dialer.handle_packet(&heartbeat, addr(4001), now + Duration::from_millis(250));

        let actions = dialer.on_tick(now + Duration::from_millis(400));
        assert!(transitions(&actions).is_empty());

        let actions = dialer.on_tick(now + Duration::from_millis(600));
        assert_eq!(
            transitions(&actions),
            vec![LinkState::Error(ErrorReason::PeerTimeout)]
        );
    }

    #[test]
    fn test_data_delivery_and_loss_accounting() {
        let now = Instant::now();
        let (mut dialer, mut listener) = connected_pair(now);

        let from = addr(4000);
        let mut delivered = Vec::new();
        for seq in [1u32, 2, 3, 5, 6] {
            let packet = dialer.data_packet(vec![seq as u8]).unwrap();
            assert_eq!(packet.sequence, dialer.next_data_sequence - 1);
            let actions = listener.handle_packet(&Packet::data(seq, vec![seq as u8]), from, now);
            for action in actions {
                if let Action::Deliver { sequence, lost, .. } = action {
                    delivered.push((sequence, lost));
                }
            }
        }

        assert_eq!(delivered.len(), 5);
        assert_eq!(listener.frames_lost(), 1);
        assert_eq!(delivered.last().unwrap().1, 1);
    }

    #[test]
    fn test_stale_data_not_delivered() {
        let now = Instant::now();
        let (_, mut listener) = connected_pair(now);
        let from = addr(4000);

        listener.handle_packet(&Packet::data(10, vec![]), from, now);
        let actions = listener.handle_packet(&Packet::data(10, vec![]), from, now);
        assert!(actions.iter().all(|a| !matches!(a, Action::Deliver { .. })));
    }

    #[test]
    fn test_heartbeat_rtt_sample() {
        let now = Instant::now();
        let (mut dialer, mut listener) = connected_pair(now);
        assert_eq!(dialer.rtt_ms(), 0.0);

        // Dialer sends its first heartbeat.
        let actions = dialer.on_tick(now);
        let hb = sent(&actions)[0].clone();
        assert_eq!(hb.packet_type, PacketType::Heartbeat);

        // Listener receives it and answers with its own heartbeat echoing
        // the dialer's sequence.
        listener.handle_packet(&hb, addr(4000), now + Duration::from_millis(10));
        let actions = listener.on_tick(now + Duration::from_millis(10));
        let reply = sent(&actions)[0].clone();
        assert_eq!(reply.heartbeat_echo(), Some(hb.sequence));

        // The echo closes the loop after 40ms.
        dialer.handle_packet(&reply, addr(4001), now + Duration::from_millis(40));
        assert!((dialer.rtt_ms() - 40.0).abs() < 1.0);
    }

    #[test]
    fn test_heartbeat_emitted_on_interval() {
        let now = Instant::now();
        let (mut dialer, _) = connected_pair(now);

        let first = dialer.on_tick(now);
        assert_eq!(sent(&first).len(), 1);

        // Not due again 50ms later.
        let early = dialer.on_tick(now + Duration::from_millis(50));
        assert!(sent(&early).is_empty());

        let due = dialer.on_tick(now + Duration::from_millis(100));
        assert_eq!(sent(&due).len(), 1);
    }

    #[test]
    fn test_local_disconnect() {
        let now = Instant::now();
        let (mut dialer, mut listener) = connected_pair(now);

        let actions = dialer.disconnect();
        assert_eq!(
            transitions(&actions),
            vec![LinkState::Disconnecting, LinkState::Disconnected]
        );
        let packets = sent(&actions);
        assert_eq!(packets.len(), 1);
        assert_eq!(packets[0].packet_type, PacketType::Disconnect);

        // The far side drops to Disconnected on receipt.
        let far = listener.handle_packet(packets[0], addr(4000), now);
        assert_eq!(transitions(&far), vec![LinkState::Disconnected]);
    }

    #[test]
    fn test_no_data_when_not_connected() {
        let mut dialer = Connection::new(Role::Dialer, config());
        assert!(dialer.data_packet(vec![1, 2, 3]).is_none());

        dialer.connect(addr(4001), Instant::now());
        assert!(dialer.data_packet(vec![1, 2, 3]).is_none());
    }

    #[test]
    fn test_packets_from_unknown_address_ignored() {
        let now = Instant::now();
        let (_, mut listener) = connected_pair(now);

        // Data from a third party never reaches the caller.
        let actions = listener.handle_packet(&Packet::data(1, vec![9]), addr(6666), now);
        assert!(actions.is_empty());
        assert_eq!(listener.state(), LinkState::Connected);
    }

    #[test]
    fn test_duplicate_request_resends_accept() {
        let now = Instant::now();
        let mut listener = Connection::new(Role::Listener, config());

        let request = Packet::handshake_request(1, 42);
        let first = listener.handle_packet(&request, addr(4000), now);
        let second = listener.handle_packet(&request, addr(4000), now);

        assert_eq!(sent(&first).len(), 1);
        assert_eq!(sent(&second).len(), 1);
        assert_eq!(sent(&second)[0].packet_type, PacketType::HandshakeAccept);
    }

    #[test]
    fn test_mismatched_session_accept_ignored() {
        let now = Instant::now();
        let mut dialer = Connection::new(Role::Dialer, config());
        dialer.connect(addr(4001), now);

        let bogus = Packet::handshake_accept(1, dialer.session_id().unwrap().wrapping_add(1));
        let actions = dialer.handle_packet(&bogus, addr(4001), now);
        assert!(actions.is_empty());
        assert_eq!(dialer.state(), LinkState::Connecting);
    }
}
