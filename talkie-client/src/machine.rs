//! Pure call state machine. Transitions take (state, event) to
//! (state, effects); all I/O lives in the boundary layer that executes the
//! effects, which keeps negotiation logic testable without a browser.

/// Who transmits the initial offer. Fixed from room occupancy at join time
/// and never reassigned for the life of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Unknown,
    Initiator,
    Responder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallPhase {
    Idle,
    ConnectingTransport,
    Joined,
    Initiating,
    AwaitingOffer,
    Negotiating,
    Connected,
    Disconnected,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallState {
    pub phase: CallPhase,
    pub role: Role,
}

impl CallState {
    pub fn new() -> Self {
        Self {
            phase: CallPhase::Idle,
            role: Role::Unknown,
        }
    }

    fn with_phase(self, phase: CallPhase) -> Self {
        Self { phase, ..self }
    }
}

impl Default for CallState {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallEvent {
    Mounted,
    TransportOpen,
    TransportClosed,
    ConnectTimeout,
    JoinAccepted { room_size: usize },
    PttPressed,
    PttReleased,
    OfferReceived,
    AnswerReceived,
    PeerConnected,
    PeerDisconnected,
    PeerFailed,
    IceFailed,
    ReconnectFired,
    ReconnectExhausted,
    TornDown,
}

/// Side effects the boundary layer must run after a transition, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    OpenTransport,
    StartConnectTimer,
    CancelConnectTimer,
    SendJoin,
    ResetBackoff,
    StartCapture,
    SendOfferIfClean,
    ApplyRemoteOffer,
    ApplyRemoteAnswer,
    StopCapture,
    RestartIce,
    TeardownPeer,
    ScheduleReconnect,
    CancelReconnect,
    CloseTransport,
    SetConnected(bool),
    SurfaceRecoverableError,
    SurfaceFatalError,
}

pub fn transition(state: CallState, event: CallEvent) -> (CallState, Vec<Effect>) {
    use CallEvent::*;
    use CallPhase::*;

    match (state.phase, event) {
        (Idle, Mounted) => (
            state.with_phase(ConnectingTransport),
            vec![Effect::OpenTransport, Effect::StartConnectTimer],
        ),

        // The connect timer keeps running here: a socket that opens but
        // whose join is never acked must still time out.
        (ConnectingTransport, TransportOpen) => (state, vec![Effect::SendJoin]),

        (ConnectingTransport, ConnectTimeout) => (
            state.with_phase(Disconnected),
            vec![Effect::CloseTransport, Effect::ScheduleReconnect],
        ),

        // Room occupancy at join time decides who offers: the participant
        // who found the room empty initiates.
        (_, JoinAccepted { room_size }) => {
            let role = if room_size <= 1 {
                Role::Initiator
            } else {
                Role::Responder
            };
            (
                CallState {
                    phase: Joined,
                    role,
                },
                vec![Effect::CancelConnectTimer, Effect::ResetBackoff],
            )
        }

        (Joined | Initiating | AwaitingOffer | Negotiating | Connected, PttPressed) => {
            let next = match (state.phase, state.role) {
                (Joined, Role::Initiator) => Initiating,
                (Joined, _) => AwaitingOffer,
                (phase, _) => phase,
            };
            let mut effects = vec![Effect::StartCapture];
            if state.role == Role::Initiator {
                effects.push(Effect::SendOfferIfClean);
            }
            (state.with_phase(next), effects)
        }

        // Release only stops capture; the peer connection persists so the
        // next press skips renegotiation.
        (_, PttReleased) => (state, vec![Effect::StopCapture]),

        // An offer landing mid-negotiation is the collision case: drop it
        // rather than glare on the wire.
        (Negotiating, OfferReceived) => (state, vec![]),
        (Joined | Initiating | AwaitingOffer | Connected, OfferReceived) => (
            state.with_phase(Negotiating),
            vec![Effect::StartCapture, Effect::ApplyRemoteOffer],
        ),

        // An answer is only meaningful while our own offer is outstanding.
        (Initiating, AnswerReceived) => (
            state.with_phase(Negotiating),
            vec![Effect::ApplyRemoteAnswer],
        ),
        (_, AnswerReceived) => (state, vec![]),

        (Idle | Failed, PeerConnected) => (state, vec![]),
        (_, PeerConnected) => (
            state.with_phase(Connected),
            vec![Effect::SetConnected(true)],
        ),

        // Brief network blips self-heal; surface but do not tear down.
        (Connected, PeerDisconnected) => (state, vec![Effect::SurfaceRecoverableError]),
        (_, PeerDisconnected) => (state, vec![]),

        // ICE failure gets one cheap retry before the heavy path. The
        // restart re-offers, so drop back to Initiating where the peer's
        // answer is accepted.
        (Negotiating | Connected, IceFailed) => {
            (state.with_phase(Initiating), vec![Effect::RestartIce])
        }
        (_, IceFailed) => (state, vec![]),

        (Idle | Failed, PeerFailed) => (state, vec![]),
        (_, PeerFailed) => (
            state.with_phase(Disconnected),
            vec![
                Effect::SetConnected(false),
                Effect::StopCapture,
                Effect::TeardownPeer,
                Effect::CloseTransport,
                Effect::ScheduleReconnect,
            ],
        ),

        (Idle | Disconnected | Failed, TransportClosed) => (state, vec![]),
        (_, TransportClosed) => (
            state.with_phase(Disconnected),
            vec![Effect::SetConnected(false), Effect::ScheduleReconnect],
        ),

        (Disconnected, ReconnectFired) => (
            CallState {
                phase: ConnectingTransport,
                role: Role::Unknown,
            },
            vec![Effect::OpenTransport, Effect::StartConnectTimer],
        ),
        (_, ReconnectFired) => (state, vec![]),

        (Disconnected, ReconnectExhausted) => {
            (state.with_phase(Failed), vec![Effect::SurfaceFatalError])
        }
        (_, ReconnectExhausted) => (state, vec![]),

        (_, TornDown) => (
            CallState::new(),
            vec![
                Effect::CancelReconnect,
                Effect::CancelConnectTimer,
                Effect::StopCapture,
                Effect::TeardownPeer,
                Effect::CloseTransport,
                Effect::SetConnected(false),
            ],
        ),

        _ => (state, vec![]),
    }
}
