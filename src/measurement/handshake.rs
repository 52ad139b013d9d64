//! Lock-free handshake cell shared by the two threads of a probe.
//!
//! Every wait in the measured path is a busy poll on a single atomic byte.
//! No mutex, condition variable, or syscall is ever involved: the quantity
//! being measured is the cross-core signaling cost itself, and any blocking
//! primitive would fold scheduler wakeup latency into it.
//!
//! The waits carry no timeout either. A bounded wait would have to be
//! excluded from the timed region, and outside of protocol correctness there
//! is no termination guarantee to fall back on. A responder that never
//! arrives therefore hangs the session; see [`HandshakeState::Faulted`] for
//! the one failure the protocol does detect.

use std::sync::atomic::{AtomicU8, Ordering};

use crossbeam_utils::CachePadded;

/// Protocol state carried by a [`SyncChannel`].
///
/// A successful session moves through
/// `Preparing → Ready → (Ping ⇄ Pong)* → Finish`. `Faulted` replaces
/// `Ready` when the responder cannot pin itself, so the primary is never
/// left spinning on a partner that will not arrive.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeState {
    /// Channel created, responder not up yet.
    Preparing = 0,
    /// Responder is pinned and listening.
    Ready = 1,
    /// Primary requests a round trip.
    Ping = 2,
    /// Responder acknowledges a ping.
    Pong = 3,
    /// Primary terminates the responder loop.
    Finish = 4,
    /// Responder failed to bind its CPU and will not serve.
    Faulted = 5,
}

impl HandshakeState {
    fn from_tag(tag: u8) -> Self {
        match tag {
            0 => HandshakeState::Preparing,
            1 => HandshakeState::Ready,
            2 => HandshakeState::Ping,
            3 => HandshakeState::Pong,
            4 => HandshakeState::Finish,
            5 => HandshakeState::Faulted,
            // The cell is written only by `SyncChannel::set`, which takes
            // the typed state.
            _ => unreachable!("handshake cell holds undefined tag {tag}"),
        }
    }
}

/// One shared state cell with sequentially consistent load/store.
///
/// Owned by exactly one probe session and never reused after `Finish` or
/// `Faulted`. The byte is cache-padded: this is the line the two cores
/// bounce between each other, and a neighbouring allocation on the same
/// line would add foreign coherency traffic to the measurement.
pub struct SyncChannel {
    state: CachePadded<AtomicU8>,
}

impl SyncChannel {
    /// Create a channel in the `Preparing` state.
    pub fn new() -> Self {
        Self {
            state: CachePadded::new(AtomicU8::new(HandshakeState::Preparing as u8)),
        }
    }

    /// Unconditionally publish `new_state`.
    #[inline]
    pub fn set(&self, new_state: HandshakeState) {
        self.state.store(new_state as u8, Ordering::SeqCst);
    }

    /// The state currently in the cell.
    #[inline]
    pub fn load(&self) -> HandshakeState {
        HandshakeState::from_tag(self.state.load(Ordering::SeqCst))
    }

    /// Spin until the cell equals `expected`.
    ///
    /// Bare busy poll, no pause hint: the exit latency of this loop is the
    /// quantity under measurement.
    #[inline]
    pub fn wait_until(&self, expected: HandshakeState) {
        while self.state.load(Ordering::SeqCst) != expected as u8 {}
    }

    /// Spin while the cell still equals `current`; return the first
    /// different state observed.
    ///
    /// Lets the responder detect a transition without knowing in advance
    /// whether the next state will be `Ping` or `Finish`.
    #[inline]
    pub fn wait_as_long_as(&self, current: HandshakeState) -> HandshakeState {
        let current = current as u8;
        loop {
            let tag = self.state.load(Ordering::SeqCst);
            if tag != current {
                return HandshakeState::from_tag(tag);
            }
        }
    }
}

impl Default for SyncChannel {
    fn default() -> Self {
        Self::new()
    }
}
