//! Close reasons
//!
//! Why the relay closed a connection, mapped onto RFC 6455 close codes.

/// Reason attached to a transport close
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum CloseReason {
    /// Peer went away or the connection ended normally
    Normal = 1000,
    /// The relay is shutting down
    GoingAway = 1001,
    /// The peer sent something the transport could not read
    ProtocolError = 1002,
    /// Evicted because the outbound queue overflowed
    SlowConsumer = 1008,
    /// Writing to the peer failed
    ServerError = 1011,
    /// Connection limit reached
    Overloaded = 1013,
}

impl CloseReason {
    /// Get the raw close code
    #[must_use]
    pub const fn code(self) -> u16 {
        self as u16
    }

    /// Human-readable close reason sent with the close frame
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Normal => "Connection closed",
            Self::GoingAway => "Relay shutting down",
            Self::ProtocolError => "Unreadable frame",
            Self::SlowConsumer => "Slow consumer evicted",
            Self::ServerError => "Write failed",
            Self::Overloaded => "Connection limit reached",
        }
    }
}

impl std::fmt::Display for CloseReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.description(), self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_close_reason_codes() {
        assert_eq!(CloseReason::Normal.code(), 1000);
        assert_eq!(CloseReason::SlowConsumer.code(), 1008);
        assert_eq!(CloseReason::Overloaded.code(), 1013);
    }

    #[test]
    fn test_display() {
        assert_eq!(
            CloseReason::SlowConsumer.to_string(),
            "Slow consumer evicted (1008)"
        );
    }
}
