// Slap AI - WiFi Link State
//
// Decides what the radio should be doing. The firmware feeds it observations
// (association up or not) and carries out the returned action.

/// Station connect attempts give up after this long and fall back to AP mode.
pub const CONNECT_TIMEOUT_MS: u32 = 20_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinkState {
    #[default]
    Idle,
    AccessPoint,
    Connecting { since_ms: u32 },
    Connected,
    Failed,
}

impl LinkState {
    /// Label shown on the settings page.
    pub fn label(&self) -> &'static str {
        match self {
            Self::AccessPoint => "AP Mode",
            Self::Connecting { .. } => "Connecting...",
            Self::Connected => "Connected",
            Self::Failed => "Failed",
            Self::Idle => "Idle",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkAction {
    None,
    /// Association completed.
    Connected,
    /// Timed out: persist AP mode and bring the access point up.
    FallBackToAccessPoint,
}

#[derive(Debug, Clone)]
pub struct Link {
    state: LinkState,
    timeout_ms: u32,
}

impl Default for Link {
    fn default() -> Self {
        Self::new()
    }
}

impl Link {
    pub fn new() -> Self {
        Self {
            state: LinkState::Idle,
            timeout_ms: CONNECT_TIMEOUT_MS,
        }
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    pub fn access_point_started(&mut self, ok: bool) {
        self.state = if ok {
            LinkState::AccessPoint
        } else {
            LinkState::Failed
        };
    }

    pub fn connect_started(&mut self, now_ms: u32) {
        self.state = LinkState::Connecting { since_ms: now_ms };
    }

    /// Feed the current association status while connecting. Outside of the
    /// connecting state this is a no-op.
    pub fn poll(&mut self, associated: bool, now_ms: u32) -> LinkAction {
        let LinkState::Connecting { since_ms } = self.state else {
            return LinkAction::None;
        };

        if associated {
            self.state = LinkState::Connected;
            LinkAction::Connected
        } else if now_ms.wrapping_sub(since_ms) > self.timeout_ms {
            self.state = LinkState::Idle;
            LinkAction::FallBackToAccessPoint
        } else {
            LinkAction::None
        }
    }

    pub fn is_access_point(&self) -> bool {
        self.state == LinkState::AccessPoint
    }

    pub fn is_connected(&self) -> bool {
        self.state == LinkState::Connected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connect_succeeds_before_timeout() {
        let mut link = Link::new();
        link.connect_started(1000);
        assert_eq!(link.state().label(), "Connecting...");
        assert_eq!(link.poll(false, 5000), LinkAction::None);
        assert_eq!(link.poll(true, 6000), LinkAction::Connected);
        assert!(link.is_connected());
        assert_eq!(link.state().label(), "Connected");
    }

    #[test]
    fn connect_timeout_falls_back_once() {
        let mut link = Link::new();
        link.connect_started(0);
        assert_eq!(link.poll(false, CONNECT_TIMEOUT_MS), LinkAction::None);
        assert_eq!(
            link.poll(false, CONNECT_TIMEOUT_MS + 1),
            LinkAction::FallBackToAccessPoint
        );
        assert_eq!(link.poll(false, CONNECT_TIMEOUT_MS + 2), LinkAction::None);

        link.access_point_started(true);
        assert!(link.is_access_point());
        assert_eq!(link.state().label(), "AP Mode");
    }

    #[test]
    fn poll_is_inert_outside_connecting() {
        let mut link = Link::new();
        assert_eq!(link.poll(true, 0), LinkAction::None);
        assert_eq!(link.state(), LinkState::Idle);

        link.access_point_started(false);
        assert_eq!(link.state().label(), "Failed");
        assert_eq!(link.poll(true, 10), LinkAction::None);
    }
}
