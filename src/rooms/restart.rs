use tracing::info;

use crate::error::{SessionError, SessionResult};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Negotiation {
    #[default]
    Idle,
    Pending {
        requester: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request {
    Opened,
    Coalesced,
    /// The opponent asked while a request was pending, which counts as consent.
    Agreed,
}

#[derive(Debug, Clone, Default)]
pub struct RestartNegotiator {
    state: Negotiation,
}

impl RestartNegotiator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &Negotiation {
        &self.state
    }

    pub fn requester(&self) -> Option<&str> {
        match &self.state {
            Negotiation::Idle => None,
            Negotiation::Pending { requester } => Some(requester),
        }
    }

    pub fn request(&mut self, identity: &str) -> Request {
        match self.requester().map(|requester| requester == identity) {
            None => {
                info!(identity, "restart requested");
                self.state = Negotiation::Pending {
                    requester: identity.to_owned(),
                };
                Request::Opened
            }
            Some(true) => Request::Coalesced,
            Some(false) => {
                self.state = Negotiation::Idle;
                Request::Agreed
            }
        }
    }

    pub fn accept(&mut self, identity: &str) -> SessionResult<()> {
        match self.requester().map(|requester| requester == identity) {
            None => Err(SessionError::conflict("no restart pending")),
            Some(true) => Err(SessionError::conflict("cannot answer own restart request")),
            Some(false) => {
                self.state = Negotiation::Idle;
                Ok(())
            }
        }
    }

    pub fn decline(&mut self, identity: &str) -> SessionResult<String> {
        match std::mem::take(&mut self.state) {
            Negotiation::Idle => Err(SessionError::conflict("no restart pending")),
            Negotiation::Pending { requester } if requester == identity => {
                self.state = Negotiation::Pending { requester };
                Err(SessionError::conflict("cannot answer own restart request"))
            }
            Negotiation::Pending { requester } => Ok(requester),
        }
    }

    pub fn cancel(&mut self) {
        self.state = Negotiation::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_then_accept() {
        let mut restart = RestartNegotiator::new();
        assert_eq!(restart.request("alice"), Request::Opened);
        assert_eq!(restart.requester(), Some("alice"));
        assert!(restart.accept("alice").is_err());
        assert_eq!(restart.accept("bob"), Ok(()));
        assert_eq!(*restart.state(), Negotiation::Idle);
    }

    #[test]
    fn repeated_request_is_coalesced() {
        let mut restart = RestartNegotiator::new();
        restart.request("alice");
        assert_eq!(restart.request("alice"), Request::Coalesced);
        assert_eq!(
            *restart.state(),
            Negotiation::Pending {
                requester: "alice".to_owned()
            }
        );
    }

    #[test]
    fn crossing_requests_agree() {
        let mut restart = RestartNegotiator::new();
        restart.request("alice");
        assert_eq!(restart.request("bob"), Request::Agreed);
        assert_eq!(*restart.state(), Negotiation::Idle);
    }

    #[test]
    fn decline_reports_requester() {
        let mut restart = RestartNegotiator::new();
        assert!(restart.decline("bob").is_err());
        restart.request("alice");
        assert!(restart.decline("alice").is_err());
        assert_eq!(restart.requester(), Some("alice"));
        assert_eq!(restart.decline("bob"), Ok("alice".to_owned()));
        assert_eq!(restart.requester(), None);
    }
}
