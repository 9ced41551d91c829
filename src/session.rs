use crate::error::{BraviaError, Result};
use crate::storage::CookieStore;
use crate::subscription::StateUpdate;
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;

/// Holds the session cookie obtained through pairing
///
/// All outbound calls are decorated with the cookie; a 403 anywhere
/// downstream invalidates it. Authentication transitions are
/// edge-triggered: a notification fires only when the cookie flips
/// between present and absent, never on a same-state store. Every
/// transition is also written through to the [`CookieStore`].
pub(crate) struct Session {
    device_id: String,
    cookie: Mutex<Option<String>>,
    store: Arc<dyn CookieStore>,
    events: broadcast::Sender<StateUpdate>,
}

impl Session {
    pub fn new(
        device_id: String,
        store: Arc<dyn CookieStore>,
        events: broadcast::Sender<StateUpdate>,
    ) -> Self {
        Self {
            device_id,
            cookie: Mutex::new(None),
            store,
            events,
        }
    }

    /// Replace the cookie, persisting it and notifying on transitions
    pub fn set_cookie(&self, value: Option<String>) {
        let mut cookie = self.cookie.lock().unwrap();
        let was_authenticated = cookie.is_some();
        let is_authenticated = value.is_some();

        self.store.store(&self.device_id, value.as_deref());
        *cookie = value;

        if was_authenticated != is_authenticated {
            tracing::debug!(
                device = %self.device_id,
                authenticated = is_authenticated,
                "authentication state changed"
            );
            let _ = self.events.send(StateUpdate::AuthChanged(is_authenticated));
        }
    }

    /// Drop the session after the TV rejected it with a 403
    pub fn invalidate(&self) {
        self.set_cookie(None);
    }

    pub fn cookie(&self) -> Option<String> {
        self.cookie.lock().unwrap().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.cookie.lock().unwrap().is_some()
    }

    /// Attach the session cookie to an outgoing request, if present
    pub fn decorate(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.cookie() {
            Some(cookie) => request.header(reqwest::header::COOKIE, cookie),
            None => request,
        }
    }

    /// Gate operations that are meaningless without a session
    pub fn require_authenticated(&self) -> Result<()> {
        if self.is_authenticated() {
            Ok(())
        } else {
            Err(BraviaError::NotAuthenticated)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryCookieStore;

    fn session() -> (Session, broadcast::Receiver<StateUpdate>, Arc<MemoryCookieStore>) {
        let store = Arc::new(MemoryCookieStore::new());
        let (tx, rx) = broadcast::channel(16);
        (
            Session::new("uuid:1".to_string(), store.clone(), tx),
            rx,
            store,
        )
    }

    #[test]
    fn notifies_only_on_transitions() {
        let (session, mut rx, _) = session();

        session.set_cookie(Some("auth=a".to_string()));
        session.set_cookie(Some("auth=b".to_string()));
        session.set_cookie(None);
        session.set_cookie(None);

        assert_eq!(rx.try_recv().unwrap(), StateUpdate::AuthChanged(true));
        assert_eq!(rx.try_recv().unwrap(), StateUpdate::AuthChanged(false));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn invalidate_clears_once() {
        let (session, mut rx, store) = session();
        session.set_cookie(Some("auth=a".to_string()));
        let _ = rx.try_recv();

        session.invalidate();
        session.invalidate();

        assert!(!session.is_authenticated());
        assert_eq!(store.load("uuid:1"), None);
        assert_eq!(rx.try_recv().unwrap(), StateUpdate::AuthChanged(false));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn writes_through_to_store() {
        let (session, _rx, store) = session();
        session.set_cookie(Some("auth=a".to_string()));
        assert_eq!(store.load("uuid:1"), Some("auth=a".to_string()));

        session.set_cookie(Some("auth=b".to_string()));
        assert_eq!(store.load("uuid:1"), Some("auth=b".to_string()));
    }

    #[test]
    fn require_authenticated_gates_on_cookie() {
        let (session, _rx, _) = session();
        assert!(matches!(
            session.require_authenticated(),
            Err(BraviaError::NotAuthenticated)
        ));

        session.set_cookie(Some("auth=a".to_string()));
        assert!(session.require_authenticated().is_ok());
    }
}
