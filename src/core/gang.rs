//! Gang requests: all-or-nothing asks for a set of pools.

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll, Waker};

use parking_lot::Mutex;

use crate::core::{CoralError, PoolKey, ResourceData};

/// Data of every granted pool, keyed by category.
pub type GrantedResources = BTreeMap<String, ResourceData>;

#[derive(Debug, Default)]
struct SignalState {
    granted: bool,
    released: bool,
    resources: GrantedResources,
    waker: Option<Waker>,
}

/// A pending request for one unit of each pool in `needs`.
///
/// The completion signal fires at most once, when the library grants every
/// needed pool together.
#[derive(Debug)]
pub struct GangRequest {
    project: String,
    needs: Vec<PoolKey>,
    state: Mutex<SignalState>,
}

impl GangRequest {
    /// Create an ungranted request on behalf of `project`.
    pub fn new(project: impl Into<String>, needs: impl IntoIterator<Item = PoolKey>) -> Self {
        Self {
            project: project.into(),
            needs: needs.into_iter().collect(),
            state: Mutex::new(SignalState::default()),
        }
    }

    /// Display name of the requesting project.
    pub fn project(&self) -> &str {
        &self.project
    }

    /// Pools this request needs, one unit each.
    pub fn needs(&self) -> &[PoolKey] {
        &self.needs
    }

    /// Whether the signal has fired.
    pub fn is_granted(&self) -> bool {
        self.state.lock().granted
    }

    /// Whether the held units were handed back.
    pub fn is_released(&self) -> bool {
        self.state.lock().released
    }

    /// Resources captured at grant time (empty until granted).
    pub fn resources(&self) -> GrantedResources {
        self.state.lock().resources.clone()
    }

    /// Wait for the grant.
    pub const fn wait(&self) -> GangWait<'_> {
        GangWait { request: self }
    }

    /// Fire the completion signal with the granted pools' data.
    pub(crate) fn fire(&self, resources: GrantedResources) -> Result<(), CoralError> {
        let waker = {
            let mut state = self.state.lock();
            if state.granted {
                return Err(CoralError::SignalAlreadyFired(self.project.clone()));
            }
            state.granted = true;
            state.resources = resources;
            state.waker.take()
        };
        if let Some(waker) = waker {
            waker.wake();
        }
        Ok(())
    }

    /// Mark the request released. Returns `true` only for the first release of
    /// a granted request; anything else holds no units.
    pub(crate) fn mark_released(&self) -> bool {
        let mut state = self.state.lock();
        if !state.granted || state.released {
            return false;
        }
        state.released = true;
        true
    }
}

/// Future returned by [`GangRequest::wait`].
#[must_use = "gang waits do nothing unless awaited"]
pub struct GangWait<'a> {
    request: &'a GangRequest,
}

impl Future for GangWait<'_> {
    type Output = GrantedResources;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut state = self.request.state.lock();
        if state.granted {
            return Poll::Ready(state.resources.clone());
        }
        state.waker = Some(cx.waker().clone());
        Poll::Pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::task::Wake;

    struct CountingWaker(AtomicUsize);

    impl Wake for CountingWaker {
        fn wake(self: Arc<Self>) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn request() -> GangRequest {
        GangRequest::new("alpha", [PoolKey::new("port", "salem")])
    }

    #[test]
    fn test_fire_once_wakes_waiter() {
        let req = request();
        let counter = Arc::new(CountingWaker(AtomicUsize::new(0)));
        let waker = Waker::from(Arc::clone(&counter));
        let mut cx = Context::from_waker(&waker);

        let mut wait = req.wait();
        assert!(Pin::new(&mut wait).poll(&mut cx).is_pending());

        let mut granted = GrantedResources::new();
        granted.insert("port".into(), serde_json::json!("salem-data"));
        req.fire(granted).unwrap();
        assert_eq!(counter.0.load(Ordering::SeqCst), 1);

        match Pin::new(&mut wait).poll(&mut cx) {
            Poll::Ready(res) => assert_eq!(res["port"], serde_json::json!("salem-data")),
            Poll::Pending => panic!("wait should resolve after fire"),
        }
    }

    #[test]
    fn test_second_fire_is_rejected() {
        let req = request();
        req.fire(GrantedResources::new()).unwrap();
        let err = req.fire(GrantedResources::new()).unwrap_err();
        assert_eq!(err, CoralError::SignalAlreadyFired("alpha".into()));
        assert!(req.is_granted());
    }

    #[test]
    fn test_release_requires_grant() {
        let req = request();
        assert!(!req.mark_released());
        req.fire(GrantedResources::new()).unwrap();
        assert!(req.mark_released());
        assert!(!req.mark_released());
        assert!(req.is_released());
    }
}
