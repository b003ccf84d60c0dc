use crate::event::Event;
use std::fmt;
use std::sync::Arc;

type Callback<P> = dyn Fn(&Event<P>) -> anyhow::Result<()> + Send + Sync;

/// A callback registered on a bus.
///
/// Identity is the shared allocation: clones of one `Listener` count as the
/// same listener, so registering a clone twice for one event type stores it
/// once. Two separate `Listener::new` calls are always distinct.
pub struct Listener<P> {
    callback: Arc<Callback<P>>,
    // Address of the allocation this listener was first created around. An
    // adapter built with `wrapping` inherits it and keeps that allocation alive.
    identity: usize,
}

impl<P: 'static> Listener<P> {
    /// Wraps a callback that cannot fail. A panic inside it unwinds through `emit`.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Event<P>) + Send + Sync + 'static,
    {
        Self::fallible(move |event| {
            f(event);
            Ok(())
        })
    }

    /// Wraps a callback whose error is reported to the caller of `emit`.
    pub fn fallible<F>(f: F) -> Self
    where
        F: Fn(&Event<P>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let callback: Arc<Callback<P>> = Arc::new(f);
        let identity = Arc::as_ptr(&callback) as *const () as usize;
        Self { callback, identity }
    }

    /// Adapts `inner` to events of another payload type while keeping its identity.
    pub(crate) fn wrapping<Q, F>(inner: &Listener<Q>, f: F) -> Self
    where
        Q: 'static,
        F: Fn(&Listener<Q>, &Event<P>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let captured = inner.clone();
        let callback: Arc<Callback<P>> = Arc::new(move |event: &Event<P>| f(&captured, event));
        Self {
            callback,
            identity: inner.identity,
        }
    }
}

impl<P> Listener<P> {
    pub fn same(a: &Self, b: &Self) -> bool {
        a.identity == b.identity
    }

    pub(crate) fn call(&self, event: &Event<P>) -> anyhow::Result<()> {
        (self.callback)(event)
    }
}

impl<P> Clone for Listener<P> {
    fn clone(&self) -> Self {
        Self {
            callback: Arc::clone(&self.callback),
            identity: self.identity,
        }
    }
}

impl<P> fmt::Debug for Listener<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listener")
            .field("identity", &format_args!("{:#x}", self.identity))
            .finish()
    }
}
