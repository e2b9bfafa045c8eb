//! Observable holder for the current viewer identity.

use std::collections::BTreeMap;
use std::sync::{Arc, Weak};

use domains::{Identity, IdentityListener, IdentityService, Subscription};
use parking_lot::{Mutex, RwLock};

type SharedListener = Arc<dyn Fn(Option<Identity>) + Send + Sync>;

#[derive(Default)]
struct Inner {
    current: RwLock<Option<Identity>>,
    listeners: Mutex<Listeners>,
}

#[derive(Default)]
struct Listeners {
    next_id: u64,
    by_id: BTreeMap<u64, SharedListener>,
}

/// Identity cell with explicit subscribe / unsubscribe.
///
/// Cloning shares the same cell. Listeners run outside the internal locks,
/// in registration order, every time [`IdentityCell::set`] is called.
#[derive(Clone, Default)]
pub struct IdentityCell {
    inner: Arc<Inner>,
}

impl IdentityCell {
    pub fn new(initial: Option<Identity>) -> Self {
        let cell = Self::default();
        *cell.inner.current.write() = initial;
        cell
    }

    pub fn set(&self, identity: Option<Identity>) {
        *self.inner.current.write() = identity.clone();

        let listeners: Vec<SharedListener> =
            self.inner.listeners.lock().by_id.values().cloned().collect();
        tracing::debug!(
            signed_in = identity.is_some(),
            listeners = listeners.len(),
            "identity changed"
        );
        for listener in listeners {
            listener(identity.clone());
        }
    }

    /// Number of live subscriptions.
    pub fn listener_count(&self) -> usize {
        self.inner.listeners.lock().by_id.len()
    }
}

impl IdentityService for IdentityCell {
    fn current_user(&self) -> Option<Identity> {
        self.inner.current.read().clone()
    }

    fn on_change(&self, listener: IdentityListener) -> Subscription {
        let id = {
            let mut listeners = self.inner.listeners.lock();
            let id = listeners.next_id;
            listeners.next_id += 1;
            listeners.by_id.insert(id, Arc::from(listener));
            id
        };

        let inner: Weak<Inner> = Arc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = inner.upgrade() {
                inner.listeners.lock().by_id.remove(&id);
            }
        })
    }
}

impl std::fmt::Debug for IdentityCell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityCell")
            .field("current", &*self.inner.current.read())
            .field("listeners", &self.listener_count())
            .finish()
    }
}
