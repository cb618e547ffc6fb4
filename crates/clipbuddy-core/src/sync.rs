//! Keeping open views consistent with the store.
//!
//! Views never share live references into the store. Each one implements
//! [`RefreshView`] and re-queries on refresh; the registry only knows them
//! through opaque handles and weak references, so a torn-down view can never
//! be kept alive or called by the registry.

use crate::error::{BuddyError, Result};
use crate::models::Mutation;
use crate::store::{Applied, Store};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::{Rc, Weak};

/// The kinds of view that can be open. At most one of each at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ViewKind {
    QuickPaste,
    Manager,
}

impl fmt::Display for ViewKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewKind::QuickPaste => f.write_str("quick paste"),
            ViewKind::Manager => f.write_str("manager"),
        }
    }
}

/// A presentation surface that can re-render itself from the store.
pub trait RefreshView {
    fn kind(&self) -> ViewKind;

    /// Re-query the store and rebuild any derived lists.
    fn refresh(&mut self, store: &Store) -> Result<()>;
}

/// Opaque identity of a registered view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ViewHandle(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    Registered(ViewHandle),
    /// A view of this kind is already open; surface that one instead.
    AlreadyOpen(ViewHandle),
}

impl Registration {
    pub fn handle(self) -> ViewHandle {
        match self {
            Registration::Registered(handle) | Registration::AlreadyOpen(handle) => handle,
        }
    }
}

/// Outcome of a notification round.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct NotifyReport {
    pub refreshed: Vec<ViewHandle>,
    pub skipped: Vec<ViewHandle>,
}

struct Subscriber {
    kind: ViewKind,
    view: Weak<RefCell<dyn RefreshView>>,
}

/// Live views subscribed to store changes, keyed by handle.
#[derive(Default)]
pub struct ViewRegistry {
    next_id: u64,
    views: BTreeMap<ViewHandle, Subscriber>,
}

impl ViewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<V>(&mut self, view: &Rc<RefCell<V>>) -> Registration
    where
        V: RefreshView + 'static,
    {
        let kind = view.borrow().kind();
        if let Some(existing) = self.find(kind) {
            return Registration::AlreadyOpen(existing);
        }

        let handle = ViewHandle(self.next_id);
        self.next_id += 1;
        let view: Rc<RefCell<dyn RefreshView>> = view.clone();
        self.views.insert(
            handle,
            Subscriber {
                kind,
                view: Rc::downgrade(&view),
            },
        );
        tracing::debug!("registered {} view {:?}", kind, handle);
        Registration::Registered(handle)
    }

    pub fn unregister(&mut self, handle: ViewHandle) -> bool {
        let removed = self.views.remove(&handle).is_some();
        if removed {
            tracing::debug!("unregistered view {:?}", handle);
        }
        removed
    }

    /// The live view of `kind`, if any.
    pub fn find(&self, kind: ViewKind) -> Option<ViewHandle> {
        self.views
            .iter()
            .find(|(_, subscriber)| subscriber.kind == kind && subscriber.view.strong_count() > 0)
            .map(|(handle, _)| *handle)
    }

    pub fn contains(&self, handle: ViewHandle) -> bool {
        self.views.contains_key(&handle)
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }

    /// Refresh every registered view from `store`.
    ///
    /// A view that is gone, busy, or fails to refresh is skipped and the rest
    /// are still notified. Views that have been dropped are pruned.
    pub fn notify_all(&mut self, store: &Store) -> NotifyReport {
        let mut report = NotifyReport::default();
        let mut dropped = Vec::new();

        for (handle, subscriber) in &self.views {
            let Some(view) = subscriber.view.upgrade() else {
                tracing::warn!(
                    "{} view {:?} was torn down without unregistering",
                    subscriber.kind,
                    handle
                );
                dropped.push(*handle);
                report.skipped.push(*handle);
                continue;
            };
            let outcome = match view.try_borrow_mut() {
                Ok(mut view) => view.refresh(store),
                Err(_) => Err(BuddyError::Other("view is busy".to_string())),
            };
            match outcome {
                Ok(()) => report.refreshed.push(*handle),
                Err(err) => {
                    tracing::warn!(
                        "skipped refreshing {} view {:?}: {}",
                        subscriber.kind,
                        handle,
                        err
                    );
                    report.skipped.push(*handle);
                }
            }
        }

        for handle in dropped {
            self.views.remove(&handle);
        }
        report
    }
}

/// The store and the views watching it, owned together by one thread.
pub struct SnippetHub {
    store: Store,
    views: ViewRegistry,
}

impl SnippetHub {
    pub fn new(store: Store) -> Self {
        Self {
            store,
            views: ViewRegistry::new(),
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn views(&self) -> &ViewRegistry {
        &self.views
    }

    pub fn views_mut(&mut self) -> &mut ViewRegistry {
        &mut self.views
    }

    /// Register `view` and bring it up to date with the store.
    ///
    /// A view that fails its first refresh is not left registered.
    pub fn open_view<V>(&mut self, view: &Rc<RefCell<V>>) -> Result<Registration>
    where
        V: RefreshView + 'static,
    {
        let registration = self.views.register(view);
        if let Registration::Registered(handle) = registration {
            let refreshed = view.borrow_mut().refresh(&self.store);
            if let Err(err) = refreshed {
                self.views.unregister(handle);
                return Err(err);
            }
        }
        Ok(registration)
    }

    pub fn close_view(&mut self, handle: ViewHandle) -> bool {
        self.views.unregister(handle)
    }

    /// Apply `mutation`, then refresh every view.
    ///
    /// Views are refreshed after the save attempt whether or not it
    /// succeeded: a failed save still leaves the change in memory.
    pub fn commit(&mut self, mutation: Mutation) -> Result<Applied> {
        let label = mutation.describe();
        let result = self.store.apply(mutation);
        let rejected = matches!(&result, Err(err) if err.is_user_error());
        match &result {
            Ok(applied) => tracing::info!("committed {}: {:?}", label, applied),
            Err(err) if rejected => tracing::info!("rejected {}: {}", label, err),
            Err(err) => tracing::error!("{} applied but not saved: {}", label, err),
        }
        if rejected {
            return result;
        }
        let report = self.views.notify_all(&self.store);
        tracing::debug!(
            "refreshed {} views, skipped {}",
            report.refreshed.len(),
            report.skipped.len()
        );
        result
    }

    /// Refresh every view without changing anything.
    pub fn refresh_all(&mut self) -> NotifyReport {
        self.views.notify_all(&self.store)
    }
}
