//! Interaction Registry
//!
//! Bookkeeping for clickable objects and the hit-test dispatch that fires them.
//!
//! # Overview
//!
//! Each registered object owns exactly one entry `{ callback, once, active,
//! triggered }`, keyed by a [`RegistrationId`] handed out at registration.
//! Registering the same object again replaces its entry (and invalidates
//! the old handle).
//!
//! [`InteractionRegistry::dispatch`] fires at most one callback per call:
//!
//! 1. Candidates are entries that are active, shown, and not spent
//!    (a `once` entry that already fired).
//! 2. The ray is tested against the full hierarchy of every candidate and
//!    the nearest hit wins.
//! 3. From the hit node the ancestor chain is walked to the first registered
//!    node, whose callback receives `(hit node, hit)`.
//!
//! Callbacks return a value of type `A` that `dispatch` hands back to the
//! caller, so a callback can request work (such as a scene change) without
//! holding a reference to whoever performs it.

use rustc_hash::FxHashMap;
use slotmap::{SlotMap, new_key_type};

use crate::interaction::ray::{RayHit, raycast};
use crate::scene::{NodeHandle, Ray, Scene};

new_key_type! {
    pub struct RegistrationId;
}

pub type InteractionCallback<A> = Box<dyn FnMut(NodeHandle, &RayHit) -> A>;

struct Registration<A> {
    object: NodeHandle,
    callback: InteractionCallback<A>,
    once: bool,
    active: bool,
    triggered: bool,
}

impl<A> Registration<A> {
    #[inline]
    fn is_live(&self) -> bool {
        self.active && !(self.once && self.triggered)
    }
}

/// Snapshot of an entry's flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistrationState {
    pub once: bool,
    pub active: bool,
    pub triggered: bool,
}

/// Control handle returned by [`InteractionRegistry::register`].
///
/// Stale after the entry is removed or replaced; operations through a
/// stale handle do nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InteractionHandle {
    id: RegistrationId,
    object: NodeHandle,
}

impl InteractionHandle {
    #[inline]
    #[must_use]
    pub fn id(&self) -> RegistrationId {
        self.id
    }

    #[inline]
    #[must_use]
    pub fn object(&self) -> NodeHandle {
        self.object
    }
}

/// Outcome of a dispatch that fired a callback.
#[derive(Debug, Clone, PartialEq)]
pub struct Dispatched<A> {
    pub id: RegistrationId,
    /// The registered object whose callback fired.
    pub object: NodeHandle,
    pub hit: RayHit,
    pub value: A,
}

pub struct InteractionRegistry<A = ()> {
    entries: SlotMap<RegistrationId, Registration<A>>,
    by_object: FxHashMap<NodeHandle, RegistrationId>,
}

impl<A> InteractionRegistry<A> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: SlotMap::with_key(),
            by_object: FxHashMap::default(),
        }
    }

    /// Makes `object` clickable. Replaces any existing entry for the object.
    pub fn register(
        &mut self,
        object: NodeHandle,
        callback: impl FnMut(NodeHandle, &RayHit) -> A + 'static,
        once: bool,
    ) -> InteractionHandle {
        if let Some(old) = self.by_object.remove(&object) {
            self.entries.remove(old);
        }
        let id = self.entries.insert(Registration {
            object,
            callback: Box::new(callback),
            once,
            active: true,
            triggered: false,
        });
        self.by_object.insert(object, id);
        InteractionHandle { id, object }
    }

    /// Re-allows hit-testing. Returns `false` for a stale handle.
    pub fn enable(&mut self, handle: InteractionHandle) -> bool {
        self.set_active(handle, true)
    }

    /// Suppresses hit-testing without removing the entry.
    pub fn disable(&mut self, handle: InteractionHandle) -> bool {
        self.set_active(handle, false)
    }

    pub fn remove(&mut self, handle: InteractionHandle) -> bool {
        if self.entries.remove(handle.id).is_none() {
            return false;
        }
        if self.by_object.get(&handle.object) == Some(&handle.id) {
            self.by_object.remove(&handle.object);
        }
        true
    }

    fn set_active(&mut self, handle: InteractionHandle, active: bool) -> bool {
        match self.entries.get_mut(handle.id) {
            Some(entry) => {
                entry.active = active;
                true
            }
            None => false,
        }
    }

    // ========================================================================
    // Dispatch
    // ========================================================================

    fn candidates<'a>(&'a self, scene: &'a Scene) -> impl Iterator<Item = NodeHandle> + 'a {
        self.entries
            .values()
            .filter(move |e| e.is_live() && scene.is_shown(e.object))
            .map(|e| e.object)
    }

    /// Nearest hit among live, shown entries. Fires nothing.
    #[must_use]
    pub fn probe(&self, scene: &Scene, ray: &Ray) -> Option<RayHit> {
        raycast(scene, self.candidates(scene), ray).into_iter().next()
    }

    /// Hit-tests `ray` and fires at most one callback.
    pub fn dispatch(&mut self, scene: &Scene, ray: &Ray) -> Option<Dispatched<A>> {
        let Some(hit) = self.probe(scene, ray) else {
            log::debug!("Dispatch missed every interactive object");
            return None;
        };

        let (object, id) = scene
            .ancestors(hit.node)
            .find_map(|h| self.by_object.get(&h).map(|&id| (h, id)))?;

        let entry = self.entries.get_mut(id)?;
        if !entry.is_live() {
            return None;
        }

        let value = (entry.callback)(hit.node, &hit);
        if entry.once {
            entry.triggered = true;
        }

        Some(Dispatched { id, object, hit, value })
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Scene-clear sweep: drops entries whose object is no longer shown,
    /// unless `keep` vouches for it. Returns the number removed.
    pub fn prune(&mut self, scene: &Scene, keep: impl Fn(NodeHandle) -> bool) -> usize {
        let stale: Vec<RegistrationId> = self
            .entries
            .iter()
            .filter(|(_, e)| !scene.is_shown(e.object) && !keep(e.object))
            .map(|(id, _)| id)
            .collect();

        for id in &stale {
            if let Some(entry) = self.entries.remove(*id) {
                self.by_object.remove(&entry.object);
            }
        }
        log::debug!("Pruned {} interactions, {} remaining", stale.len(), self.entries.len());
        stale.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.by_object.clear();
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn is_registered(&self, object: NodeHandle) -> bool {
        self.by_object.contains_key(&object)
    }

    #[must_use]
    pub fn entry(&self, object: NodeHandle) -> Option<RegistrationState> {
        let id = self.by_object.get(&object)?;
        self.entries.get(*id).map(|e| RegistrationState {
            once: e.once,
            active: e.active,
            triggered: e.triggered,
        })
    }
}

impl<A> Default for InteractionRegistry<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> std::fmt::Debug for InteractionRegistry<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InteractionRegistry")
            .field("entries", &self.entries.len())
            .finish()
    }
}
