use glance_types::{Model, PresenterHandle, Target};
use shared::GlanceError;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};
use tracing::{debug, trace};

use crate::fingerprint::Fingerprint;
use crate::presenter::Presenter;

/// What `attach` did with the target's presenter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachOutcome {
    /// The target had no presenter; one was built.
    Created,
    /// The request matched; the existing presenter got the model.
    Reused,
    /// The request differed; the old presenter was cleared and replaced.
    Replaced,
}

struct Association {
    target: Weak<dyn Target>,
    presenter: Weak<dyn PresenterHandle>,
    fingerprint: Fingerprint,
}

/// Remembers the fingerprint each target was last attached with.
///
/// Holds targets and presenters weakly; entries for dropped targets are pruned
/// on the next `attach` or `cancel`.
#[derive(Default)]
pub struct TargetTracker {
    entries: RefCell<HashMap<usize, Association>>,
}

fn key(target: &Rc<dyn Target>) -> usize {
    Rc::as_ptr(target) as *const () as usize
}

impl TargetTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn prune(&self) {
        self.entries
            .borrow_mut()
            .retain(|_, association| association.target.strong_count() > 0);
    }

    /// Bind `model` to `target`, reusing its presenter when `fingerprint`
    /// matches the previous request and building one with `build` otherwise.
    pub fn attach<M, F>(
        &self,
        target: &Rc<dyn Target>,
        fingerprint: Fingerprint,
        build: F,
        model: M,
    ) -> Result<AttachOutcome, GlanceError>
    where
        M: Model,
        F: FnOnce(Weak<dyn Target>) -> Result<Rc<Presenter<M>>, GlanceError>,
    {
        self.prune();
        let key = key(target);
        let bound = target.presenter();

        if let Some(presenter) = self.reusable::<M>(key, &fingerprint, bound.as_ref()) {
            debug!("Reusing {} for {:?}", presenter.id(), model);
            presenter.set_model(model)?;
            return Ok(AttachOutcome::Reused);
        }

        self.entries.borrow_mut().remove(&key);
        let replaced = match bound {
            Some(previous) => {
                debug!("Replacing {} ({})", previous.id(), previous.state());
                previous.clear();
                target.set_presenter(None);
                true
            }
            None => false,
        };

        let presenter = build(Rc::downgrade(target))?;
        let handle: Rc<dyn PresenterHandle> = presenter.clone();
        target.set_presenter(Some(handle.clone()));
        self.entries.borrow_mut().insert(
            key,
            Association {
                target: Rc::downgrade(target),
                presenter: Rc::downgrade(&handle),
                fingerprint,
            },
        );
        trace!("Bound {} to target {:#x}", presenter.id(), key);

        presenter.set_model(model)?;
        Ok(if replaced {
            AttachOutcome::Replaced
        } else {
            AttachOutcome::Created
        })
    }

    fn reusable<M: Model>(
        &self,
        key: usize,
        fingerprint: &Fingerprint,
        bound: Option<&Rc<dyn PresenterHandle>>,
    ) -> Option<Rc<Presenter<M>>> {
        let bound = bound?;
        if bound.is_cleared() {
            return None;
        }

        {
            let entries = self.entries.borrow();
            let association = entries.get(&key)?;
            if association.fingerprint != *fingerprint {
                return None;
            }
            let recorded = association.presenter.upgrade()?;
            if !std::ptr::addr_eq(Rc::as_ptr(&recorded), Rc::as_ptr(bound)) {
                return None;
            }
        }

        bound.clone().into_any().downcast::<Presenter<M>>().ok()
    }

    /// Clear and detach the target's presenter. Returns whether an active
    /// presenter was cancelled.
    pub fn cancel(&self, target: &Rc<dyn Target>) -> bool {
        self.prune();
        self.entries.borrow_mut().remove(&key(target));

        let Some(presenter) = target.presenter() else {
            return false;
        };

        let active = !presenter.is_cleared();
        presenter.clear();
        target.set_presenter(None);
        debug!("Cancelled {}", presenter.id());
        active
    }

    /// The fingerprint `target` was last attached with, if it still has a presenter.
    pub fn fingerprint(&self, target: &Rc<dyn Target>) -> Option<Fingerprint> {
        self.entries
            .borrow()
            .get(&key(target))
            .map(|association| association.fingerprint.clone())
    }

    /// Live associations.
    pub fn len(&self) -> usize {
        self.prune();
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for TargetTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TargetTracker")
            .field("entries", &self.entries.borrow().len())
            .finish()
    }
}
