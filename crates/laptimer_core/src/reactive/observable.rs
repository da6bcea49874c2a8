use log::warn;
use std::any::Any;
use std::cell::RefCell;
use std::fmt::{Debug, Formatter};
use std::rc::{Rc, Weak};

struct Slot<T> {
    callback: RefCell<Box<dyn FnMut(&T)>>,
}

/// Shared, single-threaded event emitter.
///
/// Cloning an `Observable` yields another handle to the same subscriber list,
/// so a UI button and the controller binding it can hold separate handles.
pub struct Observable<T> {
    subscribers: Rc<RefCell<Vec<Weak<Slot<T>>>>>,
}

impl<T: 'static> Observable<T> {
    pub fn new() -> Self {
        Self {
            subscribers: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// Registers `callback` and returns the guard that keeps it alive.
    #[must_use = "dropping the subscription unsubscribes immediately"]
    pub fn subscribe(&self, callback: impl FnMut(&T) + 'static) -> Subscription {
        let slot = Rc::new(Slot {
            callback: RefCell::new(Box::new(callback)),
        });
        self.subscribers.borrow_mut().push(Rc::downgrade(&slot));
        Subscription { _slot: slot }
    }

    /// Delivers `value` to every live subscriber and returns how many ran.
    ///
    /// The subscriber list is not borrowed while callbacks run, so callbacks
    /// may subscribe, unsubscribe or emit on this observable.
    pub fn emit(&self, value: &T) -> usize {
        let live = {
            let mut subscribers = self.subscribers.borrow_mut();
            subscribers.retain(|slot| slot.strong_count() > 0);
            subscribers
                .iter()
                .filter_map(Weak::upgrade)
                .collect::<Vec<_>>()
        };

        let mut delivered = 0;
        for slot in live {
            match slot.callback.try_borrow_mut() {
                Ok(mut callback) => {
                    (*callback)(value);
                    delivered += 1;
                }
                Err(_) => {
                    warn!("event=observable_emit module=reactive status=skipped reason=reentrant");
                }
            }
        }
        delivered
    }

    /// Number of subscribers whose guard is still alive.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .borrow()
            .iter()
            .filter(|slot| slot.strong_count() > 0)
            .count()
    }
}

impl<T: 'static> Default for Observable<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            subscribers: Rc::clone(&self.subscribers),
        }
    }
}

impl<T> Debug for Observable<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Observable")
            .field("subscribers", &self.subscribers.borrow().len())
            .finish()
    }
}

/// Keeps one callback registered. Dropping it unsubscribes.
pub struct Subscription {
    _slot: Rc<dyn Any>,
}

impl Subscription {
    /// Unsubscribes now. Equivalent to dropping the guard.
    pub fn cancel(self) {}
}

impl Debug for Subscription {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("Subscription")
    }
}
