use super::Subscription;

/// Group of subscriptions released together.
///
/// Dropping the bag, or calling [`DisposeBag::dispose`], cancels every
/// subscription it holds.
#[derive(Debug, Default)]
pub struct DisposeBag {
    subscriptions: Vec<Subscription>,
}

impl DisposeBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, subscription: Subscription) {
        self.subscriptions.push(subscription);
    }

    /// Cancels every held subscription and returns how many were released.
    pub fn dispose(&mut self) -> usize {
        let released = self.subscriptions.len();
        self.subscriptions.clear();
        released
    }

    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }
}
