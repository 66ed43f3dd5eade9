//! Driven port through which the navigation guard changes the visible view.

use crate::domain::navigation::Route;

/// Router abstraction owned by the presentation layer.
#[cfg_attr(test, mockall::automock)]
pub trait Navigator: Send + Sync {
    /// Replace the current view with `route`.
    fn redirect(&self, route: Route);
}
