//! Transient, dismissible page notifications.

pub mod config;
pub mod presenter;
pub mod severity;
pub mod surface;

use std::rc::Rc;

pub use config::ToastConfig;
pub use presenter::ToastId;
pub use presenter::ToastPhase;
pub use presenter::ToastPresenter;
pub use severity::Severity;
pub use surface::ToastSurface;

/// Sink for user-facing notifications.
pub trait Notifier {
    fn notify(&self, message: &str, severity: Severity);
}

impl<N: Notifier + ?Sized> Notifier for &N {
    fn notify(&self, message: &str, severity: Severity) {
        (**self).notify(message, severity);
    }
}

impl<N: Notifier + ?Sized> Notifier for Rc<N> {
    fn notify(&self, message: &str, severity: Severity) {
        (**self).notify(message, severity);
    }
}
