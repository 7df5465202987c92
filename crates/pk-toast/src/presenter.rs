//! Toast rendering and timed dismissal.

use crate::Notifier;
use crate::config::ToastConfig;
use crate::severity::Severity;
use crate::surface::ToastSurface;
use pk_core::PageResult;
use pk_dom::Document;
use pk_dom::NodeId;
use pk_dom::SharedDocument;
use pk_timer::TaskHandle;
use pk_timer::TimerQueue;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::time::Duration;

/// Identifier of a toast, increasing in call order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ToastId(u64);

/// Lifecycle stage of a toast that is still attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastPhase {
    Visible,
    Leaving,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ToastTimer {
    Fade(ToastId),
    Remove(ToastId),
}

#[derive(Debug)]
struct ToastEntry {
    node: NodeId,
    dismiss: NodeId,
    severity: Severity,
    phase: ToastPhase,
    pending: Option<TaskHandle>,
}

#[derive(Debug, Default)]
struct PresenterState {
    next_id: u64,
    timers: TimerQueue<ToastTimer>,
    entries: BTreeMap<ToastId, ToastEntry>,
}

/// Renders short-lived, dismissible notifications into a [`ToastSurface`].
#[derive(Debug)]
pub struct ToastPresenter {
    surface: ToastSurface,
    config: ToastConfig,
    state: RefCell<PresenterState>,
}

impl ToastPresenter {
    pub fn new(surface: ToastSurface, config: ToastConfig) -> PageResult<Self> {
        config.validate()?;
        Ok(Self {
            surface,
            config,
            state: RefCell::new(PresenterState::default()),
        })
    }

    /// Builds a presenter with default settings over `document`.
    pub fn for_document(document: SharedDocument) -> Self {
        let config = ToastConfig::default();
        Self {
            surface: ToastSurface::new(document, &config),
            config,
            state: RefCell::new(PresenterState::default()),
        }
    }

    /// Appends a toast to the container and schedules its exit.
    pub fn present(&self, message: &str, severity: Severity) -> ToastId {
        let mut state = self.state.borrow_mut();
        state.next_id += 1;
        let id = ToastId(state.next_id);

        let built = {
            let mut document = self.surface.document().borrow_mut();
            self.build_entry(&mut document, message, severity)
        };

        match built {
            Ok((node, dismiss)) => {
                let handle = state
                    .timers
                    .schedule_after(self.config.display_duration(), ToastTimer::Fade(id));
                state.entries.insert(
                    id,
                    ToastEntry {
                        node,
                        dismiss,
                        severity,
                        phase: ToastPhase::Visible,
                        pending: Some(handle),
                    },
                );
                tracing::debug!(toast_id = id.0, severity = severity.as_str(), "presented toast");
            }
            Err(error) => {
                tracing::error!(toast_id = id.0, %error, "failed to render toast");
            }
        }

        id
    }

    /// Removes a toast immediately and cancels its pending exit task.
    pub fn dismiss(&self, id: ToastId) -> bool {
        let mut state = self.state.borrow_mut();
        let Some(entry) = state.entries.remove(&id) else {
            return false;
        };

        if let Some(handle) = entry.pending {
            state.timers.cancel(handle);
        }

        let removed = self.discard(entry.node);
        tracing::debug!(toast_id = id.0, "dismissed toast");
        removed
    }

    /// Dispatches a click on `node`. Clicking a dismiss control dismisses its toast.
    pub fn activate(&self, node: NodeId) -> bool {
        let target = self
            .state
            .borrow()
            .entries
            .iter()
            .find(|(_, entry)| entry.dismiss == node)
            .map(|(id, _)| *id);

        match target {
            Some(id) => self.dismiss(id),
            None => false,
        }
    }

    /// Moves the presenter clock forward, running every exit step that falls due.
    pub fn advance(&self, elapsed: Duration) {
        let mut state = self.state.borrow_mut();
        let target = state.timers.now().saturating_add(elapsed);

        while let Some(due) = state.timers.pop_until(target) {
            match due.task {
                ToastTimer::Fade(id) => self.start_exit(&mut state, id),
                ToastTimer::Remove(id) => self.finish_exit(&mut state, id),
            }
        }

        state.timers.advance_to(target);
    }

    /// Time until the next scheduled exit step.
    pub fn next_deadline(&self) -> Option<Duration> {
        self.state.borrow().timers.next_deadline()
    }

    /// Toasts still attached, in call order.
    pub fn active_toasts(&self) -> Vec<ToastId> {
        self.state.borrow().entries.keys().copied().collect()
    }

    pub fn toast_node(&self, id: ToastId) -> Option<NodeId> {
        self.state.borrow().entries.get(&id).map(|entry| entry.node)
    }

    pub fn dismiss_control(&self, id: ToastId) -> Option<NodeId> {
        self.state.borrow().entries.get(&id).map(|entry| entry.dismiss)
    }

    pub fn phase(&self, id: ToastId) -> Option<ToastPhase> {
        self.state.borrow().entries.get(&id).map(|entry| entry.phase)
    }

    pub fn severity(&self, id: ToastId) -> Option<Severity> {
        self.state.borrow().entries.get(&id).map(|entry| entry.severity)
    }

    fn build_entry(
        &self,
        document: &mut Document,
        message: &str,
        severity: Severity,
    ) -> PageResult<(NodeId, NodeId)> {
        let container = self.surface.ensure_container(document)?;

        let toast = document.create_element("div")?;
        document.add_class(toast, &self.config.entry_class)?;
        if severity.is_error() {
            document.add_class(toast, &self.config.error_class)?;
        }
        document.set_attribute(toast, "role", "status")?;

        let body = document.create_element("div")?;
        document.add_class(body, &self.config.body_class)?;

        let icon = document.create_element("span")?;
        let glyph = match severity {
            Severity::Error => &self.config.error_icon,
            Severity::Success => &self.config.success_icon,
        };
        document.set_text(icon, glyph)?;

        let text = document.create_element("span")?;
        if self.config.render_markup {
            document.set_inner_html(text, message)?;
        } else {
            document.set_text(text, message)?;
        }

        let dismiss = document.create_element("button")?;
        document.add_class(dismiss, &self.config.dismiss_class)?;
        document.set_attribute(dismiss, "type", "button")?;
        document.set_text(dismiss, &self.config.dismiss_label)?;

        document.append_child(body, icon)?;
        document.append_child(body, text)?;
        document.append_child(toast, body)?;
        document.append_child(toast, dismiss)?;
        document.append_child(container, toast)?;

        Ok((toast, dismiss))
    }

    fn start_exit(&self, state: &mut PresenterState, id: ToastId) {
        let handle = state
            .timers
            .schedule_after(self.config.exit_transition(), ToastTimer::Remove(id));
        let Some(entry) = state.entries.get_mut(&id) else {
            state.timers.cancel(handle);
            return;
        };

        entry.phase = ToastPhase::Leaving;
        entry.pending = Some(handle);

        let styled = apply_exit_styles(&mut self.surface.document().borrow_mut(), entry.node);
        if let Err(error) = styled {
            tracing::warn!(toast_id = id.0, %error, "failed to apply exit transition");
        }
        tracing::debug!(toast_id = id.0, "toast leaving");
    }

    fn finish_exit(&self, state: &mut PresenterState, id: ToastId) {
        let Some(entry) = state.entries.remove(&id) else {
            return;
        };

        let removed = self.discard(entry.node);
        tracing::debug!(toast_id = id.0, removed, "toast expired");
    }

    /// Detaches a toast element and frees its subtree. Returns whether it was attached.
    fn discard(&self, node: NodeId) -> bool {
        let mut document = self.surface.document().borrow_mut();
        let removed = document.remove(node);
        if let Err(error) = document.release(node) {
            tracing::warn!(%error, "failed to release toast element");
        }
        removed
    }
}

fn apply_exit_styles(document: &mut Document, node: NodeId) -> PageResult<()> {
    document.set_style(node, "opacity", "0")?;
    document.set_style(node, "transform", "translateX(100%)")
}

impl Notifier for ToastPresenter {
    fn notify(&self, message: &str, severity: Severity) {
        self.present(message, severity);
    }
}

#[cfg(test)]
mod tests {
    use super::ToastPhase;
    use super::ToastPresenter;
    use crate::config::ToastConfig;
    use crate::severity::Severity;
    use crate::surface::ToastSurface;
    use pk_dom::Document;
    use pk_dom::SharedDocument;
    use std::time::Duration;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    fn presenter() -> (SharedDocument, ToastPresenter) {
        let document = Document::new("test page").into_shared();
        let presenter = ToastPresenter::for_document(document.clone());
        (document, presenter)
    }

    #[test]
    fn container_is_created_once_for_many_toasts() {
        let (document, presenter) = presenter();
        let ids: Vec<_> = (0..5)
            .map(|index| presenter.present(&format!("message {index}"), Severity::Success))
            .collect();

        let page = document.borrow();
        let body_children = page.children(page.body());
        assert_eq!(body_children.len(), 1);

        let container = body_children[0];
        assert_eq!(page.element_by_id("toast-container"), Some(container));

        let nodes: Vec<_> = ids.iter().filter_map(|id| presenter.toast_node(*id)).collect();
        assert_eq!(page.children(container), nodes.as_slice());
        assert_eq!(presenter.active_toasts(), ids);
    }

    #[test]
    fn success_toast_uses_success_icon_without_error_marker() {
        let (document, presenter) = presenter();
        let id = presenter.present("Saved", Severity::from_name("info"));

        let page = document.borrow();
        let node = match presenter.toast_node(id) {
            Some(value) => value,
            None => panic!("toast was not rendered"),
        };
        let html = page.outer_html(node);
        assert!(html.contains("\u{2705}"));
        assert!(!html.contains("\u{26A0}"));
        assert!(page.element(node).is_some_and(|element| {
            element.has_class("acid-toast") && !element.has_class("error")
        }));
    }

    #[test]
    fn error_toast_uses_error_icon_and_marker() {
        let (document, presenter) = presenter();
        let id = presenter.present("HTTP error! status: 500", Severity::Error);

        let page = document.borrow();
        let node = match presenter.toast_node(id) {
            Some(value) => value,
            None => panic!("toast was not rendered"),
        };
        let html = page.outer_html(node);
        assert!(html.contains("\u{26A0}\u{FE0F}"));
        assert!(html.contains("HTTP error! status: 500"));
        assert!(html.contains("[X]"));
        assert!(page.element(node).is_some_and(|element| element.has_class("error")));
    }

    #[test]
    fn message_is_inserted_as_markup_by_default() {
        let (document, presenter) = presenter();
        let id = presenter.present("<b>done</b>", Severity::Success);

        let node = presenter.toast_node(id);
        let html = node.map(|node| document.borrow().outer_html(node));
        assert!(html.is_some_and(|html| html.contains("<span><b>done</b></span>")));
    }

    #[test]
    fn message_is_escaped_when_markup_is_disabled() {
        let document = Document::empty().into_shared();
        let config = ToastConfig {
            render_markup: false,
            ..ToastConfig::default()
        };
        let surface = ToastSurface::new(document.clone(), &config);
        let presenter = match ToastPresenter::new(surface, config) {
            Ok(value) => value,
            Err(error) => panic!("{error}"),
        };

        let id = presenter.present("<img src=x>", Severity::Error);
        let html = presenter
            .toast_node(id)
            .map(|node| document.borrow().outer_html(node));
        assert!(html.is_some_and(|html| html.contains("&lt;img src=x&gt;")));
    }

    #[test]
    fn toast_fades_at_display_deadline_and_is_removed_after_transition() {
        let (document, presenter) = presenter();
        let id = presenter.present("Saved", Severity::Success);
        let node = match presenter.toast_node(id) {
            Some(value) => value,
            None => panic!("toast was not rendered"),
        };

        presenter.advance(ms(2999));
        assert_eq!(presenter.phase(id), Some(ToastPhase::Visible));
        assert!(document.borrow().is_connected(node));

        presenter.advance(ms(1));
        assert_eq!(presenter.phase(id), Some(ToastPhase::Leaving));
        {
            let page = document.borrow();
            let element = page.element(node);
            assert_eq!(element.and_then(|element| element.style("opacity")), Some("0"));
            assert_eq!(
                element.and_then(|element| element.style("transform")),
                Some("translateX(100%)")
            );
            assert!(page.is_connected(node));
        }

        presenter.advance(ms(299));
        assert!(document.borrow().is_connected(node));

        presenter.advance(ms(1));
        assert!(!document.borrow().is_connected(node));
        assert!(presenter.active_toasts().is_empty());
        assert_eq!(presenter.next_deadline(), None);
    }

    #[test]
    fn one_large_step_runs_fade_and_removal() {
        let (document, presenter) = presenter();
        let id = presenter.present("Saved", Severity::Success);
        let node = presenter.toast_node(id);

        presenter.advance(ms(10_000));
        assert!(node.is_some_and(|node| !document.borrow().is_connected(node)));
        assert_eq!(presenter.phase(id), None);
    }

    #[test]
    fn finished_toasts_free_their_elements() {
        let (document, presenter) = presenter();
        let first = presenter.present("first", Severity::Success);
        let text = presenter
            .toast_node(first)
            .map(|node| document.borrow().text_content(node));
        assert_eq!(text.as_deref(), Some("\u{2705}first[X]"));

        presenter.advance(ms(10_000));
        let baseline = document.borrow().node_count();
        assert_eq!(baseline, 2);

        for index in 0..20 {
            let id = presenter.present(&format!("message {index}"), Severity::Error);
            if index % 2 == 0 {
                assert!(presenter.dismiss(id));
            }
        }
        presenter.advance(ms(10_000));

        assert_eq!(document.borrow().node_count(), baseline);
        assert!(presenter.active_toasts().is_empty());
    }

    #[test]
    fn manual_dismissal_removes_immediately_and_cancels_timer() {
        let (document, presenter) = presenter();
        let id = presenter.present("Saved", Severity::Success);
        let dismiss = match presenter.dismiss_control(id) {
            Some(value) => value,
            None => panic!("dismiss control missing"),
        };
        let node = presenter.toast_node(id);

        assert!(presenter.activate(dismiss));
        assert!(node.is_some_and(|node| !document.borrow().is_connected(node)));
        assert_eq!(presenter.next_deadline(), None);

        presenter.advance(ms(5000));
        assert!(!presenter.dismiss(id));
        assert!(!presenter.activate(dismiss));
    }

    #[test]
    fn dismissal_during_exit_transition_is_safe() {
        let (document, presenter) = presenter();
        let id = presenter.present("Saved", Severity::Success);
        let node = presenter.toast_node(id);

        presenter.advance(ms(3100));
        assert_eq!(presenter.phase(id), Some(ToastPhase::Leaving));
        assert!(presenter.dismiss(id));

        presenter.advance(ms(1000));
        assert!(node.is_some_and(|node| !document.borrow().is_connected(node)));
    }

    #[test]
    fn removing_a_detached_toast_is_not_an_error() {
        let (document, presenter) = presenter();
        let id = presenter.present("Saved", Severity::Success);
        let node = match presenter.toast_node(id) {
            Some(value) => value,
            None => panic!("toast was not rendered"),
        };

        // Page script detaches the element behind the presenter's back.
        assert!(document.borrow_mut().remove(node));

        presenter.advance(ms(3300));
        assert!(presenter.active_toasts().is_empty());
    }

    #[test]
    fn toasts_expire_independently() {
        let (_document, presenter) = presenter();
        let first = presenter.present("first", Severity::Success);
        presenter.advance(ms(1000));
        let second = presenter.present("second", Severity::Error);

        presenter.advance(ms(2300));
        assert_eq!(presenter.active_toasts(), vec![second]);
        assert_eq!(presenter.phase(first), None);

        presenter.advance(ms(1000));
        assert!(presenter.active_toasts().is_empty());
    }

    #[test]
    fn invalid_config_is_rejected() {
        let document = Document::empty().into_shared();
        let config = ToastConfig {
            container_id: String::new(),
            ..ToastConfig::default()
        };
        let surface = ToastSurface::new(document, &config);
        assert!(ToastPresenter::new(surface, config).is_err());
    }
}
