//! The document's event queue.
//!
//! Everything asynchronous on a page ends up here: mutation records, load
//! completions, settled `replace()` calls, responses from the background and
//! custom events. The queue is drained on a single thread, one event at a
//! time, in the order the events were queued.
use core::fmt;
use std::{
    cell::RefCell,
    collections::{HashSet, VecDeque},
    rc::Rc,
};

use tracing::debug;

use crate::css::StyleSheet;

use super::{NodeId, SheetId};

/// Continuation run once a `replace()` settled.
pub type SheetCallback = Box<dyn FnOnce(&StyleSheet)>;

pub enum PageEvent {
    /// Elements were inserted into the document.
    Mutation(Vec<NodeId>),
    /// A `<link>` finished loading its stylesheet.
    Load(NodeId),
    /// A `replace()` call is ready to swap in the new rules.
    ReplaceSettled {
        sheet: SheetId,
        text: String,
        then: Option<SheetCallback>,
    },
    /// The background answered a message.
    MessageResponse { request: String, response: String },
    /// A custom event dispatched on the document.
    Custom {
        name: String,
        detail: serde_json::Value,
    },
}

/// Shared handle to the document event queue.
///
/// Cloning the handle does not clone the queue.
#[derive(Debug, Clone, Default)]
pub struct EventBus {
    inner: Rc<RefCell<BusState>>,
}

#[derive(Debug, Default)]
struct BusState {
    queue: VecDeque<PageEvent>,
    listeners: HashSet<String>,
    observe_mutations: bool,
}

impl EventBus {
    pub fn push(&self, event: PageEvent) {
        self.inner.borrow_mut().queue.push_back(event);
    }

    pub fn pop(&self) -> Option<PageEvent> {
        self.inner.borrow_mut().queue.pop_front()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.inner.borrow().queue.len()
    }

    /// Start listening for custom events called `name`.
    pub fn add_listener(&self, name: &str) {
        self.inner.borrow_mut().listeners.insert(name.to_owned());
    }

    /// Dispatch a custom event. Nobody listening means nobody gets it.
    pub fn dispatch_custom(&self, name: &str, detail: serde_json::Value) {
        let mut state = self.inner.borrow_mut();
        if state.listeners.contains(name) {
            state.queue.push_back(PageEvent::Custom {
                name: name.to_owned(),
                detail,
            });
        } else {
            debug!("No listener for {:?}, dropping event", name);
        }
    }

    /// Report inserted elements from now on.
    pub fn observe_mutations(&self) {
        self.inner.borrow_mut().observe_mutations = true;
    }

    pub fn notify_inserted(&self, node: NodeId) {
        let mut state = self.inner.borrow_mut();
        if state.observe_mutations {
            state.queue.push_back(PageEvent::Mutation(vec![node]));
        }
    }
}

impl fmt::Debug for PageEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageEvent::Mutation(nodes) => f.debug_tuple("Mutation").field(nodes).finish(),
            PageEvent::Load(node) => f.debug_tuple("Load").field(node).finish(),
            PageEvent::ReplaceSettled { sheet, text, .. } => f
                .debug_struct("ReplaceSettled")
                .field("sheet", sheet)
                .field("text", text)
                .finish(),
            PageEvent::MessageResponse { request, response } => f
                .debug_struct("MessageResponse")
                .field("request", request)
                .field("response", response)
                .finish(),
            PageEvent::Custom { name, detail } => f
                .debug_struct("Custom")
                .field("name", name)
                .field("detail", detail)
                .finish(),
        }
    }
}
