//! Circular dependency detection infrastructure.

use std::cell::RefCell;
use std::fmt;
use std::panic;

use smallvec::SmallVec;

use crate::key::Key;

const MAX_DEPTH: usize = 1024;

/// One in-flight resolution: which registry, which slot.
#[derive(Clone, Copy)]
struct Frame {
    registry: u64,
    key: Key,
    name: &'static str,
}

// Thread-local resolution stack for circular dependency detection
thread_local! {
    static RESOLUTION_STACK: RefCell<SmallVec<[Frame; 8]>> = RefCell::new(SmallVec::new());
}

/// Panic payload for circular dependency detection.
///
/// A producer that (directly or through other factories) resolves the slot
/// it is producing would recurse forever. The registry stops at the second
/// entry and panics with this payload carrying the slot names on the way.
///
/// Example path: `["Service", "Repository", "Service"]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CircularDependency {
    /// Slot names from the first entry of the repeated slot to the repeat.
    pub path: Box<[&'static str]>,
}

impl fmt::Display for CircularDependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "circular dependency: {}", self.path.join(" -> "))
    }
}

/// Marks a slot as being resolved on this thread for the guard's lifetime.
pub(crate) struct ResolutionGuard {
    _private: (),
}

impl ResolutionGuard {
    pub(crate) fn enter(registry: u64, key: Key, name: &'static str) -> Self {
        RESOLUTION_STACK.with(|stack| {
            let mut stack = stack.borrow_mut();

            if let Some(start) = stack
                .iter()
                .position(|f| f.registry == registry && f.key == key)
            {
                let mut path: Vec<&'static str> = stack[start..].iter().map(|f| f.name).collect();
                path.push(name);
                tracing::error!(path = ?path, "circular dependency detected");
                drop(stack);
                panic::panic_any(CircularDependency {
                    path: path.into_boxed_slice(),
                });
            }

            if stack.len() >= MAX_DEPTH {
                let depth = stack.len();
                drop(stack);
                panic!("maximum resolution depth {} exceeded while resolving {}", depth, name);
            }

            stack.push(Frame {
                registry,
                key,
                name,
            });
        });

        Self { _private: () }
    }
}

impl Drop for ResolutionGuard {
    fn drop(&mut self) {
        RESOLUTION_STACK.with(|stack| {
            stack.borrow_mut().pop();
        });
    }
}
