//! Process-wide engine state.

use once_cell::sync::OnceCell;
use tracing::debug;

use crate::stdlib::{Builtin, Library, standard_library};

static RUNTIME: OnceCell<Runtime> = OnceCell::new();

/// The builtin function table shared by every context.
///
/// Built once, on first use, and never mutated afterwards.
#[derive(Debug)]
pub struct Runtime {
    library: Library,
}

impl Runtime {
    /// Get the shared runtime, building it on the first call. Safe to call
    /// any number of times from any thread.
    pub fn initialize() -> &'static Runtime {
        RUNTIME.get_or_init(|| {
            let library = standard_library();
            debug!(builtins = library.len(), "runtime initialized");
            Runtime { library }
        })
    }

    pub fn builtin(&self, name: &str) -> Option<&Builtin> {
        self.library.get(name)
    }

    /// Names of all builtins, sorted.
    pub fn builtin_names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.library.keys().copied().collect();
        names.sort_unstable();
        names
    }
}
