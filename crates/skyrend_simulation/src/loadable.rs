//! Load/unload lifecycle shared by everything that owns a visual resource
//! (character rigs, weapon models, inventory slots).
//!
//! The contract:
//! - `load` is a no-op when already loaded; the immediate hook may refuse
//!   (recoverable: state stays unloaded, nothing is reported)
//! - `unload` is symmetric
//! - `reload` captures the prior state and only re-loads if it was loaded
//!   before or the caller forces it
//!
//! Transitions are *returned*, not broadcast: the owning system converts a
//! `LoadTransition` into its typed event (`CharacterLoadChanged`,
//! `WeaponLoadChanged`), so an event fires exactly when state actually
//! changed and never redundantly.

/// An actual load-state change. `None` from [`Loadable::load`]/[`Loadable::unload`]
/// means nothing happened (already in that state, or the hook refused).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadTransition {
    Loaded,
    Unloaded,
}

impl LoadTransition {
    pub fn is_loaded(self) -> bool {
        matches!(self, LoadTransition::Loaded)
    }
}

pub trait Loadable {
    fn is_loaded(&self) -> bool;

    /// Flips the stored flag only. Called by the provided methods after the
    /// immediate hook succeeded; implementors just store the bool.
    fn set_loaded_flag(&mut self, loaded: bool);

    /// Loads the resource immediately, without checking the current state.
    /// Returns false if the resource could not be produced (recoverable).
    fn load_immediate(&mut self) -> bool;

    /// Unloads the resource immediately, without checking the current state.
    fn unload_immediate(&mut self) -> bool;

    fn load(&mut self) -> Option<LoadTransition> {
        if self.is_loaded() {
            return None;
        }
        if !self.load_immediate() {
            return None;
        }
        self.set_loaded_flag(true);
        Some(LoadTransition::Loaded)
    }

    fn unload(&mut self) -> Option<LoadTransition> {
        if !self.is_loaded() {
            return None;
        }
        if !self.unload_immediate() {
            return None;
        }
        self.set_loaded_flag(false);
        Some(LoadTransition::Unloaded)
    }

    /// Unload-then-load cycle. Both transitions (if any) are reported in
    /// order so callers can forward each as an event.
    fn reload(&mut self, force_load: bool) -> Vec<LoadTransition> {
        let was_loaded = self.is_loaded();
        let mut transitions = Vec::new();

        if let Some(t) = self.unload() {
            transitions.push(t);
        }
        if was_loaded || force_load {
            if let Some(t) = self.load() {
                transitions.push(t);
            }
        }
        transitions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Minimal loadable: counts hook invocations, can be told to fail.
    struct Probe {
        loaded: bool,
        fail_load: bool,
        load_calls: u32,
        unload_calls: u32,
    }

    impl Probe {
        fn new() -> Self {
            Self {
                loaded: false,
                fail_load: false,
                load_calls: 0,
                unload_calls: 0,
            }
        }
    }

    impl Loadable for Probe {
        fn is_loaded(&self) -> bool {
            self.loaded
        }
        fn set_loaded_flag(&mut self, loaded: bool) {
            self.loaded = loaded;
        }
        fn load_immediate(&mut self) -> bool {
            self.load_calls += 1;
            !self.fail_load
        }
        fn unload_immediate(&mut self) -> bool {
            self.unload_calls += 1;
            true
        }
    }

    #[test]
    fn test_double_load_single_transition() {
        let mut probe = Probe::new();

        assert_eq!(probe.load(), Some(LoadTransition::Loaded));
        assert_eq!(probe.load(), None); // already loaded, no event
        assert_eq!(probe.load_calls, 1);
    }

    #[test]
    fn test_unload_guarded() {
        let mut probe = Probe::new();

        assert_eq!(probe.unload(), None); // never loaded
        assert_eq!(probe.unload_calls, 0);

        probe.load();
        assert_eq!(probe.unload(), Some(LoadTransition::Unloaded));
        assert_eq!(probe.unload(), None);
        assert_eq!(probe.unload_calls, 1);
    }

    #[test]
    fn test_load_failure_is_recoverable() {
        let mut probe = Probe::new();
        probe.fail_load = true;

        assert_eq!(probe.load(), None);
        assert!(!probe.is_loaded());

        // Retry after the data shows up
        probe.fail_load = false;
        assert_eq!(probe.load(), Some(LoadTransition::Loaded));
    }

    #[test]
    fn test_reload_unloaded_stays_unloaded() {
        let mut probe = Probe::new();

        assert!(probe.reload(false).is_empty());
        assert!(!probe.is_loaded());
    }

    #[test]
    fn test_reload_force_loads() {
        let mut probe = Probe::new();

        let transitions = probe.reload(true);
        assert_eq!(transitions, vec![LoadTransition::Loaded]);
        assert!(probe.is_loaded());
    }

    #[test]
    fn test_reload_loaded_cycles() {
        let mut probe = Probe::new();
        probe.load();

        let transitions = probe.reload(false);
        assert_eq!(
            transitions,
            vec![LoadTransition::Unloaded, LoadTransition::Loaded]
        );
        assert!(probe.is_loaded());
    }
}
