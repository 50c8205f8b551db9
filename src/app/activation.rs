//! Binding the active combination's solution and recording its frames.
//!
//! Creating a solution touches the GPU, so it happens behind [`SolutionHost`].
//! What is left here are the session rules: a combination that fails in
//! benchmark mode is recorded as a failure and skipped, a combination that
//! failed interactively is not retried until the selection moves, and only
//! frames rendered by a bound solution reach the result store.

use tracing::{info, warn};

use crate::app::selection::SelectionStateMachine;
use crate::benchmarks::{AdvancePolicy, BenchmarkResultStore};
use crate::registry::{Registry, SelectionKey};
use crate::solutions::SolutionError;

/// Creates and releases solutions on the devices of their APIs.
pub trait SolutionHost {
    /// Makes the solution of `key` ready to render.
    fn bind(&mut self, key: SelectionKey) -> Result<(), SolutionError>;

    /// Releases the solution created for `key`.
    fn release(&mut self, key: SelectionKey);
}

/// Outcome of [`SolutionBinding::activate`] for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    /// The solution was bound on an earlier frame.
    Ready(SelectionKey),
    /// The solution was created for this frame.
    Bound(SelectionKey),
    /// Nothing can be rendered this frame.
    Idle,
}

impl Activation {
    /// The combination to render, if any.
    pub fn key(self) -> Option<SelectionKey> {
        match self {
            Activation::Ready(key) | Activation::Bound(key) => Some(key),
            Activation::Idle => None,
        }
    }
}

/// Which combination's solution currently exists, and which one last failed.
#[derive(Debug, Clone, Default)]
pub struct SolutionBinding {
    bound: Option<SelectionKey>,
    failed: Option<SelectionKey>,
}

impl SolutionBinding {
    /// Nothing bound yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes sure the active combination's solution exists.
    ///
    /// In benchmark mode a solution that cannot be created is recorded with
    /// [`BenchmarkResultStore::record_failure`] and traversal moves on until a
    /// combination binds or none is left.
    pub fn activate<H: SolutionHost>(
        &mut self,
        registry: &Registry,
        selection: &mut SelectionStateMachine,
        store: &mut BenchmarkResultStore,
        host: &mut H,
    ) -> Activation {
        loop {
            let Some(key) = selection.active_key() else {
                return Activation::Idle;
            };
            if self.bound == Some(key) {
                return Activation::Ready(key);
            }
            if self.failed == Some(key) {
                return Activation::Idle;
            }

            self.release(host);
            self.failed = None;

            let names = registry.describe(&key);
            match host.bind(key) {
                Ok(()) => {
                    if selection.is_benchmark() {
                        let (index, total) = selection.progress();
                        info!(selection = %names, "running {}/{}", index + 1, total);
                    } else {
                        info!(selection = %names, "solution ready");
                    }
                    self.bound = Some(key);
                    return Activation::Bound(key);
                }
                Err(err) if selection.is_benchmark() => {
                    warn!(selection = %names, "solution failed, skipping: {err}");
                    store.record_failure(key);
                    selection.skip();
                }
                Err(err) => {
                    warn!(selection = %names, "solution failed: {err}");
                    self.failed = Some(key);
                    return Activation::Idle;
                }
            }
        }
    }

    fn release<H: SolutionHost>(&mut self, host: &mut H) {
        if let Some(previous) = self.bound.take() {
            host.release(previous);
        }
    }
}

/// Records a finished frame of `ready` and advances benchmark traversal once
/// `policy` is satisfied.
///
/// Frames rendered without a bound solution (`ready` is `None`) are not
/// recorded. Returns `true` when traversal moved on.
pub fn record_frame(
    ready: Option<SelectionKey>,
    frame_seconds: f64,
    work: u64,
    store: &mut BenchmarkResultStore,
    selection: &mut SelectionStateMachine,
    policy: &AdvancePolicy,
) -> bool {
    let Some(key) = ready else {
        return false;
    };
    store.record_frame(key, frame_seconds, work);
    selection.advance_if_satisfied(store.get(&key), policy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::selection::{NavigationCommand, SelectionMode};
    use crate::benchmarks::build_rows;

    #[derive(Default)]
    struct MockHost {
        failing: Vec<SelectionKey>,
        binds: Vec<SelectionKey>,
        releases: Vec<SelectionKey>,
    }

    impl SolutionHost for MockHost {
        fn bind(&mut self, key: SelectionKey) -> Result<(), SolutionError> {
            self.binds.push(key);
            if self.failing.contains(&key) {
                return Err(SolutionError::Unknown("broken".to_string()));
            }
            Ok(())
        }

        fn release(&mut self, key: SelectionKey) {
            self.releases.push(key);
        }
    }

    struct Session {
        registry: Registry,
        selection: SelectionStateMachine,
        store: BenchmarkResultStore,
        binding: SolutionBinding,
        host: MockHost,
    }

    impl Session {
        // Combinations: GL/Fast, GL/Slow, Vulkan/Fast, Vulkan/Slow.
        fn new(mode: SelectionMode) -> Self {
            let registry = Registry::new(
                ["Vulkan", "GL"],
                [("Cubes".to_string(), vec!["Slow", "Fast"])],
            );
            let selection = SelectionStateMachine::new(mode, &registry);
            Self {
                registry,
                selection,
                store: BenchmarkResultStore::new(),
                binding: SolutionBinding::new(),
                host: MockHost::default(),
            }
        }

        fn key(&self, index: usize) -> SelectionKey {
            self.registry.combinations()[index]
        }

        fn activate(&mut self) -> Activation {
            self.binding.activate(
                &self.registry,
                &mut self.selection,
                &mut self.store,
                &mut self.host,
            )
        }

        fn frame(&mut self, ready: Option<SelectionKey>, policy: &AdvancePolicy) -> bool {
            record_frame(ready, 0.01, 1, &mut self.store, &mut self.selection, policy)
        }
    }

    #[test]
    fn bound_solution_is_reused_across_frames() {
        let mut session = Session::new(SelectionMode::Interactive);
        let first = session.key(0);

        assert_eq!(session.activate(), Activation::Bound(first));
        assert_eq!(session.activate(), Activation::Ready(first));
        assert_eq!(session.host.binds, vec![first]);
        assert_eq!(session.binding.bound, Some(first));
    }

    #[test]
    fn benchmark_failure_is_skipped_and_reported_as_na() {
        let mut session = Session::new(SelectionMode::BenchmarkTraversal);
        let policy = AdvancePolicy::MinFrames(2);
        let (gl_fast, gl_slow, vulkan_fast) = (session.key(0), session.key(1), session.key(2));
        session.host.failing.push(gl_slow);

        assert_eq!(session.activate(), Activation::Bound(gl_fast));
        assert!(!session.frame(Some(gl_fast), &policy));
        assert!(session.frame(Some(gl_fast), &policy));

        assert_eq!(session.activate(), Activation::Bound(vulkan_fast));
        assert_eq!(session.host.binds, vec![gl_fast, gl_slow, vulkan_fast]);
        assert_eq!(session.host.releases, vec![gl_fast]);
        assert_eq!(session.store.get(&gl_slow).map(|acc| acc.frame_count), Some(0));

        let rows = build_rows(&session.registry, &session.store.snapshot());
        let failed: Vec<_> = rows.iter().filter(|row| row.is_failed()).collect();
        assert_eq!(failed.len(), 1);
        assert_eq!((failed[0].api.as_str(), failed[0].solution.as_str()), ("GL", "Slow"));
    }

    #[test]
    fn benchmark_ends_when_every_remaining_solution_fails() {
        let mut session = Session::new(SelectionMode::BenchmarkTraversal);
        session.host.failing = session.registry.combinations();

        assert_eq!(session.activate(), Activation::Idle);
        assert!(session.selection.is_complete());
        assert_eq!(session.store.len(), 4);
    }

    #[test]
    fn interactive_failure_is_not_retried_until_the_selection_changes() {
        let mut session = Session::new(SelectionMode::Interactive);
        let (gl_fast, gl_slow) = (session.key(0), session.key(1));
        session.host.failing.push(gl_fast);

        assert_eq!(session.activate(), Activation::Idle);
        assert_eq!(session.activate(), Activation::Idle);
        assert_eq!(session.host.binds, vec![gl_fast]);
        assert!(session.store.is_empty());

        session.selection.navigate(NavigationCommand::NextSolution);
        assert_eq!(session.activate(), Activation::Bound(gl_slow));

        session.selection.navigate(NavigationCommand::PrevSolution);
        assert_eq!(session.activate(), Activation::Idle);
        assert_eq!(session.host.binds, vec![gl_fast, gl_slow, gl_fast]);
        assert_eq!(session.host.releases, vec![gl_slow]);
        assert_eq!(session.binding.bound, None);
    }

    #[test]
    fn frames_without_a_bound_solution_are_not_recorded() {
        let mut session = Session::new(SelectionMode::BenchmarkTraversal);
        let policy = AdvancePolicy::MinFrames(1);

        assert!(!session.frame(None, &policy));
        assert!(session.store.is_empty());
        assert_eq!(session.selection.active_key(), Some(session.key(0)));
    }

    #[test]
    fn interactive_frames_are_recorded_without_advancing() {
        let mut session = Session::new(SelectionMode::Interactive);
        let policy = AdvancePolicy::MinFrames(1);
        let key = session.activate().key().expect("bound");

        assert!(!session.frame(Some(key), &policy));
        assert!(!session.frame(Some(key), &policy));
        assert_eq!(session.store.get(&key).map(|acc| acc.frame_count), Some(2));
        assert_eq!(session.selection.active_key(), Some(key));
    }
}
