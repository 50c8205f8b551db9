//! Which (API, problem, solution) combination is active.
//!
//! In interactive mode the user steps through problems, solutions and APIs with
//! the navigation keys; every counter wraps. In benchmark mode navigation is
//! ignored and the machine walks every registered combination in report order
//! (problem, API, solution), moving on once the active one has enough samples.

use crate::benchmarks::{AdvancePolicy, SampleAccumulator};
use crate::registry::{ApiId, ProblemId, Registry, SelectionKey, SolutionId};

/// How the active combination is chosen. Decided at startup, never changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionMode {
    /// Driven by navigation commands.
    Interactive,
    /// Unattended walk over every combination.
    BenchmarkTraversal,
}

/// Interactive navigation commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NavigationCommand {
    /// Next problem (wraps).
    NextProblem,
    /// Previous problem (wraps).
    PrevProblem,
    /// Next solution of the active problem (wraps).
    NextSolution,
    /// Previous solution of the active problem (wraps).
    PrevSolution,
    /// Next API (wraps).
    NextApi,
}

/// The active selection and, in benchmark mode, the traversal cursor.
#[derive(Debug, Clone)]
pub struct SelectionStateMachine {
    mode: SelectionMode,
    api_count: usize,
    solution_counts: Vec<usize>,
    api: usize,
    problem: usize,
    solution: usize,
    combinations: Vec<SelectionKey>,
    cursor: usize,
}

fn step(index: usize, count: usize, forward: bool) -> usize {
    if forward {
        (index + 1) % count
    } else {
        (index + count - 1) % count
    }
}

impl SelectionStateMachine {
    /// Starts at the first API, problem and solution of `registry`.
    pub fn new(mode: SelectionMode, registry: &Registry) -> Self {
        let solution_counts = registry
            .problems()
            .map(|problem| registry.solution_count(problem))
            .collect();
        let combinations = match mode {
            SelectionMode::Interactive => Vec::new(),
            SelectionMode::BenchmarkTraversal => registry.combinations(),
        };

        let mut machine = Self {
            mode,
            api_count: registry.api_count(),
            solution_counts,
            api: 0,
            problem: 0,
            solution: 0,
            combinations,
            cursor: 0,
        };
        machine.sync_to_cursor();
        machine
    }

    /// `true` in benchmark mode.
    pub fn is_benchmark(&self) -> bool {
        self.mode == SelectionMode::BenchmarkTraversal
    }

    /// The active combination, if the active problem has any solution.
    pub fn active_key(&self) -> Option<SelectionKey> {
        match self.mode {
            SelectionMode::BenchmarkTraversal => self.combinations.get(self.cursor).copied(),
            SelectionMode::Interactive => {
                let solutions = self.solution_counts.get(self.problem).copied()?;
                (self.api < self.api_count && self.solution < solutions).then_some(SelectionKey {
                    api: ApiId(self.api),
                    problem: ProblemId(self.problem),
                    solution: SolutionId(self.solution),
                })
            }
        }
    }

    /// The active API, even when the active problem has no solution to run.
    pub fn active_api(&self) -> Option<ApiId> {
        (self.api < self.api_count).then_some(ApiId(self.api))
    }

    /// The active problem.
    pub fn active_problem(&self) -> Option<ProblemId> {
        (self.problem < self.solution_counts.len()).then_some(ProblemId(self.problem))
    }

    /// Applies an interactive command. Returns `true` when the selection changed.
    ///
    /// Ignored in benchmark mode, and a no-op when there is nothing to cycle through.
    pub fn navigate(&mut self, command: NavigationCommand) -> bool {
        if self.is_benchmark() {
            return false;
        }

        let before = (self.api, self.problem, self.solution);
        let problem_count = self.solution_counts.len();
        match command {
            NavigationCommand::NextProblem | NavigationCommand::PrevProblem => {
                if problem_count == 0 {
                    return false;
                }
                let forward = command == NavigationCommand::NextProblem;
                self.problem = step(self.problem, problem_count, forward);
                self.revalidate_solution();
            }
            NavigationCommand::NextSolution | NavigationCommand::PrevSolution => {
                let solutions = self.solution_count();
                if solutions == 0 {
                    return false;
                }
                let forward = command == NavigationCommand::NextSolution;
                self.solution = step(self.solution, solutions, forward);
            }
            NavigationCommand::NextApi => {
                if self.api_count == 0 {
                    return false;
                }
                self.api = step(self.api, self.api_count, true);
                self.revalidate_solution();
            }
        }

        before != (self.api, self.problem, self.solution)
    }

    /// Moves to the next combination once `acc` satisfies `policy`.
    ///
    /// Returns `true` when the cursor moved. Interactive mode never advances.
    pub fn advance_if_satisfied(
        &mut self,
        acc: Option<&SampleAccumulator>,
        policy: &AdvancePolicy,
    ) -> bool {
        if !self.is_benchmark() || self.is_complete() {
            return false;
        }
        match acc {
            Some(acc) if policy.is_satisfied(acc) => self.skip(),
            _ => false,
        }
    }

    /// Moves past the active combination regardless of its samples.
    ///
    /// Used when a combination cannot run at all. Benchmark mode only.
    pub fn skip(&mut self) -> bool {
        if !self.is_benchmark() || self.is_complete() {
            return false;
        }
        self.cursor += 1;
        self.sync_to_cursor();
        true
    }

    /// `true` once benchmark traversal has gone past the last combination.
    pub fn is_complete(&self) -> bool {
        self.is_benchmark() && self.cursor >= self.combinations.len()
    }

    /// Index of the active combination and the total count, for progress logs.
    pub fn progress(&self) -> (usize, usize) {
        (self.cursor.min(self.combinations.len()), self.combinations.len())
    }

    fn solution_count(&self) -> usize {
        self.solution_counts.get(self.problem).copied().unwrap_or(0)
    }

    // Solutions are registered per problem, so an index valid for the old
    // problem may not exist for the new one.
    fn revalidate_solution(&mut self) {
        if self.solution >= self.solution_count() {
            self.solution = 0;
        }
    }

    fn sync_to_cursor(&mut self) {
        if let Some(key) = self.combinations.get(self.cursor) {
            self.api = key.api.index();
            self.problem = key.problem.index();
            self.solution = key.solution.index();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn registry() -> Registry {
        Registry::new(
            ["DX12", "GL", "Vulkan"],
            [
                ("Cubes".to_string(), vec!["A", "B", "C"]),
                ("Empty".to_string(), Vec::<&str>::new()),
                ("Null".to_string(), vec!["Only"]),
            ],
        )
    }

    #[test]
    fn next_problem_wraps_and_keeps_api() {
        let registry = registry();
        let mut machine = SelectionStateMachine::new(SelectionMode::Interactive, &registry);
        machine.navigate(NavigationCommand::NextApi);
        let start_problem = machine.active_problem();
        let start_api = machine.active_api();

        for _ in 0..registry.problem_count() {
            machine.navigate(NavigationCommand::NextProblem);
        }

        assert_eq!(machine.active_problem(), start_problem);
        assert_eq!(machine.active_api(), start_api);
    }

    #[test]
    fn previous_problem_wraps_backwards() {
        let registry = registry();
        let mut machine = SelectionStateMachine::new(SelectionMode::Interactive, &registry);
        assert!(machine.navigate(NavigationCommand::PrevProblem));
        assert_eq!(machine.active_problem(), registry.find_problem("Null"));
    }

    #[test]
    fn solution_index_resets_when_problem_has_fewer_solutions() {
        let registry = registry();
        let mut machine = SelectionStateMachine::new(SelectionMode::Interactive, &registry);
        machine.navigate(NavigationCommand::PrevSolution);
        assert_eq!(machine.active_key().map(|k| k.solution), Some(SolutionId(2)));

        // "Empty" has no solutions: nothing to run, cycling is a no-op.
        machine.navigate(NavigationCommand::NextProblem);
        assert_eq!(machine.active_key(), None);
        assert!(!machine.navigate(NavigationCommand::NextSolution));

        machine.navigate(NavigationCommand::NextProblem);
        let key = machine.active_key().unwrap();
        assert_eq!(registry.describe(&key).solution, "Only");
    }

    #[test]
    fn solution_index_survives_api_switch_when_still_valid() {
        let registry = registry();
        let mut machine = SelectionStateMachine::new(SelectionMode::Interactive, &registry);
        machine.navigate(NavigationCommand::NextSolution);
        machine.navigate(NavigationCommand::NextApi);
        let key = machine.active_key().unwrap();
        assert_eq!(registry.describe(&key).api, "GL");
        assert_eq!(registry.describe(&key).solution, "B");
    }

    #[test]
    fn benchmark_mode_ignores_navigation() {
        let registry = registry();
        let mut machine = SelectionStateMachine::new(SelectionMode::BenchmarkTraversal, &registry);
        let first = machine.active_key();
        assert!(!machine.navigate(NavigationCommand::NextProblem));
        assert_eq!(machine.active_key(), first);
    }

    #[test]
    fn traversal_visits_every_combination_once() {
        let registry = registry();
        let policy = AdvancePolicy::MinFrames(3);
        let mut machine = SelectionStateMachine::new(SelectionMode::BenchmarkTraversal, &registry);

        let mut visited = Vec::new();
        while let Some(key) = machine.active_key() {
            assert!(!machine.is_complete());
            visited.push(key);
            let mut acc = SampleAccumulator::default();
            for _ in 0..3 {
                assert!(!machine.advance_if_satisfied(Some(&acc), &policy));
                acc.frame_count += 1;
                acc.elapsed_seconds += 0.01;
            }
            assert!(machine.advance_if_satisfied(Some(&acc), &policy));
        }

        assert!(machine.is_complete());
        assert_eq!(visited, registry.combinations());
        let unique: HashSet<_> = visited.iter().collect();
        assert_eq!(unique.len(), 3 * 3 + 3);
    }

    #[test]
    fn seconds_policy_advances_on_elapsed_time() {
        let registry = Registry::new(["GL"], [("Null".to_string(), vec!["Only"])]);
        let policy = AdvancePolicy::MinSeconds(1.0);
        let mut machine = SelectionStateMachine::new(SelectionMode::BenchmarkTraversal, &registry);

        let mut acc = SampleAccumulator {
            frame_count: 1_000,
            elapsed_seconds: 0.5,
            work_count: 0,
        };
        assert!(!machine.advance_if_satisfied(Some(&acc), &policy));
        assert!(!machine.advance_if_satisfied(None, &policy));
        acc.elapsed_seconds = 1.0;
        assert!(machine.advance_if_satisfied(Some(&acc), &policy));
        assert!(machine.is_complete());
        assert!(!machine.skip());
    }

    #[test]
    fn empty_registry_is_complete_immediately() {
        let registry = Registry::new(Vec::<String>::new(), Vec::<(String, Vec<String>)>::new());
        let machine = SelectionStateMachine::new(SelectionMode::BenchmarkTraversal, &registry);
        assert!(machine.is_complete());
        assert_eq!(machine.active_key(), None);
    }
}
