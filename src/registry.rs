//! Identifiers for the registered APIs, problems and solutions.
//!
//! The registry owns the display names; everything else in the application stores
//! the small copyable ids below and compares them by identity. Names are sorted
//! when the registry is built, so id order and display-name order agree and the
//! benchmark traversal visits combinations in the same order the report lists them.

use std::fmt;

/// A registered graphics API (one wgpu backend).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ApiId(pub(crate) usize);

/// A registered rendering problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProblemId(pub(crate) usize);

/// A solution, scoped to the problem it was registered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SolutionId(pub(crate) usize);

impl ApiId {
    /// Position of the API in the registry.
    pub fn index(self) -> usize {
        self.0
    }
}

impl ProblemId {
    /// Position of the problem in the registry.
    pub fn index(self) -> usize {
        self.0
    }
}

impl SolutionId {
    /// Position of the solution within its problem.
    pub fn index(self) -> usize {
        self.0
    }
}

/// One benchmarkable configuration.
///
/// Keys order problem first, then API, then solution: the order of
/// [`Registry::combinations`] and of the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SelectionKey {
    /// The workload.
    pub problem: ProblemId,
    /// The API the frame is rendered with.
    pub api: ApiId,
    /// The strategy used to render the workload.
    pub solution: SolutionId,
}

#[derive(Debug, Clone)]
struct ProblemEntry {
    name: String,
    solutions: Vec<String>,
}

/// Display names of everything that can be selected.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    apis: Vec<String>,
    problems: Vec<ProblemEntry>,
}

impl Registry {
    /// Builds a registry, sorting APIs, problems and each problem's solutions by name.
    pub fn new<A, P, S>(apis: A, problems: P) -> Self
    where
        A: IntoIterator,
        A::Item: Into<String>,
        P: IntoIterator<Item = (String, S)>,
        S: IntoIterator,
        S::Item: Into<String>,
    {
        let mut apis: Vec<String> = apis.into_iter().map(Into::into).collect();
        apis.sort();

        let mut problems: Vec<ProblemEntry> = problems
            .into_iter()
            .map(|(name, solutions)| {
                let mut solutions: Vec<String> = solutions.into_iter().map(Into::into).collect();
                solutions.sort();
                ProblemEntry { name, solutions }
            })
            .collect();
        problems.sort_by(|a, b| a.name.cmp(&b.name));

        Self { apis, problems }
    }

    /// Number of registered APIs.
    pub fn api_count(&self) -> usize {
        self.apis.len()
    }

    /// Number of registered problems.
    pub fn problem_count(&self) -> usize {
        self.problems.len()
    }

    /// Number of solutions registered for `problem`.
    pub fn solution_count(&self, problem: ProblemId) -> usize {
        self.problems
            .get(problem.0)
            .map_or(0, |entry| entry.solutions.len())
    }

    /// All APIs in display order.
    pub fn apis(&self) -> impl Iterator<Item = ApiId> + use<> {
        (0..self.apis.len()).map(ApiId)
    }

    /// All problems in display order.
    pub fn problems(&self) -> impl Iterator<Item = ProblemId> + use<> {
        (0..self.problems.len()).map(ProblemId)
    }

    /// The solutions of `problem` in display order.
    pub fn solutions(&self, problem: ProblemId) -> impl Iterator<Item = SolutionId> + use<> {
        (0..self.solution_count(problem)).map(SolutionId)
    }

    /// Every registered combination, problem outermost, then API, then solution.
    pub fn combinations(&self) -> Vec<SelectionKey> {
        let mut keys = Vec::new();
        for problem in self.problems() {
            for api in self.apis() {
                for solution in self.solutions(problem) {
                    keys.push(SelectionKey {
                        problem,
                        api,
                        solution,
                    });
                }
            }
        }
        keys
    }

    /// Display name of an API.
    pub fn api_name(&self, api: ApiId) -> &str {
        self.apis.get(api.0).map_or("?", String::as_str)
    }

    /// Display name of a problem.
    pub fn problem_name(&self, problem: ProblemId) -> &str {
        self.problems
            .get(problem.0)
            .map_or("?", |entry| entry.name.as_str())
    }

    /// Display name of a solution of `problem`.
    pub fn solution_name(&self, problem: ProblemId, solution: SolutionId) -> &str {
        self.problems
            .get(problem.0)
            .and_then(|entry| entry.solutions.get(solution.0))
            .map_or("?", String::as_str)
    }

    /// Looks an API up by case-insensitive name.
    pub fn find_api(&self, name: &str) -> Option<ApiId> {
        self.apis
            .iter()
            .position(|api| api.eq_ignore_ascii_case(name))
            .map(ApiId)
    }

    /// Looks a problem up by case-insensitive name.
    pub fn find_problem(&self, name: &str) -> Option<ProblemId> {
        self.problems
            .iter()
            .position(|entry| entry.name.eq_ignore_ascii_case(name))
            .map(ProblemId)
    }

    /// Resolves the three names of a key.
    pub fn describe(&self, key: &SelectionKey) -> KeyNames<'_> {
        KeyNames {
            api: self.api_name(key.api),
            problem: self.problem_name(key.problem),
            solution: self.solution_name(key.problem, key.solution),
        }
    }
}

/// Display names of a [`SelectionKey`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyNames<'a> {
    /// API name.
    pub api: &'a str,
    /// Problem name.
    pub problem: &'a str,
    /// Solution name.
    pub solution: &'a str,
}

impl fmt::Display for KeyNames<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} / {} / {}", self.problem, self.api, self.solution)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> Registry {
        Registry::new(
            ["Vulkan", "GL"],
            [
                ("Cubes".to_string(), vec!["Slow", "Fast"]),
                ("Blank".to_string(), vec!["Null"]),
            ],
        )
    }

    #[test]
    fn names_are_sorted_at_registration() {
        let registry = registry();
        assert_eq!(registry.api_name(ApiId(0)), "GL");
        assert_eq!(registry.problem_name(ProblemId(0)), "Blank");
        assert_eq!(registry.solution_name(ProblemId(1), SolutionId(0)), "Fast");
    }

    #[test]
    fn combinations_are_problem_major() {
        let registry = registry();
        let names: Vec<String> = registry
            .combinations()
            .iter()
            .map(|key| registry.describe(key).to_string())
            .collect();
        assert_eq!(
            names,
            vec![
                "Blank / GL / Null",
                "Blank / Vulkan / Null",
                "Cubes / GL / Fast",
                "Cubes / GL / Slow",
                "Cubes / Vulkan / Fast",
                "Cubes / Vulkan / Slow",
            ]
        );
    }

    #[test]
    fn keys_order_problem_before_api() {
        let registry = registry();
        let blank_vulkan = SelectionKey {
            problem: ProblemId(0),
            api: ApiId(1),
            solution: SolutionId(0),
        };
        let cubes_gl = SelectionKey {
            problem: ProblemId(1),
            api: ApiId(0),
            solution: SolutionId(0),
        };
        assert!(blank_vulkan < cubes_gl);

        let mut keys = registry.combinations();
        keys.reverse();
        keys.sort();
        assert_eq!(keys, registry.combinations());
    }

    #[test]
    fn lookups_ignore_case() {
        let registry = registry();
        assert_eq!(registry.find_api("vulkan"), Some(ApiId(1)));
        assert_eq!(registry.find_problem("CUBES"), Some(ProblemId(1)));
        assert_eq!(registry.find_problem("missing"), None);
    }
}
