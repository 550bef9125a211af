use crate::definition::ComponentDefinition;
use crate::key::ComponentKey;
use crate::monitor::ComponentMonitor;
use crate::sync::lock;
use itertools::Itertools;
use std::fmt::Write;
use std::sync::Mutex;
use std::time::Duration;

/// Records which components depend on which while instantiating and renders the result as a
/// Graphviz DOT graph.
#[derive(Debug, Default)]
pub struct DotDependencyGraphMonitor {
    edges: Mutex<Vec<(String, String)>>,
}

impl DotDependencyGraphMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns unique `(dependant, dependency)` pairs, sorted.
    pub fn edges(&self) -> Vec<(String, String)> {
        lock(&self.edges)
            .iter()
            .cloned()
            .sorted()
            .dedup()
            .collect()
    }

    pub fn dot(&self) -> String {
        let mut result = String::from("digraph \"Dependencies\" {\n");
        for (dependant, dependency) in self.edges() {
            let _ = writeln!(
                result,
                "  \"{}\" -> \"{}\";",
                escape(&dependant),
                escape(&dependency)
            );
        }

        result.push('}');
        result
    }
}

fn escape(value: &str) -> String {
    value.replace('"', "\\\"")
}

impl ComponentMonitor for DotDependencyGraphMonitor {
    fn instantiated(
        &self,
        key: &ComponentKey,
        _definition: &ComponentDefinition,
        dependencies: &[String],
        _duration: Duration,
    ) {
        let key = key.to_string();
        lock(&self.edges).extend(
            dependencies
                .iter()
                .map(|dependency| (key.clone(), dependency.clone())),
        );
    }
}

#[cfg(test)]
mod tests {
    use crate::definition::ComponentDefinition;
    use crate::key::ComponentKey;
    use crate::monitor::{ComponentMonitor, DotDependencyGraphMonitor};
    use std::time::Duration;

    #[test]
    fn should_render_sorted_unique_edges() {
        let monitor = DotDependencyGraphMonitor::new();
        let definition = ComponentDefinition::of_value::<u8>();
        let dependencies = ["b".to_string(), "a".to_string(), "b".to_string()];

        monitor.instantiated(
            &ComponentKey::from("x"),
            &definition,
            &dependencies,
            Duration::ZERO,
        );

        assert_eq!(
            monitor.dot(),
            "digraph \"Dependencies\" {\n  \"'x'\" -> \"a\";\n  \"'x'\" -> \"b\";\n}"
        );
    }
}
