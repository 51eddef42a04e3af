//! Dependency-ordered construction: orders destinations so every `depends_on`
//! edge points at an already-ordered name, inputs last since they drive the
//! system once everything downstream is ready.

use crate::error::ConfigError;
use crate::spec::DestinationConfig;
use std::collections::{HashMap, VecDeque};

/// Order filter/output instance names so that every `depends_on` entry
/// precedes the instance naming it, via Kahn's algorithm. Returns an error
/// naming the cycle if one exists.
pub fn order_destinations(
    destinations: &HashMap<String, DestinationConfig>,
) -> Result<Vec<String>, ConfigError> {
    let mut in_degree: HashMap<&str, usize> = HashMap::new();
    let mut dependents: HashMap<&str, Vec<&str>> = HashMap::new();

    for name in destinations.keys() {
        in_degree.entry(name.as_str()).or_insert(0);
        dependents.entry(name.as_str()).or_default();
    }

    for (name, dest) in destinations {
        for dep in &dest.depends_on {
            dependents.entry(dep.as_str()).or_default().push(name.as_str());
            *in_degree.entry(name.as_str()).or_insert(0) += 1;
        }
    }

    let mut queue: VecDeque<&str> = in_degree
        .iter()
        .filter(|(_, &deg)| deg == 0)
        .map(|(&name, _)| name)
        .collect();
    queue.make_contiguous().sort_unstable();

    let mut ordered = Vec::with_capacity(destinations.len());
    while let Some(node) = queue.pop_front() {
        ordered.push(node.to_string());
        if let Some(deps) = dependents.get(node) {
            for &dep in deps {
                if let Some(deg) = in_degree.get_mut(dep) {
                    *deg -= 1;
                    if *deg == 0 {
                        queue.push_back(dep);
                    }
                }
            }
        }
    }

    if ordered.len() != destinations.len() {
        let in_cycle: Vec<&str> = in_degree
            .iter()
            .filter(|(_, &deg)| deg > 0)
            .map(|(&name, _)| name)
            .collect();
        return Err(ConfigError::CircularDependency(in_cycle.join(", ")));
    }

    Ok(ordered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::DestinationConfig;

    fn dest(depends_on: &[&str]) -> DestinationConfig {
        DestinationConfig {
            plugin_type: "stdout".into(),
            settings: None,
            matcher: "TRUE".into(),
            capacity: 64,
            queue: None,
            depends_on: depends_on.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn orders_a_linear_chain() {
        let mut destinations = HashMap::new();
        destinations.insert("a".to_string(), dest(&[]));
        destinations.insert("b".to_string(), dest(&["a"]));
        destinations.insert("c".to_string(), dest(&["b"]));

        let order = order_destinations(&destinations).unwrap();
        assert_eq!(order, vec!["a", "b", "c"]);
    }

    #[test]
    fn rejects_a_cycle() {
        let mut destinations = HashMap::new();
        destinations.insert("a".to_string(), dest(&["b"]));
        destinations.insert("b".to_string(), dest(&["a"]));

        let err = order_destinations(&destinations).unwrap_err();
        assert!(matches!(err, ConfigError::CircularDependency(_)));
    }

    #[test]
    fn independent_destinations_need_no_ordering_between_them() {
        let mut destinations = HashMap::new();
        destinations.insert("a".to_string(), dest(&[]));
        destinations.insert("b".to_string(), dest(&[]));

        let order = order_destinations(&destinations).unwrap();
        assert_eq!(order.len(), 2);
    }
}
