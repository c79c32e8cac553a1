use std::fmt::Debug;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    #[error("system '{0}' registered twice")]
    Duplicate(&'static str),
    #[error("system '{system}' depends on unknown system '{dependency}'")]
    UnknownDependency {
        system: &'static str,
        dependency: &'static str,
    },
    #[error("dependency cycle between systems: {}", .remaining.join(", "))]
    Cycle { remaining: Vec<&'static str> },
}

#[derive(Debug, Clone)]
struct ScheduleEntry<S> {
    id: S,
    name: &'static str,
    dependencies: Vec<&'static str>,
}

/// Named systems with "runs after" dependencies, resolved once into a tick order.
#[derive(Debug, Clone)]
pub struct Schedule<S> {
    entries: Vec<ScheduleEntry<S>>,
}

impl<S> Default for Schedule<S> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<S: Copy + Debug> Schedule<S> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        id: S,
        name: &'static str,
        dependencies: &[&'static str],
    ) -> Result<(), ScheduleError> {
        if self.entries.iter().any(|entry| entry.name == name) {
            return Err(ScheduleError::Duplicate(name));
        }
        self.entries.push(ScheduleEntry {
            id,
            name,
            dependencies: dependencies.to_vec(),
        });
        Ok(())
    }

    /// Topological order; among ready systems the earliest registered runs first.
    pub fn resolve(&self) -> Result<Vec<(S, &'static str)>, ScheduleError> {
        for entry in &self.entries {
            for dependency in &entry.dependencies {
                if !self.entries.iter().any(|other| other.name == *dependency) {
                    return Err(ScheduleError::UnknownDependency {
                        system: entry.name,
                        dependency: *dependency,
                    });
                }
            }
        }

        let mut placed: Vec<&'static str> = Vec::with_capacity(self.entries.len());
        let mut order = Vec::with_capacity(self.entries.len());
        while order.len() < self.entries.len() {
            let next = self.entries.iter().find(|entry| {
                !placed.contains(&entry.name)
                    && entry
                        .dependencies
                        .iter()
                        .all(|dependency| placed.contains(dependency))
            });
            let Some(entry) = next else {
                let remaining = self
                    .entries
                    .iter()
                    .filter(|entry| !placed.contains(&entry.name))
                    .map(|entry| entry.name)
                    .collect();
                return Err(ScheduleError::Cycle { remaining });
            };
            placed.push(entry.name);
            order.push((entry.id, entry.name));
        }
        Ok(order)
    }
}

pub fn order_text<S>(order: &[(S, &'static str)]) -> String {
    order
        .iter()
        .map(|(_, name)| *name)
        .collect::<Vec<_>>()
        .join(">")
}
