use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashSet};

use crate::components::ComponentId;
use crate::errors::BootstrapError;
use crate::platform::BindingSet;

/// Deterministic activation order for a [`BindingSet`]
///
/// Indices refer to [`BindingSet::eligible`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivationPlan {
    order: Vec<usize>,
    levels: Vec<Vec<usize>>,
    providers: Vec<Vec<usize>>,
}

impl ActivationPlan {
    /// Components in the order they activate and register
    pub fn order(&self) -> &[usize] {
        &self.order
    }

    /// Groups of components with no dependency on each other, in plan order
    ///
    /// Every provider of a component sits in an earlier level.
    pub fn levels(&self) -> &[Vec<usize>] {
        &self.levels
    }

    /// Split the order into consecutive waves of independent components
    ///
    /// A wave holds at most `width` components and never a component together
    /// with one of its providers. Concatenating the waves gives back `order()`.
    pub fn waves(&self, width: usize) -> Vec<Vec<usize>> {
        let width = width.max(1);
        let mut waves: Vec<Vec<usize>> = Vec::new();
        let mut current: Vec<usize> = Vec::new();

        for &index in &self.order {
            let depends_on_current = self.providers[index]
                .iter()
                .any(|provider| current.contains(provider));

            if !current.is_empty() && (depends_on_current || current.len() >= width) {
                waves.push(std::mem::take(&mut current));
            }
            current.push(index);
        }

        if !current.is_empty() {
            waves.push(current);
        }
        waves
    }

    /// Components whose capabilities `index` depends on
    pub fn providers_of(&self, index: usize) -> &[usize] {
        &self.providers[index]
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Orders eligible components by their capability dependencies
#[derive(Debug, Clone, Copy, Default)]
pub struct ActivationPlanner;

impl ActivationPlanner {
    pub fn new() -> Self {
        Self
    }

    /// Plan activation: ascending order hint, ties broken by discovery order,
    /// never before the providers of a declared dependency
    pub fn plan(&self, bindings: &BindingSet) -> Result<ActivationPlan, BootstrapError> {
        let descriptors = bindings.eligible();
        let count = descriptors.len();

        let mut providers: Vec<Vec<usize>> = vec![Vec::new(); count];
        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); count];
        let mut in_degree = vec![0usize; count];

        for (index, descriptor) in descriptors.iter().enumerate() {
            for capability in descriptor.depends_on() {
                let provider = bindings.provider_index(capability).ok_or_else(|| {
                    BootstrapError::missing_dependency(capability.clone(), descriptor.id().clone())
                })?;

                if providers[index].contains(&provider) {
                    continue;
                }
                providers[index].push(provider);
                dependents[provider].push(index);
                in_degree[index] += 1;
            }
        }

        let mut ready: BinaryHeap<Reverse<(i32, usize, usize)>> = descriptors
            .iter()
            .enumerate()
            .filter(|(index, _)| in_degree[*index] == 0)
            .map(|(index, d)| {
                let (order, discovery) = d.activation_key();
                Reverse((order, discovery, index))
            })
            .collect();

        let mut order = Vec::with_capacity(count);
        while let Some(Reverse((_, _, current))) = ready.pop() {
            order.push(current);
            for &dependent in &dependents[current] {
                in_degree[dependent] -= 1;
                if in_degree[dependent] == 0 {
                    let (hint, discovery) = descriptors[dependent].activation_key();
                    ready.push(Reverse((hint, discovery, dependent)));
                }
            }
        }

        if order.len() != count {
            let cycle = find_cycle(&providers, &in_degree)
                .into_iter()
                .map(|index| descriptors[index].id().clone())
                .collect::<Vec<ComponentId>>();
            return Err(BootstrapError::DependencyCycle { cycle });
        }

        let mut depth = vec![0usize; count];
        let mut levels: Vec<Vec<usize>> = Vec::new();
        for &index in &order {
            let level = providers[index]
                .iter()
                .map(|&provider| depth[provider] + 1)
                .max()
                .unwrap_or(0);
            depth[index] = level;
            if levels.len() <= level {
                levels.resize_with(level + 1, Vec::new);
            }
            levels[level].push(index);
        }

        tracing::debug!(
            components = count,
            levels = levels.len(),
            "Activation plan computed"
        );

        Ok(ActivationPlan {
            order,
            levels,
            providers,
        })
    }
}

/// Locate one cycle among the nodes Kahn's algorithm could not release
///
/// The returned path starts and ends on the same node.
fn find_cycle(providers: &[Vec<usize>], in_degree: &[usize]) -> Vec<usize> {
    let mut visited = HashSet::new();
    let mut on_stack = HashSet::new();
    let mut path = Vec::new();

    for start in (0..providers.len()).filter(|&i| in_degree[i] > 0) {
        if !visited.contains(&start) {
            if let Some(cycle) = dfs_cycle(start, providers, &mut visited, &mut on_stack, &mut path) {
                return cycle;
            }
        }
    }

    Vec::new()
}

fn dfs_cycle(
    current: usize,
    providers: &[Vec<usize>],
    visited: &mut HashSet<usize>,
    on_stack: &mut HashSet<usize>,
    path: &mut Vec<usize>,
) -> Option<Vec<usize>> {
    visited.insert(current);
    on_stack.insert(current);
    path.push(current);

    for &provider in &providers[current] {
        if !visited.contains(&provider) {
            if let Some(cycle) = dfs_cycle(provider, providers, visited, on_stack, path) {
                return Some(cycle);
            }
        } else if on_stack.contains(&provider) {
            if let Some(start) = path.iter().position(|&i| i == provider) {
                let mut cycle = path[start..].to_vec();
                cycle.push(provider);
                return Some(cycle);
            }
        }
    }

    on_stack.remove(&current);
    path.pop();
    None
}
