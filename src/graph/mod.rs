//! A small lazy chunked-array engine.
//!
//! An array is a named [`Layer`] of tasks, one per block, inside a [`TaskGraph`]
//! that also holds every layer it depends on. Nothing runs until
//! [`LazyArray::compute`] or [`LazyArray::compute_block`] is called.

pub mod array;
pub mod chunks;
mod executor;
pub mod task;

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use uuid::Uuid;

pub use array::LazyArray;
pub use chunks::{ndindex, unpack_chunksize, Chunks};
pub use task::{BlockFn, BlockKey, Layer, Piece, Task, TaskKind};

/// Unique layer name with a readable prefix, e.g. `reproject-3f2a…`.
pub fn randomize(prefix: &str) -> String {
    format!("{prefix}-{}", Uuid::new_v4().simple())
}

/// Layers keyed by name, plus the explicit layer → dependency edges.
pub struct TaskGraph<T> {
    layers: BTreeMap<String, Arc<Layer<T>>>,
    dependencies: BTreeMap<String, BTreeSet<String>>,
}

impl<T> TaskGraph<T> {
    /// Graph holding `layer` on top of the graphs of `deps`.
    pub fn from_collections(layer: Layer<T>, deps: &[LazyArray<T>]) -> Self {
        let mut layers = BTreeMap::new();
        let mut dependencies = BTreeMap::new();

        for dep in deps {
            let graph = dep.graph();
            for (name, l) in &graph.layers {
                layers.entry(name.clone()).or_insert_with(|| Arc::clone(l));
            }
            for (name, d) in &graph.dependencies {
                dependencies.entry(name.clone()).or_insert_with(|| d.clone());
            }
        }

        let name = layer.name().to_string();
        dependencies.insert(
            name.clone(),
            deps.iter().map(|d| d.name().to_string()).collect(),
        );
        layers.insert(name, Arc::new(layer));

        Self {
            layers,
            dependencies,
        }
    }

    pub fn layer(&self, name: &str) -> Option<&Layer<T>> {
        self.layers.get(name).map(Arc::as_ref)
    }

    pub fn layer_names(&self) -> impl Iterator<Item = &str> {
        self.layers.keys().map(String::as_str)
    }

    /// Names of the layers `name` reads from.
    pub fn layer_dependencies(&self, name: &str) -> Option<&BTreeSet<String>> {
        self.dependencies.get(name)
    }

    pub fn get(&self, key: &BlockKey) -> Option<&Task<T>> {
        self.layers.get(&key.name)?.get(&key.index)
    }

    /// Total number of tasks across all layers.
    pub fn len(&self) -> usize {
        self.layers.values().map(|l| l.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::ArrayD;

    #[test]
    fn test_randomize_is_unique() {
        let a = randomize("reproject");
        let b = randomize("reproject");
        assert!(a.starts_with("reproject-"));
        assert_ne!(a, b);
    }

    #[test]
    fn test_from_collections_merges_and_links() {
        let src = LazyArray::from_array(ArrayD::<f32>::zeros(vec![4, 4]), &[2, 2]).unwrap();
        let mut layer = Layer::new("sum");
        layer
            .insert(
                vec![0],
                Task::Fill {
                    shape: vec![1],
                    value: 0.0,
                },
            )
            .unwrap();
        let graph = TaskGraph::from_collections(layer, std::slice::from_ref(&src));

        assert!(graph.layer(src.name()).is_some());
        assert!(graph.layer("sum").is_some());
        assert_eq!(graph.len(), 5);
        let deps = graph.layer_dependencies("sum").unwrap();
        assert!(deps.contains(src.name()));
        assert!(graph.layer_dependencies(src.name()).unwrap().is_empty());
    }
}
