//! Task descriptors and per-array task layers.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::Range;
use std::sync::Arc;

use ndarray::{ArrayD, ArrayViewD};

use crate::error::{GraphError, TaskError};

/// Address of one block: the producing array's name plus its block index.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockKey {
    pub name: String,
    pub index: Vec<usize>,
}

impl BlockKey {
    pub fn new(name: &str, index: Vec<usize>) -> Self {
        Self {
            name: name.to_string(),
            index,
        }
    }
}

impl fmt::Display for BlockKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "('{}', {:?})", self.name, self.index)
    }
}

/// Block function: receives its argument blocks, returns a fresh block.
pub type BlockFn<T> =
    Arc<dyn for<'a> Fn(&[ArrayViewD<'a, T>]) -> Result<ArrayD<T>, TaskError> + Send + Sync>;

/// A region copied from another array's block into an assembled block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Piece {
    pub source: BlockKey,
    /// Region of the source block, per axis.
    pub region: Vec<Range<usize>>,
    /// Where the region lands in the assembled block, per axis.
    pub offset: Vec<usize>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaskKind {
    Literal,
    Fill,
    Assemble,
    Apply,
}

/// How one block is produced.
pub enum Task<T> {
    /// Already materialized data.
    Literal(Arc<ArrayD<T>>),
    /// Block of `shape` where every element is `value`.
    Fill { shape: Vec<usize>, value: T },
    /// Block of `shape` stitched together from pieces of other blocks.
    Assemble { shape: Vec<usize>, parts: Vec<Piece> },
    /// `func` applied to the blocks named by `args`.
    Apply {
        label: &'static str,
        func: BlockFn<T>,
        args: Vec<BlockKey>,
    },
}

impl<T> Task<T> {
    pub fn apply<F>(label: &'static str, args: Vec<BlockKey>, func: F) -> Self
    where
        F: for<'a> Fn(&[ArrayViewD<'a, T>]) -> Result<ArrayD<T>, TaskError> + Send + Sync + 'static,
    {
        Task::Apply {
            label,
            func: Arc::new(func),
            args,
        }
    }

    pub fn kind(&self) -> TaskKind {
        match self {
            Task::Literal(_) => TaskKind::Literal,
            Task::Fill { .. } => TaskKind::Fill,
            Task::Assemble { .. } => TaskKind::Assemble,
            Task::Apply { .. } => TaskKind::Apply,
        }
    }

    /// Blocks that must be computed before this task runs.
    pub fn dependencies(&self) -> Vec<&BlockKey> {
        match self {
            Task::Literal(_) | Task::Fill { .. } => Vec::new(),
            Task::Assemble { parts, .. } => parts.iter().map(|p| &p.source).collect(),
            Task::Apply { args, .. } => args.iter().collect(),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Task<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Task::Literal(data) => f.debug_tuple("Literal").field(&data.shape()).finish(),
            Task::Fill { shape, value } => f
                .debug_struct("Fill")
                .field("shape", shape)
                .field("value", value)
                .finish(),
            Task::Assemble { shape, parts } => f
                .debug_struct("Assemble")
                .field("shape", shape)
                .field("parts", &parts.len())
                .finish(),
            Task::Apply { label, args, .. } => f
                .debug_struct("Apply")
                .field("label", label)
                .field("args", args)
                .finish(),
        }
    }
}

/// All tasks producing the blocks of one named array.
pub struct Layer<T> {
    name: String,
    tasks: BTreeMap<Vec<usize>, Task<T>>,
}

impl<T> Layer<T> {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            tasks: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Register the producer of block `index`. Each block has exactly one.
    pub fn insert(&mut self, index: Vec<usize>, task: Task<T>) -> Result<(), GraphError> {
        if self.tasks.contains_key(&index) {
            return Err(GraphError::DuplicateBlock {
                name: self.name.clone(),
                index,
            });
        }
        self.tasks.insert(index, task);
        Ok(())
    }

    pub fn contains(&self, index: &[usize]) -> bool {
        self.tasks.contains_key(index)
    }

    pub fn get(&self, index: &[usize]) -> Option<&Task<T>> {
        self.tasks.get(index)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Vec<usize>, &Task<T>)> {
        self.tasks.iter()
    }

    pub fn count(&self, kind: TaskKind) -> usize {
        self.tasks.values().filter(|t| t.kind() == kind).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layer_rejects_duplicates() {
        let mut layer: Layer<f32> = Layer::new("fill");
        layer
            .insert(
                vec![0, 0],
                Task::Fill {
                    shape: vec![2, 2],
                    value: 0.0,
                },
            )
            .unwrap();
        let err = layer
            .insert(
                vec![0, 0],
                Task::Fill {
                    shape: vec![2, 2],
                    value: 1.0,
                },
            )
            .unwrap_err();
        assert!(matches!(err, GraphError::DuplicateBlock { .. }));
        assert_eq!(layer.len(), 1);
    }

    #[test]
    fn test_task_dependencies() {
        let src = BlockKey::new("src", vec![0, 1]);
        let task: Task<f64> = Task::apply("copy", vec![src.clone()], |args| {
            Ok(args[0].to_owned())
        });
        assert_eq!(task.kind(), TaskKind::Apply);
        assert_eq!(task.dependencies(), vec![&src]);

        let assemble: Task<f64> = Task::Assemble {
            shape: vec![1],
            parts: vec![Piece {
                source: src.clone(),
                region: vec![0..1],
                offset: vec![0],
            }],
        };
        assert_eq!(assemble.dependencies(), vec![&src]);
    }

    #[test]
    fn test_block_key_display() {
        assert_eq!(BlockKey::new("crop", vec![0, 2]).to_string(), "('crop', [0, 2])");
    }
}
