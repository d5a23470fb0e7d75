//! Lazy chunked arrays.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use ndarray::{ArrayD, IxDyn, Slice};
use tracing::debug;

use super::chunks::{ndindex, Chunks};
use super::executor;
use super::task::{BlockKey, Layer, Piece, Task};
use super::{randomize, TaskGraph};
use crate::element::Element;
use crate::error::{GraphError, TaskError};
use crate::geobox::Window;

/// Handle to a chunked array whose blocks are produced by a task graph.
///
/// Cloning is cheap: the graph is shared and immutable.
pub struct LazyArray<T> {
    name: String,
    chunks: Chunks,
    graph: Arc<TaskGraph<T>>,
}

impl<T> Clone for LazyArray<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            chunks: self.chunks.clone(),
            graph: Arc::clone(&self.graph),
        }
    }
}

impl<T> fmt::Debug for LazyArray<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyArray")
            .field("name", &self.name)
            .field("shape", &self.shape())
            .field("chunks", &self.chunks)
            .field("tasks", &self.graph.len())
            .finish()
    }
}

impl<T> LazyArray<T> {
    /// Wrap layer `name` of `graph` as an array with `chunks`.
    ///
    /// Every block coordinate of `chunks` must have exactly one task in the
    /// layer, and the layer must not hold tasks outside that block space.
    pub fn new(graph: TaskGraph<T>, name: &str, chunks: Chunks) -> Result<Self, GraphError> {
        let layer = graph
            .layer(name)
            .ok_or_else(|| GraphError::MissingLayer(name.to_string()))?;

        let expected: BTreeSet<Vec<usize>> = ndindex(&chunks.numblocks()).collect();
        if let Some(index) = expected.iter().find(|idx| !layer.contains(idx)) {
            return Err(GraphError::MissingBlock {
                name: name.to_string(),
                index: index.clone(),
            });
        }
        if layer.len() != expected.len() {
            let stray = layer
                .iter()
                .map(|(idx, _)| idx)
                .find(|idx| !expected.contains(*idx))
                .cloned()
                .unwrap_or_default();
            return Err(GraphError::Chunks(format!(
                "layer '{name}' has a task for block {stray:?} outside block space {:?}",
                chunks.numblocks()
            )));
        }

        Ok(Self {
            name: name.to_string(),
            chunks,
            graph: Arc::new(graph),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn chunks(&self) -> &Chunks {
        &self.chunks
    }

    pub fn shape(&self) -> Vec<usize> {
        self.chunks.shape()
    }

    pub fn ndim(&self) -> usize {
        self.chunks.ndim()
    }

    pub fn numblocks(&self) -> Vec<usize> {
        self.chunks.numblocks()
    }

    pub fn chunksize(&self) -> Vec<usize> {
        self.chunks.chunksize()
    }

    pub fn graph(&self) -> &TaskGraph<T> {
        &self.graph
    }

    /// This array's own layer.
    pub fn layer(&self) -> Option<&Layer<T>> {
        self.graph.layer(&self.name)
    }

    pub fn block_key(&self, index: &[usize]) -> BlockKey {
        BlockKey::new(&self.name, index.to_vec())
    }
}

impl<T: Element> LazyArray<T> {
    /// Split an in-memory array into literal blocks of `chunk_shape`.
    pub fn from_array(data: ArrayD<T>, chunk_shape: &[usize]) -> Result<Self, GraphError> {
        let chunks = Chunks::regular(data.shape(), chunk_shape)?;
        let name = randomize("array");
        let mut layer = Layer::new(&name);

        for index in ndindex(&chunks.numblocks()) {
            let offset = chunks.block_offset(&index);
            let shape = chunks.block_shape(&index);
            let block = data
                .slice_each_axis(|ax| {
                    let i = ax.axis.index();
                    Slice::from(offset[i]..offset[i] + shape[i])
                })
                .to_owned();
            layer.insert(index, Task::Literal(Arc::new(block)))?;
        }

        Self::new(TaskGraph::from_collections(layer, &[]), &name, chunks)
    }

    /// Deferred crop of the two axes starting at `axis` to `window`.
    ///
    /// The cropped axes hold a single dense block each; other axes keep their
    /// chunking. The result depends on `self` through an explicit graph edge and
    /// reads only the source blocks overlapping the window.
    pub fn crop_dense(&self, window: &Window, axis: usize) -> Result<Self, GraphError> {
        let shape = self.shape();
        if shape.len() < axis + 2 {
            return Err(GraphError::Shape(format!(
                "cannot crop axes {axis} and {} of a {}-d array",
                axis + 1,
                shape.len()
            )));
        }
        if window.rows.end > shape[axis]
            || window.cols.end > shape[axis + 1]
            || window.rows.start > window.rows.end
            || window.cols.start > window.cols.end
        {
            return Err(GraphError::Shape(format!(
                "window {window:?} is outside ({}, {})",
                shape[axis],
                shape[axis + 1]
            )));
        }

        let name = randomize("crop");
        let mut axes = self.chunks.axes().to_vec();
        axes[axis] = vec![window.height()];
        axes[axis + 1] = vec![window.width()];
        let chunks = Chunks::new(axes);

        let row_pieces = self.chunks.overlapping(axis, &window.rows);
        let col_pieces = self.chunks.overlapping(axis + 1, &window.cols);

        let mut layer = Layer::new(&name);
        for index in ndindex(&chunks.numblocks()) {
            let mut parts = Vec::with_capacity(row_pieces.len() * col_pieces.len());
            for (row_block, row_range, row_offset) in &row_pieces {
                for (col_block, col_range, col_offset) in &col_pieces {
                    let mut src_index = index.clone();
                    src_index[axis] = *row_block;
                    src_index[axis + 1] = *col_block;

                    let mut region: Vec<_> = self
                        .chunks
                        .block_shape(&src_index)
                        .into_iter()
                        .map(|n| 0..n)
                        .collect();
                    region[axis] = row_range.clone();
                    region[axis + 1] = col_range.clone();

                    let mut offset = vec![0; index.len()];
                    offset[axis] = *row_offset;
                    offset[axis + 1] = *col_offset;

                    parts.push(Piece {
                        source: self.block_key(&src_index),
                        region,
                        offset,
                    });
                }
            }
            let block_shape = chunks.block_shape(&index);
            layer.insert(
                index,
                Task::Assemble {
                    shape: block_shape,
                    parts,
                },
            )?;
        }

        Self::new(
            TaskGraph::from_collections(layer, std::slice::from_ref(self)),
            &name,
            chunks,
        )
    }

    /// Evaluate a single block.
    pub fn compute_block(&self, index: &[usize]) -> Result<ArrayD<T>, TaskError> {
        let key = self.block_key(index);
        let mut done = executor::execute(&self.graph, std::slice::from_ref(&key))?;
        let block = done
            .remove(&key)
            .ok_or_else(|| TaskError::MissingKey(key.to_string()))?;
        Ok(Arc::try_unwrap(block).unwrap_or_else(|shared| (*shared).clone()))
    }

    /// Evaluate every block and stitch the result into one array.
    pub fn compute(&self) -> Result<ArrayD<T>, TaskError> {
        let keys: Vec<BlockKey> = ndindex(&self.numblocks())
            .map(|idx| self.block_key(&idx))
            .collect();
        debug!(array = %self.name, blocks = keys.len(), "computing array");

        let done = executor::execute(&self.graph, &keys)?;

        let mut out = ArrayD::from_elem(IxDyn(&self.shape()), T::zero());
        for key in &keys {
            let block = done
                .get(key)
                .ok_or_else(|| TaskError::MissingKey(key.to_string()))?;
            let offset = self.chunks.block_offset(&key.index);
            let shape = self.chunks.block_shape(&key.index);
            if block.shape() != shape.as_slice() {
                return Err(TaskError::Shape(format!(
                    "block {key} has shape {:?}, expected {shape:?}",
                    block.shape()
                )));
            }
            out.slice_each_axis_mut(|ax| {
                let i = ax.axis.index();
                Slice::from(offset[i]..offset[i] + shape[i])
            })
            .assign(&**block);
        }
        Ok(out)
    }
}
