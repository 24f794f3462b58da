//! Graph-wide driver that runs every node through its optimization kernel.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::OptimizerConfig;
use crate::error::{NodeError, OptError, OptResult};
use crate::ir::{EdgeId, Graph, Node, NodeId};
use crate::kernel::KernelImpl;
use crate::optimizer::{
    Deferral, InputConversion, OptKernel, OptKernelOptions, ShapeOutcome, TypeContext,
};
use crate::quant::QuantTable;
use crate::registry;
use crate::tensor::TensorTable;
use crate::view::InputOutputInfo;

/// A node whose decisions are final, together with its executable kernel.
pub struct CompiledNode {
    pub kernel: Box<dyn OptKernel>,
    pub kernel_impl: Box<dyn KernelImpl>,
}

impl CompiledNode {
    pub fn node_id(&self) -> NodeId {
        self.kernel.node().id
    }
}

struct PendingNode {
    kernel: Box<dyn OptKernel>,
    deferral: Deferral,
}

/// Summary of one compilation round.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CompileReport {
    /// Nodes finalized during this round.
    pub resolved: Vec<NodeId>,
    /// Nodes still waiting for a buffer, in graph order.
    pub deferred: Vec<(NodeId, Deferral)>,
}

impl CompileReport {
    pub fn is_complete(&self) -> bool {
        self.deferred.is_empty()
    }
}

/// Walks a graph in node order and drives each node through
/// `init -> select -> infer -> finalize -> create kernel`.
///
/// Nodes whose shapes need a buffer that is not materialized are deferred: their outputs get
/// speculative shapes so planning can continue, and nodes reading those outputs are deferred
/// behind them. Call [`Compiler::retry_deferred`] once the missing buffers exist.
///
/// Selections never overwrite an input another node already decided; those requests are
/// collected in [`Compiler::conversions`]. The first fatal error stops the compiler for
/// good: every later call, [`Compiler::finish`] included, returns it again.
pub struct Compiler<'g> {
    graph: &'g Graph,
    config: OptimizerConfig,
    quant: QuantTable,
    compiled: Vec<CompiledNode>,
    pending: Vec<PendingNode>,
    provisional: HashSet<EdgeId>,
    conversions: Vec<(NodeId, InputConversion)>,
    failed: Option<NodeError>,
    retry_rounds: usize,
}

impl<'g> Compiler<'g> {
    pub fn new(graph: &'g Graph, config: OptimizerConfig, quant: QuantTable) -> Self {
        Self {
            graph,
            config,
            quant,
            compiled: Vec::new(),
            pending: Vec::new(),
            provisional: HashSet::new(),
            conversions: Vec::new(),
            failed: None,
            retry_rounds: 0,
        }
    }

    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    /// Runs every node of the graph once. Fatal errors stop the walk.
    pub fn compile(&mut self, tensors: &mut TensorTable) -> Result<CompileReport, NodeError> {
        self.ensure_healthy()?;
        let graph = self.graph;
        let mut resolved = Vec::new();
        for node in graph.nodes() {
            let Some(mut kernel) =
                registry::create_opt_kernel(&self.config.backend, Arc::clone(node))
            else {
                let err = OptError::unsupported(format!(
                    "no kernel for {} on backend '{}'",
                    node.op_type, self.config.backend
                ));
                return Err(self.fail(node_error(node, err)));
            };
            if let Err(err) = self.prepare(kernel.as_mut(), tensors) {
                return Err(self.fail(node_error(node, err)));
            }
            match self.resolve(kernel, tensors) {
                Ok(Some(id)) => resolved.push(id),
                Ok(None) => {}
                Err(err) => return Err(self.fail(err)),
            }
        }
        Ok(self.report(resolved))
    }

    /// Re-runs shape inference for deferred nodes, in graph order.
    pub fn retry_deferred(&mut self, tensors: &mut TensorTable) -> Result<CompileReport, NodeError> {
        self.ensure_healthy()?;
        if self.pending.is_empty() {
            return Ok(self.report(Vec::new()));
        }
        self.retry_rounds += 1;
        if self.retry_rounds > self.config.max_retry_rounds {
            let err = pending_error(&self.pending[0]);
            return Err(self.fail(err));
        }
        let mut queue = std::mem::take(&mut self.pending).into_iter();
        for entry in queue.as_slice() {
            for edge in &entry.kernel.node().outputs {
                self.provisional.remove(edge);
            }
        }
        let mut resolved = Vec::new();
        let mut failure = None;
        for entry in queue.by_ref() {
            match self.resolve(entry.kernel, tensors) {
                Ok(Some(id)) => resolved.push(id),
                Ok(None) => {}
                Err(err) => {
                    failure = Some(err);
                    break;
                }
            }
        }
        if let Some(err) = failure {
            // nodes behind the failing one stay queued
            self.pending.extend(queue);
            return Err(self.fail(err));
        }
        Ok(self.report(resolved))
    }

    pub fn compiled(&self) -> &[CompiledNode] {
        &self.compiled
    }

    pub fn deferred(&self) -> Vec<(NodeId, Deferral)> {
        self.pending
            .iter()
            .map(|entry| (entry.kernel.node().id, entry.deferral.clone()))
            .collect()
    }

    /// Input selections that differ from what the producing node committed, in the order
    /// they were made.
    pub fn conversions(&self) -> &[(NodeId, InputConversion)] {
        &self.conversions
    }

    /// Returns the compiled nodes, failing if any node is still deferred or an earlier call
    /// hit a fatal error.
    pub fn finish(self) -> Result<Vec<CompiledNode>, NodeError> {
        self.ensure_healthy()?;
        if let Some(first) = self.pending.first() {
            return Err(pending_error(first));
        }
        Ok(self.compiled)
    }

    fn ensure_healthy(&self) -> Result<(), NodeError> {
        match &self.failed {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn fail(&mut self, err: NodeError) -> NodeError {
        self.failed = Some(err.clone());
        err
    }

    fn options<'a>(&'a self, tensors: &'a TensorTable) -> OptKernelOptions<'a> {
        OptKernelOptions {
            graph: self.graph,
            tensors,
            quant: &self.quant,
            config: &self.config,
        }
    }

    /// Runs the steps that happen exactly once per node: init, selection and type inference.
    fn prepare(&mut self, kernel: &mut dyn OptKernel, tensors: &mut TensorTable) -> OptResult<()> {
        let node = Arc::clone(kernel.node());
        debug!(node = %node.name, op = %node.op_type, backend = kernel.backend(), "init");
        kernel.init(&self.options(tensors))?;

        let mut info = InputOutputInfo::for_node(&node, tensors);
        let types = kernel.select_data_type(&info, self.config.preferred_fp_type)?;
        let mut conversions = types.apply(&mut info);
        let formats = kernel.select_format(&info)?;
        conversions.extend(formats.apply(&mut info));
        debug!(node = %node.name, ?types, ?formats, "selected");
        for conversion in conversions {
            debug!(node = %node.name, ?conversion, "input conversion");
            self.conversions.push((node.id, conversion));
        }

        let cx = TypeContext {
            requested: self.config.requested_type,
            quant: &self.quant,
        };
        kernel.infer_type(&mut info, &cx)
    }

    fn resolve(
        &mut self,
        mut kernel: Box<dyn OptKernel>,
        tensors: &mut TensorTable,
    ) -> Result<Option<NodeId>, NodeError> {
        let node = Arc::clone(kernel.node());
        let outcome = match self.provisional_input(&node, tensors) {
            Some(deferral) => ShapeOutcome::Deferred(deferral),
            None => {
                let mut info = InputOutputInfo::for_node(&node, tensors);
                ShapeOutcome::from_result(kernel.infer_dims(&mut info))
            }
        };

        match outcome {
            ShapeOutcome::Resolved => {
                kernel
                    .finalize(&self.options(tensors))
                    .map_err(|err| node_error(&node, err))?;
                let kernel_impl = kernel
                    .create_kernel_impl()
                    .map_err(|err| node_error(&node, err))?;
                debug!(node = %node.name, kernel = kernel_impl.name(), "compiled");
                self.compiled.push(CompiledNode {
                    kernel,
                    kernel_impl,
                });
                Ok(Some(node.id))
            }
            ShapeOutcome::Deferred(deferral) => {
                warn!(
                    node = %node.name,
                    input = deferral.input,
                    tensor = %deferral.tensor,
                    "shape inference deferred"
                );
                let mut info = InputOutputInfo::for_node(&node, tensors);
                kernel
                    .infer_unsafe_dims(&mut info, &self.config)
                    .map_err(|err| node_error(&node, err))?;
                self.provisional.extend(node.outputs.iter().copied());
                self.pending.push(PendingNode { kernel, deferral });
                Ok(None)
            }
            ShapeOutcome::Failed(err) => Err(node_error(&node, err)),
        }
    }

    /// First input produced by a deferred node, if any.
    fn provisional_input(&self, node: &Node, tensors: &TensorTable) -> Option<Deferral> {
        node.inputs
            .iter()
            .position(|edge| self.provisional.contains(edge))
            .map(|input| Deferral {
                input,
                tensor: tensors.get(node.inputs[input]).name().to_string(),
            })
    }

    fn report(&self, resolved: Vec<NodeId>) -> CompileReport {
        CompileReport {
            resolved,
            deferred: self.deferred(),
        }
    }
}

fn pending_error(entry: &PendingNode) -> NodeError {
    node_error(
        entry.kernel.node(),
        OptError::NotYetAvailable {
            input: entry.deferral.input,
            tensor: entry.deferral.tensor.clone(),
        },
    )
}

fn node_error(node: &Node, source: OptError) -> NodeError {
    NodeError {
        node: node.id,
        name: node.name.clone(),
        source,
    }
}
