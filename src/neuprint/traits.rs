//! ConnectomeStore trait definition
//!
//! Defines the abstract interface over the remote connectome service.
//! This trait mirrors the query operations of `NeuprintClient`, enabling
//! testing with mock implementations and future backend swaps.

use crate::neuprint::models::{NeuronCriteria, NeuronMeta, SkeletonNode, SynapseConnection, SynapseCriteria};
use anyhow::Result;
use async_trait::async_trait;

/// Abstract interface for connectome queries.
#[async_trait]
pub trait ConnectomeStore: Send + Sync {
    /// Fetch all skeleton nodes for a neuron.
    async fn fetch_skeleton(&self, body_id: u64) -> Result<Vec<SkeletonNode>>;

    /// Fetch synapse connections from neurons matching `source` onto neurons
    /// matching `target`, filtered by `synapse`.
    ///
    /// When `batch_size` is given the fetch is paginated server-side with
    /// that page size; otherwise a single query returns all rows.
    async fn fetch_synapse_connections(
        &self,
        source: &NeuronCriteria,
        target: &NeuronCriteria,
        synapse: &SynapseCriteria,
        batch_size: Option<usize>,
    ) -> Result<Vec<SynapseConnection>>;

    /// Fetch display metadata for the given neurons.
    async fn fetch_neurons(&self, body_ids: &[u64]) -> Result<Vec<NeuronMeta>>;
}
