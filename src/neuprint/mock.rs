//! In-memory mock implementation of ConnectomeStore for testing.
//!
//! Holds canned skeletons, connections, and neuron metadata behind
//! `tokio::sync::RwLock`, and records a call count per operation so tests
//! can assert which round trips happened.

use crate::neuprint::models::*;
use crate::neuprint::traits::ConnectomeStore;
use anyhow::{bail, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Per-operation call counters.
#[derive(Debug, Default, Clone, Copy)]
pub struct CallCounts {
    pub skeleton: usize,
    pub connections: usize,
    pub neurons: usize,
}

impl CallCounts {
    pub fn total(&self) -> usize {
        self.skeleton + self.connections + self.neurons
    }
}

/// In-memory mock implementation of ConnectomeStore for testing.
#[derive(Default)]
pub struct MockConnectomeStore {
    pub skeletons: RwLock<HashMap<u64, Vec<SkeletonNode>>>,
    pub connections: RwLock<Vec<SynapseConnection>>,
    pub neurons: RwLock<HashMap<u64, NeuronMeta>>,
    pub calls: RwLock<CallCounts>,
}

impl MockConnectomeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_skeleton(&self, body_id: u64, nodes: Vec<SkeletonNode>) {
        self.skeletons.write().await.insert(body_id, nodes);
    }

    pub async fn insert_neuron(&self, meta: NeuronMeta) {
        self.neurons.write().await.insert(meta.body_id, meta);
    }

    pub async fn insert_connection(&self, conn: SynapseConnection) {
        self.connections.write().await.push(conn);
    }

    pub async fn call_counts(&self) -> CallCounts {
        *self.calls.read().await
    }

    async fn matches_neuron(&self, criteria: &NeuronCriteria, body_id: u64) -> bool {
        if let Some(expected) = criteria.body_id {
            if body_id != expected {
                return false;
            }
        }
        if let Some(prefix) = &criteria.type_prefix {
            let neurons = self.neurons.read().await;
            let type_matches = neurons
                .get(&body_id)
                .and_then(|m| m.type_name.as_deref())
                .map(|t| t.starts_with(prefix.as_str()))
                .unwrap_or(false);
            if !type_matches {
                return false;
            }
        }
        true
    }

    fn matches_rois(criteria: &SynapseCriteria, conn: &SynapseConnection) -> bool {
        match &criteria.rois {
            None => true,
            Some(rois) => {
                let in_list = |roi: &Option<String>| {
                    roi.as_ref().map(|r| rois.contains(r)).unwrap_or(false)
                };
                in_list(&conn.roi_pre) || in_list(&conn.roi_post)
            }
        }
    }
}

#[async_trait]
impl ConnectomeStore for MockConnectomeStore {
    async fn fetch_skeleton(&self, body_id: u64) -> Result<Vec<SkeletonNode>> {
        self.calls.write().await.skeleton += 1;
        match self.skeletons.read().await.get(&body_id) {
            Some(nodes) => Ok(nodes.clone()),
            None => bail!("no skeleton for body {}", body_id),
        }
    }

    async fn fetch_synapse_connections(
        &self,
        source: &NeuronCriteria,
        target: &NeuronCriteria,
        synapse: &SynapseCriteria,
        _batch_size: Option<usize>,
    ) -> Result<Vec<SynapseConnection>> {
        self.calls.write().await.connections += 1;
        let all = self.connections.read().await.clone();
        let mut matched = Vec::new();
        for conn in all {
            if !self.matches_neuron(source, conn.body_pre).await {
                continue;
            }
            if !self.matches_neuron(target, conn.body_post).await {
                continue;
            }
            // primary_only is an opaque server-side filter; the mock keeps
            // every row.
            if !Self::matches_rois(synapse, &conn) {
                continue;
            }
            matched.push(conn);
        }
        Ok(matched)
    }

    async fn fetch_neurons(&self, body_ids: &[u64]) -> Result<Vec<NeuronMeta>> {
        self.calls.write().await.neurons += 1;
        let neurons = self.neurons.read().await;
        Ok(body_ids
            .iter()
            .filter_map(|id| neurons.get(id).cloned())
            .collect())
    }
}
