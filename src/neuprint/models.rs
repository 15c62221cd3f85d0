//! Typed records for the connectome server boundary

use serde::{Deserialize, Serialize};

// ============================================================================
// Skeleton
// ============================================================================

/// One node of a traced neuron skeleton.
///
/// `link` is the row id of the parent node; `0` or `-1` marks the root.
/// `radius` comes with the SWC-style rows but is unused by 2D drawing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkeletonNode {
    pub row_id: i64,
    pub link: i64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub radius: f64,
}

impl SkeletonNode {
    /// Whether this node is the skeleton root (no parent link).
    pub fn is_root(&self) -> bool {
        self.link <= 0
    }
}

/// A drawable parent→child line segment, derived per non-root node.
/// Ephemeral, recomputed per call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkeletonSegment {
    pub parent: [f64; 3],
    pub child: [f64; 3],
}

// ============================================================================
// Synapse connections
// ============================================================================

/// One pre→post synapse pairing returned by a connection query.
///
/// `instance_pre` / `instance_post` are filled by [`merge_instance_names`]
/// after a neuron metadata fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynapseConnection {
    pub body_pre: u64,
    pub body_post: u64,
    pub loc_pre: [f64; 3],
    pub loc_post: [f64; 3],
    pub roi_pre: Option<String>,
    pub roi_post: Option<String>,
    pub confidence: f64,
    #[serde(default)]
    pub instance_pre: Option<String>,
    #[serde(default)]
    pub instance_post: Option<String>,
}

/// Neuron metadata used for display-name enrichment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeuronMeta {
    pub body_id: u64,
    pub instance: Option<String>,
    #[serde(rename = "type")]
    pub type_name: Option<String>,
}

/// Which end of a connection a filter or enrichment applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Pre,
    Post,
}

// ============================================================================
// Query criteria
// ============================================================================

/// Neuron-matching criteria for connection queries.
///
/// `type_prefix` is a prefix pattern: it matches any type name starting with
/// the given string (rendered as `type =~ 'PREFIX.*'` on the server side).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NeuronCriteria {
    pub body_id: Option<u64>,
    pub type_prefix: Option<String>,
}

impl NeuronCriteria {
    /// Match a single neuron by body id.
    pub fn with_body(body_id: u64) -> Self {
        Self {
            body_id: Some(body_id),
            ..Self::default()
        }
    }

    /// Match neurons whose type starts with the given prefix.
    pub fn with_type_prefix(prefix: impl Into<String>) -> Self {
        Self {
            type_prefix: Some(prefix.into()),
            ..Self::default()
        }
    }
}

/// Synapse-matching criteria. ROI names and the "primary only" flag are
/// opaque server-side filters; they are rendered into the query unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct SynapseCriteria {
    pub rois: Option<Vec<String>>,
    pub primary_only: bool,
}

impl Default for SynapseCriteria {
    fn default() -> Self {
        Self {
            rois: None,
            primary_only: true,
        }
    }
}

// ============================================================================
// Enrichment
// ============================================================================

/// Fill in the partner display name on one side of each connection.
///
/// Falls back to the neuron type, then to the body id rendered as a string,
/// when no instance name is available.
pub fn merge_instance_names(
    connections: &mut [SynapseConnection],
    metas: &[NeuronMeta],
    side: Side,
) {
    let by_body: std::collections::HashMap<u64, &NeuronMeta> =
        metas.iter().map(|m| (m.body_id, m)).collect();

    for conn in connections.iter_mut() {
        let body = match side {
            Side::Pre => conn.body_pre,
            Side::Post => conn.body_post,
        };
        let name = by_body
            .get(&body)
            .and_then(|m| m.instance.clone().or_else(|| m.type_name.clone()))
            .unwrap_or_else(|| body.to_string());
        match side {
            Side::Pre => conn.instance_pre = Some(name),
            Side::Post => conn.instance_post = Some(name),
        }
    }
}
