//! Skeleton + synapse connection visualization
//!
//! `Visualizer` orchestrates the whole pipeline: fetch the skeleton and
//! reconstruct its segments, fetch pre- and/or post-synaptic connections,
//! enrich them with partner display names, rank partners by synapse count,
//! assign palette colors, and render everything to an SVG figure. The two
//! rankings are returned to the caller.

pub mod figure;

pub use figure::Figure;

use crate::neuprint::models::{
    merge_instance_names, NeuronCriteria, Side, SynapseConnection, SynapseCriteria,
};
use crate::neuprint::ConnectomeStore;
use crate::palette::{choose_palette, Color, Palette, PaletteFamily, DEFAULT_SKELETON_COLOR};
use crate::ranking::ConnectionRanking;
use crate::skeleton;
use anyhow::Result;
use std::collections::HashSet;
use std::path::PathBuf;
use thiserror::Error;

const DEFAULT_SYNAPSE_RADIUS: u32 = 3;

/// Errors from visualization preconditions.
#[derive(Debug, Error)]
pub enum VizError {
    #[error("must specify at least one of pre or post synaptic neuron type")]
    MissingSynapseDirection,
    #[error("unsupported dimensions {0}, pick 2 or 3")]
    InvalidDimensions(u8),
}

/// Options for one visualization run.
#[derive(Debug, Clone)]
pub struct VisualizeOptions {
    /// Body id of the neuron to examine.
    pub body_id: u64,
    /// Type prefix of upstream neurons whose synapses onto the neuron are
    /// drawn. Leave unset to skip the pre-synaptic branch.
    pub type_pre: Option<String>,
    /// Type prefix of downstream neurons the neuron synapses onto. Leave
    /// unset to skip the post-synaptic branch.
    pub type_post: Option<String>,
    /// Only keep pre-synaptic connections within these ROIs.
    pub rois_pre: Option<Vec<String>>,
    /// Only keep post-synaptic connections within these ROIs.
    pub rois_post: Option<Vec<String>>,
    /// Keep only the N partners with the most synapses.
    pub top: Option<usize>,
    /// Only primary synapses (server-defined notion).
    pub primary_only: bool,
    pub skeleton_color: Color,
    /// Explicit palette for pre-synaptic partners; chosen by policy if unset.
    pub pre_palette: Option<Palette>,
    /// Explicit palette for post-synaptic partners; chosen by policy if unset.
    pub post_palette: Option<Palette>,
    /// Cycle an 11-color palette for mid-sized partner sets instead of a
    /// wide palette with one color per partner.
    pub loop_colors: bool,
    /// 2 or 3; only 2D rendering is implemented, 3 falls back with a warning.
    pub dimensions: u8,
    /// Scatter marker radius in pixels.
    pub synapse_size: Option<u32>,
    /// Page size for the paginated connection fetch.
    pub batch_size: Option<usize>,
    pub output: PathBuf,
    pub figure_width: u32,
    pub figure_height: u32,
}

impl VisualizeOptions {
    pub fn new(body_id: u64) -> Self {
        Self {
            body_id,
            type_pre: None,
            type_post: None,
            rois_pre: None,
            rois_post: None,
            top: None,
            primary_only: true,
            skeleton_color: DEFAULT_SKELETON_COLOR,
            pre_palette: None,
            post_palette: None,
            loop_colors: true,
            dimensions: 2,
            synapse_size: None,
            batch_size: None,
            output: PathBuf::from("synapses.svg"),
            figure_width: 800,
            figure_height: 600,
        }
    }
}

/// Connection visualizer over an abstract connectome store.
pub struct Visualizer<S: ConnectomeStore> {
    store: S,
}

impl<S: ConnectomeStore> Visualizer<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Render the neuron skeleton with its filtered synapse connections and
    /// return the pre- and post-partner rankings.
    ///
    /// At least one of `type_pre` / `type_post` must be set; the check runs
    /// before any network round trip.
    pub async fn visualize(
        &self,
        opts: &VisualizeOptions,
    ) -> Result<(Option<ConnectionRanking>, Option<ConnectionRanking>)> {
        if opts.type_pre.is_none() && opts.type_post.is_none() {
            return Err(VizError::MissingSynapseDirection.into());
        }
        match opts.dimensions {
            2 => {}
            3 => tracing::warn!("3D rendering is not implemented, falling back to 2D"),
            other => return Err(VizError::InvalidDimensions(other).into()),
        }

        let nodes = self.store.fetch_skeleton(opts.body_id).await?;
        let segments = skeleton::segments(&nodes);
        tracing::info!(
            body_id = opts.body_id,
            nodes = nodes.len(),
            segments = segments.len(),
            "skeleton fetched"
        );

        let mut fig = Figure::new(opts.figure_width, opts.figure_height);
        fig.add_segments(segments, opts.skeleton_color);

        let radius = opts.synapse_size.unwrap_or(DEFAULT_SYNAPSE_RADIUS);
        let neuron = NeuronCriteria::with_body(opts.body_id);

        let pre_ranking = match &opts.type_pre {
            Some(type_pre) => {
                tracing::info!(type_prefix = %type_pre, "fetching pre-synaptic connections");
                let upstream = NeuronCriteria::with_type_prefix(type_pre.clone());
                let synapse = SynapseCriteria {
                    rois: opts.rois_pre.clone(),
                    primary_only: opts.primary_only,
                };
                let ranking = self
                    .connection_branch(
                        &upstream,
                        &neuron,
                        &synapse,
                        Side::Pre,
                        PaletteFamily::Plasma,
                        opts.pre_palette.clone(),
                        opts,
                        &mut fig,
                        radius,
                    )
                    .await?;
                Some(ranking)
            }
            None => None,
        };

        let post_ranking = match &opts.type_post {
            Some(type_post) => {
                tracing::info!(type_prefix = %type_post, "fetching post-synaptic connections");
                let downstream = NeuronCriteria::with_type_prefix(type_post.clone());
                let synapse = SynapseCriteria {
                    rois: opts.rois_post.clone(),
                    primary_only: opts.primary_only,
                };
                let ranking = self
                    .connection_branch(
                        &neuron,
                        &downstream,
                        &synapse,
                        Side::Post,
                        PaletteFamily::Viridis,
                        opts.post_palette.clone(),
                        opts,
                        &mut fig,
                        radius,
                    )
                    .await?;
                Some(ranking)
            }
            None => None,
        };

        fig.render_svg(&opts.output)?;
        tracing::info!(output = %opts.output.display(), "figure written");

        Ok((pre_ranking, post_ranking))
    }

    /// One synapse direction: fetch, enrich, rank, color, scatter.
    #[allow(clippy::too_many_arguments)]
    async fn connection_branch(
        &self,
        source: &NeuronCriteria,
        target: &NeuronCriteria,
        synapse: &SynapseCriteria,
        side: Side,
        family: PaletteFamily,
        explicit_palette: Option<Palette>,
        opts: &VisualizeOptions,
        fig: &mut Figure,
        radius: u32,
    ) -> Result<ConnectionRanking> {
        let mut conns = self
            .store
            .fetch_synapse_connections(source, target, synapse, opts.batch_size)
            .await?;
        if conns.is_empty() {
            tracing::info!("no connections matched");
            return Ok(ConnectionRanking::default());
        }

        let partner_ids = unique_partner_ids(&conns, side);
        let metas = self.store.fetch_neurons(&partner_ids).await?;
        merge_instance_names(&mut conns, &metas, side);

        let mut ranking = ConnectionRanking::from_partner_names(
            conns.iter().filter_map(|c| partner_name(c, side)),
        );
        if let Some(top) = opts.top {
            ranking = ranking.top(top);
        }

        let palette =
            explicit_palette.unwrap_or_else(|| choose_palette(family, ranking.len(), opts.loop_colors));
        let colors = palette.assign(&ranking);

        let points: Vec<(f64, f64, Color)> = conns
            .iter()
            .filter_map(|conn| {
                let name = partner_name(conn, side)?;
                let color = colors.get(name)?;
                let loc = match side {
                    Side::Pre => conn.loc_pre,
                    Side::Post => conn.loc_post,
                };
                Some((loc[0], loc[2], *color))
            })
            .collect();
        tracing::info!(
            partners = ranking.len(),
            synapses = points.len(),
            "connections ranked"
        );
        fig.add_scatter(points, radius);

        Ok(ranking)
    }
}

fn partner_name(conn: &SynapseConnection, side: Side) -> Option<&str> {
    match side {
        Side::Pre => conn.instance_pre.as_deref(),
        Side::Post => conn.instance_post.as_deref(),
    }
}

/// Distinct partner body ids in first-seen order.
fn unique_partner_ids(conns: &[SynapseConnection], side: Side) -> Vec<u64> {
    let mut seen = HashSet::new();
    conns
        .iter()
        .map(|c| match side {
            Side::Pre => c.body_pre,
            Side::Post => c.body_post,
        })
        .filter(|id| seen.insert(*id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::neuprint::mock::MockConnectomeStore;
    use crate::neuprint::models::{NeuronMeta, SkeletonNode};

    fn node(row_id: i64, link: i64) -> SkeletonNode {
        SkeletonNode {
            row_id,
            link,
            x: row_id as f64 * 10.0,
            y: 0.0,
            z: row_id as f64 * 5.0,
            radius: 1.0,
        }
    }

    fn conn(body_pre: u64, body_post: u64, roi: Option<&str>) -> SynapseConnection {
        SynapseConnection {
            body_pre,
            body_post,
            loc_pre: [1.0, 2.0, 3.0],
            loc_post: [4.0, 5.0, 6.0],
            roi_pre: roi.map(str::to_string),
            roi_post: None,
            confidence: 0.9,
            instance_pre: None,
            instance_post: None,
        }
    }

    fn meta(body_id: u64, instance: &str, type_name: &str) -> NeuronMeta {
        NeuronMeta {
            body_id,
            instance: Some(instance.to_string()),
            type_name: Some(type_name.to_string()),
        }
    }

    async fn store_with_skeleton(body_id: u64) -> MockConnectomeStore {
        let store = MockConnectomeStore::new();
        store
            .insert_skeleton(body_id, vec![node(1, 0), node(2, 1), node(3, 1)])
            .await;
        store
    }

    fn out_path(dir: &tempfile::TempDir) -> PathBuf {
        dir.path().join("out.svg")
    }

    #[tokio::test]
    async fn rejects_missing_direction_without_network_calls() {
        let viz = Visualizer::new(MockConnectomeStore::new());
        let opts = VisualizeOptions::new(123);
        let err = viz.visualize(&opts).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<VizError>(),
            Some(VizError::MissingSynapseDirection)
        ));
        assert_eq!(viz.store().call_counts().await.total(), 0);
    }

    #[tokio::test]
    async fn rejects_bad_dimensions() {
        let viz = Visualizer::new(MockConnectomeStore::new());
        let mut opts = VisualizeOptions::new(123);
        opts.type_pre = Some("KC".into());
        opts.dimensions = 7;
        let err = viz.visualize(&opts).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<VizError>(),
            Some(VizError::InvalidDimensions(7))
        ));
    }

    #[tokio::test]
    async fn pre_branch_ranks_and_renders() {
        let store = store_with_skeleton(100).await;
        store.insert_neuron(meta(10, "KCa_R", "KCa")).await;
        store.insert_neuron(meta(11, "KCb_L", "KCb")).await;
        for _ in 0..3 {
            store.insert_connection(conn(10, 100, None)).await;
        }
        store.insert_connection(conn(11, 100, None)).await;
        // Different upstream type, must not match the KC prefix.
        store.insert_neuron(meta(12, "PN_R", "PN")).await;
        store.insert_connection(conn(12, 100, None)).await;

        let dir = tempfile::tempdir().unwrap();
        let viz = Visualizer::new(store);
        let mut opts = VisualizeOptions::new(100);
        opts.type_pre = Some("KC".into());
        opts.output = out_path(&dir);

        let (pre, post) = viz.visualize(&opts).await.unwrap();
        assert!(post.is_none());
        let pre = pre.unwrap();
        let entries: Vec<_> = pre.iter().collect();
        assert_eq!(entries, vec![("KCa_R", 3), ("KCb_L", 1)]);
        assert!(opts.output.exists());

        // Exactly three round trips: skeleton, connections, neuron metadata.
        let counts = viz.store().call_counts().await;
        assert_eq!(counts.skeleton, 1);
        assert_eq!(counts.connections, 1);
        assert_eq!(counts.neurons, 1);
    }

    #[tokio::test]
    async fn post_branch_reverses_roles() {
        let store = store_with_skeleton(100).await;
        store.insert_neuron(meta(20, "MBON01_R", "MBON01")).await;
        store.insert_connection(conn(100, 20, None)).await;

        let dir = tempfile::tempdir().unwrap();
        let viz = Visualizer::new(store);
        let mut opts = VisualizeOptions::new(100);
        opts.type_post = Some("MBON".into());
        opts.output = out_path(&dir);

        let (pre, post) = viz.visualize(&opts).await.unwrap();
        assert!(pre.is_none());
        let post = post.unwrap();
        assert_eq!(post.iter().collect::<Vec<_>>(), vec![("MBON01_R", 1)]);
    }

    #[tokio::test]
    async fn top_truncates_ranking() {
        let store = store_with_skeleton(100).await;
        store.insert_neuron(meta(10, "A", "KCa")).await;
        store.insert_neuron(meta(11, "B", "KCb")).await;
        store.insert_neuron(meta(12, "C", "KCg")).await;
        for _ in 0..5 {
            store.insert_connection(conn(10, 100, None)).await;
        }
        for _ in 0..3 {
            store.insert_connection(conn(11, 100, None)).await;
        }
        store.insert_connection(conn(12, 100, None)).await;

        let dir = tempfile::tempdir().unwrap();
        let viz = Visualizer::new(store);
        let mut opts = VisualizeOptions::new(100);
        opts.type_pre = Some("KC".into());
        opts.top = Some(2);
        opts.output = out_path(&dir);

        let (pre, _) = viz.visualize(&opts).await.unwrap();
        let entries: Vec<_> = pre.unwrap().iter().map(|(n, c)| (n.to_string(), c)).collect();
        assert_eq!(entries, vec![("A".to_string(), 5), ("B".to_string(), 3)]);
    }

    #[tokio::test]
    async fn roi_filter_limits_connections() {
        let store = store_with_skeleton(100).await;
        store.insert_neuron(meta(10, "A", "KCa")).await;
        store.insert_connection(conn(10, 100, Some("EB"))).await;
        store.insert_connection(conn(10, 100, Some("FB"))).await;

        let dir = tempfile::tempdir().unwrap();
        let viz = Visualizer::new(store);
        let mut opts = VisualizeOptions::new(100);
        opts.type_pre = Some("KC".into());
        opts.rois_pre = Some(vec!["EB".into()]);
        opts.output = out_path(&dir);

        let (pre, _) = viz.visualize(&opts).await.unwrap();
        assert_eq!(pre.unwrap().iter().collect::<Vec<_>>(), vec![("A", 1)]);
    }

    #[tokio::test]
    async fn empty_connection_result_yields_empty_ranking() {
        let store = store_with_skeleton(100).await;
        let dir = tempfile::tempdir().unwrap();
        let viz = Visualizer::new(store);
        let mut opts = VisualizeOptions::new(100);
        opts.type_pre = Some("KC".into());
        opts.output = out_path(&dir);

        let (pre, _) = viz.visualize(&opts).await.unwrap();
        assert!(pre.unwrap().is_empty());
        // No metadata round trip for an empty result.
        assert_eq!(viz.store().call_counts().await.neurons, 0);
    }

    #[tokio::test]
    async fn both_branches_run_together() {
        let store = store_with_skeleton(100).await;
        store.insert_neuron(meta(10, "KCa_R", "KCa")).await;
        store.insert_neuron(meta(20, "MBON01_R", "MBON01")).await;
        store.insert_connection(conn(10, 100, None)).await;
        store.insert_connection(conn(100, 20, None)).await;

        let dir = tempfile::tempdir().unwrap();
        let viz = Visualizer::new(store);
        let mut opts = VisualizeOptions::new(100);
        opts.type_pre = Some("KC".into());
        opts.type_post = Some("MBON".into());
        opts.output = out_path(&dir);

        let (pre, post) = viz.visualize(&opts).await.unwrap();
        assert_eq!(pre.unwrap().len(), 1);
        assert_eq!(post.unwrap().len(), 1);
    }
}
