//! HTTP client for neuPrint-style connectome servers
//!
//! Skeletons come from the REST skeleton endpoint; synapse connections and
//! neuron metadata are fetched with Cypher submitted to the custom-query
//! endpoint. Both return the same `{columns, data}` tabular shape.

use super::models::*;
use super::traits::ConnectomeStore;
use crate::config::Config;
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::Deserialize;
use serde_json::Value;

/// Client for a neuPrint-style connectome server.
///
/// Cheap to clone is not needed; the inner reqwest client pools connections
/// and the type is `Send + Sync`, so one instance can be shared by reference.
pub struct NeuprintClient {
    http: reqwest::Client,
    server: String,
    dataset: String,
}

/// Escape single quotes for embedding a string in a Cypher literal
fn escape_cypher(s: &str) -> String {
    s.replace('\'', "\\'")
}

/// Builder for dynamic WHERE clauses in Cypher queries
#[derive(Default)]
pub struct WhereBuilder {
    conditions: Vec<String>,
}

impl WhereBuilder {
    /// Create a new empty WhereBuilder
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a body-identity filter
    pub fn add_body_filter(&mut self, alias: &str, body_id: Option<u64>) -> &mut Self {
        if let Some(body_id) = body_id {
            self.conditions.push(format!("{}.bodyId = {}", alias, body_id));
        }
        self
    }

    /// Add a type-name prefix filter (rendered as a regex match)
    pub fn add_type_prefix_filter(&mut self, alias: &str, prefix: Option<&str>) -> &mut Self {
        if let Some(prefix) = prefix {
            if !prefix.is_empty() {
                self.conditions
                    .push(format!("{}.type =~ '{}.*'", alias, escape_cypher(prefix)));
            }
        }
        self
    }

    /// Add all conditions from a neuron criteria object
    pub fn add_neuron_criteria(&mut self, alias: &str, criteria: &NeuronCriteria) -> &mut Self {
        self.add_body_filter(alias, criteria.body_id);
        self.add_type_prefix_filter(alias, criteria.type_prefix.as_deref());
        self
    }

    /// Add a region-of-interest filter matching either synapse side
    pub fn add_roi_filter(&mut self, aliases: [&str; 2], rois: Option<&[String]>) -> &mut Self {
        if let Some(rois) = rois {
            if !rois.is_empty() {
                let list = rois
                    .iter()
                    .map(|r| format!("'{}'", escape_cypher(r)))
                    .collect::<Vec<_>>()
                    .join(", ");
                self.conditions.push(format!(
                    "({}.roi IN [{list}] OR {}.roi IN [{list}])",
                    aliases[0], aliases[1]
                ));
            }
        }
        self
    }

    /// Add a primary-synapses-only filter
    pub fn add_primary_filter(&mut self, alias: &str, primary_only: bool) -> &mut Self {
        if primary_only {
            self.conditions.push(format!("{}.primary = true", alias));
        }
        self
    }

    /// Render the WHERE clause, or an empty string if no conditions were added
    pub fn build(&self) -> String {
        if self.conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", self.conditions.join(" AND "))
        }
    }
}

// ============================================================================
// Tabular responses
// ============================================================================

/// `{columns, data}` row-major response shape shared by the skeleton and
/// custom-query endpoints.
#[derive(Debug, Deserialize)]
pub struct TabularResponse {
    pub columns: Vec<String>,
    pub data: Vec<Vec<Value>>,
}

impl TabularResponse {
    /// Look up a column index by name, failing on a malformed response.
    fn column(&self, name: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c == name)
            .with_context(|| format!("response missing column '{}'", name))
    }
}

fn as_f64(value: &Value) -> Result<f64> {
    value
        .as_f64()
        .with_context(|| format!("expected number, got {}", value))
}

fn as_i64(value: &Value) -> Result<i64> {
    value
        .as_i64()
        .with_context(|| format!("expected integer, got {}", value))
}

fn as_u64(value: &Value) -> Result<u64> {
    value
        .as_u64()
        .with_context(|| format!("expected unsigned integer, got {}", value))
}

fn as_opt_string(value: &Value) -> Option<String> {
    value.as_str().map(str::to_string)
}

// ============================================================================
// Client
// ============================================================================

impl NeuprintClient {
    /// Build a client from configuration. The bearer token is installed as a
    /// default header once; there is no rotation or refresh.
    pub fn new(config: &Config) -> Result<Self> {
        let mut headers = HeaderMap::new();
        if !config.token.is_empty() {
            let value = HeaderValue::from_str(&format!("Bearer {}", config.token))
                .context("invalid characters in NEUPRINT_TOKEN")?;
            headers.insert(AUTHORIZATION, value);
        }
        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            http,
            server: config.server.trim_end_matches('/').to_string(),
            dataset: config.dataset.clone(),
        })
    }

    /// Submit a Cypher query to the custom-query endpoint.
    async fn run_cypher(&self, cypher: &str) -> Result<TabularResponse> {
        tracing::debug!(%cypher, "running cypher query");
        let url = format!("{}/api/custom/custom", self.server);
        let resp = self
            .http
            .post(&url)
            .json(&serde_json::json!({
                "cypher": cypher,
                "dataset": self.dataset,
            }))
            .send()
            .await
            .with_context(|| format!("query request to {} failed", url))?
            .error_for_status()
            .context("connectome server rejected query")?;
        resp.json::<TabularResponse>()
            .await
            .context("malformed query response")
    }

    fn decode_skeleton(table: &TabularResponse) -> Result<Vec<SkeletonNode>> {
        let row_id = table.column("rowId")?;
        let x = table.column("x")?;
        let y = table.column("y")?;
        let z = table.column("z")?;
        let radius = table.column("radius")?;
        let link = table.column("link")?;

        let mut nodes = Vec::with_capacity(table.data.len());
        for row in &table.data {
            if row.len() != table.columns.len() {
                bail!("skeleton row has {} fields, expected {}", row.len(), table.columns.len());
            }
            nodes.push(SkeletonNode {
                row_id: as_i64(&row[row_id])?,
                link: as_i64(&row[link])?,
                x: as_f64(&row[x])?,
                y: as_f64(&row[y])?,
                z: as_f64(&row[z])?,
                radius: as_f64(&row[radius])?,
            });
        }
        Ok(nodes)
    }

    fn decode_connections(table: &TabularResponse) -> Result<Vec<SynapseConnection>> {
        let body_pre = table.column("bodyId_pre")?;
        let body_post = table.column("bodyId_post")?;
        let x_pre = table.column("x_pre")?;
        let y_pre = table.column("y_pre")?;
        let z_pre = table.column("z_pre")?;
        let x_post = table.column("x_post")?;
        let y_post = table.column("y_post")?;
        let z_post = table.column("z_post")?;
        let roi_pre = table.column("roi_pre")?;
        let roi_post = table.column("roi_post")?;
        let confidence = table.column("confidence")?;

        let mut conns = Vec::with_capacity(table.data.len());
        for row in &table.data {
            conns.push(SynapseConnection {
                body_pre: as_u64(&row[body_pre])?,
                body_post: as_u64(&row[body_post])?,
                loc_pre: [as_f64(&row[x_pre])?, as_f64(&row[y_pre])?, as_f64(&row[z_pre])?],
                loc_post: [as_f64(&row[x_post])?, as_f64(&row[y_post])?, as_f64(&row[z_post])?],
                roi_pre: as_opt_string(&row[roi_pre]),
                roi_post: as_opt_string(&row[roi_post]),
                confidence: row[confidence].as_f64().unwrap_or(0.0),
                instance_pre: None,
                instance_post: None,
            });
        }
        Ok(conns)
    }

    fn connection_cypher(
        source: &NeuronCriteria,
        target: &NeuronCriteria,
        synapse: &SynapseCriteria,
    ) -> String {
        let mut wb = WhereBuilder::new();
        wb.add_neuron_criteria("pre", source)
            .add_neuron_criteria("post", target)
            .add_roi_filter(["sp", "sq"], synapse.rois.as_deref())
            .add_primary_filter("sp", synapse.primary_only);

        format!(
            "MATCH (pre:Neuron)-[:Contains]->(:SynapseSet)-[:Contains]->(sp:Synapse)\
             -[:SynapsesTo]->(sq:Synapse)<-[:Contains]-(:SynapseSet)<-[:Contains]-(post:Neuron) \
             {} \
             RETURN pre.bodyId AS bodyId_pre, post.bodyId AS bodyId_post, \
             sp.location.x AS x_pre, sp.location.y AS y_pre, sp.location.z AS z_pre, \
             sq.location.x AS x_post, sq.location.y AS y_post, sq.location.z AS z_post, \
             sp.roi AS roi_pre, sq.roi AS roi_post, sq.confidence AS confidence \
             ORDER BY bodyId_pre, bodyId_post",
            wb.build()
        )
    }
}

#[async_trait]
impl ConnectomeStore for NeuprintClient {
    async fn fetch_skeleton(&self, body_id: u64) -> Result<Vec<SkeletonNode>> {
        let url = format!(
            "{}/api/skeletons/skeleton/{}/{}",
            self.server, self.dataset, body_id
        );
        tracing::debug!(%url, "fetching skeleton");
        let resp = self
            .http
            .get(&url)
            .query(&[("format", "json")])
            .send()
            .await
            .with_context(|| format!("skeleton request for body {} failed", body_id))?
            .error_for_status()
            .with_context(|| format!("skeleton fetch for body {} rejected", body_id))?;
        let table: TabularResponse = resp.json().await.context("malformed skeleton response")?;
        Self::decode_skeleton(&table)
    }

    async fn fetch_synapse_connections(
        &self,
        source: &NeuronCriteria,
        target: &NeuronCriteria,
        synapse: &SynapseCriteria,
        batch_size: Option<usize>,
    ) -> Result<Vec<SynapseConnection>> {
        let base = Self::connection_cypher(source, target, synapse);
        // A zero page size would never advance; treat it as unpaginated.
        match batch_size.filter(|n| *n > 0) {
            None => {
                let table = self.run_cypher(&base).await?;
                Self::decode_connections(&table)
            }
            Some(page) => {
                // SKIP/LIMIT pagination; a short page terminates the loop.
                let mut all = Vec::new();
                let mut offset = 0usize;
                loop {
                    let cypher = format!("{} SKIP {} LIMIT {}", base, offset, page);
                    let table = self.run_cypher(&cypher).await?;
                    let rows = Self::decode_connections(&table)?;
                    let n = rows.len();
                    all.extend(rows);
                    if n < page {
                        break;
                    }
                    offset += page;
                }
                Ok(all)
            }
        }
    }

    async fn fetch_neurons(&self, body_ids: &[u64]) -> Result<Vec<NeuronMeta>> {
        if body_ids.is_empty() {
            return Ok(Vec::new());
        }
        let list = body_ids
            .iter()
            .map(u64::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        let cypher = format!(
            "MATCH (n:Neuron) WHERE n.bodyId IN [{}] \
             RETURN n.bodyId AS bodyId, n.instance AS instance, n.type AS type",
            list
        );
        let table = self.run_cypher(&cypher).await?;
        let body_id = table.column("bodyId")?;
        let instance = table.column("instance")?;
        let type_name = table.column("type")?;
        let mut metas = Vec::with_capacity(table.data.len());
        for row in &table.data {
            metas.push(NeuronMeta {
                body_id: as_u64(&row[body_id])?,
                instance: as_opt_string(&row[instance]),
                type_name: as_opt_string(&row[type_name]),
            });
        }
        Ok(metas)
    }
}
