use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::{
    Resource,
    validate::{self, Validate, ValidationError, ValidationResult},
};

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    #[default]
    Draft,
    Active,
    Inactive,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Trigger,
    Condition,
    Action,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub kind: NodeKind,
    pub label: String,
    #[serde(default)]
    pub config: Value,
    #[serde(default)]
    pub position: Position,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub source: String,
    pub target: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Model {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub status: Status,
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Model {
    pub fn trigger(&self) -> Option<&Node> {
        self.nodes.iter().find(|node| node.kind == NodeKind::Trigger)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Draft {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Status,
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
}

impl Validate for Draft {
    fn validate(&self) -> ValidationResult {
        validate::required("name", &self.name)?;
        validate::max_length("name", &self.name, 200)?;
        validate_graph(&self.nodes, &self.edges)
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Changes {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nodes: Option<Vec<Node>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edges: Option<Vec<Edge>>,
}

impl Validate for Changes {
    fn validate(&self) -> ValidationResult {
        validate::optional(self.name.as_deref(), |v| validate::required("name", v))?;
        match (&self.nodes, &self.edges) {
            (Some(nodes), Some(edges)) => validate_graph(nodes, edges),
            (Some(nodes), None) => validate_graph(nodes, &[]),
            _ => Ok(()),
        }
    }
}

/// At most one trigger, unique node ids, and edges that point at known nodes.
fn validate_graph(nodes: &[Node], edges: &[Edge]) -> ValidationResult {
    let triggers = nodes
        .iter()
        .filter(|node| node.kind == NodeKind::Trigger)
        .count();
    if triggers > 1 {
        return Err(ValidationError::new("nodes", "only one trigger is allowed"));
    }
    for (idx, node) in nodes.iter().enumerate() {
        if nodes[..idx].iter().any(|other| other.id == node.id) {
            return Err(ValidationError::new(
                "nodes",
                format!("duplicate node id {}", node.id),
            ));
        }
    }
    let known = |id: &str| nodes.iter().any(|node| node.id == id);
    for edge in edges {
        if !known(&edge.source) || !known(&edge.target) {
            return Err(ValidationError::new(
                "edges",
                format!("edge {} -> {} references an unknown node", edge.source, edge.target),
            ));
        }
    }
    Ok(())
}

impl Resource for Model {
    const TABLE: &'static str = "workflows";
    type Draft = Draft;
    type Changes = Changes;

    fn id(&self) -> Uuid {
        self.id
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    #[default]
    Idle,
    Running,
    Completed,
    Failed,
}

impl ExecutionStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, ExecutionStatus::Completed | ExecutionStatus::Failed)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Execution {
    pub id: Uuid,
    pub workflow_id: Uuid,
    pub status: ExecutionStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

/// One line of a workflow test run, written by the backend runner.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExecutionLog {
    pub id: Uuid,
    pub execution_id: Uuid,
    pub node_id: Option<String>,
    pub level: LogLevel,
    pub message: String,
    #[serde(default)]
    pub status: Option<ExecutionStatus>,
    pub created_at: DateTime<Utc>,
}

impl ExecutionLog {
    pub const TABLE: &'static str = "workflow_execution_logs";

    pub fn is_terminal(&self) -> bool {
        self.status.is_some_and(ExecutionStatus::is_terminal)
    }
}
