//! Instance normalizer — raw fleet records to `FalkorInstance`.
//!
//! A raw record nests everything under `consumptionResourceInstanceResult`.
//! Its `detailedNetworkTopology` maps internal resource keys to connectivity
//! details and mixes the user-facing database endpoint with control-plane
//! endpoints. The only distinguishing marks are endpoint presence and the
//! resource-name prefix, so selection is: non-empty `clusterEndpoint` and a
//! `resourceName` outside the reserved prefix. Exactly one entry must match.

use std::collections::BTreeMap;

use falkorlink_core::{FalkorInstance, RUNNING_STATUS};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{FleetError, FleetResult};

/// Response body of the fleet instance listing.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceListing {
    #[serde(default)]
    pub resource_instances: Option<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct RawInstance {
    #[serde(rename = "consumptionResourceInstanceResult")]
    result: RawResult,
}

#[derive(Debug, Deserialize)]
struct RawResult {
    id: String,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    cloud_provider: Option<String>,
    #[serde(default)]
    region: Option<String>,
    #[serde(default)]
    result_params: Option<Map<String, Value>>,
    #[serde(default, rename = "detailedNetworkTopology")]
    topology: Option<BTreeMap<String, Value>>,
}

/// The user-facing endpoint selected from a topology map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub resource_key: String,
    pub hostname: String,
    pub port: Option<u16>,
}

/// Normalize a listing, keeping only running instances.
pub fn normalize_instances(
    records: Vec<Value>,
    reserved_prefix: &str,
) -> FleetResult<Vec<FalkorInstance>> {
    let mut instances = Vec::new();
    for raw in records {
        if let Some(instance) = normalize_instance(raw, reserved_prefix)? {
            instances.push(instance);
        }
    }
    Ok(instances)
}

/// Normalize one raw record. Returns `None` for instances that are not running.
///
/// Status is checked before topology so a stopped instance without an
/// endpoint does not fail the listing.
pub fn normalize_instance(
    raw: Value,
    reserved_prefix: &str,
) -> FleetResult<Option<FalkorInstance>> {
    let RawInstance { result } =
        serde_json::from_value(raw).map_err(|e| FleetError::MalformedRecord(e.to_string()))?;

    let status = result.status.unwrap_or_default();
    if status != RUNNING_STATUS {
        debug!(instance_id = %result.id, %status, "skipping instance that is not running");
        return Ok(None);
    }

    let topology = result.topology.unwrap_or_default();
    let endpoint = select_endpoint(&result.id, &topology, reserved_prefix)?;
    debug!(instance_id = %result.id, resource = %endpoint.resource_key, "endpoint selected");
    let params = result.result_params.unwrap_or_default();

    Ok(Some(FalkorInstance {
        id: result.id,
        name: string_param(&params, "name"),
        cloud_provider: result.cloud_provider.unwrap_or_default(),
        region: result.region.unwrap_or_default(),
        status,
        username: string_param(&params, "username"),
        hostname: Some(endpoint.hostname),
        port: endpoint.port,
    }))
}

/// Pick the single user-facing entry of a topology map.
pub fn select_endpoint(
    instance_id: &str,
    topology: &BTreeMap<String, Value>,
    reserved_prefix: &str,
) -> FleetResult<Endpoint> {
    let mut candidates: Vec<Endpoint> = topology
        .iter()
        .filter_map(|(key, details)| {
            let details = details.as_object()?;
            let hostname = details
                .get("clusterEndpoint")
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())?;
            let resource_name = details
                .get("resourceName")
                .and_then(Value::as_str)
                .unwrap_or_default();
            if resource_name.starts_with(reserved_prefix) {
                return None;
            }
            Some(Endpoint {
                resource_key: key.clone(),
                hostname: hostname.to_string(),
                port: first_port(details),
            })
        })
        .collect();

    match candidates.len() {
        0 => Err(FleetError::NoEndpoint {
            instance_id: instance_id.to_string(),
        }),
        1 => Ok(candidates.remove(0)),
        n => Err(FleetError::AmbiguousEndpoint {
            instance_id: instance_id.to_string(),
            candidates: n,
        }),
    }
}

fn first_port(details: &Map<String, Value>) -> Option<u16> {
    let first = details.get("clusterPorts")?.as_array()?.first()?;
    match first {
        Value::Number(n) => n.as_u64().and_then(|p| u16::try_from(p).ok()),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

fn string_param(params: &Map<String, Value>, key: &str) -> String {
    params
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const PREFIX: &str = "Omnistrate";

    fn raw(id: &str, status: &str, topology: Value) -> Value {
        json!({
            "consumptionResourceInstanceResult": {
                "id": id,
                "status": status,
                "cloud_provider": "gcp",
                "region": "us-central1",
                "result_params": { "name": "my-graph", "username": "falkordb" },
                "detailedNetworkTopology": topology
            }
        })
    }

    fn user_facing() -> Value {
        json!({
            "r-control": {
                "resourceName": "Omnistrate Observability",
                "clusterEndpoint": "control.internal",
                "clusterPorts": [9000]
            },
            "r-db": {
                "resourceName": "node-s",
                "clusterEndpoint": "db.example.com",
                "clusterPorts": [6379, 16379]
            },
            "r-proxy": {
                "resourceName": "proxy",
                "clusterEndpoint": ""
            }
        })
    }

    #[test]
    fn selects_the_user_facing_endpoint() {
        let inst = normalize_instance(raw("i-1", "RUNNING", user_facing()), PREFIX)
            .unwrap()
            .unwrap();
        assert_eq!(inst.id, "i-1");
        assert_eq!(inst.name, "my-graph");
        assert_eq!(inst.cloud_provider, "gcp");
        assert_eq!(inst.username, "falkordb");
        assert_eq!(inst.hostname.as_deref(), Some("db.example.com"));
        assert_eq!(inst.port, Some(6379));

        let topology: BTreeMap<String, Value> =
            serde_json::from_value(user_facing()).unwrap();
        let endpoint = select_endpoint("i-1", &topology, PREFIX).unwrap();
        assert_eq!(endpoint.resource_key, "r-db");
    }

    #[test]
    fn excludes_instances_not_running() {
        for status in ["STOPPED", "DEPLOYING", "FAILED", "running", ""] {
            let out = normalize_instance(raw("i-1", status, user_facing()), PREFIX).unwrap();
            assert!(out.is_none(), "status {status:?} should be excluded");
        }
    }

    #[test]
    fn stopped_instance_without_topology_is_skipped_not_failed() {
        let out = normalize_instances(vec![raw("i-1", "STOPPED", json!({}))], PREFIX).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn zero_matches_is_an_error() {
        let topology = json!({
            "r-control": { "resourceName": "Omnistrate", "clusterEndpoint": "control.internal" }
        });
        let err = normalize_instance(raw("i-9", "RUNNING", topology), PREFIX).unwrap_err();
        assert!(matches!(err, FleetError::NoEndpoint { ref instance_id } if instance_id == "i-9"));
        assert!(err.is_normalization());
    }

    #[test]
    fn missing_topology_is_an_error() {
        let mut record = raw("i-2", "RUNNING", json!(null));
        record["consumptionResourceInstanceResult"]
            .as_object_mut()
            .unwrap()
            .remove("detailedNetworkTopology");
        let err = normalize_instance(record, PREFIX).unwrap_err();
        assert!(matches!(err, FleetError::NoEndpoint { .. }));
    }

    #[test]
    fn multiple_matches_is_an_error() {
        let topology = json!({
            "a": { "resourceName": "node-a", "clusterEndpoint": "a.example.com" },
            "b": { "resourceName": "node-b", "clusterEndpoint": "b.example.com" }
        });
        let err = normalize_instance(raw("i-3", "RUNNING", topology), PREFIX).unwrap_err();
        assert!(matches!(err, FleetError::AmbiguousEndpoint { candidates: 2, .. }));
    }

    #[test]
    fn ignores_non_object_topology_values() {
        let topology = json!({
            "meta": "not-an-object",
            "list": [1, 2, 3],
            "r-db": { "clusterEndpoint": "db.example.com" }
        });
        let inst = normalize_instance(raw("i-4", "RUNNING", topology), PREFIX)
            .unwrap()
            .unwrap();
        assert_eq!(inst.hostname.as_deref(), Some("db.example.com"));
        assert_eq!(inst.port, None);
    }

    #[test]
    fn port_as_string_is_accepted() {
        let topology = json!({
            "r-db": { "resourceName": "db", "clusterEndpoint": "h", "clusterPorts": ["6380"] }
        });
        let inst = normalize_instance(raw("i-5", "RUNNING", topology), PREFIX)
            .unwrap()
            .unwrap();
        assert_eq!(inst.port, Some(6380));
    }

    #[test]
    fn missing_result_params_default_to_empty() {
        let mut record = raw("i-6", "RUNNING", user_facing());
        record["consumptionResourceInstanceResult"]
            .as_object_mut()
            .unwrap()
            .remove("result_params");
        let inst = normalize_instance(record, PREFIX).unwrap().unwrap();
        assert_eq!(inst.name, "");
        assert_eq!(inst.username, "");
    }

    #[test]
    fn record_without_result_is_malformed() {
        let err = normalize_instance(json!({ "other": 1 }), PREFIX).unwrap_err();
        assert!(matches!(err, FleetError::MalformedRecord(_)));
    }
}
