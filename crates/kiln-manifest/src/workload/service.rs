//! Service types

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::ObjectMeta;
use crate::kind::ResourceKind;
use crate::resource::FieldMap;
use crate::schema::{paths, APP_LABEL};
use crate::Result;

/// Kubernetes Service
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    /// API version
    pub api_version: String,
    /// Kind
    pub kind: String,
    /// Metadata
    pub metadata: ObjectMeta,
    /// Spec
    pub spec: ServiceSpec,
}

/// Service spec
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ServiceSpec {
    /// ClusterIP, NodePort or LoadBalancer
    #[serde(rename = "type")]
    pub type_: String,
    /// Selector
    pub selector: BTreeMap<String, String>,
    /// Ports
    pub ports: Vec<ServicePort>,
}

/// Service port
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ServicePort {
    /// Port name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Port number
    pub port: u16,
    /// Target port
    pub target_port: u16,
    /// Protocol
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
}

pub(super) fn compile_service(fields: &FieldMap) -> Result<Service> {
    Ok(Service {
        api_version: ResourceKind::Service.api_version().to_string(),
        kind: ResourceKind::Service.kind_str().to_string(),
        metadata: ObjectMeta::from_fields(fields)?,
        spec: ServiceSpec {
            type_: fields.str(paths::SERVICE_TYPE)?.to_string(),
            selector: BTreeMap::from([(
                APP_LABEL.to_string(),
                fields.str(paths::SERVICE_SELECTOR_APP)?.to_string(),
            )]),
            ports: vec![ServicePort {
                name: fields.opt_str(paths::SERVICE_PORT_NAME)?.map(str::to_string),
                port: fields.port(paths::SERVICE_PORT)?,
                target_port: fields.port(paths::SERVICE_TARGET_PORT)?,
                protocol: fields.opt_str(paths::SERVICE_PROTOCOL)?.map(str::to_string),
            }],
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::FieldValue;

    #[test]
    fn test_service_spec_order() {
        let mut fields = FieldMap::new();
        for (path, value) in [
            (paths::NAME, "n8n"),
            (paths::NAMESPACE, "n8n"),
            (paths::APP_LABEL, "n8n"),
            (paths::SERVICE_TYPE, "LoadBalancer"),
            (paths::SERVICE_SELECTOR_APP, "n8n"),
            (paths::SERVICE_PORT_NAME, "http"),
            (paths::SERVICE_PROTOCOL, "TCP"),
        ] {
            fields.insert(path, FieldValue::Str(value.to_string()));
        }
        fields.insert(paths::SERVICE_PORT, FieldValue::Int(80));
        fields.insert(paths::SERVICE_TARGET_PORT, FieldValue::Int(3008));

        let value = serde_json::to_value(compile_service(&fields).unwrap()).unwrap();
        let keys: Vec<_> = value["spec"].as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["type", "selector", "ports"]);
        assert_eq!(
            value["spec"]["ports"][0],
            serde_json::json!({
                "name": "http",
                "port": 80,
                "targetPort": 3008,
                "protocol": "TCP"
            })
        );
    }
}
