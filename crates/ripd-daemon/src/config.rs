// Copyright 2025 Cedric Hammes
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Loads the per-node configuration record: the node's own id, the ports it listens on, and
//! its neighbors. The record is a handful of `KEY value...` lines rather than a structured
//! format, mirroring the three-field record (`ROUTER_ID`/`INPUTS`/`OUTPUTS`) this daemon's
//! protocol behavior was modeled on, translated from a CSV-with-one-row layout into one line
//! per field.

use std::collections::HashSet;
use std::path::Path;

use ripd_common::NodeId;
use ripd_table::NeighborDescriptor;
use thiserror::Error;

pub const INPUT_PORT_MIN: u16 = 1024;
pub const INPUT_PORT_MAX: u16 = 64_000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unable to read configuration file: {0}")]
    Io(#[from] std::io::Error),
    #[error("missing required field '{0}'")]
    MissingField(&'static str),
    #[error("field '{0}' specified more than once")]
    DuplicateField(&'static str),
    #[error("unrecognized configuration line: '{0}'")]
    UnknownLine(String),
    #[error("invalid ROUTER_ID: {0}")]
    InvalidRouterId(#[source] ripd_common::CommonError),
    #[error("invalid input port '{0}': must be numeric and in [{INPUT_PORT_MIN}, {INPUT_PORT_MAX}]")]
    InvalidInputPort(String),
    #[error("invalid output descriptor '{0}': expected 'port-cost-id'")]
    InvalidOutputDescriptor(String),
    #[error("invalid output descriptor '{0}': {1}")]
    InvalidOutput(String, #[source] ripd_table::TableError),
    #[error("output port {0} collides with a configured input port")]
    PortCollision(u16),
}

/// The parsed, validated configuration for one node.
#[derive(Debug, Clone)]
pub struct DaemonConfig {
    pub router_id: NodeId,
    pub inputs: Vec<u16>,
    pub outputs: Vec<NeighborDescriptor>,
}

pub fn load(path: impl AsRef<Path>) -> Result<DaemonConfig, ConfigError> {
    let contents = std::fs::read_to_string(path)?;
    parse(&contents)
}

pub fn parse(contents: &str) -> Result<DaemonConfig, ConfigError> {
    let mut router_id: Option<&str> = None;
    let mut inputs_field: Option<&str> = None;
    let mut outputs_field: Option<&str> = None;

    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let (key, rest) = line
            .split_once(char::is_whitespace)
            .ok_or_else(|| ConfigError::UnknownLine(line.to_string()))?;
        let rest = rest.trim();
        match key {
            "ROUTER_ID" => {
                if router_id.replace(rest).is_some() {
                    return Err(ConfigError::DuplicateField("ROUTER_ID"));
                }
            }
            "INPUTS" => {
                if inputs_field.replace(rest).is_some() {
                    return Err(ConfigError::DuplicateField("INPUTS"));
                }
            }
            "OUTPUTS" => {
                if outputs_field.replace(rest).is_some() {
                    return Err(ConfigError::DuplicateField("OUTPUTS"));
                }
            }
            _ => return Err(ConfigError::UnknownLine(line.to_string())),
        }
    }

    let router_id_str = router_id.ok_or(ConfigError::MissingField("ROUTER_ID"))?;
    let router_id: NodeId = router_id_str
        .parse::<u32>()
        .map_err(|e| ConfigError::InvalidRouterId(e.into()))
        .and_then(|value| NodeId::new(value).map_err(ConfigError::InvalidRouterId))?;

    let inputs_str = inputs_field.ok_or(ConfigError::MissingField("INPUTS"))?;
    let mut inputs = Vec::new();
    for token in inputs_str.split_whitespace() {
        let port: u16 = token
            .parse()
            .map_err(|_| ConfigError::InvalidInputPort(token.to_string()))?;
        if port < INPUT_PORT_MIN || port > INPUT_PORT_MAX {
            return Err(ConfigError::InvalidInputPort(token.to_string()));
        }
        inputs.push(port);
    }
    if inputs.is_empty() {
        return Err(ConfigError::MissingField("INPUTS"));
    }
    let input_set: HashSet<u16> = inputs.iter().copied().collect();

    let outputs_str = outputs_field.unwrap_or("");
    let mut outputs = Vec::new();
    for token in outputs_str.split_whitespace() {
        let mut parts = token.splitn(3, '-');
        let (Some(port_str), Some(cost_str), Some(id_str)) = (parts.next(), parts.next(), parts.next()) else {
            return Err(ConfigError::InvalidOutputDescriptor(token.to_string()));
        };
        let port: u16 = port_str
            .parse()
            .map_err(|_| ConfigError::InvalidOutputDescriptor(token.to_string()))?;
        let cost: u8 = cost_str
            .parse()
            .map_err(|_| ConfigError::InvalidOutputDescriptor(token.to_string()))?;
        let neighbor_id: u32 = id_str
            .parse()
            .map_err(|_| ConfigError::InvalidOutputDescriptor(token.to_string()))?;
        let neighbor_id =
            NodeId::new(neighbor_id).map_err(|_| ConfigError::InvalidOutputDescriptor(token.to_string()))?;

        if input_set.contains(&port) {
            return Err(ConfigError::PortCollision(port));
        }

        let descriptor = NeighborDescriptor::new(port, cost, neighbor_id)
            .map_err(|e| ConfigError::InvalidOutput(token.to_string(), e))?;
        outputs.push(descriptor);
    }

    Ok(DaemonConfig {
        router_id,
        inputs,
        outputs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_well_formed_record() {
        let contents = "ROUTER_ID 1\nINPUTS 6110 6201\nOUTPUTS 5002-3-2 5003-2-4\n";
        let config = parse(contents).unwrap();
        assert_eq!(config.router_id.get(), 1);
        assert_eq!(config.inputs, vec![6110, 6201]);
        assert_eq!(config.outputs.len(), 2);
        assert_eq!(config.outputs[0].send_port, 5002);
        assert_eq!(config.outputs[0].link_cost, 3);
        assert_eq!(config.outputs[0].neighbor_id.get(), 2);
    }

    #[test]
    fn rejects_missing_router_id() {
        let contents = "INPUTS 6110\n";
        assert!(matches!(parse(contents), Err(ConfigError::MissingField("ROUTER_ID"))));
    }

    #[test]
    fn rejects_output_port_colliding_with_input_port() {
        let contents = "ROUTER_ID 1\nINPUTS 6110\nOUTPUTS 6110-3-2\n";
        assert!(matches!(parse(contents), Err(ConfigError::PortCollision(6110))));
    }

    #[test]
    fn rejects_malformed_output_descriptor() {
        let contents = "ROUTER_ID 1\nINPUTS 6110\nOUTPUTS 5002-3\n";
        assert!(matches!(parse(contents), Err(ConfigError::InvalidOutputDescriptor(_))));
    }

    #[test]
    fn rejects_duplicate_field() {
        let contents = "ROUTER_ID 1\nROUTER_ID 2\nINPUTS 6110\n";
        assert!(matches!(parse(contents), Err(ConfigError::DuplicateField("ROUTER_ID"))));
    }

    #[test]
    fn rejects_input_port_above_max() {
        let contents = "ROUTER_ID 1\nINPUTS 64001\n";
        assert!(matches!(parse(contents), Err(ConfigError::InvalidInputPort(_))));
    }

    #[test]
    fn rejects_output_port_above_max() {
        let contents = "ROUTER_ID 1\nINPUTS 6110\nOUTPUTS 64001-3-2\n";
        assert!(matches!(parse(contents), Err(ConfigError::InvalidOutput(_, _))));
    }
}
