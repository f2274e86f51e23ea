//! MCP server configuration handed to the agent.
//!
//! The agent job writes this document to disk before the engine starts; the
//! engine launches every listed server and exposes its tools as
//! `mcp__{server}__{tool}`.

use crate::error::Result;
use awc_core::tools::{McpTool, McpTransport, ToolSpecification};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Where the agent job writes the configuration.
pub const MCP_CONFIG_PATH: &str = "/tmp/mcp-config/mcp-servers.json";

const GITHUB_MCP_IMAGE: &str = "ghcr.io/github/github-mcp-server:v0.5.0";
const GITHUB_TOKEN_VAR: &str = "GITHUB_PERSONAL_ACCESS_TOKEN";
const PLAYWRIGHT_PACKAGE: &str = "@playwright/mcp@latest";

/// `{"mcpServers": {...}}` document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct McpServersConfig {
    #[serde(rename = "mcpServers", default)]
    pub mcp_servers: BTreeMap<String, McpServerEntry>,
}

/// A single server entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct McpServerEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
}

impl McpServersConfig {
    /// Build the configuration from the MCP entries of a tool specification.
    ///
    /// Returns `None` when no MCP tools are configured.
    pub fn from_tools(tools: &ToolSpecification) -> Result<Option<Self>> {
        let mut mcp_servers = BTreeMap::new();
        for (name, tool) in tools.mcp_tools() {
            mcp_servers.insert(name.clone(), server_entry(name, tool)?);
        }

        if mcp_servers.is_empty() {
            return Ok(None);
        }
        Ok(Some(Self { mcp_servers }))
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn server_entry(name: &str, tool: &McpTool) -> Result<McpServerEntry> {
    match &tool.transport {
        Some(transport) => Ok(transport_entry(transport)),
        None => reserved_entry(name).ok_or_else(|| {
            awc_core::Error::InvalidTool {
                name: name.to_string(),
                reason: "MCP tool has no transport and is not a built-in server".to_string(),
            }
            .into()
        }),
    }
}

fn transport_entry(transport: &McpTransport) -> McpServerEntry {
    match transport {
        McpTransport::Stdio { command, args, env } => McpServerEntry {
            command: Some(command.clone()),
            args: args.clone(),
            env: env.clone(),
            ..Default::default()
        },
        McpTransport::Http { url, headers } => McpServerEntry {
            url: Some(url.clone()),
            headers: headers.clone(),
            ..Default::default()
        },
        McpTransport::Container { image, args, env } => {
            let mut docker_args = vec!["run".to_string(), "--rm".to_string(), "-i".to_string()];
            for key in env.keys() {
                docker_args.push("-e".to_string());
                docker_args.push(key.clone());
            }
            docker_args.extend(args.iter().cloned());
            docker_args.push(image.clone());

            McpServerEntry {
                command: Some("docker".to_string()),
                args: docker_args,
                env: env.clone(),
                ..Default::default()
            }
        }
    }
}

fn reserved_entry(name: &str) -> Option<McpServerEntry> {
    match name {
        "github" => Some(McpServerEntry {
            command: Some("docker".to_string()),
            args: ["run", "-i", "--rm", "-e", GITHUB_TOKEN_VAR, GITHUB_MCP_IMAGE]
                .into_iter()
                .map(String::from)
                .collect(),
            env: BTreeMap::from([(
                GITHUB_TOKEN_VAR.to_string(),
                "${{ secrets.GITHUB_TOKEN }}".to_string(),
            )]),
            ..Default::default()
        }),
        "playwright" => Some(McpServerEntry {
            command: Some("npx".to_string()),
            args: vec![PLAYWRIGHT_PACKAGE.to_string()],
            ..Default::default()
        }),
        _ => None,
    }
}
