//! Name -> handler table for every Forge operation.
//!
//! The registry is built once at startup and never mutated afterwards. Every
//! invocation ends in a string: failures are rendered through [`ForgeError`]'s
//! `Display`, so a caller always gets something it can show.

pub mod generation;
pub mod management;

use crate::{
    error::{ForgeError, Result},
    forge::ForgeClient,
    logger,
};
use futures::future::BoxFuture;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{json, Value};

pub type ToolFuture<'a> = BoxFuture<'a, Result<String>>;
pub type Handler = for<'a> fn(&'a ForgeClient, Value) -> ToolFuture<'a>;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: Value,
}

#[derive(Clone)]
pub struct ToolEntry {
    pub descriptor: ToolDescriptor,
    handler: Handler,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutcome {
    pub text: String,
    pub is_error: bool,
}

#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: Vec<ToolEntry>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// All generation, model, asset and control tools.
    pub fn with_forge_tools() -> Self {
        let registry = generation::register(Self::new());
        management::register(registry)
    }

    /// Adds a tool. A second registration under the same name replaces the first.
    pub fn register(
        mut self,
        name: &'static str,
        description: &'static str,
        input_schema: Value,
        handler: Handler,
    ) -> Self {
        let entry = ToolEntry {
            descriptor: ToolDescriptor {
                name,
                description,
                input_schema,
            },
            handler,
        };
        match self.tools.iter_mut().find(|t| t.descriptor.name == name) {
            Some(existing) => {
                log::warn!("Tool '{}' registered twice; keeping the last one", name);
                *existing = entry;
            }
            None => self.tools.push(entry),
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<&ToolEntry> {
        self.tools.iter().find(|t| t.descriptor.name == name)
    }

    pub fn descriptors(&self) -> impl Iterator<Item = &ToolDescriptor> {
        self.tools.iter().map(|t| &t.descriptor)
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.tools.iter().map(|t| t.descriptor.name).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub async fn invoke(&self, forge: &ForgeClient, name: &str, args: Value) -> ToolOutcome {
        let entry = match self.get(name) {
            Some(entry) => entry,
            None => {
                log::warn!("Unknown tool requested: {}", name);
                return ToolOutcome {
                    text: ForgeError::UnknownTool(name.to_string()).to_string(),
                    is_error: true,
                };
            }
        };

        let _timer = logger::timer(name);
        match (entry.handler)(forge, args).await {
            Ok(text) => ToolOutcome {
                text,
                is_error: false,
            },
            // An empty result is a report, not a failure.
            Err(ForgeError::EmptyResult(message)) => {
                log::warn!("{}: {}", name, message);
                ToolOutcome {
                    text: message,
                    is_error: false,
                }
            }
            Err(e) => {
                log::warn!("{} failed: {}", name, e);
                ToolOutcome {
                    text: e.to_string(),
                    is_error: true,
                }
            }
        }
    }

    /// Runs a tool and returns only its text.
    pub async fn dispatch(&self, forge: &ForgeClient, name: &str, args: Value) -> String {
        self.invoke(forge, name, args).await.text
    }
}

/// Deserializes tool arguments; a missing argument object means "all defaults".
pub(crate) fn parse_args<T: DeserializeOwned>(tool: &str, args: Value) -> Result<T> {
    let args = if args.is_null() { json!({}) } else { args };
    serde_json::from_value(args).map_err(|e| ForgeError::InvalidArguments {
        tool: tool.to_string(),
        message: e.to_string(),
    })
}

pub(crate) fn object_schema(properties: Value, required: &[&str]) -> Value {
    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

pub(crate) fn no_args_schema() -> Value {
    object_schema(json!({}), &[])
}

pub(crate) fn param(kind: &str, description: &str) -> Value {
    json!({ "type": kind, "description": description })
}

pub(crate) fn param_or(kind: &str, description: &str, default: Value) -> Value {
    json!({ "type": kind, "description": description, "default": default })
}
