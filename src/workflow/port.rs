// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 fileflow contributors

//! Ports, tokens and connections

use serde::{Deserialize, Serialize};
use std::fmt;

use super::NodeId;

/// What a port carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortKind {
    /// File path tokens
    File,
    /// Parameter value tokens
    Param,
}

impl fmt::Display for PortKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File => write!(f, "file"),
            Self::Param => write!(f, "param"),
        }
    }
}

/// Port direction, seen from the owning node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    In,
    Out,
}

/// A port declared on a node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortSpec {
    pub name: String,
    pub kind: PortKind,
}

impl PortSpec {
    pub fn file(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: PortKind::File,
        }
    }

    pub fn param(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: PortKind::Param,
        }
    }
}

/// A single value flowing along a connection: a file path or a parameter
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Token(String);

impl Token {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Token {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Token {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Unresolved address of a port: node handle plus port name.
///
/// Resolved into a [`PortHandle`] when passed to `Workflow::connect`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PortRef {
    pub node: NodeId,
    pub name: String,
    pub direction: Direction,
}

impl PortRef {
    pub fn output(node: NodeId, name: impl Into<String>) -> Self {
        Self {
            node,
            name: name.into(),
            direction: Direction::Out,
        }
    }

    pub fn input(node: NodeId, name: impl Into<String>) -> Self {
        Self {
            node,
            name: name.into(),
            direction: Direction::In,
        }
    }
}

/// Resolved port: node plus index into that node's in- or out-port list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PortHandle {
    pub node: NodeId,
    pub index: usize,
}

/// Single-producer/single-consumer link between an out-port and an in-port
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Connection {
    pub from: PortHandle,
    pub to: PortHandle,
}
