// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 fileflow contributors

//! Output path derivation
//!
//! Every out-port of a process gets a [`PathStrategy`] that computes the
//! concrete output path of a task from that task's input paths and
//! parameter values. Strategies are pure: computing a path twice for the
//! same inputs yields the same path, which is what makes skip-if-exists
//! resumption safe.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::workflow::Token;

/// Caller-supplied path function. Must be deterministic and free of side effects.
pub type CustomPathFn = Arc<dyn Fn(&PathContext<'_>) -> String + Send + Sync>;

/// Inputs visible to a path strategy for one task
#[derive(Debug, Clone, Copy)]
pub struct PathContext<'a> {
    pub inputs: &'a BTreeMap<String, Token>,
    pub params: &'a BTreeMap<String, Token>,
}

impl<'a> PathContext<'a> {
    pub fn new(inputs: &'a BTreeMap<String, Token>, params: &'a BTreeMap<String, Token>) -> Self {
        Self { inputs, params }
    }

    /// Path received on a file in-port
    pub fn input(&self, name: &str) -> Option<&'a str> {
        self.inputs.get(name).map(Token::as_str)
    }

    /// Value received on a parameter in-port
    pub fn param(&self, name: &str) -> Option<&'a str> {
        self.params.get(name).map(Token::as_str)
    }
}

/// Why a strategy could not produce a path
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("path '{path}' does not end with '{suffix}'")]
    SuffixNotFound { path: String, suffix: String },

    #[error("no input on port '{port}'")]
    MissingInput { port: String },
}

/// How an out-port derives its path
#[derive(Clone)]
pub enum PathStrategy {
    /// Fixed path, independent of inputs
    Static(String),
    /// Path on `source` with trailing `from` replaced by `to`
    SuffixReplace {
        source: String,
        from: String,
        to: String,
    },
    /// Path on `source` with `suffix` appended
    SuffixExtend { source: String, suffix: String },
    /// Arbitrary deterministic function of inputs and parameters
    Custom(CustomPathFn),
}

impl PathStrategy {
    pub fn fixed(path: impl Into<String>) -> Self {
        Self::Static(path.into())
    }

    pub fn replace(
        source: impl Into<String>,
        from: impl Into<String>,
        to: impl Into<String>,
    ) -> Self {
        Self::SuffixReplace {
            source: source.into(),
            from: from.into(),
            to: to.into(),
        }
    }

    pub fn extend(source: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self::SuffixExtend {
            source: source.into(),
            suffix: suffix.into(),
        }
    }

    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&PathContext<'_>) -> String + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(f))
    }

    /// In-port this strategy reads from, if any
    pub fn source_port(&self) -> Option<&str> {
        match self {
            Self::SuffixReplace { source, .. } | Self::SuffixExtend { source, .. } => Some(source),
            Self::Static(_) | Self::Custom(_) => None,
        }
    }

    /// Compute the output path for one task
    pub fn resolve(&self, ctx: &PathContext<'_>) -> Result<String, PathError> {
        match self {
            Self::Static(path) => Ok(path.clone()),
            Self::SuffixReplace { source, from, to } => {
                let path = source_path(ctx, source)?;
                let stem = path
                    .strip_suffix(from.as_str())
                    .ok_or_else(|| PathError::SuffixNotFound {
                        path: path.to_string(),
                        suffix: from.clone(),
                    })?;
                Ok(format!("{stem}{to}"))
            }
            Self::SuffixExtend { source, suffix } => {
                let path = source_path(ctx, source)?;
                Ok(format!("{path}{suffix}"))
            }
            Self::Custom(f) => Ok(f(ctx)),
        }
    }
}

fn source_path<'a>(ctx: &PathContext<'a>, port: &str) -> Result<&'a str, PathError> {
    ctx.input(port).ok_or_else(|| PathError::MissingInput {
        port: port.to_string(),
    })
}

impl fmt::Debug for PathStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static(path) => f.debug_tuple("Static").field(path).finish(),
            Self::SuffixReplace { source, from, to } => f
                .debug_struct("SuffixReplace")
                .field("source", source)
                .field("from", from)
                .field("to", to)
                .finish(),
            Self::SuffixExtend { source, suffix } => f
                .debug_struct("SuffixExtend")
                .field("source", source)
                .field("suffix", suffix)
                .finish(),
            Self::Custom(_) => f.write_str("Custom(<fn>)"),
        }
    }
}
