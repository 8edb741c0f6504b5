// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 fileflow contributors

//! Command templates
//!
//! Parses `{i:name}`, `{o:name}` and `{p:name}` placeholders out of a
//! command string. Everything from the first shell comment marker onward is
//! dependency-only: its placeholders declare ports (and so gate firing) but
//! are not part of the executed command.

use regex::Regex;
use std::collections::BTreeMap;
use std::fmt;
use std::ops::Range;
use std::sync::OnceLock;

use crate::errors::{FlowError, FlowResult};
use crate::workflow::Token;

/// Placeholder category, from its one-letter prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlaceholderKind {
    /// `{i:name}`: file in-port
    Input,
    /// `{o:name}`: file out-port
    Output,
    /// `{p:name}`: parameter in-port
    Param,
}

impl PlaceholderKind {
    fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix {
            "i" => Some(Self::Input),
            "o" => Some(Self::Output),
            "p" => Some(Self::Param),
            _ => None,
        }
    }

    fn prefix(self) -> char {
        match self {
            Self::Input => 'i',
            Self::Output => 'o',
            Self::Param => 'p',
        }
    }
}

/// One placeholder occurrence in a template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    pub kind: PlaceholderKind,
    pub name: String,
    pub span: Range<usize>,
    pub dependency_only: bool,
}

impl fmt::Display for Placeholder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}:{}}}", self.kind.prefix(), self.name)
    }
}

/// Values substituted into a template for one task
#[derive(Debug, Default)]
pub struct Substitutions<'a> {
    pub inputs: Option<&'a BTreeMap<String, Token>>,
    pub outputs: Option<&'a BTreeMap<String, String>>,
    pub params: Option<&'a BTreeMap<String, Token>>,
}

/// A parsed command template
#[derive(Debug, Clone)]
pub struct CommandTemplate {
    process: String,
    raw: String,
    executed_end: usize,
    placeholders: Vec<Placeholder>,
}

fn placeholder_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\{([iop]):([^{}\s]*)\}").expect("placeholder regex is valid")
    })
}

fn name_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9_.\-]+$").expect("name regex is valid"))
}

/// Byte offset of the first shell comment marker outside quotes
fn comment_start(command: &str) -> Option<usize> {
    let mut in_single = false;
    let mut in_double = false;
    let mut prev: Option<char> = None;

    for (idx, ch) in command.char_indices() {
        match ch {
            '\'' if !in_double => in_single = !in_single,
            '"' if !in_single && prev != Some('\\') => in_double = !in_double,
            '#' if !in_single && !in_double => {
                if prev.map_or(true, char::is_whitespace) {
                    return Some(idx);
                }
            }
            _ => {}
        }
        prev = Some(ch);
    }

    None
}

impl CommandTemplate {
    /// Parse a template for the named process
    pub fn parse(process: &str, raw: &str) -> FlowResult<Self> {
        let invalid = |reason: String| FlowError::InvalidTemplate {
            process: process.to_string(),
            reason,
        };

        if raw.trim().is_empty() {
            return Err(invalid("command is empty".into()));
        }

        let executed_end = comment_start(raw).unwrap_or(raw.len());
        let mut placeholders = Vec::new();
        let mut kinds: BTreeMap<&str, PlaceholderKind> = BTreeMap::new();

        for caps in placeholder_regex().captures_iter(raw) {
            let Some(whole) = caps.get(0) else {
                continue;
            };
            // `${p:-default}` is shell parameter expansion, not a placeholder
            if raw[..whole.start()].ends_with('$') {
                continue;
            }

            let Some(kind) = PlaceholderKind::from_prefix(&caps[1]) else {
                continue;
            };
            let name = caps.get(2).map_or("", |m| m.as_str());
            if !name_regex().is_match(name) {
                return Err(invalid(format!("invalid port name '{}' in '{}'", name, whole.as_str())));
            }

            if let Some(previous) = kinds.insert(name, kind) {
                if previous != kind {
                    return Err(invalid(format!(
                        "port '{}' is used as both {{{}:..}} and {{{}:..}}",
                        name,
                        previous.prefix(),
                        kind.prefix()
                    )));
                }
            }

            placeholders.push(Placeholder {
                kind,
                name: name.to_string(),
                span: whole.range(),
                dependency_only: whole.start() >= executed_end,
            });
        }

        Ok(Self {
            process: process.to_string(),
            raw: raw.to_string(),
            executed_end,
            placeholders,
        })
    }

    /// All placeholder occurrences, in order
    pub fn placeholders(&self) -> &[Placeholder] {
        &self.placeholders
    }

    fn names(&self, kind: PlaceholderKind) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for p in self.placeholders.iter().filter(|p| p.kind == kind) {
            if !names.contains(&p.name) {
                names.push(p.name.clone());
            }
        }
        names
    }

    /// File in-port names in order of first appearance
    pub fn inputs(&self) -> Vec<String> {
        self.names(PlaceholderKind::Input)
    }

    /// File out-port names in order of first appearance
    pub fn outputs(&self) -> Vec<String> {
        self.names(PlaceholderKind::Output)
    }

    /// Parameter in-port names in order of first appearance
    pub fn params(&self) -> Vec<String> {
        self.names(PlaceholderKind::Param)
    }

    /// Produce the executed command text
    pub fn render(&self, subs: &Substitutions<'_>) -> FlowResult<String> {
        let mut out = String::with_capacity(self.executed_end);
        let mut cursor = 0;

        for p in self.placeholders.iter().filter(|p| !p.dependency_only) {
            out.push_str(&self.raw[cursor..p.span.start]);
            let value = match p.kind {
                PlaceholderKind::Input => subs.inputs.and_then(|m| m.get(&p.name)).map(Token::as_str),
                PlaceholderKind::Param => subs.params.and_then(|m| m.get(&p.name)).map(Token::as_str),
                PlaceholderKind::Output => subs.outputs.and_then(|m| m.get(&p.name)).map(String::as_str),
            };
            let value = value.ok_or_else(|| FlowError::InvalidTemplate {
                process: self.process.clone(),
                reason: format!("no value for {}", p),
            })?;
            out.push_str(value);
            cursor = p.span.end;
        }

        out.push_str(&self.raw[cursor..self.executed_end]);
        Ok(out.trim_end().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(pairs: &[(&str, &str)]) -> BTreeMap<String, Token> {
        pairs.iter().map(|(k, v)| (k.to_string(), Token::from(*v))).collect()
    }

    #[test]
    fn test_parse_declares_ports_in_order() {
        let t = CommandTemplate::parse(
            "merge",
            "bwa sampe {i:ref} {i:sai1} {i:sai2} > {o:merged} # {i:refdone} {p:indv}",
        )
        .unwrap();

        assert_eq!(t.inputs(), vec!["ref", "sai1", "sai2", "refdone"]);
        assert_eq!(t.outputs(), vec!["merged"]);
        assert_eq!(t.params(), vec!["indv"]);
    }

    #[test]
    fn test_comment_placeholders_are_dependency_only() {
        let t = CommandTemplate::parse("aln", "bwa aln {i:ref} {i:fastq} > {o:sai} # {i:idxdone}").unwrap();

        let dep: Vec<_> = t
            .placeholders()
            .iter()
            .filter(|p| p.dependency_only)
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(dep, vec!["idxdone"]);

        let inputs = tokens(&[("ref", "ref.fa"), ("fastq", "a.fq"), ("idxdone", "ref.fa.indexed")]);
        let outputs: BTreeMap<String, String> = [("sai".to_string(), "a.fq.sai".to_string())].into();
        let cmd = t
            .render(&Substitutions {
                inputs: Some(&inputs),
                outputs: Some(&outputs),
                params: None,
            })
            .unwrap();
        assert_eq!(cmd, "bwa aln ref.fa a.fq > a.fq.sai");
    }

    #[test]
    fn test_hash_inside_quotes_or_words_is_not_a_comment() {
        let t = CommandTemplate::parse("echo", "echo 'a # b' x#y > {o:out}").unwrap();
        assert!(t.placeholders().iter().all(|p| !p.dependency_only));

        let outputs: BTreeMap<String, String> = [("out".to_string(), "o.txt".to_string())].into();
        let cmd = t
            .render(&Substitutions {
                outputs: Some(&outputs),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(cmd, "echo 'a # b' x#y > o.txt");
    }

    #[test]
    fn test_shell_expansion_is_not_a_placeholder() {
        let t = CommandTemplate::parse("env", "echo ${p:-none} > {o:out}").unwrap();
        assert!(t.params().is_empty());
        assert_eq!(t.outputs(), vec!["out"]);
    }

    #[test]
    fn test_conflicting_kinds_rejected() {
        let err = CommandTemplate::parse("bad", "cat {i:x} > {o:x}").unwrap_err();
        assert!(matches!(err, FlowError::InvalidTemplate { .. }));
    }

    #[test]
    fn test_empty_name_rejected() {
        let err = CommandTemplate::parse("bad", "cat {i:} > out").unwrap_err();
        assert!(matches!(err, FlowError::InvalidTemplate { .. }));
    }

    #[test]
    fn test_empty_command_rejected() {
        assert!(CommandTemplate::parse("bad", "   ").is_err());
    }

    #[test]
    fn test_repeated_placeholder_substituted_everywhere() {
        let t = CommandTemplate::parse("idx", "bwa index {i:index}; echo {i:index} > {o:done}").unwrap();
        assert_eq!(t.inputs(), vec!["index"]);

        let inputs = tokens(&[("index", "ref.fa")]);
        let outputs: BTreeMap<String, String> = [("done".to_string(), "ref.fa.indexed".to_string())].into();
        let cmd = t
            .render(&Substitutions {
                inputs: Some(&inputs),
                outputs: Some(&outputs),
                params: None,
            })
            .unwrap();
        assert_eq!(cmd, "bwa index ref.fa; echo ref.fa > ref.fa.indexed");
    }
}
