// Copyright 2025 Cowboy AI, LLC.

//! Loader for Web Service Challenge (WSC) description files
//!
//! Three XML documents describe a problem:
//!
//! - services: `<service name Res Pri Ava Rel>` with `<inputs>` and
//!   `<outputs>` blocks of `<instance name>` (Res = time, Pri = cost,
//!   Ava = availability, Rel = reliability);
//! - task: `<provided>` and `<wanted>` blocks of `<instance name>`;
//! - taxonomy: nested `<concept name>` / `<instance name>` elements, where
//!   nesting is the parent relation and a node may appear under several
//!   parents.
//!
//! The loader only produces records; generalization and validation happen
//! when the catalog is built.

use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::debug;

use crate::catalog::ServiceRecord;
use crate::errors::{CompositionError, CompositionResult};
use crate::qos::QosVector;
use crate::task::TaskRecord;
use crate::taxonomy::{ConceptKind, TaxonomyRecord};

const SERVICES: &str = "services";
const TASK: &str = "task";
const TAXONOMY: &str = "taxonomy";

fn tag(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.name().as_ref()).into_owned()
}

fn attr(e: &BytesStart<'_>, key: &str, doc: &str) -> CompositionResult<String> {
    let a = e
        .try_get_attribute(key)
        .map_err(|err| CompositionError::parse(doc, err.to_string()))?
        .ok_or_else(|| {
            CompositionError::parse(doc, format!("<{}> missing attribute {key}", tag(e)))
        })?;
    let value = a
        .unescape_value()
        .map_err(|err| CompositionError::parse(doc, err.to_string()))?;
    Ok(value.into_owned())
}

fn number(e: &BytesStart<'_>, key: &str, doc: &str) -> CompositionResult<f64> {
    let raw = attr(e, key, doc)?;
    raw.trim().parse::<f64>().map_err(|_| {
        CompositionError::parse(doc, format!("attribute {key}={raw:?} is not a number"))
    })
}

fn reader(xml: &str) -> Reader<&[u8]> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    reader
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Block {
    Inputs,
    Outputs,
}

/// Parse a services document
pub fn parse_services(xml: &str) -> CompositionResult<Vec<ServiceRecord>> {
    let mut reader = reader(xml);
    let mut services = Vec::new();
    let mut current: Option<ServiceRecord> = None;
    let mut block: Option<Block> = None;

    loop {
        let (e, empty) = match reader.read_event() {
            Ok(Event::Start(e)) => (e, false),
            Ok(Event::Empty(e)) => (e, true),
            Ok(Event::End(e)) => {
                match e.name().as_ref() {
                    b"service" => services.extend(current.take()),
                    b"inputs" | b"outputs" => block = None,
                    _ => {}
                }
                continue;
            }
            Ok(Event::Eof) => break,
            Err(err) => return Err(CompositionError::parse(SERVICES, err.to_string())),
            _ => continue,
        };

        match e.name().as_ref() {
            b"service" => {
                if current.is_some() {
                    return Err(CompositionError::parse(SERVICES, "nested <service>"));
                }
                let qos = QosVector::new(
                    number(&e, "Res", SERVICES)?,
                    number(&e, "Pri", SERVICES)?,
                    number(&e, "Ava", SERVICES)?,
                    number(&e, "Rel", SERVICES)?,
                );
                let record = ServiceRecord {
                    name: attr(&e, "name", SERVICES)?,
                    qos,
                    inputs: Vec::new(),
                    outputs: Vec::new(),
                };
                if empty {
                    services.push(record);
                } else {
                    current = Some(record);
                }
            }
            b"inputs" if !empty => block = Some(Block::Inputs),
            b"outputs" if !empty => block = Some(Block::Outputs),
            b"instance" => {
                let name = attr(&e, "name", SERVICES)?;
                match (current.as_mut(), block) {
                    (Some(s), Some(Block::Inputs)) => s.inputs.push(name),
                    (Some(s), Some(Block::Outputs)) => s.outputs.push(name),
                    _ => {
                        return Err(CompositionError::parse(
                            SERVICES,
                            format!("<instance name={name:?}> outside <inputs>/<outputs>"),
                        ))
                    }
                }
            }
            _ => {}
        }
    }

    debug!(services = services.len(), "Parsed WSC services");
    Ok(services)
}

/// Parse a task document
pub fn parse_task(xml: &str) -> CompositionResult<TaskRecord> {
    let mut reader = reader(xml);
    let mut task = TaskRecord::default();
    let mut in_provided = false;
    let mut in_wanted = false;

    loop {
        let (e, empty) = match reader.read_event() {
            Ok(Event::Start(e)) => (e, false),
            Ok(Event::Empty(e)) => (e, true),
            Ok(Event::End(e)) => {
                match e.name().as_ref() {
                    b"provided" => in_provided = false,
                    b"wanted" => in_wanted = false,
                    _ => {}
                }
                continue;
            }
            Ok(Event::Eof) => break,
            Err(err) => return Err(CompositionError::parse(TASK, err.to_string())),
            _ => continue,
        };

        match e.name().as_ref() {
            b"provided" if !empty => in_provided = true,
            b"wanted" if !empty => in_wanted = true,
            b"instance" => {
                let name = attr(&e, "name", TASK)?;
                if in_provided {
                    task.provided.push(name);
                } else if in_wanted {
                    task.wanted.push(name);
                } else {
                    return Err(CompositionError::parse(
                        TASK,
                        format!("<instance name={name:?}> outside <provided>/<wanted>"),
                    ));
                }
            }
            _ => {}
        }
    }

    debug!(
        provided = task.provided.len(),
        wanted = task.wanted.len(),
        "Parsed WSC task"
    );
    Ok(task)
}

/// Parse a taxonomy document into records in document order
pub fn parse_taxonomy(xml: &str) -> CompositionResult<Vec<TaxonomyRecord>> {
    let mut reader = reader(xml);
    let mut records: IndexMap<String, TaxonomyRecord> = IndexMap::new();
    // One entry per open element; `Some` for taxonomy nodes.
    let mut open: Vec<Option<String>> = Vec::new();

    loop {
        let (e, empty) = match reader.read_event() {
            Ok(Event::Start(e)) => (e, false),
            Ok(Event::Empty(e)) => (e, true),
            Ok(Event::End(_)) => {
                open.pop();
                continue;
            }
            Ok(Event::Eof) => break,
            Err(err) => return Err(CompositionError::parse(TAXONOMY, err.to_string())),
            _ => continue,
        };

        let kind = match e.name().as_ref() {
            b"concept" => Some(ConceptKind::Concept),
            b"instance" => Some(ConceptKind::Instance),
            _ => None,
        };
        let node = match kind {
            Some(kind) => {
                let name = attr(&e, "name", TAXONOMY)?;
                let parent = open.iter().rev().find_map(|n| n.clone());
                let record = records.entry(name.clone()).or_insert_with(|| TaxonomyRecord {
                    id: name.clone(),
                    kind,
                    parents: Vec::new(),
                });
                if kind == ConceptKind::Instance {
                    record.kind = kind;
                }
                if let Some(p) = parent {
                    if !record.parents.contains(&p) {
                        record.parents.push(p);
                    }
                }
                Some(name)
            }
            None => None,
        };
        if !empty {
            open.push(node);
        }
    }

    debug!(nodes = records.len(), "Parsed WSC taxonomy");
    Ok(records.into_values().collect())
}

fn read(path: &Path) -> CompositionResult<String> {
    fs::read_to_string(path)
        .map_err(|err| CompositionError::Io(format!("{}: {err}", path.display())))
}

/// Read and parse a services file
pub fn load_services(path: impl AsRef<Path>) -> CompositionResult<Vec<ServiceRecord>> {
    parse_services(&read(path.as_ref())?)
}

/// Read and parse a task file
pub fn load_task(path: impl AsRef<Path>) -> CompositionResult<TaskRecord> {
    parse_task(&read(path.as_ref())?)
}

/// Read and parse a taxonomy file
pub fn load_taxonomy(path: impl AsRef<Path>) -> CompositionResult<Vec<TaxonomyRecord>> {
    parse_taxonomy(&read(path.as_ref())?)
}
