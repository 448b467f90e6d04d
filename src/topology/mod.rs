// src/topology/mod.rs
//! Static factory topology: lines, machines and tags
//!
//! The topology is described by plain serde structures ([`TopologySpec`]) and
//! validated once into an immutable [`Factory`]. Every tag is addressed by a
//! structured [`TagId`] made of its position in the tree; iteration order is
//! the definition order.

pub mod defaults;
pub mod waveform;

pub use defaults::default_topology;
pub use waveform::{WaveformClass, WaveformPolicy};

use crate::error::TopologyError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use tracing::warn;

/// Unvalidated topology description, as found in configuration files
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TopologySpec {
    pub lines: Vec<LineSpec>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LineSpec {
    pub name: String,
    #[serde(default)]
    pub machines: Vec<MachineSpec>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct MachineSpec {
    pub name: String,
    #[serde(default)]
    pub tags: Vec<TagSpec>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TagSpec {
    pub name: String,
    pub min: f64,
    pub max: f64,
    /// Explicit class; derived from the name when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub waveform: Option<WaveformClass>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

impl TagSpec {
    pub fn new(name: &str, min: f64, max: f64) -> Self {
        Self {
            name: name.to_string(),
            min,
            max,
            waveform: None,
            unit: None,
        }
    }

    pub fn with_unit(mut self, unit: &str) -> Self {
        self.unit = Some(unit.to_string());
        self
    }

    pub fn with_waveform(mut self, waveform: WaveformClass) -> Self {
        self.waveform = Some(waveform);
        self
    }
}

/// How waveform classes are resolved for tags without an explicit class
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaveformRules {
    pub policy: WaveformPolicy,
    pub default_class: WaveformClass,
}

impl Default for WaveformRules {
    fn default() -> Self {
        Self {
            policy: WaveformPolicy::Lenient,
            default_class: WaveformClass::SlowOscillator,
        }
    }
}

/// Valid value range of a tag
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TagRange {
    min: f64,
    max: f64,
}

impl TagRange {
    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn width(&self) -> f64 {
        self.max - self.min
    }

    pub fn midpoint(&self) -> f64 {
        self.min + self.width() / 2.0
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// A single measured property
#[derive(Debug, Clone, PartialEq)]
pub struct Tag {
    name: String,
    range: TagRange,
    waveform: WaveformClass,
    unit: Option<String>,
}

impl Tag {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn range(&self) -> TagRange {
        self.range
    }

    pub fn waveform(&self) -> WaveformClass {
        self.waveform
    }

    pub fn unit(&self) -> Option<&str> {
        self.unit.as_deref()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Machine {
    name: String,
    tags: Vec<Tag>,
}

impl Machine {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    name: String,
    machines: Vec<Machine>,
}

impl Line {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn machines(&self) -> &[Machine] {
        &self.machines
    }
}

/// Structured tag identifier: position of the tag in the topology tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TagId {
    pub line: usize,
    pub machine: usize,
    pub tag: usize,
}

/// Borrowed `line/machine/tag` path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagPath<'a> {
    pub line: &'a str,
    pub machine: &'a str,
    pub tag: &'a str,
}

impl fmt::Display for TagPath<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.line, self.machine, self.tag)
    }
}

/// Entry yielded when walking the factory in topology order
#[derive(Debug, Clone, Copy)]
pub struct TagEntry<'a> {
    pub id: TagId,
    pub path: TagPath<'a>,
    pub tag: &'a Tag,
}

/// Immutable, validated factory topology
#[derive(Debug, Clone, PartialEq)]
pub struct Factory {
    lines: Vec<Line>,
}

impl Factory {
    /// Validate a topology description.
    ///
    /// Fails on empty names, non-finite or inverted bounds, sibling name
    /// collisions, and (under the strict policy) tags without a waveform class.
    pub fn from_spec(spec: &TopologySpec, rules: WaveformRules) -> Result<Self, TopologyError> {
        if spec.lines.is_empty() {
            return Err(TopologyError::EmptyFactory);
        }

        let mut line_names = HashSet::new();
        let mut lines = Vec::with_capacity(spec.lines.len());

        for line_spec in &spec.lines {
            require_name("line", &line_spec.name, "Factory")?;
            if !line_names.insert(line_spec.name.as_str()) {
                return Err(TopologyError::DuplicateLine(line_spec.name.clone()));
            }

            let mut machine_names = HashSet::new();
            let mut machines = Vec::with_capacity(line_spec.machines.len());

            for machine_spec in &line_spec.machines {
                require_name("machine", &machine_spec.name, &line_spec.name)?;
                if !machine_names.insert(machine_spec.name.as_str()) {
                    return Err(TopologyError::DuplicateMachine {
                        line: line_spec.name.clone(),
                        machine: machine_spec.name.clone(),
                    });
                }

                let parent = format!("{}/{}", line_spec.name, machine_spec.name);
                let mut tag_names = HashSet::new();
                let mut tags = Vec::with_capacity(machine_spec.tags.len());

                for tag_spec in &machine_spec.tags {
                    require_name("tag", &tag_spec.name, &parent)?;
                    if !tag_names.insert(tag_spec.name.as_str()) {
                        return Err(TopologyError::DuplicateTag {
                            line: line_spec.name.clone(),
                            machine: machine_spec.name.clone(),
                            tag: tag_spec.name.clone(),
                        });
                    }

                    let path = format!("{}/{}", parent, tag_spec.name);
                    tags.push(build_tag(tag_spec, path, rules)?);
                }

                machines.push(Machine {
                    name: machine_spec.name.clone(),
                    tags,
                });
            }

            lines.push(Line {
                name: line_spec.name.clone(),
                machines,
            });
        }

        Ok(Self { lines })
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    pub fn tag_count(&self) -> usize {
        self.lines
            .iter()
            .flat_map(|line| line.machines.iter())
            .map(|machine| machine.tags.len())
            .sum()
    }

    /// Walk every tag: lines, then machines within a line, then tags
    pub fn tags(&self) -> impl Iterator<Item = TagEntry<'_>> {
        self.lines.iter().enumerate().flat_map(|(li, line)| {
            line.machines.iter().enumerate().flat_map(move |(mi, machine)| {
                machine.tags.iter().enumerate().map(move |(ti, tag)| TagEntry {
                    id: TagId {
                        line: li,
                        machine: mi,
                        tag: ti,
                    },
                    path: TagPath {
                        line: &line.name,
                        machine: &machine.name,
                        tag: &tag.name,
                    },
                    tag,
                })
            })
        })
    }

    pub fn tag(&self, id: TagId) -> Option<&Tag> {
        self.lines
            .get(id.line)?
            .machines
            .get(id.machine)?
            .tags
            .get(id.tag)
    }

    pub fn path(&self, id: TagId) -> Option<TagPath<'_>> {
        let line = self.lines.get(id.line)?;
        let machine = line.machines.get(id.machine)?;
        let tag = machine.tags.get(id.tag)?;
        Some(TagPath {
            line: &line.name,
            machine: &machine.name,
            tag: &tag.name,
        })
    }

    /// Look a tag up by its names
    pub fn find(&self, line: &str, machine: &str, tag: &str) -> Option<TagId> {
        let li = self.lines.iter().position(|l| l.name == line)?;
        let mi = self.lines[li].machines.iter().position(|m| m.name == machine)?;
        let ti = self.lines[li].machines[mi]
            .tags
            .iter()
            .position(|t| t.name == tag)?;
        Some(TagId {
            line: li,
            machine: mi,
            tag: ti,
        })
    }

    /// Resolve a `line/machine/tag` path string
    pub fn find_path(&self, path: &str) -> Option<TagId> {
        let mut parts = path.splitn(3, '/');
        let line = parts.next()?;
        let machine = parts.next()?;
        let tag = parts.next()?;
        self.find(line, machine, tag)
    }

    /// Describe the factory back as a spec with every class made explicit
    pub fn to_spec(&self) -> TopologySpec {
        TopologySpec {
            lines: self
                .lines
                .iter()
                .map(|line| LineSpec {
                    name: line.name.clone(),
                    machines: line
                        .machines
                        .iter()
                        .map(|machine| MachineSpec {
                            name: machine.name.clone(),
                            tags: machine
                                .tags
                                .iter()
                                .map(|tag| TagSpec {
                                    name: tag.name.clone(),
                                    min: tag.range.min,
                                    max: tag.range.max,
                                    waveform: Some(tag.waveform),
                                    unit: tag.unit.clone(),
                                })
                                .collect(),
                        })
                        .collect(),
                })
                .collect(),
        }
    }
}

fn require_name(kind: &'static str, name: &str, parent: &str) -> Result<(), TopologyError> {
    if name.trim().is_empty() {
        return Err(TopologyError::EmptyName {
            kind,
            parent: parent.to_string(),
        });
    }
    Ok(())
}

fn build_tag(spec: &TagSpec, path: String, rules: WaveformRules) -> Result<Tag, TopologyError> {
    if !spec.min.is_finite() || !spec.max.is_finite() {
        return Err(TopologyError::NonFiniteBound { path });
    }
    if spec.min >= spec.max {
        return Err(TopologyError::InvertedBounds {
            path,
            min: spec.min,
            max: spec.max,
        });
    }

    let waveform = match spec.waveform.or_else(|| WaveformClass::from_tag_name(&spec.name)) {
        Some(class) => class,
        None => match rules.policy {
            WaveformPolicy::Strict => return Err(TopologyError::UnknownWaveform { path }),
            WaveformPolicy::Lenient => {
                warn!(
                    tag = %path,
                    fallback = %rules.default_class,
                    "No waveform class matches tag name, using default"
                );
                rules.default_class
            }
        },
    };

    Ok(Tag {
        name: spec.name.clone(),
        range: TagRange {
            min: spec.min,
            max: spec.max,
        },
        waveform,
        unit: spec.unit.clone(),
    })
}
