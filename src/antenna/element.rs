//! Lumped elements and feeds placed on grid points.

use std::fmt;
use std::str::FromStr;

use crate::circuits::network::Network;
use crate::errors::{Diagnostic, DiagnosticSink, Step, StepContext};

/// What an antenna element models.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ElementKind {
    /// Passive lumped loading inserted into the line.
    Element,
    /// Driven or loaded port, seen by the line as a shunt load.
    Feed,
    /// Tag that names neither kind; skipped during assembly.
    Unknown(String),
}

impl ElementKind {
    /// Text tag for this kind.
    #[must_use]
    pub fn tag(&self) -> &str {
        match self {
            Self::Element => "element",
            Self::Feed => "feed",
            Self::Unknown(tag) => tag,
        }
    }
}

impl FromStr for ElementKind {
    type Err = std::convert::Infallible;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        let trimmed = tag.trim();
        Ok(if trimmed.eq_ignore_ascii_case("element") {
            Self::Element
        } else if trimmed.eq_ignore_ascii_case("feed") {
            Self::Feed
        } else {
            Self::Unknown(trimmed.to_string())
        })
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Element placement: kind, 0-based grid index, and network expression.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AntennaElement {
    /// Element or feed.
    pub kind: ElementKind,
    /// Grid point the element replaces.
    pub index: usize,
    /// Network expression, e.g. `S(2p+3n)+P(50o)`.
    pub network: String,
}

impl AntennaElement {
    /// Passive element at `index`.
    #[must_use]
    pub fn element(index: usize, network: impl Into<String>) -> Self {
        Self {
            kind: ElementKind::Element,
            index,
            network: network.into(),
        }
    }

    /// Feed at `index`.
    #[must_use]
    pub fn feed(index: usize, network: impl Into<String>) -> Self {
        Self {
            kind: ElementKind::Feed,
            index,
            network: network.into(),
        }
    }

    /// Element whose kind is given as a text tag (`"element"` or `"feed"`).
    #[must_use]
    pub fn tagged(tag: &str, index: usize, network: impl Into<String>) -> Self {
        let kind = tag
            .parse::<ElementKind>()
            .unwrap_or_else(|never| match never {});
        Self {
            kind,
            index,
            network: network.into(),
        }
    }

    /// Returns true for feed elements.
    #[must_use]
    pub fn is_feed(&self) -> bool {
        self.kind == ElementKind::Feed
    }
}

/// Resolved role of a placement that survived validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Passive element, substituted by its cascade two-port.
    Element,
    /// Feed, substituted by the shunt of its driven input impedance.
    Feed,
}

/// Validated placement with its network already parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    /// Element or feed.
    pub role: Role,
    /// Grid index within `[0, grid_len)`.
    pub index: usize,
    /// Parsed network.
    pub network: Network,
}

/// Validates `elements` against a grid of `grid_len` points and parses their
/// networks. Unknown kinds, out-of-range indices, and parse errors are
/// reported to `sink` and the offending element is dropped; overriding an
/// earlier element at the same index is reported as a warning.
pub fn resolve_placements(
    elements: &[AntennaElement],
    grid_len: usize,
    sink: &mut DiagnosticSink<'_>,
) -> Vec<Placement> {
    let mut placements: Vec<Placement> = Vec::with_capacity(elements.len());
    for element in elements {
        let ctx = StepContext::new(Step::ElementAssembly).at_index(element.index);
        let role = match &element.kind {
            ElementKind::Element => Role::Element,
            ElementKind::Feed => Role::Feed,
            ElementKind::Unknown(tag) => {
                sink.report(Diagnostic::warning(ctx, format!("unknown element kind `{tag}`, skipped")));
                continue;
            }
        };
        if element.index >= grid_len {
            sink.report(Diagnostic::error(
                ctx,
                format!(
                    "{} index {} outside grid of {grid_len} points, skipped",
                    element.kind, element.index
                ),
            ));
            continue;
        }
        let network = match Network::parse(&element.network) {
            Ok(network) => network,
            Err(err) => {
                sink.report(Diagnostic::error(
                    ctx,
                    format!("{} `{}`: {err}", element.kind, element.network),
                ));
                continue;
            }
        };
        if placements.iter().any(|p| p.index == element.index) {
            sink.report(Diagnostic::warning(
                ctx,
                format!("{} overrides an earlier element at the same index", element.kind),
            ));
        }
        placements.push(Placement {
            role,
            index: element.index,
            network,
        });
    }
    placements
}
