//! JSON input formats for models and queries.
//!
//! Arcs and queries refer to places by name; loading resolves names to
//! identifiers against the assembled net.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::tapn::ids::PlaceId;
use crate::tapn::interval::{TimeInterval, TimeInvariant};
use crate::tapn::net::{ModelError, TimedArcPetriNet};
use crate::tapn::structure::{TimedPlace, TimedTransition};
use crate::verify::query::{CmpOp, Expr, Quantifier, Query};

#[derive(Debug, Error)]
pub enum IoError {
    #[error("failed to read {path}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Model(#[from] ModelError),
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ModelFile {
    pub places: Vec<PlaceSpec>,
    pub transitions: Vec<TransitionSpec>,
    #[serde(default)]
    pub initial_marking: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PlaceSpec {
    pub name: String,
    #[serde(default)]
    pub invariant: Option<TimeInvariant>,
    #[serde(default)]
    pub untimed: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TransitionSpec {
    pub name: String,
    #[serde(default)]
    pub inputs: Vec<ArcSpec>,
    #[serde(default)]
    pub outputs: Vec<String>,
    #[serde(default)]
    pub inhibitors: Vec<ArcSpec>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ArcSpec {
    pub place: String,
    /// Missing guard means `[0, inf)`.
    #[serde(default)]
    pub guard: Option<TimeInterval>,
}

/// Query file: quantifier plus a formula over place names.
#[derive(Debug, Serialize, Deserialize)]
pub struct QueryFile {
    pub quantifier: Quantifier,
    pub expr: ExprSpec,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExprSpec {
    Bool(bool),
    Not(Box<ExprSpec>),
    And(Vec<ExprSpec>),
    Or(Vec<ExprSpec>),
    Count {
        place: String,
        op: CmpOp,
        count: u32,
    },
}

/// A net together with the places its initial tokens sit in, all aged
/// zero.
#[derive(Debug)]
pub struct LoadedModel {
    pub net: TimedArcPetriNet,
    pub initial_marking: Vec<PlaceId>,
}

pub fn load_model(path: &Path) -> Result<LoadedModel, IoError> {
    let text = fs::read_to_string(path).map_err(|source| IoError::Read {
        path: path.display().to_string(),
        source,
    })?;
    let file: ModelFile = serde_json::from_str(&text).map_err(|source| IoError::Parse {
        path: path.display().to_string(),
        source,
    })?;
    build_model(file)
}

pub fn build_model(file: ModelFile) -> Result<LoadedModel, IoError> {
    let mut net = TimedArcPetriNet::new();
    for spec in file.places {
        let mut place = TimedPlace::new(spec.name);
        place.invariant = spec.invariant.unwrap_or(TimeInvariant::INF);
        place.untimed = spec.untimed;
        net.add_place(place)?;
    }
    for spec in file.transitions {
        let transition = net.add_transition(TimedTransition::new(spec.name))?;
        for arc in spec.inputs {
            let place = net.place_by_name(&arc.place)?;
            net.add_input_arc(transition, place, arc.guard.unwrap_or(TimeInterval::ZERO_TO_INF));
        }
        for name in spec.outputs {
            let place = net.place_by_name(&name)?;
            net.add_output_arc(transition, place);
        }
        for arc in spec.inhibitors {
            let place = net.place_by_name(&arc.place)?;
            net.add_inhibitor_arc(
                transition,
                place,
                arc.guard.unwrap_or(TimeInterval::ZERO_TO_INF),
            );
        }
    }
    let mut initial_marking = Vec::with_capacity(file.initial_marking.len());
    for name in &file.initial_marking {
        initial_marking.push(net.place_by_name(name)?);
    }
    Ok(LoadedModel {
        net,
        initial_marking,
    })
}

pub fn load_query(path: &Path, net: &TimedArcPetriNet) -> Result<Query, IoError> {
    let text = fs::read_to_string(path).map_err(|source| IoError::Read {
        path: path.display().to_string(),
        source,
    })?;
    let file: QueryFile = serde_json::from_str(&text).map_err(|source| IoError::Parse {
        path: path.display().to_string(),
        source,
    })?;
    Ok(Query {
        quantifier: file.quantifier,
        expr: resolve_expr(file.expr, net)?,
    })
}

fn resolve_expr(spec: ExprSpec, net: &TimedArcPetriNet) -> Result<Expr, IoError> {
    Ok(match spec {
        ExprSpec::Bool(b) => Expr::Bool(b),
        ExprSpec::Not(inner) => Expr::Not(Box::new(resolve_expr(*inner, net)?)),
        ExprSpec::And(parts) => Expr::And(
            parts
                .into_iter()
                .map(|p| resolve_expr(p, net))
                .collect::<Result<_, _>>()?,
        ),
        ExprSpec::Or(parts) => Expr::Or(
            parts
                .into_iter()
                .map(|p| resolve_expr(p, net))
                .collect::<Result<_, _>>()?,
        ),
        ExprSpec::Count { place, op, count } => Expr::Count {
            place: net.place_by_name(&place)?,
            op,
            count,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_roundtrips_through_json() {
        let text = r#"{
            "places": [
                {"name": "p", "invariant": {"bound": 4, "strict": false}},
                {"name": "q", "untimed": true}
            ],
            "transitions": [
                {
                    "name": "t",
                    "inputs": [{"place": "p", "guard": {"lower": 1, "lower_strict": false, "upper": 3, "upper_strict": false}}],
                    "outputs": ["q"]
                }
            ],
            "initial_marking": ["p", "p"]
        }"#;
        let file: ModelFile = serde_json::from_str(text).unwrap();
        let model = build_model(file).unwrap();
        assert_eq!(model.net.num_places(), 2);
        assert_eq!(model.net.num_transitions(), 1);
        assert_eq!(model.initial_marking.len(), 2);
        let p = model.net.place_by_name("p").unwrap();
        assert_eq!(model.net.place(p).invariant, TimeInvariant::at_most(4));
        assert!(model.net.place(model.net.place_by_name("q").unwrap()).untimed);
    }

    #[test]
    fn unknown_place_in_arc_is_an_error() {
        let file = ModelFile {
            places: vec![],
            transitions: vec![TransitionSpec {
                name: "t".into(),
                inputs: vec![],
                outputs: vec!["ghost".into()],
                inhibitors: vec![],
            }],
            initial_marking: vec![],
        };
        assert!(build_model(file).is_err());
    }

    #[test]
    fn query_names_resolve_to_places() {
        let file = ModelFile {
            places: vec![PlaceSpec {
                name: "goal".into(),
                invariant: None,
                untimed: false,
            }],
            transitions: vec![],
            initial_marking: vec![],
        };
        let model = build_model(file).unwrap();
        let spec: QueryFile = serde_json::from_str(
            r#"{"quantifier": "EF", "expr": {"count": {"place": "goal", "op": ">=", "count": 1}}}"#,
        )
        .unwrap();
        let expr = resolve_expr(spec.expr, &model.net).unwrap();
        let goal = model.net.place_by_name("goal").unwrap();
        assert_eq!(
            expr,
            Expr::Count {
                place: goal,
                op: CmpOp::Ge,
                count: 1
            }
        );
    }
}
