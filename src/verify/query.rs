//! Reachability queries over discrete token counts.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::tapn::ids::PlaceId;
use crate::tapn::index_vec::IndexVec;
use crate::tapn::net::TimedArcPetriNet;

/// `EF` asks whether some reachable marking satisfies the formula, `AG`
/// whether every reachable marking does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Quantifier {
    #[serde(rename = "EF")]
    Exists,
    #[serde(rename = "AG")]
    Always,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CmpOp {
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = "!=")]
    Ne,
}

impl CmpOp {
    pub fn holds(self, lhs: u32, rhs: u32) -> bool {
        match self {
            CmpOp::Lt => lhs < rhs,
            CmpOp::Le => lhs <= rhs,
            CmpOp::Eq => lhs == rhs,
            CmpOp::Ge => lhs >= rhs,
            CmpOp::Gt => lhs > rhs,
            CmpOp::Ne => lhs != rhs,
        }
    }
}

impl fmt::Display for CmpOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CmpOp::Lt => "<",
            CmpOp::Le => "<=",
            CmpOp::Eq => "=",
            CmpOp::Ge => ">=",
            CmpOp::Gt => ">",
            CmpOp::Ne => "!=",
        };
        f.write_str(s)
    }
}

/// Boolean formula over per-place token counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Expr {
    Bool(bool),
    Not(Box<Expr>),
    And(Vec<Expr>),
    Or(Vec<Expr>),
    Count {
        place: PlaceId,
        op: CmpOp,
        count: u32,
    },
}

impl Expr {
    pub fn eval(&self, counts: &IndexVec<PlaceId, u32>) -> bool {
        match self {
            Expr::Bool(b) => *b,
            Expr::Not(inner) => !inner.eval(counts),
            Expr::And(parts) => parts.iter().all(|p| p.eval(counts)),
            Expr::Or(parts) => parts.iter().any(|p| p.eval(counts)),
            Expr::Count { place, op, count } => op.holds(counts[*place], *count),
        }
    }

    fn render(&self, net: &TimedArcPetriNet) -> String {
        match self {
            Expr::Bool(b) => b.to_string(),
            Expr::Not(inner) => format!("!({})", inner.render(net)),
            Expr::And(parts) => {
                let parts: Vec<String> = parts.iter().map(|p| p.render(net)).collect();
                format!("({})", parts.join(" and "))
            }
            Expr::Or(parts) => {
                let parts: Vec<String> = parts.iter().map(|p| p.render(net)).collect();
                format!("({})", parts.join(" or "))
            }
            Expr::Count { place, op, count } => {
                format!("{} {op} {count}", net.place(*place).name)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    pub quantifier: Quantifier,
    pub expr: Expr,
}

impl Query {
    /// The formula the forward search actually looks for. `AG f` holds
    /// exactly when no reachable marking satisfies `!f`, so the search
    /// always hunts for a witness.
    pub fn search_goal(&self) -> Expr {
        match self.quantifier {
            Quantifier::Exists => self.expr.clone(),
            Quantifier::Always => Expr::Not(Box::new(self.expr.clone())),
        }
    }

    /// Maps "a witness was found" back to the query's answer.
    pub fn outcome_of(&self, witness_found: bool) -> bool {
        match self.quantifier {
            Quantifier::Exists => witness_found,
            Quantifier::Always => !witness_found,
        }
    }

    pub fn render(&self, net: &TimedArcPetriNet) -> String {
        let quantifier = match self.quantifier {
            Quantifier::Exists => "EF",
            Quantifier::Always => "AG",
        };
        format!("{quantifier} {}", self.expr.render(net))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(values: &[u32]) -> IndexVec<PlaceId, u32> {
        IndexVec::from_vec(values.to_vec())
    }

    #[test]
    fn count_comparisons() {
        let e = Expr::Count {
            place: PlaceId::new(0),
            op: CmpOp::Ge,
            count: 2,
        };
        assert!(!e.eval(&counts(&[1])));
        assert!(e.eval(&counts(&[2])));
        assert!(e.eval(&counts(&[3])));
    }

    #[test]
    fn boolean_connectives() {
        let p0 = Expr::Count {
            place: PlaceId::new(0),
            op: CmpOp::Gt,
            count: 0,
        };
        let p1 = Expr::Count {
            place: PlaceId::new(1),
            op: CmpOp::Eq,
            count: 0,
        };
        let both = Expr::And(vec![p0.clone(), p1.clone()]);
        let either = Expr::Or(vec![p0, p1]);
        assert!(both.eval(&counts(&[1, 0])));
        assert!(!both.eval(&counts(&[1, 1])));
        assert!(either.eval(&counts(&[0, 0])));
        assert!(!either.eval(&counts(&[0, 1])));
    }

    #[test]
    fn always_queries_invert_the_witness() {
        let q = Query {
            quantifier: Quantifier::Always,
            expr: Expr::Bool(true),
        };
        assert_eq!(q.search_goal(), Expr::Not(Box::new(Expr::Bool(true))));
        assert!(q.outcome_of(false));
        assert!(!q.outcome_of(true));
    }
}
