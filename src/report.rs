//! Verification reports, printable and serializable.

use std::fmt;
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use serde::Serialize;

use crate::verify::search::{Outcome, SearchStats};

/// One trace step with its solved delay.
#[derive(Debug, Clone, Serialize)]
pub struct TraceStepReport {
    pub delay: f64,
    pub transition: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct VerificationReport {
    pub query: String,
    pub outcome: Outcome,
    pub stats: SearchStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace: Option<Vec<TraceStepReport>>,
}

impl VerificationReport {
    pub fn write_json(&self, path: &Path) -> io::Result<()> {
        let mut file = File::create(path)?;
        serde_json::to_writer_pretty(&mut file, self)?;
        file.write_all(b"\n")
    }
}

impl fmt::Display for VerificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verdict = match self.outcome {
            Outcome::Satisfied => "satisfied",
            Outcome::NotSatisfied => "not satisfied",
            Outcome::BoundExceeded => "inconclusive, token bound exceeded",
        };
        writeln!(f, "query {} is {}", self.query, verdict)?;
        writeln!(
            f,
            "explored {} markings, stored {}, discovered {}",
            self.stats.explored, self.stats.stored, self.stats.discovered
        )?;
        writeln!(f, "max tokens used: {}", self.stats.max_used_tokens)?;
        if let Some(trace) = &self.trace {
            writeln!(f, "trace:")?;
            for step in trace {
                writeln!(f, "  delay {} then fire {}", step.delay, step.transition)?;
            }
        }
        Ok(())
    }
}
