use std::process::ExitCode;

use anyhow::{bail, Context};
use log::{debug, info};

use tapn_reach::marking::inclusion::{IncPlaces, MarkingFactory};
use tapn_reach::options::{FactoryKind, IncPlaceSelection, Options};
use tapn_reach::report::{TraceStepReport, VerificationReport};
use tapn_reach::tapn::index_vec::IndexVec;
use tapn_reach::tapn::io;
use tapn_reach::trace::EntrySolver;
use tapn_reach::verify::search::{Outcome, Verifier};

fn main() -> ExitCode {
    if std::env::var("TAPNR_LOG").is_ok() {
        let env = env_logger::Env::new().filter("TAPNR_LOG");
        env_logger::init_from_env(env);
    }

    let args: Vec<String> = std::env::args().skip(1).collect();
    let options = match Options::parse_from_args(&args) {
        Ok(options) => options,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    match run(options) {
        Ok(Outcome::Satisfied) => ExitCode::SUCCESS,
        Ok(_) => ExitCode::from(2),
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(options: Options) -> anyhow::Result<Outcome> {
    let model = io::load_model(&options.model)
        .with_context(|| format!("loading model {}", options.model.display()))?;
    let query = io::load_query(&options.query, &model.net)
        .with_context(|| format!("loading query {}", options.query.display()))?;
    debug!("model has {} places, {} transitions", model.net.num_places(), model.net.num_transitions());

    if let Some(k) = options.k_bound {
        if k < model.initial_marking.len() {
            bail!(
                "k-bound {k} is below the {} tokens of the initial marking",
                model.initial_marking.len()
            );
        }
    }

    let factory = match options.factory {
        FactoryKind::Default => MarkingFactory::plain(&model.net),
        FactoryKind::DiscreteInclusion => {
            let mut flagged = IndexVec::from_elem(false, model.net.num_places());
            match &options.inc_places {
                IncPlaceSelection::All => {
                    for id in model.net.places().map(|(id, _)| id) {
                        flagged[id] = true;
                    }
                }
                IncPlaceSelection::None => {}
                IncPlaceSelection::Names(names) => {
                    for name in names {
                        flagged[model.net.place_by_name(name)?] = true;
                    }
                }
            }
            let mut inc = IncPlaces::new(&model.net, &flagged);
            inc.prune_for_query(&query.search_goal());
            MarkingFactory::discrete_inclusion(&model.net, inc)
        }
    };

    let query_text = query.render(&model.net);
    info!("verifying {query_text}");

    let mut verifier = Verifier::new(
        &model.net,
        model.initial_marking,
        query,
        factory,
        options.search_order,
        options.k_bound,
        options.trace,
    );
    let outcome = verifier.verify();

    let trace = if options.trace {
        match verifier.trace() {
            Some(symbolic) => {
                let delays = EntrySolver::new(&symbolic)
                    .delays()
                    .context("solving trace delays")?;
                Some(
                    symbolic
                        .steps
                        .iter()
                        .zip(delays)
                        .map(|(step, delay)| TraceStepReport {
                            delay,
                            transition: model.net.transition(step.transition).name.clone(),
                        })
                        .collect(),
                )
            }
            None => None,
        }
    } else {
        None
    };

    let report = VerificationReport {
        query: query_text,
        outcome,
        stats: verifier.stats(),
        trace,
    };
    print!("{report}");
    if let Some(path) = &options.output {
        report
            .write_json(path)
            .with_context(|| format!("writing report to {}", path.display()))?;
    }
    Ok(outcome)
}
