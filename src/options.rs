//! Command line options.
//! `tapnr --query q.json --search-order dfs model.json`

use std::error::Error;
use std::path::PathBuf;

use clap::{Arg, ArgAction, Command};

use crate::verify::waiting::SearchOrder;

/// How markings are stored between explorations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FactoryKind {
    Default,
    DiscreteInclusion,
}

/// Which places take part in the inclusion abstraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IncPlaceSelection {
    All,
    None,
    Names(Vec<String>),
}

fn make_options_parser() -> clap::Command {
    Command::new("tapnr")
        .no_binary_name(true)
        .version("v0.1.0")
        .arg(
            Arg::new("model")
                .value_name("MODEL")
                .help("Path to the net model file")
                .required(true),
        )
        .arg(
            Arg::new("query")
                .short('q')
                .long("query")
                .value_name("FILE")
                .help("Path to the query file")
                .required(true),
        )
        .arg(
            Arg::new("search-order")
                .short('s')
                .long("search-order")
                .help("Order in which waiting markings are explored")
                .default_value("bfs")
                .value_parser(["bfs", "dfs", "random", "cover-most"]),
        )
        .arg(
            Arg::new("factory")
                .short('f')
                .long("factory")
                .help("Marking storage: exact or with discrete inclusion")
                .default_value("default")
                .value_parser(["default", "discrete-inclusion"]),
        )
        .arg(
            Arg::new("k-bound")
                .short('k')
                .long("k-bound")
                .value_name("N")
                .help("Discard markings with more than N tokens")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            Arg::new("inc-places")
                .long("inc-places")
                .value_name("LIST")
                .help("Comma separated place names for inclusion, or *ALL* / *NONE*")
                .default_value("*ALL*"),
        )
        .arg(
            Arg::new("trace")
                .short('t')
                .long("trace")
                .help("Print a witness trace with concrete delays")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("FILE")
                .help("Write the verification report as JSON to FILE"),
        )
}

#[derive(Debug)]
pub struct Options {
    pub model: PathBuf,
    pub query: PathBuf,
    pub search_order: SearchOrder,
    pub factory: FactoryKind,
    pub k_bound: Option<usize>,
    pub inc_places: IncPlaceSelection,
    pub trace: bool,
    pub output: Option<PathBuf>,
}

impl Options {
    pub fn parse_from_args(flags: &[String]) -> Result<Self, Box<dyn Error>> {
        let app = make_options_parser();
        let matches = app.try_get_matches_from(flags.iter())?;

        let search_order = match matches.get_one::<String>("search-order").map(|s| s.as_str()) {
            Some("dfs") => SearchOrder::Dfs,
            Some("random") => SearchOrder::Random,
            Some("cover-most") => SearchOrder::CoverMost,
            _ => SearchOrder::Bfs,
        };

        let factory = match matches.get_one::<String>("factory").map(|s| s.as_str()) {
            Some("discrete-inclusion") => FactoryKind::DiscreteInclusion,
            _ => FactoryKind::Default,
        };

        let inc_places = match matches.get_one::<String>("inc-places").map(|s| s.as_str()) {
            Some("*ALL*") | None => IncPlaceSelection::All,
            Some("*NONE*") => IncPlaceSelection::None,
            Some(list) => IncPlaceSelection::Names(
                list.split(',')
                    .map(|s| s.trim().to_owned())
                    .filter(|s| !s.is_empty())
                    .collect(),
            ),
        };

        let trace = matches.get_flag("trace");
        if trace && factory == FactoryKind::DiscreteInclusion {
            return Err("trace reconstruction requires the default factory")?;
        }

        let search_order = if search_order == SearchOrder::CoverMost
            && factory != FactoryKind::DiscreteInclusion
        {
            // cover-most only orders abstracted markings meaningfully
            SearchOrder::Bfs
        } else {
            search_order
        };

        Ok(Options {
            model: PathBuf::from(matches.get_one::<String>("model").unwrap()),
            query: PathBuf::from(matches.get_one::<String>("query").unwrap()),
            search_order,
            factory,
            k_bound: matches.get_one::<usize>("k-bound").copied(),
            inc_places,
            trace,
            output: matches.get_one::<String>("output").map(PathBuf::from),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(s: &str) -> Vec<String> {
        s.split_whitespace().map(str::to_owned).collect()
    }

    #[test]
    fn defaults_are_bfs_and_exact_storage() {
        let options = Options::parse_from_args(&args("-q q.json model.json")).unwrap();
        assert_eq!(options.search_order, SearchOrder::Bfs);
        assert_eq!(options.factory, FactoryKind::Default);
        assert_eq!(options.k_bound, None);
        assert_eq!(options.inc_places, IncPlaceSelection::All);
        assert!(!options.trace);
    }

    #[test]
    fn inc_place_list_is_parsed() {
        let options =
            Options::parse_from_args(&args("-q q.json --inc-places a,b model.json")).unwrap();
        assert_eq!(
            options.inc_places,
            IncPlaceSelection::Names(vec!["a".into(), "b".into()])
        );

        let options =
            Options::parse_from_args(&args("-q q.json --inc-places *NONE* model.json")).unwrap();
        assert_eq!(options.inc_places, IncPlaceSelection::None);
    }

    #[test]
    fn trace_with_inclusion_is_rejected() {
        let err = Options::parse_from_args(&args(
            "-q q.json -f discrete-inclusion --trace model.json",
        ));
        assert!(err.is_err());
    }

    #[test]
    fn cover_most_without_inclusion_falls_back_to_bfs() {
        let options =
            Options::parse_from_args(&args("-q q.json -s cover-most model.json")).unwrap();
        assert_eq!(options.search_order, SearchOrder::Bfs);

        let options = Options::parse_from_args(&args(
            "-q q.json -s cover-most -f discrete-inclusion model.json",
        ))
        .unwrap();
        assert_eq!(options.search_order, SearchOrder::CoverMost);
    }

    #[test]
    fn unknown_search_order_is_an_error() {
        assert!(Options::parse_from_args(&args("-q q.json -s sideways model.json")).is_err());
    }
}
