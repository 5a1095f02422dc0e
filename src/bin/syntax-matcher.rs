use anyhow::Result;
use gosub_css3::parse_value;
use gosub_syntax::{match_values, MatchOptions, MatchType};
use gosub_syntax_bin::{compile_grammar, load_definitions, report};
use log::LevelFilter;
use simple_logger::SimpleLogger;
use std::path::PathBuf;
use std::process::exit;

fn bail(message: &str) -> ! {
    println!("{message}");
    exit(1);
}

fn main() -> Result<()> {
    let matches = clap::Command::new("Gosub CSS syntax matcher")
        .version("0.1.0")
        .arg(
            clap::Arg::new("grammar")
                .help("Value definition syntax, or a property name with --property")
                .required(true)
                .index(1),
        )
        .arg(
            clap::Arg::new("value")
                .help("The css value to match against the grammar")
                .index(2),
        )
        .arg(
            clap::Arg::new("property")
                .help("Use the syntax of the named property")
                .short('p')
                .long("property")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            clap::Arg::new("definitions")
                .help("Additional definitions file")
                .long("definitions")
                .value_parser(clap::value_parser!(PathBuf))
                .action(clap::ArgAction::Append),
        )
        .arg(
            clap::Arg::new("exclude")
                .help("Data type that never matches")
                .long("exclude")
                .action(clap::ArgAction::Append),
        )
        .arg(
            clap::Arg::new("ambiguous")
                .help("Search for a second interpretation")
                .long("ambiguous")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            clap::Arg::new("budget")
                .help("Maximum number of match steps")
                .long("budget")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            clap::Arg::new("tree")
                .help("Display the grammar as a tree")
                .long("tree")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            clap::Arg::new("debug")
                .help("Enable debug logging")
                .short('d')
                .long("debug")
                .action(clap::ArgAction::SetTrue),
        )
        .get_matches();

    if matches.get_flag("debug") {
        SimpleLogger::new().with_level(LevelFilter::Debug).init()?;
    }

    let files: Vec<PathBuf> = matches
        .get_many::<PathBuf>("definitions")
        .map(|files| files.cloned().collect())
        .unwrap_or_default();
    let definitions = load_definitions(&files)?;

    let Some(source) = matches.get_one::<String>("grammar") else {
        bail("no grammar given");
    };
    let grammar = match compile_grammar(&definitions, source, matches.get_flag("property")) {
        Ok(grammar) => grammar,
        Err(e) => bail(&format!("{e:#}")),
    };

    if matches.get_flag("tree") {
        let mut tree = String::new();
        grammar.write_tree(&mut tree, 0)?;
        print!("{tree}");
    } else {
        println!("{grammar}");
    }

    let Some(value) = matches.get_one::<String>("value") else {
        return Ok(());
    };
    let values = match parse_value(value) {
        Ok(values) => values,
        Err(e) => bail(&format!("could not parse value: {e}")),
    };

    let mut options = MatchOptions::with_definitions(&definitions);
    if matches.get_flag("ambiguous") {
        options.match_type = MatchType::Ambiguous;
    }
    if let Some(budget) = matches.get_one::<usize>("budget") {
        options.step_budget = *budget;
    }
    if let Some(exclude) = matches.get_many::<String>("exclude") {
        options.exclude = exclude.cloned().collect();
    }

    let result = match_values(&values, &grammar, &options);
    print!("{}", report(&result));

    if !result.valid {
        exit(1);
    }

    Ok(())
}
