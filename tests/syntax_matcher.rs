use gosub_css3::parse_value;
use gosub_syntax::matcher::DEFAULT_STEP_BUDGET;
use gosub_syntax::{get_css_definitions, match_values, parse, CssDefinitions, MatchError, MatchOptions, MatchType};
use test_case::test_case;

fn matches(grammar: &str, value: &str) -> bool {
    let grammar = parse(grammar).unwrap();
    let values = parse_value(value).unwrap();
    match_values(&values, &grammar, &MatchOptions::default()).valid
}

fn property_matches(property: &str, value: &str) -> bool {
    let definition = get_css_definitions().find_property(property).unwrap();
    let values = parse_value(value).unwrap();
    definition.matches(&values)
}

#[test_case("a b c", "a b c"; "juxtaposition")]
#[test_case("a && b", "a && b"; "all of")]
#[test_case("[a|b]", "[ a | b ]"; "group spacing is normalized")]
#[test_case("a b|c", "a b | c"; "precedence")]
#[test_case("[ a | b ] c", "[ a | b ] c"; "brackets are kept")]
#[test_case("<length [0,∞]>{1,4}", "<length [0,∞]>{1,4}"; "range and multiplier")]
#[test_case("<'margin-top'>#", "<'margin-top'>#"; "property reference list")]
#[test_case("fit-content( <length-percentage> )", "fit-content( <length-percentage> )"; "function")]
fn grammar_round_trip(source: &str, expected: &str) {
    let grammar = parse(source).unwrap();
    assert_eq!(grammar.to_string(), expected);
    assert_eq!(parse(&grammar.to_string()).unwrap(), grammar);
}

#[test_case("a ||"; "dangling combinator")]
#[test_case("[ a b"; "unclosed group")]
#[test_case("<length"; "unclosed data type")]
#[test_case("a{2,1}"; "inverted multiplier")]
#[test_case(""; "empty grammar")]
fn grammar_errors(source: &str) {
    assert!(parse(source).is_err());
}

#[test_case("border", "1px solid red", true)]
#[test_case("border", "red solid", true)]
#[test_case("border", "solid solid", false)]
#[test_case("margin", "1px auto 2px", true)]
#[test_case("margin", "1px 2px 3px 4px 5px", false)]
#[test_case("padding", "-1px", false)]
#[test_case("display", "inline flex", true)]
#[test_case("display", "block list-item", true)]
#[test_case("display", "flex flex", false)]
#[test_case("font-family", "\"Fira Sans\", Helvetica Neue, sans-serif", true)]
#[test_case("font-weight", "700", true)]
#[test_case("font-weight", "1001", false)]
#[test_case("box-shadow", "2px 2px 4px red, inset 0 0 1px blue", true)]
#[test_case("transition", "opacity 1s ease-in, width 2s", true)]
#[test_case("transition-timing-function", "cubic-bezier(0.1, 2, 0.3, 4)", true)]
#[test_case("transition-timing-function", "cubic-bezier(2, 2, 0.3, 4)", false)]
#[test_case("width", "fit-content(20px)", true)]
#[test_case("z-index", "1.5", false)]
#[test_case("color", "inherit", true)]
#[test_case("text-decoration-line", "underline overline", true)]
#[test_case("text-decoration-line", "none underline", false)]
fn properties(property: &str, value: &str, valid: bool) {
    assert_eq!(property_matches(property, value), valid);
}

#[test]
fn background_records() {
    let definition = get_css_definitions().find_property("background").unwrap();
    let values = parse_value("url(a.png) no-repeat, url(b.png) left top, red").unwrap();
    let result = match_values(&values, definition.syntax(), &MatchOptions::default());

    assert!(result.valid);
    let nodes: Vec<String> = result.matches.iter().map(|r| r.node.to_string()).collect();
    assert_eq!(nodes, vec!["<bg-layer>", ",", "<bg-layer>", ",", "<final-bg-layer>"]);

    assert_eq!(result.matches[0].values.len(), 2);
    assert_eq!(result.matches[2].values.len(), 3);
    assert_eq!(result.matches[4].values.len(), 1);
}

#[test]
fn pathological_any_of_stops_at_budget() {
    let grammar = parse(&vec!["<custom-ident>"; 10].join(" || ")).unwrap();
    let values = parse_value("a b c d e f g h i j 1px").unwrap();
    let result = match_values(&values, &grammar, &MatchOptions::default());

    assert!(!result.valid);
    assert!(result.steps > DEFAULT_STEP_BUDGET);
    assert!(result.errors.contains(&MatchError::BudgetExceeded {
        budget: DEFAULT_STEP_BUDGET
    }));
}

#[test]
fn excluded_types_never_match() {
    let grammar = parse("<custom-ident> | <length>").unwrap();
    let values = parse_value("foo").unwrap();

    let options = MatchOptions {
        exclude: vec!["custom-ident".to_string()],
        ..MatchOptions::default()
    };
    assert!(!match_values(&values, &grammar, &options).valid);
    assert!(match_values(&values, &grammar, &MatchOptions::default()).valid);
}

#[test]
fn ambiguous_interpretations() {
    let grammar = parse("<custom-ident>? <custom-ident>?").unwrap();
    let values = parse_value("foo").unwrap();

    let options = MatchOptions {
        match_type: MatchType::Ambiguous,
        ..MatchOptions::default()
    };
    let result = match_values(&values, &grammar, &options);
    assert!(result.valid);
    assert!(result.ambiguous);

    assert!(!match_values(&values, &grammar, &MatchOptions::default()).ambiguous);
}

#[test]
fn custom_definitions() {
    let definitions = CssDefinitions::from_json(
        r#"{
            "syntaxes": [ { "name": "<corner>", "syntax": "[ top | bottom ] && [ left | right ]" } ],
            "properties": [ { "name": "anchor", "syntax": "<corner>#" } ]
        }"#,
    )
    .unwrap();

    let property = definitions.find_property("anchor").unwrap();
    let options = MatchOptions::with_definitions(&definitions);

    let values = parse_value("top left, right bottom").unwrap();
    assert!(match_values(&values, property.syntax(), &options).valid);

    let values = parse_value("top top").unwrap();
    assert!(!match_values(&values, property.syntax(), &options).valid);

    // builtins still resolve, the global table does not
    let grammar = parse("<length> <'color'>").unwrap();
    let values = parse_value("1px red").unwrap();
    let result = match_values(&values, &grammar, &options);
    assert!(!result.valid);
    assert!(result
        .errors
        .iter()
        .any(|e| matches!(e, MatchError::Unresolved { .. })));
}

#[test]
fn simple_grammars() {
    assert!(matches("<length>{1,4} | auto", "auto"));
    assert!(matches("<length>{1,4} | auto", "1px 0 2em"));
    assert!(!matches("<length>{1,4} | auto", "1px auto"));
    assert!(matches("[ <length> , ]* <color>", "1px, 2px, red"));
    assert!(!matches("[ <length> , ]* <color>", "1px 2px, red"));
}
