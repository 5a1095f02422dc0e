use crate::errors::Error;
use crate::matcher::{match_values, MatchOptions};
use crate::parser::parse;
use crate::syntax::GrammarNode;
use anyhow::Context;
use gosub_css3::value::ValueNode;
use log::warn;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;

/// A named value syntax (`<bg-layer>`) that data type references resolve to
#[derive(Debug, Clone)]
pub struct SyntaxDefinition {
    /// Name without the angle brackets
    pub name: String,
    /// Actual syntax
    pub syntax: GrammarNode,
}

/// A CSS property definition including its syntax and initial value
#[derive(Debug, Clone)]
pub struct PropertyDefinition {
    /// Name of the property (ie: color, background etc)
    pub name: String,
    /// Syntax of the values this property accepts
    pub syntax: GrammarNode,
    /// True when the property inherits from parent nodes if not set
    pub inherited: bool,
    /// Initial value of the property, if any
    pub initial_value: Option<String>,
}

impl PropertyDefinition {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn syntax(&self) -> &GrammarNode {
        &self.syntax
    }

    pub fn inherited(&self) -> bool {
        self.inherited
    }

    /// Returns true when this definition has an initial value
    pub fn has_initial_value(&self) -> bool {
        self.initial_value.is_some()
    }

    /// Matches a list of values against the current definition, using the built-in definitions
    pub fn matches(&self, values: &[ValueNode]) -> bool {
        match_values(values, &self.syntax, &MatchOptions::default()).valid
    }
}

/// Defines a list of CSS properties and named value syntaxes
#[derive(Debug, Clone, Default)]
pub struct CssDefinitions {
    /// All defined properties
    properties: HashMap<String, PropertyDefinition>,
    /// Named syntaxes for resolving data type references
    syntaxes: HashMap<String, SyntaxDefinition>,
}

#[derive(Debug, Deserialize)]
struct DefinitionFile {
    #[serde(default)]
    syntaxes: Vec<SyntaxEntry>,
    #[serde(default)]
    properties: Vec<PropertyEntry>,
}

#[derive(Debug, Deserialize)]
struct SyntaxEntry {
    name: String,
    syntax: String,
}

#[derive(Debug, Deserialize)]
struct PropertyEntry {
    name: String,
    syntax: String,
    #[serde(default)]
    inherited: bool,
    #[serde(default)]
    initial_value: Option<String>,
}

impl CssDefinitions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a definitions file. Every syntax in the file must compile.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        let mut definitions = Self::new();
        definitions.load_json(json)?;
        Ok(definitions)
    }

    /// Adds all definitions of a JSON document, replacing definitions with the same name.
    /// Returns the number of added definitions. Nothing is added when any syntax fails to compile.
    pub fn load_json(&mut self, json: &str) -> Result<usize, Error> {
        let file: DefinitionFile = serde_json::from_str(json)?;

        let mut syntaxes = Vec::with_capacity(file.syntaxes.len());
        for entry in file.syntaxes {
            let syntax = compile(&entry.name, &entry.syntax)?;
            syntaxes.push(SyntaxDefinition {
                name: normalize_name(&entry.name),
                syntax,
            });
        }

        let mut properties = Vec::with_capacity(file.properties.len());
        for entry in file.properties {
            let syntax = compile(&entry.name, &entry.syntax)?;
            properties.push(PropertyDefinition {
                name: normalize_name(&entry.name),
                syntax,
                inherited: entry.inherited,
                initial_value: entry.initial_value,
            });
        }

        let count = syntaxes.len() + properties.len();
        for syntax in syntaxes {
            self.add_syntax(syntax);
        }
        for property in properties {
            self.add_property(property);
        }

        Ok(count)
    }

    /// Loads an additional definitions file from disk
    pub fn load_file(&mut self, path: &Path) -> gosub_shared::types::Result<usize> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("could not read definitions file {}", path.display()))?;
        let count = self
            .load_json(&json)
            .with_context(|| format!("could not load definitions file {}", path.display()))?;

        log::debug!("loaded {} definitions from {}", count, path.display());
        Ok(count)
    }

    /// Add a new property definition
    pub fn add_property(&mut self, property: PropertyDefinition) {
        self.properties.insert(property.name.clone(), property);
    }

    /// Add a new syntax definition
    pub fn add_syntax(&mut self, syntax: SyntaxDefinition) {
        self.syntaxes.insert(syntax.name.clone(), syntax);
    }

    /// Find a specific property
    pub fn find_property(&self, name: &str) -> Option<&PropertyDefinition> {
        self.properties.get(&name.to_ascii_lowercase())
    }

    /// Find a named syntax
    pub fn find_syntax(&self, name: &str) -> Option<&SyntaxDefinition> {
        self.syntaxes.get(&name.to_ascii_lowercase())
    }

    /// Returns the number of property definitions
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Returns the number of named syntaxes
    pub fn syntax_count(&self) -> usize {
        self.syntaxes.len()
    }

    /// Property names in alphabetical order
    pub fn property_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.properties.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

fn compile(name: &str, source: &str) -> Result<GrammarNode, Error> {
    parse(source).map_err(|source| Error::CssCompile {
        name: name.to_string(),
        source,
    })
}

/// Strips the decoration from names like `<bg-layer>` or `<'color'>`
fn normalize_name(name: &str) -> String {
    name.trim()
        .trim_start_matches('<')
        .trim_end_matches('>')
        .trim_matches('\'')
        .to_ascii_lowercase()
}

pub static CSS_DEFINITIONS: LazyLock<CssDefinitions, fn() -> CssDefinitions> = LazyLock::new(parse_definition_files);

/// Parses the internal CSS definition file. Entries that do not compile are skipped.
fn parse_definition_files() -> CssDefinitions {
    let contents = include_str!("../resources/definitions.json");
    let file: DefinitionFile = match serde_json::from_str(contents) {
        Ok(file) => file,
        Err(e) => {
            log::error!("the built-in definitions are not well-formatted: {}", e);
            return CssDefinitions::new();
        }
    };

    let mut definitions = CssDefinitions::new();

    for entry in file.syntaxes {
        match parse(&entry.syntax) {
            Ok(syntax) => definitions.add_syntax(SyntaxDefinition {
                name: normalize_name(&entry.name),
                syntax,
            }),
            Err(e) => warn!("Could not compile syntax for syntax {:?}: {}", entry.name, e),
        }
    }

    for entry in file.properties {
        match parse(&entry.syntax) {
            Ok(syntax) => definitions.add_property(PropertyDefinition {
                name: normalize_name(&entry.name),
                syntax,
                inherited: entry.inherited,
                initial_value: entry.initial_value,
            }),
            Err(e) => warn!("Could not compile syntax for property {:?}: {}", entry.name, e),
        }
    }

    log::debug!(
        "loaded {} built-in properties and {} syntaxes",
        definitions.len(),
        definitions.syntax_count()
    );

    definitions
}

/// Main function to return the definitions. This will automatically load the definition file
/// and caches it if needed.
pub fn get_css_definitions() -> &'static CssDefinitions {
    &CSS_DEFINITIONS
}

#[cfg(test)]
mod tests {
    use super::*;
    use gosub_css3::parse_value;

    #[test]
    fn test_parse_definition_file() {
        let definitions = get_css_definitions();
        assert!(!definitions.is_empty());
        assert!(definitions.find_property("background").is_some());
        assert!(definitions.find_property("Color").is_some_and(PropertyDefinition::inherited));
        assert!(definitions.find_syntax("bg-layer").is_some());
        assert!(definitions.find_syntax("length").is_none());
    }

    #[test]
    fn test_all_builtin_entries_compile() {
        // the lenient loader skips broken entries, the strict one reports them
        let json = include_str!("../resources/definitions.json");
        let strict = CssDefinitions::from_json(json).unwrap();
        assert_eq!(strict.len(), get_css_definitions().len());
        assert_eq!(strict.syntax_count(), get_css_definitions().syntax_count());
    }

    #[test]
    fn test_load_json() {
        let mut definitions = CssDefinitions::new();
        let count = definitions
            .load_json(
                r#"{
                    "syntaxes": [ { "name": "<my-size>", "syntax": "small | large" } ],
                    "properties": [ { "name": "my-prop", "syntax": "<my-size>{1,2}", "initial_value": "small" } ]
                }"#,
            )
            .unwrap();

        assert_eq!(count, 2);
        assert_eq!(definitions.find_syntax("my-size").unwrap().syntax.to_string(), "small | large");
        let property = definitions.find_property("my-prop").unwrap();
        assert!(!property.inherited());
        assert!(property.has_initial_value());
        assert_eq!(definitions.property_names(), vec!["my-prop"]);
    }

    #[test]
    fn test_load_json_errors() {
        let mut definitions = CssDefinitions::new();

        let err = definitions.load_json("{ nope").unwrap_err();
        assert!(matches!(err, Error::Definitions(_)));

        let err = definitions
            .load_json(r#"{ "syntaxes": [ { "name": "ok", "syntax": "a" }, { "name": "broken", "syntax": "a ||" } ] }"#)
            .unwrap_err();
        assert!(matches!(err, Error::CssCompile { ref name, .. } if name == "broken"));
        // nothing was added
        assert_eq!(definitions.syntax_count(), 0);
    }

    #[test]
    fn test_property_matches() {
        let definitions = get_css_definitions();
        let color = definitions.find_property("color").unwrap();

        assert!(color.matches(&parse_value("red").unwrap()));
        assert!(color.matches(&parse_value("rgb(1 2 3)").unwrap()));
        assert!(!color.matches(&parse_value("12px").unwrap()));
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("<bg-layer>"), "bg-layer");
        assert_eq!(normalize_name("<'Color'>"), "color");
        assert_eq!(normalize_name(" margin "), "margin");
    }
}
