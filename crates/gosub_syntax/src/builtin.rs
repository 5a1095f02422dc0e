//! Built-in css data types that are not defined by a syntax of their own

use crate::syntax::RangeType;
use gosub_css3::value::{ValueKind, ValueNode};

/// Value categories each data type accepts. A value's category is [`ValueNode::type_name`].
const TYPE_INCLUSIONS: &[(&str, &[&str])] = &[
    ("number", &["number", "integer"]),
    ("integer", &["integer"]),
    ("percentage", &["percentage"]),
    ("length", &["length"]),
    ("angle", &["angle"]),
    ("time", &["time"]),
    ("frequency", &["frequency"]),
    ("resolution", &["resolution"]),
    ("flex", &["flex"]),
    (
        "dimension",
        &["length", "angle", "time", "frequency", "resolution", "flex", "dimension"],
    ),
    ("length-percentage", &["length", "percentage"]),
    ("angle-percentage", &["angle", "percentage"]),
    ("time-percentage", &["time", "percentage"]),
    ("frequency-percentage", &["frequency", "percentage"]),
    ("string", &["string"]),
    ("custom-ident", &["custom-ident", "dashed-ident"]),
    ("ident", &["custom-ident", "dashed-ident", "css-wide-keyword"]),
    ("dashed-ident", &["dashed-ident"]),
    ("custom-property-name", &["dashed-ident"]),
    ("hex-color", &["hex-color"]),
    ("url", &["url"]),
    ("image", &["url"]),
];

/// Data types that accept a unitless zero
const ZERO_TYPES: [&str; 2] = ["length", "length-percentage"];

/// Data types that are handled here without an inclusion entry
const SPECIAL_TYPES: [&str; 3] = ["color", "named-color", "system-color"];

const MATH_FUNCTIONS: [&str; 21] = [
    "calc", "min", "max", "clamp", "round", "mod", "rem", "abs", "sign", "sin", "cos", "tan", "asin", "acos", "atan",
    "atan2", "pow", "sqrt", "hypot", "log", "exp",
];

const COLOR_FUNCTIONS: [&str; 12] = [
    "rgb",
    "rgba",
    "hsl",
    "hsla",
    "hwb",
    "lab",
    "lch",
    "oklab",
    "oklch",
    "color",
    "color-mix",
    "light-dark",
];

const IMAGE_FUNCTIONS: [&str; 12] = [
    "url",
    "src",
    "linear-gradient",
    "radial-gradient",
    "conic-gradient",
    "repeating-linear-gradient",
    "repeating-radial-gradient",
    "repeating-conic-gradient",
    "image",
    "image-set",
    "cross-fade",
    "element",
];

/// Numeric data types, these accept math functions
const NUMERIC_TYPES: [&str; 14] = [
    "number",
    "integer",
    "percentage",
    "length",
    "angle",
    "time",
    "frequency",
    "resolution",
    "flex",
    "dimension",
    "length-percentage",
    "angle-percentage",
    "time-percentage",
    "frequency-percentage",
];

pub const CSS_COLORNAMES: [&str; 148] = [
    "aliceblue",
    "antiquewhite",
    "aqua",
    "aquamarine",
    "azure",
    "beige",
    "bisque",
    "black",
    "blanchedalmond",
    "blue",
    "blueviolet",
    "brown",
    "burlywood",
    "cadetblue",
    "chartreuse",
    "chocolate",
    "coral",
    "cornflowerblue",
    "cornsilk",
    "crimson",
    "cyan",
    "darkblue",
    "darkcyan",
    "darkgoldenrod",
    "darkgray",
    "darkgreen",
    "darkgrey",
    "darkkhaki",
    "darkmagenta",
    "darkolivegreen",
    "darkorange",
    "darkorchid",
    "darkred",
    "darksalmon",
    "darkseagreen",
    "darkslateblue",
    "darkslategray",
    "darkslategrey",
    "darkturquoise",
    "darkviolet",
    "deeppink",
    "deepskyblue",
    "dimgray",
    "dimgrey",
    "dodgerblue",
    "firebrick",
    "floralwhite",
    "forestgreen",
    "fuchsia",
    "gainsboro",
    "ghostwhite",
    "gold",
    "goldenrod",
    "gray",
    "green",
    "greenyellow",
    "grey",
    "honeydew",
    "hotpink",
    "indianred",
    "indigo",
    "ivory",
    "khaki",
    "lavender",
    "lavenderblush",
    "lawngreen",
    "lemonchiffon",
    "lightblue",
    "lightcoral",
    "lightcyan",
    "lightgoldenrodyellow",
    "lightgray",
    "lightgreen",
    "lightgrey",
    "lightpink",
    "lightsalmon",
    "lightseagreen",
    "lightskyblue",
    "lightslategray",
    "lightslategrey",
    "lightsteelblue",
    "lightyellow",
    "lime",
    "limegreen",
    "linen",
    "magenta",
    "maroon",
    "mediumaquamarine",
    "mediumblue",
    "mediumorchid",
    "mediumpurple",
    "mediumseagreen",
    "mediumslateblue",
    "mediumspringgreen",
    "mediumturquoise",
    "mediumvioletred",
    "midnightblue",
    "mintcream",
    "mistyrose",
    "moccasin",
    "navajowhite",
    "navy",
    "oldlace",
    "olive",
    "olivedrab",
    "orange",
    "orangered",
    "orchid",
    "palegoldenrod",
    "palegreen",
    "paleturquoise",
    "palevioletred",
    "papayawhip",
    "peachpuff",
    "peru",
    "pink",
    "plum",
    "powderblue",
    "purple",
    "red",
    "rosybrown",
    "royalblue",
    "saddlebrown",
    "salmon",
    "sandybrown",
    "seagreen",
    "seashell",
    "sienna",
    "silver",
    "skyblue",
    "slateblue",
    "slategray",
    "slategrey",
    "snow",
    "springgreen",
    "steelblue",
    "tan",
    "teal",
    "thistle",
    "tomato",
    "turquoise",
    "violet",
    "wheat",
    "white",
    "whitesmoke",
    "yellow",
    "yellowgreen",
    "rebeccapurple",
];

pub const CSS_SYSTEM_COLOR_NAMES: [&str; 19] = [
    "accentcolor",
    "accentcolortext",
    "activetext",
    "buttonborder",
    "buttonface",
    "buttontext",
    "canvas",
    "canvastext",
    "field",
    "fieldtext",
    "graytext",
    "highlight",
    "highlighttext",
    "linktext",
    "mark",
    "marktext",
    "selecteditem",
    "selecteditemtext",
    "visitedtext",
];

/// Returns true when the name is a data type we know how to match without a definition
pub fn is_builtin(name: &str) -> bool {
    SPECIAL_TYPES.contains(&name) || TYPE_INCLUSIONS.iter().any(|(n, _)| *n == name)
}

/// Checks a single (non-function) value against a built-in data type
pub fn matches_value(name: &str, range: Option<&RangeType>, value: &ValueNode) -> bool {
    match name {
        "color" => is_color_keyword(value) || matches!(value.kind, ValueKind::Color(_)),
        "named-color" => value.ident().is_some_and(|n| contains_ignore_case(&CSS_COLORNAMES, n)),
        "system-color" => value
            .ident()
            .is_some_and(|n| contains_ignore_case(&CSS_SYSTEM_COLOR_NAMES, n)),
        _ => {
            let accepted = TYPE_INCLUSIONS
                .iter()
                .find(|(n, _)| *n == name)
                .is_some_and(|(_, categories)| categories.contains(&value.type_name()));
            let zero = ZERO_TYPES.contains(&name) && value.is_zero();

            (accepted || zero) && in_range(range, value)
        }
    }
}

/// Checks if a function call as a whole is a value of the given built-in data type
pub fn matches_function(name: &str, function: &str) -> bool {
    let function = function.to_ascii_lowercase();
    let function = function.as_str();

    match name {
        "color" => COLOR_FUNCTIONS.contains(&function),
        "image" => IMAGE_FUNCTIONS.contains(&function),
        "url" => function == "url" || function == "src",
        n if NUMERIC_TYPES.contains(&n) => MATH_FUNCTIONS.contains(&function),
        _ => false,
    }
}

fn is_color_keyword(value: &ValueNode) -> bool {
    let Some(name) = value.ident() else {
        return false;
    };

    name.eq_ignore_ascii_case("currentcolor")
        || name.eq_ignore_ascii_case("transparent")
        || contains_ignore_case(&CSS_COLORNAMES, name)
        || contains_ignore_case(&CSS_SYSTEM_COLOR_NAMES, name)
}

fn contains_ignore_case(list: &[&str], name: &str) -> bool {
    list.iter().any(|n| n.eq_ignore_ascii_case(name))
}

/// Ranges only apply to literal numeric values
fn in_range(range: Option<&RangeType>, value: &ValueNode) -> bool {
    match (range, value.numeric_value()) {
        (Some(range), Some(number)) => range.contains(number),
        _ => true,
    }
}
