//! Console expression grammar.
//!
//! An expression is a dotted chain of steps:
//!
//! | Form | Step | Example |
//! |------|------|---------|
//! | `ident` | [`StepKind::Property`] | `document` |
//! | `ident[n]` | [`StepKind::Index`] | `children[2]` |
//! | `ident(args)` | [`StepKind::Call`] | `getItem('theme')` |
//!
//! Identifiers are ASCII letters, digits and `_`; index digits are ASCII.
//!
//! Tokens are found left to right; anything between them (dots,
//! whitespace, stray punctuation) is skipped. `a['k']` therefore reads
//! property `a` then property `k`, and `f()[1]` calls `f` then reads
//! property `"1"`.
//!
//! Call arguments are numbers, quoted strings, or JSON arrays/objects
//! without nesting of the same bracket. An array or object argument that
//! is not valid JSON is dropped.

// ============================================================================
// Imports
// ============================================================================

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

// ============================================================================
// Grammar
// ============================================================================

static STEP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?P<index>(?P<iname>[A-Za-z0-9_]+)\[(?P<n>[0-9]+)\])|(?P<call>(?P<cname>[A-Za-z0-9_]+)\((?P<args>[^)]*)\))|(?P<prop>[A-Za-z0-9_]+)",
    )
    .expect("step pattern must compile")
});

static ARG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"-?[0-9]+(?:\.[0-9]+)?|'[^']*'|"[^"]*"|\[[^\]]*\]|\{[^}]*\}"#)
        .expect("argument pattern must compile")
});

// ============================================================================
// Types
// ============================================================================

/// Kind of one evaluation step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
    /// Read a member.
    Property,
    /// Read a member, then index into it.
    Index,
    /// Invoke a member with arguments.
    Call,
}

/// One step of a parsed expression.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandStep {
    /// Step kind.
    pub kind: StepKind,
    /// Member name.
    pub name: String,
    /// Call arguments, or the single index for [`StepKind::Index`].
    pub args: Vec<Value>,
}

impl CommandStep {
    /// Creates a property step.
    #[inline]
    #[must_use]
    pub fn property(name: impl Into<String>) -> Self {
        Self {
            kind: StepKind::Property,
            name: name.into(),
            args: Vec::new(),
        }
    }

    /// Creates an index step.
    #[inline]
    #[must_use]
    pub fn index(name: impl Into<String>, index: u64) -> Self {
        Self {
            kind: StepKind::Index,
            name: name.into(),
            args: vec![Value::from(index)],
        }
    }

    /// Creates a call step.
    #[inline]
    #[must_use]
    pub fn call(name: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            kind: StepKind::Call,
            name: name.into(),
            args,
        }
    }
}

// ============================================================================
// Parsing
// ============================================================================

/// Parses an expression into its steps.
///
/// Never fails; fragments that match no form yield no step.
#[must_use]
pub fn parse_command(command: &str) -> Vec<CommandStep> {
    STEP.captures_iter(command)
        .filter_map(|caps| {
            if caps.name("call").is_some() {
                let name = caps.name("cname")?.as_str();
                let args = caps.name("args").map_or("", |m| m.as_str());
                Some(CommandStep::call(name, parse_args(args)))
            } else if caps.name("index").is_some() {
                let name = caps.name("iname")?.as_str();
                let n = caps.name("n")?.as_str();
                match n.parse::<u64>() {
                    Ok(n) => Some(CommandStep::index(name, n)),
                    // Too large to address anything; keep the name lookup.
                    Err(_) => Some(CommandStep::property(name)),
                }
            } else {
                caps.name("prop").map(|m| CommandStep::property(m.as_str()))
            }
        })
        .collect()
}

/// Decodes a call argument list.
fn parse_args(args: &str) -> Vec<Value> {
    ARG.find_iter(args)
        .filter_map(|m| parse_arg(m.as_str()))
        .collect()
}

fn parse_arg(arg: &str) -> Option<Value> {
    let first = arg.chars().next()?;
    match first {
        '[' | '{' => serde_json::from_str(arg).ok(),
        '\'' | '"' => Some(Value::String(arg[1..arg.len() - 1].to_string())),
        _ => arg.parse::<i64>().map(Value::from).ok().or_else(|| {
            arg.parse::<f64>()
                .ok()
                .and_then(serde_json::Number::from_f64)
                .map(Value::Number)
        }),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_command_cases() {
        let cases = vec![
            ("prop1", vec![CommandStep::property("prop1")]),
            ("arr1[1]", vec![CommandStep::index("arr1", 1)]),
            (
                "arr1['1']",
                vec![CommandStep::property("arr1"), CommandStep::property("1")],
            ),
            ("func1(1)", vec![CommandStep::call("func1", vec![json!(1)])]),
            (
                r#"func1(1,'2',[3],{"x":4})"#,
                vec![CommandStep::call(
                    "func1",
                    vec![json!(1), json!("2"), json!([3]), json!({"x": 4})],
                )],
            ),
            (
                "prop1.prop2.prop3",
                vec![
                    CommandStep::property("prop1"),
                    CommandStep::property("prop2"),
                    CommandStep::property("prop3"),
                ],
            ),
            (
                "prop1.func1(1,2,3).arr[1].prop2",
                vec![
                    CommandStep::property("prop1"),
                    CommandStep::call("func1", vec![json!(1), json!(2), json!(3)]),
                    CommandStep::index("arr", 1),
                    CommandStep::property("prop2"),
                ],
            ),
            (
                r#"prop1.func1(1,'2',[3],{"x":4}).arr1[1].prop2"#,
                vec![
                    CommandStep::property("prop1"),
                    CommandStep::call(
                        "func1",
                        vec![json!(1), json!("2"), json!([3]), json!({"x": 4})],
                    ),
                    CommandStep::index("arr1", 1),
                    CommandStep::property("prop2"),
                ],
            ),
            (
                "func1()[1].prop1",
                vec![
                    CommandStep::call("func1", vec![]),
                    CommandStep::property("1"),
                    CommandStep::property("prop1"),
                ],
            ),
        ];

        for (command, expected) in cases {
            assert_eq!(parse_command(command), expected, "{command}");
        }
    }

    #[test]
    fn test_whitespace_is_ignored() {
        assert_eq!(
            parse_command("  storage . getItem( 'k' ) "),
            vec![
                CommandStep::property("storage"),
                CommandStep::call("getItem", vec![json!("k")]),
            ]
        );
    }

    #[test]
    fn test_negative_and_fractional_numbers() {
        assert_eq!(
            parse_command("scale(-2, 1.5)"),
            vec![CommandStep::call("scale", vec![json!(-2), json!(1.5)])]
        );
    }

    #[test]
    fn test_leading_zeros() {
        assert_eq!(
            parse_command("f(007)"),
            vec![CommandStep::call("f", vec![json!(7)])]
        );
    }

    #[test]
    fn test_invalid_json_argument_is_dropped() {
        assert_eq!(
            parse_command("f([1,,2], 'ok')"),
            vec![CommandStep::call("f", vec![json!("ok")])]
        );
    }

    #[test]
    fn test_double_quoted_string() {
        assert_eq!(
            parse_command(r#"f("a b")"#),
            vec![CommandStep::call("f", vec![json!("a b")])]
        );
    }

    #[test]
    fn test_identifiers_are_ascii_only() {
        assert_eq!(
            parse_command("café.x"),
            vec![CommandStep::property("caf"), CommandStep::property("x")]
        );
        assert_eq!(
            parse_command("a[٣]"),
            vec![CommandStep::property("a")]
        );
    }

    #[test]
    fn test_unparseable_yields_nothing() {
        assert!(parse_command("...").is_empty());
        assert!(parse_command("").is_empty());
    }
}
