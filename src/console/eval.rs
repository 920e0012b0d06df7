//! Step evaluation against a host-provided object graph.
//!
//! The host exposes its runtime through [`Inspectable`]. Evaluation walks
//! the parsed steps from the root:
//!
//! | Step | On an object | On a plain value |
//! |------|--------------|------------------|
//! | Property | [`Inspectable::member`] | object key / array position |
//! | Index | member, then position `n` | key, then position `n` |
//! | Call | [`Inspectable::call`] | `not a function` |
//!
//! The final value is snapshotted into JSON and truncated to the requested
//! depth. Methods appear as `"name()"` in snapshots.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::protocol::ConsoleResult;

use super::parser::{CommandStep, StepKind};

// ============================================================================
// Constants
// ============================================================================

/// Expansion depth used when a request carries no `parseDepth`.
pub const DEFAULT_PARSE_DEPTH: u32 = 2;

/// Placeholder for a truncated object.
const OBJECT_PLACEHOLDER: &str = "[Object]";

/// Placeholder for a truncated array.
const ARRAY_PLACEHOLDER: &str = "[Array]";

// ============================================================================
// Types
// ============================================================================

/// Value reached while walking an expression.
#[derive(Clone)]
pub enum Member {
    /// Plain data.
    Value(Value),
    /// Nested object with its own members.
    Object(Arc<dyn Inspectable>),
    /// Callable member, invoked through its owner.
    Method,
}

impl std::fmt::Debug for Member {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Self::Object(_) => f.write_str("Object(..)"),
            Self::Method => f.write_str("Method"),
        }
    }
}

impl From<Value> for Member {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

/// Object graph a console expression is evaluated against.
///
/// Evaluation only sees what an implementation exposes here.
#[async_trait]
pub trait Inspectable: Send + Sync {
    /// Reads a member; `None` means undefined.
    fn member(&self, name: &str) -> Option<Member>;

    /// Member names in snapshot order.
    fn keys(&self) -> Vec<String>;

    /// Invokes a method member.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::NotCallable`] if `name` is not a method,
    /// or [`CommandError::Thrown`] if the method fails.
    async fn call(&self, name: &str, args: Vec<Value>) -> Result<Member, CommandError>;
}

/// Evaluation failure, reported in the response `error` field.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// A step read through an undefined value.
    #[error("Cannot read properties of undefined (reading '{name}')")]
    Undefined {
        /// Member being read.
        name: String,
    },

    /// A call step named something that is not a method.
    #[error("{name} is not a function")]
    NotCallable {
        /// Member being called.
        name: String,
    },

    /// A method failed.
    #[error("{message}")]
    Thrown {
        /// Failure message.
        message: String,
    },
}

impl CommandError {
    /// Creates a thrown error.
    #[inline]
    pub fn thrown(message: impl Into<String>) -> Self {
        Self::Thrown {
            message: message.into(),
        }
    }

    /// Creates a not-callable error.
    #[inline]
    pub fn not_callable(name: impl Into<String>) -> Self {
        Self::NotCallable { name: name.into() }
    }
}

// ============================================================================
// Evaluation
// ============================================================================

/// Evaluates `steps` from `root` into a console response payload.
///
/// An empty step list snapshots the root itself.
pub async fn evaluate(
    steps: &[CommandStep],
    root: Arc<dyn Inspectable>,
    parse_depth: Option<u32>,
) -> ConsoleResult {
    let depth = parse_depth.unwrap_or(DEFAULT_PARSE_DEPTH);
    match walk(steps, Member::Object(root)).await {
        Ok(Some(member)) => {
            let name = steps.last().map_or("", |step| step.name.as_str());
            ConsoleResult::ok(snapshot(name, &member, depth))
        }
        Ok(None) => ConsoleResult::default(),
        Err(e) => ConsoleResult::err(e.to_string()),
    }
}

async fn walk(steps: &[CommandStep], root: Member) -> Result<Option<Member>, CommandError> {
    let mut current = Some(root);

    for step in steps {
        let Some(target) = current.take() else {
            return Err(CommandError::Undefined {
                name: step.name.clone(),
            });
        };

        current = match step.kind {
            StepKind::Property => read(&target, &step.name),
            StepKind::Index => {
                let position = step.args.first().and_then(Value::as_u64).unwrap_or(0);
                match read(&target, &step.name) {
                    Some(container) => read(&container, &position.to_string()),
                    None => {
                        return Err(CommandError::Undefined {
                            name: position.to_string(),
                        });
                    }
                }
            }
            StepKind::Call => match &target {
                Member::Object(obj) => Some(obj.call(&step.name, step.args.clone()).await?),
                _ => return Err(CommandError::not_callable(&step.name)),
            },
        };
    }

    Ok(current)
}

/// Reads one member of `target`.
fn read(target: &Member, name: &str) -> Option<Member> {
    match target {
        Member::Object(obj) => obj.member(name),
        Member::Value(Value::Object(map)) => map.get(name).cloned().map(Member::Value),
        Member::Value(Value::Array(items)) => name
            .parse::<usize>()
            .ok()
            .and_then(|i| items.get(i))
            .cloned()
            .map(Member::Value),
        Member::Value(_) | Member::Method => None,
    }
}

// ============================================================================
// Snapshot
// ============================================================================

/// Converts a member into JSON, expanding `depth` levels below the top.
///
/// `name` is the member's own name; a method renders as `"name()"`.
#[must_use]
pub fn snapshot(name: &str, member: &Member, depth: u32) -> Value {
    match member {
        Member::Value(value) => truncate(value, depth),
        Member::Method => Value::String(format!("{name}()")),
        Member::Object(obj) => {
            let mut map = Map::new();
            for key in obj.keys() {
                let Some(child) = obj.member(&key) else {
                    continue;
                };
                let value = match child {
                    Member::Object(_) if depth == 0 => Value::String(OBJECT_PLACEHOLDER.into()),
                    other => snapshot(&key, &other, depth.saturating_sub(1)),
                };
                map.insert(key, value);
            }
            Value::Object(map)
        }
    }
}

/// Replaces containers nested deeper than `depth` with placeholders.
fn truncate(value: &Value, depth: u32) -> Value {
    let child = |v: &Value| match v {
        Value::Object(_) if depth == 0 => Value::String(OBJECT_PLACEHOLDER.into()),
        Value::Array(_) if depth == 0 => Value::String(ARRAY_PLACEHOLDER.into()),
        other => truncate(other, depth.saturating_sub(1)),
    };

    match value {
        Value::Object(map) => Value::Object(map.iter().map(|(k, v)| (k.clone(), child(v))).collect()),
        Value::Array(items) => Value::Array(items.iter().map(child).collect()),
        scalar => scalar.clone(),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::parse_command;
    use parking_lot::Mutex;
    use serde_json::json;

    /// Window-like root with a nested document and a storage object.
    struct Root {
        document: Arc<Document>,
        storage: Arc<Storage>,
    }

    struct Document;

    struct Storage {
        items: Mutex<Map<String, Value>>,
    }

    #[async_trait]
    impl Inspectable for Root {
        fn member(&self, name: &str) -> Option<Member> {
            match name {
                "document" => Some(Member::Object(self.document.clone())),
                "localStorage" => Some(Member::Object(self.storage.clone())),
                "navigator" => Some(json!({"language": "en-US", "languages": ["en-US", "fr"]}).into()),
                "innerWidth" => Some(json!(240).into()),
                "alert" => Some(Member::Method),
                _ => None,
            }
        }

        fn keys(&self) -> Vec<String> {
            ["document", "innerWidth", "alert"].map(String::from).to_vec()
        }

        async fn call(&self, name: &str, _args: Vec<Value>) -> Result<Member, CommandError> {
            match name {
                "alert" => Err(CommandError::thrown("alert is blocked")),
                _ => Err(CommandError::not_callable(name)),
            }
        }
    }

    #[async_trait]
    impl Inspectable for Document {
        fn member(&self, name: &str) -> Option<Member> {
            match name {
                "title" => Some(json!("Home").into()),
                "body" => Some(json!({"children": [{"tag": "div"}, {"tag": "span"}]}).into()),
                _ => None,
            }
        }

        fn keys(&self) -> Vec<String> {
            vec!["title".into(), "body".into()]
        }

        async fn call(&self, name: &str, _args: Vec<Value>) -> Result<Member, CommandError> {
            Err(CommandError::not_callable(name))
        }
    }

    #[async_trait]
    impl Inspectable for Storage {
        fn member(&self, name: &str) -> Option<Member> {
            match name {
                "getItem" | "setItem" => Some(Member::Method),
                "length" => Some(json!(self.items.lock().len()).into()),
                _ => None,
            }
        }

        fn keys(&self) -> Vec<String> {
            vec!["length".into(), "getItem".into(), "setItem".into()]
        }

        async fn call(&self, name: &str, args: Vec<Value>) -> Result<Member, CommandError> {
            let key = args.first().and_then(Value::as_str).unwrap_or_default().to_string();
            match name {
                "getItem" => Ok(self.items.lock().get(&key).cloned().unwrap_or(Value::Null).into()),
                "setItem" => {
                    let value = args.get(1).cloned().unwrap_or(Value::Null);
                    self.items.lock().insert(key, value);
                    Ok(Value::Null.into())
                }
                _ => Err(CommandError::not_callable(name)),
            }
        }
    }

    fn root() -> Arc<dyn Inspectable> {
        Arc::new(Root {
            document: Arc::new(Document),
            storage: Arc::new(Storage {
                items: Mutex::new(Map::new()),
            }),
        })
    }

    async fn run(command: &str, depth: Option<u32>) -> ConsoleResult {
        evaluate(&parse_command(command), root(), depth).await
    }

    #[tokio::test]
    async fn test_property_chain() {
        assert_eq!(run("document.title", None).await, ConsoleResult::ok(json!("Home")));
    }

    #[tokio::test]
    async fn test_index_into_plain_value() {
        let result = run("navigator.languages[1]", None).await;
        assert_eq!(result, ConsoleResult::ok(json!("fr")));
    }

    #[tokio::test]
    async fn test_call_with_arguments() {
        let set = run("localStorage.setItem('theme', 'dark')", None).await;
        assert_eq!(set, ConsoleResult::ok(Value::Null));
    }

    #[tokio::test]
    async fn test_calls_share_state() {
        let root = root();
        let set = parse_command("localStorage.setItem('theme', 'dark')");
        let get = parse_command("localStorage.getItem('theme')");
        evaluate(&set, root.clone(), None).await;
        assert_eq!(evaluate(&get, root, None).await, ConsoleResult::ok(json!("dark")));
    }

    #[tokio::test]
    async fn test_undefined_member_yields_empty_result() {
        let result = run("document.missing", None).await;
        assert_eq!(result, ConsoleResult::default());
    }

    #[tokio::test]
    async fn test_read_through_undefined_is_error() {
        let result = run("missing.title", None).await;
        assert_eq!(
            result.error.as_deref(),
            Some("Cannot read properties of undefined (reading 'title')")
        );
    }

    #[tokio::test]
    async fn test_not_callable() {
        let result = run("document.title()", None).await;
        assert_eq!(result.error.as_deref(), Some("title is not a function"));

        let result = run("innerWidth.toFixed(2)", None).await;
        assert_eq!(result.error.as_deref(), Some("toFixed is not a function"));
    }

    #[tokio::test]
    async fn test_method_reference_renders_name() {
        let result = run("localStorage.getItem", None).await;
        assert_eq!(result, ConsoleResult::ok(json!("getItem()")));
    }

    #[tokio::test]
    async fn test_thrown_error() {
        let result = run("alert('hi')", None).await;
        assert_eq!(result, ConsoleResult::err("alert is blocked"));
    }

    #[tokio::test]
    async fn test_root_snapshot_renders_methods() {
        let result = run("", Some(0)).await;
        assert_eq!(
            result,
            ConsoleResult::ok(json!({
                "document": "[Object]",
                "innerWidth": 240,
                "alert": "alert()"
            }))
        );
    }

    #[test]
    fn test_methods_render_name_at_any_depth() {
        let storage: Arc<dyn Inspectable> = Arc::new(Storage {
            items: Mutex::new(Map::new()),
        });

        assert_eq!(snapshot("getItem", &Member::Method, 0), json!("getItem()"));
        assert_eq!(snapshot("getItem", &Member::Method, 4), json!("getItem()"));
        assert_eq!(
            snapshot("localStorage", &Member::Object(storage), 3),
            json!({"length": 0, "getItem": "getItem()", "setItem": "setItem()"})
        );
    }

    #[tokio::test]
    async fn test_parse_depth_truncates() {
        let shallow = run("document.body", Some(0)).await;
        assert_eq!(shallow, ConsoleResult::ok(json!({"children": "[Array]"})));

        let one = run("document.body", Some(1)).await;
        assert_eq!(
            one,
            ConsoleResult::ok(json!({"children": ["[Object]", "[Object]"]}))
        );

        let deep = run("document.body", Some(5)).await;
        assert_eq!(
            deep,
            ConsoleResult::ok(json!({"children": [{"tag": "div"}, {"tag": "span"}]}))
        );
    }

    #[test]
    fn test_evaluate_blocking() {
        let result = tokio_test::block_on(run("document", Some(1)));
        assert_eq!(
            result,
            ConsoleResult::ok(json!({
                "title": "Home",
                "body": {"children": "[Array]"}
            }))
        );
    }
}
