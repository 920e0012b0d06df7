//! Schema registry: one payload validator per message type.
//!
//! [`validate_payload`] is an exhaustive `match` over [`MessageType`], so
//! adding a tag without a rule is a compile error. Each rule walks the raw
//! `data` value, stops at the first violation and reports its dotted path
//! (`data.styles.color`) with a message. On success it yields the typed
//! [`Message`] variant.

// ============================================================================
// Imports
// ============================================================================

use serde_json::{Map, Value};

use super::message::Message;
use super::message_type::MessageType;
use super::payload::{
    ConnectionType, ConsoleCommand, ConsoleResult, DeviceInfo, ElementData, ElementIndex,
    ElementStyles, ErrorReport, Header, HttpMethod, LifecycleStatus, LogLevel, LogRecord,
    NetworkRequest, StorageContent, StorageQuery, StorageType, StringMap,
};
use super::validation::ValidationError;
use crate::identifiers::NetworkRequestId;

// ============================================================================
// Types
// ============================================================================

/// Outcome of one validation rule.
type Check<T> = Result<T, ValidationError>;

/// Largest integer exactly representable as an IEEE double.
const MAX_SAFE_INTEGER: u64 = 9_007_199_254_740_991;

/// Upper bound accepted for HTTP status codes.
const MAX_STATUS_CODE: u64 = 999;

// ============================================================================
// Registry
// ============================================================================

/// Validates `data` against the schema selected by `message_type`.
///
/// The schema is chosen strictly by the tag, never inferred from the
/// payload shape. `data` is `None` when the envelope has no `data` key.
///
/// # Errors
///
/// Returns [`ValidationError::SchemaViolation`] for the first offending
/// field under `data`.
pub fn validate_payload(message_type: MessageType, data: Option<&Value>) -> Check<Message> {
    let path = "data";

    let message = match message_type {
        MessageType::GetDeviceInfo => null(data, path).map(|()| Message::GetDeviceInfo)?,
        MessageType::GetDeviceInfoRes => Message::GetDeviceInfoRes(device_info(data, path)?),
        MessageType::GetElements => null(data, path).map(|()| Message::GetElements)?,
        MessageType::GetElementsRes => Message::GetElementsRes(string(data, path)?),
        MessageType::GetElementStyles => Message::GetElementStyles(element_index(data, path)?),
        MessageType::GetElementStylesRes => {
            Message::GetElementStylesRes(element_styles(data, path)?)
        }
        MessageType::SetElementStyles => Message::SetElementStyles(element_styles(data, path)?),
        MessageType::SetElementStylesRes => {
            null(data, path).map(|()| Message::SetElementStylesRes)?
        }
        MessageType::GetElementData => Message::GetElementData(element_index(data, path)?),
        MessageType::GetElementDataRes => Message::GetElementDataRes(element_data(data, path)?),
        MessageType::SetElementData => Message::SetElementData(element_data(data, path)?),
        MessageType::SetElementDataRes => null(data, path).map(|()| Message::SetElementDataRes)?,
        MessageType::GetStorage => Message::GetStorage(storage_query(data, path)?),
        MessageType::GetStorageRes => Message::GetStorageRes(storage_content(data, path)?),
        MessageType::SetStorage => Message::SetStorage(storage_content(data, path)?),
        MessageType::SetStorageRes => null(data, path).map(|()| Message::SetStorageRes)?,
        MessageType::NewLog => Message::NewLog(log_record(data, path)?),
        MessageType::ClearLogs => null(data, path).map(|()| Message::ClearLogs)?,
        MessageType::ClearLogsRes => null(data, path).map(|()| Message::ClearLogsRes)?,
        MessageType::NetworkRequestUpdate => {
            Message::NetworkRequestUpdate(network_request(data, path)?)
        }
        MessageType::ExecuteConsoleCommand => {
            Message::ExecuteConsoleCommand(console_command(data, path)?)
        }
        MessageType::ExecuteConsoleCommandRes => {
            Message::ExecuteConsoleCommandRes(console_result(data, path)?)
        }
        MessageType::Error => Message::Error(error_report(data, path)?),
    };

    Ok(message)
}

// ============================================================================
// Payload Rules
// ============================================================================

fn device_info(value: Option<&Value>, path: &str) -> Check<DeviceInfo> {
    let obj = object(value, path)?;
    Ok(DeviceInfo {
        id: non_empty_string(obj.get("id"), &join(path, "id"))?,
        name: non_empty_string(obj.get("name"), &join(path, "name"))?,
        connection_type: one_of(
            obj.get("connectionType"),
            &join(path, "connectionType"),
            &[("wifi", ConnectionType::Wifi), ("usb", ConnectionType::Usb)],
        )?,
    })
}

fn element_index(value: Option<&Value>, path: &str) -> Check<ElementIndex> {
    let obj = object(value, path)?;
    Ok(ElementIndex {
        index: index(obj.get("index"), &join(path, "index"))?,
    })
}

fn element_styles(value: Option<&Value>, path: &str) -> Check<ElementStyles> {
    let obj = object(value, path)?;
    Ok(ElementStyles {
        index: index(obj.get("index"), &join(path, "index"))?,
        styles: string_map(obj.get("styles"), &join(path, "styles"))?,
    })
}

fn element_data(value: Option<&Value>, path: &str) -> Check<ElementData> {
    let obj = object(value, path)?;
    Ok(ElementData {
        index: index(obj.get("index"), &join(path, "index"))?,
        data: string_map(obj.get("data"), &join(path, "data"))?,
    })
}

fn storage_query(value: Option<&Value>, path: &str) -> Check<StorageQuery> {
    let obj = object(value, path)?;
    Ok(StorageQuery {
        storage_type: storage_type(obj.get("storageType"), &join(path, "storageType"))?,
    })
}

fn storage_content(value: Option<&Value>, path: &str) -> Check<StorageContent> {
    let obj = object(value, path)?;
    Ok(StorageContent {
        storage_type: storage_type(obj.get("storageType"), &join(path, "storageType"))?,
        data: string_map(obj.get("data"), &join(path, "data"))?,
    })
}

fn storage_type(value: Option<&Value>, path: &str) -> Check<StorageType> {
    one_of(
        value,
        path,
        &[("local", StorageType::Local), ("session", StorageType::Session)],
    )
}

fn log_record(value: Option<&Value>, path: &str) -> Check<LogRecord> {
    let obj = object(value, path)?;
    let levels = LogLevel::ALL.map(|l| (l.as_str(), l));
    Ok(LogRecord {
        source: string(obj.get("source"), &join(path, "source"))?,
        level: one_of(obj.get("level"), &join(path, "level"), &levels)?,
        data: string_array(obj.get("data"), &join(path, "data"))?,
        timestamp: string(obj.get("timestamp"), &join(path, "timestamp"))?,
    })
}

fn network_request(value: Option<&Value>, path: &str) -> Check<NetworkRequest> {
    let obj = object(value, path)?;
    let methods = HttpMethod::ALL.map(|m| (m.as_str(), m));
    let statuses = LifecycleStatus::ALL.map(|s| (s.as_str(), s));

    Ok(NetworkRequest {
        request_id: NetworkRequestId::new(non_empty_string(
            obj.get("requestId"),
            &join(path, "requestId"),
        )?),
        url: string(obj.get("url"), &join(path, "url"))?,
        method: one_of(obj.get("method"), &join(path, "method"), &methods)?,
        lifecycle_status: one_of(
            obj.get("lifecycleStatus"),
            &join(path, "lifecycleStatus"),
            &statuses,
        )?,
        request_headers: optional(obj, path, "requestHeaders", headers)?,
        response_headers: optional(obj, path, "responseHeaders", headers)?,
        request_body: optional(obj, path, "requestBody", string)?,
        response_body: optional(obj, path, "responseBody", string)?,
        response_type: optional(obj, path, "responseType", string)?,
        status_code: optional(obj, path, "statusCode", status_code)?,
        start_time: string(obj.get("startTime"), &join(path, "startTime"))?,
        end_time: optional(obj, path, "endTime", string)?,
    })
}

fn headers(value: Option<&Value>, path: &str) -> Check<Vec<Header>> {
    array(value, path)?
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let item_path = join(path, &i.to_string());
            let obj = object(Some(item), &item_path)?;
            Ok(Header {
                name: string(obj.get("name"), &join(&item_path, "name"))?,
                value: string(obj.get("value"), &join(&item_path, "value"))?,
            })
        })
        .collect()
}

fn status_code(value: Option<&Value>, path: &str) -> Check<u16> {
    let code = index(value, path)?;
    if code > MAX_STATUS_CODE {
        return Err(ValidationError::schema(
            path,
            format!("Number must be less than or equal to {MAX_STATUS_CODE}"),
        ));
    }
    // Bounded above, cannot truncate.
    Ok(code as u16)
}

fn console_command(value: Option<&Value>, path: &str) -> Check<ConsoleCommand> {
    let obj = object(value, path)?;
    Ok(ConsoleCommand {
        command: non_empty_string(obj.get("command"), &join(path, "command"))?,
        parse_depth: optional(obj, path, "parseDepth", |v, p| {
            let depth = index(v, p)?;
            u32::try_from(depth).map_err(|_| {
                ValidationError::schema(
                    p,
                    format!("Number must be less than or equal to {}", u32::MAX),
                )
            })
        })?,
    })
}

fn console_result(value: Option<&Value>, path: &str) -> Check<ConsoleResult> {
    let obj = object(value, path)?;
    let result = obj.get("result").cloned();
    let error = optional(obj, path, "error", string)?;

    if result.is_some() && error.is_some() {
        return Err(ValidationError::schema(
            path,
            "Only one of 'result' and 'error' may be set",
        ));
    }

    Ok(ConsoleResult { result, error })
}

fn error_report(value: Option<&Value>, path: &str) -> Check<ErrorReport> {
    let obj = object(value, path)?;
    Ok(ErrorReport {
        message: string(obj.get("message"), &join(path, "message"))?,
    })
}

// ============================================================================
// Primitive Rules
// ============================================================================

/// Joins a dotted path segment.
pub(crate) fn join(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}

/// Returns the JSON type name used in messages.
pub(crate) fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Fails with `Required` if the field is absent.
fn required<'a>(value: Option<&'a Value>, path: &str) -> Check<&'a Value> {
    value.ok_or_else(|| ValidationError::schema(path, "Required"))
}

/// Builds an `Expected X, received Y` violation.
fn mismatch(path: &str, expected: &str, value: &Value) -> ValidationError {
    ValidationError::schema(
        path,
        format!("Expected {expected}, received {}", type_name(value)),
    )
}

/// Applies `rule` to an optional field; absent means `None`.
fn optional<T>(
    obj: &Map<String, Value>,
    path: &str,
    key: &str,
    rule: impl Fn(Option<&Value>, &str) -> Check<T>,
) -> Check<Option<T>> {
    match obj.get(key) {
        None => Ok(None),
        Some(value) => rule(Some(value), &join(path, key)).map(Some),
    }
}

/// Accepts `null`, or an absent field.
fn null(value: Option<&Value>, path: &str) -> Check<()> {
    match value {
        None | Some(Value::Null) => Ok(()),
        Some(other) => Err(mismatch(path, "null", other)),
    }
}

fn object<'a>(value: Option<&'a Value>, path: &str) -> Check<&'a Map<String, Value>> {
    match required(value, path)? {
        Value::Object(map) => Ok(map),
        other => Err(mismatch(path, "object", other)),
    }
}

fn array<'a>(value: Option<&'a Value>, path: &str) -> Check<&'a Vec<Value>> {
    match required(value, path)? {
        Value::Array(items) => Ok(items),
        other => Err(mismatch(path, "array", other)),
    }
}

fn string(value: Option<&Value>, path: &str) -> Check<String> {
    match required(value, path)? {
        Value::String(s) => Ok(s.clone()),
        other => Err(mismatch(path, "string", other)),
    }
}

fn non_empty_string(value: Option<&Value>, path: &str) -> Check<String> {
    let s = string(value, path)?;
    if s.is_empty() {
        return Err(ValidationError::schema(
            path,
            "String must contain at least 1 character(s)",
        ));
    }
    Ok(s)
}

/// Accepts a non-negative integer (`1.0` counts as an integer).
fn index(value: Option<&Value>, path: &str) -> Check<u64> {
    let value = required(value, path)?;
    let Value::Number(number) = value else {
        return Err(mismatch(path, "number", value));
    };

    if let Some(n) = number.as_u64() {
        return safe_integer(n, path);
    }
    if number.as_i64().is_some() {
        return Err(ValidationError::schema(
            path,
            "Number must be greater than or equal to 0",
        ));
    }

    let f = number.as_f64().unwrap_or(f64::NAN);
    if f.fract() != 0.0 || !f.is_finite() {
        return Err(ValidationError::schema(
            path,
            "Expected integer, received float",
        ));
    }
    if f < 0.0 {
        return Err(ValidationError::schema(
            path,
            "Number must be greater than or equal to 0",
        ));
    }
    if f > MAX_SAFE_INTEGER as f64 {
        return Err(too_large(path));
    }
    // Integral and within the safe range.
    Ok(f as u64)
}

fn safe_integer(n: u64, path: &str) -> Check<u64> {
    if n > MAX_SAFE_INTEGER {
        return Err(too_large(path));
    }
    Ok(n)
}

fn too_large(path: &str) -> ValidationError {
    ValidationError::schema(path, "Number must be less than or equal to 9007199254740991")
}

fn string_map(value: Option<&Value>, path: &str) -> Check<StringMap> {
    object(value, path)?
        .iter()
        .map(|(key, v)| Ok((key.clone(), string(Some(v), &join(path, key))?)))
        .collect()
}

fn string_array(value: Option<&Value>, path: &str) -> Check<Vec<String>> {
    array(value, path)?
        .iter()
        .enumerate()
        .map(|(i, v)| string(Some(v), &join(path, &i.to_string())))
        .collect()
}

/// Accepts one of a closed set of string literals.
fn one_of<T: Copy>(value: Option<&Value>, path: &str, options: &[(&str, T)]) -> Check<T> {
    let value = required(value, path)?;

    if let Value::String(s) = value
        && let Some((_, variant)) = options.iter().find(|(name, _)| *name == s.as_str())
    {
        return Ok(*variant);
    }

    let expected = options
        .iter()
        .map(|(name, _)| format!("'{name}'"))
        .collect::<Vec<_>>()
        .join(" | ");
    let received = match value {
        Value::String(s) => format!("'{s}'"),
        other => type_name(other).to_string(),
    };

    Err(ValidationError::schema(
        path,
        format!("Invalid enum value. Expected {expected}, received {received}"),
    ))
}

// ============================================================================
// Tests
// ============================================================================
