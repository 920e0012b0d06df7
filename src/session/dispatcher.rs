//! Inbound frame dispatch.
//!
//! Each frame goes through three steps:
//!
//! 1. Validate. A rejected frame is answered with an [`ErrorFrame`].
//! 2. Route by exhaustive match on [`Message`] to one [`Capabilities`] method.
//! 3. Reply with the same `requestId` and the paired `*-res` tag.
//!
//! | Outcome | Reply |
//! |---------|-------|
//! | Handler ok | `*-res` envelope |
//! | Handler failed or panicked | `error` envelope, same `requestId` |
//! | Console evaluation failed | `execute-console-command-res` with `error` |
//! | Inbound response or push | none (logged) |
//!
//! [`ErrorFrame`]: crate::protocol::ErrorFrame

// ============================================================================
// Imports
// ============================================================================

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::FutureExt;
use tracing::{debug, error, warn};

use crate::capability::{Capabilities, HandlerError};
use crate::console::{evaluate, parse_command};
use crate::error::Error;
use crate::protocol::{
    ConsoleCommand, ConsoleResult, DeviceInfo, ElementData, ElementIndex, ElementStyles, Envelope,
    ErrorReport, Message, StorageContent, StorageQuery,
};
use crate::transport::FrameHandler;

// ============================================================================
// Constants
// ============================================================================

/// Console error when the host exposes no root object.
pub const CONSOLE_UNSUPPORTED: &str = "Console commands are not supported";

// ============================================================================
// Dispatcher
// ============================================================================

/// Routes validated requests to a [`Capabilities`] implementation.
pub struct Dispatcher {
    identity: DeviceInfo,
    capabilities: Arc<dyn Capabilities>,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("identity", &self.identity)
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    /// Creates a dispatcher.
    pub fn new(identity: DeviceInfo, capabilities: Arc<dyn Capabilities>) -> Self {
        Self {
            identity,
            capabilities,
        }
    }

    /// Validates and handles one raw frame, returning the reply frame.
    pub async fn handle_text(&self, text: &str) -> Option<String> {
        let envelope = match Envelope::decode(text) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!(path = e.path(), message = e.message(), "Rejected inbound frame");
                return encode(e.to_frame().encode());
            }
        };

        let reply = self.dispatch(envelope).await?;
        encode(reply.encode())
    }

    /// Handles one validated envelope.
    ///
    /// Returns `None` for inbound responses and pushes. A handler that
    /// panics is answered like one that failed.
    pub async fn dispatch(&self, envelope: Envelope) -> Option<Envelope> {
        let Envelope {
            request_id,
            message,
        } = envelope;
        let message_type = message.message_type();

        debug!(request_id = %request_id, message_type = %message_type, "Dispatching request");

        let outcome = match AssertUnwindSafe(self.route(message)).catch_unwind().await {
            Ok(Some(outcome)) => outcome,
            Ok(None) => {
                debug!(request_id = %request_id, message_type = %message_type, "Ignoring inbound non-request");
                return None;
            }
            Err(panic) => Err(HandlerError::failed(format!(
                "Handler panicked: {}",
                panic_message(panic.as_ref())
            ))),
        };

        match outcome {
            Ok(response) => Some(Envelope::new(request_id, response)),
            Err(e) => {
                let failure = Error::handler_failure(message_type, e.to_string());
                warn!(request_id = %request_id, error = %failure, "Handler failed");
                Some(Envelope::new(
                    request_id,
                    Message::Error(ErrorReport {
                        message: e.to_string(),
                    }),
                ))
            }
        }
    }

    /// Runs the handler for a request; `None` for anything else.
    async fn route(&self, message: Message) -> Option<Result<Message, HandlerError>> {
        let caps = &self.capabilities;
        let outcome = match message {
            Message::GetDeviceInfo => caps
                .get_device_info(&self.identity)
                .await
                .map(Message::GetDeviceInfoRes),

            Message::GetElements => caps.get_elements().await.map(Message::GetElementsRes),

            Message::GetElementStyles(ElementIndex { index }) => caps
                .get_element_styles(index)
                .await
                .map(|styles| Message::GetElementStylesRes(ElementStyles { index, styles })),

            Message::SetElementStyles(ElementStyles { index, styles }) => caps
                .set_element_styles(index, styles)
                .await
                .map(|()| Message::SetElementStylesRes),

            Message::GetElementData(ElementIndex { index }) => caps
                .get_element_data(index)
                .await
                .map(|data| Message::GetElementDataRes(ElementData { index, data })),

            Message::SetElementData(ElementData { index, data }) => caps
                .set_element_data(index, data)
                .await
                .map(|()| Message::SetElementDataRes),

            Message::GetStorage(StorageQuery { storage_type }) => caps
                .get_storage(storage_type)
                .await
                .map(|data| Message::GetStorageRes(StorageContent { storage_type, data })),

            Message::SetStorage(StorageContent { storage_type, data }) => caps
                .set_storage(storage_type, data)
                .await
                .map(|()| Message::SetStorageRes),

            Message::ClearLogs => caps.clear_logs().await.map(|()| Message::ClearLogsRes),

            Message::ExecuteConsoleCommand(command) => Ok(Message::ExecuteConsoleCommandRes(
                self.execute_console(command).await,
            )),

            Message::GetDeviceInfoRes(_)
            | Message::GetElementsRes(_)
            | Message::GetElementStylesRes(_)
            | Message::SetElementStylesRes
            | Message::GetElementDataRes(_)
            | Message::SetElementDataRes
            | Message::GetStorageRes(_)
            | Message::SetStorageRes
            | Message::NewLog(_)
            | Message::ClearLogsRes
            | Message::NetworkRequestUpdate(_)
            | Message::ExecuteConsoleCommandRes(_)
            | Message::Error(_) => return None,
        };
        Some(outcome)
    }

    async fn execute_console(&self, command: ConsoleCommand) -> ConsoleResult {
        let Some(root) = self.capabilities.console_root() else {
            return ConsoleResult::err(CONSOLE_UNSUPPORTED);
        };

        let steps = parse_command(&command.command);
        debug!(command = %command.command, steps = steps.len(), "Evaluating console command");
        evaluate(&steps, root, command.parse_depth).await
    }
}

#[async_trait]
impl FrameHandler for Dispatcher {
    async fn handle_frame(&self, text: &str) -> Option<String> {
        self.handle_text(text).await
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown cause")
}

fn encode(result: crate::Result<String>) -> Option<String> {
    match result {
        Ok(text) => Some(text),
        Err(e) => {
            error!(error = %e, "Failed to encode reply");
            None
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::NoCapabilities;
    use crate::console::{CommandError, Inspectable, Member};
    use crate::protocol::{ConnectionType, ErrorFrame, MessageType, StorageType, StringMap};
    use parking_lot::Mutex;
    use rustc_hash::FxHashMap;
    use serde_json::{Value, json};

    /// In-memory device with storage and a tiny console root.
    #[derive(Default)]
    struct FakeDevice {
        storage: Mutex<FxHashMap<StorageType, StringMap>>,
    }

    struct Globals;

    #[async_trait]
    impl Inspectable for Globals {
        fn member(&self, name: &str) -> Option<Member> {
            (name == "version").then(|| json!("2.5").into())
        }

        fn keys(&self) -> Vec<String> {
            vec!["version".into()]
        }

        async fn call(&self, name: &str, _args: Vec<Value>) -> Result<Member, CommandError> {
            Err(CommandError::not_callable(name))
        }
    }

    #[async_trait]
    impl Capabilities for FakeDevice {
        async fn get_elements(&self) -> Result<String, HandlerError> {
            Ok("<html><body></body></html>".into())
        }

        async fn get_element_styles(&self, index: u64) -> Result<StringMap, HandlerError> {
            if index > 3 {
                return Err(HandlerError::failed(format!("No element at index {index}")));
            }
            Ok(StringMap::from([("color".into(), "red".into())]))
        }

        async fn get_storage(&self, storage_type: StorageType) -> Result<StringMap, HandlerError> {
            Ok(self.storage.lock().get(&storage_type).cloned().unwrap_or_default())
        }

        async fn set_storage(
            &self,
            storage_type: StorageType,
            data: StringMap,
        ) -> Result<(), HandlerError> {
            self.storage.lock().entry(storage_type).or_default().extend(data);
            Ok(())
        }

        fn console_root(&self) -> Option<Arc<dyn Inspectable>> {
            Some(Arc::new(Globals))
        }
    }

    fn identity() -> DeviceInfo {
        DeviceInfo {
            id: "kaios-device".into(),
            name: "KaiOS Device".into(),
            connection_type: ConnectionType::Usb,
        }
    }

    fn dispatcher(caps: impl Capabilities + 'static) -> Dispatcher {
        Dispatcher::new(identity(), Arc::new(caps))
    }

    async fn reply(dispatcher: &Dispatcher, text: &str) -> Envelope {
        let frame = dispatcher.handle_text(text).await.expect("reply");
        Envelope::decode(&frame).expect("valid reply")
    }

    #[tokio::test]
    async fn test_device_info_uses_identity() {
        let dispatcher = dispatcher(NoCapabilities);
        let response = reply(
            &dispatcher,
            r#"{"requestId":"r1","type":"get-device-info","data":null}"#,
        )
        .await;

        assert_eq!(response.request_id.as_str(), "r1");
        assert_eq!(response.message, Message::GetDeviceInfoRes(identity()));
    }

    #[tokio::test]
    async fn test_storage_roundtrip() {
        let dispatcher = dispatcher(FakeDevice::default());

        let ack = reply(
            &dispatcher,
            r#"{"requestId":"s1","type":"set-storage","data":{"storageType":"session","data":{"theme":"dark"}}}"#,
        )
        .await;
        assert_eq!(ack.message, Message::SetStorageRes);

        let response = reply(
            &dispatcher,
            r#"{"requestId":"s2","type":"get-storage","data":{"storageType":"session"}}"#,
        )
        .await;
        assert_eq!(response.request_id.as_str(), "s2");
        assert_eq!(
            response.message,
            Message::GetStorageRes(StorageContent {
                storage_type: StorageType::Session,
                data: StringMap::from([("theme".into(), "dark".into())]),
            })
        );
    }

    #[tokio::test]
    async fn test_invalid_frame_gets_error_frame() {
        let dispatcher = dispatcher(NoCapabilities);
        let frame = dispatcher
            .handle_text(r#"{"requestId":"r","type":"get-element-styles","data":{}}"#)
            .await
            .expect("reply");

        let error = ErrorFrame::parse(&frame).expect("error frame");
        assert_eq!(error.data.get("data.index").map(String::as_str), Some("Required"));
    }

    #[tokio::test]
    async fn test_malformed_frame_gets_error_frame() {
        let dispatcher = dispatcher(NoCapabilities);
        let frame = dispatcher.handle_text("{nope").await.expect("reply");
        assert_eq!(
            frame,
            r#"{"error":"ValidationError","data":{"":"Must be a valid JSON string"}}"#
        );
    }

    #[tokio::test]
    async fn test_unsupported_handler_yields_error_envelope() {
        let dispatcher = dispatcher(NoCapabilities);
        let response = reply(
            &dispatcher,
            r#"{"requestId":"e1","type":"get-elements","data":null}"#,
        )
        .await;

        assert_eq!(response.request_id.as_str(), "e1");
        assert_eq!(
            response.message,
            Message::Error(ErrorReport {
                message: "get-elements is not supported".into()
            })
        );
    }

    #[tokio::test]
    async fn test_handler_failure_keeps_request_id() {
        let dispatcher = dispatcher(FakeDevice::default());
        let response = reply(
            &dispatcher,
            r#"{"requestId":"x9","type":"get-element-styles","data":{"index":10}}"#,
        )
        .await;

        assert_eq!(response.request_id.as_str(), "x9");
        assert_eq!(response.message_type(), MessageType::Error);
    }

    struct Panicky;

    #[async_trait]
    impl Capabilities for Panicky {
        async fn get_elements(&self) -> Result<String, HandlerError> {
            let nodes: Vec<String> = Vec::new();
            Ok(nodes[3].clone())
        }
    }

    #[tokio::test]
    async fn test_panicking_handler_yields_error_envelope() {
        let dispatcher = dispatcher(Panicky);
        let response = reply(
            &dispatcher,
            r#"{"requestId":"p1","type":"get-elements","data":null}"#,
        )
        .await;

        assert_eq!(response.request_id.as_str(), "p1");
        match response.message {
            Message::Error(ErrorReport { message }) => {
                assert!(message.starts_with("Handler panicked: "), "{message}");
                assert!(message.contains("index out of bounds"), "{message}");
            }
            other => panic!("expected error envelope, got {other:?}"),
        }

        let next = reply(
            &dispatcher,
            r#"{"requestId":"p2","type":"get-device-info","data":null}"#,
        )
        .await;
        assert_eq!(next.message, Message::GetDeviceInfoRes(identity()));
    }

    #[tokio::test]
    async fn test_console_command() {
        let dispatcher = dispatcher(FakeDevice::default());
        let response = reply(
            &dispatcher,
            r#"{"requestId":"c1","type":"execute-console-command","data":{"command":"version"}}"#,
        )
        .await;

        assert_eq!(
            response.message,
            Message::ExecuteConsoleCommandRes(ConsoleResult::ok(json!("2.5")))
        );
    }

    #[tokio::test]
    async fn test_console_unsupported() {
        let dispatcher = dispatcher(NoCapabilities);
        let response = reply(
            &dispatcher,
            r#"{"requestId":"c2","type":"execute-console-command","data":{"command":"x"}}"#,
        )
        .await;

        assert_eq!(
            response.message,
            Message::ExecuteConsoleCommandRes(ConsoleResult::err(CONSOLE_UNSUPPORTED))
        );
    }

    #[tokio::test]
    async fn test_inbound_push_is_ignored() {
        let dispatcher = dispatcher(NoCapabilities);
        let reply = dispatcher
            .handle_text(r#"{"requestId":"","type":"clear-logs-res","data":null}"#)
            .await;
        assert!(reply.is_none());
    }

    #[tokio::test]
    async fn test_every_request_gets_paired_response_type() {
        let dispatcher = dispatcher(FakeDevice::default());
        let requests = [
            r#"{"requestId":"1","type":"get-device-info","data":null}"#,
            r#"{"requestId":"2","type":"get-elements","data":null}"#,
            r#"{"requestId":"3","type":"get-element-styles","data":{"index":0}}"#,
            r#"{"requestId":"4","type":"get-storage","data":{"storageType":"local"}}"#,
            r#"{"requestId":"5","type":"clear-logs","data":null}"#,
        ];

        for text in requests {
            let request = Envelope::decode(text).expect("valid request");
            let response = dispatcher.dispatch(request.clone()).await.expect("reply");
            assert_eq!(response.request_id, request.request_id);
            assert_eq!(
                Some(response.message_type()),
                request.message_type().response_type()
            );
        }
    }
}
