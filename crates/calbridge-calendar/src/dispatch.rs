//! JSON method dispatch for runtimes that call the module by name.
//!
//! Applies the same argument defaults as the JavaScript wrapper: `readOnly`
//! defaults to `false` and `options` to `{ "sync": false }`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::details::SaveOptions;
use crate::error::{BridgeError, BridgeResult};
use crate::module::CalendarEventsModule;

/// A method invocation as delivered by the runtime.
#[derive(Debug, Clone, Deserialize)]
pub struct BridgeCall {
    pub method: String,
    #[serde(default)]
    pub args: Vec<Value>,
}

impl BridgeCall {
    pub fn new(method: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            method: method.into(),
            args,
        }
    }
}

/// Settled result handle, ready to hand back to the runtime.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum BridgeReply {
    Resolved { value: Value },
    Rejected { code: String, message: String },
}

impl BridgeReply {
    pub fn from_result<T: Serialize>(result: BridgeResult<T>) -> Self {
        match result.and_then(|value| {
            serde_json::to_value(value).map_err(|e| BridgeError::InvalidArguments(e.to_string()))
        }) {
            Ok(value) => Self::Resolved { value },
            Err(e) => Self::Rejected {
                code: e.code().to_string(),
                message: e.to_string(),
            },
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved { .. })
    }
}

#[derive(Debug)]
enum Method {
    CheckPermissions {
        read_only: bool,
    },
    RequestPermissions {
        read_only: bool,
    },
    SaveEvent {
        title: Option<String>,
        /// Decoded by the module once write permission is confirmed.
        details: Value,
        options: SaveOptions,
    },
}

impl TryFrom<BridgeCall> for Method {
    type Error = BridgeError;

    fn try_from(call: BridgeCall) -> Result<Self, Self::Error> {
        let mut args = call.args.into_iter();
        match call.method.as_str() {
            "checkPermissions" => Ok(Method::CheckPermissions {
                read_only: read_only_arg(args.next())?,
            }),
            "requestPermissions" => Ok(Method::RequestPermissions {
                read_only: read_only_arg(args.next())?,
            }),
            "saveEvent" => {
                let title = match args.next() {
                    None | Some(Value::Null) => None,
                    Some(Value::String(title)) => Some(title),
                    Some(other) => return Err(invalid(format!("title must be a string, got {}", other))),
                };
                let details = match args.next() {
                    Some(value @ Value::Object(_)) => value,
                    _ => return Err(invalid("details must be an object")),
                };
                let options = match args.next() {
                    None | Some(Value::Null) => SaveOptions::default(),
                    Some(value) => serde_json::from_value(value)
                        .map_err(|e| invalid(format!("options: {}", e)))?,
                };
                Ok(Method::SaveEvent {
                    title,
                    details,
                    options,
                })
            }
            other => Err(invalid(format!("unknown method {:?}", other))),
        }
    }
}

fn invalid(message: impl Into<String>) -> BridgeError {
    BridgeError::InvalidArguments(message.into())
}

fn read_only_arg(arg: Option<Value>) -> BridgeResult<bool> {
    match arg {
        None | Some(Value::Null) => Ok(false),
        Some(Value::Bool(read_only)) => Ok(read_only),
        Some(other) => Err(invalid(format!("readOnly must be a boolean, got {}", other))),
    }
}

impl CalendarEventsModule {
    /// Run one bridge call to completion.
    pub async fn dispatch(&self, call: BridgeCall) -> BridgeReply {
        let method = match Method::try_from(call) {
            Ok(method) => method,
            Err(e) => {
                tracing::warn!("Rejecting bridge call: {}", e);
                return BridgeReply::from_result::<()>(Err(e));
            }
        };

        match method {
            Method::CheckPermissions { read_only } => {
                BridgeReply::from_result(self.check_permissions(read_only))
            }
            Method::RequestPermissions { read_only } => {
                BridgeReply::from_result(self.request_permissions(read_only).await)
            }
            Method::SaveEvent {
                title,
                details,
                options,
            } => BridgeReply::from_result(self.save_event_value(title, details, options).await),
        }
    }

    /// Parse `{"method": ..., "args": [...]}` and dispatch it.
    pub async fn dispatch_json(&self, raw: &str) -> BridgeReply {
        match serde_json::from_str::<BridgeCall>(raw) {
            Ok(call) => self.dispatch(call).await,
            Err(e) => BridgeReply::from_result::<()>(Err(invalid(format!("malformed call: {}", e)))),
        }
    }
}
