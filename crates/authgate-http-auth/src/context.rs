//! Deployment-platform request context
//!
//! API gateways in front of the service may attach JSON metadata headers:
//!
//! ```text
//! x-amzn-lambda-context: {"request_id": "...", "env_config": {"function_name": "..."}}
//! x-amzn-request-context: {"stage": "prod", "domainName": "...", "identity": {...}}
//! ```
//!
//! This data is informational only. A missing header and a header that is
//! not valid JSON are treated the same way: the field is `None`.

use http::HeaderMap;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

pub const LAMBDA_CONTEXT_HEADER: &str = "x-amzn-lambda-context";
pub const REQUEST_CONTEXT_HEADER: &str = "x-amzn-request-context";

/// Best-effort platform metadata for one request
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PlatformContext {
    pub lambda_context: Option<Value>,
    pub request_context: Option<Value>,
    pub cognito_identity: Option<Value>,
}

impl PlatformContext {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let lambda_context = parse_json_header(headers, LAMBDA_CONTEXT_HEADER);
        let request_context = parse_json_header(headers, REQUEST_CONTEXT_HEADER);
        let cognito_identity = request_context.as_ref().map(|ctx| {
            ctx.get("identity")
                .cloned()
                .unwrap_or_else(|| Value::Object(Default::default()))
        });

        Self {
            lambda_context,
            request_context,
            cognito_identity,
        }
    }

    /// Function name from the lambda context's `env_config`, as sent
    pub fn function_name(&self) -> Option<&Value> {
        self.lambda_context
            .as_ref()?
            .get("env_config")?
            .get("function_name")
    }

    /// Path prefix when served from an API Gateway default stage URL
    ///
    /// Only `*.execute-api.*` domains carry the stage in the path, and the
    /// `$default` stage never does.
    pub fn stage_prefix(&self) -> Option<String> {
        let ctx = self.request_context.as_ref()?;
        let stage = ctx.get("stage")?.as_str()?;
        let domain = ctx.get("domainName").and_then(Value::as_str).unwrap_or("");

        if !stage.is_empty() && stage != "$default" && domain.contains("execute-api") {
            Some(format!("/{}", stage))
        } else {
            None
        }
    }
}

fn parse_json_header(headers: &HeaderMap, name: &str) -> Option<Value> {
    let raw = headers.get(name)?.to_str().ok()?;
    match serde_json::from_str(raw) {
        Ok(value) => Some(value),
        Err(e) => {
            debug!("Ignoring malformed '{}' header: {}", name, e);
            None
        }
    }
}
