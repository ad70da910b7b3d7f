//! In-memory backend and scripted gateway used by unit tests.

use async_trait::async_trait;
use bytes::Bytes;
use gateway_core::{
    BackendModel, BackendRequest, CandidateModel, Envelope, GatewayError, GatewayReply,
    GatewayResult, GatewayTransport, Prompt, ProviderTag, ReplyBody, StreamEvent,
};
use http::{HeaderMap, HeaderValue};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::{BTreeMap, VecDeque};
use std::time::Duration;
use tokio::time::Instant;

/// Backend speaking a tiny JSON dialect: `{"text": ..}` completions and
/// `{"delta": ..}` stream events.
#[derive(Debug)]
pub struct EchoBackend {
    tag: ProviderTag,
    model: String,
}

impl BackendModel for EchoBackend {
    fn provider(&self) -> &ProviderTag {
        &self.tag
    }

    fn model_id(&self) -> &str {
        &self.model
    }

    fn prepare(&self, prompt: &Prompt, streaming: bool) -> GatewayResult<BackendRequest> {
        Ok(BackendRequest {
            endpoint: "chat/completions".into(),
            headers: BTreeMap::new(),
            payload: json!({
                "model": self.model,
                "stream": streaming,
                "messages": prompt.messages,
            }),
        })
    }

    fn decode_completion(&self, body: &[u8]) -> GatewayResult<String> {
        let value: Value = serde_json::from_slice(body).map_err(|e| {
            GatewayError::candidate(self.tag.as_str(), &self.model, e.to_string(), None, false)
        })?;
        value["text"].as_str().map(str::to_string).ok_or_else(|| {
            GatewayError::candidate(self.tag.as_str(), &self.model, "missing text", None, false)
        })
    }

    fn decode_stream_event(&self, data: &str) -> GatewayResult<StreamEvent> {
        if data == "stop" {
            return Ok(StreamEvent::Done);
        }
        let value: Value =
            serde_json::from_str(data).map_err(|e| GatewayError::streaming(e.to_string()))?;
        Ok(value["delta"]
            .as_str()
            .map_or(StreamEvent::Skip, |d| StreamEvent::Delta(d.to_string())))
    }
}

pub fn echo_candidate(tag: ProviderTag, model: &str) -> CandidateModel {
    CandidateModel::new(EchoBackend {
        tag,
        model: model.to_string(),
    })
}

/// One scripted gateway behaviour
#[derive(Debug, Clone)]
pub enum Step {
    Reply {
        status: u16,
        body: String,
        headers: Vec<(&'static str, &'static str)>,
    },
    Sse(Vec<&'static str>),
    Fail {
        retryable: bool,
    },
    Hang,
}

pub fn ok(text: &str) -> Step {
    Step::Reply {
        status: 200,
        body: json!({ "text": text }).to_string(),
        headers: vec![("content-type", "application/json")],
    }
}

pub fn status(code: u16, body: &str) -> Step {
    Step::Reply {
        status: code,
        body: body.to_string(),
        headers: vec![],
    }
}

pub fn gateway_error(code: u16, gateway_code: u32, message: &str) -> Step {
    status(
        code,
        &json!({"success": false, "error": [{"code": gateway_code, "message": message}]})
            .to_string(),
    )
}

/// Record of one envelope received by the scripted gateway
#[derive(Debug, Clone)]
pub struct Call {
    pub path: String,
    pub body: Value,
    pub headers: HeaderMap,
    pub at: Instant,
}

impl Call {
    pub fn provider(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or_default()
    }
}

/// Gateway that replays a fixed script and records every envelope
#[derive(Debug)]
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Step>>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedTransport {
    pub fn new(script: Vec<Step>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn providers(&self) -> Vec<String> {
        self.calls()
            .iter()
            .map(|c| c.provider().to_string())
            .collect()
    }
}

#[async_trait]
impl GatewayTransport for ScriptedTransport {
    async fn send(&self, envelope: Envelope) -> GatewayResult<GatewayReply> {
        self.calls.lock().push(Call {
            path: envelope.path.clone(),
            body: envelope.body.clone(),
            headers: envelope.headers.clone(),
            at: Instant::now(),
        });

        let step = self.script.lock().pop_front();
        match step {
            Some(Step::Reply {
                status,
                body,
                headers,
            }) => {
                let mut reply = GatewayReply::buffered(status, body);
                for (name, value) in headers {
                    reply.headers.insert(name, HeaderValue::from_static(value));
                }
                Ok(reply)
            }
            Some(Step::Sse(parts)) => {
                let chunks: Vec<GatewayResult<Bytes>> = parts
                    .into_iter()
                    .map(|p| Ok(Bytes::from_static(p.as_bytes())))
                    .collect();
                let mut headers = HeaderMap::new();
                headers.insert("content-type", HeaderValue::from_static("text/event-stream"));
                Ok(GatewayReply {
                    status: 200,
                    headers,
                    body: ReplyBody::Streaming(Box::pin(futures::stream::iter(chunks))),
                })
            }
            Some(Step::Fail { retryable }) => {
                Err(GatewayError::transport("connection reset", retryable))
            }
            Some(Step::Hang) => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(GatewayError::transport("hung request finished", false))
            }
            None => Err(GatewayError::transport("script exhausted", false)),
        }
    }
}
