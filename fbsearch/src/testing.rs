use crate::error::{Result, SearchError};
use crate::transport::{Params, Transport};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Mutex;

#[derive(Debug, Clone)]
pub(crate) struct RecordedCall {
    pub path: String,
    pub params: Params,
    pub domain: Option<String>,
}

/// Replays canned responses in order and records every request.
#[derive(Debug, Default)]
pub(crate) struct ScriptedTransport {
    responses: Mutex<VecDeque<Value>>,
    calls: Mutex<Vec<RecordedCall>>,
    fail: bool,
}

impl ScriptedTransport {
    pub fn new(responses: Vec<Value>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            ..Default::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn private_request(
        &self,
        path: &str,
        params: &Params,
        domain: Option<&str>,
    ) -> Result<Value> {
        self.calls.lock().unwrap().push(RecordedCall {
            path: path.to_string(),
            params: params.clone(),
            domain: domain.map(str::to_string),
        });
        if self.fail {
            return Err(SearchError::Status {
                path: path.to_string(),
                status: 500,
                body: "scripted failure".into(),
            });
        }
        let next = self.responses.lock().unwrap().pop_front();
        next.ok_or_else(|| SearchError::Status {
            path: path.to_string(),
            status: 404,
            body: "no scripted response left".into(),
        })
    }
}
