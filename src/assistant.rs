//! Assistant seam
//!
//! The assistant is an opaque collaborator: prompt and optional attachment
//! in, plain text or structured JSON out. Failures come back as strings for
//! the UI to display verbatim; there is no typed error taxonomy and no
//! retry policy here.
//!
//! `RequestGate` guards the one in-flight request: a second submission while
//! one is loading is rejected instead of silently racing, and a completion
//! that lands after the user moved on is dropped.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use crate::error::AppError;

#[derive(Debug, Clone, PartialEq)]
pub struct AssistantRequest {
    pub prompt: String,
    pub attachment: Option<Vec<u8>>,
}

impl AssistantRequest {
    pub fn text(prompt: impl Into<String>) -> Self {
        AssistantRequest {
            prompt: prompt.into(),
            attachment: None,
        }
    }
}

/// What the collaborator returned: free text or already-structured JSON.
#[derive(Debug, Clone, PartialEq)]
pub enum AssistantReply {
    Text(String),
    Structured(serde_json::Value),
}

pub trait Assistant: Send + Sync {
    fn complete(&self, request: AssistantRequest) -> Result<AssistantReply, String>;
}

/// Single-in-flight request guard with a generation counter for staleness.
#[derive(Debug, Default)]
pub struct RequestGate {
    busy: AtomicBool,
    generation: AtomicU64,
}

impl RequestGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    /// Claim the in-flight slot. Returns `None` when a request is already
    /// running (the trigger control should be disabled, not queued).
    pub fn try_begin(&self) -> Option<RequestTicket<'_>> {
        if self.busy.swap(true, Ordering::SeqCst) {
            return None;
        }
        Some(RequestTicket {
            gate: self,
            generation: self.generation.load(Ordering::SeqCst),
        })
    }

    /// Invalidate any outstanding ticket (the user navigated away). The
    /// request itself is not cancelled; its eventual result is ignored.
    pub fn supersede(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }
}

/// Held for the duration of one request; releases the slot on drop.
pub struct RequestTicket<'a> {
    gate: &'a RequestGate,
    generation: u64,
}

impl RequestTicket<'_> {
    /// False once the gate was superseded after this ticket was issued.
    pub fn is_current(&self) -> bool {
        self.gate.generation.load(Ordering::SeqCst) == self.generation
    }
}

impl Drop for RequestTicket<'_> {
    fn drop(&mut self) {
        self.gate.busy.store(false, Ordering::SeqCst);
    }
}

/// Run one gated request. `Ok(None)` means the reply arrived for a
/// superseded screen and was dropped.
pub fn run_gated(
    assistant: &dyn Assistant,
    gate: &RequestGate,
    request: AssistantRequest,
) -> Result<Option<AssistantReply>, AppError> {
    let ticket = gate.try_begin().ok_or(AppError::Busy)?;

    let reply = assistant.complete(request).map_err(AppError::Assistant)?;

    if !ticket.is_current() {
        log::info!("Dropping assistant reply for a superseded request");
        return Ok(None);
    }
    Ok(Some(reply))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoAssistant;

    impl Assistant for EchoAssistant {
        fn complete(&self, request: AssistantRequest) -> Result<AssistantReply, String> {
            Ok(AssistantReply::Text(format!("echo: {}", request.prompt)))
        }
    }

    struct FailingAssistant;

    impl Assistant for FailingAssistant {
        fn complete(&self, _request: AssistantRequest) -> Result<AssistantReply, String> {
            Err("model overloaded".to_string())
        }
    }

    #[test]
    fn test_gate_rejects_second_request_while_busy() {
        let gate = RequestGate::new();
        let ticket = gate.try_begin().expect("first claim");

        assert!(gate.try_begin().is_none());

        drop(ticket);
        assert!(gate.try_begin().is_some());
    }

    #[test]
    fn test_run_gated_returns_reply() {
        let gate = RequestGate::new();
        let reply = run_gated(&EchoAssistant, &gate, AssistantRequest::text("hi"))
            .unwrap()
            .unwrap();

        assert_eq!(reply, AssistantReply::Text("echo: hi".to_string()));
        assert!(!gate.is_busy(), "slot released after completion");
    }

    #[test]
    fn test_errors_are_opaque_strings() {
        let gate = RequestGate::new();
        let err = run_gated(&FailingAssistant, &gate, AssistantRequest::text("hi")).unwrap_err();

        match err {
            AppError::Assistant(msg) => assert_eq!(msg, "model overloaded"),
            other => panic!("unexpected error {:?}", other),
        }
        assert!(!gate.is_busy(), "slot released after failure");
    }

    #[test]
    fn test_superseded_reply_is_dropped() {
        struct SupersedingAssistant<'a> {
            gate: &'a RequestGate,
        }
        impl Assistant for SupersedingAssistant<'_> {
            fn complete(&self, _request: AssistantRequest) -> Result<AssistantReply, String> {
                // user navigates away mid-request
                self.gate.supersede();
                Ok(AssistantReply::Text("too late".to_string()))
            }
        }

        let gate = RequestGate::new();
        let assistant = SupersedingAssistant { gate: &gate };
        let result = run_gated(&assistant, &gate, AssistantRequest::text("hi")).unwrap();

        assert!(result.is_none());
    }
}
