//! Scripted stand-in for the reader side of the link.
//!
//! [`SimulatedReader`] turns a handler `FnMut(&[u8]) -> Vec<u8>` (APDU in,
//! APDU response out) into a [`MemoryLink`] that answers each command
//! frame the way the hardware does: an ACK frame, then a response frame
//! carrying an `RDR_to_PC_Escape` envelope.

use std::cell::RefCell;
use std::rc::Rc;

use bytes::{Bytes, BytesMut};
use nfcport_frame::{decode_frame, encode_frame, FrameConfig, InboundFrame, ACK_FRAME};
use nfcport_transport::MemoryLink;
use tracing::debug;

use crate::envelope::{EscapeCommand, EscapeResponse, RDR_TO_PC_ESCAPE};

type Handler = Box<dyn FnMut(&[u8]) -> Vec<u8>>;

/// Shared record of every command the simulated reader received.
#[derive(Debug, Clone, Default)]
pub struct CommandLog(Rc<RefCell<Vec<Bytes>>>);

impl CommandLog {
    /// Commands received so far, oldest first.
    pub fn commands(&self) -> Vec<Bytes> {
        self.0.borrow().clone()
    }

    /// The most recent command, if any.
    pub fn last(&self) -> Option<Bytes> {
        self.0.borrow().last().cloned()
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    fn push(&self, command: Bytes) {
        self.0.borrow_mut().push(command);
    }
}

/// Simulated reader answering escape commands.
pub struct SimulatedReader {
    handler: Handler,
    message_type: u8,
    status: u8,
    error: u8,
    send_ack: bool,
    log: CommandLog,
}

impl SimulatedReader {
    /// Reader that answers every command with `handler(command)`.
    pub fn new(handler: impl FnMut(&[u8]) -> Vec<u8> + 'static) -> Self {
        Self {
            handler: Box::new(handler),
            message_type: RDR_TO_PC_ESCAPE,
            status: 0,
            error: 0,
            send_ack: true,
            log: CommandLog::default(),
        }
    }

    /// Reader that answers every command with the same response.
    pub fn fixed(response: &[u8]) -> Self {
        let response = response.to_vec();
        Self::new(move |_| response.clone())
    }

    /// Message type used in response envelopes.
    pub fn message_type(mut self, message_type: u8) -> Self {
        self.message_type = message_type;
        self
    }

    /// `bStatus` / `bError` reported in response envelopes.
    pub fn status(mut self, status: u8, error: u8) -> Self {
        self.status = status;
        self.error = error;
        self
    }

    /// Skip the ACK frame before each response.
    pub fn without_ack(mut self) -> Self {
        self.send_ack = false;
        self
    }

    /// Handle to the received-command log.
    pub fn log(&self) -> CommandLog {
        self.log.clone()
    }

    /// Wire bytes the reader emits in reply to `written`.
    ///
    /// Anything that does not decode as an escape command gets no answer,
    /// so the host sees a timeout.
    pub fn respond(&mut self, written: &[u8]) -> Vec<u8> {
        let mut wire = BytesMut::from(written);
        let max = FrameConfig::default().max_payload_size;
        let Ok(Some(InboundFrame::Data(payload))) = decode_frame(&mut wire, max) else {
            debug!("simulated reader ignoring non-frame input");
            return Vec::new();
        };
        let Ok(command) = EscapeCommand::decode(&payload) else {
            debug!("simulated reader ignoring non-escape payload");
            return Vec::new();
        };
        self.log.push(command.data.clone());

        let response = EscapeResponse {
            message_type: self.message_type,
            slot: command.slot,
            sequence: command.sequence,
            status: self.status,
            error: self.error,
            data: Bytes::from((self.handler)(&command.data)),
        };

        let mut envelope = BytesMut::new();
        response.encode(&mut envelope);

        let mut out = BytesMut::new();
        if self.send_ack {
            out.extend_from_slice(&ACK_FRAME);
        }
        if encode_frame(&envelope, &mut out).is_err() {
            return Vec::new();
        }
        out.to_vec()
    }

    /// Wire the reader to a fresh in-memory link.
    pub fn into_link(mut self) -> MemoryLink {
        MemoryLink::new().with_responder(move |written| self.respond(written))
    }
}

impl std::fmt::Debug for SimulatedReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulatedReader")
            .field("message_type", &self.message_type)
            .field("status", &self.status)
            .field("error", &self.error)
            .field("send_ack", &self.send_ack)
            .field("commands", &self.log.len())
            .finish()
    }
}
