//! NETCONF 1.0 message framing
//!
//! Messages are terminated by `]]>]]>`. Nothing here touches the SSH
//! channel: the session only has to move bytes and hand complete messages
//! to [`await_reply`].

use crate::error::{AppError, Result};
use async_trait::async_trait;
use quick_xml::events::Event;
use quick_xml::Reader;

/// End-of-message marker for base:1.0 framing
pub const END_OF_MESSAGE: &str = "]]>]]>";

pub const BASE_NAMESPACE: &str = "urn:ietf:params:xml:ns:netconf:base:1.0";
pub const BASE_CAPABILITY: &str = "urn:ietf:params:netconf:base:1.0";

/// Client hello announcing base:1.0
pub fn client_hello() -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
         <hello xmlns=\"{}\"><capabilities><capability>{}</capability></capabilities></hello>",
        BASE_NAMESPACE, BASE_CAPABILITY
    )
}

/// Wrap an RPC body in its `<rpc>` envelope
pub fn wrap_rpc(message_id: u64, body: &str) -> String {
    format!(
        "<rpc message-id=\"{}\" xmlns=\"{}\">{}</rpc>",
        message_id, BASE_NAMESPACE, body
    )
}

/// Append the end-of-message marker
pub fn frame(message: &str) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(message.len() + END_OF_MESSAGE.len());
    bytes.extend_from_slice(message.as_bytes());
    bytes.extend_from_slice(END_OF_MESSAGE.as_bytes());
    bytes
}

/// Accumulates channel data until complete messages are available
#[derive(Debug, Default)]
pub struct FrameBuffer {
    buffer: Vec<u8>,
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extend(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Take the next complete message, without its marker
    pub fn next_message(&mut self) -> Result<Option<String>> {
        let marker = END_OF_MESSAGE.as_bytes();
        let Some(position) = self
            .buffer
            .windows(marker.len())
            .position(|window| window == marker)
        else {
            return Ok(None);
        };

        let message: Vec<u8> = self.buffer.drain(..position + marker.len()).take(position).collect();
        String::from_utf8(message)
            .map(Some)
            .map_err(|e| AppError::transport(format!("reply is not utf-8: {}", e)))
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

/// Yields complete messages from a session, one at a time
#[async_trait]
pub trait MessageSource: Send {
    async fn next_message(&mut self) -> Result<String>;
}

/// Read messages until the reply to `message_id` arrives
///
/// Replies to earlier requests are discarded. They are left behind when a
/// caller stops waiting, for instance after an exec timeout, and would
/// otherwise be taken as the answer to the next request. Replies that carry
/// no `message-id` are accepted as they are.
pub async fn await_reply<S>(source: &mut S, message_id: u64) -> Result<String>
where
    S: MessageSource + ?Sized,
{
    loop {
        let reply = source.next_message().await?;
        match reply_message_id(&reply)? {
            Some(id) if id < message_id => continue,
            Some(id) if id > message_id => {
                return Err(AppError::transport(format!(
                    "reply to message {} while waiting for {}",
                    id, message_id
                )));
            }
            _ => return Ok(reply),
        }
    }
}

/// `message-id` attribute of an `<rpc-reply>`
pub fn reply_message_id(reply: &str) -> Result<Option<u64>> {
    let malformed = |e: quick_xml::Error| AppError::transport(format!("malformed reply: {}", e));
    let mut reader = Reader::from_str(reply);

    loop {
        match reader.read_event().map_err(malformed)? {
            Event::Start(start) | Event::Empty(start) => {
                if start.local_name().as_ref() != b"rpc-reply" {
                    return Ok(None);
                }
                let Some(attribute) = start
                    .try_get_attribute("message-id")
                    .map_err(|e| malformed(e.into()))?
                else {
                    return Ok(None);
                };
                let value = attribute.unescape_value().map_err(malformed)?;
                return value
                    .trim()
                    .parse()
                    .map(Some)
                    .map_err(|e| AppError::transport(format!("invalid message-id {:?}: {}", value, e)));
            }
            Event::Eof => return Ok(None),
            _ => {}
        }
    }
}

/// Extract the session id from a server hello
pub fn parse_session_id(hello: &str) -> Result<u64> {
    let text = element_text(hello, b"session-id")?
        .ok_or_else(|| AppError::transport("server hello has no session-id"))?;
    text.trim()
        .parse()
        .map_err(|e| AppError::transport(format!("invalid session-id {:?}: {}", text, e)))
}

/// Turn an `<rpc-error>` reply into an error, pass anything else through
pub fn check_reply(reply: String) -> Result<String> {
    if !reply.contains("rpc-error") {
        return Ok(reply);
    }

    let message = element_text(&reply, b"error-message")
        .ok()
        .flatten()
        .or_else(|| element_text(&reply, b"error-tag").ok().flatten())
        .unwrap_or_else(|| "rpc-error".to_string());
    Err(AppError::transport(message.trim().to_string()))
}

/// Text of the first element with the given local name
fn element_text(xml: &str, local_name: &[u8]) -> Result<Option<String>> {
    let mut reader = Reader::from_str(xml);
    let mut inside = false;

    loop {
        match reader.read_event()? {
            Event::Start(start) if start.local_name().as_ref() == local_name => inside = true,
            Event::Text(text) if inside => {
                let value = text.unescape()?;
                return Ok(Some(value.into_owned()));
            }
            Event::End(end) if inside && end.local_name().as_ref() == local_name => {
                return Ok(Some(String::new()));
            }
            Event::Eof => return Ok(None),
            _ => {}
        }
    }
}
