//! Message header codec.
//!
//! Every SCMI message starts with one 32-bit header word:
//!
//! | bits  | field          |
//! |-------|----------------|
//! | 7:0   | `message_id`   |
//! | 9:8   | `message_type` |
//! | 17:10 | `protocol_id`  |
//! | 27:18 | `token`        |
//! | 31:28 | reserved (0)   |
//!
//! Decoding never fails: a message type outside the defined set decodes to
//! [`MessageType::Unknown`]. Encoding masks every field to its width, which
//! mirrors what truncation on the wire would do.

use core::fmt;

const MESSAGE_ID_SHIFT: u32 = 0;
const MESSAGE_ID_MASK: u32 = 0xFF;
const MESSAGE_TYPE_SHIFT: u32 = 8;
const MESSAGE_TYPE_MASK: u32 = 0x3;
const PROTOCOL_ID_SHIFT: u32 = 10;
const PROTOCOL_ID_MASK: u32 = 0xFF;
const TOKEN_SHIFT: u32 = 18;

/// Width mask of the sequence token (10 bits).
pub const TOKEN_MASK: u16 = 0x3FF;

/// Message type carried in header bits 9:8.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageType {
    /// Synchronous command, and the synchronous reply to it.
    Command,
    /// Second, asynchronous reply to a command that completes later.
    DelayedResponse,
    /// Platform-initiated notification.
    Notification,
    /// Any other 2-bit value (only `1` today). Holds the raw bits.
    ///
    /// Only the low two bits are meaningful. [`MessageHeader::new`] and
    /// [`MessageType::normalized`] drop the rest, so a header built from
    /// `Unknown(5)` holds `Unknown(1)`.
    Unknown(u8),
}

impl MessageType {
    /// Decode the 2-bit type field. Bits above bit 1 are ignored.
    pub fn from_bits(bits: u8) -> Self {
        match bits & MESSAGE_TYPE_MASK as u8 {
            0 => MessageType::Command,
            2 => MessageType::DelayedResponse,
            3 => MessageType::Notification,
            other => MessageType::Unknown(other),
        }
    }

    /// The same type as decoding would produce it.
    pub fn normalized(self) -> Self {
        Self::from_bits(self.bits())
    }

    /// The 2-bit wire value.
    pub fn bits(self) -> u8 {
        match self {
            MessageType::Command => 0,
            MessageType::DelayedResponse => 2,
            MessageType::Notification => 3,
            MessageType::Unknown(bits) => bits & MESSAGE_TYPE_MASK as u8,
        }
    }

    /// The type a matching reply must carry.
    ///
    /// A synchronous reply to a command is itself typed `Command`. `Unknown`
    /// has no valid reply, so nothing matches it.
    pub fn expected_reply(self) -> Option<MessageType> {
        match self {
            MessageType::Command => Some(MessageType::Command),
            MessageType::DelayedResponse => Some(MessageType::DelayedResponse),
            MessageType::Notification => Some(MessageType::Notification),
            MessageType::Unknown(_) => None,
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageType::Command => write!(f, "command"),
            MessageType::DelayedResponse => write!(f, "delayed-response"),
            MessageType::Notification => write!(f, "notification"),
            MessageType::Unknown(bits) => write!(f, "unknown({bits})"),
        }
    }
}

/// Decoded message header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageHeader {
    pub protocol_id: u8,
    pub message_id: u8,
    pub message_type: MessageType,
    /// Sequence token. Assigned by the transport; never compared.
    pub token: u16,
}

impl MessageHeader {
    pub fn new(protocol_id: u8, message_id: u8, message_type: MessageType) -> Self {
        Self {
            protocol_id,
            message_id,
            message_type: message_type.normalized(),
            token: 0,
        }
    }

    /// Header for a synchronous command.
    pub fn command(protocol_id: u8, message_id: u8) -> Self {
        Self::new(protocol_id, message_id, MessageType::Command)
    }

    /// Build a header from wider integers, keeping only the low bits of each
    /// field the way the wire format would.
    pub fn from_raw_fields(protocol_id: u32, message_id: u32, message_type: MessageType) -> Self {
        Self::new(
            (protocol_id & PROTOCOL_ID_MASK) as u8,
            (message_id & MESSAGE_ID_MASK) as u8,
            message_type,
        )
    }

    pub fn with_token(mut self, token: u16) -> Self {
        self.token = token & TOKEN_MASK;
        self
    }

    /// Pack into the 32-bit wire word. Reserved bits 31:28 are zero.
    pub fn encode(&self) -> u32 {
        ((self.message_id as u32 & MESSAGE_ID_MASK) << MESSAGE_ID_SHIFT)
            | ((self.message_type.bits() as u32 & MESSAGE_TYPE_MASK) << MESSAGE_TYPE_SHIFT)
            | ((self.protocol_id as u32 & PROTOCOL_ID_MASK) << PROTOCOL_ID_SHIFT)
            | (((self.token & TOKEN_MASK) as u32) << TOKEN_SHIFT)
    }

    /// Unpack a 32-bit wire word. Reserved bits are ignored.
    pub fn decode(word: u32) -> Self {
        Self {
            message_id: ((word >> MESSAGE_ID_SHIFT) & MESSAGE_ID_MASK) as u8,
            message_type: MessageType::from_bits(((word >> MESSAGE_TYPE_SHIFT) & MESSAGE_TYPE_MASK) as u8),
            protocol_id: ((word >> PROTOCOL_ID_SHIFT) & PROTOCOL_ID_MASK) as u8,
            token: ((word >> TOKEN_SHIFT) as u16) & TOKEN_MASK,
        }
    }
}

impl From<MessageHeader> for u32 {
    fn from(header: MessageHeader) -> u32 {
        header.encode()
    }
}

impl From<u32> for MessageHeader {
    fn from(word: u32) -> Self {
        MessageHeader::decode(word)
    }
}

impl fmt::Display for MessageHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "protocol={:#04x} message={:#04x} type={} token={}",
            self.protocol_id, self.message_id, self.message_type, self.token
        )
    }
}

/// Does `received` answer `sent`?
///
/// Protocol and message ids must agree and the received type must be the
/// reply discriminator for the sent type. Tokens are not compared.
pub fn headers_match(sent: MessageHeader, received: MessageHeader) -> bool {
    sent.protocol_id == received.protocol_id
        && sent.message_id == received.message_id
        && sent.message_type.expected_reply() == Some(received.message_type)
}

/// Is `delayed` the asynchronous completion of `command`?
pub fn delayed_response_matches(command: MessageHeader, delayed: MessageHeader) -> bool {
    command.message_type == MessageType::Command
        && command.protocol_id == delayed.protocol_id
        && command.message_id == delayed.message_id
        && delayed.message_type == MessageType::DelayedResponse
}

#[cfg(test)]
mod tests {
    use super::*;

    const TYPES: [MessageType; 3] = [
        MessageType::Command,
        MessageType::DelayedResponse,
        MessageType::Notification,
    ];

    #[test]
    fn test_layout() {
        let header = MessageHeader::command(0x16, 0x04).with_token(0x155);
        let word = header.encode();
        assert_eq!(word & 0xFF, 0x04);
        assert_eq!((word >> 8) & 0x3, 0);
        assert_eq!((word >> 10) & 0xFF, 0x16);
        assert_eq!((word >> 18) & 0x3FF, 0x155);
        assert_eq!(word >> 28, 0);
    }

    #[test]
    fn test_roundtrip_all_ids() {
        for protocol_id in [0u8, 0x10, 0x12, 0x16, 0x7F, 0xFF] {
            for message_id in 0..=u8::MAX {
                for message_type in TYPES {
                    let header = MessageHeader::new(protocol_id, message_id, message_type)
                        .with_token(message_id as u16 * 3);
                    assert_eq!(MessageHeader::decode(header.encode()), header);
                }
            }
        }
    }

    #[test]
    fn test_decode_unknown_type_is_sentinel() {
        let word = 1 << 8;
        let header = MessageHeader::decode(word);
        assert_eq!(header.message_type, MessageType::Unknown(1));
        assert_eq!(header.encode(), word);
    }

    #[test]
    fn test_unknown_type_keeps_two_bits() {
        assert_eq!(MessageType::Unknown(5).normalized(), MessageType::Unknown(1));
        assert_eq!(MessageType::Command.normalized(), MessageType::Command);

        let header = MessageHeader::new(0x10, 0x00, MessageType::Unknown(5));
        assert_eq!(header.message_type, MessageType::Unknown(1));
        assert_eq!(MessageHeader::decode(header.encode()), header);

        // Unknown(6) carries type bits 2, which is a delayed response.
        let header = MessageHeader::new(0x10, 0x00, MessageType::Unknown(6));
        assert_eq!(header.message_type, MessageType::DelayedResponse);
        assert_eq!(MessageHeader::decode(header.encode()), header);
    }

    #[test]
    fn test_decode_ignores_reserved_bits() {
        let clean = MessageHeader::command(0x10, 0x02).encode();
        assert_eq!(
            MessageHeader::decode(clean | 0xF000_0000),
            MessageHeader::decode(clean)
        );
    }

    #[test]
    fn test_raw_fields_are_masked() {
        let header = MessageHeader::from_raw_fields(0x110, 0x1_02, MessageType::Command);
        assert_eq!(header.protocol_id, 0x10);
        assert_eq!(header.message_id, 0x02);

        let header = MessageHeader::command(1, 1).with_token(0xFFFF);
        assert_eq!(header.token, TOKEN_MASK);
    }

    #[test]
    fn test_headers_match_ignores_token() {
        let sent = MessageHeader::command(0x10, 0x09).with_token(1);
        let received = MessageHeader::command(0x10, 0x09).with_token(900);
        assert!(headers_match(sent, received));
        assert!(headers_match(received, sent));
    }

    #[test]
    fn test_headers_match_rejects_mismatch() {
        let sent = MessageHeader::command(0x10, 0x09);
        assert!(!headers_match(sent, MessageHeader::command(0x11, 0x09)));
        assert!(!headers_match(sent, MessageHeader::command(0x10, 0x0A)));
        assert!(!headers_match(
            sent,
            MessageHeader::new(0x10, 0x09, MessageType::DelayedResponse)
        ));
        assert!(!headers_match(
            sent,
            MessageHeader::new(0x10, 0x09, MessageType::Unknown(1))
        ));
        let unknown = MessageHeader::new(0x10, 0x09, MessageType::Unknown(1));
        assert!(!headers_match(unknown, unknown));
    }

    #[test]
    fn test_delayed_response_match() {
        let command = MessageHeader::command(0x16, 0x04);
        let delayed = MessageHeader::new(0x16, 0x04, MessageType::DelayedResponse);
        assert!(delayed_response_matches(command, delayed));
        assert!(!delayed_response_matches(command, command));
        assert!(!headers_match(command, delayed));
    }
}
