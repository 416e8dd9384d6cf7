//! Header decode never fails, drops only the reserved nibble, and a decoded
//! command always answers itself.

use scmi_core::{MessageHeader, MessageType, headers_match};

fn main() {
    bolero::check!().with_type::<u32>().for_each(|&word| {
        let header = MessageHeader::decode(word);
        assert_eq!(header.encode(), word & 0x0FFF_FFFF);
        assert!(header.token <= 0x3FF);

        let matches_itself = headers_match(header, header);
        match header.message_type {
            MessageType::Unknown(_) => assert!(!matches_itself),
            _ => assert!(matches_itself),
        }

        // The token never takes part in matching.
        let retokened = header.with_token(header.token.wrapping_add(1));
        assert_eq!(headers_match(header, retokened), matches_itself);
    });
}
