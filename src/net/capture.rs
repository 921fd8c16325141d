//! Packet capture text format
//!
//! One packet per line: the opcode in hex, then the payload in hex. Bytes in
//! the payload may be separated by whitespace. Blank lines and lines
//! starting with `#` are ignored.
//!
//! ```text
//! # ClientIdentR, empty payload
//! 0000001F
//! 00000023 03
//! ```

use crate::error::{PacketError, PacketResult};
use crate::net::packet::Packet;

/// Parse a whole capture
pub fn parse_capture(text: &str) -> PacketResult<Vec<Packet>> {
    let mut packets = Vec::new();
    for (index, line) in text.lines().enumerate() {
        if let Some(packet) = parse_line(line).map_err(|e| match e {
            PacketError::InvalidValue { field, value } => PacketError::InvalidValue {
                field,
                value: format!("line {}: {}", index + 1, value),
            },
            other => other,
        })? {
            packets.push(packet);
        }
    }
    Ok(packets)
}

/// Parse one line, `None` for blank and comment lines
pub fn parse_line(line: &str) -> PacketResult<Option<Packet>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let (op_text, payload_text) = match line.split_once(char::is_whitespace) {
        Some((op, rest)) => (op, rest),
        None => (line, ""),
    };

    let op = u32::from_str_radix(op_text.trim_start_matches("0x"), 16).map_err(|_| {
        PacketError::InvalidValue {
            field: "opcode",
            value: op_text.to_string(),
        }
    })?;
    let payload = decode_hex(payload_text)?;

    Ok(Some(Packet::from_payload(op, &payload)))
}

/// Format a packet as a capture line
pub fn format_line(packet: &Packet) -> String {
    let payload: Vec<String> = packet.payload().iter().map(|b| format!("{:02X}", b)).collect();
    if payload.is_empty() {
        format!("{:08X}", packet.op())
    } else {
        format!("{:08X} {}", packet.op(), payload.join(" "))
    }
}

fn decode_hex(text: &str) -> PacketResult<Vec<u8>> {
    let digits: Vec<u8> = text
        .bytes()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();
    if digits.len() % 2 != 0 {
        return Err(PacketError::InvalidValue {
            field: "payload",
            value: format!("odd number of hex digits ({})", digits.len()),
        });
    }

    digits
        .chunks(2)
        .map(|pair| {
            let text = std::str::from_utf8(pair).unwrap_or("??");
            u8::from_str_radix(text, 16).map_err(|_| PacketError::InvalidValue {
                field: "payload",
                value: text.to_string(),
            })
        })
        .collect()
}
