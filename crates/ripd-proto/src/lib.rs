//! This crate (part of the routing daemon project) implements the wire codec for RIP-style
//! distance-vector advertisements: a fixed 4-byte header followed by zero or more 20-byte
//! route entries. It is a pure framing layer: it has no notion of neighbors, next hops, or
//! split horizon, and callers decide what to put in an advertisement before handing it here.
//!
//! ## Frame layout
//! | Field            | Size (bytes) | Notes                                   |
//! |-------------------|-------------|------------------------------------------|
//! | command           | 1           | 0x02 on encode; 0x01 or 0x02 accepted on decode |
//! | version           | 1           | always 0x02                              |
//! | sender id         | 2           | big-endian, range [1, 64000]             |
//! | entry[0..n]       | 20 each     | address family, tag, destination, reserved x2, metric |

#![no_std]
extern crate alloc;

use alloc::vec::Vec;
use nom::multi::many0;
use nom::number::complete::{be_u16, be_u32, be_u8};
use nom::IResult;
use ripd_common::NodeId;
use thiserror::Error;

/// RIPv2 response command. The original implementation this daemon is modeled on emits 0x01,
/// which collides with the RFC's request command; encoding here standardizes on 0x02, while
/// decode still accepts either for compatibility.
pub const COMMAND_REQUEST: u8 = 0x01;
pub const COMMAND_RESPONSE: u8 = 0x02;
const VERSION: u8 = 0x02;
const ADDRESS_FAMILY_INET: u16 = 0x0002;
const HEADER_LEN: usize = 4;
const ENTRY_LEN: usize = 20;

pub const METRIC_MIN_ADVERTISED: u32 = 1;
pub const METRIC_MAX_ADVERTISED: u32 = 16;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("frame length {0} is not 4 plus a multiple of 20")]
    InvalidFrameLength(usize),
    #[error("unexpected command byte {0:#04x}")]
    InvalidCommand(u8),
    #[error("unexpected version byte {0:#04x}")]
    InvalidVersion(u8),
    #[error("sender id {0} out of range")]
    InvalidSenderId(u32),
    #[error("entry {index} has unexpected address family {family:#06x}")]
    InvalidAddressFamily { index: usize, family: u16 },
    #[error("entry {index} has metric {metric} out of range [1, 16]")]
    InvalidMetric { index: usize, metric: u32 },
    #[error("frame is truncated or malformed")]
    Malformed,
}

/// A single destination/metric pair as carried on the wire. `destination` is kept as a raw
/// `u32` rather than a `NodeId`: the wire format only range-checks the sender id, not each
/// destination, so a strict `NodeId` here would reject frames the validation rules accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteAdvertisement {
    pub destination: u32,
    pub metric: u8,
}

pub fn encode_response(sender_id: NodeId, entries: &[RouteAdvertisement]) -> Vec<u8> {
    let mut buffer = Vec::with_capacity(HEADER_LEN + entries.len() * ENTRY_LEN);
    buffer.push(COMMAND_RESPONSE);
    buffer.push(VERSION);
    buffer.extend_from_slice(&(sender_id.get() as u16).to_be_bytes());
    for entry in entries {
        buffer.extend_from_slice(&ADDRESS_FAMILY_INET.to_be_bytes());
        buffer.extend_from_slice(&0u16.to_be_bytes());
        buffer.extend_from_slice(&entry.destination.to_be_bytes());
        buffer.extend_from_slice(&0u32.to_be_bytes());
        buffer.extend_from_slice(&0u32.to_be_bytes());
        buffer.extend_from_slice(&(entry.metric as u32).to_be_bytes());
    }
    buffer
}

struct RawEntry {
    family: u16,
    destination: u32,
    metric: u32,
}

fn parse_header(input: &[u8]) -> IResult<&[u8], (u8, u8, u16)> {
    let (input, command) = be_u8(input)?;
    let (input, version) = be_u8(input)?;
    let (input, sender) = be_u16(input)?;
    Ok((input, (command, version, sender)))
}

fn parse_entry(input: &[u8]) -> IResult<&[u8], RawEntry> {
    let (input, family) = be_u16(input)?;
    let (input, _tag) = be_u16(input)?;
    let (input, destination) = be_u32(input)?;
    let (input, _reserved1) = be_u32(input)?;
    let (input, _reserved2) = be_u32(input)?;
    let (input, metric) = be_u32(input)?;
    Ok((
        input,
        RawEntry {
            family,
            destination,
            metric,
        },
    ))
}

pub fn decode_response(input: &[u8]) -> Result<(NodeId, Vec<RouteAdvertisement>), ValidationError> {
    if input.len() < HEADER_LEN || (input.len() - HEADER_LEN) % ENTRY_LEN != 0 {
        return Err(ValidationError::InvalidFrameLength(input.len()));
    }

    let (rest, (command, version, sender)) =
        parse_header(input).map_err(|_| ValidationError::Malformed)?;
    if command != COMMAND_REQUEST && command != COMMAND_RESPONSE {
        return Err(ValidationError::InvalidCommand(command));
    }
    if version != VERSION {
        return Err(ValidationError::InvalidVersion(version));
    }
    let sender_id = NodeId::new(sender as u32).map_err(|_| ValidationError::InvalidSenderId(sender as u32))?;

    let (_, raw_entries) = many0(parse_entry)(rest).map_err(|_: nom::Err<nom::error::Error<&[u8]>>| ValidationError::Malformed)?;

    for (index, entry) in raw_entries.iter().enumerate() {
        if entry.family != ADDRESS_FAMILY_INET {
            return Err(ValidationError::InvalidAddressFamily {
                index,
                family: entry.family,
            });
        }
    }
    for (index, entry) in raw_entries.iter().enumerate() {
        if entry.metric < METRIC_MIN_ADVERTISED || entry.metric > METRIC_MAX_ADVERTISED {
            return Err(ValidationError::InvalidMetric {
                index,
                metric: entry.metric,
            });
        }
    }

    let entries = raw_entries
        .into_iter()
        .map(|entry| RouteAdvertisement {
            destination: entry.destination,
            metric: entry.metric as u8,
        })
        .collect();

    Ok((sender_id, entries))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sender(id: u32) -> NodeId {
        NodeId::new(id).unwrap()
    }

    #[test]
    fn round_trips_empty_table() {
        let encoded = encode_response(sender(1), &[]);
        assert_eq!(encoded.len(), HEADER_LEN);
        let (decoded_sender, entries) = decode_response(&encoded).unwrap();
        assert_eq!(decoded_sender, sender(1));
        assert!(entries.is_empty());
    }

    #[test]
    fn round_trips_several_entries() {
        let entries = [
            RouteAdvertisement {
                destination: 2,
                metric: 3,
            },
            RouteAdvertisement {
                destination: 3,
                metric: 16,
            },
        ];
        let encoded = encode_response(sender(1), &entries);
        assert_eq!(encoded.len(), HEADER_LEN + 2 * ENTRY_LEN);
        let (decoded_sender, decoded_entries) = decode_response(&encoded).unwrap();
        assert_eq!(decoded_sender, sender(1));
        assert_eq!(&decoded_entries, &entries);
    }

    #[test]
    fn accepts_request_command_byte_on_decode() {
        let mut encoded = encode_response(sender(1), &[]);
        encoded[0] = COMMAND_REQUEST;
        assert!(decode_response(&encoded).is_ok());
    }

    #[test]
    fn rejects_bad_frame_length() {
        let bytes = [0u8; 5];
        assert_eq!(
            decode_response(&bytes),
            Err(ValidationError::InvalidFrameLength(5))
        );
    }

    #[test]
    fn rejects_bad_version() {
        let mut encoded = encode_response(sender(1), &[]);
        encoded[1] = 0x01;
        assert_eq!(decode_response(&encoded), Err(ValidationError::InvalidVersion(0x01)));
    }

    #[test]
    fn rejects_sender_out_of_range() {
        let mut encoded = encode_response(sender(1), &[]);
        encoded[2] = 0x00;
        encoded[3] = 0x00;
        assert_eq!(decode_response(&encoded), Err(ValidationError::InvalidSenderId(0)));
    }

    #[test]
    fn rejects_bad_address_family_before_checking_metric() {
        let entries = [RouteAdvertisement {
            destination: 2,
            metric: 200, // also out of range, family check must win
        }];
        let mut encoded = encode_response(sender(1), &entries);
        encoded[HEADER_LEN] = 0x00;
        encoded[HEADER_LEN + 1] = 0x09;
        assert_eq!(
            decode_response(&encoded),
            Err(ValidationError::InvalidAddressFamily { index: 0, family: 0x0009 })
        );
    }

    #[test]
    fn rejects_metric_out_of_range() {
        let entries = [RouteAdvertisement {
            destination: 2,
            metric: 3,
        }];
        let mut encoded = encode_response(sender(1), &entries);
        let metric_offset = HEADER_LEN + 16;
        encoded[metric_offset..metric_offset + 4].copy_from_slice(&0u32.to_be_bytes());
        assert_eq!(
            decode_response(&encoded),
            Err(ValidationError::InvalidMetric { index: 0, metric: 0 })
        );
    }
}
