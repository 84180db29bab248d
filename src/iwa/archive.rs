//! IWA Archive Record Headers
//!
//! A decompressed IWA stream is a sequence of records. Each record starts
//! with a varint length followed by that many bytes of a protobuf
//! `ArchiveInfo`; the message payloads its `MessageInfo` entries describe
//! follow back to back.

use std::io::Read;

use crate::iwa::varint;
use crate::iwa::{Error, Result};
use prost::Message;

pub use crate::iwa::protobuf::tsp::{ArchiveInfo, MessageInfo};

/// Identifier used when an `ArchiveInfo` carries none
pub const DEFAULT_IDENTIFIER: u64 = 0;

/// Read the next record header.
///
/// Returns `Ok(None)` when the stream ends cleanly before a new record.
pub fn read_archive_info<R: Read>(reader: &mut R) -> Result<Option<ArchiveInfo>> {
    let Some(length) = varint::try_decode_varint(reader)? else {
        return Ok(None);
    };

    let mut data = Vec::new();
    reader.take(length).read_to_end(&mut data)?;
    if (data.len() as u64) < length {
        return Err(Error::Format(format!(
            "ArchiveInfo truncated: expected {} bytes, got {}",
            length,
            data.len()
        )));
    }

    Ok(Some(ArchiveInfo::decode(data.as_slice())?))
}

/// Identifier of the object described by a record header
pub fn object_id(info: &ArchiveInfo) -> u64 {
    info.identifier.unwrap_or(DEFAULT_IDENTIFIER)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::iwa::varint::encode_varint;
    use std::io::Cursor;

    fn record(info: &ArchiveInfo) -> Vec<u8> {
        let body = info.encode_to_vec();
        let mut out = encode_varint(body.len() as u64);
        out.extend_from_slice(&body);
        out
    }

    #[test]
    fn test_read_two_records() {
        let first = ArchiveInfo {
            identifier: Some(7),
            message_infos: vec![MessageInfo {
                r#type: 2001,
                length: 0,
                ..Default::default()
            }],
            ..Default::default()
        };
        let second = ArchiveInfo {
            identifier: Some(8),
            ..Default::default()
        };

        let mut data = record(&first);
        data.extend(record(&second));
        let mut cursor = Cursor::new(data);

        let info = read_archive_info(&mut cursor).unwrap().unwrap();
        assert_eq!(object_id(&info), 7);
        assert_eq!(info.message_infos[0].r#type, 2001);
        let info = read_archive_info(&mut cursor).unwrap().unwrap();
        assert_eq!(object_id(&info), 8);
        assert!(read_archive_info(&mut cursor).unwrap().is_none());
    }

    #[test]
    fn test_missing_identifier_defaults_to_zero() {
        let info = ArchiveInfo::default();
        assert_eq!(object_id(&info), DEFAULT_IDENTIFIER);
    }

    #[test]
    fn test_truncated_header_is_format_error() {
        let mut data = encode_varint(10);
        data.extend_from_slice(&[0x08, 0x01]);
        let err = read_archive_info(&mut Cursor::new(data)).unwrap_err();
        assert!(matches!(err, Error::Format(_)));
    }
}
