//! Builders for synthetic iWork containers

use std::io::{Cursor, Write};

use prost::Message;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::iwa::archive::{ArchiveInfo, MessageInfo};
use crate::iwa::snappy::STREAM_MAGIC;
use crate::iwa::snappy::tests::{compressed_frame, frame};
use crate::iwa::varint::encode_varint;

/// Accumulates records of a decompressed IWA stream
#[derive(Default)]
pub(crate) struct IwaBuilder {
    data: Vec<u8>,
}

impl IwaBuilder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Append a record holding one encoded message
    pub(crate) fn object(self, id: u64, message_type: u32, message: &impl Message) -> Self {
        self.raw(id, message_type, message.encode_to_vec())
    }

    /// Append a record whose payload is taken verbatim
    pub(crate) fn raw(self, id: u64, message_type: u32, payload: Vec<u8>) -> Self {
        self.record(id, &[(message_type, payload)])
    }

    /// Append a record holding several messages
    pub(crate) fn record(mut self, id: u64, messages: &[(u32, Vec<u8>)]) -> Self {
        let info = ArchiveInfo {
            identifier: Some(id),
            message_infos: messages
                .iter()
                .map(|(message_type, payload)| MessageInfo {
                    r#type: *message_type,
                    length: payload.len() as u32,
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        };
        let header = info.encode_to_vec();
        self.data.extend(encode_varint(header.len() as u64));
        self.data.extend(header);
        for (_, payload) in messages {
            self.data.extend_from_slice(payload);
        }
        self
    }

    /// Frame the stream as a compressed `.iwa` member
    pub(crate) fn build(self) -> Vec<u8> {
        let mut out = frame(0xFF, &STREAM_MAGIC);
        out.extend(compressed_frame(&self.data));
        out
    }
}

/// Stored zip archive; names ending in `/` become directory entries
pub(crate) fn zip_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    for (name, data) in entries {
        if name.ends_with('/') {
            writer.add_directory(*name, options).unwrap();
        } else {
            writer.start_file(*name, options).unwrap();
            writer.write_all(data).unwrap();
        }
    }
    writer.finish().unwrap().into_inner()
}

/// Deflated zip written in streaming mode, so every entry defers its sizes
/// to a trailing data descriptor
pub(crate) fn streamed_zip_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut out = Vec::new();
    let mut writer = ZipWriter::new_stream(&mut out);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    for (name, data) in entries {
        writer.start_file(*name, options).unwrap();
        writer.write_all(data).unwrap();
    }
    writer.finish().unwrap();
    out
}

/// Single-file document with `<document>/Index.zip`
pub(crate) fn nested_document(document: &str, members: &[(&str, &[u8])]) -> Vec<u8> {
    let index = zip_bytes(members);
    let name = format!("{}/Index.zip", document);
    zip_bytes(&[(name.as_str(), index.as_slice())])
}

/// Single-file document with members flattened under `Index/`
pub(crate) fn flat_document(members: &[(&str, &[u8])]) -> Vec<u8> {
    let names: Vec<String> = members.iter().map(|(name, _)| format!("Index/{}", name)).collect();
    let entries: Vec<(&str, &[u8])> = names
        .iter()
        .zip(members)
        .map(|(name, (_, data))| (name.as_str(), *data))
        .collect();
    zip_bytes(&entries)
}
