//! Container navigation: file header, schema, table directory, and the
//! per-table record-offset scan.

use std::collections::HashMap;

use crate::byte_reader::{ByteReader, Decode};
use crate::error::FormatError;
use crate::structs::{DatabaseHeader, SchemaHeader, TableHeader};

/// A loaded keychain file's raw bytes plus its parsed table directory.
///
/// Holds the whole file in memory — legacy keychains are small (tens to a
/// few hundred kilobytes), so there is no streaming concern here.
pub struct KeychainFile {
    data: Vec<u8>,
    pub header: DatabaseHeader,
    /// Whether the file's leading 4 bytes matched `"kych"`. A mismatch is a
    /// warning, not an abort — the navigator still attempts to parse the
    /// rest of the file on the chance it is a valid keychain with a
    /// corrupted magic.
    pub signature_valid: bool,
    table_offsets: HashMap<u32, usize>,
}

/// A table's header plus the absolute byte offset of every record it holds.
pub struct TableView {
    pub offset: usize,
    pub header: TableHeader,
    pub record_offsets: Vec<usize>,
}

impl KeychainFile {
    pub fn load(data: Vec<u8>) -> Result<Self, FormatError> {
        let reader = ByteReader::new(&data);
        let header = DatabaseHeader::decode(&reader, 0)?;
        let signature_valid = header.is_valid_signature();
        if !signature_valid {
            tracing::warn!("keychain file missing \"kych\" signature; attempting to parse anyway");
        }

        let schema_base = header.schema_offset as usize;
        let schema = SchemaHeader::decode(&reader, schema_base)?;

        let mut table_offsets = HashMap::with_capacity(schema.table_count as usize);
        let directory_base = schema_base + SchemaHeader::SIZE;
        let header_size = header.header_size as usize;
        for i in 0..schema.table_count as usize {
            let relative = reader.u32_be(directory_base + i * 4)?;
            let table_offset = header_size + relative as usize;
            let table_header = TableHeader::decode(&reader, table_offset)?;
            table_offsets.insert(table_header.table_id, table_offset);
        }

        Ok(Self {
            data,
            header,
            signature_valid,
            table_offsets,
        })
    }

    pub fn reader(&self) -> ByteReader<'_> {
        ByteReader::new(&self.data)
    }

    pub fn table_ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.table_offsets.keys().copied()
    }

    /// Absolute offset of the DB blob, located at a fixed 0x38 displacement
    /// into the metadata table's record area — the DB blob is not addressed
    /// through the usual record-offset scan.
    pub fn db_blob_addr(&self, metadata_table_id: u32) -> Result<usize, FormatError> {
        let table = self.table(metadata_table_id)?;
        Ok(table.offset + 0x38)
    }

    pub fn table(&self, table_id: u32) -> Result<TableView, FormatError> {
        let offset = *self
            .table_offsets
            .get(&table_id)
            .ok_or_else(|| FormatError::TableNotFound {
                table_id: format!("{table_id:#010x}"),
            })?;
        let reader = self.reader();
        let header = TableHeader::decode(&reader, offset)?;
        let record_offsets = scan_record_offsets(&reader, offset, &header);
        Ok(TableView {
            offset,
            header,
            record_offsets,
        })
    }
}

/// Walks the variable-length record-offset table that follows a table
/// header: each slot is a 4-byte big-endian offset relative to the table's
/// own start. A zero or non-4-aligned slot is a free slot, not a record,
/// and is skipped. Stops once `record_count` records have been found or the
/// table's declared size is exhausted — the latter bound exists only to
/// protect against a corrupt or hostile file; a well-formed keychain always
/// satisfies `record_count` before running out of table.
fn scan_record_offsets(reader: &ByteReader<'_>, table_offset: usize, header: &TableHeader) -> Vec<usize> {
    let mut offsets = Vec::with_capacity(header.record_count as usize);
    let limit = (table_offset + header.table_size as usize).min(reader.len());
    let mut cursor = table_offset + TableHeader::SIZE;

    while offsets.len() < header.record_count as usize && cursor + 4 <= limit {
        if let Ok(atom) = reader.u32_be(cursor) {
            if atom != 0 && atom % 4 == 0 {
                offsets.push(table_offset + atom as usize);
            }
        }
        cursor += 4;
    }

    offsets
}
