//! CSV node and edge tables.

use csv::{Reader, Writer};
use std::collections::BTreeSet;
use std::io::{Read, Write};
use std::path::Path;
use tracing::debug;

use crate::attr::{AttrValue, Record};
use crate::error::Result;

/// Columns read verbatim as text; everything else is type-inferred.
pub const KEY_COLUMNS: [&str; 4] = ["id", "label", "source", "target"];

pub fn read_records(path: &Path) -> Result<Vec<Record>> {
    debug!("Reading records from: {}", path.display());
    let reader = Reader::from_path(path)?;
    read_from(reader)
}

pub fn read_records_from(input: impl Read) -> Result<Vec<Record>> {
    read_from(Reader::from_reader(input))
}

fn read_from<R: Read>(mut reader: Reader<R>) -> Result<Vec<Record>> {
    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_lowercase())
        .collect();

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        let mut record = Record::new();
        for (column, cell) in headers.iter().zip(row.iter()) {
            if cell.is_empty() {
                continue;
            }
            let value = if KEY_COLUMNS.contains(&column.as_str()) {
                AttrValue::Text(cell.to_string())
            } else {
                AttrValue::infer(cell)
            };
            record.insert(column, value);
        }
        records.push(record);
    }
    debug!("Read {} records ({} columns)", records.len(), headers.len());
    Ok(records)
}

pub fn write_records(path: &Path, records: &[Record]) -> Result<()> {
    debug!("Writing {} records to: {}", records.len(), path.display());
    let writer = Writer::from_path(path)?;
    write_to(writer, records)
}

pub fn write_records_to(output: impl Write, records: &[Record]) -> Result<()> {
    write_to(Writer::from_writer(output), records)
}

/// Header is the union of all columns, key columns first.
fn write_to<W: Write>(mut writer: Writer<W>, records: &[Record]) -> Result<()> {
    let all: BTreeSet<&str> = records.iter().flat_map(Record::columns).collect();
    let mut header: Vec<&str> = KEY_COLUMNS.iter().copied().filter(|c| all.contains(c)).collect();
    header.extend(all.iter().copied().filter(|c| !KEY_COLUMNS.contains(c)));

    writer.write_record(&header)?;
    for record in records {
        let row: Vec<String> = header
            .iter()
            .map(|c| record.get(c).map(AttrValue::to_string).unwrap_or_default())
            .collect();
        writer.write_record(&row)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_mixed_case_headers_and_types() {
        let csv = "Id,Label,Size\n007,Bond,1.5\n2,Two,\n";
        let records = read_records_from(csv.as_bytes()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("id"), Some(&AttrValue::from("007")));
        assert_eq!(records[0].get("size"), Some(&AttrValue::Float(1.5)));
        assert!(!records[1].contains("size"));
    }

    #[test]
    fn edge_columns_infer_weight() {
        let csv = "Source,Target,Weight,Type\nNED,ROBERT,192,Undirected\n";
        let records = read_records_from(csv.as_bytes()).unwrap();
        assert_eq!(records[0].get("weight"), Some(&AttrValue::Int(192)));
        assert_eq!(records[0].get("type"), Some(&AttrValue::from("Undirected")));
    }

    #[test]
    fn write_puts_key_columns_first() {
        let records = vec![
            Record::new().with("weight", 3).with("source", "a").with("target", "b"),
            Record::new().with("source", "b").with("target", "c").with("note", "x"),
        ];
        let mut out = Vec::new();
        write_records_to(&mut out, &records).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "source,target,note,weight\na,b,,3\nb,c,x,\n");
    }
}
