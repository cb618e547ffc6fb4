//! CSV interchange: `group,message` rows, one per stored message.

use crate::config::ALL_MESSAGES;
use crate::error::{BuddyError, Result};
use crate::models::Groups;
use serde::Serialize;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

const GROUP_COLUMN: &str = "group";
const MESSAGE_COLUMN: &str = "message";

#[derive(Debug, Serialize)]
struct Row<'a> {
    group: &'a str,
    message: &'a str,
}

/// How imported rows combine with the data already in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportMode {
    /// Layer rows on top of the existing groups.
    Merge,
    /// Start from an empty store.
    Replace,
}

/// Result of reading a CSV file.
///
/// `groups` holds whatever was applied before `error` stopped the read, so
/// the caller can decide whether a partial import is worth committing.
#[derive(Debug)]
pub struct CsvImport {
    pub groups: Groups,
    pub added: usize,
    pub skipped_blank: usize,
    pub skipped_duplicate: usize,
    /// Rows naming the virtual group, which cannot hold messages.
    pub skipped_reserved: usize,
    pub error: Option<BuddyError>,
}

impl CsvImport {
    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }

    /// The imported groups, or the error that interrupted the read.
    pub fn into_result(self) -> Result<Groups> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.groups),
        }
    }

    pub fn summary(&self) -> String {
        let mut summary = format!(
            "{} added, {} duplicates skipped, {} rows without group skipped",
            self.added, self.skipped_duplicate, self.skipped_blank
        );
        if self.skipped_reserved > 0 {
            summary.push_str(&format!(
                ", {} rows for '{}' skipped",
                self.skipped_reserved, ALL_MESSAGES
            ));
        }
        summary
    }
}

/// Write every (group, message) pair to `writer`, in store order.
///
/// Records end in CRLF; line breaks inside a message are kept verbatim in a
/// quoted field.
pub fn write_csv<W: Write>(groups: &Groups, writer: W) -> Result<()> {
    // The header is written by hand so an empty store still gets one
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .terminator(csv::Terminator::CRLF)
        .from_writer(writer);
    csv_writer.write_record([GROUP_COLUMN, MESSAGE_COLUMN])?;
    for (name, messages) in groups {
        if name == ALL_MESSAGES {
            continue;
        }
        for message in messages {
            csv_writer.serialize(Row {
                group: name,
                message,
            })?;
        }
    }
    csv_writer.flush()?;
    Ok(())
}

pub fn export_csv(groups: &Groups, path: &Path) -> Result<()> {
    let file = File::create(path)?;
    write_csv(groups, file)?;
    tracing::info!("exported {} groups to {}", groups.len(), path.display());
    Ok(())
}

/// Read rows from `reader` on top of `existing` (or on nothing, in replace mode).
///
/// Fails with `Format` before touching anything if either required column is
/// missing from the header.
pub fn read_csv<R: Read>(reader: R, existing: &Groups, mode: ImportMode) -> Result<CsvImport> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    let column = |wanted: &str| {
        headers
            .iter()
            .position(|header| header.trim_start_matches('\u{feff}') == wanted)
    };
    let (group_idx, message_idx) = match (column(GROUP_COLUMN), column(MESSAGE_COLUMN)) {
        (Some(group_idx), Some(message_idx)) => (group_idx, message_idx),
        _ => {
            return Err(BuddyError::Format(format!(
                "the header must contain the columns: {},{}",
                GROUP_COLUMN, MESSAGE_COLUMN
            )))
        }
    };

    let mut import = CsvImport {
        groups: match mode {
            ImportMode::Merge => existing.clone(),
            ImportMode::Replace => Groups::new(),
        },
        added: 0,
        skipped_blank: 0,
        skipped_duplicate: 0,
        skipped_reserved: 0,
        error: None,
    };

    for record in csv_reader.records() {
        let record = match record {
            Ok(record) => record,
            Err(err) => {
                tracing::warn!("CSV import stopped after {} rows: {}", import.added, err);
                import.error = Some(err.into());
                break;
            }
        };

        let group = record.get(group_idx).unwrap_or_default().trim();
        if group.is_empty() {
            import.skipped_blank += 1;
            continue;
        }
        if group == ALL_MESSAGES {
            import.skipped_reserved += 1;
            continue;
        }
        let message = record.get(message_idx).unwrap_or_default();

        let messages = import.groups.entry(group.to_string()).or_default();
        if messages.iter().any(|existing| existing == message) {
            import.skipped_duplicate += 1;
        } else {
            messages.push(message.to_string());
            import.added += 1;
        }
    }

    import.groups.shift_remove(ALL_MESSAGES);
    Ok(import)
}

pub fn import_csv(path: &Path, existing: &Groups, mode: ImportMode) -> Result<CsvImport> {
    let file = File::open(path)?;
    let import = read_csv(file, existing, mode)?;
    tracing::info!(
        "read {} ({:?}): {}",
        path.display(),
        mode,
        import.summary()
    );
    Ok(import)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn groups(pairs: &[(&str, &[&str])]) -> Groups {
        pairs
            .iter()
            .map(|(name, messages)| {
                (
                    name.to_string(),
                    messages.iter().map(|m| m.to_string()).collect(),
                )
            })
            .collect()
    }

    fn export_to_string(data: &Groups) -> String {
        let mut buffer = Vec::new();
        write_csv(data, &mut buffer).unwrap();
        String::from_utf8(buffer).unwrap()
    }

    #[test]
    fn export_quotes_delimiters_and_line_breaks() {
        let mut data = groups(&[(
            "Ventas",
            &["hola, qué tal", "línea 1\nlínea 2", "dijo \"sí\""],
        )]);
        data.insert(ALL_MESSAGES.to_string(), vec!["never".to_string()]);
        let csv_text = export_to_string(&data);
        assert_eq!(
            csv_text,
            "group,message\r\n\
             Ventas,\"hola, qué tal\"\r\n\
             Ventas,\"línea 1\nlínea 2\"\r\n\
             Ventas,\"dijo \"\"sí\"\"\"\r\n"
        );
    }

    #[test]
    fn empty_store_exports_only_the_header() {
        assert_eq!(export_to_string(&Groups::new()), "group,message\r\n");
    }

    #[test]
    fn export_then_import_replace_reproduces_the_data() {
        let data = groups(&[("b", &["x", "y,z"]), ("a", &["multi\r\nline"])]);
        let csv_text = export_to_string(&data);
        let import = read_csv(csv_text.as_bytes(), &Groups::new(), ImportMode::Replace).unwrap();
        assert!(import.is_complete());
        assert_eq!(import.groups, data);
    }

    #[test]
    fn missing_header_is_a_format_error() {
        let existing = groups(&[("General", &["keep"])]);
        let err = read_csv("grupo,mensaje\nA,b\n".as_bytes(), &existing, ImportMode::Replace)
            .unwrap_err();
        assert!(matches!(err, BuddyError::Format(_)));
        let err = read_csv("group\nA\n".as_bytes(), &existing, ImportMode::Merge).unwrap_err();
        assert!(matches!(err, BuddyError::Format(_)));
    }

    #[test]
    fn merge_dedups_within_a_group_only() {
        let existing = groups(&[("Ventas", &["old", "hi"]), ("General", &["g"])]);
        let csv_text = "group,message\nVentas,hi\nVentas,hi\nGeneral,hi\n";
        let import = read_csv(csv_text.as_bytes(), &existing, ImportMode::Merge).unwrap();
        assert_eq!(import.groups["Ventas"], vec!["old", "hi"]);
        assert_eq!(import.groups["General"], vec!["g", "hi"]);
        assert_eq!(import.added, 1);
        assert_eq!(import.skipped_duplicate, 2);
    }

    #[test]
    fn replace_discards_groups_absent_from_the_file() {
        let existing = groups(&[("Ventas", &["hi"]), ("General", &["g"])]);
        let csv_text = "group,message\nVentas,hi\nVentas,hi\n";
        let import = read_csv(csv_text.as_bytes(), &existing, ImportMode::Replace).unwrap();
        assert_eq!(import.groups, groups(&[("Ventas", &["hi"])]));
    }

    #[test]
    fn blank_groups_are_skipped_and_names_trimmed() {
        let csv_text = "message,group,extra\nignored,  ,x\nkept,  Soporte  ,y\nshort\n";
        let import = read_csv(csv_text.as_bytes(), &Groups::new(), ImportMode::Replace).unwrap();
        assert_eq!(import.groups, groups(&[("Soporte", &["kept"])]));
        assert_eq!(import.skipped_blank, 2);
    }

    #[test]
    fn virtual_group_rows_are_stripped() {
        let csv_text = "group,message\nTodos Los mensajes,x\nReal,y\n";
        let import = read_csv(csv_text.as_bytes(), &Groups::new(), ImportMode::Merge).unwrap();
        assert!(!import.groups.contains_key(ALL_MESSAGES));
        assert_eq!(import.groups["Real"], vec!["y"]);
        assert_eq!(import.added, 1);
        assert_eq!(import.skipped_reserved, 1);
        assert!(import.summary().contains("1 added"));
        assert!(import.summary().contains("1 rows for 'Todos Los mensajes' skipped"));
    }

    #[test]
    fn byte_order_mark_before_the_header_is_ignored() {
        let csv_text = "\u{feff}group,message\nA,b\n";
        let import = read_csv(csv_text.as_bytes(), &Groups::new(), ImportMode::Replace).unwrap();
        assert_eq!(import.groups["A"], vec!["b"]);
    }

    #[test]
    fn malformed_row_keeps_the_partial_result() {
        let mut bytes = b"group,message\nA,first\nA,".to_vec();
        bytes.extend_from_slice(&[0xff, 0xfe]);
        bytes.extend_from_slice(b"\nA,third\n");
        let import = read_csv(bytes.as_slice(), &Groups::new(), ImportMode::Replace).unwrap();
        assert!(!import.is_complete());
        assert_eq!(import.groups["A"], vec!["first"]);
        assert!(import.into_result().is_err());
    }

    #[test]
    fn files_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snippets.csv");
        let data = groups(&[("General", &["¡Gracias por tu compra!"])]);
        export_csv(&data, &path).unwrap();
        let import = import_csv(&path, &Groups::new(), ImportMode::Merge).unwrap();
        assert_eq!(import.into_result().unwrap(), data);
    }
}
