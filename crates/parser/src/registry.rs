//! The parser factory: picks the grammar for a file from its filename,
//! falling back to the root `OBJECT = …` name, and finally probing every
//! grammar in a fixed order.

use std::path::Path;

use models::CatalogKind;

use crate::ast::{parse_label, Label, Statement};
use crate::error::ParseError;
use crate::grammar::{grammar_for, GRAMMARS};
use crate::objects::CatalogObject;

/// Parses a catalog file from disk.
pub fn parse_file(path: &Path) -> Result<CatalogObject, ParseError> {
    let text = std::fs::read_to_string(path).map_err(|source| ParseError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());
    parse_str(&text, &filename)
}

/// Parses catalog text. `filename` drives grammar selection and appears in
/// errors.
#[tracing::instrument(level = "debug", skip(text))]
pub fn parse_str(text: &str, filename: &str) -> Result<CatalogObject, ParseError> {
    let label = parse_label(text, filename)?;

    // First choice: the filename heuristic.
    if let Some(kind) = CatalogKind::from_filename(filename) {
        match grammar_for(kind).parse(&label, filename) {
            Ok(object) => return Ok(object),
            Err(err) => {
                tracing::debug!(
                    filename,
                    %kind,
                    error = %err,
                    "filename heuristic grammar rejected the file; probing others"
                );
            }
        }
    }

    // Second choice: the root object's own name.
    let root = root_object_name(&label);
    if let Some(root_name) = root.as_deref() {
        for grammar in GRAMMARS {
            if grammar.root_names().iter().any(|n| root_name.eq_ignore_ascii_case(n)) {
                match grammar.parse(&label, filename) {
                    Ok(object) => return Ok(object),
                    Err(err) => {
                        tracing::debug!(filename, error = %err, "root-name grammar rejected the file");
                        break;
                    }
                }
            }
        }
    }

    // Last resort: probe every grammar in registry order, first success
    // wins.
    for grammar in GRAMMARS {
        if let Ok(object) = grammar.parse(&label, filename) {
            return Ok(object);
        }
    }

    Err(ParseError::UnknownKind {
        file: filename.to_string(),
        root: root.unwrap_or_else(|| "none".to_string()),
    })
}

fn root_object_name(label: &Label) -> Option<String> {
    label.statements.iter().find_map(|s| match s {
        Statement::Object { name, .. } => Some(name.clone()),
        _ => None,
    })
}

#[cfg(test)]
mod test {
    use super::*;

    const MINIMAL_INSTRUMENT: &str = r#"
PDS_VERSION_ID = PDS3

OBJECT = INSTRUMENT
  INSTRUMENT_HOST_ID = MGS
  INSTRUMENT_ID = MOLA

  OBJECT = INSTRUMENT_INFORMATION
    INSTRUMENT_NAME = "MARS ORBITER LASER ALTIMETER"
  END_OBJECT = INSTRUMENT_INFORMATION
END_OBJECT = INSTRUMENT
END
"#;

    #[test]
    fn filename_heuristic_selects_the_grammar() {
        let object = parse_str(MINIMAL_INSTRUMENT, "INST.CAT").unwrap();
        assert_eq!(CatalogKind::Instrument, object.kind());
        assert_eq!("MGS/MOLA", object.identifier());
    }

    #[test]
    fn root_object_name_rescues_an_unhelpful_filename() {
        let object = parse_str(MINIMAL_INSTRUMENT, "CATALOG_A7.TXT").unwrap();
        assert_eq!(CatalogKind::Instrument, object.kind());
    }

    #[test]
    fn alias_sub_objects_are_accepted() {
        let text = r#"
PDS_VERSION_ID = PDS3
OBJECT = INSTRUMENT
  INSTRUMENT_HOST_ID = MGS
  INSTRUMENT_ID = MOLA
  OBJECT = INSTINFO
    INSTRUMENT_NAME = "MARS ORBITER LASER ALTIMETER"
  END_OBJECT = INSTINFO
  OBJECT = INSTREFINFO
    REFERENCE_KEY_ID = "ZUBERETAL1992"
  END_OBJECT = INSTREFINFO
END_OBJECT = INSTRUMENT
END
"#;
        let object = parse_str(text, "INST.CAT").unwrap();
        assert_eq!(vec!["ZUBERETAL1992"], object.reference_keys());
    }

    #[test]
    fn unrecognizable_files_name_their_root() {
        let err = parse_str("PDS_VERSION_ID = PDS3\nOBJECT = TABLE\nEND_OBJECT = TABLE\nEND\n", "weird.cat")
            .unwrap_err();
        assert!(err.to_string().contains("TABLE"), "{err}");
    }
}
