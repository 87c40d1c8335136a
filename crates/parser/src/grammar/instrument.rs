use models::CatalogKind;

use super::{leaf, reference_entries, split, take_roots, Grammar, SubObjects};
use crate::ast::Label;
use crate::error::ParseError;
use crate::objects::{CatalogObject, Instrument};

/// `OBJECT = INSTRUMENT`: one `INSTRUMENT_INFORMATION` (some authors
/// abbreviate it `INSTINFO`) and any number of reference entries
/// (`INSTRUMENT_REFERENCE_INFO` / `INSTREFINFO`).
pub struct InstrumentGrammar;

impl Grammar for InstrumentGrammar {
    fn kind(&self) -> CatalogKind {
        CatalogKind::Instrument
    }

    fn root_names(&self) -> &'static [&'static str] {
        &["INSTRUMENT"]
    }

    fn parse(&self, label: &Label, file: &str) -> Result<CatalogObject, ParseError> {
        let (header, mut roots) = take_roots(label, file, self)?;
        let root = roots.remove(0);

        let (properties, children) = split(&root.statements);
        let mut sub = SubObjects::new(file, self.kind(), children);
        let mut opaque = Vec::new();

        let information = leaf(
            sub.take_one(&["INSTRUMENT_INFORMATION", "INSTINFO"], "INSTRUMENT_INFORMATION")?,
            &mut opaque,
        );
        let references = reference_entries(
            sub.take_many(&["INSTRUMENT_REFERENCE_INFO", "INSTREFINFO"]),
            &mut opaque,
        );
        opaque.extend(sub.into_opaque());

        Ok(CatalogObject::Instrument(Instrument {
            header,
            properties,
            information,
            references,
            opaque,
        }))
    }
}
