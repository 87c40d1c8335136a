use models::CatalogKind;

use super::{leaf, reference_entries, split, take_roots, Grammar, SubObjects};
use crate::ast::Label;
use crate::error::ParseError;
use crate::objects::{CatalogObject, InstrumentHost};

/// `OBJECT = INSTRUMENT_HOST`: one `INSTRUMENT_HOST_INFORMATION` and any
/// number of `INSTRUMENT_HOST_REFERENCE_INFO` entries.
pub struct InstrumentHostGrammar;

impl Grammar for InstrumentHostGrammar {
    fn kind(&self) -> CatalogKind {
        CatalogKind::InstrumentHost
    }

    fn root_names(&self) -> &'static [&'static str] {
        &["INSTRUMENT_HOST"]
    }

    fn parse(&self, label: &Label, file: &str) -> Result<CatalogObject, ParseError> {
        let (header, mut roots) = take_roots(label, file, self)?;
        let root = roots.remove(0);

        let (properties, children) = split(&root.statements);
        let mut sub = SubObjects::new(file, self.kind(), children);
        let mut opaque = Vec::new();

        let information = leaf(
            sub.take_one(
                &["INSTRUMENT_HOST_INFORMATION"],
                "INSTRUMENT_HOST_INFORMATION",
            )?,
            &mut opaque,
        );
        let references = reference_entries(
            sub.take_many(&["INSTRUMENT_HOST_REFERENCE_INFO"]),
            &mut opaque,
        );
        opaque.extend(sub.into_opaque());

        Ok(CatalogObject::InstrumentHost(InstrumentHost {
            header,
            properties,
            information,
            references,
            opaque,
        }))
    }
}
