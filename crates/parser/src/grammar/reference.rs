use models::CatalogKind;

use super::{leaf, take_roots, Grammar};
use crate::ast::Label;
use crate::error::ParseError;
use crate::objects::{CatalogObject, ReferenceEntry, ReferenceList};

/// A reference file carries one or more keyword-only `OBJECT = REFERENCE`
/// records.
pub struct ReferenceGrammar;

impl Grammar for ReferenceGrammar {
    fn kind(&self) -> CatalogKind {
        CatalogKind::Reference
    }

    fn root_names(&self) -> &'static [&'static str] {
        &["REFERENCE"]
    }

    fn parse(&self, label: &Label, file: &str) -> Result<CatalogObject, ParseError> {
        let (header, roots) = take_roots(label, file, self)?;

        let mut opaque = Vec::new();
        let records: Vec<ReferenceEntry> = roots
            .into_iter()
            .map(|root| ReferenceEntry { properties: leaf(root, &mut opaque) })
            .collect();

        Ok(CatalogObject::Reference(ReferenceList { header, records, opaque }))
    }
}
