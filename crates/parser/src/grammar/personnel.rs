use models::CatalogKind;

use super::{leaf, split, take_roots, Grammar, SubObjects};
use crate::ast::Label;
use crate::error::ParseError;
use crate::objects::{CatalogObject, Personnel, PersonnelRecord};

/// A personnel file carries one or more `OBJECT = PERSONNEL` records, each
/// with one `PERSONNEL_INFORMATION` and any number of
/// `PERSONNEL_ELECTRONIC_MAIL` entries.
pub struct PersonnelGrammar;

impl Grammar for PersonnelGrammar {
    fn kind(&self) -> CatalogKind {
        CatalogKind::Personnel
    }

    fn root_names(&self) -> &'static [&'static str] {
        &["PERSONNEL"]
    }

    fn parse(&self, label: &Label, file: &str) -> Result<CatalogObject, ParseError> {
        let (header, roots) = take_roots(label, file, self)?;

        let mut records = Vec::new();
        for root in roots {
            let (properties, children) = split(&root.statements);
            let mut sub = SubObjects::new(file, self.kind(), children);
            let mut opaque = Vec::new();

            let information = leaf(
                sub.take_one(&["PERSONNEL_INFORMATION"], "PERSONNEL_INFORMATION")?,
                &mut opaque,
            );
            let emails = sub
                .take_many(&["PERSONNEL_ELECTRONIC_MAIL"])
                .into_iter()
                .map(|block| leaf(block, &mut opaque))
                .collect();
            opaque.extend(sub.into_opaque());

            records.push(PersonnelRecord { properties, information, emails, opaque });
        }

        Ok(CatalogObject::Personnel(Personnel { header, records }))
    }
}
