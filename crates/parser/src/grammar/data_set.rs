use models::CatalogKind;

use super::{leaf, reference_entries, split, take_roots, Grammar, SubObjects};
use crate::ast::Label;
use crate::error::ParseError;
use crate::objects::{CatalogObject, DataSet};

/// `OBJECT = DATA_SET`: one `DATA_SET_INFORMATION`, one or more
/// `DATA_SET_TARGET`, one `DATA_SET_HOST`, one `DATA_SET_MISSION`, and any
/// number of `DATA_SET_REFERENCE_INFORMATION` entries.
pub struct DataSetGrammar;

impl Grammar for DataSetGrammar {
    fn kind(&self) -> CatalogKind {
        CatalogKind::DataSet
    }

    fn root_names(&self) -> &'static [&'static str] {
        &["DATA_SET"]
    }

    fn parse(&self, label: &Label, file: &str) -> Result<CatalogObject, ParseError> {
        let (header, mut roots) = take_roots(label, file, self)?;
        let root = roots.remove(0);

        let (properties, children) = split(&root.statements);
        let mut sub = SubObjects::new(file, self.kind(), children);
        let mut opaque = Vec::new();

        let information = leaf(
            sub.take_one(&["DATA_SET_INFORMATION"], "DATA_SET_INFORMATION")?,
            &mut opaque,
        );
        let targets = sub
            .take_one_or_more(&["DATA_SET_TARGET"], "DATA_SET_TARGET")?
            .into_iter()
            .map(|block| leaf(block, &mut opaque))
            .collect();
        let host = leaf(sub.take_one(&["DATA_SET_HOST"], "DATA_SET_HOST")?, &mut opaque);
        let mission = leaf(
            sub.take_one(&["DATA_SET_MISSION"], "DATA_SET_MISSION")?,
            &mut opaque,
        );
        let references = reference_entries(
            sub.take_many(&["DATA_SET_REFERENCE_INFORMATION"]),
            &mut opaque,
        );
        opaque.extend(sub.into_opaque());

        Ok(CatalogObject::DataSet(DataSet {
            header,
            properties,
            information,
            targets,
            host,
            mission,
            references,
            opaque,
        }))
    }
}
