use models::CatalogKind;

use super::{reference_entries, split, take_roots, Grammar, SubObjects};
use crate::ast::Label;
use crate::error::ParseError;
use crate::objects::{CatalogObject, DataSetMapProjection};

/// `OBJECT = DATA_SET_MAP_PROJECTION`: one `DATA_SET_MAP_PROJECTION_INFO`
/// which itself carries any number of `DS_MAP_PROJECTION_REF_INFO`
/// entries.
pub struct MapProjectionGrammar;

impl Grammar for MapProjectionGrammar {
    fn kind(&self) -> CatalogKind {
        CatalogKind::DataSetMapProjection
    }

    fn root_names(&self) -> &'static [&'static str] {
        &["DATA_SET_MAP_PROJECTION"]
    }

    fn parse(&self, label: &Label, file: &str) -> Result<CatalogObject, ParseError> {
        let (header, mut roots) = take_roots(label, file, self)?;
        let root = roots.remove(0);

        let (properties, children) = split(&root.statements);
        let mut sub = SubObjects::new(file, self.kind(), children);
        let mut opaque = Vec::new();

        let info_block = sub.take_one(
            &["DATA_SET_MAP_PROJECTION_INFO"],
            "DATA_SET_MAP_PROJECTION_INFO",
        )?;
        let (information, info_children) = split(&info_block.statements);
        let mut info_sub = SubObjects::new(file, self.kind(), info_children);
        let references = reference_entries(
            info_sub.take_many(&["DS_MAP_PROJECTION_REF_INFO"]),
            &mut opaque,
        );
        opaque.extend(info_sub.into_opaque());
        opaque.extend(sub.into_opaque());

        Ok(CatalogObject::DataSetMapProjection(DataSetMapProjection {
            header,
            properties,
            information,
            references,
            opaque,
        }))
    }
}
