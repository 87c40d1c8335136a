use models::CatalogKind;

use super::{leaf, split, take_roots, ChildBlock, Grammar, SubObjects};
use crate::ast::Label;
use crate::error::ParseError;
use crate::objects::{CatalogObject, Directory, OpaqueBlock, VolumeDescriptor};

/// `OBJECT = VOLUME`: one `DATA_PRODUCER`, one `CATALOG` (the pointers to
/// the other catalog files), an optional `DATA_SUPPLIER`, and any number
/// of `FILE` and recursively nested `DIRECTORY` entries.
pub struct VolumeGrammar;

impl Grammar for VolumeGrammar {
    fn kind(&self) -> CatalogKind {
        CatalogKind::VolumeDescriptor
    }

    fn root_names(&self) -> &'static [&'static str] {
        &["VOLUME"]
    }

    fn parse(&self, label: &Label, file: &str) -> Result<CatalogObject, ParseError> {
        let (header, mut roots) = take_roots(label, file, self)?;
        let root = roots.remove(0);

        let (properties, children) = split(&root.statements);
        let mut sub = SubObjects::new(file, self.kind(), children);
        let mut opaque = Vec::new();

        let data_producer = leaf(sub.take_one(&["DATA_PRODUCER"], "DATA_PRODUCER")?, &mut opaque);
        let catalog = leaf(sub.take_one(&["CATALOG"], "CATALOG")?, &mut opaque);
        let data_supplier = sub
            .take_at_most_one(&["DATA_SUPPLIER"], "DATA_SUPPLIER")?
            .map(|block| leaf(block, &mut opaque));
        let files = sub
            .take_many(&["FILE"])
            .into_iter()
            .map(|block| leaf(block, &mut opaque))
            .collect();
        let directories = sub
            .take_many(&["DIRECTORY"])
            .into_iter()
            .map(|block| directory(block, file, &mut opaque))
            .collect();
        opaque.extend(sub.into_opaque());

        Ok(CatalogObject::VolumeDescriptor(VolumeDescriptor {
            header,
            properties,
            data_producer,
            catalog,
            data_supplier,
            files,
            directories,
            opaque,
        }))
    }
}

fn directory(block: ChildBlock, file: &str, opaque: &mut Vec<OpaqueBlock>) -> Directory {
    let (properties, children) = split(&block.statements);
    let mut sub = SubObjects::new(file, CatalogKind::VolumeDescriptor, children);
    let files = sub
        .take_many(&["FILE"])
        .into_iter()
        .map(|b| leaf(b, opaque))
        .collect();
    let directories = sub
        .take_many(&["DIRECTORY"])
        .into_iter()
        .map(|b| directory(b, file, opaque))
        .collect();
    opaque.extend(sub.into_opaque());
    Directory { properties, files, directories }
}
