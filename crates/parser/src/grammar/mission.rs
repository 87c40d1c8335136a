use models::CatalogKind;

use super::{leaf, reference_entries, split, take_roots, Grammar, SubObjects};
use crate::ast::Label;
use crate::error::ParseError;
use crate::objects::{CatalogObject, Mission, MissionHost};

/// `OBJECT = MISSION`: exactly one `MISSION_INFORMATION`, exactly one
/// `MISSION_HOST` carrying one or more `MISSION_TARGET`, and any number of
/// `MISSION_REFERENCE_INFORMATION` entries.
pub struct MissionGrammar;

impl Grammar for MissionGrammar {
    fn kind(&self) -> CatalogKind {
        CatalogKind::Mission
    }

    fn root_names(&self) -> &'static [&'static str] {
        &["MISSION"]
    }

    fn parse(&self, label: &Label, file: &str) -> Result<CatalogObject, ParseError> {
        let (header, mut roots) = take_roots(label, file, self)?;
        if roots.len() > 1 {
            tracing::warn!(file, "mission file carries multiple MISSION objects; using the first");
        }
        let root = roots.remove(0);

        let (properties, children) = split(&root.statements);
        let mut sub = SubObjects::new(file, self.kind(), children);
        let mut opaque = Vec::new();

        let information = leaf(
            sub.take_one(&["MISSION_INFORMATION"], "MISSION_INFORMATION")?,
            &mut opaque,
        );

        let host_block = sub.take_one(&["MISSION_HOST"], "MISSION_HOST")?;
        let (host_properties, host_children) = split(&host_block.statements);
        let mut host_sub = SubObjects::new(file, self.kind(), host_children);
        let targets = host_sub
            .take_one_or_more(&["MISSION_TARGET"], "MISSION_TARGET")?
            .into_iter()
            .map(|block| leaf(block, &mut opaque))
            .collect();
        opaque.extend(host_sub.into_opaque());

        let references = reference_entries(
            sub.take_many(&["MISSION_REFERENCE_INFORMATION"]),
            &mut opaque,
        );
        opaque.extend(sub.into_opaque());

        Ok(CatalogObject::Mission(Mission {
            header,
            properties,
            information,
            host: MissionHost { properties: host_properties, targets },
            references,
            opaque,
        }))
    }
}
