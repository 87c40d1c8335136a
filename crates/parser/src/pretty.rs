//! Writes a parsed catalog object back out as ODL text. The projection is
//! canonical rather than byte-preserving: keywords come out sorted and
//! re-indented, but parsing the projection yields an object equal to the
//! original, which is what the round-trip tests lean on.

use crate::objects::{
    CatalogObject, DataSet, DataSetMapProjection, Directory, Instrument, InstrumentHost, Mission,
    OpaqueBlock, Personnel, Properties, ReferenceList, VolumeDescriptor,
};
use crate::value::Value;

pub fn to_odl(object: &CatalogObject) -> String {
    let mut w = Writer::default();
    match object {
        CatalogObject::Mission(m) => mission(&mut w, m),
        CatalogObject::InstrumentHost(h) => instrument_host(&mut w, h),
        CatalogObject::Instrument(i) => instrument(&mut w, i),
        CatalogObject::DataSet(d) => data_set(&mut w, d),
        CatalogObject::DataSetMapProjection(p) => map_projection(&mut w, p),
        CatalogObject::Personnel(p) => personnel(&mut w, p),
        CatalogObject::Reference(r) => references(&mut w, r),
        CatalogObject::VolumeDescriptor(v) => volume(&mut w, v),
    }
    w.finish()
}

#[derive(Default)]
struct Writer {
    out: String,
    indent: usize,
}

impl Writer {
    fn line(&mut self, text: &str) {
        for _ in 0..self.indent {
            self.out.push_str("  ");
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn kv(&mut self, key: &str, value: &Value) {
        self.line(&format!("{key} = {value}"));
    }

    fn props(&mut self, properties: &Properties) {
        for (key, value) in properties.iter() {
            self.kv(key, value);
        }
    }

    fn open(&mut self, name: &str) {
        self.line(&format!("OBJECT = {name}"));
        self.indent += 1;
    }

    fn close(&mut self, name: &str) {
        self.indent -= 1;
        self.line(&format!("END_OBJECT = {name}"));
    }

    /// A leaf sub-object.
    fn block(&mut self, name: &str, properties: &Properties) {
        self.open(name);
        self.props(properties);
        self.close(name);
    }

    fn opaque(&mut self, blocks: &[OpaqueBlock]) {
        for block in blocks {
            self.open(&block.name);
            self.props(&block.properties);
            self.opaque(&block.blocks);
            self.close(&block.name);
        }
    }

    fn finish(mut self) -> String {
        self.line("END");
        self.out
    }
}

fn mission(w: &mut Writer, m: &Mission) {
    w.props(&m.header);
    w.open("MISSION");
    w.props(&m.properties);
    w.block("MISSION_INFORMATION", &m.information);
    w.open("MISSION_HOST");
    w.props(&m.host.properties);
    for target in &m.host.targets {
        w.block("MISSION_TARGET", target);
    }
    w.close("MISSION_HOST");
    for entry in &m.references {
        w.block("MISSION_REFERENCE_INFORMATION", &entry.properties);
    }
    w.opaque(&m.opaque);
    w.close("MISSION");
}

fn instrument_host(w: &mut Writer, h: &InstrumentHost) {
    w.props(&h.header);
    w.open("INSTRUMENT_HOST");
    w.props(&h.properties);
    w.block("INSTRUMENT_HOST_INFORMATION", &h.information);
    for entry in &h.references {
        w.block("INSTRUMENT_HOST_REFERENCE_INFO", &entry.properties);
    }
    w.opaque(&h.opaque);
    w.close("INSTRUMENT_HOST");
}

fn instrument(w: &mut Writer, i: &Instrument) {
    w.props(&i.header);
    w.open("INSTRUMENT");
    w.props(&i.properties);
    w.block("INSTRUMENT_INFORMATION", &i.information);
    for entry in &i.references {
        w.block("INSTRUMENT_REFERENCE_INFO", &entry.properties);
    }
    w.opaque(&i.opaque);
    w.close("INSTRUMENT");
}

fn data_set(w: &mut Writer, d: &DataSet) {
    w.props(&d.header);
    w.open("DATA_SET");
    w.props(&d.properties);
    w.block("DATA_SET_INFORMATION", &d.information);
    for target in &d.targets {
        w.block("DATA_SET_TARGET", target);
    }
    w.block("DATA_SET_HOST", &d.host);
    w.block("DATA_SET_MISSION", &d.mission);
    for entry in &d.references {
        w.block("DATA_SET_REFERENCE_INFORMATION", &entry.properties);
    }
    w.opaque(&d.opaque);
    w.close("DATA_SET");
}

fn map_projection(w: &mut Writer, p: &DataSetMapProjection) {
    w.props(&p.header);
    w.open("DATA_SET_MAP_PROJECTION");
    w.props(&p.properties);
    w.open("DATA_SET_MAP_PROJECTION_INFO");
    w.props(&p.information);
    for entry in &p.references {
        w.block("DS_MAP_PROJECTION_REF_INFO", &entry.properties);
    }
    w.close("DATA_SET_MAP_PROJECTION_INFO");
    w.opaque(&p.opaque);
    w.close("DATA_SET_MAP_PROJECTION");
}

fn personnel(w: &mut Writer, p: &Personnel) {
    w.props(&p.header);
    for record in &p.records {
        w.open("PERSONNEL");
        w.props(&record.properties);
        w.block("PERSONNEL_INFORMATION", &record.information);
        for email in &record.emails {
            w.block("PERSONNEL_ELECTRONIC_MAIL", email);
        }
        w.opaque(&record.opaque);
        w.close("PERSONNEL");
    }
}

fn references(w: &mut Writer, r: &ReferenceList) {
    w.props(&r.header);
    for record in &r.records {
        w.block("REFERENCE", &record.properties);
    }
    w.opaque(&r.opaque);
}

fn volume(w: &mut Writer, v: &VolumeDescriptor) {
    w.props(&v.header);
    w.open("VOLUME");
    w.props(&v.properties);
    w.block("DATA_PRODUCER", &v.data_producer);
    w.block("CATALOG", &v.catalog);
    if let Some(supplier) = &v.data_supplier {
        w.block("DATA_SUPPLIER", supplier);
    }
    for file in &v.files {
        w.block("FILE", file);
    }
    for dir in &v.directories {
        directory(w, dir);
    }
    w.opaque(&v.opaque);
    w.close("VOLUME");
}

fn directory(w: &mut Writer, d: &Directory) {
    w.open("DIRECTORY");
    w.props(&d.properties);
    for file in &d.files {
        w.block("FILE", file);
    }
    for nested in &d.directories {
        directory(w, nested);
    }
    w.close("DIRECTORY");
}
