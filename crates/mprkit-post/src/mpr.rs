//! WoodWOP MPR emitter
//!
//! Serializes the stock block and the ordered feature list into a WoodWOP 4.0
//! program: `[H` header, `[001` variables, `<100 \WerkStck\`, an optional
//! `<101 \Comment\` block, one `]N` geometry block per contour or pocket,
//! the operations in feature order and the `!` trailer.

use mprkit_core::{ArcDirection, Point3, WorkpieceStock};

use crate::arc_expander::sweep_angle;
use crate::coordinate_system::CoordinateOffset;
use crate::document::Document;
use crate::features::{ContourElement, ElementGeometry, Feature};
use crate::formatter::CoordinateFormatter;

/// Fixed WoodWOP header fields preceding the stock values
const HEADER_FIELDS: &[(&str, &str)] = &[
    ("VERSION", "\"4.0 Alpha\""),
    ("WW", "\"9.0.152\""),
    ("OP", "\"1\""),
    ("WRK2", "\"0\""),
    ("SCHN", "\"0\""),
    ("CVR", "\"0\""),
    ("POI", "\"0\""),
    ("HSP", "\"0\""),
    ("O2", "\"0\""),
    ("O4", "\"0\""),
    ("O3", "\"0\""),
    ("O5", "\"0\""),
    ("SR", "\"0\""),
    ("FM", "\"1\""),
    ("ML", "\"2000\""),
    ("UF", "\"20\""),
    ("ZS", "\"20\""),
    ("DN", "\"STANDARD\""),
    ("DST", "\"0\""),
    ("GP", "\"0\""),
    ("GY", "\"0\""),
    ("GXY", "\"0\""),
    ("NP", "\"1\""),
    ("NE", "\"0\""),
    ("NA", "\"0\""),
    ("BFS", "\"0\""),
    ("US", "\"0\""),
    ("CB", "\"0\""),
    ("UP", "\"0\""),
    ("DW", "\"0\""),
    ("MAT", "\"HOMAG\""),
    ("HP_A_O", "\"STANDARD\""),
    ("OVD_U", "\"1\""),
    ("OVD", "\"0\""),
    ("OHD_U", "\"0\""),
    ("OHD", "\"2\""),
    ("OOMD_U", "\"0\""),
    ("EWL", "\"1\""),
    ("INCH", "\"0\""),
    ("VIEW", "\"NOMIRROR\""),
    ("ANZ", "\"1\""),
    ("BES", "\"0\""),
    ("ENT", "\"0\""),
    ("MATERIAL", "\"\""),
    ("CUSTOMER", "\"\""),
    ("ORDER", "\"\""),
    ("ARTICLE", "\"\""),
    ("PARTID", "\"\""),
    ("PARTTYPE", "\"\""),
    ("MPRCOUNT", "\"1\""),
    ("MPRNUMBER", "\"1\""),
    ("INFO1", "\"\""),
    ("INFO2", "\"\""),
    ("INFO3", "\"\""),
    ("INFO4", "\"\""),
    ("INFO5", "\"\""),
];

/// `DS` code for an arc: direction plus whether it sweeps past 180 degrees
pub fn arc_ds(direction: ArcDirection, radius: f64) -> u8 {
    let large = radius < 0.0;
    match (direction, large) {
        (ArcDirection::Clockwise, false) => 0,
        (ArcDirection::CounterClockwise, false) => 1,
        (ArcDirection::Clockwise, true) => 2,
        (ArcDirection::CounterClockwise, true) => 3,
    }
}

/// XY angle and slope angle (radians) of a line from `from` to `to`
pub fn line_angles(from: Point3, to: Point3) -> (f64, f64) {
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    let dz = to.z - from.z;

    let wi = if dx.abs() > 0.001 || dy.abs() > 0.001 {
        dy.atan2(dx)
    } else {
        0.0
    };
    let length_xy = (dx * dx + dy * dy).sqrt();
    let wz = if length_xy > 0.001 {
        dz.atan2(length_xy)
    } else {
        0.0
    };
    (wi, wz)
}

/// Start and end angles (radians) of an arc, the end unwrapped in the
/// direction of travel
pub fn arc_angles(from: Point3, to: Point3, center: Point3, direction: ArcDirection) -> (f64, f64) {
    let start = (from.y - center.y).atan2(from.x - center.x);
    (start, start + sweep_angle(from, to, center, direction))
}

/// MPR serializer for one run
#[derive(Debug)]
pub struct MprEmitter<'a> {
    formatter: &'a CoordinateFormatter,
    offset: &'a CoordinateOffset,
    generated_at: String,
}

impl<'a> MprEmitter<'a> {
    /// Create an emitter; `generated_at` is the timestamp written to comments
    pub fn new(
        formatter: &'a CoordinateFormatter,
        offset: &'a CoordinateOffset,
        generated_at: impl Into<String>,
    ) -> Self {
        Self {
            formatter,
            offset,
            generated_at: generated_at.into(),
        }
    }

    fn point(&self, p: Point3) -> Point3 {
        self.formatter.apply(self.offset.apply(p))
    }

    fn num(&self, v: f64) -> String {
        self.formatter.number(v)
    }

    /// Build the full document
    pub fn document(&self, features: &[Feature], stock: &WorkpieceStock) -> Document {
        let mut doc = Document::new();
        self.header(&mut doc, stock);
        self.workpiece(&mut doc, stock);

        for feature in features {
            match feature {
                Feature::Contour(c) => self.geometry(&mut doc, c.id, c.start, &c.elements),
                Feature::Pocket(p) => self.geometry(&mut doc, p.id, p.start, &p.elements),
                Feature::Drilling(_) => {}
            }
        }

        for feature in features {
            self.operation(&mut doc, feature);
        }

        doc.entity("!");
        doc
    }

    fn header(&self, doc: &mut Document, stock: &WorkpieceStock) {
        doc.entity("[H");
        for (key, value) in HEADER_FIELDS {
            doc.field(key, value);
        }

        if let Some(l) = stock.length.value {
            doc.field("_BSX", self.num(l));
        }
        if let Some(w) = stock.width.value {
            doc.field("_BSY", self.num(w));
        }
        if let Some(t) = stock.thickness.value {
            doc.field("_BSZ", self.num(t));
        }
        doc.field("_FNX", self.num(stock.extent_x));
        doc.field("_FNY", self.num(stock.extent_y));
        doc.field("_RNX", self.num(0.0));
        doc.field("_RNY", self.num(0.0));
        doc.field("_RNZ", self.num(0.0));
        if let Some(l) = stock.length.value {
            doc.field("_RX", self.num(l + 2.0 * stock.extent_x));
        }
        if let Some(w) = stock.width.value {
            doc.field("_RY", self.num(w + 2.0 * stock.extent_y));
        }
        doc.entity("");
    }

    fn workpiece(&self, doc: &mut Document, stock: &WorkpieceStock) {
        let variables = [
            ("l", stock.length.value, "Length in X"),
            ("w", stock.width.value, "Width in Y"),
            ("th", stock.thickness.value, "Thickness in Z"),
        ];

        doc.entity("[001");
        for (name, value, description) in variables {
            if let Some(v) = value {
                doc.quoted(name, self.num(v));
                doc.comment(format!("KM=\"{}\"", description));
            }
        }
        doc.entity("");

        doc.entity("<100 \\WerkStck\\");
        for ((name, value, _), key) in variables.iter().zip(["LA", "BR", "DI"]) {
            if value.is_some() {
                doc.quoted(key, name);
            }
        }
        doc.quoted("FNX", self.num(stock.extent_x));
        doc.quoted("FNY", self.num(stock.extent_y));
        doc.quoted("AX", "0");
        doc.quoted("AY", "0");
        doc.entity("");

        doc.comment("<101 \\Comment\\");
        doc.comment(format!(
            "KM=\"Generated by MPRKit {}\"",
            env!("CARGO_PKG_VERSION")
        ));
        doc.comment(format!("KM=\"Date: {}\"", self.generated_at));
        if let Some(system) = &self.offset.system {
            let o = self.offset.offset;
            doc.comment(format!(
                "KM=\"Coordinate System: {} (offset: X={}, Y={}, Z={})\"",
                system,
                self.num(o.x),
                self.num(o.y),
                self.num(o.z)
            ));
            doc.comment("KM=\"NOTE: G-code output is not affected by the coordinate system offset\"");
        }
        doc.comment("");
    }

    fn entry_point(&self, doc: &mut Document, p: Point3) {
        let zero = self.num(0.0);
        doc.entity("KP ");
        doc.field("X", self.num(p.x));
        doc.field("Y", self.num(p.y));
        doc.field("Z", self.num(p.z));
        doc.field("KO", "00");
        doc.field(".X", &zero);
        doc.field(".Y", &zero);
        doc.field(".Z", &zero);
        doc.field(".KO", "00");
        doc.entity("");
    }

    fn geometry(&self, doc: &mut Document, id: u32, start: Point3, elements: &[ContourElement]) {
        let zero = self.num(0.0);
        let start = self.point(start);

        doc.entity(format!("]{}", id));
        doc.entity("$E0");
        self.entry_point(doc, start);

        let mut previous = start;
        let mut number = 0;
        for element in elements {
            if let Some(p) = element.reentry {
                let p = self.point(p);
                number += 1;
                doc.entity(format!("$E{}", number));
                self.entry_point(doc, p);
                previous = p;
            }
            number += 1;
            doc.entity(format!("$E{}", number));
            let end = self.point(element.geometry.end());

            match &element.geometry {
                ElementGeometry::Line { .. } => {
                    let (wi, wz) = line_angles(previous, end);
                    doc.entity("KL ");
                    doc.field("X", self.num(end.x));
                    doc.field("Y", self.num(end.y));
                    doc.field("Z", self.num(end.z));
                    doc.field(".X", self.num(end.x));
                    doc.field(".Y", self.num(end.y));
                    doc.field(".Z", self.num(end.z));
                    doc.field(".WI", self.num(wi));
                    doc.field(".WZ", self.num(wz));
                }
                ElementGeometry::Arc {
                    center,
                    radius,
                    direction,
                    ..
                } => {
                    let center = self.point(*center);
                    let direction = self.formatter.direction(*direction);
                    let ds = arc_ds(direction, *radius);
                    let (wi, wo) = arc_angles(previous, end, center, direction);
                    let r = self.num(radius.abs());

                    doc.entity("KA ");
                    doc.field("X", self.num(end.x));
                    doc.field("Y", self.num(end.y));
                    doc.field("Z", self.num(end.z));
                    doc.field("DS", ds.to_string());
                    doc.field("R", &r);
                    doc.field(".X", self.num(end.x));
                    doc.field(".Y", self.num(end.y));
                    doc.field(".Z", self.num(end.z));
                    doc.field(".I", self.num(center.x));
                    doc.field(".J", self.num(center.y));
                    doc.field(".DS", ds.to_string());
                    doc.field(".R", &r);
                    doc.field(".WI", self.num(wi));
                    doc.field(".WO", self.num(wo));
                    doc.field(".WAZ", &zero);
                }
            }
            doc.entity("");
            previous = end;
        }
        doc.entity("");
    }

    fn operation(&self, doc: &mut Document, feature: &Feature) {
        match feature {
            Feature::Contour(c) => {
                doc.entity("<105 \\Contourfraesen\\");
                doc.quoted("EA", format!("{}:0", c.id));
                doc.quoted("MDA", "TAN");
                doc.quoted("RK", c.compensation.mpr_code());
                doc.quoted("EE", format!("{}:{}", c.id, c.elements.len()));
                doc.quoted("MDE", "TAN_AB");
                doc.quoted("EM", "1");
                doc.quoted("RI", "1");
                doc.quoted("TNO", c.tool.to_string());
                doc.quoted("SM", "0");
                if let Some(d) = c.compensation.corrector() {
                    doc.comment(format!("KM=\"Corrector D{}\"", d));
                }
            }
            Feature::Drilling(d) => {
                let position = self.point(d.position);
                doc.entity("<102 \\BohrVert\\");
                doc.quoted("XA", self.num(position.x));
                doc.quoted("YA", self.num(position.y));
                doc.quoted("TI", self.num(d.depth));
                doc.quoted("TNO", d.tool.to_string());
                doc.quoted("BM", "SS");
            }
            Feature::Pocket(p) => {
                doc.entity("<107 \\Pocket\\");
                doc.quoted("EA", format!("{}:0", p.id));
                doc.quoted("TI", self.num(p.depth));
                doc.quoted("TNO", p.tool.to_string());
            }
        }
        if let Some(label) = feature.label() {
            doc.comment(format!("KM=\"Operation: {}\"", label.replace('"', "'")));
        }
        doc.entity("");
    }
}
