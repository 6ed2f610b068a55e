//! AutoCAD script (`.scr`) export
//!
//! One command per line: `color N`, `circle x,y r`, `line x1,y1 x2,y2` and
//! polar rays `line x,y @len<angle`.

use std::io::Write;

use butterfly_common::Result;

use crate::flow::{ColorClass, Primitive};
use crate::model::Coord;
use crate::store::EntityStore;

pub struct ScrWriter<W: Write> {
    out: W,
    commands: usize,
}

impl<W: Write> ScrWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out, commands: 0 }
    }

    pub fn color(&mut self, class: ColorClass) -> Result<()> {
        writeln!(self.out, "color {}", class.cad_color())?;
        Ok(())
    }

    pub fn circle(&mut self, center: Coord, radius: f64) -> Result<()> {
        writeln!(self.out, "circle {},{} {}", center.x, center.y, radius)?;
        self.commands += 1;
        Ok(())
    }

    pub fn primitive(&mut self, prim: &Primitive) -> Result<()> {
        match prim {
            Primitive::Line { from, to, .. } => {
                writeln!(self.out, "line {},{} {},{}", from.x, from.y, to.x, to.y)?;
            }
            Primitive::Ray {
                anchor,
                angle_deg,
                length,
                ..
            } => {
                writeln!(
                    self.out,
                    "line {},{} @{}<{}",
                    anchor.x, anchor.y, length, angle_deg
                )?;
            }
        }
        self.commands += 1;
        Ok(())
    }

    /// Flush and return the number of drawing commands written
    pub fn finish(mut self) -> Result<usize> {
        self.out.flush()?;
        Ok(self.commands)
    }
}

/// Every point as a small circle
pub fn write_points<W: Write>(out: W, store: &EntityStore, radius: f64) -> Result<usize> {
    let mut scr = ScrWriter::new(out);
    scr.color(ColorClass::Point)?;
    for p in store.points() {
        scr.circle(p.coord, radius)?;
    }
    scr.finish()
}

/// Primitives of one color class, in stream order
pub fn write_class<W: Write>(out: W, primitives: &[Primitive], class: ColorClass) -> Result<usize> {
    let mut scr = ScrWriter::new(out);
    scr.color(class)?;
    for prim in primitives.iter().filter(|p| p.class() == class) {
        scr.primitive(prim)?;
    }
    scr.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_way_script() {
        let prims = vec![
            Primitive::Line {
                from: Coord::new(0.0, 0.0),
                to: Coord::new(10.0, 0.0),
                class: ColorClass::Way,
            },
            Primitive::Ray {
                anchor: Coord::new(10.0, 0.0),
                angle_deg: 190.0,
                length: 0.5,
                class: ColorClass::Way,
            },
            Primitive::Ray {
                anchor: Coord::new(5.0, 2.0),
                angle_deg: 170.0,
                length: 0.5,
                class: ColorClass::Flow,
            },
        ];

        let mut buf = Vec::new();
        assert_eq!(write_class(&mut buf, &prims, ColorClass::Way).unwrap(), 2);
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "color 7\nline 0,0 10,0\nline 10,0 @0.5<190\n"
        );

        let mut buf = Vec::new();
        assert_eq!(write_class(&mut buf, &prims, ColorClass::Flow).unwrap(), 1);
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "color 10\nline 5,2 @0.5<170\n"
        );
    }

    #[test]
    fn test_points_script() {
        let mut diag = crate::diagnostics::Diagnostics::new();
        let store = EntityStore::new(
            vec![crate::store::fixtures::point(1, 1.5, -2.0)],
            vec![],
            vec![],
            &mut diag,
        );
        let mut buf = Vec::new();
        write_points(&mut buf, &store, 0.2).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "color 5\ncircle 1.5,-2 0.2\n");
    }
}
