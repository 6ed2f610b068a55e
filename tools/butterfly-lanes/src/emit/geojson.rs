//! GeoJSON export of the geometry primitive stream
//!
//! Coordinates are the map's local planar frame, not WGS84; the file is meant
//! for GIS viewers that accept arbitrary CRS.

use std::io::Write;

use butterfly_common::{Error, Result};
use ::geojson::{Feature, FeatureCollection, Geometry, JsonObject, JsonValue, Value};

use crate::flow::Primitive;

fn feature(prim: &Primitive) -> Feature {
    let (a, b) = prim.endpoints();
    let geometry = Geometry::new(Value::LineString(vec![vec![a.x, a.y], vec![b.x, b.y]]));

    let mut properties = JsonObject::new();
    properties.insert("class".to_string(), JsonValue::from(prim.class().as_str()));
    match prim {
        Primitive::Line { .. } => {
            properties.insert("kind".to_string(), JsonValue::from("line"));
        }
        Primitive::Ray {
            angle_deg, length, ..
        } => {
            properties.insert("kind".to_string(), JsonValue::from("ray"));
            properties.insert("angle".to_string(), JsonValue::from(*angle_deg));
            properties.insert("length".to_string(), JsonValue::from(*length));
        }
    }

    Feature {
        bbox: None,
        geometry: Some(geometry),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}

pub fn write_primitives<W: Write>(mut out: W, primitives: &[Primitive]) -> Result<usize> {
    let collection = FeatureCollection {
        bbox: None,
        features: primitives.iter().map(feature).collect(),
        foreign_members: None,
    };
    serde_json::to_writer(&mut out, &collection)
        .map_err(|e| Error::OutputFailed(format!("geojson: {e}")))?;
    out.flush()?;
    Ok(collection.features.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::ColorClass;
    use crate::model::Coord;

    #[test]
    fn test_rays_become_two_point_lines() {
        let prims = vec![Primitive::Ray {
            anchor: Coord::new(0.0, 0.0),
            angle_deg: 0.0,
            length: 0.5,
            class: ColorClass::Flow,
        }];
        let mut buf = Vec::new();
        assert_eq!(write_primitives(&mut buf, &prims).unwrap(), 1);

        let doc: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(doc["type"], "FeatureCollection");
        let f = &doc["features"][0];
        assert_eq!(f["properties"]["kind"], "ray");
        assert_eq!(f["properties"]["class"], "flow");
        assert_eq!(f["geometry"]["coordinates"][1][0], 0.5);
    }
}
