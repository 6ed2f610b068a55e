//! Output files for one analysis
//!
//! | format  | files |
//! |---------|-------|
//! | csv     | lane_groups.csv, links.csv, nodes.csv, ways.csv, relations.csv |
//! | scr     | nodes.scr, ways.scr, relations.scr |
//! | geojson | flow.geojson |

pub mod geojson;
pub mod scr;
pub mod tables;

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use butterfly_common::{Error, Result};

use crate::config::FlowConfig;
use crate::flow::ColorClass;
use crate::pipeline::Analysis;
use crate::store::EntityStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Csv,
    Scr,
    Geojson,
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 3] = [OutputFormat::Csv, OutputFormat::Scr, OutputFormat::Geojson];
}

fn create(outdir: &Path, name: &str) -> Result<(PathBuf, BufWriter<File>)> {
    let path = outdir.join(name);
    let file = File::create(&path)
        .map_err(|e| Error::OutputFailed(format!("{}: {e}", path.display())))?;
    Ok((path, BufWriter::new(file)))
}

/// Write one file, log its row count and remember its path
fn emit<F>(outdir: &Path, name: &str, written: &mut Vec<PathBuf>, f: F) -> Result<()>
where
    F: FnOnce(BufWriter<File>) -> Result<usize>,
{
    let (path, out) = create(outdir, name)?;
    let rows = f(out)?;
    tracing::debug!(file = name, rows, "wrote output");
    written.push(path);
    Ok(())
}

/// Write the requested formats into `outdir`, creating it if needed.
///
/// Returns the written paths in write order.
pub fn write_all(
    outdir: &Path,
    store: &EntityStore,
    analysis: &Analysis,
    config: &FlowConfig,
    formats: &[OutputFormat],
) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(outdir)
        .map_err(|e| Error::OutputFailed(format!("{}: {e}", outdir.display())))?;

    let mut written = Vec::new();
    let w = &mut written;

    if formats.contains(&OutputFormat::Csv) {
        emit(outdir, "lane_groups.csv", w, |out| {
            tables::write_lane_groups(out, &analysis.lane_groups)
        })?;
        emit(outdir, "links.csv", w, |out| tables::write_links(out, &analysis.edges))?;
        emit(outdir, "nodes.csv", w, |out| tables::write_nodes(out, store))?;
        emit(outdir, "ways.csv", w, |out| tables::write_ways(out, store))?;
        emit(outdir, "relations.csv", w, |out| tables::write_relations(out, store))?;
    }

    if formats.contains(&OutputFormat::Scr) {
        emit(outdir, "nodes.scr", w, |out| {
            scr::write_points(out, store, config.point_radius)
        })?;
        emit(outdir, "ways.scr", w, |out| {
            scr::write_class(out, &analysis.primitives, ColorClass::Way)
        })?;
        emit(outdir, "relations.scr", w, |out| {
            scr::write_class(out, &analysis.primitives, ColorClass::Flow)
        })?;
    }

    if formats.contains(&OutputFormat::Geojson) {
        emit(outdir, "flow.geojson", w, |out| {
            geojson::write_primitives(out, &analysis.primitives)
        })?;
    }

    Ok(written)
}
