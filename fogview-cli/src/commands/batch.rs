use anyhow::{Context, Result};
use fogview::{viewshed, ElevationTile, Observer, ViewshedOptions};
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use super::{load_tile, options};

/// Observers handed to the engine per progress-bar tick.
const CHUNK_SIZE: usize = 16;

/// One input row.
#[derive(Debug, Clone, Deserialize)]
struct ObserverRecord {
    name: String,
    x: usize,
    y: usize,
    height: f64,
    radius: usize,
}

/// One output row. Failed queries keep the input columns and fill `error`.
#[derive(Debug, Clone, Serialize, PartialEq)]
struct SummaryRecord {
    name: String,
    x: usize,
    y: usize,
    height: f64,
    radius: usize,
    width: Option<usize>,
    rows: Option<usize>,
    visible: Option<usize>,
    occluded: Option<usize>,
    void: Option<usize>,
    error: Option<String>,
}

pub fn run(
    data_dir: Option<PathBuf>,
    tile: &str,
    input: PathBuf,
    output: Option<PathBuf>,
    parallel: bool,
) -> Result<()> {
    let tile = load_tile(data_dir, tile)?;

    let file = File::open(&input).context("Failed to open input file")?;
    let records = read_observers(BufReader::new(file))?;

    let output_path = output.unwrap_or_else(|| default_output(&input));
    let pb = ProgressBar::new(records.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})",
            )?
            .progress_chars("#>-"),
    );

    let mut summaries = Vec::with_capacity(records.len());
    for chunk in records.chunks(CHUNK_SIZE) {
        summaries.extend(summarize(&tile, chunk, options(parallel)));
        pb.inc(chunk.len() as u64);
    }
    pb.finish_with_message("done");

    let failed = summaries.iter().filter(|s| s.error.is_some()).count();
    if failed > 0 {
        tracing::warn!(failed, total = summaries.len(), "Some observers failed");
    }

    let output_file = File::create(&output_path).context("Failed to create output file")?;
    write_summaries(BufWriter::new(output_file), &summaries)?;

    println!("Output written to: {}", output_path.display());
    Ok(())
}

fn read_observers<R: Read>(reader: R) -> Result<Vec<ObserverRecord>> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    reader
        .deserialize()
        .enumerate()
        .map(|(i, row)| row.with_context(|| format!("Invalid observer on line {}", i + 2)))
        .collect()
}

fn summarize(
    tile: &ElevationTile,
    records: &[ObserverRecord],
    options: ViewshedOptions,
) -> Vec<SummaryRecord> {
    let observers: Vec<Observer> = records
        .iter()
        .map(|r| Observer::new(r.x, r.y, r.height, r.radius))
        .collect();

    viewshed::compute_many(tile.grid(), &observers, options)
        .into_iter()
        .zip(records)
        .map(|(result, record)| {
            let mut summary = SummaryRecord {
                name: record.name.clone(),
                x: record.x,
                y: record.y,
                height: record.height,
                radius: record.radius,
                width: None,
                rows: None,
                visible: None,
                occluded: None,
                void: None,
                error: None,
            };
            match result {
                Ok(result) => {
                    let counts = result.counts();
                    summary.width = Some(result.width());
                    summary.rows = Some(result.height());
                    summary.visible = Some(counts.visible);
                    summary.occluded = Some(counts.occluded);
                    summary.void = Some(counts.void);
                }
                Err(e) => summary.error = Some(e.to_string()),
            }
            summary
        })
        .collect()
}

fn write_summaries<W: Write>(writer: W, summaries: &[SummaryRecord]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    for summary in summaries {
        writer.serialize(summary)?;
    }
    writer.flush()?;
    Ok(())
}

fn default_output(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "observers".to_string());
    input.with_file_name(format!("{}_viewshed.csv", stem))
}

#[cfg(test)]
mod tests {
    use super::*;
    use fogview::{ElevationGrid, TileId};

    fn flat_tile() -> ElevationTile {
        ElevationTile::from_grid(
            TileId::new(35, 138),
            ElevationGrid::from_samples(5, vec![10.0; 25]).unwrap(),
        )
    }

    #[test]
    fn test_read_observers() {
        let csv = "name,x,y,height,radius\nsummit, 2, 2, 1.5, 1\nvalley,0,4,2,3\n";
        let records = read_observers(csv.as_bytes()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name, "summit");
        assert_eq!((records[1].x, records[1].y, records[1].radius), (0, 4, 3));
    }

    #[test]
    fn test_read_observers_reports_line() {
        let csv = "name,x,y,height,radius\nok,1,1,1,1\nbad,one,1,1,1\n";
        let err = read_observers(csv.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("line 3"));
    }

    #[test]
    fn test_summarize_keeps_failures() {
        let records = read_observers(
            "name,x,y,height,radius\ncentre,2,2,1.5,1\noutside,9,9,1.5,1\n".as_bytes(),
        )
        .unwrap();

        let summaries = summarize(&flat_tile(), &records, ViewshedOptions::default());
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].visible, Some(9));
        assert_eq!(summaries[0].width, Some(3));
        assert!(summaries[0].error.is_none());
        assert_eq!(summaries[1].name, "outside");
        assert!(summaries[1].visible.is_none());
        assert!(summaries[1].error.is_some());
    }

    #[test]
    fn test_write_summaries_header() {
        let records =
            read_observers("name,x,y,height,radius\na,0,0,1,1\n".as_bytes()).unwrap();
        let summaries = summarize(&flat_tile(), &records, ViewshedOptions::default());

        let mut out = Vec::new();
        write_summaries(&mut out, &summaries).unwrap();
        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("name,x,y,height,radius,width,rows,visible,occluded,void,error")
        );
        assert_eq!(lines.next(), Some("a,0,0,1.0,1,2,2,4,0,0,"));
    }

    #[test]
    fn test_default_output_name() {
        assert_eq!(
            default_output(Path::new("/tmp/towers.csv")),
            PathBuf::from("/tmp/towers_viewshed.csv")
        );
    }
}
