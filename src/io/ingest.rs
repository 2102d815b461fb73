//! CSV ingest and normalization.
//!
//! This module is responsible for turning the platform's track/artist CSV
//! exports into a clean, encoded numeric table that is safe to fit.
//!
//! Design goals:
//! - **Strict schema** for required columns (clear errors + exit code 2)
//! - **Row-level validation** (skip bad rows, but report what happened)
//! - **Deterministic behavior** (no hidden randomness, stable column order)
//! - **Separation of concerns**: no fitting logic here

use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

use chrono::{Datelike, NaiveDate};
use csv::StringRecord;

use crate::data::encode::{RawColumn, encode_columns};
use crate::data::table::DataTable;
use crate::domain::{ArtistRow, RunConfig, TrackRow};
use crate::error::AppError;

/// Response column name after encoding.
pub const RESPONSE: &str = "popularity";

/// Name of the merged artist-popularity column.
pub const ARTIST_POPULARITY: &str = "artist_popularity";

/// A row-level error encountered during ingest or merge.
#[derive(Debug, Clone)]
pub struct RowError {
    pub line: usize,
    pub id: Option<String>,
    pub message: String,
}

/// Summary stats about the rows actually used for fitting.
#[derive(Debug, Clone)]
pub struct DatasetStats {
    pub rows_used: usize,
    pub n_predictors: usize,
    pub popularity_min: f64,
    pub popularity_max: f64,
    pub popularity_mean: f64,
    pub year_min: i32,
    pub year_max: i32,
}

/// Ingest output: encoded table + predictor universe + diagnostics.
#[derive(Debug, Clone)]
pub struct IngestedData {
    pub table: DataTable,
    /// Encoded predictor universe, artist popularity last.
    pub predictors: Vec<String>,
    pub stats: DatasetStats,
    pub row_errors: Vec<RowError>,
    pub tracks_read: usize,
    pub artists_read: usize,
    /// Rows dropped by the year / nonzero-popularity filters (not errors).
    pub rows_filtered: usize,
}

/// Load, merge, filter, and encode the two input CSVs.
pub fn load_dataset(config: &RunConfig) -> Result<IngestedData, AppError> {
    let tracks_path = config
        .tracks_path
        .as_ref()
        .ok_or_else(|| AppError::config("Missing --tracks path (or use --demo)."))?;
    let artists_path = config
        .artists_path
        .as_ref()
        .ok_or_else(|| AppError::config("Missing --artists path (or use --demo)."))?;

    let (tracks, mut row_errors, tracks_read) = read_tracks(tracks_path)?;
    let (artists, artist_errors, artists_read) = read_artists(artists_path)?;
    row_errors.extend(artist_errors);

    assemble(tracks, artists, row_errors, tracks_read, artists_read, config)
}

/// Merge, filter, and encode already-parsed rows.
///
/// Shared by CSV ingest and the synthetic demo generator.
pub fn assemble(
    tracks: Vec<(usize, TrackRow)>,
    artists: Vec<ArtistRow>,
    mut row_errors: Vec<RowError>,
    tracks_read: usize,
    artists_read: usize,
    config: &RunConfig,
) -> Result<IngestedData, AppError> {
    let artist_popularity: HashMap<&str, f64> = artists
        .iter()
        .map(|a| (a.id.as_str(), a.popularity))
        .collect();

    let mut kept: Vec<(&TrackRow, f64)> = Vec::new();
    let mut rows_filtered = 0usize;

    for (line, track) in &tracks {
        // Quiet filters first: these rows are out of scope, not broken.
        if track.release_year < config.min_year {
            rows_filtered += 1;
            continue;
        }
        if track.popularity <= 0.0 {
            rows_filtered += 1;
            continue;
        }

        // Inner join against the artists table. A track whose artists are all
        // unknown cannot enter the with-artist variant, and keeping it in only
        // one variant would make the comparison rows differ; drop it loudly.
        let matched: Vec<f64> = track
            .artist_ids
            .iter()
            .filter_map(|id| artist_popularity.get(id.as_str()).copied())
            .collect();
        if matched.is_empty() {
            row_errors.push(RowError {
                line: *line,
                id: Some(track.id.clone()),
                message: "No artist id matched the artists table.".to_string(),
            });
            continue;
        }
        let mean_artist_pop = matched.iter().sum::<f64>() / matched.len() as f64;

        kept.push((track, mean_artist_pop));
    }

    if kept.is_empty() {
        return Err(AppError::insufficient_data(
            "No valid rows remain after filtering/merging.",
        ));
    }

    let table = encode_rows(&kept)?;
    let predictors: Vec<String> = table
        .column_names()
        .iter()
        .filter(|n| n.as_str() != RESPONSE)
        .cloned()
        .collect();

    let stats = compute_stats(&kept, predictors.len());

    Ok(IngestedData {
        table,
        predictors,
        stats,
        row_errors,
        tracks_read,
        artists_read,
        rows_filtered,
    })
}

fn encode_rows(rows: &[(&TrackRow, f64)]) -> Result<DataTable, AppError> {
    fn numeric(name: &str, rows: &[(&TrackRow, f64)], get: impl Fn(&TrackRow) -> f64) -> RawColumn {
        RawColumn::Numeric {
            name: name.to_string(),
            values: rows.iter().map(|&(t, _)| get(t)).collect(),
        }
    }

    let raw = vec![
        numeric("duration_ms", rows, |t| t.duration_ms),
        numeric("danceability", rows, |t| t.danceability),
        numeric("energy", rows, |t| t.energy),
        numeric("loudness", rows, |t| t.loudness),
        numeric("speechiness", rows, |t| t.speechiness),
        numeric("instrumentalness", rows, |t| t.instrumentalness),
        numeric("liveness", rows, |t| t.liveness),
        numeric("valence", rows, |t| t.valence),
        numeric("tempo", rows, |t| t.tempo),
        RawColumn::Boolean {
            name: "explicit".to_string(),
            values: rows.iter().map(|(t, _)| t.explicit).collect(),
        },
        RawColumn::Categorical {
            name: "key".to_string(),
            values: rows.iter().map(|(t, _)| t.key.to_string()).collect(),
        },
        RawColumn::Categorical {
            name: "time_signature".to_string(),
            values: rows
                .iter()
                .map(|(t, _)| t.time_signature.to_string())
                .collect(),
        },
        RawColumn::Numeric {
            name: ARTIST_POPULARITY.to_string(),
            values: rows.iter().map(|(_, ap)| *ap).collect(),
        },
        numeric(RESPONSE, rows, |t| t.popularity),
    ];

    encode_columns(raw)
}

fn compute_stats(rows: &[(&TrackRow, f64)], n_predictors: usize) -> DatasetStats {
    let mut pop_min = f64::INFINITY;
    let mut pop_max = f64::NEG_INFINITY;
    let mut pop_sum = 0.0;
    let mut year_min = i32::MAX;
    let mut year_max = i32::MIN;

    for (t, _) in rows {
        pop_min = pop_min.min(t.popularity);
        pop_max = pop_max.max(t.popularity);
        pop_sum += t.popularity;
        year_min = year_min.min(t.release_year);
        year_max = year_max.max(t.release_year);
    }

    DatasetStats {
        rows_used: rows.len(),
        n_predictors,
        popularity_min: pop_min,
        popularity_max: pop_max,
        popularity_mean: pop_sum / rows.len() as f64,
        year_min,
        year_max,
    }
}

type ParsedRows<T> = (Vec<(usize, T)>, Vec<RowError>, usize);

fn read_tracks(path: &Path) -> Result<ParsedRows<TrackRow>, AppError> {
    let file = File::open(path).map_err(|e| {
        AppError::data_load(format!("Failed to open tracks CSV '{}': {e}", path.display()))
    })?;

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let headers = reader
        .headers()
        .map_err(|e| AppError::data_load(format!("Failed to read tracks CSV headers: {e}")))?
        .clone();
    let header_map = build_header_map(&headers);

    for required in [
        "id",
        "popularity",
        "duration_ms",
        "explicit",
        "danceability",
        "energy",
        "key",
        "loudness",
        "speechiness",
        "instrumentalness",
        "liveness",
        "valence",
        "tempo",
        "time_signature",
        "release_date",
    ] {
        if !header_map.contains_key(required) {
            return Err(AppError::data_load(format!(
                "Tracks CSV is missing required column: `{required}`"
            )));
        }
    }
    if !header_map.contains_key("id_artists") && !header_map.contains_key("artists") {
        return Err(AppError::data_load(
            "Tracks CSV is missing required column: `id_artists` (or `artists`)",
        ));
    }

    let mut rows = Vec::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // +2: records() starts after the header row, and CSV lines are 1-based.
        let line = idx + 2;
        rows_read += 1;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                row_errors.push(RowError {
                    line,
                    id: None,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        match parse_track_row(&record, &header_map) {
            Ok(row) => rows.push((line, row)),
            Err(message) => row_errors.push(RowError {
                line,
                id: get_optional(&record, &header_map, "id").map(str::to_string),
                message,
            }),
        }
    }

    Ok((rows, row_errors, rows_read))
}

fn read_artists(path: &Path) -> Result<(Vec<ArtistRow>, Vec<RowError>, usize), AppError> {
    let file = File::open(path).map_err(|e| {
        AppError::data_load(format!(
            "Failed to open artists CSV '{}': {e}",
            path.display()
        ))
    })?;

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let headers = reader
        .headers()
        .map_err(|e| AppError::data_load(format!("Failed to read artists CSV headers: {e}")))?
        .clone();
    let header_map = build_header_map(&headers);

    for required in ["id", "popularity"] {
        if !header_map.contains_key(required) {
            return Err(AppError::data_load(format!(
                "Artists CSV is missing required column: `{required}`"
            )));
        }
    }

    let mut rows = Vec::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    for (idx, result) in reader.records().enumerate() {
        let line = idx + 2;
        rows_read += 1;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                row_errors.push(RowError {
                    line,
                    id: None,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        let parsed = (|| -> Result<ArtistRow, String> {
            let id = get_required(&record, &header_map, "id")?.to_string();
            let popularity = parse_f64(get_required(&record, &header_map, "popularity")?)?;
            Ok(ArtistRow { id, popularity })
        })();

        match parsed {
            Ok(row) => rows.push(row),
            Err(message) => row_errors.push(RowError {
                line,
                id: get_optional(&record, &header_map, "id").map(str::to_string),
                message,
            }),
        }
    }

    Ok((rows, row_errors, rows_read))
}

fn parse_track_row(
    record: &StringRecord,
    header_map: &HashMap<String, usize>,
) -> Result<TrackRow, String> {
    let id = get_required(record, header_map, "id")?.to_string();
    let popularity = parse_f64(get_required(record, header_map, "popularity")?)?;
    let duration_ms = parse_f64(get_required(record, header_map, "duration_ms")?)?;
    let explicit = parse_bool(get_required(record, header_map, "explicit")?)?;
    let danceability = parse_f64(get_required(record, header_map, "danceability")?)?;
    let energy = parse_f64(get_required(record, header_map, "energy")?)?;
    let key = parse_i64(get_required(record, header_map, "key")?)?;
    let loudness = parse_f64(get_required(record, header_map, "loudness")?)?;
    let speechiness = parse_f64(get_required(record, header_map, "speechiness")?)?;
    let instrumentalness = parse_f64(get_required(record, header_map, "instrumentalness")?)?;
    let liveness = parse_f64(get_required(record, header_map, "liveness")?)?;
    let valence = parse_f64(get_required(record, header_map, "valence")?)?;
    let tempo = parse_f64(get_required(record, header_map, "tempo")?)?;
    let time_signature = parse_i64(get_required(record, header_map, "time_signature")?)?;
    let release_year = parse_release_year(get_required(record, header_map, "release_date")?)?;

    let artists_raw = get_optional(record, header_map, "id_artists")
        .or_else(|| get_optional(record, header_map, "artists"))
        .ok_or_else(|| "Missing artist id list.".to_string())?;
    let artist_ids = parse_artist_ids(artists_raw);
    if artist_ids.is_empty() {
        return Err("Empty artist id list.".to_string());
    }

    Ok(TrackRow {
        id,
        popularity,
        duration_ms,
        explicit,
        danceability,
        energy,
        key,
        loudness,
        speechiness,
        instrumentalness,
        liveness,
        valence,
        tempo,
        time_signature,
        release_year,
        artist_ids,
    })
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports sometimes emit UTF-8 CSVs with a BOM prefix on the
    // first header (e.g. "\u{feff}id"). If we don't strip it, schema
    // validation will incorrectly report missing columns.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn get_required<'a>(
    record: &'a StringRecord,
    header_map: &HashMap<String, usize>,
    name: &str,
) -> Result<&'a str, String> {
    let idx = header_map
        .get(name)
        .ok_or_else(|| format!("Missing required column: `{name}`"))?;
    record
        .get(*idx)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| format!("Missing required value: `{name}`"))
}

fn get_optional<'a>(
    record: &'a StringRecord,
    header_map: &HashMap<String, usize>,
    name: &str,
) -> Option<&'a str> {
    let idx = header_map.get(name)?;
    record.get(*idx).map(str::trim).filter(|s| !s.is_empty())
}

fn parse_f64(s: &str) -> Result<f64, String> {
    let v = s
        .parse::<f64>()
        .map_err(|_| format!("Invalid numeric value '{s}'."))?;
    if v.is_finite() {
        Ok(v)
    } else {
        Err(format!("Non-finite numeric value '{s}'."))
    }
}

fn parse_i64(s: &str) -> Result<i64, String> {
    // Some exports write integer-coded categories as floats ("4.0").
    if let Ok(v) = s.parse::<i64>() {
        return Ok(v);
    }
    let v = parse_f64(s)?;
    if v.fract() == 0.0 {
        Ok(v as i64)
    } else {
        Err(format!("Invalid integer value '{s}'."))
    }
}

fn parse_bool(s: &str) -> Result<bool, String> {
    match s.to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(format!("Invalid boolean value '{s}'.")),
    }
}

/// Extract a release year from `YYYY-MM-DD`, `YYYY-MM`, or `YYYY`.
fn parse_release_year(s: &str) -> Result<i32, String> {
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(d.year());
    }
    let year_part = s.split('-').next().unwrap_or(s);
    let year = year_part
        .parse::<i32>()
        .map_err(|_| format!("Invalid release date '{s}'."))?;
    if (1000..=9999).contains(&year) {
        Ok(year)
    } else {
        Err(format!("Implausible release year '{s}'."))
    }
}

/// Parse an artist id list like `['a1b2', 'c3d4']` (or a bare id).
fn parse_artist_ids(s: &str) -> Vec<String> {
    s.trim()
        .trim_start_matches('[')
        .trim_end_matches(']')
        .split(',')
        .map(|part| part.trim().trim_matches('\'').trim_matches('"').to_string())
        .filter(|part| !part.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn release_year_formats() {
        assert_eq!(parse_release_year("1997-03-15").unwrap(), 1997);
        assert_eq!(parse_release_year("1997-03").unwrap(), 1997);
        assert_eq!(parse_release_year("1997").unwrap(), 1997);
        assert!(parse_release_year("not-a-date").is_err());
        assert!(parse_release_year("97").is_err());
    }

    #[test]
    fn artist_id_lists() {
        assert_eq!(
            parse_artist_ids("['a1', 'b2']"),
            vec!["a1".to_string(), "b2".to_string()]
        );
        assert_eq!(parse_artist_ids("[\"a1\"]"), vec!["a1".to_string()]);
        assert_eq!(parse_artist_ids("a1"), vec!["a1".to_string()]);
        assert!(parse_artist_ids("[]").is_empty());
    }

    #[test]
    fn booleans_accept_both_spellings() {
        assert!(parse_bool("True").unwrap());
        assert!(parse_bool("1").unwrap());
        assert!(!parse_bool("FALSE").unwrap());
        assert!(parse_bool("yes").is_err());
    }

    #[test]
    fn integer_coded_categories_accept_float_spelling() {
        assert_eq!(parse_i64("4").unwrap(), 4);
        assert_eq!(parse_i64("4.0").unwrap(), 4);
        assert!(parse_i64("4.5").is_err());
    }

    #[test]
    fn bom_is_stripped_from_headers() {
        assert_eq!(normalize_header_name("\u{feff}Id"), "id");
    }

    fn demo_config() -> RunConfig {
        RunConfig {
            tracks_path: None,
            artists_path: None,
            demo: true,
            demo_count: 0,
            seed: 0,
            train_frac: 0.6,
            valid_frac: 0.3,
            criterion: crate::domain::Criterion::Aic,
            nvmax: 8,
            min_year: 2000,
            plot: false,
            plot_width: 80,
            plot_height: 20,
            export_predictions: None,
            export_model: None,
        }
    }

    fn track(id: &str, year: i32, popularity: f64, artist: &str) -> TrackRow {
        TrackRow {
            id: id.to_string(),
            popularity,
            duration_ms: 200_000.0,
            explicit: false,
            danceability: 0.5,
            energy: 0.6,
            key: 5,
            loudness: -7.0,
            speechiness: 0.05,
            instrumentalness: 0.0,
            liveness: 0.1,
            valence: 0.4,
            tempo: 120.0,
            time_signature: 4,
            release_year: year,
            artist_ids: vec![artist.to_string()],
        }
    }

    #[test]
    fn assemble_filters_and_joins() {
        let tracks = vec![
            (2, track("t1", 2010, 50.0, "a1")),
            (3, track("t2", 1990, 60.0, "a1")), // filtered: year
            (4, track("t3", 2015, 0.0, "a1")),  // filtered: zero popularity
            (5, track("t4", 2012, 40.0, "zz")), // dropped: unknown artist
            (6, track("t5", 2020, 70.0, "a2")),
        ];
        let artists = vec![
            ArtistRow {
                id: "a1".to_string(),
                popularity: 80.0,
            },
            ArtistRow {
                id: "a2".to_string(),
                popularity: 20.0,
            },
        ];

        let data = assemble(tracks, artists, Vec::new(), 5, 2, &demo_config()).unwrap();

        assert_eq!(data.stats.rows_used, 2);
        assert_eq!(data.rows_filtered, 2);
        assert_eq!(data.row_errors.len(), 1);
        assert_eq!(data.row_errors[0].id.as_deref(), Some("t4"));

        let ap = data.table.column(ARTIST_POPULARITY).unwrap();
        assert_eq!(ap, &[80.0, 20.0]);
        assert!(data.predictors.iter().all(|p| p != RESPONSE));
        assert!(data.table.has_column(RESPONSE));
    }

    #[test]
    fn assemble_averages_multiple_artists() {
        let mut t = track("t1", 2010, 50.0, "a1");
        t.artist_ids = vec!["a1".to_string(), "a2".to_string()];
        let artists = vec![
            ArtistRow {
                id: "a1".to_string(),
                popularity: 80.0,
            },
            ArtistRow {
                id: "a2".to_string(),
                popularity: 40.0,
            },
        ];

        let data = assemble(vec![(2, t)], artists, Vec::new(), 1, 2, &demo_config()).unwrap();
        assert_eq!(data.table.column(ARTIST_POPULARITY).unwrap(), &[60.0]);
    }

    #[test]
    fn assemble_with_nothing_left_is_insufficient_data() {
        let tracks = vec![(2, track("t1", 1980, 50.0, "a1"))];
        let artists = vec![ArtistRow {
            id: "a1".to_string(),
            popularity: 80.0,
        }];
        let err = assemble(tracks, artists, Vec::new(), 1, 1, &demo_config()).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::InsufficientData);
    }
}
