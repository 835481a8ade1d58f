//! Reading a timetable dataset directory into a [`TransitGraph`].
//!
//! Sources are read in a fixed order: the station coordinate table, train
//! timetables, the two bus stop tables, then bus timetables. Stops are
//! located when first seen, so this order decides which coordinate tables a
//! stop can match against.

use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecord};
use tracing::{debug, info, warn};

use super::builder::{BuildOptions, GraphBuilder, TripRecord};
use super::interpolate::{Cell, interpolate_via};
use super::TransitGraph;
use crate::domain::{Coordinates, DayType, ServiceTime, TransportMode};

/// Errors that abort a dataset load.
///
/// Bad rows and unknown labels are not errors: they are logged and skipped.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("required dataset file missing: {0}")]
    MissingFile(PathBuf),
}

/// A directory of bus timetables run by one operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusSource {
    pub dir: String,
    pub operator: String,
}

/// File and directory names inside a dataset directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetLayout {
    /// `[name, id, lat, lon]` rows; required.
    pub station_table: String,
    pub train_schedules: String,
    /// `[_, name, lon, lat]` rows.
    pub primary_bus_stops: String,
    /// Header-driven `BUSSTOPDES`, `XCOORD`, `YCOORD` columns.
    pub secondary_bus_stops: String,
    pub bus_schedules: Vec<BusSource>,
}

impl Default for DatasetLayout {
    fn default() -> Self {
        Self {
            station_table: "metrorail-stations.csv".to_string(),
            train_schedules: "train-schedules-2014".to_string(),
            primary_bus_stops: "myciti-bus-stops.csv".to_string(),
            secondary_bus_stops: "ga-bus-stops.csv".to_string(),
            bus_schedules: vec![
                BusSource {
                    dir: "myciti-bus-schedules".to_string(),
                    operator: "MYCITI".to_string(),
                },
                BusSource {
                    dir: "ga-bus-schedules".to_string(),
                    operator: "GOLDENARROW".to_string(),
                },
            ],
        }
    }
}

/// Load every source under `root` and build the graph.
pub fn load_dataset(
    root: &Path,
    layout: &DatasetLayout,
    options: BuildOptions,
) -> Result<TransitGraph, LoadError> {
    let mut builder = GraphBuilder::new(options);

    let stations = root.join(&layout.station_table);
    if !stations.is_file() {
        return Err(LoadError::MissingFile(stations));
    }
    load_station_table(&mut builder, &read_rows(&stations)?);

    for path in csv_files_in(&root.join(&layout.train_schedules))? {
        debug!(file = %path.display(), "loading train timetable");
        load_train_schedule(&mut builder, &read_rows(&path)?);
    }

    let primary = root.join(&layout.primary_bus_stops);
    if primary.is_file() {
        load_primary_bus_stops(&mut builder, &read_rows(&primary)?);
    }
    let secondary = root.join(&layout.secondary_bus_stops);
    if secondary.is_file() {
        load_secondary_bus_stops(&mut builder, &read_rows(&secondary)?);
    }

    for source in &layout.bus_schedules {
        for path in csv_files_in(&root.join(&source.dir))? {
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            debug!(file = %path.display(), operator = %source.operator, "loading bus timetable");
            load_bus_schedule(&mut builder, &read_rows(&path)?, stem, &source.operator);
        }
    }

    info!(
        root = %root.display(),
        stops = builder.stop_count(),
        trips = builder.trip_count(),
        "dataset read"
    );
    Ok(builder.build())
}

/// All rows of a CSV file, header included. Rows may differ in length.
fn read_rows(path: &Path) -> Result<Vec<StringRecord>, LoadError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(|source| LoadError::Csv {
            path: path.to_path_buf(),
            source,
        })?;

    reader
        .records()
        .collect::<Result<Vec<_>, _>>()
        .map_err(|source| LoadError::Csv {
            path: path.to_path_buf(),
            source,
        })
}

/// `.csv` files directly inside `dir`, sorted by path. A missing directory
/// has no files.
fn csv_files_in(dir: &Path) -> Result<Vec<PathBuf>, LoadError> {
    if !dir.is_dir() {
        debug!(dir = %dir.display(), "timetable directory absent");
        return Ok(Vec::new());
    }
    let io_err = |source| LoadError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        let is_csv = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("csv"));
        if is_csv && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn field(row: &StringRecord, idx: usize) -> &str {
    row.get(idx).map(str::trim).unwrap_or("")
}

fn parse_pair(a: &str, b: &str) -> Option<(f64, f64)> {
    Some((a.parse().ok()?, b.parse().ok()?))
}

pub(crate) fn load_station_table(builder: &mut GraphBuilder, rows: &[StringRecord]) {
    let table = builder.coordinates_mut();
    for row in rows.iter().skip(1) {
        if row.len() >= 4 {
            let (name, id, lat, lon) = (field(row, 0), field(row, 1), field(row, 2), field(row, 3));
            if lat.is_empty() || lon.is_empty() {
                continue;
            }
            match parse_pair(lat, lon) {
                Some((lat, lon)) => table.insert_station(name, id, Coordinates::new(lat, lon)),
                None => warn!(station = name, "ignoring malformed station coordinates"),
            }
        } else if !field(row, 0).is_empty() {
            table.mark_standalone(field(row, 0));
        }
    }
}

pub(crate) fn load_primary_bus_stops(builder: &mut GraphBuilder, rows: &[StringRecord]) {
    let table = builder.coordinates_mut();
    for row in rows.iter().skip(1) {
        if row.len() < 4 {
            continue;
        }
        let (name, lon, lat) = (field(row, 1), field(row, 2), field(row, 3));
        if name.is_empty() || lon.is_empty() || lat.is_empty() {
            continue;
        }
        match parse_pair(lat, lon) {
            Some((lat, lon)) => table.insert_named(name, Coordinates::new(lat, lon)),
            None => warn!(stop = name, "ignoring malformed bus stop coordinates"),
        }
    }
}

pub(crate) fn load_secondary_bus_stops(builder: &mut GraphBuilder, rows: &[StringRecord]) {
    let Some(headers) = rows.first() else {
        return;
    };
    let column = |wanted: &str| {
        headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(wanted))
    };
    let (Some(name_idx), Some(lon_idx), Some(lat_idx)) =
        (column("BUSSTOPDES"), column("XCOORD"), column("YCOORD"))
    else {
        warn!("bus stop table lacks BUSSTOPDES/XCOORD/YCOORD columns");
        return;
    };

    let table = builder.coordinates_mut();
    for row in rows.iter().skip(1) {
        let (name, lon, lat) = (field(row, name_idx), field(row, lon_idx), field(row, lat_idx));
        if name.is_empty() || lon.is_empty() || lat.is_empty() {
            continue;
        }
        match parse_pair(lat, lon) {
            Some((lat, lon)) => table.insert_named(name, Coordinates::new(lat, lon)),
            None => warn!(stop = name, "ignoring malformed bus stop coordinates"),
        }
    }
}

/// Train rows: `[tripBase, dayType, direction, routeId, time...]` with stop
/// names as headers from column 4.
pub(crate) fn load_train_schedule(builder: &mut GraphBuilder, rows: &[StringRecord]) {
    let Some(headers) = rows.first() else {
        return;
    };

    for row in rows.iter().skip(1) {
        if row.len() < 4 {
            continue;
        }
        let base_id = field(row, 0);
        let day_type = DayType::from_label(field(row, 1));
        let inbound = field(row, 2).eq_ignore_ascii_case("inbound");
        let route = field(row, 3);
        if route.is_empty() {
            continue;
        }

        let mut calls = Vec::new();
        for col in 4..row.len() {
            let raw = field(row, col);
            if raw.is_empty() {
                continue;
            }
            let stop = field(headers, col);
            if stop.is_empty() {
                continue;
            }
            match ServiceTime::parse_hhmm(raw) {
                Ok(time) => calls.push((stop.to_string(), time)),
                Err(e) => warn!(trip = base_id, stop, cell = raw, "skipping call: {e}"),
            }
        }

        builder.add_trip(TripRecord {
            id: format!("{base_id}_{day_type}"),
            base_id: base_id.to_string(),
            route: route.to_string(),
            day_type,
            mode: TransportMode::Train,
            calls,
            reversed: inbound,
        });
    }
}

/// Bus rows: `[routeNumber?, dayType, time-or-VIA...]` with stop names as
/// headers. The file stem names the route.
pub(crate) fn load_bus_schedule(
    builder: &mut GraphBuilder,
    rows: &[StringRecord],
    file_stem: &str,
    operator: &str,
) {
    let Some(route_key) = builder.register_route(&file_stem.to_uppercase(), Some(operator)) else {
        return;
    };
    let Some(headers) = rows.first() else {
        return;
    };

    let first = field(headers, 0);
    let has_route_number = first.eq_ignore_ascii_case("route_number")
        || (!first.eq_ignore_ascii_case("day_type") && headers.len() > 1);
    let (day_idx, data_start, prefix) = if has_route_number {
        (1, 2, "BUS")
    } else {
        (0, 1, "GABS")
    };

    let stops: Vec<(usize, &str)> = (data_start..headers.len())
        .map(|col| (col, field(headers, col)))
        .filter(|(_, name)| !name.is_empty())
        .collect();

    for (row_no, row) in rows.iter().enumerate().skip(1) {
        if row.len() <= day_idx {
            continue;
        }
        let raw_day = field(row, day_idx);
        if raw_day.is_empty() {
            continue;
        }
        let day_type = DayType::from_label(raw_day);
        let route_number = if has_route_number { field(row, 0) } else { "" };

        let cells: Vec<Cell> = stops
            .iter()
            .map(|(col, _)| Cell::parse(field(row, *col)))
            .collect();
        let calls = stops
            .iter()
            .zip(interpolate_via(&cells))
            .filter_map(|((_, name), time)| time.map(|t| (name.to_string(), t)))
            .collect();

        builder.add_trip(TripRecord {
            id: format!("{prefix}_{route_key}_{day_type}_{row_no}"),
            base_id: if route_number.is_empty() {
                route_key.clone()
            } else {
                route_number.to_string()
            },
            route: route_key.clone(),
            day_type,
            mode: TransportMode::Bus,
            calls,
            reversed: false,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn rows(lines: &[&[&str]]) -> Vec<StringRecord> {
        lines.iter().map(|l| StringRecord::from(l.to_vec())).collect()
    }

    fn write(dir: &Path, rel: &str, contents: &str) {
        let path = dir.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, contents).unwrap();
    }

    /// A small network: a train line with one inbound and one outbound run,
    /// a MyCiTi route with a VIA cell, and a Golden Arrow route.
    fn sample_dataset() -> TempDir {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write(
            root,
            "metrorail-stations.csv",
            "name,id,lat,lon\n\
             Cape Town,CPT,-33.9225,18.4257\n\
             Woodstock,WDS,-33.9262,18.4468\n\
             Salt River,SRV,-33.9275,18.4640\n\
             Ghost Halt\n",
        );
        write(
            root,
            "train-schedules-2014/southern.csv",
            "trip,day,direction,route,Cape Town,Woodstock,Salt River\n\
             0101,Mon-Fri,outbound,SOUTHERN,08:00,08:05,08:09\n\
             0102,Mon-Fri,inbound,SOUTHERN,09:20,09:10,09:00\n\
             0103,Saturdays,outbound,SOUTHERN,10:00,,10:09\n",
        );
        write(
            root,
            "myciti-bus-stops.csv",
            "id,name,lon,lat\n\
             1,Civic Centre,18.4260,-33.9210\n\
             2,Gardens,18.4130,-33.9330\n\
             3,Broken,abc,-33.9\n",
        );
        write(
            root,
            "ga-bus-stops.csv",
            "OBJECTID,BUSSTOPDES,XCOORD,YCOORD\n\
             1,Mowbray Terminus,18.4740,-33.9450\n",
        );
        write(
            root,
            "myciti-bus-schedules/t01.csv",
            "route_number,day_type,Civic Centre,Gardens,Woodstock\n\
             T01,Weekdays,07:00,VIA,07:20\n\
             T01,,07:30,07:40,07:50\n\
             T01,Saturday,VIA,08:00,08:10\n",
        );
        write(
            root,
            "ga-bus-schedules/mowbray.csv",
            "day_type,Mowbray Terminus,Salt River\n\
             Weekday,06:00,06:20\n",
        );
        write(root, "ga-bus-schedules/notes.txt", "not a timetable");
        dir
    }

    fn load(root: &Path) -> TransitGraph {
        load_dataset(root, &DatasetLayout::default(), BuildOptions::default()).unwrap()
    }

    #[test]
    fn loads_all_sources() {
        let dir = sample_dataset();
        let graph = load(dir.path());

        let ids: Vec<&str> = graph.trips().iter().map(|t| t.id.as_str()).collect();
        assert_eq!(
            ids,
            [
                "0101_WEEKDAY",
                "0102_WEEKDAY",
                "0103_SATURDAY",
                "BUS_T01_WEEKDAY_1",
                "BUS_T01_SATURDAY_3",
                "GABS_MOWBRAY_WEEKDAY_1",
            ]
        );
        assert_eq!(graph.route_operator("T01"), Some("MYCITI"));
        assert_eq!(graph.route_operator("MOWBRAY"), Some("GOLDENARROW"));
        assert_eq!(graph.route_operator("SOUTHERN"), None);
        assert!(graph.purged_routes().is_empty());
    }

    #[test]
    fn train_rows() {
        let dir = sample_dataset();
        let graph = load(dir.path());
        let name = |id| graph.stop(id).unwrap().name.clone();

        let inbound = graph.trips().iter().find(|t| t.id == "0102_WEEKDAY").unwrap();
        let order: Vec<String> = inbound.stop_times.iter().map(|st| name(st.stop)).collect();
        assert_eq!(order, ["SALT RIVER", "WOODSTOCK", "CAPE TOWN"]);
        assert_eq!(inbound.mode, TransportMode::Train);
        assert_eq!(inbound.base_id, "0102");

        // Empty cells mean the train does not call there
        let saturday = graph.trips().iter().find(|t| t.id == "0103_SATURDAY").unwrap();
        assert_eq!(saturday.stop_times.len(), 2);
    }

    #[test]
    fn bus_rows_interpolate_and_skip_blank_day_types() {
        let dir = sample_dataset();
        let graph = load(dir.path());

        let weekday = graph
            .trips()
            .iter()
            .find(|t| t.id == "BUS_T01_WEEKDAY_1")
            .unwrap();
        let times: Vec<String> = weekday.stop_times.iter().map(|st| st.time.to_string()).collect();
        assert_eq!(times, ["07:00", "07:10", "07:20"]);
        assert_eq!(weekday.base_id, "T01");

        // Leading VIA has no earlier bound and is dropped
        let saturday = graph
            .trips()
            .iter()
            .find(|t| t.id == "BUS_T01_SATURDAY_3")
            .unwrap();
        assert_eq!(saturday.stop_times.len(), 2);

        let ga = graph
            .trips()
            .iter()
            .find(|t| t.id.starts_with("GABS_"))
            .unwrap();
        assert_eq!(ga.base_id, "MOWBRAY");
        assert_eq!(ga.mode, TransportMode::Bus);
    }

    #[test]
    fn coordinates_come_from_every_table() {
        let dir = sample_dataset();
        let graph = load(dir.path());

        for name in ["CAPE TOWN", "CIVIC CENTRE", "GARDENS", "MOWBRAY TERMINUS"] {
            let stop = graph.stop(graph.stop_id(name).unwrap()).unwrap();
            assert!(stop.has_coordinates(), "{name} should be located");
        }
    }

    #[test]
    fn unlocated_stops_purge_their_routes() {
        let dir = sample_dataset();
        write(
            dir.path(),
            "myciti-bus-schedules/x99.csv",
            "route_number,day_type,Civic Centre,Ghost Halt\n\
             X99,Weekday,07:00,07:10\n",
        );
        let graph = load(dir.path());

        assert_eq!(graph.purged_routes(), ["X99".to_string()]);
        assert!(graph.trips().iter().all(|t| t.route != "X99"));
        let ghost = graph.stop_id("GHOST HALT").unwrap();
        assert!(graph.routes_serving(ghost).is_empty());
    }

    #[test]
    fn missing_station_table_is_an_error() {
        let dir = TempDir::new().unwrap();
        let err = load_dataset(dir.path(), &DatasetLayout::default(), BuildOptions::default())
            .unwrap_err();
        assert!(matches!(err, LoadError::MissingFile(_)));
    }

    #[test]
    fn optional_sources_may_be_absent() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "metrorail-stations.csv", "name,id,lat,lon\n");
        let graph = load(dir.path());
        assert_eq!(graph.stats().trips, 0);
        assert_eq!(graph.stats().stops, 0);
    }

    #[test]
    fn rebuilding_is_idempotent() {
        let dir = sample_dataset();
        let first = load(dir.path());
        let second = load(dir.path());

        assert_eq!(first.stops(), second.stops());
        let routes_a: Vec<_> = first.routes().cloned().collect();
        let routes_b: Vec<_> = second.routes().cloned().collect();
        assert_eq!(routes_a, routes_b);
        assert_eq!(first.walking(), second.walking());
        assert_eq!(first.trips(), second.trips());
    }

    #[test]
    fn station_rows_in_memory() {
        let mut builder = GraphBuilder::default();
        load_station_table(
            &mut builder,
            &rows(&[
                &["name", "id", "lat", "lon"],
                &["Bellville", "BLV", "-33.90", "18.63"],
                &["Nowhere", "NWH", "", ""],
                &["Oddball", "ODD", "north", "east"],
                &["Lonely"],
            ]),
        );
        let table = builder.coordinates_mut();
        assert_eq!(table.resolve("BLV"), Some(Coordinates::new(-33.90, 18.63)));
        assert!(table.is_standalone("LONELY"));
        assert!(!table.is_standalone("NOWHERE"));
        assert_eq!(table.resolve("ODDBALL"), None);
    }

    #[test]
    fn secondary_stops_need_their_headers() {
        let mut builder = GraphBuilder::default();
        load_secondary_bus_stops(
            &mut builder,
            &rows(&[&["NAME", "X", "Y"], &["Somewhere", "18.4", "-33.9"]]),
        );
        assert!(builder.coordinates_mut().is_empty());
    }
}
