//! End-to-end pipeline test: synthesize a subject dataset, value layers and a
//! reference table on disk, run the check, and read the report back.

use std::fs;
use std::path::{Path, PathBuf};

use polars::io::SerReader;
use polars::prelude::CsvReader;
use shapefile::dbase::{FieldValue, Record, TableWriterBuilder};
use shapefile::{Point, Polygon, PolygonRing, Polyline};
use tempfile::TempDir;

use valuecheck::cli::Cli;

/// Clockwise square ring, closed, in shapefile outer-ring order.
fn square_ring(x: f64, y: f64, size: f64) -> Vec<Point> {
    vec![
        Point::new(x, y),
        Point::new(x, y + size),
        Point::new(x + size, y + size),
        Point::new(x + size, y),
        Point::new(x, y),
    ]
}

fn square(x: f64, y: f64, size: f64) -> Polygon {
    Polygon::with_rings(vec![PolygonRing::Outer(square_ring(x, y, size))])
}

fn named_record(field: &str, value: &str) -> Record {
    let mut record = Record::default();
    record.insert(
        field.to_string(),
        FieldValue::Character(Some(value.to_string())),
    );
    record
}

fn write_polygons(path: &Path, field: &str, shapes: &[(Polygon, &str)]) {
    let table = TableWriterBuilder::new().add_character_field(field.try_into().unwrap(), 30);
    let mut writer = shapefile::Writer::from_path(path, table).unwrap();
    for (shape, value) in shapes {
        writer
            .write_shape_and_record(shape, &named_record(field, value))
            .unwrap();
    }
}

fn write_lines(path: &Path, field: &str, shapes: &[(Polyline, &str)]) {
    let table = TableWriterBuilder::new().add_character_field(field.try_into().unwrap(), 30);
    let mut writer = shapefile::Writer::from_path(path, table).unwrap();
    for (shape, value) in shapes {
        writer
            .write_shape_and_record(shape, &named_record(field, value))
            .unwrap();
    }
}

fn write_points(path: &Path, field: &str, shapes: &[(Point, &str)]) {
    let table = TableWriterBuilder::new().add_character_field(field.try_into().unwrap(), 30);
    let mut writer = shapefile::Writer::from_path(path, table).unwrap();
    for (shape, value) in shapes {
        writer
            .write_shape_and_record(shape, &named_record(field, value))
            .unwrap();
    }
}

/// Lay out the whole fixture: subject squares F1/F2, four value layers, and
/// the reference table that wires them together.
fn build_fixture(root: &Path) -> Cli {
    let data_root = root.join("gis_public");
    let heritage_dir = data_root.join("heritage").join("heritage.gdb");
    let flat_dir = root.join("layers");
    let out_dir = root.join("out");
    for dir in [&heritage_dir, &flat_dir, &out_dir] {
        fs::create_dir_all(dir).unwrap();
    }

    let input = root.join("works.shp");
    write_polygons(
        &input,
        "REF_NO",
        &[
            (square(0.0, 0.0, 100.0), "F1"),
            (square(1000.0, 0.0, 100.0), "F2"),
        ],
    );

    // Presence layer: a duplicated attribute plus a distinct one, all in F1.
    write_polygons(
        &heritage_dir.join("HERITAGE_SITES.shp"),
        "NAME",
        &[
            (square(10.0, 10.0, 5.0), "A"),
            (square(40.0, 40.0, 5.0), "A"),
            (square(60.0, 60.0, 5.0), "B"),
        ],
    );

    // Count layer: three hits sharing one attribute key.
    write_polygons(
        &flat_dir.join("zones.shp"),
        "NAME",
        &[
            (square(10.0, 10.0, 5.0), "Zone1"),
            (square(30.0, 30.0, 5.0), "Zone1"),
            (square(50.0, 50.0, 5.0), "Zone1"),
        ],
    );

    // Measure layer: a track crossing F1, exactly 100 m of it inside.
    write_lines(
        &flat_dir.join("roads.shp"),
        "RD_NAME",
        &[(
            Polyline::new(vec![Point::new(-50.0, 50.0), Point::new(150.0, 50.0)]),
            "Track",
        )],
    );

    // Buffered count layer: one point inside F1, one 20 m outside its edge.
    write_points(
        &flat_dir.join("camps.shp"),
        "NAME",
        &[
            (Point::new(30.0, 30.0), "Camp"),
            (Point::new(120.0, 50.0), "Camp"),
        ],
    );

    let ref_table = root.join("reftable.csv");
    let zones = flat_dir.join("zones.shp");
    let roads = flat_dir.join("roads.shp");
    let camps = flat_dir.join("camps.shp");
    let mut reftab = String::from(
        "THEMENAME,CHECK_YN,DEFAULTWS_YN,DATA_LOC,GDB_NAME,FC_NAME,DEF_QUERY,CHECK_METHOD,REPFLD1,REPFLD2,REPFLD3,REPFLD4,BUFFER_DIST\n",
    );
    reftab.push_str("Heritage,Y,Y,heritage,heritage.gdb,HERITAGE_SITES,,PRESENT,NAME,,,,0\n");
    reftab.push_str(&format!(
        "Zones,Y,N,{},,,,COUNT,NAME,,,,0\n",
        zones.display()
    ));
    reftab.push_str(&format!(
        "Roads,Y,N,{},,,,MEASURE,RD_NAME,,,,0\n",
        roads.display()
    ));
    reftab.push_str(&format!(
        "Camps,Y,N,{},,,,COUNT,NAME,,,,50\n",
        camps.display()
    ));
    reftab.push_str("Ignored,N,N,/nowhere/else.shp,,,,PRESENT,NAME,,,,0\n");
    fs::write(&ref_table, reftab).unwrap();

    Cli {
        input,
        id_field: "REF_NO".to_string(),
        ref_table,
        data_root,
        out_dir,
        verbose: 0,
    }
}

fn cell(df: &polars::frame::DataFrame, column: &str, row: usize) -> String {
    df.column(column)
        .unwrap()
        .str()
        .unwrap()
        .get(row)
        .unwrap()
        .to_string()
}

#[test]
fn pipeline_produces_the_expected_report() {
    let tmp = TempDir::new().unwrap();
    let args = build_fixture(tmp.path());

    let csv_path: PathBuf = valuecheck::run::execute(&args).unwrap();
    assert!(csv_path.exists());

    let df = CsvReader::new(fs::File::open(&csv_path).unwrap())
        .finish()
        .unwrap();

    let names: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect();
    assert_eq!(names, vec!["REF_NO", "Heritage", "Zones", "Roads", "Camps"]);
    assert_eq!(df.height(), 2);

    // Rows come back sorted by feature ID.
    assert_eq!(cell(&df, "REF_NO", 0), "F1");
    assert_eq!(cell(&df, "REF_NO", 1), "F2");

    // Presence: the duplicated "A" collapses, rows sort ascending.
    assert_eq!(cell(&df, "Heritage", 0), "In polygon:\r\nA\r\nB");
    assert_eq!(cell(&df, "Heritage", 1), "In polygon: Nil");

    // Count: three joined records share one key.
    assert_eq!(cell(&df, "Zones", 0), "In polygon:\r\nZone1 - 3");

    // Measure: 100 m of track inside F1 reports as 0.1 km.
    assert_eq!(cell(&df, "Roads", 0), "In polygon:\r\nTrack - 0.1km");
    assert_eq!(cell(&df, "Roads", 1), "In polygon: Nil");

    // Buffered count: one camp inside, one only within the 50 m ring.
    assert_eq!(
        cell(&df, "Camps", 0),
        "In polygon:\r\nCamp - 1\r\nIn 50m buffer:\r\nCamp - 1"
    );
    assert_eq!(
        cell(&df, "Camps", 1),
        "In polygon: Nil\r\nIn 50m buffer: Nil"
    );
}

#[test]
fn missing_inputs_fail_before_processing() {
    let tmp = TempDir::new().unwrap();
    let mut args = build_fixture(tmp.path());
    args.input = tmp.path().join("no_such.shp");
    assert!(valuecheck::run::execute(&args).is_err());
}
