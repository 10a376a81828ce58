use chrono::NaiveDate;

use vendhub_core::{ingest, Grid};
use vendhub_store::{RecordFilter, RecordQuery, RecordStore};

fn sales_grid() -> Grid {
    let s = |v: &[&str]| v.iter().map(|x| x.to_string()).collect::<Vec<_>>();
    Grid {
        headers: s(&["Machine", "Product", "Sold at"]),
        rows: vec![
            s(&["VM-01", "Кофе", "12.05.2024"]),
            s(&["VM-01", "Tea", "5/13/2024"]),
            s(&["VM-02", "Water", "n/a"]),
        ],
    }
}

#[test]
fn records_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("vendhub.db");

    let file_id = {
        let mut store = RecordStore::open(&path).unwrap();
        let grid = sales_grid();
        let mut writer = store.begin_file("sales.xlsx", &grid.headers, grid.rows.len()).unwrap();
        ingest(&grid, &mut writer).unwrap();
        writer.commit().unwrap().id
    };

    let store = RecordStore::open(&path).unwrap();
    let file = store.get_file(file_id).unwrap();
    assert_eq!(file.filename, "sales.xlsx");
    assert_eq!(file.headers, vec!["Machine", "Product", "Sold at"]);
    assert_eq!(file.row_count, 3);

    let records = store.file_records(file_id).unwrap();
    assert_eq!(records.len(), 3);
    assert_eq!(records[0].date_field, NaiveDate::from_ymd_opt(2024, 5, 12));
    assert_eq!(records[1].date_field, NaiveDate::from_ymd_opt(2024, 5, 13));
    assert_eq!(records[2].period, None);

    // Header order survives the JSON round trip
    let keys: Vec<_> = records[0].data.keys().cloned().collect();
    assert_eq!(keys, vec!["Machine", "Product", "Sold at"]);
    assert_eq!(records[0].data["Product"], "Кофе");
}

#[test]
fn period_and_date_stay_consistent() {
    let mut store = RecordStore::open_in_memory().unwrap();
    let grid = sales_grid();
    let mut writer = store.begin_file("sales.xlsx", &grid.headers, grid.rows.len()).unwrap();
    ingest(&grid, &mut writer).unwrap();
    writer.commit().unwrap();

    for record in store.query_all(&RecordFilter::default()).unwrap() {
        match record.date_field {
            Some(date) => assert_eq!(record.period, Some(date.format("%Y-%m").to_string())),
            None => assert_eq!(record.period, None),
        }
    }

    let page = store.query(&RecordQuery::default()).unwrap();
    assert_eq!(page.total, 3);
    assert_eq!(page.pages, 1);
    assert_eq!(page.size, 50);
}
