//! Fixtures shared by the integration tests: one small bookings table,
//! written both as a CSV export and as a SQLite database file.

#![allow(dead_code)]

use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};

pub const BOOKINGS_CSV: &str = "\
Date,Booking_ID,Booking_Status,Vehicle_Type,Payment_Method,Driver_Ratings,Customer_Rating,Booking_Value
2024-07-01 08:15:00,B1,Success,Auto,Cash,4.5,4.8,250
2024-07-01 09:00:00,B2,Canceled by Driver,Bike,,,,120
2024-07-02 10:30:00,B3,Success,Prime SUV,UPI,3.9,4.1,900
2024-07-03 11:45:00,B4,Canceled by Customer,Mini,,,,300
2024-07-04 12:00:00,B5,Success,Auto,UPI,2.1,3.0,180
2024-07-05 18:20:00,B6,Driver Not Found,eBike,,,,90
2024-07-06 19:10:00,B7,Success,Prime Sedan,Credit Card,4.9,1.5,640
";

pub const CATALOG: &str = "\
-- name: All bookings
SELECT * FROM ola_clean
ORDER BY Booking_ID

-- name: Rides per vehicle
SELECT Vehicle_Type, COUNT(*) AS rides
FROM ola_clean
GROUP BY Vehicle_Type
ORDER BY Vehicle_Type;

-- name: Successful revenue
SELECT SUM(Booking_Value) AS revenue FROM ola_clean WHERE Booking_Status = 'Success';

-- name: Latest three
SELECT Booking_ID FROM ola_clean ORDER BY `Date` DESC LIMIT 3;
";

type Row = (
    &'static str,
    &'static str,
    &'static str,
    &'static str,
    Option<&'static str>,
    Option<f64>,
    Option<f64>,
    i64,
);

const ROWS: &[Row] = &[
    ("2024-07-01 08:15:00", "B1", "Success", "Auto", Some("Cash"), Some(4.5), Some(4.8), 250),
    ("2024-07-01 09:00:00", "B2", "Canceled by Driver", "Bike", None, None, None, 120),
    ("2024-07-02 10:30:00", "B3", "Success", "Prime SUV", Some("UPI"), Some(3.9), Some(4.1), 900),
    ("2024-07-03 11:45:00", "B4", "Canceled by Customer", "Mini", None, None, None, 300),
    ("2024-07-04 12:00:00", "B5", "Success", "Auto", Some("UPI"), Some(2.1), Some(3.0), 180),
    ("2024-07-05 18:20:00", "B6", "Driver Not Found", "eBike", None, None, None, 90),
    ("2024-07-06 19:10:00", "B7", "Success", "Prime Sedan", Some("Credit Card"), Some(4.9), Some(1.5), 640),
];

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn write_csv(dir: &Path) -> PathBuf {
    let path = dir.join("ola_clean.csv");
    std::fs::write(&path, BOOKINGS_CSV).unwrap();
    path
}

pub fn write_catalog(dir: &Path) -> PathBuf {
    let path = dir.join("ola_sql_queries.sql");
    std::fs::write(&path, CATALOG).unwrap();
    path
}

pub fn write_sqlite(dir: &Path) -> PathBuf {
    let path = dir.join("ola_ride.db");
    let conn = Connection::open(&path).unwrap();
    conn.execute_batch(
        "CREATE TABLE ola_clean (
            Date            TEXT,
            Booking_ID      TEXT,
            Booking_Status  TEXT,
            Vehicle_Type    TEXT,
            Payment_Method  TEXT,
            Driver_Ratings  REAL,
            Customer_Rating REAL,
            Booking_Value   INTEGER
        );",
    )
    .unwrap();
    for r in ROWS {
        conn.execute(
            "INSERT INTO ola_clean VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![r.0, r.1, r.2, r.3, r.4, r.5, r.6, r.7],
        )
        .unwrap();
    }
    path
}
