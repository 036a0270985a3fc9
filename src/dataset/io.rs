use super::model::{OrderRecord, COLUMNS};
use log::debug;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

#[derive(thiserror::Error, Debug)]
pub enum DatasetError {
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to encode row for {path}: {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("unexpected header: {found}")]
    Header { found: String },
    #[error("parse error at line {line}: {source}")]
    Parse {
        line: u64,
        #[source]
        source: csv::Error,
    },
}

/// Writes the dataset to `path`, replacing any previous file atomically.
///
/// Rows go to a temporary file in the destination directory, which is
/// renamed over `path` only after a full flush. On any error the temporary
/// is dropped and deleted, so readers see either the old file or the new
/// one, never a truncated dataset.
pub fn write_orders(path: &Path, orders: &[OrderRecord]) -> Result<(), DatasetError> {
    let write_err = |source: io::Error| DatasetError::Write {
        path: path.to_path_buf(),
        source,
    };
    let encode_err = |source: csv::Error| DatasetError::Encode {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).map_err(write_err)?;
    let mut tmp = NamedTempFile::new_in(dir).map_err(write_err)?;

    {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(tmp.as_file_mut());
        writer.write_record(COLUMNS).map_err(encode_err)?;
        for order in orders {
            writer.serialize(order).map_err(encode_err)?;
        }
        writer.flush().map_err(write_err)?;
    }
    tmp.as_file().sync_all().map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;
    debug!("persisted {} rows to {}", orders.len(), path.display());
    Ok(())
}

/// Parses a dataset from any reader. The header must match [`COLUMNS`].
pub fn read_orders_from<R: Read>(reader: R) -> Result<Vec<OrderRecord>, DatasetError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(reader);

    let headers = rdr
        .headers()
        .map_err(|source| DatasetError::Parse { line: 1, source })?
        .clone();
    if headers.iter().ne(COLUMNS.iter().copied()) {
        return Err(DatasetError::Header {
            found: headers.iter().collect::<Vec<_>>().join(","),
        });
    }

    let mut orders = Vec::new();
    for result in rdr.deserialize::<OrderRecord>() {
        let order = result.map_err(|source| DatasetError::Parse {
            line: source.position().map(|p| p.line()).unwrap_or(0),
            source,
        })?;
        orders.push(order);
    }
    Ok(orders)
}

pub fn read_orders(path: &Path) -> Result<Vec<OrderRecord>, DatasetError> {
    let file = File::open(path).map_err(|source| DatasetError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    read_orders_from(io::BufReader::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{Cents, OrderStatus};
    use chrono::NaiveDateTime;

    fn order(id: &str, code: Option<&str>) -> OrderRecord {
        OrderRecord {
            order_id: id.to_string(),
            order_date: NaiveDateTime::parse_from_str("2024-11-29 19:04:05", "%Y-%m-%d %H:%M:%S")
                .unwrap(),
            product_name: "Rose Petal Bath Bombs (Set of 4)".to_string(),
            product_category: "Bath & Body".to_string(),
            sku: "BAT-ROSE-126".to_string(),
            quantity: 3,
            unit_price: Cents(1899),
            discount_code: code.map(str::to_string),
            discount_amount: if code.is_some() { Cents(570) } else { Cents::ZERO },
            total_price: if code.is_some() { Cents(5626) } else { Cents(6196) },
            customer_id: "CUST-000042".to_string(),
            customer_country: "United Kingdom".to_string(),
            payment_method: "Apple Pay".to_string(),
            shipping_method: "Standard Shipping".to_string(),
            shipping_cost: Cents(499),
            order_status: OrderStatus::Shipped,
        }
    }

    #[test]
    fn writes_fixed_header_and_empty_discount() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("orders.csv");
        write_orders(&path, &[order("#SB1001", None)]).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next().unwrap(), COLUMNS.join(","));
        assert_eq!(
            lines.next().unwrap(),
            "#SB1001,2024-11-29 19:04:05,Rose Petal Bath Bombs (Set of 4),Bath & Body,\
             BAT-ROSE-126,3,18.99,,0.00,61.96,CUST-000042,United Kingdom,Apple Pay,\
             Standard Shipping,4.99,Shipped"
        );
    }

    #[test]
    fn round_trips_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("orders.csv");
        let rows = vec![order("#SB1001", Some("HOLIDAY15")), order("#SB1002", None)];
        write_orders(&path, &rows).unwrap();
        assert_eq!(read_orders(&path).unwrap(), rows);
    }

    #[test]
    fn replaces_existing_file_without_leftovers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("orders.csv");
        std::fs::write(&path, "stale").unwrap();
        write_orders(&path, &[order("#SB1001", None)]).unwrap();
        assert!(std::fs::read_to_string(&path).unwrap().starts_with("order_id,"));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn failed_write_keeps_previous_file() {
        let dir = tempfile::tempdir().unwrap();
        // destination is a directory, so the final rename fails
        let path = dir.path().join("taken");
        std::fs::create_dir(&path).unwrap();
        std::fs::write(path.join("keep.txt"), "x").unwrap();
        let err = write_orders(&path, &[order("#SB1001", None)]).unwrap_err();
        assert!(matches!(err, DatasetError::Write { .. }));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
        assert!(path.join("keep.txt").exists());
    }

    #[test]
    fn rejects_foreign_header() {
        let err = read_orders_from("id,date\n1,2024-01-01\n".as_bytes()).unwrap_err();
        assert!(matches!(err, DatasetError::Header { .. }));
    }

    #[test]
    fn reports_bad_row_line() {
        let mut text = COLUMNS.join(",");
        text.push_str("\n#SB1001,not-a-date,a,b,c,1,1.00,,0.00,1.00,CUST-1,X,Y,Z,0.00,Delivered\n");
        let err = read_orders_from(text.as_bytes()).unwrap_err();
        match err {
            DatasetError::Parse { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error: {other}"),
        }
    }
}
