use super::DatasetError;
use crate::scoring::{RawMetric, RawValue, SupplierRecord};
use csv::StringRecord;
use std::io::Read;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Column {
    Id,
    Name,
    Country,
    Industry,
    Revenue,
    ProfitMargin,
    Metric(RawMetric),
}

impl Column {
    fn from_header(header: &str) -> Option<Self> {
        let key = header.trim().to_ascii_lowercase().replace([' ', '-'], "_");
        match key.as_str() {
            "id" | "supplier_id" => Some(Self::Id),
            "name" => Some(Self::Name),
            "country" => Some(Self::Country),
            "industry" => Some(Self::Industry),
            "revenue" => Some(Self::Revenue),
            "profit_margin" => Some(Self::ProfitMargin),
            other => RawMetric::from_key(other).map(Self::Metric),
        }
    }
}

/// Reads suppliers from a CSV export with one column per raw metric. Blank
/// cells are absent values; `anti_corruption` accepts yes/no, true/false and
/// 1/0.
pub fn read_suppliers_csv<R: Read>(reader: R) -> Result<Vec<SupplierRecord>, DatasetError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let columns = header_columns(csv_reader.headers()?)?;
    let mut suppliers = Vec::new();
    for (index, record) in csv_reader.records().enumerate() {
        let record = record?;
        // header is line 1
        let row = record
            .position()
            .map_or(index as u64 + 2, |position| position.line());
        suppliers.push(parse_row(&columns, &record, row)?);
    }
    Ok(suppliers)
}

fn header_columns(headers: &StringRecord) -> Result<Vec<Column>, DatasetError> {
    let mut columns = Vec::with_capacity(headers.len());
    for header in headers {
        let column = Column::from_header(header)
            .ok_or_else(|| DatasetError::InvalidHeader(format!("unknown column '{header}'")))?;
        if columns.contains(&column) {
            return Err(DatasetError::InvalidHeader(format!(
                "column '{header}' appears more than once"
            )));
        }
        columns.push(column);
    }

    for (required, label) in [
        (Column::Id, "id"),
        (Column::Name, "name"),
        (Column::Industry, "industry"),
    ] {
        if !columns.contains(&required) {
            return Err(DatasetError::InvalidHeader(format!(
                "missing required column '{label}'"
            )));
        }
    }
    Ok(columns)
}

fn parse_row(
    columns: &[Column],
    record: &StringRecord,
    row: u64,
) -> Result<SupplierRecord, DatasetError> {
    let invalid = |message: String| DatasetError::InvalidRow { row, message };
    let mut supplier = SupplierRecord::new("", "", "", "");

    for (column, cell) in columns.iter().zip(record.iter()) {
        if cell.is_empty() {
            continue;
        }
        match column {
            Column::Id => supplier.id = cell.to_string(),
            Column::Name => supplier.name = cell.to_string(),
            Column::Country => supplier.country = cell.to_string(),
            Column::Industry => supplier.industry = cell.to_string(),
            Column::Revenue => supplier.revenue = Some(parse_number(cell).map_err(invalid)?),
            Column::ProfitMargin => {
                supplier.profit_margin = Some(parse_number(cell).map_err(invalid)?)
            }
            Column::Metric(RawMetric::AntiCorruption) => {
                let flag = parse_flag(cell).map_err(invalid)?;
                supplier
                    .metrics
                    .insert(RawMetric::AntiCorruption, RawValue::Flag(flag));
            }
            Column::Metric(metric) => {
                let value = parse_number(cell).map_err(invalid)?;
                supplier.metrics.insert(*metric, RawValue::Number(value));
            }
        }
    }

    if supplier.id.is_empty() {
        return Err(invalid("supplier id is blank".to_string()));
    }
    if supplier.industry.is_empty() {
        return Err(invalid(format!("supplier '{}' has no industry", supplier.id)));
    }
    Ok(supplier)
}

fn parse_number(cell: &str) -> Result<f64, String> {
    cell.parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| format!("'{cell}' is not a finite number"))
}

fn parse_flag(cell: &str) -> Result<bool, String> {
    match cell.to_ascii_lowercase().as_str() {
        "true" | "yes" | "y" | "1" => Ok(true),
        "false" | "no" | "n" | "0" => Ok(false),
        _ => Err(format!("'{cell}' is not a yes/no value")),
    }
}
