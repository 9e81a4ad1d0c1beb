//! Reads and writes `WeatherFrame` snapshots as Parquet files.
//!
//! Only the columns a frame carries are written, so a snapshot taken before the transform
//! stage has no derived columns and a read gives back exactly the columns that were written.
//! Timestamps are stored as INT64 microsecond timestamps and round-trip exactly.

use crate::error::{AppError, Result};
use crate::models::{Column, ObservationRow, WeatherFrame};
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use parquet::basic::{LogicalType, Repetition, TimeUnit, Type as PhysicalType};
use parquet::data_type::{BoolType, ByteArray, ByteArrayType, DataType, DoubleType, Int32Type, Int64Type};
use parquet::file::properties::WriterProperties;
use parquet::file::reader::{FileReader, SerializedFileReader};
use parquet::file::writer::{SerializedColumnWriter, SerializedFileWriter};
use parquet::format::MicroSeconds;
use parquet::record::Field;
use parquet::schema::types::Type;
use std::collections::BTreeSet;
use std::fs::{self, File};
use std::path::Path;
use std::sync::Arc;
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// Columns every snapshot must carry to be turned back into rows.
pub const IDENTITY_COLUMNS: [Column; 5] = [
    Column::Time,
    Column::City,
    Column::Latitude,
    Column::Longitude,
    Column::DateExtracted,
];

/// Writes `frame` to `path`, replacing any snapshot already there.
///
/// The file is written next to its destination and renamed over it once complete, so a
/// reader never sees a half-written snapshot. Missing parent directories are created.
///
/// # Errors
///
/// Returns `AppError::MissingColumns` if the frame lacks an identity column,
/// `AppError::Io` or `AppError::Parquet` if writing fails.
pub fn write_snapshot(frame: &WeatherFrame, path: &Path) -> Result<()> {
    let missing = frame.missing(&IDENTITY_COLUMNS);
    if !missing.is_empty() {
        return Err(AppError::MissingColumns {
            stage: "staging",
            columns: missing,
        });
    }

    // The temp file must live on the same filesystem as the destination for the rename
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    // Schema: one leaf per present column, in `Column` order
    let columns: Vec<Column> = frame.columns.iter().copied().collect();
    let fields = columns
        .iter()
        .map(|c| column_type(*c).map(Arc::new))
        .collect::<Result<Vec<_>>>()?;
    let schema = Type::group_type_builder("observation")
        .with_fields(fields)
        .build()?;

    let tmp = NamedTempFile::new_in(dir)?;
    let props = WriterProperties::builder().build();
    let mut writer =
        SerializedFileWriter::new(tmp.as_file().try_clone()?, Arc::new(schema), Arc::new(props))?;

    // A single row group; column writers must be taken in schema order
    let mut row_group = writer.next_row_group()?;
    for column in &columns {
        let mut column_writer = row_group.next_column()?.ok_or_else(|| {
            AppError::Validation(format!("no column writer for {}", column.name()))
        })?;
        write_column(*column, &frame.rows, &mut column_writer)?;
        column_writer.close()?;
    }
    row_group.close()?;
    writer.close()?;

    // Flush to disk, then atomically replace the previous snapshot
    tmp.as_file().sync_all()?;
    tmp.persist(path)?;

    info!(
        "Wrote staging snapshot with {} rows and {} columns to {}",
        frame.len(),
        columns.len(),
        path.display()
    );
    Ok(())
}

/// Reads the snapshot at `path` back into a frame.
///
/// Columns found in the file make up the frame's column set; unknown columns are ignored.
///
/// # Errors
///
/// Returns `AppError::MissingColumns` if the file lacks an identity column,
/// `AppError::Validation` if a value has an unexpected type or an identity value is null,
/// and `AppError::Io` or `AppError::Parquet` if the file cannot be read.
pub fn read_snapshot(path: &Path) -> Result<WeatherFrame> {
    debug!("Reading staging snapshot from {}", path.display());
    let reader = SerializedFileReader::new(File::open(path)?)?;

    let columns: BTreeSet<Column> = reader
        .metadata()
        .file_metadata()
        .schema_descr()
        .columns()
        .iter()
        .filter_map(|c| Column::from_name(c.name()))
        .collect();
    let frame = WeatherFrame::new(columns, Vec::new());
    let missing = frame.missing(&IDENTITY_COLUMNS);
    if !missing.is_empty() {
        return Err(AppError::MissingColumns {
            stage: "staging",
            columns: missing,
        });
    }

    // Rows start from placeholders; every identity column overwrites its field below
    let mut rows = Vec::new();
    for record in reader.get_row_iter(None)? {
        let record = record?;
        let mut row = ObservationRow::new(
            NaiveDateTime::default(),
            "",
            0.0,
            0.0,
            DateTime::<Utc>::default(),
        );
        for (name, field) in record.get_column_iter() {
            let Some(column) = Column::from_name(name) else {
                continue; // Unknown column
            };
            match column {
                Column::Time => row.time = micros_to_utc(required(name, micros(name, field)?)?)?.naive_utc(),
                Column::Temperature => row.temperature = float(name, field)?,
                Column::Humidity => row.humidity = float(name, field)?,
                Column::WindSpeed => row.wind_speed = float(name, field)?,
                Column::Precipitation => row.precipitation = float(name, field)?,
                Column::City => row.city = required(name, text(name, field)?)?,
                Column::Latitude => row.latitude = required(name, float(name, field)?)?,
                Column::Longitude => row.longitude = required(name, float(name, field)?)?,
                Column::DateExtracted => {
                    row.date_extracted = micros_to_utc(required(name, micros(name, field)?)?)?
                },
                Column::TempCategory => row.temp_category = text(name, field)?,
                Column::HighWindFlag => row.high_wind_flag = integer(name, field)?.unwrap_or(0),
                Column::IsRaining => row.is_raining = boolean(name, field)?.unwrap_or(false),
            }
        }
        rows.push(row);
    }

    info!(
        "Read staging snapshot with {} rows from {}",
        rows.len(),
        path.display()
    );
    Ok(WeatherFrame { rows, ..frame })
}

fn column_type(column: Column) -> Result<Type> {
    let timestamp = |utc: bool| LogicalType::Timestamp {
        is_adjusted_to_u_t_c: utc,
        unit: TimeUnit::MICROS(MicroSeconds {}),
    };
    let (physical, logical, repetition) = match column {
        Column::Time => (PhysicalType::INT64, Some(timestamp(false)), Repetition::REQUIRED),
        Column::DateExtracted => (PhysicalType::INT64, Some(timestamp(true)), Repetition::REQUIRED),
        Column::Temperature | Column::Humidity | Column::WindSpeed | Column::Precipitation => {
            (PhysicalType::DOUBLE, None, Repetition::OPTIONAL)
        },
        Column::Latitude | Column::Longitude => (PhysicalType::DOUBLE, None, Repetition::REQUIRED),
        Column::City => (
            PhysicalType::BYTE_ARRAY,
            Some(LogicalType::String),
            Repetition::REQUIRED,
        ),
        Column::TempCategory => (
            PhysicalType::BYTE_ARRAY,
            Some(LogicalType::String),
            Repetition::OPTIONAL,
        ),
        Column::HighWindFlag => (PhysicalType::INT32, None, Repetition::REQUIRED),
        Column::IsRaining => (PhysicalType::BOOLEAN, None, Repetition::REQUIRED),
    };
    Ok(Type::primitive_type_builder(column.name(), physical)
        .with_repetition(repetition)
        .with_logical_type(logical)
        .build()?)
}

fn write_column(
    column: Column,
    rows: &[ObservationRow],
    writer: &mut SerializedColumnWriter<'_>,
) -> Result<()> {
    match column {
        Column::Time => write_required::<Int64Type>(
            writer,
            rows.iter()
                .map(|r| Utc.from_utc_datetime(&r.time).timestamp_micros())
                .collect(),
        ),
        Column::Temperature => write_optional::<DoubleType>(writer, rows.iter().map(|r| r.temperature)),
        Column::Humidity => write_optional::<DoubleType>(writer, rows.iter().map(|r| r.humidity)),
        Column::WindSpeed => write_optional::<DoubleType>(writer, rows.iter().map(|r| r.wind_speed)),
        Column::Precipitation => {
            write_optional::<DoubleType>(writer, rows.iter().map(|r| r.precipitation))
        },
        Column::City => write_required::<ByteArrayType>(
            writer,
            rows.iter().map(|r| ByteArray::from(r.city.as_str())).collect(),
        ),
        Column::Latitude => write_required::<DoubleType>(writer, rows.iter().map(|r| r.latitude).collect()),
        Column::Longitude => {
            write_required::<DoubleType>(writer, rows.iter().map(|r| r.longitude).collect())
        },
        Column::DateExtracted => write_required::<Int64Type>(
            writer,
            rows.iter().map(|r| r.date_extracted.timestamp_micros()).collect(),
        ),
        Column::TempCategory => write_optional::<ByteArrayType>(
            writer,
            rows.iter()
                .map(|r| r.temp_category.as_deref().map(ByteArray::from)),
        ),
        Column::HighWindFlag => {
            write_required::<Int32Type>(writer, rows.iter().map(|r| r.high_wind_flag).collect())
        },
        Column::IsRaining => write_required::<BoolType>(writer, rows.iter().map(|r| r.is_raining).collect()),
    }
}

fn write_required<T: DataType>(
    writer: &mut SerializedColumnWriter<'_>,
    values: Vec<T::T>,
) -> Result<()> {
    writer.typed::<T>().write_batch(&values, None, None)?;
    Ok(())
}

fn write_optional<T: DataType>(
    writer: &mut SerializedColumnWriter<'_>,
    values: impl Iterator<Item = Option<T::T>>,
) -> Result<()> {
    // Nulls are encoded only in the definition levels (1 = present, 0 = null)
    let mut present = Vec::new();
    let mut def_levels = Vec::new();
    for value in values {
        match value {
            Some(v) => {
                present.push(v);
                def_levels.push(1);
            },
            None => def_levels.push(0),
        }
    }
    writer
        .typed::<T>()
        .write_batch(&present, Some(&def_levels), None)?;
    Ok(())
}

fn unexpected(name: &str, field: &Field) -> AppError {
    AppError::Validation(format!(
        "unexpected value {} in snapshot column {}",
        field, name
    ))
}

fn required<T>(name: &str, value: Option<T>) -> Result<T> {
    value.ok_or_else(|| AppError::Validation(format!("null value in snapshot column {}", name)))
}

fn float(name: &str, field: &Field) -> Result<Option<f64>> {
    match field {
        Field::Null => Ok(None),
        Field::Double(v) => Ok(Some(*v)),
        Field::Float(v) => Ok(Some(f64::from(*v))),
        Field::Int(v) => Ok(Some(f64::from(*v))),
        Field::Long(v) => Ok(Some(*v as f64)),
        other => Err(unexpected(name, other)),
    }
}

fn micros(name: &str, field: &Field) -> Result<Option<i64>> {
    match field {
        Field::Null => Ok(None),
        Field::TimestampMicros(v) | Field::Long(v) => Ok(Some(*v)),
        Field::TimestampMillis(v) => Ok(Some(*v * 1_000)),
        other => Err(unexpected(name, other)),
    }
}

fn text(name: &str, field: &Field) -> Result<Option<String>> {
    match field {
        Field::Null => Ok(None),
        Field::Str(s) => Ok(Some(s.clone())),
        other => Err(unexpected(name, other)),
    }
}

fn integer(name: &str, field: &Field) -> Result<Option<i32>> {
    match field {
        Field::Null => Ok(None),
        Field::Int(v) => Ok(Some(*v)),
        Field::Long(v) => i32::try_from(*v)
            .map(Some)
            .map_err(|_| unexpected(name, field)),
        Field::Bool(b) => Ok(Some(i32::from(*b))),
        other => Err(unexpected(name, other)),
    }
}

fn boolean(name: &str, field: &Field) -> Result<Option<bool>> {
    match field {
        Field::Null => Ok(None),
        Field::Bool(b) => Ok(Some(*b)),
        other => Err(unexpected(name, other)),
    }
}

fn micros_to_utc(micros: i64) -> Result<DateTime<Utc>> {
    let secs = micros.div_euclid(1_000_000);
    let nanos = (micros.rem_euclid(1_000_000) * 1_000) as u32;
    DateTime::from_timestamp(secs, nanos)
        .ok_or_else(|| AppError::Validation(format!("timestamp {}us is out of range", micros)))
}
