//! Kernel CSV files.
//!
//! Kernel files have no header and one row-major flattened n×n kernel per
//! row. Report files produced from them carry a header row.

use std::io::{Read, Write};

use ::csv::{ReaderBuilder, StringRecord, Trim, WriterBuilder};
use tracing::{debug, info};

use crate::analysis::Reconditioned;
use crate::error::{KernelError, KernelResult};
use crate::kernel::Kernel;

/// Status written for kernels whose spectrum was lifted.
pub const STATUS_RECONDITIONED: &str = "reconditioned";
/// Status written for kernels passed through untouched.
pub const STATUS_UNCHANGED: &str = "unchanged";
/// Side-by-side flag for kernels above the ceiling.
pub const FLAG_HIGHER: &str = "higher";
/// Side-by-side flag for kernels within the ceiling.
pub const FLAG_LOWER_OR_EQUAL: &str = "lower_or_equal";

/// Kernels read from one file; all share the same order.
#[derive(Debug, Clone)]
pub struct KernelBatch {
    pub order: usize,
    pub kernels: Vec<Kernel>,
}

/// Read a headerless kernel CSV, inferring n from the row length.
pub fn read_kernels<R: Read>(reader: R, allowed: &[usize]) -> KernelResult<KernelBatch> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .trim(Trim::All)
        .from_reader(reader);

    let mut order = None;
    let mut kernels = Vec::new();
    for (index, record) in rdr.records().enumerate() {
        let record = record?;
        let n = match order {
            Some(n) => n,
            None => {
                let n = order_for_len(record.len(), allowed)?;
                order = Some(n);
                n
            }
        };
        let values = parse_record(&record, index + 1)?;
        kernels.push(Kernel::from_flat(n, &values)?);
    }

    let order = order.ok_or_else(|| KernelError::EmptyInput("no kernel rows".to_string()))?;
    info!("Read {} kernels of size {}x{}", kernels.len(), order, order);
    Ok(KernelBatch { order, kernels })
}

/// Write kernels as headerless flattened rows.
pub fn write_kernels<W: Write>(writer: W, kernels: &[Kernel]) -> KernelResult<()> {
    let mut wtr = WriterBuilder::new().has_headers(false).from_writer(writer);
    for kernel in kernels {
        wtr.write_record(kernel.flatten().iter().map(f64::to_string))?;
    }
    wtr.flush()?;
    debug!("Wrote {} kernels", kernels.len());
    Ok(())
}

/// Write `val_1..val_{n²}, condition_number, status` rows.
pub fn write_reconditioned<W: Write>(writer: W, results: &[Reconditioned]) -> KernelResult<()> {
    let mut wtr = WriterBuilder::new().from_writer(writer);
    let width = results.first().map(|r| r.kernel.order().pow(2)).unwrap_or(0);

    let mut header: Vec<String> = (1..=width).map(|i| format!("val_{}", i)).collect();
    header.push("condition_number".to_string());
    header.push("status".to_string());
    wtr.write_record(&header)?;

    for result in results {
        let mut row: Vec<String> = result.kernel.flatten().iter().map(f64::to_string).collect();
        row.push(result.condition_before.to_string());
        row.push(status_label(result).to_string());
        wtr.write_record(&row)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Headerless rows of `original values, condition_number, flag, reconditioned values`.
///
/// The flag compares the original condition number against `ceiling`.
pub fn write_side_by_side<W: Write>(
    writer: W,
    originals: &[Kernel],
    results: &[Reconditioned],
    ceiling: f64,
) -> KernelResult<()> {
    if originals.len() != results.len() {
        return Err(KernelError::InvalidParameter(format!(
            "{} kernels but {} reconditioned results",
            originals.len(),
            results.len()
        )));
    }
    let mut wtr = WriterBuilder::new().has_headers(false).from_writer(writer);
    for (original, result) in originals.iter().zip(results) {
        let flag = if result.condition_before > ceiling { FLAG_HIGHER } else { FLAG_LOWER_OR_EQUAL };
        let mut row: Vec<String> = original.flatten().iter().map(f64::to_string).collect();
        row.push(result.condition_before.to_string());
        row.push(flag.to_string());
        row.extend(result.kernel.flatten().iter().map(f64::to_string));
        wtr.write_record(&row)?;
    }
    wtr.flush()?;
    debug!("Wrote {} side-by-side rows", results.len());
    Ok(())
}

pub fn status_label(result: &Reconditioned) -> &'static str {
    if result.adjusted {
        STATUS_RECONDITIONED
    } else {
        STATUS_UNCHANGED
    }
}

/// Single `condition_number` column with header.
pub fn write_condition_numbers<W: Write>(writer: W, conds: &[f64]) -> KernelResult<()> {
    let mut wtr = WriterBuilder::new().from_writer(writer);
    wtr.write_record(["condition_number"])?;
    for cond in conds {
        wtr.write_record([cond.to_string()])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Read a headered CSV holding exactly one numeric column.
pub fn read_condition_numbers<R: Read>(reader: R) -> KernelResult<Vec<f64>> {
    let mut rdr = ReaderBuilder::new().trim(Trim::All).from_reader(reader);
    let columns = rdr.headers()?.len();
    if columns != 1 {
        return Err(KernelError::ColumnCount { expected: 1, actual: columns });
    }

    let mut values = Vec::new();
    for (index, record) in rdr.records().enumerate() {
        // +2: header is line 1
        values.extend(parse_record(&record?, index + 2)?);
    }
    if values.is_empty() {
        return Err(KernelError::EmptyInput("no condition numbers".to_string()));
    }
    Ok(values)
}

fn order_for_len(len: usize, allowed: &[usize]) -> KernelResult<usize> {
    let n = (len as f64).sqrt().round() as usize;
    if n * n == len && allowed.contains(&n) {
        Ok(n)
    } else {
        Err(KernelError::UnsupportedShape { len, allowed: allowed.to_vec() })
    }
}

fn parse_record(record: &StringRecord, line: usize) -> KernelResult<Vec<f64>> {
    record
        .iter()
        .map(|field| {
            field.parse::<f64>().map_err(|_| KernelError::Parse {
                line,
                token: field.to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::recondition;
    use crate::config::DEFAULT_SIZES;

    #[test]
    fn test_round_trip_3x3_row() {
        let input = "0.12345678,-1.5,3,1e-8,0,-0.000321,2.25,9.75,-7\n";
        let batch = read_kernels(input.as_bytes(), &DEFAULT_SIZES).unwrap();
        assert_eq!(batch.order, 3);
        assert_eq!(batch.kernels.len(), 1);

        let original: Vec<f64> = input.trim().split(',').map(|v| v.parse().unwrap()).collect();
        assert_eq!(batch.kernels[0].flatten(), original);

        let mut out = Vec::new();
        write_kernels(&mut out, &batch.kernels).unwrap();
        let again = read_kernels(out.as_slice(), &DEFAULT_SIZES).unwrap();
        assert_eq!(again.kernels[0].flatten(), original);
    }

    #[test]
    fn test_infers_order() {
        let row: Vec<String> = (0..25).map(|i| i.to_string()).collect();
        let input = format!("{}\n{}\n", row.join(","), row.join(", "));
        let batch = read_kernels(input.as_bytes(), &DEFAULT_SIZES).unwrap();
        assert_eq!(batch.order, 5);
        assert_eq!(batch.kernels.len(), 2);
        assert_eq!(batch.kernels[1].as_array()[[4, 4]], 24.0);
    }

    #[test]
    fn test_rejects_unsupported_shapes() {
        let err = read_kernels("1,2,3,4\n".as_bytes(), &DEFAULT_SIZES).unwrap_err();
        assert!(matches!(err, KernelError::UnsupportedShape { len: 4, .. }));

        let err = read_kernels("1,2,3,4,5,6,7,8\n".as_bytes(), &DEFAULT_SIZES).unwrap_err();
        assert!(matches!(err, KernelError::UnsupportedShape { len: 8, .. }));

        let err = read_kernels("1,2,3,4\n".as_bytes(), &[2]).map(|b| b.order);
        assert_eq!(err.unwrap(), 2);
    }

    #[test]
    fn test_rejects_bad_values_and_ragged_rows() {
        let err = read_kernels("1,2,3,4,x,6,7,8,9\n".as_bytes(), &DEFAULT_SIZES).unwrap_err();
        assert!(matches!(err, KernelError::Parse { line: 1, .. }));

        let err = read_kernels("1,2,3,4,5,6,7,8,9\n1,2\n".as_bytes(), &DEFAULT_SIZES).unwrap_err();
        assert!(matches!(err, KernelError::Csv(_)));

        let err = read_kernels("".as_bytes(), &DEFAULT_SIZES).unwrap_err();
        assert!(matches!(err, KernelError::EmptyInput(_)));
    }

    #[test]
    fn test_write_reconditioned() {
        let kernels = read_kernels("1,0,0,0,1,0,0,0,1\n10,0,0,0,1,0,0,0,0.001\n".as_bytes(), &[3]).unwrap();
        let results: Vec<_> = kernels.kernels.iter().map(|k| recondition(k, 5.0).unwrap()).collect();

        let mut out = Vec::new();
        write_reconditioned(&mut out, &results).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(
            lines[0],
            "val_1,val_2,val_3,val_4,val_5,val_6,val_7,val_8,val_9,condition_number,status"
        );
        assert!(lines[1].starts_with("1,0,0,0,1,0,0,0,1,1"));
        assert!(lines[1].ends_with(",unchanged"));
        assert!(lines[2].ends_with(",reconditioned"));
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_write_side_by_side() {
        let batch = read_kernels("1,0,0,0,1,0,0,0,1\n10,0,0,0,1,0,0,0,0.001\n".as_bytes(), &[3]).unwrap();
        let results: Vec<_> = batch.kernels.iter().map(|k| recondition(k, 5.0).unwrap()).collect();

        let mut out = Vec::new();
        write_side_by_side(&mut out, &batch.kernels, &results, 5.0).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);

        assert_eq!(lines[0], "1,0,0,0,1,0,0,0,1,1,lower_or_equal,1,0,0,0,1,0,0,0,1");
        let fields: Vec<&str> = lines[1].split(',').collect();
        assert_eq!(fields.len(), 20);
        assert_eq!(fields[8], "0.001");
        assert_eq!(fields[10], FLAG_HIGHER);
        let cond: f64 = fields[9].parse().unwrap();
        assert!((cond - 10_000.0).abs() < 1e-6);
        let last: f64 = fields[19].parse().unwrap();
        assert!((last - 4.0).abs() < 1e-9);

        assert!(write_side_by_side(Vec::new(), &batch.kernels[..1], &results, 5.0).is_err());
    }

    #[test]
    fn test_condition_number_files() {
        let mut out = Vec::new();
        write_condition_numbers(&mut out, &[1.0, 2.5, f64::INFINITY]).unwrap();
        assert_eq!(String::from_utf8(out.clone()).unwrap(), "condition_number\n1\n2.5\ninf\n");

        let values = read_condition_numbers(out.as_slice()).unwrap();
        assert_eq!(values, vec![1.0, 2.5, f64::INFINITY]);

        let err = read_condition_numbers("a,b\n1,2\n".as_bytes()).unwrap_err();
        assert!(matches!(err, KernelError::ColumnCount { expected: 1, actual: 2 }));
        let err = read_condition_numbers("condition_number\nabc\n".as_bytes()).unwrap_err();
        assert!(matches!(err, KernelError::Parse { line: 2, .. }));
    }
}
