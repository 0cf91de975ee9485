//! Hand-typed matrices: one row per line, values split on commas and/or whitespace.

use crate::error::{KernelError, KernelResult};
use crate::kernel::Kernel;

pub fn parse_matrix(text: &str) -> KernelResult<Kernel> {
    let mut rows = Vec::new();
    for (index, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let row = line
            .replace(',', " ")
            .split_whitespace()
            .map(|token| {
                token.parse::<f64>().map_err(|_| KernelError::Parse {
                    line: index + 1,
                    token: token.to_string(),
                })
            })
            .collect::<KernelResult<Vec<f64>>>()?;
        rows.push(row);
    }
    if rows.is_empty() {
        return Err(KernelError::EmptyInput("no matrix rows".to_string()));
    }
    Kernel::from_rows(rows)
}

/// Parse and require an `order`×`order` result.
pub fn parse_matrix_of_order(text: &str, order: usize) -> KernelResult<Kernel> {
    let kernel = parse_matrix(text)?;
    if kernel.order() != order {
        return Err(KernelError::OrderMismatch { expected: order, actual: kernel.order() });
    }
    Ok(kernel)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_mixed_separators() {
        let text = "0.1, 0.2, 0.3\n0.0 -0.4   0.5\n\n1.2,0.7,-0.8\n";
        let kernel = parse_matrix(text).unwrap();
        assert_eq!(
            kernel.as_array(),
            &array![[0.1, 0.2, 0.3], [0.0, -0.4, 0.5], [1.2, 0.7, -0.8]]
        );
    }

    #[test]
    fn test_errors() {
        let err = parse_matrix("1 2\n3 four\n").unwrap_err();
        assert!(matches!(err, KernelError::Parse { line: 2, ref token } if token == "four"));

        assert!(matches!(parse_matrix("1 2\n3\n"), Err(KernelError::RaggedRows { .. })));
        assert!(matches!(parse_matrix("1 2 3\n4 5 6\n"), Err(KernelError::NotSquare { rows: 2, cols: 3 })));
        assert!(matches!(parse_matrix("  \n"), Err(KernelError::EmptyInput(_))));
    }

    #[test]
    fn test_order_check() {
        let err = parse_matrix_of_order("1 0\n0 1", 3).unwrap_err();
        assert!(matches!(err, KernelError::OrderMismatch { expected: 3, actual: 2 }));
        assert!(parse_matrix_of_order("1 0\n0 1", 2).is_ok());
    }
}
