//! Line-oriented readers for whitespace-separated numeric records.

use nalgebra::Matrix3;
use std::io::{BufRead, ErrorKind};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use super::MveError;

/// A line reader that remembers the source path and the current line number,
/// so parse errors can point at the offending line.
pub struct LineReader<R> {
    inner: R,
    path: PathBuf,
    line_number: usize,
    buffer: String,
}

impl<R: BufRead> LineReader<R> {
    pub fn new(inner: R, path: impl Into<PathBuf>) -> Self {
        LineReader {
            inner,
            path: path.into(),
            line_number: 0,
            buffer: String::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 1-based number of the last line read, 0 before the first read.
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    /// Reads the next line without its trailing whitespace.
    ///
    /// Reaching the end of the stream is a format error: every caller reads a
    /// record it was told to expect.
    pub fn next_line(&mut self) -> Result<&str, MveError> {
        self.buffer.clear();
        let read = match self.inner.read_line(&mut self.buffer) {
            Ok(read) => read,
            Err(e) if e.kind() == ErrorKind::InvalidData => {
                return Err(MveError::format(
                    &self.path,
                    Some(self.line_number + 1),
                    "line is not valid UTF-8",
                ));
            }
            Err(e) => {
                return Err(MveError::Io {
                    path: self.path.clone(),
                    source: e,
                })
            }
        };
        if read == 0 {
            return Err(MveError::format(
                &self.path,
                Some(self.line_number + 1),
                "unexpected end of file",
            ));
        }
        self.line_number += 1;
        Ok(self.buffer.trim_end())
    }

    pub(crate) fn error(&self, message: impl Into<String>) -> MveError {
        MveError::format(&self.path, Some(self.line_number), message)
    }
}

/// Converts every whitespace-separated token of `text`.
///
/// On failure the offending token is returned as the error.
pub fn parse_numeric_str<T: FromStr>(text: &str) -> Result<Vec<T>, String> {
    text.split_whitespace()
        .map(|token| token.parse::<T>().map_err(|_| token.to_string()))
        .collect()
}

/// Reads one line and converts all of its tokens to `T`.
///
/// An empty line yields an empty vector; a missing line is an error.
pub fn parse_numeric_line<T: FromStr, R: BufRead>(
    reader: &mut LineReader<R>,
) -> Result<Vec<T>, MveError> {
    let line = reader.next_line()?;
    parse_numeric_str(line).map_err(|token| {
        reader.error(format!(
            "'{token}' is not a valid {}",
            std::any::type_name::<T>()
        ))
    })
}

/// Reads one line that must hold exactly `N` values of type `T`.
pub fn parse_fixed_line<T: FromStr, R: BufRead, const N: usize>(
    reader: &mut LineReader<R>,
    what: &str,
) -> Result<[T; N], MveError> {
    let values = parse_numeric_line::<T, R>(reader)?;
    let count = values.len();
    values
        .try_into()
        .map_err(|_| reader.error(format!("expected {N} values for {what}, got {count}")))
}

/// Reads three lines of three floats each as the rows of a matrix.
pub fn parse_rotation_matrix<R: BufRead>(
    reader: &mut LineReader<R>,
) -> Result<Matrix3<f64>, MveError> {
    let mut rows = [[0.0; 3]; 3];
    for row in rows.iter_mut() {
        *row = parse_fixed_line::<f64, R, 3>(reader, "rotation row")?;
    }
    Ok(Matrix3::new(
        rows[0][0], rows[0][1], rows[0][2], rows[1][0], rows[1][1], rows[1][2], rows[2][0],
        rows[2][1], rows[2][2],
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn line_reader(text: &str) -> LineReader<Cursor<Vec<u8>>> {
        LineReader::new(Cursor::new(text.as_bytes().to_vec()), "test.txt")
    }

    #[test]
    fn test_parse_numeric_line() {
        let mut reader = line_reader("1.5 -2 3e-2  \n4 5 6\r\n");
        let floats = parse_numeric_line::<f64, _>(&mut reader).unwrap();
        assert_eq!(floats, vec![1.5, -2.0, 0.03]);
        let ints = parse_numeric_line::<i32, _>(&mut reader).unwrap();
        assert_eq!(ints, vec![4, 5, 6]);
        assert_eq!(reader.line_number(), 2);
    }

    #[test]
    fn test_parse_numeric_line_empty_line_and_eof() {
        let mut reader = line_reader("\n");
        assert!(parse_numeric_line::<f64, _>(&mut reader)
            .unwrap()
            .is_empty());

        let err = parse_numeric_line::<f64, _>(&mut reader).unwrap_err();
        match err {
            MveError::Format { line, message, .. } => {
                assert_eq!(line, Some(2));
                assert!(message.contains("end of file"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_invalid_utf8_is_a_format_error() {
        let mut reader = LineReader::new(Cursor::new(b"1 2 3\n4 \xff 6\n".to_vec()), "test.txt");
        assert_eq!(parse_numeric_line::<i32, _>(&mut reader).unwrap(), vec![1, 2, 3]);
        let err = parse_numeric_line::<i32, _>(&mut reader).unwrap_err();
        match err {
            MveError::Format { line, message, .. } => {
                assert_eq!(line, Some(2));
                assert!(message.contains("UTF-8"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_parse_numeric_line_rejects_bad_token() {
        let mut reader = line_reader("1 2 x\n");
        let err = parse_numeric_line::<i64, _>(&mut reader).unwrap_err();
        assert!(err.is_format_error());
        assert!(err.to_string().contains("'x'"));
        assert!(err.to_string().contains("line 1"));

        let mut reader = line_reader("1.5\n");
        assert!(parse_numeric_line::<i64, _>(&mut reader).is_err());
    }

    #[test]
    fn test_parse_fixed_line_checks_count() {
        let mut reader = line_reader("1 2 3\n1 2\n");
        let values = parse_fixed_line::<f64, _, 3>(&mut reader, "translation").unwrap();
        assert_eq!(values, [1.0, 2.0, 3.0]);
        let err = parse_fixed_line::<f64, _, 3>(&mut reader, "translation").unwrap_err();
        assert!(err
            .to_string()
            .contains("expected 3 values for translation, got 2"));
    }

    #[test]
    fn test_parse_rotation_matrix() {
        let mut reader = line_reader("0 -1 0\n1 0 0\n0 0 1\n");
        let rotation = parse_rotation_matrix(&mut reader).unwrap();
        assert_eq!(rotation[(0, 1)], -1.0);
        assert_eq!(rotation[(1, 0)], 1.0);
        assert_eq!(rotation[(2, 2)], 1.0);
        assert_eq!(rotation.row(0).sum(), -1.0);
    }

    #[test]
    fn test_parse_rotation_matrix_rejects_short_row() {
        let mut reader = line_reader("1 0 0\n0 1\n0 0 1\n");
        let err = parse_rotation_matrix(&mut reader).unwrap_err();
        assert!(err.to_string().contains("line 2"));

        let mut reader = line_reader("1 0 0\n0 1 0\n");
        assert!(parse_rotation_matrix(&mut reader).is_err());
    }

    #[test]
    fn test_parse_numeric_str() {
        assert_eq!(parse_numeric_str::<f64>(" 0.5  0.25 ").unwrap(), vec![0.5, 0.25]);
        assert_eq!(parse_numeric_str::<f64>("0.5 abc"), Err("abc".to_string()));
    }
}
