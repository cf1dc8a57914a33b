//! Reader for the ngspice rawfile format.
//!
//! ngspice writes simulation data in a "rawfile" that can be either ASCII or
//! binary. The format consists of a header section followed by data values.
//!
//! Header fields:
//! - Title: simulation title
//! - Plotname: type of analysis
//! - Flags: real or complex
//! - No. Variables: number of data columns
//! - No. Points: number of data rows
//! - Variables: list of variable names and types
//! - Values: (ASCII) or Binary: (binary) marker before data
//!
//! Only real-valued plots are read; a DC operating point is a single row.

use super::OperatingPoint;
use crate::error::{Result, ShuntError};

const ASCII_MARKER: &str = "Values:";
const BINARY_MARKER: &str = "Binary:";

/// A variable in the rawfile (column in the data).
#[derive(Debug, Clone, PartialEq)]
pub struct RawVariable {
    /// Variable index (0-based).
    pub index: usize,
    /// Variable name as written by the solver (e.g. `v(vout)`, `vbat#branch`).
    pub name: String,
    /// Variable type (e.g. `voltage`, `current`).
    pub var_type: String,
}

/// Parsed rawfile header information.
#[derive(Debug, Clone, PartialEq)]
pub struct RawfileHeader {
    pub title: String,
    pub plotname: String,
    pub flags: String,
    pub num_variables: usize,
    pub num_points: usize,
    pub variables: Vec<RawVariable>,
    pub is_binary: bool,
    /// Byte offset of the first data byte, just past the marker line.
    pub data_offset: usize,
}

/// A parsed real-valued rawfile.
#[derive(Debug, Clone, PartialEq)]
pub struct Rawfile {
    pub header: RawfileHeader,
    /// Data values (num_points x num_variables).
    pub data: Vec<Vec<f64>>,
}

impl Rawfile {
    /// Convert the first data point into an [`OperatingPoint`].
    pub fn to_operating_point(&self) -> Result<OperatingPoint> {
        let row = self
            .data
            .first()
            .ok_or_else(|| ShuntError::rawfile("rawfile contains no data points"))?;

        let mut op = OperatingPoint::new();
        for var in &self.header.variables {
            let value = row.get(var.index).copied().ok_or_else(|| {
                ShuntError::rawfile(format!("variable {} has no value", var.name))
            })?;
            op.insert(&var.name, value);
        }
        Ok(op)
    }
}

/// Parse a rawfile from bytes.
pub fn parse_rawfile(data: &[u8]) -> Result<Rawfile> {
    let header = parse_header(data)?;

    if header.flags.to_lowercase().contains("complex") {
        return Err(ShuntError::rawfile("complex plots are not supported"));
    }
    if header.variables.len() != header.num_variables {
        return Err(ShuntError::rawfile(format!(
            "header declares {} variables but lists {}",
            header.num_variables,
            header.variables.len()
        )));
    }

    let section = &data[header.data_offset..];
    let data = if header.is_binary {
        parse_binary_data(section, &header)?
    } else {
        parse_ascii_data(&String::from_utf8_lossy(section), &header)?
    };

    Ok(Rawfile { header, data })
}

fn field<'a>(line: &'a str, name: &str) -> Option<&'a str> {
    line.strip_prefix(name).map(str::trim)
}

fn parse_count(value: &str, what: &str) -> Result<usize> {
    value
        .parse()
        .map_err(|_| ShuntError::rawfile(format!("invalid {what}: {value}")))
}

/// Parse the header section of the rawfile.
///
/// Header lines are read one at a time up to the first line that starts with
/// a data marker, so marker text inside the title is never mistaken for it.
fn parse_header(data: &[u8]) -> Result<RawfileHeader> {
    let mut header = RawfileHeader {
        title: String::new(),
        plotname: String::new(),
        flags: String::new(),
        num_variables: 0,
        num_points: 0,
        variables: Vec::new(),
        is_binary: false,
        data_offset: 0,
    };
    let mut in_variables = false;
    let mut found_data = false;
    let mut offset = 0;

    for raw_line in data.split_inclusive(|&b| b == b'\n') {
        offset += raw_line.len();
        let decoded = String::from_utf8_lossy(raw_line);
        let line = decoded.trim();

        if let Some(v) = field(line, "Title:") {
            header.title = v.to_string();
        } else if let Some(v) = field(line, "Plotname:") {
            header.plotname = v.to_string();
        } else if let Some(v) = field(line, "Flags:") {
            header.flags = v.to_string();
        } else if let Some(v) = field(line, "No. Variables:") {
            header.num_variables = parse_count(v, "No. Variables")?;
        } else if let Some(v) = field(line, "No. Points:") {
            header.num_points = parse_count(v, "No. Points")?;
        } else if line.starts_with("Variables:") {
            in_variables = true;
        } else if line.starts_with(ASCII_MARKER) || line.starts_with(BINARY_MARKER) {
            header.is_binary = line.starts_with(BINARY_MARKER);
            header.data_offset = offset;
            found_data = true;
            break;
        } else if in_variables && !line.is_empty() {
            // Variable line: "index name type"
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() >= 3 {
                header.variables.push(RawVariable {
                    index: parse_count(parts[0], "variable index")?,
                    name: parts[1].to_string(),
                    var_type: parts[2].to_string(),
                });
            }
        }
    }

    if !found_data {
        return Err(ShuntError::rawfile("no Values: or Binary: section"));
    }
    Ok(header)
}

/// Parse ASCII format data section.
///
/// Each point is a block starting with the point index, which shares its
/// line with the first value, followed by one line per remaining variable.
fn parse_ascii_data(section: &str, header: &RawfileHeader) -> Result<Vec<Vec<f64>>> {
    let mut rows = Vec::with_capacity(header.num_points);
    let mut current = Vec::with_capacity(header.num_variables);
    let mut expecting_index = true;

    for line in section.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let value_text = if expecting_index {
            expecting_index = false;
            match line.split_whitespace().nth(1) {
                Some(v) => v,
                None => continue,
            }
        } else {
            line
        };

        let value = value_text
            .parse::<f64>()
            .map_err(|_| ShuntError::rawfile(format!("invalid value: {value_text}")))?;
        current.push(value);

        if current.len() == header.num_variables {
            rows.push(std::mem::take(&mut current));
            expecting_index = true;
            if rows.len() == header.num_points {
                break;
            }
        }
    }

    if rows.len() != header.num_points {
        return Err(ShuntError::rawfile(format!(
            "expected {} points, found {}",
            header.num_points,
            rows.len()
        )));
    }
    Ok(rows)
}

/// Parse binary format data section (little-endian f64, row-major).
fn parse_binary_data(section: &[u8], header: &RawfileHeader) -> Result<Vec<Vec<f64>>> {
    let needed = header.num_points * header.num_variables * 8;
    let body = section
        .get(..needed)
        .ok_or_else(|| ShuntError::rawfile(format!("binary section shorter than {needed} bytes")))?;

    let values = body
        .chunks_exact(8)
        .map(|chunk| {
            <[u8; 8]>::try_from(chunk)
                .map(f64::from_le_bytes)
                .map_err(|_| ShuntError::rawfile("truncated binary value"))
        })
        .collect::<Result<Vec<f64>>>()?;

    if header.num_variables == 0 {
        return Ok(Vec::new());
    }
    Ok(values
        .chunks(header.num_variables)
        .map(<[f64]>::to_vec)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    const ASCII_OP: &str = "Title: TL431 3.3V Shunt
Date: Sun Oct 18 12:00:00  2026
Plotname: Operating Point
Flags: real
No. Variables: 4
No. Points: 1
Variables:
\t0\tv(gate)\tvoltage
\t1\tv(ref)\tvoltage
\t2\tv(vout)\tvoltage
\t3\tvbat#branch\tcurrent
Values:
 0\t1.327000e-01
\t2.495133e+00
\t3.306281e+00
\t-1.658238e-03
";

    #[test]
    fn test_ascii_operating_point() {
        let raw = parse_rawfile(ASCII_OP.as_bytes()).unwrap();
        assert_eq!(raw.header.plotname, "Operating Point");
        assert!(!raw.header.is_binary);
        assert_eq!(raw.data.len(), 1);

        let op = raw.to_operating_point().unwrap();
        assert_eq!(op.voltage("VOUT"), Some(3.306281));
        assert_eq!(op.voltage("REF"), Some(2.495133));
        assert_eq!(op.branch_current("VBAT"), Some(-1.658238e-3));
    }

    #[test]
    fn test_binary_operating_point() {
        let mut data = b"Title: divider
Plotname: Operating Point
Flags: real
No. Variables: 2
No. Points: 1
Variables:
\t0\tin\tvoltage
\t1\tout\tvoltage
Binary:
"
        .to_vec();
        data.extend_from_slice(&10.0f64.to_le_bytes());
        data.extend_from_slice(&5.0f64.to_le_bytes());

        let raw = parse_rawfile(&data).unwrap();
        assert!(raw.header.is_binary);
        let op = raw.to_operating_point().unwrap();
        assert_eq!(op.voltage("IN"), Some(10.0));
        assert_eq!(op.voltage("OUT"), Some(5.0));
    }

    #[test]
    fn test_marker_text_in_title_is_not_data() {
        let text = ASCII_OP.replace("Title: TL431 3.3V Shunt", "Title: Values: 9.9e9 Binary:");
        let raw = parse_rawfile(text.as_bytes()).unwrap();
        assert!(!raw.header.is_binary);
        assert_eq!(raw.header.title, "Values: 9.9e9 Binary:");

        let op = raw.to_operating_point().unwrap();
        assert_eq!(op.voltage("vout"), Some(3.306281));
        assert_eq!(op.voltage("gate"), Some(1.327e-1));
    }

    #[test]
    fn test_binary_title_with_marker() {
        let mut data = b"Title: Binary:\nFlags: real\nNo. Variables: 1\nNo. Points: 1\nVariables:\n\t0\tout\tvoltage\nBinary:\n"
            .to_vec();
        data.extend_from_slice(&3.3f64.to_le_bytes());

        let raw = parse_rawfile(&data).unwrap();
        assert!(raw.header.is_binary);
        assert_eq!(raw.to_operating_point().unwrap().voltage("OUT"), Some(3.3));
    }

    #[test]
    fn test_truncated_binary_rejected() {
        let mut data = b"Title: t
Flags: real
No. Variables: 2
No. Points: 1
Variables:
\t0\tin\tvoltage
\t1\tout\tvoltage
Binary:
"
        .to_vec();
        data.extend_from_slice(&10.0f64.to_le_bytes());
        assert!(matches!(
            parse_rawfile(&data),
            Err(ShuntError::RawfileParse { .. })
        ));
    }

    #[test]
    fn test_missing_data_section_rejected() {
        let err = parse_rawfile(b"Title: nothing\nPlotname: Operating Point\n").unwrap_err();
        assert!(err.to_string().contains("no Values"));
    }

    #[test]
    fn test_empty_plot_has_no_operating_point() {
        let text = "Title: t\nFlags: real\nNo. Variables: 1\nNo. Points: 0\nVariables:\n\t0\tout\tvoltage\nValues:\n";
        let raw = parse_rawfile(text.as_bytes()).unwrap();
        assert!(raw.to_operating_point().is_err());
    }

    #[test]
    fn test_complex_plot_rejected() {
        let text = "Title: t\nFlags: complex\nNo. Variables: 1\nNo. Points: 1\nVariables:\n\t0\tfrequency\tfrequency\nValues:\n 0\t1.0,0.0\n";
        assert!(parse_rawfile(text.as_bytes()).is_err());
    }
}
