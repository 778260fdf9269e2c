//! Subnets to sweep, read from a small CSV table.
//!
//! ```text
//! id,address,mask
//! 101,192.168.10.0,24
//! 102,192.168.11.0,25
//! ```
//!
//! Fields are split on commas only. Quoted fields are not supported and a row
//! containing a `"` is rejected.

use std::{
    fs::File,
    io::{BufRead, BufReader, Read},
    net::Ipv4Addr,
    path::Path,
};

use crate::{
    error::{Error, Result},
    range::NetworkRange,
};

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct Target {
    pub id: u32,
    pub network: NetworkRange,
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{} {}", self.id, self.network)
    }
}

/// Reads the target table at `path`.
///
/// # Errors
/// Returns [`Error::Io`] if the file cannot be read and [`Error::Config`] for
/// the first malformed row.
pub fn load_targets(path: impl AsRef<Path>) -> Result<Vec<Target>> {
    let file = File::open(path.as_ref())?;
    parse_targets(file)
}

/// Parses a target table. The first line is a header and is skipped, as are
/// blank lines.
pub fn parse_targets(reader: impl Read) -> Result<Vec<Target>> {
    let mut targets = Vec::new();
    for (index, line) in BufReader::new(reader).lines().enumerate().skip(1) {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        targets.push(parse_row(index + 1, &line)?);
    }
    Ok(targets)
}

fn parse_row(line_no: usize, line: &str) -> Result<Target> {
    let invalid = |reason: String| Error::Config {
        line: line_no,
        reason,
    };
    if line.contains('"') {
        return Err(invalid("quoted fields are not supported".into()));
    }
    let columns: Vec<&str> = line.split(',').map(str::trim).collect();
    let &[id, address, mask, ..] = columns.as_slice() else {
        return Err(invalid(format!("expected 3 columns, found {}", columns.len())));
    };
    let id = id
        .parse::<u32>()
        .map_err(|err| invalid(format!("identifier {:?}: {}", id, err)))?;
    let address = address
        .parse::<Ipv4Addr>()
        .map_err(|err| invalid(format!("address {:?}: {}", address, err)))?;
    let prefix_len = mask
        .parse::<u8>()
        .map_err(|err| invalid(format!("mask length {:?}: {}", mask, err)))?;
    let network =
        NetworkRange::new(address, prefix_len).map_err(|err| invalid(err.to_string()))?;
    Ok(Target { id, network })
}

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;

    use super::parse_targets;
    use crate::error::Error;

    #[test]
    fn test_parse_targets() {
        let table = "id,address,mask\n101,192.168.10.0,24\n\n 102 , 192.168.11.128 , 25 \n";
        let targets = parse_targets(table.as_bytes()).unwrap();
        assert_eq!(targets.len(), 2);
        assert_eq!(targets[0].id, 101);
        assert_eq!(targets[0].network.network(), Ipv4Addr::new(192, 168, 10, 0));
        assert_eq!(targets[0].network.prefix_len(), 24);
        assert_eq!(targets[1].id, 102);
        assert_eq!(targets[1].network.hosts().len(), 126);
        assert_eq!(targets[1].to_string(), "#102 192.168.11.128/25");
    }

    #[test]
    fn test_header_only() {
        assert!(parse_targets("id,address,mask\n".as_bytes())
            .unwrap()
            .is_empty());
        assert!(parse_targets("".as_bytes()).unwrap().is_empty());
    }

    #[test]
    fn test_malformed_rows() {
        for (table, expected_line) in [
            ("id,address,mask\n1,10.0.0.0\n", 2),
            ("id,address,mask\n1,10.0.0.0,24\nx,10.0.1.0,24\n", 3),
            ("id,address,mask\n1,10.0.0.300,24\n", 2),
            ("id,address,mask\n1,10.0.0.0,33\n", 2),
            ("id,address,mask\n1,10.0.0.0,-1\n", 2),
            ("id,address,mask\n1,10.0.0.0,24\n\"2\",\"10.0.1.0\",\"24\"\n", 3),
        ] {
            match parse_targets(table.as_bytes()) {
                Err(Error::Config { line, .. }) => assert_eq!(line, expected_line, "{}", table),
                other => panic!("expected config error for {:?}, got {:?}", table, other),
            }
        }
    }

    #[test]
    fn test_quoted_fields_are_rejected() {
        let table = "id,address,mask\n\"7\",10.0.0.0,24\n";
        match parse_targets(table.as_bytes()) {
            Err(Error::Config { line, reason }) => {
                assert_eq!(line, 2);
                assert_eq!(reason, "quoted fields are not supported");
            }
            other => panic!("expected config error, got {:?}", other),
        }
    }
}
