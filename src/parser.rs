//! Parser for nmap's human-readable output.

use crate::types::{Finding, PortState};

/// Outcome of parsing one scanner invocation's captured output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedOutput {
    /// Findings in table order (nmap emits rows in ascending port order).
    pub findings: Vec<Finding>,
    /// Rows inside the table that could not be read as port/state/service.
    pub skipped_rows: usize,
}

/// Parse a raw stdout+stderr capture of an nmap run into findings.
///
/// The port table starts at the first line containing both the literal
/// tokens `PORT` and `STATE`, and ends at the first blank line after it.
/// Everything before the header (version banner, host discovery chatter)
/// is ignored. If no header is present the result is empty; callers treat
/// that as "no findings", not as an error. Only the first table is read;
/// a second header later in the input does not restart parsing.
///
/// Rows that do not split into at least three whitespace-separated columns,
/// or whose first column has no numeric port, are skipped and counted in
/// `skipped_rows` so drift in the scanner's output format stays visible.
pub fn parse_nmap_output(raw: &str) -> ParsedOutput {
    let mut out = ParsedOutput::default();
    let mut in_table = false;

    for line in raw.lines() {
        if !in_table {
            if line.contains("PORT") && line.contains("STATE") {
                in_table = true;
            }
            continue;
        }
        if line.trim().is_empty() {
            break;
        }
        match parse_row(line) {
            Some(finding) => out.findings.push(finding),
            None => out.skipped_rows += 1,
        }
    }

    out
}

/// Read one table row: `<port>/<proto>  <state>  <service>  [extra...]`.
/// Columns past the third (e.g. version info from `-sV`) are ignored.
fn parse_row(line: &str) -> Option<Finding> {
    let mut cols = line.split_whitespace();
    let portproto = cols.next()?;
    let state = cols.next()?;
    let service = cols.next()?;

    let (port_str, protocol) = match portproto.split_once('/') {
        Some((p, proto)) => (p, Some(proto.to_string())),
        None => (portproto, None),
    };
    let port: u16 = port_str.parse().ok()?;

    Some(Finding {
        port,
        protocol,
        state: PortState::parse(state),
        service: service.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preamble_before_header_is_ignored() {
        let raw = "Starting Nmap 7.94 ( https://nmap.org )\n\
                   Nmap scan report for 10.0.0.1\n\
                   Host is up (0.0010s latency).\n\
                   PORT   STATE SERVICE\n\
                   22/tcp open  ssh\n";
        let parsed = parse_nmap_output(raw);
        assert_eq!(parsed.findings.len(), 1);
        assert_eq!(parsed.findings[0].port, 22);
        assert_eq!(parsed.skipped_rows, 0);
    }

    #[test]
    fn blank_line_terminates_table() {
        let raw = "PORT   STATE SERVICE\n\
                   22/tcp open  ssh\n\
                   \n\
                   80/tcp open  http\n";
        let parsed = parse_nmap_output(raw);
        assert_eq!(parsed.findings.len(), 1);
    }

    #[test]
    fn whitespace_only_line_also_terminates() {
        let raw = "PORT STATE SERVICE\n22/tcp open ssh\n   \t \n80/tcp open http\n";
        let parsed = parse_nmap_output(raw);
        assert_eq!(parsed.findings.len(), 1);
    }

    #[test]
    fn second_header_does_not_restart() {
        let raw = "PORT STATE SERVICE\n22/tcp open ssh\n\n\
                   PORT STATE SERVICE\n80/tcp open http\n\n";
        let parsed = parse_nmap_output(raw);
        assert_eq!(parsed.findings.len(), 1);
        assert_eq!(parsed.findings[0].port, 22);
    }

    #[test]
    fn short_rows_are_counted_not_kept() {
        let raw = "PORT STATE SERVICE\n22/tcp open ssh\n8080/tcp open\n80/tcp open http\n";
        let parsed = parse_nmap_output(raw);
        assert_eq!(parsed.findings.len(), 2);
        assert_eq!(parsed.skipped_rows, 1);
    }

    #[test]
    fn non_numeric_port_is_skipped() {
        let raw = "PORT STATE SERVICE\nweird/tcp open mystery\n";
        let parsed = parse_nmap_output(raw);
        assert!(parsed.findings.is_empty());
        assert_eq!(parsed.skipped_rows, 1);
    }

    #[test]
    fn extra_columns_are_ignored() {
        let raw = "PORT    STATE SERVICE VERSION\n\
                   22/tcp  open  ssh     OpenSSH 9.6 (protocol 2.0)\n";
        let parsed = parse_nmap_output(raw);
        assert_eq!(parsed.findings.len(), 1);
        assert_eq!(parsed.findings[0].service, "ssh");
    }
}
