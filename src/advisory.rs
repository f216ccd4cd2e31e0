//! Static security notes for well-known ports.

/// Port-to-advisory mapping. Covering a new port only needs a row here.
const ADVISORIES: &[(u16, &str)] = &[
    (21, "FTP – prefer SFTP instead."),
    (22, "SSH login – secure this with key-based auth."),
    (23, "Telnet – insecure. Disable it."),
    (25, "SMTP – use TLS if running."),
    (80, "HTTP – serve HTTPS instead."),
    (443, "HTTPS – ensure SSL cert is valid."),
    (3306, "MySQL – never expose to internet."),
];

/// Note returned for ports not in the table.
pub const FALLBACK_ADVISORY: &str = "Check this port's service and ensure it's secure.";

/// Look up the advisory note for a port. Pure and infallible.
///
/// The service name is part of the contract for future service-specific
/// notes but does not affect the lookup today.
pub fn advisory_for(port: u16, _service: &str) -> &'static str {
    ADVISORIES
        .iter()
        .find(|(p, _)| *p == port)
        .map(|(_, note)| *note)
        .unwrap_or(FALLBACK_ADVISORY)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_ports_have_specific_notes() {
        assert_eq!(
            advisory_for(22, "ssh"),
            "SSH login – secure this with key-based auth."
        );
        assert_eq!(advisory_for(443, "https"), "HTTPS – ensure SSL cert is valid.");
    }

    #[test]
    fn unknown_port_gets_fallback() {
        assert_eq!(advisory_for(9999, "abyss"), FALLBACK_ADVISORY);
    }

    #[test]
    fn lookup_is_pure() {
        assert_eq!(advisory_for(3306, "mysql"), advisory_for(3306, "mysql"));
        assert_eq!(advisory_for(12345, "x"), advisory_for(12345, "x"));
    }
}
