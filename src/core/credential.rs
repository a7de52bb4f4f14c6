/// Build the scannable credential string carried by confirmation emails.
///
/// Format: `EVENT:<eventId>|REG:<first 8 chars of registrationId>|NAME:<fullName>|EMAIL:<email>`
pub fn qr_payload(event_id: &str, registration_id: &str, full_name: &str, email: &str) -> String {
    let reference: String = registration_id.chars().take(8).collect();
    format!(
        "EVENT:{}|REG:{}|NAME:{}|EMAIL:{}",
        event_id, reference, full_name, email
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qr_payload_format() {
        let payload = qr_payload(
            "evt-42",
            "1b4e28ba-2fa1-11d2-883f-0016d3cca427",
            "Grace Hopper",
            "grace@navy.mil",
        );
        assert_eq!(
            payload,
            "EVENT:evt-42|REG:1b4e28ba|NAME:Grace Hopper|EMAIL:grace@navy.mil"
        );
    }

    #[test]
    fn test_short_registration_id() {
        assert_eq!(qr_payload("e", "abc", "N", "m"), "EVENT:e|REG:abc|NAME:N|EMAIL:m");
    }
}
